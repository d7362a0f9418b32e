use once_cell::sync::Lazy;
use regex::Regex;

/// How many title+summary combinations one batch call asks the model for.
pub const REQUESTED_COMBINATIONS: usize = 13;

/// One parsed picture caption candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PictureCombination {
    pub title: String,
    pub summary: String,
}

static SECTION_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\s*[.):-]\s*").unwrap());
static LABELED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:\d+\s*[.):-]\s*)?\*{0,2}([^:\n]{3,80}?)\*{0,2}\s*:\s*(\S.*)$").unwrap()
});

/// Parses the model's free-text batch response into discrete combinations.
/// Two strategies in sequence: blank-line-separated sections first, then a
/// labeled-line regex scan if the section pass recovered fewer than the
/// requested count. Model-response drift shows up here, not in the
/// generation call.
pub fn parse_combinations(response: &str) -> Vec<PictureCombination> {
    let sections = parse_sections(response);
    if sections.len() >= REQUESTED_COMBINATIONS {
        return sections;
    }

    let labeled = parse_labeled_lines(response);
    if labeled.len() > sections.len() {
        labeled
    } else {
        sections
    }
}

fn parse_sections(response: &str) -> Vec<PictureCombination> {
    let mut combinations = Vec::new();

    for section in SECTION_SPLIT.split(response) {
        let section = section.trim();
        if section.is_empty() {
            continue;
        }

        let mut lines = section.lines();
        let first = clean_line(lines.next().unwrap_or(""));
        let rest: Vec<&str> = lines.map(str::trim).filter(|l| !l.is_empty()).collect();

        if rest.is_empty() {
            // Single-line "Title: Summary" form.
            if let Some((title, summary)) = first.split_once(':') {
                let title = clean_line(title);
                let summary = summary.trim().to_string();
                if !title.is_empty() && !summary.is_empty() {
                    combinations.push(PictureCombination { title, summary });
                }
            }
            continue;
        }

        let title = first.trim_end_matches(':').trim().to_string();
        if title.is_empty() {
            continue;
        }
        combinations.push(PictureCombination {
            title,
            summary: rest.join(" "),
        });
    }

    combinations
}

fn parse_labeled_lines(response: &str) -> Vec<PictureCombination> {
    LABELED_LINE
        .captures_iter(response)
        .map(|caps| PictureCombination {
            title: caps[1].trim().to_string(),
            summary: caps[2].trim().to_string(),
        })
        .collect()
}

/// Strips leading numbering and markdown decoration from a candidate line.
fn clean_line(line: &str) -> String {
    let line = LEADING_NUMBER.replace(line.trim(), "");
    line.trim_matches('*')
        .trim_start_matches('#')
        .trim()
        .to_string()
}
