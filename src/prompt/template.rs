use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

/// Vocabulary the sibling-uniqueness pass checks picture captions against.
pub const KEYWORD_THEMES: &[&str] = &[
    "stress",
    "free",
    "eco",
    "friendly",
    "safe",
    "damage",
    "fast",
    "efficient",
    "professional",
    "affordable",
    "reliable",
    "convenient",
    "simplified",
    "streamlined",
    "worry",
    "seamless",
    "easy",
    "quick",
    "disposal",
    "recycling",
];

/// Words kept lowercase by `title_case` unless they open the string.
const SMALL_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

static KEYWORD_BRACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{\{\s*keyword\s*\}\}").unwrap());
static KEYWORD_BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bKEYWORD\b").unwrap());
static SUBTOPICS_BRACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{\{\s*subtopics\s*\}\}").unwrap());
static MD_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s*").unwrap());
static MD_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]*)\*\*").unwrap());
static MD_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[-*•]\s+").unwrap());

/// Replaces every accepted spelling of the keyword placeholder —
/// `{{keyword}}` in any case, `{{KEYWORD}}`, and the bare whole word
/// `KEYWORD` — with the literal runtime keyword. Idempotent for ordinary
/// keywords.
pub fn substitute_keyword(text: &str, keyword: &str) -> String {
    let text = KEYWORD_BRACES.replace_all(text, NoExpand(keyword));
    KEYWORD_BARE
        .replace_all(&text, NoExpand(keyword))
        .into_owned()
}

/// Substitutes a rendered subtopic list into `{{subtopics}}` if the template
/// carries that placeholder. Returns `None` when it does not, so the caller
/// can append instead.
pub fn substitute_subtopics(text: &str, rendered: &str) -> Option<String> {
    if !SUBTOPICS_BRACES.is_match(text) {
        return None;
    }
    Some(
        SUBTOPICS_BRACES
            .replace_all(text, NoExpand(rendered))
            .into_owned(),
    )
}

pub fn render_subtopics(subtopics: &[String]) -> String {
    subtopics
        .iter()
        .map(|s| format!("- {}", s.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strips markdown headers, bold markers, and leading bullet markers from a
/// model response.
pub fn strip_markdown(text: &str) -> String {
    let text = MD_HEADER.replace_all(text, "");
    let text = MD_BOLD.replace_all(&text, "$1");
    MD_BULLET.replace_all(&text, "").into_owned()
}

/// Title-cases a string, keeping small words lowercase except in first
/// position. The very first character of the result is always uppercased.
pub fn title_case(text: &str) -> String {
    let words: Vec<String> = text
        .split_whitespace()
        .enumerate()
        .map(|(index, word)| {
            let lower = word.to_lowercase();
            if index > 0 && SMALL_WORDS.contains(&lower.as_str()) {
                lower
            } else {
                capitalize(word)
            }
        })
        .collect();

    force_first_uppercase(&words.join(" "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn force_first_uppercase(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// First line of a sibling output, used as its "used phrase".
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

/// Theme-vocabulary words that appear anywhere in the text.
pub fn theme_hits(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    KEYWORD_THEMES
        .iter()
        .copied()
        .filter(|theme| lower.contains(theme))
        .collect()
}

/// Anti-repetition rules injected into the system instruction for picture
/// fields.
const PICTURE_RULES: &str = r#"

Rules for picture captions:
1. Never reuse a phrase that already appears in another caption.
2. Never open two captions with the same word.
3. Vary sentence structure between captions.
4. Do not repeat a benefit another caption already claims.
5. Avoid stock phrases such as "look no further" or "we've got you covered".
6. Keep each caption under 40 words.
7. Each caption must highlight a different aspect of the service."#;

pub fn system_instruction(keyword: &str, picture_field: bool) -> String {
    let mut system = format!(
        "You are writing website copy for a local service business. \
         Every piece of content is about \"{}\". Write plainly and concretely. \
         Do not narrate what you are doing and do not mention these instructions.",
        keyword.trim()
    );
    if picture_field {
        system.push_str(PICTURE_RULES);
    }
    system
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_three_placeholder_spellings_are_replaced() {
        let template = "Write about {{keyword}}. Also {{KEYWORD}} and plain KEYWORD here.";
        let result = substitute_keyword(template, "mattress removal");
        assert_eq!(
            result,
            "Write about mattress removal. Also mattress removal and plain mattress removal here."
        );
    }

    #[test]
    fn bare_replacement_is_whole_word_only() {
        let result = substitute_keyword("KEYWORDS stay, KEYWORD goes", "junk");
        assert_eq!(result, "KEYWORDS stay, junk goes");
    }

    #[test]
    fn substitution_is_idempotent() {
        let template = "Intro for {{keyword}}, mentioning KEYWORD twice.";
        let once = substitute_keyword(template, "couch removal");
        let twice = substitute_keyword(&once, "couch removal");
        assert_eq!(once, twice);
    }

    #[test]
    fn substitution_does_not_expand_dollar_signs() {
        let result = substitute_keyword("{{keyword}}", "$99 junk pickup");
        assert_eq!(result, "$99 junk pickup");
    }

    #[test]
    fn subtopics_placeholder_is_optional() {
        let rendered = render_subtopics(&["One".to_string(), "Two".to_string()]);
        assert_eq!(rendered, "- One\n- Two");

        let substituted = substitute_subtopics("Cover:\n{{subtopics}}", &rendered).unwrap();
        assert_eq!(substituted, "Cover:\n- One\n- Two");

        assert!(substitute_subtopics("No placeholder here", &rendered).is_none());
    }

    #[test]
    fn markdown_is_stripped() {
        let raw = "## Heading\n**Bold claim** stands\n- bullet one\n* bullet two";
        let clean = strip_markdown(raw);
        assert_eq!(clean, "Heading\nBold claim stands\nbullet one\nbullet two");
    }

    #[test]
    fn title_case_lowercases_small_words() {
        assert_eq!(
            title_case("the best junk removal in the city"),
            "The Best Junk Removal in the City"
        );
        assert_eq!(title_case("a fresh start"), "A Fresh Start");
    }

    #[test]
    fn first_character_is_always_uppercase() {
        assert_eq!(title_case("of mice and men"), "Of Mice and Men");
        let cased = title_case("fast mattress removal");
        assert!(cased.chars().next().unwrap().is_uppercase());
    }

    #[test]
    fn theme_hits_match_the_fixed_vocabulary() {
        let hits = theme_hits("Stress-Free Hauling\nWe make it easy.");
        assert!(hits.contains(&"stress"));
        assert!(hits.contains(&"free"));
        assert!(hits.contains(&"easy"));
        assert!(!hits.contains(&"recycling"));
    }

    #[test]
    fn picture_system_instruction_carries_the_rules() {
        let plain = system_instruction("junk removal", false);
        let picture = system_instruction("junk removal", true);
        assert!(plain.contains("junk removal"));
        assert!(!plain.contains("Rules for picture captions"));
        assert!(picture.contains("Rules for picture captions"));
        // Seven numbered rules.
        for n in 1..=7 {
            assert!(picture.contains(&format!("{n}. ")));
        }
    }
}
