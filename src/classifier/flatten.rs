use serde_json::Value;

/// One line of document text in document order. `level` is 0 for body text
/// and the heading depth for `HEADING_n` styled paragraphs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentTextElement {
    pub text: String,
    pub is_heading: bool,
    pub level: u8,
}

/// Flattens a structured document into an ordered list of text elements,
/// recursing into table cells in document order. Paragraphs whose trimmed
/// text is empty are dropped, so no element ever carries empty text.
pub fn flatten_document(doc: &Value) -> Vec<DocumentTextElement> {
    let mut elements = Vec::new();
    if let Some(content) = doc.pointer("/body/content").and_then(Value::as_array) {
        flatten_content(content, &mut elements);
    }
    elements
}

fn flatten_content(content: &[Value], out: &mut Vec<DocumentTextElement>) {
    for item in content {
        if let Some(paragraph) = item.get("paragraph") {
            push_paragraph(paragraph, out);
        }
        if let Some(rows) = item.pointer("/table/tableRows").and_then(Value::as_array) {
            for row in rows {
                let cells = row.get("tableCells").and_then(Value::as_array);
                for cell in cells.into_iter().flatten() {
                    if let Some(cell_content) = cell.get("content").and_then(Value::as_array) {
                        flatten_content(cell_content, out);
                    }
                }
            }
        }
    }
}

fn push_paragraph(paragraph: &Value, out: &mut Vec<DocumentTextElement>) {
    let mut text = String::new();
    let elements = paragraph.get("elements").and_then(Value::as_array);
    for element in elements.into_iter().flatten() {
        if let Some(run) = element.pointer("/textRun/content").and_then(Value::as_str) {
            text.push_str(run);
        }
    }

    let text = text.trim().to_string();
    if text.is_empty() {
        return;
    }

    let level = paragraph
        .pointer("/paragraphStyle/namedStyleType")
        .and_then(Value::as_str)
        .and_then(heading_level)
        .unwrap_or(0);

    out.push(DocumentTextElement {
        text,
        is_heading: level > 0,
        level,
    });
}

fn heading_level(style: &str) -> Option<u8> {
    style.strip_prefix("HEADING_").and_then(|n| n.parse().ok())
}
