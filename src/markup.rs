//! HTML-safe rendering of note fields.

/// Escape text for embedding in card markup.
///
/// Each raw string is escaped exactly once; escaping already-escaped text
/// escapes the ampersands again.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render examples as an unordered list, preserving their order.
pub fn render_examples(examples: &[String]) -> String {
    let items: String = examples
        .iter()
        .map(|example| format!("<li>{}</li>", escape_html(example)))
        .collect();
    format!("<ul>{}</ul>", items)
}
