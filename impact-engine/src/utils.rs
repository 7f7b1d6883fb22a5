use crate::types::FETCH_TIME_FORMAT;
use chrono::Local;

/// Wall-clock stamp used as `published` for items whose source gave no date.
pub fn fetch_timestamp() -> String {
    Local::now().format(FETCH_TIME_FORMAT).to_string()
}

/// Text clean-up for model replies and feed content
pub mod text {
    const FENCE: &str = "```";

    /// Remove a markdown code fence around a model reply.
    ///
    /// The opening fence may carry a language tag (```` ```json ````); either
    /// fence may be missing. Text without fences is only trimmed.
    pub fn strip_code_fence(raw: &str) -> &str {
        let mut text = raw.trim();

        if let Some(rest) = text.strip_prefix(FENCE) {
            text = skip_language_tag(rest);
        }
        if let Some(rest) = text.strip_suffix(FENCE) {
            text = rest;
        }

        text.trim()
    }

    fn skip_language_tag(after_fence: &str) -> &str {
        let tag_len = after_fence
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
            .unwrap_or(after_fence.len());
        let rest = &after_fence[tag_len..];

        // A tag must be followed by whitespace or the payload itself.
        match rest.chars().next() {
            None => rest,
            Some(c) if c.is_whitespace() || c == '{' || c == '[' => rest,
            Some(_) => after_fence,
        }
    }

    /// The outermost `{ ... }` span of `text`, for replies that wrap the JSON in prose.
    pub fn extract_json_object(text: &str) -> Option<&str> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        (start < end).then(|| &text[start..=end])
    }

    /// Drop HTML tags and collapse whitespace. Feed summaries are often HTML.
    pub fn extract_text_from_html(html: &str) -> String {
        html.chars()
            .fold((String::new(), false), |(mut text, in_tag), c| match c {
                '<' => (text, true),
                '>' => {
                    text.push(' ');
                    (text, false)
                }
                _ if !in_tag => {
                    text.push(c);
                    (text, in_tag)
                }
                _ => (text, in_tag),
            })
            .0
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Cut `text` to at most `max_chars` characters on a char boundary.
    pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }
}
