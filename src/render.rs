//! Formatting shared by the views: markdown, citation labels, timestamps,
//! trace dumps.

use crate::types::Citation;
use comrak::plugins::syntect::SyntectAdapter;
use comrak::{ComrakOptions, ComrakPlugins, markdown_to_html_with_plugins};
use once_cell::sync::Lazy;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options
});

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

/// Render a finished answer. Raw HTML in the answer is escaped.
pub fn markdown_to_html(md: &str) -> String {
    let adapter = SyntectAdapter::new(Some("base16-ocean.light"));
    let mut plugins = ComrakPlugins::default();
    plugins.render.codefence_syntax_highlighter = Some(&adapter);
    markdown_to_html_with_plugins(md, &MARKDOWN_OPTIONS, &plugins)
}

/// `Source 1: hr.pdf (p. 7)`; `index` is zero-based.
pub fn citation_label(index: usize, citation: &Citation) -> String {
    match citation.page {
        Some(page) => format!("Source {}: {} (p. {})", index + 1, citation.document_id, page),
        None => format!("Source {}: {}", index + 1, citation.document_id),
    }
}

pub fn format_timestamp(timestamp: OffsetDateTime) -> Option<String> {
    let mut datetime = timestamp;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(MESSAGE_TIME_FORMAT).ok()
}

/// Pretty-printed trace payload, shown verbatim under the answer.
pub fn trace_dump(trace: &serde_json::Value) -> String {
    serde_json::to_string_pretty(trace).unwrap_or_else(|_| trace.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn labels_with_and_without_page() {
        assert_eq!(
            citation_label(0, &Citation::new("hr.pdf", Some(7))),
            "Source 1: hr.pdf (p. 7)"
        );
        assert_eq!(
            citation_label(2, &Citation::new("handbook.pdf", None)),
            "Source 3: handbook.pdf"
        );
    }

    #[test]
    fn markdown_lists_and_escaping() {
        let html = markdown_to_html("Pay:\n\n- full pay\n- half pay\n\n<script>x</script>");
        assert!(html.contains("<li>full pay</li>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn timestamp_has_meridiem() {
        let formatted = format_timestamp(datetime!(2025-01-01 15:04 UTC)).unwrap();
        assert!(formatted.ends_with("AM") || formatted.ends_with("PM"));
        assert_eq!(formatted.len(), "03:04 PM".len());
    }

    #[test]
    fn trace_is_pretty_printed() {
        let dump = trace_dump(&json!({"question": "q", "num_tokens": 0}));
        assert!(dump.contains("\n"));
        assert!(dump.contains("\"num_tokens\": 0"));
    }
}
