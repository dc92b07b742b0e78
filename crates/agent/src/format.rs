//! Markdown-ish to HTML touch-ups for model output.
//!
//! Two substitutions, in order, each over all non-overlapping matches:
//! `**text**` becomes `<b>text</b>`, then `*text` up to a newline becomes
//! `<ul><li>text</li></ul>` (the newline is consumed).

use std::sync::LazyLock;

use regex_lite::Regex;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is a valid regex"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\n").expect("bullet pattern is a valid regex"));

/// Apply the bold and bullet substitutions to `text`.
pub fn format_text(text: &str) -> String {
    let bolded = BOLD.replace_all(text, "<b>${1}</b>");
    let listed = BULLET.replace_all(&bolded, "<ul><li>${1}</li></ul>");
    listed.into_owned()
}
