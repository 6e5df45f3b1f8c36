//! Text framing sent to the embedding model.

/// Text after the final `.` in `path`, or `""` when there is none.
#[must_use]
pub fn language_hint(path: &str) -> &str {
    path.rsplit_once('.').map_or("", |(_, extension)| extension)
}

/// Render a chunk as `File: {path}\nLanguage: {extension}\n\n{content}`.
#[must_use]
pub fn format_for_embedding(path: &str, content: &str) -> String {
    let language = language_hint(path);
    let mut text = String::with_capacity(path.len() + language.len() + content.len() + 18);
    text.push_str("File: ");
    text.push_str(path);
    text.push_str("\nLanguage: ");
    text.push_str(language);
    text.push_str("\n\n");
    text.push_str(content);
    text
}
