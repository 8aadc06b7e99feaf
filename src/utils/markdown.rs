//! Telegram MarkdownV2 helpers

/// Characters MarkdownV2 treats as markup
const SPECIAL_CHARS: [char; 18] = [
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escapes every MarkdownV2 special character so `text` renders literally
///
/// # Example
/// ```
/// use konkur_countdown_bot::utils::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("1405/04/11 - 08:00"), "1405/04/11 \\- 08:00");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
