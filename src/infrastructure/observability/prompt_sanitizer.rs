use std::sync::LazyLock;

use regex::Regex;

const MAX_VISIBLE_CHARS: usize = 100;

static SECRETS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?P<key>bearer\s+|api[_-]?key=|password=|secret=|token=)[^\s&"']+"#)
        .expect("secret pattern is valid")
});

/// Shortens a user question for logging and masks anything that looks like a
/// credential.
pub fn sanitize_prompt(prompt: &str) -> String {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return String::from("[EMPTY]");
    }

    let total = trimmed.chars().count();
    let visible = match trimmed.char_indices().nth(MAX_VISIBLE_CHARS) {
        Some((cut, _)) => format!("{}... ({total} chars total)", &trimmed[..cut]),
        None => trimmed.to_string(),
    };

    SECRETS.replace_all(&visible, "${key}[REDACTED]").into_owned()
}
