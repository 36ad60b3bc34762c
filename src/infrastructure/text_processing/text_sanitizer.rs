use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static HYPHEN_NEWLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<prefix>\w)-[ \t]*\r?\n[ \t]*(?P<suffix>\w)")
        .expect("hyphenation pattern is valid")
});

/// Normalizes text coming out of a document before it is split.
///
/// NFKC-folds ligatures, joins words hyphenated across line breaks, drops
/// control characters and soft hyphens, collapses runs of blank lines into a
/// single paragraph break and runs of spaces into one.
pub fn sanitize_extracted_text(raw: &str) -> String {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let normalized: String = raw
        .nfkc()
        .filter(|c| *c == '\n' || *c == '\t' || (!c.is_control() && *c != '\u{ad}'))
        .collect();
    let joined = HYPHEN_NEWLINE.replace_all(&normalized, "$prefix$suffix");

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in joined.lines() {
        let line = collapse_whitespace(line);
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs.join("\n\n")
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}
