use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// a fence, then an optional word and whatever separates it from the rest of the line
static FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)```(?:([a-z][a-z0-9_+\-]*)([ \t]*(?:\r?\n|$)|[ \t]+)?)?").unwrap()
});

const SQL_TAGS: &[&str] = &["sql", "postgresql", "postgres", "pgsql", "psql", "plpgsql"];

// words that open a statement; a fence glued to one of these has no tag
const SQL_KEYWORDS: &[&str] = &[
    "select", "with", "insert", "update", "delete", "merge", "values", "table", "explain",
    "show", "create", "alter", "drop", "truncate",
];

/// remove every markdown code fence from model output and trim the rest
pub fn strip_code_fences(text: &str) -> String {
    let text = text.trim();
    if !text.contains("```") {
        return text.to_string();
    }

    FENCE_REGEX
        .replace_all(text, |caps: &Captures| fence_replacement(caps, text.len()))
        .trim()
        .to_string()
}

fn fence_replacement(caps: &Captures, text_len: usize) -> String {
    let Some(word) = caps.get(1) else {
        return String::new();
    };
    let Some(sep) = caps.get(2) else {
        return word.as_str().to_string();
    };

    let lower = word.as_str().to_ascii_lowercase();
    if SQL_KEYWORDS.contains(&lower.as_str()) {
        return format!("{}{}", word.as_str(), sep.as_str());
    }

    let ends_line = sep.as_str().contains('\n') || sep.end() == text_len;
    if SQL_TAGS.contains(&lower.as_str()) || ends_line {
        String::new()
    } else {
        format!("{}{}", word.as_str(), sep.as_str())
    }
}
