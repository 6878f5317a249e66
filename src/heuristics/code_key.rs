use regex::Regex;
use std::sync::LazyLock;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

/// Tokens this short that follow an accepted block are a neighbouring column
/// (row index, note number), not part of the product code.
const SHORT_TOKEN_MAX: usize = 2;

/// All maximal runs of ASCII digits in `text`, in order of appearance.
pub fn digit_tokens(text: &str) -> Vec<&str> {
    DIGIT_RUN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Concatenates tokens into a canonical key, stopping at the first short
/// token once something has been accepted.
///
/// Returns `None` when there is nothing to concatenate.
pub fn key_from_tokens(tokens: &[&str]) -> Option<String> {
    let mut key = String::new();
    for token in tokens {
        if token.len() <= SHORT_TOKEN_MAX && !key.is_empty() {
            break;
        }
        key.push_str(token);
    }
    (!key.is_empty()).then_some(key)
}

/// Canonical key of a free-form code such as `"14936 000 1000"` or `"09858-000-1"`.
pub fn canonical_key(text: &str) -> Option<String> {
    key_from_tokens(&digit_tokens(text))
}
