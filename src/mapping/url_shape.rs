use std::sync::LazyLock;

use regex::Regex;

static BARE_DOMAIN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?i)(www\.)?([a-z0-9]([a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}(:\d+)?([/?#]\S*)?$").ok()
});

/// Cheap URL-shape check: a web scheme, an explicit `://`, or a bare domain
/// such as `acme.io/about`. Whitespace anywhere fails.
pub fn looks_like_url(value: &str) -> bool {
    let v = value.trim();
    if v.is_empty() || v.len() > 2000 || v.chars().any(char::is_whitespace) {
        return false;
    }

    let lower = v.to_lowercase();
    if lower.starts_with("http:") || lower.starts_with("https:") || lower.contains("://") {
        return true;
    }

    BARE_DOMAIN.as_ref().is_some_and(|re| re.is_match(v))
}
