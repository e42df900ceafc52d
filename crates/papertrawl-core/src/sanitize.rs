use once_cell::sync::Lazy;
use regex::Regex;

const MAX_FILENAME_CHARS: usize = 150;

static CONTROL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x00-\x1f\x7f]").expect("valid regex"));
static ILLEGAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Turn an arbitrary paper title (or query) into a string safe to embed in a
/// filename on every mainstream filesystem: control characters become spaces,
/// reserved characters become underscores, whitespace runs collapse to a
/// single space, and the result is trimmed and capped at 150 characters.
pub fn sanitize_filename(raw: &str) -> String {
    let no_control = CONTROL_RE.replace_all(raw, " ");
    let no_illegal = ILLEGAL_RE.replace_all(&no_control, "_");
    let collapsed = WHITESPACE_RE.replace_all(&no_illegal, " ");
    collapsed.trim().chars().take(MAX_FILENAME_CHARS).collect()
}
