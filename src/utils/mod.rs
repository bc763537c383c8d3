use std::sync::LazyLock;

use regex::Regex;

static PERCENT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").ok());

/// Parse engine percentage text such as `" 42.3%"` into `42.3`.
///
/// Returns `None` for anything that is not a percentage in `0..=100`.
pub fn parse_percent(text: &str) -> Option<f32> {
    let re = PERCENT_RE.as_ref()?;
    let caps = re.captures(text)?;
    let percent: f32 = caps[1].parse().ok()?;

    if (0.0..=100.0).contains(&percent) {
        Some(percent)
    } else {
        None
    }
}

/// Comma-separated list for status messages.
pub fn join_languages<'a>(languages: impl IntoIterator<Item = &'a String>) -> String {
    languages
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
