//! Listing reference derivation

use regex::Regex;
use url::Url;

/// First capture group of `pattern`, or `""` when nothing matches
///
/// The pattern is tried against the URL path first (so `$`-anchored patterns
/// ignore query strings), then against the full URL for patterns that include
/// the host.
pub fn derive_reference(url: &str, pattern: &Regex) -> String {
    let path = Url::parse(url).ok().map(|u| u.path().to_string());

    path.as_deref()
        .and_then(|p| first_group(p, pattern))
        .or_else(|| first_group(url, pattern))
        .unwrap_or_default()
}

fn first_group(haystack: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
