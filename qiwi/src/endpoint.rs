//! Absolute URL resolution for endpoint paths.
//!
//! Relative paths are appended to the configured base URL with a `///`
//! separator marker, after which every run of three or more slashes is
//! collapsed to one. Because `scheme://` only ever contains two slashes it
//! survives the collapse, while the join point always ends up with exactly
//! one separator regardless of whether the base ends with `/` or the path
//! starts with one.

use std::sync::LazyLock;

use regex::Regex;

/// Separator inserted between the base URL and a relative path.
const JOIN_MARKER: &str = "///";

static SLASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("/{3,}").expect("valid slash-run pattern"));

/// Returns `true` if `url` already carries an `http://` or `https://` scheme.
#[must_use]
pub fn is_absolute(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Collapses every run of three or more consecutive `/` into a single `/`.
///
/// Runs of exactly two slashes are left untouched.
#[must_use]
pub fn collapse_slashes(url: &str) -> String {
    SLASH_RUN.replace_all(url, "/").into_owned()
}

/// Resolves `url` against `base_url`.
///
/// Absolute URLs are returned unchanged.
///
/// # Example
///
/// ```rust
/// use qiwi::endpoint::resolve;
///
/// let url = resolve("https://edge.qiwi.com/", "/person-profile/v1/profile/current");
/// assert_eq!(url, "https://edge.qiwi.com/person-profile/v1/profile/current");
///
/// let url = resolve("https://edge.qiwi.com", "https://api.qiwi.com/partner/bill");
/// assert_eq!(url, "https://api.qiwi.com/partner/bill");
/// ```
#[must_use]
pub fn resolve(base_url: &str, url: &str) -> String {
    if is_absolute(url) {
        return url.to_owned();
    }
    collapse_slashes(&format!("{base_url}{JOIN_MARKER}{url}"))
}
