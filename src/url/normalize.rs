/// Normalizes a seed or internal URL into its dedup key
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Prepend `https://` when the input has no `http://` or `https://` scheme
/// 3. Remove trailing slashes
///
/// The function never fails: malformed input is echoed back with the scheme
/// prepended.
///
/// # Examples
///
/// ```
/// use contact_scout::url::normalize_url;
///
/// assert_eq!(normalize_url("example.com/"), "https://example.com");
/// assert_eq!(normalize_url("http://example.com/about/"), "http://example.com/about");
/// ```
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();

    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    with_scheme.trim_end_matches('/').to_string()
}

/// Removes the fragment and query string from a URL
///
/// # Examples
///
/// ```
/// use contact_scout::url::strip_fragment_and_query;
///
/// assert_eq!(
///     strip_fragment_and_query("https://example.com/contact?ref=nav#form"),
///     "https://example.com/contact"
/// );
/// ```
pub fn strip_fragment_and_query(url: &str) -> &str {
    let without_fragment = url.split('#').next().unwrap_or(url);
    without_fragment.split('?').next().unwrap_or(without_fragment)
}
