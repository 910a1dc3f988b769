use url::Url;

/// Extracts the URI authority (`host[:port]`) of a URL
///
/// The host is lowercased; default ports are dropped by the parser, so
/// `https://example.com:443/` and `https://example.com/` share an authority.
///
/// # Arguments
///
/// * `url` - The absolute URL string
///
/// # Returns
///
/// * `Some(String)` - The lowercase authority
/// * `None` - If the URL does not parse or has no host
///
/// # Examples
///
/// ```
/// use contact_scout::url::host_of;
///
/// assert_eq!(host_of("https://Example.com/path"), Some("example.com".to_string()));
/// assert_eq!(host_of("http://127.0.0.1:8080/"), Some("127.0.0.1:8080".to_string()));
/// assert_eq!(host_of("not a url"), None);
/// ```
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    match parsed.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Checks whether two URLs share the same authority
///
/// Subdomains are distinct: `www.example.com` and `example.com` are not the
/// same domain.
pub fn is_same_domain(a: &str, b: &str) -> bool {
    match (host_of(a), host_of(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}
