use regex::Regex;

/// A single URL-exclusion rule
#[derive(Debug, Clone)]
enum ExclusionRule {
    /// Pattern with `*` wildcards, compiled to an unanchored regex
    Wildcard(Regex),
    /// Plain pattern, matched as a substring
    Substring(String),
}

/// Compiled set of URL-exclusion patterns from a user's settings
///
/// Patterns are separated by commas or newlines, trimmed, and lowercased.
/// A pattern containing `*` is a wildcard where `*` matches any run of
/// characters and everything else is literal; it may match anywhere in the
/// URL. Any other pattern is a plain substring match. Matching is
/// case-insensitive.
///
/// # Examples
///
/// ```
/// use contact_scout::url::ExclusionPatterns;
///
/// let patterns = ExclusionPatterns::parse("*/blog/*, *.pdf\nwp-admin");
/// assert!(patterns.is_excluded("https://example.com/blog/post-1"));
/// assert!(patterns.is_excluded("https://example.com/files/Menu.PDF"));
/// assert!(patterns.is_excluded("https://example.com/wp-admin"));
/// assert!(!patterns.is_excluded("https://example.com/contact"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExclusionPatterns {
    rules: Vec<ExclusionRule>,
}

impl ExclusionPatterns {
    /// Parses the raw settings text into compiled rules
    pub fn parse(raw: &str) -> Self {
        let rules = raw
            .split(|c| c == ',' || c == '\n')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .map(|pattern| compile_rule(&pattern))
            .collect();

        Self { rules }
    }

    /// Returns true when the URL matches any rule
    pub fn is_excluded(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();
        self.rules.iter().any(|rule| match rule {
            ExclusionRule::Wildcard(re) => re.is_match(&url_lower),
            ExclusionRule::Substring(needle) => url_lower.contains(needle.as_str()),
        })
    }

    /// Number of compiled rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn compile_rule(pattern: &str) -> ExclusionRule {
    if !pattern.contains('*') {
        return ExclusionRule::Substring(pattern.to_string());
    }

    let source = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    match Regex::new(&source) {
        Ok(re) => ExclusionRule::Wildcard(re),
        Err(e) => {
            tracing::warn!("Exclusion pattern '{}' did not compile: {}", pattern, e);
            ExclusionRule::Substring(pattern.replace('*', ""))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_PATTERNS: &str = "*/blog/*\n*/news/*\n*/category/*\n*/tag/*\n*/cart/*\n*/checkout/*\n*/login/*\n*/register/*\n*/search/*\n*/cdn-cgi/*\n*/wp-admin/*\n*/wp-includes/*\n*.pdf\n*.zip\n*.xml\n*.json";

    #[test]
    fn test_empty_patterns_exclude_nothing() {
        let patterns = ExclusionPatterns::parse("");
        assert!(patterns.is_empty());
        assert!(!patterns.is_excluded("https://example.com/blog/x"));
    }

    #[test]
    fn test_separators_and_whitespace() {
        let patterns = ExclusionPatterns::parse(" a ,\n\n b,, ");
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn test_wildcard_matches_anywhere() {
        let patterns = ExclusionPatterns::parse("*/blog/*");
        assert!(patterns.is_excluded("https://example.com/blog/post"));
        assert!(patterns.is_excluded("https://example.com/en/blog/"));
        assert!(!patterns.is_excluded("https://example.com/blog"));
    }

    #[test]
    fn test_wildcard_escapes_regex_metacharacters() {
        let patterns = ExclusionPatterns::parse("*.pdf");
        assert!(patterns.is_excluded("https://example.com/menu.pdf"));
        // `.` is literal, so "xpdf" without a dot does not match
        assert!(!patterns.is_excluded("https://example.com/xpdf-viewer"));
    }

    #[test]
    fn test_substring_match() {
        let patterns = ExclusionPatterns::parse("privacy");
        assert!(patterns.is_excluded("https://example.com/privacy-policy"));
        assert!(!patterns.is_excluded("https://example.com/contact"));
    }

    #[test]
    fn test_case_insensitive() {
        let patterns = ExclusionPatterns::parse("*/Careers/*");
        assert!(patterns.is_excluded("https://example.com/CAREERS/jobs"));
    }

    #[test]
    fn test_default_patterns() {
        let patterns = ExclusionPatterns::parse(DEFAULT_PATTERNS);
        assert_eq!(patterns.len(), 16);
        assert!(patterns.is_excluded("https://shop.com/cart/items"));
        assert!(patterns.is_excluded("https://shop.com/sitemap.xml"));
        assert!(patterns.is_excluded("https://shop.com/wp-admin/edit.php"));
        assert!(!patterns.is_excluded("https://shop.com/contact-us"));
        assert!(!patterns.is_excluded("https://shop.com/about"));
    }
}
