//! Email extraction
//!
//! Pipeline, in order:
//! - De-obfuscate `[at]`/`(dot)`/` at `/HTML-entity markers and leaked
//!   unicode escapes
//! - Collect `mailto:` targets
//! - Regex-scan the whole document and the text of contact-like elements
//! - Clean and validate every candidate against built-in blocklists and the
//!   user's active filters

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};
use std::collections::BTreeSet;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z0-9][a-z0-9._%+-]*@[a-z0-9][a-z0-9.-]*\.[a-z]{2,}\b")
        .expect("Email regex is hardcoded and valid")
});

static UNICODE_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\u([0-9a-fA-F]{4})").expect("Unicode escape regex is hardcoded and valid")
});

static ANGLE_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"u003[cCeE]").expect("Angle escape regex is hardcoded and valid"));

static EDGE_JUNK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[<>\[\]()"'\s:;,]+|[<>\[\]()"'\s:;,]+$"#)
        .expect("Edge junk regex is hardcoded and valid")
});

/// Marker replacements, applied in order, all case-insensitive
static OBFUSCATION_MARKERS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\s*\[\s*at\s*\]\s*", "@"),
        (r"\s*\(\s*at\s*\)\s*", "@"),
        (r"\s*\{\s*at\s*\}\s*", "@"),
        (r"\s*<\s*at\s*>\s*", "@"),
        (r"\s*\[\s*dot\s*\]\s*", "."),
        (r"\s*\(\s*dot\s*\)\s*", "."),
        (r"\s*\{\s*dot\s*\}\s*", "."),
        (r"\s*\[\s*arroba\s*\]\s*", "@"),
        (r"\s*\(\s*arroba\s*\)\s*", "@"),
    ]
    .iter()
    .map(|(pattern, replacement)| {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .expect("Obfuscation regex is hardcoded and valid");
        (re, *replacement)
    })
    .collect()
});

static WORDED_AT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+at\s+").expect("Worded at regex is hardcoded and valid"));

static WORDED_DOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+dot\s+").expect("Worded dot regex is hardcoded and valid"));

static HTML_AT_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)&#64;|&#x40;|&commat;").expect("Entity regex is hardcoded and valid")
});

static CONTACT_TEXT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("footer, .footer, #footer, .contact, #contact, .email, .mail")
        .expect("Contact text selector is hardcoded and valid")
});

static MAILTO_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Anchor selector is hardcoded and valid"));

/// Tracking, analytics and platform domains whose addresses are never contacts
const BLOCKED_EMAIL_DOMAINS: &[&str] = &[
    "sentry.io",
    "sentry.wixpress.com",
    "sentry-next.wixpress.com",
    "analytics.google.com",
    "google-analytics.com",
    "googletagmanager.com",
    "tracking.com",
    "email-tracking.com",
    "wixpress.com",
    "sharethis.com",
    "addthis.com",
    "users.noreply.github.com",
    "noreply.github.com",
    "reply.github.com",
    "notifications.google.com",
];

/// Local-part prefixes of automated or placeholder mailboxes
const BLOCKED_LOCAL_PREFIXES: &[&str] = &[
    "noreply",
    "no-reply",
    "donotreply",
    "do-not-reply",
    "bounce",
    "mailer",
    "daemon",
    "postmaster",
    "webmaster",
    "adminlocalhost",
    "root",
    "test",
    "example",
];

/// How a user-defined filter pattern is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Suffix,
    Contains,
    Regex,
}

impl FilterKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Suffix => "suffix",
            Self::Contains => "contains",
            Self::Regex => "regex",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "suffix" => Some(Self::Suffix),
            "contains" => Some(Self::Contains),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }
}

/// A user-defined rejection rule as stored by the settings collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailFilterRule {
    pub pattern: String,
    pub kind: FilterKind,
}

impl EmailFilterRule {
    pub fn new(pattern: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone)]
enum CompiledFilter {
    Suffix(String),
    Contains(String),
    Regex(Regex),
}

/// A user's active email filters, compiled once per run
///
/// Regex filters that fail to compile are logged and skipped.
#[derive(Debug, Clone, Default)]
pub struct EmailFilters {
    compiled: Vec<CompiledFilter>,
}

impl EmailFilters {
    pub fn new(rules: &[EmailFilterRule]) -> Self {
        let compiled = rules
            .iter()
            .filter_map(|rule| match rule.kind {
                FilterKind::Suffix => Some(CompiledFilter::Suffix(rule.pattern.to_lowercase())),
                FilterKind::Contains => {
                    Some(CompiledFilter::Contains(rule.pattern.to_lowercase()))
                }
                FilterKind::Regex => match RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                {
                    Ok(re) => Some(CompiledFilter::Regex(re)),
                    Err(e) => {
                        tracing::warn!("Skipping invalid email filter '{}': {}", rule.pattern, e);
                        None
                    }
                },
            })
            .collect();

        Self { compiled }
    }

    /// Returns true when any filter rejects the (lowercased) email
    pub fn rejects(&self, email: &str) -> bool {
        self.compiled.iter().any(|filter| match filter {
            CompiledFilter::Suffix(suffix) => email.ends_with(suffix.as_str()),
            CompiledFilter::Contains(needle) => email.contains(needle.as_str()),
            CompiledFilter::Regex(re) => re.is_match(email),
        })
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

/// Rewrites obfuscated addresses into plain form
///
/// # Examples
///
/// ```
/// use contact_scout::extract::deobfuscate;
///
/// assert_eq!(deobfuscate("john [at] example [dot] com"), "john@example.com");
/// assert_eq!(deobfuscate("sales&#64;acme.io"), "sales@acme.io");
/// ```
pub fn deobfuscate(text: &str) -> String {
    let unescaped = UNICODE_ESCAPE.replace_all(text, |caps: &regex::Captures| {
        u32::from_str_radix(&caps[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    let mut result = ANGLE_ESCAPE
        .replace_all(&unescaped, |caps: &regex::Captures| {
            if caps[0].eq_ignore_ascii_case("u003c") {
                "<"
            } else {
                ">"
            }
        })
        .into_owned();

    for (re, replacement) in OBFUSCATION_MARKERS.iter() {
        result = re.replace_all(&result, *replacement).into_owned();
    }

    result = replace_between_words(&result, &WORDED_AT, "@");
    result = replace_between_words(&result, &WORDED_DOT, ".");
    HTML_AT_ENTITY.replace_all(&result, "@").into_owned()
}

/// Replaces matches of `re` that sit directly between two word characters
fn replace_between_words(text: &str, re: &Regex, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for m in re.find_iter(text) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        if before.map_or(false, is_word_char) && after.map_or(false, is_word_char) {
            out.push_str(&text[last..m.start()]);
            out.push_str(replacement);
            last = m.end();
        }
    }

    out.push_str(&text[last..]);
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Strips surrounding punctuation and leaked unicode-escape remnants
pub fn clean_email(email: &str) -> String {
    let trimmed = EDGE_JUNK.replace_all(email, "");
    ANGLE_ESCAPE.replace_all(&trimmed, "").trim().to_string()
}

/// Decides whether a candidate address is a plausible contact email
///
/// # Rejection Rules
///
/// | Rule | Example |
/// |------|---------|
/// | Shorter than 5 chars or no `@` | `a@b` |
/// | Local part shorter than 2 chars | `a@acme.com` |
/// | Blocked domain, including subdomains | `x@o123.sentry.io` |
/// | Blocked local-part prefix | `noreply@acme.com` |
/// | Local part only digits and `-_.` | `12345678901@x.com` |
/// | Local part over 30 chars with no letter in its first 10 | tracking hashes |
/// | Any active user filter matches | `logo@2x.png` with a `.png` suffix filter |
pub fn is_valid_email(email: &str, filters: &EmailFilters) -> bool {
    let email = clean_email(&email.to_lowercase());

    if !email.contains('@') || email.chars().count() < 5 {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    if local.chars().count() < 2 {
        return false;
    }

    let blocked_domain = BLOCKED_EMAIL_DOMAINS
        .iter()
        .any(|blocked| domain == *blocked || domain.ends_with(&format!(".{}", blocked)));
    if blocked_domain {
        return false;
    }

    if BLOCKED_LOCAL_PREFIXES
        .iter()
        .any(|prefix| local.starts_with(prefix))
    {
        return false;
    }

    let digits_only: String = local
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | '.'))
        .collect();
    if !digits_only.is_empty() && digits_only.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    if local.chars().count() > 30 && !local.chars().take(10).any(|c| c.is_alphabetic()) {
        return false;
    }

    !filters.rejects(&email)
}

/// Scans free text for addresses after de-obfuscation
pub fn extract_emails_from_text(text: &str, filters: &EmailFilters) -> BTreeSet<String> {
    let clean_text = deobfuscate(text);

    EMAIL_REGEX
        .find_iter(&clean_text)
        .map(|m| clean_email(&m.as_str().to_lowercase()))
        .filter(|email| is_valid_email(email, filters))
        .collect()
}

/// Collects decoded `mailto:` targets
fn extract_mailto_emails(document: &Html) -> BTreeSet<String> {
    document
        .select(&MAILTO_SELECTOR)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| {
            if !href.get(..7).map_or(false, |s| s.eq_ignore_ascii_case("mailto:")) {
                return None;
            }
            let address = href[7..].split('?').next()?.split('&').next()?;
            let decoded = urlencoding::decode(address)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| address.to_string());
            let decoded = decoded.trim().to_lowercase();
            decoded.contains('@').then(|| clean_email(&decoded))
        })
        .collect()
}

/// Extracts every valid address from a parsed page
///
/// Sources are `mailto:` links, the full raw document, and the text of
/// footer/contact/email-class elements. The result is lowercased,
/// deduplicated and contains only addresses accepted by [`is_valid_email`].
pub fn extract_emails(raw_html: &str, document: &Html, filters: &EmailFilters) -> BTreeSet<String> {
    let mut emails = extract_mailto_emails(document);
    emails.extend(extract_emails_from_text(raw_html, filters));

    for element in document.select(&CONTACT_TEXT_SELECTOR) {
        let text: String = element.text().collect::<Vec<_>>().join(" ");
        emails.extend(extract_emails_from_text(&text, filters));
    }

    emails.retain(|email| is_valid_email(email, filters));
    emails
}
