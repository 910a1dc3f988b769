//! Business social-media profile extraction
//!
//! Candidates are gathered in three passes (social/footer/nav containers,
//! links wrapping a platform icon, links whose attributes name a platform)
//! and the first candidate per platform that is not a share action wins.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use url::Url;

static SOCIAL_CONTAINER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "footer, .footer, #footer, .social, .social-links, .social-icons, .social-media, \
         #social, .follow, .follow-us, [class*=\"social\"], [id*=\"social\"], \
         nav, .nav, header, .header",
    )
    .expect("Social container selector is hardcoded and valid")
});

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Anchor selector is hardcoded and valid"));

static ICON_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("i, svg, span, img").expect("Icon selector is hardcoded and valid"));

const SHARE_TEXT_HINTS: &[&str] = &["share", "tweet this", "post this", "pin it"];
const SHARE_CLASS_HINTS: &[&str] = &["share", "sharer", "addthis", "sharethis"];

/// Minimum length of an accepted profile URL
const MIN_PROFILE_URL_LEN: usize = 20;

/// Supported social platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    Facebook,
    Twitter,
    LinkedIn,
    Instagram,
    YouTube,
    Pinterest,
    TikTok,
}

impl Platform {
    pub const ALL: [Platform; 7] = [
        Self::Facebook,
        Self::Twitter,
        Self::LinkedIn,
        Self::Instagram,
        Self::YouTube,
        Self::Pinterest,
        Self::TikTok,
    ];

    /// Lowercase platform name, also used as an icon hint
    pub fn name(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::LinkedIn => "linkedin",
            Self::Instagram => "instagram",
            Self::YouTube => "youtube",
            Self::Pinterest => "pinterest",
            Self::TikTok => "tiktok",
        }
    }

    fn domains(&self) -> &'static [&'static str] {
        match self {
            Self::Facebook => &["facebook.com", "fb.com", "fb.me"],
            Self::Twitter => &["twitter.com", "x.com"],
            Self::LinkedIn => &["linkedin.com"],
            Self::Instagram => &["instagram.com", "instagr.am"],
            Self::YouTube => &["youtube.com", "youtu.be"],
            Self::Pinterest => &["pinterest.com", "pin.it"],
            Self::TikTok => &["tiktok.com"],
        }
    }

    /// Href tokens that mark a share/intent/content link rather than a profile
    fn share_tokens(&self) -> &'static [&'static str] {
        match self {
            Self::Facebook => &[
                "sharer", "share.php", "dialog", "plugins", "login", "/groups/", "photo.php",
                "events/", "l.php",
            ],
            Self::Twitter => &["share", "intent", "search", "hashtag", "/i/", "status/", "widgets"],
            Self::LinkedIn => &["sharearticle", "share?", "cws/share", "login", "signup"],
            Self::Instagram => &["/p/", "/explore/", "/accounts/", "/direct/", "/reel/", "share"],
            Self::YouTube => &["watch?", "embed/", "share", "playlist?", "results?"],
            Self::Pinterest => &["/pin/", "create", "share", "button"],
            Self::TikTok => &["share", "embed", "/video/", "/tag/"],
        }
    }

    fn class_hints(&self) -> &'static [&'static str] {
        match self {
            Self::Facebook => &["facebook", "fb-", "fa-facebook"],
            Self::Twitter => &["twitter", "fa-twitter", "x-twitter"],
            Self::LinkedIn => &["linkedin", "fa-linkedin"],
            Self::Instagram => &["instagram", "fa-instagram", "insta"],
            Self::YouTube => &["youtube", "fa-youtube", "yt-"],
            Self::Pinterest => &["pinterest", "fa-pinterest"],
            Self::TikTok => &["tiktok", "fa-tiktok"],
        }
    }

    /// True when the href's host is one of the platform domains or a subdomain
    fn owns_href(&self, href: &str) -> bool {
        let Some(host) = href_host(href) else {
            return false;
        };
        self.domains()
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
    }
}

/// At most one profile URL per platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialLinks {
    links: BTreeMap<Platform, String>,
}

impl SocialLinks {
    pub fn get(&self, platform: Platform) -> Option<&str> {
        self.links.get(&platform).map(String::as_str)
    }

    /// Records a profile unless the platform is already resolved
    ///
    /// Returns true when the link was stored.
    pub fn set_if_absent(&mut self, platform: Platform, url: impl Into<String>) -> bool {
        if self.links.contains_key(&platform) {
            return false;
        }
        self.links.insert(platform, url.into());
        true
    }

    /// Fills platforms still missing here from `other`; existing entries win
    pub fn merge_missing(&mut self, other: &SocialLinks) {
        for (platform, url) in &other.links {
            self.links.entry(*platform).or_insert_with(|| url.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Platform, &str)> {
        self.links.iter().map(|(p, url)| (*p, url.as_str()))
    }
}

fn href_host(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;
    parsed.host_str().map(|h| h.to_lowercase())
}

fn class_string(element: &ElementRef) -> String {
    element
        .value()
        .attr("class")
        .unwrap_or_default()
        .to_lowercase()
}

fn is_share_link(href: &str, link: &ElementRef, platform: Platform) -> bool {
    let href_lower = href.to_lowercase();
    if platform
        .share_tokens()
        .iter()
        .any(|token| href_lower.contains(token))
    {
        return true;
    }

    let text = link.text().collect::<String>().trim().to_lowercase();
    if SHARE_TEXT_HINTS.iter().any(|hint| text.contains(hint)) {
        return true;
    }

    let classes = class_string(link);
    SHARE_CLASS_HINTS.iter().any(|hint| classes.contains(hint))
}

/// Drops the query string and trailing slashes from a profile URL
pub fn clean_social_url(href: &str) -> String {
    href.split('?')
        .next()
        .unwrap_or(href)
        .trim_end_matches('/')
        .to_string()
}

fn links_with_platform_icon<'a>(document: &'a Html) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    document.select(&LINK_SELECTOR).filter(|link| {
        link.select(&ICON_SELECTOR).any(|icon| {
            let classes = class_string(&icon);
            let alt = icon.value().attr("alt").unwrap_or_default().to_lowercase();
            let src = if icon.value().name() == "img" {
                icon.value().attr("src").unwrap_or_default().to_lowercase()
            } else {
                String::new()
            };
            Platform::ALL.iter().any(|p| {
                classes.contains(p.name()) || alt.contains(p.name()) || src.contains(p.name())
            })
        })
    })
}

fn links_with_platform_attributes<'a>(
    document: &'a Html,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    document.select(&LINK_SELECTOR).filter(|link| {
        let attrs = link.value();
        let href = attrs.attr("href").unwrap_or_default();
        let combined = format!(
            "{} {} {} {}",
            href.to_lowercase(),
            class_string(link),
            attrs.attr("title").unwrap_or_default().to_lowercase(),
            attrs.attr("aria-label").unwrap_or_default().to_lowercase()
        );
        Platform::ALL.iter().any(|p| {
            p.owns_href(href) || p.class_hints().iter().any(|hint| combined.contains(hint))
        })
    })
}

/// Extracts business profile links for the supported platforms
///
/// # Acceptance Rules
///
/// - href is not a fragment, `javascript:`, `mailto:` or `tel:` link
/// - href host belongs to the platform
/// - not a share action (platform share tokens in the href, share wording
///   in the link text, or share-widget classes)
/// - query-stripped URL is at least 20 characters
///
/// The first accepted candidate per platform wins.
pub fn extract_social_links(document: &Html) -> SocialLinks {
    let mut candidates: Vec<ElementRef> = Vec::new();

    for container in document.select(&SOCIAL_CONTAINER_SELECTOR) {
        candidates.extend(container.select(&LINK_SELECTOR));
    }
    candidates.extend(links_with_platform_icon(document));
    candidates.extend(links_with_platform_attributes(document));

    let mut social = SocialLinks::default();

    for link in candidates {
        if social.len() == Platform::ALL.len() {
            break;
        }

        let href = link.value().attr("href").unwrap_or_default().trim();
        let href_lower = href.to_lowercase();
        if href.is_empty()
            || href.starts_with('#')
            || href_lower.starts_with("javascript:")
            || href_lower.starts_with("mailto:")
            || href_lower.starts_with("tel:")
        {
            continue;
        }

        for platform in Platform::ALL {
            if social.get(platform).is_some() || !platform.owns_href(href) {
                continue;
            }
            if is_share_link(href, &link, platform) {
                continue;
            }
            let cleaned = if href.starts_with("//") {
                clean_social_url(&format!("https:{}", href))
            } else {
                clean_social_url(href)
            };
            if cleaned.len() >= MIN_PROFILE_URL_LEN {
                social.set_if_absent(platform, cleaned);
                break;
            }
        }
    }

    social
}

#[cfg(test)]
mod tests {
    use super::*;

    fn social_in(html: &str) -> SocialLinks {
        extract_social_links(&Html::parse_document(html))
    }

    #[test]
    fn test_profile_links_in_footer() {
        let social = social_in(
            r#"<footer>
                <a href="https://www.facebook.com/acmecorp/">Facebook</a>
                <a href="https://twitter.com/acmecorp?ref=footer">Twitter</a>
                <a href="https://www.linkedin.com/company/acme-corp">LinkedIn</a>
                <a href="https://www.instagram.com/acmecorp">Instagram</a>
                <a href="https://www.youtube.com/@acmecorp">YouTube</a>
                <a href="https://www.pinterest.com/acmecorp">Pinterest</a>
                <a href="https://www.tiktok.com/@acmecorp">TikTok</a>
            </footer>"#,
        );

        assert_eq!(social.len(), 7);
        assert_eq!(
            social.get(Platform::Facebook),
            Some("https://www.facebook.com/acmecorp")
        );
        assert_eq!(social.get(Platform::Twitter), Some("https://twitter.com/acmecorp"));
        assert_eq!(
            social.get(Platform::LinkedIn),
            Some("https://www.linkedin.com/company/acme-corp")
        );
    }

    #[test]
    fn test_share_actions_are_excluded() {
        let social = social_in(
            r#"<body>
                <a href="https://facebook.com/sharer.php?u=https://acme.com">Post</a>
                <a href="https://twitter.com/intent/tweet?text=hi">Tweet</a>
                <a href="https://www.linkedin.com/shareArticle?url=x">In</a>
                <a class="addthis_button" href="https://www.pinterest.com/acmecorp">P</a>
                <a href="https://www.instagram.com/acmecorp">Share on Instagram</a>
            </body>"#,
        );
        assert!(social.is_empty());
    }

    #[test]
    fn test_share_link_skipped_then_profile_found() {
        let social = social_in(
            r#"<body>
                <a href="https://facebook.com/sharer.php?u=https://acme.com">Share</a>
                <footer><a href="https://facebook.com/acmecorp">Like us</a></footer>
            </body>"#,
        );
        assert_eq!(social.get(Platform::Facebook), Some("https://facebook.com/acmecorp"));
    }

    #[test]
    fn test_first_match_wins() {
        let social = social_in(
            r#"<body>
                <div class="social-icons"><a href="https://facebook.com/acme-official">f</a></div>
                <a href="https://facebook.com/acme-other-page">f</a>
            </body>"#,
        );
        assert_eq!(
            social.get(Platform::Facebook),
            Some("https://facebook.com/acme-official")
        );
    }

    #[test]
    fn test_container_links_outrank_body_links() {
        let social = social_in(
            r#"<body>
                <p><a href="https://instagram.com/some-blogger">blogger</a></p>
                <footer><a href="https://instagram.com/acmecorp">ig</a></footer>
            </body>"#,
        );
        assert_eq!(social.get(Platform::Instagram), Some("https://instagram.com/acmecorp"));
    }

    #[test]
    fn test_icon_links_are_candidates() {
        let social = social_in(
            r#"<body><main>
                <a href="https://www.youtube.com/c/AcmeChannel"><i class="fa fa-youtube"></i></a>
            </main></body>"#,
        );
        assert_eq!(
            social.get(Platform::YouTube),
            Some("https://www.youtube.com/c/AcmeChannel")
        );
    }

    #[test]
    fn test_short_and_invalid_hrefs_ignored() {
        let social = social_in(
            r##"<footer>
                <a href="https://x.com/a">x</a>
                <a href="#facebook">fb</a>
                <a href="javascript:void(0)" class="facebook">fb</a>
                <a href="/facebook.com/acmecorp">relative</a>
            </footer>"##,
        );
        assert!(social.is_empty());
    }

    #[test]
    fn test_lookalike_hosts_do_not_match() {
        let social = social_in(
            r#"<footer><a href="https://www.netflix.com/title/acme-show">watch</a></footer>"#,
        );
        assert!(social.get(Platform::Twitter).is_none());
    }

    #[test]
    fn test_protocol_relative_href() {
        let social = social_in(r#"<footer><a href="//www.tiktok.com/@acmecorp">tt</a></footer>"#);
        assert_eq!(
            social.get(Platform::TikTok),
            Some("https://www.tiktok.com/@acmecorp")
        );
    }

    #[test]
    fn test_merge_missing_keeps_existing() {
        let mut first = SocialLinks::default();
        first.set_if_absent(Platform::Facebook, "https://facebook.com/first");

        let mut second = SocialLinks::default();
        second.set_if_absent(Platform::Facebook, "https://facebook.com/second");
        second.set_if_absent(Platform::LinkedIn, "https://linkedin.com/company/acme");

        first.merge_missing(&second);
        assert_eq!(first.get(Platform::Facebook), Some("https://facebook.com/first"));
        assert_eq!(
            first.get(Platform::LinkedIn),
            Some("https://linkedin.com/company/acme")
        );
    }

    #[test]
    fn test_set_if_absent() {
        let mut social = SocialLinks::default();
        assert!(social.set_if_absent(Platform::TikTok, "https://tiktok.com/@a"));
        assert!(!social.set_if_absent(Platform::TikTok, "https://tiktok.com/@b"));
        assert_eq!(social.get(Platform::TikTok), Some("https://tiktok.com/@a"));
    }
}
