//! Structured internal-link categorization
//!
//! Same-domain links are grouped by where they appear on the page:
//! - `header`: nav/header/menu containers
//! - `footer`: footer containers
//! - `body`: the main content element (`main`, `article`, `.content`,
//!   `#content`, falling back to `body`)
//! - `contact`: any link whose href or text carries a contact keyword,
//!   regardless of container

use crate::extract::CONTACT_KEYWORDS;
use crate::url::{is_same_domain, strip_fragment_and_query};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

static HEADER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("nav, header, .nav, .navbar, .menu, .header, #header, #nav, #menu")
        .expect("Header selector is hardcoded and valid")
});

static FOOTER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("footer, .footer, #footer").expect("Footer selector is hardcoded and valid")
});

static MAIN_CONTENT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["main", "article", ".content", "#content", "body"]
        .iter()
        .map(|s| Selector::parse(s).expect("Content selector is hardcoded and valid"))
        .collect()
});

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Anchor selector is hardcoded and valid"));

/// Link category, in crawl priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkCategory {
    Contact,
    Footer,
    Header,
    Body,
}

/// Same-domain links of one page, grouped by category
///
/// Each URL is absolute, fragment- and query-free, and appears in exactly
/// one category (its first placement wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedLinks {
    pub contact: Vec<String>,
    pub header: Vec<String>,
    pub footer: Vec<String>,
    pub body: Vec<String>,
}

impl CategorizedLinks {
    pub fn get(&self, category: LinkCategory) -> &[String] {
        match category {
            LinkCategory::Contact => &self.contact,
            LinkCategory::Footer => &self.footer,
            LinkCategory::Header => &self.header,
            LinkCategory::Body => &self.body,
        }
    }

    /// All links in crawl priority order: contact, footer, header, body
    pub fn in_priority_order(&self) -> impl Iterator<Item = &String> {
        self.contact
            .iter()
            .chain(self.footer.iter())
            .chain(self.header.iter())
            .chain(self.body.iter())
    }

    pub fn total(&self) -> usize {
        self.contact.len() + self.header.len() + self.footer.len() + self.body.len()
    }

    fn bucket_mut(&mut self, category: LinkCategory) -> &mut Vec<String> {
        match category {
            LinkCategory::Contact => &mut self.contact,
            LinkCategory::Footer => &mut self.footer,
            LinkCategory::Header => &mut self.header,
            LinkCategory::Body => &mut self.body,
        }
    }
}

/// Returns true when `href` or the anchor text contains a contact keyword
pub fn is_contact_link(href: &str, text: &str) -> bool {
    let combined = format!("{} {}", href, text).to_lowercase();
    CONTACT_KEYWORDS.iter().any(|kw| combined.contains(kw))
}

struct LinkCollector<'a> {
    page_url: &'a str,
    base: Option<Url>,
    seen: HashSet<String>,
    links: CategorizedLinks,
}

impl<'a> LinkCollector<'a> {
    fn new(page_url: &'a str) -> Self {
        Self {
            page_url,
            base: Url::parse(page_url).ok(),
            seen: HashSet::new(),
            links: CategorizedLinks::default(),
        }
    }

    fn add(&mut self, category: LinkCategory, href: &str) {
        let href = href.trim();
        if href.is_empty() {
            return;
        }
        let Some(base) = &self.base else {
            return;
        };
        let Ok(resolved) = base.join(href) else {
            return;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            return;
        }
        if !is_same_domain(self.page_url, resolved.as_str()) {
            return;
        }

        let cleaned = strip_fragment_and_query(resolved.as_str()).to_string();
        if self.seen.insert(cleaned.clone()) {
            self.links.bucket_mut(category).push(cleaned);
        }
    }

    /// Adds every link under `container`, diverting contact links
    fn add_container(&mut self, container: ElementRef, fallback: LinkCategory) {
        for link in container.select(&LINK_SELECTOR) {
            let href = link.value().attr("href").unwrap_or_default();
            let text = link.text().collect::<String>();
            if is_contact_link(href, text.trim()) {
                self.add(LinkCategory::Contact, href);
            } else {
                self.add(fallback, href);
            }
        }
    }
}

/// Categorizes the same-domain links of a parsed page
///
/// # Arguments
///
/// * `page_url` - Absolute URL of the page, used to resolve relative links
/// * `document` - The parsed HTML
///
/// # Returns
///
/// The categorized links; empty when `page_url` is not an absolute URL
pub fn extract_structured_links(page_url: &str, document: &Html) -> CategorizedLinks {
    let mut collector = LinkCollector::new(page_url);

    for nav in document.select(&HEADER_SELECTOR) {
        collector.add_container(nav, LinkCategory::Header);
    }

    for footer in document.select(&FOOTER_SELECTOR) {
        collector.add_container(footer, LinkCategory::Footer);
    }

    let main_content = MAIN_CONTENT_SELECTORS
        .iter()
        .find_map(|selector| document.select(selector).next());
    if let Some(main) = main_content {
        collector.add_container(main, LinkCategory::Body);
    }

    for link in document.select(&LINK_SELECTOR) {
        let href = link.value().attr("href").unwrap_or_default();
        let text = link.text().collect::<String>();
        if is_contact_link(href, text.trim()) {
            collector.add(LinkCategory::Contact, href);
        }
    }

    collector.links
}
