//! Content extraction module
//!
//! Pure functions over fetched HTML:
//! - Email harvesting with de-obfuscation and validation
//! - Business social-profile detection
//! - Structured internal-link categorization
//! - Contact-page detection
//!
//! None of these fail: malformed HTML degrades to partial results.

mod contact;
mod email;
mod links;
mod social;

pub use contact::is_contact_page;
pub use email::{
    clean_email, deobfuscate, extract_emails, extract_emails_from_text, is_valid_email,
    EmailFilterRule, EmailFilters, FilterKind,
};
pub use links::{extract_structured_links, is_contact_link, CategorizedLinks, LinkCategory};
pub use social::{clean_social_url, extract_social_links, Platform, SocialLinks};

use scraper::Html;
use std::collections::BTreeSet;

/// Keywords that mark contact-like pages and links
pub const CONTACT_KEYWORDS: &[&str] = &[
    "contact",
    "contact-us",
    "contactus",
    "get-in-touch",
    "reach-us",
    "about-us",
    "aboutus",
    "about",
    "team",
    "support",
    "help",
];

/// Everything extracted from one fetched page
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub emails: BTreeSet<String>,
    pub links: CategorizedLinks,
    pub social: SocialLinks,
    pub is_contact_page: bool,
}

/// Parses a page once and runs every extractor over it
///
/// # Arguments
///
/// * `page_url` - Absolute URL the HTML was fetched from
/// * `html` - The raw HTML body
/// * `filters` - The run's compiled email filters
pub fn extract_page(page_url: &str, html: &str, filters: &EmailFilters) -> PageExtraction {
    let document = Html::parse_document(html);

    PageExtraction {
        emails: extract_emails(html, &document, filters),
        links: extract_structured_links(page_url, &document),
        social: extract_social_links(&document),
        is_contact_page: is_contact_page(page_url, &document),
    }
}
