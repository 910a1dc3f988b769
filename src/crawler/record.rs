use crate::extract::{PageExtraction, SocialLinks};
use crate::fetch::FetchMethod;
use std::collections::BTreeSet;

/// Everything learned about one homepage and the internal pages visited for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedRecord {
    pub homepage_url: String,
    /// Every URL fetched for this homepage, homepage first
    pub checked_urls: Vec<String>,
    pub emails: BTreeSet<String>,
    /// First page flagged as a contact page, homepage included
    pub contact_page_url: Option<String>,
    pub social: SocialLinks,
    /// Status of the homepage fetch
    pub http_status: Option<u16>,
    /// Strategy that produced the homepage
    pub method: FetchMethod,
}

impl AggregatedRecord {
    /// Starts a record from the homepage's extraction
    pub fn from_homepage(
        homepage_url: impl Into<String>,
        page: PageExtraction,
        http_status: Option<u16>,
        method: FetchMethod,
    ) -> Self {
        let homepage_url = homepage_url.into();
        let contact_page_url = page.is_contact_page.then(|| homepage_url.clone());

        Self {
            checked_urls: vec![homepage_url.clone()],
            homepage_url,
            emails: page.emails,
            contact_page_url,
            social: page.social,
            http_status,
            method,
        }
    }

    /// Folds in an internal page
    ///
    /// Emails are unioned, the first contact page wins and platforms already
    /// present keep their link.
    pub fn absorb(&mut self, page_url: &str, page: PageExtraction) {
        self.emails.extend(page.emails);
        if self.contact_page_url.is_none() && page.is_contact_page {
            self.contact_page_url = Some(page_url.to_string());
        }
        self.social.merge_missing(&page.social);
    }

    pub fn mark_checked(&mut self, url: impl Into<String>) {
        self.checked_urls.push(url.into());
    }

    pub fn is_contact_page(&self) -> bool {
        self.contact_page_url.is_some()
    }

    pub fn email_count(&self) -> usize {
        self.emails.len()
    }
}
