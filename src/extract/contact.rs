use crate::extract::CONTACT_KEYWORDS;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Title selector is hardcoded and valid"));

static H1_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("H1 selector is hardcoded and valid"));

fn has_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    CONTACT_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Flags a page as a contact page when its URL, `<title>`, or any `<h1>`
/// contains a contact keyword
pub fn is_contact_page(url: &str, document: &Html) -> bool {
    if has_keyword(url) {
        return true;
    }

    let title_matches = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|title| has_keyword(&title.text().collect::<String>()))
        .unwrap_or(false);
    if title_matches {
        return true;
    }

    document
        .select(&H1_SELECTOR)
        .any(|h1| has_keyword(&h1.text().collect::<String>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_in_url() {
        let doc = Html::parse_document("<html><body></body></html>");
        assert!(is_contact_page("https://acme.com/Contact-Us", &doc));
        assert!(!is_contact_page("https://acme.com/pricing", &doc));
    }

    #[test]
    fn test_keyword_in_title() {
        let doc = Html::parse_document("<title>Get in Touch | Acme</title>");
        assert!(!is_contact_page("https://acme.com/x", &doc));

        let doc = Html::parse_document("<title>About Acme</title>");
        assert!(is_contact_page("https://acme.com/x", &doc));
    }

    #[test]
    fn test_keyword_in_any_h1() {
        let doc = Html::parse_document("<h1>Welcome</h1><h1>Meet the Team</h1>");
        assert!(is_contact_page("https://acme.com/x", &doc));
    }

    #[test]
    fn test_plain_page() {
        let doc = Html::parse_document("<title>Acme</title><h1>Welcome</h1>");
        assert!(!is_contact_page("https://acme.com/", &doc));
    }
}
