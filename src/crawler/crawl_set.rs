use crate::extract::CategorizedLinks;
use crate::url::ExclusionPatterns;
use std::collections::HashSet;

/// Picks the internal pages to visit for one homepage
///
/// Categories contribute in priority order (contact, footer, header, body),
/// each in full before the next. Excluded and repeated URLs are dropped
/// before the list is cut to `max_links`.
///
/// # Arguments
///
/// * `links` - Categorized links of the homepage
/// * `exclusions` - The user's URL-exclusion patterns
/// * `max_links` - Maximum number of internal pages per homepage
pub fn build_crawl_list(
    links: &CategorizedLinks,
    exclusions: &ExclusionPatterns,
    max_links: usize,
) -> Vec<String> {
    let mut seen = HashSet::new();

    links
        .in_priority_order()
        .filter(|url| !exclusions.is_excluded(url))
        .filter(|url| seen.insert(url.as_str()))
        .take(max_links)
        .cloned()
        .collect()
}
