//! Index page parser
//!
//! Extracts detail-page links from a search results page. Each listing entry
//! is a `div.products-i` card whose first `a.products-i-link` points at the
//! listing's detail page.

use scraper::{Html, Selector};
use url::Url;

/// CSS selector for one listing card on an index page
pub const LISTING_CARD_SELECTOR: &str = "div.products-i";

/// CSS selector for the detail link inside a listing card
pub const LISTING_LINK_SELECTOR: &str = "a.products-i-link[href]";

/// Extracts detail-page URLs from an index page, in document order
///
/// Relative links are resolved against `site_url`. Cards without a usable
/// link are skipped. Duplicates are kept.
///
/// # Example
///
/// ```
/// use biturbo_harvester::crawler::extract_listing_links;
/// use url::Url;
///
/// let html = r#"<div class="products-i"><a class="products-i-link" href="/az/elan/1">Car</a></div>"#;
/// let site = Url::parse("https://www.biturbo.az").unwrap();
/// let links = extract_listing_links(html, &site);
/// assert_eq!(links, vec!["https://www.biturbo.az/az/elan/1".to_string()]);
/// ```
pub fn extract_listing_links(html: &str, site_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let (Ok(card_selector), Ok(link_selector)) = (
        Selector::parse(LISTING_CARD_SELECTOR),
        Selector::parse(LISTING_LINK_SELECTOR),
    ) else {
        return links;
    };

    for card in document.select(&card_selector) {
        let href = card
            .select(&link_selector)
            .next()
            .and_then(|link| link.value().attr("href"));

        if let Some(absolute_url) = href.and_then(|href| resolve_link(href, site_url)) {
            links.push(absolute_url);
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_url() -> Url {
        Url::parse("https://www.biturbo.az").unwrap()
    }

    fn card(href: &str) -> String {
        format!(
            r#"<div class="products-i"><a class="products-i-link" href="{}"><div class="products-name">Car</div></a></div>"#,
            href
        )
    }

    #[test]
    fn test_extract_relative_links() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            card("/az/elan/101-bmw-x5"),
            card("/az/elan/102-kia-rio")
        );
        let links = extract_listing_links(&html, &site_url());
        assert_eq!(
            links,
            vec![
                "https://www.biturbo.az/az/elan/101-bmw-x5".to_string(),
                "https://www.biturbo.az/az/elan/102-kia-rio".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = card("https://other.example/az/elan/5");
        let links = extract_listing_links(&html, &site_url());
        assert_eq!(links, vec!["https://other.example/az/elan/5".to_string()]);
    }

    #[test]
    fn test_empty_index_page() {
        let html = r#"<html><body><div class="no-results">Heç nə tapılmadı</div></body></html>"#;
        assert!(extract_listing_links(html, &site_url()).is_empty());
    }

    #[test]
    fn test_links_outside_cards_are_ignored() {
        let html = format!(
            r#"<html><body><a class="products-i-link" href="/az/elan/9">Stray</a>{}</body></html>"#,
            card("/az/elan/10")
        );
        let links = extract_listing_links(&html, &site_url());
        assert_eq!(links, vec!["https://www.biturbo.az/az/elan/10".to_string()]);
    }

    #[test]
    fn test_card_without_link_is_skipped() {
        let html = format!(
            r#"<div class="products-i"><span>Sold</span></div>{}"#,
            card("/az/elan/11")
        );
        let links = extract_listing_links(&html, &site_url());
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let html = format!("{}{}", card("/az/elan/7"), card("/az/elan/7"));
        let links = extract_listing_links(&html, &site_url());
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], links[1]);
    }

    #[test]
    fn test_only_first_link_per_card() {
        let html = r#"<div class="products-i">
            <a class="products-i-link" href="/az/elan/1">Main</a>
            <a class="products-i-link" href="/az/elan/1#photos">Photos</a>
        </div>"#;
        let links = extract_listing_links(html, &site_url());
        assert_eq!(links, vec!["https://www.biturbo.az/az/elan/1".to_string()]);
    }

    #[test]
    fn test_resolve_link_skips_special_schemes() {
        let base = site_url();
        assert_eq!(resolve_link("javascript:void(0)", &base), None);
        assert_eq!(resolve_link("mailto:a@b.az", &base), None);
        assert_eq!(resolve_link("tel:+994501234567", &base), None);
        assert_eq!(resolve_link("data:text/html,x", &base), None);
        assert_eq!(resolve_link("#top", &base), None);
        assert_eq!(resolve_link("   ", &base), None);
        assert_eq!(resolve_link("ftp://files.example/x", &base), None);
    }
}
