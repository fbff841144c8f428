use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

/// Place-link selectors for a results page, most specific first.
pub const DEFAULT_PLACE_SELECTORS: &[&str] = &[
    "a[href*='maps/place']",
    "a[data-value*='maps/place']",
    "a[href*='/place/']",
    "div[data-result-index] a",
    ".hfpxzc",
];

/// Collect place URLs from a saved results page.
///
/// `extra_selectors` are tried before [`DEFAULT_PLACE_SELECTORS`]. Hrefs are
/// resolved against `base_url` and de-duplicated in document order.
pub fn extract_place_links(html: &str, base_url: &Url, extra_selectors: &[String]) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();
    let mut seen_hrefs = HashSet::new();

    let selectors = extra_selectors
        .iter()
        .map(String::as_str)
        .chain(DEFAULT_PLACE_SELECTORS.iter().copied());

    for selector_str in selectors {
        let selector = match Selector::parse(selector_str) {
            Ok(s) => s,
            Err(e) => {
                warn!("Ignoring invalid place selector '{}': {}", selector_str, e);
                continue;
            }
        };

        let before = links.len();
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
                continue;
            }

            let absolute_url = match base_url.join(href) {
                Ok(url) => url.to_string(),
                Err(_) => href.to_string(),
            };
            if seen_hrefs.insert(absolute_url.clone()) {
                links.push(absolute_url);
            }
        }
        if links.len() > before {
            debug!(
                "Found {} places with selector: {}",
                links.len() - before,
                selector_str
            );
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html><body><div role="feed">
          <div data-result-index="1">
            <a class="hfpxzc" href="/maps/place/Cafe+One/data=!3d28.61!4d77.21">Cafe One</a>
          </div>
          <div data-result-index="2">
            <a class="hfpxzc" href="https://www.google.com/maps/place/Cafe+Two/data=!3d28.62!4d77.22">Cafe Two</a>
          </div>
          <a href="/maps/place/Cafe+One/data=!3d28.61!4d77.21">dup</a>
          <a href="#top">top</a>
          <a href="https://www.google.com/intl/en/about">about</a>
        </div></body></html>
    "##;

    #[test]
    fn test_extracts_and_dedupes_place_links() {
        let base = Url::parse("https://www.google.com/maps/search/cafe/@28.6,77.2,13000m").unwrap();
        let links = extract_place_links(PAGE, &base, &[]);
        assert_eq!(
            links,
            vec![
                "https://www.google.com/maps/place/Cafe+One/data=!3d28.61!4d77.21".to_string(),
                "https://www.google.com/maps/place/Cafe+Two/data=!3d28.62!4d77.22".to_string(),
            ]
        );
    }

    #[test]
    fn test_fragment_links_are_skipped() {
        let base = Url::parse("https://www.google.com/").unwrap();
        let links = extract_place_links(PAGE, &base, &["a".to_string()]);
        assert_eq!(links.len(), 3);
        assert!(links.iter().all(|l| !l.ends_with("#top")));
        assert!(links.contains(&"https://www.google.com/intl/en/about".to_string()));
    }

    #[test]
    fn test_invalid_extra_selector_is_skipped() {
        let base = Url::parse("https://www.google.com/").unwrap();
        let links = extract_place_links(PAGE, &base, &["a[[".to_string()]);
        assert_eq!(links.len(), 2);
    }
}
