//! Business fields from a saved place-detail page.
//!
//! Selectors live in [`DetailSelectors`] so they can be swapped without
//! touching the parsing; the text clean-up (phones, ratings) is independent
//! of where the text came from.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

use crate::core::types::PlaceDetails;

pub const MIN_PHONE_DIGITS: usize = 10;
pub const MAX_PHONE_DIGITS: usize = 13;

/// Where a field's value lives on the element a selector matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    Text,
    Attr(String),
}

#[derive(Debug, Clone)]
pub struct FieldSelector {
    pub css: String,
    pub pick: Pick,
}

impl FieldSelector {
    pub fn text(css: &str) -> Self {
        Self {
            css: css.to_string(),
            pick: Pick::Text,
        }
    }

    pub fn attr(css: &str, attr: &str) -> Self {
        Self {
            css: css.to_string(),
            pick: Pick::Attr(attr.to_string()),
        }
    }
}

/// Ordered fallbacks per field; the first selector yielding non-empty text wins.
#[derive(Debug, Clone)]
pub struct DetailSelectors {
    pub name: Vec<FieldSelector>,
    pub address: Vec<FieldSelector>,
    pub website: Vec<FieldSelector>,
    pub phone: Vec<FieldSelector>,
    pub rating: Vec<FieldSelector>,
    pub hours: Vec<FieldSelector>,
    pub closed_marker: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            name: vec![
                FieldSelector::text("h1.fontHeadlineLarge"),
                FieldSelector::text("h1.DUwDvf"),
            ],
            address: vec![
                FieldSelector::text("button[data-item-id='address']"),
                FieldSelector::text("div.rogA2c div.Io6YTe"),
            ],
            website: vec![
                FieldSelector::attr("a[data-item-id='authority']", "href"),
                FieldSelector::attr("a[aria-label*='Website']", "href"),
            ],
            phone: vec![
                FieldSelector::text("button[data-item-id^='phone']"),
                FieldSelector::attr("button[aria-label*='Phone:']", "aria-label"),
                FieldSelector::attr("a[href^='tel:']", "href"),
            ],
            rating: vec![FieldSelector::attr("div[role='img'][aria-label]", "aria-label")],
            hours: vec![FieldSelector::attr("[aria-label*='Hours']", "aria-label")],
            closed_marker: "Permanently closed".to_string(),
        }
    }
}

fn pick_value(element: ElementRef<'_>, pick: &Pick) -> Option<String> {
    let raw = match pick {
        Pick::Text => element.text().collect::<Vec<_>>().join(" "),
        Pick::Attr(name) => element.value().attr(name)?.to_string(),
    };
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn first_match(document: &Html, fields: &[FieldSelector]) -> Option<String> {
    fields.iter().find_map(|field| {
        let selector = Selector::parse(&field.css).ok()?;
        document
            .select(&selector)
            .find_map(|el| pick_value(el, &field.pick))
    })
}

/// Parse a detail page. Missing fields stay `None`; this never fails.
pub fn parse_place_details(html: &str, url: &str, selectors: &DetailSelectors) -> PlaceDetails {
    let document = Html::parse_document(html);

    let phone = selectors
        .phone
        .iter()
        .filter_map(|f| first_match(&document, std::slice::from_ref(f)))
        .find_map(|raw| normalize_phone(&raw));

    let rating_text = first_match(&document, &selectors.rating);
    let rating = rating_text.as_deref().and_then(parse_rating);

    PlaceDetails {
        url: url.to_string(),
        name: first_match(&document, &selectors.name),
        address: first_match(&document, &selectors.address),
        website: first_match(&document, &selectors.website),
        phone,
        rating,
        rating_text,
        operating_hours: first_match(&document, &selectors.hours),
        permanently_closed: !selectors.closed_marker.is_empty()
            && html.contains(&selectors.closed_marker),
    }
}

static PHONE_SPAN: OnceLock<Regex> = OnceLock::new();
static RATING: OnceLock<Regex> = OnceLock::new();

/// Pull a phone number out of free text (`"Phone: +91 98765 43210"`,
/// `"tel:04425222944"`, ...). Keeps digits and a leading `+`; rejects
/// spans outside [`MIN_PHONE_DIGITS`]..=[`MAX_PHONE_DIGITS`] digits.
pub fn normalize_phone(text: &str) -> Option<String> {
    let re = PHONE_SPAN
        .get_or_init(|| Regex::new(r"\+?\d[\d\s().\-]{6,}\d").expect("static regex"));

    re.find_iter(text).find_map(|m| {
        let span = m.as_str();
        let digits: String = span.chars().filter(|c| c.is_ascii_digit()).collect();
        if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
            return None;
        }
        Some(if span.starts_with('+') {
            format!("+{}", digits)
        } else {
            digits
        })
    })
}

/// `"4.5 stars"` → 4.5. Accepts a decimal comma; values above 5 are rejected.
pub fn parse_rating(label: &str) -> Option<f64> {
    let re = RATING.get_or_init(|| Regex::new(r"(\d+(?:[.,]\d+)?)").expect("static regex"));
    let raw = re.captures(label)?.get(1)?.as_str().replace(',', ".");
    let value: f64 = raw.parse().ok()?;
    (0.0..=5.0).contains(&value).then_some(value)
}
