//! Detail page extractor
//!
//! Turns one listing detail page into a [`ListingRecord`]. Every field is
//! extracted independently: a missing block leaves its fields at their empty
//! defaults and extraction carries on.
//!
//! # Markup contract
//!
//! | Field | Source |
//! |-------|--------|
//! | title | `h2.product-name` |
//! | price | `div.product-price`, first (grouped) digit run |
//! | seller_name | first `p` in `div.seller-name` |
//! | seller_phone | `a.phone` |
//! | views, updated_date, listing_id | `div.product-statistics p` rows, see [`STAT_LABELS`] |
//! | property fields | `ul.product-properties li.product-properties-i` rows, see [`PROPERTY_LABELS`] |
//! | extras | `div.product-extras p.product-extras-i`, joined with `"; "` |
//! | description | `p.product-text`, text nodes joined with a space (not run together), line breaks collapsed to spaces |

use crate::listing::labels::{self, lookup, LabelRule, PROPERTY_LABELS, STAT_LABELS};
use crate::listing::{ListingRecord, EXTRAS_SEPARATOR};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Errors that keep a detail page from producing a record
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Empty document for {url}")]
    EmptyDocument { url: String },

    #[error("Listing has no source URL")]
    MissingUrl,

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

fn compile(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::InvalidSelector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug)]
struct DetailSelectors {
    title: Selector,
    price: Selector,
    seller_name: Selector,
    paragraph: Selector,
    phone: Selector,
    statistics: Selector,
    properties: Selector,
    property_row: Selector,
    property_label: Selector,
    property_value: Selector,
    extras: Selector,
    extras_item: Selector,
    description: Selector,
}

impl DetailSelectors {
    fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            title: compile("h2.product-name")?,
            price: compile("div.product-price")?,
            seller_name: compile("div.seller-name")?,
            paragraph: compile("p")?,
            phone: compile("a.phone")?,
            statistics: compile("div.product-statistics")?,
            properties: compile("ul.product-properties")?,
            property_row: compile("li.product-properties-i")?,
            property_label: compile("label")?,
            property_value: compile("div.product-properties-value")?,
            extras: compile("div.product-extras")?,
            extras_item: compile("p.product-extras-i")?,
            description: compile("p.product-text")?,
        })
    }
}

/// Text of an element with each text node trimmed, joined by `separator`
fn joined_text(element: ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

fn stripped_text(element: ElementRef<'_>) -> String {
    joined_text(element, "")
}

/// Parses detail pages into listing records
///
/// Selectors are compiled once; the extractor is shared by all fan-out tasks.
#[derive(Debug)]
pub struct DetailExtractor {
    selectors: DetailSelectors,
}

impl DetailExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            selectors: DetailSelectors::new()?,
        })
    }

    /// Extracts a record from a detail page
    ///
    /// Missing markup is never an error; an error means the page as a whole
    /// is unusable and the listing should be dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use biturbo_harvester::crawler::DetailExtractor;
    ///
    /// let extractor = DetailExtractor::new().unwrap();
    /// let html = r#"<div class="product-price">45 000 AZN</div>"#;
    /// let record = extractor.extract(html, "https://www.biturbo.az/az/elan/1").unwrap();
    /// assert_eq!(record.price, "45000");
    /// assert_eq!(record.currency, "AZN");
    /// ```
    pub fn extract(&self, html: &str, source_url: &str) -> Result<ListingRecord, ExtractError> {
        if source_url.trim().is_empty() {
            return Err(ExtractError::MissingUrl);
        }
        if html.trim().is_empty() {
            return Err(ExtractError::EmptyDocument {
                url: source_url.to_string(),
            });
        }

        let document = Html::parse_document(html);
        let mut record = ListingRecord::new(source_url);

        self.extract_title(&document, &mut record);
        self.extract_price(&document, &mut record);
        self.extract_seller(&document, &mut record);
        self.extract_statistics(&document, &mut record);
        self.extract_properties(&document, &mut record);
        self.extract_extras(&document, &mut record);
        self.extract_description(&document, &mut record);

        tracing::debug!(
            "Successfully extracted data for listing {}",
            record.listing_id
        );
        Ok(record)
    }

    fn first<'a>(&self, document: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
        document.select(selector).next()
    }

    fn extract_title(&self, document: &Html, record: &mut ListingRecord) {
        if let Some(title) = self.first(document, &self.selectors.title) {
            record.title = stripped_text(title);
        }
    }

    fn extract_price(&self, document: &Html, record: &mut ListingRecord) {
        let price = self
            .first(document, &self.selectors.price)
            .and_then(|element| labels::parse_price(&stripped_text(element)));

        if let Some(price) = price {
            record.price = price;
        }
    }

    fn extract_seller(&self, document: &Html, record: &mut ListingRecord) {
        let name = self
            .first(document, &self.selectors.seller_name)
            .and_then(|block| block.select(&self.selectors.paragraph).next());
        if let Some(name) = name {
            record.seller_name = stripped_text(name);
        }

        if let Some(phone) = self.first(document, &self.selectors.phone) {
            record.seller_phone = stripped_text(phone);
        }
    }

    fn extract_statistics(&self, document: &Html, record: &mut ListingRecord) {
        let Some(block) = self.first(document, &self.selectors.statistics) else {
            return;
        };

        for row in block.select(&self.selectors.paragraph) {
            let text: String = row.text().collect();
            apply_label(STAT_LABELS, &text, &text, record);
        }
    }

    fn extract_properties(&self, document: &Html, record: &mut ListingRecord) {
        let Some(list) = self.first(document, &self.selectors.properties) else {
            return;
        };

        for row in list.select(&self.selectors.property_row) {
            let label = row.select(&self.selectors.property_label).next();
            let value = row.select(&self.selectors.property_value).next();

            if let (Some(label), Some(value)) = (label, value) {
                apply_label(
                    PROPERTY_LABELS,
                    &stripped_text(label),
                    &stripped_text(value),
                    record,
                );
            }
        }
    }

    fn extract_extras(&self, document: &Html, record: &mut ListingRecord) {
        let Some(block) = self.first(document, &self.selectors.extras) else {
            return;
        };

        record.extras = block
            .select(&self.selectors.extras_item)
            .map(stripped_text)
            .collect::<Vec<_>>()
            .join(EXTRAS_SEPARATOR);
    }

    fn extract_description(&self, document: &Html, record: &mut ListingRecord) {
        if let Some(description) = self.first(document, &self.selectors.description) {
            record.description = joined_text(description, " ")
                .replace(['\n', '\r'], " ")
                .trim()
                .to_string();
        }
    }
}

/// Copies a labelled value into the record field its label maps to
///
/// Unknown labels and values the rule cannot reduce leave the record as is.
fn apply_label(table: &[LabelRule], label: &str, value: &str, record: &mut ListingRecord) {
    if let Some(rule) = lookup(table, label) {
        if let Some(reduced) = rule.rule.apply(value) {
            record.set(rule.field, reduced);
        }
    }
}
