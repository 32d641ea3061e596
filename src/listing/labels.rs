//! Label tables for the detail page's labelled blocks
//!
//! Property rows and statistics rows carry human-readable labels in the
//! site's language. Each table maps a label substring to the record field it
//! fills and to the way the raw value text is reduced. The first entry whose
//! key occurs in a label wins; labels matching nothing are ignored.

use crate::listing::ListingField;
use regex::Regex;
use std::sync::LazyLock;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("hardcoded regex pattern is valid"));

static FIRST_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}").expect("hardcoded regex pattern is valid"));

static AFTER_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*(.+)").expect("hardcoded regex pattern is valid"));

// Digit groups separated by at most one whitespace character ("45 000")
static GROUPED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+(?:\s?\d+)*").expect("hardcoded regex pattern is valid")
});

/// How a raw value text is reduced before it is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRule {
    /// Store the text as is
    Verbatim,
    /// Store the first run of digits
    FirstNumber,
    /// Store the first run of exactly four digits
    FirstYear,
    /// Store the trimmed text after the first colon
    AfterColon,
}

impl ValueRule {
    /// Reduces `text`; `None` means the field keeps its current value
    pub fn apply(&self, text: &str) -> Option<String> {
        match self {
            Self::Verbatim => Some(text.to_string()),
            Self::FirstNumber => FIRST_NUMBER.find(text).map(|m| m.as_str().to_string()),
            Self::FirstYear => FIRST_YEAR.find(text).map(|m| m.as_str().to_string()),
            Self::AfterColon => AFTER_COLON
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string()),
        }
    }
}

/// A label key, the field it fills and the value rule
#[derive(Debug, Clone, Copy)]
pub struct LabelRule {
    pub key: &'static str,
    pub field: ListingField,
    pub rule: ValueRule,
}

const fn label(key: &'static str, field: ListingField, rule: ValueRule) -> LabelRule {
    LabelRule { key, field, rule }
}

/// Property rows (`label` / value pairs)
pub const PROPERTY_LABELS: &[LabelRule] = &[
    label("Marka", ListingField::Brand, ValueRule::Verbatim),
    label("Model", ListingField::Model, ValueRule::Verbatim),
    label("Buraxılış ili", ListingField::Year, ValueRule::FirstYear),
    label("Ban növü", ListingField::BodyType, ValueRule::Verbatim),
    label("Rəng", ListingField::Color, ValueRule::Verbatim),
    label("Mühərrikin həcmi", ListingField::EngineVolume, ValueRule::Verbatim),
    label("Mühərrikin gücü", ListingField::EnginePower, ValueRule::Verbatim),
    label("Yanacaq növü", ListingField::FuelType, ValueRule::Verbatim),
    label("Yürüş", ListingField::Mileage, ValueRule::Verbatim),
    label("Sürətlər qutusu", ListingField::Transmission, ValueRule::Verbatim),
    label("Ötürücü", ListingField::Drivetrain, ValueRule::Verbatim),
    label("Şəhər", ListingField::Location, ValueRule::Verbatim),
];

/// Statistics rows (label and value share one text block)
pub const STAT_LABELS: &[LabelRule] = &[
    label("Baxışların sayı", ListingField::Views, ValueRule::FirstNumber),
    label("Yeniləndi", ListingField::UpdatedDate, ValueRule::AfterColon),
    label("Elanın nömrəsi", ListingField::ListingId, ValueRule::FirstNumber),
];

/// Finds the first rule whose key occurs in `label`
pub fn lookup<'a>(table: &'a [LabelRule], label: &str) -> Option<&'a LabelRule> {
    table.iter().find(|rule| label.contains(rule.key))
}

/// Extracts the numeric price from a price container's text
///
/// Thousands separators (commas and single spaces between digit groups) are
/// removed: `"45 000 AZN"` becomes `"45000"`.
pub fn parse_price(text: &str) -> Option<String> {
    let without_commas = text.replace(',', "");
    GROUPED_NUMBER.find(&without_commas).map(|m| {
        m.as_str()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    })
}

/// Returns the leading digit run of a free-text value as a number
///
/// Used to turn mileage text such as `"120 000 km"` into a magnitude; like
/// the analysis tooling it takes only the first run of digits.
pub fn leading_number(text: &str) -> Option<f64> {
    FIRST_NUMBER.find(text).and_then(|m| m.as_str().parse().ok())
}
