/// Listing record definitions
///
/// A record has one string column per [`ListingField`]; every column is
/// always present and holds an empty string when the source page did not
/// provide it.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency written into every record
pub const DEFAULT_CURRENCY: &str = "AZN";

/// Separator between joined extras items
pub const EXTRAS_SEPARATOR: &str = "; ";

/// One harvested detail page
///
/// Field declaration order is the column order of the output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingRecord {
    pub seller_name: String,
    pub seller_phone: String,
    pub listing_id: String,
    pub url: String,
    pub title: String,
    pub brand: String,
    pub model: String,
    pub year: String,
    pub body_type: String,
    pub color: String,
    pub engine_volume: String,
    pub engine_power: String,
    pub fuel_type: String,
    pub mileage: String,
    pub transmission: String,
    pub drivetrain: String,
    pub price: String,
    pub currency: String,
    pub views: String,
    pub updated_date: String,
    pub location: String,
    pub extras: String,
    pub description: String,
}

impl Default for ListingRecord {
    fn default() -> Self {
        Self {
            seller_name: String::new(),
            seller_phone: String::new(),
            listing_id: String::new(),
            url: String::new(),
            title: String::new(),
            brand: String::new(),
            model: String::new(),
            year: String::new(),
            body_type: String::new(),
            color: String::new(),
            engine_volume: String::new(),
            engine_power: String::new(),
            fuel_type: String::new(),
            mileage: String::new(),
            transmission: String::new(),
            drivetrain: String::new(),
            price: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            views: String::new(),
            updated_date: String::new(),
            location: String::new(),
            extras: String::new(),
            description: String::new(),
        }
    }
}

impl ListingRecord {
    /// Creates an empty record for the given source URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Returns the value of a single column
    pub fn get(&self, field: ListingField) -> &str {
        match field {
            ListingField::SellerName => &self.seller_name,
            ListingField::SellerPhone => &self.seller_phone,
            ListingField::ListingId => &self.listing_id,
            ListingField::Url => &self.url,
            ListingField::Title => &self.title,
            ListingField::Brand => &self.brand,
            ListingField::Model => &self.model,
            ListingField::Year => &self.year,
            ListingField::BodyType => &self.body_type,
            ListingField::Color => &self.color,
            ListingField::EngineVolume => &self.engine_volume,
            ListingField::EnginePower => &self.engine_power,
            ListingField::FuelType => &self.fuel_type,
            ListingField::Mileage => &self.mileage,
            ListingField::Transmission => &self.transmission,
            ListingField::Drivetrain => &self.drivetrain,
            ListingField::Price => &self.price,
            ListingField::Currency => &self.currency,
            ListingField::Views => &self.views,
            ListingField::UpdatedDate => &self.updated_date,
            ListingField::Location => &self.location,
            ListingField::Extras => &self.extras,
            ListingField::Description => &self.description,
        }
    }

    /// Overwrites a single column
    pub fn set(&mut self, field: ListingField, value: impl Into<String>) {
        *self.slot(field) = value.into();
    }

    fn slot(&mut self, field: ListingField) -> &mut String {
        match field {
            ListingField::SellerName => &mut self.seller_name,
            ListingField::SellerPhone => &mut self.seller_phone,
            ListingField::ListingId => &mut self.listing_id,
            ListingField::Url => &mut self.url,
            ListingField::Title => &mut self.title,
            ListingField::Brand => &mut self.brand,
            ListingField::Model => &mut self.model,
            ListingField::Year => &mut self.year,
            ListingField::BodyType => &mut self.body_type,
            ListingField::Color => &mut self.color,
            ListingField::EngineVolume => &mut self.engine_volume,
            ListingField::EnginePower => &mut self.engine_power,
            ListingField::FuelType => &mut self.fuel_type,
            ListingField::Mileage => &mut self.mileage,
            ListingField::Transmission => &mut self.transmission,
            ListingField::Drivetrain => &mut self.drivetrain,
            ListingField::Price => &mut self.price,
            ListingField::Currency => &mut self.currency,
            ListingField::Views => &mut self.views,
            ListingField::UpdatedDate => &mut self.updated_date,
            ListingField::Location => &mut self.location,
            ListingField::Extras => &mut self.extras,
            ListingField::Description => &mut self.description,
        }
    }
}

/// Names a single column of a [`ListingRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingField {
    SellerName,
    SellerPhone,
    ListingId,
    Url,
    Title,
    Brand,
    Model,
    Year,
    BodyType,
    Color,
    EngineVolume,
    EnginePower,
    FuelType,
    Mileage,
    Transmission,
    Drivetrain,
    Price,
    Currency,
    Views,
    UpdatedDate,
    Location,
    Extras,
    Description,
}

impl ListingField {
    /// All columns in output table order
    pub const ALL: [ListingField; 23] = [
        Self::SellerName,
        Self::SellerPhone,
        Self::ListingId,
        Self::Url,
        Self::Title,
        Self::Brand,
        Self::Model,
        Self::Year,
        Self::BodyType,
        Self::Color,
        Self::EngineVolume,
        Self::EnginePower,
        Self::FuelType,
        Self::Mileage,
        Self::Transmission,
        Self::Drivetrain,
        Self::Price,
        Self::Currency,
        Self::Views,
        Self::UpdatedDate,
        Self::Location,
        Self::Extras,
        Self::Description,
    ];

    /// Column header used in the output table
    pub fn name(&self) -> &'static str {
        match self {
            Self::SellerName => "seller_name",
            Self::SellerPhone => "seller_phone",
            Self::ListingId => "listing_id",
            Self::Url => "url",
            Self::Title => "title",
            Self::Brand => "brand",
            Self::Model => "model",
            Self::Year => "year",
            Self::BodyType => "body_type",
            Self::Color => "color",
            Self::EngineVolume => "engine_volume",
            Self::EnginePower => "engine_power",
            Self::FuelType => "fuel_type",
            Self::Mileage => "mileage",
            Self::Transmission => "transmission",
            Self::Drivetrain => "drivetrain",
            Self::Price => "price",
            Self::Currency => "currency",
            Self::Views => "views",
            Self::UpdatedDate => "updated_date",
            Self::Location => "location",
            Self::Extras => "extras",
            Self::Description => "description",
        }
    }

    /// Parses a column header back into a field
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl fmt::Display for ListingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
