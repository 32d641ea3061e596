//! Descriptive statistics over a harvested table
//!
//! This module reads a table written by [`CsvOutput`](crate::output::CsvOutput)
//! back into records and summarizes it. Numeric-looking columns (`price`,
//! `year`, `views`) are stored as text and parsed with fallback to missing;
//! `mileage` contributes its leading digit run.

use crate::listing::labels::leading_number;
use crate::listing::{ListingField, ListingRecord, DEFAULT_CURRENCY};
use crate::output::traits::{OutputError, OutputResult};
use std::collections::HashMap;
use std::path::Path;

/// Count, mean, sample standard deviation and quartiles of a numeric column
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; None with fewer than two values
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Summary {
    /// Summarizes `values`; None when there are none
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = (count > 1).then(|| {
            let variance =
                sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            variance.sqrt()
        });

        Some(Self {
            count,
            mean,
            std,
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }
}

/// Linear-interpolated quantile of already sorted values
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Parses a stored numeric column; blanks and junk are missing
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Non-empty values of a column with their counts, most frequent first
///
/// Ties are ordered by value so output is stable.
pub fn value_counts<'a>(
    records: impl IntoIterator<Item = &'a ListingRecord>,
    field: ListingField,
) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let value = record.get(field).trim();
        if !value.is_empty() {
            *counts.entry(value).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

fn top(mut counts: Vec<(String, usize)>, n: usize) -> Vec<(String, usize)> {
    counts.truncate(n);
    counts
}

/// Pearson correlation of paired values; None when undefined
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        covariance += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(covariance / (var_x.sqrt() * var_y.sqrt()))
}

/// One of the most viewed listings
#[derive(Debug, Clone, PartialEq)]
pub struct ViewedListing {
    pub brand: String,
    pub model: String,
    pub year: String,
    pub price: String,
    pub views: u64,
}

/// Mean and median price of one brand
#[derive(Debug, Clone, PartialEq)]
pub struct BrandPrice {
    pub brand: String,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Descriptive statistics of a harvested table
#[derive(Debug, Clone)]
pub struct ListingStatistics {
    pub total_listings: usize,

    /// Columns with empty values and how many
    pub missing: Vec<(ListingField, usize)>,

    /// Price summary over listings priced in the default currency
    pub price: Option<Summary>,

    pub top_brands: Vec<(String, usize)>,

    /// Top models of each of the top five brands
    pub top_models: Vec<(String, Vec<(String, usize)>)>,

    pub year_range: Option<(i64, i64)>,
    pub top_years: Vec<(i64, usize)>,

    pub transmissions: Vec<(String, usize)>,
    pub fuel_types: Vec<(String, usize)>,
    pub body_types: Vec<(String, usize)>,
    pub drivetrains: Vec<(String, usize)>,
    pub top_colors: Vec<(String, usize)>,

    pub views: Option<Summary>,
    pub most_viewed: Vec<ViewedListing>,

    pub brand_prices: Vec<BrandPrice>,

    /// Summary of the leading digit run of `mileage`
    pub mileage: Option<Summary>,

    pub price_views_correlation: Option<f64>,
}

impl ListingStatistics {
    pub fn from_records(records: &[ListingRecord]) -> Self {
        let missing = ListingField::ALL
            .into_iter()
            .map(|field| {
                let count = records
                    .iter()
                    .filter(|r| r.get(field).trim().is_empty())
                    .count();
                (field, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();

        let prices: Vec<f64> = records
            .iter()
            .filter(|r| r.currency == DEFAULT_CURRENCY)
            .filter_map(|r| parse_number(&r.price))
            .collect();

        let brand_counts = value_counts(records, ListingField::Brand);

        let top_models = brand_counts
            .iter()
            .take(5)
            .map(|(brand, _)| {
                let models = value_counts(
                    records.iter().filter(|r| r.brand.trim() == brand),
                    ListingField::Model,
                );
                (brand.clone(), top(models, 5))
            })
            .collect();

        let brand_prices = brand_counts
            .iter()
            .take(10)
            .map(|(brand, _)| {
                let prices: Vec<f64> = records
                    .iter()
                    .filter(|r| r.brand.trim() == brand)
                    .filter_map(|r| parse_number(&r.price))
                    .collect();
                let summary = Summary::from_values(&prices);
                BrandPrice {
                    brand: brand.clone(),
                    mean: summary.as_ref().map(|s| s.mean),
                    median: summary.as_ref().map(|s| s.median),
                }
            })
            .collect();

        let years: Vec<i64> = records
            .iter()
            .filter_map(|r| parse_number(&r.year))
            .map(|y| y as i64)
            .collect();
        let year_range = years
            .iter()
            .min()
            .zip(years.iter().max())
            .map(|(min, max)| (*min, *max));
        let mut year_counts: HashMap<i64, usize> = HashMap::new();
        for year in &years {
            *year_counts.entry(*year).or_insert(0) += 1;
        }
        let mut top_years: Vec<(i64, usize)> = year_counts.into_iter().collect();
        top_years.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        top_years.truncate(10);

        let views: Vec<f64> = records
            .iter()
            .filter_map(|r| parse_number(&r.views))
            .collect();

        let mut viewed: Vec<ViewedListing> = records
            .iter()
            .filter_map(|r| {
                parse_number(&r.views).map(|views| ViewedListing {
                    brand: r.brand.clone(),
                    model: r.model.clone(),
                    year: r.year.clone(),
                    price: r.price.clone(),
                    views: views as u64,
                })
            })
            .collect();
        viewed.sort_by(|a, b| b.views.cmp(&a.views));
        viewed.truncate(10);

        let mileage: Vec<f64> = records
            .iter()
            .filter_map(|r| leading_number(&r.mileage))
            .collect();

        let pairs: Vec<(f64, f64)> = records
            .iter()
            .filter_map(|r| parse_number(&r.price).zip(parse_number(&r.views)))
            .collect();

        Self {
            total_listings: records.len(),
            missing,
            price: Summary::from_values(&prices),
            top_brands: top(brand_counts.clone(), 15),
            top_models,
            year_range,
            top_years,
            transmissions: value_counts(records, ListingField::Transmission),
            fuel_types: value_counts(records, ListingField::FuelType),
            body_types: value_counts(records, ListingField::BodyType),
            drivetrains: value_counts(records, ListingField::Drivetrain),
            top_colors: top(value_counts(records, ListingField::Color), 10),
            views: Summary::from_values(&views),
            most_viewed: viewed,
            brand_prices,
            mileage: Summary::from_values(&mileage),
            price_views_correlation: pearson(&pairs),
        }
    }
}

/// Reads a harvested table back into records
pub fn load_records(path: &Path) -> OutputResult<Vec<ListingRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| OutputError::Read(format!("cannot open {}: {}", path.display(), e)))?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Loads a table and computes its statistics
pub fn load_statistics(path: &Path) -> OutputResult<ListingStatistics> {
    let records = load_records(path)?;
    Ok(ListingStatistics::from_records(&records))
}

fn print_section(title: &str) {
    println!("\n{}", "=".repeat(80));
    println!("{}", title);
    println!("{}", "=".repeat(80));
}

fn print_summary(summary: Option<&Summary>) {
    match summary {
        Some(s) => {
            println!("  count  {}", s.count);
            println!("  mean   {:.2}", s.mean);
            match s.std {
                Some(std) => println!("  std    {:.2}", std),
                None => println!("  std    -"),
            }
            println!("  min    {:.2}", s.min);
            println!("  25%    {:.2}", s.q25);
            println!("  50%    {:.2}", s.median);
            println!("  75%    {:.2}", s.q75);
            println!("  max    {:.2}", s.max);
        }
        None => println!("  no numeric values"),
    }
}

fn print_counts(counts: &[(String, usize)]) {
    if counts.is_empty() {
        println!("  no values");
    }
    for (value, count) in counts {
        println!("  {:<30} {}", value, count);
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ListingStatistics) {
    print_section("DATASET OVERVIEW");
    println!("Total listings: {}", stats.total_listings);
    println!("\nMissing values:");
    for (field, count) in &stats.missing {
        println!("  {:<15} {}", field.name(), count);
    }

    print_section("PRICE ANALYSIS");
    println!("Price statistics ({}):", DEFAULT_CURRENCY);
    print_summary(stats.price.as_ref());

    print_section("BRAND ANALYSIS");
    println!("Top 15 brands by listing count:");
    print_counts(&stats.top_brands);

    print_section("MODEL ANALYSIS (TOP BRANDS)");
    for (brand, models) in &stats.top_models {
        println!("\n{} - Top 5 models:", brand);
        print_counts(models);
    }

    print_section("YEAR ANALYSIS");
    match stats.year_range {
        Some((min, max)) => println!("Year range: {} - {}", min, max),
        None => println!("Year range: -"),
    }
    println!("\nTop 10 years by listing count:");
    for (year, count) in &stats.top_years {
        println!("  {:<30} {}", year, count);
    }

    print_section("TRANSMISSION ANALYSIS");
    print_counts(&stats.transmissions);

    print_section("FUEL TYPE ANALYSIS");
    print_counts(&stats.fuel_types);

    print_section("BODY TYPE ANALYSIS");
    print_counts(&stats.body_types);

    print_section("VIEWS ANALYSIS");
    println!("Views statistics:");
    print_summary(stats.views.as_ref());
    println!("\nTop 10 most viewed listings:");
    for listing in &stats.most_viewed {
        println!(
            "  {} {} {} {} {}",
            listing.brand, listing.model, listing.year, listing.price, listing.views
        );
    }

    print_section("PRICE BY BRAND (TOP 10 BRANDS)");
    for brand in &stats.brand_prices {
        match (brand.mean, brand.median) {
            (Some(mean), Some(median)) => println!(
                "{}: Mean={:.0} {}, Median={:.0} {}",
                brand.brand, mean, DEFAULT_CURRENCY, median, DEFAULT_CURRENCY
            ),
            _ => println!("{}: no prices", brand.brand),
        }
    }

    print_section("MILEAGE ANALYSIS");
    println!("Mileage statistics (km):");
    print_summary(stats.mileage.as_ref());

    print_section("PRICE vs VIEWS CORRELATION");
    match stats.price_views_correlation {
        Some(r) => println!("Pearson r = {:.4}", r),
        None => println!("Pearson r = -"),
    }

    print_section("COLOR PREFERENCES");
    print_counts(&stats.top_colors);

    print_section("DRIVETRAIN ANALYSIS");
    print_counts(&stats.drivetrains);
}
