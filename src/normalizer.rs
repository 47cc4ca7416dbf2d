//! Locale-aware coercion of raw cells into canonical values.
//!
//! Indonesian exports use `.` for thousands and `,` for decimals, write
//! dates day-first, and freely mix shorthand like `15rb` or `2 juta` into
//! price columns. Every coercion here is total: a cell that cannot be read
//! degrades to the field default and a warning, never an error.

use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::detector::ColumnMapping;
use crate::error::{JituError, Result};
use crate::schema::{CanonicalField, ColumnType, INDONESIAN_MONTHS, MAGNITUDE_SUFFIXES};
use crate::table::{RawTable, RawValue};
use crate::transaction::{Transaction, TransactionSet};

lazy_static! {
    static ref CURRENCY_PREFIX: Regex = Regex::new(r"(rp|idr)\.?\s*").expect("valid pattern");
    static ref TRAILING_CENTS: Regex = Regex::new(r"[.,]00$").expect("valid pattern");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid pattern");
    static ref NON_NUMERIC: Regex = Regex::new(r"[^\d.]").expect("valid pattern");
    static ref ALPHA_RUN: Regex = Regex::new(r"[a-z]+").expect("valid pattern");
    static ref SUFFIX_PATTERNS: Vec<(&'static str, Regex, i32)> = MAGNITUDE_SUFFIXES
        .iter()
        .map(|(word, zeros)| {
            let pattern = format!(r"([\d,.]+)\s*{}", regex::escape(word));
            (*word, Regex::new(&pattern).expect("valid pattern"), *zeros)
        })
        .collect();
}

/// Year-first layouts, tried only when the text starts with a 4-digit year.
const YEAR_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];
const YEAR_FIRST_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Day-first layouts. Two-digit years come before four-digit ones so that
/// `%Y` never swallows `24` as year 0024.
const DAY_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];
const DAY_FIRST_DATE_FORMATS: &[&str] = &[
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%d %B %y",
    "%d %B %Y",
    "%d-%B-%y",
    "%d-%B-%Y",
    "%B %d, %Y",
    "%B %d %Y",
];

/// Month-first layouts, tried only after every day-first reading fails.
const MONTH_FIRST_DATETIME_FORMATS: &[&str] = &["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"];
const MONTH_FIRST_DATE_FORMATS: &[&str] = &["%m-%d-%y", "%m-%d-%Y", "%m/%d/%y", "%m/%d/%Y"];

// ── Cell coercions ──────────────────────────────────────────────────────────

/// Parse an Indonesian-formatted currency cell.
///
/// Handles `Rp 15.000,00`, `IDR 15000`, `15k`, `15 ribu`, `1,5jt` and
/// plain numbers. Blank or unreadable input yields `0.0`.
pub fn clean_currency(value: &RawValue) -> f64 {
    match value {
        RawValue::Blank => 0.0,
        RawValue::Number(n) if n.is_nan() => 0.0,
        RawValue::Number(n) => *n,
        RawValue::Date(d) => {
            tracing::warn!(value = %d, "Could not parse currency value");
            0.0
        }
        RawValue::Text(text) => parse_currency_text(text),
    }
}

fn parse_currency_text(text: &str) -> f64 {
    let lowered = text.trim().to_lowercase();
    let stripped = CURRENCY_PREFIX.replace_all(&lowered, "");
    let stripped = TRAILING_CENTS.replace(&stripped, "");
    let cleaned = WHITESPACE.replace_all(&stripped, "").into_owned();

    for (word, pattern, zeros) in SUFFIX_PATTERNS.iter() {
        if !cleaned.contains(word) {
            continue;
        }
        let Some(caps) = pattern.captures(&cleaned) else {
            continue;
        };
        let base = caps[1].replace('.', "").replace(',', ".");
        if let Ok(number) = base.parse::<f64>() {
            return number * 10f64.powi(*zeros);
        }
    }

    let plain = cleaned.replace('.', "").replace(',', ".");
    let plain = NON_NUMERIC.replace_all(&plain, "");
    if plain.is_empty() {
        if !lowered.is_empty() {
            tracing::warn!(value = text, "Could not parse currency value");
        }
        return 0.0;
    }
    plain.parse::<f64>().unwrap_or_else(|_| {
        tracing::warn!(value = text, "Could not parse currency value");
        0.0
    })
}

/// Parse a date cell, day-first, falling back to month-first when no
/// day-first reading is a valid date. Unreadable input yields `None`.
pub fn clean_date(value: &RawValue) -> Option<NaiveDate> {
    match value {
        RawValue::Blank => None,
        RawValue::Date(d) => Some(*d),
        RawValue::Number(n) => {
            if !n.is_nan() {
                tracing::warn!(value = n, "Could not parse date value");
            }
            None
        }
        RawValue::Text(text) => {
            let parsed = parse_date_text(text);
            if parsed.is_none() && !text.trim().is_empty() {
                tracing::warn!(value = text.as_str(), "Could not parse date value");
            }
            parsed
        }
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    let translated = translate_months(&lowered);
    let s = translated.as_str();

    if starts_with_year(s) {
        return parse_with(s, YEAR_FIRST_DATE_FORMATS, YEAR_FIRST_DATETIME_FORMATS);
    }
    parse_with(s, DAY_FIRST_DATE_FORMATS, DAY_FIRST_DATETIME_FORMATS)
        .or_else(|| parse_with(s, MONTH_FIRST_DATE_FORMATS, MONTH_FIRST_DATETIME_FORMATS))
}

fn parse_with(s: &str, date_formats: &[&str], datetime_formats: &[&str]) -> Option<NaiveDate> {
    date_formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            datetime_formats
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn starts_with_year(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() > 4 && bytes[..4].iter().all(u8::is_ascii_digit) && !bytes[4].is_ascii_digit()
}

/// Replace Indonesian month tokens with English names chrono can parse.
fn translate_months(s: &str) -> String {
    ALPHA_RUN
        .replace_all(s, |caps: &Captures| {
            let token = &caps[0];
            INDONESIAN_MONTHS
                .iter()
                .find(|(id, _)| *id == token)
                .map_or_else(|| token.to_string(), |(_, en)| en.to_string())
        })
        .into_owned()
}

/// Parse a plain numeric cell. Both `,` and `.` are treated as grouping
/// and stripped. Unreadable input yields `0.0`.
pub fn clean_numeric(value: &RawValue) -> f64 {
    match value {
        RawValue::Blank => 0.0,
        RawValue::Number(n) if n.is_nan() => 0.0,
        RawValue::Number(n) => *n,
        RawValue::Date(d) => {
            tracing::warn!(value = %d, "Could not parse numeric value");
            0.0
        }
        RawValue::Text(text) => {
            let cleaned = text.trim().replace([',', '.'], "");
            cleaned.parse::<f64>().unwrap_or_else(|_| {
                if !cleaned.is_empty() {
                    tracing::warn!(value = text.as_str(), "Could not parse numeric value");
                }
                0.0
            })
        }
    }
}

/// Read a text cell. Blank or whitespace-only input yields `None`.
pub fn clean_text(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Blank => None,
        RawValue::Number(n) if n.is_nan() => None,
        RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
            Some(format!("{}", *n as i64))
        }
        RawValue::Number(n) => Some(n.to_string()),
        RawValue::Date(d) => Some(d.to_string()),
        RawValue::Text(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

/// Trim, lower-case and collapse internal whitespace of a product name.
pub fn standardize_product_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ── Column coercion ─────────────────────────────────────────────────────────

/// One coerced cell; the variant follows the column's type tag.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanValue {
    Number(f64),
    Date(Option<NaiveDate>),
    Text(Option<String>),
}

/// Apply the coercion named by `column_type` to every cell of a column.
pub fn clean_column(values: &[RawValue], column_type: ColumnType) -> Vec<CleanValue> {
    match column_type {
        ColumnType::Currency => values
            .iter()
            .map(|v| CleanValue::Number(clean_currency(v)))
            .collect(),
        ColumnType::Date => values
            .iter()
            .map(|v| CleanValue::Date(clean_date(v)))
            .collect(),
        ColumnType::Numeric => values
            .iter()
            .map(|v| CleanValue::Number(clean_numeric(v)))
            .collect(),
        ColumnType::Text => values
            .iter()
            .map(|v| CleanValue::Text(clean_text(v)))
            .collect(),
    }
}

// ── Row assembly ────────────────────────────────────────────────────────────

/// Turns a mapped raw table into canonical transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldNormalizer {
    pub standardize_product_names: bool,
}

impl FieldNormalizer {
    pub fn new(standardize_product_names: bool) -> Self {
        Self {
            standardize_product_names,
        }
    }

    /// Coerce each mapped column, and assemble transactions. Rows without a
    /// date or product, or with a negative price, are dropped and counted.
    ///
    /// Columns are read through their source header, so one header may feed
    /// several fields.
    pub fn normalize(&self, table: &RawTable, mapping: &ColumnMapping) -> Result<Normalized> {
        mapping.validate()?;

        let column = |field: CanonicalField| -> Result<Option<Vec<CleanValue>>> {
            let Some(source) = mapping.get(field) else {
                return Ok(None);
            };
            let idx = table
                .column_index(source)
                .ok_or_else(|| JituError::ColumnNotFound(source.to_string()))?;
            let values: Vec<RawValue> = table
                .rows()
                .iter()
                .map(|r| r.get(idx).cloned().unwrap_or(RawValue::Blank))
                .collect();
            Ok(Some(clean_column(&values, field.column_type())))
        };

        let dates = column(CanonicalField::Date)?.unwrap_or_default();
        let products = column(CanonicalField::Product)?.unwrap_or_default();
        let prices = column(CanonicalField::Price)?.unwrap_or_default();
        let qtys = column(CanonicalField::Qty)?;
        let categories = column(CanonicalField::Category)?;
        let customers = column(CanonicalField::Customer)?;
        tracing::debug!(mapping = ?mapping, "Reading mapped columns");

        let mut transactions = Vec::with_capacity(table.height());
        let mut dropped_rows = 0usize;

        for row in 0..table.height() {
            let date = match dates.get(row) {
                Some(CleanValue::Date(Some(d))) => *d,
                _ => {
                    dropped_rows += 1;
                    continue;
                }
            };
            let product = match products.get(row) {
                Some(CleanValue::Text(Some(p))) if self.standardize_product_names => {
                    standardize_product_name(p)
                }
                Some(CleanValue::Text(Some(p))) => p.clone(),
                _ => {
                    dropped_rows += 1;
                    continue;
                }
            };
            let price = match prices.get(row) {
                Some(CleanValue::Number(p)) if *p >= 0.0 => *p,
                Some(CleanValue::Number(p)) => {
                    tracing::warn!(row, price = p, "Dropping row with negative price");
                    dropped_rows += 1;
                    continue;
                }
                _ => {
                    dropped_rows += 1;
                    continue;
                }
            };
            let qty = match qtys.as_ref().and_then(|q| q.get(row)) {
                Some(CleanValue::Number(q)) => to_quantity(*q, row),
                _ => 1,
            };

            transactions.push(Transaction {
                date,
                product,
                price,
                qty,
                category: text_at(categories.as_deref(), row),
                customer: text_at(customers.as_deref(), row),
            });
        }

        if dropped_rows > 0 {
            tracing::info!(dropped_rows, "Dropped rows missing date, product or price");
        }
        tracing::info!(rows = transactions.len(), "Cleaned transactions");

        Ok(Normalized {
            transactions: TransactionSet::new(
                transactions,
                mapping.contains(CanonicalField::Qty),
                mapping.contains(CanonicalField::Category),
                mapping.contains(CanonicalField::Customer),
            ),
            dropped_rows,
        })
    }
}

/// Output of [`FieldNormalizer::normalize`].
#[derive(Debug, Clone)]
pub struct Normalized {
    pub transactions: TransactionSet,
    pub dropped_rows: usize,
}

fn to_quantity(q: f64, row: usize) -> u32 {
    let rounded = q.round();
    if rounded >= 1.0 {
        rounded.min(u32::MAX as f64) as u32
    } else {
        tracing::warn!(row, qty = q, "Non-positive quantity, defaulting to 1");
        1
    }
}

fn text_at(column: Option<&[CleanValue]>, row: usize) -> Option<String> {
    match column?.get(row)? {
        CleanValue::Text(t) => t.clone(),
        _ => None,
    }
}
