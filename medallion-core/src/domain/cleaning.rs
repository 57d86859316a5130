// medallion-core/src/domain/cleaning.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashSet;

use crate::domain::error::DomainError;
use crate::domain::records::columns::*;
use crate::domain::records::{Customer, Entity, Purchase};
use crate::domain::table::{RawRow, RawTable};

/// Entity-specific cleaning rules.
///
/// [`normalize`] applies them in a fixed order: drop blank rows, drop rows
/// missing a required field, deduplicate on each unique field in turn (first
/// occurrence wins), standardize date fields to ISO strings, coerce types.
pub trait CleaningRule {
    type Record;

    fn entity(&self) -> Entity;

    /// Columns the raw export must provide.
    fn columns(&self) -> &'static [&'static str];

    /// A row missing any of these is dropped.
    fn required_fields(&self) -> &'static [&'static str];

    /// Deduplication passes, applied in this order on the surviving rows.
    fn unique_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Fields that must parse as integers. A required one that does not
    /// counts as missing, so the row never reaches deduplication.
    fn integer_fields(&self) -> &'static [&'static str] {
        &[]
    }

    fn date_fields(&self) -> &'static [&'static str];

    /// Builds the typed record. `None` rejects the row (required value not coercible).
    fn coerce(&self, row: &RawRow<'_>) -> Option<Self::Record>;
}

pub struct CustomerRules;

impl CleaningRule for CustomerRules {
    type Record = Customer;

    fn entity(&self) -> Entity {
        Entity::Customer
    }

    fn columns(&self) -> &'static [&'static str] {
        &[ID_CLIENT, NOM, EMAIL, DATE_INSCRIPTION, PAYS]
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &[ID_CLIENT, EMAIL]
    }

    fn unique_fields(&self) -> &'static [&'static str] {
        &[ID_CLIENT, EMAIL]
    }

    fn integer_fields(&self) -> &'static [&'static str] {
        &[ID_CLIENT]
    }

    fn date_fields(&self) -> &'static [&'static str] {
        &[DATE_INSCRIPTION]
    }

    fn coerce(&self, row: &RawRow<'_>) -> Option<Customer> {
        Some(Customer {
            id: row.get(ID_CLIENT).and_then(parse_int)?,
            name: text(row, NOM),
            email: text(row, EMAIL),
            registration_date: row.get(DATE_INSCRIPTION).and_then(parse_iso_date),
            country: text(row, PAYS),
        })
    }
}

/// Purchase identifiers are required but not deduplicated.
pub struct PurchaseRules;

impl CleaningRule for PurchaseRules {
    type Record = Purchase;

    fn entity(&self) -> Entity {
        Entity::Purchase
    }

    fn columns(&self) -> &'static [&'static str] {
        &[ID_ACHAT, ID_CLIENT, DATE_ACHAT, MONTANT, PRODUIT]
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &[ID_ACHAT]
    }

    fn integer_fields(&self) -> &'static [&'static str] {
        &[ID_ACHAT, ID_CLIENT]
    }

    fn date_fields(&self) -> &'static [&'static str] {
        &[DATE_ACHAT]
    }

    fn coerce(&self, row: &RawRow<'_>) -> Option<Purchase> {
        Some(Purchase {
            id: row.get(ID_ACHAT).and_then(parse_int)?,
            customer_id: row.get(ID_CLIENT).and_then(parse_int),
            purchase_date: row.get(DATE_ACHAT).and_then(parse_iso_date),
            amount: row.get(MONTANT).and_then(parse_float),
            product: text(row, PRODUIT),
        })
    }
}

/// Row accounting for one normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub input_rows: usize,
    pub blank_rows: usize,
    pub missing_required: usize,
    /// Part of `missing_required`: identifiers present but not integers.
    pub invalid_identifiers: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub output_rows: usize,
}

#[derive(Debug, Clone)]
pub struct Cleaned<T> {
    pub records: Vec<T>,
    pub stats: CleaningStats,
}

pub fn normalize<R: CleaningRule>(
    rule: &R,
    table: &RawTable,
) -> Result<Cleaned<R::Record>, DomainError> {
    if let Some(missing) = rule
        .columns()
        .iter()
        .find(|c| table.column_index(c).is_none())
    {
        return Err(DomainError::MissingColumn {
            entity: rule.entity().to_string(),
            column: missing.to_string(),
        });
    }

    let mut stats = CleaningStats {
        input_rows: table.len(),
        ..Default::default()
    };

    // 1. Null elimination
    let mut kept: Vec<usize> = Vec::with_capacity(table.len());
    for (i, row) in table.rows().enumerate() {
        if row.is_blank() {
            stats.blank_rows += 1;
        } else if rule.required_fields().iter().any(|f| row.get(f).is_none()) {
            stats.missing_required += 1;
        } else if rule
            .required_fields()
            .iter()
            .filter(|f| rule.integer_fields().contains(*f))
            .any(|f| row.get(f).and_then(parse_int).is_none())
        {
            stats.missing_required += 1;
            stats.invalid_identifiers += 1;
        } else {
            kept.push(i);
        }
    }

    // 2. Deduplication, one pass per unique field
    for field in rule.unique_fields() {
        let before = kept.len();
        let mut seen = HashSet::new();
        kept.retain(|&i| {
            table
                .row(i)
                .and_then(|r| r.get(field))
                .map(dedup_key)
                .is_none_or(|key| seen.insert(key))
        });
        stats.duplicates += before - kept.len();
    }

    // 3. Date standardization
    let mut standardized = table.clone();
    for field in rule.date_fields() {
        standardized.map_column(field, |value| {
            value
                .and_then(parse_date)
                .map(|d| d.format("%Y-%m-%d").to_string())
        });
    }

    // 4. Type coercion
    let mut records = Vec::with_capacity(kept.len());
    for i in kept {
        match standardized.row(i).and_then(|row| rule.coerce(&row)) {
            Some(record) => records.push(record),
            None => stats.rejected += 1,
        }
    }

    stats.output_rows = records.len();
    Ok(Cleaned { records, stats })
}

// --- VALUE PARSING ---

/// Parses a date leniently. Unrecognized input yields `None`, never an error.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s[0..4].parse().ok()?;
        let month = s[4..6].parse().ok()?;
        let day = s[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    const DATE_FORMATS: [&str; 6] = [
        "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y",
    ];
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ];

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Integers, or floats with no fractional part (`12.0`).
pub fn parse_int(value: &str) -> Option<i64> {
    let s = value.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

pub fn parse_float(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn text(row: &RawRow<'_>, column: &str) -> String {
    row.get(column).unwrap_or_default().to_string()
}

fn dedup_key(value: &str) -> String {
    match parse_int(value) {
        Some(i) => i.to_string(),
        None => value.to_string(),
    }
}
