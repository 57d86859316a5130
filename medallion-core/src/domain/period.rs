// medallion-core/src/domain/period.rs

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// Time bucket size. Each KPI table uses exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Year,
    Month,
    Week,
    Day,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Year,
        Granularity::Month,
        Granularity::Week,
        Granularity::Day,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Year => "year",
            Granularity::Month => "month",
            Granularity::Week => "week",
            Granularity::Day => "day",
        }
    }

    /// Column name of the bucket in revenue tables.
    pub fn column_name(&self) -> &'static str {
        match self {
            Granularity::Year => "annee",
            Granularity::Month => "mois",
            Granularity::Week => "semaine",
            Granularity::Day => "jour",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(Granularity::Year),
            "month" => Ok(Granularity::Month),
            "week" => Ok(Granularity::Week),
            "day" => Ok(Granularity::Day),
            other => Err(DomainError::InvalidPeriod(format!(
                "unknown granularity '{}'",
                other
            ))),
        }
    }
}

/// A calendar bucket. Weeks follow ISO 8601 (Monday start, ISO week-year).
///
/// Ordering is chronological within one granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    Year(i32),
    Month { year: i32, month: u32 },
    Week { iso_year: i32, week: u32 },
    Day(NaiveDate),
}

impl Period {
    pub fn of(date: NaiveDate, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Year => Period::Year(date.year()),
            Granularity::Month => Period::Month {
                year: date.year(),
                month: date.month(),
            },
            Granularity::Week => {
                let iso = date.iso_week();
                Period::Week {
                    iso_year: iso.year(),
                    week: iso.week(),
                }
            }
            Granularity::Day => Period::Day(date),
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Period::Year(_) => Granularity::Year,
            Period::Month { .. } => Granularity::Month,
            Period::Week { .. } => Granularity::Week,
            Period::Day(_) => Granularity::Day,
        }
    }

    /// First calendar day of the bucket.
    pub fn start_date(&self) -> Option<NaiveDate> {
        match *self {
            Period::Year(year) => NaiveDate::from_ymd_opt(year, 1, 1),
            Period::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1),
            Period::Week { iso_year, week } => {
                NaiveDate::from_isoywd_opt(iso_year, week, Weekday::Mon)
            }
            Period::Day(date) => Some(date),
        }
    }

    /// Canonical label: `2020`, `2020-06`, `2020-W23`, `2020-06-01`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Year(year) => write!(f, "{:04}", year),
            Period::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            Period::Week { iso_year, week } => write!(f, "{:04}-W{:02}", iso_year, week),
            Period::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_buckets_and_labels() {
        let d = date(2020, 6, 1);
        assert_eq!(Period::of(d, Granularity::Year).label(), "2020");
        assert_eq!(Period::of(d, Granularity::Month).label(), "2020-06");
        assert_eq!(Period::of(d, Granularity::Week).label(), "2020-W23");
        assert_eq!(Period::of(d, Granularity::Day).label(), "2020-06-01");
    }

    #[test]
    fn test_iso_week_crosses_year_boundary() {
        // 2021-01-01 is a Friday, still in the last ISO week of 2020.
        let p = Period::of(date(2021, 1, 1), Granularity::Week);
        assert_eq!(p, Period::Week { iso_year: 2020, week: 53 });
        assert_eq!(p.start_date(), Some(date(2020, 12, 28)));
    }

    #[test]
    fn test_start_date_maps_back_to_same_bucket() {
        let d = date(2023, 11, 17);
        for g in Granularity::ALL {
            let p = Period::of(d, g);
            let start = p.start_date().unwrap();
            assert_eq!(Period::of(start, g), p, "granularity {}", g);
            assert!(start <= d);
        }
    }

    #[test]
    fn test_chronological_ordering() {
        let a = Period::of(date(2020, 12, 31), Granularity::Month);
        let b = Period::of(date(2021, 1, 1), Granularity::Month);
        assert!(a < b);
    }

    #[test]
    fn test_granularity_from_str() {
        assert_eq!("week".parse::<Granularity>().unwrap(), Granularity::Week);
        assert!("quarter".parse::<Granularity>().is_err());
    }
}
