// medallion-core/src/domain/kpi.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;
use crate::domain::period::{Granularity, Period};

/// Every KPI table the aggregation engine knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiTableName {
    ClientsByYearCountry,
    ClientsByYear,
    ClientsByMonth,
    ClientsByWeek,
    ClientsByDay,
    CaByYear,
    CaByMonth,
    CaByWeek,
    CaByDay,
    CaByYearCountry,
    CaByMonthCountry,
    CaByWeekCountry,
    CaByDayCountry,
    ClientsGrowthByYear,
    CaGrowthByYear,
    CaGrowthByMonth,
    CaGrowthByWeek,
    CaGrowthByDay,
}

/// How a table is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiKind {
    /// Unique customers per (registration year, country).
    ClientsByYearCountry,
    /// Registered customers per bucket.
    ClientsByPeriod(Granularity),
    /// Revenue per bucket.
    RevenueByPeriod(Granularity),
    /// Revenue per (bucket, country).
    RevenueByPeriodCountry(Granularity),
    /// `ClientsByYearCountry` plus growth within each country.
    ClientsGrowthByYear,
    /// `RevenueByPeriod` plus growth.
    RevenueGrowth(Granularity),
}

impl KpiTableName {
    pub const ALL: [KpiTableName; 18] = [
        KpiTableName::ClientsByYearCountry,
        KpiTableName::ClientsByYear,
        KpiTableName::ClientsByMonth,
        KpiTableName::ClientsByWeek,
        KpiTableName::ClientsByDay,
        KpiTableName::CaByYear,
        KpiTableName::CaByMonth,
        KpiTableName::CaByWeek,
        KpiTableName::CaByDay,
        KpiTableName::CaByYearCountry,
        KpiTableName::CaByMonthCountry,
        KpiTableName::CaByWeekCountry,
        KpiTableName::CaByDayCountry,
        KpiTableName::ClientsGrowthByYear,
        KpiTableName::CaGrowthByYear,
        KpiTableName::CaGrowthByMonth,
        KpiTableName::CaGrowthByWeek,
        KpiTableName::CaGrowthByDay,
    ];

    /// Tables written to the gold bucket and synced unless configured otherwise.
    pub const PUBLISHED: [KpiTableName; 6] = [
        KpiTableName::ClientsByYearCountry,
        KpiTableName::CaByYearCountry,
        KpiTableName::CaByMonthCountry,
        KpiTableName::CaByDayCountry,
        KpiTableName::ClientsGrowthByYear,
        KpiTableName::CaGrowthByYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KpiTableName::ClientsByYearCountry => "clients_by_year_country",
            KpiTableName::ClientsByYear => "clients_by_year",
            KpiTableName::ClientsByMonth => "clients_by_month",
            KpiTableName::ClientsByWeek => "clients_by_week",
            KpiTableName::ClientsByDay => "clients_by_day",
            KpiTableName::CaByYear => "ca_by_year",
            KpiTableName::CaByMonth => "ca_by_month",
            KpiTableName::CaByWeek => "ca_by_week",
            KpiTableName::CaByDay => "ca_by_day",
            KpiTableName::CaByYearCountry => "ca_by_year_country",
            KpiTableName::CaByMonthCountry => "ca_by_month_country",
            KpiTableName::CaByWeekCountry => "ca_by_week_country",
            KpiTableName::CaByDayCountry => "ca_by_day_country",
            KpiTableName::ClientsGrowthByYear => "clients_growth_by_year",
            KpiTableName::CaGrowthByYear => "ca_growth_by_year",
            KpiTableName::CaGrowthByMonth => "ca_growth_by_month",
            KpiTableName::CaGrowthByWeek => "ca_growth_by_week",
            KpiTableName::CaGrowthByDay => "ca_growth_by_day",
        }
    }

    /// Gold artifact key, e.g. `ca_by_year_country.parquet`.
    pub fn artifact_name(&self) -> String {
        format!("{}.parquet", self.as_str())
    }

    pub fn kind(&self) -> KpiKind {
        use Granularity::*;
        match self {
            KpiTableName::ClientsByYearCountry => KpiKind::ClientsByYearCountry,
            KpiTableName::ClientsByYear => KpiKind::ClientsByPeriod(Year),
            KpiTableName::ClientsByMonth => KpiKind::ClientsByPeriod(Month),
            KpiTableName::ClientsByWeek => KpiKind::ClientsByPeriod(Week),
            KpiTableName::ClientsByDay => KpiKind::ClientsByPeriod(Day),
            KpiTableName::CaByYear => KpiKind::RevenueByPeriod(Year),
            KpiTableName::CaByMonth => KpiKind::RevenueByPeriod(Month),
            KpiTableName::CaByWeek => KpiKind::RevenueByPeriod(Week),
            KpiTableName::CaByDay => KpiKind::RevenueByPeriod(Day),
            KpiTableName::CaByYearCountry => KpiKind::RevenueByPeriodCountry(Year),
            KpiTableName::CaByMonthCountry => KpiKind::RevenueByPeriodCountry(Month),
            KpiTableName::CaByWeekCountry => KpiKind::RevenueByPeriodCountry(Week),
            KpiTableName::CaByDayCountry => KpiKind::RevenueByPeriodCountry(Day),
            KpiTableName::ClientsGrowthByYear => KpiKind::ClientsGrowthByYear,
            KpiTableName::CaGrowthByYear => KpiKind::RevenueGrowth(Year),
            KpiTableName::CaGrowthByMonth => KpiKind::RevenueGrowth(Month),
            KpiTableName::CaGrowthByWeek => KpiKind::RevenueGrowth(Week),
            KpiTableName::CaGrowthByDay => KpiKind::RevenueGrowth(Day),
        }
    }
}

impl fmt::Display for KpiTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for KpiTableName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_end_matches(".parquet");
        KpiTableName::ALL
            .into_iter()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| DomainError::UnknownTable(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Period(Granularity),
    Integer,
    Float,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiColumn {
    pub name: String,
    pub kind: ColumnKind,
}

impl KpiColumn {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KpiValue {
    Period(Period),
    Integer(i64),
    Float(Option<f64>),
    Text(Option<String>),
}

impl KpiValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            KpiValue::Integer(i) => Some(*i as f64),
            KpiValue::Float(f) => *f,
            _ => None,
        }
    }

    pub fn as_period(&self) -> Option<Period> {
        match self {
            KpiValue::Period(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            KpiValue::Text(t) => t.as_deref(),
            _ => None,
        }
    }
}

/// A dimensional aggregate: typed columns, rows in presentation order.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiTable {
    pub name: KpiTableName,
    pub columns: Vec<KpiColumn>,
    pub rows: Vec<Vec<KpiValue>>,
}

impl KpiTable {
    pub fn new(name: KpiTableName, columns: Vec<KpiColumn>) -> Self {
        Self {
            name,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<&KpiValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|r| r.get(idx)).collect())
    }
}
