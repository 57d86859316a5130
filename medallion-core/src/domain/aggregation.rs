// medallion-core/src/domain/aggregation.rs

use chrono::Datelike;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::domain::growth::growth_rates;
use crate::domain::kpi::{ColumnKind, KpiColumn, KpiKind, KpiTable, KpiTableName, KpiValue};
use crate::domain::period::{Granularity, Period};
use crate::domain::records::columns::*;
use crate::domain::records::{Customer, JoinedPurchase};

/// Builds KPI tables from cleaned customers and joined purchases.
///
/// Each table is computed on demand from the inputs; no table is derived
/// from another granularity.
pub struct AggregationEngine<'a> {
    customers: &'a [Customer],
    purchases: &'a [JoinedPurchase],
}

impl<'a> AggregationEngine<'a> {
    pub fn new(customers: &'a [Customer], purchases: &'a [JoinedPurchase]) -> Self {
        Self {
            customers,
            purchases,
        }
    }

    pub fn compute_all(&self, names: &[KpiTableName]) -> Vec<KpiTable> {
        names.iter().map(|name| self.compute(*name)).collect()
    }

    pub fn compute(&self, name: KpiTableName) -> KpiTable {
        match name.kind() {
            KpiKind::ClientsByYearCountry => self.clients_by_year_country(name),
            KpiKind::ClientsByPeriod(g) => self.clients_by_period(name, g),
            KpiKind::RevenueByPeriod(g) => self.revenue_by_period(name, g),
            KpiKind::RevenueByPeriodCountry(g) => self.revenue_by_period_country(name, g),
            KpiKind::ClientsGrowthByYear => with_growth(
                self.clients_by_year_country(name),
                NB_CLIENTS,
                ANNEE_INSCRIPTION,
                Some(PAYS),
            ),
            KpiKind::RevenueGrowth(g) => with_growth(
                self.revenue_by_period(name, g),
                CHIFFRE_AFFAIRES,
                g.column_name(),
                None,
            ),
        }
    }

    /// Unique customer ids per (registration year, country), sorted by both keys.
    fn clients_by_year_country(&self, name: KpiTableName) -> KpiTable {
        let mut groups: BTreeMap<(i32, &str), HashSet<i64>> = BTreeMap::new();
        for customer in self.customers {
            let Some(date) = customer.registration_date else {
                continue;
            };
            groups
                .entry((date.year(), customer.country.as_str()))
                .or_default()
                .insert(customer.id);
        }

        let mut table = KpiTable::new(
            name,
            vec![
                KpiColumn::new(ANNEE_INSCRIPTION, ColumnKind::Integer),
                KpiColumn::new(PAYS, ColumnKind::Text),
                KpiColumn::new(NB_CLIENTS, ColumnKind::Integer),
            ],
        );
        table.rows = groups
            .into_iter()
            .map(|((year, country), ids)| {
                vec![
                    KpiValue::Integer(i64::from(year)),
                    KpiValue::Text(Some(country.to_string())),
                    KpiValue::Integer(ids.len() as i64),
                ]
            })
            .collect();
        table
    }

    /// Customer rows per registration bucket.
    fn clients_by_period(&self, name: KpiTableName, granularity: Granularity) -> KpiTable {
        let mut counts: BTreeMap<Period, i64> = BTreeMap::new();
        for date in self.customers.iter().filter_map(|c| c.registration_date) {
            *counts.entry(Period::of(date, granularity)).or_default() += 1;
        }

        let mut table = KpiTable::new(
            name,
            vec![
                KpiColumn::new(DATE_INSCRIPTION, ColumnKind::Period(granularity)),
                KpiColumn::new(NB_CLIENTS, ColumnKind::Integer),
            ],
        );
        table.rows = counts
            .into_iter()
            .map(|(period, n)| vec![KpiValue::Period(period), KpiValue::Integer(n)])
            .collect();
        table
    }

    /// Summed amounts per purchase bucket, ascending.
    fn revenue_by_period(&self, name: KpiTableName, granularity: Granularity) -> KpiTable {
        let mut sums: BTreeMap<Period, f64> = BTreeMap::new();
        for joined in self.purchases {
            let Some(date) = joined.purchase.purchase_date else {
                continue;
            };
            *sums.entry(Period::of(date, granularity)).or_default() +=
                joined.purchase.amount.unwrap_or(0.0);
        }

        let mut table = KpiTable::new(
            name,
            vec![
                KpiColumn::new(granularity.column_name(), ColumnKind::Period(granularity)),
                KpiColumn::new(CHIFFRE_AFFAIRES, ColumnKind::Float),
            ],
        );
        table.rows = sums
            .into_iter()
            .map(|(period, sum)| vec![KpiValue::Period(period), KpiValue::Float(Some(sum))])
            .collect();
        table
    }

    /// Summed amounts per (bucket, country): bucket ascending, revenue descending.
    ///
    /// Purchases without a resolved country are left out. Revenue ties keep
    /// grouping order (country ascending).
    fn revenue_by_period_country(&self, name: KpiTableName, granularity: Granularity) -> KpiTable {
        let mut sums: BTreeMap<(Period, &str), f64> = BTreeMap::new();
        for joined in self.purchases {
            let (Some(date), Some(country)) =
                (joined.purchase.purchase_date, joined.country.as_deref())
            else {
                continue;
            };
            *sums
                .entry((Period::of(date, granularity), country))
                .or_default() += joined.purchase.amount.unwrap_or(0.0);
        }

        let mut grouped: Vec<((Period, &str), f64)> = sums.into_iter().collect();
        // stable: equal revenues stay in grouping order
        grouped.sort_by(|((pa, _), ra), ((pb, _), rb)| pa.cmp(pb).then(rb.total_cmp(ra)));

        let mut table = KpiTable::new(
            name,
            vec![
                KpiColumn::new(granularity.column_name(), ColumnKind::Period(granularity)),
                KpiColumn::new(PAYS, ColumnKind::Text),
                KpiColumn::new(CHIFFRE_AFFAIRES, ColumnKind::Float),
            ],
        );
        table.rows = grouped
            .into_iter()
            .map(|((period, country), sum)| {
                vec![
                    KpiValue::Period(period),
                    KpiValue::Text(Some(country.to_string())),
                    KpiValue::Float(Some(sum)),
                ]
            })
            .collect();
        table
    }
}

/// Appends `taux_croissance`, the growth of `value_column` along `period_column`.
///
/// Rows are stably sorted by period first. With a partition column, each
/// partition is its own series and its first period has no growth.
pub fn with_growth(
    mut table: KpiTable,
    value_column: &str,
    period_column: &str,
    partition_column: Option<&str>,
) -> KpiTable {
    let mut rates = vec![None; table.rows.len()];

    if let (Some(value_idx), Some(period_idx)) = (
        table.column_index(value_column),
        table.column_index(period_column),
    ) {
        table
            .rows
            .sort_by(|a, b| compare_keys(&a[period_idx], &b[period_idx]));

        let partition_idx = partition_column.and_then(|c| table.column_index(c));
        let mut partitions: BTreeMap<Option<String>, Vec<usize>> = BTreeMap::new();
        for (i, row) in table.rows.iter().enumerate() {
            let key = partition_idx.and_then(|p| row[p].as_text().map(str::to_string));
            partitions.entry(key).or_default().push(i);
        }

        for indices in partitions.values() {
            let values: Vec<f64> = indices
                .iter()
                .map(|&i| table.rows[i][value_idx].as_f64().unwrap_or(f64::NAN))
                .collect();
            for (&i, rate) in indices.iter().zip(growth_rates(&values)) {
                rates[i] = rate;
            }
        }
    }

    table
        .columns
        .push(KpiColumn::new(TAUX_CROISSANCE, ColumnKind::Float));
    for (row, rate) in table.rows.iter_mut().zip(rates) {
        row.push(KpiValue::Float(rate));
    }
    table
}

fn compare_keys(a: &KpiValue, b: &KpiValue) -> Ordering {
    match (a, b) {
        (KpiValue::Period(a), KpiValue::Period(b)) => a.cmp(b),
        (KpiValue::Integer(a), KpiValue::Integer(b)) => a.cmp(b),
        (KpiValue::Text(a), KpiValue::Text(b)) => a.cmp(b),
        (KpiValue::Float(a), KpiValue::Float(b)) => a
            .unwrap_or(f64::NAN)
            .total_cmp(&b.unwrap_or(f64::NAN)),
        _ => Ordering::Equal,
    }
}
