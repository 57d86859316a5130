// medallion-core/src/domain/join.rs

use std::collections::HashMap;

use crate::domain::records::{Customer, JoinedPurchase, Purchase};

/// Left join of purchases onto customer country, on customer id.
///
/// Every purchase appears exactly once, in input order. Should a customer id
/// appear twice on the right side, its first occurrence wins.
pub fn join_purchases(purchases: &[Purchase], customers: &[Customer]) -> Vec<JoinedPurchase> {
    let mut countries: HashMap<i64, &str> = HashMap::with_capacity(customers.len());
    for customer in customers {
        countries
            .entry(customer.id)
            .or_insert(customer.country.as_str());
    }

    purchases
        .iter()
        .map(|purchase| JoinedPurchase {
            country: purchase
                .customer_id
                .and_then(|id| countries.get(&id))
                .map(|c| c.to_string()),
            purchase: purchase.clone(),
        })
        .collect()
}
