// medallion-core/src/domain/records.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names shared by the raw exports, the silver artifacts and the KPI tables.
pub mod columns {
    pub const ID_CLIENT: &str = "id_client";
    pub const NOM: &str = "nom";
    pub const EMAIL: &str = "email";
    pub const DATE_INSCRIPTION: &str = "date_inscription";
    pub const PAYS: &str = "pays";

    pub const ID_ACHAT: &str = "id_achat";
    pub const DATE_ACHAT: &str = "date_achat";
    pub const MONTANT: &str = "montant";
    pub const PRODUIT: &str = "produit";

    pub const ANNEE_INSCRIPTION: &str = "annee_inscription";
    pub const NB_CLIENTS: &str = "nb_clients";
    pub const CHIFFRE_AFFAIRES: &str = "chiffre_affaires";
    pub const TAUX_CROISSANCE: &str = "taux_croissance";
}

/// The two source entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Customer,
    Purchase,
}

impl Entity {
    pub const ALL: [Entity; 2] = [Entity::Customer, Entity::Purchase];

    /// Canonical name, also the stem of every artifact of the entity.
    pub fn name(&self) -> &'static str {
        match self {
            Entity::Customer => "clients",
            Entity::Purchase => "achats",
        }
    }

    /// Key of the raw export in the bronze bucket.
    pub fn raw_object(&self) -> String {
        format!("{}.csv", self.name())
    }

    /// Key of the cleaned artifact in the silver bucket.
    pub fn silver_object(&self) -> String {
        format!("{}.parquet", self.name())
    }

    /// Key under which the untouched raw bytes are kept in the silver bucket.
    pub fn raw_export_object(&self) -> String {
        format!("raw/{}.parquet", self.name())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub registration_date: Option<NaiveDate>,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub purchase_date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub product: String,
}

/// A purchase with the country of its customer, `None` when the customer is unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedPurchase {
    pub purchase: Purchase,
    pub country: Option<String>,
}
