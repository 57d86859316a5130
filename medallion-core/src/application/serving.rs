// medallion-core/src/application/serving.rs

// Read side of the serving store: what an API or dashboard asks for.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::application::sync::METADATA_COLLECTION;
use crate::domain::error::DomainError;
use crate::domain::kpi::KpiTableName;
use crate::domain::records::columns::PAYS;
use crate::error::MedallionError;
use crate::ports::document_store::{Document, DocumentFilter, DocumentStore, ID_FIELD};

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: String,
}

pub struct ServingQueries<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ServingQueries<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Every document of a KPI table in insertion order. A table that was
    /// never synced (or is mid-replace) yields an empty list.
    pub async fn list(&self, table: &str) -> Result<Vec<Document>, MedallionError> {
        let table = resolve(table)?;
        self.fetch(table, None).await
    }

    /// Yearly revenue rows of one country.
    pub async fn ca_by_year_country_for(
        &self,
        country: &str,
    ) -> Result<Vec<Document>, MedallionError> {
        let filter = DocumentFilter::new(PAYS, country);
        self.fetch(KpiTableName::CaByYearCountry, Some(&filter))
            .await
    }

    /// The sync descriptor of a table, `None` before its first sync.
    pub async fn metadata(&self, table: &str) -> Result<Option<Document>, MedallionError> {
        let table = resolve(table)?;
        let filter = DocumentFilter::new("table", table.as_str());
        Ok(self
            .store
            .find_one(METADATA_COLLECTION, Some(&filter))
            .await?
            .map(stringify_id))
    }

    pub fn health(&self) -> Health {
        Health {
            status: "ok",
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    async fn fetch(
        &self,
        table: KpiTableName,
        filter: Option<&DocumentFilter>,
    ) -> Result<Vec<Document>, MedallionError> {
        Ok(self
            .store
            .find(table.as_str(), filter)
            .await?
            .into_iter()
            .map(stringify_id)
            .collect())
    }
}

fn resolve(table: &str) -> Result<KpiTableName, MedallionError> {
    table
        .parse::<KpiTableName>()
        .map_err(|_| DomainError::UnknownTable(table.to_string()).into())
}

fn stringify_id(mut doc: Document) -> Document {
    if let Some(id) = doc.get(ID_FIELD).filter(|v| !v.is_string()) {
        let rendered = id.to_string();
        doc.insert(ID_FIELD.to_string(), Value::String(rendered));
    }
    doc
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::InMemoryDocumentStore;
    use anyhow::Result;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_unsynced_table_is_empty_not_an_error() -> Result<()> {
        let store = InMemoryDocumentStore::new();
        let queries = ServingQueries::new(&store);
        assert!(queries.list("clients_by_year_country").await?.is_empty());
        assert!(queries.metadata("clients_by_year_country").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_table_is_rejected() {
        let store = InMemoryDocumentStore::new();
        let queries = ServingQueries::new(&store);
        let err = queries.list("distribution_global").await.unwrap_err();
        assert!(matches!(
            err,
            MedallionError::Domain(DomainError::UnknownTable(_))
        ));
    }

    #[tokio::test]
    async fn test_country_lookup_and_string_ids() -> Result<()> {
        let store = InMemoryDocumentStore::new();
        store
            .insert_many(
                "ca_by_year_country",
                vec![
                    doc(json!({"_id": 7, "annee": "2020", "pays": "FR", "chiffre_affaires": 100.0})),
                    doc(json!({"annee": "2021", "pays": "DE", "chiffre_affaires": 50.0})),
                    doc(json!({"annee": "2021", "pays": "FR", "chiffre_affaires": 30.0})),
                ],
            )
            .await?;
        let queries = ServingQueries::new(&store);

        let fr = queries.ca_by_year_country_for("FR").await?;
        assert_eq!(fr.len(), 2);
        assert_eq!(fr[0]["_id"], "7");
        assert_eq!(fr[1]["annee"], "2021");
        assert!(queries.ca_by_year_country_for("ES").await?.is_empty());

        let all = queries.list("ca_by_year_country.parquet").await?;
        assert!(all.iter().all(|d| d["_id"].is_string()));
        Ok(())
    }

    #[test]
    fn test_health() {
        let store = InMemoryDocumentStore::new();
        assert_eq!(ServingQueries::new(&store).health().status, "ok");
    }
}
