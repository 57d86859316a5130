// medallion-core/src/application/sync.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt;
use tracing::{error, info, instrument, warn};

use crate::domain::kpi::{KpiTable, KpiTableName, KpiValue};
use crate::error::MedallionError;
use crate::infrastructure::codec::decode_kpi_table;
use crate::ports::document_store::{Document, DocumentFilter, DocumentStore};
use crate::ports::object_store::ObjectStore;

/// Collection holding one descriptor document per synced table.
pub const METADATA_COLLECTION: &str = "metadata";
pub const LAST_UPDATED_FIELD: &str = "last_updated";

/// Progress of one table's sync. A table only reaches `Done` after its
/// previous generation was deleted and the new one inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPhase {
    NotStarted,
    ReadingArtifact,
    Converting,
    Replacing,
    Done,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncPhase::NotStarted => "not-started",
            SyncPhase::ReadingArtifact => "reading-artifact",
            SyncPhase::Converting => "converting",
            SyncPhase::Replacing => "replacing",
            SyncPhase::Done => "done",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub table: KpiTableName,
    /// Last phase reached. Anything but `Done` means the sync failed there.
    pub phase: SyncPhase,
    pub deleted: u64,
    pub inserted: u64,
    pub error: Option<String>,
    /// The data is in place but its `metadata` descriptor could not be replaced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_error: Option<String>,
}

impl SyncOutcome {
    pub fn success(&self) -> bool {
        self.phase == SyncPhase::Done
    }
}

/// Copies gold artifacts into the serving store, one snapshot replace per table.
pub struct SyncEngine<'a> {
    objects: &'a dyn ObjectStore,
    documents: &'a dyn DocumentStore,
    gold_bucket: String,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        objects: &'a dyn ObjectStore,
        documents: &'a dyn DocumentStore,
        gold_bucket: impl Into<String>,
    ) -> Self {
        Self {
            objects,
            documents,
            gold_bucket: gold_bucket.into(),
        }
    }

    /// Syncs every table in order. A failed table is reported and the
    /// remaining tables still run.
    pub async fn sync_all(&self, tables: &[KpiTableName]) -> Vec<SyncOutcome> {
        let now = Utc::now();
        let mut outcomes = Vec::with_capacity(tables.len());
        for &table in tables {
            outcomes.push(self.run(table, now).await);
        }
        outcomes
    }

    pub async fn sync_table(&self, table: KpiTableName) -> Result<SyncOutcome, MedallionError> {
        self.sync_table_at(table, Utc::now()).await
    }

    /// Same as [`SyncEngine::sync_table`] with a fixed `last_updated` stamp.
    pub async fn sync_table_at(
        &self,
        table: KpiTableName,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, MedallionError> {
        let outcome = self.run(table, now).await;
        match &outcome.error {
            None => Ok(outcome),
            Some(reason) => Err(MedallionError::Sync {
                table: table.to_string(),
                phase: outcome.phase.to_string(),
                reason: reason.clone(),
            }),
        }
    }

    #[instrument(skip(self, table, now), fields(table = %table))]
    async fn run(&self, table: KpiTableName, now: DateTime<Utc>) -> SyncOutcome {
        let mut outcome = SyncOutcome {
            table,
            phase: SyncPhase::NotStarted,
            deleted: 0,
            inserted: 0,
            error: None,
            metadata_error: None,
        };

        match self.replace(table, now, &mut outcome).await {
            Err(e) => {
                error!(phase = %outcome.phase, error = %e, "Table sync failed");
                outcome.error = Some(e.to_string());
            }
            Ok(descriptor) => {
                info!(
                    deleted = outcome.deleted,
                    inserted = outcome.inserted,
                    "Table synced"
                );
                if let Err(e) = self.replace_metadata(table, descriptor).await {
                    warn!(error = %e, "Metadata descriptor not updated");
                    outcome.metadata_error = Some(e.to_string());
                }
            }
        }
        outcome
    }

    async fn replace(
        &self,
        table: KpiTableName,
        now: DateTime<Utc>,
        outcome: &mut SyncOutcome,
    ) -> Result<Document, MedallionError> {
        let artifact = table.artifact_name();

        outcome.phase = SyncPhase::ReadingArtifact;
        let bytes = self.objects.get_object(&self.gold_bucket, &artifact).await?;
        let kpi = decode_kpi_table(table, &bytes)?;

        outcome.phase = SyncPhase::Converting;
        let last_updated = Value::String(now.to_rfc3339());
        let docs: Vec<Document> = kpi
            .rows
            .iter()
            .map(|row| row_to_document(&kpi, row, &last_updated))
            .collect();

        // Readers see an empty collection between these two calls.
        outcome.phase = SyncPhase::Replacing;
        let collection = table.as_str();
        outcome.deleted = self.documents.delete_many(collection, None).await?;
        outcome.inserted = self.documents.insert_many(collection, docs).await?;
        outcome.phase = SyncPhase::Done;

        Ok(metadata_document(&kpi, &artifact, &last_updated))
    }

    async fn replace_metadata(
        &self,
        table: KpiTableName,
        descriptor: Document,
    ) -> Result<(), MedallionError> {
        let by_table = DocumentFilter::new("table", table.as_str());
        self.documents
            .delete_many(METADATA_COLLECTION, Some(&by_table))
            .await?;
        self.documents
            .insert_many(METADATA_COLLECTION, vec![descriptor])
            .await?;
        Ok(())
    }
}

/// Flattens one KPI row. Periods become their label, missing values null.
pub fn row_to_document(table: &KpiTable, row: &[KpiValue], last_updated: &Value) -> Document {
    let mut doc = Document::new();
    for (column, value) in table.columns.iter().zip(row) {
        doc.insert(column.name.clone(), to_json(value));
    }
    doc.insert(LAST_UPDATED_FIELD.to_string(), last_updated.clone());
    doc
}

fn to_json(value: &KpiValue) -> Value {
    match value {
        KpiValue::Period(p) => Value::String(p.label()),
        KpiValue::Integer(i) => Value::from(*i),
        KpiValue::Float(f) => f.and_then(Number::from_f64).map_or(Value::Null, Value::Number),
        KpiValue::Text(t) => t.clone().map_or(Value::Null, Value::String),
    }
}

fn metadata_document(table: &KpiTable, artifact: &str, last_updated: &Value) -> Document {
    let mut doc = Document::new();
    doc.insert("table".into(), Value::from(table.name.as_str()));
    doc.insert("artifact".into(), Value::from(artifact));
    doc.insert("row_count".into(), Value::from(table.len() as u64));
    doc.insert(
        "columns".into(),
        Value::Array(
            table
                .columns
                .iter()
                .map(|c| Value::from(c.name.as_str()))
                .collect(),
        ),
    );
    doc.insert(LAST_UPDATED_FIELD.to_string(), last_updated.clone());
    doc
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::kpi::{ColumnKind, KpiColumn};
    use crate::domain::period::{Granularity, Period};
    use crate::infrastructure::adapters::{InMemoryDocumentStore, InMemoryObjectStore};
    use crate::infrastructure::codec::encode_kpi_table;
    use anyhow::Result;
    use chrono::{Duration, NaiveDate};

    fn ca_by_month_country() -> KpiTable {
        let mut table = KpiTable::new(
            KpiTableName::CaByMonthCountry,
            vec![
                KpiColumn::new("mois", ColumnKind::Period(Granularity::Month)),
                KpiColumn::new("pays", ColumnKind::Text),
                KpiColumn::new("chiffre_affaires", ColumnKind::Float),
            ],
        );
        let june = Period::of(NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(), Granularity::Month);
        table.rows.push(vec![
            KpiValue::Period(june),
            KpiValue::Text(Some("FR".into())),
            KpiValue::Float(Some(100.0)),
        ]);
        table.rows.push(vec![
            KpiValue::Period(june),
            KpiValue::Text(Some("DE".into())),
            KpiValue::Float(Some(40.0)),
        ]);
        table
    }

    async fn gold_store(tables: &[KpiTable]) -> Result<InMemoryObjectStore> {
        let store = InMemoryObjectStore::new();
        store.make_bucket("gold").await?;
        for table in tables {
            store
                .put_object("gold", &table.name.artifact_name(), &encode_kpi_table(table)?)
                .await?;
        }
        Ok(store)
    }

    fn without_timestamp(docs: Vec<Document>) -> Vec<Document> {
        docs.into_iter()
            .map(|mut d| {
                d.remove(LAST_UPDATED_FIELD);
                d
            })
            .collect()
    }

    #[tokio::test]
    async fn test_rows_become_flat_documents() -> Result<()> {
        let objects = gold_store(&[ca_by_month_country()]).await?;
        let documents = InMemoryDocumentStore::new();
        let engine = SyncEngine::new(&objects, &documents, "gold");

        let now = Utc::now();
        let outcome = engine
            .sync_table_at(KpiTableName::CaByMonthCountry, now)
            .await?;
        assert!(outcome.success());
        assert_eq!(outcome.inserted, 2);

        let docs = documents.find("ca_by_month_country", None).await?;
        assert_eq!(docs[0]["mois"], "2020-06");
        assert_eq!(docs[0]["pays"], "FR");
        assert_eq!(docs[0]["chiffre_affaires"], 100.0);
        assert_eq!(docs[0][LAST_UPDATED_FIELD], now.to_rfc3339());
        assert_eq!(docs[1]["_id"], "ca_by_month_country:1");
        Ok(())
    }

    #[tokio::test]
    async fn test_resync_is_idempotent_except_timestamp() -> Result<()> {
        let objects = gold_store(&[ca_by_month_country()]).await?;
        let documents = InMemoryDocumentStore::new();
        let engine = SyncEngine::new(&objects, &documents, "gold");

        let first_at = Utc::now();
        engine
            .sync_table_at(KpiTableName::CaByMonthCountry, first_at)
            .await?;
        let first = documents.find("ca_by_month_country", None).await?;

        let outcome = engine
            .sync_table_at(KpiTableName::CaByMonthCountry, first_at + Duration::seconds(5))
            .await?;
        assert_eq!(outcome.deleted, 2);
        let second = documents.find("ca_by_month_country", None).await?;

        assert_ne!(first[0][LAST_UPDATED_FIELD], second[0][LAST_UPDATED_FIELD]);
        assert_eq!(without_timestamp(first), without_timestamp(second));
        Ok(())
    }

    #[tokio::test]
    async fn test_metadata_descriptor_is_replaced() -> Result<()> {
        let objects = gold_store(&[ca_by_month_country()]).await?;
        let documents = InMemoryDocumentStore::new();
        let engine = SyncEngine::new(&objects, &documents, "gold");

        engine.sync_table(KpiTableName::CaByMonthCountry).await?;
        engine.sync_table(KpiTableName::CaByMonthCountry).await?;

        let meta = documents.find(METADATA_COLLECTION, None).await?;
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0]["table"], "ca_by_month_country");
        assert_eq!(meta[0]["artifact"], "ca_by_month_country.parquet");
        assert_eq!(meta[0]["row_count"], 2);
        assert_eq!(
            meta[0]["columns"],
            serde_json::json!(["mois", "pays", "chiffre_affaires"])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_metadata_failure_keeps_the_synced_data() -> Result<()> {
        let objects = gold_store(&[ca_by_month_country()]).await?;
        let documents = InMemoryDocumentStore::new();
        documents.fail_inserts_into(METADATA_COLLECTION).await;
        let engine = SyncEngine::new(&objects, &documents, "gold");

        let outcome = engine.sync_table(KpiTableName::CaByMonthCountry).await?;
        assert!(outcome.success());
        assert_eq!(outcome.phase, SyncPhase::Done);
        assert_eq!(outcome.inserted, 2);
        assert!(outcome.error.is_none());
        assert!(outcome.metadata_error.is_some());

        assert_eq!(documents.find("ca_by_month_country", None).await?.len(), 2);
        assert!(documents.find(METADATA_COLLECTION, None).await?.is_empty());
        assert_eq!(documents.collections().await, vec!["ca_by_month_country"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_artifact_fails_while_reading() -> Result<()> {
        let objects = gold_store(&[]).await?;
        let documents = InMemoryDocumentStore::new();
        let engine = SyncEngine::new(&objects, &documents, "gold");

        let err = engine
            .sync_table(KpiTableName::CaGrowthByYear)
            .await
            .unwrap_err();
        match err {
            MedallionError::Sync { table, phase, .. } => {
                assert_eq!(table, "ca_growth_by_year");
                assert_eq!(phase, "reading-artifact");
            }
            other => panic!("unexpected error: {other}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_collection_empty_and_others_run() -> Result<()> {
        let mut by_year = KpiTable::new(
            KpiTableName::CaByYearCountry,
            vec![
                KpiColumn::new("annee", ColumnKind::Period(Granularity::Year)),
                KpiColumn::new("pays", ColumnKind::Text),
                KpiColumn::new("chiffre_affaires", ColumnKind::Float),
            ],
        );
        by_year.rows.push(vec![
            KpiValue::Period(Period::Year(2020)),
            KpiValue::Text(None),
            KpiValue::Float(None),
        ]);
        let objects = gold_store(&[ca_by_month_country(), by_year]).await?;
        let documents = InMemoryDocumentStore::new();
        let engine = SyncEngine::new(&objects, &documents, "gold");

        let tables = [KpiTableName::CaByMonthCountry, KpiTableName::CaByYearCountry];
        let first = engine.sync_all(&tables).await;
        assert!(first.iter().all(SyncOutcome::success));

        documents.fail_inserts_into("ca_by_month_country").await;
        let second = engine.sync_all(&tables).await;

        assert_eq!(second[0].phase, SyncPhase::Replacing);
        assert_eq!(second[0].deleted, 2);
        assert!(second[0].error.is_some());
        assert!(documents.find("ca_by_month_country", None).await?.is_empty());

        assert!(second[1].success());
        let year_docs = documents.find("ca_by_year_country", None).await?;
        assert_eq!(year_docs[0]["annee"], "2020");
        assert_eq!(year_docs[0]["pays"], Value::Null);
        Ok(())
    }
}
