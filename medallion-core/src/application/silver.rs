// medallion-core/src/application/silver.rs

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::domain::cleaning::{CleaningStats, CustomerRules, PurchaseRules, normalize};
use crate::domain::project::ProjectConfig;
use crate::domain::records::Entity;
use crate::error::MedallionError;
use crate::infrastructure::codec::{encode_customers, encode_purchases, read_raw_table};
use crate::ports::object_store::ObjectStore;

#[derive(Debug, Clone, Serialize)]
pub struct SilverReport {
    pub entity: Entity,
    pub artifact: String,
    pub raw_export: Option<String>,
    pub stats: CleaningStats,
}

/// Bronze CSV to silver Parquet for one entity.
///
/// A source that cannot be parsed aborts this entity with
/// [`MedallionError::SourceParse`]; nothing is written in that case.
#[instrument(skip(store, config, entity), fields(entity = %entity))]
pub async fn silver_transformation(
    store: &dyn ObjectStore,
    config: &ProjectConfig,
    entity: Entity,
) -> Result<SilverReport, MedallionError> {
    let buckets = &config.storage.buckets;
    let source = entity.raw_object();

    let raw = store.get_object(&buckets.bronze, &source).await?;
    let table = read_raw_table(&raw).map_err(|e| MedallionError::SourceParse {
        object: format!("{}/{}", buckets.bronze, source),
        source: e,
    })?;

    let (encoded, stats) = match entity {
        Entity::Customer => {
            let cleaned = normalize(&CustomerRules, &table)?;
            (encode_customers(&cleaned.records)?, cleaned.stats)
        }
        Entity::Purchase => {
            let cleaned = normalize(&PurchaseRules, &table)?;
            (encode_purchases(&cleaned.records)?, cleaned.stats)
        }
    };

    if stats.invalid_identifiers > 0 {
        warn!(
            dropped = stats.invalid_identifiers,
            "Rows dropped for non-integer identifiers"
        );
    }

    store.ensure_bucket(&buckets.silver).await?;
    let artifact = entity.silver_object();
    store.put_object(&buckets.silver, &artifact, &encoded).await?;

    let raw_export = if config.silver.preserve_raw_export {
        let key = entity.raw_export_object();
        store.put_object(&buckets.silver, &key, &raw).await?;
        Some(key)
    } else {
        None
    };

    info!(
        input = stats.input_rows,
        output = stats.output_rows,
        duplicates = stats.duplicates,
        "Silver artifact written"
    );

    Ok(SilverReport {
        entity,
        artifact,
        raw_export,
        stats,
    })
}

/// Both entities, customers first. Stops at the first failure.
pub async fn run_silver(
    store: &dyn ObjectStore,
    config: &ProjectConfig,
) -> Result<Vec<SilverReport>, MedallionError> {
    let mut reports = Vec::with_capacity(Entity::ALL.len());
    for entity in Entity::ALL {
        reports.push(silver_transformation(store, config, entity).await?);
    }
    Ok(reports)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::InMemoryObjectStore;
    use crate::infrastructure::codec::{decode_customers, decode_purchases};
    use crate::infrastructure::error::InfrastructureError;
    use anyhow::Result;

    const CLIENTS: &str = "id_client,nom,email,date_inscription,pays\n\
        1,Alice,a@x.com,2020-01-01,FR\n\
        1,Alice bis,other@x.com,2020-02-01,FR\n\
        2,Bob,a@x.com,2020-03-01,DE\n\
        3,Chloe,c@x.com,15/03/2021,IT\n\
        ,,,,\n\
        4,Dan,,2021-01-01,FR\n";

    const ACHATS: &str = "id_achat,id_client,date_achat,montant,produit\n\
        10,1,2020-06-01,100,p\n\
        10,3,2021/06/01,50.5,q\n\
        ,1,2020-06-01,1,r\n\
        12,99,not a date,abc,s\n";

    async fn seeded(clients: &str, achats: &str) -> Result<InMemoryObjectStore> {
        let store = InMemoryObjectStore::new();
        store.make_bucket("bronze").await?;
        store.put_object("bronze", "clients.csv", clients.as_bytes()).await?;
        store.put_object("bronze", "achats.csv", achats.as_bytes()).await?;
        Ok(store)
    }

    #[tokio::test]
    async fn test_customers_are_cleaned_and_exported() -> Result<()> {
        let store = seeded(CLIENTS, ACHATS).await?;
        let config = ProjectConfig::named("test");

        let report = silver_transformation(&store, &config, Entity::Customer).await?;
        assert_eq!(report.artifact, "clients.parquet");
        assert_eq!(report.stats.input_rows, 6);
        assert_eq!(report.stats.output_rows, 2);

        let customers = decode_customers(&store.get_object("silver", "clients.parquet").await?)?;
        let ids: Vec<i64> = customers.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(
            customers[1].registration_date.map(|d| d.to_string()),
            Some("2021-03-15".to_string())
        );

        assert_eq!(
            store.get_object("silver", "raw/clients.parquet").await?,
            CLIENTS.as_bytes()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_ids_are_not_deduplicated() -> Result<()> {
        let store = seeded(CLIENTS, ACHATS).await?;
        let config = ProjectConfig::named("test");

        silver_transformation(&store, &config, Entity::Purchase).await?;
        let purchases = decode_purchases(&store.get_object("silver", "achats.parquet").await?)?;

        let ids: Vec<i64> = purchases.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![10, 10, 12]);
        assert_eq!(purchases[1].amount, Some(50.5));
        assert_eq!(purchases[2].purchase_date, None);
        assert_eq!(purchases[2].amount, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_raw_export_can_be_disabled() -> Result<()> {
        let store = seeded(CLIENTS, ACHATS).await?;
        let mut config = ProjectConfig::named("test");
        config.silver.preserve_raw_export = false;

        let reports = run_silver(&store, &config).await?;
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.raw_export.is_none()));
        assert!(!store.object_exists("silver", "raw/clients.parquet").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_source_is_a_parse_error() -> Result<()> {
        let store = seeded("id_client,nom\n1,a,extra\n", ACHATS).await?;
        let config = ProjectConfig::named("test");

        let err = silver_transformation(&store, &config, Entity::Customer)
            .await
            .unwrap_err();
        match err {
            MedallionError::SourceParse { object, .. } => assert_eq!(object, "bronze/clients.csv"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!store.bucket_exists("silver").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_source_object() -> Result<()> {
        let store = InMemoryObjectStore::new();
        store.make_bucket("bronze").await?;
        let err = silver_transformation(&store, &ProjectConfig::named("t"), Entity::Purchase)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MedallionError::Infrastructure(InfrastructureError::ObjectNotFound { .. })
        ));
        Ok(())
    }
}
