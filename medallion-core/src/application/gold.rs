// medallion-core/src/application/gold.rs

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::aggregation::AggregationEngine;
use crate::domain::join::join_purchases;
use crate::domain::kpi::KpiTableName;
use crate::domain::project::ProjectConfig;
use crate::domain::records::{Customer, Entity, Purchase};
use crate::error::MedallionError;
use crate::infrastructure::codec::{decode_customers, decode_purchases, encode_kpi_table};
use crate::ports::object_store::ObjectStore;

#[derive(Debug, Clone, Serialize)]
pub struct GoldArtifact {
    pub table: KpiTableName,
    pub artifact: String,
    pub rows: usize,
}

/// Silver Parquet to the configured gold KPI artifacts.
#[instrument(skip(store, config))]
pub async fn gold_transformation(
    store: &dyn ObjectStore,
    config: &ProjectConfig,
) -> Result<Vec<GoldArtifact>, MedallionError> {
    let buckets = &config.storage.buckets;

    let (customers, purchases) = load_silver(store, &buckets.silver).await?;
    let joined = join_purchases(&purchases, &customers);
    debug!(
        customers = customers.len(),
        purchases = joined.len(),
        "Silver tables loaded"
    );

    let engine = AggregationEngine::new(&customers, &joined);
    store.ensure_bucket(&buckets.gold).await?;

    let mut artifacts = Vec::with_capacity(config.gold.tables.len());
    for table in engine.compute_all(&config.gold.tables) {
        let artifact = table.name.artifact_name();
        let encoded = encode_kpi_table(&table)?;
        store.put_object(&buckets.gold, &artifact, &encoded).await?;
        info!(table = %table.name, rows = table.len(), "Gold artifact written");

        artifacts.push(GoldArtifact {
            table: table.name,
            artifact,
            rows: table.len(),
        });
    }

    Ok(artifacts)
}

async fn load_silver(
    store: &dyn ObjectStore,
    bucket: &str,
) -> Result<(Vec<Customer>, Vec<Purchase>), MedallionError> {
    let customers = decode_customers(
        &store
            .get_object(bucket, &Entity::Customer.silver_object())
            .await?,
    )?;
    let purchases = decode_purchases(
        &store
            .get_object(bucket, &Entity::Purchase.silver_object())
            .await?,
    )?;
    Ok((customers, purchases))
}
