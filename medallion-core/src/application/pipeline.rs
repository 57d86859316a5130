// medallion-core/src/application/pipeline.rs

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::application::gold::{GoldArtifact, gold_transformation};
use crate::application::silver::{SilverReport, run_silver};
use crate::application::stage::{RetryPolicy, StageTiming, run_stage};
use crate::application::sync::{SyncEngine, SyncOutcome};
use crate::domain::project::ProjectConfig;
use crate::error::MedallionError;
use crate::infrastructure::adapters::{DuckDbDocumentStore, FileSystemObjectStore};
use crate::infrastructure::fs::atomic_write;
use crate::ports::document_store::DocumentStore;
use crate::ports::object_store::ObjectStore;

pub const RUN_RESULTS_FILE: &str = "run_results.json";

/// Locations of a project's storage, resolved against the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub storage_root: PathBuf,
    pub target_dir: PathBuf,
    pub serving_path: PathBuf,
}

impl ProjectPaths {
    pub fn resolve(project_dir: &Path, config: &ProjectConfig) -> Self {
        let under = |p: &str| {
            let path = Path::new(p);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                project_dir.join(path)
            }
        };
        Self {
            storage_root: under(&config.storage.root),
            target_dir: under(&config.target_path),
            serving_path: under(&config.serving.path),
        }
    }

    pub fn object_store(&self) -> FileSystemObjectStore {
        FileSystemObjectStore::new(&self.storage_root)
    }

    pub fn document_store(&self) -> Result<DuckDbDocumentStore, MedallionError> {
        Ok(DuckDbDocumentStore::new(&self.serving_path.to_string_lossy())?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunResult {
    pub success: bool,
    pub project: String,
    pub finished_at: String,
    pub stages: Vec<StageTiming>,
    #[serde(skip_deserializing)]
    pub silver: Vec<SilverReport>,
    #[serde(skip_deserializing)]
    pub gold: Vec<GoldArtifact>,
    #[serde(skip_deserializing)]
    pub sync: Vec<SyncOutcome>,
    pub errors: Vec<String>,
    /// Problems that did not fail the run, such as a stale metadata descriptor.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Silver, gold, then sync, one after the other.
///
/// Silver and gold failures stop the run (after their retries); sync failures
/// are per table and only mark the run as failed. The result is written to
/// `<target_dir>/run_results.json` in every case.
#[instrument(skip_all, fields(project = %config.name))]
pub async fn run_pipeline(
    objects: &dyn ObjectStore,
    documents: &dyn DocumentStore,
    config: &ProjectConfig,
    target_dir: &Path,
) -> Result<RunResult, MedallionError> {
    info!("Starting pipeline");
    let policy = RetryPolicy::from(&config.orchestration);
    let mut result = RunResult {
        project: config.name.clone(),
        ..Default::default()
    };

    // 1. SILVER
    let (silver, timing) = run_stage("silver", policy, || run_silver(objects, config)).await;
    result.stages.push(timing);
    match silver {
        Ok(reports) => result.silver = reports,
        Err(e) => return fail(result, target_dir, e),
    }

    // 2. GOLD
    let (gold, timing) = run_stage("gold", policy, || gold_transformation(objects, config)).await;
    result.stages.push(timing);
    match gold {
        Ok(artifacts) => result.gold = artifacts,
        Err(e) => return fail(result, target_dir, e),
    }

    // 3. SYNC
    let (outcomes, timing) = run_sync_stage(objects, documents, config).await;
    result.stages.push(timing);

    for outcome in &outcomes {
        if let Some(reason) = &outcome.metadata_error {
            warn!(table = %outcome.table, error = %reason, "Metadata descriptor is stale");
            result.warnings.push(format!(
                "metadata of '{}' not updated: {}",
                outcome.table, reason
            ));
        }
    }

    for outcome in outcomes.iter().filter(|o| !o.success()) {
        result.errors.push(format!(
            "sync of '{}' failed while {}: {}",
            outcome.table,
            outcome.phase,
            outcome.error.as_deref().unwrap_or("unknown error")
        ));
    }
    result.sync = outcomes;
    result.success = result.errors.is_empty();

    save_result(&mut result, target_dir)?;
    info!(success = result.success, "Pipeline finished");
    Ok(result)
}

/// Syncs the configured tables under the stage retry policy.
///
/// A failed table fails the attempt, so a retry re-syncs every table. The
/// outcomes of the last attempt are returned either way.
pub async fn run_sync_stage(
    objects: &dyn ObjectStore,
    documents: &dyn DocumentStore,
    config: &ProjectConfig,
) -> (Vec<SyncOutcome>, StageTiming) {
    let engine = &SyncEngine::new(objects, documents, config.storage.buckets.gold.clone());
    let tables = &config.gold.tables;
    let last_attempt = Mutex::new(Vec::new());
    let slot = &last_attempt;

    let policy = RetryPolicy::from(&config.orchestration);
    let (_, timing) = run_stage("sync", policy, || async move {
        let outcomes = engine.sync_all(tables).await;
        let failure = outcomes
            .iter()
            .find(|o| !o.success())
            .map(|o| MedallionError::Sync {
                table: o.table.to_string(),
                phase: o.phase.to_string(),
                reason: o.error.clone().unwrap_or_default(),
            });
        *slot.lock().await = outcomes;
        failure.map_or(Ok(()), Err)
    })
    .await;

    (last_attempt.into_inner(), timing)
}

fn fail(
    mut result: RunResult,
    target_dir: &Path,
    e: MedallionError,
) -> Result<RunResult, MedallionError> {
    error!(error = %e, "Pipeline aborted");
    result.errors.push(e.to_string());
    result.success = false;
    save_result(&mut result, target_dir)?;
    Err(e)
}

fn save_result(result: &mut RunResult, target_dir: &Path) -> Result<(), MedallionError> {
    result.finished_at = Utc::now().to_rfc3339();
    let json = serde_json::to_string_pretty(result)
        .map_err(crate::infrastructure::error::InfrastructureError::from)?;
    atomic_write(target_dir.join(RUN_RESULTS_FILE), json)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::application::serving::ServingQueries;
    use crate::application::sync::METADATA_COLLECTION;
    use crate::infrastructure::adapters::{InMemoryDocumentStore, InMemoryObjectStore};
    use anyhow::Result;
    use tempfile::tempdir;

    const CLIENTS: &str = "id_client,nom,email,date_inscription,pays\n\
        1,Alice,a@x.com,2020-01-01,FR\n\
        2,Bob,b@x.com,2021-01-01,DE\n";
    const ACHATS: &str = "id_achat,id_client,date_achat,montant,produit\n\
        10,1,2020-06-01,100,p\n\
        11,2,2021-06-01,50,p\n";

    async fn bronze(clients: &str) -> Result<InMemoryObjectStore> {
        let store = InMemoryObjectStore::new();
        store.make_bucket("bronze").await?;
        store.put_object("bronze", "clients.csv", clients.as_bytes()).await?;
        store.put_object("bronze", "achats.csv", ACHATS.as_bytes()).await?;
        Ok(store)
    }

    #[tokio::test]
    async fn test_end_to_end_in_memory() -> Result<()> {
        let objects = bronze(CLIENTS).await?;
        let documents = InMemoryDocumentStore::new();
        let config = ProjectConfig::named("retail");
        let target = tempdir()?;

        let result = run_pipeline(&objects, &documents, &config, target.path()).await?;
        assert!(result.success, "{:?}", result.errors);
        let stages: Vec<&str> = result.stages.iter().map(|s| s.stage.as_str()).collect();
        assert_eq!(stages, vec!["silver", "gold", "sync"]);
        assert_eq!(result.sync.len(), 6);
        let mut expected: Vec<String> = config
            .gold
            .tables
            .iter()
            .map(|t| t.to_string())
            .chain(std::iter::once(METADATA_COLLECTION.to_string()))
            .collect();
        expected.sort();
        assert_eq!(documents.collections().await, expected);

        let queries = ServingQueries::new(&documents);
        let clients = queries.list("clients_by_year_country").await?;
        let rows: Vec<(i64, String, i64)> = clients
            .iter()
            .map(|d| {
                (
                    d["annee_inscription"].as_i64().unwrap(),
                    d["pays"].as_str().unwrap().to_string(),
                    d["nb_clients"].as_i64().unwrap(),
                )
            })
            .collect();
        assert_eq!(rows, vec![(2020, "FR".into(), 1), (2021, "DE".into(), 1)]);

        let growth = queries.list("ca_growth_by_year").await?;
        assert_eq!(growth[0]["annee"], "2020");
        assert!(growth[0]["taux_croissance"].is_null());
        assert_eq!(growth[1]["taux_croissance"], -0.5);

        let meta = queries.metadata("ca_growth_by_year").await?.unwrap();
        assert_eq!(meta["row_count"], 2);

        let saved: RunResult = serde_json::from_str(&std::fs::read_to_string(
            target.path().join(RUN_RESULTS_FILE),
        )?)?;
        assert!(saved.success);
        assert_eq!(saved.stages.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_silver_failure_stops_the_run() -> Result<()> {
        let objects = bronze("id_client,nom\n1,a,b\n").await?;
        let documents = InMemoryDocumentStore::new();
        let config = ProjectConfig::named("retail");
        let target = tempdir()?;

        let err = run_pipeline(&objects, &documents, &config, target.path())
            .await
            .unwrap_err();
        assert!(matches!(err, MedallionError::SourceParse { .. }));
        assert!(!objects.bucket_exists("gold").await?);

        let saved: RunResult = serde_json::from_str(&std::fs::read_to_string(
            target.path().join(RUN_RESULTS_FILE),
        )?)?;
        assert!(!saved.success);
        assert_eq!(saved.stages.len(), 1);
        assert_eq!(saved.errors.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_sync_failure_marks_run_failed() -> Result<()> {
        let objects = bronze(CLIENTS).await?;
        let documents = InMemoryDocumentStore::new();
        documents.fail_inserts_into("ca_by_day_country").await;
        let config = ProjectConfig::named("retail");
        let target = tempdir()?;

        let result = run_pipeline(&objects, &documents, &config, target.path()).await?;
        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("ca_by_day_country"));
        assert!(!result.stages[2].success);
        assert_eq!(result.stages[2].attempts, 1);
        assert_eq!(result.sync.iter().filter(|o| o.success()).count(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_sync_stage_retries_a_transient_failure() -> Result<()> {
        let objects = bronze(CLIENTS).await?;
        let documents = InMemoryDocumentStore::new();
        documents.fail_next_inserts_into("ca_by_day_country", 1).await;
        let mut config = ProjectConfig::named("retail");
        config.orchestration.retries = 2;
        config.orchestration.retry_delay_ms = 1;
        let target = tempdir()?;

        let result = run_pipeline(&objects, &documents, &config, target.path()).await?;
        assert!(result.success, "{:?}", result.errors);
        assert!(result.stages[2].success);
        assert_eq!(result.stages[2].attempts, 2);
        assert!(result.sync.iter().all(SyncOutcome::success));
        assert!(
            !documents
                .find("ca_by_day_country", None)
                .await?
                .is_empty()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_persistent_sync_failure_exhausts_retries() -> Result<()> {
        let objects = bronze(CLIENTS).await?;
        let documents = InMemoryDocumentStore::new();
        documents.fail_inserts_into("ca_growth_by_year").await;
        let mut config = ProjectConfig::named("retail");
        config.orchestration.retries = 1;
        config.orchestration.retry_delay_ms = 1;
        let target = tempdir()?;

        let result = run_pipeline(&objects, &documents, &config, target.path()).await?;
        assert!(!result.success);
        assert_eq!(result.stages[2].attempts, 2);
        assert_eq!(result.errors.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_metadata_failure_is_a_warning() -> Result<()> {
        let objects = bronze(CLIENTS).await?;
        let documents = InMemoryDocumentStore::new();
        documents.fail_inserts_into("metadata").await;
        let config = ProjectConfig::named("retail");
        let target = tempdir()?;

        let result = run_pipeline(&objects, &documents, &config, target.path()).await?;
        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 6);
        Ok(())
    }

    #[test]
    fn test_paths_resolve_against_project() {
        let mut config = ProjectConfig::named("t");
        config.serving.path = "/var/lib/serving.duckdb".into();
        let paths = ProjectPaths::resolve(Path::new("/projects/retail"), &config);
        assert_eq!(paths.storage_root, PathBuf::from("/projects/retail/data"));
        assert_eq!(paths.target_dir, PathBuf::from("/projects/retail/target"));
        assert_eq!(paths.serving_path, PathBuf::from("/var/lib/serving.duckdb"));
        assert_eq!(
            paths.object_store().root(),
            Path::new("/projects/retail/data")
        );
    }
}
