// medallion-core/src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::domain::kpi::KpiTableName;

#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct ProjectConfig {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,
    pub version: String,

    #[serde(rename = "target-path", default = "default_target_path")]
    pub target_path: String,

    #[serde(rename = "clean-targets", default = "default_clean_targets")]
    pub clean_targets: Vec<String>,

    #[validate(nested)]
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub silver: SilverConfig,

    #[validate(nested)]
    #[serde(default)]
    pub gold: GoldConfig,

    #[serde(default)]
    pub serving: ServingConfig,

    #[validate(nested)]
    #[serde(default)]
    pub orchestration: OrchestrationConfig,
}

#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct StorageConfig {
    /// Directory holding one sub-directory per bucket, relative to the project.
    #[serde(default = "default_storage_root")]
    pub root: String,

    #[validate(nested)]
    #[serde(default)]
    pub buckets: BucketNames,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            buckets: BucketNames::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct BucketNames {
    #[validate(length(min = 1, message = "Bucket name cannot be empty"))]
    #[serde(default = "default_bronze")]
    pub bronze: String,

    #[validate(length(min = 1, message = "Bucket name cannot be empty"))]
    #[serde(default = "default_silver")]
    pub silver: String,

    #[validate(length(min = 1, message = "Bucket name cannot be empty"))]
    #[serde(default = "default_gold")]
    pub gold: String,
}

impl Default for BucketNames {
    fn default() -> Self {
        Self {
            bronze: default_bronze(),
            silver: default_silver(),
            gold: default_gold(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SilverConfig {
    /// Also keep the untouched raw bytes under `raw/<entity>.parquet`.
    #[serde(rename = "preserve-raw-export", default = "default_true")]
    pub preserve_raw_export: bool,
}

impl Default for SilverConfig {
    fn default() -> Self {
        Self {
            preserve_raw_export: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct GoldConfig {
    /// Tables computed, written and synced. Anything else is not computed.
    #[validate(length(min = 1, message = "At least one KPI table must be published"))]
    #[serde(default = "default_tables")]
    pub tables: Vec<KpiTableName>,
}

impl Default for GoldConfig {
    fn default() -> Self {
        Self {
            tables: default_tables(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServingConfig {
    /// DuckDB file backing the serving store, relative to the project.
    #[serde(default = "default_serving_path")]
    pub path: String,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            path: default_serving_path(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct OrchestrationConfig {
    #[validate(range(max = 10, message = "At most 10 retries per stage"))]
    #[serde(default)]
    pub retries: u32,

    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl OrchestrationConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl ProjectConfig {
    /// A config with every default, for embedding and tests.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: "0.1.0".to_string(),
            target_path: default_target_path(),
            clean_targets: default_clean_targets(),
            storage: StorageConfig::default(),
            silver: SilverConfig::default(),
            gold: GoldConfig::default(),
            serving: ServingConfig::default(),
            orchestration: OrchestrationConfig::default(),
        }
    }
}

fn default_clean_targets() -> Vec<String> {
    vec!["target".to_string()]
}
fn default_target_path() -> String {
    "target".to_string()
}
fn default_storage_root() -> String {
    "data".to_string()
}
fn default_bronze() -> String {
    "bronze".to_string()
}
fn default_silver() -> String {
    "silver".to_string()
}
fn default_gold() -> String {
    "gold".to_string()
}
fn default_true() -> bool {
    true
}
fn default_tables() -> Vec<KpiTableName> {
    KpiTableName::PUBLISHED.to_vec()
}
fn default_serving_path() -> String {
    "target/serving.duckdb".to_string()
}
fn default_retry_delay_ms() -> u64 {
    500
}
