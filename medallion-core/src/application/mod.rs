// medallion-core/src/application/mod.rs

pub mod clean;
pub mod gold;
pub mod inspect;
pub mod pipeline;
pub mod serving;
pub mod silver;
pub mod stage;
pub mod sync;

// --- RE-EXPORTS (FACADE PATTERN) ---
// The CLI imports use cases from here without knowing the file layout.

pub use clean::clean_project;
pub use gold::{GoldArtifact, gold_transformation};
pub use inspect::inspect_artifact;
pub use pipeline::{ProjectPaths, RUN_RESULTS_FILE, RunResult, run_pipeline, run_sync_stage};
pub use serving::{Health, ServingQueries};
pub use silver::{SilverReport, run_silver, silver_transformation};
pub use stage::{RetryPolicy, StageTiming, run_stage};
pub use sync::{METADATA_COLLECTION, SyncEngine, SyncOutcome, SyncPhase};
