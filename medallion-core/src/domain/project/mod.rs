// medallion-core/src/domain/project/mod.rs

pub mod configuration;

pub use configuration::{
    BucketNames, GoldConfig, OrchestrationConfig, ProjectConfig, ServingConfig, SilverConfig,
    StorageConfig,
};
