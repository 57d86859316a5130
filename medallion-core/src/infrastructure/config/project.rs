// medallion-core/src/infrastructure/config/project.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::project::configuration::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;

/// Manifest file names, in lookup order.
pub const CONFIG_CANDIDATES: [&str; 2] = ["medallion.yaml", "medallion_project.yaml"];

/// Environment variables that override manifest values after load.
pub const ENV_TARGET_PATH: &str = "MEDALLION_TARGET_PATH";
pub const ENV_STORAGE_ROOT: &str = "MEDALLION_STORAGE_ROOT";
pub const ENV_SERVING_PATH: &str = "MEDALLION_SERVING_PATH";

pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    load_project_config_with_env(project_dir, |key| std::env::var(key).ok())
}

/// Same as [`load_project_config`], reading overrides through `env`.
#[instrument(skip(project_dir, env))]
pub fn load_project_config_with_env<F>(
    project_dir: &Path,
    env: F,
) -> Result<ProjectConfig, InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project manifest");

    let content = fs::read_to_string(&config_path)?;
    let mut config: ProjectConfig = serde_yaml::from_str(&content)?;

    apply_env_overrides(&mut config, env);
    config.validate()?;

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    CONFIG_CANDIDATES
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.exists())
        .ok_or_else(|| {
            InfrastructureError::ConfigNotFound(format!(
                "{} (checked {:?})",
                root.display(),
                CONFIG_CANDIDATES
            ))
        })
}

fn apply_env_overrides<F: Fn(&str) -> Option<String>>(config: &mut ProjectConfig, env: F) {
    if let Some(val) = env(ENV_TARGET_PATH) {
        info!(old = ?config.target_path, new = ?val, "Overriding target path via ENV");
        config.target_path = val;
    }
    if let Some(val) = env(ENV_STORAGE_ROOT) {
        info!(old = ?config.storage.root, new = ?val, "Overriding storage root via ENV");
        config.storage.root = val;
    }
    if let Some(val) = env(ENV_SERVING_PATH) {
        info!(old = ?config.serving.path, new = ?val, "Overriding serving path via ENV");
        config.serving.path = val;
    }
}
