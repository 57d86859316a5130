// medallion/src/commands/mod.rs

pub mod clean;
pub mod gold;
pub mod inspect;
pub mod run;
pub mod show;
pub mod silver;
pub mod sync;

use anyhow::Context;
use std::path::Path;

use medallion_core::application::ProjectPaths;
use medallion_core::domain::project::ProjectConfig;
use medallion_core::infrastructure::config::load_project_config;

/// Loads the manifest and resolves where the project keeps its data.
pub fn load_project(project_dir: &Path) -> anyhow::Result<(ProjectConfig, ProjectPaths)> {
    println!("⚙️  Loading configuration...");
    let config = load_project_config(project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    println!("   Project: {} (v{})", config.name, config.version);
    let paths = ProjectPaths::resolve(project_dir, &config);
    Ok((config, paths))
}
