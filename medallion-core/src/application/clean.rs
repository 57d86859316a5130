// medallion-core/src/application/clean.rs

use std::fs;
use std::path::{Component, Path};
use tracing::info;

use crate::domain::project::ProjectConfig;
use crate::error::MedallionError;

/// Removes the configured clean targets. Returns the targets that existed.
pub fn clean_project(
    project_dir: &Path,
    config: &ProjectConfig,
) -> Result<Vec<String>, MedallionError> {
    info!("Cleaning project artifacts");

    let targets = if config.clean_targets.is_empty() {
        vec![config.target_path.clone()]
    } else {
        config.clean_targets.clone()
    };

    // Validate everything before deleting anything. A target must name
    // something strictly below the project directory.
    for target in &targets {
        let components: Vec<Component<'_>> = Path::new(target).components().collect();
        let inside = components
            .iter()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
            && components.iter().any(|c| matches!(c, Component::Normal(_)));
        if !inside {
            return Err(MedallionError::UnsafePath(target.clone()));
        }
    }

    let mut removed = Vec::new();
    for target in targets {
        let full_path = project_dir.join(&target);
        if full_path.is_dir() {
            fs::remove_dir_all(&full_path)?;
        } else if full_path.exists() {
            fs::remove_file(&full_path)?;
        } else {
            continue;
        }
        info!(target = %target, "Artifact removed");
        removed.push(target);
    }

    Ok(removed)
}
