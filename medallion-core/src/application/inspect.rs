// medallion-core/src/application/inspect.rs

use std::path::Path;
use tracing::instrument;

use crate::application::pipeline::ProjectPaths;
use crate::domain::kpi::KpiTableName;
use crate::domain::project::ProjectConfig;
use crate::error::MedallionError;
use crate::infrastructure::adapters::{ArtifactPreview, DataFusionInspector};
use crate::infrastructure::error::InfrastructureError;

/// Previews a gold artifact of a project stored on local disk.
#[instrument(skip(project_dir, config))]
pub async fn inspect_artifact(
    project_dir: &Path,
    config: &ProjectConfig,
    table: KpiTableName,
    limit: usize,
) -> Result<ArtifactPreview, MedallionError> {
    let paths = ProjectPaths::resolve(project_dir, config);
    let bucket = &config.storage.buckets.gold;
    let path = paths
        .storage_root
        .join(bucket)
        .join(table.artifact_name());

    if !path.is_file() {
        return Err(InfrastructureError::ObjectNotFound {
            bucket: bucket.clone(),
            key: table.artifact_name(),
        }
        .into());
    }

    Ok(DataFusionInspector::new()
        .preview(table.as_str(), &path, limit)
        .await?)
}
