// medallion-core/src/infrastructure/adapters/datafusion.rs

use datafusion::arrow::record_batch::RecordBatch;
use datafusion::arrow::util::pretty::pretty_format_batches;
use datafusion::prelude::*;
use std::path::Path;

use crate::infrastructure::error::InfrastructureError;

/// A bounded look at one Parquet artifact.
#[derive(Debug, Clone)]
pub struct ArtifactPreview {
    pub total_rows: usize,
    pub columns: Vec<String>,
    pub batches: Vec<RecordBatch>,
}

impl ArtifactPreview {
    /// The preview rows as an ASCII table.
    pub fn render(&self) -> Result<String, InfrastructureError> {
        Ok(pretty_format_batches(&self.batches)?.to_string())
    }
}

/// Ad-hoc SQL over artifacts on local disk.
pub struct DataFusionInspector {
    ctx: SessionContext,
}

impl Default for DataFusionInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFusionInspector {
    pub fn new() -> Self {
        Self {
            ctx: SessionContext::new(),
        }
    }

    /// Registers `path` as `name` and reads its first `limit` rows.
    pub async fn preview(
        &self,
        name: &str,
        path: &Path,
        limit: usize,
    ) -> Result<ArtifactPreview, InfrastructureError> {
        let path_str = path.to_str().ok_or_else(|| {
            InfrastructureError::InvalidKey(format!("non UTF-8 path {:?}", path))
        })?;
        self.ctx
            .register_parquet(name, path_str, ParquetReadOptions::default())
            .await?;

        let df = self.ctx.table(name).await?;
        let columns = df
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        let total_rows = df.clone().count().await?;
        let batches = self
            .ctx
            .sql(&format!("SELECT * FROM \"{}\" LIMIT {}", name, limit))
            .await?
            .collect()
            .await?;

        Ok(ArtifactPreview {
            total_rows,
            columns,
            batches,
        })
    }
}
