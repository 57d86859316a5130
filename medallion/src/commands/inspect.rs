// medallion/src/commands/inspect.rs
//
// USE CASE: Preview a gold artifact (schema + sample rows).

use std::path::PathBuf;

use medallion_core::application::inspect_artifact;
use medallion_core::domain::kpi::KpiTableName;

use super::load_project;

pub async fn execute(project_dir: PathBuf, table: String, limit: usize) -> anyhow::Result<()> {
    let (config, _) = load_project(&project_dir)?;
    let name: KpiTableName = table.parse()?;

    let preview = match inspect_artifact(&project_dir, &config, name, limit).await {
        Ok(preview) => preview,
        Err(e) => {
            anyhow::bail!("❌ {}\n👉 Have you run 'medallion gold'?", e);
        }
    };

    println!("\n🔍 Inspecting Artifact: '{}'", name.artifact_name());
    println!("   Columns: [{}]", preview.columns.join(", "));
    println!("   --- Rows (Limit {} of {}) ---", limit, preview.total_rows);
    println!("{}", preview.render()?);
    Ok(())
}
