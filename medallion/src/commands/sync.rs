// medallion/src/commands/sync.rs
//
// USE CASE: Gold -> serving store only.

use anyhow::Context;
use std::path::PathBuf;

use medallion_core::application::run_sync_stage;

use super::load_project;

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let (config, paths) = load_project(&project_dir)?;
    let objects = paths.object_store();
    let documents = paths
        .document_store()
        .context("Failed to open the serving store")?;

    let (outcomes, timing) = run_sync_stage(&objects, &documents, &config).await;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.error {
            None => println!("  ✅ {:<32} {} documents", outcome.table, outcome.inserted),
            Some(reason) => {
                failed += 1;
                eprintln!(
                    "  ❌ {:<32} failed while {}: {}",
                    outcome.table, outcome.phase, reason
                );
            }
        }
        if let Some(reason) = &outcome.metadata_error {
            eprintln!("  ⚠️  {:<32} metadata not updated: {}", outcome.table, reason);
        }
    }

    if failed > 0 {
        eprintln!(
            "❌ {} of {} table(s) failed to sync after {} attempt(s).",
            failed,
            outcomes.len(),
            timing.attempts
        );
        std::process::exit(1);
    }
    println!("✨ Sync done in {} ms", timing.duration_ms);
    Ok(())
}
