// medallion/src/commands/run.rs
//
// USE CASE: Run the whole pipeline.

use anyhow::Context;
use std::path::PathBuf;

use medallion_core::application::run_pipeline;

use super::load_project;

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let start = std::time::Instant::now();
    let (config, paths) = load_project(&project_dir)?;

    let objects = paths.object_store();
    let documents = paths.document_store().with_context(|| {
        format!(
            "Failed to open the serving store at {}",
            paths.serving_path.display()
        )
    })?;

    match run_pipeline(&objects, &documents, &config, &paths.target_dir).await {
        Ok(result) => {
            for stage in &result.stages {
                let mark = if stage.success { "✅" } else { "❌" };
                println!(
                    "  {} {:<7} {:>6} ms  ({} attempt{})",
                    mark,
                    stage.stage,
                    stage.duration_ms,
                    stage.attempts,
                    if stage.attempts == 1 { "" } else { "s" }
                );
            }
            for warning in &result.warnings {
                eprintln!("   ⚠️  {}", warning);
            }
            if result.success {
                println!("\n✨ SUCCESS! Pipeline finished in {:.2?}", start.elapsed());
            } else {
                for error in &result.errors {
                    eprintln!("   ❌ {}", error);
                }
                eprintln!("\n❌ FAILURE. {} table(s) failed to sync.", result.errors.len());
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("\n💥 CRITICAL PIPELINE ERROR: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
