// medallion/src/commands/gold.rs
//
// USE CASE: Silver -> Gold only.

use std::path::PathBuf;

use medallion_core::application::{RetryPolicy, gold_transformation, run_stage};

use super::load_project;

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let (config, paths) = load_project(&project_dir)?;
    let objects = paths.object_store();

    let policy = RetryPolicy::from(&config.orchestration);
    let (result, timing) =
        run_stage("gold", policy, || gold_transformation(&objects, &config)).await;

    match result {
        Ok(artifacts) => {
            for artifact in artifacts {
                println!("  ✅ {:<32} {} rows", artifact.artifact, artifact.rows);
            }
            println!("✨ Gold done in {} ms", timing.duration_ms);
        }
        Err(e) => {
            eprintln!("❌ Gold failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
