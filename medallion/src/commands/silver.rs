// medallion/src/commands/silver.rs
//
// USE CASE: Bronze -> Silver only.

use std::path::PathBuf;

use medallion_core::application::{RetryPolicy, run_silver, run_stage};

use super::load_project;

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let (config, paths) = load_project(&project_dir)?;
    let objects = paths.object_store();

    let policy = RetryPolicy::from(&config.orchestration);
    let (result, timing) = run_stage("silver", policy, || run_silver(&objects, &config)).await;

    match result {
        Ok(reports) => {
            for report in reports {
                println!(
                    "  ✅ {:<8} {} rows in, {} rows out -> {}",
                    report.entity.name(),
                    report.stats.input_rows,
                    report.stats.output_rows,
                    report.artifact
                );
            }
            println!("✨ Silver done in {} ms", timing.duration_ms);
        }
        Err(e) => {
            eprintln!("❌ Silver failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
