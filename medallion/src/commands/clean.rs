// medallion/src/commands/clean.rs
//
// USE CASE: Clean build artifacts.

use std::path::PathBuf;

use medallion_core::application::clean_project;

use super::load_project;

pub fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let (config, _) = load_project(&project_dir)?;
    match clean_project(&project_dir, &config) {
        Ok(removed) if removed.is_empty() => println!("   Nothing to clean."),
        Ok(removed) => {
            for target in removed {
                println!("   🗑️  Artifact removed: {}", target);
            }
        }
        Err(e) => {
            eprintln!("❌ Clean failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
