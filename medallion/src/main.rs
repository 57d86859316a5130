// medallion/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug medallion run ... to see stage details
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { project_dir } => commands::run::execute(project_dir).await,
        Commands::Silver { project_dir } => commands::silver::execute(project_dir).await,
        Commands::Gold { project_dir } => commands::gold::execute(project_dir).await,
        Commands::Sync { project_dir } => commands::sync::execute(project_dir).await,
        Commands::Show {
            table,
            country,
            project_dir,
        } => commands::show::execute(project_dir, table, country).await,
        Commands::Inspect {
            table,
            limit,
            project_dir,
        } => commands::inspect::execute(project_dir, table, limit).await,
        Commands::Clean { project_dir } => commands::clean::execute(project_dir),
    }
}
