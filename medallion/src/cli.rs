// medallion/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medallion")]
#[command(about = "Bronze -> Silver -> Gold KPI pipeline with a serving store", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs the whole pipeline (Silver -> Gold -> Sync)
    Run {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🧽 Cleans the bronze exports into silver Parquet
    Silver {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🏅 Computes the configured KPI tables into the gold bucket
    Gold {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🔄 Replaces the serving collections with the gold artifacts
    Sync {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 📊 Shows a KPI table from the serving store
    Show {
        /// KPI table name (ex: "ca_by_year_country")
        #[arg(long, short)]
        table: String,

        /// Only rows of this country (ca_by_year_country only)
        #[arg(long)]
        country: Option<String>,

        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🔍 Previews a gold Parquet artifact
    Inspect {
        /// KPI table name
        #[arg(long, short)]
        table: String,

        /// Number of sample rows to display
        #[arg(long, default_value = "5")]
        limit: usize,

        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🧹 Cleans build artifacts (target/ folder)
    Clean {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}
