// medallion/src/commands/show.rs
//
// USE CASE: Read a KPI table back from the serving store.

use anyhow::{Context, bail};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use serde_json::Value;
use std::path::PathBuf;

use medallion_core::application::ServingQueries;
use medallion_core::domain::kpi::KpiTableName;
use medallion_core::ports::document_store::{Document, ID_FIELD};

use super::load_project;

pub async fn execute(
    project_dir: PathBuf,
    table: String,
    country: Option<String>,
) -> anyhow::Result<()> {
    let (_, paths) = load_project(&project_dir)?;
    let documents = paths
        .document_store()
        .context("Failed to open the serving store")?;
    let queries = ServingQueries::new(&documents);

    let rows = match country {
        Some(country) => {
            if table.parse::<KpiTableName>().ok() != Some(KpiTableName::CaByYearCountry) {
                bail!("--country is only supported for ca_by_year_country");
            }
            queries.ca_by_year_country_for(&country).await?
        }
        None => queries.list(&table).await?,
    };

    if rows.is_empty() {
        println!("no data");
        return Ok(());
    }

    let columns: Vec<String> = match queries.metadata(&table).await? {
        Some(meta) => meta
            .get("columns")
            .and_then(Value::as_array)
            .map(|cols| {
                cols.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .chain(std::iter::once("last_updated".to_string()))
                    .collect()
            })
            .unwrap_or_else(|| document_columns(&rows[0])),
        None => document_columns(&rows[0]),
    };

    let mut out = Table::new();
    out.load_preset(UTF8_FULL).set_header(columns.clone());
    for row in &rows {
        out.add_row(columns.iter().map(|c| cell(row.get(c))).collect::<Vec<_>>());
    }
    println!("{}", out);
    println!("{} row(s)", rows.len());
    Ok(())
}

fn document_columns(doc: &Document) -> Vec<String> {
    doc.keys().filter(|k| *k != ID_FIELD).cloned().collect()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
