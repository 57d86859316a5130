// medallion-core/src/infrastructure/codec/csv.rs

use std::io::Cursor;
use std::sync::Arc;

use datafusion::arrow::array::{Array, StringArray};
use datafusion::arrow::csv::ReaderBuilder;
use datafusion::arrow::csv::reader::Format;
use datafusion::arrow::datatypes::{DataType, Field, Schema};

use crate::domain::table::RawTable;
use crate::infrastructure::error::InfrastructureError;

/// Parses a raw CSV export. The first line is the header; every column is
/// kept as text so the cleaning rules decide what each value means.
pub fn read_raw_table(data: &[u8]) -> Result<RawTable, InfrastructureError> {
    let format = Format::default().with_header(true);
    let (inferred, _) = format.infer_schema(Cursor::new(data), Some(0))?;

    let columns: Vec<String> = inferred
        .fields()
        .iter()
        .map(|f| f.name().trim().to_string())
        .collect();
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    let mut table = RawTable::new(columns);
    if schema.fields().is_empty() {
        return Ok(table);
    }

    let reader = ReaderBuilder::new(schema)
        .with_format(format)
        .build(Cursor::new(data))?;

    for batch in reader {
        let batch = batch?;
        let arrays: Vec<&StringArray> = (0..batch.num_columns())
            .map(|i| {
                batch
                    .column(i)
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| InfrastructureError::Codec("non-text CSV column".to_string()))
            })
            .collect::<Result<_, _>>()?;

        for row in 0..batch.num_rows() {
            table.push_row(
                arrays
                    .iter()
                    .map(|a| (!a.is_null(row)).then(|| a.value(row).to_string()))
                    .collect(),
            );
        }
    }

    Ok(table)
}
