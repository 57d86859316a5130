// medallion-core/src/infrastructure/codec/mod.rs

// Byte-level encodings for layer artifacts: CSV for raw exports, Parquet for
// silver and gold.

pub mod csv;
pub mod kpi;
pub mod silver;

use bytes::Bytes;
use datafusion::arrow::array::Array;
use datafusion::arrow::datatypes::SchemaRef;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::parquet::arrow::ArrowWriter;
use datafusion::parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::infrastructure::error::InfrastructureError;

pub use csv::read_raw_table;
pub use kpi::{decode_kpi_table, encode_kpi_table};
pub use silver::{decode_customers, decode_purchases, encode_customers, encode_purchases};

/// Encodes one batch as a standalone Parquet file. Empty batches still
/// produce a readable file carrying the schema.
pub(crate) fn write_parquet(batch: &RecordBatch) -> Result<Vec<u8>, InfrastructureError> {
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), None)?;
    if batch.num_rows() > 0 {
        writer.write(batch)?;
    }
    writer.close()?;
    Ok(buffer)
}

pub(crate) fn read_parquet(
    data: &[u8],
) -> Result<(SchemaRef, Vec<RecordBatch>), InfrastructureError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(data))?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok((schema, batches))
}

/// Typed view of a named column.
pub(crate) fn column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a T, InfrastructureError> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| InfrastructureError::Codec(format!("missing column '{}'", name)))?;
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| {
            InfrastructureError::Codec(format!(
                "column '{}' has unexpected type {}",
                name,
                batch.column(idx).data_type()
            ))
        })
}
