// medallion-core/src/infrastructure/codec/kpi.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use datafusion::arrow::array::{
    Array, ArrayRef, Date32Array, Float64Array, Int64Array, StringArray,
};
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::arrow::record_batch::RecordBatch;

use super::{column, read_parquet, write_parquet};
use crate::domain::kpi::{ColumnKind, KpiColumn, KpiTable, KpiTableName, KpiValue};
use crate::domain::period::{Granularity, Period};
use crate::infrastructure::error::InfrastructureError;

/// Field metadata key naming the granularity of a `Date32` period column.
pub const PERIOD_METADATA_KEY: &str = "medallion.period";

pub fn encode_kpi_table(table: &KpiTable) -> Result<Vec<u8>, InfrastructureError> {
    let mut fields = Vec::with_capacity(table.columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns.len());

    for (idx, col) in table.columns.iter().enumerate() {
        let values = table.rows.iter().map(|row| row.get(idx));
        match col.kind {
            ColumnKind::Period(granularity) => {
                let days = values
                    .map(|v| match v {
                        Some(KpiValue::Period(p)) => period_to_days(p),
                        other => Err(mismatch(&col.name, other)),
                    })
                    .collect::<Result<Vec<i32>, _>>()?;
                fields.push(
                    Field::new(&col.name, DataType::Date32, false).with_metadata(HashMap::from(
                        [(
                            PERIOD_METADATA_KEY.to_string(),
                            granularity.as_str().to_string(),
                        )],
                    )),
                );
                arrays.push(Arc::new(Date32Array::from(days)));
            }
            ColumnKind::Integer => {
                let ints = values
                    .map(|v| match v {
                        Some(KpiValue::Integer(i)) => Ok(*i),
                        other => Err(mismatch(&col.name, other)),
                    })
                    .collect::<Result<Vec<i64>, _>>()?;
                fields.push(Field::new(&col.name, DataType::Int64, false));
                arrays.push(Arc::new(Int64Array::from(ints)));
            }
            ColumnKind::Float => {
                let floats = values
                    .map(|v| match v {
                        Some(KpiValue::Float(f)) => Ok(*f),
                        other => Err(mismatch(&col.name, other)),
                    })
                    .collect::<Result<Vec<Option<f64>>, _>>()?;
                fields.push(Field::new(&col.name, DataType::Float64, true));
                arrays.push(Arc::new(Float64Array::from(floats)));
            }
            ColumnKind::Text => {
                let texts = values
                    .map(|v| match v {
                        Some(KpiValue::Text(t)) => Ok(t.clone()),
                        other => Err(mismatch(&col.name, other)),
                    })
                    .collect::<Result<Vec<Option<String>>, _>>()?;
                fields.push(Field::new(&col.name, DataType::Utf8, true));
                arrays.push(Arc::new(StringArray::from(texts)));
            }
        }
    }

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
    write_parquet(&batch)
}

/// Reads a gold artifact back into its typed form.
pub fn decode_kpi_table(
    name: KpiTableName,
    data: &[u8],
) -> Result<KpiTable, InfrastructureError> {
    let (schema, batches) = read_parquet(data)?;

    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            let kind = match field.data_type() {
                DataType::Date32 => {
                    let granularity = field
                        .metadata()
                        .get(PERIOD_METADATA_KEY)
                        .ok_or_else(|| {
                            InfrastructureError::Codec(format!(
                                "date column '{}' carries no period granularity",
                                field.name()
                            ))
                        })?
                        .parse::<Granularity>()
                        .map_err(|e| InfrastructureError::Codec(e.to_string()))?;
                    ColumnKind::Period(granularity)
                }
                DataType::Int64 => ColumnKind::Integer,
                DataType::Float64 => ColumnKind::Float,
                DataType::Utf8 => ColumnKind::Text,
                other => {
                    return Err(InfrastructureError::Codec(format!(
                        "unsupported KPI column type {} for '{}'",
                        other,
                        field.name()
                    )));
                }
            };
            Ok(KpiColumn::new(field.name().clone(), kind))
        })
        .collect::<Result<Vec<_>, InfrastructureError>>()?;

    let mut table = KpiTable::new(name, columns);
    for batch in &batches {
        let mut decoded: Vec<Vec<KpiValue>> = vec![Vec::with_capacity(table.columns.len()); batch.num_rows()];
        for col in &table.columns {
            match col.kind {
                ColumnKind::Period(granularity) => {
                    let array = column::<Date32Array>(batch, &col.name)?;
                    for (i, row) in decoded.iter_mut().enumerate() {
                        let date = days_to_date(array.value(i))?;
                        row.push(KpiValue::Period(Period::of(date, granularity)));
                    }
                }
                ColumnKind::Integer => {
                    let array = column::<Int64Array>(batch, &col.name)?;
                    for (i, row) in decoded.iter_mut().enumerate() {
                        row.push(KpiValue::Integer(array.value(i)));
                    }
                }
                ColumnKind::Float => {
                    let array = column::<Float64Array>(batch, &col.name)?;
                    for (i, row) in decoded.iter_mut().enumerate() {
                        row.push(KpiValue::Float(
                            (!array.is_null(i)).then(|| array.value(i)),
                        ));
                    }
                }
                ColumnKind::Text => {
                    let array = column::<StringArray>(batch, &col.name)?;
                    for (i, row) in decoded.iter_mut().enumerate() {
                        row.push(KpiValue::Text(
                            (!array.is_null(i)).then(|| array.value(i).to_string()),
                        ));
                    }
                }
            }
        }
        table.rows.extend(decoded);
    }

    Ok(table)
}

fn period_to_days(period: &Period) -> Result<i32, InfrastructureError> {
    let start = period
        .start_date()
        .ok_or_else(|| InfrastructureError::Codec(format!("period {} has no start date", period)))?;
    i32::try_from(start.signed_duration_since(NaiveDate::default()).num_days())
        .map_err(|_| InfrastructureError::Codec(format!("period {} out of range", period)))
}

fn days_to_date(days: i32) -> Result<NaiveDate, InfrastructureError> {
    NaiveDate::default()
        .checked_add_signed(Duration::days(i64::from(days)))
        .ok_or_else(|| InfrastructureError::Codec(format!("date32 value {} out of range", days)))
}

fn mismatch(column: &str, value: Option<&KpiValue>) -> InfrastructureError {
    InfrastructureError::Codec(format!(
        "column '{}' holds unexpected value {:?}",
        column, value
    ))
}
