// medallion-core/src/infrastructure/codec/silver.rs

use std::sync::Arc;

use chrono::NaiveDate;
use datafusion::arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;

use super::{column, read_parquet, write_parquet};
use crate::domain::records::columns::*;
use crate::domain::records::{Customer, Purchase};
use crate::infrastructure::error::InfrastructureError;

pub fn customers_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ID_CLIENT, DataType::Int64, false),
        Field::new(NOM, DataType::Utf8, false),
        Field::new(EMAIL, DataType::Utf8, false),
        Field::new(DATE_INSCRIPTION, DataType::Utf8, true),
        Field::new(PAYS, DataType::Utf8, false),
    ]))
}

pub fn purchases_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ID_ACHAT, DataType::Int64, false),
        Field::new(ID_CLIENT, DataType::Int64, true),
        Field::new(DATE_ACHAT, DataType::Utf8, true),
        Field::new(MONTANT, DataType::Float64, true),
        Field::new(PRODUIT, DataType::Utf8, false),
    ]))
}

pub fn encode_customers(customers: &[Customer]) -> Result<Vec<u8>, InfrastructureError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(customers.iter().map(|c| c.id))),
        Arc::new(StringArray::from_iter_values(
            customers.iter().map(|c| c.name.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            customers.iter().map(|c| c.email.as_str()),
        )),
        Arc::new(StringArray::from(
            customers
                .iter()
                .map(|c| c.registration_date.map(iso))
                .collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from_iter_values(
            customers.iter().map(|c| c.country.as_str()),
        )),
    ];
    write_parquet(&RecordBatch::try_new(customers_schema(), columns)?)
}

pub fn encode_purchases(purchases: &[Purchase]) -> Result<Vec<u8>, InfrastructureError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(purchases.iter().map(|p| p.id))),
        Arc::new(Int64Array::from(
            purchases.iter().map(|p| p.customer_id).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            purchases
                .iter()
                .map(|p| p.purchase_date.map(iso))
                .collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            purchases.iter().map(|p| p.amount).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from_iter_values(
            purchases.iter().map(|p| p.product.as_str()),
        )),
    ];
    write_parquet(&RecordBatch::try_new(purchases_schema(), columns)?)
}

pub fn decode_customers(data: &[u8]) -> Result<Vec<Customer>, InfrastructureError> {
    let (_, batches) = read_parquet(data)?;
    let mut customers = Vec::new();
    for batch in &batches {
        let ids = column::<Int64Array>(batch, ID_CLIENT)?;
        let names = column::<StringArray>(batch, NOM)?;
        let emails = column::<StringArray>(batch, EMAIL)?;
        let dates = column::<StringArray>(batch, DATE_INSCRIPTION)?;
        let countries = column::<StringArray>(batch, PAYS)?;

        for i in 0..batch.num_rows() {
            customers.push(Customer {
                id: ids.value(i),
                name: text(names, i),
                email: text(emails, i),
                registration_date: date(dates, i)?,
                country: text(countries, i),
            });
        }
    }
    Ok(customers)
}

pub fn decode_purchases(data: &[u8]) -> Result<Vec<Purchase>, InfrastructureError> {
    let (_, batches) = read_parquet(data)?;
    let mut purchases = Vec::new();
    for batch in &batches {
        let ids = column::<Int64Array>(batch, ID_ACHAT)?;
        let customer_ids = column::<Int64Array>(batch, ID_CLIENT)?;
        let dates = column::<StringArray>(batch, DATE_ACHAT)?;
        let amounts = column::<Float64Array>(batch, MONTANT)?;
        let products = column::<StringArray>(batch, PRODUIT)?;

        for i in 0..batch.num_rows() {
            purchases.push(Purchase {
                id: ids.value(i),
                customer_id: (!customer_ids.is_null(i)).then(|| customer_ids.value(i)),
                purchase_date: date(dates, i)?,
                amount: (!amounts.is_null(i)).then(|| amounts.value(i)),
                product: text(products, i),
            });
        }
    }
    Ok(purchases)
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn text(array: &StringArray, i: usize) -> String {
    if array.is_null(i) {
        String::new()
    } else {
        array.value(i).to_string()
    }
}

fn date(array: &StringArray, i: usize) -> Result<Option<NaiveDate>, InfrastructureError> {
    if array.is_null(i) {
        return Ok(None);
    }
    NaiveDate::parse_from_str(array.value(i), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| {
            InfrastructureError::Codec(format!("bad ISO date '{}': {}", array.value(i), e))
        })
}
