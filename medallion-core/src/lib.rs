// medallion-core/src/lib.rs

// 1. Documentation
#![allow(missing_docs)]
// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Object storage (raw / silver / gold buckets) and the serving document store.
pub mod ports;

// 2. Domain
// Records, cleaning rules, periods, join, KPI aggregation and growth.
// Depends on nothing but itself.
pub mod domain;

// 3. Infrastructure (Adapters)
// CSV / Parquet codecs, filesystem, in-memory and DuckDB stores, config files.
pub mod infrastructure;

// 4. Application (Use Cases)
// Silver, Gold and Sync stages, stage runner, whole-run pipeline, serving queries.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::MedallionError;
