pub mod aggregation;
pub mod cleaning;
pub mod error;
pub mod growth;
pub mod join;
pub mod kpi;
pub mod period;
pub mod project;
pub mod records;
pub mod table;

// Re-exports to keep imports short elsewhere
pub use error::DomainError;
pub use kpi::{KpiTable, KpiTableName};
pub use period::{Granularity, Period};
pub use records::{Customer, Entity, JoinedPurchase, Purchase};
pub use table::RawTable;
