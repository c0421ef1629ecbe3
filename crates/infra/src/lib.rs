//! Infrastructure layer: in-memory stores and the workflows that span them.
//!
//! State lives in explicit store objects built once at startup and shared
//! through `Arc`; nothing here is global.

pub mod error;
pub mod invoice_store;
pub mod invoice_workflow;
pub mod medicine_store;
pub mod records;
pub mod seed;
pub mod stock_validation;

pub use error::{InfraError, InfraResult};
pub use invoice_store::{InMemoryInvoiceStore, InvoiceStore};
pub use invoice_workflow::{InvoiceWorkflow, WorkflowPhase};
pub use medicine_store::{InMemoryMedicineStore, MedicineStore};
pub use stock_validation::validate_stock;
