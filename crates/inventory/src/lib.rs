//! Inventory domain module: the medicine catalog and its stock rules.
//!
//! This crate contains business rules for inventory, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod medicine;
pub mod stock;

pub use medicine::{Medicine, MedicineUpdate, NewMedicine, MAX_STOCK_QUANTITY};
pub use stock::{StockLineReport, StockReport, StockRequest, UNKNOWN_MEDICINE};
