//! Invoicing domain module.
//!
//! Invoices are immutable snapshots of a completed sale: client details, the
//! cart lines exactly as submitted, and the totals. No IO here.

pub mod invoice;

pub use invoice::{
    bill_number_for, issue_date_for, CartItem, Invoice, InvoiceDraft, NewInvoice, Totals,
};
