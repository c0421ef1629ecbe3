//! Stock-aware invoice creation.
//!
//! ```text
//! NewInvoice
//!   ↓
//! Validating   input fields, bill number uniqueness, stock for every line
//!   ↓
//! Deducting    all lines at once under the medicine store's write lock
//!   ↓
//! Persisting   record the invoice (restock on failure)
//!   ↓
//! Done
//! ```
//!
//! A rejection in Validating or Deducting leaves stock untouched. A failure
//! in Persisting returns the deducted quantities before reporting the error.

use core::fmt;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use clinic_core::DomainError;
use clinic_invoicing::{Invoice, NewInvoice};

use crate::error::InfraResult;
use crate::invoice_store::InvoiceStore;
use crate::medicine_store::MedicineStore;
use crate::stock_validation::validate_stock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Validating,
    Deducting,
    Persisting,
    Done,
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowPhase::Validating => "validating",
            WorkflowPhase::Deducting => "deducting",
            WorkflowPhase::Persisting => "persisting",
            WorkflowPhase::Done => "done",
        };
        f.write_str(s)
    }
}

/// Composes the medicine and invoice stores into the invoice creation flow.
#[derive(Debug)]
pub struct InvoiceWorkflow<M, I> {
    medicines: M,
    invoices: I,
    default_tax_percentage: Decimal,
}

impl<M, I> InvoiceWorkflow<M, I> {
    pub fn new(medicines: M, invoices: I, default_tax_percentage: Decimal) -> Self {
        Self {
            medicines,
            invoices,
            default_tax_percentage,
        }
    }
}

impl<M, I> InvoiceWorkflow<M, I>
where
    M: MedicineStore,
    I: InvoiceStore,
{
    /// Validate, deduct and persist one invoice.
    ///
    /// Errors:
    /// - `Validation` for bad input (nothing touched)
    /// - `Conflict` for a bill number already in use (nothing touched)
    /// - `InsufficientStock` listing every line that cannot be served (nothing touched)
    /// - `Unavailable` when a store fails; deducted stock is returned first
    pub fn create_invoice(&self, submission: NewInvoice) -> InfraResult<Invoice> {
        let mut phase = WorkflowPhase::Validating;
        debug!(%phase, "invoice workflow");

        let draft = submission.into_draft(self.default_tax_percentage)?;
        if !draft.totals.subtotal_matches(&draft.items) {
            warn!(
                subtotal = %draft.totals.subtotal,
                "supplied subtotal differs from the sum of line amounts"
            );
        }

        if let Some(bill) = &draft.bill_number {
            if self.invoices.bill_number_exists(bill)? {
                return Err(DomainError::conflict(format!("bill number {bill} already exists")).into());
            }
        }

        let report = validate_stock(&self.medicines, &draft.stock_requests())?;
        if !report.valid {
            let shortfalls = report.shortfalls();
            info!(lines = shortfalls.len(), "invoice rejected: insufficient stock");
            return Err(DomainError::InsufficientStock(shortfalls).into());
        }

        phase = WorkflowPhase::Deducting;
        debug!(%phase, "invoice workflow");

        let deductions = draft.deductions();
        if let Err(e) = self.medicines.deduct_all(&deductions) {
            // Stock moved between the check and the lock; nothing was deducted.
            info!(error = %e, "invoice rejected during deduction");
            return Err(e);
        }

        phase = WorkflowPhase::Persisting;
        debug!(%phase, "invoice workflow");

        let invoice = match self.invoices.create(draft) {
            Ok(invoice) => invoice,
            Err(e) => {
                error!(error = %e, "persisting invoice failed; restocking");
                if let Err(restock) = self.medicines.restock_all(&deductions) {
                    error!(error = %restock, "restock after failed persist also failed");
                }
                return Err(e);
            }
        };

        phase = WorkflowPhase::Done;
        debug!(%phase, invoice_id = %invoice.id, "invoice workflow");
        Ok(invoice)
    }
}
