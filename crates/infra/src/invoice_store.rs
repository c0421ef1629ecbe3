use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use clinic_core::{DomainError, InvoiceId};
use clinic_invoicing::{bill_number_for, Invoice, InvoiceDraft};

use crate::error::{InfraError, InfraResult};
use crate::records::InMemoryRecords;

/// Append-only invoice store. There is no update or delete.
pub trait InvoiceStore: Send + Sync {
    /// Record a draft: assigns id, `created_at` and (if absent) the bill number.
    fn create(&self, draft: InvoiceDraft) -> InfraResult<Invoice>;

    fn get(&self, id: &InvoiceId) -> InfraResult<Option<Invoice>>;

    /// All invoices, newest first.
    fn list(&self) -> InfraResult<Vec<Invoice>>;

    fn bill_number_exists(&self, bill_number: &str) -> InfraResult<bool>;
}

impl<S> InvoiceStore for Arc<S>
where
    S: InvoiceStore + ?Sized,
{
    fn create(&self, draft: InvoiceDraft) -> InfraResult<Invoice> {
        (**self).create(draft)
    }

    fn get(&self, id: &InvoiceId) -> InfraResult<Option<Invoice>> {
        (**self).get(id)
    }

    fn list(&self) -> InfraResult<Vec<Invoice>> {
        (**self).list()
    }

    fn bill_number_exists(&self, bill_number: &str) -> InfraResult<bool> {
        (**self).bill_number_exists(bill_number)
    }
}

/// In-memory invoice store (process lifetime only).
///
/// `created_at` is strictly increasing across records so newest-first
/// ordering is total.
#[derive(Debug)]
pub struct InMemoryInvoiceStore {
    records: InMemoryRecords<Invoice>,
    last_created_at: Mutex<Option<DateTime<Utc>>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self {
            records: InMemoryRecords::new("invoices"),
            last_created_at: Mutex::new(None),
        }
    }

    fn next_created_at(&self) -> InfraResult<DateTime<Utc>> {
        let mut last = self
            .last_created_at
            .lock()
            .map_err(|_| InfraError::Unavailable("invoice clock lock poisoned".to_string()))?;

        let now = Utc::now();
        let next = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(next);
        Ok(next)
    }
}

impl Default for InMemoryInvoiceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceStore for InMemoryInvoiceStore {
    fn create(&self, draft: InvoiceDraft) -> InfraResult<Invoice> {
        let mut map = self.records.write()?;
        let created_at = self.next_created_at()?;
        let taken = |bill: &str| map.values().any(|inv| inv.bill_number == bill);

        let bill_number = match &draft.bill_number {
            Some(bill) if taken(bill) => {
                return Err(DomainError::conflict(format!("bill number {bill} already exists")).into());
            }
            Some(bill) => bill.clone(),
            None => {
                let base = bill_number_for(created_at);
                let mut candidate = base.clone();
                let mut n = 2;
                while taken(&candidate) {
                    candidate = format!("{base}-{n}");
                    n += 1;
                }
                candidate
            }
        };

        let invoice = Invoice::record(InvoiceId::new(), draft, bill_number, created_at);
        map.insert(invoice.id, invoice.clone());
        drop(map);

        info!(invoice_id = %invoice.id, bill_number = %invoice.bill_number, "invoice recorded");
        Ok(invoice)
    }

    fn get(&self, id: &InvoiceId) -> InfraResult<Option<Invoice>> {
        self.records.get(id)
    }

    fn list(&self) -> InfraResult<Vec<Invoice>> {
        let mut all = self.records.all()?;
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    fn bill_number_exists(&self, bill_number: &str) -> InfraResult<bool> {
        Ok(self
            .records
            .read()?
            .values()
            .any(|inv| inv.bill_number == bill_number))
    }
}
