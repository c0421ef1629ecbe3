use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clinic_core::money;
use clinic_core::{DomainError, DomainResult, Entity, FieldError, InvoiceId, MedicineId};
use clinic_inventory::{Medicine, StockRequest};

/// Minimum length of a client phone number.
pub const MIN_PHONE_LEN: usize = 10;

/// One cart line, frozen at the time it was added.
///
/// `medicine_name` and `rate` are copies, so later catalog changes never
/// touch recorded invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub quantity: i64,
    pub rate: Decimal,
    pub amount: Decimal,
}

impl CartItem {
    /// Snapshot the medicine's current name and price.
    ///
    /// Fails when `quantity × price` does not fit a stored amount.
    pub fn from_medicine(medicine: &Medicine, quantity: i64) -> DomainResult<Self> {
        Ok(Self {
            medicine_id: medicine.id_typed(),
            medicine_name: medicine.name().to_string(),
            quantity,
            rate: medicine.price(),
            amount: money::line_amount(quantity, medicine.price())?,
        })
    }
}

/// Invoice totals, canonical two-place decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_percentage: Decimal,
    pub tax_amount: Decimal,
    pub total_due: Decimal,
}

impl Totals {
    pub fn sum_of_lines(items: &[CartItem]) -> DomainResult<Decimal> {
        money::sum("subtotal", items.iter().map(|i| i.amount))
    }

    /// Whether the recorded subtotal equals `Σ item.amount`.
    pub fn subtotal_matches(&self, items: &[CartItem]) -> bool {
        Self::sum_of_lines(items).is_ok_and(|sum| sum == self.subtotal)
    }
}

/// Invoice submission as received from a caller.
///
/// Totals are optional: supplied values are trusted as-is, missing ones are
/// computed from the lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewInvoice {
    pub bill_number: Option<String>,
    pub issue_date: Option<String>,
    pub client_name: String,
    pub client_address: String,
    pub client_phone: String,
    pub items: Vec<CartItem>,
    pub subtotal: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub total_due: Option<Decimal>,
}

/// A validated submission with resolved totals, ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub bill_number: Option<String>,
    pub issue_date: Option<String>,
    pub client_name: String,
    pub client_address: String,
    pub client_phone: String,
    pub items: Vec<CartItem>,
    pub totals: Totals,
}

impl NewInvoice {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = Vec::new();

        if let Some(bill) = &self.bill_number {
            if bill.trim().is_empty() {
                errors.push(FieldError::new("billNumber", "bill number cannot be empty"));
            }
        }
        if let Some(date) = &self.issue_date {
            if date.trim().is_empty() {
                errors.push(FieldError::new("issueDate", "issue date cannot be empty"));
            }
        }
        if self.client_name.trim().is_empty() {
            errors.push(FieldError::new("clientName", "Client name is required"));
        }
        if self.client_address.trim().is_empty() {
            errors.push(FieldError::new("clientAddress", "Client address is required"));
        }
        if self.client_phone.trim().chars().count() < MIN_PHONE_LEN {
            errors.push(FieldError::new("clientPhone", "Valid phone number is required"));
        }
        if self.items.is_empty() {
            errors.push(FieldError::new(
                "items",
                "At least one medicine must be selected",
            ));
        }
        for (idx, item) in self.items.iter().enumerate() {
            if item.quantity < 1 {
                errors.push(FieldError::new(
                    format!("items[{idx}].quantity"),
                    "quantity must be at least 1",
                ));
            }
            if item.rate < Decimal::ZERO {
                errors.push(FieldError::new(
                    format!("items[{idx}].rate"),
                    "rate cannot be negative",
                ));
            }
            collect(&mut errors, money::check_amount(&format!("items[{idx}].rate"), item.rate));
            collect(
                &mut errors,
                money::check_amount(&format!("items[{idx}].amount"), item.amount),
            );
        }
        if let Some(pct) = self.tax_percentage {
            if pct < Decimal::ZERO {
                errors.push(FieldError::new(
                    "taxPercentage",
                    "tax percentage cannot be negative",
                ));
            }
            collect(&mut errors, money::check_percentage("taxPercentage", pct));
        }
        for (field, value) in [
            ("subtotal", self.subtotal),
            ("taxAmount", self.tax_amount),
            ("totalDue", self.total_due),
        ] {
            if let Some(v) = value {
                collect(&mut errors, money::check_amount(field, v));
            }
        }

        DomainError::check_fields(errors)
    }

    /// Validate and resolve totals. Supplied totals win over computed ones.
    ///
    /// A computed total that does not fit a stored amount is a `Validation`
    /// error on that total.
    pub fn into_draft(self, default_tax_percentage: Decimal) -> DomainResult<InvoiceDraft> {
        self.validate()?;

        let tax_percentage = money::check_percentage(
            "taxPercentage",
            self.tax_percentage.unwrap_or(default_tax_percentage),
        )?;
        let subtotal = match self.subtotal {
            Some(v) => money::check_amount("subtotal", v)?,
            None => Totals::sum_of_lines(&self.items)?,
        };
        let tax_amount = match self.tax_amount {
            Some(v) => money::check_amount("taxAmount", v)?,
            None => money::percentage_of(subtotal, tax_percentage)?,
        };
        let total_due = match self.total_due {
            Some(v) => money::check_amount("totalDue", v)?,
            None => money::sum("totalDue", [subtotal, tax_amount])?,
        };

        Ok(InvoiceDraft {
            bill_number: self.bill_number.map(|b| b.trim().to_string()),
            issue_date: self.issue_date,
            client_name: self.client_name,
            client_address: self.client_address,
            client_phone: self.client_phone,
            items: self.items,
            totals: Totals {
                subtotal,
                tax_percentage,
                tax_amount,
                total_due,
            },
        })
    }
}

fn collect(errors: &mut Vec<FieldError>, checked: DomainResult<Decimal>) {
    if let Err(DomainError::Validation(fields)) = checked {
        errors.extend(fields);
    }
}

impl InvoiceDraft {
    /// One stock request per cart line, in cart order.
    pub fn stock_requests(&self) -> Vec<StockRequest> {
        self.items
            .iter()
            .map(|i| StockRequest::new(i.medicine_id.to_string(), i.quantity))
            .collect()
    }

    /// `(medicine, quantity)` pairs to deduct, in cart order.
    pub fn deductions(&self) -> Vec<(MedicineId, i64)> {
        self.items
            .iter()
            .map(|i| (i.medicine_id, i.quantity))
            .collect()
    }
}

/// Recorded invoice. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub bill_number: String,
    pub issue_date: String,
    pub client_name: String,
    pub client_address: String,
    pub client_phone: String,
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
    pub tax_percentage: Decimal,
    pub tax_amount: Decimal,
    pub total_due: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Freeze a draft into a record. `bill_number` is decided by the caller
    /// (it must be unique across the store).
    pub fn record(
        id: InvoiceId,
        draft: InvoiceDraft,
        bill_number: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            bill_number,
            issue_date: draft
                .issue_date
                .unwrap_or_else(|| issue_date_for(created_at)),
            client_name: draft.client_name,
            client_address: draft.client_address,
            client_phone: draft.client_phone,
            items: draft.items,
            subtotal: draft.totals.subtotal,
            tax_percentage: draft.totals.tax_percentage,
            tax_amount: draft.totals.tax_amount,
            total_due: draft.totals.total_due,
            created_at,
        }
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Human-facing bill number derived from the creation instant: `INV-<epoch millis>`.
pub fn bill_number_for(created_at: DateTime<Utc>) -> String {
    format!("INV-{}", created_at.timestamp_millis())
}

/// Issue date as printed on bills (`DD/MM/YYYY`).
pub fn issue_date_for(created_at: DateTime<Utc>) -> String {
    created_at.format("%d/%m/%Y").to_string()
}
