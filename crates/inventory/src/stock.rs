//! Read-side stock checks for a prospective cart.
//!
//! Pure evaluation only: the caller supplies the medicine it looked up (or
//! `None`), nothing is reserved.

use serde::Serialize;

use clinic_core::StockShortfall;

use crate::medicine::Medicine;

/// Name reported for a line whose medicine does not exist.
pub const UNKNOWN_MEDICINE: &str = "Unknown";

/// One `(medicineId, quantity)` pair to check. The id is kept as received so
/// unparseable ids can be echoed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRequest {
    pub medicine_id: String,
    pub quantity: i64,
}

impl StockRequest {
    pub fn new(medicine_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            medicine_id: medicine_id.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLineReport {
    pub medicine_id: String,
    pub medicine_name: String,
    pub requested_quantity: i64,
    pub available_stock: i64,
    pub is_valid: bool,
}

impl StockLineReport {
    pub fn evaluate(request: &StockRequest, medicine: Option<&Medicine>) -> Self {
        match medicine {
            Some(m) => Self {
                medicine_id: request.medicine_id.clone(),
                medicine_name: m.name().to_string(),
                requested_quantity: request.quantity,
                available_stock: m.stock_quantity(),
                is_valid: m.can_supply(request.quantity),
            },
            None => Self {
                medicine_id: request.medicine_id.clone(),
                medicine_name: UNKNOWN_MEDICINE.to_string(),
                requested_quantity: request.quantity,
                available_stock: 0,
                is_valid: false,
            },
        }
    }

    pub fn to_shortfall(&self) -> StockShortfall {
        StockShortfall {
            medicine_id: self.medicine_id.clone(),
            medicine_name: self.medicine_name.clone(),
            requested_quantity: self.requested_quantity,
            available_stock: self.available_stock,
        }
    }
}

/// Aggregate result: `valid` iff every line is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockReport {
    pub valid: bool,
    pub details: Vec<StockLineReport>,
}

impl StockReport {
    pub fn from_lines(details: Vec<StockLineReport>) -> Self {
        let valid = details.iter().all(|l| l.is_valid);
        Self { valid, details }
    }

    /// The failing lines, in request order.
    pub fn shortfalls(&self) -> Vec<StockShortfall> {
        self.details
            .iter()
            .filter(|l| !l.is_valid)
            .map(StockLineReport::to_shortfall)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medicine::NewMedicine;
    use clinic_core::MedicineId;
    use rust_decimal::Decimal;

    fn medicine(name: &str, stock: i64) -> Medicine {
        Medicine::create(
            MedicineId::new(),
            NewMedicine {
                name: name.to_string(),
                description: None,
                price: Decimal::new(1000, 2),
                stock_quantity: Some(stock),
            },
        )
        .unwrap()
    }

    #[test]
    fn missing_medicine_reports_unknown_with_zero_stock() {
        let req = StockRequest::new("nope", 1);
        let line = StockLineReport::evaluate(&req, None);

        assert_eq!(line.medicine_name, UNKNOWN_MEDICINE);
        assert_eq!(line.available_stock, 0);
        assert!(!line.is_valid);
    }

    #[test]
    fn report_is_valid_only_when_every_line_is() {
        let a = medicine("Amoxicillin", 5);
        let b = medicine("Ibuprofen", 2);

        let lines = vec![
            StockLineReport::evaluate(&StockRequest::new(a.id_typed().to_string(), 5), Some(&a)),
            StockLineReport::evaluate(&StockRequest::new(b.id_typed().to_string(), 3), Some(&b)),
        ];
        let report = StockReport::from_lines(lines);

        assert!(!report.valid);
        assert!(report.details[0].is_valid);
        assert!(!report.details[1].is_valid);

        let shortfalls = report.shortfalls();
        assert_eq!(shortfalls.len(), 1);
        assert_eq!(shortfalls[0].medicine_name, "Ibuprofen");
        assert_eq!(shortfalls[0].requested_quantity, 3);
        assert_eq!(shortfalls[0].available_stock, 2);
    }

    #[test]
    fn empty_request_is_valid() {
        let report = StockReport::from_lines(vec![]);
        assert!(report.valid);
        assert!(report.shortfalls().is_empty());
    }

    #[test]
    fn line_serializes_with_client_field_names() {
        let line = StockLineReport::evaluate(&StockRequest::new("x", 2), None);
        let v = serde_json::to_value(&line).unwrap();
        assert_eq!(v["isValid"], false);
        assert_eq!(v["requestedQuantity"], 2);
        assert_eq!(v["medicineId"], "x");
    }
}
