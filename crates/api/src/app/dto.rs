use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use clinic_core::{money, DomainError, FieldError, MedicineId};
use clinic_inventory::{MedicineUpdate, NewMedicine, StockRequest};
use clinic_invoicing::{CartItem, NewInvoice};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicineRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BulkCreateMedicinesRequest {
    pub medicines: Vec<CreateMedicineRequest>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedicineRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i64>,
}

/// `delta` stays untyped so a non-numeric value gets a precise 400.
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    #[serde(default)]
    pub delta: JsonValue,
}

/// `items` stays untyped so a non-array gets a precise 400.
#[derive(Debug, Deserialize)]
pub struct ValidateStockRequest {
    #[serde(default)]
    pub items: JsonValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub medicine_id: String,
    pub medicine_name: String,
    pub quantity: i64,
    pub rate: Decimal,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub bill_number: Option<String>,
    pub issue_date: Option<String>,
    pub client_name: Option<String>,
    pub client_address: Option<String>,
    pub client_phone: Option<String>,
    #[serde(default)]
    pub items: Vec<CartItemRequest>,
    pub subtotal: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub total_due: Option<Decimal>,
}

// -------------------------
// Request -> domain mapping
// -------------------------

impl CreateMedicineRequest {
    /// Required fields are checked here; value rules are enforced by the domain.
    pub fn into_new_medicine(self) -> Result<NewMedicine, Vec<FieldError>> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push(FieldError::new("name", "name is required"));
        }
        if self.price.is_none() {
            missing.push(FieldError::new("price", "price is required"));
        }

        match (self.name, self.price) {
            (Some(name), Some(price)) => Ok(NewMedicine {
                name,
                description: self.description,
                price,
                stock_quantity: self.stock_quantity,
            }),
            _ => Err(missing),
        }
    }
}

impl BulkCreateMedicinesRequest {
    pub fn into_new_medicines(self) -> Result<Vec<NewMedicine>, DomainError> {
        let mut errors = Vec::new();
        let mut batch = Vec::with_capacity(self.medicines.len());

        for (idx, entry) in self.medicines.into_iter().enumerate() {
            match entry.into_new_medicine() {
                Ok(m) => batch.push(m),
                Err(fields) => errors.extend(fields.into_iter().map(|f| {
                    FieldError::new(format!("medicines[{idx}].{}", f.field), f.message)
                })),
            }
        }

        DomainError::check_fields(errors)?;
        Ok(batch)
    }
}

impl From<UpdateMedicineRequest> for MedicineUpdate {
    fn from(body: UpdateMedicineRequest) -> Self {
        MedicineUpdate {
            name: body.name,
            description: body.description,
            price: body.price,
            stock_quantity: body.stock_quantity,
        }
    }
}

impl AdjustStockRequest {
    /// Integer JSON numbers and integer strings are accepted.
    pub fn delta(&self) -> Result<i64, DomainError> {
        let parsed = match &self.delta {
            JsonValue::Number(n) => n.as_i64(),
            JsonValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| DomainError::validation("delta", "delta must be an integer"))
    }
}

impl ValidateStockRequest {
    pub fn stock_requests(&self) -> Result<Vec<StockRequest>, DomainError> {
        let JsonValue::Array(items) = &self.items else {
            return Err(DomainError::validation("items", "items must be an array"));
        };

        let mut errors = Vec::new();
        let mut requests = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let id = item.get("medicineId").and_then(JsonValue::as_str);
            let qty = item.get("quantity").and_then(JsonValue::as_i64);

            if id.is_none() {
                errors.push(FieldError::new(
                    format!("items[{idx}].medicineId"),
                    "medicineId must be a string",
                ));
            }
            match qty {
                Some(q) if q >= 1 => {}
                _ => errors.push(FieldError::new(
                    format!("items[{idx}].quantity"),
                    "quantity must be a positive integer",
                )),
            }
            if let (Some(id), Some(q)) = (id, qty) {
                requests.push(StockRequest::new(id, q));
            }
        }

        DomainError::check_fields(errors)?;
        Ok(requests)
    }
}

impl CreateInvoiceRequest {
    /// Parse line ids and fill in missing line amounts.
    ///
    /// Id and amount errors are reported together with the submission's own
    /// field errors.
    pub fn into_new_invoice(self) -> Result<NewInvoice, DomainError> {
        let mut line_errors = Vec::new();

        let items: Vec<CartItem> = self
            .items
            .into_iter()
            .enumerate()
            .map(|(idx, line)| {
                let medicine_id = line.medicine_id.parse::<MedicineId>().unwrap_or_else(|_| {
                    line_errors.push(FieldError::new(
                        format!("items[{idx}].medicineId"),
                        "medicineId is not a valid identifier",
                    ));
                    MedicineId::from_uuid(Uuid::nil())
                });
                let amount = match line.amount {
                    Some(amount) => money::canonical(amount),
                    None => money::line_amount(line.quantity, line.rate).unwrap_or_else(|_| {
                        line_errors.push(FieldError::new(
                            format!("items[{idx}].amount"),
                            format!("line amount must be at most {}", money::MAX_AMOUNT),
                        ));
                        Decimal::ZERO
                    }),
                };
                CartItem {
                    medicine_id,
                    medicine_name: line.medicine_name,
                    quantity: line.quantity,
                    rate: money::canonical(line.rate),
                    amount,
                }
            })
            .collect();

        let new = NewInvoice {
            bill_number: self.bill_number,
            issue_date: self.issue_date,
            client_name: self.client_name.unwrap_or_default(),
            client_address: self.client_address.unwrap_or_default(),
            client_phone: self.client_phone.unwrap_or_default(),
            items,
            subtotal: self.subtotal,
            tax_percentage: self.tax_percentage,
            tax_amount: self.tax_amount,
            total_due: self.total_due,
        };

        if line_errors.is_empty() {
            return Ok(new);
        }

        let mut errors = match new.validate() {
            Err(DomainError::Validation(fields)) => fields,
            _ => Vec::new(),
        };
        errors.extend(line_errors);
        Err(DomainError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_medicine_reports_missing_required_fields() {
        let req: CreateMedicineRequest = serde_json::from_value(json!({ "description": "x" })).unwrap();
        let fields = req.into_new_medicine().unwrap_err();
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["name", "price"]);
    }

    #[test]
    fn price_accepts_strings_and_numbers() {
        let a: CreateMedicineRequest =
            serde_json::from_value(json!({ "name": "A", "price": "25.50" })).unwrap();
        let b: CreateMedicineRequest =
            serde_json::from_value(json!({ "name": "B", "price": 12 })).unwrap();
        assert_eq!(a.price.unwrap(), Decimal::new(2550, 2));
        assert_eq!(b.price.unwrap(), Decimal::from(12));
    }

    #[test]
    fn bulk_prefixes_fields_with_the_entry_index() {
        let req: BulkCreateMedicinesRequest = serde_json::from_value(json!({
            "medicines": [{ "name": "A", "price": "1" }, { "price": "2" }]
        }))
        .unwrap();

        match req.into_new_medicines().unwrap_err() {
            DomainError::Validation(fields) => assert_eq!(fields[0].field, "medicines[1].name"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn delta_must_be_an_integer() {
        let ok = |v: JsonValue| AdjustStockRequest { delta: v }.delta();
        assert_eq!(ok(json!(-4)).unwrap(), -4);
        assert_eq!(ok(json!("12")).unwrap(), 12);
        assert!(ok(json!("abc")).is_err());
        assert!(ok(json!(2.5)).is_err());
        assert!(ok(JsonValue::Null).is_err());
    }

    #[test]
    fn validate_stock_requires_an_array() {
        let req = ValidateStockRequest { items: json!({ "medicineId": "x" }) };
        assert!(matches!(req.stock_requests(), Err(DomainError::Validation(_))));

        let req = ValidateStockRequest {
            items: json!([{ "medicineId": "x", "quantity": 2 }]),
        };
        assert_eq!(req.stock_requests().unwrap(), vec![StockRequest::new("x", 2)]);
    }

    #[test]
    fn invoice_lines_get_amounts_and_bad_ids_are_collected() {
        let good = MedicineId::new();
        let req: CreateInvoiceRequest = serde_json::from_value(json!({
            "clientName": "Asha Rao",
            "clientAddress": "12 MG Road",
            "clientPhone": "9876543210",
            "items": [{
                "medicineId": good.to_string(),
                "medicineName": "Paracetamol 500mg",
                "quantity": 4,
                "rate": "25.50"
            }]
        }))
        .unwrap();
        let new = req.into_new_invoice().unwrap();
        assert_eq!(new.items[0].amount.to_string(), "102.00");
        assert_eq!(new.items[0].medicine_id, good);

        let req: CreateInvoiceRequest = serde_json::from_value(json!({
            "clientName": "Asha Rao",
            "clientAddress": "12 MG Road",
            "clientPhone": "123",
            "items": [{
                "medicineId": "nope",
                "medicineName": "X",
                "quantity": 1,
                "rate": 1
            }]
        }))
        .unwrap();
        match req.into_new_invoice().unwrap_err() {
            DomainError::Validation(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["clientPhone", "items[0].medicineId"]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn oversized_line_product_is_an_amount_error() {
        let req: CreateInvoiceRequest = serde_json::from_value(json!({
            "clientName": "Asha Rao",
            "clientAddress": "12 MG Road",
            "clientPhone": "9876543210",
            "items": [{
                "medicineId": MedicineId::new().to_string(),
                "medicineName": "Paracetamol 500mg",
                "quantity": i64::MAX,
                "rate": "79228162514264337593543950"
            }]
        }))
        .unwrap();

        match req.into_new_invoice().unwrap_err() {
            DomainError::Validation(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["items[0].rate", "items[0].amount"]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn supplied_amount_past_the_bound_is_rejected() {
        let req: CreateInvoiceRequest = serde_json::from_value(json!({
            "clientName": "Asha Rao",
            "clientAddress": "12 MG Road",
            "clientPhone": "9876543210",
            "items": [{
                "medicineId": MedicineId::new().to_string(),
                "medicineName": "Paracetamol 500mg",
                "quantity": 1,
                "rate": "25.50",
                "amount": "100000000"
            }],
            "taxPercentage": "1000"
        }))
        .unwrap();

        let err = req.into_new_invoice().unwrap().validate().unwrap_err();
        match err {
            DomainError::Validation(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["items[0].amount", "taxPercentage"]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
