use rust_decimal::Decimal;
use serde::Serialize;

use clinic_core::money;
use clinic_core::{DomainError, DomainResult, Entity, FieldError, MedicineId, StockShortfall};

/// Largest stock level a medicine can hold (the catalog's integer column).
pub const MAX_STOCK_QUANTITY: i64 = i32::MAX as i64;

/// Catalog entry: a medicine with a price and the quantity on hand.
///
/// Invariant: `stock_quantity >= 0`. Every mutation goes through a method that
/// computes the new state first and only writes when it is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    id: MedicineId,
    name: String,
    description: String,
    price: Decimal,
    stock_quantity: i64,
}

/// Fields for a medicine that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewMedicine {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: Option<i64>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MedicineUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i64>,
}

impl Medicine {
    /// Build a new record, applying defaults (`description = ""`, `stock_quantity = 0`).
    pub fn create(id: MedicineId, fields: NewMedicine) -> DomainResult<Self> {
        fields.validate()?;
        Ok(Self {
            id,
            name: fields.name.trim().to_string(),
            description: fields.description.unwrap_or_default(),
            price: money::canonical(fields.price),
            stock_quantity: fields.stock_quantity.unwrap_or(0),
        })
    }

    pub fn id_typed(&self) -> MedicineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn stock_quantity(&self) -> i64 {
        self.stock_quantity
    }

    /// `true` iff `requested` units can be taken from current stock.
    pub fn can_supply(&self, requested: i64) -> bool {
        requested <= self.stock_quantity
    }

    /// Stock level after applying `delta`, without mutating.
    ///
    /// Fails with `InsufficientStock` when the result would be negative and
    /// with a `delta` validation error when it would exceed [`MAX_STOCK_QUANTITY`].
    pub fn stock_after(&self, delta: i64) -> DomainResult<i64> {
        let next = self
            .stock_quantity
            .checked_add(delta)
            .filter(|next| *next <= MAX_STOCK_QUANTITY)
            .ok_or_else(|| {
                DomainError::validation(
                    "delta",
                    format!("stock quantity cannot exceed {MAX_STOCK_QUANTITY}"),
                )
            })?;
        if next < 0 {
            return Err(DomainError::InsufficientStock(vec![
                self.shortfall(delta.saturating_neg()),
            ]));
        }
        Ok(next)
    }

    /// Apply a signed stock delta (negative = sale, positive = restock).
    ///
    /// On failure the record is left unchanged.
    pub fn adjust_stock(&mut self, delta: i64) -> DomainResult<i64> {
        let next = self.stock_after(delta)?;
        self.stock_quantity = next;
        Ok(next)
    }

    /// Merge the provided fields. Nothing is written unless every field is valid.
    pub fn apply_update(&mut self, update: MedicineUpdate) -> DomainResult<()> {
        update.validate()?;

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = money::canonical(price);
        }
        if let Some(qty) = update.stock_quantity {
            self.stock_quantity = qty;
        }
        Ok(())
    }

    pub fn shortfall(&self, requested: i64) -> StockShortfall {
        StockShortfall {
            medicine_id: self.id.to_string(),
            medicine_name: self.name.clone(),
            requested_quantity: requested,
            available_stock: self.stock_quantity,
        }
    }
}

impl Entity for Medicine {
    type Id = MedicineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl NewMedicine {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = Vec::new();
        check_name(&self.name, &mut errors);
        check_price(self.price, &mut errors);
        if let Some(qty) = self.stock_quantity {
            check_stock(qty, &mut errors);
        }
        DomainError::check_fields(errors)
    }
}

impl MedicineUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_name(name, &mut errors);
        }
        if let Some(price) = self.price {
            check_price(price, &mut errors);
        }
        if let Some(qty) = self.stock_quantity {
            check_stock(qty, &mut errors);
        }
        DomainError::check_fields(errors)
    }
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "name cannot be empty"));
    }
}

fn check_price(price: Decimal, errors: &mut Vec<FieldError>) {
    if price < Decimal::ZERO {
        errors.push(FieldError::new("price", "price cannot be negative"));
    } else if let Err(DomainError::Validation(fields)) = money::check_amount("price", price) {
        errors.extend(fields);
    }
}

fn check_stock(qty: i64, errors: &mut Vec<FieldError>) {
    if qty < 0 {
        errors.push(FieldError::new("stockQuantity", "stock quantity cannot be negative"));
    } else if qty > MAX_STOCK_QUANTITY {
        errors.push(FieldError::new(
            "stockQuantity",
            format!("stock quantity cannot exceed {MAX_STOCK_QUANTITY}"),
        ));
    }
}
