use std::sync::Arc;

use tracing::{debug, info, warn};

use clinic_core::{DomainError, FieldError, MedicineId, StockShortfall};
use clinic_inventory::{Medicine, MedicineUpdate, NewMedicine, UNKNOWN_MEDICINE};

use crate::error::InfraResult;
use crate::records::InMemoryRecords;

/// Medicine record store.
///
/// Every mutation is visible to the next read. Stock changes never leave a
/// record below zero: a rejected change writes nothing.
pub trait MedicineStore: Send + Sync {
    /// All medicines ordered by name (case-sensitive).
    fn list(&self) -> InfraResult<Vec<Medicine>>;

    fn get(&self, id: &MedicineId) -> InfraResult<Option<Medicine>>;

    fn create(&self, fields: NewMedicine) -> InfraResult<Medicine>;

    /// Insert a batch. If any entry is invalid nothing is inserted.
    fn create_many(&self, batch: Vec<NewMedicine>) -> InfraResult<Vec<Medicine>>;

    /// Merge fields into an existing record; `None` when the id is absent.
    fn update(&self, id: &MedicineId, update: MedicineUpdate) -> InfraResult<Option<Medicine>>;

    /// Hard delete; returns whether a record existed.
    fn delete(&self, id: &MedicineId) -> InfraResult<bool>;

    /// Apply a signed delta to one medicine's stock.
    fn adjust_stock(&self, id: &MedicineId, delta: i64) -> InfraResult<Medicine>;

    /// `requested <= stock`; an absent id is unavailable.
    fn check_availability(&self, id: &MedicineId, requested: i64) -> InfraResult<bool>;

    /// Deduct every line or none of them.
    ///
    /// Repeated ids are summed before checking. On failure the error lists
    /// every line that cannot be served.
    fn deduct_all(&self, lines: &[(MedicineId, i64)]) -> InfraResult<Vec<Medicine>>;

    /// Return previously deducted quantities. Ids that no longer exist are skipped.
    fn restock_all(&self, lines: &[(MedicineId, i64)]) -> InfraResult<()>;
}

impl<S> MedicineStore for Arc<S>
where
    S: MedicineStore + ?Sized,
{
    fn list(&self) -> InfraResult<Vec<Medicine>> {
        (**self).list()
    }

    fn get(&self, id: &MedicineId) -> InfraResult<Option<Medicine>> {
        (**self).get(id)
    }

    fn create(&self, fields: NewMedicine) -> InfraResult<Medicine> {
        (**self).create(fields)
    }

    fn create_many(&self, batch: Vec<NewMedicine>) -> InfraResult<Vec<Medicine>> {
        (**self).create_many(batch)
    }

    fn update(&self, id: &MedicineId, update: MedicineUpdate) -> InfraResult<Option<Medicine>> {
        (**self).update(id, update)
    }

    fn delete(&self, id: &MedicineId) -> InfraResult<bool> {
        (**self).delete(id)
    }

    fn adjust_stock(&self, id: &MedicineId, delta: i64) -> InfraResult<Medicine> {
        (**self).adjust_stock(id, delta)
    }

    fn check_availability(&self, id: &MedicineId, requested: i64) -> InfraResult<bool> {
        (**self).check_availability(id, requested)
    }

    fn deduct_all(&self, lines: &[(MedicineId, i64)]) -> InfraResult<Vec<Medicine>> {
        (**self).deduct_all(lines)
    }

    fn restock_all(&self, lines: &[(MedicineId, i64)]) -> InfraResult<()> {
        (**self).restock_all(lines)
    }
}

/// In-memory medicine store (process lifetime only).
#[derive(Debug)]
pub struct InMemoryMedicineStore {
    records: InMemoryRecords<Medicine>,
}

impl InMemoryMedicineStore {
    pub fn new() -> Self {
        Self {
            records: InMemoryRecords::new("medicines"),
        }
    }
}

impl Default for InMemoryMedicineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MedicineStore for InMemoryMedicineStore {
    fn list(&self) -> InfraResult<Vec<Medicine>> {
        let mut all = self.records.all()?;
        all.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(all)
    }

    fn get(&self, id: &MedicineId) -> InfraResult<Option<Medicine>> {
        self.records.get(id)
    }

    fn create(&self, fields: NewMedicine) -> InfraResult<Medicine> {
        let medicine = Medicine::create(MedicineId::new(), fields)?;
        self.records
            .write()?
            .insert(medicine.id_typed(), medicine.clone());

        info!(medicine_id = %medicine.id_typed(), name = medicine.name(), "medicine created");
        Ok(medicine)
    }

    fn create_many(&self, batch: Vec<NewMedicine>) -> InfraResult<Vec<Medicine>> {
        let mut errors: Vec<FieldError> = Vec::new();
        let mut created = Vec::with_capacity(batch.len());

        for (idx, fields) in batch.into_iter().enumerate() {
            match Medicine::create(MedicineId::new(), fields) {
                Ok(m) => created.push(m),
                Err(DomainError::Validation(fs)) => errors.extend(fs.into_iter().map(|f| {
                    FieldError::new(format!("medicines[{idx}].{}", f.field), f.message)
                })),
                Err(e) => return Err(e.into()),
            }
        }
        DomainError::check_fields(errors)?;

        let mut map = self.records.write()?;
        for m in &created {
            map.insert(m.id_typed(), m.clone());
        }
        drop(map);

        info!(count = created.len(), "medicines imported");
        Ok(created)
    }

    fn update(&self, id: &MedicineId, update: MedicineUpdate) -> InfraResult<Option<Medicine>> {
        let mut map = self.records.write()?;
        let Some(medicine) = map.get_mut(id) else {
            return Ok(None);
        };

        medicine.apply_update(update)?;
        debug!(medicine_id = %id, "medicine updated");
        Ok(Some(medicine.clone()))
    }

    fn delete(&self, id: &MedicineId) -> InfraResult<bool> {
        let removed = self.records.write()?.remove(id).is_some();
        if removed {
            info!(medicine_id = %id, "medicine deleted");
        }
        Ok(removed)
    }

    fn adjust_stock(&self, id: &MedicineId, delta: i64) -> InfraResult<Medicine> {
        let mut map = self.records.write()?;
        let medicine = map.get_mut(id).ok_or_else(DomainError::not_found)?;

        let stock = medicine.adjust_stock(delta)?;
        debug!(medicine_id = %id, delta, stock, "stock adjusted");
        Ok(medicine.clone())
    }

    fn check_availability(&self, id: &MedicineId, requested: i64) -> InfraResult<bool> {
        Ok(self
            .records
            .read()?
            .get(id)
            .is_some_and(|m| m.can_supply(requested)))
    }

    fn deduct_all(&self, lines: &[(MedicineId, i64)]) -> InfraResult<Vec<Medicine>> {
        let totals = merge_lines(lines)?;

        // Check and commit under one write lock so no other writer interleaves.
        let mut map = self.records.write()?;

        let mut shortfalls: Vec<StockShortfall> = Vec::new();
        for (id, qty) in &totals {
            match map.get(id) {
                None => shortfalls.push(StockShortfall {
                    medicine_id: id.to_string(),
                    medicine_name: UNKNOWN_MEDICINE.to_string(),
                    requested_quantity: *qty,
                    available_stock: 0,
                }),
                Some(m) => match m.stock_after(-qty) {
                    Ok(_) => {}
                    Err(DomainError::InsufficientStock(mut s)) => shortfalls.append(&mut s),
                    Err(e) => return Err(e.into()),
                },
            }
        }
        if !shortfalls.is_empty() {
            return Err(DomainError::InsufficientStock(shortfalls).into());
        }

        let mut updated = Vec::with_capacity(totals.len());
        for (id, qty) in &totals {
            let medicine = map
                .get_mut(id)
                .ok_or_else(|| DomainError::invariant("checked medicine missing at commit"))?;
            medicine.adjust_stock(-qty)?;
            updated.push(medicine.clone());
        }

        debug!(lines = totals.len(), "stock deducted");
        Ok(updated)
    }

    fn restock_all(&self, lines: &[(MedicineId, i64)]) -> InfraResult<()> {
        let totals = merge_lines(lines)?;
        let mut map = self.records.write()?;

        for (id, qty) in totals {
            match map.get_mut(&id) {
                Some(m) => {
                    m.adjust_stock(qty)?;
                }
                None => warn!(medicine_id = %id, quantity = qty, "restock skipped: medicine no longer exists"),
            }
        }
        Ok(())
    }
}

/// Sum quantities per medicine, keeping first-seen order.
///
/// Sums saturate at `i64::MAX`, which no stock level can cover.
fn merge_lines(lines: &[(MedicineId, i64)]) -> InfraResult<Vec<(MedicineId, i64)>> {
    let mut totals: Vec<(MedicineId, i64)> = Vec::with_capacity(lines.len());
    for (id, qty) in lines {
        if *qty <= 0 {
            return Err(DomainError::validation("quantity", "quantity must be positive").into());
        }
        match totals.iter_mut().find(|(seen, _)| seen == id) {
            Some((_, total)) => *total = total.saturating_add(*qty),
            None => totals.push((*id, *qty)),
        }
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InfraError;
    use clinic_inventory::MAX_STOCK_QUANTITY;
    use core::str::FromStr;
    use rust_decimal::Decimal;

    fn new_medicine(name: &str, price: &str, stock: Option<i64>) -> NewMedicine {
        NewMedicine {
            name: name.to_string(),
            description: None,
            price: Decimal::from_str(price).unwrap(),
            stock_quantity: stock,
        }
    }

    fn stock_of(store: &InMemoryMedicineStore, id: &MedicineId) -> i64 {
        store.get(id).unwrap().unwrap().stock_quantity()
    }

    #[test]
    fn create_then_get_round_trips() {
        let store = InMemoryMedicineStore::new();
        let created = store.create(new_medicine("Paracetamol", "25.50", Some(10))).unwrap();

        let fetched = store.get(&created.id_typed()).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.price().to_string(), "25.50");
    }

    #[test]
    fn create_defaults_missing_stock_to_zero() {
        let store = InMemoryMedicineStore::new();
        let created = store.create(new_medicine("Dolo", "30", None)).unwrap();
        assert_eq!(created.stock_quantity(), 0);
        assert_eq!(created.description(), "");
    }

    #[test]
    fn list_is_ordered_by_name_case_sensitive() {
        let store = InMemoryMedicineStore::new();
        for name in ["ibuprofen", "Paracetamol", "Amoxicillin", "Zinc"] {
            store.create(new_medicine(name, "1", Some(1))).unwrap();
        }

        let names: Vec<_> = store
            .list()
            .unwrap()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["Amoxicillin", "Paracetamol", "Zinc", "ibuprofen"]);
    }

    #[test]
    fn update_merges_and_missing_id_is_none() {
        let store = InMemoryMedicineStore::new();
        let created = store.create(new_medicine("Paracetamol", "25.50", Some(10))).unwrap();

        let updated = store
            .update(
                &created.id_typed(),
                MedicineUpdate {
                    stock_quantity: Some(40),
                    ..MedicineUpdate::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.id_typed(), created.id_typed());
        assert_eq!(updated.stock_quantity(), 40);
        assert_eq!(updated.name(), "Paracetamol");

        let missing = store
            .update(&MedicineId::new(), MedicineUpdate::default())
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn delete_reports_whether_a_record_existed() {
        let store = InMemoryMedicineStore::new();
        let created = store.create(new_medicine("Paracetamol", "25.50", Some(10))).unwrap();

        assert!(store.delete(&created.id_typed()).unwrap());
        assert!(!store.delete(&created.id_typed()).unwrap());
        assert!(store.get(&created.id_typed()).unwrap().is_none());
    }

    #[test]
    fn adjust_stock_rejects_without_partial_write() {
        let store = InMemoryMedicineStore::new();
        let m = store.create(new_medicine("Paracetamol", "25.50", Some(6))).unwrap();

        let err = store.adjust_stock(&m.id_typed(), -10).unwrap_err();
        assert!(matches!(
            err,
            InfraError::Domain(DomainError::InsufficientStock(_))
        ));
        assert_eq!(stock_of(&store, &m.id_typed()), 6);

        let restocked = store.adjust_stock(&m.id_typed(), 4).unwrap();
        assert_eq!(restocked.stock_quantity(), 10);
    }

    #[test]
    fn adjust_stock_out_of_range_is_a_validation_error() {
        let store = InMemoryMedicineStore::new();
        let m = store.create(new_medicine("Paracetamol", "25.50", Some(6))).unwrap();

        let err = store.adjust_stock(&m.id_typed(), i64::MAX).unwrap_err();
        assert!(matches!(
            err,
            InfraError::Domain(DomainError::Validation(ref f)) if f[0].field == "delta"
        ));
        assert_eq!(stock_of(&store, &m.id_typed()), 6);
    }

    #[test]
    fn stock_past_the_cap_is_rejected_on_create_and_update() {
        let store = InMemoryMedicineStore::new();
        let err = store
            .create(new_medicine("Paracetamol", "25.50", Some(MAX_STOCK_QUANTITY + 1)))
            .unwrap_err();
        assert!(matches!(err, InfraError::Domain(DomainError::Validation(_))));

        let m = store.create(new_medicine("Paracetamol", "25.50", Some(6))).unwrap();
        let err = store
            .update(
                &m.id_typed(),
                MedicineUpdate {
                    stock_quantity: Some(MAX_STOCK_QUANTITY + 1),
                    ..MedicineUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, InfraError::Domain(DomainError::Validation(_))));
        assert_eq!(stock_of(&store, &m.id_typed()), 6);
    }

    #[test]
    fn adjust_stock_on_missing_id_is_not_found() {
        let store = InMemoryMedicineStore::new();
        let err = store.adjust_stock(&MedicineId::new(), 1).unwrap_err();
        assert!(matches!(err, InfraError::Domain(DomainError::NotFound)));
    }

    #[test]
    fn check_availability_semantics() {
        let store = InMemoryMedicineStore::new();
        let m = store.create(new_medicine("Paracetamol", "25.50", Some(5))).unwrap();

        assert!(store.check_availability(&m.id_typed(), 5).unwrap());
        assert!(!store.check_availability(&m.id_typed(), 6).unwrap());
        assert!(!store.check_availability(&MedicineId::new(), 1).unwrap());
    }

    #[test]
    fn create_many_is_all_or_nothing() {
        let store = InMemoryMedicineStore::new();
        let err = store
            .create_many(vec![
                new_medicine("Good", "1", Some(1)),
                new_medicine("", "-2", Some(1)),
            ])
            .unwrap_err();

        match err {
            InfraError::Domain(DomainError::Validation(fields)) => {
                assert_eq!(fields[0].field, "medicines[1].name");
                assert_eq!(fields[1].field, "medicines[1].price");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(store.list().unwrap().is_empty());

        let created = store
            .create_many(vec![
                new_medicine("B", "1", Some(1)),
                new_medicine("A", "2", None),
            ])
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].name(), "B");
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn deduct_all_commits_every_line() {
        let store = InMemoryMedicineStore::new();
        let a = store.create(new_medicine("A", "1", Some(10))).unwrap();
        let b = store.create(new_medicine("B", "1", Some(3))).unwrap();

        store
            .deduct_all(&[(a.id_typed(), 4), (b.id_typed(), 3)])
            .unwrap();

        assert_eq!(stock_of(&store, &a.id_typed()), 6);
        assert_eq!(stock_of(&store, &b.id_typed()), 0);
    }

    #[test]
    fn deduct_all_touches_nothing_when_any_line_fails() {
        let store = InMemoryMedicineStore::new();
        let a = store.create(new_medicine("A", "1", Some(10))).unwrap();
        let b = store.create(new_medicine("B", "1", Some(2))).unwrap();
        let ghost = MedicineId::new();

        let err = store
            .deduct_all(&[(a.id_typed(), 4), (b.id_typed(), 3), (ghost, 1)])
            .unwrap_err();

        match err {
            InfraError::Domain(DomainError::InsufficientStock(lines)) => {
                assert_eq!(lines.len(), 2);
                assert_eq!(lines[0].medicine_name, "B");
                assert_eq!(lines[0].available_stock, 2);
                assert_eq!(lines[1].medicine_name, UNKNOWN_MEDICINE);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(stock_of(&store, &a.id_typed()), 10);
        assert_eq!(stock_of(&store, &b.id_typed()), 2);
    }

    #[test]
    fn deduct_all_sums_repeated_lines() {
        let store = InMemoryMedicineStore::new();
        let a = store.create(new_medicine("A", "1", Some(5))).unwrap();

        let err = store
            .deduct_all(&[(a.id_typed(), 3), (a.id_typed(), 3)])
            .unwrap_err();
        match err {
            InfraError::Domain(DomainError::InsufficientStock(lines)) => {
                assert_eq!(lines.len(), 1);
                assert_eq!(lines[0].requested_quantity, 6);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(stock_of(&store, &a.id_typed()), 5);
    }

    #[test]
    fn huge_repeated_lines_are_a_shortfall_not_an_overflow() {
        let store = InMemoryMedicineStore::new();
        let a = store.create(new_medicine("A", "1", Some(5))).unwrap();

        let err = store
            .deduct_all(&[(a.id_typed(), i64::MAX), (a.id_typed(), i64::MAX)])
            .unwrap_err();
        match err {
            InfraError::Domain(DomainError::InsufficientStock(lines)) => {
                assert_eq!(lines[0].requested_quantity, i64::MAX);
                assert_eq!(lines[0].available_stock, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(stock_of(&store, &a.id_typed()), 5);
    }

    #[test]
    fn restock_all_returns_quantities_and_skips_deleted() {
        let store = InMemoryMedicineStore::new();
        let a = store.create(new_medicine("A", "1", Some(5))).unwrap();
        let b = store.create(new_medicine("B", "1", Some(5))).unwrap();
        store.delete(&b.id_typed()).unwrap();

        store
            .restock_all(&[(a.id_typed(), 2), (b.id_typed(), 2)])
            .unwrap();
        assert_eq!(stock_of(&store, &a.id_typed()), 7);
    }

    #[test]
    fn non_positive_deduction_is_rejected() {
        let store = InMemoryMedicineStore::new();
        let a = store.create(new_medicine("A", "1", Some(5))).unwrap();
        let err = store.deduct_all(&[(a.id_typed(), 0)]).unwrap_err();
        assert!(matches!(err, InfraError::Domain(DomainError::Validation(_))));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any interleaving of adjustments and batch deductions
            /// keeps every medicine's stock non-negative.
            #[test]
            fn stock_stays_non_negative(
                initial in proptest::collection::vec(0i64..50, 1..5),
                ops in proptest::collection::vec((0usize..5, -40i64..40), 0..60)
            ) {
                let store = InMemoryMedicineStore::new();
                let ids: Vec<MedicineId> = initial
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        store
                            .create(new_medicine(&format!("M{i}"), "1", Some(*s)))
                            .unwrap()
                            .id_typed()
                    })
                    .collect();

                for (idx, delta) in ops {
                    let id = ids[idx % ids.len()];
                    if delta < 0 && idx % 2 == 0 {
                        let _ = store.deduct_all(&[(id, -delta)]);
                    } else {
                        let _ = store.adjust_stock(&id, delta);
                    }
                    for m in store.list().unwrap() {
                        prop_assert!(m.stock_quantity() >= 0);
                    }
                }
            }
        }
    }
}
