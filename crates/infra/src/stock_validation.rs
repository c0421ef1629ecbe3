use clinic_core::MedicineId;
use clinic_inventory::{StockLineReport, StockReport, StockRequest};

use crate::error::InfraResult;
use crate::medicine_store::MedicineStore;

/// Check a prospective cart against current stock.
///
/// Each line is evaluated independently, in request order. Nothing is
/// reserved: stock may change between this check and a later deduction.
/// An id that does not parse is reported the same way as an unknown one.
pub fn validate_stock<M>(medicines: &M, requests: &[StockRequest]) -> InfraResult<StockReport>
where
    M: MedicineStore + ?Sized,
{
    let mut lines = Vec::with_capacity(requests.len());
    for request in requests {
        let medicine = match request.medicine_id.parse::<MedicineId>() {
            Ok(id) => medicines.get(&id)?,
            Err(_) => None,
        };
        lines.push(StockLineReport::evaluate(request, medicine.as_ref()));
    }
    Ok(StockReport::from_lines(lines))
}
