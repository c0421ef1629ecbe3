//! Sample catalog loaded at startup when seeding is enabled.

use rust_decimal::Decimal;
use tracing::info;

use clinic_inventory::NewMedicine;

use crate::error::InfraResult;
use crate::medicine_store::MedicineStore;

/// `(name, price in paise, stock)`
const SAMPLE_CATALOG: [(&str, i64, i64); 20] = [
    ("Paracetamol 500mg", 2550, 100),
    ("Amoxicillin 250mg", 8500, 50),
    ("Ibuprofen 400mg", 3575, 75),
    ("Cetirizine 10mg", 1500, 120),
    ("Omeprazole 20mg", 4550, 60),
    ("Metformin 500mg", 1200, 150),
    ("Amlodipine 5mg", 2800, 80),
    ("Azithromycin 500mg", 12000, 40),
    ("Vitamin D3 60000 IU", 5500, 90),
    ("Calcium Carbonate 500mg", 1850, 110),
    ("Diclofenac Sodium 50mg", 2200, 70),
    ("Ranitidine 150mg", 3200, 65),
    ("Ciprofloxacin 500mg", 9500, 45),
    ("Dolo 650mg", 3000, 100),
    ("Montelukast 10mg", 4800, 55),
    ("Pantoprazole 40mg", 5200, 60),
    ("Losartan 50mg", 3800, 70),
    ("Atorvastatin 10mg", 4200, 80),
    ("Salbutamol Inhaler", 12500, 35),
    ("Multivitamin Tablets", 6500, 95),
];

pub fn sample_catalog() -> Vec<NewMedicine> {
    SAMPLE_CATALOG
        .iter()
        .map(|(name, paise, stock)| NewMedicine {
            name: (*name).to_string(),
            description: None,
            price: Decimal::new(*paise, 2),
            stock_quantity: Some(*stock),
        })
        .collect()
}

/// Insert the sample catalog; returns how many medicines were added.
pub fn seed_sample_catalog<M>(medicines: &M) -> InfraResult<usize>
where
    M: MedicineStore + ?Sized,
{
    let created = medicines.create_many(sample_catalog())?;
    info!(count = created.len(), "sample catalog seeded");
    Ok(created.len())
}
