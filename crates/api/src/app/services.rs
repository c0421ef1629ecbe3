use std::sync::Arc;

use clinic_infra::{
    seed, InMemoryInvoiceStore, InMemoryMedicineStore, InfraResult, InvoiceWorkflow,
};

use crate::config::AppConfig;

pub type MedicineStoreHandle = Arc<InMemoryMedicineStore>;
pub type InvoiceStoreHandle = Arc<InMemoryInvoiceStore>;

/// Stores and workflows shared by every handler.
///
/// Built once at startup; tests build a fresh instance per server.
#[derive(Debug)]
pub struct AppServices {
    medicines: MedicineStoreHandle,
    invoices: InvoiceStoreHandle,
    workflow: InvoiceWorkflow<MedicineStoreHandle, InvoiceStoreHandle>,
}

impl AppServices {
    /// In-memory stores, seeded with the sample catalog when configured.
    pub fn in_memory(config: &AppConfig) -> InfraResult<Self> {
        let medicines = Arc::new(InMemoryMedicineStore::new());
        let invoices = Arc::new(InMemoryInvoiceStore::new());

        if config.seed_sample_data {
            seed::seed_sample_catalog(&medicines)?;
        }

        let workflow = InvoiceWorkflow::new(
            medicines.clone(),
            invoices.clone(),
            config.default_tax_percentage,
        );

        Ok(Self {
            medicines,
            invoices,
            workflow,
        })
    }

    pub fn medicines(&self) -> &MedicineStoreHandle {
        &self.medicines
    }

    pub fn invoices(&self) -> &InvoiceStoreHandle {
        &self.invoices
    }

    pub fn workflow(&self) -> &InvoiceWorkflow<MedicineStoreHandle, InvoiceStoreHandle> {
        &self.workflow
    }
}
