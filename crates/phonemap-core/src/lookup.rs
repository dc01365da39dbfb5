//! Real/fake resolution for the telephony switch.

use crate::errors::StoreError;
use crate::phone;
use crate::store::MappingStore;

#[derive(Clone)]
pub struct LookupService {
    store: MappingStore,
}

impl LookupService {
    pub fn new(store: MappingStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    /// Real number behind a fake one. A hit is recorded in the call log; a
    /// failure to record it is logged and does not affect the answer.
    pub fn resolve_real(&self, fake_raw: &str) -> Result<Option<String>, StoreError> {
        let fake = phone::normalize(fake_raw);
        let real = self.store.lookup_real_by_fake(&fake)?;

        if let Some(real) = &real {
            if let Err(e) = self.store.append_call_log(&fake, real) {
                tracing::warn!(fake = %fake, error = %e, "failed to record call log");
            }
        }

        Ok(real)
    }

    /// Fake number for a real one. Not logged.
    pub fn resolve_fake(&self, real_raw: &str) -> Result<Option<String>, StoreError> {
        let real = phone::normalize(real_raw);
        self.store.lookup_fake_by_real(&real)
    }
}
