//! Lock-guarded entity map shared by the in-memory stores.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use clinic_core::Entity;

use crate::error::{InfraError, InfraResult};

/// In-memory `id -> entity` map behind a `RwLock`.
///
/// A poisoned lock is reported as `InfraError::Unavailable` instead of
/// panicking the request.
#[derive(Debug)]
pub struct InMemoryRecords<E: Entity> {
    label: &'static str,
    inner: RwLock<HashMap<E::Id, E>>,
}

impl<E: Entity + Clone> InMemoryRecords<E> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn read(&self) -> InfraResult<RwLockReadGuard<'_, HashMap<E::Id, E>>> {
        self.inner
            .read()
            .map_err(|_| InfraError::Unavailable(format!("{} lock poisoned", self.label)))
    }

    pub fn write(&self) -> InfraResult<RwLockWriteGuard<'_, HashMap<E::Id, E>>> {
        self.inner
            .write()
            .map_err(|_| InfraError::Unavailable(format!("{} lock poisoned", self.label)))
    }

    pub fn get(&self, id: &E::Id) -> InfraResult<Option<E>> {
        Ok(self.read()?.get(id).cloned())
    }

    /// Snapshot of every record, unordered.
    pub fn all(&self) -> InfraResult<Vec<E>> {
        Ok(self.read()?.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: u32,
        text: &'static str,
    }

    impl Entity for Note {
        type Id = u32;

        fn id(&self) -> &Self::Id {
            &self.id
        }
    }

    #[test]
    fn get_returns_a_copy() {
        let records: InMemoryRecords<Note> = InMemoryRecords::new("notes");
        records.write().unwrap().insert(1, Note { id: 1, text: "a" });

        let mut copy = records.get(&1).unwrap().unwrap();
        copy.text = "changed";

        assert_eq!(records.get(&1).unwrap().unwrap().text, "a");
        assert_eq!(records.get(&2).unwrap(), None);
        assert_eq!(records.all().unwrap().len(), 1);
    }

    #[test]
    fn poisoned_lock_is_reported_not_panicked() {
        let records: std::sync::Arc<InMemoryRecords<Note>> =
            std::sync::Arc::new(InMemoryRecords::new("notes"));

        let r = records.clone();
        let _ = std::thread::spawn(move || {
            let _guard = r.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        match records.all() {
            Err(InfraError::Unavailable(msg)) => assert!(msg.contains("notes")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }
}
