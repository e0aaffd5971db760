// 🗃️ Repository<T> - identity-keyed in-memory store
//
// One RwLock per collection: reads and writes are both synchronized, and
// every read hands back a cloned snapshot so callers never iterate under the
// lock.

use crate::error::{RecordsError, Result};
use crate::identity::{identity_key, is_blank, Identified};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Generic store keyed by case-insensitive identity.
///
/// Enumeration follows insertion order; `upsert` keeps an entity's original
/// position.
pub struct Repository<T> {
    items: RwLock<Vec<T>>,
}

impl<T: Identified + Clone> Repository<T> {
    pub fn new() -> Self {
        Repository {
            items: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn position(items: &[T], identity: &str) -> Option<usize> {
        let key = identity_key(identity);
        items
            .iter()
            .position(|item| identity_key(item.identity()) == key)
    }

    /// Insert a new entity. Rejects blank and duplicate identities.
    pub fn add(&self, entity: T) -> Result<()> {
        if is_blank(entity.identity()) {
            return Err(RecordsError::InvalidIdentity);
        }

        let mut items = self.write();
        if Self::position(&items, entity.identity()).is_some() {
            return Err(RecordsError::DuplicateIdentity {
                identity: entity.identity().to_string(),
            });
        }

        items.push(entity);
        Ok(())
    }

    /// Insert or replace by identity in one step. Returns the replaced entity.
    pub fn upsert(&self, entity: T) -> Result<Option<T>> {
        if is_blank(entity.identity()) {
            return Err(RecordsError::InvalidIdentity);
        }

        let mut items = self.write();
        match Self::position(&items, entity.identity()) {
            Some(index) => Ok(Some(std::mem::replace(&mut items[index], entity))),
            None => {
                items.push(entity);
                Ok(None)
            }
        }
    }

    /// Remove by identity. Absent or blank identities are a no-op.
    pub fn remove(&self, identity: &str) -> bool {
        if is_blank(identity) {
            return false;
        }

        let mut items = self.write();
        match Self::position(&items, identity) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn find_by_id(&self, identity: &str) -> Option<T> {
        if is_blank(identity) {
            return None;
        }

        let items = self.read();
        Self::position(&items, identity).map(|index| items[index].clone())
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.find_by_id(identity).is_some()
    }

    /// Immutable point-in-time copy of every entity.
    pub fn get_all(&self) -> Vec<T> {
        self.read().clone()
    }

    /// Lazily filter a snapshot of the repository.
    pub fn find<P>(&self, predicate: P) -> impl Iterator<Item = T>
    where
        P: FnMut(&T) -> bool,
    {
        self.get_all().into_iter().filter(predicate)
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl<T: Identified + Clone> Default for Repository<T> {
    fn default() -> Self {
        Self::new()
    }
}
