//! In-memory stores for configurations and assemblies.
//!
//! Read-modify-write sequences run inside the store's write lock via the
//! `update`/`remove_if` closures, so two concurrent edits of the same record
//! cannot interleave. Operations that must stay atomic across a store and
//! the item ledger (assembly creation, item deletion, component checks)
//! take an exclusive guard first and touch the ledger while holding it.
//!
//! Lock order everywhere: configuration store, then assembly store, then
//! ledger rows. Never acquire them in any other order.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockWriteGuard};

use stockforge_assembly::{Assembly, AssemblyStatus};
use stockforge_catalog::Configuration;
use stockforge_core::{AssemblyId, ConfigurationId, DomainError, DomainResult, ItemId};

/// Store for configuration records.
pub struct ConfigurationStore {
    inner: RwLock<HashMap<ConfigurationId, Configuration>>,
}

/// Exclusive hold on the configuration store.
///
/// While the guard lives, no configuration can be inserted or edited by
/// anyone else, so a reference check stays true until the guard drops.
pub struct ConfigurationsGuard<'a> {
    map: RwLockWriteGuard<'a, HashMap<ConfigurationId, Configuration>>,
}

impl ConfigurationsGuard<'_> {
    pub fn insert(&mut self, config: Configuration) {
        self.map.insert(config.id_typed(), config);
    }

    /// True if any configuration has a component line for `item_id`.
    pub fn references_item(&self, item_id: ItemId) -> bool {
        self.map.values().any(|c| c.references_item(item_id))
    }
}

impl ConfigurationStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Take the store's write lock for a check-then-act sequence.
    pub fn lock_exclusive(&self) -> ConfigurationsGuard<'_> {
        ConfigurationsGuard {
            map: self.inner.write().unwrap(),
        }
    }

    pub fn insert(&self, config: Configuration) {
        let mut map = self.inner.write().unwrap();
        map.insert(config.id_typed(), config);
    }

    pub fn get(&self, id: ConfigurationId) -> Option<Configuration> {
        let map = self.inner.read().unwrap();
        map.get(&id).cloned()
    }

    pub fn list(&self) -> Vec<Configuration> {
        let map = self.inner.read().unwrap();
        let mut configs: Vec<Configuration> = map.values().cloned().collect();
        configs.sort_by_key(|c| (c.created_at(), c.id_typed()));
        configs
    }

    /// Mutate one configuration atomically. `f` may read the ledger, which
    /// is below this store in the lock order.
    pub fn update<T, F>(&self, id: ConfigurationId, f: F) -> DomainResult<T>
    where
        F: FnOnce(&mut Configuration) -> DomainResult<T>,
    {
        let mut map = self.inner.write().unwrap();
        let config = map
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("configuration {id}")))?;
        f(config)
    }

    pub fn remove(&self, id: ConfigurationId) -> DomainResult<Configuration> {
        let mut map = self.inner.write().unwrap();
        map.remove(&id)
            .ok_or_else(|| DomainError::not_found(format!("configuration {id}")))
    }
}

impl Default for ConfigurationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Store for assembly records.
pub struct AssemblyStore {
    inner: RwLock<HashMap<AssemblyId, Assembly>>,
}

/// Exclusive hold on the assembly store.
///
/// Creation reserves ledger stock and inserts the assembly under one guard,
/// so an item-deletion check can never slip between the two steps.
pub struct AssembliesGuard<'a> {
    map: RwLockWriteGuard<'a, HashMap<AssemblyId, Assembly>>,
}

impl AssembliesGuard<'_> {
    pub fn insert(&mut self, assembly: Assembly) {
        self.map.insert(assembly.id_typed(), assembly);
    }

    /// True if any non-terminal assembly still holds `item_id`.
    pub fn any_active_references_item(&self, item_id: ItemId) -> bool {
        self.map
            .values()
            .any(|a| a.status().holds_reservation() && a.references_item(item_id))
    }
}

impl AssemblyStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Take the store's write lock for a check-then-act sequence.
    pub fn lock_exclusive(&self) -> AssembliesGuard<'_> {
        AssembliesGuard {
            map: self.inner.write().unwrap(),
        }
    }

    pub fn get(&self, id: AssemblyId) -> Option<Assembly> {
        let map = self.inner.read().unwrap();
        map.get(&id).cloned()
    }

    pub fn list(&self, status: Option<AssemblyStatus>) -> Vec<Assembly> {
        let map = self.inner.read().unwrap();
        let mut assemblies: Vec<Assembly> = map
            .values()
            .filter(|a| status.is_none_or(|s| a.status() == s))
            .cloned()
            .collect();
        assemblies.sort_by_key(|a| (a.created_at(), a.id_typed()));
        assemblies
    }

    /// Mutate one assembly atomically. Lifecycle transitions and their
    /// ledger effects both happen inside `f`, so two concurrent transitions
    /// of the same assembly cannot both pass the status guard.
    pub fn update<T, F>(&self, id: AssemblyId, f: F) -> DomainResult<T>
    where
        F: FnOnce(&mut Assembly) -> DomainResult<T>,
    {
        let mut map = self.inner.write().unwrap();
        let assembly = map
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("assembly {id}")))?;
        f(assembly)
    }

    /// Remove one assembly if `check` passes, atomically.
    pub fn remove_if<F>(&self, id: AssemblyId, check: F) -> DomainResult<Assembly>
    where
        F: FnOnce(&Assembly) -> DomainResult<()>,
    {
        let mut map = self.inner.write().unwrap();
        let assembly = map
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("assembly {id}")))?;
        check(assembly)?;
        Ok(map.remove(&id).expect("checked above"))
    }
}

impl Default for AssemblyStore {
    fn default() -> Self {
        Self::new()
    }
}
