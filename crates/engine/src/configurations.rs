//! Configuration catalog operations.

use std::sync::Arc;

use chrono::Utc;

use stockforge_catalog::{Configuration, ConfigurationPatch};
use stockforge_core::{ConfigurationId, DomainError, DomainResult, ItemId};

use crate::item_ledger::ItemLedger;
use crate::stores::ConfigurationStore;

/// Fields for creating a configuration, optionally with initial lines.
#[derive(Debug, Clone, Default)]
pub struct NewConfiguration {
    pub name: String,
    pub description: Option<String>,
    pub components: Vec<(ItemId, i64)>,
}

pub struct ConfigurationsService {
    store: Arc<ConfigurationStore>,
    ledger: Arc<ItemLedger>,
}

impl ConfigurationsService {
    pub fn new(store: Arc<ConfigurationStore>, ledger: Arc<ItemLedger>) -> Self {
        Self { store, ledger }
    }

    fn ensure_item_exists(&self, item_id: ItemId) -> DomainResult<()> {
        if self.ledger.get(item_id).is_none() {
            return Err(DomainError::not_found(format!("item {item_id}")));
        }
        Ok(())
    }

    pub fn create(&self, new: NewConfiguration) -> DomainResult<Configuration> {
        let mut config =
            Configuration::create(ConfigurationId::new(), new.name, new.description, Utc::now())?;
        // Existence checks and insertion happen under the store's write
        // lock; item deletion takes the same lock before its reference
        // check, so a referenced item cannot vanish mid-create.
        let mut configurations = self.store.lock_exclusive();
        for (item_id, quantity) in new.components {
            self.ensure_item_exists(item_id)?;
            config.upsert_component(item_id, quantity)?;
        }
        let snapshot = config.clone();
        configurations.insert(config);
        drop(configurations);
        tracing::info!(configuration_id = %snapshot.id_typed(), "configuration created");
        Ok(snapshot)
    }

    pub fn get(&self, id: ConfigurationId) -> DomainResult<Configuration> {
        self.store
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("configuration {id}")))
    }

    /// All configurations, archived included; callers filter if they care.
    pub fn list(&self) -> Vec<Configuration> {
        self.store.list()
    }

    pub fn update(&self, id: ConfigurationId, patch: ConfigurationPatch) -> DomainResult<Configuration> {
        self.store.update(id, |config| {
            config.apply_patch(patch)?;
            Ok(config.clone())
        })
    }

    pub fn archive(&self, id: ConfigurationId) -> DomainResult<Configuration> {
        self.store.update(id, |config| {
            config.archive();
            Ok(config.clone())
        })
    }

    pub fn unarchive(&self, id: ConfigurationId) -> DomainResult<Configuration> {
        self.store.update(id, |config| {
            config.unarchive();
            Ok(config.clone())
        })
    }

    /// Deep copy with a derived name; the copy always starts active.
    pub fn duplicate(&self, id: ConfigurationId) -> DomainResult<Configuration> {
        let source = self.get(id)?;
        let copy = source.duplicate(ConfigurationId::new(), Utc::now());
        let snapshot = copy.clone();
        self.store.insert(copy);
        tracing::info!(
            source_id = %id,
            configuration_id = %snapshot.id_typed(),
            "configuration duplicated"
        );
        Ok(snapshot)
    }

    /// Upsert a component line (quantity replaced, not summed).
    pub fn add_component(
        &self,
        id: ConfigurationId,
        item_id: ItemId,
        quantity: i64,
    ) -> DomainResult<Configuration> {
        // The existence check runs inside the store lock so it cannot race
        // a concurrent deletion of the item.
        self.store.update(id, |config| {
            self.ensure_item_exists(item_id)?;
            config.upsert_component(item_id, quantity)?;
            Ok(config.clone())
        })
    }

    pub fn remove_component(&self, id: ConfigurationId, item_id: ItemId) -> DomainResult<Configuration> {
        self.store.update(id, |config| {
            config.remove_component(item_id)?;
            Ok(config.clone())
        })
    }

    /// Delete a configuration outright. Assemblies keep their snapshots, so
    /// history survives the deletion.
    pub fn delete(&self, id: ConfigurationId) -> DomainResult<()> {
        self.store.remove(id)?;
        tracing::info!(configuration_id = %id, "configuration deleted");
        Ok(())
    }
}
