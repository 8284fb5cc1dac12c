//! Item operations: CRUD plus the movement history.

use std::sync::Arc;

use chrono::Utc;

use stockforge_core::{DomainError, DomainResult, ItemId};
use stockforge_inventory::{Item, ItemDraft, ItemPatch, StockTransaction};

use crate::item_ledger::ItemLedger;
use crate::stores::{AssemblyStore, ConfigurationStore};

/// Item CRUD against the ledger, with referential checks against the
/// catalog and assembly stores on delete.
pub struct ItemsService {
    ledger: Arc<ItemLedger>,
    configurations: Arc<ConfigurationStore>,
    assemblies: Arc<AssemblyStore>,
}

impl ItemsService {
    pub fn new(
        ledger: Arc<ItemLedger>,
        configurations: Arc<ConfigurationStore>,
        assemblies: Arc<AssemblyStore>,
    ) -> Self {
        Self {
            ledger,
            configurations,
            assemblies,
        }
    }

    pub fn create(&self, draft: ItemDraft) -> DomainResult<Item> {
        let id = ItemId::new();
        let item = Item::create(id, draft, Utc::now())?;
        self.ledger.insert(item.clone())?;
        tracing::info!(item_id = %id, sku = item.sku(), "item created");
        Ok(item)
    }

    pub fn get(&self, id: ItemId) -> DomainResult<Item> {
        self.ledger
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("item {id}")))
    }

    pub fn list(&self) -> Vec<Item> {
        self.ledger.list()
    }

    pub fn update(&self, id: ItemId, patch: ItemPatch) -> DomainResult<Item> {
        let item = self.ledger.update(id, patch, Utc::now())?;
        tracing::info!(item_id = %id, "item updated");
        Ok(item)
    }

    /// Delete an item that nothing references.
    ///
    /// The engine refuses while a configuration line or a non-terminal
    /// assembly still points at the item; the caller decides what to do
    /// about the references. Both store locks are held across the checks
    /// and the removal, so a concurrent assembly creation or component add
    /// cannot slip in between.
    pub fn delete(&self, id: ItemId) -> DomainResult<()> {
        let configurations = self.configurations.lock_exclusive();
        let assemblies = self.assemblies.lock_exclusive();
        if configurations.references_item(id) {
            return Err(DomainError::validation(format!(
                "item {id} is referenced by a configuration component"
            )));
        }
        if assemblies.any_active_references_item(id) {
            return Err(DomainError::validation(format!(
                "item {id} is reserved by an active assembly"
            )));
        }
        self.ledger.remove(id)?;
        drop(assemblies);
        drop(configurations);
        tracing::info!(item_id = %id, "item deleted");
        Ok(())
    }

    pub fn transactions(&self, id: ItemId) -> DomainResult<Vec<StockTransaction>> {
        // Surface NotFound for unknown items rather than an empty history.
        self.get(id)?;
        Ok(self.ledger.transactions_for(id))
    }
}
