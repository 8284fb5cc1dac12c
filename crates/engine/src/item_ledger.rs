//! The item ledger: single source of truth for stock counters.
//!
//! Each item lives behind its own `Mutex`, so mutations on one item are
//! linearizable without serializing unrelated items. Multi-item operations
//! lock the touched rows in sorted-id order (deadlock-free) and validate
//! every line before committing any of them, so a partial reservation is
//! never observable.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};

use stockforge_core::{AssemblyId, DomainError, DomainResult, ItemId};
use stockforge_inventory::{Item, ItemPatch, StockTransaction, TransactionKind};

struct Rows {
    items: HashMap<ItemId, Arc<Mutex<Item>>>,
    /// SKU -> item, enforcing uniqueness without locking every row.
    sku_index: HashMap<String, ItemId>,
}

/// In-memory transactional store for item rows plus the movement journal.
pub struct ItemLedger {
    rows: RwLock<Rows>,
    journal: Mutex<Vec<StockTransaction>>,
}

impl ItemLedger {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Rows {
                items: HashMap::new(),
                sku_index: HashMap::new(),
            }),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Insert a freshly created item, enforcing SKU uniqueness.
    pub fn insert(&self, item: Item) -> DomainResult<()> {
        let mut rows = self.rows.write().unwrap();
        let sku = item.sku().to_string();
        if rows.sku_index.contains_key(&sku) {
            return Err(DomainError::duplicate_sku(sku));
        }

        let id = item.id_typed();
        let initial = item.quantity_on_hand();
        let now = item.created_at();
        rows.sku_index.insert(sku, id);
        rows.items.insert(id, Arc::new(Mutex::new(item)));
        drop(rows);

        if initial > 0 {
            self.record(StockTransaction::new(
                id,
                initial,
                TransactionKind::Receipt,
                None,
                now,
            ));
        }
        Ok(())
    }

    /// Snapshot of one item.
    pub fn get(&self, id: ItemId) -> Option<Item> {
        let rows = self.rows.read().unwrap();
        rows.items.get(&id).map(|row| row.lock().unwrap().clone())
    }

    /// Snapshot of all items, oldest first.
    pub fn list(&self) -> Vec<Item> {
        let rows = self.rows.read().unwrap();
        let mut items: Vec<Item> = rows
            .items
            .values()
            .map(|row| row.lock().unwrap().clone())
            .collect();
        items.sort_by_key(|i| (i.created_at(), i.id_typed()));
        items
    }

    /// Apply a partial update, re-checking SKU uniqueness on change.
    pub fn update(&self, id: ItemId, patch: ItemPatch, now: DateTime<Utc>) -> DomainResult<Item> {
        // Map-level write lock: the SKU index and the row must move together.
        let mut rows = self.rows.write().unwrap();

        if let Some(new_sku) = &patch.sku {
            if let Some(owner) = rows.sku_index.get(new_sku) {
                if *owner != id {
                    return Err(DomainError::duplicate_sku(new_sku.clone()));
                }
            }
        }

        let row = rows
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("item {id}")))?;
        let mut item = row.lock().unwrap();
        let old_sku = item.sku().to_string();
        let on_hand_delta = item.apply_patch(patch, now)?;
        let new_sku = item.sku().to_string();
        let snapshot = item.clone();
        drop(item);

        if new_sku != old_sku {
            rows.sku_index.remove(&old_sku);
            rows.sku_index.insert(new_sku, id);
        }
        drop(rows);

        if on_hand_delta != 0 {
            self.record(StockTransaction::new(
                id,
                on_hand_delta,
                TransactionKind::Adjustment,
                None,
                now,
            ));
        }
        Ok(snapshot)
    }

    /// Remove an item row. Referential checks are the caller's job.
    pub fn remove(&self, id: ItemId) -> DomainResult<()> {
        let mut rows = self.rows.write().unwrap();
        let row = rows
            .items
            .remove(&id)
            .ok_or_else(|| DomainError::not_found(format!("item {id}")))?;
        let sku = row.lock().unwrap().sku().to_string();
        rows.sku_index.remove(&sku);
        Ok(())
    }

    /// Pure read of `on_hand - reserved`.
    pub fn availability(&self, id: ItemId) -> DomainResult<i64> {
        let rows = self.rows.read().unwrap();
        let row = rows
            .items
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("item {id}")))?;
        let item = row.lock().unwrap();
        Ok(item.quantity_available())
    }

    /// Reserve every line or none of them.
    ///
    /// Lines naming the same item are summed before validation, so a split
    /// request cannot sneak past the availability check.
    pub fn reserve_lines(
        &self,
        lines: &[(ItemId, i64)],
        assembly_id: AssemblyId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.apply_lines(lines, assembly_id, now, LedgerOp::Reserve)
    }

    /// Release every line (cancellation path).
    pub fn release_lines(
        &self,
        lines: &[(ItemId, i64)],
        assembly_id: AssemblyId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.apply_lines(lines, assembly_id, now, LedgerOp::Release)
    }

    /// Consume every line (completion path).
    pub fn consume_lines(
        &self,
        lines: &[(ItemId, i64)],
        assembly_id: AssemblyId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.apply_lines(lines, assembly_id, now, LedgerOp::Consume)
    }

    /// Movement history for one item, oldest first.
    pub fn transactions_for(&self, id: ItemId) -> Vec<StockTransaction> {
        let journal = self.journal.lock().unwrap();
        journal.iter().filter(|t| t.item_id == id).cloned().collect()
    }

    fn record(&self, transaction: StockTransaction) {
        self.journal.lock().unwrap().push(transaction);
    }

    fn apply_lines(
        &self,
        lines: &[(ItemId, i64)],
        assembly_id: AssemblyId,
        now: DateTime<Utc>,
        op: LedgerOp,
    ) -> DomainResult<()> {
        if lines.is_empty() {
            return Ok(());
        }
        for (_, qty) in lines {
            if *qty < 0 {
                return Err(DomainError::validation("line quantity cannot be negative"));
            }
        }

        // Per-item totals in sorted-id order; BTreeMap gives both at once.
        let mut totals: BTreeMap<ItemId, i64> = BTreeMap::new();
        for (item_id, qty) in lines {
            *totals.entry(*item_id).or_insert(0) += qty;
        }

        // Hold the map read lock for the whole sequence so a concurrent
        // delete cannot orphan a row mid-operation; writers on other items
        // are unaffected.
        let rows = self.rows.read().unwrap();
        let mut handles: Vec<(ItemId, Arc<Mutex<Item>>)> = Vec::with_capacity(totals.len());
        for item_id in totals.keys() {
            let row = rows
                .items
                .get(item_id)
                .cloned()
                .ok_or_else(|| DomainError::not_found(format!("item {item_id}")))?;
            handles.push((*item_id, row));
        }

        // Sorted-id acquisition order keeps concurrent multi-item
        // operations deadlock-free.
        let mut guards: Vec<(ItemId, MutexGuard<'_, Item>)> = Vec::with_capacity(handles.len());
        for (item_id, row) in &handles {
            guards.push((*item_id, row.lock().unwrap()));
        }

        // Validate everything before mutating anything.
        for (item_id, item) in &guards {
            let total = totals[item_id];
            match op {
                LedgerOp::Reserve => {
                    let available = item.quantity_available();
                    if total > available {
                        return Err(DomainError::insufficient_stock(*item_id, total, available));
                    }
                }
                LedgerOp::Release | LedgerOp::Consume => {
                    if total > item.quantity_reserved() {
                        return Err(DomainError::invariant(format!(
                            "{} of {total} exceeds reserved quantity {} for item {item_id}",
                            op.verb(),
                            item.quantity_reserved()
                        )));
                    }
                }
            }
        }

        // Commit. The per-item methods re-check the same bounds; a failure
        // here is a logic defect, not a race, because we still hold every
        // row lock.
        for (item_id, item) in guards.iter_mut() {
            let total = totals[item_id];
            match op {
                LedgerOp::Reserve => item.reserve(total, now)?,
                LedgerOp::Release => item.release(total, now)?,
                LedgerOp::Consume => item.consume(total, now)?,
            }
        }
        drop(guards);
        drop(rows);

        let mut journal = self.journal.lock().unwrap();
        for (item_id, qty) in lines {
            let (kind, change) = match op {
                LedgerOp::Reserve => (TransactionKind::Reservation, *qty),
                LedgerOp::Release => (TransactionKind::Release, -qty),
                LedgerOp::Consume => (TransactionKind::Consumption, -qty),
            };
            journal.push(StockTransaction::new(
                *item_id,
                change,
                kind,
                Some(assembly_id),
                now,
            ));
        }
        Ok(())
    }
}

impl Default for ItemLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LedgerOp {
    Reserve,
    Release,
    Consume,
}

impl LedgerOp {
    fn verb(&self) -> &'static str {
        match self {
            LedgerOp::Reserve => "reserve",
            LedgerOp::Release => "release",
            LedgerOp::Consume => "consume",
        }
    }
}
