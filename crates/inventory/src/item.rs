use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockforge_core::{DomainError, DomainResult, Entity, ItemId};

/// Whether an item is sold as-is or bought in as a build input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Product,
    Component,
}

/// A stock-keeping item.
///
/// Counter invariant: `0 <= quantity_reserved <= quantity_on_hand` at every
/// observable point. `quantity_available` is derived (`on_hand - reserved`)
/// and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    name: String,
    sku: String,
    barcode: Option<String>,
    kind: ItemKind,
    quantity_on_hand: i64,
    quantity_reserved: i64,
    quantity_on_order: i64,
    reorder_threshold: Option<i64>,
    lead_time_days: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Fields for creating an item. Reserved quantity always starts at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub kind: ItemKind,
    pub quantity_on_hand: i64,
    pub quantity_on_order: i64,
    pub reorder_threshold: Option<i64>,
    pub lead_time_days: Option<i64>,
}

/// Partial update. `None` leaves the field untouched; the nested `Option`s
/// cannot clear a value from this struct alone (matching the original API,
/// which never unset barcode/threshold fields).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub kind: Option<ItemKind>,
    pub quantity_on_hand: Option<i64>,
    pub quantity_on_order: Option<i64>,
    pub reorder_threshold: Option<i64>,
    pub lead_time_days: Option<i64>,
}

impl Item {
    pub fn create(id: ItemId, draft: ItemDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        if draft.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if draft.sku.trim().is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if draft.quantity_on_hand < 0 {
            return Err(DomainError::validation("quantity_on_hand cannot be negative"));
        }
        if draft.quantity_on_order < 0 {
            return Err(DomainError::validation("quantity_on_order cannot be negative"));
        }

        Ok(Self {
            id,
            name: draft.name,
            sku: draft.sku,
            barcode: draft.barcode,
            kind: draft.kind,
            quantity_on_hand: draft.quantity_on_hand,
            quantity_reserved: 0,
            quantity_on_order: draft.quantity_on_order,
            reorder_threshold: draft.reorder_threshold,
            lead_time_days: draft.lead_time_days,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn barcode(&self) -> Option<&str> {
        self.barcode.as_deref()
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn quantity_on_hand(&self) -> i64 {
        self.quantity_on_hand
    }

    pub fn quantity_reserved(&self) -> i64 {
        self.quantity_reserved
    }

    pub fn quantity_on_order(&self) -> i64 {
        self.quantity_on_order
    }

    pub fn reorder_threshold(&self) -> Option<i64> {
        self.reorder_threshold
    }

    pub fn lead_time_days(&self) -> Option<i64> {
        self.lead_time_days
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// On-hand stock minus currently reserved stock; the true orderable quantity.
    pub fn quantity_available(&self) -> i64 {
        self.quantity_on_hand - self.quantity_reserved
    }

    /// Place a soft hold on `qty` units.
    ///
    /// Fails with `InsufficientStock` when `qty` exceeds current availability,
    /// so `reserved` can never climb past `on_hand`.
    pub fn reserve(&mut self, qty: i64, now: DateTime<Utc>) -> DomainResult<()> {
        if qty < 0 {
            return Err(DomainError::validation("reserve quantity cannot be negative"));
        }
        let available = self.quantity_available();
        if qty > available {
            return Err(DomainError::insufficient_stock(self.id, qty, available));
        }
        self.quantity_reserved += qty;
        self.updated_at = now;
        Ok(())
    }

    /// Return `qty` reserved units to the available pool.
    ///
    /// Releasing more than is reserved is a caller bug, not bad user input.
    pub fn release(&mut self, qty: i64, now: DateTime<Utc>) -> DomainResult<()> {
        if qty < 0 {
            return Err(DomainError::validation("release quantity cannot be negative"));
        }
        if qty > self.quantity_reserved {
            return Err(DomainError::invariant(format!(
                "release of {qty} would drive reserved below zero for item {}",
                self.id
            )));
        }
        self.quantity_reserved -= qty;
        self.updated_at = now;
        Ok(())
    }

    /// Convert `qty` reserved units into a permanent stock reduction.
    pub fn consume(&mut self, qty: i64, now: DateTime<Utc>) -> DomainResult<()> {
        if qty < 0 {
            return Err(DomainError::validation("consume quantity cannot be negative"));
        }
        if qty > self.quantity_reserved {
            return Err(DomainError::invariant(format!(
                "consume of {qty} would drive reserved below zero for item {}",
                self.id
            )));
        }
        if qty > self.quantity_on_hand {
            return Err(DomainError::invariant(format!(
                "consume of {qty} would drive on_hand below zero for item {}",
                self.id
            )));
        }
        self.quantity_on_hand -= qty;
        self.quantity_reserved -= qty;
        self.updated_at = now;
        Ok(())
    }

    /// Apply a partial update. Returns the on-hand delta (for the transaction
    /// log); SKU uniqueness is enforced by the ledger, not here.
    pub fn apply_patch(&mut self, patch: ItemPatch, now: DateTime<Utc>) -> DomainResult<i64> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }
        if let Some(sku) = &patch.sku {
            if sku.trim().is_empty() {
                return Err(DomainError::validation("sku cannot be empty"));
            }
        }
        if let Some(on_hand) = patch.quantity_on_hand {
            if on_hand < 0 {
                return Err(DomainError::validation("quantity_on_hand cannot be negative"));
            }
            if on_hand < self.quantity_reserved {
                return Err(DomainError::validation(format!(
                    "quantity_on_hand cannot drop below reserved quantity ({})",
                    self.quantity_reserved
                )));
            }
        }
        if let Some(on_order) = patch.quantity_on_order {
            if on_order < 0 {
                return Err(DomainError::validation("quantity_on_order cannot be negative"));
            }
        }

        let mut on_hand_delta = 0;
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(sku) = patch.sku {
            self.sku = sku;
        }
        if let Some(barcode) = patch.barcode {
            self.barcode = Some(barcode);
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(on_hand) = patch.quantity_on_hand {
            on_hand_delta = on_hand - self.quantity_on_hand;
            self.quantity_on_hand = on_hand;
        }
        if let Some(on_order) = patch.quantity_on_order {
            self.quantity_on_order = on_order;
        }
        if let Some(threshold) = patch.reorder_threshold {
            self.reorder_threshold = Some(threshold);
        }
        if let Some(days) = patch.lead_time_days {
            self.lead_time_days = Some(days);
        }
        self.updated_at = now;
        Ok(on_hand_delta)
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
