use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockforge_core::{AssemblyId, ItemId, TransactionId};

/// Why a stock counter moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Initial stock entry at item creation.
    Receipt,
    /// Direct on-hand correction via item update.
    Adjustment,
    /// Soft hold placed by an assembly.
    Reservation,
    /// Hold returned by a cancelled assembly.
    Release,
    /// Reserved stock consumed by a completed assembly.
    Consumption,
}

/// One entry in the simple per-item transaction ledger.
///
/// Advisory history only; the counters on `Item` are the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: TransactionId,
    pub item_id: ItemId,
    /// Signed change as seen by the caller: receipts/adjustments move
    /// on-hand, reservations/releases move the soft hold, consumptions move
    /// both. Reservations are recorded positive, releases negative.
    pub quantity_change: i64,
    pub kind: TransactionKind,
    /// Assembly that caused the movement, when there is one.
    pub assembly_id: Option<AssemblyId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockTransaction {
    pub fn new(
        item_id: ItemId,
        quantity_change: i64,
        kind: TransactionKind,
        assembly_id: Option<AssemblyId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            item_id,
            quantity_change,
            kind,
            assembly_id,
            notes: None,
            created_at: now,
        }
    }
}
