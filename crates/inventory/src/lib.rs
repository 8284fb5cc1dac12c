//! Inventory domain module.
//!
//! This crate contains the business rules for stock-keeping items: the three
//! stock counters, derived availability, and the reserve/release/consume
//! discipline. Pure domain logic only — no IO, no HTTP, no storage.

pub mod item;
pub mod transaction;

pub use item::{Item, ItemDraft, ItemKind, ItemPatch};
pub use transaction::{StockTransaction, TransactionKind};
