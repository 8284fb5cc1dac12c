//! Assembly domain module.
//!
//! An assembly is a work order that reserves components, tracks one build
//! through completion, and records shipment. This crate holds the closed
//! status enum and its transition rules; the stock effects of each
//! transition are orchestrated by the engine crate against the item ledger.

pub mod assembly;

pub use assembly::{Assembly, AssemblyComponent, AssemblyPatch, AssemblyStatus};
