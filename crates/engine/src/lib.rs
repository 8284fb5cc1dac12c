//! Orchestration layer: the item ledger, the in-memory stores, and the
//! services the HTTP layer talks to.
//!
//! The domain crates hold the rules; this crate holds the locking discipline
//! that keeps them true under concurrent callers. Every mutating sequence
//! (create, complete, cancel) runs as one atomic unit against exactly the
//! item rows it touches.

pub mod assemblies;
pub mod capacity;
pub mod configurations;
pub mod item_ledger;
pub mod items;
pub mod stores;

pub use assemblies::{AssembliesService, NewAssembly, NewAssemblyComponent};
pub use capacity::{BuildCapacity, CapacityService};
pub use configurations::{ConfigurationsService, NewConfiguration};
pub use item_ledger::ItemLedger;
pub use items::ItemsService;
pub use stores::{AssemblyStore, ConfigurationStore};
