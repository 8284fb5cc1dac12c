//! Assembly lifecycle operations.
//!
//! Each transition runs as one atomic unit: the status guard, the ledger
//! effect, and the status change all happen inside the assembly store's
//! update closure, with the touched item rows locked for the ledger step.

use std::sync::Arc;

use chrono::Utc;

use stockforge_assembly::{Assembly, AssemblyComponent, AssemblyPatch, AssemblyStatus};
use stockforge_core::{AssemblyId, ConfigurationId, DomainError, DomainResult, ItemId};

use crate::item_ledger::ItemLedger;
use crate::stores::{AssemblyStore, ConfigurationStore};

/// One requested component line.
#[derive(Debug, Clone, Copy)]
pub struct NewAssemblyComponent {
    pub item_id: ItemId,
    pub quantity: i64,
}

/// Fields for creating an assembly.
///
/// An explicit component list wins; otherwise the referenced configuration's
/// bill of materials is snapshotted. Neither is required — an empty work
/// order is legal and reserves nothing.
#[derive(Debug, Clone, Default)]
pub struct NewAssembly {
    pub configuration_id: Option<ConfigurationId>,
    pub order_reference: Option<String>,
    pub notes: Option<String>,
    pub components: Vec<NewAssemblyComponent>,
}

pub struct AssembliesService {
    ledger: Arc<ItemLedger>,
    configurations: Arc<ConfigurationStore>,
    store: Arc<AssemblyStore>,
}

impl AssembliesService {
    pub fn new(
        ledger: Arc<ItemLedger>,
        configurations: Arc<ConfigurationStore>,
        store: Arc<AssemblyStore>,
    ) -> Self {
        Self {
            ledger,
            configurations,
            store,
        }
    }

    /// Create an assembly in `reserved`, holding stock for every line.
    ///
    /// Validation and reservation of all lines happen atomically in the
    /// ledger: either every line is held or the error leaves no trace.
    pub fn create(&self, new: NewAssembly) -> DomainResult<Assembly> {
        let now = Utc::now();

        let components: Vec<AssemblyComponent> = if !new.components.is_empty() {
            new.components
                .iter()
                .map(|c| AssemblyComponent::new(c.item_id, c.quantity))
                .collect()
        } else if let Some(configuration_id) = new.configuration_id {
            let config = self.configurations.get(configuration_id).ok_or_else(|| {
                DomainError::not_found(format!("configuration {configuration_id}"))
            })?;
            AssemblyComponent::snapshot_bom(&config)
        } else {
            Vec::new()
        };

        let assembly = Assembly::create(
            AssemblyId::new(),
            new.configuration_id,
            new.order_reference,
            new.notes,
            components,
            now,
        )?;

        // Reservation and visibility are one atomic step under the store's
        // write lock, so an item-deletion check can never run between them.
        let lines = line_quantities(&assembly);
        let mut assemblies = self.store.lock_exclusive();
        self.ledger.reserve_lines(&lines, assembly.id_typed(), now)?;
        let snapshot = assembly.clone();
        assemblies.insert(assembly);
        drop(assemblies);

        tracing::info!(
            assembly_id = %snapshot.id_typed(),
            lines = snapshot.components().len(),
            "assembly created, stock reserved"
        );
        Ok(snapshot)
    }

    pub fn get(&self, id: AssemblyId) -> DomainResult<Assembly> {
        self.store
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("assembly {id}")))
    }

    pub fn list(&self, status: Option<AssemblyStatus>) -> Vec<Assembly> {
        self.store.list(status)
    }

    /// Edit reference/notes. No ledger effect, legal in any stored state.
    pub fn update(&self, id: AssemblyId, patch: AssemblyPatch) -> DomainResult<Assembly> {
        self.store.update(id, |assembly| {
            assembly.apply_patch(patch);
            Ok(assembly.clone())
        })
    }

    /// `reserved -> building`.
    pub fn start(&self, id: AssemblyId) -> DomainResult<Assembly> {
        self.store.update(id, |assembly| {
            assembly.start()?;
            Ok(assembly.clone())
        })
    }

    /// `reserved|building -> completed`: consume every line, then flip the
    /// status. The guard runs first so a terminal assembly never touches
    /// the ledger.
    pub fn complete(&self, id: AssemblyId) -> DomainResult<Assembly> {
        let now = Utc::now();
        let ledger = self.ledger.clone();
        self.store.update(id, |assembly| {
            if !assembly.status().holds_reservation() {
                return Err(DomainError::invalid_transition(
                    assembly.status().as_str(),
                    "complete",
                ));
            }
            ledger.consume_lines(&line_quantities(assembly), id, now)?;
            assembly.complete(now)?;
            tracing::info!(assembly_id = %id, "assembly completed, stock consumed");
            Ok(assembly.clone())
        })
    }

    /// `completed -> shipped`: timestamp only.
    pub fn ship(&self, id: AssemblyId) -> DomainResult<Assembly> {
        let now = Utc::now();
        self.store.update(id, |assembly| {
            assembly.ship(now)?;
            Ok(assembly.clone())
        })
    }

    /// `reserved|building -> cancelled`: release every line.
    pub fn cancel(&self, id: AssemblyId) -> DomainResult<Assembly> {
        let now = Utc::now();
        let ledger = self.ledger.clone();
        self.store.update(id, |assembly| {
            if !assembly.status().holds_reservation() {
                return Err(DomainError::invalid_transition(
                    assembly.status().as_str(),
                    "cancel",
                ));
            }
            ledger.release_lines(&line_quantities(assembly), id, now)?;
            assembly.cancel()?;
            tracing::info!(assembly_id = %id, "assembly cancelled, stock released");
            Ok(assembly.clone())
        })
    }

    /// Remove a terminal assembly together with its component lines.
    pub fn delete(&self, id: AssemblyId) -> DomainResult<()> {
        self.store.remove_if(id, |assembly| assembly.ensure_deletable())?;
        tracing::info!(assembly_id = %id, "assembly deleted");
        Ok(())
    }
}

fn line_quantities(assembly: &Assembly) -> Vec<(ItemId, i64)> {
    assembly
        .components()
        .iter()
        .map(|c| (c.item_id, c.quantity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockforge_catalog::Configuration;
    use stockforge_inventory::{Item, ItemDraft, ItemKind};

    struct Fixture {
        ledger: Arc<ItemLedger>,
        configurations: Arc<ConfigurationStore>,
        service: AssembliesService,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(ItemLedger::new());
        let configurations = Arc::new(ConfigurationStore::new());
        let store = Arc::new(AssemblyStore::new());
        let service = AssembliesService::new(ledger.clone(), configurations.clone(), store);
        Fixture {
            ledger,
            configurations,
            service,
        }
    }

    fn add_item(fixture: &Fixture, sku: &str, on_hand: i64) -> ItemId {
        let id = ItemId::new();
        let item = Item::create(
            id,
            ItemDraft {
                name: format!("Item {sku}"),
                sku: sku.to_string(),
                barcode: None,
                kind: ItemKind::Component,
                quantity_on_hand: on_hand,
                quantity_on_order: 0,
                reorder_threshold: None,
                lead_time_days: None,
            },
            Utc::now(),
        )
        .unwrap();
        fixture.ledger.insert(item).unwrap();
        id
    }

    fn add_configuration(fixture: &Fixture, lines: &[(ItemId, i64)]) -> ConfigurationId {
        let mut config = Configuration::create(
            ConfigurationId::new(),
            "Test build".to_string(),
            None,
            Utc::now(),
        )
        .unwrap();
        for (item, qty) in lines {
            config.upsert_component(*item, *qty).unwrap();
        }
        let id = config.id_typed();
        fixture.configurations.insert(config);
        id
    }

    #[test]
    fn create_from_configuration_reserves_the_bom() {
        let fx = fixture();
        let item = add_item(&fx, "A", 10);
        let config = add_configuration(&fx, &[(item, 3)]);

        let assembly = fx
            .service
            .create(NewAssembly {
                configuration_id: Some(config),
                ..NewAssembly::default()
            })
            .unwrap();

        assert_eq!(assembly.status(), AssemblyStatus::Reserved);
        assert_eq!(assembly.components().len(), 1);
        let stock = fx.ledger.get(item).unwrap();
        assert_eq!(stock.quantity_reserved(), 3);
        assert_eq!(stock.quantity_available(), 7);
    }

    #[test]
    fn explicit_components_win_over_the_configuration() {
        let fx = fixture();
        let bom_item = add_item(&fx, "A", 10);
        let other_item = add_item(&fx, "B", 10);
        let config = add_configuration(&fx, &[(bom_item, 3)]);

        let assembly = fx
            .service
            .create(NewAssembly {
                configuration_id: Some(config),
                components: vec![NewAssemblyComponent {
                    item_id: other_item,
                    quantity: 1,
                }],
                ..NewAssembly::default()
            })
            .unwrap();

        assert_eq!(assembly.components()[0].item_id, other_item);
        assert_eq!(fx.ledger.get(bom_item).unwrap().quantity_reserved(), 0);
        assert_eq!(fx.ledger.get(other_item).unwrap().quantity_reserved(), 1);
    }

    #[test]
    fn create_with_insufficient_stock_reserves_nothing() {
        let fx = fixture();
        let plenty = add_item(&fx, "A", 10);
        let scarce = add_item(&fx, "B", 1);

        let err = fx
            .service
            .create(NewAssembly {
                components: vec![
                    NewAssemblyComponent {
                        item_id: plenty,
                        quantity: 2,
                    },
                    NewAssemblyComponent {
                        item_id: scarce,
                        quantity: 2,
                    },
                ],
                ..NewAssembly::default()
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::InsufficientStock { .. }));
        assert_eq!(fx.ledger.get(plenty).unwrap().quantity_reserved(), 0);
        assert_eq!(fx.ledger.get(scarce).unwrap().quantity_reserved(), 0);
        assert!(fx.service.list(None).is_empty());
    }

    #[test]
    fn create_cancel_round_trip_restores_availability() {
        let fx = fixture();
        let item = add_item(&fx, "A", 10);
        let config = add_configuration(&fx, &[(item, 3)]);

        let assembly = fx
            .service
            .create(NewAssembly {
                configuration_id: Some(config),
                ..NewAssembly::default()
            })
            .unwrap();
        assert_eq!(fx.ledger.get(item).unwrap().quantity_available(), 7);

        let cancelled = fx.service.cancel(assembly.id_typed()).unwrap();
        assert_eq!(cancelled.status(), AssemblyStatus::Cancelled);
        let stock = fx.ledger.get(item).unwrap();
        assert_eq!(stock.quantity_reserved(), 0);
        assert_eq!(stock.quantity_available(), 10);
    }

    #[test]
    fn complete_consumes_lines_and_stamps_the_time() {
        let fx = fixture();
        let a = add_item(&fx, "A", 10);
        let b = add_item(&fx, "B", 4);

        let assembly = fx
            .service
            .create(NewAssembly {
                components: vec![
                    NewAssemblyComponent { item_id: a, quantity: 2 },
                    NewAssemblyComponent { item_id: b, quantity: 1 },
                ],
                ..NewAssembly::default()
            })
            .unwrap();

        let completed = fx.service.complete(assembly.id_typed()).unwrap();
        assert_eq!(completed.status(), AssemblyStatus::Completed);
        assert!(completed.completed_at().is_some());

        let stock_a = fx.ledger.get(a).unwrap();
        assert_eq!(stock_a.quantity_on_hand(), 8);
        assert_eq!(stock_a.quantity_reserved(), 0);
        let stock_b = fx.ledger.get(b).unwrap();
        assert_eq!(stock_b.quantity_on_hand(), 3);
        assert_eq!(stock_b.quantity_reserved(), 0);
    }

    #[test]
    fn complete_is_legal_from_building() {
        let fx = fixture();
        let item = add_item(&fx, "A", 5);
        let assembly = fx
            .service
            .create(NewAssembly {
                components: vec![NewAssemblyComponent { item_id: item, quantity: 1 }],
                ..NewAssembly::default()
            })
            .unwrap();

        fx.service.start(assembly.id_typed()).unwrap();
        let completed = fx.service.complete(assembly.id_typed()).unwrap();
        assert_eq!(completed.status(), AssemblyStatus::Completed);
    }

    #[test]
    fn ship_then_ship_again_fails() {
        let fx = fixture();
        let item = add_item(&fx, "A", 5);
        let assembly = fx
            .service
            .create(NewAssembly {
                components: vec![NewAssemblyComponent { item_id: item, quantity: 1 }],
                ..NewAssembly::default()
            })
            .unwrap();
        let id = assembly.id_typed();

        fx.service.complete(id).unwrap();
        let shipped = fx.service.ship(id).unwrap();
        assert_eq!(shipped.status(), AssemblyStatus::Shipped);
        assert!(shipped.shipped_at().is_some());

        let err = fx.service.ship(id).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn cancel_twice_fails_and_releases_once() {
        let fx = fixture();
        let item = add_item(&fx, "A", 5);
        let assembly = fx
            .service
            .create(NewAssembly {
                components: vec![NewAssemblyComponent { item_id: item, quantity: 2 }],
                ..NewAssembly::default()
            })
            .unwrap();
        let id = assembly.id_typed();

        fx.service.cancel(id).unwrap();
        let err = fx.service.cancel(id).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        // A failed second cancel must not release anything further.
        assert_eq!(fx.ledger.get(item).unwrap().quantity_reserved(), 0);
        assert_eq!(fx.ledger.get(item).unwrap().quantity_available(), 5);
    }

    #[test]
    fn delete_is_refused_until_terminal() {
        let fx = fixture();
        let item = add_item(&fx, "A", 5);
        let assembly = fx
            .service
            .create(NewAssembly {
                components: vec![NewAssemblyComponent { item_id: item, quantity: 1 }],
                ..NewAssembly::default()
            })
            .unwrap();
        let id = assembly.id_typed();

        let err = fx.service.delete(id).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));

        fx.service.cancel(id).unwrap();
        fx.service.delete(id).unwrap();
        assert!(matches!(fx.service.get(id), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn update_notes_never_touches_the_ledger() {
        let fx = fixture();
        let item = add_item(&fx, "A", 5);
        let assembly = fx
            .service
            .create(NewAssembly {
                components: vec![NewAssemblyComponent { item_id: item, quantity: 2 }],
                ..NewAssembly::default()
            })
            .unwrap();

        let updated = fx
            .service
            .update(
                assembly.id_typed(),
                AssemblyPatch {
                    order_reference: Some("SO-77".to_string()),
                    notes: Some("rush order".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.order_reference(), Some("SO-77"));
        assert_eq!(fx.ledger.get(item).unwrap().quantity_reserved(), 2);
    }

    #[test]
    fn list_filters_by_status() {
        let fx = fixture();
        let item = add_item(&fx, "A", 10);
        let first = fx
            .service
            .create(NewAssembly {
                components: vec![NewAssemblyComponent { item_id: item, quantity: 1 }],
                ..NewAssembly::default()
            })
            .unwrap();
        fx.service
            .create(NewAssembly {
                components: vec![NewAssemblyComponent { item_id: item, quantity: 1 }],
                ..NewAssembly::default()
            })
            .unwrap();
        fx.service.cancel(first.id_typed()).unwrap();

        assert_eq!(fx.service.list(None).len(), 2);
        assert_eq!(fx.service.list(Some(AssemblyStatus::Reserved)).len(), 1);
        assert_eq!(fx.service.list(Some(AssemblyStatus::Cancelled)).len(), 1);
        assert!(fx.service.list(Some(AssemblyStatus::Shipped)).is_empty());
    }

    #[test]
    fn concurrent_creates_against_shared_stock_admit_exactly_one() {
        let fx = fixture();
        let item = add_item(&fx, "A", 5);
        let service = Arc::new(fx.service);

        let mut workers = Vec::new();
        for _ in 0..2 {
            let service = service.clone();
            workers.push(std::thread::spawn(move || {
                service.create(NewAssembly {
                    components: vec![NewAssemblyComponent { item_id: item, quantity: 3 }],
                    ..NewAssembly::default()
                })
            }));
        }
        let results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let shortfalls = results
            .iter()
            .filter(|r| matches!(r, Err(DomainError::InsufficientStock { .. })))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(shortfalls, 1);

        let stock = fx.ledger.get(item).unwrap();
        assert_eq!(stock.quantity_reserved(), 3);
        assert!(stock.quantity_reserved() <= stock.quantity_on_hand());
    }

    #[test]
    fn later_configuration_edits_do_not_reach_existing_assemblies() {
        let fx = fixture();
        let item = add_item(&fx, "A", 10);
        let config = add_configuration(&fx, &[(item, 2)]);

        let assembly = fx
            .service
            .create(NewAssembly {
                configuration_id: Some(config),
                ..NewAssembly::default()
            })
            .unwrap();

        // Edit the BOM after the fact; the snapshot must not move.
        fx.configurations
            .update(config, |c| c.upsert_component(item, 9))
            .unwrap();

        let stored = fx.service.get(assembly.id_typed()).unwrap();
        assert_eq!(stored.components()[0].quantity, 2);

        // Cancellation releases the snapshotted 2, not the edited 9.
        fx.service.cancel(assembly.id_typed()).unwrap();
        assert_eq!(fx.ledger.get(item).unwrap().quantity_reserved(), 0);
    }
}
