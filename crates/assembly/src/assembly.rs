use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockforge_catalog::Configuration;
use stockforge_core::{
    AssemblyId, ComponentLineId, ConfigurationId, DomainError, DomainResult, Entity, ItemId,
};

/// Assembly lifecycle.
///
/// `reserved -> building -> completed -> shipped`, with `cancelled`
/// reachable from `reserved` or `building`. Deletion is only legal from the
/// three terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyStatus {
    Reserved,
    Building,
    Completed,
    Shipped,
    Cancelled,
}

impl AssemblyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssemblyStatus::Reserved => "reserved",
            AssemblyStatus::Building => "building",
            AssemblyStatus::Completed => "completed",
            AssemblyStatus::Shipped => "shipped",
            AssemblyStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "reserved" => Ok(AssemblyStatus::Reserved),
            "building" => Ok(AssemblyStatus::Building),
            "completed" => Ok(AssemblyStatus::Completed),
            "shipped" => Ok(AssemblyStatus::Shipped),
            "cancelled" => Ok(AssemblyStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown assembly status '{other}'"
            ))),
        }
    }

    /// Whether this assembly still holds reservations against the ledger.
    pub fn holds_reservation(&self) -> bool {
        matches!(self, AssemblyStatus::Reserved | AssemblyStatus::Building)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AssemblyStatus::Completed | AssemblyStatus::Shipped | AssemblyStatus::Cancelled
        )
    }
}

impl core::fmt::Display for AssemblyStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reserved line: an item and the quantity this build holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyComponent {
    pub id: ComponentLineId,
    pub item_id: ItemId,
    pub quantity: i64,
}

impl AssemblyComponent {
    pub fn new(item_id: ItemId, quantity: i64) -> Self {
        Self {
            id: ComponentLineId::new(),
            item_id,
            quantity,
        }
    }

    /// Snapshot a configuration's bill of materials as assembly lines.
    ///
    /// The copy is taken once at creation; later configuration edits never
    /// reach back into existing assemblies.
    pub fn snapshot_bom(config: &Configuration) -> Vec<Self> {
        config
            .components()
            .iter()
            .map(|line| Self::new(line.item_id, line.quantity))
            .collect()
    }
}

/// A work order that reserves, consumes, and tracks one build to shipment.
///
/// Owns its component lines (removed together with the assembly). The lines
/// are value snapshots, not references into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assembly {
    id: AssemblyId,
    configuration_id: Option<ConfigurationId>,
    order_reference: Option<String>,
    status: AssemblyStatus,
    notes: Option<String>,
    components: Vec<AssemblyComponent>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
}

/// Partial update for reference/notes; legal in any stored state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyPatch {
    pub order_reference: Option<String>,
    pub notes: Option<String>,
}

impl Assembly {
    /// Create an assembly with its reservation lines already resolved.
    ///
    /// The caller (engine) validates and reserves stock before this is
    /// stored; the assembly itself is born in `reserved`.
    pub fn create(
        id: AssemblyId,
        configuration_id: Option<ConfigurationId>,
        order_reference: Option<String>,
        notes: Option<String>,
        components: Vec<AssemblyComponent>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        for line in &components {
            if line.quantity < 0 {
                return Err(DomainError::validation("component quantity cannot be negative"));
            }
        }
        Ok(Self {
            id,
            configuration_id,
            order_reference,
            status: AssemblyStatus::Reserved,
            notes,
            components,
            created_at: now,
            completed_at: None,
            shipped_at: None,
        })
    }

    pub fn id_typed(&self) -> AssemblyId {
        self.id
    }

    pub fn configuration_id(&self) -> Option<ConfigurationId> {
        self.configuration_id
    }

    pub fn order_reference(&self) -> Option<&str> {
        self.order_reference.as_deref()
    }

    pub fn status(&self) -> AssemblyStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn components(&self) -> &[AssemblyComponent] {
        &self.components
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn references_item(&self, item_id: ItemId) -> bool {
        self.components.iter().any(|c| c.item_id == item_id)
    }

    fn guard(&self, allowed: &[AssemblyStatus], action: &str) -> DomainResult<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(DomainError::invalid_transition(self.status.as_str(), action))
        }
    }

    /// `reserved -> building`. Pure status transition, no ledger effect.
    pub fn start(&mut self) -> DomainResult<()> {
        self.guard(&[AssemblyStatus::Reserved], "start")?;
        self.status = AssemblyStatus::Building;
        Ok(())
    }

    /// `reserved|building -> completed`. The engine consumes each line
    /// before recording this transition.
    pub fn complete(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.guard(&[AssemblyStatus::Reserved, AssemblyStatus::Building], "complete")?;
        self.status = AssemblyStatus::Completed;
        self.completed_at = Some(now);
        Ok(())
    }

    /// `completed -> shipped`. Timestamp only; stock was consumed at completion.
    pub fn ship(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.guard(&[AssemblyStatus::Completed], "ship")?;
        self.status = AssemblyStatus::Shipped;
        self.shipped_at = Some(now);
        Ok(())
    }

    /// `reserved|building -> cancelled`. The engine releases each line.
    pub fn cancel(&mut self) -> DomainResult<()> {
        self.guard(
            &[AssemblyStatus::Reserved, AssemblyStatus::Building],
            "cancel",
        )?;
        self.status = AssemblyStatus::Cancelled;
        Ok(())
    }

    /// Deletion is only legal once the assembly no longer holds reservations.
    pub fn ensure_deletable(&self) -> DomainResult<()> {
        self.guard(
            &[
                AssemblyStatus::Cancelled,
                AssemblyStatus::Completed,
                AssemblyStatus::Shipped,
            ],
            "delete",
        )
    }

    /// Edit reference/notes. Never touches the ledger, legal in any state.
    pub fn apply_patch(&mut self, patch: AssemblyPatch) {
        if let Some(order_reference) = patch.order_reference {
            self.order_reference = Some(order_reference);
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
    }
}

impl Entity for Assembly {
    type Id = AssemblyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn reserved_assembly() -> Assembly {
        Assembly::create(
            AssemblyId::new(),
            None,
            None,
            Some("bench build".to_string()),
            vec![AssemblyComponent::new(ItemId::new(), 2)],
            test_time(),
        )
        .unwrap()
    }

    #[test]
    fn create_starts_reserved_without_timestamps() {
        let assembly = reserved_assembly();
        assert_eq!(assembly.status(), AssemblyStatus::Reserved);
        assert!(assembly.completed_at().is_none());
        assert!(assembly.shipped_at().is_none());
    }

    #[test]
    fn start_moves_reserved_to_building() {
        let mut assembly = reserved_assembly();
        assembly.start().unwrap();
        assert_eq!(assembly.status(), AssemblyStatus::Building);
    }

    #[test]
    fn start_from_building_is_invalid() {
        let mut assembly = reserved_assembly();
        assembly.start().unwrap();
        let err = assembly.start().unwrap_err();
        match err {
            DomainError::InvalidTransition { current, action } => {
                assert_eq!(current, "building");
                assert_eq!(action, "start");
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }

    #[test]
    fn complete_is_legal_from_reserved_and_building() {
        let mut from_reserved = reserved_assembly();
        from_reserved.complete(test_time()).unwrap();
        assert_eq!(from_reserved.status(), AssemblyStatus::Completed);
        assert!(from_reserved.completed_at().is_some());

        let mut from_building = reserved_assembly();
        from_building.start().unwrap();
        from_building.complete(test_time()).unwrap();
        assert_eq!(from_building.status(), AssemblyStatus::Completed);
    }

    #[test]
    fn ship_only_from_completed_and_only_once() {
        let mut assembly = reserved_assembly();
        let err = assembly.ship(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));

        assembly.complete(test_time()).unwrap();
        assembly.ship(test_time()).unwrap();
        assert_eq!(assembly.status(), AssemblyStatus::Shipped);
        assert!(assembly.shipped_at().is_some());

        // Second ship reports the shipped status, not a silent no-op.
        let err = assembly.ship(test_time()).unwrap_err();
        match err {
            DomainError::InvalidTransition { current, action } => {
                assert_eq!(current, "shipped");
                assert_eq!(action, "ship");
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }

    #[test]
    fn cancel_of_cancelled_is_invalid_not_a_noop() {
        let mut assembly = reserved_assembly();
        assembly.cancel().unwrap();
        assert_eq!(assembly.status(), AssemblyStatus::Cancelled);

        let err = assembly.cancel().unwrap_err();
        match err {
            DomainError::InvalidTransition { current, action } => {
                assert_eq!(current, "cancelled");
                assert_eq!(action, "cancel");
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }

    #[test]
    fn cancel_after_completion_is_invalid() {
        let mut assembly = reserved_assembly();
        assembly.complete(test_time()).unwrap();
        let err = assembly.cancel().unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[test]
    fn deletable_only_from_terminal_states() {
        let mut assembly = reserved_assembly();
        assert!(assembly.ensure_deletable().is_err());

        assembly.start().unwrap();
        assert!(assembly.ensure_deletable().is_err());

        assembly.cancel().unwrap();
        assembly.ensure_deletable().unwrap();

        let mut shipped = reserved_assembly();
        shipped.complete(test_time()).unwrap();
        shipped.ship(test_time()).unwrap();
        shipped.ensure_deletable().unwrap();
    }

    #[test]
    fn patch_is_legal_in_terminal_states_and_keeps_ledger_untouched() {
        let mut assembly = reserved_assembly();
        assembly.cancel().unwrap();
        assembly.apply_patch(AssemblyPatch {
            order_reference: Some("SO-1042".to_string()),
            notes: None,
        });
        assert_eq!(assembly.order_reference(), Some("SO-1042"));
        assert_eq!(assembly.notes(), Some("bench build"));
    }

    #[test]
    fn snapshot_bom_copies_lines_with_fresh_ids() {
        let mut config = Configuration::create(
            ConfigurationId::new(),
            "Desk lamp".to_string(),
            None,
            test_time(),
        )
        .unwrap();
        let item = ItemId::new();
        config.upsert_component(item, 4).unwrap();

        let lines = AssemblyComponent::snapshot_bom(&config);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item_id, item);
        assert_eq!(lines[0].quantity, 4);
        assert_ne!(lines[0].id, config.components()[0].id);
    }

    #[test]
    fn status_round_trips_through_parse() {
        for status in [
            AssemblyStatus::Reserved,
            AssemblyStatus::Building,
            AssemblyStatus::Completed,
            AssemblyStatus::Shipped,
            AssemblyStatus::Cancelled,
        ] {
            assert_eq!(AssemblyStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(AssemblyStatus::parse("draft").is_err());
    }

    #[derive(Debug, Clone, Copy)]
    enum Action {
        Start,
        Complete,
        Ship,
        Cancel,
    }

    fn action_strategy() -> impl Strategy<Value = Action> {
        prop_oneof![
            Just(Action::Start),
            Just(Action::Complete),
            Just(Action::Ship),
            Just(Action::Cancel),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever sequence of lifecycle calls arrives, the
        /// status only ever moves along an allowed edge, a failed call
        /// leaves it unchanged, shipped and cancelled are absorbing, and
        /// the timestamps match the path actually taken.
        #[test]
        fn lifecycle_never_leaves_the_transition_table(
            actions in prop::collection::vec(action_strategy(), 1..30)
        ) {
            let mut assembly = reserved_assembly();
            for action in actions {
                let before = assembly.status();
                let result = match action {
                    Action::Start => assembly.start(),
                    Action::Complete => assembly.complete(test_time()),
                    Action::Ship => assembly.ship(test_time()),
                    Action::Cancel => assembly.cancel(),
                };
                let after = assembly.status();
                if result.is_err() {
                    prop_assert_eq!(after, before);
                    continue;
                }
                match (before, action, after) {
                    (AssemblyStatus::Reserved, Action::Start, AssemblyStatus::Building) => {}
                    (
                        AssemblyStatus::Reserved | AssemblyStatus::Building,
                        Action::Complete,
                        AssemblyStatus::Completed,
                    ) => {}
                    (AssemblyStatus::Completed, Action::Ship, AssemblyStatus::Shipped) => {}
                    (
                        AssemblyStatus::Reserved | AssemblyStatus::Building,
                        Action::Cancel,
                        AssemblyStatus::Cancelled,
                    ) => {}
                    other => prop_assert!(false, "illegal transition {other:?}"),
                }
            }
            prop_assert_eq!(
                assembly.completed_at().is_some(),
                matches!(
                    assembly.status(),
                    AssemblyStatus::Completed | AssemblyStatus::Shipped
                )
            );
            prop_assert_eq!(
                assembly.shipped_at().is_some(),
                assembly.status() == AssemblyStatus::Shipped
            );
        }
    }
}
