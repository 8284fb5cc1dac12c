use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockforge_core::{ComponentLineId, ConfigurationId, DomainError, DomainResult, Entity, ItemId};

/// One bill-of-materials line: an item and how many of it one build takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationComponent {
    pub id: ComponentLineId,
    pub item_id: ItemId,
    pub quantity: i64,
}

/// A named bill of materials.
///
/// Owns its component lines; at most one line per item (adds upsert the
/// quantity in place). Archived configurations stay readable and may still
/// back existing assemblies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    id: ConfigurationId,
    name: String,
    description: Option<String>,
    archived: bool,
    components: Vec<ConfigurationComponent>,
    created_at: DateTime<Utc>,
}

/// Partial update for name/description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Configuration {
    pub fn create(
        id: ConfigurationId,
        name: String,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            description,
            archived: false,
            components: Vec::new(),
            created_at: now,
        })
    }

    pub fn id_typed(&self) -> ConfigurationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn archived(&self) -> bool {
        self.archived
    }

    pub fn components(&self) -> &[ConfigurationComponent] {
        &self.components
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn apply_patch(&mut self, patch: ConfigurationPatch) -> DomainResult<()> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        Ok(())
    }

    pub fn archive(&mut self) {
        self.archived = true;
    }

    pub fn unarchive(&mut self) {
        self.archived = false;
    }

    /// Add or replace the line for `item_id`.
    ///
    /// Upsert semantics: a second add for the same item replaces the quantity
    /// rather than creating a duplicate line. A quantity of zero is accepted
    /// (it forces build capacity to zero; see `capacity::can_build`), but a
    /// negative quantity is rejected.
    pub fn upsert_component(&mut self, item_id: ItemId, quantity: i64) -> DomainResult<()> {
        if quantity < 0 {
            return Err(DomainError::validation("component quantity cannot be negative"));
        }
        if let Some(line) = self.components.iter_mut().find(|c| c.item_id == item_id) {
            line.quantity = quantity;
        } else {
            self.components.push(ConfigurationComponent {
                id: ComponentLineId::new(),
                item_id,
                quantity,
            });
        }
        Ok(())
    }

    pub fn remove_component(&mut self, item_id: ItemId) -> DomainResult<()> {
        let before = self.components.len();
        self.components.retain(|c| c.item_id != item_id);
        if self.components.len() == before {
            return Err(DomainError::not_found(format!(
                "configuration {} has no component for item {item_id}",
                self.id
            )));
        }
        Ok(())
    }

    pub fn references_item(&self, item_id: ItemId) -> bool {
        self.components.iter().any(|c| c.item_id == item_id)
    }

    /// Deep copy under a new id and a derived name.
    ///
    /// The copy always starts active and carries fresh line ids; assembly
    /// history belongs to assemblies and is never copied.
    pub fn duplicate(&self, new_id: ConfigurationId, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id,
            name: format!("{} (copy)", self.name),
            description: self.description.clone(),
            archived: false,
            components: self
                .components
                .iter()
                .map(|c| ConfigurationComponent {
                    id: ComponentLineId::new(),
                    item_id: c.item_id,
                    quantity: c.quantity,
                })
                .collect(),
            created_at: now,
        }
    }
}

impl Entity for Configuration {
    type Id = ConfigurationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
