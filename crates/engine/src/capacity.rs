//! Build-capacity reporting.

use std::sync::Arc;

use serde::Serialize;

use stockforge_catalog::can_build;
use stockforge_core::{ConfigurationId, DomainResult};

use crate::item_ledger::ItemLedger;
use crate::stores::ConfigurationStore;

/// One row of the capacity report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildCapacity {
    pub configuration_id: ConfigurationId,
    pub configuration_name: String,
    pub can_build: i64,
}

/// Advisory capacity snapshots over the configuration catalog.
///
/// Numbers are computed from current availability and carry no hold; a
/// concurrent reservation can invalidate them immediately.
pub struct CapacityService {
    ledger: Arc<ItemLedger>,
    configurations: Arc<ConfigurationStore>,
}

impl CapacityService {
    pub fn new(ledger: Arc<ItemLedger>, configurations: Arc<ConfigurationStore>) -> Self {
        Self {
            ledger,
            configurations,
        }
    }

    /// Capacity for every configuration, active only by default.
    pub fn report(&self, include_archived: bool) -> Vec<BuildCapacity> {
        self.configurations
            .list()
            .iter()
            .filter(|c| include_archived || !c.archived())
            .map(|c| BuildCapacity {
                configuration_id: c.id_typed(),
                configuration_name: c.name().to_string(),
                can_build: can_build(c, |id| self.ledger.availability(id).unwrap_or(0)),
            })
            .collect()
    }

    /// Capacity for one configuration, archived or not.
    pub fn for_configuration(&self, id: ConfigurationId) -> DomainResult<BuildCapacity> {
        let config = self
            .configurations
            .get(id)
            .ok_or_else(|| stockforge_core::DomainError::not_found(format!("configuration {id}")))?;
        Ok(BuildCapacity {
            configuration_id: config.id_typed(),
            configuration_name: config.name().to_string(),
            can_build: can_build(&config, |id| self.ledger.availability(id).unwrap_or(0)),
        })
    }
}
