//! Engine wiring: one ledger and one store set shared by every service.

use std::sync::Arc;

use stockforge_engine::{
    AssembliesService, AssemblyStore, CapacityService, ConfigurationStore, ConfigurationsService,
    ItemLedger, ItemsService,
};

pub struct AppServices {
    pub items: ItemsService,
    pub configurations: ConfigurationsService,
    pub assemblies: AssembliesService,
    pub capacity: CapacityService,
}

pub fn build_services() -> AppServices {
    let ledger = Arc::new(ItemLedger::new());
    let configuration_store = Arc::new(ConfigurationStore::new());
    let assembly_store = Arc::new(AssemblyStore::new());

    AppServices {
        items: ItemsService::new(
            ledger.clone(),
            configuration_store.clone(),
            assembly_store.clone(),
        ),
        configurations: ConfigurationsService::new(configuration_store.clone(), ledger.clone()),
        assemblies: AssembliesService::new(
            ledger.clone(),
            configuration_store.clone(),
            assembly_store,
        ),
        capacity: CapacityService::new(ledger, configuration_store),
    }
}
