use serde::Deserialize;
use serde_json::json;

use stockforge_assembly::Assembly;
use stockforge_catalog::Configuration;
use stockforge_core::{ConfigurationId, ItemId};
use stockforge_inventory::{Item, ItemDraft, ItemKind, StockTransaction};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub kind: ItemKind,
    #[serde(default)]
    pub quantity_on_hand: i64,
    #[serde(default)]
    pub quantity_on_order: i64,
    pub reorder_threshold: Option<i64>,
    pub lead_time_days: Option<i64>,
}

impl CreateItemRequest {
    pub fn into_draft(self) -> ItemDraft {
        ItemDraft {
            name: self.name,
            sku: self.sku,
            barcode: self.barcode,
            kind: self.kind,
            quantity_on_hand: self.quantity_on_hand,
            quantity_on_order: self.quantity_on_order,
            reorder_threshold: self.reorder_threshold,
            lead_time_days: self.lead_time_days,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ComponentLineRequest {
    pub item_id: ItemId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateConfigurationRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub components: Vec<ComponentLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssemblyRequest {
    pub configuration_id: Option<ConfigurationId>,
    pub order_reference: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub components: Vec<ComponentLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ListAssembliesQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CapacityQuery {
    #[serde(default)]
    pub include_archived: bool,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn item_to_json(item: &Item) -> serde_json::Value {
    json!({
        "id": item.id_typed(),
        "name": item.name(),
        "sku": item.sku(),
        "barcode": item.barcode(),
        "kind": item.kind(),
        "quantity_on_hand": item.quantity_on_hand(),
        "quantity_reserved": item.quantity_reserved(),
        "quantity_available": item.quantity_available(),
        "quantity_on_order": item.quantity_on_order(),
        "reorder_threshold": item.reorder_threshold(),
        "lead_time_days": item.lead_time_days(),
        "created_at": item.created_at(),
        "updated_at": item.updated_at(),
    })
}

pub fn transaction_to_json(t: &StockTransaction) -> serde_json::Value {
    json!({
        "id": t.id,
        "item_id": t.item_id,
        "quantity_change": t.quantity_change,
        "kind": t.kind,
        "assembly_id": t.assembly_id,
        "notes": t.notes,
        "created_at": t.created_at,
    })
}

pub fn configuration_to_json(config: &Configuration) -> serde_json::Value {
    json!({
        "id": config.id_typed(),
        "name": config.name(),
        "description": config.description(),
        "archived": config.archived(),
        "components": config
            .components()
            .iter()
            .map(|line| json!({
                "id": line.id,
                "item_id": line.item_id,
                "quantity": line.quantity,
            }))
            .collect::<Vec<_>>(),
        "created_at": config.created_at(),
    })
}

pub fn assembly_to_json(assembly: &Assembly) -> serde_json::Value {
    json!({
        "id": assembly.id_typed(),
        "configuration_id": assembly.configuration_id(),
        "order_reference": assembly.order_reference(),
        "status": assembly.status(),
        "notes": assembly.notes(),
        "components": assembly
            .components()
            .iter()
            .map(|line| json!({
                "id": line.id,
                "item_id": line.item_id,
                "quantity": line.quantity,
            }))
            .collect::<Vec<_>>(),
        "created_at": assembly.created_at(),
        "completed_at": assembly.completed_at(),
        "shipped_at": assembly.shipped_at(),
    })
}
