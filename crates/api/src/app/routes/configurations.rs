use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use stockforge_catalog::ConfigurationPatch;
use stockforge_core::{ConfigurationId, ItemId};
use stockforge_engine::NewConfiguration;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_configurations).post(create_configuration))
        .route(
            "/:id",
            get(get_configuration)
                .patch(update_configuration)
                .delete(delete_configuration),
        )
        .route("/:id/archive", post(archive_configuration))
        .route("/:id/unarchive", post(unarchive_configuration))
        .route("/:id/duplicate", post(duplicate_configuration))
        .route("/:id/components", post(add_component))
        .route("/:id/components/:item_id", delete(remove_component))
}

pub async fn create_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateConfigurationRequest>,
) -> axum::response::Response {
    let new = NewConfiguration {
        name: body.name,
        description: body.description,
        components: body
            .components
            .iter()
            .map(|line| (line.item_id, line.quantity))
            .collect(),
    };
    match services.configurations.create(new) {
        Ok(config) => (
            StatusCode::CREATED,
            Json(dto::configuration_to_json(&config)),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_configurations(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let configs: Vec<_> = services
        .configurations
        .list()
        .iter()
        .map(dto::configuration_to_json)
        .collect();
    (StatusCode::OK, Json(configs)).into_response()
}

pub async fn get_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ConfigurationId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.configurations.get(id) {
        Ok(config) => (StatusCode::OK, Json(dto::configuration_to_json(&config))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(patch): Json<ConfigurationPatch>,
) -> axum::response::Response {
    let id: ConfigurationId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.configurations.update(id, patch) {
        Ok(config) => (StatusCode::OK, Json(dto::configuration_to_json(&config))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ConfigurationId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.configurations.delete(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn archive_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ConfigurationId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.configurations.archive(id) {
        Ok(config) => (StatusCode::OK, Json(dto::configuration_to_json(&config))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn unarchive_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ConfigurationId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.configurations.unarchive(id) {
        Ok(config) => (StatusCode::OK, Json(dto::configuration_to_json(&config))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn duplicate_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ConfigurationId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.configurations.duplicate(id) {
        Ok(copy) => (
            StatusCode::CREATED,
            Json(dto::configuration_to_json(&copy)),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn add_component(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ComponentLineRequest>,
) -> axum::response::Response {
    let id: ConfigurationId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services
        .configurations
        .add_component(id, body.item_id, body.quantity)
    {
        Ok(config) => (StatusCode::OK, Json(dto::configuration_to_json(&config))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn remove_component(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, item_id)): Path<(String, String)>,
) -> axum::response::Response {
    let id: ConfigurationId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let item_id: ItemId = match item_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.configurations.remove_component(id, item_id) {
        Ok(config) => (StatusCode::OK, Json(dto::configuration_to_json(&config))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
