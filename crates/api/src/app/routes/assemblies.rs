use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stockforge_assembly::{AssemblyPatch, AssemblyStatus};
use stockforge_core::AssemblyId;
use stockforge_engine::{NewAssembly, NewAssemblyComponent};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_assemblies).post(create_assembly))
        .route(
            "/:id",
            get(get_assembly).patch(update_assembly).delete(delete_assembly),
        )
        .route("/:id/start", post(start_assembly))
        .route("/:id/complete", post(complete_assembly))
        .route("/:id/ship", post(ship_assembly))
        .route("/:id/cancel", post(cancel_assembly))
}

pub async fn create_assembly(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateAssemblyRequest>,
) -> axum::response::Response {
    let new = NewAssembly {
        configuration_id: body.configuration_id,
        order_reference: body.order_reference,
        notes: body.notes,
        components: body
            .components
            .iter()
            .map(|line| NewAssemblyComponent {
                item_id: line.item_id,
                quantity: line.quantity,
            })
            .collect(),
    };
    match services.assemblies.create(new) {
        Ok(assembly) => {
            (StatusCode::CREATED, Json(dto::assembly_to_json(&assembly))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_assemblies(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListAssembliesQuery>,
) -> axum::response::Response {
    let status = match query.status.as_deref() {
        Some(s) => match AssemblyStatus::parse(s) {
            Ok(v) => Some(v),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => None,
    };
    let assemblies: Vec<_> = services
        .assemblies
        .list(status)
        .iter()
        .map(dto::assembly_to_json)
        .collect();
    (StatusCode::OK, Json(assemblies)).into_response()
}

pub async fn get_assembly(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AssemblyId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.assemblies.get(id) {
        Ok(assembly) => (StatusCode::OK, Json(dto::assembly_to_json(&assembly))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_assembly(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(patch): Json<AssemblyPatch>,
) -> axum::response::Response {
    let id: AssemblyId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.assemblies.update(id, patch) {
        Ok(assembly) => (StatusCode::OK, Json(dto::assembly_to_json(&assembly))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_assembly(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AssemblyId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.assemblies.delete(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn start_assembly(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AssemblyId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.assemblies.start(id) {
        Ok(assembly) => (StatusCode::OK, Json(dto::assembly_to_json(&assembly))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn complete_assembly(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AssemblyId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.assemblies.complete(id) {
        Ok(assembly) => (StatusCode::OK, Json(dto::assembly_to_json(&assembly))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn ship_assembly(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AssemblyId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.assemblies.ship(id) {
        Ok(assembly) => (StatusCode::OK, Json(dto::assembly_to_json(&assembly))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn cancel_assembly(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AssemblyId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.assemblies.cancel(id) {
        Ok(assembly) => (StatusCode::OK, Json(dto::assembly_to_json(&assembly))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
