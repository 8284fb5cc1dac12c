use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockforge_core::ConfigurationId;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::app::dto::CapacityQuery;

pub fn router() -> Router {
    Router::new()
        .route("/", get(capacity_report))
        .route("/:id", get(configuration_capacity))
}

pub async fn capacity_report(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<CapacityQuery>,
) -> axum::response::Response {
    let report = services.capacity.report(query.include_archived);
    (StatusCode::OK, Json(report)).into_response()
}

pub async fn configuration_capacity(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ConfigurationId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    match services.capacity.for_configuration(id) {
        Ok(row) => (StatusCode::OK, Json(row)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
