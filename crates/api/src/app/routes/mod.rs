use axum::Router;

pub mod assemblies;
pub mod capacity;
pub mod configurations;
pub mod items;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .nest("/items", items::router())
        .nest("/configurations", configurations::router())
        .nest("/assemblies", assemblies::router())
        .nest("/capacity", capacity::router())
}
