use axum::{Router, routing::get};

use crate::AppState;

pub mod health;
pub mod projects;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(projects::router(&state))
        .with_state(state);

    Router::new().nest("/api", api_routes)
}
