use axum::Router;

pub mod exchange;
pub mod inventory;
pub mod orders;
pub mod reconciliation;
pub mod system;

/// Router for all business endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/inventory", inventory::router())
        .nest("/exchange", exchange::router())
        .nest("/reconciliation", reconciliation::router())
        .nest("/orders", orders::router())
}
