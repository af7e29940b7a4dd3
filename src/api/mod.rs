//! HTTP surface for the marketplace workflows.
//!
//! Every workflow route lives under `/api`; handlers only translate between
//! JSON and the [`crate::core`] operations. `GET /health` sits outside the
//! prefix for load balancer probes.

use axum::{Router, routing::get};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Platform maintenance views
pub mod admin;
/// Dealer routes: vehicle assignment, bidding, fleet and inventory
pub mod dealer;
/// `IntoResponse` mapping for the crate error type
pub mod error;
/// Body and path extraction that reports rejections as crate errors
pub mod extract;
/// Farmer routes: bid responses, order list and crop listing
pub mod farmer;
/// Retailer routes: checkout, payment and reviews
pub mod retailer;
/// Registration, profiles and notification inboxes
pub mod users;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

impl AppState {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Assembles the full application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(users::router())
        .merge(farmer::router())
        .merge(dealer::router())
        .merge(retailer::router())
        .merge(admin::router());

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
