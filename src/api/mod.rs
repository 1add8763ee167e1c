//! HTTP surface
pub mod error;
pub mod extract;
pub mod handlers;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::sales::SaleProcessor;
use crate::store::SalesStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SalesStore>,
    pub sales: SaleProcessor,
    pub nats: Option<async_nats::Client>,
}

impl AppState {
    pub fn new(store: Arc<dyn SalesStore>, nats: Option<async_nats::Client>) -> Self {
        Self { sales: SaleProcessor::new(Arc::clone(&store)), store, nats }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/goods", get(handlers::list_goods).post(handlers::add_good))
        .route("/goods/:name", get(handlers::get_good))
        .route("/sales", post(handlers::make_sale))
        .route("/wallets/:username", get(handlers::get_wallet))
        .route("/wallets/:username/add", post(handlers::add_to_wallet))
        .route("/wallets/:username/deduct", post(handlers::deduct_from_wallet))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
