use crate::handlers::{book, order};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/add-order", post(order::submit_order))
        .route("/order-book/{id}", delete(order::cancel_order))
        .route("/orders", get(order::list_orders))
        .route("/ws/order-book/{pair_id}", get(book::book_stream))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "Working..."
}
