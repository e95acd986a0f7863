use axum::{Router, routing::get};

use crate::AppState;

pub mod checkout;
pub mod health;
pub mod posts;
pub mod pricing;
pub mod products;

pub fn router() -> Router<AppState> {
    let api = Router::new()
        .merge(posts::router())
        .merge(products::router())
        .merge(pricing::router())
        .merge(checkout::router());

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
}
