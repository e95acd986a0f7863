use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::post,
};
use db::models::{cart::CartLineItem, product::Product};
use serde::Deserialize;
use services::services::digital_files::{self, LineItemDownloads};
use tracing::info;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::AppJson};

#[derive(Debug, Clone, Deserialize, TS)]
pub struct DownloadsRequest {
    pub items: Vec<CartLineItem>,
}

/// POST /api/checkout/downloads
/// Files each line item of a digital product grants, matched on its selected variants
pub async fn checkout_downloads(
    State(state): State<AppState>,
    AppJson(payload): AppJson<DownloadsRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<LineItemDownloads>>>, ApiError> {
    // Product types are taken from storage, so every line is looked up
    let mut ids: Vec<Uuid> = payload.items.iter().map(|item| item.id).collect();
    ids.sort();
    ids.dedup();

    let products = Product::find_by_ids(&state.db.pool, &ids).await?;
    let downloads = digital_files::downloads_for_cart(&payload.items, &products);

    info!(
        line_items = payload.items.len(),
        digital_items = downloads.len(),
        files = downloads.iter().map(|d| d.files.len()).sum::<usize>(),
        "Resolved checkout downloads"
    );
    Ok(ResponseJson(ApiResponse::success(downloads)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/checkout/downloads", post(checkout_downloads))
}
