use axum::{Router, response::Json as ResponseJson, routing::post};
use db::models::product::PriceState;
use serde::{Deserialize, Serialize};
use services::services::pricing::{self, PriceDisplay, PriceEdit};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, extract::AppJson};

#[derive(Debug, Clone, Deserialize, TS)]
pub struct ResolvePriceRequest {
    pub state: PriceState,
    pub edit: PriceEdit,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ResolvePriceResponse {
    pub state: PriceState,
    pub display: PriceDisplay,
    pub formatted_price: String,
    pub badge: Option<String>,
}

/// POST /api/pricing/resolve
/// Apply one product-form price edit and return the resulting state
pub async fn resolve_price(
    AppJson(payload): AppJson<ResolvePriceRequest>,
) -> Result<ResponseJson<ApiResponse<ResolvePriceResponse>>, ApiError> {
    let state = pricing::resolve(&payload.state, payload.edit)?;
    let display = PriceDisplay::of(&state);

    Ok(ResponseJson(ApiResponse::success(ResolvePriceResponse {
        state,
        formatted_price: pricing::format_amount(display.amount()),
        badge: display.badge(),
        display,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/pricing/resolve", post(resolve_price))
}
