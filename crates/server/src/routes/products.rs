use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::product::{CreateProduct, LocalizedProduct, Product, UpdateProduct};
use serde::Serialize;
use services::services::pricing::{self, PriceDisplay};
use tracing::info;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use super::posts::LanguageQuery;
use crate::{
    AppState,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
};

/// Storefront view of a product: localized text plus how its price is shown
#[derive(Debug, Clone, Serialize, TS)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: LocalizedProduct,
    pub display: PriceDisplay,
    pub formatted_price: String,
}

impl ProductView {
    fn new(product: LocalizedProduct) -> Self {
        let display = PriceDisplay::of(&product.price);
        Self {
            formatted_price: pricing::format_amount(display.amount()),
            display,
            product,
        }
    }
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProduct>,
) -> Result<ResponseJson<ApiResponse<Product>>, ApiError> {
    let product = state.synchronizer.create_product(&state.db.pool, payload).await?;
    Ok(ResponseJson(ApiResponse::success(product)))
}

/// GET /api/products?lang=
pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LanguageQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ProductView>>>, ApiError> {
    let language = query.lang.unwrap_or(state.default_language);
    let products = Product::find_all(&state.db.pool)
        .await?
        .iter()
        .filter_map(|product| product.localized(language))
        .map(ProductView::new)
        .collect();
    Ok(ResponseJson(ApiResponse::success(products)))
}

/// GET /api/products/{slug}?lang=
/// Variants are filtered to the served language
pub async fn get_product(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
    AppQuery(query): AppQuery<LanguageQuery>,
) -> Result<ResponseJson<ApiResponse<ProductView>>, ApiError> {
    let language = query.lang.unwrap_or(state.default_language);
    let product = Product::find_by_slug(&state.db.pool, &slug)
        .await?
        .and_then(|product| product.localized(language))
        .ok_or(ApiError::NotFound("product"))?;
    Ok(ResponseJson(ApiResponse::success(ProductView::new(product))))
}

/// PUT /api/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateProduct>,
) -> Result<ResponseJson<ApiResponse<Product>>, ApiError> {
    let product = state.synchronizer.update_product(&state.db.pool, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(product)))
}

/// DELETE /api/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if Product::delete(&state.db.pool, id).await? == 0 {
        return Err(ApiError::NotFound("product"));
    }
    info!(product_id = %id, "Deleted product");
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/products",
        Router::new()
            .route("/", post(create_product).get(list_products))
            .route("/{key}", get(get_product).put(update_product).delete(delete_product)),
    )
}
