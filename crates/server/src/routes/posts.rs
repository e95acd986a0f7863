use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    language::Language,
    post::{CreatePost, LocalizedPost, Post, UpdatePost},
};
use serde::Deserialize;
use tracing::info;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
};

#[derive(Debug, Default, Deserialize)]
pub struct LanguageQuery {
    pub lang: Option<Language>,
}

/// POST /api/posts
/// Create a post in its source language and translate it into the other one
pub async fn create_post(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePost>,
) -> Result<ResponseJson<ApiResponse<Post>>, ApiError> {
    let post = state.synchronizer.create_post(&state.db.pool, payload).await?;
    Ok(ResponseJson(ApiResponse::success(post)))
}

/// GET /api/posts?lang=
pub async fn list_posts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LanguageQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<LocalizedPost>>>, ApiError> {
    let language = query.lang.unwrap_or(state.default_language);
    let posts = Post::find_all(&state.db.pool)
        .await?
        .iter()
        .filter_map(|post| post.localized(language))
        .collect();
    Ok(ResponseJson(ApiResponse::success(posts)))
}

/// GET /api/posts/{slug}?lang=
/// The slug may belong to either language
pub async fn get_post(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
    AppQuery(query): AppQuery<LanguageQuery>,
) -> Result<ResponseJson<ApiResponse<LocalizedPost>>, ApiError> {
    let language = query.lang.unwrap_or(state.default_language);
    let post = Post::find_by_slug(&state.db.pool, &slug)
        .await?
        .and_then(|post| post.localized(language))
        .ok_or(ApiError::NotFound("post"))?;
    Ok(ResponseJson(ApiResponse::success(post)))
}

/// PUT /api/posts/{id}
/// Body-only edit; title and slug stay as they were
pub async fn update_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdatePost>,
) -> Result<ResponseJson<ApiResponse<Post>>, ApiError> {
    let post = state.synchronizer.update_post(&state.db.pool, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(post)))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if Post::delete(&state.db.pool, id).await? == 0 {
        return Err(ApiError::NotFound("post"));
    }
    info!(post_id = %id, "Deleted post");
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    // GET takes a slug, PUT and DELETE an id, on the same segment
    Router::new().nest(
        "/posts",
        Router::new()
            .route("/", post(create_post).get(list_posts))
            .route("/{key}", get(get_post).put(update_post).delete(delete_post)),
    )
}
