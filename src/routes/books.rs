use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::books::{BookList, FeaturedBooks},
    error::AppResult,
    response::ApiResponse,
    routes::params::BookQuery,
    services::book_service,
    state::AppState,
};

// Browsing is open to anonymous viewers; no extractor here.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books))
        .route("/featured", get(featured_books))
}

#[utoipa::path(
    get,
    path = "/api/books",
    params(
        ("q" = Option<String>, Query, description = "Substring match against title or author"),
        ("category" = Option<String>, Query, description = "Exact category, or 'all'")
    ),
    responses(
        (status = 200, description = "Catalog ordered by title, filtered", body = ApiResponse<BookList>)
    ),
    tag = "Books"
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<ApiResponse<BookList>>> {
    let resp = book_service::list_books(&state.pool, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/books/featured",
    responses(
        (status = 200, description = "Up to 4 featured books", body = ApiResponse<FeaturedBooks>)
    ),
    tag = "Books"
)]
pub async fn featured_books(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<FeaturedBooks>>> {
    let resp = book_service::featured_books(&state.pool).await?;
    Ok(Json(resp))
}
