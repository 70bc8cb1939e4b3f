use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::borrowings::{BorrowingList, CheckoutSummary},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Borrowing,
    response::ApiResponse,
    services::borrowing_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_borrowings))
        .route("/checkout", post(checkout))
        .route("/{id}/return", post(return_borrowing))
}

#[utoipa::path(
    get,
    path = "/api/borrowings",
    responses(
        (status = 200, description = "Member's borrowings, newest first, with counters", body = ApiResponse<BorrowingList>),
        (status = 401, description = "Not logged in"),
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn list_borrowings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BorrowingList>>> {
    let resp = borrowing_service::list_borrowings(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/borrowings/checkout",
    responses(
        (status = 200, description = "All staged books borrowed with one shared due date", body = ApiResponse<CheckoutSummary>),
        (status = 400, description = "Cart is empty or a book has no copies left"),
        (status = 401, description = "Not logged in"),
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CheckoutSummary>>> {
    let resp = borrowing_service::checkout(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/borrowings/{id}/return",
    params(
        ("id" = Uuid, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Borrowing marked returned", body = ApiResponse<Borrowing>),
        (status = 400, description = "Already returned"),
        (status = 404, description = "Borrowing not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Borrowings"
)]
pub async fn return_borrowing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Borrowing>>> {
    let resp = borrowing_service::return_borrowing(&state, &user, id).await?;
    Ok(Json(resp))
}
