use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod books;
pub mod borrowings;
pub mod cart;
pub mod doc;
pub mod health;
pub mod params;
pub mod profile;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/books", books::router())
        .nest("/auth", auth::router())
        .nest("/cart", cart::router())
        .nest("/borrowings", borrowings::router())
        .nest("/profile", profile::router())
}
