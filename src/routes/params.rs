use serde::Deserialize;
use utoipa::ToSchema;

/// Catalog filter. Both fields are optional; an absent `q` and an
/// absent or "all" category leave the list untouched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookQuery {
    pub q: Option<String>,
    pub category: Option<String>,
}
