use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Book;

#[derive(Debug, Serialize, ToSchema)]
pub struct BookList {
    pub items: Vec<Book>,
    /// Distinct non-null categories observed in the full catalog,
    /// regardless of the active filter. Feeds the category picker.
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeaturedBooks {
    pub items: Vec<Book>,
}
