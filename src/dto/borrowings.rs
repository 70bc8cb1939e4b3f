use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Book;

#[derive(Debug, Serialize, ToSchema)]
pub struct BorrowingDto {
    pub id: Uuid,
    pub book: Book,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub status: String,
    pub returned_at: Option<DateTime<Utc>>,
    /// Derived at response time, never stored.
    pub overdue: bool,
}

/// Dashboard counters. total = borrowed + returned; overdue is a
/// subset of borrowed, not additive.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BorrowingStats {
    pub total: i64,
    pub borrowed: i64,
    pub overdue: i64,
    pub returned: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BorrowingList {
    pub items: Vec<BorrowingDto>,
    pub stats: BorrowingStats,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutSummary {
    pub borrowed: i64,
    pub due_date: DateTime<Utc>,
}
