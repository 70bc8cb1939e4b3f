use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::borrowings::{BorrowingDto, BorrowingList, BorrowingStats, CheckoutSummary},
    entity::{
        books::Column as BookCol,
        books::Entity as Books,
        borrowings::{
            ActiveModel as BorrowingActive, Column as BorrowingCol, Entity as Borrowings,
            Model as BorrowingModel,
        },
        cart_items::{Column as CartCol, Entity as CartItems},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Book, Borrowing, STATUS_BORROWED, STATUS_RETURNED},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Every borrowing in one checkout shares a single due date this far
/// from the borrow time.
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// An active borrowing whose due date has passed. Flips with the clock
/// alone; no mutation involved.
pub fn is_overdue(status: &str, due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == STATUS_BORROWED && due_date < now
}

pub fn borrowing_stats(items: &[BorrowingDto]) -> BorrowingStats {
    let total = items.len() as i64;
    let borrowed = items.iter().filter(|b| b.status == STATUS_BORROWED).count() as i64;
    let returned = items.iter().filter(|b| b.status == STATUS_RETURNED).count() as i64;
    let overdue = items.iter().filter(|b| b.overdue).count() as i64;
    BorrowingStats {
        total,
        borrowed,
        overdue,
        returned,
    }
}

#[derive(FromRow)]
struct BorrowingWithBookRow {
    borrowing_id: Uuid,
    borrowed_at: DateTime<Utc>,
    due_date: DateTime<Utc>,
    status: String,
    returned_at: Option<DateTime<Utc>>,
    book_id: Uuid,
    title: String,
    author: String,
    category: Option<String>,
    cover_image: Option<String>,
    available_copies: i32,
    total_copies: i32,
    created_at: DateTime<Utc>,
}

/// Viewer's borrowings joined with book data, newest borrowed-first,
/// each row carrying the derived overdue flag, plus the four counters.
pub async fn list_borrowings(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<BorrowingList>> {
    let rows = sqlx::query_as::<_, BorrowingWithBookRow>(
        r#"
        SELECT br.id AS borrowing_id, br.borrowed_at, br.due_date, br.status, br.returned_at,
               b.id AS book_id, b.title, b.author, b.category, b.cover_image,
               b.available_copies, b.total_copies, b.created_at
        FROM borrowings br
        JOIN books b ON b.id = br.book_id
        WHERE br.user_id = $1
        ORDER BY br.borrowed_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let now = Utc::now();
    let items: Vec<BorrowingDto> = rows
        .into_iter()
        .map(|row| BorrowingDto {
            id: row.borrowing_id,
            book: Book {
                id: row.book_id,
                title: row.title,
                author: row.author,
                category: row.category,
                cover_image: row.cover_image,
                available_copies: row.available_copies,
                total_copies: row.total_copies,
                created_at: row.created_at,
            },
            borrowed_at: row.borrowed_at,
            due_date: row.due_date,
            overdue: is_overdue(&row.status, row.due_date, now),
            status: row.status,
            returned_at: row.returned_at,
        })
        .collect();

    let stats = borrowing_stats(&items);
    let meta = Meta::total(stats.total);
    Ok(ApiResponse::success(
        "OK",
        BorrowingList { items, stats },
        Some(meta),
    ))
}

/// Bulk borrow: converts every staged cart row into a borrowing with a
/// shared due date, then clears the cart. The inserts and the clear run
/// in one transaction so they succeed or fail together.
pub async fn checkout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CheckoutSummary>> {
    let txn = state.orm.begin().await?;

    let mut cart_items = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if cart_items.is_empty() {
        return Err(AppError::BadRequest("cart is empty".into()));
    }

    // Lock books in a stable order across concurrent checkouts.
    cart_items.sort_by_key(|item| item.book_id);

    let now = Utc::now();
    let due_date = now + Duration::days(LOAN_PERIOD_DAYS);

    for item in &cart_items {
        let book = Books::find_by_id(item.book_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        if book.available_copies <= 0 {
            return Err(AppError::BadRequest(format!(
                "no copies available for \"{}\"",
                book.title
            )));
        }

        Books::update_many()
            .col_expr(
                BookCol::AvailableCopies,
                Expr::col(BookCol::AvailableCopies).sub(1),
            )
            .filter(BookCol::Id.eq(item.book_id))
            .exec(&txn)
            .await?;

        BorrowingActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.user_id),
            book_id: Set(item.book_id),
            borrowed_at: Set(now.into()),
            due_date: Set(due_date.into()),
            status: Set(STATUS_BORROWED.into()),
            returned_at: Set(None),
        }
        .insert(&txn)
        .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "borrow_checkout",
        Some("borrowings"),
        Some(serde_json::json!({ "count": cart_items.len(), "due_date": due_date })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Books borrowed",
        CheckoutSummary {
            borrowed: cart_items.len() as i64,
            due_date,
        },
        Some(Meta::empty()),
    ))
}

/// Marks a single active borrowing returned, stamps returned_at, and
/// hands the copy back to the catalog in the same transaction.
pub async fn return_borrowing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Borrowing>> {
    let txn = state.orm.begin().await?;

    let borrowing = Borrowings::find()
        .filter(
            Condition::all()
                .add(BorrowingCol::UserId.eq(user.user_id))
                .add(BorrowingCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let borrowing = match borrowing {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };

    if borrowing.status != STATUS_BORROWED {
        return Err(AppError::BadRequest("book is already returned".into()));
    }

    let mut active: BorrowingActive = borrowing.into();
    active.status = Set(STATUS_RETURNED.into());
    active.returned_at = Set(Some(Utc::now().into()));
    let updated = active.update(&txn).await?;

    Books::update_many()
        .col_expr(
            BookCol::AvailableCopies,
            Expr::col(BookCol::AvailableCopies).add(1),
        )
        .filter(BookCol::Id.eq(updated.book_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "borrow_return",
        Some("borrowings"),
        Some(serde_json::json!({ "borrowing_id": updated.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Book returned",
        borrowing_from_entity(updated),
        Some(Meta::empty()),
    ))
}

fn borrowing_from_entity(model: BorrowingModel) -> Borrowing {
    Borrowing {
        id: model.id,
        user_id: model.user_id,
        book_id: model.book_id,
        borrowed_at: model.borrowed_at.with_timezone(&Utc),
        due_date: model.due_date.with_timezone(&Utc),
        status: model.status,
        returned_at: model.returned_at.map(|dt| dt.with_timezone(&Utc)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Book;

    fn dummy_book() -> Book {
        Book {
            id: Uuid::new_v4(),
            title: "A Book".to_string(),
            author: "An Author".to_string(),
            category: None,
            cover_image: None,
            available_copies: 1,
            total_copies: 1,
            created_at: Utc::now(),
        }
    }

    fn dto(status: &str, due_date: DateTime<Utc>, now: DateTime<Utc>) -> BorrowingDto {
        BorrowingDto {
            id: Uuid::new_v4(),
            book: dummy_book(),
            borrowed_at: due_date - Duration::days(LOAN_PERIOD_DAYS),
            due_date,
            overdue: is_overdue(status, due_date, now),
            status: status.to_string(),
            returned_at: (status == STATUS_RETURNED).then_some(now),
        }
    }

    #[test]
    fn overdue_requires_active_status_and_past_due_date() {
        let now = Utc::now();
        let past = now - Duration::days(1);
        let future = now + Duration::days(1);

        assert!(is_overdue(STATUS_BORROWED, past, now));
        assert!(!is_overdue(STATUS_BORROWED, future, now));
        assert!(!is_overdue(STATUS_RETURNED, past, now));
    }

    #[test]
    fn overdue_flips_purely_from_time_advancing() {
        let due = Utc::now();
        let just_before = due - Duration::seconds(1);
        let just_after = due + Duration::seconds(1);

        assert!(!is_overdue(STATUS_BORROWED, due, just_before));
        assert!(is_overdue(STATUS_BORROWED, due, just_after));
    }

    #[test]
    fn stats_total_is_borrowed_plus_returned() {
        let now = Utc::now();
        let items = vec![
            dto(STATUS_BORROWED, now + Duration::days(7), now),
            dto(STATUS_BORROWED, now - Duration::days(2), now),
            dto(STATUS_BORROWED, now - Duration::days(5), now),
            dto(STATUS_RETURNED, now - Duration::days(9), now),
        ];

        let stats = borrowing_stats(&items);
        assert_eq!(
            stats,
            BorrowingStats {
                total: 4,
                borrowed: 3,
                overdue: 2,
                returned: 1,
            }
        );
        assert_eq!(stats.total, stats.borrowed + stats.returned);
        assert!(stats.overdue <= stats.borrowed);
    }

    #[test]
    fn stats_of_empty_list_are_zero() {
        assert_eq!(borrowing_stats(&[]), BorrowingStats::default());
    }
}
