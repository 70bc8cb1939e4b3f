use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartCount, CartItemDto, CartList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Book, CartItem},
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct CartWithBookRow {
    cart_id: Uuid,
    book_id: Uuid,
    title: String,
    author: String,
    category: Option<String>,
    cover_image: Option<String>,
    available_copies: i32,
    total_copies: i32,
    created_at: DateTime<Utc>,
}

pub async fn list_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let rows = sqlx::query_as::<_, CartWithBookRow>(
        r#"
        SELECT ci.id AS cart_id,
               b.id AS book_id, b.title, b.author, b.category, b.cover_image,
               b.available_copies, b.total_copies, b.created_at
        FROM cart_items ci
        JOIN books b ON b.id = ci.book_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    let items: Vec<CartItemDto> = rows
        .into_iter()
        .map(|row| CartItemDto {
            id: row.cart_id,
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
        })
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

/// Cart size for the navigation badge.
pub async fn count_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartCount>> {
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(pool)
        .await?;

    Ok(ApiResponse::success(
        "OK",
        CartCount { count: total.0 },
        None,
    ))
}

pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let book: Option<(i32,)> = sqlx::query_as("SELECT available_copies FROM books WHERE id = $1")
        .bind(payload.book_id)
        .fetch_optional(pool)
        .await?;

    let available = match book {
        Some((available,)) => available,
        None => return Err(AppError::BadRequest("book not found".to_string())),
    };
    if available <= 0 {
        return Err(AppError::BadRequest(
            "no copies of this book are available".to_string(),
        ));
    }

    // One staged row per (user, book); the table carries the same
    // unique constraint as a backstop against concurrent adds.
    let exist: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM cart_items WHERE user_id = $1 AND book_id = $2")
            .bind(user.user_id)
            .bind(payload.book_id)
            .fetch_optional(pool)
            .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest(
            "book is already in your cart".to_string(),
        ));
    }

    let cart_item: CartItem = sqlx::query_as(
        "INSERT INTO cart_items (id, user_id, book_id) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.book_id)
    .fetch_one(pool)
    .await
    .map_err(map_insert_error)?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "book_id": payload.book_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Added to cart", cart_item, None))
}

/// A concurrent add can slip past the pre-insert check and land on the
/// unique constraint instead; that is still a duplicate, not a server
/// fault.
fn map_insert_error(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::BadRequest("book is already in your cart".to_string())
        }
        err => err.into(),
    }
}

/// Deletes a single staged row by cart-item id, viewer-scoped.
pub async fn remove_from_cart(
    pool: &DbPool,
    user: &AuthUser,
    cart_item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(cart_item_id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "cart_item_id": cart_item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct DuplicateRow;

    impl std::fmt::Display for DuplicateRow {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for DuplicateRow {}

    impl sqlx::error::DatabaseError for DuplicateRow {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn unique_violation_on_insert_is_a_duplicate_not_a_server_fault() {
        let err = sqlx::Error::Database(Box::new(DuplicateRow));
        match map_insert_error(err) {
            AppError::BadRequest(msg) => assert_eq!(msg, "book is already in your cart"),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn other_insert_errors_pass_through() {
        let err = sqlx::Error::RowNotFound;
        assert!(matches!(map_insert_error(err), AppError::DbError(_)));
    }
}
