use axum_library_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::cart::AddToCartRequest,
    entity::{
        books::{ActiveModel as BookActive, Entity as Books},
        borrowings::ActiveModel as BorrowingActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{STATUS_BORROWED, STATUS_RETURNED},
    services::{borrowing_service, cart_service},
    state::AppState,
};
use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use std::sync::Mutex;
use uuid::Uuid;

// Both tests truncate the shared database; take this before touching it.
static DB_LOCK: Mutex<()> = Mutex::new(());

// Integration flow: member stages two books, borrows them in one checkout,
// then returns one; counters and copy counts move accordingly.
#[tokio::test]
async fn cart_checkout_and_return_flow() -> anyhow::Result<()> {
    let _guard = DB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let member = create_member(&state, "reader@example.com").await?;
    let dune = create_book(&state, "Dune", "Frank Herbert", 3).await?;
    let rust_book = create_book(&state, "The Rust Programming Language", "Steve Klabnik", 1).await?;

    // Stage both books.
    cart_service::add_to_cart(&state.pool, &member, AddToCartRequest { book_id: dune }).await?;
    cart_service::add_to_cart(&state.pool, &member, AddToCartRequest { book_id: rust_book })
        .await?;

    // A second add of the same book is rejected, no duplicate row.
    let dup = cart_service::add_to_cart(&state.pool, &member, AddToCartRequest { book_id: dune })
        .await;
    assert!(matches!(dup, Err(AppError::BadRequest(_))));

    let count = cart_service::count_cart(&state.pool, &member).await?;
    assert_eq!(count.data.unwrap().count, 2);

    // Bulk borrow: one shared due date 14 days out, cart emptied.
    let before = Utc::now();
    let summary = borrowing_service::checkout(&state, &member)
        .await?
        .data
        .unwrap();
    assert_eq!(summary.borrowed, 2);
    assert!(summary.due_date >= before + Duration::days(14));
    assert!(summary.due_date <= Utc::now() + Duration::days(14));

    let count = cart_service::count_cart(&state.pool, &member).await?;
    assert_eq!(count.data.unwrap().count, 0);

    let list = borrowing_service::list_borrowings(&state, &member)
        .await?
        .data
        .unwrap();
    assert_eq!(list.items.len(), 2);
    assert!(list.items.iter().all(|b| b.status == STATUS_BORROWED));
    // One shared due date across the whole checkout. Compare through the
    // database round trip, which truncates to microseconds.
    let first_due = list.items[0].due_date;
    assert!(list.items.iter().all(|b| b.due_date == first_due));
    assert!((first_due - summary.due_date).num_seconds().abs() < 1);
    assert_eq!(list.stats.total, 2);
    assert_eq!(list.stats.borrowed, 2);
    assert_eq!(list.stats.overdue, 0);
    assert_eq!(list.stats.returned, 0);

    // Each borrow took one copy off the shelf.
    assert_eq!(available_copies(&state, dune).await?, 2);
    assert_eq!(available_copies(&state, rust_book).await?, 0);

    // A book with no copies left cannot be staged again.
    let sold_out =
        cart_service::add_to_cart(&state.pool, &member, AddToCartRequest { book_id: rust_book })
            .await;
    assert!(matches!(sold_out, Err(AppError::BadRequest(_))));

    // Return one; the copy comes back and the counters move.
    let borrowing_id = list.items[0].id;
    let returned = borrowing_service::return_borrowing(&state, &member, borrowing_id)
        .await?
        .data
        .unwrap();
    assert_eq!(returned.status, STATUS_RETURNED);
    assert!(returned.returned_at.is_some());
    assert_eq!(
        available_copies(&state, returned.book_id).await?,
        if returned.book_id == dune { 3 } else { 1 }
    );

    let list = borrowing_service::list_borrowings(&state, &member)
        .await?
        .data
        .unwrap();
    assert_eq!(list.stats.total, 2);
    assert_eq!(list.stats.borrowed, 1);
    assert_eq!(list.stats.returned, 1);

    // Returning twice is rejected.
    let twice = borrowing_service::return_borrowing(&state, &member, borrowing_id).await;
    assert!(matches!(twice, Err(AppError::BadRequest(_))));

    // Checkout with an empty cart is a no-op error.
    let empty = borrowing_service::checkout(&state, &member).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    Ok(())
}

// A borrowing whose due date has passed shows up overdue without any
// mutation, and returning it moves the count from overdue to returned.
#[tokio::test]
async fn overdue_is_derived_and_cleared_by_return() -> anyhow::Result<()> {
    let _guard = DB_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let state = match setup_state().await? {
        Some(state) => state,
        None => return Ok(()),
    };

    let member = create_member(&state, "late@example.com").await?;
    let book_id = create_book(&state, "A Brief History of Time", "Stephen Hawking", 2).await?;

    let past_borrow = Utc::now() - Duration::days(20);
    BorrowingActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(member.user_id),
        book_id: Set(book_id),
        borrowed_at: Set(past_borrow.into()),
        due_date: Set((past_borrow + Duration::days(14)).into()),
        status: Set(STATUS_BORROWED.into()),
        returned_at: Set(None),
    }
    .insert(&state.orm)
    .await?;

    let list = borrowing_service::list_borrowings(&state, &member)
        .await?
        .data
        .unwrap();
    assert_eq!(list.stats.overdue, 1);
    assert!(list.items[0].overdue);

    borrowing_service::return_borrowing(&state, &member, list.items[0].id).await?;

    let list = borrowing_service::list_borrowings(&state, &member)
        .await?
        .data
        .unwrap();
    assert_eq!(list.stats.overdue, 0);
    assert_eq!(list.stats.returned, 1);
    assert!(!list.items[0].overdue);

    Ok(())
}

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs.
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE borrowings, cart_items, audit_logs, profiles, books, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(Some(AppState { pool, orm }))
}

async fn create_member(state: &AppState, email: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set("user".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

async fn create_book(
    state: &AppState,
    title: &str,
    author: &str,
    copies: i32,
) -> anyhow::Result<Uuid> {
    let book = BookActive {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        author: Set(author.to_string()),
        category: Set(None),
        cover_image: Set(None),
        available_copies: Set(copies),
        total_copies: Set(copies),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(book.id)
}

async fn available_copies(state: &AppState, book_id: Uuid) -> anyhow::Result<i32> {
    let book = Books::find_by_id(book_id)
        .one(&state.orm)
        .await?
        .expect("book exists");
    Ok(book.available_copies)
}
