use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_library_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let member_id = ensure_member(&pool, "member@example.com", "member123").await?;
    seed_books(&pool).await?;

    println!("Seed completed. Member ID: {member_id}");
    Ok(())
}

async fn ensure_member(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await?;

    // If the user already exists, fetch its id.
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    sqlx::query(
        r#"
        INSERT INTO profiles (id, email, full_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind("Demo Member")
    .execute(pool)
    .await?;

    println!("Ensured member {email}");
    Ok(user_id)
}

async fn seed_books(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let books = vec![
        ("The Rust Programming Language", "Steve Klabnik", Some("Programming"), 4),
        ("Dune", "Frank Herbert", Some("Science Fiction"), 3),
        ("Pride and Prejudice", "Jane Austen", Some("Classics"), 2),
        ("The Pragmatic Programmer", "Andrew Hunt", Some("Programming"), 3),
        ("A Brief History of Time", "Stephen Hawking", Some("Science"), 2),
        ("The Name of the Wind", "Patrick Rothfuss", Some("Fantasy"), 5),
        ("Collected Essays", "Various", None, 1),
    ];

    for (title, author, category, copies) in books {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, category, available_copies, total_copies)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (title) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(author)
        .bind(category)
        .bind(copies)
        .execute(pool)
        .await?;
    }

    println!("Seeded books");
    Ok(())
}
