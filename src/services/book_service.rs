use crate::{
    db::DbPool,
    dto::books::{BookList, FeaturedBooks},
    error::AppResult,
    models::Book,
    response::{ApiResponse, Meta},
    routes::params::BookQuery,
};

/// Case-insensitive substring match of `q` against title OR author,
/// intersected with exact category equality. An empty query and the
/// "all" category are both identity filters.
pub fn matches_filter(book: &Book, q: Option<&str>, category: Option<&str>) -> bool {
    if let Some(q) = q.filter(|s| !s.is_empty()) {
        let needle = q.to_lowercase();
        let hit = book.title.to_lowercase().contains(&needle)
            || book.author.to_lowercase().contains(&needle);
        if !hit {
            return false;
        }
    }

    if let Some(category) = category.filter(|c| !c.is_empty() && *c != "all") {
        if book.category.as_deref() != Some(category) {
            return false;
        }
    }

    true
}

/// Distinct non-null categories in first-seen order.
pub fn distinct_categories(books: &[Book]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for book in books {
        if let Some(category) = book.category.as_deref() {
            if !categories.iter().any(|c| c == category) {
                categories.push(category.to_string());
            }
        }
    }
    categories
}

/// Catalog listing: the whole table ordered by title, filtered in
/// process. The category option list always reflects the unfiltered set.
pub async fn list_books(pool: &DbPool, query: BookQuery) -> AppResult<ApiResponse<BookList>> {
    let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY title")
        .fetch_all(pool)
        .await?;

    let categories = distinct_categories(&books);
    let items: Vec<Book> = books
        .into_iter()
        .filter(|book| matches_filter(book, query.q.as_deref(), query.category.as_deref()))
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success(
        "Books",
        BookList { items, categories },
        Some(meta),
    ))
}

/// Landing-page strip: up to 4 books.
pub async fn featured_books(pool: &DbPool) -> AppResult<ApiResponse<FeaturedBooks>> {
    let items = sqlx::query_as::<_, Book>("SELECT * FROM books LIMIT 4")
        .fetch_all(pool)
        .await?;

    Ok(ApiResponse::success(
        "Featured books",
        FeaturedBooks { items },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn book(title: &str, author: &str, category: Option<&str>) -> Book {
        Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: author.to_string(),
            category: category.map(str::to_string),
            cover_image: None,
            available_copies: 3,
            total_copies: 3,
            created_at: Utc::now(),
        }
    }

    fn shelf() -> Vec<Book> {
        vec![
            book("The Rust Programming Language", "Steve Klabnik", Some("Programming")),
            book("Dune", "Frank Herbert", Some("Science Fiction")),
            book("Rust for Rustaceans", "Jon Gjengset", Some("Programming")),
            book("Uncategorized Pamphlet", "Anonymous", None),
        ]
    }

    fn filtered(books: &[Book], q: Option<&str>, category: Option<&str>) -> Vec<String> {
        books
            .iter()
            .filter(|b| matches_filter(b, q, category))
            .map(|b| b.title.clone())
            .collect()
    }

    #[test]
    fn empty_query_is_identity() {
        let books = shelf();
        assert_eq!(filtered(&books, None, None).len(), books.len());
        assert_eq!(filtered(&books, Some(""), None).len(), books.len());
    }

    #[test]
    fn query_matches_title_or_author_case_insensitively() {
        let books = shelf();
        assert_eq!(
            filtered(&books, Some("rust"), None),
            vec!["The Rust Programming Language", "Rust for Rustaceans"]
        );
        // author hit
        assert_eq!(filtered(&books, Some("HERBERT"), None), vec!["Dune"]);
        assert!(filtered(&books, Some("zebra"), None).is_empty());
    }

    #[test]
    fn category_all_is_identity() {
        let books = shelf();
        assert_eq!(filtered(&books, None, Some("all")).len(), books.len());
    }

    #[test]
    fn category_filter_is_exact_match() {
        let books = shelf();
        assert_eq!(
            filtered(&books, None, Some("Programming")),
            vec!["The Rust Programming Language", "Rust for Rustaceans"]
        );
        // no partial category matches
        assert!(filtered(&books, None, Some("Program")).is_empty());
    }

    #[test]
    fn combined_filter_is_conjunction() {
        let books = shelf();
        assert_eq!(
            filtered(&books, Some("rustaceans"), Some("Programming")),
            vec!["Rust for Rustaceans"]
        );
        assert!(filtered(&books, Some("dune"), Some("Programming")).is_empty());
    }

    #[test]
    fn categories_are_distinct_non_null_in_first_seen_order() {
        let books = shelf();
        assert_eq!(
            distinct_categories(&books),
            vec!["Programming", "Science Fiction"]
        );
    }
}
