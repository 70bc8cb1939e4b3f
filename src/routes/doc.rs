use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        books::{BookList, FeaturedBooks},
        borrowings::{BorrowingDto, BorrowingList, BorrowingStats, CheckoutSummary},
        cart::{AddToCartRequest, CartCount, CartItemDto, CartList},
        profile::UpdateProfileRequest,
    },
    models::{Book, Borrowing, CartItem, Profile},
    response::{ApiResponse, Meta},
    routes::{auth, books, borrowings, cart, health, params, profile},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        books::list_books,
        books::featured_books,
        cart::cart_list,
        cart::cart_count,
        cart::add_to_cart,
        cart::remove_from_cart,
        borrowings::list_borrowings,
        borrowings::checkout,
        borrowings::return_borrowing,
        profile::get_profile,
        profile::update_profile
    ),
    components(
        schemas(
            Book,
            CartItem,
            Borrowing,
            Profile,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            BookList,
            FeaturedBooks,
            AddToCartRequest,
            CartList,
            CartItemDto,
            CartCount,
            BorrowingDto,
            BorrowingStats,
            BorrowingList,
            CheckoutSummary,
            UpdateProfileRequest,
            params::BookQuery,
            Meta,
            ApiResponse<Book>,
            ApiResponse<BookList>,
            ApiResponse<CartList>,
            ApiResponse<BorrowingList>,
            ApiResponse<Profile>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Member registration and login"),
        (name = "Books", description = "Catalog browsing"),
        (name = "Cart", description = "Staged borrow selections"),
        (name = "Borrowings", description = "Loan lifecycle"),
        (name = "Profile", description = "Member profile"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
