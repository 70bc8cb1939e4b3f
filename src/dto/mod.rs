pub mod auth;
pub mod books;
pub mod borrowings;
pub mod cart;
pub mod profile;
