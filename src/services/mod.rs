pub mod auth_service;
pub mod book_service;
pub mod borrowing_service;
pub mod cart_service;
pub mod profile_service;
