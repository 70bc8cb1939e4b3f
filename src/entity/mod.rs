pub mod audit_logs;
pub mod books;
pub mod borrowings;
pub mod cart_items;
pub mod profiles;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use books::Entity as Books;
pub use borrowings::Entity as Borrowings;
pub use cart_items::Entity as CartItems;
pub use profiles::Entity as Profiles;
pub use users::Entity as Users;
