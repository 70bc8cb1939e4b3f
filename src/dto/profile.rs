use serde::Deserialize;
use utoipa::ToSchema;

/// Only these two fields are writable through the profile surface;
/// email is immutable here.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}
