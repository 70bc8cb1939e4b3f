use crate::{
    audit::log_audit,
    db::DbPool,
    dto::profile::UpdateProfileRequest,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
    response::ApiResponse,
};

pub async fn get_profile(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;
    let profile = match profile {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Profile", profile, None))
}

/// Writes full_name and phone only. Email never changes through this
/// surface, whatever the request carries.
pub async fn update_profile(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    let profile: Option<Profile> = sqlx::query_as(
        r#"
        UPDATE profiles
        SET full_name = $2, phone = $3
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(payload.full_name)
    .bind(payload.phone)
    .fetch_optional(pool)
    .await?;
    let profile = match profile {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "profile_update",
        Some("profiles"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Profile updated", profile, None))
}
