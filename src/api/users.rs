//! Member profile endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::user::{UpdateProfile, UserProfile},
};

use super::AuthenticatedUser;

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/profile",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Member profile", body = UserProfile),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UserProfile>> {
    let profile = state.services.users.get_profile(claims.sub).await?;
    Ok(Json(profile))
}

/// Update the caller's profile
#[utoipa::path(
    put,
    path = "/profile",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = UserProfile),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Phone number already in use")
    )
)]
pub async fn update_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateProfile>,
) -> AppResult<Json<UserProfile>> {
    let profile = state
        .services
        .users
        .update_profile(claims.sub, request)
        .await?;
    Ok(Json(profile))
}
