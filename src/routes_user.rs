use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::envelope::{ok, ok_with_message};
use crate::error::{ApiResult, AppError};
use crate::extract::AppJson;
use crate::models::PublicUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

// -----------------------------
// GET /api/user/profile
// -----------------------------
pub async fn get_profile(State(state): State<AppState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
    let db = state.store.load()?;
    let found = db
        .users
        .iter()
        .find(|u| u.id == user.id)
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    Ok(ok(PublicUser::from(found)))
}

// -----------------------------
// PUT /api/user/profile
// Only the fields present in the body are changed
// -----------------------------
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(input): AppJson<UpdateProfileInput>,
) -> ApiResult<impl IntoResponse> {
    if input.full_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("full_name must not be empty".to_string()));
    }
    let email = input.email.map(|e| e.trim().to_lowercase());
    if email.as_deref().is_some_and(|e| !e.contains('@')) {
        return Err(AppError::BadRequest("invalid email".to_string()));
    }

    let updated = state.store.update(|db| {
        if let Some(email) = &email {
            if db.users.iter().any(|u| u.id != user.id && &u.email == email) {
                return Err(AppError::Conflict("email is used by another account".to_string()));
            }
        }
        let Some(found) = db.users.iter_mut().find(|u| u.id == user.id) else {
            return Err(AppError::NotFound("user not found".to_string()));
        };
        if let Some(name) = input.full_name {
            found.full_name = name.trim().to_string();
        }
        if let Some(email) = email {
            found.email = email;
        }
        if let Some(phone) = input.phone {
            found.phone = Some(phone).filter(|p| !p.trim().is_empty());
        }
        Ok(PublicUser::from(&*found))
    })?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(ok_with_message(updated, "profile updated"))
}
