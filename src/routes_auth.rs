// --------------------------------------------------
// Account endpoints: register, login, current user,
// password change and logout.
//
// Tokens are stateless; logout only tells the client
// to drop its token.
// --------------------------------------------------

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{hash_password, issue_token, verify_password, AuthError, AuthUser};
use crate::envelope::{done, ok, ok_with_message};
use crate::error::{ApiResult, AppError};
use crate::extract::AppJson;
use crate::models::{PublicUser, User};
use crate::state::{now, AppState};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

fn validate_register(input: &RegisterInput) -> ApiResult<()> {
    if input.username.trim().chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::BadRequest(format!(
            "username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if input.full_name.trim().is_empty() {
        return Err(AppError::BadRequest("full_name required".to_string()));
    }
    let email = input.email.trim();
    let valid_email = email
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if !valid_email {
        return Err(AppError::BadRequest("invalid email".to_string()));
    }
    Ok(())
}

// -----------------------------
// POST /api/auth/register
// Creates an account; username and email must be unique
// -----------------------------
pub async fn register(
    State(state): State<AppState>,
    AppJson(input): AppJson<RegisterInput>,
) -> ApiResult<impl IntoResponse> {
    validate_register(&input)?;

    let username = input.username.trim().to_string();
    let email = input.email.trim().to_lowercase();
    let password_hash = hash_password(&input.password)?;

    let user = state.store.update(|db| {
        if db
            .users
            .iter()
            .any(|u| u.username == username || u.email == email)
        {
            return Err(AppError::Conflict("username or email already exists".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username,
            password_hash,
            full_name: input.full_name.trim().to_string(),
            email,
            phone: input.phone.filter(|p| !p.trim().is_empty()),
            is_active: true,
            created_at: now(),
            last_login: None,
        };
        db.users.push(user.clone());
        Ok(user)
    })?;

    tracing::info!(user_id = %user.id, username = %user.username, "Registered account");
    Ok((
        StatusCode::CREATED,
        ok_with_message(PublicUser::from(&user), "registered"),
    ))
}

// -----------------------------
// POST /api/auth/login
// Verifies the password and returns a bearer token
// -----------------------------
pub async fn login(
    State(state): State<AppState>,
    AppJson(input): AppJson<LoginInput>,
) -> ApiResult<impl IntoResponse> {
    if input.username.trim().is_empty() || input.password.is_empty() {
        return Err(AppError::BadRequest("username and password required".to_string()));
    }

    let at = now();
    let username = input.username.trim();
    let user = state.store.update(|db| {
        let Some(user) = db
            .users
            .iter_mut()
            .find(|u| u.username == username && u.is_active)
        else {
            return Err(AppError::from(AuthError::BadCredentials));
        };
        if !verify_password(&input.password, &user.password_hash) {
            return Err(AuthError::BadCredentials.into());
        }
        user.last_login = Some(at);
        Ok(user.clone())
    })?;

    let ttl = if input.remember {
        state.config.remember_ttl_days
    } else {
        state.config.token_ttl_days
    };
    let token = issue_token(user.id, &user.username, ttl, at, &state.config.jwt_secret)?;

    tracing::info!(user_id = %user.id, remember = input.remember, "Login");
    Ok(ok_with_message(
        LoginResponse {
            token,
            user: PublicUser::from(&user),
        },
        "logged in",
    ))
}

// -----------------------------
// GET /api/auth/me
// -----------------------------
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
    let db = state.store.load()?;
    let Some(found) = db.users.iter().find(|u| u.id == user.id) else {
        return Err(AppError::NotFound("user not found".to_string()));
    };
    Ok(ok(PublicUser::from(found)))
}

// -----------------------------
// POST /api/auth/change-password
// -----------------------------
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(input): AppJson<ChangePasswordInput>,
) -> ApiResult<impl IntoResponse> {
    if input.current_password.is_empty() || input.new_password.is_empty() {
        return Err(AppError::BadRequest("current and new password required".to_string()));
    }
    if input.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "new password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let new_hash = hash_password(&input.new_password)?;
    state.store.update(|db| {
        let Some(found) = db.users.iter_mut().find(|u| u.id == user.id) else {
            return Err(AppError::NotFound("user not found".to_string()));
        };
        if !verify_password(&input.current_password, &found.password_hash) {
            return Err(AuthError::BadCredentials.into());
        }
        found.password_hash = new_hash;
        Ok(())
    })?;

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(done("password changed"))
}

// -----------------------------
// POST /api/auth/logout
// -----------------------------
pub async fn logout(user: AuthUser) -> impl IntoResponse {
    tracing::info!(user_id = %user.id, "Logout");
    done("logged out")
}
