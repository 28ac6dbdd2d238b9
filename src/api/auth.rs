use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{error, info};
use serde::Serialize;

use crate::api::routes::ApiError;
use crate::api::state::AppState;
use crate::config::ApiConfig;

pub const SUPER_USER: &str = "super_user";

/// An authenticated API user
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub sub: String,
    pub scope: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    BadKey,
    NotAuthorized,
}

/// Check an API key against the shared secret and the user against the allow list
pub fn authenticate_user(
    api: &ApiConfig,
    secret_key: &str,
    user_email: &str,
    api_key: &str,
) -> Result<Principal, AuthError> {
    info!("Receiving login attempt; {user_email}");
    if secret_key.is_empty() || api_key != secret_key {
        error!("API key for {user_email} doesn't match");
        return Err(AuthError::BadKey);
    }
    if !api.authorized_users.iter().any(|user| user == user_email) {
        error!("{user_email} not in authorized users");
        return Err(AuthError::NotAuthorized);
    }

    Ok(Principal { sub: user_email.to_string(), scope: SUPER_USER.to_string() })
}

/// Split a `Basic` authorization header into user email and API key
fn basic_credentials(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user_email, api_key) = decoded.split_once(':')?;
    Some((user_email.to_string(), api_key.to_string()))
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let (user_email, api_key) = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(basic_credentials)
            .ok_or_else(|| ApiError::unauthorized("Missing credentials"))?;

        authenticate_user(&state.config.api, &state.config.secrets.api_secret_key, &user_email, &api_key)
            .map_err(|_| ApiError::unauthorized("Invalid credentials"))
    }
}
