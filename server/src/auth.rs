// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::error::AppError;
use axum::{extract::FromRequestParts, http::StatusCode, http::request::Parts};
use tracing::warn;

/// Header through which the auth layer in front of this service passes the
/// id of the signed-in user.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// The user a request acts on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            warn!(path = %parts.uri.path(), "Missing {} header", USER_ID_HEADER);
            return Err(AppError::new(
                StatusCode::UNAUTHORIZED,
                "Authentication required. Please include the X-User-Id header.",
            ));
        };

        value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(CurrentUser)
            .ok_or_else(|| {
                warn!(path = %parts.uri.path(), "Malformed {} header", USER_ID_HEADER);
                AppError::new(StatusCode::UNAUTHORIZED, "Invalid X-User-Id header.")
            })
    }
}
