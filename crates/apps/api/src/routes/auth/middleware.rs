use crate::api_state::ApiContext;
use crate::routes::auth::error::AuthError;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

/// Extractor that only succeeds for requests carrying `Authorization: Bearer <owner password>`.
#[derive(Clone, Copy, Debug)]
pub struct Owner;

/// Get auth token from Parts.
fn extract_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl FromRequestParts<ApiContext> for Owner {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        context: &ApiContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;
        let expected = &context.settings.secrets.owner_password;
        if expected.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        if constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            Ok(Self)
        } else {
            Err(AuthError::NotOwner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_whole_secrets() {
        assert!(constant_time_eq(b"hunter2", b"hunter2"));
        assert!(!constant_time_eq(b"hunter2", b"hunter3"));
        assert!(!constant_time_eq(b"hunter2", b"hunter22"));
    }
}
