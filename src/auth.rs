//! Actor identity consumed by every scoped operation.
//!
//! Token issuance lives in the identity service; this module only decodes the bearer
//! token it mints: `<kind>:<subject>[:<unix-expiry>]` where kind is `user` or `company`.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

/// Which side of the board the caller is acting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    User,
    Company,
}

/// Authenticated caller identity, opaque beyond kind and subject id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub subject: String,
    pub kind: ActorKind,
}

impl Actor {
    pub fn user(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            kind: ActorKind::User,
        }
    }

    pub fn company(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            kind: ActorKind::Company,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthRejection {
    #[error("missing bearer token")]
    Missing,
    #[error("malformed bearer token")]
    Malformed,
    #[error("bearer token expired")]
    Expired,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.to_string() });
        (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
    }
}

/// Decode a raw token (the part after `Bearer `).
pub fn parse_token(token: &str) -> Result<Actor, AuthRejection> {
    let mut parts = token.trim().splitn(3, ':');
    let kind = match parts.next() {
        Some("user") => ActorKind::User,
        Some("company") => ActorKind::Company,
        _ => return Err(AuthRejection::Malformed),
    };
    let subject = match parts.next() {
        Some(subject) if !subject.is_empty() => subject.to_string(),
        _ => return Err(AuthRejection::Malformed),
    };
    if let Some(raw_expiry) = parts.next() {
        let expiry: i64 = raw_expiry.parse().map_err(|_| AuthRejection::Malformed)?;
        if expiry <= Utc::now().timestamp() {
            return Err(AuthRejection::Expired);
        }
    }
    Ok(Actor { subject, kind })
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthRejection::Missing)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthRejection::Malformed)?;
        parse_token(token)
    }
}
