//! Bearer-token authentication for HTTP handlers.
//!
//! Handlers take [`Authenticated`] as an argument to require a valid
//! `Authorization: Bearer <token>` header. The token is resolved through the
//! [`crate::domain::ports::TokenStore`] held in [`HttpState`]; anything other
//! than a known, unexpired token is answered with `401 Unauthorized`.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{AccessToken, Error, UserId};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// The raw bearer token presented with a request.
#[derive(Debug, Clone)]
pub struct BearerToken(pub AccessToken);

/// The user behind a valid bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// Resolved user id.
    pub user_id: UserId,
    /// Token the request carried.
    pub token: AccessToken,
}

fn missing_token() -> Error {
    Error::unauthorized("missing or malformed bearer token")
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively; empty tokens are rejected.
pub(crate) fn parse_bearer(header: &str) -> Option<AccessToken> {
    let (scheme, rest) = header.split_at_checked(BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then(|| AccessToken::new(token))
}

fn bearer_from(req: &HttpRequest) -> Result<AccessToken, Error> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
        .ok_or_else(missing_token)
}

impl FromRequest for BearerToken {
    type Error = actix_web::Error;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        std::future::ready(bearer_from(req).map(BearerToken).map_err(Into::into))
    }
}

impl FromRequest for Authenticated {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_from(req);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let token = token?;
            let state = state
                .ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let user_id = state
                .tokens
                .validate(&token)
                .await
                .map_err(Error::from)?
                .ok_or_else(|| {
                    debug!("rejected unknown or expired bearer token");
                    Error::unauthorized("invalid or expired token")
                })?;
            Ok(Self { user_id, token })
        })
    }
}
