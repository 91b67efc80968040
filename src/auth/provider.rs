use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::app::AppState;
use crate::auth::models::{Claims, Identity};
use crate::error::AppError;

/// Resolves the caller identity for a request.
///
/// Mirrors the identity provider's `currentIdentity()` contract: an absent
/// credential resolves to `None` (anonymous caller); a credential that is
/// present but malformed or expired is an authentication failure, not
/// anonymity.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, authorization: Option<&str>) -> Result<Option<Identity>, AppError>;
}

/// Identity provider validating HS256 bearer tokens.
///
/// The signing secret is shared with the external identity service
/// (`AUTH_JWT_SECRET`); the subject claim is taken as the opaque user id.
pub struct JwtIdentityProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl IdentityProvider for JwtIdentityProvider {
    fn resolve(&self, authorization: Option<&str>) -> Result<Option<Identity>, AppError> {
        let Some(header) = authorization else {
            return Ok(None);
        };

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthenticated)?;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AppError::Unauthenticated)?;

        Ok(Some(data.claims.into_identity()))
    }
}

fn authorization_header(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
}

/// Extractor for operations that require an authenticated caller.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Identity);

impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = state
            .identity
            .resolve(authorization_header(parts))?
            .ok_or(AppError::Unauthenticated)?;

        Ok(CallerIdentity(identity))
    }
}

/// Extractor for operations with an anonymous path (published reads).
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl FromRequestParts<AppState> for MaybeIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = state.identity.resolve(authorization_header(parts))?;
        Ok(MaybeIdentity(identity))
    }
}
