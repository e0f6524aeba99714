//! Bearer-token verification.
//!
//! Validates `Authorization: Bearer <token>` against the identity
//! provider's signing key and hands the handlers an [`Identity`] via the
//! [`Caller`] extractor. Nothing past this module ever sees a token.

use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use nb_core::types::Identity;
use serde_json::Value;

pub struct AuthVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    /// Profile claims arrive namespaced under the API audience, e.g.
    /// `https://api.example.com/email`.
    claim_namespace: String,
}

impl AuthVerifier {
    /// Production configuration: RS256 against the provider's public key.
    pub fn rs256(
        public_key_pem: &[u8],
        issuer: &str,
        audience: &str,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem)?;
        Ok(Self::with_key(decoding_key, Algorithm::RS256, issuer, audience))
    }

    /// Symmetric-key configuration for local development and tests.
    pub fn hs256(secret: &[u8], issuer: &str, audience: &str) -> Self {
        Self::with_key(
            DecodingKey::from_secret(secret),
            Algorithm::HS256,
            issuer,
            audience,
        )
    }

    fn with_key(
        decoding_key: DecodingKey,
        algorithm: Algorithm,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        Self {
            decoding_key,
            validation,
            claim_namespace: audience.to_string(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = jsonwebtoken::decode::<Value>(token, &self.decoding_key, &self.validation)
            .map_err(|err| AuthError::InvalidToken(err.to_string()))?;
        identity_from_claims(&self.claim_namespace, &data.claims)
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingToken => "missing authorization token".to_string(),
            Self::InvalidToken(reason) => format!("invalid token: {reason}"),
        };
        let body = serde_json::json!({ "code": "unauthorized", "message": message });
        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

/// Extractor for handlers that require authentication. Extraction fails
/// with 401 before the handler body runs.
pub struct Caller(pub Identity);

impl FromRequestParts<AppState> for Caller {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AuthError::MissingToken)?;
        let identity = state.auth.verify(token)?;
        Ok(Self(identity))
    }
}

fn identity_from_claims(namespace: &str, claims: &Value) -> Result<Identity, AuthError> {
    let subject = claims
        .get("sub")
        .and_then(Value::as_str)
        .ok_or_else(|| AuthError::InvalidToken("missing sub claim".to_string()))?;
    Ok(Identity {
        subject: subject.to_string(),
        name: namespaced_claim(claims, namespace, "name"),
        email: namespaced_claim(claims, namespace, "email"),
    })
}

fn namespaced_claim(claims: &Value, namespace: &str, key: &str) -> Option<String> {
    claims
        .get(format!("{namespace}/{key}").as_str())
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const ISSUER: &str = "https://issuer.example.com/";
    const AUDIENCE: &str = "https://api.example.com";

    fn token(claims: &Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    fn verifier() -> AuthVerifier {
        AuthVerifier::hs256(b"test-secret", ISSUER, AUDIENCE)
    }

    fn exp() -> i64 {
        (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp()
    }

    #[test]
    fn extracts_namespaced_profile_claims() {
        let claims = serde_json::json!({
            "sub": "auth0|alice",
            "iss": ISSUER,
            "aud": AUDIENCE,
            "exp": exp(),
            "https://api.example.com/name": "Alice",
            "https://api.example.com/email": "alice@example.com",
        });
        let identity = verifier().verify(&token(&claims)).unwrap();
        assert_eq!(identity.subject, "auth0|alice");
        assert_eq!(identity.name.as_deref(), Some("Alice"));
        assert_eq!(identity.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn profile_claims_are_optional() {
        let claims = serde_json::json!({
            "sub": "auth0|bob",
            "iss": ISSUER,
            "aud": AUDIENCE,
            "exp": exp(),
        });
        let identity = verifier().verify(&token(&claims)).unwrap();
        assert_eq!(identity.subject, "auth0|bob");
        assert!(identity.name.is_none());
        assert!(identity.email.is_none());
    }

    #[test]
    fn rejects_wrong_audience() {
        let claims = serde_json::json!({
            "sub": "auth0|mallory",
            "iss": ISSUER,
            "aud": "https://other.example.com",
            "exp": exp(),
        });
        assert!(matches!(
            verifier().verify(&token(&claims)),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let claims = serde_json::json!({
            "sub": "auth0|mallory",
            "iss": ISSUER,
            "aud": AUDIENCE,
            "exp": (chrono::Utc::now() - chrono::Duration::hours(1)).timestamp(),
        });
        assert!(matches!(
            verifier().verify(&token(&claims)),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_missing_subject() {
        let claims = serde_json::json!({
            "iss": ISSUER,
            "aud": AUDIENCE,
            "exp": exp(),
        });
        assert!(matches!(
            verifier().verify(&token(&claims)),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
