//! HS256 bearer tokens for the admin dashboard.
//!
//! Tokens are compact JWTs: base64url (no padding) header, claims and
//! HMAC-SHA256 signature joined with dots.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{TimeDelta, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Invalid signing key")]
    InvalidKey,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub admin: bool,
    /// Issued at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

impl AdminClaims {
    pub fn new_admin() -> Self {
        let now = Utc::now();
        Self {
            admin: true,
            iat: now.timestamp(),
            exp: (now + TimeDelta::hours(TOKEN_TTL_HOURS)).timestamp(),
        }
    }
}

#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<Hmac<Sha256>, TokenError> {
        Hmac::<Sha256>::new_from_slice(&self.secret).map_err(|_| TokenError::InvalidKey)
    }

    pub fn sign(&self, claims: &AdminClaims) -> Result<String, TokenError> {
        let header = Header {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };
        let header = serde_json::to_vec(&header).map_err(|_| TokenError::Malformed)?;
        let claims = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verifies signature and expiry. The `admin` claim is left to the caller.
    pub fn verify(&self, token: &str) -> Result<AdminClaims, TokenError> {
        let mut parts = token.trim().split('.');
        let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let header: Header = decode_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(TokenError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| TokenError::Malformed)?;
        let mut mac = self.mac()?;
        mac.update(format!("{header_b64}.{claims_b64}").as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims: AdminClaims = decode_json(claims_b64)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Compares a login attempt with the configured password. Both are MACed
    /// and the tags compared in constant time.
    pub fn password_matches(&self, attempt: &str, expected: &str) -> bool {
        let Ok(mut expected_mac) = self.mac() else {
            return false;
        };
        expected_mac.update(expected.as_bytes());
        let expected_tag = expected_mac.finalize().into_bytes();

        let Ok(mut attempt_mac) = self.mac() else {
            return false;
        };
        attempt_mac.update(attempt.as_bytes());
        attempt_mac.verify_slice(&expected_tag).is_ok()
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let raw = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)
}
