//! Client-side session token inspection.
//!
//! The device holds no signing secret, so the signature is not (and cannot
//! be) verified here - the server re-verifies it on every request. The client
//! only decodes the expiry claim and compares it to the local clock; no
//! network call is involved.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::{ClientError, Result};

#[derive(Debug, Deserialize)]
struct RawClaims {
    exp: i64,
}

/// Decode the expiry claim of a session token without verifying its signature.
pub fn decode_expiry(token: &str) -> Result<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;

    let data =
        decode::<RawClaims>(token, &DecodingKey::from_secret(&[]), &validation).map_err(|_| ClientError::MalformedToken)?;

    DateTime::from_timestamp(data.claims.exp, 0).ok_or(ClientError::MalformedToken)
}

/// Whether the token's embedded expiry timestamp has passed on the local clock.
pub fn is_expired(token: &str) -> Result<bool> {
    let expiry = decode_expiry(token)?;
    Ok(expiry <= Utc::now())
}
