//! JWT payload inspection.
//!
//! The login endpoint returns a JWT whose payload carries the user id.
//! Nothing here verifies signatures - the token is treated as an opaque
//! credential and only its middle segment is read for the `userId` claim.

use base64::engine::general_purpose::GeneralPurposeConfig;
use base64::engine::{DecodePaddingMode, GeneralPurpose};
use base64::{alphabet, Engine};
use thiserror::Error;

// Tokens from the wild arrive both padded and unpadded
const LENIENT_CONFIG: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_CONFIG);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_CONFIG);

#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("Token does not have three segments")]
    Malformed,

    #[error("Token payload is not valid base64")]
    Encoding,

    #[error("Token payload is not valid JSON: {0}")]
    Payload(String),

    #[error("Token payload has no usable userId claim")]
    MissingUserId,
}

/// Pull the `userId` claim out of a JWT without verifying it.
/// Accepts both base64url (per the JWT spec) and standard base64 (seen
/// from older server builds), padded or not. The claim itself may arrive
/// as a number or a numeric string.
pub fn extract_user_id(token: &str) -> Result<i64, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Malformed);
    }
    let payload = segments[1];
    if payload.is_empty() {
        return Err(TokenError::Malformed);
    }

    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .or_else(|_| STANDARD_LENIENT.decode(payload))
        .map_err(|_| TokenError::Encoding)?;

    let claims: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| TokenError::Payload(e.to_string()))?;

    match claims.get("userId") {
        Some(serde_json::Value::Number(n)) => n.as_i64().ok_or(TokenError::MissingUserId),
        Some(serde_json::Value::String(s)) => {
            s.parse::<i64>().map_err(|_| TokenError::MissingUserId)
        }
        _ => Err(TokenError::MissingUserId),
    }
}
