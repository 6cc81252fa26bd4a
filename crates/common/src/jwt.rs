//! JWT utilities shared by the credential check crates.
//!
//! This module provides the segment-level handling every JWT path needs
//! before any signature work happens:
//! - Size limits for DoS prevention
//! - Compact JWS splitting and base64url decoding of header/payload
//! - Key ID extraction from JWT headers
//! - Time claim validation (`iat`, `exp`, `nbf`) with clock skew tolerance
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Decoding a header or payload does NOT verify the signature
//! - Error messages never echo token contents

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (1MB).
///
/// Credential JWTs carry a full `vc` object (subject claims, status entries,
/// contexts, embedded evidence) and presentations carry whole credentials,
/// so the cap only rejects pathological input before base64 decode or
/// signature work.
pub const MAX_JWT_SIZE_BYTES: usize = 1_048_576;

/// Default JWT clock skew tolerance (5 minutes per NIST SP 800-63B).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum allowed JWT clock skew tolerance (10 minutes).
///
/// Bounds configuration so a typo cannot disable time checks.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while parsing or time-checking a JWT.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("token exceeds maximum size")]
    TokenTooLarge,

    /// Token is not a three-part compact JWS, or a segment does not decode.
    #[error("token is not a valid compact JWS")]
    MalformedToken,

    /// Token is missing the `kid` header.
    #[error("token header has no kid")]
    MissingKid,

    /// Token `iat` claim is too far in the future.
    #[error("token iat is in the future")]
    IatTooFarInFuture,

    /// Token `exp` claim has passed.
    #[error("token has expired")]
    Expired,

    /// Token `nbf` claim is in the future.
    #[error("token is not yet valid")]
    NotYetValid,
}

// =============================================================================
// Header / Segments
// =============================================================================

/// Protected header of a compact JWS.
///
/// `jwk` is kept as raw JSON so callers decide how to interpret an embedded
/// key (and whether to allow one at all).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtHeader {
    /// Signature algorithm (`ES256K`, `ES256`, `EdDSA`, ...).
    pub alg: String,

    /// Media type, usually `JWT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Key identifier, usually a DID URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Embedded public key for self-signed tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwk: Option<serde_json::Value>,
}

/// The three base64url segments of a compact JWS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JwtParts<'a> {
    /// Encoded protected header.
    pub header: &'a str,
    /// Encoded payload.
    pub payload: &'a str,
    /// Encoded signature.
    pub signature: &'a str,
}

impl JwtParts<'_> {
    /// The JWS signing input, `header.payload`.
    #[must_use]
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Split a compact JWS into its segments after the size check.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - token does not have exactly three non-empty
///   header/payload segments
pub fn split_compact(token: &str) -> Result<JwtParts<'_>, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
        return Err(JwtValidationError::MalformedToken);
    };

    if header.is_empty() || payload.is_empty() {
        tracing::debug!(target: "common.jwt", "Token rejected: empty JWT segment");
        return Err(JwtValidationError::MalformedToken);
    }

    Ok(JwtParts {
        header,
        payload,
        signature,
    })
}

/// Decode the protected header without verifying the signature.
///
/// # Errors
///
/// Returns `TokenTooLarge` or `MalformedToken` (bad structure, base64, or JSON,
/// or a header without `alg`).
pub fn decode_header(token: &str) -> Result<JwtHeader, JwtValidationError> {
    let parts = split_compact(token)?;
    decode_segment(parts.header, "header")
}

/// Decode the payload into `T` without verifying the signature.
///
/// # Errors
///
/// Returns `TokenTooLarge` or `MalformedToken`.
pub fn decode_payload<T: DeserializeOwned>(token: &str) -> Result<T, JwtValidationError> {
    let parts = split_compact(token)?;
    decode_segment(parts.payload, "payload")
}

fn decode_segment<T: DeserializeOwned>(
    segment: &str,
    name: &'static str,
) -> Result<T, JwtValidationError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", segment = name, error = %e, "Failed to decode JWT segment base64");
        JwtValidationError::MalformedToken
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", segment = name, error = %e, "Failed to parse JWT segment JSON");
        JwtValidationError::MalformedToken
    })
}

/// Extract the `kid` (key ID) from a JWT header without verifying the signature.
///
/// The `kid` must only be used to look up a key; the token still has to be
/// verified with that key.
///
/// # Errors
///
/// - `TokenTooLarge` / `MalformedToken` - see [`decode_header`]
/// - `MissingKid` - header has no `kid`, or it is empty
pub fn extract_kid(token: &str) -> Result<String, JwtValidationError> {
    decode_header(token)?
        .kid
        .filter(|s| !s.is_empty())
        .ok_or(JwtValidationError::MissingKid)
}

/// Validate the `iat` (issued-at) claim with clock skew tolerance.
///
/// # Errors
///
/// Returns `IatTooFarInFuture` if `iat` is more than `clock_skew` ahead of now.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    validate_iat_at(iat, clock_skew, chrono::Utc::now().timestamp())
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
///
/// # Errors
///
/// Returns `IatTooFarInFuture` if `iat > now + clock_skew`.
pub fn validate_iat_at(iat: i64, clock_skew: Duration, now: i64) -> Result<(), JwtValidationError> {
    let max_iat = now.saturating_add(skew_secs(clock_skew));

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

/// Validate `exp` and `nbf` against `now`, each widened by `clock_skew`.
///
/// Absent claims are not checked.
///
/// # Errors
///
/// Returns `Expired` when `exp + skew <= now`, `NotYetValid` when
/// `nbf - skew > now`.
pub fn validate_time_window_at(
    exp: Option<i64>,
    nbf: Option<i64>,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    let skew = skew_secs(clock_skew);

    if let Some(exp) = exp {
        if exp.saturating_add(skew) <= now {
            tracing::debug!(target: "common.jwt", exp = exp, now = now, "Token rejected: expired");
            return Err(JwtValidationError::Expired);
        }
    }

    if let Some(nbf) = nbf {
        if nbf.saturating_sub(skew) > now {
            tracing::debug!(target: "common.jwt", nbf = nbf, now = now, "Token rejected: not yet valid");
            return Err(JwtValidationError::NotYetValid);
        }
    }

    Ok(())
}

fn skew_secs(clock_skew: Duration) -> i64 {
    i64::try_from(clock_skew.as_secs()).unwrap_or(i64::MAX)
}

/// Decode a base64url (no padding) value such as a JWK coordinate.
///
/// # Errors
///
/// Returns `base64::DecodeError` if the value is not base64url.
pub fn decode_base64url(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(value)
}

/// Encode bytes as base64url without padding.
#[must_use]
pub fn encode_base64url(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

// =============================================================================
// Tests
// =============================================================================
