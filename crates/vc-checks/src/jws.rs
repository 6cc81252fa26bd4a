//! Compact JWS signature verification and ES256K signing.
//!
//! ES256K (secp256k1) is handled with `k256` because `jsonwebtoken` has no
//! secp256k1 support. Every other asymmetric algorithm goes through
//! `jsonwebtoken`'s signature primitives. HMAC algorithms are rejected:
//! a public JWK can never verify them.

use crate::keys::{PrivateJwk, PublicJwk};
use common::jwt::{decode_base64url, encode_base64url, split_compact, JwtHeader};
use common::secret::ExposeSecret;
use jsonwebtoken::{Algorithm, DecodingKey};
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

/// JOSE name of the secp256k1 ECDSA algorithm.
pub const ES256K: &str = "ES256K";

/// Reasons a signature did not verify.
///
/// Callers performing a tamper check collapse all of these into `FAIL`;
/// presentation verification surfaces the message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwsError {
    #[error("malformed jws")]
    Malformed,

    #[error("unsupported algorithm {0}")]
    UnsupportedAlgorithm(String),

    #[error("algorithm {alg} does not match key type {kty}")]
    KeyMismatch { alg: String, kty: String },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("signature verification failed")]
    InvalidSignature,
}

/// Verify a compact JWS against `jwk`, returning the decoded header.
///
/// # Errors
///
/// Returns a [`JwsError`] describing why the token does not verify.
pub fn verify_compact(token: &str, jwk: &PublicJwk) -> Result<JwtHeader, JwsError> {
    let parts = split_compact(token).map_err(|_| JwsError::Malformed)?;
    let header: JwtHeader = decode_json(parts.header)?;
    let message = parts.signing_input();

    if header.alg == ES256K {
        verify_es256k(jwk, message.as_bytes(), parts.signature)?;
        return Ok(header);
    }

    let alg = Algorithm::from_str(&header.alg)
        .map_err(|_| JwsError::UnsupportedAlgorithm(header.alg.clone()))?;
    let key = decoding_key(jwk, alg, &header.alg)?;

    match jsonwebtoken::crypto::verify(parts.signature, message.as_bytes(), &key, alg) {
        Ok(true) => Ok(header),
        Ok(false) | Err(_) => Err(JwsError::InvalidSignature),
    }
}

/// Sign `claims` as an ES256K compact JWS with `header`.
///
/// `header.alg` is forced to `ES256K`.
///
/// # Errors
///
/// Returns `InvalidKey` when the private key is not a secp256k1 scalar and
/// `Malformed` when the header or claims cannot be serialized.
pub fn sign_es256k<T: Serialize>(
    header: &JwtHeader,
    claims: &T,
    key: &PrivateJwk,
) -> Result<String, JwsError> {
    if !key.public.is_secp256k1() {
        return Err(JwsError::KeyMismatch {
            alg: ES256K.to_string(),
            kty: key.public.kty.clone(),
        });
    }

    let d = decode_base64url(key.d.expose_secret())
        .map_err(|_| JwsError::InvalidKey("d is not base64url".to_string()))?;
    let signing_key = SigningKey::from_slice(&d)
        .map_err(|_| JwsError::InvalidKey("d is not a secp256k1 scalar".to_string()))?;

    let header = JwtHeader {
        alg: ES256K.to_string(),
        ..header.clone()
    };
    let header_json = serde_json::to_vec(&header).map_err(|_| JwsError::Malformed)?;
    let claims_json = serde_json::to_vec(claims).map_err(|_| JwsError::Malformed)?;
    let signing_input = format!(
        "{}.{}",
        encode_base64url(header_json),
        encode_base64url(claims_json)
    );

    let signature: Signature = signing_key.sign(signing_input.as_bytes());
    Ok(format!(
        "{signing_input}.{}",
        encode_base64url(signature.to_bytes())
    ))
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, JwsError> {
    let bytes = decode_base64url(segment).map_err(|_| JwsError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| JwsError::Malformed)
}

fn verify_es256k(jwk: &PublicJwk, message: &[u8], signature: &str) -> Result<(), JwsError> {
    if !jwk.is_secp256k1() {
        return Err(JwsError::KeyMismatch {
            alg: ES256K.to_string(),
            kty: jwk.kty.clone(),
        });
    }

    let x = coordinate(jwk.x.as_deref(), "x")?;
    let y = coordinate(jwk.y.as_deref(), "y")?;
    let mut sec1 = Vec::with_capacity(65);
    sec1.push(0x04);
    sec1.extend_from_slice(&x);
    sec1.extend_from_slice(&y);

    let verifying_key = VerifyingKey::from_sec1_bytes(&sec1)
        .map_err(|_| JwsError::InvalidKey("point is not on secp256k1".to_string()))?;

    let signature_bytes = decode_base64url(signature).map_err(|_| JwsError::Malformed)?;
    let signature =
        Signature::from_slice(&signature_bytes).map_err(|_| JwsError::InvalidSignature)?;
    let normalized = signature.normalize_s().unwrap_or(signature);

    verifying_key
        .verify(message, &normalized)
        .map_err(|_| JwsError::InvalidSignature)
}

fn coordinate(value: Option<&str>, name: &str) -> Result<Vec<u8>, JwsError> {
    let value = value.ok_or_else(|| JwsError::InvalidKey(format!("missing {name}")))?;
    let bytes = decode_base64url(value)
        .map_err(|_| JwsError::InvalidKey(format!("{name} is not base64url")))?;
    if bytes.len() != 32 {
        return Err(JwsError::InvalidKey(format!("{name} must be 32 bytes")));
    }
    Ok(bytes)
}

/// Build a `jsonwebtoken` decoding key, checking `alg` against the JWK type.
fn decoding_key(jwk: &PublicJwk, alg: Algorithm, alg_name: &str) -> Result<DecodingKey, JwsError> {
    let mismatch = || JwsError::KeyMismatch {
        alg: alg_name.to_string(),
        kty: jwk.kty.clone(),
    };
    let invalid = |e: jsonwebtoken::errors::Error| JwsError::InvalidKey(e.to_string());

    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Err(JwsError::UnsupportedAlgorithm(alg_name.to_string()))
        }
        Algorithm::ES256 | Algorithm::ES384 => {
            let expected_crv = if alg == Algorithm::ES256 {
                "P-256"
            } else {
                "P-384"
            };
            if jwk.kty != "EC" || jwk.crv.as_deref() != Some(expected_crv) {
                return Err(mismatch());
            }
            let (Some(x), Some(y)) = (jwk.x.as_deref(), jwk.y.as_deref()) else {
                return Err(JwsError::InvalidKey("missing x or y".to_string()));
            };
            DecodingKey::from_ec_components(x, y).map_err(invalid)
        }
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => {
            if jwk.kty != "RSA" {
                return Err(mismatch());
            }
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                return Err(JwsError::InvalidKey("missing n or e".to_string()));
            };
            DecodingKey::from_rsa_components(n, e).map_err(invalid)
        }
        Algorithm::EdDSA => {
            if jwk.kty != "OKP" || jwk.crv.as_deref() != Some("Ed25519") {
                return Err(mismatch());
            }
            let x = jwk
                .x
                .as_deref()
                .ok_or_else(|| JwsError::InvalidKey("missing x".to_string()))?;
            DecodingKey::from_ed_components(x).map_err(invalid)
        }
    }
}
