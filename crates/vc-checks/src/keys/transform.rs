//! secp256k1 key encoding transforms (hex ⇄ JWK, PEM → JWK).
//!
//! Hex keys may carry an optional `0x` prefix. A private key is 32 bytes
//! (64 hex chars); a public key is the uncompressed point, with or without
//! the leading `04` (130 or 128 hex chars).

use super::{
    KeyEncoding, OrganizationKey, PrivateJwk, PrivateKeyMaterial, PublicJwk, PublicKeyMaterial,
    SECP256K1_CURVE,
};
use crate::errors::CheckError;
use common::jwt::{decode_base64url, encode_base64url};
use common::secret::{ExposeSecret, SecretString};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::pkcs8::{DecodePrivateKey, DecodePublicKey};
use k256::{PublicKey, SecretKey};

const COORDINATE_BYTES: usize = 32;
const PEM_PREFIX: &str = "-----BEGIN";

/// Kind of key a hex string encodes, judged by length alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexKeyType {
    Private,
    Public,
    Unknown,
}

/// Classify a hex key by its length.
pub fn detect_hex_key_type(key: &str) -> HexKeyType {
    let key = strip_hex_prefix(key);
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_hexdigit()) {
        return HexKeyType::Unknown;
    }
    match key.len() {
        64 => HexKeyType::Private,
        128 => HexKeyType::Public,
        130 if key.starts_with("04") => HexKeyType::Public,
        _ => HexKeyType::Unknown,
    }
}

/// Build the public JWK for a secp256k1 key given as PEM, private hex, or
/// public hex. The result never carries `d`.
///
/// # Errors
///
/// Returns `CheckError::InvalidKey` if the key cannot be parsed.
pub fn public_jwk_from_secp256k1_key(key: &str) -> Result<PublicJwk, CheckError> {
    let key = key.trim();
    let public = if key.starts_with(PEM_PREFIX) {
        public_key_from_pem(key)?
    } else {
        match detect_hex_key_type(key) {
            HexKeyType::Private => secret_key_from_hex(key)?.public_key(),
            HexKeyType::Public => public_key_from_hex(key)?,
            HexKeyType::Unknown => {
                return Err(CheckError::InvalidKey(
                    "expected secp256k1 private key (64 hex chars) or uncompressed public key (128/130 hex chars)"
                        .to_string(),
                ))
            }
        }
    };
    public_jwk_from_point(&public)
}

/// Build the private JWK (including `d`) for a secp256k1 private key given
/// as PEM or hex.
///
/// # Errors
///
/// Returns `CheckError::InvalidKey` if the key cannot be parsed.
pub fn private_jwk_from_secp256k1_key(key: &SecretString) -> Result<PrivateJwk, CheckError> {
    let key = key.expose_secret().trim();
    let secret = if key.starts_with(PEM_PREFIX) {
        SecretKey::from_pkcs8_pem(key)
            .or_else(|_| SecretKey::from_sec1_pem(key))
            .map_err(|_| CheckError::InvalidKey("unparseable private key PEM".to_string()))?
    } else {
        secret_key_from_hex(key)?
    };
    private_jwk_from_secret(&secret)
}

/// Uncompressed public key hex (`04‖x‖y`) for a private key hex.
///
/// # Errors
///
/// Returns `CheckError::InvalidKey` if the private key is not a valid scalar.
pub fn public_hex_from_private_hex(private_hex: &SecretString) -> Result<String, CheckError> {
    let secret = secret_key_from_hex(private_hex.expose_secret())?;
    Ok(hex::encode(secret.public_key().to_encoded_point(false).as_bytes()))
}

/// The private scalar `d` as 64 hex chars.
///
/// # Errors
///
/// Returns `CheckError::InvalidKey` if `d` is not base64url.
pub fn hex_from_private_jwk(jwk: &PrivateJwk) -> Result<SecretString, CheckError> {
    let d = coordinate_hex(jwk.d.expose_secret(), "d")?;
    Ok(SecretString::from(d))
}

/// The uncompressed public point `04‖x‖y` as 130 hex chars.
///
/// # Errors
///
/// Returns `CheckError::InvalidKey` if `x` or `y` is missing or not base64url.
pub fn hex_from_public_jwk(jwk: &PublicJwk) -> Result<String, CheckError> {
    let x = jwk
        .x
        .as_deref()
        .ok_or_else(|| CheckError::InvalidKey("jwk is missing x".to_string()))?;
    let y = jwk
        .y
        .as_deref()
        .ok_or_else(|| CheckError::InvalidKey("jwk is missing y".to_string()))?;
    Ok(format!(
        "04{}{}",
        coordinate_hex(x, "x")?,
        coordinate_hex(y, "y")?
    ))
}

/// Convert a hex-encoded organization key record to JWK encoding.
///
/// Records already in JWK encoding keep their material; `encoding` is set
/// to `jwk` either way.
///
/// # Errors
///
/// Returns `CheckError::InvalidKey` if either key cannot be parsed.
pub fn hex_to_jwk_key_transformer(key: OrganizationKey) -> Result<OrganizationKey, CheckError> {
    let public_key = match key.public_key {
        PublicKeyMaterial::Hex(ref hex) if !hex.is_empty() => {
            PublicKeyMaterial::Jwk(public_jwk_from_secp256k1_key(hex)?)
        }
        other => other,
    };
    let private_key = match key.key {
        Some(PrivateKeyMaterial::Hex(ref hex)) if !hex.expose_secret().is_empty() => {
            Some(PrivateKeyMaterial::Jwk(private_jwk_from_secp256k1_key(hex)?))
        }
        other => other,
    };

    Ok(OrganizationKey {
        encoding: KeyEncoding::Jwk,
        public_key,
        key: private_key,
        ..key
    })
}

/// Convert a JWK-encoded organization key record to hex encoding.
///
/// # Errors
///
/// Returns `CheckError::InvalidKey` if a JWK lacks coordinates.
pub fn jwk_to_hex_key_transformer(key: OrganizationKey) -> Result<OrganizationKey, CheckError> {
    let public_key = match key.public_key {
        PublicKeyMaterial::Jwk(ref jwk) => PublicKeyMaterial::Hex(hex_from_public_jwk(jwk)?),
        other => other,
    };
    let private_key = match key.key {
        Some(PrivateKeyMaterial::Jwk(ref jwk)) => {
            Some(PrivateKeyMaterial::Hex(hex_from_private_jwk(jwk)?))
        }
        other => other,
    };

    Ok(OrganizationKey {
        encoding: KeyEncoding::Hex,
        public_key,
        key: private_key,
        ..key
    })
}

fn strip_hex_prefix(key: &str) -> &str {
    key.strip_prefix("0x")
        .or_else(|| key.strip_prefix("0X"))
        .unwrap_or(key)
}

fn secret_key_from_hex(key: &str) -> Result<SecretKey, CheckError> {
    let bytes = hex::decode(strip_hex_prefix(key.trim()))
        .map_err(|_| CheckError::InvalidKey("private key is not hex".to_string()))?;
    if bytes.len() > COORDINATE_BYTES {
        return Err(CheckError::InvalidKey(
            "private key is longer than 32 bytes".to_string(),
        ));
    }
    let mut padded = [0u8; COORDINATE_BYTES];
    let offset = COORDINATE_BYTES - bytes.len();
    padded
        .get_mut(offset..)
        .ok_or_else(|| CheckError::InvalidKey("private key length".to_string()))?
        .copy_from_slice(&bytes);
    SecretKey::from_slice(&padded)
        .map_err(|_| CheckError::InvalidKey("private key is not a valid secp256k1 scalar".to_string()))
}

fn public_key_from_hex(key: &str) -> Result<PublicKey, CheckError> {
    let key = strip_hex_prefix(key.trim());
    let sec1 = if key.len() == 128 {
        format!("04{key}")
    } else {
        key.to_string()
    };
    let bytes = hex::decode(sec1)
        .map_err(|_| CheckError::InvalidKey("public key is not hex".to_string()))?;
    PublicKey::from_sec1_bytes(&bytes)
        .map_err(|_| CheckError::InvalidKey("public key is not on secp256k1".to_string()))
}

fn public_key_from_pem(pem: &str) -> Result<PublicKey, CheckError> {
    if let Ok(public) = PublicKey::from_public_key_pem(pem) {
        return Ok(public);
    }
    SecretKey::from_pkcs8_pem(pem)
        .or_else(|_| SecretKey::from_sec1_pem(pem))
        .map(|secret| secret.public_key())
        .map_err(|_| CheckError::InvalidKey("unparseable PEM key".to_string()))
}

fn public_jwk_from_point(public: &PublicKey) -> Result<PublicJwk, CheckError> {
    let point = public.to_encoded_point(false);
    let (Some(x), Some(y)) = (point.x(), point.y()) else {
        return Err(CheckError::InvalidKey("public key is the identity point".to_string()));
    };
    Ok(PublicJwk {
        kty: "EC".to_string(),
        crv: Some(SECP256K1_CURVE.to_string()),
        x: Some(encode_base64url(x)),
        y: Some(encode_base64url(y)),
        key_use: Some("sig".to_string()),
        ..PublicJwk::default()
    })
}

fn private_jwk_from_secret(secret: &SecretKey) -> Result<PrivateJwk, CheckError> {
    Ok(PrivateJwk {
        public: public_jwk_from_point(&secret.public_key())?,
        d: SecretString::from(encode_base64url(secret.to_bytes())),
    })
}

/// Decode a base64url coordinate and left-pad / truncate it to 32 bytes of hex.
fn coordinate_hex(value: &str, name: &str) -> Result<String, CheckError> {
    let bytes = decode_base64url(value)
        .map_err(|_| CheckError::InvalidKey(format!("jwk {name} is not base64url")))?;
    let hex = hex::encode(bytes);
    let width = COORDINATE_BYTES * 2;
    if hex.len() >= width {
        Ok(hex
            .get(hex.len() - width..)
            .unwrap_or_default()
            .to_string())
    } else {
        Ok(format!("{hex:0>width$}"))
    }
}
