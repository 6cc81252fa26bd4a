//! Deterministic cryptographic fixtures for testing
//!
//! Provides reproducible secp256k1 and Ed25519 keys. All fixtures are
//! deterministic based on seed values.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::signature::{Ed25519KeyPair, KeyPair};
use secrecy::SecretString;
use thiserror::Error;
use vc_checks::keys::{private_jwk_from_secp256k1_key, PrivateJwk, PublicJwk};

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

/// An Ed25519 key as used by `jsonwebtoken`: PKCS#8 DER for signing and
/// the matching OKP JWK for verification.
#[derive(Debug, Clone)]
pub struct Ed25519Fixture {
    pub private_pkcs8: Vec<u8>,
    pub public_jwk: PublicJwk,
}

/// Deterministic 32-byte seed for the given value.
fn seed_bytes(seed: u8) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes[0] = seed;
    for (i, byte) in bytes.iter_mut().enumerate().skip(1) {
        *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
    }
    bytes
}

/// Hex form of the deterministic secp256k1 private key for `seed`.
pub fn test_secp256k1_private_hex(seed: u8) -> String {
    hex::encode(seed_bytes(seed))
}

/// Generate a deterministic secp256k1 private JWK for testing.
///
/// The same seed always produces the same key.
///
/// # Example
/// ```rust,ignore
/// let issuer = test_secp256k1_key(1)?;
/// let public = issuer.to_public();
/// ```
pub fn test_secp256k1_key(seed: u8) -> Result<PrivateJwk, FixtureError> {
    let hex = SecretString::from(test_secp256k1_private_hex(seed));
    private_jwk_from_secp256k1_key(&hex)
        .map_err(|e| FixtureError::Crypto(format!("Failed to generate test key: {e}")))
}

/// Generate a deterministic Ed25519 key for testing.
pub fn test_ed25519_key(seed: u8) -> Result<Ed25519Fixture, FixtureError> {
    let seed_bytes = seed_bytes(seed);

    let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
        .map_err(|e| FixtureError::Crypto(format!("Failed to generate test keypair: {:?}", e)))?;

    let public_jwk = PublicJwk {
        kty: "OKP".to_string(),
        crv: Some("Ed25519".to_string()),
        x: Some(URL_SAFE_NO_PAD.encode(key_pair.public_key().as_ref())),
        ..PublicJwk::default()
    };

    Ok(Ed25519Fixture {
        private_pkcs8: build_pkcs8_from_seed(&seed_bytes),
        public_jwk,
    })
}

/// Build PKCS#8 v1 document from Ed25519 seed
///
/// Ring doesn't expose a method to get PKCS#8 from a seeded key pair.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    let mut pkcs8 = Vec::with_capacity(48);

    // SEQUENCE, 46 bytes
    pkcs8.extend_from_slice(&[0x30, 0x2e]);
    // version INTEGER 0
    pkcs8.extend_from_slice(&[0x02, 0x01, 0x00]);
    // AlgorithmIdentifier { OID 1.3.101.112 }
    pkcs8.extend_from_slice(&[0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70]);
    // privateKey OCTET STRING { OCTET STRING seed }
    pkcs8.extend_from_slice(&[0x04, 0x22, 0x04, 0x20]);
    pkcs8.extend_from_slice(seed);

    pkcs8
}
