//! Key types: JSON Web Keys, organization key records, and their vocabularies.
//!
//! Private material (`d`, private hex) is held in [`SecretString`] so key
//! records can be logged with `{:?}` without leaking.

pub mod transform;

use common::secret::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use transform::{
    detect_hex_key_type, hex_from_private_jwk, hex_from_public_jwk, hex_to_jwk_key_transformer,
    jwk_to_hex_key_transformer, private_jwk_from_secp256k1_key, public_hex_from_private_hex,
    public_jwk_from_secp256k1_key, HexKeyType,
};

/// Curve name used by the platform's default signing keys.
pub const SECP256K1_CURVE: &str = "secp256k1";

/// Public JSON Web Key.
///
/// Covers EC (`x`/`y`), OKP (`x`) and RSA (`n`/`e`) keys. Unknown members
/// are dropped on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PublicJwk {
    /// Key type: `EC`, `OKP`, or `RSA`.
    pub kty: String,

    /// Curve for EC / OKP keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// X coordinate (EC) or public key (OKP), base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// Y coordinate (EC), base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// RSA modulus, base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA public exponent, base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
}

impl PublicJwk {
    /// True for an EC key on secp256k1.
    pub fn is_secp256k1(&self) -> bool {
        self.kty == "EC" && self.crv.as_deref() == Some(SECP256K1_CURVE)
    }
}

/// Private JSON Web Key: the public members plus the private `d` value.
#[derive(Clone, Deserialize)]
pub struct PrivateJwk {
    #[serde(flatten)]
    pub public: PublicJwk,

    /// Private scalar, base64url. Redacted in Debug output.
    pub d: SecretString,
}

impl fmt::Debug for PrivateJwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateJwk")
            .field("public", &self.public)
            .field("d", &"[REDACTED]")
            .finish()
    }
}

impl PrivateJwk {
    /// The public half of this key.
    pub fn to_public(&self) -> PublicJwk {
        self.public.clone()
    }

    /// Serialize including `d`. Only for handing the key to a signer or KMS.
    pub fn to_json_with_private(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(&self.public).unwrap_or_default();
        if let Some(map) = value.as_object_mut() {
            map.insert(
                "d".to_string(),
                serde_json::Value::String(self.d.expose_secret().to_string()),
            );
        }
        value
    }
}

/// What an organization key is allowed to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyPurpose {
    DltTransactions,
    Exchanges,
    IssuingMetadata,
    RevocationsFallback,
    Rotation,
    Permissioning,
}

/// Signature algorithm family of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    /// secp256k1, signs as `ES256K`.
    #[serde(rename = "SECP256K1")]
    Secp256k1,
    #[serde(rename = "ES256")]
    Es256,
    #[serde(rename = "RS256")]
    Rs256,
}

/// How a key record's key material is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    Hex,
    Jwk,
    Base64,
    Base64url,
}

/// Public key material in either encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublicKeyMaterial {
    Hex(String),
    Jwk(PublicJwk),
}

/// Private key material in either encoding.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PrivateKeyMaterial {
    Hex(SecretString),
    Jwk(PrivateJwk),
}

/// An organization's key record as held by a key store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationKey {
    /// Fragment of the DID URL identifying this key, e.g. `#eth-account-key-1`.
    pub kid_fragment: String,
    #[serde(default)]
    pub purposes: Vec<KeyPurpose>,
    pub algorithm: KeyAlgorithm,
    pub encoding: KeyEncoding,
    pub public_key: PublicKeyMaterial,
    #[serde(default)]
    pub key: Option<PrivateKeyMaterial>,
}
