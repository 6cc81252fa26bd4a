//! Builder patterns for test data construction
//!
//! Provides fluent APIs for creating signed credential and presentation JWTs.

use crate::crypto_fixtures::{Ed25519Fixture, FixtureError};
use crate::test_ids::{TEST_NOW_TIMESTAMP, TYPE_VERIFIABLE_CREDENTIAL};
use common::jwt::JwtHeader;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};
use vc_checks::jws::sign_es256k;
use vc_checks::keys::PrivateJwk;

/// Builder for JWT-VC credentials.
///
/// Time claims are relative to [`TEST_NOW_TIMESTAMP`] so checks can run
/// against a fixed clock.
///
/// # Example
/// ```rust,ignore
/// let jwt = TestCredentialBuilder::new()
///     .issued_by("did:ion:root")
///     .with_type("OrganizationIdentity")
///     .expires_in(3600)
///     .sign_es256k(&key)?;
/// ```
pub struct TestCredentialBuilder {
    issuer: Option<Value>,
    subject: Map<String, Value>,
    types: Vec<String>,
    jti: Option<String>,
    nbf: Option<i64>,
    exp: Option<i64>,
    kid: Option<String>,
    extra_vc: Map<String, Value>,
}

impl TestCredentialBuilder {
    /// Create a new credential builder with defaults
    pub fn new() -> Self {
        Self {
            issuer: None,
            subject: Map::new(),
            types: vec![TYPE_VERIFIABLE_CREDENTIAL.to_string()],
            jti: None,
            nbf: Some(TEST_NOW_TIMESTAMP - 60),
            exp: None,
            kid: None,
            extra_vc: Map::new(),
        }
    }

    /// Set the issuer as a plain DID string
    pub fn issued_by(mut self, did: &str) -> Self {
        self.issuer = Some(Value::String(did.to_string()));
        self
    }

    /// Set the issuer as an object with an `id`
    pub fn issued_by_object(mut self, did: &str, name: &str) -> Self {
        self.issuer = Some(json!({ "id": did, "name": name }));
        self
    }

    /// Add a credential type after `VerifiableCredential`
    pub fn with_type(mut self, credential_type: &str) -> Self {
        self.types.push(credential_type.to_string());
        self
    }

    /// Set a credential subject claim
    pub fn with_subject_claim(mut self, name: &str, value: Value) -> Self {
        self.subject.insert(name.to_string(), value);
        self
    }

    /// Set a top-level `vc` property
    pub fn with_vc_property(mut self, name: &str, value: Value) -> Self {
        self.extra_vc.insert(name.to_string(), value);
        self
    }

    /// Set the `jti` claim
    pub fn with_id(mut self, jti: &str) -> Self {
        self.jti = Some(jti.to_string());
        self
    }

    /// Set `exp` in seconds relative to the fixed test time
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some(TEST_NOW_TIMESTAMP + seconds);
        self
    }

    /// Drop the `nbf` claim
    pub fn without_nbf(mut self) -> Self {
        self.nbf = None;
        self
    }

    /// Set the header `kid`
    pub fn with_kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.to_string());
        self
    }

    /// Build the JWT claims
    pub fn claims(&self) -> Value {
        let mut vc = self.extra_vc.clone();
        vc.insert(
            "@context".to_string(),
            json!(["https://www.w3.org/2018/credentials/v1"]),
        );
        vc.insert("type".to_string(), json!(self.types));
        vc.insert(
            "credentialSubject".to_string(),
            Value::Object(self.subject.clone()),
        );
        if let Some(issuer) = &self.issuer {
            vc.insert("issuer".to_string(), issuer.clone());
        }

        let mut claims = Map::new();
        claims.insert("vc".to_string(), Value::Object(vc));
        if let Some(Value::String(iss)) = &self.issuer {
            claims.insert("iss".to_string(), Value::String(iss.clone()));
        }
        if let Some(jti) = &self.jti {
            claims.insert("jti".to_string(), Value::String(jti.clone()));
        }
        if let Some(nbf) = self.nbf {
            claims.insert("nbf".to_string(), json!(nbf));
        }
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        Value::Object(claims)
    }

    /// Sign as ES256K with a secp256k1 key
    pub fn sign_es256k(&self, key: &PrivateJwk) -> Result<String, FixtureError> {
        let header = JwtHeader {
            alg: String::new(),
            typ: Some("JWT".to_string()),
            kid: self.kid.clone(),
            jwk: None,
        };
        sign_es256k(&header, &self.claims(), key)
            .map_err(|e| FixtureError::Crypto(format!("Failed to sign credential: {e}")))
    }

    /// Sign as EdDSA with an Ed25519 key
    pub fn sign_ed25519(&self, key: &Ed25519Fixture) -> Result<String, FixtureError> {
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = self.kid.clone();
        jsonwebtoken::encode(
            &header,
            &self.claims(),
            &EncodingKey::from_ed_der(&key.private_pkcs8),
        )
        .map_err(|e| FixtureError::Crypto(format!("Failed to sign credential: {e}")))
    }
}

impl Default for TestCredentialBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// How a presentation identifies its signing key.
#[derive(Debug, Clone)]
enum PresentationKey {
    /// Public JWK embedded in the header
    Embedded,
    /// DID URL in the header `kid`
    Kid(String),
    /// Neither
    None,
}

/// Builder for `jwt_vp` presentations.
///
/// # Example
/// ```rust,ignore
/// let jwt_vp = TestPresentationBuilder::new()
///     .held_by("did:ion:alice")
///     .with_credential(&credential_jwt)
///     .with_kid("did:ion:alice#key-1")
///     .sign_es256k(&holder_key)?;
/// ```
pub struct TestPresentationBuilder {
    holder: Option<String>,
    credentials: Vec<String>,
    iat: Option<i64>,
    exp: Option<i64>,
    key: PresentationKey,
}

impl TestPresentationBuilder {
    /// Create a new presentation builder with a self-signed header
    pub fn new() -> Self {
        Self {
            holder: None,
            credentials: Vec::new(),
            iat: Some(TEST_NOW_TIMESTAMP),
            exp: None,
            key: PresentationKey::Embedded,
        }
    }

    /// Set the holder (`iss`)
    pub fn held_by(mut self, did: &str) -> Self {
        self.holder = Some(did.to_string());
        self
    }

    /// Add a credential JWT
    pub fn with_credential(mut self, jwt: &str) -> Self {
        self.credentials.push(jwt.to_string());
        self
    }

    /// Identify the key by DID URL instead of embedding it
    pub fn with_kid(mut self, kid: &str) -> Self {
        self.key = PresentationKey::Kid(kid.to_string());
        self
    }

    /// Neither embed a key nor set a `kid`
    pub fn without_key_reference(mut self) -> Self {
        self.key = PresentationKey::None;
        self
    }

    /// Set `iat` relative to the fixed test time
    pub fn issued_at_offset(mut self, seconds: i64) -> Self {
        self.iat = Some(TEST_NOW_TIMESTAMP + seconds);
        self
    }

    /// Set `exp` in seconds relative to the fixed test time
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some(TEST_NOW_TIMESTAMP + seconds);
        self
    }

    /// Build the JWT claims
    pub fn claims(&self) -> Value {
        let mut claims = Map::new();
        claims.insert(
            "vp".to_string(),
            json!({
                "@context": ["https://www.w3.org/2018/credentials/v1"],
                "type": ["VerifiablePresentation"],
                "verifiableCredential": self.credentials,
            }),
        );
        if let Some(holder) = &self.holder {
            claims.insert("iss".to_string(), Value::String(holder.clone()));
        }
        if let Some(iat) = self.iat {
            claims.insert("iat".to_string(), json!(iat));
        }
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        Value::Object(claims)
    }

    /// Sign as ES256K with a secp256k1 key
    pub fn sign_es256k(&self, key: &PrivateJwk) -> Result<String, FixtureError> {
        let (kid, jwk) = match &self.key {
            PresentationKey::Embedded => (
                None,
                Some(
                    serde_json::to_value(key.to_public())
                        .map_err(|e| FixtureError::Crypto(e.to_string()))?,
                ),
            ),
            PresentationKey::Kid(kid) => (Some(kid.clone()), None),
            PresentationKey::None => (None, None),
        };
        let header = JwtHeader {
            alg: String::new(),
            typ: Some("JWT".to_string()),
            kid,
            jwk,
        };
        sign_es256k(&header, &self.claims(), key)
            .map_err(|e| FixtureError::Crypto(format!("Failed to sign presentation: {e}")))
    }
}

impl Default for TestPresentationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
