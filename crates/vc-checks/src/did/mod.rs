//! DID documents and DID helpers.
//!
//! Covers the `did:jwk` and `did:web` methods, key lookup in DID documents,
//! and the service / key consistency rules applied when an organization
//! edits its document.

pub mod resolver;

use crate::errors::CheckError;
use crate::jws::{sign_es256k, verify_compact, ES256K};
use crate::keys::{public_jwk_from_secp256k1_key, PrivateJwk, PublicJwk};
use common::jwt::{decode_base64url, encode_base64url, JwtHeader};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub use resolver::{
    CompositeDidResolver, DidResolver, HttpDocumentFetcher, JwkDidResolver, RegistrarDidResolver,
    WebDidResolver,
};

pub const DID_JWK_PREFIX: &str = "did:jwk:";
pub const DID_WEB_PREFIX: &str = "did:web:";

/// Verification method type used for `did:jwk` documents.
const JSON_WEB_KEY_2020: &str = "JsonWebKey2020";

/// A DID document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,

    /// Legacy key list used by older documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_key: Vec<VerificationMethod>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DidDocument {
    /// All key entries, `verificationMethod` first.
    pub fn keys(&self) -> impl Iterator<Item = &VerificationMethod> {
        self.verification_method.iter().chain(self.public_key.iter())
    }
}

/// A key entry in a DID document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Full DID URL or a bare fragment such as `#key-1`.
    pub id: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub method_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<PublicJwk>,

    /// secp256k1 public key in hex, used by older documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerificationMethod {
    /// The method's public key as a JWK.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::InvalidKey` if the method has no usable key.
    pub fn jwk(&self) -> Result<PublicJwk, CheckError> {
        if let Some(jwk) = &self.public_key_jwk {
            return Ok(jwk.clone());
        }
        if let Some(hex) = &self.public_key_hex {
            return public_jwk_from_secp256k1_key(hex);
        }
        Err(CheckError::InvalidKey(format!(
            "verification method {} has no public key",
            self.id
        )))
    }
}

/// A service entry in a DID document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Usually a fragment such as `#credentialagent-1`.
    pub id: String,

    #[serde(rename = "type", default)]
    pub service_type: String,

    /// A URL, a DID URL, or a structured endpoint.
    #[serde(default)]
    pub service_endpoint: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// did:jwk
// ============================================================================

/// Encode a public JWK as a `did:jwk`.
///
/// # Errors
///
/// Returns `CheckError::Internal` if the JWK cannot be serialized.
pub fn encode_did_jwk(jwk: &PublicJwk) -> Result<String, CheckError> {
    let json = serde_json::to_vec(jwk)
        .map_err(|e| CheckError::Internal(format!("jwk serialization failed: {e}")))?;
    Ok(format!("{DID_JWK_PREFIX}{}", encode_base64url(json)))
}

/// Decode the public JWK embedded in a `did:jwk` (a fragment is ignored).
///
/// # Errors
///
/// Returns `CheckError::DidResolution("invalid_did_jwk")` if the DID is not
/// a well-formed `did:jwk`.
pub fn decode_did_jwk(did: &str) -> Result<PublicJwk, CheckError> {
    let invalid = || CheckError::DidResolution("invalid_did_jwk".to_string());
    let encoded = strip_fragment(did)
        .strip_prefix(DID_JWK_PREFIX)
        .ok_or_else(invalid)?;
    let bytes = decode_base64url(encoded).map_err(|_| invalid())?;
    serde_json::from_slice(&bytes).map_err(|_| invalid())
}

/// The single-key DID document of a `did:jwk`; its method id is `<did>#0`.
///
/// # Errors
///
/// See [`decode_did_jwk`].
pub fn resolve_did_jwk(did: &str) -> Result<DidDocument, CheckError> {
    let did = strip_fragment(did);
    let jwk = decode_did_jwk(did)?;
    let method = VerificationMethod {
        id: format!("{did}#0"),
        method_type: Some(JSON_WEB_KEY_2020.to_string()),
        controller: Some(did.to_string()),
        public_key_jwk: Some(jwk),
        ..VerificationMethod::default()
    };

    Ok(DidDocument {
        context: Some(json!([
            "https://www.w3.org/ns/did/v1",
            "https://w3id.org/security/suites/jws-2020/v1"
        ])),
        id: did.to_string(),
        verification_method: vec![method],
        ..DidDocument::default()
    })
}

// ============================================================================
// did:web
// ============================================================================

/// URL of the DID document for a `did:web`, over HTTPS.
///
/// # Errors
///
/// Returns `CheckError::DidResolution("invalid_did_web")` for anything that
/// is not a `did:web` with a host.
pub fn did_web_to_url(did: &str) -> Result<String, CheckError> {
    did_web_to_url_with_scheme(did, "https")
}

pub(crate) fn did_web_to_url_with_scheme(did: &str, scheme: &str) -> Result<String, CheckError> {
    let invalid = || CheckError::DidResolution("invalid_did_web".to_string());
    let identifier = strip_fragment(did)
        .strip_prefix(DID_WEB_PREFIX)
        .ok_or_else(invalid)?;

    let mut segments = identifier.split(':');
    let host = segments
        .next()
        .filter(|host| !host.is_empty())
        .ok_or_else(invalid)?
        .replace("%3A", ":")
        .replace("%3a", ":");
    let path: Vec<&str> = segments.collect();
    if path.iter().any(|segment| segment.is_empty()) {
        return Err(invalid());
    }

    if path.is_empty() {
        Ok(format!("{scheme}://{host}/.well-known/did.json"))
    } else {
        Ok(format!("{scheme}://{host}/{}/did.json", path.join("/")))
    }
}

/// The `did:web` identifying a URL: host (port as `%3A`), then path
/// segments joined with `:`. A trailing `did.json` and a bare
/// `/.well-known` path are dropped.
///
/// # Errors
///
/// Returns `CheckError::DidResolution("invalid_did_web")` if the URL cannot
/// be parsed or has no host.
pub fn url_to_did_web(url: &str) -> Result<String, CheckError> {
    let invalid = || CheckError::DidResolution("invalid_did_web".to_string());
    let parsed = url::Url::parse(url).map_err(|_| invalid())?;
    let host = parsed.host_str().ok_or_else(invalid)?;

    let mut did = format!("{DID_WEB_PREFIX}{host}");
    if let Some(port) = parsed.port() {
        did.push_str(&format!("%3A{port}"));
    }

    let mut segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    if segments.last() == Some(&"did.json") {
        segments.pop();
    }
    if segments == [".well-known"] {
        segments.clear();
    }

    for segment in segments {
        did.push(':');
        did.push_str(segment);
    }
    Ok(did)
}

/// The custodied `did:web` for an organization website, hosted under
/// `<custodied_host>/d/<website hostname>`.
///
/// # Errors
///
/// Returns `CheckError::DidResolution("invalid_did_web")` if either URL
/// cannot be parsed or the website has no host.
pub fn build_custodied_did_web(website: &str, custodied_host: &str) -> Result<String, CheckError> {
    let invalid = || CheckError::DidResolution("invalid_did_web".to_string());
    let website = url::Url::parse(website).map_err(|_| invalid())?;
    let hostname = website.host_str().ok_or_else(invalid)?;

    let mut custodied = url::Url::parse(custodied_host).map_err(|_| invalid())?;
    custodied.set_path(&format!("/d/{hostname}"));
    url_to_did_web(custodied.as_str())
}

// ============================================================================
// Document helpers
// ============================================================================

/// True for a DID URL with a non-empty fragment, e.g. `did:ion:abc#key-1`.
pub fn is_did_url_with_fragment(value: &str) -> bool {
    let Some((did, fragment)) = value.split_once('#') else {
        return false;
    };
    let mut parts = did.splitn(3, ':');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some("did"), Some(method), Some(id)) if !method.is_empty() && !id.is_empty()
    ) && !fragment.is_empty()
}

/// The service endpoint when it is a DID URL with a fragment.
pub fn extract_service_endpoint_did(service: &Service) -> Option<&str> {
    service
        .service_endpoint
        .as_str()
        .filter(|endpoint| is_did_url_with_fragment(endpoint))
}

/// Find the key entry for `kid`.
///
/// Matches an entry whose id equals `kid`, equals `kid`'s fragment, or
/// expands to `kid` when prefixed with the document id (and the reverse
/// for a bare-fragment `kid`).
pub fn extract_verification_key<'a>(
    document: &'a DidDocument,
    kid: &str,
) -> Option<&'a VerificationMethod> {
    let kid_fragment = kid.find('#').and_then(|i| kid.get(i..));
    document.keys().find(|method| {
        method.id == kid
            || kid_fragment == Some(method.id.as_str())
            || (method.id.starts_with('#') && format!("{}{}", document.id, method.id) == kid)
            || (kid.starts_with('#') && format!("{}{kid}", document.id) == method.id)
    })
}

/// Reject a service whose id is already used in the document.
///
/// # Errors
///
/// Returns `CheckError::ServiceIdAlreadyExists` on a duplicate id.
pub fn validate_service_id_uniqueness(
    new_service: &Service,
    existing: &[Service],
) -> Result<(), CheckError> {
    if existing.iter().any(|service| service.id == new_service.id) {
        return Err(CheckError::ServiceIdAlreadyExists(new_service.id.clone()));
    }
    Ok(())
}

/// True when `private_key` is the private half of the document key `kid`.
///
/// Signs a throwaway token with `private_key` and verifies it against the
/// document's key for `kid`.
pub fn is_matching_private_key_kid(
    document: &DidDocument,
    private_key: &PrivateJwk,
    kid: &str,
) -> bool {
    let header = JwtHeader {
        alg: ES256K.to_string(),
        typ: Some("JWT".to_string()),
        kid: Some(kid.to_string()),
        jwk: None,
    };
    let Ok(token) = sign_es256k(&header, &json!({"field": "value", "iss": document.id}), private_key)
    else {
        return false;
    };

    let Some(verification_key) =
        extract_verification_key(document, kid).and_then(|method| method.jwk().ok())
    else {
        return false;
    };

    verify_compact(&token, &verification_key).is_ok()
}

/// Resolve a DID URL (`did:...#fragment`) to the JWK it names.
///
/// # Errors
///
/// Returns the resolver's error, or `CheckError::DidResolution` with
/// `verification_method_not_found` when the document has no such key.
pub async fn get_jwk_from_did_uri(
    did_url: &str,
    resolver: &dyn DidResolver,
) -> Result<PublicJwk, CheckError> {
    let did = strip_fragment(did_url);
    if !did.starts_with("did:") {
        return Err(CheckError::DidResolution("invalid_did_url".to_string()));
    }

    let document = resolver.resolve(did).await?;
    let method = extract_verification_key(&document, did_url).ok_or_else(|| {
        tracing::debug!(target: "vc.did", did_url = %did_url, "DID document has no matching key");
        CheckError::DidResolution("verification_method_not_found".to_string())
    })?;
    method.jwk()
}

/// The DID part of a DID URL.
pub fn strip_fragment(did_url: &str) -> &str {
    did_url.split('#').next().unwrap_or(did_url)
}
