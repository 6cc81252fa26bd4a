//! Verifiable credential and presentation models, and JWT-VC decoding.
//!
//! A JWT credential carries the W3C credential in its `vc` claim (a
//! presentation in `vp`); registered JWT claims are folded back onto it so
//! checks only ever look at the data-model object.

use crate::errors::CheckError;
use chrono::{DateTime, SecondsFormat, Utc};
use common::jwt::decode_payload;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Credential issuer: either a bare id or an object with an `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Issuer {
    Id(String),
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl Issuer {
    /// The issuer's id, if it has one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Issuer::Id(id) => Some(id),
            Issuer::Object { id, .. } => id.as_deref(),
        }
    }
}

/// A decoded W3C verifiable credential.
///
/// Members outside the data model are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// `type`: a string or an array of strings.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Issuer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_subject: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Credential {
    /// Resolved issuer id: the object's `id`, or the string itself.
    pub fn issuer_id(&self) -> Option<&str> {
        self.issuer.as_ref().and_then(Issuer::id)
    }

    /// Credential types, whether `type` is a string or an array.
    pub fn types(&self) -> Vec<&str> {
        match &self.credential_type {
            Some(Value::String(t)) => vec![t.as_str()],
            Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// The expiry used by the expiration check: `expirationDate`, else
    /// `validUntil`.
    pub fn expiry(&self) -> Option<&str> {
        self.expiration_date
            .as_deref()
            .or(self.valid_until.as_deref())
    }
}

/// A decoded verifiable presentation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub presentation_type: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<String>,

    /// Credentials as JWT strings or embedded objects.
    #[serde(default)]
    pub verifiable_credential: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Presentation {
    /// The credentials that are carried as JWT strings.
    pub fn credential_jwts(&self) -> impl Iterator<Item = &str> {
        self.verifiable_credential.iter().filter_map(Value::as_str)
    }
}

/// Registered JWT claims used for time-window checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct RegisteredClaims {
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Decode a JWT-VC into its credential without verifying the signature.
///
/// # Errors
///
/// Returns `CheckError::MalformedJwt` if the token is not a compact JWS,
/// has no `vc` object, or the credential does not match the data model.
pub fn decode_credential_jwt(jwt: &str) -> Result<Credential, CheckError> {
    let payload: Map<String, Value> = decode_payload(jwt)?;
    let Some(Value::Object(mut vc)) = payload.get("vc").cloned() else {
        tracing::debug!(target: "vc.credential", "JWT payload has no vc object");
        return Err(CheckError::MalformedJwt("missing vc claim".to_string()));
    };

    if let Some(jti) = payload.get("jti").and_then(Value::as_str) {
        vc.insert("id".to_string(), Value::String(jti.to_string()));
    }
    if let Some(iss) = payload.get("iss").and_then(Value::as_str) {
        vc.entry("issuer")
            .or_insert_with(|| Value::String(iss.to_string()));
    }
    if let Some(date) = timestamp_claim(&payload, "nbf") {
        vc.insert("issuanceDate".to_string(), Value::String(date));
    }
    if let Some(date) = timestamp_claim(&payload, "exp") {
        vc.insert("expirationDate".to_string(), Value::String(date));
    }
    if let Some(sub) = payload.get("sub").and_then(Value::as_str) {
        apply_subject_id(&mut vc, sub);
    }

    serde_json::from_value(Value::Object(vc)).map_err(|e| {
        tracing::debug!(target: "vc.credential", error = %e, "vc claim does not match the credential model");
        CheckError::MalformedJwt("invalid vc claim".to_string())
    })
}

/// Decode a `jwt_vp` into its presentation without verifying the signature.
///
/// # Errors
///
/// Returns `CheckError::MalformedJwt` if the token is not a compact JWS or
/// has no `vp` object.
pub fn decode_presentation_jwt(jwt: &str) -> Result<Presentation, CheckError> {
    let payload: Map<String, Value> = decode_payload(jwt)?;
    let Some(Value::Object(mut vp)) = payload.get("vp").cloned() else {
        tracing::debug!(target: "vc.credential", "JWT payload has no vp object");
        return Err(CheckError::MalformedJwt("missing vp claim".to_string()));
    };

    if let Some(jti) = payload.get("jti").and_then(Value::as_str) {
        vp.insert("id".to_string(), Value::String(jti.to_string()));
    }
    if let Some(iss) = payload.get("iss").and_then(Value::as_str) {
        vp.entry("holder")
            .or_insert_with(|| Value::String(iss.to_string()));
    }
    if let Some(date) =
        timestamp_claim(&payload, "nbf").or_else(|| timestamp_claim(&payload, "iat"))
    {
        vp.insert("issuanceDate".to_string(), Value::String(date));
    }

    serde_json::from_value(Value::Object(vp)).map_err(|e| {
        tracing::debug!(target: "vc.credential", error = %e, "vp claim does not match the presentation model");
        CheckError::MalformedJwt("invalid vp claim".to_string())
    })
}

/// RFC 3339 rendering with millisecond precision and a `Z` suffix.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn timestamp_claim(payload: &Map<String, Value>, claim: &str) -> Option<String> {
    let seconds = payload.get(claim)?.as_i64()?;
    DateTime::<Utc>::from_timestamp(seconds, 0).map(format_timestamp)
}

fn apply_subject_id(vc: &mut Map<String, Value>, sub: &str) {
    let subject = vc
        .entry("credentialSubject")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(subject) = subject {
        subject
            .entry("id")
            .or_insert_with(|| Value::String(sub.to_string()));
    }
}
