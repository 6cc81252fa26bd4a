//! Primary-source issuer rule.
//!
//! Some credential types name the organization that is the primary source
//! of their claims (for example the employer in an employment credential).
//! Only that organization, or a notary, may issue them.

use crate::credential::Credential;
use crate::errors::CheckError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registry metadata for a credential type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialTypeMetadata {
    pub credential_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_category: Option<String>,

    /// Paths (as key segments) to claims holding the primary organization's DID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_organization_claim_paths: Option<Vec<Vec<String>>>,
}

/// Accept the credential unless it names primary organizations and
/// `issuer_id` is not one of them.
///
/// # Errors
///
/// Returns `CheckError::IssuerRequiresNotaryPermission` when at least one
/// primary organization claim is present and none equals `issuer_id`.
pub fn verify_primary_source_issuer(
    credential: &Credential,
    issuer_id: &str,
    metadata: &CredentialTypeMetadata,
) -> Result<(), CheckError> {
    let Some(paths) = &metadata.primary_organization_claim_paths else {
        tracing::info!(
            target: "vc.checks.primary_source",
            credential_type = %metadata.credential_type,
            "Credential type metadata does not contain primaryOrganizationClaimPaths"
        );
        return Ok(());
    };

    let document = serde_json::to_value(credential)
        .map_err(|e| CheckError::Internal(format!("credential serialization failed: {e}")))?;

    let claims: Vec<&Value> = paths
        .iter()
        .filter_map(|path| claim_at(&document, path))
        .filter(|value| is_truthy(value))
        .collect();

    if !claims.is_empty() && !claims.iter().any(|claim| claim.as_str() == Some(issuer_id)) {
        tracing::debug!(
            target: "vc.checks.primary_source",
            credential_type = %metadata.credential_type,
            claims = claims.len(),
            "Issuer is not the primary source of the credential"
        );
        return Err(CheckError::IssuerRequiresNotaryPermission);
    }

    Ok(())
}

/// Look up a claim by key path. Path segments are joined with `.` and
/// re-split, so a segment may itself contain a dotted sub-path; numeric
/// segments index into arrays.
fn claim_at<'a>(document: &'a Value, path: &[String]) -> Option<&'a Value> {
    let joined = path.join(".");
    if joined.is_empty() {
        return None;
    }
    joined
        .split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(document, |value, segment| match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
