//! Organization credential check sequence.
//!
//! Checks a credential issued on an organization's behalf by the root
//! issuer:
//!
//! 1. Decode the JWT (errors propagate to the caller)
//! 2. Verify the signature against the root JWK
//! 3. Match the issuer against the root DID (only if 2 passed)
//! 4. Check expiration (only if 2 passed)
//! 5. Revocation is not checked

use super::{
    check_expiration, check_jws_vc_tampering, check_org_issuer_match, CheckResult,
    CredentialChecks,
};
use crate::credential::decode_credential_jwt;
use crate::errors::CheckError;
use crate::keys::PublicJwk;
use crate::observability::metrics;
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::instrument;

/// Inputs to [`run_all_org_checks`].
#[derive(Debug, Clone, Copy)]
pub struct OrgCheckInput<'a> {
    /// The credential as a compact JWS.
    pub signed_credential: &'a str,
    /// Public key of the root issuer.
    pub root_jwk: &'a PublicJwk,
    /// DID of the root issuer.
    pub root_did: &'a str,
}

/// Execution context of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckContext {
    /// Clock reading used for expiry and the `checked` stamp.
    pub now: DateTime<Utc>,
}

impl CheckContext {
    /// Context pinned to `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Context reading the system clock.
    pub fn current() -> Self {
        Self::at(Utc::now())
    }
}

/// Run the organization credential checks.
///
/// # Errors
///
/// Returns `CheckError::MalformedJwt` when the credential cannot be
/// decoded. Check failures are results, not errors.
#[instrument(skip_all, name = "vc.checks.run_all_org_checks", fields(root_did = %input.root_did))]
pub fn run_all_org_checks(
    input: OrgCheckInput<'_>,
    context: &CheckContext,
) -> Result<CredentialChecks, CheckError> {
    let start = Instant::now();

    let credential = decode_credential_jwt(input.signed_credential).map_err(|e| {
        tracing::debug!(target: "vc.checks.org", error = %e, "Credential could not be decoded");
        metrics::record_org_checks_duration("error", start.elapsed());
        e
    })?;

    let untampered = check_jws_vc_tampering(input.signed_credential, input.root_jwk);

    let checks = if untampered == CheckResult::Pass {
        CredentialChecks {
            untampered,
            trusted_issuer: check_org_issuer_match(&credential, input.root_did),
            unrevoked: CheckResult::NotChecked,
            unexpired: check_expiration(&credential, context.now),
            checked: context.now,
        }
    } else {
        CredentialChecks::tampered(untampered, context.now)
    };

    metrics::record_credential_checks(&checks);
    metrics::record_org_checks_duration("success", start.elapsed());

    tracing::info!(
        target: "vc.checks.org",
        credential_id = credential.id.as_deref().unwrap_or_default(),
        untampered = checks.untampered.as_str(),
        trusted_issuer = checks.trusted_issuer.as_str(),
        unexpired = checks.unexpired.as_str(),
        "Organization credential checked"
    );

    Ok(checks)
}
