//! Expiration check.

use super::CheckResult;
use crate::credential::Credential;
use chrono::{DateTime, Utc};

/// `FAIL` when the credential's expiry is at or before `now`.
///
/// The expiry is `expirationDate`, falling back to `validUntil`. A
/// credential without either never expires. An expiry that is not RFC 3339
/// is treated as expired.
pub fn check_expiration(credential: &Credential, now: DateTime<Utc>) -> CheckResult {
    let Some(expiry) = credential.expiry() else {
        return CheckResult::Pass;
    };

    match DateTime::parse_from_rfc3339(expiry) {
        Ok(expires_at) => CheckResult::from_bool(expires_at.with_timezone(&Utc) > now),
        Err(e) => {
            tracing::debug!(
                target: "vc.checks.expiration",
                expiry = %expiry,
                error = %e,
                "Credential expiry is not an RFC 3339 timestamp"
            );
            CheckResult::Fail
        }
    }
}
