//! Issuer trust check.

use super::CheckResult;
use crate::credential::Credential;

/// `PASS` iff the credential's issuer id is exactly `trusted_issuer`.
pub fn check_org_issuer_match(credential: &Credential, trusted_issuer: &str) -> CheckResult {
    CheckResult::from_bool(credential.issuer_id() == Some(trusted_issuer))
}
