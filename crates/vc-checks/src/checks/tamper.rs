//! JWS tamper check.

use super::CheckResult;
use crate::jws::verify_compact;
use crate::keys::PublicJwk;

/// `PASS` when the compact JWS verifies against `jwk`, `FAIL` otherwise.
///
/// Every verification failure (bad signature, wrong or unsupported
/// algorithm, unusable key, oversized or malformed token) is a `FAIL`.
pub fn check_jws_vc_tampering(jwt: &str, jwk: &PublicJwk) -> CheckResult {
    match verify_compact(jwt, jwk) {
        Ok(_) => CheckResult::Pass,
        Err(e) => {
            tracing::debug!(target: "vc.checks.tamper", error = %e, "Credential signature did not verify");
            CheckResult::Fail
        }
    }
}
