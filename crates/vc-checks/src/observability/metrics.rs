//! Metrics for credential checks and DID resolution.
//!
//! All metrics follow Prometheus naming conventions:
//! - `vc_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `check`: 4 values (UNTAMPERED, TRUSTED_ISSUER, UNREVOKED, UNEXPIRED)
//! - `result`: 3 values (PASS, FAIL, NOT_CHECKED)
//! - `status`: success, or a bounded error code
//! - `method`: DID method, normalized to a small known set

use crate::checks::CredentialChecks;
use metrics::{counter, histogram};
use std::time::Duration;

/// DID methods that get their own label value.
const KNOWN_DID_METHODS: &[&str] = &["jwk", "web", "ion", "velocity", "key"];

/// Record the outcome of each check in an org check run.
///
/// Metric: `vc_credential_checks_total`
/// Labels: `check`, `result`
pub fn record_credential_checks(checks: &CredentialChecks) {
    for (check, result) in checks.entries() {
        counter!("vc_credential_checks_total",
            "check" => check,
            "result" => result.as_str()
        )
        .increment(1);
    }
}

/// Record how long an org check run took.
///
/// Metric: `vc_org_checks_duration_seconds`
/// Labels: `status` (success, error)
pub fn record_org_checks_duration(status: &'static str, duration: Duration) {
    histogram!("vc_org_checks_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());
}

/// Record a presentation verification.
///
/// Metric: `vc_presentation_verifications_total`
/// Labels: `status` (success, or the failure reason class)
pub fn record_presentation_verification(status: &'static str) {
    counter!("vc_presentation_verifications_total", "status" => status).increment(1);
}

/// Record a DID document resolution.
///
/// Metric: `vc_did_resolutions_total`
/// Labels: `method`, `status` (hit, success, or an error reason)
pub fn record_did_resolution(did: &str, status: &'static str) {
    counter!("vc_did_resolutions_total",
        "method" => did_method_label(did),
        "status" => status
    )
    .increment(1);
}

/// Map a DID to a bounded method label.
fn did_method_label(did: &str) -> &'static str {
    let method = did
        .strip_prefix("did:")
        .and_then(|rest| rest.split(':').next())
        .unwrap_or_default();
    KNOWN_DID_METHODS
        .iter()
        .find(|known| **known == method)
        .copied()
        .unwrap_or("other")
}
