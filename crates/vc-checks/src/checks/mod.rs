//! Credential checks and the check-result record.

pub mod expiration;
pub mod issuer;
pub mod org;
pub mod primary_source;
pub mod tamper;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use expiration::check_expiration;
pub use issuer::check_org_issuer_match;
pub use org::{run_all_org_checks, CheckContext, OrgCheckInput};
pub use primary_source::{verify_primary_source_issuer, CredentialTypeMetadata};
pub use tamper::check_jws_vc_tampering;

/// Outcome of a single credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckResult {
    Pass,
    Fail,
    NotChecked,
}

impl CheckResult {
    /// Wire name, also used as a metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            CheckResult::Pass => "PASS",
            CheckResult::Fail => "FAIL",
            CheckResult::NotChecked => "NOT_CHECKED",
        }
    }

    pub fn from_bool(passed: bool) -> Self {
        if passed {
            CheckResult::Pass
        } else {
            CheckResult::Fail
        }
    }
}

/// Result record of the organization credential checks.
///
/// Downstream checks are only meaningful when `untampered` is `PASS`; use
/// [`CredentialChecks::tampered`] to build the short-circuited record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialChecks {
    #[serde(rename = "UNTAMPERED")]
    pub untampered: CheckResult,

    #[serde(rename = "TRUSTED_ISSUER")]
    pub trusted_issuer: CheckResult,

    #[serde(rename = "UNREVOKED")]
    pub unrevoked: CheckResult,

    #[serde(rename = "UNEXPIRED")]
    pub unexpired: CheckResult,

    /// When the checks ran.
    pub checked: DateTime<Utc>,
}

impl CredentialChecks {
    /// Record for a credential whose signature did not verify: every
    /// downstream check is `NOT_CHECKED`.
    pub fn tampered(untampered: CheckResult, checked: DateTime<Utc>) -> Self {
        Self {
            untampered,
            trusted_issuer: CheckResult::NotChecked,
            unrevoked: CheckResult::NotChecked,
            unexpired: CheckResult::NotChecked,
            checked,
        }
    }

    /// Name/result pairs in a fixed order, for logging and metrics.
    pub fn entries(&self) -> [(&'static str, CheckResult); 4] {
        [
            ("UNTAMPERED", self.untampered),
            ("TRUSTED_ISSUER", self.trusted_issuer),
            ("UNREVOKED", self.unrevoked),
            ("UNEXPIRED", self.unexpired),
        ]
    }
}
