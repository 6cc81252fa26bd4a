//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for check records and tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use common::jwt::JwtHeader;
use vc_checks::checks::{CheckResult, CredentialChecks};

/// Custom assertions for organization check records
///
/// # Example
/// ```rust,ignore
/// checks
///     .assert_untampered()
///     .assert_check("TRUSTED_ISSUER", CheckResult::Pass)
///     .assert_unrevoked_not_checked();
/// ```
pub trait CheckAssertions {
    /// Assert a single named check
    fn assert_check(&self, name: &str, expected: CheckResult) -> &Self;

    /// Assert that the signature verified
    fn assert_untampered(&self) -> &Self;

    /// Assert that the signature failed and nothing else ran
    fn assert_tampered(&self) -> &Self;

    /// Assert that the revocation check was not performed
    fn assert_unrevoked_not_checked(&self) -> &Self;

    /// Assert untampered, trusted and unexpired
    fn assert_fully_trusted(&self) -> &Self;
}

impl CheckAssertions for CredentialChecks {
    fn assert_check(&self, name: &str, expected: CheckResult) -> &Self {
        let actual = self
            .entries()
            .into_iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, result)| result);
        assert_eq!(
            actual,
            Some(expected),
            "Expected {} to be {}, got {:?} (record: {:?})",
            name,
            expected.as_str(),
            actual,
            self
        );
        self
    }

    fn assert_untampered(&self) -> &Self {
        self.assert_check("UNTAMPERED", CheckResult::Pass)
    }

    fn assert_tampered(&self) -> &Self {
        self.assert_check("UNTAMPERED", CheckResult::Fail)
            .assert_check("TRUSTED_ISSUER", CheckResult::NotChecked)
            .assert_check("UNEXPIRED", CheckResult::NotChecked)
            .assert_unrevoked_not_checked()
    }

    fn assert_unrevoked_not_checked(&self) -> &Self {
        self.assert_check("UNREVOKED", CheckResult::NotChecked)
    }

    fn assert_fully_trusted(&self) -> &Self {
        self.assert_untampered()
            .assert_check("TRUSTED_ISSUER", CheckResult::Pass)
            .assert_check("UNEXPIRED", CheckResult::Pass)
    }
}

/// Custom assertions for compact JWS strings
pub trait TokenAssertions {
    /// Assert that the token is three base64url segments with a JSON header
    fn assert_valid_jws(&self) -> &Self;

    /// Assert the header `alg`
    fn assert_alg(&self, alg: &str) -> &Self;

    /// Assert the header `kid`
    fn assert_kid(&self, kid: Option<&str>) -> &Self;

    /// Assert whether the header embeds a `jwk`
    fn assert_embeds_jwk(&self, embedded: bool) -> &Self;
}

fn header_of(token: &str) -> JwtHeader {
    let segment = token.split('.').next().expect("Empty token");
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .expect("Invalid JWT header encoding");
    serde_json::from_slice(&bytes).expect("Failed to parse JWT header")
}

impl TokenAssertions for String {
    fn assert_valid_jws(&self) -> &Self {
        let parts: Vec<_> = self.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "JWS must have 3 parts (header.payload.signature), got {}",
            parts.len()
        );
        for part in &parts {
            assert!(
                URL_SAFE_NO_PAD.decode(part).is_ok(),
                "Segment is not base64url: {}",
                part
            );
        }
        header_of(self);
        self
    }

    fn assert_alg(&self, alg: &str) -> &Self {
        let header = header_of(self);
        assert_eq!(header.alg, alg, "Expected alg '{}', got '{}'", alg, header.alg);
        self
    }

    fn assert_kid(&self, kid: Option<&str>) -> &Self {
        let header = header_of(self);
        assert_eq!(
            header.kid.as_deref(),
            kid,
            "Expected kid {:?}, got {:?}",
            kid,
            header.kid
        );
        self
    }

    fn assert_embeds_jwk(&self, embedded: bool) -> &Self {
        let header = header_of(self);
        assert_eq!(
            header.jwk.is_some(),
            embedded,
            "Expected embedded jwk: {}, header: {:?}",
            embedded,
            header
        );
        self
    }
}
