//! Verifiable presentation (`jwt_vp`) verification.
//!
//! # Key selection
//!
//! - Protocol version 1: the presentation is self-signed; the key is the
//!   `jwk` member of the protected header.
//! - Protocol version 2 and later: self-signed presentations are rejected
//!   and the key is resolved from the `kid` DID URL.
//!
//! Every failure is a `400 presentation_malformed`.

use crate::credential::{decode_presentation_jwt, Presentation, RegisteredClaims};
use crate::did::{get_jwk_from_did_uri, DidResolver};
use crate::errors::CheckError;
use crate::jws::verify_compact;
use crate::keys::PublicJwk;
use crate::observability::metrics;
use chrono::{DateTime, Utc};
use common::jwt::{decode_header, decode_payload, validate_iat_at, validate_time_window_at};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Exchange protocol version negotiated with the holder's wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(pub u32);

impl ProtocolVersion {
    pub const V1: Self = Self(1);
    pub const V2: Self = Self(2);
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::V1
    }
}

/// Verifies presentation JWTs, resolving signing keys through a DID resolver.
pub struct PresentationVerifier {
    resolver: Arc<dyn DidResolver>,
    clock_skew: Duration,
}

impl PresentationVerifier {
    /// Create a verifier.
    ///
    /// # Arguments
    ///
    /// * `resolver` - Resolver for `kid` DID URLs
    /// * `clock_skew` - Tolerance applied to `iat`, `nbf` and `exp`
    pub fn new(resolver: Arc<dyn DidResolver>, clock_skew: Duration) -> Self {
        Self {
            resolver,
            clock_skew,
        }
    }

    /// Verify `jwt` against the system clock and return the presentation.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::PresentationMalformed`.
    pub async fn verify(
        &self,
        jwt: &str,
        version: ProtocolVersion,
    ) -> Result<Presentation, CheckError> {
        self.verify_at(jwt, version, Utc::now()).await
    }

    /// Verify `jwt` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::PresentationMalformed` with message:
    /// - `jwt_vp must not be self signed` - version 2+ token carries a `jwk` header
    /// - `kid_<reason>` - the `kid` could not be resolved to a key
    /// - `Malformed jwt_vp property: <reason>` - decoding or verification failed
    #[instrument(skip_all, name = "vc.presentation.verify", fields(protocol_version = version.0))]
    pub async fn verify_at(
        &self,
        jwt: &str,
        version: ProtocolVersion,
        now: DateTime<Utc>,
    ) -> Result<Presentation, CheckError> {
        let result = self.verify_inner(jwt, version, now).await;
        match &result {
            Ok(_) => {
                metrics::record_presentation_verification("success");
                tracing::debug!(target: "vc.presentation", "Presentation verified");
            }
            Err((status, e)) => {
                metrics::record_presentation_verification(*status);
                tracing::debug!(target: "vc.presentation", status = %status, error = %e, "Presentation rejected");
            }
        }
        result.map_err(|(_, e)| e)
    }

    async fn verify_inner(
        &self,
        jwt: &str,
        version: ProtocolVersion,
        now: DateTime<Utc>,
    ) -> Result<Presentation, (&'static str, CheckError)> {
        let header = decode_header(jwt).map_err(|e| ("malformed", malformed(e)))?;

        let jwk = if version < ProtocolVersion::V2 {
            let embedded = header
                .jwk
                .ok_or_else(|| ("malformed", malformed("missing jwk header")))?;
            serde_json::from_value::<PublicJwk>(embedded)
                .map_err(|_| ("malformed", malformed("invalid jwk header")))?
        } else {
            if header.jwk.is_some() {
                return Err((
                    "self_signed",
                    CheckError::PresentationMalformed("jwt_vp must not be self signed".to_string()),
                ));
            }
            let kid = header.kid.filter(|kid| !kid.is_empty()).ok_or_else(|| {
                (
                    "kid_unresolved",
                    kid_error(&CheckError::DidResolution("invalid_did_url".to_string())),
                )
            })?;
            get_jwk_from_did_uri(&kid, self.resolver.as_ref())
                .await
                .map_err(|e| ("kid_unresolved", kid_error(&e)))?
        };

        verify_compact(jwt, &jwk).map_err(|e| ("invalid_signature", malformed(e)))?;

        let claims: RegisteredClaims = decode_payload(jwt).map_err(|e| ("malformed", malformed(e)))?;
        let now = now.timestamp();
        if let Some(iat) = claims.iat {
            validate_iat_at(iat, self.clock_skew, now).map_err(|e| ("expired", malformed(e)))?;
        }
        validate_time_window_at(claims.exp, claims.nbf, self.clock_skew, now)
            .map_err(|e| ("expired", malformed(e)))?;

        decode_presentation_jwt(jwt).map_err(|e| {
            let reason = match e {
                CheckError::MalformedJwt(reason) => reason,
                other => other.to_string(),
            };
            ("malformed", malformed(reason))
        })
    }
}

fn malformed(reason: impl std::fmt::Display) -> CheckError {
    CheckError::PresentationMalformed(format!("Malformed jwt_vp property: {reason}"))
}

fn kid_error(err: &CheckError) -> CheckError {
    let reason = match err {
        CheckError::DidResolution(reason) => reason.as_str(),
        other => other.error_code(),
    };
    CheckError::PresentationMalformed(format!("kid_{reason}"))
}
