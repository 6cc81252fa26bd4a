//! Credential check error types.
//!
//! Every variant carries an HTTP-style status code and a stable snake-case
//! error code so callers embedding these checks in a service can surface
//! them without re-mapping.

use common::jwt::JwtValidationError;
use thiserror::Error;

/// Credential check error type.
///
/// Maps to status codes:
/// - MalformedJwt, PresentationMalformed, IssuerRequiresNotaryPermission,
///   ServiceIdAlreadyExists, InvalidKey, DidResolution: 400 Bad Request
/// - NotFound: 404 Not Found
/// - ServiceUnavailable: 503 Service Unavailable
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("Malformed JWT: {0}")]
    MalformedJwt(String),

    #[error("{0}")]
    PresentationMalformed(String),

    #[error("issuer_requires_notary_permission")]
    IssuerRequiresNotaryPermission,

    #[error("Service id already exists: {0}")]
    ServiceIdAlreadyExists(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Reason is a snake-case token such as `did_document_not_found`.
    #[error("{0}")]
    DidResolution(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            CheckError::MalformedJwt(_)
            | CheckError::PresentationMalformed(_)
            | CheckError::IssuerRequiresNotaryPermission
            | CheckError::ServiceIdAlreadyExists(_)
            | CheckError::InvalidKey(_)
            | CheckError::DidResolution(_) => 400,
            CheckError::NotFound(_) => 404,
            CheckError::ServiceUnavailable(_) => 503,
            CheckError::Internal(_) => 500,
        }
    }

    /// Returns the stable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            CheckError::MalformedJwt(_) => "jwt_malformed",
            CheckError::PresentationMalformed(_) => "presentation_malformed",
            CheckError::IssuerRequiresNotaryPermission => "issuer_requires_notary_permission",
            CheckError::ServiceIdAlreadyExists(_) => "service_id_already_exists",
            CheckError::InvalidKey(_) => "invalid_key",
            CheckError::DidResolution(_) => "did_resolution_failed",
            CheckError::NotFound(_) => "not_found",
            CheckError::ServiceUnavailable(_) => "service_unavailable",
            CheckError::Internal(_) => "internal_error",
        }
    }
}

impl From<JwtValidationError> for CheckError {
    fn from(err: JwtValidationError) -> Self {
        CheckError::MalformedJwt(err.to_string())
    }
}
