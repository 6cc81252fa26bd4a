//! Verifiable credential trust checks.
//!
//! Verifies credentials issued as JWTs on behalf of organizations and the
//! presentations that carry them:
//!
//! - Organization credential checks (signature, issuer, expiry, revocation)
//! - Presentation (`jwt_vp`) verification with DID-resolved keys
//! - Primary-source issuer rule for credential types
//! - DID (`did:jwk`, `did:web`) and secp256k1 key helpers
//!
//! # Modules
//!
//! - `checks` - Check results and the individual checks
//! - `config` - Configuration from environment
//! - `credential` - Credential / presentation model and JWT decoding
//! - `did` - DID documents, helpers and resolvers
//! - `errors` - Error types with status code mapping
//! - `jws` - Compact JWS verification and ES256K signing
//! - `keys` - JWK and organization key types, key transforms
//! - `observability` - Logging setup and metrics
//! - `presentation` - Presentation verification

pub mod checks;
pub mod config;
pub mod credential;
pub mod did;
pub mod errors;
pub mod jws;
pub mod keys;
pub mod observability;
pub mod presentation;

pub use checks::{
    run_all_org_checks, CheckContext, CheckResult, CredentialChecks, OrgCheckInput,
};
pub use errors::CheckError;
