//! Credential check configuration.
//!
//! Configuration is loaded from environment variables.

use crate::did::resolver::{DEFAULT_CACHE_TTL_SECONDS, DEFAULT_REQUEST_TIMEOUT_SECONDS};
use crate::keys::{public_jwk_from_secp256k1_key, PublicJwk};
use common::config::ObservabilityConfig;
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use std::collections::HashMap;
use std::env;
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;

/// Default registrar base URL.
pub const DEFAULT_REGISTRAR_URL: &str = "http://localhost:3000";

/// Upper bound for the DID document cache TTL (1 day).
const MAX_CACHE_TTL_SECONDS: u64 = 86_400;

/// Upper bound for the HTTP request timeout.
const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 120;

/// Credential check configuration.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// DID of the root issuer that signs organization credentials.
    pub root_did: String,

    /// Public key of the root issuer.
    pub root_public_key: PublicJwk,

    /// Base URL of the registrar used for DID resolution.
    pub registrar_url: String,

    /// How long resolved DID documents are cached.
    pub did_cache_ttl_seconds: u64,

    /// Timeout for registrar and did:web requests.
    pub request_timeout_seconds: u64,

    /// Clock skew tolerance for presentation time claims.
    pub jwt_clock_skew_seconds: u64,

    /// Logging setup.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid root DID: {0}")]
    InvalidRootDid(String),

    #[error("Invalid root public key: {0}")]
    InvalidRootPublicKey(String),

    #[error("Invalid registrar URL: {0}")]
    InvalidRegistrarUrl(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid DID cache TTL configuration: {0}")]
    InvalidCacheTtl(String),

    #[error("Invalid request timeout configuration: {0}")]
    InvalidRequestTimeout(String),
}

impl CheckConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first invalid or missing variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first invalid or missing variable.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let root_did = vars
            .get("ROOT_DID")
            .map(|v| v.trim().to_string())
            .ok_or_else(|| ConfigError::MissingEnvVar("ROOT_DID".to_string()))?;
        if !root_did.starts_with("did:") || root_did.contains('#') {
            return Err(ConfigError::InvalidRootDid(format!(
                "ROOT_DID must be a DID without fragment, got '{root_did}'"
            )));
        }

        let root_public_key = parse_root_public_key(
            vars.get("ROOT_PUBLIC_KEY")
                .ok_or_else(|| ConfigError::MissingEnvVar("ROOT_PUBLIC_KEY".to_string()))?,
        )?;

        let registrar_url = vars
            .get("REGISTRAR_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_REGISTRAR_URL.to_string());
        url::Url::parse(&registrar_url).map_err(|e| {
            ConfigError::InvalidRegistrarUrl(format!(
                "REGISTRAR_URL must be an absolute URL, got '{registrar_url}': {e}"
            ))
        })?;

        let did_cache_ttl_seconds = parse_bounded(
            vars,
            "DID_CACHE_TTL_SECONDS",
            DEFAULT_CACHE_TTL_SECONDS,
            0..=MAX_CACHE_TTL_SECONDS,
            ConfigError::InvalidCacheTtl,
        )?;

        let request_timeout_seconds = parse_bounded(
            vars,
            "REQUEST_TIMEOUT_SECONDS",
            DEFAULT_REQUEST_TIMEOUT_SECONDS,
            1..=MAX_REQUEST_TIMEOUT_SECONDS,
            ConfigError::InvalidRequestTimeout,
        )?;

        let jwt_clock_skew_seconds = parse_bounded(
            vars,
            "JWT_CLOCK_SKEW_SECONDS",
            DEFAULT_CLOCK_SKEW.as_secs(),
            1..=MAX_CLOCK_SKEW.as_secs(),
            ConfigError::InvalidJwtClockSkew,
        )?;

        Ok(Self {
            root_did,
            root_public_key,
            registrar_url,
            did_cache_ttl_seconds,
            request_timeout_seconds,
            jwt_clock_skew_seconds,
            observability: ObservabilityConfig::from_vars(vars),
        })
    }

    pub fn did_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.did_cache_ttl_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn jwt_clock_skew(&self) -> Duration {
        Duration::from_secs(self.jwt_clock_skew_seconds)
    }
}

/// A JWK as JSON, or a secp256k1 key as hex or PEM (`\n` escapes allowed).
fn parse_root_public_key(value: &str) -> Result<PublicJwk, ConfigError> {
    let value = value.trim();
    if value.starts_with('{') {
        return serde_json::from_str(value).map_err(|e| {
            ConfigError::InvalidRootPublicKey(format!("ROOT_PUBLIC_KEY is not a JWK: {e}"))
        });
    }

    public_jwk_from_secp256k1_key(&value.replace("\\n", "\n"))
        .map_err(|e| ConfigError::InvalidRootPublicKey(format!("ROOT_PUBLIC_KEY: {e}")))
}

/// Parse a positive integer no larger than `max`, or return `default` when unset.
fn parse_bounded(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
    range: RangeInclusive<u64>,
    error: fn(String) -> ConfigError,
) -> Result<u64, ConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: u64 = value_str.parse().map_err(|e| {
        error(format!(
            "{name} must be a valid positive integer, got '{value_str}': {e}"
        ))
    })?;

    if value < *range.start() {
        return Err(error(format!(
            "{name} must be at least {} seconds, got {value}",
            range.start()
        )));
    }

    if value > *range.end() {
        return Err(error(format!(
            "{name} must not exceed {} seconds, got {value}",
            range.end()
        )));
    }

    Ok(value)
}
