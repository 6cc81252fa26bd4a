//! Secret types for key material that must never reach a log line.
//!
//! Re-exports [`secrecy`] types. `SecretString` and `SecretBox<T>` redact
//! themselves in `Debug`, so a struct that derives `Debug` while holding a
//! private key stays safe to pass to `tracing` fields.
//!
//! Use `SecretString` for:
//! - secp256k1 private keys in hex
//! - private JWK `d` coordinates
//! - KMS-exported key material
//!
//! # Example
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct OperatorKey {
//!     kid: String,
//!     private_hex: SecretString,
//! }
//!
//! let key = OperatorKey {
//!     kid: "#eth-account-key-1".to_string(),
//!     private_hex: SecretString::from("0b1f..."),
//! };
//!
//! assert!(!format!("{key:?}").contains("0b1f"));
//! let _raw: &str = key.private_hex.expose_secret();
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
