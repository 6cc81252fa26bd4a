//! # VC Test Utilities
//!
//! Shared test utilities for the credential check crates.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (fixed secp256k1 and Ed25519 keys)
//! - Credential and presentation JWT builders
//! - Fixed test DIDs
//! - Custom assertions (CheckAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vc_test_utils::*;
//!
//! #[test]
//! fn test_example() {
//!     let issuer = test_secp256k1_key(1)?;
//!
//!     let jwt = TestCredentialBuilder::new()
//!         .issued_by(TEST_ROOT_DID)
//!         .expires_in(3600)
//!         .sign_es256k(&issuer)?;
//!
//!     let checks = run_all_org_checks(/* ... */)?;
//!     checks.assert_all_pass();
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use test_ids::*;
pub use token_builders::*;
