//! Common utilities and types shared across the credential check crates.

#![warn(clippy::pedantic)]

/// Module for logging configuration
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (segment parsing, size limits, time claims)
pub mod jwt;
