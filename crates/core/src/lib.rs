//! `warden-core`: shared foundation of the authentication engine.
//!
//! Error taxonomy, configuration and charset handling. No storage, no transport.

pub mod charset;
pub mod config;
pub mod error;

pub use charset::{Charset, UnknownCharset};
pub use config::{AuthConfig, ConfigError, ConfigLoader};
pub use error::{AuthError, AuthErrorKind, AuthResult, Cause};
