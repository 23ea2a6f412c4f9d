//! `warden-credentials`: storage form, derivation and matching of secrets.
//!
//! Pure computation: no lookups, no global state.

pub mod algorithm;
pub mod credential;
pub mod encoder;
pub mod error;
pub mod matcher;
pub mod payload;

pub use algorithm::HashAlgorithm;
pub use credential::{Credential, CredentialBuilder, SecretEncoding};
pub use encoder::CredentialEncoder;
pub use error::CredentialError;
pub use matcher::{CredentialsMatcher, DefaultCredentialsMatcher};
pub use payload::{Credentials, CredentialsContainer};
