use thiserror::Error;

use warden_core::{AuthError, UnknownCharset};

use crate::SecretEncoding;

/// Configuration errors raised while building or decoding credentials.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no secret provided")]
    MissingSecret,

    #[error("unsupported hash algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error(transparent)]
    UnsupportedCharset(#[from] UnknownCharset),

    #[error("hash iterations must be at least 1, got {0}")]
    InvalidIterations(u32),

    #[error("secret cannot be both base64 and hex encoded")]
    ConflictingEncodings,

    #[error("failed to decode {encoding} data: {reason}")]
    Decode {
        encoding: SecretEncoding,
        reason: String,
    },
}

impl From<CredentialError> for AuthError {
    fn from(err: CredentialError) -> Self {
        AuthError::unexpected_credentials_with("credentials could not be interpreted", err)
    }
}
