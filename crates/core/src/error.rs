//! Authentication error model.
//!
//! Every failure raised by the engine is an [`AuthError`]. Callers that only
//! care about "did it work" handle the enum as a whole; callers that need to
//! react to a specific outcome match the variant (or compare [`AuthError::kind`]).

use std::sync::Arc;

use thiserror::Error;

/// Result type used across the engine.
pub type AuthResult<T> = Result<T, AuthError>;

/// Underlying cause attached to the "unexpected" error kinds.
///
/// Shared so that [`AuthError`] stays `Clone` (errors are handed to listeners
/// and logged after being returned).
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Root of the authentication error taxonomy.
#[derive(Debug, Error, Clone)]
pub enum AuthError {
    /// The account lookup found nothing for the given principal.
    #[error("unknown account: {0}")]
    UnknownAccount(String),

    /// Secret comparison failed, or the token carried no usable principal.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The stored credential (or the account) has expired.
    #[error("expired credentials: {0}")]
    ExpiredCredentials(String),

    #[error("account disabled: {0}")]
    DisabledAccount(String),

    #[error("account locked: {0}")]
    LockedAccount(String),

    /// No authenticator is registered for the token's concrete type.
    #[error("unsupported authentication token: {0}")]
    UnsupportedToken(String),

    /// No token resolver (after scheme filtering) produced a token for the message.
    #[error("unsupported authentication message: {0}")]
    UnsupportedMessage(String),

    /// A token was required but missing, or could not be assembled from an
    /// otherwise eligible message.
    #[error("invalid authentication token: {0}")]
    InvalidToken(String),

    /// A collaborator failed with a non-authentication error, or a caller
    /// violated a precondition.
    #[error("unexpected authentication error: {message}")]
    UnexpectedAuthentication {
        message: String,
        #[source]
        source: Option<Cause>,
    },

    /// Credentials on either side of a comparison have no byte representation.
    #[error("unexpected credentials: {message}")]
    UnexpectedCredentials {
        message: String,
        #[source]
        source: Option<Cause>,
    },

    /// An authentication was required but none is held.
    #[error("no authentication available")]
    NoAuthentication,
}

/// Fieldless discriminant of [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    UnknownAccount,
    InvalidCredentials,
    ExpiredCredentials,
    DisabledAccount,
    LockedAccount,
    UnsupportedToken,
    UnsupportedMessage,
    InvalidToken,
    UnexpectedAuthentication,
    UnexpectedCredentials,
    NoAuthentication,
}

impl AuthError {
    pub fn unknown_account(msg: impl Into<String>) -> Self {
        Self::UnknownAccount(msg.into())
    }

    pub fn invalid_credentials(msg: impl Into<String>) -> Self {
        Self::InvalidCredentials(msg.into())
    }

    pub fn expired_credentials(msg: impl Into<String>) -> Self {
        Self::ExpiredCredentials(msg.into())
    }

    pub fn disabled_account(msg: impl Into<String>) -> Self {
        Self::DisabledAccount(msg.into())
    }

    pub fn locked_account(msg: impl Into<String>) -> Self {
        Self::LockedAccount(msg.into())
    }

    pub fn unsupported_token(msg: impl Into<String>) -> Self {
        Self::UnsupportedToken(msg.into())
    }

    pub fn unsupported_message(msg: impl Into<String>) -> Self {
        Self::UnsupportedMessage(msg.into())
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    /// Precondition violation with no underlying cause.
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::UnexpectedAuthentication {
            message: msg.into(),
            source: None,
        }
    }

    /// Wrap a collaborator failure, keeping it as the error source.
    pub fn unexpected_with(msg: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        Self::UnexpectedAuthentication {
            message: msg.into(),
            source: Some(into_cause(cause.into())),
        }
    }

    /// Convert a failure coming back from a collaborator.
    ///
    /// An [`AuthError`] travelling inside the error is returned unchanged;
    /// anything else is wrapped as [`AuthError::UnexpectedAuthentication`].
    pub fn from_collaborator(msg: impl Into<String>, err: anyhow::Error) -> Self {
        match err.downcast::<AuthError>() {
            Ok(auth) => auth,
            Err(other) => Self::unexpected_with(msg, other),
        }
    }

    pub fn unexpected_credentials(msg: impl Into<String>) -> Self {
        Self::UnexpectedCredentials {
            message: msg.into(),
            source: None,
        }
    }

    pub fn unexpected_credentials_with(
        msg: impl Into<String>,
        cause: impl Into<anyhow::Error>,
    ) -> Self {
        Self::UnexpectedCredentials {
            message: msg.into(),
            source: Some(into_cause(cause.into())),
        }
    }

    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::UnknownAccount(_) => AuthErrorKind::UnknownAccount,
            Self::InvalidCredentials(_) => AuthErrorKind::InvalidCredentials,
            Self::ExpiredCredentials(_) => AuthErrorKind::ExpiredCredentials,
            Self::DisabledAccount(_) => AuthErrorKind::DisabledAccount,
            Self::LockedAccount(_) => AuthErrorKind::LockedAccount,
            Self::UnsupportedToken(_) => AuthErrorKind::UnsupportedToken,
            Self::UnsupportedMessage(_) => AuthErrorKind::UnsupportedMessage,
            Self::InvalidToken(_) => AuthErrorKind::InvalidToken,
            Self::UnexpectedAuthentication { .. } => AuthErrorKind::UnexpectedAuthentication,
            Self::UnexpectedCredentials { .. } => AuthErrorKind::UnexpectedCredentials,
            Self::NoAuthentication => AuthErrorKind::NoAuthentication,
        }
    }
}

fn into_cause(err: anyhow::Error) -> Cause {
    let boxed: Box<dyn std::error::Error + Send + Sync + 'static> = err.into();
    Arc::from(boxed)
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            AuthError::unknown_account("bob").kind(),
            AuthErrorKind::UnknownAccount
        );
        assert_eq!(
            AuthError::unexpected("null token").kind(),
            AuthErrorKind::UnexpectedAuthentication
        );
        assert_eq!(AuthError::NoAuthentication.kind(), AuthErrorKind::NoAuthentication);
    }

    #[test]
    fn wrapped_cause_is_exposed_as_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "db down");
        let err = AuthError::unexpected_with("account lookup failed", io);

        assert_eq!(err.kind(), AuthErrorKind::UnexpectedAuthentication);
        let source = err.source().expect("source");
        assert!(source.to_string().contains("db down"));
    }

    #[test]
    fn collaborator_auth_errors_pass_through() {
        let inner = anyhow::Error::new(AuthError::locked_account("bob"));
        let err = AuthError::from_collaborator("lookup failed", inner);
        assert_eq!(err.kind(), AuthErrorKind::LockedAccount);

        let foreign = anyhow::anyhow!("connection reset");
        let err = AuthError::from_collaborator("lookup failed", foreign);
        assert_eq!(err.kind(), AuthErrorKind::UnexpectedAuthentication);
        assert_eq!(err.to_string(), "unexpected authentication error: lookup failed");
    }

    #[test]
    fn display_includes_detail() {
        let err = AuthError::unsupported_token("my_crate::ApiKeyToken");
        assert_eq!(
            err.to_string(),
            "unsupported authentication token: my_crate::ApiKeyToken"
        );
    }

    #[test]
    fn clones_share_the_cause() {
        let err = AuthError::unexpected_credentials_with("unreadable", anyhow::anyhow!("boom"));
        let copy = err.clone();
        assert_eq!(copy.to_string(), err.to_string());
        assert!(copy.source().is_some());
    }
}
