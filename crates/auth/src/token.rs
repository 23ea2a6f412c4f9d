//! Authentication requests (tokens) awaiting verification.

use std::any::Any;

use warden_credentials::{Credentials, CredentialsContainer};

/// Upcast helper so tokens can be inspected by concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A principal plus credentials, not yet verified. Carries no authorization data.
///
/// Authenticators are selected by the token's concrete type. The secret is
/// exposed through [`CredentialsContainer`].
pub trait AuthenticationToken:
    CredentialsContainer + AsAny + Send + Sync + core::fmt::Debug + 'static
{
    fn principal(&self) -> Option<&str>;

    /// Scheme the token was presented with (e.g. `Basic`), if known.
    fn scheme(&self) -> Option<&str> {
        None
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn AuthenticationToken {
    pub fn is<T: AuthenticationToken>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: AuthenticationToken>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Account identifier plus secret.
#[derive(Debug, Clone)]
pub struct AccountCredentialsToken {
    account_id: Option<String>,
    secret: Option<Credentials>,
    scheme: Option<String>,
}

impl AccountCredentialsToken {
    pub fn new(account_id: impl Into<String>, secret: impl Into<Credentials>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            secret: Some(secret.into()),
            scheme: None,
        }
    }

    /// Token with possibly missing parts, as decoded from an untrusted source.
    pub fn from_parts(account_id: Option<String>, secret: Option<Credentials>) -> Self {
        Self {
            account_id,
            secret,
            scheme: None,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }
}

impl AuthenticationToken for AccountCredentialsToken {
    fn principal(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }
}

impl CredentialsContainer for AccountCredentialsToken {
    fn credentials(&self) -> Option<&Credentials> {
        self.secret.as_ref()
    }
}

/// Opaque bearer string; it has no principal of its own.
#[derive(Debug, Clone)]
pub struct BearerToken {
    token: Option<Credentials>,
    scheme: Option<String>,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(Credentials::Text(token.into())),
            scheme: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            token: None,
            scheme: None,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        match &self.token {
            Some(Credentials::Text(token)) => Some(token),
            _ => None,
        }
    }
}

impl AuthenticationToken for BearerToken {
    fn principal(&self) -> Option<&str> {
        None
    }

    fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }
}

impl CredentialsContainer for BearerToken {
    fn credentials(&self) -> Option<&Credentials> {
        self.token.as_ref()
    }
}
