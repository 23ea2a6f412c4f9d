//! Strategies turning a token into an [`Authentication`].

use std::sync::Arc;

use chrono::Utc;

use warden_core::{AuthConfig, AuthError, AuthResult};
use warden_credentials::{
    Credentials, CredentialsContainer, CredentialsMatcher, DefaultCredentialsMatcher,
};

use crate::{AccountCredentialsToken, AccountProvider, Authentication, AuthenticationToken, BearerToken};

/// Verifies one concrete token type.
///
/// Failures are [`AuthError`]s; a foreign error must be converted before it
/// leaves the authenticator (see [`AuthError::from_collaborator`]).
pub trait Authenticator: Send + Sync {
    type Token: AuthenticationToken;

    fn authenticate(&self, token: &Self::Token) -> AuthResult<Authentication>;
}

/// Authenticates [`AccountCredentialsToken`]s against accounts loaded from an
/// [`AccountProvider`].
///
/// Checks run in this order: principal present, account found, not locked,
/// enabled, account not expired, secret matches, stored credential not
/// expired.
pub struct AccountAuthenticator<P> {
    provider: P,
    matcher: Arc<dyn CredentialsMatcher>,
    check_credential_expiry: bool,
}

impl<P: AccountProvider> AccountAuthenticator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            matcher: Arc::new(DefaultCredentialsMatcher::new()),
            check_credential_expiry: true,
        }
    }

    /// Charset and expiry policy taken from `config`.
    pub fn from_config(provider: P, config: &AuthConfig) -> Self {
        Self {
            provider,
            matcher: Arc::new(DefaultCredentialsMatcher::with_charset(config.charset)),
            check_credential_expiry: config.check_credential_expiry,
        }
    }

    pub fn with_matcher(mut self, matcher: impl CredentialsMatcher + 'static) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    pub fn check_credential_expiry(mut self, check: bool) -> Self {
        self.check_credential_expiry = check;
        self
    }
}

impl<P: AccountProvider> Authenticator for AccountAuthenticator<P> {
    type Token = AccountCredentialsToken;

    fn authenticate(&self, token: &AccountCredentialsToken) -> AuthResult<Authentication> {
        let id = match token.principal() {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(AuthError::invalid_credentials("missing account id")),
        };

        let account = self
            .provider
            .load_account_by_id(id)
            .map_err(|e| AuthError::from_collaborator(format!("failed to load account {id}"), e))?
            .ok_or_else(|| AuthError::unknown_account(id))?;

        if account.is_locked() {
            return Err(AuthError::locked_account(id));
        }
        if !account.is_enabled() {
            return Err(AuthError::disabled_account(id));
        }
        if account.is_expired() {
            return Err(AuthError::expired_credentials(format!("account {id} has expired")));
        }

        if !self.matcher.matches(token, &account)? {
            return Err(AuthError::invalid_credentials(format!(
                "credentials mismatch for account {id}"
            )));
        }

        if self.check_credential_expiry {
            if let Some(Credentials::Stored(credential)) = account.credentials() {
                if credential.is_expired(Utc::now()) {
                    return Err(AuthError::expired_credentials(format!(
                        "credentials of account {id} have expired"
                    )));
                }
            }
        }

        let mut builder = Authentication::builder(account.id())
            .root(account.is_root())
            .permissions(account.permissions().iter().cloned())
            .parameters(account.details().clone());
        if let Some(scheme) = token.scheme() {
            builder = builder.scheme(scheme);
        }

        Ok(builder.build())
    }
}

/// Authenticates [`BearerToken`]s by looking the token up.
///
/// The lookup returns the authentication the token stands for, `None` when
/// the token is not recognized.
pub struct BearerAuthenticator<F> {
    lookup: F,
}

impl<F> BearerAuthenticator<F>
where
    F: Fn(&str) -> anyhow::Result<Option<Authentication>> + Send + Sync,
{
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }
}

impl<F> Authenticator for BearerAuthenticator<F>
where
    F: Fn(&str) -> anyhow::Result<Option<Authentication>> + Send + Sync,
{
    type Token = BearerToken;

    fn authenticate(&self, token: &BearerToken) -> AuthResult<Authentication> {
        let value = match token.token() {
            Some(value) if !value.trim().is_empty() => value,
            _ => return Err(AuthError::invalid_token("missing bearer token")),
        };

        let authentication = (self.lookup)(value)
            .map_err(|e| AuthError::from_collaborator("bearer token lookup failed", e))?
            .ok_or_else(|| AuthError::invalid_credentials("bearer token not recognized"))?;

        match (authentication.scheme(), token.scheme()) {
            (None, Some(scheme)) => Ok(authentication.to_builder().scheme(scheme).build()),
            _ => Ok(authentication),
        }
    }
}
