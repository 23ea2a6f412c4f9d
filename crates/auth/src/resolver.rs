//! Token resolvers: extract an [`AuthenticationToken`] from a transport message.
//!
//! A resolver answers `Ok(None)` when the message is not for it. An error
//! means the message was meant for this resolver but is malformed; the realm
//! stops the chain there.

use std::collections::HashMap;
use std::marker::PhantomData;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use warden_core::{AuthConfig, AuthError, AuthResult};
use warden_credentials::Credentials;

use crate::{AccountCredentialsToken, AuthenticationToken, BearerToken};

pub trait TokenResolver: Send + Sync {
    type Message: 'static;

    /// Scheme this resolver handles; `None` resolvers are dropped by any
    /// scheme-filtered lookup.
    fn scheme(&self) -> Option<&str>;

    fn resolve(&self, message: &Self::Message) -> AuthResult<Option<Box<dyn AuthenticationToken>>>;
}

/// Read-only header access, all the built-in resolvers need from a request.
pub trait HttpMessage {
    /// Header value by case-insensitive name. Non-text values read as absent.
    fn header(&self, name: &str) -> Option<String>;
}

impl HttpMessage for http::HeaderMap {
    fn header(&self, name: &str) -> Option<String> {
        self.get(name)?.to_str().ok().map(str::to_owned)
    }
}

impl<B> HttpMessage for http::Request<B> {
    fn header(&self, name: &str) -> Option<String> {
        self.headers().header(name)
    }
}

impl HttpMessage for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<String> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
    }
}

/// Splits `<scheme> <payload>` when the scheme matches; `None` otherwise.
fn scheme_payload<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    let value = value.trim();
    let (presented, payload) = match value.split_once(char::is_whitespace) {
        Some((presented, payload)) => (presented, payload.trim()),
        None => (value, ""),
    };
    presented.eq_ignore_ascii_case(scheme).then_some(payload)
}

/// HTTP Basic: `Authorization: Basic base64(user:password)`.
pub struct BasicTokenResolver<M> {
    header: String,
    scheme: String,
    _message: PhantomData<fn(&M)>,
}

impl<M: HttpMessage + 'static> BasicTokenResolver<M> {
    pub fn new() -> Self {
        Self::from_config(&AuthConfig::default())
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            header: config.authorization_header.clone(),
            scheme: config.basic_scheme.clone(),
            _message: PhantomData,
        }
    }
}

impl<M: HttpMessage + 'static> Default for BasicTokenResolver<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: HttpMessage + 'static> TokenResolver for BasicTokenResolver<M> {
    type Message = M;

    fn scheme(&self) -> Option<&str> {
        Some(&self.scheme)
    }

    fn resolve(&self, message: &M) -> AuthResult<Option<Box<dyn AuthenticationToken>>> {
        let Some(value) = message.header(&self.header) else {
            return Ok(None);
        };
        let Some(payload) = scheme_payload(&value, &self.scheme) else {
            return Ok(None);
        };

        if payload.is_empty() {
            return Err(AuthError::invalid_token("empty basic credentials"));
        }
        let decoded = STANDARD
            .decode(payload)
            .map_err(|_| AuthError::invalid_token("basic credentials are not valid base64"))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| AuthError::invalid_token("basic credentials are not valid UTF-8"))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| AuthError::invalid_token("basic credentials lack ':' separator"))?;

        let token = AccountCredentialsToken::new(username, Credentials::Text(password.to_string()))
            .with_scheme(self.scheme.clone());
        Ok(Some(Box::new(token)))
    }
}

/// `Authorization: Bearer <token>`.
pub struct BearerTokenResolver<M> {
    header: String,
    scheme: String,
    _message: PhantomData<fn(&M)>,
}

impl<M: HttpMessage + 'static> BearerTokenResolver<M> {
    pub fn new() -> Self {
        Self::from_config(&AuthConfig::default())
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            header: config.authorization_header.clone(),
            scheme: config.bearer_scheme.clone(),
            _message: PhantomData,
        }
    }
}

impl<M: HttpMessage + 'static> Default for BearerTokenResolver<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: HttpMessage + 'static> TokenResolver for BearerTokenResolver<M> {
    type Message = M;

    fn scheme(&self) -> Option<&str> {
        Some(&self.scheme)
    }

    fn resolve(&self, message: &M) -> AuthResult<Option<Box<dyn AuthenticationToken>>> {
        let Some(value) = message.header(&self.header) else {
            return Ok(None);
        };
        let Some(token) = scheme_payload(&value, &self.scheme) else {
            return Ok(None);
        };

        if token.is_empty() {
            return Err(AuthError::invalid_token("empty bearer token"));
        }
        Ok(Some(Box::new(
            BearerToken::new(token).with_scheme(self.scheme.clone()),
        )))
    }
}
