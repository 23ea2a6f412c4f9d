//! `warden-auth`: authentication and authorization engine.
//!
//! Tokens are verified by [`Authenticator`]s, permissions are evaluated by
//! [`Authorizer`]s and transport messages are turned into tokens by
//! [`TokenResolver`]s; a [`Realm`] dispatches to all three by type.
//! [`AuthContext`] keeps the authentication of one session.
//!
//! No storage and no transport: accounts come from an [`AccountProvider`]
//! and requests only need to expose headers ([`HttpMessage`]).

pub mod account;
pub mod authentication;
pub mod authenticator;
pub mod authorizer;
pub mod context;
pub mod listener;
pub mod permissions;
pub mod realm;
pub mod resolver;
pub mod token;

pub use account::{Account, AccountBuilder, AccountProvider, InMemoryAccountProvider};
pub use authentication::{Authentication, AuthenticationBuilder};
pub use authenticator::{AccountAuthenticator, Authenticator, BearerAuthenticator};
pub use authorizer::{Authorizer, DefaultAuthorizer};
pub use context::{AuthContext, ListenerId};
pub use listener::AuthenticationListener;
pub use permissions::Permission;
pub use realm::{Realm, RealmBuilder};
pub use resolver::{BasicTokenResolver, BearerTokenResolver, HttpMessage, TokenResolver};
pub use token::{AccountCredentialsToken, AsAny, AuthenticationToken, BearerToken};

pub use warden_core::{AuthError, AuthErrorKind, AuthResult};
