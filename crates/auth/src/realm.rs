//! The realm: registry of authenticators, authorizers and token resolvers.
//!
//! Every table is an ordered list scanned front to back; the first entry
//! registered for the exact concrete type wins. Runtime registration appends
//! under a write lock. Strategies are cloned out and the lock released before
//! they run, so a strategy may itself call back into the realm.

use std::any::{Any, TypeId};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use warden_core::{AuthConfig, AuthError, AuthResult};

use crate::{
    AccountAuthenticator, AccountProvider, Authentication, AuthenticationListener,
    AuthenticationToken, Authenticator, Authorizer, BasicTokenResolver, BearerTokenResolver,
    DefaultAuthorizer, HttpMessage, Permission, TokenResolver,
};

/// Authenticator with its token type erased.
trait ErasedAuthenticator: Send + Sync {
    fn token_type(&self) -> TypeId;

    fn token_type_name(&self) -> &'static str;

    fn authenticate(&self, token: &dyn AuthenticationToken) -> AuthResult<Authentication>;
}

struct AuthenticatorEntry<A>(A);

impl<A: Authenticator + 'static> ErasedAuthenticator for AuthenticatorEntry<A> {
    fn token_type(&self) -> TypeId {
        TypeId::of::<A::Token>()
    }

    fn token_type_name(&self) -> &'static str {
        std::any::type_name::<A::Token>()
    }

    fn authenticate(&self, token: &dyn AuthenticationToken) -> AuthResult<Authentication> {
        let token = token
            .downcast_ref::<A::Token>()
            .ok_or_else(|| AuthError::unsupported_token(token.type_name()))?;
        self.0.authenticate(token)
    }
}

/// Strategy keyed by a type; `strategy` holds an `Arc<dyn Trait<Assoc = T>>`.
#[derive(Clone)]
struct TypedEntry {
    type_id: TypeId,
    strategy: Arc<dyn Any + Send + Sync>,
}

impl TypedEntry {
    fn authorizer<P: 'static>(authorizer: Arc<dyn Authorizer<Permission = P>>) -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            strategy: Arc::new(authorizer),
        }
    }

    fn as_authorizer<P: 'static>(&self) -> Option<Arc<dyn Authorizer<Permission = P>>> {
        if self.type_id != TypeId::of::<P>() {
            return None;
        }
        self.strategy
            .downcast_ref::<Arc<dyn Authorizer<Permission = P>>>()
            .cloned()
    }
}

#[derive(Clone)]
struct ResolverEntry {
    scheme: Option<String>,
    entry: TypedEntry,
}

impl ResolverEntry {
    fn new<M: 'static>(resolver: Arc<dyn TokenResolver<Message = M>>) -> Self {
        Self {
            scheme: resolver.scheme().map(str::to_owned),
            entry: TypedEntry {
                type_id: TypeId::of::<M>(),
                strategy: Arc::new(resolver),
            },
        }
    }

    fn as_resolver<M: 'static>(&self) -> Option<Arc<dyn TokenResolver<Message = M>>> {
        if self.entry.type_id != TypeId::of::<M>() {
            return None;
        }
        self.entry
            .strategy
            .downcast_ref::<Arc<dyn TokenResolver<Message = M>>>()
            .cloned()
    }

    fn accepts_any(&self, schemes: &[&str]) -> bool {
        match &self.scheme {
            Some(own) => schemes.iter().any(|s| s.eq_ignore_ascii_case(own)),
            None => false,
        }
    }
}

pub struct Realm {
    name: Option<String>,
    config: AuthConfig,
    authenticators: RwLock<Vec<Arc<dyn ErasedAuthenticator>>>,
    authorizers: RwLock<Vec<TypedEntry>>,
    resolvers: RwLock<Vec<ResolverEntry>>,
    listeners: RwLock<Vec<Arc<dyn AuthenticationListener>>>,
}

impl core::fmt::Debug for Realm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Realm")
            .field("name", &self.name)
            .field("authenticators", &table_len(&self.authenticators))
            .field("authorizers", &table_len(&self.authorizers))
            .field("resolvers", &table_len(&self.resolvers))
            .finish_non_exhaustive()
    }
}

fn table_len<T>(lock: &RwLock<Vec<T>>) -> Option<usize> {
    lock.read().ok().map(|table| table.len())
}

fn read<T>(lock: &RwLock<T>) -> AuthResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| AuthError::unexpected("realm registry lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> AuthResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| AuthError::unexpected("realm registry lock poisoned"))
}

impl Realm {
    pub fn builder() -> RealmBuilder {
        RealmBuilder::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn add_authenticator<A: Authenticator + 'static>(&self, authenticator: A) -> AuthResult<()> {
        write(&self.authenticators)?.push(Arc::new(AuthenticatorEntry(authenticator)));
        Ok(())
    }

    pub fn add_authorizer<P, Z>(&self, authorizer: Z) -> AuthResult<()>
    where
        P: 'static,
        Z: Authorizer<Permission = P> + 'static,
    {
        write(&self.authorizers)?.push(TypedEntry::authorizer::<P>(Arc::new(authorizer)));
        Ok(())
    }

    pub fn add_resolver<M, R>(&self, resolver: R) -> AuthResult<()>
    where
        M: 'static,
        R: TokenResolver<Message = M> + 'static,
    {
        write(&self.resolvers)?.push(ResolverEntry::new::<M>(Arc::new(resolver)));
        Ok(())
    }

    pub fn add_listener(&self, listener: impl AuthenticationListener + 'static) -> AuthResult<()> {
        write(&self.listeners)?.push(Arc::new(listener));
        Ok(())
    }

    /// Whether an authenticator is registered for tokens of type `T`.
    pub fn supports_token<T: AuthenticationToken>(&self) -> bool {
        read(&self.authenticators)
            .map(|table| table.iter().any(|a| a.token_type() == TypeId::of::<T>()))
            .unwrap_or(false)
    }

    /// Whether some resolver for `M` would be tried for these schemes
    /// (all resolvers for `M` when `schemes` is empty).
    pub fn supports_message<M: 'static>(&self, schemes: &[&str]) -> bool {
        read(&self.resolvers)
            .map(|table| {
                table.iter().any(|r| {
                    r.entry.type_id == TypeId::of::<M>() && (schemes.is_empty() || r.accepts_any(schemes))
                })
            })
            .unwrap_or(false)
    }

    /// Authenticate a token with the first authenticator registered for its
    /// concrete type, then notify the realm's listeners.
    ///
    /// Errors:
    /// - `UnsupportedToken` when no authenticator handles the type
    /// - whatever the authenticator returns, unchanged
    /// - a listener's error, after the authentication succeeded
    pub fn authenticate(&self, token: &dyn AuthenticationToken) -> AuthResult<Authentication> {
        let type_id = Any::type_id(token.as_any());
        let authenticator = read(&self.authenticators)?
            .iter()
            .find(|a| a.token_type() == type_id)
            .cloned();

        let Some(authenticator) = authenticator else {
            tracing::warn!(token_type = token.type_name(), "no authenticator for token type");
            return Err(AuthError::unsupported_token(token.type_name()));
        };
        tracing::debug!(
            realm = self.name.as_deref(),
            token_type = authenticator.token_type_name(),
            "authenticator selected"
        );

        let authentication = match authenticator.authenticate(token) {
            Ok(authentication) => authentication,
            Err(err) => {
                tracing::warn!(kind = ?err.kind(), token_type = token.type_name(), "authentication rejected");
                return Err(err);
            }
        };

        tracing::info!(
            realm = self.name.as_deref(),
            principal = authentication.principal_name(),
            scheme = authentication.scheme(),
            "authenticated"
        );
        self.notify(&authentication)?;
        Ok(authentication)
    }

    /// [`Realm::authenticate`] for callers holding a token that may be absent.
    /// A missing token is a caller error (`UnexpectedAuthentication`).
    pub fn authenticate_optional(
        &self,
        token: Option<&dyn AuthenticationToken>,
    ) -> AuthResult<Authentication> {
        match token {
            Some(token) => self.authenticate(token),
            None => Err(AuthError::unexpected("authentication token is required")),
        }
    }

    /// Resolve a token from `message` and authenticate it.
    ///
    /// Resolvers registered for `M` are tried in registration order; with a
    /// non-empty `schemes` only those declaring one of them are considered.
    /// The first resolver producing a token ends the chain, and so does the
    /// first resolver error.
    pub fn authenticate_message<M: 'static>(
        &self,
        message: &M,
        schemes: &[&str],
    ) -> AuthResult<Authentication> {
        let message_type = std::any::type_name::<M>();
        let candidates: Vec<ResolverEntry> = read(&self.resolvers)?
            .iter()
            .filter(|r| r.entry.type_id == TypeId::of::<M>())
            .cloned()
            .collect();

        if candidates.is_empty() {
            tracing::warn!(message_type, "no token resolver for message type");
            return Err(AuthError::unsupported_message(message_type));
        }

        let candidates: Vec<ResolverEntry> = if schemes.is_empty() {
            candidates
        } else {
            candidates.into_iter().filter(|r| r.accepts_any(schemes)).collect()
        };
        if candidates.is_empty() {
            tracing::warn!(message_type, ?schemes, "no token resolver for requested schemes");
            return Err(AuthError::unsupported_message(format!(
                "{message_type} (schemes: {})",
                schemes.join(", ")
            )));
        }

        for candidate in &candidates {
            let Some(resolver) = candidate.as_resolver::<M>() else {
                continue;
            };
            let resolved = resolver.resolve(message).inspect_err(|err| {
                tracing::warn!(kind = ?err.kind(), scheme = candidate.scheme.as_deref(), "token resolution failed");
            })?;

            if let Some(token) = resolved {
                tracing::debug!(
                    message_type,
                    scheme = candidate.scheme.as_deref(),
                    token_type = token.type_name(),
                    "token resolved"
                );
                return self.authenticate(token.as_ref());
            }
        }

        tracing::warn!(message_type, "no token resolver produced a token");
        Err(AuthError::unsupported_message(message_type))
    }

    /// ALL check through the first authorizer registered for `P`.
    ///
    /// Fails closed: no authentication, or no authorizer for `P`, is `false`.
    pub fn is_permitted<P: 'static>(&self, authentication: Option<&Authentication>, required: &[P]) -> bool {
        match (authentication, self.authorizer::<P>()) {
            (Some(authentication), Some(authorizer)) => authorizer.is_permitted(authentication, required),
            _ => false,
        }
    }

    /// ANY check through the first authorizer registered for `P`.
    pub fn is_permitted_any<P: 'static>(
        &self,
        authentication: Option<&Authentication>,
        required: &[P],
    ) -> bool {
        match (authentication, self.authorizer::<P>()) {
            (Some(authentication), Some(authorizer)) => {
                authorizer.is_permitted_any(authentication, required)
            }
            _ => false,
        }
    }

    /// String permissions evaluated as named [`Permission`]s.
    pub fn is_permitted_str(&self, authentication: Option<&Authentication>, required: &[&str]) -> bool {
        self.is_permitted(authentication, &named(required))
    }

    pub fn is_permitted_any_str(
        &self,
        authentication: Option<&Authentication>,
        required: &[&str],
    ) -> bool {
        self.is_permitted_any(authentication, &named(required))
    }

    fn authorizer<P: 'static>(&self) -> Option<Arc<dyn Authorizer<Permission = P>>> {
        let table = match read(&self.authorizers) {
            Ok(table) => table,
            Err(_) => {
                tracing::warn!("authorizer registry poisoned; denying");
                return None;
            }
        };
        let found = table.iter().find_map(TypedEntry::as_authorizer::<P>);
        if found.is_none() {
            tracing::debug!(
                permission_type = std::any::type_name::<P>(),
                "no authorizer for permission type"
            );
        }
        found
    }

    fn notify(&self, authentication: &Authentication) -> AuthResult<()> {
        let listeners = read(&self.listeners)?.clone();
        for listener in listeners {
            listener.on_authentication(Some(authentication))?;
        }
        Ok(())
    }
}

fn named(required: &[&str]) -> Vec<Permission> {
    required
        .iter()
        .map(|name| Permission::new(name.to_string()))
        .collect()
}

/// Assembles a [`Realm`].
///
/// `with_config` should come first: the `with_http_*` and
/// `account_authenticator` helpers read the configuration current at the
/// time they are called.
#[derive(Default)]
pub struct RealmBuilder {
    name: Option<String>,
    config: AuthConfig,
    authenticators: Vec<Arc<dyn ErasedAuthenticator>>,
    authorizers: Vec<TypedEntry>,
    resolvers: Vec<ResolverEntry>,
    listeners: Vec<Arc<dyn AuthenticationListener>>,
}

impl RealmBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_config(mut self, config: AuthConfig) -> Self {
        self.config = config;
        self
    }

    pub fn authenticator<A: Authenticator + 'static>(mut self, authenticator: A) -> Self {
        self.authenticators.push(Arc::new(AuthenticatorEntry(authenticator)));
        self
    }

    /// Registers an [`AccountAuthenticator`] configured from this builder's config.
    pub fn account_authenticator<P: AccountProvider + 'static>(self, provider: P) -> Self {
        let authenticator = AccountAuthenticator::from_config(provider, &self.config);
        self.authenticator(authenticator)
    }

    pub fn authorizer<P, Z>(mut self, authorizer: Z) -> Self
    where
        P: 'static,
        Z: Authorizer<Permission = P> + 'static,
    {
        self.authorizers.push(TypedEntry::authorizer::<P>(Arc::new(authorizer)));
        self
    }

    pub fn with_default_authorizer(self) -> Self {
        self.authorizer(DefaultAuthorizer::new())
    }

    pub fn resolver<M, R>(mut self, resolver: R) -> Self
    where
        M: 'static,
        R: TokenResolver<Message = M> + 'static,
    {
        self.resolvers.push(ResolverEntry::new::<M>(Arc::new(resolver)));
        self
    }

    pub fn with_http_basic_resolver<M: HttpMessage + 'static>(self) -> Self {
        let resolver = BasicTokenResolver::<M>::from_config(&self.config);
        self.resolver(resolver)
    }

    pub fn with_http_bearer_resolver<M: HttpMessage + 'static>(self) -> Self {
        let resolver = BearerTokenResolver::<M>::from_config(&self.config);
        self.resolver(resolver)
    }

    pub fn listener(mut self, listener: impl AuthenticationListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn build(self) -> Realm {
        Realm {
            name: self.name,
            config: self.config,
            authenticators: RwLock::new(self.authenticators),
            authorizers: RwLock::new(self.authorizers),
            resolvers: RwLock::new(self.resolvers),
            listeners: RwLock::new(self.listeners),
        }
    }
}
