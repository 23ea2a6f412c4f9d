//! Session-scoped holder of the current [`Authentication`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use warden_core::{AuthError, AuthResult};

use crate::{Authentication, AuthenticationListener, AuthenticationToken, Permission, Realm, authorizer};

/// Handle returned by [`AuthContext::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listeners = Vec<(ListenerId, Arc<dyn AuthenticationListener>)>;

/// Wraps a shared [`Realm`] and remembers who is authenticated.
///
/// Intended for one logical session (a request, a user session). It is
/// `Sync`: replacing `current` and notifying listeners happen under one
/// lock, so an `authenticate` never interleaves with an `unauthenticate`.
/// Listeners run while that lock is held and must not call back into the
/// same context.
///
/// A listener error after a successful authentication is returned to the
/// caller, but the new authentication stays current.
pub struct AuthContext {
    realm: Arc<Realm>,
    current: Mutex<Option<Arc<Authentication>>>,
    listeners: RwLock<Listeners>,
    next_listener: AtomicU64,
}

impl core::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthContext")
            .field("realm", &self.realm)
            .field("current", &*self.current())
            .finish_non_exhaustive()
    }
}

impl AuthContext {
    pub fn new(realm: Arc<Realm>) -> Self {
        Self {
            realm,
            current: Mutex::new(None),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    pub fn realm(&self) -> &Arc<Realm> {
        &self.realm
    }

    pub fn add_listener(&self, listener: impl AuthenticationListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns whether a listener was registered under `id`.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Authenticate through the realm and make the result current.
    ///
    /// On failure `current` is untouched.
    pub fn authenticate_token(&self, token: &dyn AuthenticationToken) -> AuthResult<Arc<Authentication>> {
        let authentication = self.realm.authenticate(token)?;
        self.replace(authentication)
    }

    /// Resolve a token from `message` through the realm, then as
    /// [`AuthContext::authenticate_token`].
    pub fn authenticate_message<M: 'static>(
        &self,
        message: &M,
        schemes: &[&str],
    ) -> AuthResult<Arc<Authentication>> {
        let authentication = self.realm.authenticate_message(message, schemes)?;
        self.replace(authentication)
    }

    /// Clear `current` and return what it held.
    ///
    /// Listeners are told (with `None`) even when nothing was authenticated.
    pub fn unauthenticate(&self) -> AuthResult<Option<Arc<Authentication>>> {
        let mut current = self.current();
        let previous = current.take();
        match &previous {
            Some(authentication) => {
                tracing::info!(principal = authentication.principal_name(), "unauthenticated")
            }
            None => tracing::debug!("unauthenticate without current authentication"),
        }
        self.notify(None)?;
        drop(current);
        Ok(previous)
    }

    pub fn get_authentication(&self) -> Option<Arc<Authentication>> {
        self.current().clone()
    }

    /// Like [`AuthContext::get_authentication`], but absence is an error.
    pub fn require_authentication(&self) -> AuthResult<Arc<Authentication>> {
        self.get_authentication().ok_or(AuthError::NoAuthentication)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// ALL check against the current authentication through the realm's
    /// authorizer for `P`; `false` when unauthenticated.
    pub fn is_permitted<P: 'static>(&self, required: &[P]) -> bool {
        let current = self.get_authentication();
        self.realm.is_permitted(current.as_deref(), required)
    }

    pub fn is_permitted_any<P: 'static>(&self, required: &[P]) -> bool {
        let current = self.get_authentication();
        self.realm.is_permitted_any(current.as_deref(), required)
    }

    pub fn is_permitted_str(&self, required: &[&str]) -> bool {
        let current = self.get_authentication();
        self.realm.is_permitted_str(current.as_deref(), required)
    }

    pub fn is_permitted_any_str(&self, required: &[&str]) -> bool {
        let current = self.get_authentication();
        self.realm.is_permitted_any_str(current.as_deref(), required)
    }

    /// Evaluates named permissions on the current authentication directly,
    /// without consulting the realm's authorizers.
    pub fn has_permissions(&self, required: &[Permission]) -> bool {
        authorizer::permitted_all(self.get_authentication().as_deref(), required)
    }

    fn replace(&self, authentication: Authentication) -> AuthResult<Arc<Authentication>> {
        let authentication = Arc::new(authentication);
        let mut current = self.current();
        *current = Some(Arc::clone(&authentication));
        tracing::debug!(principal = authentication.principal_name(), "context authentication replaced");

        self.notify(Some(authentication.as_ref()))?;
        drop(current);
        Ok(authentication)
    }

    fn notify(&self, authentication: Option<&Authentication>) -> AuthResult<()> {
        let listeners: Vec<Arc<dyn AuthenticationListener>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener.on_authentication(authentication)?;
        }
        Ok(())
    }

    // The guarded value is replaced whole, so a poisoned lock still holds a
    // consistent state.
    fn current(&self) -> MutexGuard<'_, Option<Arc<Authentication>>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use warden_core::AuthErrorKind;

    use super::*;
    use crate::{AccountCredentialsToken, Authenticator, BearerToken, listener};

    struct FixedAuthenticator;

    impl Authenticator for FixedAuthenticator {
        type Token = AccountCredentialsToken;

        fn authenticate(&self, token: &AccountCredentialsToken) -> AuthResult<Authentication> {
            match token.principal() {
                Some("usr") => Ok(Authentication::builder("usr").permissions(["p1", "p2"]).build()),
                Some("admin") => Ok(Authentication::builder("admin").root(true).build()),
                _ => Err(AuthError::unknown_account("unknown")),
            }
        }
    }

    fn context() -> AuthContext {
        let realm = Realm::builder()
            .authenticator(FixedAuthenticator)
            .with_default_authorizer()
            .build();
        AuthContext::new(Arc::new(realm))
    }

    fn token(id: &str) -> AccountCredentialsToken {
        AccountCredentialsToken::new(id, "pwd")
    }

    #[test]
    fn authenticate_replaces_current() {
        let ctx = context();
        assert!(!ctx.is_authenticated());

        ctx.authenticate_token(&token("usr")).unwrap();
        assert_eq!(ctx.require_authentication().unwrap().principal_name(), "usr");

        ctx.authenticate_token(&token("admin")).unwrap();
        assert_eq!(ctx.get_authentication().unwrap().principal_name(), "admin");
    }

    #[test]
    fn failed_authentication_keeps_previous() {
        let ctx = context();
        ctx.authenticate_token(&token("usr")).unwrap();

        let err = ctx.authenticate_token(&token("nobody")).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::UnknownAccount);
        let err = ctx.authenticate_token(&BearerToken::new("x")).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::UnsupportedToken);

        assert_eq!(ctx.get_authentication().unwrap().principal_name(), "usr");
    }

    #[test]
    fn unauthenticate_twice() {
        let ctx = context();
        ctx.authenticate_token(&token("usr")).unwrap();

        let previous = ctx.unauthenticate().unwrap();
        assert_eq!(previous.unwrap().principal_name(), "usr");
        assert!(ctx.unauthenticate().unwrap().is_none());
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn require_authentication_fails_when_absent() {
        let err = context().require_authentication().unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::NoAuthentication);
    }

    #[test]
    fn permission_checks_fail_closed_when_unauthenticated() {
        let ctx = context();
        assert!(!ctx.is_permitted(&[Permission::new("p1")]));
        assert!(!ctx.is_permitted_any_str(&["p1"]));
        assert!(!ctx.has_permissions(&[Permission::new("p1")]));

        ctx.authenticate_token(&token("usr")).unwrap();
        assert!(ctx.is_permitted(&[Permission::new("p1"), Permission::new("p2")]));
        assert!(ctx.is_permitted_str(&["p1"]));
        assert!(!ctx.is_permitted_str(&["p1", "p3"]));
        assert!(ctx.is_permitted_any_str(&["p3", "p2"]));
        assert!(ctx.has_permissions(&[Permission::new("p2")]));

        ctx.unauthenticate().unwrap();
        assert!(!ctx.is_permitted_str(&["p1"]));
    }

    #[test]
    fn root_is_permitted_everything() {
        let ctx = context();
        ctx.authenticate_token(&token("admin")).unwrap();
        assert!(ctx.is_permitted_str(&["anything"]));
        assert!(ctx.is_permitted::<Permission>(&[]));
    }

    #[test]
    fn listeners_follow_registration_and_removal() {
        let ctx = context();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let first = ctx.add_listener(listener::from_fn(move |auth: Option<&Authentication>| {
            sink.lock()
                .unwrap()
                .push(format!("first:{}", auth.map_or("-", |a| a.principal_name())));
        }));
        let sink = Arc::clone(&seen);
        ctx.add_listener(listener::from_fn(move |auth: Option<&Authentication>| {
            sink.lock()
                .unwrap()
                .push(format!("second:{}", auth.map_or("-", |a| a.principal_name())));
        }));

        ctx.authenticate_token(&token("usr")).unwrap();
        ctx.unauthenticate().unwrap();
        assert!(ctx.remove_listener(first));
        assert!(!ctx.remove_listener(first));
        ctx.unauthenticate().unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:usr", "second:usr", "first:-", "second:-", "second:-"]
        );
    }

    #[test]
    fn listener_uses_notified_authentication_and_realm() {
        let ctx = context();
        let realm = Arc::clone(ctx.realm());
        let verdicts = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&verdicts);

        ctx.add_listener(listener::from_fn(move |auth: Option<&Authentication>| {
            sink.lock()
                .unwrap()
                .push(realm.is_permitted_str(auth, &["p1"]));
        }));

        ctx.authenticate_token(&token("usr")).unwrap();
        ctx.unauthenticate().unwrap();

        assert_eq!(*verdicts.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn listener_error_is_returned_but_authentication_is_kept() {
        let ctx = context();
        ctx.add_listener(|_: Option<&Authentication>| -> AuthResult<()> {
            Err(AuthError::unexpected("audit sink down"))
        });

        let err = ctx.authenticate_token(&token("usr")).unwrap_err();
        assert_eq!(err.kind(), AuthErrorKind::UnexpectedAuthentication);
        assert_eq!(ctx.get_authentication().unwrap().principal_name(), "usr");

        assert!(ctx.unauthenticate().is_err());
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn shared_between_threads() {
        let ctx = Arc::new(context());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let ctx = Arc::clone(&ctx);
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        ctx.authenticate_token(&token("usr")).map(|_| ())
                    } else {
                        ctx.unauthenticate().map(|_| ())
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        if let Some(current) = ctx.get_authentication() {
            assert_eq!(current.principal_name(), "usr");
        }
    }
}
