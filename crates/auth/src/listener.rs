//! Observers notified when an authentication is set or cleared.

use warden_core::AuthResult;

use crate::Authentication;

/// Observer of authentication changes.
///
/// Called synchronously, in registration order. `None` signals that the
/// session was unauthenticated. An error stops the notification loop and
/// is returned to whoever triggered it; later listeners are not called.
pub trait AuthenticationListener: Send + Sync {
    fn on_authentication(&self, authentication: Option<&Authentication>) -> AuthResult<()>;
}

impl<F> AuthenticationListener for F
where
    F: Fn(Option<&Authentication>) -> AuthResult<()> + Send + Sync,
{
    fn on_authentication(&self, authentication: Option<&Authentication>) -> AuthResult<()> {
        self(authentication)
    }
}

/// Listener from a closure that cannot fail.
pub fn from_fn<F>(f: F) -> impl AuthenticationListener
where
    F: Fn(Option<&Authentication>) + Send + Sync,
{
    move |authentication: Option<&Authentication>| -> AuthResult<()> {
        f(authentication);
        Ok(())
    }
}
