//! Accounts as supplied by the host's account store.
//!
//! The engine never persists accounts; it asks an [`AccountProvider`] for
//! them at authentication time.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use serde_json::{Map, Value};

use warden_credentials::{Credentials, CredentialsContainer};

use crate::Permission;

#[derive(Debug, Clone)]
pub struct Account {
    id: String,
    credentials: Option<Credentials>,
    root: bool,
    details: Map<String, Value>,
    permissions: HashSet<Permission>,
    enabled: bool,
    locked: bool,
    expired: bool,
}

impl Account {
    pub fn builder(id: impl Into<String>) -> AccountBuilder {
        AccountBuilder {
            inner: Account {
                id: id.into(),
                credentials: None,
                root: false,
                details: Map::new(),
                permissions: HashSet::new(),
                enabled: true,
                locked: false,
                expired: false,
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }

    pub fn permissions(&self) -> &HashSet<Permission> {
        &self.permissions
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }
}

impl CredentialsContainer for Account {
    fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct AccountBuilder {
    inner: Account,
}

impl AccountBuilder {
    pub fn credentials(mut self, credentials: impl Into<Credentials>) -> Self {
        self.inner.credentials = Some(credentials.into());
        self
    }

    pub fn root(mut self, root: bool) -> Self {
        self.inner.root = root;
        self
    }

    pub fn detail(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner.details.insert(name.into(), value.into());
        self
    }

    pub fn permission(mut self, permission: impl Into<Permission>) -> Self {
        self.inner.permissions.insert(permission.into());
        self
    }

    pub fn permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.inner
            .permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.inner.enabled = enabled;
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.inner.locked = locked;
        self
    }

    pub fn expired(mut self, expired: bool) -> Self {
        self.inner.expired = expired;
        self
    }

    pub fn build(self) -> Account {
        self.inner
    }
}

/// Account lookup collaborator.
///
/// Any error returned is treated as a collaborator failure by the
/// authenticator (wrapped, unless it already is an `AuthError`).
pub trait AccountProvider: Send + Sync {
    fn load_account_by_id(&self, id: &str) -> anyhow::Result<Option<Account>>;
}

impl<F> AccountProvider for F
where
    F: Fn(&str) -> anyhow::Result<Option<Account>> + Send + Sync,
{
    fn load_account_by_id(&self, id: &str) -> anyhow::Result<Option<Account>> {
        self(id)
    }
}

/// In-memory account store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAccountProvider {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, account: Account) -> Self {
        self.insert(account);
        self
    }

    /// Insert or replace an account by id.
    pub fn insert(&self, account: Account) {
        // A poisoned map still holds consistent data: inserts are single operations.
        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        accounts.insert(account.id().to_string(), account);
    }
}

impl AccountProvider for InMemoryAccountProvider {
    fn load_account_by_id(&self, id: &str) -> anyhow::Result<Option<Account>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| anyhow::anyhow!("account store lock poisoned"))?;
        Ok(accounts.get(id).cloned())
    }
}
