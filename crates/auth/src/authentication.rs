//! Result of a successful authentication.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Permission;
use crate::authorizer;

/// Authenticated principal: name, scheme, granted permissions, root flag and
/// arbitrary parameters.
///
/// Immutable; a new authentication replaces the old one rather than
/// mutating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authentication {
    principal_name: String,
    scheme: Option<String>,
    permissions: HashSet<Permission>,
    root: bool,
    parameters: Map<String, Value>,
}

impl Authentication {
    pub fn builder(principal_name: impl Into<String>) -> AuthenticationBuilder {
        AuthenticationBuilder {
            inner: Authentication {
                principal_name: principal_name.into(),
                scheme: None,
                permissions: HashSet::new(),
                root: false,
                parameters: Map::new(),
            },
        }
    }

    /// Builder pre-populated with this authentication's values.
    pub fn to_builder(&self) -> AuthenticationBuilder {
        AuthenticationBuilder {
            inner: self.clone(),
        }
    }

    pub fn principal_name(&self) -> &str {
        &self.principal_name
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn permissions(&self) -> &HashSet<Permission> {
        &self.permissions
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Parameters in insertion order.
    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Typed parameter lookup; `None` when absent or of another shape.
    pub fn parameter_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.parameters
            .get(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// All of `required` are granted (root always is).
    pub fn is_permitted(&self, required: &[Permission]) -> bool {
        authorizer::permitted_all(Some(self), required)
    }

    /// At least one of `required` is granted (root always is).
    pub fn is_permitted_any(&self, required: &[Permission]) -> bool {
        authorizer::permitted_any(Some(self), required)
    }

    pub fn is_permitted_str(&self, required: &[&str]) -> bool {
        authorizer::permitted_all_str(Some(self), required)
    }

    pub fn is_permitted_any_str(&self, required: &[&str]) -> bool {
        authorizer::permitted_any_str(Some(self), required)
    }
}

#[derive(Debug, Clone)]
pub struct AuthenticationBuilder {
    inner: Authentication,
}

impl AuthenticationBuilder {
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.inner.scheme = Some(scheme.into());
        self
    }

    pub fn root(mut self, root: bool) -> Self {
        self.inner.root = root;
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

    /// Set a parameter; an existing key keeps its position and takes the new value.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameters(mut self, parameters: Map<String, Value>) -> Self {
        for (name, value) in parameters {
            self.inner.parameters.insert(name, value);
        }
        self
    }

    pub fn build(self) -> Authentication {
        self.inner
    }
}
