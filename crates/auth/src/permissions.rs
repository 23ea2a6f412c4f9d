use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission granted to (or required from) an authenticated principal.
///
/// Most permissions are plain strings (e.g. "inventory.read") and compare by
/// that string. Some cannot be flattened to a string: [`Permission::opaque`]
/// creates one with a unique identity and no representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission(Repr);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Repr {
    Named(Cow<'static, str>),
    Opaque(Uuid),
}

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(Repr::Named(name.into()))
    }

    /// A permission without string representation, equal only to its clones.
    pub fn opaque() -> Self {
        Self(Repr::Opaque(Uuid::now_v7()))
    }

    pub fn representation(&self) -> Option<&str> {
        match &self.0 {
            Repr::Named(name) => Some(name),
            Repr::Opaque(_) => None,
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.0 {
            Repr::Named(name) => f.write_str(name),
            Repr::Opaque(id) => write!(f, "<opaque:{id}>"),
        }
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
