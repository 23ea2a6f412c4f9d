//! Permission evaluation.
//!
//! - No IO
//! - No panics
//! - Exact matching only (no prefixes, no wildcards)

use crate::{Authentication, Permission};

/// Decides whether an authentication grants permissions of type `Self::Permission`.
///
/// Registered on a [`Realm`](crate::Realm) keyed by the permission type.
pub trait Authorizer: Send + Sync {
    type Permission: 'static;

    /// ALL semantics: every required permission must be granted.
    fn is_permitted(&self, authentication: &Authentication, required: &[Self::Permission]) -> bool;

    /// ANY semantics: one granted permission suffices.
    fn is_permitted_any(
        &self,
        authentication: &Authentication,
        required: &[Self::Permission],
    ) -> bool;
}

/// Set-membership evaluation over [`Authentication::permissions`], with the
/// root bypass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAuthorizer;

impl DefaultAuthorizer {
    pub fn new() -> Self {
        Self
    }

    /// String-keyed ALL check against permission representations.
    pub fn is_permitted_str(&self, authentication: &Authentication, required: &[&str]) -> bool {
        permitted_all_str(Some(authentication), required)
    }

    pub fn is_permitted_any_str(&self, authentication: &Authentication, required: &[&str]) -> bool {
        permitted_any_str(Some(authentication), required)
    }
}

impl Authorizer for DefaultAuthorizer {
    type Permission = Permission;

    fn is_permitted(&self, authentication: &Authentication, required: &[Permission]) -> bool {
        permitted_all(Some(authentication), required)
    }

    fn is_permitted_any(&self, authentication: &Authentication, required: &[Permission]) -> bool {
        permitted_any(Some(authentication), required)
    }
}

// Evaluation order: no authentication => false, root => true,
// nothing required => false, then set membership.

pub(crate) fn permitted_all(authentication: Option<&Authentication>, required: &[Permission]) -> bool {
    evaluate(authentication, required.is_empty(), |granted| {
        required.iter().all(|p| granted.permissions().contains(p))
    })
}

pub(crate) fn permitted_any(authentication: Option<&Authentication>, required: &[Permission]) -> bool {
    evaluate(authentication, required.is_empty(), |granted| {
        required.iter().any(|p| granted.permissions().contains(p))
    })
}

pub(crate) fn permitted_all_str(authentication: Option<&Authentication>, required: &[&str]) -> bool {
    evaluate(authentication, required.is_empty(), |granted| {
        required.iter().all(|r| has_representation(granted, r))
    })
}

pub(crate) fn permitted_any_str(authentication: Option<&Authentication>, required: &[&str]) -> bool {
    evaluate(authentication, required.is_empty(), |granted| {
        required.iter().any(|r| has_representation(granted, r))
    })
}

fn evaluate<F>(authentication: Option<&Authentication>, nothing_required: bool, check: F) -> bool
where
    F: FnOnce(&Authentication) -> bool,
{
    let Some(authentication) = authentication else {
        return false;
    };
    if authentication.is_root() {
        return true;
    }
    if nothing_required {
        return false;
    }
    check(authentication)
}

fn has_representation(authentication: &Authentication, representation: &str) -> bool {
    authentication
        .permissions()
        .iter()
        .any(|p| p.representation() == Some(representation))
}
