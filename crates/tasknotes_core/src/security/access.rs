//! Role checks and per-record voters.
//!
//! # Invariants
//! - `ROLE_ADMIN` is granted every permission on every subject.
//! - Regular users may act on their own account and on entries they
//!   authored. Entries without an author are admin-only.
//! - Categories and tags are readable by everyone signed in and writable by
//!   admins only.

use crate::model::user::{Role, User, UserId};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Action being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    View,
    Edit,
    Delete,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Edit => "EDIT",
            Self::Delete => "DELETE",
        }
    }
}

/// Record an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    User(UserId),
    Entry { author_id: Option<UserId> },
    Taxonomy,
}

/// Authenticated principal for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: UserId,
    pub email: String,
    roles: BTreeSet<Role>,
}

impl Viewer {
    /// Builds a viewer from a persisted user; unsaved users cannot act.
    pub fn from_user(user: &User) -> Option<Self> {
        Some(Self {
            id: user.id?,
            email: user.email.clone(),
            roles: user.roles().into_iter().collect(),
        })
    }

    /// Role check, the equivalent of `isGranted('ROLE_...')`.
    pub fn is_granted(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.is_granted(Role::Admin)
    }

    /// Runs the voter for `subject`.
    pub fn can(&self, permission: Permission, subject: Subject) -> bool {
        if self.is_admin() {
            return true;
        }
        match subject {
            Subject::User(user_id) => user_id == self.id,
            Subject::Entry { author_id } => author_id == Some(self.id),
            Subject::Taxonomy => permission == Permission::View,
        }
    }
}

/// The viewer lacks the permission for the subject. Maps to HTTP 403.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    pub permission: Permission,
    pub subject: Subject,
}

impl Display for AccessDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "access denied: {} on {:?}",
            self.permission.as_str(),
            self.subject
        )
    }
}

impl Error for AccessDenied {}

/// Returns `AccessDenied` unless `viewer` may perform `permission`.
pub fn deny_access_unless_granted(
    viewer: &Viewer,
    permission: Permission,
    subject: Subject,
) -> Result<(), AccessDenied> {
    if viewer.can(permission, subject) {
        Ok(())
    } else {
        Err(AccessDenied {
            permission,
            subject,
        })
    }
}
