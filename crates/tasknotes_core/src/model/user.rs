//! User account model.
//!
//! # Invariants
//! - `password` only ever holds a hash produced by a `PasswordHasher`.
//! - `ROLE_USER` is implied for every account and always reported by
//!   [`User::roles`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub type UserId = i64;

/// Security role granted to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "ROLE_USER",
            Self::Admin => "ROLE_ADMIN",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "ROLE_USER" => Some(Self::User),
            "ROLE_ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Human-readable label used by role choice fields.
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Admin => "Admin",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Option<UserId>,
    pub email: String,
    pub name: String,
    /// Password hash in PHC string format. Never serialized.
    #[serde(skip_serializing)]
    pub password: String,
    roles: BTreeSet<Role>,
}

impl User {
    /// Creates an unsaved account with no password and `ROLE_USER`.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            name: name.into(),
            password: String::new(),
            roles: BTreeSet::from([Role::User]),
        }
    }

    /// Rebuilds a persisted account; used by repository row mapping.
    pub fn from_parts(
        id: UserId,
        email: String,
        name: String,
        password: String,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        let mut user = Self {
            id: Some(id),
            email,
            name,
            password,
            roles: BTreeSet::new(),
        };
        user.set_roles(roles);
        user
    }

    /// Granted roles, always including `ROLE_USER`.
    pub fn roles(&self) -> Vec<Role> {
        self.roles.iter().copied().collect()
    }

    pub fn set_roles(&mut self, roles: impl IntoIterator<Item = Role>) {
        self.roles = roles.into_iter().collect();
        self.roles.insert(Role::User);
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Comma-separated role list used by the `users.roles` column.
    pub fn roles_to_db(&self) -> String {
        self.roles
            .iter()
            .map(|role| role.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Parses the `users.roles` column, ignoring unknown role names.
pub fn roles_from_db(value: &str) -> Vec<Role> {
    value.split(',').filter_map(Role::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::{roles_from_db, Role, User};

    #[test]
    fn role_user_is_always_implied() {
        let mut user = User::new("a@example.com", "A");
        user.set_roles([Role::Admin]);
        assert_eq!(user.roles(), vec![Role::User, Role::Admin]);

        user.set_roles([]);
        assert_eq!(user.roles(), vec![Role::User]);
        assert!(!user.is_admin());
    }

    #[test]
    fn roles_column_roundtrips_and_skips_unknown_values() {
        let mut user = User::new("a@example.com", "A");
        user.set_roles([Role::Admin]);
        assert_eq!(user.roles_to_db(), "ROLE_USER,ROLE_ADMIN");
        assert_eq!(
            roles_from_db("ROLE_ADMIN,ROLE_SUPERHERO"),
            vec![Role::Admin]
        );
    }
}
