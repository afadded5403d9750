//! Authentication and authorization primitives.
//!
//! # Responsibility
//! - Hash and verify passwords (`password`).
//! - Decide who may view/edit/delete which record (`access`).
//!
//! # Invariants
//! - Plaintext passwords never leave the hasher; only PHC hash strings are
//!   stored.
//! - Admins are granted every permission.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod access;
pub mod password;

pub use access::{deny_access_unless_granted, AccessDenied, Permission, Subject, Viewer};
pub use password::{Argon2PasswordHasher, PasswordHasher};

/// Failure inside the password hashing backend.
#[derive(Debug)]
pub enum SecurityError {
    InvalidHasherParams(String),
    Hashing(String),
}

impl Display for SecurityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHasherParams(details) => {
                write!(f, "invalid password hasher parameters: {details}")
            }
            Self::Hashing(details) => write!(f, "password hashing failed: {details}"),
        }
    }
}

impl Error for SecurityError {}
