//! Account roles.
//!
//! Every permission or redirect decision matches on [`Role`] exhaustively,
//! so adding a role is a compile error at every call site that must care.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The role an account plays in the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Moderates users and cars, reviews audit logs.
    Admin,
    /// Lists cars for rent. Needs admin verification before listing.
    Owner,
    /// Searches and books cars.
    Customer,
}

impl Role {
    /// Returns the storage/wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Owner => "owner",
            Role::Customer => "customer",
        }
    }

    /// Landing page a client should open after a successful login.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Admin => "/html/admin.html",
            Role::Owner => "/html/owner.html",
            Role::Customer => "/html/index.html",
        }
    }

    /// Whether an account with this role may be created through public
    /// registration.
    pub fn can_self_register(&self) -> bool {
        match self {
            Role::Admin => false,
            Role::Owner | Role::Customer => true,
        }
    }

    /// Whether accounts with this role start unverified and need an admin
    /// to approve them.
    pub fn requires_verification(&self) -> bool {
        match self {
            Role::Owner => true,
            Role::Admin | Role::Customer => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            "customer" => Ok(Role::Customer),
            other => Err(CoreError::InvalidRole(other.to_string())),
        }
    }
}
