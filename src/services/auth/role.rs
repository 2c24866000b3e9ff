//! Role bitmask carried by users and tokens.
//!
//! Each bit grants one capability. A principal may hold several bits at once;
//! an authorization check passes when the principal holds *any* of the bits
//! the route asks for.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Role(i32);

impl Role {
    /// No capability bits. As a route requirement it means "any authenticated user".
    pub const NONE: Role = Role(0);
    /// May manage applications and users. Granted to the bootstrap user.
    pub const ADMIN: Role = Role(1 << 0);
    /// Bound to a group; may edit resources and versions inside it.
    pub const MANAGER: Role = Role(1 << 1);

    pub const fn bits(self) -> i32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// True when `self` and `required` share at least one bit.
    pub const fn intersects(self, required: Role) -> bool {
        self.0 & required.0 != 0
    }

    /// Whether a principal holding `self` satisfies a route requiring `required`.
    pub const fn satisfies(self, required: Role) -> bool {
        required.is_none() || self.intersects(required)
    }
}

impl BitOr for Role {
    type Output = Role;

    fn bitor(self, rhs: Role) -> Role {
        Role(self.0 | rhs.0)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#b}", self.0)
    }
}
