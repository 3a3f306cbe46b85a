//! The two sender roles.
//!
//! A role is a one-letter code stored with every message. It is distinct from
//! the login username: under the credential policy the role comes from the
//! account, under the token policy the visitor picks it on `/select`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

use crate::error::RoleParseError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
pub enum Role {
    #[serde(rename = "H")]
    #[strum(serialize = "H")]
    Harrow,

    #[serde(rename = "M")]
    #[strum(serialize = "M")]
    Maparam,
}

impl Role {
    /// Code as written to the `sender` column.
    pub fn code(self) -> &'static str {
        match self {
            Role::Harrow => "H",
            Role::Maparam => "M",
        }
    }

    pub fn all() -> impl Iterator<Item = Role> {
        Role::iter()
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    /// Exact, case-sensitive match on the code. Surrounding whitespace is not
    /// forgiven: the selection form only ever submits the bare code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::iter()
            .find(|r| r.code() == s)
            .ok_or_else(|| RoleParseError(s.to_owned()))
    }
}
