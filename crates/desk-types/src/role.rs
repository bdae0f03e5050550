use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Account role reported by `auth/me`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    Hash,
    Eq,
    PartialEq,
    Display,
    AsRefStr,
    EnumString,
)]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// Admins can reach every gated area; users only the ones gated on `User`.
    pub const fn satisfies(self, required: Self) -> bool {
        match (self, required) {
            (Self::Admin, _) | (Self::User, Self::User) => true,
            (Self::User, Self::Admin) => false,
        }
    }
}
