use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Product divisions the service desk books work against.
///
/// The dashboard payload carries divisions as plain strings and the pipeline never
/// rejects an unknown one; this enum is only used to classify what the backend sends.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Hash,
    Eq,
    PartialEq,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Division {
    Fans,
    Pump,
    Light,
    Sda,
    Iwh,
    Swh,
    Cooler,
    Others,
    /// Backend roll-up of the small appliance divisions.
    Appl,
}

impl Division {
    /// Looks a raw division label up, ignoring case and surrounding whitespace.
    pub fn lookup(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}
