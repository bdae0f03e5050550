use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Dashboard cards, in the order the menu dashboard lays them out.
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
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WidgetKey {
    Customer,
    Warranty,
    OutOfWarranty,
    Market,
    Challan,
    Retail,
}
