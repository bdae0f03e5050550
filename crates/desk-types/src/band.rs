use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Qualitative turnaround band used to colour delivery timelines.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq, PartialOrd, Ord, Display, AsRefStr,
)]
pub enum DeliveryBand {
    Fast,
    Normal,
    Slow,
    Delayed,
}

impl DeliveryBand {
    /// Buckets a turnaround in whole days. Bounds are inclusive: 7, 14 and 21 days
    /// still belong to the faster band.
    pub const fn from_days(days: i64) -> Self {
        if days <= 7 {
            Self::Fast
        } else if days <= 14 {
            Self::Normal
        } else if days <= 21 {
            Self::Slow
        } else {
            Self::Delayed
        }
    }

    /// Single character marker used by the terminal renderer.
    pub const fn marker(self) -> char {
        match self {
            Self::Fast => '+',
            Self::Normal => '~',
            Self::Slow => '-',
            Self::Delayed => '!',
        }
    }
}
