//! Source identifiers for the monitored catalogs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One external catalog being monitored.
///
/// Declaration order is the canonical order: ledger serialization,
/// notification pages and query results all list sources in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Source {
    /// ippodotea.com
    #[serde(rename = "Ippodo")]
    Ippodo,
    /// Marukyu Koyamaen online shop.
    #[serde(rename = "Marukyu Koyamaen")]
    MarukyuKoyamaen,
    /// Nakamura Tokichi online shop.
    #[serde(rename = "Nakamura Tokichi")]
    NakamuraTokichi,
    /// Sazen Tea.
    #[serde(rename = "Sazen")]
    Sazen,
    /// The Steeping Room.
    #[serde(rename = "Steeping Room")]
    SteepingRoom,
}

impl Source {
    /// Every source, in canonical order.
    pub const ALL: [Source; 5] = [
        Source::Ippodo,
        Source::MarukyuKoyamaen,
        Source::NakamuraTokichi,
        Source::Sazen,
        Source::SteepingRoom,
    ];

    /// Human-readable catalog name (also the ledger key).
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ippodo => "Ippodo",
            Self::MarukyuKoyamaen => "Marukyu Koyamaen",
            Self::NakamuraTokichi => "Nakamura Tokichi",
            Self::Sazen => "Sazen",
            Self::SteepingRoom => "Steeping Room",
        }
    }

    /// URL/path friendly form, e.g. `marukyu-koyamaen`.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Ippodo => "ippodo",
            Self::MarukyuKoyamaen => "marukyu-koyamaen",
            Self::NakamuraTokichi => "nakamura-tokichi",
            Self::Sazen => "sazen",
            Self::SteepingRoom => "steeping-room",
        }
    }

    /// Environment-variable prefix, e.g. `MARUKYU_KOYAMAEN`.
    pub fn env_prefix(&self) -> String {
        self.slug().replace('-', "_").to_uppercase()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error for an unrecognised source name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown source: {0}")]
pub struct UnknownSource(pub String);

impl FromStr for Source {
    type Err = UnknownSource;

    /// Accepts the display name or the slug, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Source::ALL
            .into_iter()
            .find(|src| src.slug() == wanted || src.display_name().to_lowercase() == wanted)
            .ok_or_else(|| UnknownSource(s.to_string()))
    }
}
