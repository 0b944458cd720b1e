//! Item identity and brand.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an item, unique within one source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new ItemId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Producer of an item. Categorical, with an explicit `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Brand {
    /// Ippodo Tea.
    #[serde(rename = "Ippodo Tea")]
    Ippodo,
    /// Kanbayashi Shunsho.
    #[serde(rename = "Kanbayashi Shunsho")]
    Kanbayashi,
    /// Marukyu Koyamaen.
    #[serde(rename = "Marukyu Koyamaen")]
    MarukyuKoyamaen,
    /// Maruyasu.
    #[serde(rename = "Maruyasu")]
    Maruyasu,
    /// Nakamura Tokichi.
    #[serde(rename = "Nakamura Tokichi")]
    NakamuraTokichi,
    /// Osada Tea.
    #[serde(rename = "Osada Tea")]
    OsadaTea,
    /// Yamamasa Koyamaen.
    #[serde(rename = "Yamamasa Koyamaen")]
    YamamasaKoyamaen,
    /// Brand could not be determined.
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Brand {
    const KNOWN: [Brand; 7] = [
        Brand::Ippodo,
        Brand::Kanbayashi,
        Brand::MarukyuKoyamaen,
        Brand::Maruyasu,
        Brand::NakamuraTokichi,
        Brand::OsadaTea,
        Brand::YamamasaKoyamaen,
    ];

    /// Human-readable brand name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ippodo => "Ippodo Tea",
            Self::Kanbayashi => "Kanbayashi Shunsho",
            Self::MarukyuKoyamaen => "Marukyu Koyamaen",
            Self::Maruyasu => "Maruyasu",
            Self::NakamuraTokichi => "Nakamura Tokichi",
            Self::OsadaTea => "Osada Tea",
            Self::YamamasaKoyamaen => "Yamamasa Koyamaen",
            Self::Unknown => "Unknown",
        }
    }

    /// Match a free-form vendor string to a brand.
    ///
    /// Matches case-insensitively when either name is a whole-word prefix
    /// of the other, so "Ippodo" finds "Ippodo Tea" but "Ma" finds nothing.
    /// Anything unmatched is `Unknown`.
    pub fn match_name(raw: &str) -> Self {
        let wanted = raw.trim().to_lowercase();
        if wanted.is_empty() {
            return Self::Unknown;
        }
        Self::KNOWN
            .into_iter()
            .find(|brand| {
                let name = brand.display_name().to_lowercase();
                name == wanted || word_prefix(&name, &wanted) || word_prefix(&wanted, &name)
            })
            .unwrap_or(Self::Unknown)
    }

    /// Whether this is the `Unknown` brand.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// Whether `prefix` is `name` cut at a word boundary.
fn word_prefix(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .map_or(false, |rest| rest.starts_with(' '))
}

impl Default for Brand {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// An item as listed by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier, unique within the source.
    pub id: ItemId,
    /// Producer brand.
    pub brand: Brand,
    /// Display name.
    pub name: String,
}

impl Item {
    /// Create a new item.
    pub fn new(id: impl Into<ItemId>, brand: Brand, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            brand,
            name: name.into(),
        }
    }

    /// Name prefixed by the brand, or the bare name for `Brand::Unknown`.
    pub fn label(&self) -> String {
        if self.brand.is_unknown() {
            self.name.clone()
        } else {
            format!("{} {}", self.brand, self.name)
        }
    }
}
