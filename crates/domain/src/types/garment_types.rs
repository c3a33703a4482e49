//! Garment category and source enumerations

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Semantic category of a garment piece, as understood by the generation service.
///
/// Wire names are snake_case (`upper_body`, `lower_body`, `dresses`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GarmentCategory {
    /// Tops, shirts, jackets - the service default
    #[default]
    UpperBody,
    /// Trousers, skirts, shorts
    LowerBody,
    /// Full-body pieces
    Dresses,
}

impl GarmentCategory {
    /// Parse a category, falling back to `UpperBody` for anything unrecognised.
    pub fn from_str_lossy(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    /// Wire name sent to the generation service
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpperBody => "upper_body",
            Self::LowerBody => "lower_body",
            Self::Dresses => "dresses",
        }
    }
}

impl std::fmt::Display for GarmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GarmentCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "upper_body" | "upperbody" | "top" | "tops" => Ok(Self::UpperBody),
            "lower_body" | "lowerbody" | "bottom" | "bottoms" => Ok(Self::LowerBody),
            "dresses" | "dress" => Ok(Self::Dresses),
            _ => Err(DomainError::parse(format!("Unknown garment category: {}", s))),
        }
    }
}

/// Where the garment image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GarmentSource {
    /// Item already stored in the user's closet
    #[default]
    Closet,
    /// Photo uploaded just for this try-on
    Upload,
    /// Image referenced by a shop or web link
    Link,
}

impl std::fmt::Display for GarmentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closet => write!(f, "closet"),
            Self::Upload => write!(f, "upload"),
            Self::Link => write!(f, "link"),
        }
    }
}
