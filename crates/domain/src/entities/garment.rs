//! GarmentSelection entity - what is being tried on

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;
use crate::types::{GarmentCategory, GarmentSource};

/// Identity of a garment selection.
///
/// Built from the closet item id (when there is one) together with the image
/// reference. Two selections with the same key share retry and result state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GarmentKey(String);

impl GarmentKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GarmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A garment piece chosen for a fitting.
///
/// Immutable once built; a different id or image reference is a different
/// identity and resets downstream state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentSelection {
    id: Option<String>,
    image_ref: String,
    #[serde(default)]
    source: GarmentSource,
    #[serde(default, deserialize_with = "category_lossy")]
    category: GarmentCategory,
}

fn category_lossy<'de, D>(deserializer: D) -> Result<GarmentCategory, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| GarmentCategory::from_str_lossy(&s))
        .unwrap_or_default())
}

impl GarmentSelection {
    pub fn new(
        image_ref: impl Into<String>,
        source: GarmentSource,
        category: GarmentCategory,
    ) -> Self {
        Self {
            id: None,
            image_ref: image_ref.into(),
            source,
            category,
        }
    }

    /// Attach the closet item id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn image_ref(&self) -> &str {
        &self.image_ref
    }

    pub fn source(&self) -> GarmentSource {
        self.source
    }

    pub fn category(&self) -> GarmentCategory {
        self.category
    }

    /// Identity key used by the retry policy and result set
    pub fn key(&self) -> GarmentKey {
        match self.id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(id) => GarmentKey(format!("id:{}|img:{}", id, self.image_ref)),
            None => GarmentKey(format!("img:{}", self.image_ref)),
        }
    }

    /// True when `other` refers to the same garment
    pub fn same_identity(&self, other: &GarmentSelection) -> bool {
        self.key() == other.key()
    }

    /// Check the image reference is usable for a generation request
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.image_ref.trim().is_empty() {
            return Err(DomainError::validation(
                "garment image reference is required",
            ));
        }
        Ok(())
    }
}
