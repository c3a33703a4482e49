//! Value objects - immutable, validated settings

mod tryon_config;

pub use tryon_config::{TryOnConfig, MAX_OPTIONS};
