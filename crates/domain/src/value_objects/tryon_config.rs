//! Try-on configuration - value object for cooldown and timeout settings
//!
//! Carries serde derives because it is loaded from the environment at startup
//! and echoed back in diagnostics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Capacity of a result set for one garment selection
pub const MAX_OPTIONS: usize = 3;

/// Settings shared by the interactive and batch try-on flows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TryOnConfig {
    /// Seconds between attempts for the same garment (0-600)
    cooldown_seconds: u32,
    /// Upper bound for one generation request in seconds
    request_timeout_seconds: u32,
    /// Upper bound for one compose call in seconds
    compose_timeout_seconds: u32,
    /// Ask the generation service for its canned demo output
    demo_mode: bool,
}

impl Default for TryOnConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 10,
            request_timeout_seconds: 120,
            compose_timeout_seconds: 180,
            demo_mode: false,
        }
    }
}

impl TryOnConfig {
    /// Create a new TryOnConfig with validation
    pub fn new(
        cooldown_seconds: u32,
        request_timeout_seconds: u32,
        compose_timeout_seconds: u32,
        demo_mode: bool,
    ) -> Result<Self, DomainError> {
        let config = Self {
            cooldown_seconds,
            request_timeout_seconds,
            compose_timeout_seconds,
            demo_mode,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.cooldown_seconds > 600 {
            return Err(DomainError::validation(
                "cooldown_seconds must be between 0 and 600",
            ));
        }
        if self.request_timeout_seconds == 0 {
            return Err(DomainError::validation(
                "request_timeout_seconds must be greater than 0",
            ));
        }
        if self.compose_timeout_seconds == 0 {
            return Err(DomainError::validation(
                "compose_timeout_seconds must be greater than 0",
            ));
        }
        Ok(())
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn cooldown_seconds(&self) -> u32 {
        self.cooldown_seconds
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(u64::from(self.cooldown_seconds))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.request_timeout_seconds))
    }

    pub fn compose_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.compose_timeout_seconds))
    }

    pub fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    // ============================================================================
    // Builder-style setters (consume self)
    // ============================================================================

    pub fn with_demo_mode(self, demo_mode: bool) -> Self {
        Self { demo_mode, ..self }
    }
}
