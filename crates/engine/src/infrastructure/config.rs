//! Engine configuration loaded from the environment.

use tryon_domain::{DomainError, TryOnConfig};

const DEFAULT_GENERATION_URL: &str = "http://localhost:8787";

/// Service endpoints plus the validated try-on settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub generation_url: String,
    pub compose_url: String,
    pub tryon: TryOnConfig,
}

impl EngineConfig {
    /// Read `GENERATION_URL`, `COMPOSE_URL` and the `TRYON_*` settings.
    ///
    /// `COMPOSE_URL` falls back to the generation service when unset.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let generation_url = lookup("GENERATION_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GENERATION_URL.into());
        let compose_url = lookup("COMPOSE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| generation_url.clone())
            .trim()
            .to_string();

        let defaults = TryOnConfig::default();
        let cooldown = parse_u32(&lookup, "TRYON_COOLDOWN_SECS", defaults.cooldown_seconds())?;
        let request_timeout = parse_u32(
            &lookup,
            "TRYON_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout().as_secs() as u32,
        )?;
        let compose_timeout = parse_u32(
            &lookup,
            "TRYON_COMPOSE_TIMEOUT_SECS",
            defaults.compose_timeout().as_secs() as u32,
        )?;
        let demo_mode = lookup("TRYON_DEMO_MODE")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            generation_url: generation_url.trim().to_string(),
            compose_url,
            tryon: TryOnConfig::new(cooldown, request_timeout, compose_timeout, demo_mode)?,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generation_url: DEFAULT_GENERATION_URL.into(),
            compose_url: DEFAULT_GENERATION_URL.into(),
            tryon: TryOnConfig::default(),
        }
    }
}

fn parse_u32<F>(lookup: &F, key: &str, default: u32) -> Result<u32, DomainError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| DomainError::parse(format!("{} must be a whole number, got '{}'", key, raw))),
        _ => Ok(default),
    }
}
