//! Retry escalation policy - which quality tier a garment gets next.
//!
//! Tiers only move up within one selection lifetime. Every submission,
//! successful or not, starts a cooldown from the moment its outcome arrives
//! that gates the next submission for that garment.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tryon_domain::{GarmentKey, ModelTier};

use crate::infrastructure::ports::ClockPort;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("No higher quality tier available")]
    NoHigherTier,
    #[error("Please wait {remaining_secs}s before trying again")]
    CoolingDown { remaining_secs: u64 },
}

/// A granted submission slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub tier: ModelTier,
    /// Zero-based count of attempts for the garment
    pub index: u32,
}

#[derive(Debug, Clone)]
struct RetryState {
    last_tier: Option<ModelTier>,
    attempts: u32,
    cooldown_until: DateTime<Utc>,
}

/// Per-garment tier and cooldown tracking
pub struct RetryEscalationPolicy {
    clock: Arc<dyn ClockPort>,
    cooldown: chrono::Duration,
    entries: HashMap<GarmentKey, RetryState>,
}

impl RetryEscalationPolicy {
    pub fn new(clock: Arc<dyn ClockPort>, cooldown: Duration) -> Self {
        Self {
            clock,
            cooldown: chrono::Duration::from_std(cooldown).unwrap_or(chrono::Duration::zero()),
            entries: HashMap::new(),
        }
    }

    /// Grant the next attempt for `key`, recording its tier and starting the
    /// cooldown.
    ///
    /// First attempt gets the baseline tier, every later one the next tier up.
    /// Once the highest tier has been used the request is refused rather than
    /// repeated.
    pub fn next_attempt(&mut self, key: &GarmentKey) -> Result<Attempt, PolicyError> {
        let now = self.clock.now();
        let state = self.entries.get(key);

        let tier = match state.and_then(|s| s.last_tier) {
            None => ModelTier::BASELINE,
            Some(last) => last.next().ok_or(PolicyError::NoHigherTier)?,
        };

        if let Some(state) = state {
            if now < state.cooldown_until {
                return Err(PolicyError::CoolingDown {
                    remaining_secs: ceil_secs(state.cooldown_until - now),
                });
            }
        }

        let index = state.map(|s| s.attempts).unwrap_or(0);
        self.entries.insert(
            key.clone(),
            RetryState {
                last_tier: Some(tier),
                attempts: index + 1,
                cooldown_until: now + self.cooldown,
            },
        );

        tracing::debug!(garment = %key, tier = %tier, attempt = index, "Attempt granted");
        Ok(Attempt { tier, index })
    }

    /// Restart the cooldown for `key` once its submission has settled.
    ///
    /// The grant already blocks while the request is in flight; this moves the
    /// deadline so a slow request does not eat the cooldown.
    pub fn record_settled(&mut self, key: &GarmentKey) {
        let now = self.clock.now();
        if let Some(state) = self.entries.get_mut(key) {
            state.cooldown_until = now + self.cooldown;
        }
    }

    /// Seconds until `key` may submit again, rounded up. Zero when free.
    pub fn cooldown_remaining(&self, key: &GarmentKey) -> u64 {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|s| now < s.cooldown_until)
            .map(|s| ceil_secs(s.cooldown_until - now))
            .unwrap_or(0)
    }

    pub fn last_tier(&self, key: &GarmentKey) -> Option<ModelTier> {
        self.entries.get(key).and_then(|s| s.last_tier)
    }

    pub fn has_attempted(&self, key: &GarmentKey) -> bool {
        self.last_tier(key).is_some()
    }

    /// False once the highest tier has been used
    pub fn can_escalate(&self, key: &GarmentKey) -> bool {
        !self.last_tier(key).is_some_and(|t| t.is_highest())
    }

    /// Back to the baseline tier with no cooldown
    pub fn reset(&mut self, key: &GarmentKey) {
        let now = self.clock.now();
        self.entries.insert(
            key.clone(),
            RetryState {
                last_tier: None,
                attempts: 0,
                cooldown_until: now,
            },
        );
    }
}

fn ceil_secs(remaining: chrono::Duration) -> u64 {
    let millis = remaining.num_milliseconds().max(0) as u64;
    millis.div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::ManualClock;
    use chrono::TimeZone;
    use tryon_domain::{GarmentCategory, GarmentSelection, GarmentSource};

    fn key(image: &str) -> GarmentKey {
        GarmentSelection::new(image, GarmentSource::Closet, GarmentCategory::UpperBody).key()
    }

    fn policy(cooldown_secs: u64) -> (RetryEscalationPolicy, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 8, 1, 10, 0, 0).unwrap(),
        ));
        let policy = RetryEscalationPolicy::new(clock.clone(), Duration::from_secs(cooldown_secs));
        (policy, clock)
    }

    #[test]
    fn tiers_escalate_then_refuse() {
        let (mut policy, _clock) = policy(0);
        let shirt = key("shirt.png");

        let tiers: Vec<u8> = (0..3)
            .map(|_| policy.next_attempt(&shirt).unwrap().tier.value())
            .collect();
        assert_eq!(tiers, vec![0, 1, 2]);
        assert!(!policy.can_escalate(&shirt));

        assert_eq!(policy.next_attempt(&shirt), Err(PolicyError::NoHigherTier));
        assert_eq!(policy.last_tier(&shirt), Some(ModelTier::HIGHEST));
    }

    #[test]
    fn attempt_index_counts_up() {
        let (mut policy, _clock) = policy(0);
        let shirt = key("shirt.png");
        assert_eq!(policy.next_attempt(&shirt).unwrap().index, 0);
        assert_eq!(policy.next_attempt(&shirt).unwrap().index, 1);
    }

    #[test]
    fn cooldown_blocks_until_elapsed() {
        let (mut policy, clock) = policy(10);
        let shirt = key("shirt.png");

        policy.next_attempt(&shirt).unwrap();
        assert_eq!(policy.cooldown_remaining(&shirt), 10);

        clock.advance(chrono::Duration::milliseconds(3500));
        assert_eq!(
            policy.next_attempt(&shirt),
            Err(PolicyError::CoolingDown { remaining_secs: 7 })
        );
        // A refused request does not consume a tier
        assert_eq!(policy.last_tier(&shirt), Some(ModelTier::BASELINE));

        clock.advance(chrono::Duration::seconds(7));
        assert_eq!(policy.cooldown_remaining(&shirt), 0);
        assert_eq!(policy.next_attempt(&shirt).unwrap().tier.value(), 1);
    }

    #[test]
    fn settling_restarts_cooldown() {
        let (mut policy, clock) = policy(10);
        let shirt = key("shirt.png");

        policy.next_attempt(&shirt).unwrap();
        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(policy.cooldown_remaining(&shirt), 0);

        policy.record_settled(&shirt);
        assert_eq!(policy.cooldown_remaining(&shirt), 10);
        assert_eq!(
            policy.next_attempt(&shirt),
            Err(PolicyError::CoolingDown { remaining_secs: 10 })
        );
    }

    #[test]
    fn settling_unknown_key_is_ignored() {
        let (mut policy, _clock) = policy(10);
        let shirt = key("shirt.png");
        policy.record_settled(&shirt);
        assert!(!policy.has_attempted(&shirt));
        assert_eq!(policy.cooldown_remaining(&shirt), 0);
    }

    #[test]
    fn cooldown_is_per_garment() {
        let (mut policy, _clock) = policy(10);
        policy.next_attempt(&key("shirt.png")).unwrap();
        assert!(policy.next_attempt(&key("jeans.png")).is_ok());
    }

    #[test]
    fn exhausted_tier_reported_before_cooldown() {
        let (mut policy, clock) = policy(10);
        let shirt = key("shirt.png");
        for _ in 0..3 {
            policy.next_attempt(&shirt).unwrap();
            clock.advance(chrono::Duration::seconds(10));
        }
        policy.next_attempt(&shirt).unwrap_err();
        clock.advance(chrono::Duration::seconds(-5));
        assert_eq!(policy.next_attempt(&shirt), Err(PolicyError::NoHigherTier));
    }

    #[test]
    fn reset_returns_to_baseline() {
        let (mut policy, _clock) = policy(10);
        let shirt = key("shirt.png");
        policy.next_attempt(&shirt).unwrap();

        policy.reset(&shirt);
        assert!(!policy.has_attempted(&shirt));
        assert_eq!(policy.cooldown_remaining(&shirt), 0);
        assert_eq!(policy.next_attempt(&shirt).unwrap().tier, ModelTier::BASELINE);
    }
}
