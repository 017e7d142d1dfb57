//! # src/retry.rs
//!
//! Exponentielles Backoff mit optionalem Jitter. Wird beim Warten auf
//! Transaktionseffekte verwendet, die der Ledger noch nicht ausliefert
//! (Read-after-write-Verzögerung).

use rand::Rng;
use std::time::Duration;

/// Backoff-Konfiguration für Wiederholungen auf Aufruferebene.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Gesamtzahl der Versuche, inklusive des ersten.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor per attempt.
    pub multiplier: f64,
    /// Jede Wartezeit zufällig verkürzen.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Ohne jede Wartezeit; für Tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
            jitter: false,
        }
    }

    /// Un-jittered delay after the given attempt (1-based).
    pub fn base_delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let millis = (self.initial_delay.as_millis() as f64 * factor)
            .min(self.max_delay.as_millis() as f64);
        Duration::from_millis(millis as u64)
    }

    /// Wartezeit nach Versuch `attempt` mit "equal jitter": halb fest, halb zufällig.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_for_attempt(attempt);
        if !self.jitter || base.is_zero() {
            return base;
        }
        let half = base.as_millis() as u64 / 2;
        let random = rand::thread_rng().gen_range(0..=half);
        Duration::from_millis(half + random)
    }

    pub fn has_attempts_left(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1_000),
            multiplier: 2.0,
            jitter: false,
        };
        assert_eq!(policy.base_delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.base_delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.base_delay_for_attempt(4), Duration::from_millis(800));
        assert_eq!(policy.base_delay_for_attempt(5), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for_attempt(9), Duration::from_millis(1_000));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            jitter: true,
            ..RetryPolicy::default()
        };
        for attempt in 1..6 {
            let base = policy.base_delay_for_attempt(attempt);
            let delay = policy.delay_for_attempt(attempt);
            assert!(delay <= base);
            assert!(delay >= base / 2);
        }
    }
}
