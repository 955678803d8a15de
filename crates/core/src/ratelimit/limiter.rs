//! Per-actor sliding-window rate limiter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::platform::{Actor, UserId};

/// Predicate deciding whether an actor may exceed the limit.
pub type BypassFn = dyn Fn(&Actor) -> bool + Send + Sync;

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { retry_after: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Sliding-window limiter keyed by actor id.
///
/// Each actor may perform at most `limit` recorded invocations within any
/// `window`. History is kept as a list of timestamps per actor; an absent
/// key means an empty history. Stale entries are dropped by a background
/// pruner, but decisions never depend on it having run.
pub struct RateLimiter {
    history: Mutex<HashMap<UserId, Vec<DateTime<Utc>>>>,
    limit: usize,
    window: Duration,
    bypass: Option<Arc<BypassFn>>,
    bypass_records_usage: bool,
    running: AtomicBool,
}

impl RateLimiter {
    /// Create a limiter allowing `limit` invocations per `window`.
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            history: Mutex::new(HashMap::new()),
            limit,
            window,
            bypass: None,
            bypass_records_usage: false,
            running: AtomicBool::new(false),
        }
    }

    /// Let actors matching `predicate` through once their limit is reached.
    ///
    /// When `records_usage` is set, a bypassed invocation is still appended
    /// to the actor's history.
    pub fn with_bypass<F>(mut self, predicate: F, records_usage: bool) -> Self
    where
        F: Fn(&Actor) -> bool + Send + Sync + 'static,
    {
        self.bypass = Some(Arc::new(predicate));
        self.bypass_records_usage = records_usage;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decide whether `actor` may proceed at `now`, recording the invocation
    /// when it is allowed.
    pub async fn check_and_record(&self, actor: &Actor, now: DateTime<Utc>) -> Decision {
        let window = self.window_chrono();
        let mut history = self.history.lock().await;
        let entries = history.entry(actor.id).or_default();

        let in_window = entries.iter().filter(|t| now - **t < window).count();

        if in_window < self.limit {
            entries.push(now);
            return Decision::Allow;
        }

        if self.bypass.as_ref().is_some_and(|bypass| bypass(actor)) {
            if self.bypass_records_usage {
                entries.push(now);
            }
            debug!(actor_id = actor.id, "Rate limit bypassed");
            return Decision::Allow;
        }

        // History is non-decreasing, so the first in-window entry is the oldest.
        let oldest = entries
            .iter()
            .copied()
            .find(|t| now - *t < window)
            .unwrap_or(now);
        let elapsed = (now - oldest).num_seconds().max(0) as u64;
        let retry_after = Duration::from_secs(self.window.as_secs().saturating_sub(elapsed));

        debug!(
            actor_id = actor.id,
            retry_after_secs = retry_after.as_secs(),
            "Rate limit exceeded"
        );
        Decision::Deny { retry_after }
    }

    /// Drop every history entry older than the window and forget actors left
    /// with no history. Returns the number of entries removed.
    pub async fn prune(&self, now: DateTime<Utc>) -> usize {
        let window = self.window_chrono();
        let mut history = self.history.lock().await;
        let mut removed = 0;

        history.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|t| now - *t < window);
            removed += before - entries.len();
            !entries.is_empty()
        });

        removed
    }

    /// Number of recorded timestamps for an actor.
    pub async fn history_len(&self, key: UserId) -> usize {
        self.history
            .lock()
            .await
            .get(&key)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Number of actors with a non-pruned history.
    pub async fn tracked_actors(&self) -> usize {
        self.history.lock().await.len()
    }

    /// Whether the background pruner has been started.
    pub fn is_pruning(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start the background pruner, sweeping once per window.
    ///
    /// Returns `false` without spawning anything if the pruner is already
    /// running. The task stops on its own once the limiter is dropped.
    pub fn spawn_pruner(self: &Arc<Self>) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Rate limit pruner already running");
            return false;
        }

        let limiter = Arc::downgrade(self);
        let period = self.window;

        tokio::spawn(async move {
            info!(period_secs = period.as_secs(), "Rate limit pruner started");
            loop {
                tokio::time::sleep(period).await;
                let Some(limiter) = limiter.upgrade() else {
                    break;
                };
                let removed = limiter.prune(Utc::now()).await;
                if removed > 0 {
                    debug!(removed, "Pruned rate limit history");
                }
            }
        });

        true
    }

    fn window_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.window).unwrap_or_else(|_| chrono::Duration::weeks(52_000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn alice() -> Actor {
        Actor::new(1, "alice")
    }

    fn moderator() -> Actor {
        Actor::new(2, "mod").with_manage_guild()
    }

    fn ticket_limiter() -> RateLimiter {
        RateLimiter::new(1, Duration::from_secs(180))
    }

    #[tokio::test]
    async fn test_one_per_window_scenario() {
        let limiter = ticket_limiter();

        assert_eq!(limiter.check_and_record(&alice(), at(0)).await, Decision::Allow);
        assert_eq!(
            limiter.check_and_record(&alice(), at(10)).await,
            Decision::Deny {
                retry_after: Duration::from_secs(170)
            }
        );
        assert_eq!(limiter.check_and_record(&alice(), at(181)).await, Decision::Allow);
    }

    #[tokio::test]
    async fn test_window_boundary_is_strict() {
        let limiter = ticket_limiter();

        assert!(limiter.check_and_record(&alice(), at(0)).await.is_allowed());
        // Exactly one window later the first entry no longer counts.
        assert!(limiter.check_and_record(&alice(), at(180)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_retry_after_truncates_elapsed_seconds() {
        let limiter = ticket_limiter();
        let start = at(0);
        limiter.check_and_record(&alice(), start).await;

        let now = start + chrono::Duration::milliseconds(10_900);
        assert_eq!(
            limiter.check_and_record(&alice(), now).await,
            Decision::Deny {
                retry_after: Duration::from_secs(170)
            }
        );
    }

    #[tokio::test]
    async fn test_never_allows_more_than_limit_per_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let mut allowed = Vec::new();

        for second in 0..300 {
            let now = at(second);
            if limiter.check_and_record(&alice(), now).await.is_allowed() {
                allowed.push(now);
            }
        }

        for (i, start) in allowed.iter().enumerate() {
            let in_window = allowed[i..]
                .iter()
                .filter(|t| **t - *start < chrono::Duration::seconds(60))
                .count();
            assert!(in_window <= 3, "window starting at {} had {}", start, in_window);
        }
        assert_eq!(allowed.len(), 15);
    }

    #[tokio::test]
    async fn test_denied_invocation_is_not_recorded() {
        let limiter = ticket_limiter();
        limiter.check_and_record(&alice(), at(0)).await;
        limiter.check_and_record(&alice(), at(5)).await;
        limiter.check_and_record(&alice(), at(6)).await;

        assert_eq!(limiter.history_len(alice().id).await, 1);
    }

    #[tokio::test]
    async fn test_actors_are_independent() {
        let limiter = ticket_limiter();
        let bob = Actor::new(7, "bob");

        assert!(limiter.check_and_record(&alice(), at(0)).await.is_allowed());
        assert!(limiter.check_and_record(&bob, at(1)).await.is_allowed());
        assert!(!limiter.check_and_record(&alice(), at(2)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_bypass_records_usage() {
        let limiter = ticket_limiter().with_bypass(|actor| actor.can_manage_guild, true);

        for second in 0..3 {
            assert!(limiter.check_and_record(&moderator(), at(second)).await.is_allowed());
        }
        assert_eq!(limiter.history_len(moderator().id).await, 3);

        // Non-privileged actors are still limited.
        assert!(limiter.check_and_record(&alice(), at(0)).await.is_allowed());
        assert!(!limiter.check_and_record(&alice(), at(1)).await.is_allowed());
    }

    #[tokio::test]
    async fn test_bypass_without_recording() {
        let limiter = ticket_limiter().with_bypass(|actor| actor.can_manage_guild, false);

        for second in 0..3 {
            assert!(limiter.check_and_record(&moderator(), at(second)).await.is_allowed());
        }
        assert_eq!(limiter.history_len(moderator().id).await, 1);
    }

    #[tokio::test]
    async fn test_prune_drops_stale_entries_and_empty_keys() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let bob = Actor::new(7, "bob");

        limiter.check_and_record(&alice(), at(0)).await;
        limiter.check_and_record(&alice(), at(50)).await;
        limiter.check_and_record(&bob, at(10)).await;

        let removed = limiter.prune(at(75)).await;

        assert_eq!(removed, 2);
        assert_eq!(limiter.history_len(alice().id).await, 1);
        assert_eq!(limiter.history_len(bob.id).await, 0);
        assert_eq!(limiter.tracked_actors().await, 1);
    }

    #[tokio::test]
    async fn test_prune_does_not_change_decisions() {
        let limiter = ticket_limiter();
        limiter.check_and_record(&alice(), at(0)).await;

        let without_prune = limiter.check_and_record(&alice(), at(100)).await;
        limiter.prune(at(100)).await;
        let with_prune = limiter.check_and_record(&alice(), at(100)).await;

        assert_eq!(without_prune, with_prune);
    }

    #[tokio::test]
    async fn test_spawn_pruner_is_idempotent() {
        let limiter = Arc::new(ticket_limiter());

        assert!(!limiter.is_pruning());
        assert!(limiter.spawn_pruner());
        assert!(!limiter.spawn_pruner());
        assert!(limiter.is_pruning());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pruner_sweeps_every_window() {
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(60)));
        let stale = Utc::now() - chrono::Duration::seconds(600);
        limiter.check_and_record(&alice(), stale).await;
        assert_eq!(limiter.tracked_actors().await, 1);

        limiter.spawn_pruner();
        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert_eq!(limiter.tracked_actors().await, 0);
    }
}
