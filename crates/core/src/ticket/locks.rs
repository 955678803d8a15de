//! Per-ticket serialisation of transitions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::types::TicketId;

/// One async lock per ticket id. Transitions hold the guard from the
/// state read until the display write.
#[derive(Default)]
pub struct TicketLocks {
    locks: Mutex<HashMap<TicketId, Arc<AsyncMutex<()>>>>,
}

impl TicketLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: TicketId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Entries only referenced by the map are idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of tickets with a held or awaited lock.
    #[cfg(test)]
    fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_ticket_is_serialised() {
        let locks = Arc::new(TicketLocks::new());
        let id = TicketId::new(1, 2);

        let guard = locks.acquire(id).await;
        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_tickets_do_not_block() {
        let locks = TicketLocks::new();
        let _first = locks.acquire(TicketId::new(1, 2)).await;

        tokio::time::timeout(Duration::from_millis(100), locks.acquire(TicketId::new(1, 3)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_idle_locks_are_dropped() {
        let locks = TicketLocks::new();
        {
            let _guard = locks.acquire(TicketId::new(1, 2)).await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);

        let _guard = locks.acquire(TicketId::new(1, 3)).await;
        assert_eq!(locks.locks.lock().unwrap().len(), 1);
    }
}
