use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// Fixed-interval polling, at most one task per key.
///
/// The first tick fires one full interval after `start`. Stopping a key
/// aborts its task, so a fetch still in flight is dropped and its result is
/// never delivered. Dropping the poller stops every key.
pub struct Poller<K> {
    period: Duration,
    tasks: Mutex<HashMap<K, JoinHandle<()>>>,
}

impl<K> Poller<K>
where
    K: Eq + Hash + Clone + Display + Send + 'static,
{
    pub fn new(period: Duration) -> Self {
        Self { period, tasks: Mutex::new(HashMap::new()) }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Begin polling `key`. Returns `false` (and schedules nothing) when a
    /// poll for `key` is already running.
    pub fn start<F, Fut>(&self, key: K, mut tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if tasks.get(&key).is_some_and(|handle| !handle.is_finished()) {
            trace!(%key, "poll already scheduled");
            return false;
        }

        let period = self.period;
        let label = key.to_string();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                trace!(key = %label, "poll tick");
                tick().await;
            }
        });
        tasks.insert(key.clone(), handle);
        debug!(%key, period_ms = period.as_millis() as u64, "polling started");
        true
    }

    pub fn stop(&self, key: &K) -> bool {
        let handle = self.tasks.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
        match handle {
            Some(handle) => {
                handle.abort();
                debug!(%key, "polling stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_polling(&self, key: &K) -> bool {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn active(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub fn stop_all(&self) {
        let drained: Vec<_> = self.tasks.lock().unwrap_or_else(PoisonError::into_inner).drain().collect();
        for (_, handle) in drained {
            handle.abort();
        }
    }
}

impl<K> Drop for Poller<K> {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, handle) in tasks.drain() {
            handle.abort();
        }
    }
}
