use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`TickService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickConfig {
    /// Time between ticks.
    pub period: Duration,
    /// Fire on wall-clock multiples of `period` (e.g. on the second) rather
    /// than `period` after the first subscription.
    pub align_to_wall_clock: bool,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            align_to_wall_clock: true,
        }
    }
}

impl TickConfig {
    /// Delay from `now` to the first tick.
    fn first_delay(&self, now: SystemTime) -> Duration {
        if !self.align_to_wall_clock || self.period.is_zero() {
            return self.period;
        }
        let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
        let period_nanos = self.period.as_nanos();
        let into_period = since_epoch.as_nanos() % period_nanos;
        // Exactly on a boundary: wait a whole period rather than firing now.
        Duration::from_nanos(u64::try_from(period_nanos - into_period).unwrap_or(u64::MAX))
    }
}

/// Delivered to every subscriber on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Ticks since the source was (re)started, starting at 1.
    pub tick: u64,
    /// Wall-clock time of the tick.
    pub at: SystemTime,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

type TickCallback = dyn Fn(TickInfo) + Send + Sync;

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: BTreeMap<u64, Arc<TickCallback>>,
    source: Option<JoinHandle<()>>,
}

struct Shared {
    config: TickConfig,
    registry: Mutex<Registry>,
}

impl Shared {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A shared periodic tick source.
///
/// Any number of subscribers share one timer task. The task is spawned on
/// the first [`subscribe`](Self::subscribe) and aborted when the last
/// [`TickSubscription`] is dropped; a later subscription starts a fresh one.
///
/// Cloning is cheap: clones share the same source and subscriber set, so a
/// service can be handed to every component that needs a heartbeat.
#[derive(Clone)]
pub struct TickService {
    shared: Arc<Shared>,
}

impl Default for TickService {
    fn default() -> Self {
        Self::new(TickConfig::default())
    }
}

impl std::fmt::Debug for TickService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickService")
            .field("config", &self.shared.config)
            .field("subscribers", &self.subscriber_count())
            .field("running", &self.is_running())
            .finish()
    }
}

impl TickService {
    pub fn new(config: TickConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    /// Call `callback` on every tick until the returned guard is dropped.
    ///
    /// Must be called from within a Tokio runtime: the first subscription
    /// spawns the tick task. A zero period never ticks.
    pub fn subscribe<F>(&self, callback: F) -> TickSubscription
    where
        F: Fn(TickInfo) + Send + Sync + 'static,
    {
        let mut registry = self.shared.registry();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.insert(id, Arc::new(callback));

        if registry.source.is_none() && !self.shared.config.period.is_zero() {
            debug!(
                period_ms = u64::try_from(self.shared.config.period.as_millis()).unwrap_or(u64::MAX),
                "tick source started"
            );
            registry.source = Some(tokio::spawn(run_source(Arc::downgrade(&self.shared))));
        }

        TickSubscription {
            shared: Arc::clone(&self.shared),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.registry().subscribers.len()
    }

    /// Whether the shared tick task currently exists.
    pub fn is_running(&self) -> bool {
        self.shared.registry().source.is_some()
    }

    pub fn config(&self) -> &TickConfig {
        &self.shared.config
    }
}

async fn run_source(shared: std::sync::Weak<Shared>) {
    let (config, start) = match shared.upgrade() {
        Some(shared) => {
            let delay = shared.config.first_delay(SystemTime::now());
            (shared.config.clone(), Instant::now() + delay)
        }
        None => return,
    };

    let mut interval = time::interval_at(start, config.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut tick = 0u64;

    loop {
        interval.tick().await;
        let Some(shared) = shared.upgrade() else {
            return;
        };
        tick += 1;

        // Snapshot so callbacks may subscribe or unsubscribe re-entrantly.
        let subscribers: Vec<Arc<TickCallback>> =
            shared.registry().subscribers.values().cloned().collect();
        drop(shared);

        trace!(tick, subscribers = subscribers.len(), "tick");
        let info = TickInfo {
            tick,
            at: SystemTime::now(),
        };
        for callback in subscribers {
            callback(info);
        }
    }
}

/// Keeps a [`TickService`] callback registered. Dropping it unsubscribes,
/// and dropping the last one stops the shared source.
pub struct TickSubscription {
    shared: Arc<Shared>,
    id: u64,
}

impl std::fmt::Debug for TickSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickSubscription").field("id", &self.id).finish()
    }
}

impl Drop for TickSubscription {
    fn drop(&mut self) {
        let mut registry = self.shared.registry();
        registry.subscribers.remove(&self.id);
        if registry.subscribers.is_empty() {
            if let Some(source) = registry.source.take() {
                source.abort();
                debug!("tick source stopped");
            }
        }
    }
}
