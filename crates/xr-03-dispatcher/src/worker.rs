//! Per-subscription delivery worker and the state it shares with the dispatcher.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use shared_types::{Message, SubscriptionId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use xr_02_subscription_registry::{Subscription, SubscriptionRegistry};

/// Handle on a running delivery worker.
pub(crate) struct WorkerHandle {
    /// Distinguishes this worker from a later one reusing the same id.
    pub generation: u64,
    pub queue: mpsc::Sender<Arc<Message>>,
    /// Consecutive failed deliveries.
    pub failures: Arc<AtomicU32>,
    pub task: JoinHandle<()>,
}

#[derive(Default)]
pub(crate) struct Counters {
    pub published: AtomicU64,
    pub matched: AtomicU64,
    pub succeeded: AtomicU64,
    pub failures: AtomicU64,
    pub subscriptions_failed: AtomicU64,
    pub subscriptions_invalidated: AtomicU64,
}

/// State shared between the dispatcher and its workers.
pub(crate) struct DispatchState {
    pub registry: Arc<SubscriptionRegistry>,
    pub workers: DashMap<SubscriptionId, WorkerHandle>,
    pub counters: Counters,
    pub failure_threshold: u32,
    pub next_generation: AtomicU64,
    pub closed: AtomicBool,
}

impl DispatchState {
    pub fn new(registry: Arc<SubscriptionRegistry>, failure_threshold: u32) -> Self {
        Self {
            registry,
            workers: DashMap::new(),
            counters: Counters::default(),
            failure_threshold,
            next_generation: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Count one failed delivery. Returns true once the threshold is reached.
    pub fn record_failure(&self, failures: &AtomicU32) -> bool {
        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        failures.fetch_add(1, Ordering::SeqCst) + 1 >= self.failure_threshold
    }

    /// Remove a subscription whose sink reached the failure threshold.
    ///
    /// Only the worker of `generation` is removed; if it was already replaced
    /// or removed this is a no-op.
    pub fn retire(&self, id: &SubscriptionId, generation: u64) {
        let Some((_, worker)) = self
            .workers
            .remove_if(id, |_, worker| worker.generation == generation)
        else {
            return;
        };
        worker.task.abort();

        if self.registry.remove(id).is_some() {
            self.counters
                .subscriptions_failed
                .fetch_add(1, Ordering::Relaxed);
            warn!(
                region = %self.registry.region(),
                subscription_id = %id,
                threshold = self.failure_threshold,
                "Removing subscription after repeated sink failures"
            );
        }
    }

    /// Stop a worker without touching the registry.
    pub fn stop_worker(&self, id: &SubscriptionId) -> bool {
        match self.workers.remove(id) {
            Some((_, worker)) => {
                worker.task.abort();
                true
            }
            None => false,
        }
    }
}

/// Spawn the delivery worker for `subscription` on `runtime`.
pub(crate) fn spawn_worker(
    runtime: &tokio::runtime::Handle,
    state: Weak<DispatchState>,
    subscription: Arc<Subscription>,
    generation: u64,
    capacity: usize,
) -> WorkerHandle {
    let (queue, receiver) = mpsc::channel(capacity.max(1));
    let failures = Arc::new(AtomicU32::new(0));
    let task = runtime.spawn(run_worker(
        state,
        subscription,
        generation,
        Arc::clone(&failures),
        receiver,
    ));

    WorkerHandle {
        generation,
        queue,
        failures,
        task,
    }
}

async fn run_worker(
    state: Weak<DispatchState>,
    subscription: Arc<Subscription>,
    generation: u64,
    failures: Arc<AtomicU32>,
    mut receiver: mpsc::Receiver<Arc<Message>>,
) {
    while let Some(message) = receiver.recv().await {
        let result = subscription.sink.deliver(&message).await;

        let Some(state) = state.upgrade() else {
            return;
        };
        match result {
            Ok(()) => {
                failures.store(0, Ordering::SeqCst);
                state.counters.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => {
                debug!(
                    subscription_id = %subscription.id,
                    dedup_token = %message.dedup_token,
                    error = %error,
                    "Sink delivery failed"
                );
                if state.record_failure(&failures) {
                    state.retire(&subscription.id, generation);
                    return;
                }
            }
        }
    }
}
