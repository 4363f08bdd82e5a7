//! # Dispatcher Service
//!
//! Owns one delivery worker per subscription. The registry decides who
//! matches; the dispatcher decides how and when the sink is called.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::future::join_all;
use shared_types::{AttributeMap, Message, RegionId, SubscriptionId};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use xr_01_filter_engine::validate;
use xr_02_subscription_registry::{DeliverySink, Subscription, SubscriptionRegistry};

use crate::domain::{DispatchError, DispatcherConfig, DispatcherStats, SubscribeRequest};
use crate::worker::{spawn_worker, DispatchState};

/// Region-local dispatcher.
///
/// ## Thread Safety
///
/// Shared across tasks via `Arc`. Every method takes `&self`; per-subscription
/// state lives in sharded maps.
pub struct Dispatcher {
    config: DispatcherConfig,
    state: Arc<DispatchState>,
}

impl Dispatcher {
    /// Create a dispatcher over `registry`.
    #[must_use]
    pub fn new(registry: Arc<SubscriptionRegistry>, config: DispatcherConfig) -> Self {
        let state = Arc::new(DispatchState::new(registry, config.sink_failure_threshold));
        Self { config, state }
    }

    /// Region served by this dispatcher.
    #[must_use]
    pub fn region(&self) -> &RegionId {
        self.state.registry.region()
    }

    /// The registry this dispatcher drives.
    #[must_use]
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.state.registry
    }

    /// Validate, register and start delivering to a new subscription.
    ///
    /// Must be called from within a Tokio runtime: the delivery worker is
    /// spawned on the current runtime.
    ///
    /// # Errors
    ///
    /// - `Filter` if either filter is malformed
    /// - `Registry` if the id is already registered
    /// - `ShutDown` after [`Dispatcher::shutdown`]
    /// - `NoRuntime` when called outside a Tokio runtime
    pub fn subscribe(
        &self,
        request: SubscribeRequest,
        sink: Arc<dyn DeliverySink>,
    ) -> Result<SubscriptionId, DispatchError> {
        if self.state.closed.load(Ordering::SeqCst) {
            return Err(DispatchError::ShutDown);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;

        if let Some(filter) = &request.filter {
            validate(filter, &self.config.filter_limits)?;
        }
        if let Some(filter) = &request.invalidation_filter {
            validate(filter, &self.config.filter_limits)?;
        }

        let mut subscription = Subscription::new(request.channel, sink, self.region().clone());
        if let Some(id) = request.id {
            subscription = subscription.with_id(id);
        }
        subscription.filter = request.filter;
        subscription.invalidation_filter = request.invalidation_filter;

        let subscription = self.state.registry.add(subscription)?;
        let id = subscription.id.clone();

        let generation = self.state.next_generation.fetch_add(1, Ordering::Relaxed);
        let worker = spawn_worker(
            &runtime,
            Arc::downgrade(&self.state),
            subscription,
            generation,
            self.config.subscriber_queue_capacity,
        );
        self.state.workers.insert(id.clone(), worker);

        // Lost a race with unsubscribe/invalidate between add and insert.
        if !self.state.registry.contains(&id) {
            if let Some((_, worker)) = self
                .state
                .workers
                .remove_if(&id, |_, worker| worker.generation == generation)
            {
                worker.task.abort();
            }
        }

        info!(
            region = %self.region(),
            subscription_id = %id,
            "Subscription opened"
        );
        Ok(id)
    }

    /// Client disconnect: remove the subscription and cancel any in-flight
    /// delivery. No termination notice is sent.
    ///
    /// Returns whether the subscription was registered.
    pub fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        self.state.stop_worker(id);
        let removed = self.state.registry.remove(id).is_some();
        if removed {
            info!(
                region = %self.region(),
                subscription_id = %id,
                "Subscription closed"
            );
        }
        removed
    }

    /// Enqueue `message` for every matching subscription.
    ///
    /// Returns the number of matched subscriptions. Never waits on a sink: a
    /// full queue counts as a failed delivery for that subscription only.
    pub fn publish_local(&self, message: &Message) -> usize {
        if self.state.closed.load(Ordering::SeqCst) {
            return 0;
        }
        self.state
            .counters
            .published
            .fetch_add(1, Ordering::Relaxed);

        let shared = Arc::new(message.clone());
        let mut matched = 0usize;

        for subscription in self.state.registry.query_matching(message) {
            let Some(worker) = self.state.workers.get(&subscription.id) else {
                continue;
            };
            matched += 1;

            let outcome = worker.queue.try_send(Arc::clone(&shared));
            let generation = worker.generation;
            let failures = Arc::clone(&worker.failures);
            drop(worker);

            match outcome {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(
                        region = %self.region(),
                        subscription_id = %subscription.id,
                        "Delivery queue full, counting as failure"
                    );
                    if self.state.record_failure(&failures) {
                        self.state.retire(&subscription.id, generation);
                    }
                }
                // Worker already exited; the subscription is on its way out.
                Err(TrySendError::Closed(_)) => {}
            }
        }

        self.state
            .counters
            .matched
            .fetch_add(matched as u64, Ordering::Relaxed);
        debug!(
            region = %self.region(),
            channel = %message.channel,
            dedup_token = %message.dedup_token,
            matched,
            "Dispatched message"
        );
        matched
    }

    /// Terminate every subscription whose invalidation filter matches `args`.
    ///
    /// Every match is removed and its worker cancelled before any sink is
    /// called. Notices then go out concurrently, each bounded by
    /// `termination_timeout`, so a stuck sink delays nobody else. Returns the
    /// terminated ids.
    pub async fn invalidate(&self, args: &AttributeMap) -> Vec<SubscriptionId> {
        let candidates: Vec<Arc<Subscription>> = self
            .state
            .registry
            .query_invalidation_matches(args)
            .collect();

        // Whoever removes the entry owns the notification.
        let removed: Vec<Arc<Subscription>> = candidates
            .into_iter()
            .filter(|subscription| self.state.registry.remove(&subscription.id).is_some())
            .collect();
        if removed.is_empty() {
            return Vec::new();
        }
        for subscription in &removed {
            self.state.stop_worker(&subscription.id);
        }
        self.state
            .counters
            .subscriptions_invalidated
            .fetch_add(removed.len() as u64, Ordering::Relaxed);

        let limit = self.config.termination_timeout;
        let region = self.region();
        join_all(removed.iter().map(|subscription| async move {
            match tokio::time::timeout(limit, subscription.sink.notify_terminated()).await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!(
                    region = %region,
                    subscription_id = %subscription.id,
                    error = %error,
                    "Termination notice not delivered"
                ),
                Err(_) => warn!(
                    region = %region,
                    subscription_id = %subscription.id,
                    timeout_ms = limit.as_millis() as u64,
                    "Termination notice timed out"
                ),
            }
        }))
        .await;

        let terminated: Vec<SubscriptionId> =
            removed.iter().map(|subscription| subscription.id.clone()).collect();
        info!(
            region = %region,
            count = terminated.len(),
            "Invalidated subscriptions"
        );
        terminated
    }

    /// Cancel every worker and clear the registry. Returns the number of
    /// subscriptions that were open.
    pub fn shutdown(&self) -> usize {
        self.state.closed.store(true, Ordering::SeqCst);
        self.abort_workers();
        let closed = self.state.registry.clear().len();
        info!(region = %self.region(), closed, "Dispatcher shut down");
        closed
    }

    /// Whether [`Dispatcher::shutdown`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> DispatcherStats {
        let counters = &self.state.counters;
        DispatcherStats {
            messages_published: counters.published.load(Ordering::Relaxed),
            deliveries_matched: counters.matched.load(Ordering::Relaxed),
            deliveries_succeeded: counters.succeeded.load(Ordering::Relaxed),
            delivery_failures: counters.failures.load(Ordering::Relaxed),
            subscriptions_failed: counters.subscriptions_failed.load(Ordering::Relaxed),
            subscriptions_invalidated: counters.subscriptions_invalidated.load(Ordering::Relaxed),
            active_subscriptions: self.state.registry.len(),
            degraded_subscriptions: self
                .state
                .workers
                .iter()
                .filter(|worker| worker.failures.load(Ordering::SeqCst) > 0)
                .count(),
        }
    }

    fn abort_workers(&self) {
        let ids: Vec<SubscriptionId> = self
            .state
            .workers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for id in ids {
            self.state.stop_worker(&id);
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.abort_workers();
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("region", self.region())
            .field("config", &self.config)
            .field("workers", &self.state.workers.len())
            .finish()
    }
}
