//! # Subscription Registry Service
//!
//! Query paths snapshot the candidate ids first and look each one up again
//! while iterating, so iteration is safe during concurrent add/remove: ids
//! removed in the meantime are skipped, ids added afterwards are not seen.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared_types::{AttributeMap, Message, RegionId, SubscriptionId};
use tracing::debug;
use xr_01_filter_engine::ChannelSelector;

use crate::domain::{RegistryError, Subscription};

/// Per-region subscription index.
pub struct SubscriptionRegistry {
    /// Region served by this registry.
    region: RegionId,
    /// All live subscriptions by id.
    subscriptions: DashMap<SubscriptionId, Arc<Subscription>>,
    /// Subscription ids by channel bucket.
    by_channel: DashMap<ChannelSelector, HashSet<SubscriptionId>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry for `region`.
    #[must_use]
    pub fn new(region: RegionId) -> Self {
        Self {
            region,
            subscriptions: DashMap::new(),
            by_channel: DashMap::new(),
        }
    }

    /// Region served by this registry.
    #[must_use]
    pub fn region(&self) -> &RegionId {
        &self.region
    }

    /// Register a subscription.
    ///
    /// # Errors
    ///
    /// - `RegionMismatch` if the subscription was created for another region
    /// - `DuplicateSubscriptionId` if the id is already registered
    pub fn add(&self, subscription: Subscription) -> Result<Arc<Subscription>, RegistryError> {
        if subscription.region != self.region {
            return Err(RegistryError::RegionMismatch {
                expected: self.region.clone(),
                actual: subscription.region,
            });
        }

        let subscription = Arc::new(subscription);
        match self.subscriptions.entry(subscription.id.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateSubscriptionId(
                subscription.id.clone(),
            )),
            Entry::Vacant(vacant) => {
                // Keep the shard guard until the bucket is indexed so a racing
                // remove cannot leave a stale id behind.
                let _guard = vacant.insert(Arc::clone(&subscription));
                self.by_channel
                    .entry(subscription.channel.clone())
                    .or_default()
                    .insert(subscription.id.clone());

                debug!(
                    region = %self.region,
                    subscription_id = %subscription.id,
                    channel = ?subscription.channel,
                    "Registered subscription"
                );
                Ok(subscription)
            }
        }
    }

    /// Remove a subscription. Idempotent: unknown ids return `None`.
    pub fn remove(&self, id: &SubscriptionId) -> Option<Arc<Subscription>> {
        let Entry::Occupied(occupied) = self.subscriptions.entry(id.clone()) else {
            return None;
        };

        // Unindex while the shard is held: a racing add of the same id waits
        // here instead of having its fresh bucket entry removed.
        if let Some(mut bucket) = self.by_channel.get_mut(&occupied.get().channel) {
            bucket.remove(id);
        }
        let (_, subscription) = occupied.remove_entry();
        self.by_channel
            .remove_if(&subscription.channel, |_, ids| ids.is_empty());

        debug!(
            region = %self.region,
            subscription_id = %id,
            "Removed subscription"
        );
        Some(subscription)
    }

    /// Look up a subscription by id.
    #[must_use]
    pub fn get(&self, id: &SubscriptionId) -> Option<Arc<Subscription>> {
        self.subscriptions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &SubscriptionId) -> bool {
        self.subscriptions.contains_key(id)
    }

    /// Every live subscription whose channel selector and filter match `message`.
    ///
    /// Only the `Exact(message.channel)` and `Any` buckets are evaluated.
    pub fn query_matching<'a>(
        &'a self,
        message: &'a Message,
    ) -> impl Iterator<Item = Arc<Subscription>> + 'a {
        let mut candidates = self.bucket_snapshot(&ChannelSelector::Exact(message.channel.clone()));
        candidates.extend(self.bucket_snapshot(&ChannelSelector::Any));

        candidates
            .into_iter()
            .filter_map(move |id| self.get(&id))
            .filter(move |subscription| subscription.matches_message(message))
    }

    /// Every live subscription whose invalidation filter matches `args`.
    pub fn query_invalidation_matches<'a>(
        &'a self,
        args: &'a AttributeMap,
    ) -> impl Iterator<Item = Arc<Subscription>> + 'a {
        self.ids()
            .into_iter()
            .filter_map(move |id| self.get(&id))
            .filter(move |subscription| subscription.matches_invalidation(args))
    }

    /// Snapshot of every registered id.
    #[must_use]
    pub fn ids(&self) -> Vec<SubscriptionId> {
        self.subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether no subscription is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Remove everything, returning the removed subscriptions.
    pub fn clear(&self) -> Vec<Arc<Subscription>> {
        self.ids()
            .into_iter()
            .filter_map(|id| self.remove(&id))
            .collect()
    }

    fn bucket_snapshot(&self, selector: &ChannelSelector) -> Vec<SubscriptionId> {
        self.by_channel
            .get(selector)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("region", &self.region)
            .field("subscriptions", &self.subscriptions.len())
            .field("buckets", &self.by_channel.len())
            .finish()
    }
}
