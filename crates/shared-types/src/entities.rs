//! # Core Domain Entities
//!
//! Defines the relay entities shared by every crate.
//!
//! ## Clusters
//!
//! - **Identity**: `RegionId`, `SubscriptionId`, `DedupToken`
//! - **Payload**: `Message`, `AttributeMap`
//! - **Routing**: `Provenance`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Attribute name holding the channel of a message.
pub const ATTR_NAME: &str = "name";

/// Attribute name holding the origin region of a message.
pub const ATTR_ORIGIN_REGION: &str = "originRegion";

/// Candidate attributes evaluated by filters.
///
/// For a published message the map is derived from the message itself
/// (see [`Message::attributes`]); for invalidation it is supplied by the
/// control plane.
pub type AttributeMap = HashMap<String, String>;

// =============================================================================
// IDENTITY
// =============================================================================

/// Identifier of a broker region (e.g. `us-east-1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(String);

impl RegionId {
    /// Create a region identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of a subscription inside one region's registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Create a subscription identifier from an existing value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriptionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SubscriptionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Token shared by all copies of one original publish.
///
/// Generated once by the channel bus of the origin region and never
/// regenerated on a relay hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DedupToken(Uuid);

impl DedupToken {
    /// Generate a fresh token for a new publish.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DedupToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

/// A published channel message.
///
/// Immutable once created. Discarded after dispatch and relay complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Channel name the message was published to.
    pub channel: String,
    /// Opaque payload.
    pub payload: String,
    /// Region where the original publish happened.
    pub origin_region: RegionId,
    /// Token shared by every regional copy of this publish.
    pub dedup_token: DedupToken,
    /// Unix timestamp (milliseconds) stamped by the origin channel bus.
    pub published_at: u64,
}

impl Message {
    /// Create a new message originating in `origin_region`.
    ///
    /// A fresh dedup token and publish timestamp are stamped here.
    pub fn new(
        channel: impl Into<String>,
        payload: impl Into<String>,
        origin_region: RegionId,
    ) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
            origin_region,
            dedup_token: DedupToken::generate(),
            published_at: now_millis(),
        }
    }

    /// The de-duplication key used by the relay: `(origin_region, dedup_token)`.
    #[must_use]
    pub fn dedup_key(&self) -> (RegionId, DedupToken) {
        (self.origin_region.clone(), self.dedup_token)
    }

    /// Attributes filters are evaluated against.
    #[must_use]
    pub fn attributes(&self) -> AttributeMap {
        let mut attrs = AttributeMap::with_capacity(2);
        attrs.insert(ATTR_NAME.to_string(), self.channel.clone());
        attrs.insert(
            ATTR_ORIGIN_REGION.to_string(),
            self.origin_region.as_str().to_string(),
        );
        attrs
    }

    /// Whether this message was originally published in `region`.
    #[must_use]
    pub fn originated_in(&self, region: &RegionId) -> bool {
        &self.origin_region == region
    }
}

// =============================================================================
// ROUTING
// =============================================================================

/// Where a message entered the local region from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// Published by a client of this region.
    Local,
    /// Received from a peer region's relay (already relayed).
    Relayed {
        /// Region that forwarded the copy.
        from: RegionId,
    },
}

impl Provenance {
    /// Whether the message may still be forwarded to peer regions.
    #[must_use]
    pub fn may_relay(&self) -> bool {
        matches!(self, Self::Local)
    }
}

/// Current Unix time in milliseconds.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
