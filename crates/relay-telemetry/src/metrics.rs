//! Prometheus metrics for the relay.
//!
//! All metrics follow the naming convention `xr_<component>_<metric>` and
//! carry a `region` label.
//!
//! The services keep their own atomic counters; the runtime copies their
//! snapshots into these gauges on an interval with [`record_region_snapshot`].

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

fn region_gauge(name: &str, help: &str) -> IntGaugeVec {
    IntGaugeVec::new(Opts::new(name, help), &["region"]).expect("metric creation failed")
}

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DISPATCHER
    // =========================================================================

    /// Messages handed to the local dispatcher
    pub static ref MESSAGES_PUBLISHED: IntGaugeVec = region_gauge(
        "xr_dispatch_messages_published",
        "Messages dispatched to local subscribers"
    );

    /// Subscription matches produced by dispatch
    pub static ref DELIVERIES_MATCHED: IntGaugeVec = region_gauge(
        "xr_dispatch_deliveries_matched",
        "Subscriptions matched by dispatched messages"
    );

    /// Deliveries accepted by a sink
    pub static ref DELIVERIES_SUCCEEDED: IntGaugeVec = region_gauge(
        "xr_dispatch_deliveries_succeeded",
        "Deliveries accepted by subscriber sinks"
    );

    /// Failed deliveries, including full queues
    pub static ref DELIVERY_FAILURES: IntGaugeVec = region_gauge(
        "xr_dispatch_delivery_failures",
        "Deliveries that failed or found the subscriber queue full"
    );

    /// Subscriptions removed after repeated sink failures
    pub static ref SUBSCRIPTIONS_FAILED: IntGaugeVec = region_gauge(
        "xr_dispatch_subscriptions_failed",
        "Subscriptions removed after reaching the sink failure threshold"
    );

    /// Subscriptions terminated by invalidation
    pub static ref SUBSCRIPTIONS_INVALIDATED: IntGaugeVec = region_gauge(
        "xr_dispatch_subscriptions_invalidated",
        "Subscriptions terminated by invalidation"
    );

    /// Live subscriptions whose sink failed its latest delivery
    pub static ref SUBSCRIPTIONS_DEGRADED: IntGaugeVec = region_gauge(
        "xr_dispatch_subscriptions_degraded",
        "Subscriptions whose sink has failed since its last successful delivery"
    );

    /// Live subscriptions
    pub static ref ACTIVE_SUBSCRIPTIONS: IntGaugeVec = region_gauge(
        "xr_dispatch_active_subscriptions",
        "Subscriptions currently registered"
    );

    // =========================================================================
    // RELAY
    // =========================================================================

    /// Local publishes relayed outbound
    pub static ref RELAY_PUBLISHED_OUT: IntGaugeVec = region_gauge(
        "xr_relay_published_out",
        "Locally published messages relayed to peers"
    );

    /// Peer sends that were acknowledged
    pub static ref RELAY_SENDS_OK: IntGaugeVec = region_gauge(
        "xr_relay_peer_sends_ok",
        "Peer relays acknowledged"
    );

    /// Peer sends that failed after retries
    pub static ref RELAY_SENDS_FAILED: IntGaugeVec = region_gauge(
        "xr_relay_peer_sends_failed",
        "Peer relays dropped after exhausting retries"
    );

    /// Inbound relays dispatched locally
    pub static ref INBOUND_ACCEPTED: IntGaugeVec = region_gauge(
        "xr_relay_inbound_accepted",
        "Relayed messages accepted and dispatched"
    );

    /// Inbound relays dropped as duplicates
    pub static ref DUPLICATES_DROPPED: IntGaugeVec = region_gauge(
        "xr_relay_duplicates_dropped",
        "Relayed messages dropped as duplicates"
    );

    /// Inbound relays dropped as echoes of our own publishes
    pub static ref ECHOES_DROPPED: IntGaugeVec = region_gauge(
        "xr_relay_echoes_dropped",
        "Relayed messages dropped because they originated here"
    );

    /// Tokens held in the dedup window
    pub static ref SEEN_WINDOW_ENTRIES: IntGaugeVec = region_gauge(
        "xr_relay_seen_window_entries",
        "Dedup tokens currently remembered"
    );

    // =========================================================================
    // CLIENT API
    // =========================================================================

    /// Publish call duration
    pub static ref PUBLISH_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "xr_bus_publish_duration_seconds",
            "Time spent in a publish call, local dispatch included"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("bucket creation failed")),
        &["region"]
    ).expect("metric creation failed");
}

/// Counter snapshot of one region, as exported to Prometheus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionMetrics {
    /// Messages dispatched locally.
    pub messages_published: u64,
    /// Subscription matches.
    pub deliveries_matched: u64,
    /// Deliveries accepted by sinks.
    pub deliveries_succeeded: u64,
    /// Failed deliveries.
    pub delivery_failures: u64,
    /// Live subscriptions with a failing sink.
    pub degraded_subscriptions: u64,
    /// Subscriptions removed for failing sinks.
    pub subscriptions_failed: u64,
    /// Subscriptions removed by invalidation.
    pub subscriptions_invalidated: u64,
    /// Live subscriptions.
    pub active_subscriptions: u64,
    /// Local publishes relayed outbound.
    pub relay_published_out: u64,
    /// Acknowledged peer sends.
    pub relay_sends_ok: u64,
    /// Peer sends dropped after retries.
    pub relay_sends_failed: u64,
    /// Inbound relays dispatched.
    pub inbound_accepted: u64,
    /// Inbound duplicates dropped.
    pub duplicates_dropped: u64,
    /// Inbound echoes dropped.
    pub echoes_dropped: u64,
    /// Dedup window size.
    pub seen_window_entries: u64,
}

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Dispatcher
        Box::new(MESSAGES_PUBLISHED.clone()),
        Box::new(DELIVERIES_MATCHED.clone()),
        Box::new(DELIVERIES_SUCCEEDED.clone()),
        Box::new(DELIVERY_FAILURES.clone()),
        Box::new(SUBSCRIPTIONS_FAILED.clone()),
        Box::new(SUBSCRIPTIONS_INVALIDATED.clone()),
        Box::new(SUBSCRIPTIONS_DEGRADED.clone()),
        Box::new(ACTIVE_SUBSCRIPTIONS.clone()),
        // Relay
        Box::new(RELAY_PUBLISHED_OUT.clone()),
        Box::new(RELAY_SENDS_OK.clone()),
        Box::new(RELAY_SENDS_FAILED.clone()),
        Box::new(INBOUND_ACCEPTED.clone()),
        Box::new(DUPLICATES_DROPPED.clone()),
        Box::new(ECHOES_DROPPED.clone()),
        Box::new(SEEN_WINDOW_ENTRIES.clone()),
        // Client API
        Box::new(PUBLISH_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

fn set(gauge: &IntGaugeVec, region: &str, value: u64) {
    gauge
        .with_label_values(&[region])
        .set(i64::try_from(value).unwrap_or(i64::MAX));
}

/// Copy a region's counter snapshot into the exported gauges.
pub fn record_region_snapshot(region: &str, snapshot: &RegionMetrics) {
    set(&MESSAGES_PUBLISHED, region, snapshot.messages_published);
    set(&DELIVERIES_MATCHED, region, snapshot.deliveries_matched);
    set(&DELIVERIES_SUCCEEDED, region, snapshot.deliveries_succeeded);
    set(&DELIVERY_FAILURES, region, snapshot.delivery_failures);
    set(&SUBSCRIPTIONS_FAILED, region, snapshot.subscriptions_failed);
    set(
        &SUBSCRIPTIONS_INVALIDATED,
        region,
        snapshot.subscriptions_invalidated,
    );
    set(&SUBSCRIPTIONS_DEGRADED, region, snapshot.degraded_subscriptions);
    set(&ACTIVE_SUBSCRIPTIONS, region, snapshot.active_subscriptions);
    set(&RELAY_PUBLISHED_OUT, region, snapshot.relay_published_out);
    set(&RELAY_SENDS_OK, region, snapshot.relay_sends_ok);
    set(&RELAY_SENDS_FAILED, region, snapshot.relay_sends_failed);
    set(&INBOUND_ACCEPTED, region, snapshot.inbound_accepted);
    set(&DUPLICATES_DROPPED, region, snapshot.duplicates_dropped);
    set(&ECHOES_DROPPED, region, snapshot.echoes_dropped);
    set(&SEEN_WINDOW_ENTRIES, region, snapshot.seen_window_entries);
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: prometheus::Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a timer for `region` on a region-labelled histogram.
    pub fn new(histogram: &HistogramVec, region: &str) -> Self {
        Self {
            histogram: histogram.with_label_values(&[region]),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a region-labelled histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr, $region:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram, $region)
    };
}
