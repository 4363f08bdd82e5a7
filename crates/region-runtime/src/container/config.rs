//! # Runtime Configuration
//!
//! Per-region service settings plus the regions hosted by this process.
//! Hosted regions relay to each other as a full mesh.
//!
//! Every value has a default and can be overridden with an `XR_` variable.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use shared_types::RegionId;
use thiserror::Error;
use xr_03_dispatcher::DispatcherConfig;
use xr_04_region_relay::{RelayConfig, RetryPolicy};
use xr_05_channel_bus::BusConfig;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("{var}: cannot parse {value:?}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },

    /// A setting that must be positive is zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// No region configured.
    #[error("at least one region is required")]
    NoRegions,

    /// The same region is listed twice.
    #[error("region {0} is listed more than once")]
    DuplicateRegion(RegionId),
}

/// Settings shared by every region node.
#[derive(Debug, Clone, Default)]
pub struct RegionConfig {
    /// Local fan-out.
    pub dispatcher: DispatcherConfig,
    /// Cross-region relay.
    pub relay: RelayConfig,
    /// Client API.
    pub bus: BusConfig,
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Regions hosted by this process.
    pub regions: Vec<RegionId>,
    /// Per-region service settings.
    pub region: RegionConfig,
    /// How often service counters are copied into Prometheus gauges.
    pub metrics_interval: Duration,
    /// How often expired dedup entries are purged.
    pub purge_interval: Duration,
    /// Pause between demo publishes; `None` disables the demo workload.
    pub demo_interval: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            regions: vec![
                RegionId::new("us-east-1"),
                RegionId::new("eu-west-1"),
                RegionId::new("ap-south-1"),
            ],
            region: RegionConfig::default(),
            metrics_interval: Duration::from_secs(15),
            purge_interval: Duration::from_secs(30),
            demo_interval: Some(Duration::from_secs(2)),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `XR_REGIONS`: comma-separated region list
    /// - `XR_SINK_FAILURE_THRESHOLD`, `XR_SUBSCRIBER_QUEUE_CAPACITY`
    /// - `XR_TERMINATION_TIMEOUT_MS`: bound on each invalidation notice
    /// - `XR_DEDUP_CAPACITY_PER_ORIGIN`, `XR_DEDUP_TTL_SECS`
    /// - `XR_RELAY_MAX_ATTEMPTS`, `XR_RELAY_INITIAL_BACKOFF_MS`, `XR_RELAY_MAX_BACKOFF_MS`
    /// - `XR_RELAY_ATTEMPT_TIMEOUT_MS`: bound on each peer send attempt
    /// - `XR_MAX_FILTER_GROUPS`, `XR_MAX_FILTER_PREDICATES`
    /// - `XR_MAX_PAYLOAD_BYTES`
    /// - `XR_METRICS_INTERVAL_SECS`, `XR_PURGE_INTERVAL_SECS`
    /// - `XR_DEMO_INTERVAL_MS` (`0` disables the demo workload)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvSource(lookup);
        let mut config = Self::default();

        if let Some(raw) = env.get("XR_REGIONS") {
            config.regions = raw
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(RegionId::new)
                .collect();
        }

        let dispatcher = &mut config.region.dispatcher;
        env.apply("XR_SINK_FAILURE_THRESHOLD", &mut dispatcher.sink_failure_threshold)?;
        env.apply(
            "XR_SUBSCRIBER_QUEUE_CAPACITY",
            &mut dispatcher.subscriber_queue_capacity,
        )?;
        env.apply("XR_MAX_FILTER_GROUPS", &mut dispatcher.filter_limits.max_groups)?;
        env.apply(
            "XR_MAX_FILTER_PREDICATES",
            &mut dispatcher.filter_limits.max_predicates_per_group,
        )?;
        if let Some(ms) = env.parse::<u64>("XR_TERMINATION_TIMEOUT_MS")? {
            dispatcher.termination_timeout = Duration::from_millis(ms);
        }

        let relay = &mut config.region.relay;
        env.apply(
            "XR_DEDUP_CAPACITY_PER_ORIGIN",
            &mut relay.seen_window.capacity_per_origin,
        )?;
        if let Some(secs) = env.parse::<u64>("XR_DEDUP_TTL_SECS")? {
            relay.seen_window.ttl = Duration::from_secs(secs);
        }
        env.apply("XR_RELAY_MAX_ATTEMPTS", &mut relay.retry.max_attempts)?;
        if let Some(ms) = env.parse::<u64>("XR_RELAY_INITIAL_BACKOFF_MS")? {
            relay.retry.initial_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = env.parse::<u64>("XR_RELAY_MAX_BACKOFF_MS")? {
            relay.retry.max_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = env.parse::<u64>("XR_RELAY_ATTEMPT_TIMEOUT_MS")? {
            relay.retry.attempt_timeout = Duration::from_millis(ms);
        }

        env.apply("XR_MAX_PAYLOAD_BYTES", &mut config.region.bus.max_payload_bytes)?;

        if let Some(secs) = env.parse::<u64>("XR_METRICS_INTERVAL_SECS")? {
            config.metrics_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env.parse::<u64>("XR_PURGE_INTERVAL_SECS")? {
            config.purge_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = env.parse::<u64>("XR_DEMO_INTERVAL_MS")? {
            config.demo_interval = (ms > 0).then(|| Duration::from_millis(ms));
        }

        Ok(config)
    }

    /// Reject values the services cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.regions.is_empty() {
            return Err(ConfigError::NoRegions);
        }
        let mut seen = HashSet::new();
        for region in &self.regions {
            if !seen.insert(region) {
                return Err(ConfigError::DuplicateRegion(region.clone()));
            }
        }

        let dispatcher = &self.region.dispatcher;
        let relay = &self.region.relay;
        let checks: [(&'static str, bool); 12] = [
            ("sink_failure_threshold", dispatcher.sink_failure_threshold == 0),
            ("subscriber_queue_capacity", dispatcher.subscriber_queue_capacity == 0),
            ("max_filter_groups", dispatcher.filter_limits.max_groups == 0),
            (
                "max_filter_predicates",
                dispatcher.filter_limits.max_predicates_per_group == 0,
            ),
            ("dedup_capacity_per_origin", relay.seen_window.capacity_per_origin == 0),
            ("dedup_ttl", relay.seen_window.ttl.is_zero()),
            ("termination_timeout", dispatcher.termination_timeout.is_zero()),
            ("relay_max_attempts", relay.retry.max_attempts == 0),
            ("relay_attempt_timeout", relay.retry.attempt_timeout.is_zero()),
            ("max_payload_bytes", self.region.bus.max_payload_bytes == 0),
            ("metrics_interval", self.metrics_interval.is_zero()),
            ("purge_interval", self.purge_interval.is_zero()),
        ];
        match checks.iter().find(|(_, is_zero)| *is_zero) {
            Some((name, _)) => Err(ConfigError::Zero(name)),
            None => Ok(()),
        }
    }

    /// Retry policy used for peer sends.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.region.relay.retry
    }
}

struct EnvSource<F>(F);

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, var: &str) -> Option<String> {
        (self.0)(var).filter(|v| !v.trim().is_empty())
    }

    fn parse<T: FromStr>(&self, var: &'static str) -> Result<Option<T>, ConfigError> {
        match self.get(var) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
        }
    }

    fn apply<T: FromStr>(&self, var: &'static str, target: &mut T) -> Result<(), ConfigError> {
        if let Some(value) = self.parse(var)? {
            *target = value;
        }
        Ok(())
    }
}
