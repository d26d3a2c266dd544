//! Server configuration
//!
//! Listen address, document store selection and test execution tuning,
//! read from environment variables with defaults.

use std::time::Duration;

use crate::service::TrackerSettings;

/// Which document store backend to use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Elasticsearch {
        /// Cluster base URL (e.g., "http://localhost:9200")
        url: String,
        index_prefix: String,
    },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address (e.g., "0.0.0.0:8080")
    pub bind_addr: String,

    pub store: StoreBackend,

    /// Simulated processing latency per test sample
    pub sample_delay: Duration,

    /// Largest sample batch accepted by one test request
    pub max_samples: usize,

    /// Tests processing samples at once; 0 means unbounded
    pub max_concurrent_tests: usize,

    /// How long finished test results stay pollable
    pub test_retention: Duration,

    /// How often expired test results are swept
    pub sweep_interval: Duration,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Recognised environment variables:
    /// - PIPECONF_BIND_ADDR (default: 0.0.0.0:8080)
    /// - PIPECONF_STORE (`memory` or `elasticsearch`, default: memory)
    /// - ELASTICSEARCH_URL (default: http://localhost:9200)
    /// - ELASTICSEARCH_INDEX_PREFIX (default: empty)
    /// - TEST_SAMPLE_DELAY_MS (default: 100)
    /// - TEST_MAX_SAMPLES (default: 1000)
    /// - TEST_MAX_CONCURRENCY (default: 0)
    /// - TEST_RETENTION_SECS (default: 3600)
    /// - TEST_SWEEP_INTERVAL_SECS (default: 60)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = lookup("PIPECONF_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let store = match lookup("PIPECONF_STORE").as_deref().map(str::trim) {
            None | Some("") | Some("memory") => StoreBackend::Memory,
            Some("elasticsearch") => StoreBackend::Elasticsearch {
                url: lookup("ELASTICSEARCH_URL")
                    .unwrap_or_else(|| "http://localhost:9200".to_string()),
                index_prefix: lookup("ELASTICSEARCH_INDEX_PREFIX").unwrap_or_default(),
            },
            Some(other) => anyhow::bail!(
                "PIPECONF_STORE must be 'memory' or 'elasticsearch', got '{}'",
                other
            ),
        };

        let parse_u64 = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        let parse_usize = |key: &str| lookup(key).and_then(|s| s.trim().parse::<usize>().ok());

        Ok(Self {
            bind_addr,
            store,
            sample_delay: parse_u64("TEST_SAMPLE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.sample_delay),
            max_samples: parse_usize("TEST_MAX_SAMPLES").unwrap_or(defaults.max_samples),
            max_concurrent_tests: parse_usize("TEST_MAX_CONCURRENCY")
                .unwrap_or(defaults.max_concurrent_tests),
            test_retention: parse_u64("TEST_RETENTION_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.test_retention),
            sweep_interval: parse_u64("TEST_SWEEP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.trim().is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if let StoreBackend::Elasticsearch { url, .. } = &self.store {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("ELASTICSEARCH_URL must start with http:// or https://");
            }
        }

        if self.max_samples == 0 {
            anyhow::bail!("max_samples must be greater than 0");
        }

        if self.sweep_interval.is_zero() {
            anyhow::bail!("sweep_interval must be greater than 0");
        }

        Ok(())
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            sample_delay: self.sample_delay,
            max_samples: self.max_samples,
            max_concurrency: self.max_concurrent_tests,
            retention: self.test_retention,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            store: StoreBackend::Memory,
            sample_delay: Duration::from_millis(100),
            max_samples: 1000,
            max_concurrent_tests: 0,
            test_retention: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
