//! Test Task Tracker
//!
//! Accepts dry-run requests, runs each one in its own background task and
//! keeps the results in a shared in-memory registry until they are swept.
//! Every registry access goes through one lock; the background task that
//! owns a record is its only writer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pipeconf_core::domain::config::PipelineConfig;
use pipeconf_core::domain::test_task::{SampleOutput, TestTask};
use pipeconf_core::dto::test_task::{SubmitTest, TestSource};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinHandle;
use tokio::time;
use uuid::Uuid;

use crate::repository::config_repository;
use crate::store::DocumentStore;

pub const QUEUE_NOT_IMPLEMENTED: &str = "queue-sourced testing is not implemented";

/// Tracker error type
#[derive(Debug, Error)]
pub enum TestError {
    #[error("{0}")]
    Validation(String),

    #[error("test task {0} not found")]
    NotFound(Uuid),
}

pub type Result<T> = std::result::Result<T, TestError>;

/// Runtime knobs for test execution
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Simulated processing latency per sample
    pub sample_delay: Duration,
    /// Largest accepted sample batch
    pub max_samples: usize,
    /// Tasks processing samples at once; 0 means unbounded
    pub max_concurrency: usize,
    /// How long a finished task stays pollable
    pub retention: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            sample_delay: Duration::from_millis(100),
            max_samples: 1000,
            max_concurrency: 0,
            retention: Duration::from_secs(3600),
        }
    }
}

/// Shared registry of dry-run tasks
#[derive(Clone)]
pub struct TestTracker {
    tasks: Arc<RwLock<HashMap<Uuid, TestTask>>>,
    store: Arc<dyn DocumentStore>,
    settings: Arc<TrackerSettings>,
    permits: Option<Arc<Semaphore>>,
}

impl TestTracker {
    pub fn new(store: Arc<dyn DocumentStore>, settings: TrackerSettings) -> Self {
        let permits = (settings.max_concurrency > 0)
            .then(|| Arc::new(Semaphore::new(settings.max_concurrency)));

        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            store,
            settings: Arc::new(settings),
            permits,
        }
    }

    /// Registers a running task and starts it in the background.
    ///
    /// Returns as soon as the task is registered; poll [`get_task`] for
    /// progress.
    ///
    /// [`get_task`]: TestTracker::get_task
    pub async fn create_task(&self, req: SubmitTest) -> Result<Uuid> {
        self.validate(&req)?;

        let task_id = Uuid::new_v4();
        let task = TestTask::new(task_id, req.config_id.clone());
        self.tasks.write().await.insert(task_id, task);

        tracing::info!(
            "Test task {} accepted for configuration {}",
            task_id,
            req.config_id
        );

        let tracker = self.clone();
        tokio::spawn(async move {
            tracker.run(task_id, req.config_id, req.source).await;
        });

        Ok(task_id)
    }

    /// Snapshot of a task
    pub async fn get_task(&self, task_id: Uuid) -> Result<TestTask> {
        self.tasks
            .read()
            .await
            .get(&task_id)
            .cloned()
            .ok_or(TestError::NotFound(task_id))
    }

    /// Applies `f` to the task if it is still registered
    pub async fn mutate_task<F>(&self, task_id: Uuid, f: F)
    where
        F: FnOnce(&mut TestTask),
    {
        if let Some(task) = self.tasks.write().await.get_mut(&task_id) {
            f(task);
        }
    }

    /// Removes finished tasks older than the retention window.
    /// Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let retention = chrono::Duration::from_std(self.settings.retention)
            .unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now().checked_sub_signed(retention);

        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, task| match (task.finished_at, cutoff) {
            (Some(finished_at), Some(cutoff)) => finished_at > cutoff,
            _ => true,
        });
        before - tasks.len()
    }

    /// Starts the periodic retention sweep
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let tracker = self.clone();

        tokio::spawn(async move {
            let mut interval = time::interval(every);
            loop {
                interval.tick().await;

                let removed = tracker.sweep_expired().await;
                if removed > 0 {
                    tracing::debug!("Swept {} expired test task(s)", removed);
                }
            }
        })
    }

    fn validate(&self, req: &SubmitTest) -> Result<()> {
        if req.config_id.trim().is_empty() {
            return Err(TestError::Validation(
                "config_id cannot be empty".to_string(),
            ));
        }

        match &req.source {
            TestSource::Sample { samples } if samples.len() > self.settings.max_samples => {
                Err(TestError::Validation(format!(
                    "Too many samples: {} (max {})",
                    samples.len(),
                    self.settings.max_samples
                )))
            }
            TestSource::Queue { topic } if topic.trim().is_empty() => Err(TestError::Validation(
                "Queue topic cannot be empty".to_string(),
            )),
            _ => Ok(()),
        }
    }

    // =========================================================================
    // Execution
    // =========================================================================

    async fn run(self, task_id: Uuid, config_id: String, source: TestSource) {
        // Held until the task finishes
        let _permit = match &self.permits {
            Some(permits) => match permits.clone().acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    self.finish_failed(task_id, "test execution is shutting down")
                        .await;
                    return;
                }
            },
            None => None,
        };

        let config = match config_repository::get_by_id(self.store.as_ref(), &config_id).await {
            Ok(config) => config,
            Err(e) => {
                self.finish_failed(
                    task_id,
                    format!("Failed to load configuration {}: {}", config_id, e),
                )
                .await;
                return;
            }
        };

        let samples = match source {
            TestSource::Sample { samples } => samples,
            TestSource::Queue { topic } => {
                tracing::debug!("Test task {} asked for queue topic {}", task_id, topic);
                self.finish_failed(task_id, QUEUE_NOT_IMPLEMENTED).await;
                return;
            }
        };

        let count = samples.len();
        self.mutate_task(task_id, |task| {
            task.set_input_count(count);
        })
        .await;

        for sample in samples {
            if !self.settings.sample_delay.is_zero() {
                time::sleep(self.settings.sample_delay).await;
            }

            let output = simulate_sample(&config, sample);
            self.mutate_task(task_id, |task| {
                task.record_output(output);
            })
            .await;
        }

        self.mutate_task(task_id, |task| {
            task.complete();
        })
        .await;

        tracing::info!(
            "Test task {} completed: {} sample(s) against {} v{}",
            task_id,
            count,
            config.id,
            config.version
        );
    }

    async fn finish_failed(&self, task_id: Uuid, error: impl Into<String>) {
        let error = error.into();
        tracing::info!("Test task {} failed: {}", task_id, error);
        self.mutate_task(task_id, |task| {
            task.fail(error);
        })
        .await;
    }
}

/// Simulated transform of one sample.
///
/// A JSON object sample has its fields merged into the output. The
/// `message` and configuration metadata fields are always set last.
fn simulate_sample(config: &PipelineConfig, sample: String) -> SampleOutput {
    let mut output = Map::new();
    let mut error = None;

    if sample.trim_start().starts_with('{') {
        match serde_json::from_str::<Map<String, JsonValue>>(&sample) {
            Ok(fields) => output.extend(fields),
            Err(e) => error = Some(format!("Invalid JSON sample: {}", e)),
        }
    }

    output.insert("message".to_string(), JsonValue::String(sample.clone()));
    output.insert(
        "@timestamp".to_string(),
        JsonValue::String(Utc::now().to_rfc3339()),
    );
    output.insert("config_id".to_string(), JsonValue::from(config.id.as_str()));
    output.insert("config_name".to_string(), JsonValue::from(config.name.as_str()));
    output.insert("config_version".to_string(), JsonValue::from(config.version));
    output.insert(
        "category".to_string(),
        JsonValue::from(config.category.as_str()),
    );

    SampleOutput {
        input: sample,
        output,
        error,
    }
}
