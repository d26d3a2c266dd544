//! Test task DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to dry-run a stored configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTest {
    pub config_id: String,
    #[serde(flatten)]
    pub source: TestSource,
}

/// Where the dry run takes its input from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestSource {
    /// Raw sample lines supplied with the request
    Sample { samples: Vec<String> },
    /// Messages read from a broker topic
    Queue { topic: String },
}

/// Returned as soon as a test is accepted; poll the task id for results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestAccepted {
    pub task_id: Uuid,
}
