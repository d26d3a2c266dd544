//! Test task domain types
//!
//! A test task is the in-memory record of one asynchronous dry run of a
//! configuration against sample input. The background worker that owns the
//! task is its only writer; callers observe it by polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

/// Dry-run record
///
/// Mutate it only through the methods below: they keep `output_count`
/// within `input_count` and freeze the record once it is finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestTask {
    pub id: Uuid,
    pub config_id: String,
    pub status: TestTaskStatus,
    pub input_count: usize,
    pub output_count: usize,
    pub outputs: Vec<SampleOutput>,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestTaskStatus {
    Running,
    Completed,
    Failed,
}

/// Output produced for a single input sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleOutput {
    pub input: String,
    pub output: Map<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestTask {
    /// A freshly accepted task: running, nothing processed yet
    pub fn new(id: Uuid, config_id: impl Into<String>) -> Self {
        Self {
            id,
            config_id: config_id.into(),
            status: TestTaskStatus::Running,
            input_count: 0,
            output_count: 0,
            outputs: Vec::new(),
            errors: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status != TestTaskStatus::Running
    }

    /// Returns false if the task has already finished.
    pub fn set_input_count(&mut self, count: usize) -> bool {
        if self.is_finished() {
            return false;
        }
        self.input_count = count;
        true
    }

    /// Appends one sample output, keeping input order.
    ///
    /// Refused once the task is finished or every declared input already
    /// has an output.
    pub fn record_output(&mut self, output: SampleOutput) -> bool {
        if self.is_finished() || self.output_count >= self.input_count {
            return false;
        }
        self.outputs.push(output);
        self.output_count += 1;
        true
    }

    pub fn complete(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.status = TestTaskStatus::Completed;
        self.finished_at = Some(Utc::now());
        true
    }

    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if self.is_finished() {
            return false;
        }
        self.status = TestTaskStatus::Failed;
        self.errors.push(error.into());
        self.finished_at = Some(Utc::now());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(input: &str) -> SampleOutput {
        SampleOutput {
            input: input.to_string(),
            output: Map::new(),
            error: None,
        }
    }

    #[test]
    fn test_new_task_is_running_and_empty() {
        let task = TestTask::new(Uuid::new_v4(), "cfg");
        assert_eq!(task.status, TestTaskStatus::Running);
        assert_eq!(task.input_count, 0);
        assert_eq!(task.output_count, 0);
        assert!(task.finished_at.is_none());
    }

    #[test]
    fn test_outputs_never_exceed_inputs() {
        let mut task = TestTask::new(Uuid::new_v4(), "cfg");
        task.set_input_count(2);

        assert!(task.record_output(output("a")));
        assert!(task.record_output(output("b")));
        assert!(!task.record_output(output("c")));
        assert_eq!(task.output_count, 2);
        assert_eq!(task.outputs.len(), 2);
    }

    #[test]
    fn test_finished_task_is_frozen() {
        let mut task = TestTask::new(Uuid::new_v4(), "cfg");
        task.set_input_count(1);
        assert!(task.complete());
        let finished_at = task.finished_at;

        assert!(finished_at.is_some());
        assert!(!task.fail("late"));
        assert!(!task.record_output(output("a")));
        assert!(!task.set_input_count(5));
        assert_eq!(task.status, TestTaskStatus::Completed);
        assert!(task.errors.is_empty());
        assert_eq!(task.finished_at, finished_at);
    }

    #[test]
    fn test_failed_task_carries_error_and_end_time() {
        let mut task = TestTask::new(Uuid::new_v4(), "cfg");
        assert!(task.fail("configuration not found"));
        assert_eq!(task.status, TestTaskStatus::Failed);
        assert_eq!(task.errors, vec!["configuration not found".to_string()]);
        assert!(task.finished_at.is_some());
    }
}
