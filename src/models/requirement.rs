//! Task requirements and resource options.
//!
//! Input arrives as flat rows `(project, task, resource, duration, units)`.
//! [`RequirementTable`] groups them once into a per-task option list; the
//! variable builder only reads the grouped form.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One way of executing a task: on `resource`, for `duration` days,
/// consuming `units` of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Owning project.
    pub project: String,
    /// Task within the project.
    pub task: String,
    /// Candidate resource.
    pub resource: String,
    /// Duration in days.
    pub duration: i64,
    /// Units of the resource held for the whole duration.
    pub units: i64,
}

impl Requirement {
    /// Creates a requirement row.
    pub fn new(
        project: impl Into<String>,
        task: impl Into<String>,
        resource: impl Into<String>,
        duration: i64,
        units: i64,
    ) -> Self {
        Self {
            project: project.into(),
            task: task.into(),
            resource: resource.into(),
            duration,
            units,
        }
    }
}

/// A resource option of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOption {
    /// Candidate resource.
    pub resource: String,
    /// Duration in days.
    pub duration: i64,
    /// Units held.
    pub units: i64,
}

/// Options grouped by `(project, task)`, in row order.
#[derive(Debug, Clone, Default)]
pub struct RequirementTable {
    options: HashMap<(String, String), Vec<TaskOption>>,
}

impl RequirementTable {
    /// Groups requirement rows by task.
    pub fn from_rows(rows: &[Requirement]) -> Self {
        let mut options: HashMap<(String, String), Vec<TaskOption>> = HashMap::new();
        for row in rows {
            options
                .entry((row.project.clone(), row.task.clone()))
                .or_default()
                .push(TaskOption {
                    resource: row.resource.clone(),
                    duration: row.duration,
                    units: row.units,
                });
        }
        Self { options }
    }

    /// Options of a task; empty when the task has none.
    pub fn options(&self, project: &str, task: &str) -> &[TaskOption] {
        self.options
            .get(&(project.to_string(), task.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the task must choose among several options.
    pub fn is_choice(&self, project: &str, task: &str) -> bool {
        self.options(project, task).len() > 1
    }

    /// Longest option duration of a task (0 without options).
    pub fn max_duration(&self, project: &str, task: &str) -> i64 {
        self.options(project, task)
            .iter()
            .map(|o| o.duration)
            .max()
            .unwrap_or(0)
    }

    /// Shortest option duration of a task (0 without options).
    pub fn min_duration(&self, project: &str, task: &str) -> i64 {
        self.options(project, task)
            .iter()
            .map(|o| o.duration)
            .min()
            .unwrap_or(0)
    }

    /// Number of tasks with at least one option.
    pub fn task_count(&self) -> usize {
        self.options.len()
    }
}
