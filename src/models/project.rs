//! Project model.
//!
//! A project is a strictly ordered chain of tasks with a deadline. Missing
//! the deadline costs `delay_penalty` per day; finishing early earns
//! `early_bonus` per day.
//!
//! # Time Representation
//! Days are integer offsets from a planning epoch (day 0). The epoch is a
//! configuration value, see [`ModelConfig`](crate::config::ModelConfig).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A project to be scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique project identifier.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Due day.
    pub deadline: i64,
    /// Cost per day of tardiness.
    pub delay_penalty: f64,
    /// Reward per day of earliness. Must be below `delay_penalty`.
    #[serde(default)]
    pub early_bonus: f64,
    /// Task identifiers in execution order.
    pub tasks: Vec<String>,
    /// Domain-specific key-value metadata.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Project {
    /// Creates a project due at day 0 with no tasks.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            deadline: 0,
            delay_penalty: 0.0,
            early_bonus: 0.0,
            tasks: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    /// Sets the project name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the deadline day.
    pub fn with_deadline(mut self, deadline: i64) -> Self {
        self.deadline = deadline;
        self
    }

    /// Sets the tardiness penalty per day.
    pub fn with_delay_penalty(mut self, penalty: f64) -> Self {
        self.delay_penalty = penalty;
        self
    }

    /// Sets the earliness bonus per day.
    pub fn with_early_bonus(mut self, bonus: f64) -> Self {
        self.early_bonus = bonus;
        self
    }

    /// Appends a task to the sequence.
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.tasks.push(task.into());
        self
    }

    /// Appends several tasks to the sequence.
    pub fn with_tasks<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tasks.extend(tasks.into_iter().map(Into::into));
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Position of a task in the sequence.
    pub fn position_of(&self, task: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t == task)
    }

    /// Whether the sequence contains `task`.
    pub fn has_task(&self, task: &str) -> bool {
        self.position_of(task).is_some()
    }

    /// Number of tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Signed deviation cost of finishing on `completion`.
    ///
    /// `delay_penalty · tardiness − early_bonus · earliness`.
    pub fn deviation_cost(&self, completion: i64) -> f64 {
        let tardiness = (completion - self.deadline).max(0);
        let earliness = (self.deadline - completion).max(0);
        self.delay_penalty * tardiness as f64 - self.early_bonus * earliness as f64
    }
}
