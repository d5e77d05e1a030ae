//! Model configuration.
//!
//! Everything the formulation needs besides the instance: solve budget,
//! calendar epoch, horizon override and the stochastic structure (bypassed
//! tasks, bypass probability, information task). No process-wide defaults;
//! a [`ModelConfig`] is passed to the builder explicitly.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{ScenarioSet, TaskKey};

/// Default solve budget in seconds.
pub const DEFAULT_TIME_BUDGET_SECS: f64 = 100.0;

/// Configuration of one model build and solve.
///
/// # Example
/// ```
/// use u_stoch_schedule::config::ModelConfig;
///
/// let config = ModelConfig::from_json_str(r#"{
///     "name": "portfolio",
///     "time_budget_secs": 5,
///     "epoch": "2023-04-01",
///     "bypass": [{"project": "P1", "task": "review"}],
///     "bypass_probability": 0.3,
///     "info_task": {"project": "P1", "task": "triage"}
/// }"#).unwrap();
/// assert_eq!(config.scenario_set().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name, used in variable names and logs.
    pub name: String,
    /// Wall-clock solve budget in seconds.
    pub time_budget_secs: f64,
    /// Calendar date of day 0.
    pub epoch: NaiveDate,
    /// Replaces the derived horizon when set.
    pub horizon_override: Option<i64>,
    /// Tasks omitted by the bypass scenario.
    pub bypass: Vec<TaskKey>,
    /// Probability of the bypass scenario.
    pub bypass_probability: f64,
    /// Task whose completion reveals the scenario.
    pub info_task: Option<TaskKey>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "stochastic_schedule".to_string(),
            time_budget_secs: DEFAULT_TIME_BUDGET_SECS,
            epoch: NaiveDate::default(),
            horizon_override: None,
            bypass: Vec::new(),
            bypass_probability: 0.0,
            info_task: None,
        }
    }
}

impl ModelConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and checks a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Sets the model name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the solve budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_secs = budget.as_secs_f64();
        self
    }

    /// Sets the calendar date of day 0.
    pub fn with_epoch(mut self, epoch: NaiveDate) -> Self {
        self.epoch = epoch;
        self
    }

    /// Replaces the derived horizon.
    pub fn with_horizon_override(mut self, horizon: i64) -> Self {
        self.horizon_override = Some(horizon);
        self
    }

    /// Adds a task omitted by the bypass scenario.
    pub fn with_bypass(mut self, project: impl Into<String>, task: impl Into<String>) -> Self {
        self.bypass.push(TaskKey::new(project, task));
        self
    }

    /// Sets the bypass probability.
    pub fn with_bypass_probability(mut self, probability: f64) -> Self {
        self.bypass_probability = probability;
        self
    }

    /// Sets the information task.
    pub fn with_info_task(mut self, project: impl Into<String>, task: impl Into<String>) -> Self {
        self.info_task = Some(TaskKey::new(project, task));
        self
    }

    /// Solve budget as a duration. Invalid budgets read as zero.
    pub fn time_budget(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_budget_secs).unwrap_or(Duration::ZERO)
    }

    /// Scenario set described by this configuration.
    ///
    /// Without an information task the problem is certain: one scenario.
    /// Otherwise business-as-usual plus the bypass scenario.
    pub fn scenario_set(&self) -> ScenarioSet {
        match &self.info_task {
            None => ScenarioSet::single(),
            Some(info) => {
                ScenarioSet::bypass(self.bypass.clone(), self.bypass_probability, info.clone())
            }
        }
    }

    /// Checks value ranges.
    ///
    /// The horizon override is checked with the instance, by validation.
    pub fn check(&self) -> Result<(), ConfigError> {
        if !self.time_budget_secs.is_finite() || self.time_budget_secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "time_budget_secs must be a non-negative number, got {}",
                self.time_budget_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.bypass_probability) {
            return Err(ConfigError::Invalid(format!(
                "bypass_probability must be in [0, 1], got {}",
                self.bypass_probability
            )));
        }
        if !self.bypass.is_empty() && self.info_task.is_none() {
            return Err(ConfigError::Invalid(
                "bypass tasks need an info_task".to_string(),
            ));
        }
        Ok(())
    }
}
