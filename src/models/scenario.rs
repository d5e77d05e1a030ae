//! Scenario set and information structure.
//!
//! Every scenario shares the same projects and resources. The first
//! scenario is the base; later scenarios are described by the (project,
//! task) pairs they omit relative to it. A designated information task
//! marks when the realized scenario becomes known.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A (project, task) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskKey {
    /// Project identifier.
    pub project: String,
    /// Task identifier.
    pub task: String,
}

impl TaskKey {
    /// Creates a task key.
    pub fn new(project: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            task: task.into(),
        }
    }

    /// Whether this key names `task` of `project`.
    pub fn matches(&self, project: &str, task: &str) -> bool {
        self.project == project && self.task == task
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.task)
    }
}

/// One stochastic realization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Probability weight.
    pub probability: f64,
    /// Tasks of the base scenario that do not occur in this one.
    #[serde(default)]
    pub omitted: Vec<TaskKey>,
}

impl Scenario {
    /// Creates a scenario with no omissions.
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            probability,
            omitted: Vec::new(),
        }
    }

    /// Omits a task.
    pub fn omitting(mut self, project: impl Into<String>, task: impl Into<String>) -> Self {
        self.omitted.push(TaskKey::new(project, task));
        self
    }

    /// Whether `task` of `project` occurs in this scenario.
    pub fn includes(&self, project: &str, task: &str) -> bool {
        !self.omitted.iter().any(|k| k.matches(project, task))
    }
}

/// Scenarios plus the information task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSet {
    /// Scenarios; the first is the base.
    pub scenarios: Vec<Scenario>,
    /// Task whose completion reveals the realized scenario.
    #[serde(default)]
    pub info_task: Option<TaskKey>,
}

/// Name of the scenario built by [`ScenarioSet::single`].
pub const BASE_SCENARIO: &str = "BASE";
/// Name of the base scenario built by [`ScenarioSet::bypass`].
pub const BAU_SCENARIO: &str = "BAU";
/// Name of the alternative scenario built by [`ScenarioSet::bypass`].
pub const BYPASS_SCENARIO: &str = "BYPASS";

impl ScenarioSet {
    /// Creates a set from explicit scenarios.
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios,
            info_task: None,
        }
    }

    /// One certain scenario, no information task.
    pub fn single() -> Self {
        Self::new(vec![Scenario::new(BASE_SCENARIO, 1.0)])
    }

    /// Business-as-usual plus a bypass scenario that omits `bypass`.
    ///
    /// The bypass occurs with `probability`, the base with the rest.
    pub fn bypass(bypass: Vec<TaskKey>, probability: f64, info_task: TaskKey) -> Self {
        let mut alt = Scenario::new(BYPASS_SCENARIO, probability);
        alt.omitted = bypass;
        Self {
            scenarios: vec![Scenario::new(BAU_SCENARIO, 1.0 - probability), alt],
            info_task: Some(info_task),
        }
    }

    /// Sets the information task.
    pub fn with_info_task(mut self, project: impl Into<String>, task: impl Into<String>) -> Self {
        self.info_task = Some(TaskKey::new(project, task));
        self
    }

    /// The base scenario.
    pub fn base(&self) -> Option<&Scenario> {
        self.scenarios.first()
    }

    /// Number of scenarios.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether there are no scenarios.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Sum of the probability weights.
    pub fn total_probability(&self) -> f64 {
        self.scenarios.iter().map(|s| s.probability).sum()
    }

    /// Whether the set is stochastic, i.e. decisions must respect
    /// non-anticipativity.
    pub fn is_stochastic(&self) -> bool {
        self.info_task.is_some() && self.scenarios.len() > 1
    }

    /// Whether `task` of `project` is the information task.
    pub fn is_info_task(&self, project: &str, task: &str) -> bool {
        self.info_task
            .as_ref()
            .is_some_and(|k| k.matches(project, task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single() {
        let set = ScenarioSet::single();
        assert_eq!(set.len(), 1);
        assert!(!set.is_stochastic());
        assert_eq!(set.base().map(|s| s.name.as_str()), Some(BASE_SCENARIO));
        assert!((set.total_probability() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bypass_set() {
        let set = ScenarioSet::bypass(
            vec![TaskKey::new("P1", "review")],
            0.3,
            TaskKey::new("P1", "triage"),
        );
        assert_eq!(set.len(), 2);
        assert!(set.is_stochastic());
        assert!((set.scenarios[0].probability - 0.7).abs() < 1e-12);
        assert!(set.scenarios[0].includes("P1", "review"));
        assert!(!set.scenarios[1].includes("P1", "review"));
        assert!(set.scenarios[1].includes("P1", "triage"));
        assert!(set.is_info_task("P1", "triage"));
        assert!(!set.is_info_task("P1", "review"));
    }

    #[test]
    fn test_scenario_omitting() {
        let s = Scenario::new("alt", 0.5).omitting("P2", "qa").omitting("P3", "qa");
        assert_eq!(s.omitted.len(), 2);
        assert!(!s.includes("P3", "qa"));
        assert!(s.includes("P1", "qa"));
    }

    #[test]
    fn test_task_key_display() {
        assert_eq!(TaskKey::new("P1", "build").to_string(), "P1/build");
    }
}
