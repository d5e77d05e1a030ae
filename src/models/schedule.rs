//! Stochastic schedule (solution) model.
//!
//! A solved formulation yields one timeline per scenario: a flat record
//! per (scenario, project, task, resource option), per-resource daily
//! load, per-project completion figures and the revelation instant.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cp::SolveStatus;

/// One resource option of one task in one scenario.
///
/// Exactly one option per task is active. Inactive options carry the
/// task's times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Scenario name.
    pub scenario: String,
    /// Project ID.
    pub project: String,
    /// Task ID.
    pub task: String,
    /// Resource of this option.
    pub resource: String,
    /// Start day.
    pub start: i64,
    /// End day (exclusive).
    pub end: i64,
    /// Calendar date of `start`.
    pub start_date: NaiveDate,
    /// Calendar date of `end`.
    pub end_date: NaiveDate,
    /// Units held while active.
    pub units: i64,
    /// Whether this option was chosen.
    pub active: bool,
}

impl ScheduleRecord {
    /// Days between start and end.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Whether the record occupies `day`.
    #[inline]
    pub fn covers(&self, day: i64) -> bool {
        self.active && self.start <= day && day < self.end
    }
}

/// Completion figures of a project in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCompletion {
    /// Scenario name.
    pub scenario: String,
    /// Project ID.
    pub project: String,
    /// End day of the last task.
    pub completion: i64,
    /// Days finished before the deadline.
    pub earliness: i64,
    /// Days finished after the deadline.
    pub tardiness: i64,
}

/// Daily load of a resource in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    /// Scenario name.
    pub scenario: String,
    /// Resource ID.
    pub resource: String,
    /// Declared capacity.
    pub capacity: i64,
    /// Units committed before planning, per day.
    pub committed: Vec<i64>,
    /// Units of active scheduled options, per day.
    pub scheduled: Vec<i64>,
}

impl ResourceUsage {
    /// Total units in use on `day`.
    pub fn total_at(&self, day: usize) -> i64 {
        self.committed.get(day).copied().unwrap_or(0) + self.scheduled.get(day).copied().unwrap_or(0)
    }

    /// Highest total load over the horizon.
    pub fn peak(&self) -> i64 {
        (0..self.committed.len().max(self.scheduled.len()))
            .map(|d| self.total_at(d))
            .max()
            .unwrap_or(0)
    }

    /// Unit-days of newly scheduled work.
    pub fn scheduled_unit_days(&self) -> i64 {
        self.scheduled.iter().sum()
    }

    /// Whether the load stays within capacity on every day.
    pub fn within_capacity(&self) -> bool {
        self.peak() <= self.capacity
    }
}

/// Non-anticipativity outcome for a task shared by two scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCoupling {
    /// Project ID.
    pub project: String,
    /// Task ID.
    pub task: String,
    /// The two scenario names.
    pub scenarios: (String, String),
    /// Earlier of the two starts.
    pub min_start: i64,
    /// Whether the task started by the revelation instant, which forces
    /// identical timing in both scenarios.
    pub coupled: bool,
}

/// Solution of the stochastic formulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StochasticSchedule {
    /// Solve status (`Optimal` or `Feasible`).
    pub status: SolveStatus,
    /// Objective value.
    pub objective: f64,
    /// Proven lower bound on the objective.
    pub best_bound: f64,
    /// Time horizon of the model.
    pub horizon: i64,
    /// Revelation instant, when an information task exists.
    pub urt: Option<i64>,
    /// Calendar date of `urt`.
    pub urt_date: Option<NaiveDate>,
    /// Option records.
    pub records: Vec<ScheduleRecord>,
    /// Project completions.
    pub completions: Vec<ProjectCompletion>,
    /// Resource loads.
    pub utilization: Vec<ResourceUsage>,
    /// Non-anticipativity pairings.
    pub couplings: Vec<TaskCoupling>,
}

impl StochasticSchedule {
    /// Active records only.
    pub fn active_records(&self) -> impl Iterator<Item = &ScheduleRecord> {
        self.records.iter().filter(|r| r.active)
    }

    /// The active record of a task in a scenario.
    pub fn record(&self, scenario: &str, project: &str, task: &str) -> Option<&ScheduleRecord> {
        self.active_records()
            .find(|r| r.scenario == scenario && r.project == project && r.task == task)
    }

    /// Active records of a project in a scenario, in start order.
    pub fn project_records(&self, scenario: &str, project: &str) -> Vec<&ScheduleRecord> {
        let mut out: Vec<&ScheduleRecord> = self
            .active_records()
            .filter(|r| r.scenario == scenario && r.project == project)
            .collect();
        out.sort_by_key(|r| r.start);
        out
    }

    /// Completion of a project in a scenario.
    pub fn completion(&self, scenario: &str, project: &str) -> Option<&ProjectCompletion> {
        self.completions
            .iter()
            .find(|c| c.scenario == scenario && c.project == project)
    }

    /// Latest project completion in a scenario.
    pub fn makespan(&self, scenario: &str) -> i64 {
        self.completions
            .iter()
            .filter(|c| c.scenario == scenario)
            .map(|c| c.completion)
            .max()
            .unwrap_or(0)
    }

    /// Load of a resource in a scenario.
    pub fn usage(&self, scenario: &str, resource: &str) -> Option<&ResourceUsage> {
        self.utilization
            .iter()
            .find(|u| u.scenario == scenario && u.resource == resource)
    }

    /// Scenario names in model order.
    pub fn scenario_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for c in &self.completions {
            if !names.contains(&c.scenario.as_str()) {
                names.push(&c.scenario);
            }
        }
        names
    }

    /// Number of option records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}
