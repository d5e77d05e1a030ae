//! Solver interface: limits, statuses and the solution reader.

use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{CpModel, Literal, VarId};

/// Outcome of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Search completed; the returned solution is optimal.
    Optimal,
    /// A solution was found but the search stopped before proving optimality.
    Feasible,
    /// Search completed without finding any solution.
    Infeasible,
    /// The search stopped before any solution was found.
    Unknown,
}

impl SolveStatus {
    /// Whether a solution can be read.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    /// Upper-case status name.
    pub fn name(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Solver limits.
#[derive(Debug, Clone)]
pub struct SolverParams {
    /// Wall-clock budget.
    pub time_budget: Duration,
    /// Stop after this many improving solutions.
    pub solution_limit: Option<u64>,
    /// Cooperative stop flag, checked periodically.
    pub stop: Option<Arc<AtomicBool>>,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(100),
            solution_limit: None,
            stop: None,
        }
    }
}

impl SolverParams {
    /// Sets the wall-clock budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Stops the search once `solutions` improving solutions were found.
    /// The last one is returned as `Feasible` unless optimality was already
    /// proven.
    pub fn with_solution_limit(mut self, solutions: u64) -> Self {
        self.solution_limit = Some(solutions);
        self
    }

    /// Sets a stop flag; raising it ends the search like a timeout.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }
}

/// Search counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveStats {
    /// Improving solutions found.
    pub solutions: u64,
    /// Wall-clock time spent.
    pub wall_time: Duration,
}

/// Result of a solve call: status plus a value reader.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Solve status.
    pub status: SolveStatus,
    values: Option<Vec<i64>>,
    /// Objective of the returned solution.
    pub objective: Option<f64>,
    /// Proven lower bound on the objective.
    pub best_bound: Option<f64>,
    /// Search counters.
    pub stats: SolveStats,
}

impl CpSolution {
    /// A result without any assignment.
    pub fn without_values(status: SolveStatus, stats: SolveStats) -> Self {
        Self {
            status,
            values: None,
            objective: None,
            best_bound: None,
            stats,
        }
    }

    /// A result carrying a full assignment indexed by variable.
    pub fn from_values(status: SolveStatus, values: Vec<i64>, objective: f64, best_bound: f64) -> Self {
        Self {
            status,
            values: Some(values),
            objective: Some(objective),
            best_bound: Some(best_bound),
            stats: SolveStats::default(),
        }
    }

    /// Whether a solution was found.
    pub fn is_solution_found(&self) -> bool {
        self.status.has_solution() && self.values.is_some()
    }

    /// Value of a variable in the returned solution.
    pub fn value(&self, var: VarId) -> Option<i64> {
        self.values.as_ref()?.get(var.index()).copied()
    }

    /// Truth value of a literal in the returned solution.
    pub fn bool_value(&self, lit: impl Into<Literal>) -> Option<bool> {
        let lit = lit.into();
        self.value(lit.var()).map(|v| lit.holds_for(v))
    }

    /// Objective value, if a solution with an objective was found.
    pub fn objective_value(&self) -> Option<f64> {
        self.objective
    }
}

/// A constraint solver.
///
/// Implementations must treat the call as one blocking operation bounded by
/// `params.time_budget` and report running out of budget through the status,
/// never as a failure.
pub trait CpSolver {
    /// Solves `model` within `params`.
    fn solve(&self, model: &CpModel, params: &SolverParams) -> CpSolution;
}
