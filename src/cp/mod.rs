//! Constraint programming layer.
//!
//! A small CP modeling API (integer and boolean variables, fixed and
//! optional intervals, linear constraints with enforcement literals,
//! min/max equality, exactly-one, cumulative) and a solver seam.
//!
//! The formulation only talks to [`CpModel`] and the [`CpSolver`] trait;
//! [`PumpkinSolver`] hands the model to the Pumpkin constraint solver.
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

mod expr;
mod model;
mod pumpkin;
mod solver;
mod variables;

pub use expr::{LinearExpr, WeightedSum};
pub use model::{Constraint, CpModel, CumulativeConstraint, LinearConstraint, NEG_INF, POS_INF};
pub use pumpkin::{PumpkinSolver, OBJECTIVE_SCALE};
pub use solver::{CpSolution, CpSolver, SolveStats, SolveStatus, SolverParams};
pub use variables::{BoolVar, IntVar, IntervalId, IntervalVar, Literal, VarId};
