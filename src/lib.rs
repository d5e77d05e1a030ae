//! Stochastic multi-project scheduling for the U-Engine ecosystem.
//!
//! Schedules the tasks of several projects on shared, capacity-limited
//! resources when the task set itself is uncertain: a business-as-usual
//! scenario and a bypass scenario that skips some tasks. Both scenarios are
//! solved in one constraint model, and decisions taken before the
//! information task completes must be identical across scenarios
//! (endogenous non-anticipativity).
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Resource`, `Project`, `Requirement`,
//!   `ScenarioSet`, `Instance`, `StochasticSchedule`
//! - **`validation`**: Input integrity checks (duplicate IDs, resource refs,
//!   options, commitments, probabilities)
//! - **`cp`**: Constraint model (integer/bool vars, intervals, linear,
//!   cumulative, min/max) and the Pumpkin solver adapter
//! - **`formulation`**: Builds the stochastic model, solves it and extracts
//!   the schedule
//! - **`scheduler`**: Per-scenario and expected KPIs
//! - **`config`**, **`error`**, **`logging`**: Ambient concerns
//!
//! # Architecture
//!
//! ```text
//! Instance + ModelConfig ─► validation ─► formulation::StochasticModelBuilder
//!     ─► cp::CpModel ─► cp::CpSolver ─► SolvedModel::extract ─► StochasticSchedule
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Goel & Grossmann (2006), "A class of stochastic programs with decision
//!   dependent uncertainty"
//! - Apap & Grossmann (2017), "Models and computational strategies for
//!   multistage stochastic programming under endogenous and exogenous
//!   uncertainties"

pub mod config;
pub mod cp;
pub mod error;
pub mod formulation;
pub mod logging;
pub mod models;
pub mod scheduler;
pub mod validation;

pub use config::ModelConfig;
pub use cp::{PumpkinSolver, SolveStatus};
pub use error::{BuildError, ConfigError, ExtractError};
pub use formulation::{BuiltModel, SolvedModel, StochasticModelBuilder};
pub use models::{Instance, ScenarioSet, StochasticSchedule};
