//! Stochastic scheduling formulation.
//!
//! Builds one CP model covering every scenario at once:
//!
//! 1. **Variables**: start/end per (scenario, project, task), one interval
//!    per resource option (optional when the task has a choice), commitment
//!    intervals, earliness/tardiness, revelation instant `urt`.
//! 2. **Precedence**: task chains per (scenario, project).
//! 3. **Capacity**: exactly one option per task, cumulative per
//!    (scenario, resource).
//! 4. **Non-anticipativity**: `urt` bound to the information task end;
//!    shared tasks that start by `urt` are identical across scenarios.
//! 5. **Objective**: expected resource cost plus tardiness penalty minus
//!    earliness bonus.
//!
//! Lifecycle: [`StochasticModelBuilder::build`] → [`BuiltModel`] →
//! [`BuiltModel::solve`] → [`SolvedModel`] → [`SolvedModel::extract`].
//! Only a solved model can be extracted.
//!
//! # Example
//! ```
//! use u_stoch_schedule::config::ModelConfig;
//! use u_stoch_schedule::cp::SolveStatus;
//! use u_stoch_schedule::formulation::StochasticModelBuilder;
//! use u_stoch_schedule::models::{Instance, Project, Requirement, Resource};
//!
//! let instance = Instance::new()
//!     .with_resource(Resource::new("R"))
//!     .with_project(
//!         Project::new("P")
//!             .with_deadline(10)
//!             .with_delay_penalty(2.0)
//!             .with_early_bonus(1.0)
//!             .with_tasks(["t1", "t2"]),
//!     )
//!     .with_requirement(Requirement::new("P", "t1", "R", 2, 1))
//!     .with_requirement(Requirement::new("P", "t2", "R", 3, 1));
//!
//! let built = StochasticModelBuilder::new(&instance, ModelConfig::default())
//!     .build()
//!     .unwrap();
//! let solved = built.solve();
//! assert_eq!(solved.status(), SolveStatus::Optimal);
//! let schedule = solved.extract().unwrap();
//! assert_eq!(schedule.makespan("BASE"), 5);
//! ```
//!
//! # Reference
//! - Apap & Grossmann (2017), "Models and computational strategies for
//!   multistage stochastic programming under endogenous and exogenous
//!   uncertainties", Comput. Chem. Eng. 103
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"

mod capacity;
mod extract;
mod nonanticipativity;
mod objective;
mod precedence;
mod variables;

#[cfg(test)]
mod tests;

pub use extract::day_to_date;
pub use nonanticipativity::reify_less_or_equal;

use tracing::{info, warn};

use crate::config::ModelConfig;
use crate::cp::{CpModel, CpSolution, CpSolver, PumpkinSolver, SolveStatus, SolverParams};
use crate::error::{BuildError, ExtractError};
use crate::models::{Instance, ScenarioSet, StochasticSchedule};
use crate::validation::{validate_horizon, validate_instance};

use variables::VariableArena;

/// Builds the stochastic CP model from an instance and configuration.
pub struct StochasticModelBuilder<'a> {
    instance: &'a Instance,
    scenarios: ScenarioSet,
    config: ModelConfig,
}

impl<'a> StochasticModelBuilder<'a> {
    /// Creates a builder; scenarios come from the configuration.
    pub fn new(instance: &'a Instance, config: ModelConfig) -> Self {
        Self {
            instance,
            scenarios: config.scenario_set(),
            config,
        }
    }

    /// Replaces the scenario set derived from the configuration.
    pub fn with_scenarios(mut self, scenarios: ScenarioSet) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// Validates the input and builds the model.
    ///
    /// # Errors
    /// [`BuildError::Config`] for an unusable configuration and
    /// [`BuildError::Invalid`] with every validation problem found; no
    /// variable is created in either case.
    pub fn build(self) -> Result<BuiltModel, BuildError> {
        if let Err(e) = self.config.check() {
            warn!(error = %e, "configuration rejected");
            return Err(e.into());
        }
        let mut errors = match validate_instance(self.instance, &self.scenarios) {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };
        if let Some(Err(e)) = self.config.horizon_override.map(validate_horizon) {
            errors.push(e);
        }
        if !errors.is_empty() {
            warn!(problems = errors.len(), "instance rejected");
            return Err(BuildError::Invalid(errors));
        }

        let table = self.instance.requirement_table();
        let horizon = self
            .config
            .horizon_override
            .unwrap_or_else(|| variables::derive_horizon(self.instance, &table, &self.scenarios));

        let mut model = CpModel::new(self.config.name.clone());
        let mut arena =
            variables::build_variables(&mut model, self.instance, &table, &self.scenarios, horizon);
        precedence::add_precedence(&mut model, &arena);
        capacity::add_single_assignment(&mut model, &arena);
        capacity::add_capacity(&mut model, &arena, self.instance);
        nonanticipativity::add_revelation_binding(&mut model, &arena);
        nonanticipativity::add_coupling(&mut model, &mut arena);
        objective::add_objective(&mut model, &arena, self.instance);

        info!(
            model = %self.config.name,
            scenarios = self.scenarios.len(),
            horizon,
            vars = model.var_count(),
            intervals = model.interval_count(),
            constraints = model.constraint_count(),
            "model built"
        );

        Ok(BuiltModel {
            model,
            arena,
            instance: self.instance.clone(),
            config: self.config,
        })
    }
}

/// A built model ready to be solved.
#[derive(Debug, Clone)]
pub struct BuiltModel {
    model: CpModel,
    arena: VariableArena,
    instance: Instance,
    config: ModelConfig,
}

impl BuiltModel {
    /// The underlying CP model.
    pub fn model(&self) -> &CpModel {
        &self.model
    }

    /// Upper bound on every time variable.
    pub fn horizon(&self) -> i64 {
        self.arena.horizon
    }

    /// Scenario names in model order.
    pub fn scenario_names(&self) -> Vec<&str> {
        self.arena.scenarios.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of task pairs under non-anticipativity.
    pub fn coupling_count(&self) -> usize {
        self.arena.couplings.len()
    }

    /// The configuration the model was built with.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Solves with [`PumpkinSolver`] and the configured time budget.
    pub fn solve(&self) -> SolvedModel<'_> {
        let params = SolverParams::default().with_time_budget(self.config.time_budget());
        self.solve_with(&PumpkinSolver::new(), &params)
    }

    /// Solves with any solver.
    ///
    /// The model is not consumed; solving again gives an independent result.
    pub fn solve_with(&self, solver: &dyn CpSolver, params: &SolverParams) -> SolvedModel<'_> {
        let solution = solver.solve(&self.model, params);
        SolvedModel {
            built: self,
            solution,
        }
    }
}

/// Outcome of one solve of a [`BuiltModel`].
#[derive(Debug, Clone)]
pub struct SolvedModel<'a> {
    built: &'a BuiltModel,
    solution: CpSolution,
}

impl SolvedModel<'_> {
    /// Solve status.
    pub fn status(&self) -> SolveStatus {
        self.solution.status
    }

    /// Objective of the returned solution.
    pub fn objective(&self) -> Option<f64> {
        self.solution.objective
    }

    /// Proven lower bound on the objective.
    pub fn best_bound(&self) -> Option<f64> {
        self.solution.best_bound
    }

    /// Raw solver output.
    pub fn solution(&self) -> &CpSolution {
        &self.solution
    }

    /// Reads the schedule.
    ///
    /// # Errors
    /// [`ExtractError::NoSolution`] unless the status is `Optimal` or
    /// `Feasible`.
    pub fn extract(&self) -> Result<StochasticSchedule, ExtractError> {
        extract::extract_schedule(
            &self.solution,
            &self.built.arena,
            &self.built.instance,
            self.built.config.epoch,
        )
    }
}
