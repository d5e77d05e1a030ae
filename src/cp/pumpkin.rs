//! Pumpkin-backed solver.
//!
//! Translates a [`CpModel`] into a `pumpkin_solver::Solver` and minimises
//! the objective with linear SAT-UNSAT search under a wall-clock budget.
//!
//! # Translation
//!
//! | Model | Pumpkin |
//! |-------|---------|
//! | integer variable | `new_bounded_integer` |
//! | boolean variable | `new_literal` (0/1 view in linear terms) |
//! | guarded linear | `equals` / `less_than_or_equals` / `greater_than_or_equals`, `implied_by` |
//! | min/max equality | `minimum` / `maximum` |
//! | exactly-one | `equals(Σ lits, 1)` |
//! | cumulative | `cumulative` over shadow starts |
//! | real objective | integer objective variable, weights scaled by [`OBJECTIVE_SCALE`] |
//!
//! Pumpkin's cumulative has no optional tasks. Each optional interval gets
//! a shadow start: equal to the interval start when present, parked in its
//! own slot past the latest end of the constraint otherwise. Parking slots
//! never overlap, so absent intervals consume nothing inside the horizon.
//!
//! # Reference
//! Gocht & Nordström et al., "Pumpkin: a lazy clause generation constraint
//! solver in Rust"

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use pumpkin_solver::constraints::{self, Constraint};
use pumpkin_solver::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_solver::optimisation::OptimisationDirection;
use pumpkin_solver::results::{
    OptimisationResult, ProblemSolution, SatisfactionResult, SolutionReference,
};
use pumpkin_solver::termination::TerminationCondition;
use pumpkin_solver::variables::{AffineView, DomainId, Literal as PumpkinLiteral, TransformableVariable};
use pumpkin_solver::Solver;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::model::{Constraint as ModelConstraint, CumulativeConstraint, LinearConstraint};
use super::{
    CpModel, CpSolution, CpSolver, Literal, SolveStats, SolveStatus, SolverParams, VarId,
    WeightedSum, NEG_INF, POS_INF,
};

/// Objective weights are rounded to multiples of `1 / OBJECTIVE_SCALE`.
pub const OBJECTIVE_SCALE: f64 = 1_000.0;

/// Solver backed by the Pumpkin lazy clause generation engine.
#[derive(Debug, Clone, Default)]
pub struct PumpkinSolver;

impl PumpkinSolver {
    /// Creates the solver.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Error)]
enum TranslateError {
    #[error("value {0} does not fit a 32-bit solver domain")]
    OutOfRange(i64),
    #[error("variable '{0}' is used as a literal but is not boolean")]
    NotBoolean(String),
    #[error("constraints conflict before search")]
    RootConflict,
}

fn narrow(value: i64) -> Result<i32, TranslateError> {
    i32::try_from(value).map_err(|_| TranslateError::OutOfRange(value))
}

#[derive(Debug, Clone, Copy)]
enum Handle {
    Int(DomainId),
    Bool(PumpkinLiteral),
}

impl Handle {
    fn view(self) -> AffineView<DomainId> {
        match self {
            Handle::Int(domain) => domain.scaled(1),
            Handle::Bool(lit) => lit.get_integer_variable(),
        }
    }
}

struct Translation<'m> {
    model: &'m CpModel,
    solver: Solver,
    handles: Vec<Handle>,
    objective: Option<DomainId>,
    shadows: usize,
}

impl<'m> Translation<'m> {
    fn new(model: &'m CpModel) -> Result<Self, TranslateError> {
        let mut solver = Solver::default();
        let mut handles = Vec::with_capacity(model.var_count());
        for (i, var) in model.vars().iter().enumerate() {
            if model.is_bool(VarId(i)) {
                handles.push(Handle::Bool(solver.new_literal()));
            } else if var.min > var.max {
                return Err(TranslateError::RootConflict);
            } else {
                let domain = solver.new_bounded_integer(narrow(var.min)?, narrow(var.max)?);
                handles.push(Handle::Int(domain));
            }
        }

        let mut translation = Self {
            model,
            solver,
            handles,
            objective: None,
            shadows: 0,
        };
        for c in model.linears() {
            translation.add_linear(c)?;
        }
        for c in model.constraints() {
            match c {
                ModelConstraint::MaxEquality { target, vars } => {
                    let tag = translation.solver.new_constraint_tag();
                    let array = translation.views(vars);
                    let rhs = translation.handles[target.index()].view();
                    translation.post(constraints::maximum(array, rhs, tag), None)?;
                }
                ModelConstraint::MinEquality { target, vars } => {
                    let tag = translation.solver.new_constraint_tag();
                    let array = translation.views(vars);
                    let rhs = translation.handles[target.index()].view();
                    translation.post(constraints::minimum(array, rhs, tag), None)?;
                }
                ModelConstraint::ExactlyOne(lits) => {
                    let tag = translation.solver.new_constraint_tag();
                    let terms = lits
                        .iter()
                        .map(|&l| translation.literal(l).map(|l| l.get_integer_variable()))
                        .collect::<Result<Vec<_>, _>>()?;
                    translation.post(constraints::equals(terms, 1, tag), None)?;
                }
                ModelConstraint::Cumulative(c) => translation.add_cumulative(c)?,
            }
        }
        if let Some(objective) = model.objective() {
            translation.objective = Some(translation.add_objective(objective)?);
        }
        Ok(translation)
    }

    fn views(&self, vars: &[VarId]) -> Vec<AffineView<DomainId>> {
        vars.iter().map(|v| self.handles[v.index()].view()).collect()
    }

    fn literal(&self, lit: Literal) -> Result<PumpkinLiteral, TranslateError> {
        match self.handles[lit.var().index()] {
            Handle::Bool(l) if lit.is_negated() => Ok(!l),
            Handle::Bool(l) => Ok(l),
            Handle::Int(_) => Err(TranslateError::NotBoolean(
                self.model.var(lit.var()).name.clone(),
            )),
        }
    }

    fn post<C: Constraint>(
        &mut self,
        constraint: C,
        guard: Option<PumpkinLiteral>,
    ) -> Result<(), TranslateError> {
        let poster = self.solver.add_constraint(constraint);
        let posted = match guard {
            Some(lit) => poster.implied_by(lit),
            None => poster.post(),
        };
        posted.map_err(|_| TranslateError::RootConflict)
    }

    fn forbid(&mut self, lit: PumpkinLiteral) -> Result<(), TranslateError> {
        let tag = self.solver.new_constraint_tag();
        self.solver
            .add_clause([(!lit).get_true_predicate()], tag)
            .map_err(|_| TranslateError::RootConflict)
    }

    /// One literal standing for the conjunction of `enforcement`.
    fn guard(&mut self, enforcement: &[Literal]) -> Result<Option<PumpkinLiteral>, TranslateError> {
        let lits = enforcement
            .iter()
            .map(|&l| self.literal(l))
            .collect::<Result<Vec<_>, _>>()?;
        match lits.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(*single)),
            _ => {
                let all = self.solver.new_literal();
                let tag = self.solver.new_constraint_tag();
                let clause: Vec<_> = lits
                    .iter()
                    .map(|&l| (!l).get_true_predicate())
                    .chain(std::iter::once(all.get_true_predicate()))
                    .collect();
                self.solver
                    .add_clause(clause, tag)
                    .map_err(|_| TranslateError::RootConflict)?;
                Ok(Some(all))
            }
        }
    }

    fn add_linear(&mut self, c: &LinearConstraint) -> Result<(), TranslateError> {
        let guard = self.guard(&c.enforcement)?;
        let offset = c.expr.offset();

        if c.expr.terms().is_empty() {
            if c.lb <= offset && offset <= c.ub {
                return Ok(());
            }
            return match guard {
                Some(lit) => self.forbid(lit),
                None => Err(TranslateError::RootConflict),
            };
        }

        let terms = c
            .expr
            .terms()
            .iter()
            .map(|&(coef, v)| Ok(self.handles[v.index()].view().scaled(narrow(coef)?)))
            .collect::<Result<Vec<_>, TranslateError>>()?;
        let tag = self.solver.new_constraint_tag();

        if c.lb == c.ub {
            let rhs = narrow(c.lb.saturating_sub(offset))?;
            return self.post(constraints::equals(terms, rhs, tag), guard);
        }
        if c.lb != NEG_INF {
            let rhs = narrow(c.lb.saturating_sub(offset))?;
            self.post(constraints::greater_than_or_equals(terms.clone(), rhs, tag), guard)?;
        }
        if c.ub != POS_INF {
            let rhs = narrow(c.ub.saturating_sub(offset))?;
            self.post(constraints::less_than_or_equals(terms, rhs, tag), guard)?;
        }
        Ok(())
    }

    fn add_cumulative(&mut self, c: &CumulativeConstraint) -> Result<(), TranslateError> {
        let model = self.model;
        let mut park = c
            .demands
            .iter()
            .map(|&(id, _)| {
                let iv = model.interval(id);
                model.var(iv.start).max.saturating_add(iv.size)
            })
            .max()
            .unwrap_or(0)
            .max(0);

        let mut starts = Vec::with_capacity(c.demands.len());
        let mut durations = Vec::with_capacity(c.demands.len());
        let mut demands = Vec::with_capacity(c.demands.len());
        for &(id, demand) in &c.demands {
            let iv = model.interval(id);
            if iv.size <= 0 || demand <= 0 {
                continue;
            }
            let start = self.handles[iv.start.index()].view();
            let start = match iv.presence {
                None if demand > c.capacity => return Err(TranslateError::RootConflict),
                None => start,
                Some(p) if demand > c.capacity => {
                    let present = self.literal(p)?;
                    self.forbid(present)?;
                    continue;
                }
                Some(p) => {
                    let present = self.literal(p)?;
                    let slot = narrow(park)?;
                    let lo = narrow(model.var(iv.start).min.min(park))?;
                    let shadow = self.solver.new_bounded_integer(lo, slot);
                    let tag = self.solver.new_constraint_tag();
                    self.post(
                        constraints::equals(vec![shadow.scaled(1), start.scaled(-1)], 0, tag),
                        Some(present),
                    )?;
                    self.post(constraints::equals(vec![shadow.scaled(1)], slot, tag), Some(!present))?;
                    park = park.saturating_add(iv.size);
                    self.shadows += 1;
                    shadow.scaled(1)
                }
            };
            starts.push(start);
            durations.push(narrow(iv.size)?);
            demands.push(narrow(demand)?);
        }

        if starts.is_empty() {
            return Ok(());
        }
        let tag = self.solver.new_constraint_tag();
        let capacity = narrow(c.capacity)?;
        self.post(constraints::cumulative(starts, durations, demands, capacity, tag), None)
    }

    /// `objective_var == Σ round(weight · OBJECTIVE_SCALE) · var`; the offset
    /// stays outside.
    fn add_objective(&mut self, objective: &WeightedSum) -> Result<DomainId, TranslateError> {
        let mut terms = Vec::with_capacity(objective.terms().len() + 1);
        let (mut lo, mut hi) = (0_i64, 0_i64);
        for &(weight, v) in objective.terms() {
            let coef = (weight * OBJECTIVE_SCALE).round() as i64;
            if coef == 0 {
                continue;
            }
            let var = self.model.var(v);
            let a = coef.checked_mul(var.min).ok_or(TranslateError::OutOfRange(var.min))?;
            let b = coef.checked_mul(var.max).ok_or(TranslateError::OutOfRange(var.max))?;
            lo = lo.saturating_add(a.min(b));
            hi = hi.saturating_add(a.max(b));
            terms.push(self.handles[v.index()].view().scaled(narrow(coef)?));
        }
        let objective_var = self.solver.new_bounded_integer(narrow(lo)?, narrow(hi)?);
        terms.push(objective_var.scaled(-1));
        let tag = self.solver.new_constraint_tag();
        self.post(constraints::equals(terms, 0, tag), None)?;
        Ok(objective_var)
    }
}

struct Budget {
    deadline: Option<Instant>,
    stop: Option<Arc<AtomicBool>>,
    halt: Arc<AtomicBool>,
}

impl TerminationCondition for Budget {
    fn should_stop(&mut self) -> bool {
        self.halt.load(Ordering::Relaxed)
            || self.stop.as_ref().is_some_and(|s| s.load(Ordering::Relaxed))
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Counts improving solutions and raises `halt` once `limit` is reached.
fn solution_callback<B>(
    _brancher: &B,
    found: Arc<AtomicU64>,
    limit: Option<u64>,
    halt: Arc<AtomicBool>,
) -> impl Fn(&Solver, SolutionReference, &B) {
    move |_, _, _| {
        let n = found.fetch_add(1, Ordering::Relaxed) + 1;
        if limit.is_some_and(|l| n >= l) {
            halt.store(true, Ordering::Relaxed);
        }
    }
}

fn read_values<S: ProblemSolution>(handles: &[Handle], solution: &S) -> Vec<i64> {
    handles
        .iter()
        .map(|h| solution.get_integer_value(h.view()) as i64)
        .collect()
}

impl CpSolver for PumpkinSolver {
    fn solve(&self, model: &CpModel, params: &SolverParams) -> CpSolution {
        let started = Instant::now();
        let translation = match Translation::new(model) {
            Ok(t) => t,
            Err(TranslateError::RootConflict) => {
                info!(model = model.name(), status = %SolveStatus::Infeasible, "solve finished");
                return CpSolution::without_values(
                    SolveStatus::Infeasible,
                    SolveStats {
                        solutions: 0,
                        wall_time: started.elapsed(),
                    },
                );
            }
            Err(e) => {
                warn!(model = model.name(), error = %e, "model cannot be handed to the solver");
                return CpSolution::without_values(
                    SolveStatus::Unknown,
                    SolveStats {
                        solutions: 0,
                        wall_time: started.elapsed(),
                    },
                );
            }
        };
        debug!(
            model = model.name(),
            vars = translation.handles.len(),
            shadow_starts = translation.shadows,
            "model translated"
        );

        let Translation {
            mut solver,
            handles,
            objective,
            ..
        } = translation;
        let found = Arc::new(AtomicU64::new(0));
        let halt = Arc::new(AtomicBool::new(false));
        let mut termination = Budget {
            deadline: started.checked_add(params.time_budget),
            stop: params.stop.clone(),
            halt: Arc::clone(&halt),
        };
        let mut brancher = solver.default_brancher();

        let (status, values) = match objective {
            Some(objective) => {
                let callback = solution_callback(
                    &brancher,
                    Arc::clone(&found),
                    params.solution_limit,
                    Arc::clone(&halt),
                );
                let result = solver.optimise(
                    &mut brancher,
                    &mut termination,
                    LinearSatUnsat::new(OptimisationDirection::Minimise, objective, callback),
                );
                match result {
                    OptimisationResult::Optimal(solution) => {
                        (SolveStatus::Optimal, Some(read_values(&handles, &solution)))
                    }
                    OptimisationResult::Satisfiable(solution) => {
                        (SolveStatus::Feasible, Some(read_values(&handles, &solution)))
                    }
                    OptimisationResult::Unsatisfiable => (SolveStatus::Infeasible, None),
                    OptimisationResult::Unknown => (SolveStatus::Unknown, None),
                }
            }
            None => match solver.satisfy(&mut brancher, &mut termination) {
                SatisfactionResult::Satisfiable(satisfiable) => {
                    found.fetch_add(1, Ordering::Relaxed);
                    let values = read_values(&handles, &satisfiable.solution());
                    (SolveStatus::Optimal, Some(values))
                }
                SatisfactionResult::Unsatisfiable(..) => (SolveStatus::Infeasible, None),
                SatisfactionResult::Unknown(..) => (SolveStatus::Unknown, None),
            },
        };

        let stats = SolveStats {
            solutions: found.load(Ordering::Relaxed),
            wall_time: started.elapsed(),
        };
        let Some(values) = values else {
            info!(model = model.name(), %status, elapsed_ms = stats.wall_time.as_millis() as u64, "solve finished");
            return CpSolution::without_values(status, stats);
        };

        let objective = model.objective().map_or(0.0, |o| o.evaluate(&values));
        let best_bound = match (status, model.objective()) {
            (SolveStatus::Optimal, _) | (_, None) => objective,
            (_, Some(o)) => {
                let lbs: Vec<i64> = model.vars().iter().map(|v| v.min).collect();
                let ubs: Vec<i64> = model.vars().iter().map(|v| v.max).collect();
                o.lower_bound(&lbs, &ubs).min(objective)
            }
        };
        info!(
            model = model.name(),
            %status,
            objective,
            solutions = stats.solutions,
            elapsed_ms = stats.wall_time.as_millis() as u64,
            "solve finished"
        );

        let mut solution = CpSolution::from_values(status, values, objective, best_bound);
        if model.objective().is_none() {
            solution.objective = None;
            solution.best_bound = None;
        }
        solution.stats = stats;
        solution
    }
}
