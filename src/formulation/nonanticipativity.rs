//! Non-anticipativity enforcer.
//!
//! The revelation instant `urt` equals the end of the information task in
//! every scenario where it occurs, written as `urt == max(ends)` and
//! `urt == min(ends)` so that several occurrences must agree.
//!
//! For every pair of scenarios and every task present in both, a reified
//! indicator `precedes <=> min(start_a, start_b) <= urt` is introduced;
//! when it holds, both scenarios must run the task identically. Tasks are
//! paired by identity, so a task omitted from one scenario is never
//! coupled and does not shift the pairing of the tasks after it.
//!
//! # Reference
//! Goel & Grossmann (2006), "A class of stochastic programs with decision
//! dependent uncertainty", Math. Programming 108

use tracing::debug;

use super::variables::{CouplingSlot, VariableArena};
use crate::cp::{BoolVar, CpModel, LinearExpr};

/// Creates a boolean that is true exactly when `value <= threshold`.
///
/// Adds `value <= threshold` guarded by the boolean and
/// `value > threshold` guarded by its negation.
///
/// # Example
/// ```
/// use u_stoch_schedule::cp::{PumpkinSolver, CpModel, CpSolver, SolverParams};
/// use u_stoch_schedule::formulation::reify_less_or_equal;
///
/// let mut model = CpModel::new("reify");
/// let x = model.new_int_var(4, 4, "x");
/// let b = reify_less_or_equal(&mut model, x, 3_i64, "x_le_3");
/// let solution = PumpkinSolver::new().solve(&model, &SolverParams::default());
/// assert_eq!(solution.bool_value(b), Some(false));
/// ```
pub fn reify_less_or_equal(
    model: &mut CpModel,
    value: impl Into<LinearExpr>,
    threshold: impl Into<LinearExpr>,
    name: impl Into<String>,
) -> BoolVar {
    let value = value.into();
    let threshold = threshold.into();
    let b = model.new_bool_var(name);
    model
        .add_le(value.clone(), threshold.clone())
        .only_enforce_if(b);
    model.add_gt(value, threshold).only_enforce_if(b.not());
    b
}

/// Binds `urt` to the information task ends.
pub(crate) fn add_revelation_binding(model: &mut CpModel, arena: &VariableArena) {
    let Some(urt) = arena.urt else {
        return;
    };
    if arena.revelation.is_empty() {
        return;
    }
    model.add_max_equality(urt, arena.revelation.clone());
    model.add_min_equality(urt, arena.revelation.clone());
}

/// Couples every task shared by two scenarios through `urt`.
///
/// Returns the number of coupled task pairs; none without an information
/// task.
pub(crate) fn add_coupling(model: &mut CpModel, arena: &mut VariableArena) -> usize {
    let Some(urt) = arena.urt else {
        return 0;
    };
    let horizon = arena.horizon;
    let mut couplings = Vec::new();

    for a in 0..arena.scenarios.len() {
        for b in a + 1..arena.scenarios.len() {
            let (sa, sb) = (&arena.scenarios[a], &arena.scenarios[b]);
            for (pi, (pa, pb)) in sa.projects.iter().zip(&sb.projects).enumerate() {
                for ta in &pa.tasks {
                    let Some(tb) = pb.task(&ta.name) else {
                        continue;
                    };
                    let label = format!("{}_{}_{}_{}", sa.name, sb.name, pi, ta.name);
                    let min_start =
                        model.new_int_var(0, horizon + 1, format!("{label}_min_start"));
                    model.add_min_equality(min_start, vec![ta.start, tb.start]);
                    let precedes =
                        reify_less_or_equal(model, min_start, urt, format!("{label}_precedes"));
                    model.add_eq(ta.start, tb.start).only_enforce_if(precedes);
                    model.add_eq(ta.end, tb.end).only_enforce_if(precedes);
                    couplings.push(CouplingSlot {
                        project: pi,
                        task: ta.name.clone(),
                        scenarios: (a, b),
                        min_start,
                        precedes,
                    });
                }
            }
        }
    }

    let added = couplings.len();
    arena.couplings = couplings;
    debug!(pairs = added, "non-anticipativity added");
    added
}
