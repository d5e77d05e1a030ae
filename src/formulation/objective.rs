//! Objective assembler.
//!
//! Expected cost over scenarios:
//!
//! ```text
//! Σ_s p_s · Σ_options cost_per_day · units · duration · active
//! + Σ_s p_s · Σ_projects (delay_penalty · tardiness − early_bonus · earliness)
//! ```
//!
//! with `deadline + tardiness − earliness == project_end` per (scenario,
//! project). Mandatory options are always active, so their cost is a
//! constant offset.

use tracing::debug;

use super::variables::VariableArena;
use crate::cp::{CpModel, LinearExpr, WeightedSum};
use crate::models::Instance;

/// Ties earliness and tardiness to each project's end.
pub(crate) fn add_deadline_identity(model: &mut CpModel, arena: &VariableArena, instance: &Instance) {
    for scenario in &arena.scenarios {
        for (project, slot) in instance.projects.iter().zip(&scenario.projects) {
            let Some(end) = slot.end() else {
                continue;
            };
            let deviation = LinearExpr::from(slot.tardiness)
                .term(-1, slot.earliness)
                .plus(project.deadline);
            model.add_eq(deviation, end);
        }
    }
}

/// The expected-cost objective.
pub(crate) fn expected_cost(arena: &VariableArena, instance: &Instance) -> WeightedSum {
    let mut objective = WeightedSum::new();

    for (si, _, _, option) in arena.options() {
        let p = arena.scenarios[si].probability;
        let cost = instance.resources[option.resource].cost_per_day
            * option.units as f64
            * option.duration as f64;
        match option.active {
            Some(active) => objective.add_term(p * cost, active.var()),
            None => objective.add_offset(p * cost),
        }
    }

    for scenario in &arena.scenarios {
        let p = scenario.probability;
        for (project, slot) in instance.projects.iter().zip(&scenario.projects) {
            objective.add_term(p * project.delay_penalty, slot.tardiness);
            objective.add_term(-p * project.early_bonus, slot.earliness);
        }
    }
    objective
}

/// Adds the deadline identity and sets the objective.
pub(crate) fn add_objective(model: &mut CpModel, arena: &VariableArena, instance: &Instance) {
    add_deadline_identity(model, arena, instance);
    let objective = expected_cost(arena, instance);
    debug!(
        terms = objective.terms().len(),
        offset = objective.offset(),
        "objective assembled"
    );
    model.minimize(objective);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::variables::build_variables;
    use crate::models::{Project, Requirement, Resource, Scenario, ScenarioSet};

    fn instance() -> Instance {
        Instance::new()
            .with_resource(Resource::new("DEV").with_cost(2.0))
            .with_resource(Resource::new("EXT").with_cost(5.0))
            .with_project(
                Project::new("P")
                    .with_deadline(4)
                    .with_delay_penalty(3.0)
                    .with_early_bonus(1.0)
                    .with_tasks(["a", "b"]),
            )
            .with_requirement(Requirement::new("P", "a", "DEV", 2, 1))
            .with_requirement(Requirement::new("P", "b", "DEV", 3, 2))
            .with_requirement(Requirement::new("P", "b", "EXT", 1, 1))
    }

    #[test]
    fn test_weights() {
        let inst = instance();
        let set = ScenarioSet::new(vec![
            Scenario::new("x", 0.25),
            Scenario::new("y", 0.75).omitting("P", "a"),
        ]);
        let mut model = CpModel::new("t");
        let arena = build_variables(&mut model, &inst, &inst.requirement_table(), &set, 10);
        let obj = expected_cost(&arena, &inst);

        // mandatory a (cost 2·1·2 = 4) only in x
        assert!((obj.offset() - 0.25 * 4.0).abs() < 1e-12);

        let x = &arena.scenarios[0].projects[0];
        let weight = |v| {
            obj.terms()
                .iter()
                .find(|&&(_, var)| var == v)
                .map(|t| t.0)
                .unwrap()
        };
        assert!((weight(x.tardiness) - 0.75).abs() < 1e-12);
        assert!((weight(x.earliness) + 0.25).abs() < 1e-12);

        let y = &arena.scenarios[1].projects[0];
        let b_dev = y.tasks[0].options[0].active.unwrap();
        let b_ext = y.tasks[0].options[1].active.unwrap();
        // DEV: 2·2·3 = 12, EXT: 5·1·1 = 5
        assert!((weight(b_dev.var()) - 0.75 * 12.0).abs() < 1e-12);
        assert!((weight(b_ext.var()) - 0.75 * 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_deadline_identity_per_scenario_project() {
        let inst = instance();
        let mut model = CpModel::new("t");
        let arena = build_variables(&mut model, &inst, &inst.requirement_table(), &ScenarioSet::single(), 10);
        let before = model.linears().len();
        add_objective(&mut model, &arena, &inst);
        assert_eq!(model.linears().len(), before + 1);

        let c = &model.linears()[before];
        assert_eq!((c.lb, c.ub), (0, 0));
        assert_eq!(c.expr.offset(), 4);
        assert!(model.objective().is_some());
    }
}
