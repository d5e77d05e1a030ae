//! Decision variable builder.
//!
//! Allocates every time variable and interval of the formulation into a
//! scenario-indexed arena: `scenarios[s].projects[p].tasks[k]` holds the
//! `k`-th task of project `p` present in scenario `s`, with one option slot
//! per candidate resource. Prior commitments become fixed unit-length
//! intervals registered next to the task intervals.

use tracing::debug;

use crate::cp::{BoolVar, CpModel, IntervalId, VarId};
use crate::models::{Instance, RequirementTable, ScenarioSet};

/// One resource option of a task.
#[derive(Debug, Clone)]
pub(crate) struct OptionSlot {
    /// Index into `Instance::resources`.
    pub resource: usize,
    pub duration: i64,
    pub units: i64,
    /// `None` for the single mandatory option.
    pub active: Option<BoolVar>,
}

#[derive(Debug, Clone)]
pub(crate) struct TaskSlot {
    pub name: String,
    pub start: VarId,
    pub end: VarId,
    pub options: Vec<OptionSlot>,
}

#[derive(Debug, Clone)]
pub(crate) struct ProjectSlot {
    /// Tasks present in the scenario, in sequence order.
    pub tasks: Vec<TaskSlot>,
    pub earliness: VarId,
    pub tardiness: VarId,
}

impl ProjectSlot {
    /// End variable of the last task.
    pub fn end(&self) -> Option<VarId> {
        self.tasks.last().map(|t| t.end)
    }

    pub fn task(&self, name: &str) -> Option<&TaskSlot> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ScenarioSlot {
    pub name: String,
    pub probability: f64,
    /// Indexed like `Instance::projects`.
    pub projects: Vec<ProjectSlot>,
}

/// Non-anticipativity variables of a task shared by two scenarios.
#[derive(Debug, Clone)]
pub(crate) struct CouplingSlot {
    pub project: usize,
    pub task: String,
    pub scenarios: (usize, usize),
    pub min_start: VarId,
    pub precedes: BoolVar,
}

/// All formulation variables.
#[derive(Debug, Clone)]
pub(crate) struct VariableArena {
    pub horizon: i64,
    pub scenarios: Vec<ScenarioSlot>,
    /// `needs[scenario][resource]`: intervals and their units.
    pub needs: Vec<Vec<Vec<(IntervalId, i64)>>>,
    /// End variables of every occurrence of the information task.
    pub revelation: Vec<VarId>,
    pub urt: Option<VarId>,
    pub couplings: Vec<CouplingSlot>,
}

impl VariableArena {
    /// Every option slot, with its scenario and project index.
    pub fn options(&self) -> impl Iterator<Item = (usize, usize, &TaskSlot, &OptionSlot)> {
        self.scenarios.iter().enumerate().flat_map(|(si, s)| {
            s.projects.iter().enumerate().flat_map(move |(pi, p)| {
                p.tasks
                    .iter()
                    .flat_map(move |t| t.options.iter().map(move |o| (si, pi, t, o)))
            })
        })
    }
}

/// Upper bound on every time variable.
///
/// Longest scenario (sum over present tasks of their longest option) plus
/// the longest prior commitment window.
pub(crate) fn derive_horizon(
    instance: &Instance,
    table: &RequirementTable,
    scenarios: &ScenarioSet,
) -> i64 {
    let mut longest = 0;
    for scenario in &scenarios.scenarios {
        let mut total = 0;
        for project in &instance.projects {
            for task in project.tasks.iter().filter(|t| scenario.includes(&project.id, t)) {
                total += table.max_duration(&project.id, task);
            }
        }
        longest = longest.max(total);
    }
    longest + instance.commitment_window()
}

/// Creates all start/end variables, option intervals, earliness/tardiness
/// variables, commitment intervals and the revelation variable.
pub(crate) fn build_variables(
    model: &mut CpModel,
    instance: &Instance,
    table: &RequirementTable,
    scenarios: &ScenarioSet,
    horizon: i64,
) -> VariableArena {
    let mut needs = vec![vec![Vec::new(); instance.resources.len()]; scenarios.len()];
    let urt = scenarios
        .info_task
        .as_ref()
        .map(|_| model.new_int_var(0, horizon + 1, "uncertainty_resolution_time"));
    let mut revelation = Vec::new();
    let mut slots = Vec::with_capacity(scenarios.len());

    for (si, scenario) in scenarios.scenarios.iter().enumerate() {
        let mut projects = Vec::with_capacity(instance.projects.len());
        for project in &instance.projects {
            let mut tasks = Vec::new();
            for task in project.tasks.iter().filter(|t| scenario.includes(&project.id, t)) {
                let label = format!("{}_{}_{}", scenario.name, project.id, task);
                let start = model.new_int_var(0, horizon, format!("{label}_start"));
                let end = model.new_int_var(0, horizon, format!("{label}_end"));

                let candidates = table.options(&project.id, task);
                let choice = candidates.len() > 1;
                let mut options = Vec::with_capacity(candidates.len());
                for option in candidates {
                    let Some(resource) = instance.resource_index(&option.resource) else {
                        continue;
                    };
                    let name = format!("{label}_{}", option.resource);
                    let (interval, active) = if choice {
                        let active = model.new_bool_var(format!("{name}_active"));
                        let iv = model.new_optional_interval(
                            start,
                            option.duration,
                            end,
                            active,
                            format!("{name}_interval"),
                        );
                        (iv, Some(active))
                    } else {
                        let iv =
                            model.new_interval(start, option.duration, end, format!("{name}_interval"));
                        (iv, None)
                    };
                    needs[si][resource].push((interval, option.units));
                    options.push(OptionSlot {
                        resource,
                        duration: option.duration,
                        units: option.units,
                        active,
                    });
                }

                if scenarios.is_info_task(&project.id, task) {
                    revelation.push(end);
                }
                tasks.push(TaskSlot {
                    name: task.clone(),
                    start,
                    end,
                    options,
                });
            }

            let label = format!("{}_{}", scenario.name, project.id);
            let earliness =
                model.new_int_var(0, project.deadline + horizon, format!("{label}_earliness"));
            let tardiness = model.new_int_var(0, horizon, format!("{label}_tardiness"));
            projects.push(ProjectSlot {
                tasks,
                earliness,
                tardiness,
            });
        }
        slots.push(ScenarioSlot {
            name: scenario.name.clone(),
            probability: scenario.probability,
            projects,
        });
    }

    let mut commitments = 0usize;
    for (si, scenario) in scenarios.scenarios.iter().enumerate() {
        for (ri, resource) in instance.resources.iter().enumerate() {
            for (day, units) in resource.occupancy().into_iter().enumerate() {
                if units <= 0 {
                    continue;
                }
                let iv = model.new_fixed_interval(
                    day as i64,
                    1,
                    format!("occupied_{day}_{}_{}", scenario.name, resource.id),
                );
                needs[si][ri].push((iv, units));
                commitments += 1;
            }
        }
    }

    debug!(
        scenarios = slots.len(),
        vars = model.var_count(),
        intervals = model.interval_count(),
        commitments,
        horizon,
        "decision variables created"
    );

    VariableArena {
        horizon,
        scenarios: slots,
        needs,
        revelation,
        urt,
        couplings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Project, Requirement, Resource, Scenario, TaskKey};

    fn instance() -> Instance {
        Instance::new()
            .with_resource(Resource::new("DEV").with_capacity(2).with_busy_unit(0, 2))
            .with_resource(Resource::new("EXT"))
            .with_project(
                Project::new("P1")
                    .with_deadline(8)
                    .with_delay_penalty(3.0)
                    .with_tasks(["a", "b", "c"]),
            )
            .with_requirement(Requirement::new("P1", "a", "DEV", 2, 1))
            .with_requirement(Requirement::new("P1", "b", "DEV", 3, 2))
            .with_requirement(Requirement::new("P1", "b", "EXT", 4, 1))
            .with_requirement(Requirement::new("P1", "c", "EXT", 1, 1))
    }

    #[test]
    fn test_horizon_uses_longest_option_and_window() {
        let inst = instance();
        let table = inst.requirement_table();
        // 2 + 4 + 1 + window 2
        assert_eq!(derive_horizon(&inst, &table, &ScenarioSet::single()), 9);

        let set = ScenarioSet::bypass(vec![TaskKey::new("P1", "b")], 0.5, TaskKey::new("P1", "a"));
        assert_eq!(derive_horizon(&inst, &table, &set), 9);

        let set = ScenarioSet::new(vec![Scenario::new("x", 1.0).omitting("P1", "b")]);
        assert_eq!(derive_horizon(&inst, &table, &set), 5);
    }

    #[test]
    fn test_arena_layout() {
        let inst = instance();
        let table = inst.requirement_table();
        let set = ScenarioSet::bypass(vec![TaskKey::new("P1", "b")], 0.5, TaskKey::new("P1", "a"));
        let mut model = CpModel::new("t");
        let arena = build_variables(&mut model, &inst, &table, &set, 9);

        assert_eq!(arena.scenarios.len(), 2);
        let bau = &arena.scenarios[0].projects[0];
        let bypass = &arena.scenarios[1].projects[0];
        assert_eq!(bau.tasks.len(), 3);
        assert_eq!(bypass.tasks.len(), 2);
        assert!(bypass.task("b").is_none());
        assert_eq!(bypass.tasks[1].name, "c");

        let b = bau.task("b").unwrap();
        assert_eq!(b.options.len(), 2);
        assert!(b.options.iter().all(|o| o.active.is_some()));
        assert!(bau.task("a").unwrap().options[0].active.is_none());

        // info task end in both scenarios
        assert_eq!(arena.revelation.len(), 2);
        assert!(arena.urt.is_some());
        assert_eq!(model.var(arena.urt.unwrap()).max, 10);
        assert_eq!(model.var(bau.earliness).max, 17);
    }

    #[test]
    fn test_needs_include_commitments() {
        let inst = instance();
        let table = inst.requirement_table();
        let mut model = CpModel::new("t");
        let arena = build_variables(&mut model, &inst, &table, &ScenarioSet::single(), 9);

        // DEV: a, b(DEV) and two committed days
        assert_eq!(arena.needs[0][0].len(), 4);
        // EXT: b(EXT), c
        assert_eq!(arena.needs[0][1].len(), 2);
        assert!(arena.urt.is_none());
        assert!(arena.revelation.is_empty());
        assert_eq!(arena.options().count(), 4);
    }
}
