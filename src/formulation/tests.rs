use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::cp::SolverParams;
use crate::error::ConfigError;
use crate::logging;
use crate::models::{
    Project, Requirement, Resource, Scenario, BASE_SCENARIO, BAU_SCENARIO,
    BYPASS_SCENARIO,
};
use crate::validation::ValidationErrorKind;

fn solve(instance: &Instance, config: ModelConfig) -> StochasticSchedule {
    let built = StochasticModelBuilder::new(instance, config)
        .build()
        .expect("valid instance");
    built.solve().extract().expect("solution")
}

fn starts(schedule: &StochasticSchedule, scenario: &str, project: &str) -> Vec<(String, i64, i64)> {
    schedule
        .project_records(scenario, project)
        .into_iter()
        .map(|r| (r.task.clone(), r.start, r.end))
        .collect()
}

fn chain(tasks: &[(&str, i64)]) -> Instance {
    let mut project = Project::new("P")
        .with_deadline(10)
        .with_delay_penalty(2.0)
        .with_early_bonus(1.0);
    let mut inst = Instance::new().with_resource(Resource::new("R"));
    for &(t, d) in tasks {
        project = project.with_task(t);
        inst = inst.with_requirement(Requirement::new("P", t, "R", d, 1));
    }
    inst.with_project(project)
}

/// Checks every structural property of an extracted schedule against the
/// instance, independently of the model.
fn check_schedule(inst: &Instance, set: &ScenarioSet, schedule: &StochasticSchedule) {
    let table = inst.requirement_table();

    for scenario in &set.scenarios {
        let s = scenario.name.as_str();
        for project in &inst.projects {
            let present: Vec<&String> = project
                .tasks
                .iter()
                .filter(|t| scenario.includes(&project.id, t))
                .collect();

            let mut prev_end = 0;
            for task in &present {
                // exactly one active option
                let active: Vec<_> = schedule
                    .active_records()
                    .filter(|r| r.scenario == s && r.project == project.id && &&r.task == task)
                    .collect();
                assert_eq!(active.len(), 1, "{s}/{}/{task}", project.id);
                let r = active[0];

                let option = table
                    .options(&project.id, task)
                    .iter()
                    .find(|o| o.resource == r.resource)
                    .unwrap();
                assert_eq!(r.duration(), option.duration);
                assert!(r.start >= prev_end, "precedence {s}/{}/{task}", project.id);
                assert!(r.end <= schedule.horizon);
                prev_end = r.end;
            }

            // omitted tasks have no record at all
            for task in project.tasks.iter().filter(|t| !scenario.includes(&project.id, t)) {
                assert!(!schedule
                    .records
                    .iter()
                    .any(|r| r.scenario == s && r.project == project.id && &r.task == task));
            }

            let c = schedule.completion(s, &project.id).unwrap();
            assert_eq!(c.completion, prev_end);
            assert_eq!(c.completion - project.deadline, c.tardiness - c.earliness);
            assert!(c.earliness >= 0 && c.tardiness >= 0);
        }

        // capacity, recomputed from the records
        let days = schedule.horizon.max(inst.commitment_window());
        for resource in &inst.resources {
            for day in 0..days {
                let load: i64 = schedule
                    .active_records()
                    .filter(|r| r.scenario == s && r.resource == resource.id && r.covers(day))
                    .map(|r| r.units)
                    .sum();
                assert!(
                    load + resource.committed_at(day) <= resource.capacity,
                    "{s}/{} over capacity at day {day}",
                    resource.id
                );
            }
            assert!(schedule.usage(s, &resource.id).unwrap().within_capacity());
        }
    }

    // revelation instant
    match &set.info_task {
        None => assert!(schedule.urt.is_none()),
        Some(info) => {
            let urt = schedule.urt.unwrap();
            for scenario in set.scenarios.iter().filter(|s| s.includes(&info.project, &info.task)) {
                let r = schedule
                    .record(&scenario.name, &info.project, &info.task)
                    .unwrap();
                assert_eq!(r.end, urt);
            }
        }
    }

    // non-anticipativity
    for c in &schedule.couplings {
        let a = schedule.record(&c.scenarios.0, &c.project, &c.task).unwrap();
        let b = schedule.record(&c.scenarios.1, &c.project, &c.task).unwrap();
        assert_eq!(c.min_start, a.start.min(b.start));
        let urt = schedule.urt.unwrap();
        assert_eq!(c.coupled, c.min_start <= urt);
        if c.coupled {
            assert_eq!((a.start, a.end), (b.start, b.end), "{}/{}", c.project, c.task);
        }
    }
}

fn check_optimal_exclusivity(schedule: &StochasticSchedule) {
    for c in &schedule.completions {
        assert!(c.earliness == 0 || c.tardiness == 0, "{c:?}");
    }
}

#[test]
fn test_single_chain_runs_back_to_back() {
    logging::init_test();
    let inst = chain(&[("t1", 2), ("t2", 3)]);
    let schedule = solve(&inst, ModelConfig::default());

    assert_eq!(schedule.status, SolveStatus::Optimal);
    assert_eq!(
        starts(&schedule, BASE_SCENARIO, "P"),
        vec![("t1".to_string(), 0, 2), ("t2".to_string(), 2, 5)]
    );
    let c = schedule.completion(BASE_SCENARIO, "P").unwrap();
    assert_eq!((c.completion, c.earliness, c.tardiness), (5, 5, 0));
    assert!((schedule.objective + 5.0).abs() < 1e-9);
    assert!(schedule.urt.is_none());
    assert!(schedule.couplings.is_empty());
    check_schedule(&inst, &ScenarioSet::single(), &schedule);
}

#[test]
fn test_shared_resource_serializes_projects() {
    let inst = Instance::new()
        .with_resource(Resource::new("R"))
        .with_project(
            Project::new("P1")
                .with_deadline(3)
                .with_delay_penalty(2.0)
                .with_early_bonus(1.0)
                .with_task("t"),
        )
        .with_project(
            Project::new("P2")
                .with_deadline(3)
                .with_delay_penalty(2.0)
                .with_early_bonus(1.0)
                .with_task("t"),
        )
        .with_requirement(Requirement::new("P1", "t", "R", 3, 1))
        .with_requirement(Requirement::new("P2", "t", "R", 3, 1));
    let schedule = solve(&inst, ModelConfig::default());

    assert_eq!(schedule.status, SolveStatus::Optimal);
    let a = schedule.record(BASE_SCENARIO, "P1", "t").unwrap();
    let b = schedule.record(BASE_SCENARIO, "P2", "t").unwrap();
    assert!(a.end <= b.start || b.end <= a.start);
    assert_eq!(schedule.makespan(BASE_SCENARIO), 6);
    // one project on time, the other three days late
    assert!((schedule.objective - 6.0).abs() < 1e-9);
    assert_eq!(schedule.usage(BASE_SCENARIO, "R").unwrap().peak(), 1);
    check_schedule(&inst, &ScenarioSet::single(), &schedule);
    check_optimal_exclusivity(&schedule);
}

fn bypass_instance() -> Instance {
    Instance::new()
        .with_resource(Resource::new("R"))
        .with_project(
            Project::new("P")
                .with_deadline(6)
                .with_delay_penalty(10.0)
                .with_early_bonus(1.0)
                .with_tasks(["A", "B", "C"]),
        )
        .with_requirement(Requirement::new("P", "A", "R", 2, 1))
        .with_requirement(Requirement::new("P", "B", "R", 3, 1))
        .with_requirement(Requirement::new("P", "C", "R", 1, 1))
}

fn bypass_config() -> ModelConfig {
    ModelConfig::new()
        .with_horizon_override(6)
        .with_bypass("P", "B")
        .with_bypass_probability(0.5)
        .with_info_task("P", "A")
}

#[test]
fn test_bypass_waits_for_revelation() {
    logging::init_test();
    let inst = bypass_instance();
    let config = bypass_config();
    let set = config.scenario_set();
    let built = StochasticModelBuilder::new(&inst, config).build().unwrap();
    assert_eq!(built.horizon(), 6);
    assert_eq!(built.scenario_names(), vec![BAU_SCENARIO, BYPASS_SCENARIO]);
    // A and C are in both scenarios
    assert_eq!(built.coupling_count(), 2);

    let solved = built.solve();
    assert_eq!(solved.status(), SolveStatus::Optimal);
    let schedule = solved.extract().unwrap();

    assert_eq!(
        starts(&schedule, BAU_SCENARIO, "P"),
        vec![
            ("A".to_string(), 0, 2),
            ("B".to_string(), 2, 5),
            ("C".to_string(), 5, 6)
        ]
    );
    assert_eq!(schedule.urt, Some(2));

    let bau_a = schedule.record(BAU_SCENARIO, "P", "A").unwrap();
    let bypass_a = schedule.record(BYPASS_SCENARIO, "P", "A").unwrap();
    assert_eq!((bau_a.start, bau_a.end), (bypass_a.start, bypass_a.end));

    // C may only diverge once A has revealed the scenario
    let bypass_c = schedule.record(BYPASS_SCENARIO, "P", "C").unwrap();
    assert_eq!(bypass_c.start, 3);
    assert!(schedule.record(BYPASS_SCENARIO, "P", "B").is_none());

    let coupled: HashMap<&str, bool> = schedule
        .couplings
        .iter()
        .map(|c| (c.task.as_str(), c.coupled))
        .collect();
    assert!(coupled["A"]);
    assert!(!coupled["C"]);

    // BAU on time, bypass two days early at probability 0.5
    assert!((schedule.objective + 1.0).abs() < 1e-9);
    check_schedule(&inst, &set, &schedule);
    check_optimal_exclusivity(&schedule);
}

#[test]
fn test_infeasible_deadline_under_tight_horizon() {
    let inst = Instance::new()
        .with_resource(Resource::new("R"))
        .with_project(
            Project::new("P")
                .with_deadline(0)
                .with_delay_penalty(1.0)
                .with_task("t"),
        )
        .with_requirement(Requirement::new("P", "t", "R", 5, 1));
    let config = ModelConfig::new().with_horizon_override(3);
    let built = StochasticModelBuilder::new(&inst, config).build().unwrap();
    let solved = built.solve();

    assert_eq!(solved.status(), SolveStatus::Infeasible);
    assert!(solved.objective().is_none());
    assert!(matches!(
        solved.extract(),
        Err(ExtractError::NoSolution(SolveStatus::Infeasible))
    ));
}

#[test]
fn test_invalid_input_is_rejected_before_modeling() {
    let mut inst = chain(&[("t1", 2)]);
    inst.projects[0].early_bonus = 3.0;
    let config = ModelConfig::new().with_horizon_override(-1);
    let err = StochasticModelBuilder::new(&inst, config).build().unwrap_err();

    let kinds: Vec<_> = err.errors().iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&ValidationErrorKind::InvalidPenalty));
    assert!(kinds.contains(&ValidationErrorKind::InvalidHorizon));
}

#[test]
fn test_invalid_config_is_rejected_before_modeling() {
    let inst = chain(&[("t1", 2), ("t2", 1)]);

    // a bypass with nothing to reveal it would collapse to one scenario
    let orphan_bypass = ModelConfig::new().with_bypass("P", "t2");
    let err = StochasticModelBuilder::new(&inst, orphan_bypass).build().unwrap_err();
    assert!(matches!(err, BuildError::Config(ConfigError::Invalid(_))));
    assert!(err.to_string().contains("info_task"));

    for budget in [-5.0, f64::NAN, f64::INFINITY] {
        let mut config = ModelConfig::new();
        config.time_budget_secs = budget;
        let err = StochasticModelBuilder::new(&inst, config).build().unwrap_err();
        assert!(matches!(err, BuildError::Config(ConfigError::Invalid(_))), "{budget}");
    }

    let mut config = ModelConfig::new();
    config.bypass_probability = 1.5;
    assert!(StochasticModelBuilder::new(&inst, config).build().is_err());
}

#[test]
fn test_unknown_info_task_is_rejected() {
    let inst = chain(&[("t1", 2)]);
    let config = ModelConfig::new().with_info_task("P", "missing");
    assert!(StochasticModelBuilder::new(&inst, config).build().is_err());
}

fn two_vendor_instance(dev: Resource) -> Instance {
    Instance::new()
        .with_resource(dev)
        .with_resource(Resource::new("EXT").with_cost(10.0))
        .with_project(
            Project::new("P")
                .with_deadline(10)
                .with_delay_penalty(5.0)
                .with_early_bonus(1.0)
                .with_task("build"),
        )
        .with_requirement(Requirement::new("P", "build", "DEV", 4, 1))
        .with_requirement(Requirement::new("P", "build", "EXT", 2, 1))
}

#[test]
fn test_cheapest_option_is_chosen() {
    let inst = two_vendor_instance(Resource::new("DEV").with_cost(1.0));
    let schedule = solve(&inst, ModelConfig::default());

    assert_eq!(schedule.status, SolveStatus::Optimal);
    let r = schedule.record(BASE_SCENARIO, "P", "build").unwrap();
    assert_eq!((r.resource.as_str(), r.start, r.end), ("DEV", 0, 4));
    // inactive EXT record kept for reporting
    assert_eq!(schedule.record_count(), 2);
    // cost 4, six days early
    assert!((schedule.objective + 2.0).abs() < 1e-9);
    check_schedule(&inst, &ScenarioSet::single(), &schedule);
}

#[test]
fn test_prior_commitment_pushes_to_other_option() {
    let dev = Resource::new("DEV").with_cost(1.0).with_state0(vec![1; 8]);
    let inst = two_vendor_instance(dev);
    let schedule = solve(&inst, ModelConfig::default());

    assert_eq!(schedule.status, SolveStatus::Optimal);
    // DEV after day 8 costs 4 + 2·5 = 14, EXT now costs 20 − 8 = 12
    let r = schedule.record(BASE_SCENARIO, "P", "build").unwrap();
    assert_eq!((r.resource.as_str(), r.start, r.end), ("EXT", 0, 2));
    assert!((schedule.objective - 12.0).abs() < 1e-9);

    let usage = schedule.usage(BASE_SCENARIO, "DEV").unwrap();
    assert_eq!(usage.committed[..8], [1; 8]);
    assert_eq!(usage.scheduled_unit_days(), 0);
    check_schedule(&inst, &ScenarioSet::single(), &schedule);
}

#[test]
fn test_dates_follow_epoch() {
    let inst = chain(&[("t1", 2), ("t2", 3)]);
    let epoch = NaiveDate::from_ymd_opt(2023, 4, 1).unwrap();
    let schedule = solve(&inst, ModelConfig::new().with_epoch(epoch));

    let r = schedule.record(BASE_SCENARIO, "P", "t2").unwrap();
    assert_eq!(r.start_date, NaiveDate::from_ymd_opt(2023, 4, 3).unwrap());
    assert_eq!(r.end_date, NaiveDate::from_ymd_opt(2023, 4, 6).unwrap());
}

#[test]
fn test_repeated_solves_agree() {
    let inst = bypass_instance();
    let built = StochasticModelBuilder::new(&inst, bypass_config()).build().unwrap();
    let first = built.solve().extract().unwrap();
    let second = built.solve().extract().unwrap();
    assert_eq!(first.records, second.records);
    assert_eq!(first.objective, second.objective);

    let rebuilt = StochasticModelBuilder::new(&inst, bypass_config()).build().unwrap();
    assert_eq!(rebuilt.model().var_count(), built.model().var_count());
    let third = rebuilt.solve().extract().unwrap();
    assert_eq!(first.records, third.records);
}

#[test]
fn test_explicit_scenarios_without_info_task() {
    // independent scenarios: no revelation, nothing coupled
    let inst = bypass_instance();
    let set = ScenarioSet::new(vec![
        Scenario::new("long", 0.5),
        Scenario::new("short", 0.5).omitting("P", "B"),
    ]);
    let built = StochasticModelBuilder::new(&inst, ModelConfig::default())
        .with_scenarios(set.clone())
        .build()
        .unwrap();
    assert_eq!(built.coupling_count(), 0);

    let schedule = built.solve().extract().unwrap();
    assert!(schedule.urt.is_none());
    assert_eq!(schedule.makespan("short"), 3);
    assert_eq!(schedule.makespan("long"), 6);
    check_schedule(&inst, &set, &schedule);
}

#[test]
fn test_budget_exhaustion_reports_unknown() {
    let inst = bypass_instance();
    let built = StochasticModelBuilder::new(&inst, bypass_config()).build().unwrap();
    let params = SolverParams::default().with_time_budget(Duration::ZERO);
    let solved = built.solve_with(&PumpkinSolver::new(), &params);
    assert_eq!(solved.status(), SolveStatus::Unknown);
    assert!(matches!(
        solved.extract(),
        Err(ExtractError::NoSolution(SolveStatus::Unknown))
    ));
}

#[test]
fn test_solution_limit_returns_feasible_incumbent() {
    // three projects contend for one crew; the first schedule found is
    // returned without an optimality proof
    let mut inst = Instance::new()
        .with_resource(Resource::new("CREW"))
        .with_resource(Resource::new("EXT").with_cost(3.0));
    for p in ["P1", "P2", "P3"] {
        inst = inst
            .with_project(
                Project::new(p)
                    .with_deadline(4)
                    .with_delay_penalty(5.0)
                    .with_early_bonus(1.0)
                    .with_tasks(["a", "b"]),
            )
            .with_requirement(Requirement::new(p, "a", "CREW", 2, 1))
            .with_requirement(Requirement::new(p, "a", "EXT", 3, 1))
            .with_requirement(Requirement::new(p, "b", "CREW", 2, 1));
    }
    let config = ModelConfig::new()
        .with_bypass("P1", "b")
        .with_bypass_probability(0.5)
        .with_info_task("P1", "a");
    let set = config.scenario_set();
    let built = StochasticModelBuilder::new(&inst, config).build().unwrap();

    let params = SolverParams::default()
        .with_time_budget(Duration::from_secs(30))
        .with_solution_limit(1);
    let solved = built.solve_with(&PumpkinSolver::new(), &params);
    assert_eq!(solved.status(), SolveStatus::Feasible);
    assert_eq!(solved.solution().stats.solutions, 1);
    assert!(solved.best_bound().unwrap() <= solved.objective().unwrap() + 1e-9);

    let incumbent = solved.extract().unwrap();
    assert_eq!(incumbent.status, SolveStatus::Feasible);
    assert!(incumbent.best_bound <= incumbent.objective + 1e-9);
    check_schedule(&inst, &set, &incumbent);

    let full = built.solve();
    assert_eq!(full.status(), SolveStatus::Optimal);
    assert!(full.objective().unwrap() <= incumbent.objective + 1e-9);
    assert!(full.best_bound().unwrap() >= incumbent.best_bound - 1e-9);
}

#[test]
fn test_json_inputs_end_to_end() {
    let instance: Instance = serde_json::from_str(
        r#"{
            "resources": [
                {"id": "DEV", "capacity": 1, "cost_per_day": 1.0, "busy_units": [{"start": 0, "end": 1}]},
                {"id": "QA", "capacity": 1}
            ],
            "projects": [
                {"id": "P1", "deadline": 6, "delay_penalty": 4.0, "early_bonus": 1.0,
                 "tasks": ["triage", "review", "ship"]}
            ],
            "requirements": [
                {"project": "P1", "task": "triage", "resource": "QA", "duration": 1, "units": 1},
                {"project": "P1", "task": "review", "resource": "DEV", "duration": 2, "units": 1},
                {"project": "P1", "task": "ship", "resource": "DEV", "duration": 1, "units": 1}
            ]
        }"#,
    )
    .unwrap();
    let config = ModelConfig::from_json_str(
        r#"{
            "name": "json_case",
            "time_budget_secs": 10,
            "epoch": "2023-04-01",
            "bypass": [{"project": "P1", "task": "review"}],
            "bypass_probability": 0.4,
            "info_task": {"project": "P1", "task": "triage"}
        }"#,
    )
    .unwrap();
    let set = config.scenario_set();

    let built = StochasticModelBuilder::new(&instance, config).build().unwrap();
    assert_eq!(built.model().name(), "json_case");
    let schedule = built.solve().extract().unwrap();
    assert_eq!(schedule.status, SolveStatus::Optimal);
    assert_eq!(schedule.urt, Some(1));
    assert_eq!(
        schedule.urt_date,
        NaiveDate::from_ymd_opt(2023, 4, 2)
    );
    check_schedule(&instance, &set, &schedule);

    let json = serde_json::to_string(&schedule).unwrap();
    let back: StochasticSchedule = serde_json::from_str(&json).unwrap();
    assert_eq!(back.records, schedule.records);
    assert_eq!(back.status, SolveStatus::Optimal);
}

/// Small random instance that always admits a serial schedule.
fn random_instance(rng: &mut StdRng) -> (Instance, ModelConfig) {
    let mut inst = Instance::new();
    let n_resources = rng.random_range(1..=2);
    for r in 0..n_resources {
        let capacity = rng.random_range(1..=2);
        let mut resource = Resource::new(format!("R{r}"))
            .with_capacity(capacity)
            .with_cost(rng.random_range(0..=3) as f64);
        if rng.random_bool(0.5) {
            resource = resource.with_state0(vec![1; rng.random_range(1..=2)]);
        }
        inst = inst.with_resource(resource);
    }

    let n_projects = rng.random_range(1..=2);
    for p in 0..n_projects {
        let id = format!("P{p}");
        let n_tasks = if p == 0 { 3 } else { 2 };
        let penalty = rng.random_range(2..=6) as f64;
        let mut project = Project::new(&id)
            .with_deadline(rng.random_range(2..=8))
            .with_delay_penalty(penalty)
            .with_early_bonus(rng.random_range(0..2) as f64);
        for t in 0..n_tasks {
            let task = format!("t{t}");
            project = project.with_task(&task);
            let first = rng.random_range(0..n_resources);
            let options = if n_resources > 1 && rng.random_bool(0.4) { 2 } else { 1 };
            for k in 0..options {
                let r = (first + k) % n_resources;
                let capacity = inst.resources[r].capacity;
                inst = inst.with_requirement(Requirement::new(
                    &id,
                    &task,
                    format!("R{r}"),
                    rng.random_range(1..=2),
                    rng.random_range(1..=capacity),
                ));
            }
        }
        inst = inst.with_project(project);
    }

    let config = ModelConfig::new()
        .with_time_budget(Duration::from_secs(5))
        .with_bypass("P0", "t1")
        .with_bypass_probability(rng.random_range(0.2..0.8))
        .with_info_task("P0", "t0");
    (inst, config)
}

#[test]
fn test_random_instances_satisfy_all_constraints() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..6 {
        let (inst, config) = random_instance(&mut rng);
        let set = config.scenario_set();
        let built = StochasticModelBuilder::new(&inst, config).build().unwrap();
        let solved = built.solve();
        assert!(
            matches!(solved.status(), SolveStatus::Optimal | SolveStatus::Feasible),
            "status {}",
            solved.status()
        );
        let schedule = solved.extract().unwrap();
        check_schedule(&inst, &set, &schedule);
        if schedule.status == SolveStatus::Optimal {
            check_optimal_exclusivity(&schedule);
            assert!((schedule.objective - schedule.best_bound).abs() < 1e-6);
        } else {
            assert!(schedule.best_bound <= schedule.objective + 1e-9);
        }
    }
}

#[test]
fn test_random_single_scenario_stays_within_horizon() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..4 {
        let (inst, config) = random_instance(&mut rng);
        let config = ModelConfig::new().with_time_budget(config.time_budget());
        let built = StochasticModelBuilder::new(&inst, config).build().unwrap();
        let schedule = built.solve().extract().unwrap();
        check_schedule(&inst, &ScenarioSet::single(), &schedule);
        assert!(schedule.makespan(BASE_SCENARIO) <= built.horizon());
    }
}
