//! Input validation for stochastic scheduling problems.
//!
//! Checks structural integrity of resources, projects, requirement rows
//! and scenarios before any model variable is created. Detects:
//! - Duplicate IDs
//! - Empty task sequences
//! - Requirement rows naming unknown projects, tasks or resources
//! - Tasks without any resource option
//! - Non-positive capacities and durations, negative units
//! - Malformed prior commitments
//! - Earliness rewarded at least as much as tardiness is penalized
//! - Scenario probabilities that are out of range or do not sum to 1
//! - Omissions and information tasks that name undeclared tasks
//!
//! All problems are collected; nothing stops at the first one.

use crate::models::{Instance, ScenarioSet};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Probability sum tolerance.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A project has no tasks.
    EmptyProject,
    /// A requirement row references a resource that doesn't exist.
    InvalidResourceReference,
    /// A requirement row, omission or information task names an
    /// undeclared project task.
    UnknownTask,
    /// A task has no resource option.
    MissingOption,
    /// Two options of a task use the same resource.
    DuplicateOption,
    /// Duration below 1 or negative units.
    InvalidOption,
    /// Capacity below 1.
    InvalidCapacity,
    /// A busy interval with `start >= end`, or a negative occupancy.
    MalformedCommitment,
    /// Prior commitments alone exceed capacity.
    CommitmentExceedsCapacity,
    /// `early_bonus >= delay_penalty`, or a negative cost.
    InvalidPenalty,
    /// Negative deadline.
    InvalidDeadline,
    /// Probability outside `[0, 1]` or weights not summing to 1.
    InvalidProbability,
    /// No scenario, duplicate scenario names, or a scenario omitting
    /// every task of a project.
    InvalidScenario,
    /// Negative horizon.
    InvalidHorizon,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates an instance together with its scenario set.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_instance(instance: &Instance, scenarios: &ScenarioSet) -> ValidationResult {
    let mut errors = Vec::new();

    check_resources(instance, &mut errors);
    check_projects(instance, &mut errors);
    check_requirements(instance, &mut errors);
    check_scenarios(instance, scenarios, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a horizon override.
pub fn validate_horizon(horizon: i64) -> Result<(), ValidationError> {
    if horizon < 0 {
        return Err(ValidationError::new(
            ValidationErrorKind::InvalidHorizon,
            format!("Horizon must be non-negative, got {horizon}"),
        ));
    }
    Ok(())
}

fn check_resources(instance: &Instance, errors: &mut Vec<ValidationError>) {
    let mut ids = HashSet::new();
    for r in &instance.resources {
        if !ids.insert(r.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate resource ID: {}", r.id),
            ));
        }
        if r.capacity < 1 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidCapacity,
                format!("Resource '{}' has capacity {}", r.id, r.capacity),
            ));
        }
        if r.cost_per_day < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPenalty,
                format!("Resource '{}' has negative cost {}", r.id, r.cost_per_day),
            ));
        }
        for b in r.busy_units.iter().filter(|b| !b.is_well_formed()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::MalformedCommitment,
                format!(
                    "Resource '{}' has busy interval [{}, {})",
                    r.id, b.start, b.end
                ),
            ));
        }
        if !r.state0.is_empty() && !r.busy_units.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MalformedCommitment,
                format!(
                    "Resource '{}' gives both state0 and busy_units; use one",
                    r.id
                ),
            ));
        }
        if r.state0.iter().any(|&u| u < 0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::MalformedCommitment,
                format!("Resource '{}' has negative prior occupancy", r.id),
            ));
        }
        if let Some((day, units)) = r
            .occupancy()
            .into_iter()
            .enumerate()
            .find(|&(_, u)| u > r.capacity)
        {
            errors.push(ValidationError::new(
                ValidationErrorKind::CommitmentExceedsCapacity,
                format!(
                    "Resource '{}' is committed {} units on day {} with capacity {}",
                    r.id, units, day, r.capacity
                ),
            ));
        }
    }
}

fn check_projects(instance: &Instance, errors: &mut Vec<ValidationError>) {
    let mut ids = HashSet::new();
    for p in &instance.projects {
        if !ids.insert(p.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate project ID: {}", p.id),
            ));
        }
        if p.tasks.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyProject,
                format!("Project '{}' has no tasks", p.id),
            ));
        }
        let mut task_ids = HashSet::new();
        for t in &p.tasks {
            if !task_ids.insert(t.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate task ID '{}' in project '{}'", t, p.id),
                ));
            }
        }
        if p.deadline < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDeadline,
                format!("Project '{}' has negative deadline {}", p.id, p.deadline),
            ));
        }
        if p.early_bonus < 0.0 || p.early_bonus >= p.delay_penalty {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPenalty,
                format!(
                    "Project '{}' has early bonus {} and delay penalty {}; need 0 <= bonus < penalty",
                    p.id, p.early_bonus, p.delay_penalty
                ),
            ));
        }
    }
}

fn check_requirements(instance: &Instance, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for row in &instance.requirements {
        let label = format!("{}/{}/{}", row.project, row.task, row.resource);
        if !seen.insert((&row.project, &row.task, &row.resource)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateOption,
                format!("Duplicate requirement row: {label}"),
            ));
        }
        if instance.resource(&row.resource).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidResourceReference,
                format!(
                    "Task '{}/{}' references unknown resource '{}'",
                    row.project, row.task, row.resource
                ),
            ));
        }
        let declared = instance
            .project(&row.project)
            .is_some_and(|p| p.has_task(&row.task));
        if !declared {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownTask,
                format!("Requirement row {label} names an undeclared task"),
            ));
        }
        if row.duration < 1 || row.units < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidOption,
                format!(
                    "Requirement row {label} has duration {} and units {}",
                    row.duration, row.units
                ),
            ));
        }
    }

    let table = instance.requirement_table();
    for p in &instance.projects {
        for t in &p.tasks {
            if table.options(&p.id, t).is_empty() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MissingOption,
                    format!("Task '{}/{}' has no resource option", p.id, t),
                ));
            }
        }
    }
}

fn check_scenarios(instance: &Instance, scenarios: &ScenarioSet, errors: &mut Vec<ValidationError>) {
    if scenarios.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidScenario,
            "No scenario defined",
        ));
        return;
    }

    let declared = |project: &str, task: &str| {
        instance
            .project(project)
            .is_some_and(|p| p.has_task(task))
    };

    let mut names = HashSet::new();
    for s in &scenarios.scenarios {
        if !names.insert(s.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate scenario name: {}", s.name),
            ));
        }
        if !(0.0..=1.0).contains(&s.probability) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidProbability,
                format!("Scenario '{}' has probability {}", s.name, s.probability),
            ));
        }
        for k in s.omitted.iter().filter(|k| !declared(&k.project, &k.task)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownTask,
                format!("Scenario '{}' omits undeclared task '{}'", s.name, k),
            ));
        }
        for p in &instance.projects {
            if !p.tasks.is_empty() && p.tasks.iter().all(|t| !s.includes(&p.id, t)) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidScenario,
                    format!("Scenario '{}' omits every task of project '{}'", s.name, p.id),
                ));
            }
        }
    }

    let total = scenarios.total_probability();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidProbability,
            format!("Scenario probabilities sum to {total}, expected 1"),
        ));
    }

    if let Some(info) = &scenarios.info_task {
        if !declared(&info.project, &info.task) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownTask,
                format!("Information task '{info}' is not declared"),
            ));
        } else if !scenarios
            .scenarios
            .iter()
            .any(|s| s.includes(&info.project, &info.task))
        {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidScenario,
                format!("Information task '{info}' occurs in no scenario"),
            ));
        }
    }
}
