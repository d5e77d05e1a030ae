//! Resource capacity enforcer.
//!
//! Two parts: each multi-option task picks exactly one option, and each
//! (scenario, resource) gets one cumulative constraint over its task
//! intervals and commitment intervals. Optional intervals only count while
//! their option is active.

use tracing::{debug, warn};

use super::variables::VariableArena;
use crate::cp::CpModel;
use crate::models::Instance;

/// Exactly one active option per multi-option task.
pub(crate) fn add_single_assignment(model: &mut CpModel, arena: &VariableArena) -> usize {
    let mut added = 0;
    for scenario in &arena.scenarios {
        for project in &scenario.projects {
            for task in &project.tasks {
                let lits: Vec<_> = task
                    .options
                    .iter()
                    .filter_map(|o| o.active.map(|b| b.lit()))
                    .collect();
                if lits.is_empty() {
                    continue;
                }
                model.add_exactly_one(lits);
                added += 1;
            }
        }
    }
    debug!(constraints = added, "single assignment added");
    added
}

/// One cumulative constraint per (scenario, resource) with any demand.
pub(crate) fn add_capacity(model: &mut CpModel, arena: &VariableArena, instance: &Instance) -> usize {
    for (si, _, task, option) in arena.options() {
        let resource = &instance.resources[option.resource];
        if option.units > resource.capacity {
            warn!(
                scenario = %arena.scenarios[si].name,
                task = %task.name,
                resource = %resource.id,
                units = option.units,
                capacity = resource.capacity,
                "option needs more units than the resource has; it can never be chosen"
            );
        }
    }

    let mut added = 0;
    for per_resource in &arena.needs {
        for (ri, demands) in per_resource.iter().enumerate() {
            if demands.is_empty() {
                continue;
            }
            model.add_cumulative(demands.clone(), instance.resources[ri].capacity);
            added += 1;
        }
    }
    debug!(constraints = added, "capacity added");
    added
}
