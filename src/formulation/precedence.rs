//! Precedence enforcer.
//!
//! Within each (scenario, project) the present tasks run in
//! declared order: `end[i] <= start[i + 1]`. Omitted tasks simply drop out
//! of the chain, so their neighbours become adjacent.

use tracing::debug;

use super::variables::VariableArena;
use crate::cp::CpModel;

/// Adds the chain constraints. Returns how many were added.
pub(crate) fn add_precedence(model: &mut CpModel, arena: &VariableArena) -> usize {
    let mut added = 0;
    for scenario in &arena.scenarios {
        for project in &scenario.projects {
            for pair in project.tasks.windows(2) {
                model.add_le(pair[0].end, pair[1].start);
                added += 1;
            }
        }
    }
    debug!(constraints = added, "precedence added");
    added
}
