//! Result extractor.
//!
//! Reads a solved assignment back into a [`StochasticSchedule`]. Only a
//! solution with status `Optimal` or `Feasible` can be read; anything else
//! is an [`ExtractError`] and no record is produced.

use chrono::{Days, NaiveDate};
use tracing::debug;

use super::variables::VariableArena;
use crate::cp::{CpSolution, VarId};
use crate::error::ExtractError;
use crate::models::{
    Instance, ProjectCompletion, ResourceUsage, ScheduleRecord, StochasticSchedule, TaskCoupling,
};

/// Calendar date `day` days after `epoch`, `None` outside chrono's range.
pub fn day_to_date(epoch: NaiveDate, day: i64) -> Option<NaiveDate> {
    if day >= 0 {
        epoch.checked_add_days(Days::new(day as u64))
    } else {
        epoch.checked_sub_days(Days::new(day.unsigned_abs()))
    }
}

struct Reader<'a> {
    solution: &'a CpSolution,
    epoch: NaiveDate,
}

impl Reader<'_> {
    fn int(&self, var: VarId) -> Result<i64, ExtractError> {
        self.solution
            .value(var)
            .ok_or(ExtractError::NoSolution(self.solution.status))
    }

    fn date(&self, day: i64) -> Result<NaiveDate, ExtractError> {
        day_to_date(self.epoch, day).ok_or(ExtractError::DateOutOfRange(day))
    }
}

pub(crate) fn extract_schedule(
    solution: &CpSolution,
    arena: &VariableArena,
    instance: &Instance,
    epoch: NaiveDate,
) -> Result<StochasticSchedule, ExtractError> {
    if !solution.is_solution_found() {
        return Err(ExtractError::NoSolution(solution.status));
    }
    let read = Reader { solution, epoch };
    let horizon = arena.horizon;
    let days = horizon.max(instance.commitment_window()).max(0) as usize;

    let mut records = Vec::new();
    let mut completions = Vec::new();
    let mut utilization = Vec::new();

    for scenario in &arena.scenarios {
        let mut scheduled = vec![vec![0i64; days]; instance.resources.len()];

        for (project, slot) in instance.projects.iter().zip(&scenario.projects) {
            for task in &slot.tasks {
                let start = read.int(task.start)?;
                let end = read.int(task.end)?;
                for option in &task.options {
                    let active = match option.active {
                        Some(b) => read.int(b.var())? != 0,
                        None => true,
                    };
                    if active {
                        let from = start.max(0) as usize;
                        let to = (end.max(0) as usize).min(days);
                        for load in scheduled[option.resource].iter_mut().take(to).skip(from) {
                            *load += option.units;
                        }
                    }
                    records.push(ScheduleRecord {
                        scenario: scenario.name.clone(),
                        project: project.id.clone(),
                        task: task.name.clone(),
                        resource: instance.resources[option.resource].id.clone(),
                        start,
                        end,
                        start_date: read.date(start)?,
                        end_date: read.date(end)?,
                        units: option.units,
                        active,
                    });
                }
            }

            if let Some(end) = slot.end() {
                completions.push(ProjectCompletion {
                    scenario: scenario.name.clone(),
                    project: project.id.clone(),
                    completion: read.int(end)?,
                    earliness: read.int(slot.earliness)?,
                    tardiness: read.int(slot.tardiness)?,
                });
            }
        }

        for (resource, load) in instance.resources.iter().zip(scheduled) {
            let mut committed = resource.occupancy();
            committed.resize(days.max(committed.len()), 0);
            utilization.push(ResourceUsage {
                scenario: scenario.name.clone(),
                resource: resource.id.clone(),
                capacity: resource.capacity,
                committed,
                scheduled: load,
            });
        }
    }

    let mut couplings = Vec::with_capacity(arena.couplings.len());
    for c in &arena.couplings {
        couplings.push(TaskCoupling {
            project: instance.projects[c.project].id.clone(),
            task: c.task.clone(),
            scenarios: (
                arena.scenarios[c.scenarios.0].name.clone(),
                arena.scenarios[c.scenarios.1].name.clone(),
            ),
            min_start: read.int(c.min_start)?,
            coupled: read.int(c.precedes.var())? != 0,
        });
    }

    let urt = arena.urt.map(|v| read.int(v)).transpose()?;
    let urt_date = urt.map(|d| read.date(d)).transpose()?;

    debug!(
        records = records.len(),
        completions = completions.len(),
        urt = ?urt,
        "schedule extracted"
    );

    Ok(StochasticSchedule {
        status: solution.status,
        objective: solution.objective.unwrap_or(0.0),
        best_bound: solution.best_bound.unwrap_or(0.0),
        horizon,
        urt,
        urt_date,
        records,
        completions,
        utilization,
        couplings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::SolveStatus;

    #[test]
    fn test_day_to_date() {
        let epoch = NaiveDate::from_ymd_opt(2023, 4, 1).unwrap();
        assert_eq!(day_to_date(epoch, 0), Some(epoch));
        assert_eq!(day_to_date(epoch, 30), NaiveDate::from_ymd_opt(2023, 5, 1));
        assert_eq!(day_to_date(epoch, -1), NaiveDate::from_ymd_opt(2023, 3, 31));
    }

    #[test]
    fn test_day_to_date_out_of_range() {
        assert_eq!(day_to_date(NaiveDate::MAX, 1), None);
        assert_eq!(day_to_date(NaiveDate::MIN, -1), None);
        assert_eq!(day_to_date(NaiveDate::MAX, 0), Some(NaiveDate::MAX));

        let solution = CpSolution::from_values(SolveStatus::Optimal, vec![3], 0.0, 0.0);
        let read = Reader {
            solution: &solution,
            epoch: NaiveDate::MAX,
        };
        assert_eq!(read.date(read.int(VarId(0)).unwrap()), Err(ExtractError::DateOutOfRange(3)));
    }
}
