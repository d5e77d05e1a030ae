//! Schedule quality metrics (KPIs).
//!
//! Computes standard scheduling performance indicators for one scenario of
//! an extracted [`StochasticSchedule`], and their probability-weighted
//! expectation over all scenarios.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest project completion |
//! | Total Tardiness | Sum of max(0, completion - deadline) over projects |
//! | Maximum Tardiness | Largest single project delay |
//! | On-Time Rate | Fraction of projects meeting their deadline |
//! | Utilization | Scheduled unit-days / (capacity · makespan) |
//! | Resource Cost | Σ cost_per_day · units · duration of active records |
//!
//! All time values are in days.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::HashMap;

use crate::models::{Instance, ScenarioSet, StochasticSchedule};

/// Performance indicators of one scenario.
#[derive(Debug, Clone)]
pub struct ScheduleKpi {
    /// Scenario name.
    pub scenario: String,
    /// Latest project completion (days).
    pub makespan: i64,
    /// Sum of tardiness across all projects (days).
    pub total_tardiness: i64,
    /// Maximum tardiness of any single project (days).
    pub max_tardiness: i64,
    /// Fraction of projects completing on time (0.0..1.0).
    pub on_time_rate: f64,
    /// Average resource utilization (0.0..1.0).
    pub avg_utilization: f64,
    /// Per-resource utilization.
    pub utilization_by_resource: HashMap<String, f64>,
    /// Cost of the chosen resource options.
    pub resource_cost: f64,
}

impl ScheduleKpi {
    /// Computes KPIs of `scenario` from an extracted schedule.
    ///
    /// Projects without a completion in that scenario are skipped.
    pub fn calculate(schedule: &StochasticSchedule, instance: &Instance, scenario: &str) -> Self {
        let makespan = schedule.makespan(scenario);
        let mut total_tardiness: i64 = 0;
        let mut max_tardiness: i64 = 0;
        let mut on_time_count: usize = 0;
        let mut counted: usize = 0;

        for project in &instance.projects {
            let Some(c) = schedule.completion(scenario, &project.id) else {
                continue;
            };
            counted += 1;
            let tardiness = (c.completion - project.deadline).max(0);
            if tardiness > 0 {
                total_tardiness += tardiness;
                max_tardiness = max_tardiness.max(tardiness);
            } else {
                on_time_count += 1;
            }
        }

        let mut utilization_by_resource = HashMap::new();
        for usage in schedule.utilization.iter().filter(|u| u.scenario == scenario) {
            let available = usage.capacity * makespan;
            let value = if available > 0 {
                usage.scheduled_unit_days() as f64 / available as f64
            } else {
                0.0
            };
            utilization_by_resource.insert(usage.resource.clone(), value);
        }
        let avg_utilization = if utilization_by_resource.is_empty() {
            0.0
        } else {
            let sum: f64 = utilization_by_resource.values().sum();
            sum / utilization_by_resource.len() as f64
        };

        let resource_cost = schedule
            .active_records()
            .filter(|r| r.scenario == scenario)
            .map(|r| {
                let rate = instance.resource(&r.resource).map_or(0.0, |res| res.cost_per_day);
                rate * r.units as f64 * r.duration() as f64
            })
            .sum();

        let on_time_rate = if counted == 0 {
            1.0
        } else {
            on_time_count as f64 / counted as f64
        };

        Self {
            scenario: scenario.to_string(),
            makespan,
            total_tardiness,
            max_tardiness,
            on_time_rate,
            avg_utilization,
            utilization_by_resource,
            resource_cost,
        }
    }

    /// Whether the scenario meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_tardiness: i64, min_utilization: f64) -> bool {
        self.max_tardiness <= max_tardiness && self.avg_utilization >= min_utilization
    }
}

/// Probability-weighted KPIs over a scenario set.
#[derive(Debug, Clone)]
pub struct ExpectedKpi {
    /// Per-scenario KPIs, in scenario order.
    pub scenarios: Vec<ScheduleKpi>,
    pub expected_makespan: f64,
    pub expected_tardiness: f64,
    pub expected_on_time_rate: f64,
    pub expected_resource_cost: f64,
}

impl ExpectedKpi {
    /// Computes per-scenario KPIs and weights them by scenario probability.
    pub fn calculate(
        schedule: &StochasticSchedule,
        instance: &Instance,
        scenarios: &ScenarioSet,
    ) -> Self {
        let mut out = Self {
            scenarios: Vec::with_capacity(scenarios.len()),
            expected_makespan: 0.0,
            expected_tardiness: 0.0,
            expected_on_time_rate: 0.0,
            expected_resource_cost: 0.0,
        };
        for s in &scenarios.scenarios {
            let kpi = ScheduleKpi::calculate(schedule, instance, &s.name);
            out.expected_makespan += s.probability * kpi.makespan as f64;
            out.expected_tardiness += s.probability * kpi.total_tardiness as f64;
            out.expected_on_time_rate += s.probability * kpi.on_time_rate;
            out.expected_resource_cost += s.probability * kpi.resource_cost;
            out.scenarios.push(kpi);
        }
        out
    }

    /// KPIs of one scenario.
    pub fn scenario(&self, name: &str) -> Option<&ScheduleKpi> {
        self.scenarios.iter().find(|k| k.scenario == name)
    }
}
