//! Resource model.
//!
//! A resource is a pool of identical units (a team, a crew, a machine
//! group) shared by every project. Part of the pool may already be
//! committed before the plan starts; that prior load is the resource's
//! occupancy profile.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1.2

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A shared resource pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Number of units available simultaneously.
    pub capacity: i64,
    /// Cost of one unit for one day.
    #[serde(default)]
    pub cost_per_day: f64,
    /// Units already consumed at each day `t` (`state0[t]`).
    ///
    /// Give either this or `busy_units`; validation rejects both.
    #[serde(default)]
    pub state0: Vec<i64>,
    /// Prior commitments as `[start, end)` day ranges, one unit each.
    #[serde(default)]
    pub busy_units: Vec<BusyInterval>,
    /// Domain-specific metadata.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// One committed unit over the days `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    /// First committed day.
    pub start: i64,
    /// First free day.
    pub end: i64,
}

impl BusyInterval {
    /// Creates a busy interval.
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Whether `start < end` and both are non-negative.
    pub fn is_well_formed(&self) -> bool {
        self.start >= 0 && self.start < self.end
    }
}

impl Resource {
    /// Creates a resource with one unit and no prior commitments.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            capacity: 1,
            cost_per_day: 0.0,
            state0: Vec::new(),
            busy_units: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    /// Sets the resource name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: i64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the cost per unit-day.
    pub fn with_cost(mut self, cost_per_day: f64) -> Self {
        self.cost_per_day = cost_per_day;
        self
    }

    /// Sets the day-by-day occupancy profile directly.
    pub fn with_state0(mut self, state0: Vec<i64>) -> Self {
        self.state0 = state0;
        self
    }

    /// Adds one committed unit over `[start, end)`.
    pub fn with_busy_unit(mut self, start: i64, end: i64) -> Self {
        self.busy_units.push(BusyInterval::new(start, end));
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Day-by-day prior occupancy.
    ///
    /// Returns `state0` when given, otherwise folds `busy_units` into a
    /// profile long enough to cover the last committed day. Malformed
    /// intervals, and `busy_units` next to a `state0`, contribute nothing;
    /// validation rejects both.
    pub fn occupancy(&self) -> Vec<i64> {
        if !self.state0.is_empty() {
            return self.state0.clone();
        }
        let len = self
            .busy_units
            .iter()
            .filter(|b| b.is_well_formed())
            .map(|b| b.end)
            .max()
            .unwrap_or(0);
        let mut profile = vec![0; len as usize];
        for b in self.busy_units.iter().filter(|b| b.is_well_formed()) {
            for day in &mut profile[b.start as usize..b.end as usize] {
                *day += 1;
            }
        }
        profile
    }

    /// Units committed on `day` before planning.
    pub fn committed_at(&self, day: i64) -> i64 {
        if day < 0 {
            return 0;
        }
        self.occupancy().get(day as usize).copied().unwrap_or(0)
    }

    /// Length of the prior commitment window in days.
    pub fn commitment_window(&self) -> i64 {
        self.occupancy().len() as i64
    }
}
