//! Schedule evaluation.
//!
//! # KPI
//!
//! `ScheduleKpi` computes standard scheduling metrics for one scenario of
//! an extracted schedule: makespan, tardiness, on-time rate, utilization
//! and resource cost. `ExpectedKpi` weights them by scenario probability.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1.2
//! - Birge & Louveaux (2011), "Introduction to Stochastic Programming"

mod kpi;

pub use kpi::{ExpectedKpi, ScheduleKpi};
