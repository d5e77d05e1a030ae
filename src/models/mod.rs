//! Scheduling domain models.
//!
//! Input types describe the problem (resources, projects, requirement
//! rows, scenarios); [`StochasticSchedule`] describes a solution.
//!
//! # Domain Mappings
//!
//! | u-stoch-schedule | R&D portfolio | Construction | IT operations |
//! |------------------|---------------|--------------|---------------|
//! | Project | Product line | Building | Migration |
//! | Task | Work package | Trade phase | Change step |
//! | Resource | Team | Crew | Squad |
//! | Scenario | Review outcome | Permit outcome | Audit outcome |

mod instance;
mod project;
mod requirement;
mod resource;
mod scenario;
mod schedule;

pub use instance::Instance;
pub use project::Project;
pub use requirement::{Requirement, RequirementTable, TaskOption};
pub use resource::{BusyInterval, Resource};
pub use scenario::{Scenario, ScenarioSet, TaskKey, BASE_SCENARIO, BAU_SCENARIO, BYPASS_SCENARIO};
pub use schedule::{
    ProjectCompletion, ResourceUsage, ScheduleRecord, StochasticSchedule, TaskCoupling,
};
