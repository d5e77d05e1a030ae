//! Problem instance: everything the formulation reads besides scenarios
//! and configuration.

use serde::{Deserialize, Serialize};

use super::{Project, Requirement, RequirementTable, Resource};

/// Resources, projects and requirement rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Instance {
    /// Resource pools.
    pub resources: Vec<Resource>,
    /// Projects in reporting order.
    pub projects: Vec<Project>,
    /// Flat requirement rows.
    pub requirements: Vec<Requirement>,
}

impl Instance {
    /// Creates an empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource.
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Adds a project.
    pub fn with_project(mut self, project: Project) -> Self {
        self.projects.push(project);
        self
    }

    /// Adds a requirement row.
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Finds a resource by ID.
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Index of a resource.
    pub fn resource_index(&self, id: &str) -> Option<usize> {
        self.resources.iter().position(|r| r.id == id)
    }

    /// Finds a project by ID.
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Groups the requirement rows by task.
    pub fn requirement_table(&self) -> RequirementTable {
        RequirementTable::from_rows(&self.requirements)
    }

    /// Longest prior commitment window over all resources.
    pub fn commitment_window(&self) -> i64 {
        self.resources
            .iter()
            .map(Resource::commitment_window)
            .max()
            .unwrap_or(0)
    }
}
