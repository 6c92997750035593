use uuid::Uuid;

use crate::{data_access::data_context::DataError, project::Project, task::Task};

/// Read-only access to tasks for services that must not depend on the task module.
pub trait TaskLookup {
    fn find_task(&self, id: Uuid) -> Result<Option<Task>, DataError>;
}

/// Read-only access to projects for services that must not depend on the project module.
pub trait ProjectLookup {
    fn find_project(&self, id: Uuid) -> Result<Option<Project>, DataError>;
}
