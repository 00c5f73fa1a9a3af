pub mod project;
pub mod project_response;
pub mod task_assignment;
