pub mod pool;
pub mod repos;

// Re-export commonly used items
pub use pool::{create_pool, run_migrations};
pub use repos::flow_instance::{FlowInstanceRepo, FlowInstanceRow};
pub use repos::flow_template::{FlowTemplateListRow, FlowTemplateRepo, FlowTemplateRow};
pub use repos::stage::{NewStage, StageRepo, StageRow, StageUpdate};
pub use repos::task_instance::{AssignedTaskRow, TaskInstanceRepo, TaskInstanceRow};
pub use repos::user::{UserRepo, UserRow};
