//! Resource implementations

pub mod helpers;
pub mod resource_account;
pub mod resource_deployment;
pub mod resource_flow;
pub mod resource_work_pool;
pub mod resource_workspace;

pub use resource_account::AccountResource;
pub use resource_deployment::DeploymentResource;
pub use resource_flow::FlowResource;
pub use resource_work_pool::WorkPoolResource;
pub use resource_workspace::WorkspaceResource;
