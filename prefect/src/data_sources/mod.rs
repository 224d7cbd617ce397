//! Data source implementations

pub mod data_source_account;
pub mod data_source_workspace;

pub use data_source_account::AccountDataSource;
pub use data_source_workspace::WorkspaceDataSource;
