pub mod issue;
pub mod project;

pub use issue::{IssueStatus, IssueType, ParseEnumError, Priority, Severity};
pub use project::ProjectStatus;
