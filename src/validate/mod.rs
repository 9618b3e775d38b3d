//! Input validation that runs before any git, shell, or filesystem use

mod branch;
mod path;

pub use branch::{BranchError, ValidBranch, validate_branch};
pub use path::{is_safe, is_strictly_inside};
