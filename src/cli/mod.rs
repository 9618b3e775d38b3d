//! CLI command implementations

pub mod preset;
pub mod session;
pub mod set;
