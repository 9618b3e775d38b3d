//! Branch name validation
//!
//! Accepts a deliberately narrow subset of git's ref grammar so that one
//! value is safe as a git ref, as a path segment (after `/` becomes `-`),
//! and as a literal shell argument.

use std::fmt;

const MAX_LEN: usize = 255;
const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', ']', '\\', ' '];
const SHELL_META: &[char] = &[';', '&', '|', '`', '$', '(', ')'];

/// Reason a branch name was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BranchError {
    #[error("branch name cannot be empty")]
    Empty,

    #[error("branch name is longer than 255 characters")]
    TooLong,

    #[error("branch name cannot start with '-'")]
    LeadingDash,

    #[error("branch name cannot start or end with '/'")]
    EdgeSlash,

    #[error("branch name cannot contain '//'")]
    DoubleSlash,

    #[error("branch name cannot contain '@{{'")]
    ReflogSyntax,

    #[error("branch name cannot contain '..'")]
    DoubleDot,

    #[error("branch name cannot contain '{0}'")]
    ForbiddenChar(char),

    #[error("branch name cannot contain control characters")]
    ControlChar,

    #[error("branch name cannot contain shell metacharacter '{0}'")]
    ShellMeta(char),

    #[error("branch name cannot start or end with '.'")]
    EdgeDot,

    #[error("branch name cannot end with '.lock'")]
    LockSuffix,
}

/// A branch name that passed [`validate_branch`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidBranch(String);

impl ValidBranch {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory name derived from the branch: every `/` becomes `-`.
    pub fn dir_name(&self) -> String {
        self.0.replace('/', "-")
    }
}

impl fmt::Display for ValidBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ValidBranch {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a branch name.
pub fn validate_branch(name: &str) -> Result<ValidBranch, BranchError> {
    if name.is_empty() {
        return Err(BranchError::Empty);
    }
    if name.len() > MAX_LEN {
        return Err(BranchError::TooLong);
    }
    if name.starts_with('-') {
        return Err(BranchError::LeadingDash);
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(BranchError::EdgeSlash);
    }
    if name.contains("//") {
        return Err(BranchError::DoubleSlash);
    }
    if name.contains("@{") {
        return Err(BranchError::ReflogSyntax);
    }
    if name.contains("..") {
        return Err(BranchError::DoubleDot);
    }
    for c in name.chars() {
        if c.is_ascii_control() {
            return Err(BranchError::ControlChar);
        }
        if FORBIDDEN_CHARS.contains(&c) {
            return Err(BranchError::ForbiddenChar(c));
        }
        if SHELL_META.contains(&c) {
            return Err(BranchError::ShellMeta(c));
        }
    }
    if name.starts_with('.') || name.ends_with('.') {
        return Err(BranchError::EdgeDot);
    }
    if name.ends_with(".lock") {
        return Err(BranchError::LockSuffix);
    }

    Ok(ValidBranch(name.to_string()))
}
