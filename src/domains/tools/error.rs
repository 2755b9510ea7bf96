//! Tool-specific error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while discovering or registering a tool.
///
/// None of these ever reach a client: discovery logs them and moves on to
/// the next tool directory.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tools root directory itself is unusable.
    #[error("Tools directory does not exist: {0}")]
    RootMissing(PathBuf),

    /// The tool directory lacks its `tool.json` entry point.
    #[error("Entry point not found: {0}")]
    EntryPointMissing(PathBuf),

    /// The entry point could not be read or parsed.
    #[error("Failed to load entry point {path}: {reason}")]
    EntryPointUnreadable { path: PathBuf, reason: String },

    /// The descriptor does not conform to the required shape.
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// The directory name is not usable as a tool id.
    #[error("Invalid tool id: {0}")]
    InvalidId(String),

    /// Two routes in one tool were declared with the same handler name.
    #[error("Duplicate endpoint: {0}")]
    DuplicateEndpoint(String),

    /// The tool's route registration failed.
    #[error("Registration failed: {0}")]
    RegistrationFailed(String),
}

impl ToolError {
    /// Create a new "invalid descriptor" error.
    pub fn invalid_descriptor(msg: impl Into<String>) -> Self {
        Self::InvalidDescriptor(msg.into())
    }

    /// Create a new "registration failed" error.
    pub fn registration_failed(msg: impl Into<String>) -> Self {
        Self::RegistrationFailed(msg.into())
    }

    pub fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::EntryPointUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
