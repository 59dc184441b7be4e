//! Structured request for one tool call.

use serde::{Deserialize, Serialize};

use crate::{Action, DistillOptions, RequestError, Result};

/// A validated, typed tool call ready for argument construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistillRequest {
    target: String,
    action: Action,
    options: DistillOptions,
}

impl DistillRequest {
    /// Create a request with default options.
    ///
    /// Fails when the target path is blank or starts with `-`. The target
    /// is always argv element 0 and must not be mistaken for an option.
    pub fn new(target: impl Into<String>, action: impl Into<Action>) -> Result<Self> {
        let target = target.into();
        if target.trim().is_empty() {
            return Err(RequestError::EmptyTarget);
        }
        if target.starts_with('-') {
            return Err(RequestError::FlagLikeTarget(target));
        }

        Ok(Self {
            target,
            action: action.into(),
            options: DistillOptions::default(),
        })
    }

    /// Replace the options.
    pub fn with_options(mut self, options: DistillOptions) -> Self {
        self.options = options;
        self
    }

    /// Target file or directory.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Requested action.
    pub fn action(&self) -> Action {
        self.action
    }

    /// Distillation options.
    pub fn options(&self) -> &DistillOptions {
        &self.options
    }
}
