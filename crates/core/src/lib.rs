//! aid-mcp core data model.
//!
//! This crate defines the typed request that every tool call is shaped into
//! and the command builder that turns it into the argument vector handed to
//! the `aid` binary.

#![warn(missing_docs)]

// Request model
mod action;
mod options;
mod request;

// Argument construction
mod argv;

// Validation errors
mod error;

// Re-exports
pub use action::{Action, AiAction, DocType};
pub use argv::{ArgumentVector, CommandBuilder};
pub use error::{RequestError, Result};
pub use options::{DistillOptions, OutputFormat};
pub use request::DistillRequest;
