//! Argument vector construction.
//!
//! The vector is handed to process creation element by element and never
//! goes through a shell, so values are emitted verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DistillOptions, DistillRequest};

/// Ordered arguments for one `aid` invocation.
///
/// Element 0 is the target path when built by [`CommandBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArgumentVector(Vec<String>);

impl ArgumentVector {
    /// Arguments as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Iterate over the arguments.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether an exact argument is present.
    pub fn contains(&self, arg: &str) -> bool {
        self.0.iter().any(|a| a == arg)
    }

    /// Consume into the underlying list.
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for ArgumentVector {
    fn from(args: Vec<String>) -> Self {
        Self(args)
    }
}

impl<'a> IntoIterator for &'a ArgumentVector {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ArgumentVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:?}", arg)?;
        }
        Ok(())
    }
}

/// Maps a [`DistillRequest`] onto `aid` command-line flags.
///
/// Emission order: target, action flags, `--max-depth`, `--format`,
/// `--recursive`, visibility, implementation, comments, fields, methods,
/// include, exclude, `--ai-query`.
pub struct CommandBuilder;

impl CommandBuilder {
    /// Build the argument vector for a request.
    pub fn build(request: &DistillRequest) -> ArgumentVector {
        let mut args = vec![request.target().to_string()];
        args.extend(request.action().flags());
        Self::push_options(&mut args, request.options());
        ArgumentVector(args)
    }

    fn push_options(args: &mut Vec<String>, options: &DistillOptions) {
        if let Some(depth) = options.max_depth {
            args.push(format!("--max-depth={}", depth));
        }
        if let Some(format) = options.format {
            args.push(format!("--format={}", format));
        }

        // Booleans only appear when they differ from their default.
        push_flag(args, !options.recursive, "--recursive=0");
        push_flag(args, options.include_private, "--private=1");
        push_flag(args, options.include_protected, "--protected=1");
        push_flag(args, options.include_internal, "--internal=1");
        push_flag(args, options.include_implementation, "--implementation=1");
        push_flag(args, options.include_comments, "--comments=1");
        push_flag(args, !options.include_fields, "--fields=0");
        push_flag(args, !options.include_methods, "--methods=0");

        push_value(args, "--include", options.include_patterns.as_deref());
        push_value(args, "--exclude", options.exclude_patterns.as_deref());
        push_value(args, "--ai-query", options.ai_query.as_deref());
    }
}

fn push_flag(args: &mut Vec<String>, enabled: bool, flag: &str) {
    if enabled {
        args.push(flag.to_string());
    }
}

fn push_value(args: &mut Vec<String>, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        args.push(format!("{}={}", name, value));
    }
}
