//! Typed distillation options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RequestError;

/// Output format of the distilled result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Compact text (aid's own default)
    #[serde(rename = "text")]
    Text,
    /// Markdown
    #[serde(rename = "md")]
    Markdown,
    /// One JSON object per line
    #[serde(rename = "jsonl")]
    JsonLines,
    /// Single structured JSON document
    #[serde(rename = "json-structured")]
    JsonStructured,
    /// XML
    #[serde(rename = "xml")]
    Xml,
}

impl OutputFormat {
    /// Every format, in catalog order.
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Text,
        OutputFormat::Markdown,
        OutputFormat::JsonLines,
        OutputFormat::JsonStructured,
        OutputFormat::Xml,
    ];

    /// Identifier understood by `--format`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Markdown => "md",
            OutputFormat::JsonLines => "jsonl",
            OutputFormat::JsonStructured => "json-structured",
            OutputFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL
            .iter()
            .copied()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| RequestError::UnknownFormat(s.to_string()))
    }
}

/// Options controlling what `aid` keeps in its output.
///
/// Each boolean has a fixed default; a flag is only emitted when the value
/// differs from it. `recursive`, `include_fields` and `include_methods`
/// default to `true`, every other boolean to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DistillOptions {
    /// Output format, aid's default when unset
    pub format: Option<OutputFormat>,

    /// Descend into subdirectories
    pub recursive: bool,

    /// Keep private members
    pub include_private: bool,

    /// Keep protected members
    pub include_protected: bool,

    /// Keep internal/package-private members
    pub include_internal: bool,

    /// Keep function and method bodies
    pub include_implementation: bool,

    /// Keep comments
    pub include_comments: bool,

    /// Keep fields and properties
    pub include_fields: bool,

    /// Keep methods and functions
    pub include_methods: bool,

    /// Comma-separated include globs
    pub include_patterns: Option<String>,

    /// Comma-separated exclude globs
    pub exclude_patterns: Option<String>,

    /// Depth limit for dependency-aware distillation
    pub max_depth: Option<u32>,

    /// Extra context forwarded to prompt generation
    pub ai_query: Option<String>,
}

impl Default for DistillOptions {
    fn default() -> Self {
        Self {
            format: None,
            recursive: true,
            include_private: false,
            include_protected: false,
            include_internal: false,
            include_implementation: false,
            include_comments: false,
            include_fields: true,
            include_methods: true,
            include_patterns: None,
            exclude_patterns: None,
            max_depth: None,
            ai_query: None,
        }
    }
}

impl DistillOptions {
    /// Create options with every default in place.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn private, protected and internal visibility on or off together.
    pub fn with_all_visibility(mut self, enabled: bool) -> Self {
        self.include_private = enabled;
        self.include_protected = enabled;
        self.include_internal = enabled;
        self
    }

    /// Keep or drop implementation bodies.
    pub fn with_implementation(mut self, enabled: bool) -> Self {
        self.include_implementation = enabled;
        self
    }

    /// Set include and exclude globs.
    pub fn with_patterns(mut self, include: Option<String>, exclude: Option<String>) -> Self {
        self.include_patterns = include;
        self.exclude_patterns = exclude;
        self
    }

    /// Set the dependency depth limit.
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set the free-text query.
    pub fn with_ai_query(mut self, query: impl Into<String>) -> Self {
        self.ai_query = Some(query.into());
        self
    }
}
