//! What the `aid` binary is asked to do.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RequestError;

/// Action requested from the external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Distill structure and print it to stdout
    Distill,
    /// Distill only what the target transitively calls
    DependencyAware,
    /// Generate an AI prompt or workflow
    Ai(AiAction),
}

impl Action {
    /// Flags that are always emitted for this action, in order.
    pub fn flags(&self) -> Vec<String> {
        match self {
            Action::Distill => vec![
                "--stdout".to_string(),
                "--show-ai-agent-instructions".to_string(),
            ],
            Action::DependencyAware => vec![
                "--dependency-aware".to_string(),
                "--stdout".to_string(),
                "--show-ai-agent-instructions".to_string(),
            ],
            Action::Ai(action) => vec![format!("--ai-action={}", action)],
        }
    }
}

impl From<AiAction> for Action {
    fn from(action: AiAction) -> Self {
        Action::Ai(action)
    }
}

/// Prompt and workflow generators built into `aid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiAction {
    /// File-by-file task list across several review dimensions
    FlowForDeepFileToFileAnalysis,
    /// Cross-referenced documentation workflow
    FlowForMultiFileDocs,
    /// Refactoring suggestions
    PromptForRefactoringSuggestion,
    /// Architecture-level analysis of a whole codebase
    PromptForComplexCodebaseAnalysis,
    /// Security audit
    PromptForSecurityAnalysis,
    /// Performance audit
    PromptForPerformanceAnalysis,
    /// Best-practices review
    PromptForBestPracticesAnalysis,
    /// Bug hunting
    PromptForBugHunting,
    /// Documentation for one file
    PromptForSingleFileDocs,
    /// Mermaid diagrams
    PromptForDiagrams,
}

impl AiAction {
    /// Every action, in catalog order.
    pub const ALL: [AiAction; 10] = [
        AiAction::FlowForDeepFileToFileAnalysis,
        AiAction::FlowForMultiFileDocs,
        AiAction::PromptForRefactoringSuggestion,
        AiAction::PromptForComplexCodebaseAnalysis,
        AiAction::PromptForSecurityAnalysis,
        AiAction::PromptForPerformanceAnalysis,
        AiAction::PromptForBestPracticesAnalysis,
        AiAction::PromptForBugHunting,
        AiAction::PromptForSingleFileDocs,
        AiAction::PromptForDiagrams,
    ];

    /// Identifier understood by `--ai-action`.
    pub fn as_str(&self) -> &'static str {
        match self {
            AiAction::FlowForDeepFileToFileAnalysis => "flow-for-deep-file-to-file-analysis",
            AiAction::FlowForMultiFileDocs => "flow-for-multi-file-docs",
            AiAction::PromptForRefactoringSuggestion => "prompt-for-refactoring-suggestion",
            AiAction::PromptForComplexCodebaseAnalysis => "prompt-for-complex-codebase-analysis",
            AiAction::PromptForSecurityAnalysis => "prompt-for-security-analysis",
            AiAction::PromptForPerformanceAnalysis => "prompt-for-performance-analysis",
            AiAction::PromptForBestPracticesAnalysis => "prompt-for-best-practices-analysis",
            AiAction::PromptForBugHunting => "prompt-for-bug-hunting",
            AiAction::PromptForSingleFileDocs => "prompt-for-single-file-docs",
            AiAction::PromptForDiagrams => "prompt-for-diagrams",
        }
    }

    /// Whether this action produces a multi-step workflow rather than a single prompt.
    pub fn is_workflow(&self) -> bool {
        self.as_str().starts_with("flow-")
    }
}

impl fmt::Display for AiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiAction {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AiAction::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| RequestError::UnknownAiAction(s.to_string()))
    }
}

/// Kind of documentation requested from `aid_generate_docs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocType {
    /// One file
    SingleFileDocs,
    /// Several related files
    MultiFileDocs,
    /// API reference for a project
    ApiReference,
}

impl DocType {
    /// AI action generating this kind of documentation.
    ///
    /// An unset doc type means single-file documentation.
    pub fn ai_action(doc_type: Option<DocType>) -> AiAction {
        match doc_type {
            Some(DocType::MultiFileDocs) | Some(DocType::ApiReference) => {
                AiAction::FlowForMultiFileDocs
            }
            Some(DocType::SingleFileDocs) | None => AiAction::PromptForSingleFileDocs,
        }
    }
}

impl FromStr for DocType {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single-file-docs" => Ok(DocType::SingleFileDocs),
            "multi-file-docs" => Ok(DocType::MultiFileDocs),
            "api-reference" => Ok(DocType::ApiReference),
            other => Err(RequestError::UnknownDocType(other.to_string())),
        }
    }
}
