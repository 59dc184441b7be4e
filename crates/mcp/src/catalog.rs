//! Tool catalog.
//!
//! Every tool is a thin adapter: its arguments are deserialized into a
//! parameter struct and turned into a [`DistillRequest`] for the queue, or
//! answered locally (`list_files`, `get_capabilities`).

use aidmcp_core::{Action, AiAction, DistillOptions, DistillRequest, DocType, OutputFormat};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ToolCallError;
use crate::files::ListFilesParams;

/// Shown when `aid` did not announce where it wrote a prompt.
pub const PROMPT_FILE_FALLBACK: &str = "Check .aid/ directory";

/// Default `--max-depth` for dependency-aware distillation.
pub const DEFAULT_DEPENDENCY_DEPTH: u32 = 2;

/// Tool definition for MCP protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpTool {
    /// Tool name
    pub name: String,
    /// Human-readable title
    pub title: String,
    /// Tool description
    pub description: String,
    /// Input schema for the tool
    pub input_schema: Value,
}

/// Grouping used by `get_capabilities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    /// Plain distillation
    Core,
    /// Single-purpose prompt generators
    Specialized,
    /// Multi-dimension prompts and workflows
    AiWorkflow,
    /// Generic `--ai-action` passthrough
    Legacy,
    /// Answered without `aid`
    Meta,
}

impl ToolCategory {
    /// Every category, in report order.
    pub const ALL: [ToolCategory; 5] = [
        ToolCategory::Core,
        ToolCategory::Specialized,
        ToolCategory::AiWorkflow,
        ToolCategory::Legacy,
        ToolCategory::Meta,
    ];

    /// Key used in the capabilities report.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Core => "core",
            ToolCategory::Specialized => "specialized",
            ToolCategory::AiWorkflow => "ai_workflows",
            ToolCategory::Legacy => "legacy",
            ToolCategory::Meta => "meta",
        }
    }
}

/// Every tool the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// `distill_file`
    DistillFile,
    /// `distill_directory`
    DistillDirectory,
    /// `distill_with_dependencies`
    DistillWithDependencies,
    /// `aid_hunt_bugs`
    HuntBugs,
    /// `aid_suggest_refactoring`
    SuggestRefactoring,
    /// `aid_generate_diagram`
    GenerateDiagram,
    /// `aid_analyze_security`
    AnalyzeSecurity,
    /// `aid_generate_docs`
    GenerateDocs,
    /// `aid_deep_file_analysis`
    DeepFileAnalysis,
    /// `aid_multi_file_docs`
    MultiFileDocs,
    /// `aid_complex_analysis`
    ComplexAnalysis,
    /// `aid_performance_analysis`
    PerformanceAnalysis,
    /// `aid_best_practices`
    BestPractices,
    /// `aid_analyze`
    Analyze,
    /// `list_files`
    ListFiles,
    /// `get_capabilities`
    GetCapabilities,
}

impl ToolKind {
    /// Every tool, in listing order.
    pub const ALL: [ToolKind; 16] = [
        ToolKind::DistillFile,
        ToolKind::DistillDirectory,
        ToolKind::DistillWithDependencies,
        ToolKind::HuntBugs,
        ToolKind::SuggestRefactoring,
        ToolKind::GenerateDiagram,
        ToolKind::AnalyzeSecurity,
        ToolKind::GenerateDocs,
        ToolKind::DeepFileAnalysis,
        ToolKind::MultiFileDocs,
        ToolKind::ComplexAnalysis,
        ToolKind::PerformanceAnalysis,
        ToolKind::BestPractices,
        ToolKind::Analyze,
        ToolKind::ListFiles,
        ToolKind::GetCapabilities,
    ];

    /// Name used in `tools/call`.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::DistillFile => "distill_file",
            ToolKind::DistillDirectory => "distill_directory",
            ToolKind::DistillWithDependencies => "distill_with_dependencies",
            ToolKind::HuntBugs => "aid_hunt_bugs",
            ToolKind::SuggestRefactoring => "aid_suggest_refactoring",
            ToolKind::GenerateDiagram => "aid_generate_diagram",
            ToolKind::AnalyzeSecurity => "aid_analyze_security",
            ToolKind::GenerateDocs => "aid_generate_docs",
            ToolKind::DeepFileAnalysis => "aid_deep_file_analysis",
            ToolKind::MultiFileDocs => "aid_multi_file_docs",
            ToolKind::ComplexAnalysis => "aid_complex_analysis",
            ToolKind::PerformanceAnalysis => "aid_performance_analysis",
            ToolKind::BestPractices => "aid_best_practices",
            ToolKind::Analyze => "aid_analyze",
            ToolKind::ListFiles => "list_files",
            ToolKind::GetCapabilities => "get_capabilities",
        }
    }

    /// Look a tool up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|tool| tool.name() == name)
    }

    /// Capabilities grouping.
    pub fn category(&self) -> ToolCategory {
        match self {
            ToolKind::DistillFile | ToolKind::DistillDirectory | ToolKind::DistillWithDependencies => {
                ToolCategory::Core
            }
            ToolKind::HuntBugs
            | ToolKind::SuggestRefactoring
            | ToolKind::GenerateDiagram
            | ToolKind::AnalyzeSecurity
            | ToolKind::GenerateDocs => ToolCategory::Specialized,
            ToolKind::DeepFileAnalysis
            | ToolKind::MultiFileDocs
            | ToolKind::ComplexAnalysis
            | ToolKind::PerformanceAnalysis
            | ToolKind::BestPractices => ToolCategory::AiWorkflow,
            ToolKind::Analyze => ToolCategory::Legacy,
            ToolKind::ListFiles | ToolKind::GetCapabilities => ToolCategory::Meta,
        }
    }

    /// Whether calls go through the execution queue.
    pub fn uses_aid(&self) -> bool {
        self.category() != ToolCategory::Meta
    }

    /// One-line summary for the capabilities report.
    pub fn summary(&self) -> &'static str {
        match self {
            ToolKind::DistillFile => "Extract structure from single files",
            ToolKind::DistillDirectory => "Extract structure from directories",
            ToolKind::DistillWithDependencies => {
                "Dependency-aware distillation with call graph analysis"
            }
            ToolKind::HuntBugs => "Systematic bug detection",
            ToolKind::SuggestRefactoring => "Code improvement suggestions",
            ToolKind::GenerateDiagram => "Architecture visualization",
            ToolKind::AnalyzeSecurity => "Security vulnerability detection",
            ToolKind::GenerateDocs => "Documentation generation",
            ToolKind::DeepFileAnalysis => "File-by-file deep analysis",
            ToolKind::MultiFileDocs => "Multi-file documentation",
            ToolKind::ComplexAnalysis => "Enterprise-grade analysis",
            ToolKind::PerformanceAnalysis => "Performance optimization",
            ToolKind::BestPractices => "Code quality assessment",
            ToolKind::Analyze => "Generic AI action interface",
            ToolKind::ListFiles => "File exploration",
            ToolKind::GetCapabilities => "Server capabilities report",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ToolKind::DistillFile => "Extract Code Structure from File",
            ToolKind::DistillDirectory => "Extract Code Structure from Directory",
            ToolKind::DistillWithDependencies => "Dependency-Aware Code Distillation",
            ToolKind::HuntBugs => "Hunt for Bugs and Quality Issues",
            ToolKind::SuggestRefactoring => "Suggest Code Refactoring Opportunities",
            ToolKind::GenerateDiagram => "Generate Architecture Diagrams",
            ToolKind::AnalyzeSecurity => "Perform Security Analysis",
            ToolKind::GenerateDocs => "Generate Documentation",
            ToolKind::DeepFileAnalysis => "Deep File-by-File Analysis Workflow",
            ToolKind::MultiFileDocs => "Multi-File Documentation Workflow",
            ToolKind::ComplexAnalysis => "Complex Codebase Analysis",
            ToolKind::PerformanceAnalysis => "Performance Analysis",
            ToolKind::BestPractices => "Best Practices Analysis",
            ToolKind::Analyze => "AI Prompt Generation",
            ToolKind::ListFiles => "List Project Files",
            ToolKind::GetCapabilities => "Get AI Distiller Capabilities",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            ToolKind::DistillFile => {
                "Extracts the essential code structure of a single file: signatures, types and \
                 public API with implementation details removed. Language is detected automatically."
            }
            ToolKind::DistillDirectory => {
                "Extracts the essential code structure of every supported file in a directory. \
                 Supports visibility filters, file patterns and several output formats."
            }
            ToolKind::DistillWithDependencies => {
                "Follows calls from the target file across the codebase and distills only the \
                 methods and types actually reached, up to the given depth."
            }
            ToolKind::HuntBugs => {
                "Generates a bug-hunting prompt with distilled code. The response names the \
                 prompt file; read it and follow its instructions to perform the analysis."
            }
            ToolKind::SuggestRefactoring => {
                "Generates a refactoring prompt with distilled code for the given goal. The \
                 response names the prompt file to follow."
            }
            ToolKind::GenerateDiagram => {
                "Generates a prompt for producing Mermaid architecture diagrams from distilled \
                 code. The response names the prompt file to follow."
            }
            ToolKind::AnalyzeSecurity => {
                "Generates a security audit prompt (OWASP Top 10 focus) with distilled code. \
                 The response names the prompt file to follow."
            }
            ToolKind::GenerateDocs => {
                "Generates documentation prompts with distilled code, for a single file or a \
                 multi-file workflow."
            }
            ToolKind::DeepFileAnalysis => {
                "Generates a task list and prompts for a systematic file-by-file review across \
                 security, performance, maintainability and readability."
            }
            ToolKind::MultiFileDocs => {
                "Generates a documentation workflow covering several files and the relationships \
                 between them."
            }
            ToolKind::ComplexAnalysis => {
                "Generates an architecture-level analysis prompt with full codebase context."
            }
            ToolKind::PerformanceAnalysis => {
                "Generates a performance analysis prompt focused on bottlenecks and algorithmic \
                 complexity."
            }
            ToolKind::BestPractices => {
                "Generates a code quality prompt assessing design patterns and clean code \
                 principles."
            }
            ToolKind::Analyze => {
                "Runs any aid --ai-action directly. Generates prompt files; it does not perform \
                 the analysis itself. Prefer the specialized tools when one fits."
            }
            ToolKind::ListFiles => {
                "Lists project files with language detection and size statistics. Useful before \
                 choosing what to distill."
            }
            ToolKind::GetCapabilities => {
                "Describes the server, its tools, supported languages, formats and AI actions."
            }
        }
    }

    fn input_schema(&self) -> Value {
        match self {
            ToolKind::DistillFile => {
                let mut props = vec![("file_path", string("Path to the file to distill"))];
                props.extend(content_properties());
                object(props, &["file_path"])
            }
            ToolKind::DistillDirectory => {
                let mut props = vec![
                    ("directory_path", string("Path to the directory to distill")),
                    (
                        "recursive",
                        boolean("Process subdirectories recursively (default: true)"),
                    ),
                ];
                props.extend(content_properties());
                props.extend(pattern_properties());
                object(props, &["directory_path"])
            }
            ToolKind::DistillWithDependencies => {
                let mut props = vec![
                    ("file_path", string("Target file to analyze")),
                    (
                        "max_depth",
                        json!({
                            "type": "integer",
                            "minimum": 0,
                            "default": DEFAULT_DEPENDENCY_DEPTH,
                            "description": "Maximum depth to follow dependencies (default: 2)"
                        }),
                    ),
                ];
                props.extend(content_properties());
                object(props, &["file_path"])
            }
            ToolKind::GenerateDocs => {
                let mut props = vec![
                    ("target_path", string("Path to file or directory to document")),
                    (
                        "doc_type",
                        string_enum(
                            &["single-file-docs", "multi-file-docs", "api-reference"],
                            "Type of documentation to generate",
                        ),
                    ),
                    (
                        "audience",
                        string("Target audience (e.g. 'developers', 'api-users', 'contributors')"),
                    ),
                ];
                props.extend(pattern_properties());
                object(props, &["target_path"])
            }
            ToolKind::Analyze => {
                let actions: Vec<&str> = AiAction::ALL.iter().map(|a| a.as_str()).collect();
                let mut props = vec![
                    ("ai_action", string_enum(&actions, "AI action to perform")),
                    ("target_path", string("Path to analyze")),
                    (
                        "user_query",
                        string("Additional context or specific query, passed as --ai-query"),
                    ),
                ];
                props.extend(content_properties());
                props.extend(pattern_properties());
                object(props, &["ai_action", "target_path"])
            }
            ToolKind::ListFiles => object(
                vec![
                    ("path", string("Path to list (default: current directory)")),
                    (
                        "pattern",
                        string("Glob matched against the relative path ('*' and '?')"),
                    ),
                    ("recursive", boolean("List recursively (default: true)")),
                ],
                &[],
            ),
            ToolKind::GetCapabilities => object(Vec::new(), &[]),
            analysis => analysis_schema(*analysis),
        }
    }

    /// MCP definition of this tool.
    pub fn definition(&self) -> McpTool {
        McpTool {
            name: self.name().to_string(),
            title: self.title().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }

    /// Validate arguments and decide how the call is answered.
    pub fn prepare(&self, arguments: Value) -> Result<Invocation, ToolCallError> {
        let arguments = match arguments {
            Value::Null => json!({}),
            other => other,
        };

        match self {
            ToolKind::DistillFile => {
                let params: DistillFileParams = self.parse(arguments)?;
                let mut options = DistillOptions::new();
                params.content.apply(&mut options);
                let request =
                    DistillRequest::new(params.file_path, Action::Distill)?.with_options(options);
                Ok(self.aid(request, None))
            }
            ToolKind::DistillDirectory => {
                let params: DistillDirectoryParams = self.parse(arguments)?;
                let mut options = DistillOptions::new()
                    .with_patterns(params.include_patterns, params.exclude_patterns);
                params.content.apply(&mut options);
                if let Some(recursive) = params.recursive {
                    options.recursive = recursive;
                }
                let request = DistillRequest::new(params.directory_path, Action::Distill)?
                    .with_options(options);
                Ok(self.aid(request, None))
            }
            ToolKind::DistillWithDependencies => {
                let params: DependencyParams = self.parse(arguments)?;
                let depth = params
                    .max_depth
                    .filter(|depth| *depth > 0)
                    .unwrap_or(DEFAULT_DEPENDENCY_DEPTH);
                let mut options = DistillOptions::new().with_max_depth(depth);
                params.content.apply(&mut options);
                let request = DistillRequest::new(params.file_path, Action::DependencyAware)?
                    .with_options(options);
                Ok(self.aid(request, None))
            }
            ToolKind::Analyze => {
                let params: GenericParams = self.parse(arguments)?;
                let mut options = DistillOptions::new()
                    .with_patterns(params.include_patterns, params.exclude_patterns);
                params.content.apply(&mut options);
                if let Some(query) = params.user_query {
                    options = options.with_ai_query(query);
                }
                let request =
                    DistillRequest::new(params.target_path, params.ai_action)?.with_options(options);
                Ok(self.aid(request, None))
            }
            ToolKind::ListFiles => Ok(Invocation::ListFiles(self.parse(arguments)?)),
            ToolKind::GetCapabilities => Ok(Invocation::Capabilities),
            analysis => {
                let params: AnalysisParams = self.parse(arguments)?;
                analysis.prepare_analysis(params)
            }
        }
    }

    fn prepare_analysis(&self, params: AnalysisParams) -> Result<Invocation, ToolCallError> {
        let action = match self {
            ToolKind::HuntBugs => AiAction::PromptForBugHunting,
            ToolKind::SuggestRefactoring => AiAction::PromptForRefactoringSuggestion,
            ToolKind::GenerateDiagram => AiAction::PromptForDiagrams,
            ToolKind::AnalyzeSecurity => AiAction::PromptForSecurityAnalysis,
            ToolKind::GenerateDocs => DocType::ai_action(params.doc_type),
            ToolKind::DeepFileAnalysis => AiAction::FlowForDeepFileToFileAnalysis,
            ToolKind::MultiFileDocs => AiAction::FlowForMultiFileDocs,
            ToolKind::ComplexAnalysis => AiAction::PromptForComplexCodebaseAnalysis,
            ToolKind::PerformanceAnalysis => AiAction::PromptForPerformanceAnalysis,
            ToolKind::BestPractices => AiAction::PromptForBestPracticesAnalysis,
            other => {
                return Err(ToolCallError::InvalidParams {
                    tool: other.name().to_string(),
                    message: "not an analysis tool".to_string(),
                })
            }
        };

        let note = match self {
            ToolKind::SuggestRefactoring => Some(
                params
                    .refactoring_goal
                    .filter(|goal| !goal.trim().is_empty())
                    .ok_or_else(|| ToolCallError::InvalidParams {
                        tool: self.name().to_string(),
                        message: "refactoring_goal is required".to_string(),
                    })?,
            ),
            ToolKind::HuntBugs => params.focus_area,
            ToolKind::GenerateDiagram => params.diagram_focus,
            ToolKind::AnalyzeSecurity => params.security_focus,
            ToolKind::GenerateDocs => params.audience,
            _ => None,
        };

        let (private_default, implementation_default) = self.visibility_defaults();
        let mut options = DistillOptions::new()
            .with_patterns(params.include_patterns, params.exclude_patterns);
        if let Some(default) = private_default {
            options = options.with_all_visibility(params.include_private.unwrap_or(default));
        }
        if let Some(default) = implementation_default {
            options = options.with_implementation(params.include_implementation.unwrap_or(default));
        }

        let request = DistillRequest::new(params.target_path, action)?.with_options(options);
        Ok(self.aid(request, note))
    }

    /// Defaults of `include_private` and `include_implementation`, `None` when
    /// the tool does not offer the option.
    fn visibility_defaults(&self) -> (Option<bool>, Option<bool>) {
        match self {
            ToolKind::HuntBugs | ToolKind::BestPractices => (Some(true), None),
            ToolKind::SuggestRefactoring | ToolKind::PerformanceAnalysis => (None, Some(true)),
            ToolKind::AnalyzeSecurity | ToolKind::DeepFileAnalysis | ToolKind::ComplexAnalysis => {
                (Some(true), Some(true))
            }
            _ => (None, None),
        }
    }

    fn parse<T: DeserializeOwned>(&self, arguments: Value) -> Result<T, ToolCallError> {
        serde_json::from_value(arguments).map_err(|e| ToolCallError::InvalidParams {
            tool: self.name().to_string(),
            message: e.to_string(),
        })
    }

    fn aid(&self, request: DistillRequest, note: Option<String>) -> Invocation {
        Invocation::Aid(AidCall {
            tool: *self,
            request,
            note,
        })
    }
}

/// How a validated tool call is answered.
#[derive(Debug)]
pub enum Invocation {
    /// One queued `aid` run
    Aid(AidCall),
    /// Local directory listing
    ListFiles(ListFilesParams),
    /// Local capabilities report
    Capabilities,
}

/// A validated call that runs `aid` once.
#[derive(Debug, Clone)]
pub struct AidCall {
    tool: ToolKind,
    request: DistillRequest,
    note: Option<String>,
}

impl AidCall {
    /// Tool that produced this call.
    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Request handed to the command builder.
    pub fn request(&self) -> &DistillRequest {
        &self.request
    }

    /// Noun used when `aid` printed nothing.
    pub fn subject(&self) -> &'static str {
        match self.tool {
            ToolKind::DistillFile | ToolKind::DistillWithDependencies => "File",
            ToolKind::DistillDirectory => "Directory",
            _ => "Target",
        }
    }

    /// Wrap the payload in the tool's response text.
    pub fn render(&self, payload: String) -> String {
        let focus = self
            .note
            .as_deref()
            .filter(|note| !note.trim().is_empty())
            .map(|note| format!("Focus: {}\n\n", note))
            .unwrap_or_default();

        match self.tool {
            ToolKind::HuntBugs => format!(
                "Bug hunting prompt generated successfully!\n\nPrompt file: {}\n\n{}AI agents should read this file and follow the instructions to perform bug analysis.\n\n{}",
                prompt_file(&payload, "Bug Analysis Prompt"),
                focus,
                payload
            ),
            ToolKind::SuggestRefactoring => format!(
                "Refactoring prompt generated for goal: \"{}\"\n\nPrompt file: {}\n\nAI agents should read this file and follow the instructions to provide refactoring suggestions.\n\n{}",
                self.note.as_deref().unwrap_or_default(),
                prompt_file(&payload, "Refactoring Analysis Prompt"),
                payload
            ),
            ToolKind::GenerateDiagram => format!(
                "Diagram generation prompt created!\n\nDiagram file: {}\n\n{}The file contains prompts for generating 10 different architectural diagrams in Mermaid format.\n\n{}",
                prompt_file(&payload, "Diagram Generation Prompt"),
                focus,
                payload
            ),
            ToolKind::AnalyzeSecurity => format!(
                "Security analysis prompt generated!\n\nPrompt file: {}\n\n{}AI agents should read this file and follow the instructions to perform security analysis with OWASP Top 10 focus.\n\n{}",
                prompt_file(&payload, "Security Analysis Prompt"),
                focus,
                payload
            ),
            ToolKind::GenerateDocs => format!(
                "Documentation generation prompt created!\n\nTarget audience: {}\n\n{}",
                self.note
                    .as_deref()
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or("general"),
                payload
            ),
            ToolKind::DeepFileAnalysis => format!(
                "Deep file-by-file analysis workflow generated!\n\n{}\n\n💡 AI agents should read the Task List file and follow all instructions to systematically analyze each file.",
                payload
            ),
            ToolKind::MultiFileDocs => format!(
                "Multi-file documentation workflow generated!\n\n{}\n\n📚 The workflow includes prompts for creating interconnected documentation with proper cross-references.",
                payload
            ),
            ToolKind::ComplexAnalysis => format!(
                "Complex codebase analysis prompt generated!\n\n{}\n\n🏗️ The prompt includes guidance for creating architecture diagrams and strategic recommendations.",
                payload
            ),
            ToolKind::PerformanceAnalysis => format!(
                "Performance analysis prompt generated!\n\n{}\n\n⚡ The analysis focuses on identifying bottlenecks and optimization opportunities.",
                payload
            ),
            ToolKind::BestPractices => format!(
                "Best practices analysis prompt generated!\n\n{}\n\n✨ The analysis covers code quality, design patterns, and clean code principles.",
                payload
            ),
            _ => payload,
        }
    }
}

/// Path `aid` printed after `📋 <label>: `, or a pointer to `.aid/`.
fn prompt_file(payload: &str, label: &str) -> String {
    Regex::new(&format!("📋 {}: (.+)", regex::escape(label)))
        .ok()
        .and_then(|re| {
            re.captures(payload)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .unwrap_or_else(|| PROMPT_FILE_FALLBACK.to_string())
}

/// Visibility and content switches shared by the distillation tools.
#[derive(Debug, Default, Deserialize)]
struct ContentParams {
    include_private: Option<bool>,
    include_protected: Option<bool>,
    include_internal: Option<bool>,
    include_implementation: Option<bool>,
    include_comments: Option<bool>,
    include_fields: Option<bool>,
    include_methods: Option<bool>,
    output_format: Option<OutputFormat>,
}

impl ContentParams {
    fn apply(&self, options: &mut DistillOptions) {
        let set = |slot: &mut bool, value: Option<bool>| {
            if let Some(value) = value {
                *slot = value;
            }
        };
        set(&mut options.include_private, self.include_private);
        set(&mut options.include_protected, self.include_protected);
        set(&mut options.include_internal, self.include_internal);
        set(&mut options.include_implementation, self.include_implementation);
        set(&mut options.include_comments, self.include_comments);
        set(&mut options.include_fields, self.include_fields);
        set(&mut options.include_methods, self.include_methods);
        if self.output_format.is_some() {
            options.format = self.output_format;
        }
    }
}

#[derive(Debug, Deserialize)]
struct DistillFileParams {
    file_path: String,
    #[serde(flatten)]
    content: ContentParams,
}

#[derive(Debug, Deserialize)]
struct DistillDirectoryParams {
    directory_path: String,
    recursive: Option<bool>,
    include_patterns: Option<String>,
    exclude_patterns: Option<String>,
    #[serde(flatten)]
    content: ContentParams,
}

#[derive(Debug, Deserialize)]
struct DependencyParams {
    file_path: String,
    max_depth: Option<u32>,
    #[serde(flatten)]
    content: ContentParams,
}

#[derive(Debug, Deserialize)]
struct GenericParams {
    ai_action: AiAction,
    target_path: String,
    user_query: Option<String>,
    include_patterns: Option<String>,
    exclude_patterns: Option<String>,
    #[serde(flatten)]
    content: ContentParams,
}

/// Arguments of the specialized and workflow tools; each tool reads the
/// fields its schema offers.
#[derive(Debug, Deserialize)]
struct AnalysisParams {
    target_path: String,
    include_private: Option<bool>,
    include_implementation: Option<bool>,
    include_patterns: Option<String>,
    exclude_patterns: Option<String>,
    focus_area: Option<String>,
    refactoring_goal: Option<String>,
    diagram_focus: Option<String>,
    security_focus: Option<String>,
    doc_type: Option<DocType>,
    audience: Option<String>,
}

fn analysis_schema(tool: ToolKind) -> Value {
    let mut props = vec![("target_path", string("Path to file or directory to analyze"))];
    let mut required = vec!["target_path"];

    match tool {
        ToolKind::HuntBugs => props.push((
            "focus_area",
            string("Specific area to focus on (e.g. 'concurrency', 'memory leaks', 'error handling')"),
        )),
        ToolKind::SuggestRefactoring => {
            props.push((
                "refactoring_goal",
                string("Goal of refactoring (e.g. 'improve readability', 'reduce complexity')"),
            ));
            required.push("refactoring_goal");
        }
        ToolKind::GenerateDiagram => props.push((
            "diagram_focus",
            string("Specific diagram focus (e.g. 'data flow', 'class hierarchy', 'module dependencies')"),
        )),
        ToolKind::AnalyzeSecurity => props.push((
            "security_focus",
            string("Specific security concern (e.g. 'SQL injection', 'XSS', 'authentication')"),
        )),
        _ => {}
    }

    let (private_default, implementation_default) = tool.visibility_defaults();
    if private_default.is_some() {
        props.push((
            "include_private",
            boolean("Include all visibility levels: private, protected and internal (default: true)"),
        ));
    }
    if implementation_default.is_some() {
        props.push((
            "include_implementation",
            boolean("Include implementation details (default: true)"),
        ));
    }
    props.extend(pattern_properties());

    object(props, &required)
}

fn content_properties() -> Vec<(&'static str, Value)> {
    let formats: Vec<&str> = OutputFormat::ALL.iter().map(|f| f.as_str()).collect();
    vec![
        ("include_private", boolean("Include private members (default: false)")),
        ("include_protected", boolean("Include protected members (default: false)")),
        (
            "include_internal",
            boolean("Include internal/package-private members (default: false)"),
        ),
        (
            "include_implementation",
            boolean("Include function/method bodies (default: false)"),
        ),
        ("include_comments", boolean("Include comments (default: false)")),
        ("include_fields", boolean("Include fields/properties (default: true)")),
        ("include_methods", boolean("Include methods/functions (default: true)")),
        ("output_format", string_enum(&formats, "Output format (default: text)")),
    ]
}

fn pattern_properties() -> Vec<(&'static str, Value)> {
    vec![
        (
            "include_patterns",
            string("File patterns to include (comma-separated, e.g. '*.go,*.py')"),
        ),
        (
            "exclude_patterns",
            string("File patterns to exclude (comma-separated, e.g. '*test*,vendor/**')"),
        ),
    ]
}

fn object(properties: Vec<(&'static str, Value)>, required: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = properties
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect();

    let mut schema = json!({
        "type": "object",
        "properties": properties
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn string(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn boolean(description: &str) -> Value {
    json!({"type": "boolean", "description": description})
}

fn string_enum(values: &[&str], description: &str) -> Value {
    json!({"type": "string", "enum": values, "description": description})
}

#[cfg(test)]
mod tests {
    use super::*;
    use aidmcp_core::{CommandBuilder, RequestError};
    use std::collections::HashSet;

    fn argv(tool: ToolKind, arguments: Value) -> Vec<String> {
        match tool.prepare(arguments).unwrap() {
            Invocation::Aid(call) => CommandBuilder::build(call.request()).into_inner(),
            other => panic!("expected aid call, got {:?}", other),
        }
    }

    fn call(tool: ToolKind, arguments: Value) -> AidCall {
        match tool.prepare(arguments).unwrap() {
            Invocation::Aid(call) => call,
            other => panic!("expected aid call, got {:?}", other),
        }
    }

    #[test]
    fn test_catalog_is_complete_and_unique() {
        let names: HashSet<_> = ToolKind::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), 16);

        for tool in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(tool.name()), Some(tool));
            let definition = tool.definition();
            assert_eq!(definition.input_schema["type"], "object");
            assert!(definition.input_schema["properties"].is_object());
            assert!(!definition.description.is_empty());
        }
        assert_eq!(ToolKind::from_name("summarize_repo"), None);
    }

    #[test]
    fn test_definition_uses_camel_case_schema_key() {
        let value = serde_json::to_value(ToolKind::DistillFile.definition()).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert_eq!(value["inputSchema"]["required"], json!(["file_path"]));
    }

    #[test]
    fn test_distill_file_defaults() {
        assert_eq!(
            argv(ToolKind::DistillFile, json!({"file_path": "src/main.py"})),
            vec!["src/main.py", "--stdout", "--show-ai-agent-instructions"]
        );
    }

    #[test]
    fn test_distill_file_options() {
        let args = argv(
            ToolKind::DistillFile,
            json!({
                "file_path": "a.ts",
                "include_private": true,
                "include_comments": true,
                "include_fields": false,
                "include_methods": true,
                "output_format": "json-structured"
            }),
        );
        assert_eq!(
            args,
            vec![
                "a.ts",
                "--stdout",
                "--show-ai-agent-instructions",
                "--format=json-structured",
                "--private=1",
                "--comments=1",
                "--fields=0"
            ]
        );
    }

    #[test]
    fn test_distill_directory() {
        let args = argv(
            ToolKind::DistillDirectory,
            json!({
                "directory_path": "src",
                "recursive": false,
                "include_patterns": "*.go,*.py",
                "exclude_patterns": ""
            }),
        );
        assert_eq!(
            args,
            vec![
                "src",
                "--stdout",
                "--show-ai-agent-instructions",
                "--recursive=0",
                "--include=*.go,*.py"
            ]
        );
    }

    #[test]
    fn test_dependency_depth_defaults_to_two() {
        let args = argv(ToolKind::DistillWithDependencies, json!({"file_path": "main.go"}));
        assert_eq!(
            args,
            vec![
                "main.go",
                "--dependency-aware",
                "--stdout",
                "--show-ai-agent-instructions",
                "--max-depth=2"
            ]
        );

        let zero = argv(
            ToolKind::DistillWithDependencies,
            json!({"file_path": "main.go", "max_depth": 0}),
        );
        assert!(zero.contains(&"--max-depth=2".to_string()));

        let deep = argv(
            ToolKind::DistillWithDependencies,
            json!({"file_path": "main.go", "max_depth": 5}),
        );
        assert!(deep.contains(&"--max-depth=5".to_string()));
    }

    #[test]
    fn test_hunt_bugs_expands_private_by_default() {
        assert_eq!(
            argv(ToolKind::HuntBugs, json!({"target_path": "src"})),
            vec![
                "src",
                "--ai-action=prompt-for-bug-hunting",
                "--private=1",
                "--protected=1",
                "--internal=1"
            ]
        );
        assert_eq!(
            argv(
                ToolKind::HuntBugs,
                json!({"target_path": "src", "include_private": false})
            ),
            vec!["src", "--ai-action=prompt-for-bug-hunting"]
        );
    }

    #[test]
    fn test_security_defaults() {
        assert_eq!(
            argv(
                ToolKind::AnalyzeSecurity,
                json!({"target_path": "api", "exclude_patterns": "*_test.go"})
            ),
            vec![
                "api",
                "--ai-action=prompt-for-security-analysis",
                "--private=1",
                "--protected=1",
                "--internal=1",
                "--implementation=1",
                "--exclude=*_test.go"
            ]
        );
    }

    #[test]
    fn test_options_not_offered_are_ignored() {
        // aid_generate_diagram has no visibility switches
        assert_eq!(
            argv(
                ToolKind::GenerateDiagram,
                json!({"target_path": ".", "include_private": true})
            ),
            vec![".", "--ai-action=prompt-for-diagrams"]
        );
    }

    #[test]
    fn test_refactoring_requires_goal() {
        let err = ToolKind::SuggestRefactoring
            .prepare(json!({"target_path": "src"}))
            .unwrap_err();
        assert!(err.is_protocol_error());
        assert!(err.to_string().contains("refactoring_goal"));

        let args = argv(
            ToolKind::SuggestRefactoring,
            json!({"target_path": "src", "refactoring_goal": "reduce complexity"}),
        );
        assert_eq!(
            args,
            vec![
                "src",
                "--ai-action=prompt-for-refactoring-suggestion",
                "--implementation=1"
            ]
        );
    }

    #[test]
    fn test_generate_docs_action_from_doc_type() {
        assert_eq!(
            argv(ToolKind::GenerateDocs, json!({"target_path": "lib"})),
            vec!["lib", "--ai-action=prompt-for-single-file-docs"]
        );
        assert_eq!(
            argv(
                ToolKind::GenerateDocs,
                json!({"target_path": "lib", "doc_type": "api-reference"})
            ),
            vec!["lib", "--ai-action=flow-for-multi-file-docs"]
        );
    }

    #[test]
    fn test_workflow_tools() {
        assert_eq!(
            argv(ToolKind::PerformanceAnalysis, json!({"target_path": "x"})),
            vec![
                "x",
                "--ai-action=prompt-for-performance-analysis",
                "--implementation=1"
            ]
        );
        assert_eq!(
            argv(ToolKind::MultiFileDocs, json!({"target_path": "x"})),
            vec!["x", "--ai-action=flow-for-multi-file-docs"]
        );
        assert_eq!(
            argv(
                ToolKind::BestPractices,
                json!({"target_path": "x", "include_private": false})
            ),
            vec!["x", "--ai-action=prompt-for-best-practices-analysis"]
        );
    }

    #[test]
    fn test_analyze_forwards_query() {
        let args = argv(
            ToolKind::Analyze,
            json!({
                "ai_action": "prompt-for-bug-hunting",
                "target_path": "pkg",
                "user_query": "focus on locking; ignore `tests`",
                "include_implementation": true
            }),
        );
        assert_eq!(
            args,
            vec![
                "pkg",
                "--ai-action=prompt-for-bug-hunting",
                "--implementation=1",
                "--ai-query=focus on locking; ignore `tests`"
            ]
        );
    }

    #[test]
    fn test_invalid_arguments() {
        let err = ToolKind::Analyze
            .prepare(json!({"ai_action": "prompt-for-poetry", "target_path": "x"}))
            .unwrap_err();
        assert!(matches!(err, ToolCallError::InvalidParams { .. }));

        let err = ToolKind::DistillFile
            .prepare(json!({"file_path": "a.py", "output_format": "yaml"}))
            .unwrap_err();
        assert!(matches!(err, ToolCallError::InvalidParams { .. }));

        let err = ToolKind::DistillFile.prepare(json!({})).unwrap_err();
        assert!(err.to_string().contains("file_path"));

        let err = ToolKind::DistillFile
            .prepare(json!({"file_path": "  "}))
            .unwrap_err();
        assert!(matches!(err, ToolCallError::Request(RequestError::EmptyTarget)));

        let err = ToolKind::AnalyzeSecurity
            .prepare(json!({"target_path": "--private=1"}))
            .unwrap_err();
        assert!(matches!(err, ToolCallError::Request(RequestError::FlagLikeTarget(_))));
        assert!(err.is_protocol_error());
    }

    #[test]
    fn test_meta_tools_are_local() {
        assert!(matches!(
            ToolKind::GetCapabilities.prepare(Value::Null).unwrap(),
            Invocation::Capabilities
        ));
        assert!(matches!(
            ToolKind::ListFiles.prepare(json!({"pattern": "*.rs"})).unwrap(),
            Invocation::ListFiles(_)
        ));
        assert!(!ToolKind::ListFiles.uses_aid());
        assert!(ToolKind::HuntBugs.uses_aid());
    }

    #[test]
    fn test_render_extracts_prompt_file() {
        let hunt = call(ToolKind::HuntBugs, json!({"target_path": "src"}));
        let payload = "Working...\n📋 Bug Analysis Prompt: .aid/prompt.bugs.md\nDone".to_string();
        let text = hunt.render(payload.clone());
        assert!(text.starts_with(
            "Bug hunting prompt generated successfully!\n\nPrompt file: .aid/prompt.bugs.md\n\n"
        ));
        assert!(text.ends_with(&payload));

        let text = hunt.render("nothing announced".to_string());
        assert!(text.contains("Prompt file: Check .aid/ directory"));
    }

    #[test]
    fn test_render_echoes_goal_and_audience() {
        let refactor = call(
            ToolKind::SuggestRefactoring,
            json!({"target_path": "src", "refactoring_goal": "modernize code"}),
        );
        assert!(refactor
            .render(String::new())
            .starts_with("Refactoring prompt generated for goal: \"modernize code\""));

        let docs = call(ToolKind::GenerateDocs, json!({"target_path": "src"}));
        assert!(docs.render("X".into()).contains("Target audience: general"));
    }

    #[test]
    fn test_core_tools_return_payload_unchanged() {
        let distill = call(ToolKind::DistillFile, json!({"file_path": "a.py"}));
        assert_eq!(distill.render("payload".into()), "payload");
        assert_eq!(distill.subject(), "File");

        let dir = call(ToolKind::DistillDirectory, json!({"directory_path": "."}));
        assert_eq!(dir.subject(), "Directory");
    }
}
