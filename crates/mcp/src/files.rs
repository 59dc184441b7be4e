//! Local project listing for `list_files`.

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Arguments of `list_files`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilesParams {
    /// Directory to list, `.` when absent
    pub path: Option<String>,
    /// Glob matched against paths relative to `path`
    pub pattern: Option<String>,
    /// Descend into subdirectories (default: true)
    pub recursive: Option<bool>,
}

/// One listed file.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Path relative to the listed directory
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification, RFC 3339
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Detected language or `unknown`
    pub language: String,
    /// Lower-cased extension including the dot, empty if none
    pub extension: String,
}

/// Result of `list_files`.
#[derive(Debug, Clone, Serialize)]
pub struct FileListing {
    /// Absolute directory that was listed
    pub path: String,
    /// Number of matching files
    pub file_count: usize,
    /// Sum of their sizes
    pub total_size: u64,
    /// Files per language
    pub languages: BTreeMap<String, usize>,
    /// Matching files, sorted by path
    pub files: Vec<FileEntry>,
}

/// List files under `base`.
///
/// Hidden directories are never entered and unreadable directories are
/// skipped; only a missing or unreadable `base` is an error.
pub async fn list_files(
    base: &Path,
    pattern: Option<&str>,
    recursive: bool,
) -> std::io::Result<FileListing> {
    let matcher = pattern
        .filter(|p| !p.is_empty())
        .map(glob_to_regex)
        .transpose()?;

    let metadata = tokio::fs::metadata(base).await?;
    if !metadata.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a directory", base.display()),
        ));
    }

    let mut files = Vec::new();
    let mut pending: VecDeque<PathBuf> = VecDeque::from([base.to_path_buf()]);

    while let Some(dir) = pending.pop_front() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "Stopped reading directory");
                    break;
                }
            };

            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            let full_path = entry.path();

            if file_type.is_dir() {
                let hidden = entry.file_name().to_string_lossy().starts_with('.');
                if recursive && !hidden {
                    pending.push_back(full_path);
                }
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let relative = full_path
                .strip_prefix(base)
                .unwrap_or(&full_path)
                .to_string_lossy()
                .to_string();

            if let Some(matcher) = &matcher {
                if !matcher.is_match(&relative) {
                    continue;
                }
            }

            let Ok(meta) = entry.metadata().await else {
                continue;
            };

            let extension = full_path
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
                .unwrap_or_default();

            files.push(FileEntry {
                path: relative,
                size: meta.len(),
                modified: meta.modified().ok().map(|time| {
                    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
                }),
                language: detect_language(&extension).unwrap_or("unknown").to_string(),
                extension,
            });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));

    let mut languages = BTreeMap::new();
    for file in &files {
        *languages.entry(file.language.clone()).or_insert(0) += 1;
    }

    let root = tokio::fs::canonicalize(base)
        .await
        .unwrap_or_else(|_| base.to_path_buf());

    Ok(FileListing {
        path: root.to_string_lossy().to_string(),
        file_count: files.len(),
        total_size: files.iter().map(|f| f.size).sum(),
        languages,
        files,
    })
}

/// Anchored regex for a glob where `*` is any run and `?` any one character.
fn glob_to_regex(pattern: &str) -> std::io::Result<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    expr.push('$');

    Regex::new(&expr)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))
}

/// Language for a lower-cased extension with its leading dot.
pub fn detect_language(extension: &str) -> Option<&'static str> {
    let language = match extension {
        ".py" | ".pyw" | ".pyi" => "python",
        ".js" | ".mjs" | ".cjs" | ".jsx" => "javascript",
        ".ts" | ".tsx" => "typescript",
        ".go" => "go",
        ".rs" => "rust",
        ".rb" | ".rake" | ".gemspec" => "ruby",
        ".java" => "java",
        ".cs" => "csharp",
        ".kt" | ".kts" => "kotlin",
        ".cpp" | ".cc" | ".cxx" | ".c++" | ".h" | ".hpp" | ".hh" | ".hxx" | ".h++" => "cpp",
        ".php" | ".phtml" | ".php3" | ".php4" | ".php5" | ".php7" | ".phps" | ".inc" => "php",
        ".swift" => "swift",
        _ => return None,
    };
    Some(language)
}
