//! Reference linting - static analysis of OpenAPI document files.
//!
//! Checks document files for:
//! - JSON/YAML syntax errors
//! - `$ref` pointers with nothing at the target location
//! - `$ref` pointers that traverse a scalar
//! - circular references (which fail resolution unless cycles are preserved)
//! - external references, which are left in place unresolved
//! - documents with no `application/vnd.api+json` content to lint

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ResolveError;
use crate::loader::{load_document, DocumentFormat};
use crate::pointer::{self, escape};
use crate::resolver::resolve_refs;
use crate::ruleset::Severity;
use crate::types::{CyclePolicy, Node, RefOptions};

/// Media type the JSON:API rules apply to.
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON Pointer to the offending node (e.g. "/paths/~1articles/get").
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all `.json`, `.yaml` and
/// `.yml` files. If `strict` is true, files with warnings count as failed.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_document_files(path);
    let mut results = Vec::new();
    let mut total_errors = 0;
    let mut total_warnings = 0;

    for file in &files {
        let file_result = lint_file(file, path);
        total_errors += count(&file_result, Severity::Error);
        total_warnings += count(&file_result, Severity::Warn);
        results.push(file_result);
    }

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors: total_errors,
        warnings: total_warnings,
        results,
    }
}

/// Lint a single document file.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let display = file.strip_prefix(base_path).unwrap_or(file).to_path_buf();
    let display = if display.as_os_str().is_empty() {
        file.to_path_buf()
    } else {
        display
    };

    let document = match load_document(file) {
        Ok(doc) => doc,
        Err(e) => {
            return FileResult {
                file: display,
                status: FileStatus::Error,
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    code: "E001".to_string(),
                    file: file.to_path_buf(),
                    path: "/".to_string(),
                    message: format!("syntax error: {}", e),
                }],
            };
        }
    };

    let diagnostics = lint_document(&document, file);
    let status = if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        FileStatus::Error
    } else if diagnostics.is_empty() {
        FileStatus::Ok
    } else {
        FileStatus::Warning
    };

    FileResult {
        file: display,
        status,
        diagnostics,
    }
}

/// Lint an already-parsed document.
pub fn lint_document(document: &Value, file: &Path) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut occurrences = BTreeMap::new();
    collect_refs(document, "", &mut occurrences);

    let mut followable = Vec::new();
    for (ptr, paths) in &occurrences {
        if !pointer::is_local(ptr) {
            for path in paths {
                diagnostics.push(diagnostic(
                    Severity::Warn,
                    "W002",
                    file,
                    path,
                    format!("external reference left unresolved: {}", ptr),
                ));
            }
            continue;
        }

        match pointer::navigate(document, ptr) {
            Ok(_) => followable.push(ptr.as_str()),
            Err(e) => {
                let code = match e {
                    ResolveError::InvalidReferencePath { .. } => "E003",
                    _ => "E002",
                };
                for path in paths {
                    diagnostics.push(diagnostic(Severity::Error, code, file, path, e.to_string()));
                }
            }
        }
    }

    // Preserve cycles so one traversal reports every pointer that closes one.
    let options = RefOptions::new().prune(false).on_cycle(CyclePolicy::Preserve);
    let mut circular = BTreeSet::new();
    for ptr in followable {
        match resolve_refs(&json!({ "$ref": ptr }), document, &options) {
            Ok(resolution) => circular.extend(resolution.preserved),
            // Broken targets further down are already reported above
            Err(e) => debug!(pointer = ptr, error = %e, "skipping cycle check"),
        }
    }
    for ptr in &circular {
        for path in occurrences.get(ptr).into_iter().flatten() {
            diagnostics.push(diagnostic(
                Severity::Warn,
                "W001",
                file,
                path,
                format!("circular reference: {}", ptr),
            ));
        }
    }

    if document.get("openapi").is_none() && document.get("swagger").is_none() {
        diagnostics.push(diagnostic(
            Severity::Warn,
            "W003",
            file,
            "/",
            "document missing openapi version field".to_string(),
        ));
    }

    if !has_jsonapi_content(document) {
        diagnostics.push(diagnostic(
            Severity::Warn,
            "W004",
            file,
            "/",
            format!("no {} content found; JSON:API rules will not match", JSONAPI_MEDIA_TYPE),
        ));
    }

    diagnostics
}

fn diagnostic(
    severity: Severity,
    code: &str,
    file: &Path,
    path: &str,
    message: String,
) -> Diagnostic {
    Diagnostic {
        severity,
        code: code.to_string(),
        file: file.to_path_buf(),
        path: if path.is_empty() { "/" } else { path }.to_string(),
        message,
    }
}

fn count(result: &FileResult, severity: Severity) -> usize {
    result
        .diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .count()
}

/// Record every string `$ref` with the locations it appears at.
fn collect_refs(value: &Value, path: &str, occurrences: &mut BTreeMap<String, Vec<String>>) {
    match Node::classify(value) {
        Node::Reference(ptr) => {
            occurrences
                .entry(ptr.to_string())
                .or_default()
                .push(path.to_string());
        }
        Node::Mapping(map) => {
            for (key, val) in map {
                let child_path = format!("{}/{}", path, escape(key));
                collect_refs(val, &child_path, occurrences);
            }
        }
        Node::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                let child_path = format!("{}/{}", path, i);
                collect_refs(item, &child_path, occurrences);
            }
        }
        Node::Scalar(_) => {}
    }
}

/// Whether any `content` map in the document has a JSON:API media type.
fn has_jsonapi_content(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            let here = map
                .get("content")
                .and_then(Value::as_object)
                .map(|content| content.contains_key(JSONAPI_MEDIA_TYPE))
                .unwrap_or(false);
            here || map.values().any(has_jsonapi_content)
        }
        Value::Array(items) => items.iter().any(has_jsonapi_content),
        _ => false,
    }
}

/// Collect all document files in a path (file or directory).
fn collect_document_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if DocumentFormat::is_document_path(path) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if DocumentFormat::is_document_path(&path) {
            files.push(path);
        }
    }
}
