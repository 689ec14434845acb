//! Diagnostic infrastructure for error reporting
//!
//! Turns accumulated [`ReflectDiagnostic`]s and call-site
//! [`ResolutionError`]s into structured reports with source context,
//! stable error codes, terminal rendering, and a JSON projection for IDE
//! integration.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ReflectDiagnostic, ResolutionError};
use crate::span::Span;

/// Error code for a diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// A diagnostic message with source code context
pub struct Diagnostic {
    /// The underlying codespan diagnostic
    inner: CsDiagnostic<usize>,
    /// Error code (e.g., "R2002")
    code: Option<ErrorCode>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(severity).with_message(message),
            code: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code.clone());
        self.inner = self.inner.with_code(code.0);
        self
    }

    /// Add a primary label (main error location)
    pub fn with_primary_label(
        mut self,
        file_id: usize,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        let label = Label::primary(file_id, span.start..span.end).with_message(message);
        self.inner.labels.push(label);
        self
    }

    /// Add a secondary label (related location)
    pub fn with_secondary_label(
        mut self,
        file_id: usize,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        let label = Label::secondary(file_id, span.start..span.end).with_message(message);
        self.inner.labels.push(label);
        self
    }

    /// Add a note (additional context)
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    /// Add a help suggestion
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.notes.push(format!("help: {}", help.into()));
        self
    }

    /// Create a diagnostic from an accumulated resolution finding
    pub fn from_reflect_diagnostic(diagnostic: &ReflectDiagnostic, file_id: usize) -> Self {
        let mut diag = Diagnostic::error(diagnostic.to_string())
            .with_code(reflect_diagnostic_code(diagnostic));
        if let Some(span) = diagnostic.span() {
            diag = diag.with_primary_label(file_id, span, primary_label(diagnostic));
        }
        match diagnostic {
            ReflectDiagnostic::DuplicateDefinition { original, .. } => {
                diag = diag.with_note(format!("first defined in {original}"));
            }
            ReflectDiagnostic::MustBeAbstract { missing, .. } => {
                diag = diag
                    .with_help(format!("implement '{missing}' or declare the class abstract"));
            }
            ReflectDiagnostic::WidenedExceptions { exception, .. } => {
                diag = diag.with_note(format!(
                    "'{exception}' is a checked exception the overridden member does not declare"
                ));
            }
            _ => {}
        }
        diag
    }

    /// Create a diagnostic from an overload-resolution failure at a call
    /// site
    pub fn from_resolution_error(
        error: &ResolutionError,
        file_id: usize,
        call_site: Option<Span>,
    ) -> Self {
        let mut diag =
            Diagnostic::error(error.to_string()).with_code(resolution_error_code(error));
        if let Some(span) = call_site {
            let label = match error {
                ResolutionError::NoApplicable { .. } => "no candidate accepts these arguments",
                ResolutionError::NotAccessible { .. } => "not accessible from here",
                ResolutionError::NoAccessible { .. } => "every candidate is inaccessible",
                ResolutionError::Ambiguous { .. } => "ambiguous reference",
            };
            diag = diag.with_primary_label(file_id, span, label);
        }
        if let ResolutionError::Ambiguous { first, second } = error {
            diag = diag.with_note(format!("candidates: '{first}' and '{second}'"));
            diag = diag.with_help("add a cast to pick one overload");
        }
        diag
    }

    /// Emit the diagnostic to stderr with colors
    pub fn emit(
        &self,
        files: &SimpleFiles<String, String>,
    ) -> Result<(), codespan_reporting::files::Error> {
        let mut writer = StandardStream::stderr(ColorChoice::Auto);
        let config = codespan_reporting::term::Config::default();
        term::emit(&mut writer, &config, files, &self.inner)
    }

    /// Get the underlying codespan diagnostic (for testing/custom rendering)
    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    /// Convert to JSON representation for IDE integration
    pub fn to_json(
        &self,
        files: &SimpleFiles<String, String>,
    ) -> Result<String, serde_json::Error> {
        let json_diag = JsonDiagnostic::from_diagnostic(self, files);
        serde_json::to_string_pretty(&json_diag)
    }
}

fn primary_label(diagnostic: &ReflectDiagnostic) -> &'static str {
    match diagnostic {
        ReflectDiagnostic::DuplicateDefinition { .. } => "duplicate definition",
        ReflectDiagnostic::CircularInheritance { .. } => "inheritance cycle",
        ReflectDiagnostic::IllegalHide { .. } => "illegal hide",
        ReflectDiagnostic::IncompatibleReturn { .. } => "incompatible return type",
        ReflectDiagnostic::WidenedExceptions { .. } => "undeclared checked exception",
        ReflectDiagnostic::NarrowedVisibility { .. } => "visibility narrowed",
        ReflectDiagnostic::MustBeAbstract { .. } => "missing implementation",
    }
}

/// Get the error code for an accumulated resolution finding
pub fn reflect_diagnostic_code(diagnostic: &ReflectDiagnostic) -> ErrorCode {
    match diagnostic {
        ReflectDiagnostic::DuplicateDefinition { .. } => ErrorCode("R1001"),
        ReflectDiagnostic::CircularInheritance { .. } => ErrorCode("R2001"),
        ReflectDiagnostic::IllegalHide { .. } => ErrorCode("R2002"),
        ReflectDiagnostic::IncompatibleReturn { .. } => ErrorCode("R2003"),
        ReflectDiagnostic::WidenedExceptions { .. } => ErrorCode("R2004"),
        ReflectDiagnostic::NarrowedVisibility { .. } => ErrorCode("R2005"),
        ReflectDiagnostic::MustBeAbstract { .. } => ErrorCode("R2006"),
    }
}

/// Get the error code for an overload-resolution failure
pub fn resolution_error_code(error: &ResolutionError) -> ErrorCode {
    match error {
        ResolutionError::NoApplicable { .. } => ErrorCode("R3001"),
        ResolutionError::NotAccessible { .. } => ErrorCode("R3002"),
        ResolutionError::NoAccessible { .. } => ErrorCode("R3003"),
        ResolutionError::Ambiguous { .. } => ErrorCode("R3004"),
    }
}

/// JSON representation of a diagnostic for IDE integration
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    /// Error code (e.g., "R2002")
    pub code: Option<String>,
    /// Severity level
    pub severity: String,
    /// Main error message
    pub message: String,
    /// Source locations with labels
    pub labels: Vec<JsonLabel>,
    /// Additional notes and help
    pub notes: Vec<String>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    /// File path
    pub file: String,
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    /// End line (1-indexed)
    pub end_line: usize,
    /// End column (1-indexed)
    pub end_column: usize,
    /// Label message
    pub message: Option<String>,
    /// Label style (primary or secondary)
    pub style: String,
}

impl JsonDiagnostic {
    /// Convert a Diagnostic to JSON representation
    pub fn from_diagnostic(diag: &Diagnostic, files: &SimpleFiles<String, String>) -> Self {
        let severity = match diag.inner.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
            Severity::Bug => "bug",
        };

        let labels = diag
            .inner
            .labels
            .iter()
            .filter_map(|label| {
                let file_id = label.file_id;
                let file_name = files.get(file_id).ok()?.name().to_string();

                let start_location = files.get(file_id).ok()?.location((), label.range.start).ok()?;
                let end_location = files.get(file_id).ok()?.location((), label.range.end).ok()?;

                Some(JsonLabel {
                    file: file_name,
                    start_line: start_location.line_number,
                    start_column: start_location.column_number,
                    end_line: end_location.line_number,
                    end_column: end_location.column_number,
                    message: Some(label.message.clone()),
                    style: match label.style {
                        codespan_reporting::diagnostic::LabelStyle::Primary => "primary",
                        codespan_reporting::diagnostic::LabelStyle::Secondary => "secondary",
                    }
                    .to_string(),
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.as_ref().map(|c| c.0.to_string()),
            severity: severity.to_string(),
            message: diag.inner.message.clone(),
            labels,
            notes: diag.inner.notes.clone(),
        }
    }
}

/// Helper to create a SimpleFiles instance from source code
pub fn create_files(path: impl Into<PathBuf>, source: impl Into<String>) -> SimpleFiles<String, String> {
    let mut files = SimpleFiles::new();
    files.add(path.into().display().to_string(), source.into());
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_error_diagnostic() {
        let diag = Diagnostic::error("Test error message");
        assert_eq!(diag.inner.severity, Severity::Error);
    }

    #[test]
    fn test_diagnostic_with_code() {
        let diag = Diagnostic::error("Test error").with_code(ErrorCode("R2001"));
        assert_eq!(diag.code, Some(ErrorCode("R2001")));
    }

    #[test]
    fn test_from_reflect_diagnostic() {
        let diagnostic = ReflectDiagnostic::MustBeAbstract {
            class: "p.C".to_string(),
            missing: "m()".to_string(),
            span: Some(Span::new(5, 12, 1, 5)),
        };
        let diag = Diagnostic::from_reflect_diagnostic(&diagnostic, 0);
        assert_eq!(diag.code, Some(ErrorCode("R2006")));
        assert!(diag.inner.message.contains("p.C"));
        assert_eq!(diag.inner.labels.len(), 1);
    }

    #[test]
    fn test_from_resolution_error() {
        let error = ResolutionError::Ambiguous {
            first: "p.A.f(java.lang.Object)".to_string(),
            second: "p.A.f(java.lang.String)".to_string(),
        };
        let diag = Diagnostic::from_resolution_error(&error, 0, None);
        assert_eq!(diag.code, Some(ErrorCode("R3004")));
        assert!(diag.inner.labels.is_empty());
        assert!(diag.inner.notes.iter().any(|n| n.contains("candidates")));
    }

    #[test]
    fn test_json_output() {
        let diagnostic = ReflectDiagnostic::CircularInheritance {
            name: "p.A".to_string(),
            span: Some(Span::new(0, 7, 1, 1)),
        };
        let diag = Diagnostic::from_reflect_diagnostic(&diagnostic, 0);
        let files = create_files("A.java", "class A extends B {}");

        let json = diag.to_json(&files).unwrap();
        assert!(json.contains("\"code\""));
        assert!(json.contains("\"R2001\""));
        assert!(json.contains("\"severity\""));
        assert!(json.contains("\"error\""));
        assert!(json.contains("\"labels\""));
        assert!(json.contains("\"start_line\""));
    }
}
