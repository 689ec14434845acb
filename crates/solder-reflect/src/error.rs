//! Error types for the reflect subsystem
//!
//! Three layers with different recovery policies:
//!
//! - [`ReflectDiagnostic`]: non-fatal findings from inheritance merging and
//!   registration, accumulated against the compilation unit that owns the
//!   implicated type. Resolution continues with a best-effort member table.
//! - [`ResolutionError`]: overload-resolution failures, fatal to the call
//!   site that triggered them but not to the compilation run.
//! - [`ReflectError`]: caller contract violations and environment failures.
//!   These indicate a broken invariant or an unreadable environment, not a
//!   user-source problem, and abort the surrounding operation.

use crate::span::Span;
use thiserror::Error;

/// Non-fatal findings raised while registering types or merging member
/// tables. Accumulated per compilation unit; never thrown.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReflectDiagnostic {
    /// A declared type with the same qualified name already exists
    #[error("Duplicate definition of '{name}'")]
    DuplicateDefinition {
        /// Qualified type name
        name: String,
        /// Where the earlier definition came from (unit name)
        original: String,
        /// Location of the duplicate definition
        span: Option<Span>,
    },

    /// The inheritance graph reaches a type already being resolved
    #[error("Circular inheritance involving '{name}'")]
    CircularInheritance {
        /// Qualified name of the type closing the cycle
        name: String,
        /// Location of the type declaration
        span: Option<Span>,
    },

    /// A static member and an instance member share a signature
    #[error("'{new}' illegally hides '{old}': static and instance members cannot hide each other")]
    IllegalHide {
        /// Signature of the hiding member
        new: String,
        /// Signature of the hidden member
        old: String,
        /// Location of the hiding member
        span: Option<Span>,
    },

    /// Two members with the same signature disagree on their return type
    #[error("'{new}' is incompatible with '{old}': return types differ")]
    IncompatibleReturn {
        /// Signature of the later member
        new: String,
        /// Signature of the earlier member
        old: String,
        /// Location of the later member
        span: Option<Span>,
    },

    /// An override declares a checked exception its ancestor does not
    #[error("'{new}' throws '{exception}', which '{old}' does not declare")]
    WidenedExceptions {
        /// Signature of the overriding member
        new: String,
        /// Signature of the overridden member
        old: String,
        /// Qualified name of the offending checked exception
        exception: String,
        /// Location of the overriding member
        span: Option<Span>,
    },

    /// An override is less visible than the member it overrides
    #[error("'{new}' narrows the visibility of '{old}'")]
    NarrowedVisibility {
        /// Signature of the overriding member
        new: String,
        /// Signature of the overridden member
        old: String,
        /// Location of the overriding member
        span: Option<Span>,
    },

    /// A concrete class is left with an abstract member after merging
    #[error("'{class}' must be declared abstract: '{missing}' has no implementation")]
    MustBeAbstract {
        /// Qualified name of the concrete class
        class: String,
        /// Signature of the unimplemented member
        missing: String,
        /// Location of the class declaration
        span: Option<Span>,
    },
}

impl ReflectDiagnostic {
    /// Get the span associated with this diagnostic, if any
    pub fn span(&self) -> Option<Span> {
        match self {
            ReflectDiagnostic::DuplicateDefinition { span, .. } => *span,
            ReflectDiagnostic::CircularInheritance { span, .. } => *span,
            ReflectDiagnostic::IllegalHide { span, .. } => *span,
            ReflectDiagnostic::IncompatibleReturn { span, .. } => *span,
            ReflectDiagnostic::WidenedExceptions { span, .. } => *span,
            ReflectDiagnostic::NarrowedVisibility { span, .. } => *span,
            ReflectDiagnostic::MustBeAbstract { span, .. } => *span,
        }
    }
}

/// Overload-resolution failures, reported at the call site that triggered
/// resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No candidate accepts the argument types in either matching mode
    #[error("No applicable member '{name}({args})'")]
    NoApplicable {
        /// Simple member name
        name: String,
        /// Comma-separated argument type names
        args: String,
    },

    /// The unique applicable candidate is not accessible from the call site
    #[error("'{member}' is not accessible from here")]
    NotAccessible {
        /// Signature of the inaccessible member
        member: String,
    },

    /// Several candidates were applicable but none is accessible
    #[error("No accessible member '{name}' among the applicable candidates")]
    NoAccessible {
        /// Simple member name
        name: String,
    },

    /// More than one maximally specific candidate remains
    #[error("Reference to '{first}' is ambiguous: '{second}' also matches")]
    Ambiguous {
        /// Signature of one tied candidate
        first: String,
        /// Signature of another tied candidate
        second: String,
    },
}

/// Failures loading from the pre-built class environment or from source
/// units on disk.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// A qualified name resolves to nothing in the environment
    #[error("Class '{name}' not found in the class environment")]
    ClassNotFound {
        /// Qualified type name
        name: String,
    },

    /// A source unit exists but could not be read
    #[error("Cannot read source unit for '{name}': {reason}")]
    UnreadableUnit {
        /// Qualified type name
        name: String,
        /// Underlying I/O failure, rendered
        reason: String,
    },

    /// An on-demand import matches the same simple name in several packages
    #[error("Import of '{name}' is ambiguous: {}", candidates.join(", "))]
    AmbiguousImport {
        /// Simple type name
        name: String,
        /// Qualified names of the colliding candidates
        candidates: Vec<String>,
    },
}

/// Unrecoverable failures: caller contract violations and environment
/// configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReflectError {
    /// Name resolution exhausted every source without a match
    #[error("Type '{name}' not found")]
    NotFound {
        /// Qualified type name
        name: String,
    },

    /// A declared type was rejected at registration; the diagnostic was
    /// recorded against the open compilation unit
    #[error("Duplicate definition of '{name}'")]
    DuplicateDefinition {
        /// Qualified type name
        name: String,
    },

    /// A name already reflected from the class environment was re-declared
    /// from source
    #[error("'{name}' was already loaded from the class environment and cannot be declared")]
    AddAfterReflect {
        /// Qualified type name
        name: String,
    },

    /// The registry is locked and the type does not originate from the
    /// currently open compilation unit
    #[error("Registry is locked; cannot declare '{name}'")]
    RegistryLocked {
        /// Qualified type name
        name: String,
    },

    /// An array type was requested with an impossible shape
    #[error("Cannot build an array of '{component}' with {dims} dimension(s)")]
    InvalidArrayShape {
        /// Component type name
        component: String,
        /// Requested dimension count
        dims: u8,
    },

    /// The query is undefined for this kind of type descriptor
    #[error("'{query}' is not defined for '{ty}'")]
    UnsupportedQuery {
        /// Display name of the type the query was made on
        ty: String,
        /// The query that was attempted
        query: &'static str,
    },

    /// A declared type was mutated after its member tables were computed
    #[error("'{ty}' cannot gain members after its member tables were resolved")]
    MutateAfterResolve {
        /// Qualified type name
        ty: String,
    },

    /// A diagnostic implicated a type with no owning compilation unit,
    /// which means the pre-built class environment itself is inconsistent
    #[error("Class environment is inconsistent: {diagnostic}")]
    OrphanDiagnostic {
        /// The diagnostic that could not be attributed
        diagnostic: ReflectDiagnostic,
    },

    /// Failure in the class environment or source loading path
    #[error(transparent)]
    Load(#[from] LoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_span() {
        let span = Span::new(3, 9, 2, 1);
        let diag = ReflectDiagnostic::CircularInheritance {
            name: "p.A".to_string(),
            span: Some(span),
        };
        assert_eq!(diag.span(), Some(span));

        let diag = ReflectDiagnostic::MustBeAbstract {
            class: "p.C".to_string(),
            missing: "m()".to_string(),
            span: None,
        };
        assert_eq!(diag.span(), None);
    }

    #[test]
    fn test_error_display() {
        let err = ReflectError::AddAfterReflect {
            name: "java.util.Vector".to_string(),
        };
        assert!(err.to_string().contains("java.util.Vector"));

        let err = ResolutionError::NoApplicable {
            name: "m".to_string(),
            args: "int,java.lang.String".to_string(),
        };
        assert_eq!(err.to_string(), "No applicable member 'm(int,java.lang.String)'");
    }

    #[test]
    fn test_load_error_into_reflect_error() {
        let err: ReflectError = LoadError::ClassNotFound {
            name: "p.Missing".to_string(),
        }
        .into();
        assert!(matches!(err, ReflectError::Load(LoadError::ClassNotFound { .. })));
    }
}
