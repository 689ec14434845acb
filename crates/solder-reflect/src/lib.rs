//! Solder reflect subsystem
//!
//! The type model and member-resolution core of the solder bridge
//! compiler. Given classes declared from source and classes loaded from an
//! already-built environment, this crate provides:
//! - A canonicalizing type registry (one descriptor per distinct type)
//! - Field/method/constructor inheritance per the language specification
//! - Overload resolution: the unique applicable, accessible, most
//!   specific member for a call site
//! - Assignability and castability relations, including primitive
//!   widening and array covariance
//! - Structured diagnostics accumulated per compilation unit
//!
//! The lexer/parser for embedded native fragments and the glue-code
//! writer live elsewhere; they reach this crate only through the
//! [`CompilationHost`] and [`Introspector`] traits.

pub mod assign;
pub mod diagnostic;
pub mod error;
pub mod host;
pub mod member;
pub mod overload;
pub mod registry;
pub mod resolve;
pub mod span;
pub mod ty;

// Re-export main types
pub use assign::primitive_widens;
pub use diagnostic::{create_files, Diagnostic, ErrorCode, JsonDiagnostic, JsonLabel};
pub use error::{LoadError, ReflectDiagnostic, ReflectError, ResolutionError};
pub use host::{ClassInfo, CompilationHost, EmptyEnvironment, Introspector, MapEnvironment};
pub use member::{Member, MemberId, MemberKey, MemberKind, MemberTable, CONSTRUCTOR_NAME};
pub use registry::{ClassDecl, ReflectConfig, TypeRegistry, UnitId, WellKnown};
pub use span::Span;
pub use ty::{
    ClassData, MemberState, Modifiers, PrimitiveType, RawMember, TypeId, TypeKind, TypeRef,
    Visibility,
};
