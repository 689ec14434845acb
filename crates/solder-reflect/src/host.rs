//! Capability traits for the registry's external collaborators
//!
//! The registry never touches the classpath or the source tree itself. It
//! asks an [`Introspector`] for metadata about already-built classes, and a
//! [`CompilationHost`] to locate and parse source units. `parse_unit` is
//! invoked synchronously and may call back into the registry, so loading
//! one type can legally register several others before the original lookup
//! finishes.

use crate::error::LoadError;
use crate::registry::TypeRegistry;
use crate::ty::{Modifiers, RawMember, TypeRef};
use rustc_hash::FxHashMap;

/// Metadata for one class in the pre-built class environment
///
/// Supertypes and member types are referenced by name; the registry
/// resolves them on demand, loading further classes as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    /// Fully qualified name
    pub name: String,
    /// Type modifiers; `INTERFACE` marks interfaces
    pub modifiers: Modifiers,
    /// Qualified superclass name; `None` for interfaces and the root type
    pub superclass: Option<String>,
    /// Qualified names of directly implemented or extended interfaces
    pub interfaces: Vec<String>,
    /// Declared members, with type references unresolved
    pub members: Vec<RawMember>,
}

impl ClassInfo {
    /// A class with no members and the default superclass
    pub fn class(name: impl Into<String>, modifiers: Modifiers) -> Self {
        ClassInfo {
            name: name.into(),
            modifiers,
            superclass: Some("java.lang.Object".to_string()),
            interfaces: Vec::new(),
            members: Vec::new(),
        }
    }

    /// An interface with no members
    pub fn interface(name: impl Into<String>, modifiers: Modifiers) -> Self {
        ClassInfo {
            name: name.into(),
            modifiers: modifiers | Modifiers::INTERFACE,
            superclass: None,
            interfaces: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn extending(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implementing(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, modifiers: Modifiers, ty: TypeRef) -> Self {
        self.members.push(RawMember::Field {
            name: name.into(),
            modifiers,
            ty,
        });
        self
    }

    pub fn with_method(
        mut self,
        name: impl Into<String>,
        modifiers: Modifiers,
        params: Vec<TypeRef>,
        ret: TypeRef,
    ) -> Self {
        self.members.push(RawMember::Method {
            name: name.into(),
            modifiers,
            params,
            ret,
            throws: Vec::new(),
        });
        self
    }

    pub fn with_constructor(mut self, modifiers: Modifiers, params: Vec<TypeRef>) -> Self {
        self.members.push(RawMember::Constructor {
            modifiers,
            params,
            throws: Vec::new(),
        });
        self
    }
}

/// Supplies metadata for classes in the pre-built environment
pub trait Introspector {
    /// Look up one class by qualified name
    ///
    /// `Ok(None)` means the environment has no such class; errors mean the
    /// environment itself failed.
    fn introspect(&mut self, name: &str) -> Result<Option<ClassInfo>, LoadError>;
}

/// The compilation driver, as seen from the registry
///
/// Adds source-unit discovery and parsing on top of class-environment
/// introspection. `parse_unit` must register every declared type the unit
/// produces before returning; it receives the registry back for exactly
/// that purpose.
pub trait CompilationHost: Introspector {
    /// Whether a source unit for this qualified name exists
    fn locate_unit(&mut self, name: &str) -> bool;

    /// Parse the source unit for this qualified name, registering the
    /// declared types it contains
    fn parse_unit(&mut self, name: &str, registry: &mut TypeRegistry) -> Result<(), LoadError>;
}

/// A host with no class environment and no source units
///
/// Useful for tests and for runs where every type is declared up front.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEnvironment;

impl Introspector for EmptyEnvironment {
    fn introspect(&mut self, _name: &str) -> Result<Option<ClassInfo>, LoadError> {
        Ok(None)
    }
}

impl CompilationHost for EmptyEnvironment {
    fn locate_unit(&mut self, _name: &str) -> bool {
        false
    }

    fn parse_unit(&mut self, name: &str, _registry: &mut TypeRegistry) -> Result<(), LoadError> {
        Err(LoadError::ClassNotFound {
            name: name.to_string(),
        })
    }
}

/// An in-memory class environment backed by a name → [`ClassInfo`] map
///
/// Embedders use this to stub out the classpath; the test suites build
/// their fixture environments with it.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    classes: FxHashMap<String, ClassInfo>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        MapEnvironment {
            classes: FxHashMap::default(),
        }
    }

    /// Add a class to the environment, replacing any previous entry
    pub fn insert(&mut self, info: ClassInfo) -> &mut Self {
        self.classes.insert(info.name.clone(), info);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Introspector for MapEnvironment {
    fn introspect(&mut self, name: &str) -> Result<Option<ClassInfo>, LoadError> {
        Ok(self.classes.get(name).cloned())
    }
}

impl CompilationHost for MapEnvironment {
    fn locate_unit(&mut self, _name: &str) -> bool {
        false
    }

    fn parse_unit(&mut self, name: &str, _registry: &mut TypeRegistry) -> Result<(), LoadError> {
        Err(LoadError::ClassNotFound {
            name: name.to_string(),
        })
    }
}
