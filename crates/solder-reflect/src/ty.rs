//! Core type descriptor definitions
//!
//! Every type the compiler touches is interned in the [`TypeRegistry`] and
//! referred to by a [`TypeId`]. Identity is the id: two types are the same
//! type exactly when their ids are equal. Structural equality is never used.
//!
//! [`TypeRegistry`]: crate::registry::TypeRegistry

use crate::member::MemberId;
use crate::registry::UnitId;
use crate::span::Span;
use std::fmt;

/// Unique identifier for a type in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Get the raw value of this TypeId
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// The eight primitive scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    /// All primitives, in widening-table order
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Char,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    /// Index into the widening table
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// The source keyword for this primitive
    pub const fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// Parse a primitive keyword
    pub fn from_keyword(kw: &str) -> Option<PrimitiveType> {
        PrimitiveType::ALL.into_iter().find(|p| p.keyword() == kw)
    }

    /// Every primitive except `boolean` is numeric
    pub const fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveType::Boolean)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

bitflags::bitflags! {
    /// Modifier bitset for types and members
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u16 {
        const PUBLIC = 1 << 0;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const STATIC = 1 << 3;
        const FINAL = 1 << 4;
        const ABSTRACT = 1 << 5;
        const NATIVE = 1 << 6;
        const INTERFACE = 1 << 7;
        const SYNCHRONIZED = 1 << 8;
        const TRANSIENT = 1 << 9;
        const VOLATILE = 1 << 10;
    }
}

impl Modifiers {
    /// The visibility encoded in this bitset
    pub fn visibility(self) -> Visibility {
        if self.contains(Modifiers::PUBLIC) {
            Visibility::Public
        } else if self.contains(Modifiers::PROTECTED) {
            Visibility::Protected
        } else if self.contains(Modifiers::PRIVATE) {
            Visibility::Private
        } else {
            Visibility::Package
        }
    }
}

/// Visibility levels, ordered from most to least restrictive
///
/// The derived ordering makes "no more restrictive than" a plain `>=`
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    Private,
    Package,
    Protected,
    Public,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Private => write!(f, "private"),
            Visibility::Package => write!(f, "package"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Public => write!(f, "public"),
        }
    }
}

/// How a class type's members are populated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberState {
    /// Declared from source; the compilation front end pushes members in
    Declared,
    /// Loaded from the class environment; raw member info held until the
    /// first member query materializes it
    Pending(Vec<RawMember>),
    /// Known to the class environment but not yet introspected
    Unloaded,
    /// Members materialized; the lists below are final
    Ready,
}

/// A member as described by class-environment introspection, with type
/// references still unresolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMember {
    Field {
        name: String,
        modifiers: Modifiers,
        ty: TypeRef,
    },
    Method {
        name: String,
        modifiers: Modifiers,
        params: Vec<TypeRef>,
        ret: TypeRef,
        throws: Vec<String>,
    },
    Constructor {
        modifiers: Modifiers,
        params: Vec<TypeRef>,
        throws: Vec<String>,
    },
}

/// A type named by the class environment: a primitive keyword, `void`, or
/// a qualified class name, with an array dimension count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub dims: u8,
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        TypeRef {
            name: name.into(),
            dims: 0,
        }
    }

    pub fn array(name: impl Into<String>, dims: u8) -> Self {
        TypeRef {
            name: name.into(),
            dims,
        }
    }
}

/// Shared payload of declared and external class types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassData {
    /// Fully qualified name
    pub name: String,
    /// Type modifiers; `INTERFACE` distinguishes interfaces from classes
    pub modifiers: Modifiers,
    /// Direct superclass; `None` for interfaces and the root type
    pub superclass: Option<TypeId>,
    /// Directly implemented (classes) or extended (interfaces) interfaces
    pub interfaces: Vec<TypeId>,
    /// Declared fields, in declaration order
    pub fields: Vec<MemberId>,
    /// Declared methods, in declaration order
    pub methods: Vec<MemberId>,
    /// Declared constructors, in declaration order
    pub constructors: Vec<MemberId>,
    /// How the member lists are populated
    pub members: MemberState,
    /// Owning compilation unit (declared types only)
    pub unit: Option<UnitId>,
    /// Declaration location (declared types only)
    pub span: Option<Span>,
}

impl ClassData {
    /// Whether this type is an interface
    pub fn is_interface(&self) -> bool {
        self.modifiers.contains(Modifiers::INTERFACE)
    }

    /// Whether this type is declared abstract (interfaces always are)
    pub fn is_abstract(&self) -> bool {
        self.is_interface() || self.modifiers.contains(Modifiers::ABSTRACT)
    }
}

/// Payload of an array type descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayData {
    /// Element type after stripping every dimension; never itself an array
    pub component: TypeId,
    /// Dimension count, at least 1
    pub dims: u8,
    /// The synthesized read-only `length` field
    pub length_field: MemberId,
}

/// A type descriptor: one variant per kind of type the compiler models
///
/// The set is closed. Every shared query is a total match over this enum;
/// kinds a query is undefined for produce
/// [`ReflectError::UnsupportedQuery`](crate::error::ReflectError::UnsupportedQuery)
/// rather than panicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// One of the eight scalar types
    Primitive(PrimitiveType),
    /// The `void` pseudo-type
    Void,
    /// The type of the `null` literal: assignable to every reference type
    Null,
    /// The untyped placeholder for an embedded native-code expression:
    /// assignable to nothing, weakly coercible to primitives
    Native,
    /// A class or interface currently being compiled from source
    Declared(ClassData),
    /// A class or interface loaded from the pre-built class environment
    External(ClassData),
    /// An array type, canonical per (component, dims)
    Array(ArrayData),
}

impl TypeKind {
    /// Class payload shared by declared and external types
    pub fn class_data(&self) -> Option<&ClassData> {
        match self {
            TypeKind::Declared(data) | TypeKind::External(data) => Some(data),
            _ => None,
        }
    }

    /// Mutable class payload shared by declared and external types
    pub(crate) fn class_data_mut(&mut self) -> Option<&mut ClassData> {
        match self {
            TypeKind::Declared(data) | TypeKind::External(data) => Some(data),
            _ => None,
        }
    }

    /// A short label for this kind, used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            TypeKind::Primitive(_) => "primitive type",
            TypeKind::Void => "void",
            TypeKind::Null => "null type",
            TypeKind::Native => "native placeholder",
            TypeKind::Declared(_) => "declared type",
            TypeKind::External(_) => "external type",
            TypeKind::Array(_) => "array type",
        }
    }
}
