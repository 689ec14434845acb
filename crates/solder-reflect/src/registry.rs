//! The canonicalizing type registry
//!
//! Owns every type and member descriptor for one compilation run and
//! guarantees one [`TypeId`] per distinct type: resolving the same
//! qualified name twice, or the same (component, dims) pair twice, yields
//! the identical id. There is no global state; the registry is constructed
//! once per run, locked at a defined point, and dropped at run end.
//!
//! Name resolution consults, in order: already-declared types, already
//! loaded external types, the class environment, and finally the
//! compilation driver's source units. The driver may re-enter the registry
//! while parsing, so a single lookup can register several types.

use crate::error::{LoadError, ReflectDiagnostic, ReflectError};
use crate::host::{CompilationHost, Introspector};
use crate::member::{Member, MemberId, MemberKey, MemberKind, CONSTRUCTOR_NAME};
use crate::span::Span;
use crate::ty::{
    ArrayData, ClassData, MemberState, Modifiers, PrimitiveType, TypeId, TypeKind, TypeRef,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::Arc;

/// Identifier of a compilation unit opened on this registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitId(pub(crate) u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.0)
    }
}

/// One compilation unit and the diagnostics accumulated against it
#[derive(Debug, Clone)]
struct Unit {
    name: String,
    diagnostics: Vec<ReflectDiagnostic>,
}

/// Policy switches for the resolution engines
#[derive(Debug, Clone, Default)]
pub struct ReflectConfig {
    /// When true, inaccessible overload candidates are dropped before
    /// specificity selection instead of merely being flagged
    pub strict_access: bool,
}

/// Eagerly created singleton handles for the well-known types
#[derive(Debug, Clone)]
pub struct WellKnown {
    /// `java.lang.Object`, the universal root reference type
    pub object: TypeId,
    /// `java.lang.String`
    pub string: TypeId,
    /// `java.lang.Class`
    pub class: TypeId,
    /// `java.lang.Throwable`
    pub throwable: TypeId,
    /// `java.lang.Exception`, root of the checked exceptions
    pub exception: TypeId,
    /// `java.lang.RuntimeException`, root of the unchecked exceptions
    pub runtime_exception: TypeId,
    /// `java.lang.Error`, the other unchecked root
    pub error: TypeId,
    /// `java.lang.Cloneable`, implemented by every array type
    pub cloneable: TypeId,
    /// `java.io.Serializable`, implemented by every array type
    pub serializable: TypeId,
    /// The eight scalar types, indexed by [`PrimitiveType`]
    pub primitives: [TypeId; 8],
    /// The `void` pseudo-type
    pub void: TypeId,
    /// The type of the `null` literal
    pub null: TypeId,
    /// The native placeholder type
    pub native: TypeId,
}

/// A source-declared class or interface, as handed over by the front end
///
/// Members are added afterwards through [`TypeRegistry::add_field`],
/// [`TypeRegistry::add_method`], and [`TypeRegistry::add_constructor`].
#[derive(Debug, Clone)]
pub struct ClassDecl {
    /// Fully qualified name
    pub name: String,
    /// Type modifiers; set `INTERFACE` for interfaces
    pub modifiers: Modifiers,
    /// Direct superclass; defaults to the root type for classes
    pub superclass: Option<TypeId>,
    /// Directly implemented or extended interfaces
    pub interfaces: Vec<TypeId>,
    /// Declaration location
    pub span: Option<Span>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>, modifiers: Modifiers) -> Self {
        ClassDecl {
            name: name.into(),
            modifiers,
            superclass: None,
            interfaces: Vec::new(),
            span: None,
        }
    }

    pub fn extending(mut self, superclass: TypeId) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn implementing(mut self, interface: TypeId) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

/// The type registry for one compilation run
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    /// Storage for all type descriptors, indexed by TypeId
    types: Vec<TypeKind>,
    /// Storage for all member descriptors, indexed by MemberId
    members: Vec<Member>,
    /// Qualified name → descriptor, for declared and external types and
    /// the primitive keywords
    by_name: FxHashMap<String, TypeId>,
    /// (component, dims) → canonical array descriptor
    arrays: FxHashMap<(TypeId, u8), TypeId>,
    /// Compilation units opened on this registry
    units: Vec<Unit>,
    /// The currently open unit, if any
    open: Option<UnitId>,
    /// Once locked, only the open unit may register declared types
    locked: bool,
    config: ReflectConfig,
    well_known: WellKnown,
    /// Memoized accessible-field tables
    pub(crate) field_tables: FxHashMap<TypeId, Arc<crate::member::MemberTable>>,
    /// Memoized accessible-method tables
    pub(crate) method_tables: FxHashMap<TypeId, Arc<crate::member::MemberTable>>,
    /// Memoized reference supertype closures
    pub(crate) closures: FxHashMap<TypeId, Arc<FxHashSet<TypeId>>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry with the default configuration
    pub fn new() -> Self {
        Self::with_config(ReflectConfig::default())
    }

    /// Create a registry, eagerly seeding the primitive types, the `void`
    /// pseudo-type, the Null and Native sentinels, and the well-known
    /// class-environment types
    pub fn with_config(config: ReflectConfig) -> Self {
        let mut registry = TypeRegistry {
            types: Vec::new(),
            members: Vec::new(),
            by_name: FxHashMap::default(),
            arrays: FxHashMap::default(),
            units: Vec::new(),
            open: None,
            locked: false,
            config,
            well_known: WellKnown {
                object: TypeId(0),
                string: TypeId(0),
                class: TypeId(0),
                throwable: TypeId(0),
                exception: TypeId(0),
                runtime_exception: TypeId(0),
                error: TypeId(0),
                cloneable: TypeId(0),
                serializable: TypeId(0),
                primitives: [TypeId(0); 8],
                void: TypeId(0),
                null: TypeId(0),
                native: TypeId(0),
            },
            field_tables: FxHashMap::default(),
            method_tables: FxHashMap::default(),
            closures: FxHashMap::default(),
        };

        let mut primitives = [TypeId(0); 8];
        for prim in PrimitiveType::ALL {
            let id = registry.add_type(TypeKind::Primitive(prim));
            registry.by_name.insert(prim.keyword().to_string(), id);
            primitives[prim.index()] = id;
        }
        let void = registry.add_type(TypeKind::Void);
        registry.by_name.insert("void".to_string(), void);
        let null = registry.add_type(TypeKind::Null);
        let native = registry.add_type(TypeKind::Native);

        let object = registry.seed("java.lang.Object", Modifiers::PUBLIC, None, vec![]);
        let cloneable = registry.seed(
            "java.lang.Cloneable",
            Modifiers::PUBLIC | Modifiers::INTERFACE,
            None,
            vec![],
        );
        let serializable = registry.seed(
            "java.io.Serializable",
            Modifiers::PUBLIC | Modifiers::INTERFACE,
            None,
            vec![],
        );
        let string = registry.seed(
            "java.lang.String",
            Modifiers::PUBLIC | Modifiers::FINAL,
            Some(object),
            vec![serializable],
        );
        let class = registry.seed(
            "java.lang.Class",
            Modifiers::PUBLIC | Modifiers::FINAL,
            Some(object),
            vec![serializable],
        );
        let throwable = registry.seed(
            "java.lang.Throwable",
            Modifiers::PUBLIC,
            Some(object),
            vec![serializable],
        );
        let exception = registry.seed("java.lang.Exception", Modifiers::PUBLIC, Some(throwable), vec![]);
        let runtime_exception = registry.seed(
            "java.lang.RuntimeException",
            Modifiers::PUBLIC,
            Some(exception),
            vec![],
        );
        let error = registry.seed("java.lang.Error", Modifiers::PUBLIC, Some(throwable), vec![]);

        registry.well_known = WellKnown {
            object,
            string,
            class,
            throwable,
            exception,
            runtime_exception,
            error,
            cloneable,
            serializable,
            primitives,
            void,
            null,
            native,
        };
        registry
    }

    fn seed(
        &mut self,
        name: &str,
        modifiers: Modifiers,
        superclass: Option<TypeId>,
        interfaces: Vec<TypeId>,
    ) -> TypeId {
        let id = self.add_type(TypeKind::External(ClassData {
            name: name.to_string(),
            modifiers,
            superclass,
            interfaces,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            members: MemberState::Unloaded,
            unit: None,
            span: None,
        }));
        self.by_name.insert(name.to_string(), id);
        id
    }

    fn add_type(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(kind);
        id
    }

    pub(crate) fn add_member(&mut self, member: Member) -> MemberId {
        let id = MemberId(self.members.len() as u32);
        self.members.push(member);
        id
    }

    // ── Basic accessors ─────────────────────────────────────────────────

    pub fn config(&self) -> &ReflectConfig {
        &self.config
    }

    pub fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    /// Singleton handle for a primitive type
    pub fn primitive(&self, prim: PrimitiveType) -> TypeId {
        self.well_known.primitives[prim.index()]
    }

    pub(crate) fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.0 as usize]
    }

    pub(crate) fn kind_mut(&mut self, id: TypeId) -> &mut TypeKind {
        &mut self.types[id.0 as usize]
    }

    /// The member descriptor behind an id
    pub fn member(&self, id: MemberId) -> &Member {
        &self.members[id.0 as usize]
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // ── Type queries ────────────────────────────────────────────────────

    /// Display name of a type: keyword, qualified name, or `T[]...`
    pub fn type_name(&self, id: TypeId) -> String {
        match self.kind(id) {
            TypeKind::Primitive(p) => p.keyword().to_string(),
            TypeKind::Void => "void".to_string(),
            TypeKind::Null => "<null>".to_string(),
            TypeKind::Native => "<native>".to_string(),
            TypeKind::Declared(data) | TypeKind::External(data) => data.name.clone(),
            TypeKind::Array(data) => {
                let mut name = self.type_name(data.component);
                for _ in 0..data.dims {
                    name.push_str("[]");
                }
                name
            }
        }
    }

    /// Package prefix of a class type's qualified name; empty for the
    /// default package
    pub fn package_name(&self, id: TypeId) -> Result<String, ReflectError> {
        let data = self.class_payload(id, "package name")?;
        Ok(match data.name.rfind('.') {
            Some(dot) => data.name[..dot].to_string(),
            None => String::new(),
        })
    }

    /// Final segment of a class type's qualified name
    pub fn simple_name(&self, id: TypeId) -> Result<String, ReflectError> {
        let data = self.class_payload(id, "simple name")?;
        Ok(match data.name.rfind('.') {
            Some(dot) => data.name[dot + 1..].to_string(),
            None => data.name.clone(),
        })
    }

    pub fn is_primitive(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Primitive(_))
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Array(_))
    }

    /// Classes, interfaces, and arrays are reference types
    pub fn is_reference(&self, id: TypeId) -> bool {
        matches!(
            self.kind(id),
            TypeKind::Declared(_) | TypeKind::External(_) | TypeKind::Array(_)
        )
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        self.kind(id).class_data().is_some_and(|data| data.is_interface())
    }

    /// Whether the type may not be instantiated directly
    pub fn is_abstract(&self, id: TypeId) -> bool {
        self.kind(id).class_data().is_some_and(|data| data.is_abstract())
    }

    pub fn is_final(&self, id: TypeId) -> bool {
        self.kind(id)
            .class_data()
            .is_some_and(|data| data.modifiers.contains(Modifiers::FINAL))
    }

    /// Type modifiers; arrays and primitives read as public final
    pub fn modifiers(&self, id: TypeId) -> Result<Modifiers, ReflectError> {
        match self.kind(id) {
            TypeKind::Declared(data) | TypeKind::External(data) => Ok(data.modifiers),
            TypeKind::Primitive(_) | TypeKind::Void | TypeKind::Array(_) => {
                Ok(Modifiers::PUBLIC | Modifiers::FINAL)
            }
            TypeKind::Null | TypeKind::Native => Err(self.unsupported(id, "modifiers")),
        }
    }

    /// Direct superclass; the root type and interfaces have none, arrays
    /// report the root type
    pub fn superclass(&self, id: TypeId) -> Result<Option<TypeId>, ReflectError> {
        match self.kind(id) {
            TypeKind::Declared(data) | TypeKind::External(data) => Ok(data.superclass),
            TypeKind::Array(_) => Ok(Some(self.well_known.object)),
            _ => Err(self.unsupported(id, "superclass")),
        }
    }

    /// Directly implemented or extended interfaces; arrays report the two
    /// array-marker interfaces
    pub fn interfaces(&self, id: TypeId) -> Result<Vec<TypeId>, ReflectError> {
        match self.kind(id) {
            TypeKind::Declared(data) | TypeKind::External(data) => Ok(data.interfaces.clone()),
            TypeKind::Array(_) => Ok(vec![self.well_known.cloneable, self.well_known.serializable]),
            _ => Err(self.unsupported(id, "interfaces")),
        }
    }

    /// Component type and dimension count of an array type
    pub fn array_shape(&self, id: TypeId) -> Result<(TypeId, u8), ReflectError> {
        match self.kind(id) {
            TypeKind::Array(data) => Ok((data.component, data.dims)),
            _ => Err(self.unsupported(id, "array shape")),
        }
    }

    pub(crate) fn class_payload(
        &self,
        id: TypeId,
        query: &'static str,
    ) -> Result<&ClassData, ReflectError> {
        self.kind(id)
            .class_data()
            .ok_or_else(|| self.unsupported(id, query))
    }

    pub(crate) fn unsupported(&self, id: TypeId, query: &'static str) -> ReflectError {
        ReflectError::UnsupportedQuery {
            ty: format!("{} '{}'", self.kind(id).label(), self.type_name(id)),
            query,
        }
    }

    // ── Member queries ──────────────────────────────────────────────────

    /// Declared type of a field
    pub fn field_type(&self, id: MemberId) -> Result<TypeId, ReflectError> {
        match &self.member(id).kind {
            MemberKind::Field { ty } => Ok(*ty),
            _ => Err(ReflectError::UnsupportedQuery {
                ty: self.member_signature(id),
                query: "field type",
            }),
        }
    }

    /// Return type of a method; querying a constructor or field is a
    /// caller error
    pub fn return_type(&self, id: MemberId) -> Result<TypeId, ReflectError> {
        match &self.member(id).kind {
            MemberKind::Method { ret, .. } => Ok(*ret),
            _ => Err(ReflectError::UnsupportedQuery {
                ty: self.member_signature(id),
                query: "return type",
            }),
        }
    }

    /// Erased parameter signature, e.g. `(int,java.lang.String)`; empty
    /// for fields
    pub fn erased_signature(&self, id: MemberId) -> String {
        let member = self.member(id);
        if member.is_field() {
            return String::new();
        }
        let params: Vec<String> = member
            .params()
            .iter()
            .map(|&p| self.type_name(p))
            .collect();
        format!("({})", params.join(","))
    }

    /// `name(signature)` rendering used by diagnostics
    pub fn member_signature(&self, id: MemberId) -> String {
        let member = self.member(id);
        format!("{}{}", member.name, self.erased_signature(id))
    }

    /// `owner.name(signature)` rendering used by diagnostics
    pub fn qualified_member_signature(&self, id: MemberId) -> String {
        let member = self.member(id);
        format!("{}.{}", self.type_name(member.owner), self.member_signature(id))
    }

    /// Member-table key for a member
    pub fn member_key(&self, id: MemberId) -> MemberKey {
        let member = self.member(id);
        MemberKey {
            name: member.name.clone(),
            signature: self.erased_signature(id),
            owner: self.type_name(member.owner),
        }
    }

    // ── Compilation units and diagnostics ───────────────────────────────

    /// Open a compilation unit; declared types registered while it is open
    /// belong to it
    pub fn open_unit(&mut self, name: impl Into<String>) -> UnitId {
        let id = UnitId(self.units.len() as u32);
        self.units.push(Unit {
            name: name.into(),
            diagnostics: Vec::new(),
        });
        self.open = Some(id);
        id
    }

    /// Close the open compilation unit
    pub fn close_unit(&mut self) {
        self.open = None;
    }

    /// The currently open unit, if any
    pub fn open_unit_id(&self) -> Option<UnitId> {
        self.open
    }

    pub fn unit_name(&self, id: UnitId) -> &str {
        &self.units[id.0 as usize].name
    }

    /// Diagnostics accumulated against a unit so far
    pub fn diagnostics(&self, id: UnitId) -> &[ReflectDiagnostic] {
        &self.units[id.0 as usize].diagnostics
    }

    /// Drain a unit's diagnostics for rendering
    pub fn take_diagnostics(&mut self, id: UnitId) -> Vec<ReflectDiagnostic> {
        std::mem::take(&mut self.units[id.0 as usize].diagnostics)
    }

    /// Attribute a diagnostic to the unit owning `ty`
    ///
    /// A diagnostic against a type with no owning unit means the class
    /// environment itself is inconsistent, which is not recoverable.
    pub(crate) fn report(
        &mut self,
        ty: TypeId,
        diagnostic: ReflectDiagnostic,
    ) -> Result<(), ReflectError> {
        let unit = self.kind(ty).class_data().and_then(|data| data.unit);
        match unit {
            Some(unit) => {
                self.units[unit.0 as usize].diagnostics.push(diagnostic);
                Ok(())
            }
            None => Err(ReflectError::OrphanDiagnostic { diagnostic }),
        }
    }

    /// Lock the registry: from now on only the currently open compilation
    /// unit may register declared types
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    // ── Registration ────────────────────────────────────────────────────

    /// Register a source-declared class or interface
    pub fn register_declared(&mut self, decl: ClassDecl) -> Result<TypeId, ReflectError> {
        if let Some(&existing) = self.by_name.get(&decl.name) {
            return match self.kind(existing) {
                TypeKind::Declared(data) => {
                    let original = data
                        .unit
                        .map(|u| self.unit_name(u).to_string())
                        .unwrap_or_else(|| "<unknown unit>".to_string());
                    let diagnostic = ReflectDiagnostic::DuplicateDefinition {
                        name: decl.name.clone(),
                        original,
                        span: decl.span,
                    };
                    if let Some(open) = self.open {
                        self.units[open.0 as usize].diagnostics.push(diagnostic);
                    } else {
                        return Err(ReflectError::OrphanDiagnostic { diagnostic });
                    }
                    Err(ReflectError::DuplicateDefinition { name: decl.name })
                }
                _ => Err(ReflectError::AddAfterReflect { name: decl.name }),
            };
        }
        if self.locked && self.open.is_none() {
            return Err(ReflectError::RegistryLocked { name: decl.name });
        }

        let is_interface = decl.modifiers.contains(Modifiers::INTERFACE);
        let superclass = if is_interface {
            None
        } else {
            decl.superclass.or(Some(self.well_known.object))
        };
        let id = self.add_type(TypeKind::Declared(ClassData {
            name: decl.name.clone(),
            modifiers: decl.modifiers,
            superclass,
            interfaces: decl.interfaces,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            members: MemberState::Declared,
            unit: self.open,
            span: decl.span,
        }));
        self.by_name.insert(decl.name, id);
        Ok(id)
    }

    /// Point a declared class at its superclass
    ///
    /// Parsing registers a type before its extends clause resolves, so the
    /// link is patched in afterwards. Illegal cycles are representable
    /// here; member resolution diagnoses them.
    pub fn set_superclass(&mut self, ty: TypeId, superclass: TypeId) -> Result<(), ReflectError> {
        self.check_open_for_members(ty)?;
        self.closures.clear();
        if let Some(data) = self.kind_mut(ty).class_data_mut() {
            data.superclass = Some(superclass);
        }
        Ok(())
    }

    /// Add an implemented or extended interface to a declared type
    pub fn add_interface(&mut self, ty: TypeId, interface: TypeId) -> Result<(), ReflectError> {
        self.check_open_for_members(ty)?;
        self.closures.clear();
        if let Some(data) = self.kind_mut(ty).class_data_mut() {
            data.interfaces.push(interface);
        }
        Ok(())
    }

    fn check_open_for_members(&self, ty: TypeId) -> Result<(), ReflectError> {
        if self.field_tables.contains_key(&ty) || self.method_tables.contains_key(&ty) {
            return Err(ReflectError::MutateAfterResolve {
                ty: self.type_name(ty),
            });
        }
        match self.kind(ty) {
            TypeKind::Declared(_) => Ok(()),
            _ => Err(self.unsupported(ty, "declare member")),
        }
    }

    /// Add a field to a declared type
    pub fn add_field(
        &mut self,
        ty: TypeId,
        name: impl Into<String>,
        modifiers: Modifiers,
        field_ty: TypeId,
        span: Option<Span>,
    ) -> Result<MemberId, ReflectError> {
        self.check_open_for_members(ty)?;
        let id = self.add_member(Member {
            owner: ty,
            name: name.into(),
            modifiers,
            kind: MemberKind::Field { ty: field_ty },
            span,
            synthetic: false,
        });
        if let Some(data) = self.kind_mut(ty).class_data_mut() {
            data.fields.push(id);
        }
        Ok(id)
    }

    /// Add a method to a declared type
    #[allow(clippy::too_many_arguments)]
    pub fn add_method(
        &mut self,
        ty: TypeId,
        name: impl Into<String>,
        modifiers: Modifiers,
        params: Vec<TypeId>,
        ret: TypeId,
        throws: Vec<TypeId>,
        span: Option<Span>,
    ) -> Result<MemberId, ReflectError> {
        self.check_open_for_members(ty)?;
        let id = self.add_member(Member {
            owner: ty,
            name: name.into(),
            modifiers,
            kind: MemberKind::Method { params, ret, throws },
            span,
            synthetic: false,
        });
        if let Some(data) = self.kind_mut(ty).class_data_mut() {
            data.methods.push(id);
        }
        Ok(id)
    }

    /// Add a constructor to a declared type
    pub fn add_constructor(
        &mut self,
        ty: TypeId,
        modifiers: Modifiers,
        params: Vec<TypeId>,
        throws: Vec<TypeId>,
        span: Option<Span>,
    ) -> Result<MemberId, ReflectError> {
        self.check_open_for_members(ty)?;
        let id = self.add_member(Member {
            owner: ty,
            name: CONSTRUCTOR_NAME.to_string(),
            modifiers,
            kind: MemberKind::Constructor { params, throws },
            span,
            synthetic: false,
        });
        if let Some(data) = self.kind_mut(ty).class_data_mut() {
            data.constructors.push(id);
        }
        Ok(id)
    }

    // ── Array canonicalization ──────────────────────────────────────────

    /// Canonical array descriptor for (component, dims)
    ///
    /// Requesting an array of an array folds the dimensions into the
    /// underlying component; there is never an array-of-array descriptor.
    pub fn array_type(&mut self, component: TypeId, dims: u8) -> Result<TypeId, ReflectError> {
        if dims == 0 {
            return Err(ReflectError::InvalidArrayShape {
                component: self.type_name(component),
                dims,
            });
        }
        let (component, dims) = match self.kind(component) {
            TypeKind::Null | TypeKind::Native | TypeKind::Void => {
                return Err(ReflectError::InvalidArrayShape {
                    component: self.type_name(component),
                    dims,
                });
            }
            TypeKind::Array(data) => {
                let folded = dims.checked_add(data.dims).ok_or_else(|| {
                    ReflectError::InvalidArrayShape {
                        component: self.type_name(data.component),
                        dims: u8::MAX,
                    }
                })?;
                (data.component, folded)
            }
            _ => (component, dims),
        };

        if let Some(&existing) = self.arrays.get(&(component, dims)) {
            return Ok(existing);
        }

        let array_id = TypeId(self.types.len() as u32);
        let length_field = self.add_member(Member {
            owner: array_id,
            name: "length".to_string(),
            modifiers: Modifiers::PUBLIC | Modifiers::FINAL,
            kind: MemberKind::Field {
                ty: self.primitive(PrimitiveType::Int),
            },
            span: None,
            synthetic: true,
        });
        let id = self.add_type(TypeKind::Array(ArrayData {
            component,
            dims,
            length_field,
        }));
        debug_assert_eq!(id, array_id);
        self.arrays.insert((component, dims), id);
        Ok(id)
    }

    // ── Name resolution ─────────────────────────────────────────────────

    /// Resolve a qualified name to a type descriptor
    ///
    /// Checks, in order: types already registered under the name, the
    /// class environment, and finally the driver's source units. Parsing a
    /// unit may register further types before this call returns.
    pub fn resolve_by_qualified_name(
        &mut self,
        name: &str,
        host: &mut dyn CompilationHost,
    ) -> Result<TypeId, ReflectError> {
        if let Some(&id) = self.by_name.get(name) {
            return Ok(id);
        }
        if let Some(id) = self.load_external(name, &mut *host)? {
            return Ok(id);
        }
        if host.locate_unit(name) {
            host.parse_unit(name, self)?;
            if let Some(&id) = self.by_name.get(name) {
                return Ok(id);
            }
        }
        Err(ReflectError::NotFound {
            name: name.to_string(),
        })
    }

    /// Try to wrap a class from the pre-built environment
    ///
    /// Supertypes are resolved (and loaded) immediately; members stay raw
    /// until first queried.
    pub(crate) fn load_external(
        &mut self,
        name: &str,
        env: &mut dyn Introspector,
    ) -> Result<Option<TypeId>, ReflectError> {
        match env.introspect(name)? {
            Some(info) => Ok(Some(self.register_external(info, env)?)),
            None => Ok(None),
        }
    }

    fn register_external(
        &mut self,
        info: crate::host::ClassInfo,
        env: &mut dyn Introspector,
    ) -> Result<TypeId, ReflectError> {
        if let Some(&existing) = self.by_name.get(&info.name) {
            return Ok(existing);
        }

        // The placeholder goes in before supertypes resolve, so cyclic
        // environment metadata terminates instead of recursing forever.
        let id = self.add_type(TypeKind::External(ClassData {
            name: info.name.clone(),
            modifiers: info.modifiers,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            members: MemberState::Pending(info.members),
            unit: None,
            span: None,
        }));
        self.by_name.insert(info.name.clone(), id);

        let superclass = match &info.superclass {
            Some(name) => Some(self.resolve_environment_name(name, env)?),
            None => None,
        };
        let mut interfaces = Vec::with_capacity(info.interfaces.len());
        for name in &info.interfaces {
            interfaces.push(self.resolve_environment_name(name, env)?);
        }
        if let Some(data) = self.kind_mut(id).class_data_mut() {
            data.superclass = superclass;
            data.interfaces = interfaces;
        }
        Ok(id)
    }

    /// Resolve a name the class environment mentioned; unlike the public
    /// resolution path this never consults source units
    pub(crate) fn resolve_environment_name(
        &mut self,
        name: &str,
        env: &mut dyn Introspector,
    ) -> Result<TypeId, ReflectError> {
        if let Some(&id) = self.by_name.get(name) {
            return Ok(id);
        }
        match self.load_external(name, env)? {
            Some(id) => Ok(id),
            None => Err(LoadError::ClassNotFound {
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// Resolve a [`TypeRef`] from the class environment to a descriptor
    pub(crate) fn resolve_type_ref(
        &mut self,
        type_ref: &TypeRef,
        env: &mut dyn Introspector,
    ) -> Result<TypeId, ReflectError> {
        let base = if type_ref.name == "void" {
            self.well_known.void
        } else if let Some(prim) = PrimitiveType::from_keyword(&type_ref.name) {
            self.primitive(prim)
        } else {
            self.resolve_environment_name(&type_ref.name, env)?
        };
        if type_ref.dims == 0 {
            Ok(base)
        } else {
            self.array_type(base, type_ref.dims)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::EmptyEnvironment;

    #[test]
    fn test_well_known_seeded_eagerly() {
        let registry = TypeRegistry::new();
        let wk = registry.well_known();
        assert_eq!(registry.type_name(wk.object), "java.lang.Object");
        assert_eq!(registry.type_name(wk.string), "java.lang.String");
        assert!(registry.is_interface(wk.cloneable));
        assert!(registry.is_primitive(wk.primitives[PrimitiveType::Int.index()]));
        assert_eq!(registry.type_name(wk.void), "void");
    }

    #[test]
    fn test_resolution_is_canonical() {
        let mut registry = TypeRegistry::new();
        let mut host = EmptyEnvironment;
        let a = registry
            .resolve_by_qualified_name("java.lang.String", &mut host)
            .unwrap();
        let b = registry
            .resolve_by_qualified_name("java.lang.String", &mut host)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let mut registry = TypeRegistry::new();
        let mut host = EmptyEnvironment;
        let err = registry
            .resolve_by_qualified_name("p.Missing", &mut host)
            .unwrap_err();
        assert!(matches!(err, ReflectError::NotFound { .. }));
    }

    #[test]
    fn test_array_canonicalization_folds_dims() {
        let mut registry = TypeRegistry::new();
        let int = registry.primitive(PrimitiveType::Int);
        let a = registry.array_type(int, 1).unwrap();
        let b = registry.array_type(int, 1).unwrap();
        assert_eq!(a, b);

        let nested = registry.array_type(a, 1).unwrap();
        let flat = registry.array_type(int, 2).unwrap();
        assert_eq!(nested, flat);
        assert_eq!(registry.array_shape(nested).unwrap(), (int, 2));
        assert_eq!(registry.type_name(nested), "int[][]");
    }

    #[test]
    fn test_array_of_sentinels_is_rejected() {
        let mut registry = TypeRegistry::new();
        let null = registry.well_known().null;
        let native = registry.well_known().native;
        let void = registry.well_known().void;
        for bad in [null, native, void] {
            assert!(matches!(
                registry.array_type(bad, 1),
                Err(ReflectError::InvalidArrayShape { .. })
            ));
        }
        let int = registry.primitive(PrimitiveType::Int);
        assert!(matches!(
            registry.array_type(int, 0),
            Err(ReflectError::InvalidArrayShape { .. })
        ));
    }

    #[test]
    fn test_duplicate_declaration_is_diagnosed() {
        let mut registry = TypeRegistry::new();
        let unit = registry.open_unit("A.java");
        registry
            .register_declared(ClassDecl::new("p.A", Modifiers::PUBLIC))
            .unwrap();
        let err = registry
            .register_declared(ClassDecl::new("p.A", Modifiers::PUBLIC))
            .unwrap_err();
        assert!(matches!(err, ReflectError::DuplicateDefinition { .. }));
        assert_eq!(registry.diagnostics(unit).len(), 1);
    }

    #[test]
    fn test_add_after_reflect_is_fatal() {
        let mut registry = TypeRegistry::new();
        registry.open_unit("String.java");
        let err = registry
            .register_declared(ClassDecl::new("java.lang.String", Modifiers::PUBLIC))
            .unwrap_err();
        assert!(matches!(err, ReflectError::AddAfterReflect { .. }));
    }

    #[test]
    fn test_locked_registry_requires_open_unit() {
        let mut registry = TypeRegistry::new();
        registry.lock();
        let err = registry
            .register_declared(ClassDecl::new("p.A", Modifiers::PUBLIC))
            .unwrap_err();
        assert!(matches!(err, ReflectError::RegistryLocked { .. }));

        registry.open_unit("A.java");
        assert!(registry
            .register_declared(ClassDecl::new("p.A", Modifiers::PUBLIC))
            .is_ok());
    }

    #[test]
    fn test_declared_superclass_defaults_to_root() {
        let mut registry = TypeRegistry::new();
        registry.open_unit("A.java");
        let a = registry
            .register_declared(ClassDecl::new("p.A", Modifiers::PUBLIC))
            .unwrap();
        assert_eq!(registry.superclass(a).unwrap(), Some(registry.well_known().object));

        let i = registry
            .register_declared(ClassDecl::new(
                "p.I",
                Modifiers::PUBLIC | Modifiers::INTERFACE,
            ))
            .unwrap();
        assert_eq!(registry.superclass(i).unwrap(), None);
    }

    #[test]
    fn test_sentinel_queries_are_unsupported() {
        let registry = TypeRegistry::new();
        let null = registry.well_known().null;
        assert!(matches!(
            registry.superclass(null),
            Err(ReflectError::UnsupportedQuery { .. })
        ));
        let native = registry.well_known().native;
        assert!(matches!(
            registry.interfaces(native),
            Err(ReflectError::UnsupportedQuery { .. })
        ));
    }
}
