//! Registry canonicalization and name-resolution tests

use rustc_hash::FxHashSet;
use solder_reflect::{
    ClassDecl, ClassInfo, CompilationHost, EmptyEnvironment, Introspector, LoadError,
    MapEnvironment, Modifiers, PrimitiveType, ReflectError, TypeRef, TypeRegistry,
};

/// A driver with an in-memory class environment and a set of parseable
/// source units
struct StubDriver {
    env: MapEnvironment,
    units: FxHashSet<String>,
    unreadable: FxHashSet<String>,
}

impl StubDriver {
    fn new() -> Self {
        StubDriver {
            env: MapEnvironment::new(),
            units: FxHashSet::default(),
            unreadable: FxHashSet::default(),
        }
    }
}

impl Introspector for StubDriver {
    fn introspect(&mut self, name: &str) -> Result<Option<ClassInfo>, LoadError> {
        self.env.introspect(name)
    }
}

impl CompilationHost for StubDriver {
    fn locate_unit(&mut self, name: &str) -> bool {
        self.units.contains(name) || self.unreadable.contains(name)
    }

    fn parse_unit(&mut self, name: &str, registry: &mut TypeRegistry) -> Result<(), LoadError> {
        if self.unreadable.contains(name) {
            return Err(LoadError::UnreadableUnit {
                name: name.to_string(),
                reason: "permission denied".to_string(),
            });
        }
        registry.open_unit(format!("{name}.java"));
        registry
            .register_declared(ClassDecl::new(name, Modifiers::PUBLIC))
            .map_err(|_| LoadError::UnreadableUnit {
                name: name.to_string(),
                reason: "registration failed".to_string(),
            })?;
        registry.close_unit();
        Ok(())
    }
}

#[test]
fn resolving_the_same_name_twice_is_identical() {
    let mut registry = TypeRegistry::new();
    let mut host = StubDriver::new();
    host.env.insert(ClassInfo::class("lib.Widget", Modifiers::PUBLIC));

    let first = registry
        .resolve_by_qualified_name("lib.Widget", &mut host)
        .unwrap();
    let second = registry
        .resolve_by_qualified_name("lib.Widget", &mut host)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn array_types_are_canonical_and_fold() {
    let mut registry = TypeRegistry::new();
    let string = registry.well_known().string;

    let one = registry.array_type(string, 1).unwrap();
    let again = registry.array_type(string, 1).unwrap();
    assert_eq!(one, again);

    let two_direct = registry.array_type(string, 2).unwrap();
    let two_nested = registry.array_type(one, 1).unwrap();
    assert_eq!(two_direct, two_nested);

    let three_a = registry.array_type(two_nested, 1).unwrap();
    let three_b = registry.array_type(string, 3).unwrap();
    assert_eq!(three_a, three_b);
    assert_eq!(registry.type_name(three_a), "java.lang.String[][][]");
}

#[test]
fn external_loading_pulls_in_supertypes() {
    let mut registry = TypeRegistry::new();
    let mut host = StubDriver::new();
    host.env.insert(ClassInfo::class("lib.Base", Modifiers::PUBLIC));
    host.env
        .insert(ClassInfo::interface("lib.Marker", Modifiers::PUBLIC));
    host.env.insert(
        ClassInfo::class("lib.Derived", Modifiers::PUBLIC)
            .extending("lib.Base")
            .implementing("lib.Marker"),
    );

    let derived = registry
        .resolve_by_qualified_name("lib.Derived", &mut host)
        .unwrap();
    let base = registry
        .resolve_by_qualified_name("lib.Base", &mut host)
        .unwrap();
    let marker = registry
        .resolve_by_qualified_name("lib.Marker", &mut host)
        .unwrap();

    assert_eq!(registry.superclass(derived).unwrap(), Some(base));
    assert_eq!(registry.interfaces(derived).unwrap(), vec![marker]);
    assert!(registry.is_assignable(derived, base));
    assert!(registry.is_assignable(derived, marker));
}

#[test]
fn source_units_are_parsed_on_demand() {
    let mut registry = TypeRegistry::new();
    let mut host = StubDriver::new();
    host.units.insert("app.Main".to_string());

    let id = registry
        .resolve_by_qualified_name("app.Main", &mut host)
        .unwrap();
    assert_eq!(registry.type_name(id), "app.Main");

    // a second lookup hits the declared cache, not the parser
    host.units.clear();
    let again = registry
        .resolve_by_qualified_name("app.Main", &mut host)
        .unwrap();
    assert_eq!(id, again);
}

#[test]
fn unreadable_source_units_surface_io_errors() {
    let mut registry = TypeRegistry::new();
    let mut host = StubDriver::new();
    host.unreadable.insert("app.Broken".to_string());

    let err = registry
        .resolve_by_qualified_name("app.Broken", &mut host)
        .unwrap_err();
    assert!(matches!(
        err,
        ReflectError::Load(LoadError::UnreadableUnit { .. })
    ));
}

#[test]
fn missing_names_fail_after_all_sources() {
    let mut registry = TypeRegistry::new();
    let mut host = StubDriver::new();
    let err = registry
        .resolve_by_qualified_name("no.Such", &mut host)
        .unwrap_err();
    assert!(matches!(err, ReflectError::NotFound { .. }));
}

#[test]
fn external_members_materialize_lazily() {
    let mut registry = TypeRegistry::new();
    let mut host = StubDriver::new();
    host.env.insert(
        ClassInfo::class("lib.Point", Modifiers::PUBLIC)
            .with_field("x", Modifiers::PUBLIC, TypeRef::new("int"))
            .with_field("y", Modifiers::PUBLIC, TypeRef::new("int"))
            .with_method(
                "translate",
                Modifiers::PUBLIC,
                vec![TypeRef::new("int"), TypeRef::new("int")],
                TypeRef::new("void"),
            ),
    );

    let point = registry
        .resolve_by_qualified_name("lib.Point", &mut host)
        .unwrap();

    let fields = registry.accessible_fields(point, &mut host).unwrap();
    assert_eq!(fields.len(), 2);
    assert!(fields.members_named("x").next().is_some());

    let methods = registry.accessible_methods(point, &mut host).unwrap();
    let translate = methods.members_named("translate").next().unwrap();
    let int = registry.primitive(PrimitiveType::Int);
    assert_eq!(registry.member(translate).params(), &[int, int]);
}

#[test]
fn member_types_load_further_classes() {
    let mut registry = TypeRegistry::new();
    let mut host = StubDriver::new();
    host.env.insert(ClassInfo::class("lib.Color", Modifiers::PUBLIC));
    host.env.insert(
        ClassInfo::class("lib.Shape", Modifiers::PUBLIC).with_method(
            "color",
            Modifiers::PUBLIC,
            vec![],
            TypeRef::new("lib.Color"),
        ),
    );

    let shape = registry
        .resolve_by_qualified_name("lib.Shape", &mut host)
        .unwrap();
    let methods = registry.accessible_methods(shape, &mut host).unwrap();
    let color_method = methods.members_named("color").next().unwrap();
    let color = registry
        .resolve_by_qualified_name("lib.Color", &mut host)
        .unwrap();
    assert_eq!(registry.return_type(color_method).unwrap(), color);
}

#[test]
fn array_length_field_is_synthesized() {
    let mut registry = TypeRegistry::new();
    let mut env = EmptyEnvironment;
    let int = registry.primitive(PrimitiveType::Int);
    let int_array = registry.array_type(int, 1).unwrap();

    let fields = registry.accessible_fields(int_array, &mut env).unwrap();
    assert_eq!(fields.len(), 1);
    let length = fields.members_named("length").next().unwrap();
    let member = registry.member(length);
    assert!(member.synthetic);
    assert!(member.modifiers.contains(Modifiers::FINAL));
    assert_eq!(registry.field_type(length).unwrap(), int);
}

#[test]
fn constructor_return_type_query_is_rejected() {
    let mut registry = TypeRegistry::new();
    let mut env = EmptyEnvironment;
    registry.open_unit("A.java");
    let a = registry
        .register_declared(ClassDecl::new("p.A", Modifiers::PUBLIC))
        .unwrap();
    registry
        .add_constructor(a, Modifiers::PUBLIC, vec![], vec![], None)
        .unwrap();
    let ctors = registry.constructors(a, &mut env).unwrap();
    assert_eq!(ctors.len(), 1);
    assert!(matches!(
        registry.return_type(ctors[0]),
        Err(ReflectError::UnsupportedQuery { .. })
    ));
}

#[test]
fn default_constructor_mirrors_class_visibility() {
    let mut registry = TypeRegistry::new();
    let mut env = EmptyEnvironment;
    registry.open_unit("A.java");
    let a = registry
        .register_declared(ClassDecl::new("p.A", Modifiers::empty()))
        .unwrap();

    let ctors = registry.constructors(a, &mut env).unwrap();
    assert_eq!(ctors.len(), 1);
    let ctor = registry.member(ctors[0]);
    assert!(ctor.synthetic);
    assert!(ctor.params().is_empty());
    assert_eq!(ctor.visibility(), solder_reflect::Visibility::Package);

    // abstract classes get no synthesized constructor
    let b = registry
        .register_declared(ClassDecl::new(
            "p.B",
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
        ))
        .unwrap();
    assert!(registry.constructors(b, &mut env).unwrap().is_empty());
}

#[test]
fn declared_members_are_frozen_after_resolution() {
    let mut registry = TypeRegistry::new();
    let mut env = EmptyEnvironment;
    registry.open_unit("A.java");
    let a = registry
        .register_declared(ClassDecl::new("p.A", Modifiers::PUBLIC))
        .unwrap();
    let int = registry.primitive(PrimitiveType::Int);
    registry
        .add_field(a, "x", Modifiers::PUBLIC, int, None)
        .unwrap();

    registry.accessible_fields(a, &mut env).unwrap();
    let err = registry
        .add_field(a, "y", Modifiers::PUBLIC, int, None)
        .unwrap_err();
    assert!(matches!(err, ReflectError::MutateAfterResolve { .. }));
}
