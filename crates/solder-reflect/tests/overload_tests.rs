//! Overload resolution tests: applicability passes, accessibility, and
//! most-specific selection

use solder_reflect::{
    ClassDecl, EmptyEnvironment, MemberId, Modifiers, PrimitiveType, ReflectConfig,
    ResolutionError, TypeId, TypeRegistry,
};

fn method(
    registry: &mut TypeRegistry,
    owner: TypeId,
    name: &str,
    modifiers: Modifiers,
    params: Vec<TypeId>,
) -> MemberId {
    let void = registry.well_known().void;
    registry
        .add_method(owner, name, modifiers, params, void, vec![], None)
        .unwrap()
}

fn candidates(registry: &mut TypeRegistry, owner: TypeId, name: &str) -> Vec<MemberId> {
    let mut env = EmptyEnvironment;
    let methods = registry.accessible_methods(owner, &mut env).unwrap();
    methods.members_named(name).collect()
}

#[test]
fn more_specific_parameter_wins() {
    let mut registry = TypeRegistry::new();
    registry.open_unit("test.java");
    let object = registry.well_known().object;
    let string = registry.well_known().string;

    let c = registry
        .register_declared(ClassDecl::new("p.C", Modifiers::PUBLIC))
        .unwrap();
    method(&mut registry, c, "f", Modifiers::PUBLIC, vec![object]);
    let f_string = method(&mut registry, c, "f", Modifiers::PUBLIC, vec![string]);

    let found = candidates(&mut registry, c, "f");
    assert_eq!(found.len(), 2);
    let picked = registry.most_specific(&found, &[string], c, true).unwrap();
    assert_eq!(picked, f_string);

    // with an Object argument only f(Object) is applicable
    let picked = registry.most_specific(&found, &[object], c, true).unwrap();
    assert_eq!(registry.member(picked).params(), &[object]);
}

#[test]
fn unrelated_parameter_types_are_ambiguous() {
    let mut registry = TypeRegistry::new();
    registry.open_unit("test.java");
    let i1 = registry
        .register_declared(ClassDecl::new("p.I1", Modifiers::PUBLIC | Modifiers::INTERFACE))
        .unwrap();
    let i2 = registry
        .register_declared(ClassDecl::new("p.I2", Modifiers::PUBLIC | Modifiers::INTERFACE))
        .unwrap();
    let arg = registry
        .register_declared(
            ClassDecl::new("p.Both", Modifiers::PUBLIC)
                .implementing(i1)
                .implementing(i2),
        )
        .unwrap();
    let c = registry
        .register_declared(ClassDecl::new("p.C", Modifiers::PUBLIC))
        .unwrap();
    method(&mut registry, c, "f", Modifiers::PUBLIC, vec![i1]);
    method(&mut registry, c, "f", Modifiers::PUBLIC, vec![i2]);

    let found = candidates(&mut registry, c, "f");
    let err = registry.most_specific(&found, &[arg], c, true).unwrap_err();
    assert!(matches!(err, ResolutionError::Ambiguous { .. }));
}

#[test]
fn widening_applies_to_primitive_arguments() {
    let mut registry = TypeRegistry::new();
    registry.open_unit("test.java");
    let int = registry.primitive(PrimitiveType::Int);
    let long = registry.primitive(PrimitiveType::Long);
    let byte = registry.primitive(PrimitiveType::Byte);

    let c = registry
        .register_declared(ClassDecl::new("p.C", Modifiers::PUBLIC))
        .unwrap();
    let g_int = method(&mut registry, c, "g", Modifiers::PUBLIC, vec![int]);
    method(&mut registry, c, "g", Modifiers::PUBLIC, vec![long]);

    let found = candidates(&mut registry, c, "g");
    // byte widens to both; g(int) is more specific since int widens to long
    let picked = registry.most_specific(&found, &[byte], c, true).unwrap();
    assert_eq!(picked, g_int);
}

#[test]
fn arity_filters_candidates() {
    let mut registry = TypeRegistry::new();
    registry.open_unit("test.java");
    let int = registry.primitive(PrimitiveType::Int);
    let c = registry
        .register_declared(ClassDecl::new("p.C", Modifiers::PUBLIC))
        .unwrap();
    method(&mut registry, c, "f", Modifiers::PUBLIC, vec![int]);

    let found = candidates(&mut registry, c, "f");
    let err = registry
        .most_specific(&found, &[int, int], c, true)
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NoApplicable { .. }));
}

#[test]
fn native_arguments_match_primitives_in_the_weak_pass() {
    let mut registry = TypeRegistry::new();
    registry.open_unit("test.java");
    let int = registry.primitive(PrimitiveType::Int);
    let string = registry.well_known().string;
    let native = registry.well_known().native;

    let c = registry
        .register_declared(ClassDecl::new("p.C", Modifiers::PUBLIC))
        .unwrap();
    let g_int = method(&mut registry, c, "g", Modifiers::PUBLIC, vec![int]);
    let g_string = method(&mut registry, c, "g", Modifiers::PUBLIC, vec![string]);

    let found = candidates(&mut registry, c, "g");
    // strict pass rejects the native argument outright; the weak pass
    // coerces it to the primitive parameter only
    let picked = registry.most_specific(&found, &[native], c, true).unwrap();
    assert_eq!(picked, g_int);

    // a native argument never matches a reference parameter
    let err = registry
        .most_specific(&[g_string], &[native], c, true)
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NoApplicable { .. }));
}

#[test]
fn weak_candidates_do_not_compete_on_specificity() {
    let mut registry = TypeRegistry::new();
    registry.open_unit("test.java");
    let int = registry.primitive(PrimitiveType::Int);
    let long = registry.primitive(PrimitiveType::Long);
    let native = registry.well_known().native;

    let c = registry
        .register_declared(ClassDecl::new("p.C", Modifiers::PUBLIC))
        .unwrap();
    method(&mut registry, c, "g", Modifiers::PUBLIC, vec![int]);
    method(&mut registry, c, "g", Modifiers::PUBLIC, vec![long]);

    let found = candidates(&mut registry, c, "g");
    // both match only weakly; neither dominates, so the tie surfaces
    let err = registry.most_specific(&found, &[native], c, true).unwrap_err();
    assert!(matches!(err, ResolutionError::Ambiguous { .. }));
}

#[test]
fn null_matches_reference_parameters() {
    let mut registry = TypeRegistry::new();
    registry.open_unit("test.java");
    let null = registry.well_known().null;
    let string = registry.well_known().string;
    let int = registry.primitive(PrimitiveType::Int);

    let c = registry
        .register_declared(ClassDecl::new("p.C", Modifiers::PUBLIC))
        .unwrap();
    let f_string = method(&mut registry, c, "f", Modifiers::PUBLIC, vec![string]);
    method(&mut registry, c, "f", Modifiers::PUBLIC, vec![int]);

    let found = candidates(&mut registry, c, "f");
    let picked = registry.most_specific(&found, &[null], c, true).unwrap();
    assert_eq!(picked, f_string);
}

#[test]
fn single_inaccessible_candidate_is_named() {
    let mut registry = TypeRegistry::new();
    registry.open_unit("test.java");
    let int = registry.primitive(PrimitiveType::Int);
    let a = registry
        .register_declared(ClassDecl::new("p.A", Modifiers::PUBLIC))
        .unwrap();
    let secret = method(&mut registry, a, "secret", Modifiers::PRIVATE, vec![int]);
    let other = registry
        .register_declared(ClassDecl::new("p.Other", Modifiers::PUBLIC))
        .unwrap();

    let err = registry
        .most_specific(&[secret], &[int], other, false)
        .unwrap_err();
    match err {
        ResolutionError::NotAccessible { member } => {
            assert!(member.contains("secret"));
        }
        other => panic!("expected NotAccessible, got {other:?}"),
    }
}

#[test]
fn protected_access_needs_self_context_outside_the_package() {
    let mut registry = TypeRegistry::new();
    registry.open_unit("test.java");
    let int = registry.primitive(PrimitiveType::Int);
    let a = registry
        .register_declared(ClassDecl::new("p.A", Modifiers::PUBLIC))
        .unwrap();
    let m = method(&mut registry, a, "m", Modifiers::PROTECTED, vec![int]);
    let sub = registry
        .register_declared(ClassDecl::new("q.Sub", Modifiers::PUBLIC).extending(a))
        .unwrap();
    let stranger = registry
        .register_declared(ClassDecl::new("q.Stranger", Modifiers::PUBLIC))
        .unwrap();

    assert!(registry.is_accessible(m, sub, true));
    assert!(!registry.is_accessible(m, sub, false));
    assert!(!registry.is_accessible(m, stranger, true));

    // same package needs no self context
    let neighbor = registry
        .register_declared(ClassDecl::new("p.Neighbor", Modifiers::PUBLIC))
        .unwrap();
    assert!(registry.is_accessible(m, neighbor, false));
}

#[test]
fn strict_access_drops_candidates_before_specificity() {
    // lenient: the inaccessible, more specific candidate shadows the
    // accessible one and resolution fails
    let mut registry = TypeRegistry::new();
    registry.open_unit("test.java");
    let object = registry.well_known().object;
    let string = registry.well_known().string;
    let a = registry
        .register_declared(ClassDecl::new("p.A", Modifiers::PUBLIC))
        .unwrap();
    method(&mut registry, a, "f", Modifiers::PUBLIC, vec![object]);
    method(&mut registry, a, "f", Modifiers::PRIVATE, vec![string]);
    let caller = registry
        .register_declared(ClassDecl::new("q.Caller", Modifiers::PUBLIC))
        .unwrap();
    let found = candidates(&mut registry, a, "f");
    assert_eq!(found.len(), 2);
    let err = registry
        .most_specific(&found, &[string], caller, false)
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NoAccessible { .. }));

    // strict: the inaccessible candidate is dropped up front and the
    // public overload wins
    let mut registry = TypeRegistry::with_config(ReflectConfig { strict_access: true });
    registry.open_unit("test.java");
    let object = registry.well_known().object;
    let string = registry.well_known().string;
    let a = registry
        .register_declared(ClassDecl::new("p.A", Modifiers::PUBLIC))
        .unwrap();
    let f_object = method(&mut registry, a, "f", Modifiers::PUBLIC, vec![object]);
    method(&mut registry, a, "f", Modifiers::PRIVATE, vec![string]);
    let caller = registry
        .register_declared(ClassDecl::new("q.Caller", Modifiers::PUBLIC))
        .unwrap();
    let found = candidates(&mut registry, a, "f");
    let picked = registry
        .most_specific(&found, &[string], caller, false)
        .unwrap();
    assert_eq!(picked, f_object);
}

#[test]
fn constructor_overloads_resolve_like_methods() {
    let mut registry = TypeRegistry::new();
    let mut env = EmptyEnvironment;
    registry.open_unit("test.java");
    let int = registry.primitive(PrimitiveType::Int);
    let long = registry.primitive(PrimitiveType::Long);

    let c = registry
        .register_declared(ClassDecl::new("p.C", Modifiers::PUBLIC))
        .unwrap();
    let ctor_int = registry
        .add_constructor(c, Modifiers::PUBLIC, vec![int], vec![], None)
        .unwrap();
    registry
        .add_constructor(c, Modifiers::PUBLIC, vec![long], vec![], None)
        .unwrap();

    let ctors = registry.constructors(c, &mut env).unwrap();
    assert_eq!(ctors.len(), 2);
    let picked = registry.most_specific(&ctors, &[int], c, true).unwrap();
    assert_eq!(picked, ctor_int);
}

#[test]
fn synthesized_default_constructor_is_selectable() {
    let mut registry = TypeRegistry::new();
    let mut env = EmptyEnvironment;
    registry.open_unit("test.java");
    let c = registry
        .register_declared(ClassDecl::new("p.C", Modifiers::PUBLIC))
        .unwrap();

    let ctors = registry.constructors(c, &mut env).unwrap();
    let picked = registry.most_specific(&ctors, &[], c, true).unwrap();
    assert!(registry.member(picked).synthetic);
}
