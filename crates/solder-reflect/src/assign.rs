//! Assignability and castability relations
//!
//! Implements the conversion rules the resolution engines are built on:
//! the fixed primitive widening table, reference assignability via memoized
//! supertype closures, array covariance, and the static legality of casts.

use crate::error::ReflectError;
use crate::host::Introspector;
use crate::registry::TypeRegistry;
use crate::ty::{PrimitiveType, TypeId, TypeKind};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// The widening table: `WIDENS[from][to]` is true when `from` converts to
/// `to` by identity or a widening conversion. Narrowing never appears
/// here; `boolean` widens only to itself.
///
/// Row/column order matches [`PrimitiveType::ALL`]: boolean, byte, short,
/// char, int, long, float, double.
pub(crate) const WIDENS: [[bool; 8]; 8] = [
    // boolean
    [true, false, false, false, false, false, false, false],
    // byte
    [false, true, true, false, true, true, true, true],
    // short
    [false, false, true, false, true, true, true, true],
    // char
    [false, false, false, true, true, true, true, true],
    // int
    [false, false, false, false, true, true, true, true],
    // long
    [false, false, false, false, false, true, true, true],
    // float
    [false, false, false, false, false, false, true, true],
    // double
    [false, false, false, false, false, false, false, true],
];

/// Whether one primitive widens (or is identical) to another
pub fn primitive_widens(from: PrimitiveType, to: PrimitiveType) -> bool {
    WIDENS[from.index()][to.index()]
}

/// A copied-out view of a descriptor's kind, so the relation checks can
/// recurse into the registry without holding a borrow on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeShape {
    Primitive(PrimitiveType),
    Void,
    Null,
    Native,
    Class,
    Array { component: TypeId, dims: u8 },
}

impl TypeRegistry {
    fn shape(&self, id: TypeId) -> TypeShape {
        match self.kind(id) {
            TypeKind::Primitive(p) => TypeShape::Primitive(*p),
            TypeKind::Void => TypeShape::Void,
            TypeKind::Null => TypeShape::Null,
            TypeKind::Native => TypeShape::Native,
            TypeKind::Declared(_) | TypeKind::External(_) => TypeShape::Class,
            TypeKind::Array(data) => TypeShape::Array {
                component: data.component,
                dims: data.dims,
            },
        }
    }

    /// Check whether a value of type `from` may be assigned where `to` is
    /// expected, without an explicit cast
    pub fn is_assignable(&mut self, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }
        match (self.shape(from), self.shape(to)) {
            (TypeShape::Primitive(a), TypeShape::Primitive(b)) => primitive_widens(a, b),

            // null fits every reference type
            (TypeShape::Null, _) => self.is_reference(to),

            // the native placeholder fits nothing without a coercion
            (TypeShape::Native, _) | (_, TypeShape::Native) => false,
            (_, TypeShape::Null) => false,
            (TypeShape::Void, _) | (_, TypeShape::Void) => false,

            (
                TypeShape::Array {
                    component: from_comp,
                    dims: from_dims,
                },
                TypeShape::Array {
                    component: to_comp,
                    dims: to_dims,
                },
            ) => {
                if from_dims == to_dims {
                    from_comp == to_comp
                        || (self.is_reference(from_comp)
                            && self.is_reference(to_comp)
                            && self.is_assignable(from_comp, to_comp))
                } else if from_dims > to_dims {
                    // A deeper array is itself a reference, so it fits a
                    // shallower array whose component accepts any array.
                    self.accepts_any_array(to_comp)
                } else {
                    false
                }
            }

            (TypeShape::Array { .. }, TypeShape::Class) => self.accepts_any_array(to),

            (TypeShape::Class, TypeShape::Array { .. }) => false,

            (TypeShape::Class, TypeShape::Class) => self.assign_closure(from).contains(&to),

            _ => false,
        }
    }

    fn accepts_any_array(&self, ty: TypeId) -> bool {
        let wk = self.well_known();
        ty == wk.object || ty == wk.cloneable || ty == wk.serializable
    }

    /// The full transitive closure of a reference type's supertypes: the
    /// type itself, its superclass chain, and every implemented or
    /// extended interface. Computed once per type and memoized; the root
    /// type is in every closure.
    pub(crate) fn assign_closure(&mut self, ty: TypeId) -> Arc<FxHashSet<TypeId>> {
        if let Some(closure) = self.closures.get(&ty) {
            return Arc::clone(closure);
        }

        let mut closure = FxHashSet::default();
        let mut pending = vec![ty];
        while let Some(current) = pending.pop() {
            if !closure.insert(current) {
                continue;
            }
            if let Some(data) = self.kind(current).class_data() {
                if let Some(superclass) = data.superclass {
                    pending.push(superclass);
                }
                pending.extend(data.interfaces.iter().copied());
            }
        }
        closure.insert(self.well_known().object);

        let closure = Arc::new(closure);
        self.closures.insert(ty, Arc::clone(&closure));
        closure
    }

    /// Whether `ty` has `ancestor` on its proper superclass chain
    pub fn is_subclass(&self, ty: TypeId, ancestor: TypeId) -> bool {
        let mut seen = FxHashSet::default();
        let mut current = match self.kind(ty).class_data() {
            Some(data) => data.superclass,
            None => return false,
        };
        while let Some(superclass) = current {
            if superclass == ancestor {
                return true;
            }
            if !seen.insert(superclass) {
                return false;
            }
            current = self.kind(superclass).class_data().and_then(|d| d.superclass);
        }
        false
    }

    /// Whether an exception type is unchecked (assignable to the runtime
    /// exception or error roots)
    pub(crate) fn is_unchecked_exception(&mut self, ty: TypeId) -> bool {
        let runtime = self.well_known().runtime_exception;
        let error = self.well_known().error;
        self.is_assignable(ty, runtime) || self.is_assignable(ty, error)
    }

    /// Return-type compatibility between two members sharing a signature:
    /// primitive and `void` returns must match exactly; two reference
    /// returns are accepted as-is, deferring covariant-return legality to
    /// the upstream compiler.
    pub(crate) fn returns_compatible(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        self.is_reference(a) && self.is_reference(b)
    }

    /// Check whether a value of type `from` may be explicitly cast to
    /// `to`. Only consulted when assignability fails in the needed
    /// direction; casts that can only be decided at run time are reported
    /// as legal here.
    pub fn is_castable(
        &mut self,
        from: TypeId,
        to: TypeId,
        env: &mut dyn Introspector,
    ) -> Result<bool, ReflectError> {
        if self.is_assignable(from, to) || self.is_assignable(to, from) {
            return Ok(true);
        }
        match (self.shape(from), self.shape(to)) {
            // all numeric primitives cast among themselves; boolean casts
            // only to boolean, which identity already covered
            (TypeShape::Primitive(a), TypeShape::Primitive(b)) => {
                Ok(a.is_numeric() && b.is_numeric())
            }

            // the native placeholder casts only to primitive-like targets
            (TypeShape::Native, TypeShape::Primitive(_)) => Ok(true),
            (TypeShape::Native, _) | (_, TypeShape::Native) => Ok(false),

            (TypeShape::Null, _) | (_, TypeShape::Null) => Ok(false),
            (TypeShape::Void, _) | (_, TypeShape::Void) => Ok(false),
            (TypeShape::Primitive(_), _) | (_, TypeShape::Primitive(_)) => Ok(false),

            (
                TypeShape::Array {
                    component: from_comp,
                    dims: from_dims,
                },
                TypeShape::Array {
                    component: to_comp,
                    dims: to_dims,
                },
            ) => {
                if from_dims != to_dims {
                    return Ok(false);
                }
                if self.is_reference(from_comp) && self.is_reference(to_comp) {
                    self.is_castable(from_comp, to_comp, env)
                } else {
                    Ok(false)
                }
            }

            (TypeShape::Array { .. }, _) | (_, TypeShape::Array { .. }) => Ok(false),

            (TypeShape::Class, TypeShape::Class) => {
                let from_iface = self.is_interface(from);
                let to_iface = self.is_interface(to);
                match (from_iface, to_iface) {
                    // two unrelated classes never cast
                    (false, false) => Ok(false),
                    // a class casts to an interface (and back) unless the
                    // class is final, in which case assignability already
                    // had the last word
                    (false, true) => Ok(!self.is_final(from)),
                    (true, false) => Ok(!self.is_final(to)),
                    // two unrelated interfaces cast unless a shared
                    // signature would need incompatible return types
                    (true, true) => self.interfaces_castable(from, to, env),
                }
            }
        }
    }

    fn interfaces_castable(
        &mut self,
        from: TypeId,
        to: TypeId,
        env: &mut dyn Introspector,
    ) -> Result<bool, ReflectError> {
        let from_methods = self.accessible_methods(from, env)?;
        let to_methods = self.accessible_methods(to, env)?;
        for (key, member) in from_methods.iter() {
            for (_, other) in to_methods.entries_with_signature(&key.name, &key.signature) {
                let ret_a = self.return_type(*member)?;
                let ret_b = self.return_type(other)?;
                if !self.returns_compatible(ret_a, ret_b) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}
