//! Accessible member table computation
//!
//! For a given type this merges declared and inherited fields or methods
//! into one table, applying the language's visibility, hiding, and
//! override-compatibility rules. Fields and methods go through the same
//! algorithm; only the conflict handling differs.
//!
//! Merge order: direct interfaces first (so abstract members surface
//! before concrete ones), then the superclass, then the type's own
//! declarations. The own-declaration merge uses the same-class variant of
//! the conflict rules.
//!
//! Recursion over the supertype graph is guarded by a call-stack-scoped
//! "in progress" list: hitting a type already on the stack reports a
//! circularity diagnostic and returns an empty table for that branch. The
//! list lives on the stack, not in the registry, so re-entrant lookups
//! triggered by lazy loading cannot falsely trip the guard.

use crate::error::{ReflectDiagnostic, ReflectError};
use crate::host::Introspector;
use crate::member::{Member, MemberId, MemberKey, MemberKind, MemberTable, CONSTRUCTOR_NAME};
use crate::registry::TypeRegistry;
use crate::span::Span;
use crate::ty::{MemberState, Modifiers, RawMember, TypeId, TypeKind, Visibility};
use std::sync::Arc;

/// Which member namespace is being merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberMode {
    Fields,
    Methods,
}

impl TypeRegistry {
    /// The merged accessible-field table of a type, memoized after the
    /// first query
    pub fn accessible_fields(
        &mut self,
        ty: TypeId,
        env: &mut dyn Introspector,
    ) -> Result<Arc<MemberTable>, ReflectError> {
        let mut stack = Vec::new();
        self.accessible_members(ty, MemberMode::Fields, env, &mut stack)
    }

    /// The merged accessible-method table of a type, memoized after the
    /// first query
    pub fn accessible_methods(
        &mut self,
        ty: TypeId,
        env: &mut dyn Introspector,
    ) -> Result<Arc<MemberTable>, ReflectError> {
        let mut stack = Vec::new();
        self.accessible_members(ty, MemberMode::Methods, env, &mut stack)
    }

    /// Declared constructors of a class, materializing external members
    /// and synthesizing the default constructor on first query
    pub fn constructors(
        &mut self,
        ty: TypeId,
        env: &mut dyn Introspector,
    ) -> Result<Vec<MemberId>, ReflectError> {
        self.materialize_members(ty, env)?;
        let data = self.class_payload(ty, "constructors")?;
        if !data.constructors.is_empty() || data.is_abstract() {
            return Ok(data.constructors.clone());
        }

        // A concrete class with no explicit constructor gets the implicit
        // zero-argument one, mirroring the class's own visibility.
        let visibility =
            data.modifiers & (Modifiers::PUBLIC | Modifiers::PROTECTED | Modifiers::PRIVATE);
        let span = data.span;
        let id = self.add_member(Member {
            owner: ty,
            name: CONSTRUCTOR_NAME.to_string(),
            modifiers: visibility,
            kind: MemberKind::Constructor {
                params: Vec::new(),
                throws: Vec::new(),
            },
            span,
            synthetic: true,
        });
        if let Some(data) = self.kind_mut(ty).class_data_mut() {
            data.constructors.push(id);
        }
        Ok(vec![id])
    }

    fn accessible_members(
        &mut self,
        ty: TypeId,
        mode: MemberMode,
        env: &mut dyn Introspector,
        stack: &mut Vec<TypeId>,
    ) -> Result<Arc<MemberTable>, ReflectError> {
        let memo = match mode {
            MemberMode::Fields => &self.field_tables,
            MemberMode::Methods => &self.method_tables,
        };
        if let Some(table) = memo.get(&ty) {
            return Ok(Arc::clone(table));
        }

        match self.kind(ty) {
            TypeKind::Declared(_) | TypeKind::External(_) | TypeKind::Array(_) => {}
            _ => return Err(self.unsupported(ty, "accessible members")),
        }

        if stack.contains(&ty) {
            let span = self.type_span(ty);
            self.report(
                ty,
                ReflectDiagnostic::CircularInheritance {
                    name: self.type_name(ty),
                    span,
                },
            )?;
            return Ok(Arc::new(MemberTable::new()));
        }

        stack.push(ty);
        let result = self.compute_members(ty, mode, env, stack);
        stack.pop();

        let table = Arc::new(result?);
        let memo = match mode {
            MemberMode::Fields => &mut self.field_tables,
            MemberMode::Methods => &mut self.method_tables,
        };
        memo.insert(ty, Arc::clone(&table));
        Ok(table)
    }

    fn compute_members(
        &mut self,
        ty: TypeId,
        mode: MemberMode,
        env: &mut dyn Introspector,
        stack: &mut Vec<TypeId>,
    ) -> Result<MemberTable, ReflectError> {
        let mut table = MemberTable::new();

        let array_length = match self.kind(ty) {
            TypeKind::Array(data) => Some(data.length_field),
            _ => None,
        };
        if let Some(length) = array_length {
            match mode {
                MemberMode::Fields => {
                    table.insert(self.member_key(length), length);
                }
                MemberMode::Methods => {
                    // Arrays expose exactly the root type's methods.
                    let object = self.well_known().object;
                    let inherited = self.accessible_members(object, mode, env, stack)?;
                    for (key, member) in inherited.iter() {
                        table.insert(key.clone(), *member);
                    }
                }
            }
            return Ok(table);
        }

        self.materialize_members(ty, env)?;

        let data = self.class_payload(ty, "accessible members")?;
        let is_class = !data.is_interface();
        let interfaces = data.interfaces.clone();
        let superclass = data.superclass;
        let own = match mode {
            MemberMode::Fields => data.fields.clone(),
            MemberMode::Methods => data.methods.clone(),
        };

        for interface in interfaces {
            let inherited = self.accessible_members(interface, mode, env, stack)?;
            for member in inherited.members() {
                self.merge_candidate(&mut table, member, ty, false, mode)?;
            }
        }
        if is_class {
            if let Some(superclass) = superclass {
                let inherited = self.accessible_members(superclass, mode, env, stack)?;
                for member in inherited.members() {
                    self.merge_candidate(&mut table, member, ty, false, mode)?;
                }
            }
        }
        for member in own {
            self.merge_candidate(&mut table, member, ty, true, mode)?;
        }

        if mode == MemberMode::Methods && is_class && !self.is_abstract(ty) {
            let unimplemented: Vec<MemberId> = table
                .members()
                .filter(|&member| self.member(member).is_abstract())
                .collect();
            for member in unimplemented {
                let diagnostic = ReflectDiagnostic::MustBeAbstract {
                    class: self.type_name(ty),
                    missing: self.member_signature(member),
                    span: self.type_span(ty),
                };
                self.report(ty, diagnostic)?;
            }
        }

        Ok(table)
    }

    /// Merge one candidate member into the accumulated table for `target`
    ///
    /// `same_class` marks the final merge of the target's own
    /// declarations; inherited merges pass false.
    fn merge_candidate(
        &mut self,
        table: &mut MemberTable,
        candidate: MemberId,
        target: TypeId,
        same_class: bool,
        mode: MemberMode,
    ) -> Result<(), ReflectError> {
        let member = self.member(candidate);
        let owner = member.owner;
        let name = member.name.clone();
        let visibility = member.visibility();

        if owner != target {
            // private members are not inherited
            if visibility == Visibility::Private {
                return Ok(());
            }
            // package-visible members are inherited within the package only
            if visibility == Visibility::Package
                && self.package_name(owner)? != self.package_name(target)?
            {
                return Ok(());
            }
        }

        let signature = self.erased_signature(candidate);
        let conflicts: Vec<(MemberKey, MemberId)> = match mode {
            MemberMode::Fields => table
                .entries_named(&name)
                .map(|(key, id)| (key.clone(), id))
                .collect(),
            MemberMode::Methods => table
                .entries_with_signature(&name, &signature)
                .map(|(key, id)| (key.clone(), id))
                .collect(),
        };

        let mut dropped = false;
        for (key, present) in conflicts {
            // the same declaration reached through two inheritance paths
            // stays a single entry
            if present == candidate {
                return Ok(());
            }
            match mode {
                MemberMode::Fields => {
                    if same_class {
                        // a redeclaration hides what it shadows
                        table.remove(&key);
                    } else {
                        let present_owner = self.member(present).owner;
                        if self.is_assignable(owner, present_owner) {
                            table.remove(&key);
                        } else if self.is_assignable(present_owner, owner) {
                            dropped = true;
                        }
                        // unrelated branches keep both entries; explicit
                        // qualification disambiguates at use sites
                    }
                }
                MemberMode::Methods => {
                    if self.check_override(table, &key, present, candidate, target, same_class)? {
                        dropped = true;
                        break;
                    }
                }
            }
            if dropped {
                break;
            }
        }

        if !dropped {
            table.insert(
                MemberKey {
                    name,
                    signature,
                    owner: self.type_name(owner),
                },
                candidate,
            );
        }
        Ok(())
    }

    /// Override/hide compatibility between a present entry and a new
    /// candidate with the same name and signature
    ///
    /// Returns true when the candidate must be dropped. When the checks
    /// pass, the present entry is removed so the candidate can replace it.
    fn check_override(
        &mut self,
        table: &mut MemberTable,
        key: &MemberKey,
        present: MemberId,
        candidate: MemberId,
        target: TypeId,
        same_class: bool,
    ) -> Result<bool, ReflectError> {
        let old = self.member(present);
        let old_owner = old.owner;
        let old_static = old.is_static();
        let old_abstract = old.is_abstract();
        let old_visibility = old.visibility();
        let old_throws = old.throws().to_vec();
        let new = self.member(candidate);
        let new_static = new.is_static();
        let new_abstract = new.is_abstract();
        let new_visibility = new.visibility();
        let new_owner = new.owner;
        let new_throws = new.throws().to_vec();
        let span = new.span.or_else(|| self.type_span(target));

        let old_ret = self.return_type(present)?;
        let new_ret = self.return_type(candidate)?;
        if !self.returns_compatible(old_ret, new_ret) {
            let diagnostic = ReflectDiagnostic::IncompatibleReturn {
                new: self.qualified_member_signature(candidate),
                old: self.qualified_member_signature(present),
                span,
            };
            self.report(target, diagnostic)?;
            return Ok(true);
        }

        if old_static != new_static {
            let diagnostic = ReflectDiagnostic::IllegalHide {
                new: self.qualified_member_signature(candidate),
                old: self.qualified_member_signature(present),
                span,
            };
            self.report(target, diagnostic)?;
            return Ok(true);
        }

        // Two abstract declarations inherited from unrelated supertypes
        // state one contract requirement; the earlier entry stands for
        // both and no exception or visibility checks apply between them.
        if !same_class
            && old_abstract
            && new_abstract
            && !self.is_assignable(new_owner, old_owner)
            && !self.is_assignable(old_owner, new_owner)
        {
            return Ok(true);
        }

        for exception in &new_throws {
            if self.is_unchecked_exception(*exception) {
                continue;
            }
            let contained = old_throws
                .iter()
                .any(|&declared| self.is_assignable(*exception, declared));
            if !contained {
                let diagnostic = ReflectDiagnostic::WidenedExceptions {
                    new: self.qualified_member_signature(candidate),
                    old: self.qualified_member_signature(present),
                    exception: self.type_name(*exception),
                    span,
                };
                self.report(target, diagnostic)?;
                return Ok(true);
            }
        }

        if new_visibility < old_visibility {
            let diagnostic = ReflectDiagnostic::NarrowedVisibility {
                new: self.qualified_member_signature(candidate),
                old: self.qualified_member_signature(present),
                span,
            };
            self.report(target, diagnostic)?;
            return Ok(true);
        }

        table.remove(key);
        Ok(false)
    }

    /// Declaration location of a type, if it has one
    pub(crate) fn type_span(&self, ty: TypeId) -> Option<Span> {
        self.kind(ty).class_data().and_then(|data| data.span)
    }

    /// Turn the raw member info of an external type into interned member
    /// descriptors; a no-op for declared types and types already
    /// materialized
    pub(crate) fn materialize_members(
        &mut self,
        ty: TypeId,
        env: &mut dyn Introspector,
    ) -> Result<(), ReflectError> {
        let state = match self.kind(ty).class_data() {
            Some(data) => data.members.clone(),
            None => return Ok(()),
        };
        let raw = match state {
            MemberState::Declared | MemberState::Ready => return Ok(()),
            MemberState::Pending(raw) => raw,
            MemberState::Unloaded => {
                let name = match self.kind(ty).class_data() {
                    Some(data) => data.name.clone(),
                    None => return Ok(()),
                };
                match env.introspect(&name)? {
                    Some(info) => info.members,
                    None => Vec::new(),
                }
            }
        };
        if let Some(data) = self.kind_mut(ty).class_data_mut() {
            data.members = MemberState::Ready;
        }

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        let mut constructors = Vec::new();
        for raw_member in raw {
            match raw_member {
                RawMember::Field { name, modifiers, ty: field_ty } => {
                    let field_ty = self.resolve_type_ref(&field_ty, env)?;
                    fields.push(self.add_member(Member {
                        owner: ty,
                        name,
                        modifiers,
                        kind: MemberKind::Field { ty: field_ty },
                        span: None,
                        synthetic: false,
                    }));
                }
                RawMember::Method {
                    name,
                    modifiers,
                    params,
                    ret,
                    throws,
                } => {
                    let params = self.resolve_type_refs(&params, env)?;
                    let ret = self.resolve_type_ref(&ret, env)?;
                    let throws = self.resolve_throws(&throws, env)?;
                    methods.push(self.add_member(Member {
                        owner: ty,
                        name,
                        modifiers,
                        kind: MemberKind::Method { params, ret, throws },
                        span: None,
                        synthetic: false,
                    }));
                }
                RawMember::Constructor {
                    modifiers,
                    params,
                    throws,
                } => {
                    let params = self.resolve_type_refs(&params, env)?;
                    let throws = self.resolve_throws(&throws, env)?;
                    constructors.push(self.add_member(Member {
                        owner: ty,
                        name: CONSTRUCTOR_NAME.to_string(),
                        modifiers,
                        kind: MemberKind::Constructor { params, throws },
                        span: None,
                        synthetic: false,
                    }));
                }
            }
        }

        if let Some(data) = self.kind_mut(ty).class_data_mut() {
            data.fields = fields;
            data.methods = methods;
            data.constructors = constructors;
        }
        Ok(())
    }

    fn resolve_type_refs(
        &mut self,
        refs: &[crate::ty::TypeRef],
        env: &mut dyn Introspector,
    ) -> Result<Vec<TypeId>, ReflectError> {
        refs.iter()
            .map(|type_ref| self.resolve_type_ref(type_ref, env))
            .collect()
    }

    fn resolve_throws(
        &mut self,
        names: &[String],
        env: &mut dyn Introspector,
    ) -> Result<Vec<TypeId>, ReflectError> {
        names
            .iter()
            .map(|name| self.resolve_environment_name(name, env))
            .collect()
    }
}
