//! Overload resolution
//!
//! Given the candidate members sharing a call site's name and the static
//! types of its arguments, picks the unique applicable, accessible, most
//! specific member, or reports exactly why none can be chosen.
//!
//! Two applicability passes: the strict pass uses ordinary assignability,
//! under which the native placeholder type matches nothing. Only when that
//! finds no candidate does the weak pass run, where a native-typed
//! argument coerces to any primitive parameter. Candidates found by the
//! weak pass never compete on specificity; they enter the maximal set as
//! they are.

use crate::error::ResolutionError;
use crate::member::MemberId;
use crate::registry::TypeRegistry;
use crate::ty::{Modifiers, TypeId, TypeKind, Visibility};

impl TypeRegistry {
    /// Whether a member may be referenced from code in `enclosing`
    ///
    /// `self_context` is true for unqualified references and references
    /// through `this` or `super`, which is what protected access outside
    /// the declaring package requires for instance members.
    pub fn is_accessible(&mut self, member: MemberId, enclosing: TypeId, self_context: bool) -> bool {
        let descriptor = self.member(member);
        let owner = descriptor.owner;
        let modifiers = descriptor.modifiers;
        let owner_package = self.package_name(owner).ok();
        let enclosing_package = self.package_name(enclosing).ok();
        let same_package = owner_package.is_some() && owner_package == enclosing_package;

        match modifiers.visibility() {
            Visibility::Public => true,
            Visibility::Private => owner == enclosing,
            Visibility::Package => same_package,
            Visibility::Protected => {
                same_package
                    || (self.is_assignable(enclosing, owner)
                        && (modifiers.contains(Modifiers::STATIC) || self_context))
            }
        }
    }

    /// Pick the unique applicable, accessible, most specific member for a
    /// call with the given argument types
    ///
    /// Works identically for method and constructor candidate sets.
    pub fn most_specific(
        &mut self,
        candidates: &[MemberId],
        args: &[TypeId],
        enclosing: TypeId,
        self_context: bool,
    ) -> Result<MemberId, ResolutionError> {
        // Pass 1: strict assignability only.
        let mut applicable: Vec<(MemberId, bool)> = candidates
            .iter()
            .copied()
            .filter(|&candidate| self.is_applicable(candidate, args, false))
            .map(|candidate| (candidate, false))
            .collect();

        // Pass 2: allow native-to-primitive coercion, but remember who
        // needed it.
        if applicable.is_empty() {
            applicable = candidates
                .iter()
                .copied()
                .filter(|&candidate| self.is_applicable(candidate, args, true))
                .map(|candidate| (candidate, true))
                .collect();
        }

        if applicable.is_empty() {
            let name = candidates
                .first()
                .map(|&candidate| self.member(candidate).name.clone())
                .unwrap_or_else(|| "<none>".to_string());
            let args = args
                .iter()
                .map(|&arg| self.type_name(arg))
                .collect::<Vec<_>>()
                .join(",");
            return Err(ResolutionError::NoApplicable { name, args });
        }

        let total_applicable = applicable.len();
        let sole_applicable = applicable[0].0;
        let name = self.member(sole_applicable).name.clone();

        // Under strict access inaccessible candidates are dropped before
        // specificity; otherwise they stay eligible and are filtered at
        // the end.
        let flagged: Vec<(MemberId, bool, bool)> = applicable
            .into_iter()
            .map(|(candidate, weak)| {
                let accessible = self.is_accessible(candidate, enclosing, self_context);
                (candidate, weak, accessible)
            })
            .collect();
        let working: Vec<(MemberId, bool, bool)> = if self.config().strict_access {
            flagged
                .into_iter()
                .filter(|(_, _, accessible)| *accessible)
                .collect()
        } else {
            flagged
        };

        // Maximally specific set.
        let mut maximal: Vec<(MemberId, bool, bool)> = Vec::new();
        'candidates: for (candidate, weak, accessible) in working {
            if weak {
                maximal.push((candidate, weak, accessible));
                continue;
            }
            let mut index = 0;
            while index < maximal.len() {
                let (other, other_weak, _) = maximal[index];
                if other_weak {
                    index += 1;
                    continue;
                }
                if self.more_specific(other, candidate) {
                    continue 'candidates;
                }
                if self.more_specific(candidate, other) {
                    maximal.remove(index);
                    continue;
                }
                index += 1;
            }
            maximal.push((candidate, weak, accessible));
        }

        let survivors: Vec<MemberId> = maximal
            .iter()
            .filter(|(_, _, accessible)| *accessible)
            .map(|(candidate, _, _)| *candidate)
            .collect();

        match survivors.len() {
            0 => {
                if total_applicable == 1 {
                    Err(ResolutionError::NotAccessible {
                        member: self.qualified_member_signature(sole_applicable),
                    })
                } else {
                    Err(ResolutionError::NoAccessible { name })
                }
            }
            1 => Ok(survivors[0]),
            _ => Err(ResolutionError::Ambiguous {
                first: self.qualified_member_signature(survivors[0]),
                second: self.qualified_member_signature(survivors[1]),
            }),
        }
    }

    /// Whether a candidate accepts the argument types
    ///
    /// In weak mode a native-typed argument additionally matches any
    /// primitive parameter; every other position still needs ordinary
    /// assignability.
    fn is_applicable(&mut self, candidate: MemberId, args: &[TypeId], weak: bool) -> bool {
        let params = self.member(candidate).params().to_vec();
        if params.len() != args.len() {
            return false;
        }
        args.iter().zip(&params).all(|(&arg, &param)| {
            if weak && self.is_native(arg) && self.is_primitive(param) {
                return true;
            }
            self.is_assignable(arg, param)
        })
    }

    fn is_native(&self, ty: TypeId) -> bool {
        matches!(self.kind(ty), TypeKind::Native)
    }

    /// `a` is more specific than `b` when `a`'s declaring type is
    /// assignable to `b`'s and each of `a`'s parameter types is assignable
    /// to `b`'s corresponding one
    fn more_specific(&mut self, a: MemberId, b: MemberId) -> bool {
        let a_owner = self.member(a).owner;
        let b_owner = self.member(b).owner;
        if !self.is_assignable(a_owner, b_owner) {
            return false;
        }
        let a_params = self.member(a).params().to_vec();
        let b_params = self.member(b).params().to_vec();
        if a_params.len() != b_params.len() {
            return false;
        }
        a_params
            .iter()
            .zip(&b_params)
            .all(|(&a_param, &b_param)| self.is_assignable(a_param, b_param))
    }
}
