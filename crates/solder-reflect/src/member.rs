//! Member descriptors and the ordered member table
//!
//! A member is a field, method, or constructor declared by (or synthesized
//! for) one type. Like types, members are interned in the registry and
//! referred to by [`MemberId`]; identity is the id.
//!
//! Merged accessible-member sets are kept in a [`MemberTable`]: an ordered
//! map keyed by (name, erased parameter signature, declaring type), so
//! that "all entries named `m`" and "the entry for `m(int)`" are prefix
//! range lookups.

use crate::span::Span;
use crate::ty::{Modifiers, TypeId, Visibility};
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::ops::Bound;

/// Unique identifier for a member in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(pub(crate) u32);

impl MemberId {
    /// Get the raw value of this MemberId
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberId({})", self.0)
    }
}

/// The name every constructor is registered under
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Kind-specific payload of a member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    Field {
        /// Declared field type
        ty: TypeId,
    },
    Method {
        /// Parameter types, in order
        params: Vec<TypeId>,
        /// Return type (`void` included)
        ret: TypeId,
        /// Declared checked exceptions
        throws: Vec<TypeId>,
    },
    Constructor {
        /// Parameter types, in order
        params: Vec<TypeId>,
        /// Declared checked exceptions
        throws: Vec<TypeId>,
    },
}

/// One declared or synthesized member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// The type that declares this member
    pub owner: TypeId,
    /// Simple name; constructors use [`CONSTRUCTOR_NAME`]
    pub name: String,
    /// Modifier bitset
    pub modifiers: Modifiers,
    /// Kind-specific payload
    pub kind: MemberKind,
    /// Declaration location (declared members only)
    pub span: Option<Span>,
    /// True for members the registry invents: default constructors and the
    /// array `length` field
    pub synthetic: bool,
}

impl Member {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifiers::ABSTRACT)
    }

    pub fn visibility(&self) -> Visibility {
        self.modifiers.visibility()
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, MemberKind::Field { .. })
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, MemberKind::Method { .. })
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, MemberKind::Constructor { .. })
    }

    /// Parameter types for methods and constructors; empty for fields
    pub fn params(&self) -> &[TypeId] {
        match &self.kind {
            MemberKind::Method { params, .. } | MemberKind::Constructor { params, .. } => params,
            MemberKind::Field { .. } => &[],
        }
    }

    /// Declared checked exceptions; empty for fields
    pub fn throws(&self) -> &[TypeId] {
        match &self.kind {
            MemberKind::Method { throws, .. } | MemberKind::Constructor { throws, .. } => throws,
            MemberKind::Field { .. } => &[],
        }
    }
}

/// Composite key of a member table entry
///
/// The ordering is (name, signature, owner), which makes every entry for a
/// simple name one contiguous key range.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberKey {
    /// Simple member name
    pub name: String,
    /// Erased parameter signature, e.g. `(int,java.lang.String)`; empty
    /// for fields
    pub signature: String,
    /// Qualified name of the declaring type
    pub owner: String,
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.signature)
    }
}

/// Ordered map from [`MemberKey`] to [`MemberId`]
///
/// One entry per surviving member after merging. Entries are never
/// duplicated for the same originating member, even when it is reachable
/// through several inheritance paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberTable {
    entries: BTreeMap<MemberKey, MemberId>,
}

impl MemberTable {
    pub fn new() -> Self {
        MemberTable {
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert an entry, replacing any previous entry under the same key
    pub fn insert(&mut self, key: MemberKey, member: MemberId) {
        self.entries.insert(key, member);
    }

    /// Remove the entry under a key, returning it if present
    pub fn remove(&mut self, key: &MemberKey) -> Option<MemberId> {
        self.entries.remove(key)
    }

    /// All entries, in key order
    pub fn iter(&self) -> btree_map::Iter<'_, MemberKey, MemberId> {
        self.entries.iter()
    }

    /// All member ids, in key order
    pub fn members(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.entries.values().copied()
    }

    /// Every entry whose simple name matches, as a key-prefix range scan
    pub fn entries_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (&'a MemberKey, MemberId)> + 'a {
        let start = MemberKey {
            name: name.to_string(),
            signature: String::new(),
            owner: String::new(),
        };
        self.entries
            .range((Bound::Included(start), Bound::Unbounded))
            .take_while(move |(key, _)| key.name == name)
            .map(|(key, id)| (key, *id))
    }

    /// Member ids for every entry named `name`
    pub fn members_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = MemberId> + 'a {
        self.entries_named(name).map(|(_, id)| id)
    }

    /// Every entry matching a name and erased parameter signature
    pub fn entries_with_signature<'a>(
        &'a self,
        name: &'a str,
        signature: &'a str,
    ) -> impl Iterator<Item = (&'a MemberKey, MemberId)> + 'a {
        self.entries_named(name)
            .filter(move |(key, _)| key.signature == signature)
    }

    /// Whether any entry matches a name and erased parameter signature
    pub fn contains_signature(&self, name: &str, signature: &str) -> bool {
        self.entries_with_signature(name, signature).next().is_some()
    }
}

impl<'a> IntoIterator for &'a MemberTable {
    type Item = (&'a MemberKey, &'a MemberId);
    type IntoIter = btree_map::Iter<'a, MemberKey, MemberId>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
