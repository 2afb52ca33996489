//! Type system representation.
//!
//! Types are stored in a [`TypeTable`] and referenced by [`TypeId`]. The
//! table is shared by every binding attempt of a compilation, so it interns
//! behind a lock: sequence and grouping types are structural and created on
//! demand from any thread.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TypeId(pub u32);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The specific data for each type kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Intrinsic types: int, string, bool, and the error type.
    Intrinsic { name: &'static str },
    /// A named object type with ordered members.
    Object {
        name: String,
        members: IndexMap<String, Member>,
    },
    /// A queryable sequence of `element`.
    Sequence { element: TypeId },
    /// The result element of a `group ... by` clause: a sequence of
    /// `element` with a `Key`.
    Grouping { key: TypeId, element: TypeId },
}

/// A member of a type, as seen by member lookup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    pub ty: TypeId,
    pub is_method: bool,
}

impl Member {
    pub fn field(ty: TypeId) -> Self {
        Self { ty, is_method: false }
    }

    pub fn method(ty: TypeId) -> Self {
        Self { ty, is_method: true }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum StructuralKey {
    Sequence(TypeId),
    Grouping(TypeId, TypeId),
}

#[derive(Debug, Default)]
struct TypeTableInner {
    types: Vec<TypeKind>,
    structural: FxHashMap<StructuralKey, TypeId>,
    named: FxHashMap<String, TypeId>,
}

/// The type table stores all types and provides access by TypeId.
#[derive(Debug)]
pub struct TypeTable {
    inner: RwLock<TypeTableInner>,
}

impl TypeTable {
    pub const INT: TypeId = TypeId(0);
    pub const STRING: TypeId = TypeId(1);
    pub const BOOL: TypeId = TypeId(2);
    /// The type of expressions that failed to bind. Never reported on.
    pub const ERROR: TypeId = TypeId(3);

    pub fn new() -> Self {
        let mut inner = TypeTableInner::default();
        for name in ["int", "string", "bool", "?"] {
            inner.types.push(TypeKind::Intrinsic { name });
        }
        for (name, id) in [("int", Self::INT), ("string", Self::STRING), ("bool", Self::BOOL)] {
            inner.named.insert(name.to_string(), id);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TypeTableInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TypeTableInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Declare a named object type. Redeclaring a name replaces the lookup
    /// entry but keeps the earlier type alive for existing references.
    pub fn declare_object(&self, name: &str, members: IndexMap<String, Member>) -> TypeId {
        let mut inner = self.write();
        let id = TypeId(inner.types.len() as u32);
        inner.types.push(TypeKind::Object {
            name: name.to_string(),
            members,
        });
        inner.named.insert(name.to_string(), id);
        id
    }

    /// Resolve a type name, including the `seq<T>` spelling.
    pub fn lookup_named(&self, name: &str) -> Option<TypeId> {
        let name = name.trim();
        if let Some(inner) = name.strip_prefix("seq<").and_then(|n| n.strip_suffix('>')) {
            let element = self.lookup_named(inner)?;
            return Some(self.sequence(element));
        }
        self.read().named.get(name).copied()
    }

    pub fn sequence(&self, element: TypeId) -> TypeId {
        self.intern_structural(StructuralKey::Sequence(element), TypeKind::Sequence { element })
    }

    pub fn grouping(&self, key: TypeId, element: TypeId) -> TypeId {
        self.intern_structural(StructuralKey::Grouping(key, element), TypeKind::Grouping { key, element })
    }

    fn intern_structural(&self, key: StructuralKey, kind: TypeKind) -> TypeId {
        if let Some(id) = self.read().structural.get(&key) {
            return *id;
        }
        let mut inner = self.write();
        // Another thread may have interned it between the two locks.
        if let Some(id) = inner.structural.get(&key) {
            return *id;
        }
        let id = TypeId(inner.types.len() as u32);
        inner.types.push(kind);
        inner.structural.insert(key, id);
        id
    }

    pub fn kind(&self, ty: TypeId) -> TypeKind {
        self.read().types[ty.index()].clone()
    }

    pub fn is_error(&self, ty: TypeId) -> bool {
        ty == Self::ERROR
    }

    /// The element type if `ty` can be the source of a query.
    pub fn element_type(&self, ty: TypeId) -> Option<TypeId> {
        match self.read().types[ty.index()] {
            TypeKind::Sequence { element } | TypeKind::Grouping { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Look up a member by name, including the built-in sequence operators.
    pub fn member(&self, ty: TypeId, name: &str) -> Option<Member> {
        let kind = self.kind(ty);
        match kind {
            TypeKind::Object { members, .. } => members.get(name).copied(),
            TypeKind::Sequence { element } => Self::sequence_member(element, name),
            TypeKind::Grouping { key, element } => match name {
                "Key" => Some(Member::field(key)),
                _ => Self::sequence_member(element, name),
            },
            TypeKind::Intrinsic { name: "string" } if name == "Length" => Some(Member::field(Self::INT)),
            TypeKind::Intrinsic { .. } => None,
        }
    }

    fn sequence_member(element: TypeId, name: &str) -> Option<Member> {
        match name {
            "Count" | "Sum" => Some(Member::method(Self::INT)),
            "First" => Some(Member::method(element)),
            "Any" => Some(Member::method(Self::BOOL)),
            _ => None,
        }
    }

    /// Member names of `ty` in declaration order, for completion.
    pub fn member_names(&self, ty: TypeId) -> Vec<String> {
        match self.kind(ty) {
            TypeKind::Object { members, .. } => members.keys().cloned().collect(),
            TypeKind::Sequence { .. } => ["Any", "Count", "First", "Sum"].map(String::from).to_vec(),
            TypeKind::Grouping { .. } => ["Any", "Count", "First", "Key", "Sum"].map(String::from).to_vec(),
            TypeKind::Intrinsic { name: "string" } => vec!["Length".to_string()],
            TypeKind::Intrinsic { .. } => Vec::new(),
        }
    }

    pub fn display(&self, ty: TypeId) -> String {
        match self.kind(ty) {
            TypeKind::Intrinsic { name } => name.to_string(),
            TypeKind::Object { name, .. } => name,
            TypeKind::Sequence { element } => format!("seq<{}>", self.display(element)),
            TypeKind::Grouping { key, element } => {
                format!("grouping<{}, {}>", self.display(key), self.display(element))
            }
        }
    }

    /// Get the total number of types.
    pub fn len(&self) -> usize {
        self.read().types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().types.is_empty()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(table: &TypeTable) -> TypeId {
        let mut members = IndexMap::new();
        members.insert("Name".to_string(), Member::field(TypeTable::STRING));
        members.insert("Age".to_string(), Member::field(TypeTable::INT));
        table.declare_object("Person", members)
    }

    #[test]
    fn test_structural_types_are_interned() {
        let table = TypeTable::new();
        let a = table.sequence(TypeTable::INT);
        let b = table.sequence(TypeTable::INT);
        assert_eq!(a, b);
        assert_ne!(a, table.sequence(TypeTable::STRING));
        assert_eq!(table.display(table.grouping(TypeTable::INT, a)), "grouping<int, seq<int>>");
    }

    #[test]
    fn test_member_lookup() {
        let table = TypeTable::new();
        let p = person(&table);
        assert_eq!(table.member(p, "Age"), Some(Member::field(TypeTable::INT)));
        assert_eq!(table.member(p, "Missing"), None);
        let people = table.sequence(p);
        assert_eq!(table.member(people, "First"), Some(Member::method(p)));
        let groups = table.grouping(TypeTable::INT, p);
        assert_eq!(table.member(groups, "Key"), Some(Member::field(TypeTable::INT)));
        assert_eq!(table.element_type(groups), Some(p));
    }

    #[test]
    fn test_lookup_named_sequence() {
        let table = TypeTable::new();
        let p = person(&table);
        assert_eq!(table.lookup_named("seq<Person>"), Some(table.sequence(p)));
        assert_eq!(table.lookup_named("Nope"), None);
    }

    #[test]
    fn test_concurrent_interning_agrees() {
        let table = TypeTable::new();
        let ids: Vec<TypeId> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| table.sequence(TypeTable::BOOL)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
    }
}
