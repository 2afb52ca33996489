//! Name lookup vocabulary: options, per-binder and accumulated results, and
//! the completion symbol set.

use std::sync::Arc;

use indexmap::IndexSet;
use quill_symbols::{Symbol, SymbolKind};

bitflags::bitflags! {
    /// Restrictions on what a lookup may find.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LookupOptions: u32 {
        const DEFAULT                  = 0;
        const NAMESPACE_ALIASES_ONLY   = 1 << 0;
        const NAMESPACES_OR_TYPES_ONLY = 1 << 1;
        const LABELS_ONLY              = 1 << 2;
        const MUST_BE_INVOCABLE        = 1 << 3;
        const MUST_NOT_BE_METHOD       = 1 << 4;
    }
}

impl LookupOptions {
    /// Whether variables and members may be found at all.
    pub fn can_consider_members(self) -> bool {
        !self.intersects(
            LookupOptions::NAMESPACE_ALIASES_ONLY
                | LookupOptions::NAMESPACES_OR_TYPES_ONLY
                | LookupOptions::LABELS_ONLY,
        )
    }
}

/// How good a lookup result is. Later variants win when results merge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LookupResultKind {
    #[default]
    Empty,
    WrongArity,
    NotInvocable,
    NotAValue,
    Viable,
}

/// Why a found symbol was not viable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    WrongArity { kind: SymbolKind },
    NotInvocable,
    /// The symbol is a `found` but the context needs a `expected`.
    WrongKind { found: SymbolKind, expected: &'static str },
}

/// The viability verdict on one candidate symbol.
#[derive(Debug, Clone)]
pub struct SingleLookupResult {
    pub kind: LookupResultKind,
    pub symbol: Option<Arc<Symbol>>,
    pub error: Option<LookupError>,
}

impl SingleLookupResult {
    pub fn viable(symbol: &Arc<Symbol>) -> Self {
        Self {
            kind: LookupResultKind::Viable,
            symbol: Some(Arc::clone(symbol)),
            error: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            kind: LookupResultKind::Empty,
            symbol: None,
            error: None,
        }
    }

    pub fn non_viable(kind: LookupResultKind, symbol: &Arc<Symbol>, error: LookupError) -> Self {
        Self {
            kind,
            symbol: Some(Arc::clone(symbol)),
            error: Some(error),
        }
    }
}

/// The accumulated result of looking a name up.
#[derive(Debug, Clone, Default)]
pub struct LookupResult {
    kind: LookupResultKind,
    symbols: Vec<Arc<Symbol>>,
    error: Option<LookupError>,
}

impl LookupResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> LookupResultKind {
        self.kind
    }

    pub fn symbols(&self) -> &[Arc<Symbol>] {
        &self.symbols
    }

    pub fn error(&self) -> Option<&LookupError> {
        self.error.as_ref()
    }

    /// True for a freshly created or cleared result.
    pub fn is_clear(&self) -> bool {
        self.kind == LookupResultKind::Empty && self.symbols.is_empty() && self.error.is_none()
    }

    pub fn clear(&mut self) {
        self.kind = LookupResultKind::Empty;
        self.symbols.clear();
        self.error = None;
    }

    pub fn is_viable(&self) -> bool {
        self.kind == LookupResultKind::Viable
    }

    /// The only symbol found, if exactly one was.
    pub fn single_symbol(&self) -> Option<&Arc<Symbol>> {
        match self.symbols.as_slice() {
            [symbol] => Some(symbol),
            _ => None,
        }
    }

    /// Merge a candidate of the same priority: a better verdict replaces the
    /// result, an equal one adds its symbol.
    pub fn merge_equal(&mut self, single: SingleLookupResult) {
        if single.kind > self.kind {
            self.kind = single.kind;
            self.symbols.clear();
            self.symbols.extend(single.symbol);
            self.error = single.error;
        } else if single.kind == self.kind && single.kind != LookupResultKind::Empty {
            self.symbols.extend(single.symbol);
        }
    }

    /// Merge the result of an outer binder: it only wins when strictly better.
    pub fn merge_prioritized(&mut self, other: &LookupResult) {
        if other.kind > self.kind {
            self.kind = other.kind;
            self.symbols.clone_from(&other.symbols);
            self.error.clone_from(&other.error);
        }
    }
}

/// Names visible at a point, in the order binders contributed them.
#[derive(Debug, Clone, Default)]
pub struct LookupSymbolsInfo {
    names: IndexSet<(String, u32)>,
}

impl LookupSymbolsInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_symbol(&mut self, name: &str, arity: u32) {
        self.names.insert((name.to_string(), arity));
    }

    pub fn contains(&self, name: &str, arity: u32) -> bool {
        self.names.contains(&(name.to_string(), arity))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::intern::StringInterner;
    use quill_symbols::TypeId;

    fn type_symbol(name: &str) -> Arc<Symbol> {
        let interner = StringInterner::new();
        Symbol::named_type(interner.intern(name), name, None, TypeId(0))
    }

    #[test]
    fn test_can_consider_members() {
        assert!(LookupOptions::DEFAULT.can_consider_members());
        assert!(LookupOptions::MUST_BE_INVOCABLE.can_consider_members());
        assert!(!LookupOptions::NAMESPACE_ALIASES_ONLY.can_consider_members());
        assert!(!LookupOptions::LABELS_ONLY.can_consider_members());
    }

    #[test]
    fn test_merge_equal_prefers_better_kind() {
        let a = type_symbol("A");
        let b = type_symbol("B");
        let mut result = LookupResult::new();
        assert!(result.is_clear());
        result.merge_equal(SingleLookupResult::non_viable(
            LookupResultKind::NotInvocable,
            &a,
            LookupError::NotInvocable,
        ));
        result.merge_equal(SingleLookupResult::viable(&b));
        assert!(result.is_viable());
        assert!(Arc::ptr_eq(result.single_symbol().unwrap(), &b));
        assert!(result.error().is_none());

        result.merge_equal(SingleLookupResult::viable(&a));
        assert_eq!(result.symbols().len(), 2);
        assert!(result.single_symbol().is_none());
    }

    #[test]
    fn test_merge_prioritized_keeps_inner_result_on_tie() {
        let inner = type_symbol("Inner");
        let outer = type_symbol("Outer");
        let mut result = LookupResult::new();
        result.merge_equal(SingleLookupResult::viable(&inner));
        let mut other = LookupResult::new();
        other.merge_equal(SingleLookupResult::viable(&outer));
        result.merge_prioritized(&other);
        assert!(Arc::ptr_eq(result.single_symbol().unwrap(), &inner));
        result.clear();
        assert!(result.is_clear());
    }

    #[test]
    fn test_symbols_info_is_a_set() {
        let mut info = LookupSymbolsInfo::new();
        info.add_symbol("x", 0);
        info.add_symbol("y", 0);
        info.add_symbol("x", 0);
        assert_eq!(info.len(), 2);
        assert_eq!(info.names().collect::<Vec<_>>(), vec!["x", "y"]);
    }
}
