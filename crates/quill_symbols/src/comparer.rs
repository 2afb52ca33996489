//! Symbol comparers.
//!
//! Every consumer that asks "are these the same symbol" (reference
//! highlighting, quick info, caches keyed by symbol) uses
//! [`SymbolEqualityComparer`]. It applies the two-tier rule:
//!
//! 1. kinds with [`SymbolKind::uses_identity_equality`] compare by reference
//!    identity, so two `x` locals in sibling scopes never match;
//! 2. every other kind compares structurally through
//!    [`SymbolEquivalenceComparer`].

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

use crate::symbol::{Symbol, SymbolData, SymbolKind};

/// Structural, location-insensitive comparison by kind, name, signature and
/// (recursively) containing symbol.
pub struct SymbolEquivalenceComparer;

impl SymbolEquivalenceComparer {
    pub fn equals(x: &Symbol, y: &Symbol) -> bool {
        if std::ptr::eq(x, y) {
            return true;
        }
        let kind = x.kind();
        if kind != y.kind() {
            return false;
        }
        // Without a name or signature, only the declaration itself can say.
        if kind.uses_identity_equality() || kind == SymbolKind::Lambda {
            return x == y;
        }
        if x.name() != y.name() {
            return false;
        }
        let signature_matches = match (x.data(), y.data()) {
            // Overloads differ by parameters only.
            (
                SymbolData::Method { parameter_types: p1, .. },
                SymbolData::Method { parameter_types: p2, .. },
            ) => p1 == p2,
            _ => x.signature_eq(y),
        };
        signature_matches && Self::containing_equivalent(x, y)
    }

    fn containing_equivalent(x: &Symbol, y: &Symbol) -> bool {
        match (x.containing_symbol(), y.containing_symbol()) {
            (Some(a), Some(b)) => Self::equals(&a, &b),
            (None, None) => true,
            _ => false,
        }
    }

    pub fn hash<H: Hasher>(symbol: &Symbol, state: &mut H) {
        let kind = symbol.kind();
        if kind.uses_identity_equality() || kind == SymbolKind::Lambda {
            symbol.hash(state);
            return;
        }
        kind.hash(state);
        symbol.name().hash(state);
        if let Some(containing) = symbol.containing_symbol() {
            Self::hash(&containing, state);
        }
    }
}

/// The two-tier equality rule shared by every symbol-equality consumer.
pub struct SymbolEqualityComparer;

impl SymbolEqualityComparer {
    pub fn equals(x: &Arc<Symbol>, y: &Arc<Symbol>) -> bool {
        if x.kind().uses_identity_equality() {
            return Arc::ptr_eq(x, y);
        }
        SymbolEquivalenceComparer::equals(x, y)
    }

    /// Identity kinds hash with their own declaration hash, which reference
    /// equality implies.
    pub fn hash<H: Hasher>(symbol: &Arc<Symbol>, state: &mut H) {
        if symbol.kind().uses_identity_equality() {
            symbol.hash(state);
        } else {
            SymbolEquivalenceComparer::hash(symbol, state);
        }
    }

    pub fn hash_code(symbol: &Arc<Symbol>) -> u64 {
        let mut hasher = FxHasher::default();
        Self::hash(symbol, &mut hasher);
        hasher.finish()
    }
}

/// A symbol usable as a hash-map key under [`SymbolEqualityComparer`].
#[derive(Debug, Clone)]
pub struct SymbolKey(pub Arc<Symbol>);

impl SymbolKey {
    pub fn new(symbol: &Arc<Symbol>) -> Self {
        Self(Arc::clone(symbol))
    }

    pub fn symbol(&self) -> &Arc<Symbol> {
        &self.0
    }
}

impl PartialEq for SymbolKey {
    fn eq(&self, other: &Self) -> bool {
        SymbolEqualityComparer::equals(&self.0, &other.0)
    }
}

impl Eq for SymbolKey {}

impl Hash for SymbolKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        SymbolEqualityComparer::hash(&self.0, state);
    }
}
