//! quill_symbols: The symbol model and type table.
//!
//! Symbols describe named, located entities; the shared comparers decide
//! when two of them are "the same". Types are interned in a [`TypeTable`]
//! that every binding attempt of a compilation shares.

pub mod comparer;
pub mod symbol;
pub mod types;
pub mod visitor;

pub use comparer::{SymbolEqualityComparer, SymbolEquivalenceComparer, SymbolKey};
pub use symbol::{Accessibility, DeclarationModifiers, RefKind, Symbol, SymbolData, SymbolKind};
pub use types::{Member, TypeId, TypeKind, TypeTable};
pub use visitor::{SymbolDisplay, SymbolVisitor};
