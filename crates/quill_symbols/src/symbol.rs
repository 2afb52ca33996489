//! Symbol definitions.
//!
//! A symbol is a named, located entity. Symbols are immutable once built
//! and shared through `Arc`; the link to the enclosing symbol is a `Weak`
//! back-reference, so a symbol never keeps its container alive.
//!
//! # Equality
//!
//! `Symbol` implements `PartialEq`/`Hash` as *declaration identity*. For the
//! ephemeral kinds (see [`SymbolKind::uses_identity_equality`]) that is the
//! pair (first location, containing symbol), never the name: two `x`
//! declarations at different places are different symbols. Consumers that
//! need "is this the same thing the user means" go through
//! [`crate::SymbolEqualityComparer`] instead, which applies the two-tier
//! rule once for everyone.

use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use quill_core::intern::InternedString;
use quill_core::text::Location;
use quill_syntax::{NodeId, SyntaxKind, SyntaxTree};

use crate::types::TypeId;
use crate::visitor::SymbolVisitor;

/// The closed set of symbol kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Namespace,
    NamedType,
    Method,
    Field,
    Property,
    Parameter,
    Lambda,
    Local,
    Label,
    RangeVariable,
    QueryConclusionVariable,
}

impl SymbolKind {
    /// Kinds compared by reference identity rather than by name and
    /// signature. Two distinct declarations of these kinds are never the
    /// same symbol.
    pub fn uses_identity_equality(self) -> bool {
        matches!(
            self,
            SymbolKind::Label | SymbolKind::Local | SymbolKind::RangeVariable | SymbolKind::QueryConclusionVariable
        )
    }

    /// Whether declaration modifiers mean anything for this kind.
    fn has_modifiers(self) -> bool {
        matches!(
            self,
            SymbolKind::NamedType | SymbolKind::Method | SymbolKind::Field | SymbolKind::Property
        )
    }

    /// The word used for this kind in diagnostics.
    pub fn display_name(self) -> &'static str {
        match self {
            SymbolKind::Namespace => "namespace",
            SymbolKind::NamedType => "type",
            SymbolKind::Method => "method",
            SymbolKind::Field => "field",
            SymbolKind::Property => "property",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Lambda => "lambda",
            SymbolKind::Local => "local variable",
            SymbolKind::Label => "label",
            SymbolKind::RangeVariable => "range variable",
            SymbolKind::QueryConclusionVariable => "query variable",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Accessibility {
    #[default]
    NotApplicable,
    Private,
    Internal,
    Public,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum RefKind {
    #[default]
    None,
    Ref,
    Out,
    In,
}

bitflags::bitflags! {
    /// Declaration modifiers of members and types.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeclarationModifiers: u8 {
        const STATIC   = 1 << 0;
        const ABSTRACT = 1 << 1;
        const VIRTUAL  = 1 << 2;
        const OVERRIDE = 1 << 3;
        const SEALED   = 1 << 4;
        const EXTERN   = 1 << 5;
    }
}

/// Kind-specific payload. The variant determines the symbol's kind.
#[derive(Debug)]
pub enum SymbolData {
    Namespace,
    NamedType { ty: TypeId },
    Method { return_type: TypeId, parameter_types: Vec<TypeId> },
    Field { ty: TypeId },
    Property { ty: TypeId },
    Parameter { ty: TypeId, ordinal: u32, ref_kind: RefKind },
    Lambda { parameters: Vec<Arc<Symbol>> },
    Local { ty: TypeId },
    Label,
    RangeVariable { ty: TypeId },
    /// The variable's type is owned by the binder that introduces it.
    QueryConclusionVariable,
}

impl SymbolData {
    pub fn kind(&self) -> SymbolKind {
        match self {
            SymbolData::Namespace => SymbolKind::Namespace,
            SymbolData::NamedType { .. } => SymbolKind::NamedType,
            SymbolData::Method { .. } => SymbolKind::Method,
            SymbolData::Field { .. } => SymbolKind::Field,
            SymbolData::Property { .. } => SymbolKind::Property,
            SymbolData::Parameter { .. } => SymbolKind::Parameter,
            SymbolData::Lambda { .. } => SymbolKind::Lambda,
            SymbolData::Local { .. } => SymbolKind::Local,
            SymbolData::Label => SymbolKind::Label,
            SymbolData::RangeVariable { .. } => SymbolKind::RangeVariable,
            SymbolData::QueryConclusionVariable => SymbolKind::QueryConclusionVariable,
        }
    }
}

/// A named entity in the program.
#[derive(Debug)]
pub struct Symbol {
    name: InternedString,
    name_text: String,
    locations: Vec<Location>,
    containing: Option<Weak<Symbol>>,
    accessibility: Accessibility,
    modifiers: DeclarationModifiers,
    data: SymbolData,
}

impl Symbol {
    fn build(
        name: InternedString,
        name_text: &str,
        locations: Vec<Location>,
        containing: Option<&Arc<Symbol>>,
        data: SymbolData,
    ) -> Self {
        Self {
            name,
            name_text: name_text.to_string(),
            locations,
            containing: containing.map(Arc::downgrade),
            accessibility: Accessibility::NotApplicable,
            modifiers: DeclarationModifiers::empty(),
            data,
        }
    }

    pub fn namespace(name: InternedString, name_text: &str) -> Arc<Symbol> {
        Arc::new(Self::build(name, name_text, Vec::new(), None, SymbolData::Namespace))
    }

    pub fn named_type(
        name: InternedString,
        name_text: &str,
        containing: Option<&Arc<Symbol>>,
        ty: TypeId,
    ) -> Arc<Symbol> {
        let mut symbol = Self::build(name, name_text, Vec::new(), containing, SymbolData::NamedType { ty });
        symbol.accessibility = Accessibility::Public;
        Arc::new(symbol)
    }

    /// A member symbol: method, field or property, with explicit modifiers.
    pub fn member(
        name: InternedString,
        name_text: &str,
        containing: &Arc<Symbol>,
        accessibility: Accessibility,
        modifiers: DeclarationModifiers,
        data: SymbolData,
    ) -> Arc<Symbol> {
        assert!(
            data.kind().has_modifiers(),
            "{:?} is not a member kind",
            data.kind()
        );
        let mut symbol = Self::build(name, name_text, Vec::new(), Some(containing), data);
        symbol.accessibility = accessibility;
        symbol.modifiers = modifiers;
        Arc::new(symbol)
    }

    pub fn local(
        name: InternedString,
        name_text: &str,
        containing: &Arc<Symbol>,
        location: Location,
        ty: TypeId,
    ) -> Arc<Symbol> {
        Arc::new(Self::build(name, name_text, vec![location], Some(containing), SymbolData::Local { ty }))
    }

    pub fn label(name: InternedString, name_text: &str, containing: &Arc<Symbol>, location: Location) -> Arc<Symbol> {
        Arc::new(Self::build(name, name_text, vec![location], Some(containing), SymbolData::Label))
    }

    pub fn range_variable(
        name: InternedString,
        name_text: &str,
        containing: &Arc<Symbol>,
        location: Location,
        ty: TypeId,
    ) -> Arc<Symbol> {
        Arc::new(Self::build(
            name,
            name_text,
            vec![location],
            Some(containing),
            SymbolData::RangeVariable { ty },
        ))
    }

    /// The identifier of a `yield into` query conclusion.
    pub fn query_conclusion_variable(
        name: InternedString,
        name_text: &str,
        containing: &Arc<Symbol>,
        location: Location,
    ) -> Arc<Symbol> {
        Arc::new(Self::build(
            name,
            name_text,
            vec![location],
            Some(containing),
            SymbolData::QueryConclusionVariable,
        ))
    }

    /// A parameter whose container is not yet shared, used while building a
    /// lambda in [`Symbol::lambda`].
    pub fn parameter(
        name: InternedString,
        name_text: &str,
        containing: &Weak<Symbol>,
        location: Location,
        ty: TypeId,
        ordinal: u32,
        ref_kind: RefKind,
    ) -> Arc<Symbol> {
        let mut symbol = Self::build(
            name,
            name_text,
            vec![location],
            None,
            SymbolData::Parameter { ty, ordinal, ref_kind },
        );
        symbol.containing = Some(containing.clone());
        Arc::new(symbol)
    }

    /// Build a lambda whose parameters point back at it. `make_parameters`
    /// receives the not-yet-alive lambda and must not upgrade it.
    pub fn lambda(
        name: InternedString,
        containing: &Arc<Symbol>,
        location: Location,
        make_parameters: impl FnOnce(&Weak<Symbol>) -> Vec<Arc<Symbol>>,
    ) -> Arc<Symbol> {
        Arc::new_cyclic(|this| {
            let parameters = make_parameters(this);
            Self::build(
                name,
                "lambda",
                vec![location],
                Some(containing),
                SymbolData::Lambda { parameters },
            )
        })
    }

    // ========================================================================
    // Identity attributes
    // ========================================================================

    pub fn kind(&self) -> SymbolKind {
        self.data.kind()
    }

    pub fn name(&self) -> InternedString {
        self.name
    }

    pub fn name_text(&self) -> &str {
        &self.name_text
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn first_location(&self) -> Option<Location> {
        self.locations.first().copied()
    }

    /// The lexically enclosing symbol, if it is still alive.
    pub fn containing_symbol(&self) -> Option<Arc<Symbol>> {
        self.containing.as_ref().and_then(Weak::upgrade)
    }

    pub fn data(&self) -> &SymbolData {
        &self.data
    }

    /// The declared type of typed symbols. Query-conclusion variables get
    /// their type from the binder that introduces them.
    pub fn ty(&self) -> Option<TypeId> {
        match self.data {
            SymbolData::NamedType { ty }
            | SymbolData::Field { ty }
            | SymbolData::Property { ty }
            | SymbolData::Parameter { ty, .. }
            | SymbolData::Local { ty }
            | SymbolData::RangeVariable { ty } => Some(ty),
            SymbolData::Method { return_type, .. } => Some(return_type),
            _ => None,
        }
    }

    /// Parameters of methods and lambdas.
    pub fn parameters(&self) -> &[Arc<Symbol>] {
        match &self.data {
            SymbolData::Lambda { parameters } => parameters,
            _ => &[],
        }
    }

    pub fn is_invocable(&self) -> bool {
        matches!(self.kind(), SymbolKind::Method | SymbolKind::Lambda)
    }

    // ========================================================================
    // Modifiers
    // ========================================================================

    fn has_modifier(&self, modifier: DeclarationModifiers) -> bool {
        self.kind().has_modifiers() && self.modifiers.contains(modifier)
    }

    pub fn declared_accessibility(&self) -> Accessibility {
        if self.kind().has_modifiers() {
            self.accessibility
        } else {
            Accessibility::NotApplicable
        }
    }

    pub fn is_static(&self) -> bool {
        self.has_modifier(DeclarationModifiers::STATIC)
    }

    pub fn is_abstract(&self) -> bool {
        self.has_modifier(DeclarationModifiers::ABSTRACT)
    }

    pub fn is_virtual(&self) -> bool {
        self.has_modifier(DeclarationModifiers::VIRTUAL)
    }

    pub fn is_override(&self) -> bool {
        self.has_modifier(DeclarationModifiers::OVERRIDE)
    }

    pub fn is_sealed(&self) -> bool {
        self.has_modifier(DeclarationModifiers::SEALED)
    }

    pub fn is_extern(&self) -> bool {
        self.has_modifier(DeclarationModifiers::EXTERN)
    }

    // ========================================================================
    // Syntax and dispatch
    // ========================================================================

    /// Re-derive the declaring node from the stored location. Symbols keep
    /// no reference into the tree.
    pub fn declaring_syntax(&self, tree: &SyntaxTree) -> Option<NodeId> {
        let location = self.first_location()?;
        if location.file != tree.file() {
            return None;
        }
        let token = tree.find_token(location.start());
        debug_assert_eq!(tree.token(token).kind, SyntaxKind::IdentifierToken);
        let node = tree.token(token).parent;
        if self.kind() == SymbolKind::QueryConclusionVariable {
            debug_assert_eq!(tree.kind(node), SyntaxKind::QueryConclusion);
        }
        Some(node)
    }

    pub fn accept<V: SymbolVisitor>(&self, visitor: &mut V) -> V::Output {
        match self.kind() {
            SymbolKind::Namespace => visitor.visit_namespace(self),
            SymbolKind::NamedType => visitor.visit_named_type(self),
            SymbolKind::Method => visitor.visit_method(self),
            SymbolKind::Field => visitor.visit_field(self),
            SymbolKind::Property => visitor.visit_property(self),
            SymbolKind::Parameter => visitor.visit_parameter(self),
            SymbolKind::Lambda => visitor.visit_lambda(self),
            SymbolKind::Local => visitor.visit_local(self),
            SymbolKind::Label => visitor.visit_label(self),
            SymbolKind::RangeVariable => visitor.visit_range_variable(self),
            SymbolKind::QueryConclusionVariable => visitor.visit_query_conclusion_variable(self),
        }
    }

    /// Compare containing symbols by declaration identity.
    pub(crate) fn containing_eq(&self, other: &Symbol) -> bool {
        match (self.containing_symbol(), other.containing_symbol()) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a, &b) || *a == *b,
            (None, None) => true,
            _ => false,
        }
    }

    /// Signature payload used by structural comparison.
    pub(crate) fn signature_eq(&self, other: &Symbol) -> bool {
        match (&self.data, &other.data) {
            (
                SymbolData::Method { return_type: r1, parameter_types: p1 },
                SymbolData::Method { return_type: r2, parameter_types: p2 },
            ) => r1 == r2 && p1 == p2,
            (
                SymbolData::Parameter { ty: t1, ordinal: o1, ref_kind: k1 },
                SymbolData::Parameter { ty: t2, ordinal: o2, ref_kind: k2 },
            ) => t1 == t2 && o1 == o2 && k1 == k2,
            (a, b) => a.kind() == b.kind() && self.ty() == other.ty(),
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Symbol) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let kind = self.kind();
        if kind != other.kind() {
            return false;
        }
        if kind.uses_identity_equality() || kind == SymbolKind::Lambda {
            return self.first_location() == other.first_location() && self.containing_eq(other);
        }
        self.name == other.name && self.signature_eq(other) && self.containing_eq(other)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let kind = self.kind();
        if kind.uses_identity_equality() || kind == SymbolKind::Lambda {
            self.first_location().hash(state);
        } else {
            kind.hash(state);
            self.name.hash(state);
        }
        if let Some(containing) = self.containing_symbol() {
            containing.hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::intern::StringInterner;
    use quill_core::text::{FileId, TextSpan};
    use rustc_hash::FxHasher;

    fn at(start: u32) -> Location {
        Location::new(FileId(0), TextSpan::new(start, 1))
    }

    fn hash_of(symbol: &Symbol) -> u64 {
        let mut hasher = FxHasher::default();
        symbol.hash(&mut hasher);
        hasher.finish()
    }

    fn method(interner: &StringInterner) -> Arc<Symbol> {
        let ty = Symbol::named_type(interner.intern("Program"), "Program", None, TypeId(4));
        Symbol::member(
            interner.intern("Main"),
            "Main",
            &ty,
            Accessibility::Public,
            DeclarationModifiers::STATIC,
            SymbolData::Method { return_type: TypeId(0), parameter_types: vec![] },
        )
    }

    #[test]
    fn test_identity_kinds() {
        for kind in [
            SymbolKind::Label,
            SymbolKind::Local,
            SymbolKind::RangeVariable,
            SymbolKind::QueryConclusionVariable,
        ] {
            assert!(kind.uses_identity_equality());
        }
        for kind in [SymbolKind::Field, SymbolKind::Method, SymbolKind::Parameter, SymbolKind::Lambda] {
            assert!(!kind.uses_identity_equality());
        }
    }

    #[test]
    fn test_query_variables_equal_by_location_not_name() {
        let interner = StringInterner::new();
        let main = method(&interner);
        let x = interner.intern("x");
        let a = Symbol::query_conclusion_variable(x, "x", &main, at(10));
        let b = Symbol::query_conclusion_variable(x, "x", &main, at(40));
        let a_again = Symbol::query_conclusion_variable(x, "x", &main, at(10));
        assert_ne!(*a, *b);
        assert_eq!(*a, *a_again);
        assert_eq!(hash_of(&a), hash_of(&a_again));
    }

    #[test]
    fn test_ephemeral_modifiers_are_fixed() {
        let interner = StringInterner::new();
        let main = method(&interner);
        assert!(main.is_static());
        let v = Symbol::query_conclusion_variable(interner.intern("v"), "v", &main, at(3));
        assert!(!v.is_static() && !v.is_abstract() && !v.is_virtual());
        assert!(!v.is_override() && !v.is_sealed() && !v.is_extern());
        assert_eq!(v.declared_accessibility(), Accessibility::NotApplicable);
        assert_eq!(v.containing_symbol().as_deref(), Some(&*main));
    }

    #[test]
    fn test_lambda_parameters_point_back() {
        let interner = StringInterner::new();
        let main = method(&interner);
        let lambda = Symbol::lambda(interner.intern("<lambda>"), &main, at(0), |this| {
            vec![Symbol::parameter(
                interner.intern("r"),
                "r",
                this,
                at(5),
                TypeId(0),
                0,
                RefKind::None,
            )]
        });
        let parameter = &lambda.parameters()[0];
        let owner = parameter.containing_symbol().unwrap();
        assert!(Arc::ptr_eq(&owner, &lambda));
    }

    #[test]
    fn test_containing_symbol_is_not_owned() {
        let interner = StringInterner::new();
        let main = method(&interner);
        let local = Symbol::local(interner.intern("a"), "a", &main, at(1), TypeId(0));
        drop(main);
        assert!(local.containing_symbol().is_none());
    }
}
