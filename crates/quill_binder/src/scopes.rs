//! Scope strategies: what each kind of binder declares.

use std::sync::Arc;

use quill_core::intern::InternedString;
use quill_diagnostics::DiagnosticCollection;
use quill_symbols::{Symbol, SymbolEqualityComparer, SymbolKind, TypeId};
use quill_syntax::NodeId;
use rustc_hash::FxHashMap;

use crate::binder::{Binder, ScopeStrategy};
use crate::bound::{BoundExpression, BoundParameter, BoundQueryConclusionVariable};
use crate::lookup::{LookupOptions, LookupResult, LookupSymbolsInfo};

fn wants(symbol: &Symbol, options: LookupOptions) -> bool {
    options.can_consider_members()
        || (options.contains(LookupOptions::NAMESPACES_OR_TYPES_ONLY)
            && matches!(symbol.kind(), SymbolKind::Namespace | SymbolKind::NamedType))
        || (options.contains(LookupOptions::LABELS_ONLY) && symbol.kind() == SymbolKind::Label)
}

// ============================================================================
// Global
// ============================================================================

/// The outermost scope: host-provided fields, methods and named types.
///
/// Members point at their containing type through a weak reference. The
/// scope keeps those containers alive for as long as any binder chain
/// rooted in it exists.
#[derive(Debug, Default)]
pub struct GlobalScope {
    symbols: FxHashMap<InternedString, Vec<Arc<Symbol>>>,
    order: Vec<Arc<Symbol>>,
    containers: Vec<Arc<Symbol>>,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `container` for the lifetime of the scope without making its
    /// name visible.
    pub fn owning(mut self, container: Arc<Symbol>) -> Self {
        self.containers.push(container);
        self
    }

    pub fn containers(&self) -> &[Arc<Symbol>] {
        &self.containers
    }

    pub fn add(&mut self, symbol: Arc<Symbol>) {
        self.symbols
            .entry(symbol.name())
            .or_default()
            .push(Arc::clone(&symbol));
        self.order.push(symbol);
    }

    pub fn with(mut self, symbol: Arc<Symbol>) -> Self {
        self.add(symbol);
        self
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl ScopeStrategy for GlobalScope {
    fn lookup_in_single_binder(
        &self,
        result: &mut LookupResult,
        name: InternedString,
        arity: u32,
        options: LookupOptions,
        requester: &Binder,
    ) {
        if options.contains(LookupOptions::NAMESPACE_ALIASES_ONLY) {
            return;
        }
        for symbol in self.symbols.get(&name).into_iter().flatten() {
            result.merge_equal(requester.check_viability(symbol, arity, options));
        }
    }

    fn add_lookup_symbols_info(&self, info: &mut LookupSymbolsInfo, options: LookupOptions, _requester: &Binder) {
        for symbol in &self.order {
            if wants(symbol, options) {
                info.add_symbol(symbol.name_text(), 0);
            }
        }
    }

    fn describe(&self) -> &'static str {
        "global"
    }
}

// ============================================================================
// Locals
// ============================================================================

/// Locals declared by a `var` statement, visible to the statements after it.
#[derive(Debug, Default)]
pub struct LocalScope {
    locals: FxHashMap<InternedString, Arc<Symbol>>,
}

impl LocalScope {
    pub fn single(local: &Arc<Symbol>) -> Self {
        Self::new([Arc::clone(local)])
    }

    pub fn new(locals: impl IntoIterator<Item = Arc<Symbol>>) -> Self {
        Self {
            locals: locals.into_iter().map(|l| (l.name(), l)).collect(),
        }
    }
}

impl ScopeStrategy for LocalScope {
    fn lookup_in_single_binder(
        &self,
        result: &mut LookupResult,
        name: InternedString,
        arity: u32,
        options: LookupOptions,
        requester: &Binder,
    ) {
        if !options.can_consider_members() {
            return;
        }
        if let Some(local) = self.locals.get(&name) {
            result.merge_equal(requester.check_viability(local, arity, options));
        }
    }

    fn add_lookup_symbols_info(&self, info: &mut LookupSymbolsInfo, options: LookupOptions, _requester: &Binder) {
        if options.can_consider_members() {
            for local in self.locals.values() {
                info.add_symbol(local.name_text(), 0);
            }
        }
    }

    fn describe(&self) -> &'static str {
        "locals"
    }
}

// ============================================================================
// Range variables
// ============================================================================

/// One `from` or `let` range variable, visible to the clauses after it.
#[derive(Debug)]
pub struct RangeVariableScope {
    variable: Arc<Symbol>,
}

impl RangeVariableScope {
    pub fn new(variable: &Arc<Symbol>) -> Self {
        debug_assert_eq!(variable.kind(), SymbolKind::RangeVariable);
        Self {
            variable: Arc::clone(variable),
        }
    }
}

impl ScopeStrategy for RangeVariableScope {
    fn lookup_in_single_binder(
        &self,
        result: &mut LookupResult,
        name: InternedString,
        arity: u32,
        options: LookupOptions,
        requester: &Binder,
    ) {
        if options.can_consider_members() && name == self.variable.name() {
            result.merge_equal(requester.check_viability(&self.variable, arity, options));
        }
    }

    fn add_lookup_symbols_info(&self, info: &mut LookupSymbolsInfo, options: LookupOptions, _requester: &Binder) {
        if options.can_consider_members() {
            info.add_symbol(self.variable.name_text(), 0);
        }
    }

    fn describe(&self) -> &'static str {
        "range variable"
    }
}

// ============================================================================
// Query conclusion parameters
// ============================================================================

/// The scope of a query-conclusion body. It makes the conclusion variable
/// visible by name and binds references to it as the lambda parameter that
/// carries its value.
#[derive(Debug)]
pub struct QueryConclusionParameters {
    variable: Arc<Symbol>,
    variable_type: TypeId,
    lambda: Arc<Symbol>,
    parameter_map: FxHashMap<InternedString, Vec<Arc<Symbol>>>,
}

impl QueryConclusionParameters {
    pub fn new(variable: &Arc<Symbol>, variable_type: TypeId, lambda: &Arc<Symbol>) -> Self {
        assert_eq!(
            variable.kind(),
            SymbolKind::QueryConclusionVariable,
            "query conclusion scope needs a query conclusion variable"
        );
        assert_eq!(lambda.kind(), SymbolKind::Lambda, "query conclusion scope needs a lambda");
        let mut parameter_map: FxHashMap<InternedString, Vec<Arc<Symbol>>> = FxHashMap::default();
        for parameter in lambda.parameters() {
            parameter_map
                .entry(parameter.name())
                .or_default()
                .push(Arc::clone(parameter));
        }
        Self {
            variable: Arc::clone(variable),
            variable_type,
            lambda: Arc::clone(lambda),
            parameter_map,
        }
    }

    pub fn variable(&self) -> &Arc<Symbol> {
        &self.variable
    }

    pub fn variable_type(&self) -> TypeId {
        self.variable_type
    }

    pub fn lambda(&self) -> &Arc<Symbol> {
        &self.lambda
    }
}

impl ScopeStrategy for QueryConclusionParameters {
    fn lookup_in_single_binder(
        &self,
        result: &mut LookupResult,
        name: InternedString,
        arity: u32,
        options: LookupOptions,
        requester: &Binder,
    ) {
        assert!(result.is_clear(), "lookup result must be cleared before each binder");
        if options.contains(LookupOptions::NAMESPACE_ALIASES_ONLY) {
            return;
        }
        if name == self.variable.name() {
            result.merge_equal(requester.check_viability(&self.variable, arity, options));
        }
    }

    fn add_lookup_symbols_info(&self, info: &mut LookupSymbolsInfo, options: LookupOptions, _requester: &Binder) {
        if options.can_consider_members() {
            info.add_symbol(self.variable.name_text(), 0);
        }
    }

    fn bind_query_conclusion_variable(
        &self,
        node: NodeId,
        variable: &Arc<Symbol>,
        _diagnostics: &mut DiagnosticCollection,
    ) -> Option<BoundExpression> {
        if !SymbolEqualityComparer::equals(variable, &self.variable) {
            return None;
        }
        let parameter = match self.parameter_map.get(&variable.name()).map(Vec::as_slice) {
            Some([parameter]) => Arc::clone(parameter),
            other => panic!(
                "query conclusion variable '{}' must map to exactly one parameter, found {}",
                variable.name_text(),
                other.map_or(0, <[_]>::len)
            ),
        };
        Some(BoundExpression::QueryConclusionVariable(BoundQueryConclusionVariable {
            node,
            variable: Arc::clone(&self.variable),
            parameter: BoundParameter {
                node,
                parameter,
                ty: self.variable_type,
                was_compiler_generated: true,
            },
            ty: self.variable_type,
        }))
    }

    fn describe(&self) -> &'static str {
        "query conclusion parameters"
    }
}
