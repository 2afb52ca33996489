//! Per-file semantic model.
//!
//! The model binds its unit at most once and indexes the bound tree so the
//! IDE layer can go from a caret position to a symbol and back. Conclusion
//! lambdas are cached by syntax node; every request for the same node gets
//! the same [`UnboundLambda`] and therefore the same memoized body.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use quill_binder::bound::{walk_expression, walk_statement};
use quill_binder::{
    Binder, BoundBlock, BoundExpression, BoundQueryClause, BoundStatement, BoundTreeWalker, UnboundLambda,
};
use quill_core::cancel::{CancellationToken, Cancelled};
use quill_core::text::{TextPos, TextSpan};
use quill_diagnostics::DiagnosticCollection;
use quill_symbols::{Symbol, SymbolKey, TypeId, TypeTable};
use quill_syntax::{NodeId, SyntaxKind, SyntaxTree, TokenId};
use rustc_hash::FxHashMap;

/// The bound form of a whole file plus the lookup tables built from it.
#[derive(Debug)]
pub struct BoundUnit {
    pub block: BoundBlock,
    diagnostics: DiagnosticCollection,
    /// Name references, by the node that spells them.
    references: FxHashMap<NodeId, Arc<Symbol>>,
    /// Declared locals, range variables and conclusion variables, by the
    /// start of their identifier.
    declarations: FxHashMap<TextPos, Arc<Symbol>>,
    /// Types of symbols that do not carry one themselves.
    variable_types: FxHashMap<SymbolKey, TypeId>,
}

impl BoundUnit {
    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }
}

pub struct SemanticModel {
    tree: Arc<SyntaxTree>,
    types: Arc<TypeTable>,
    parse_diagnostics: DiagnosticCollection,
    binder: Arc<Binder>,
    bound: OnceCell<BoundUnit>,
    lambdas: DashMap<NodeId, Arc<UnboundLambda>>,
}

impl std::fmt::Debug for SemanticModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticModel")
            .field("file", &self.tree.file_name())
            .field("bound", &self.bound.get().is_some())
            .field("lambdas", &self.lambdas.len())
            .finish()
    }
}

impl SemanticModel {
    pub fn new(binder: Arc<Binder>, parse_diagnostics: DiagnosticCollection) -> Self {
        Self {
            tree: Arc::clone(binder.context().tree()),
            types: Arc::clone(binder.context().types()),
            parse_diagnostics,
            binder,
            bound: OnceCell::new(),
            lambdas: DashMap::new(),
        }
    }

    pub fn tree(&self) -> &Arc<SyntaxTree> {
        &self.tree
    }

    pub fn types(&self) -> &Arc<TypeTable> {
        &self.types
    }

    pub fn binder(&self) -> &Arc<Binder> {
        &self.binder
    }

    pub fn parse_diagnostics(&self) -> &DiagnosticCollection {
        &self.parse_diagnostics
    }

    /// Bind the unit, or return the earlier result. `cancellation` is
    /// observed only when this call performs the bind. A cancelled attempt
    /// leaves nothing behind; the next call binds again under its own token.
    pub fn bound_unit(&self, cancellation: &CancellationToken) -> Result<&BoundUnit, Cancelled> {
        self.bound.get_or_try_init(|| {
            let mut diagnostics = DiagnosticCollection::new();
            let block = self.binder.bind_compilation_unit(&mut diagnostics, cancellation)?;
            let mut index = Indexer::default();
            index.visit_block(&block);
            for (node, lambda) in index.lambdas {
                self.lambdas.entry(node).or_insert(lambda);
            }
            Ok(BoundUnit {
                block,
                diagnostics,
                references: index.references,
                declarations: index.declarations,
                variable_types: index.variable_types,
            })
        })
    }

    /// Parse and binding diagnostics, in source order.
    pub fn diagnostics(&self, cancellation: &CancellationToken) -> Result<DiagnosticCollection, Cancelled> {
        let unit = self.bound_unit(cancellation)?;
        let mut all = self.parse_diagnostics.clone();
        all.extend_from_slice(unit.diagnostics.diagnostics());
        all.sort();
        Ok(all)
    }

    /// The deferred body of the query conclusion at `node`.
    pub fn conclusion_lambda(
        &self,
        node: NodeId,
        cancellation: &CancellationToken,
    ) -> Result<Option<Arc<UnboundLambda>>, Cancelled> {
        self.bound_unit(cancellation)?;
        Ok(self.lambdas.get(&node).map(|entry| Arc::clone(entry.value())))
    }

    /// The symbol declared or referenced by the identifier at `position`.
    pub fn symbol_at(
        &self,
        position: TextPos,
        cancellation: &CancellationToken,
    ) -> Result<Option<Arc<Symbol>>, Cancelled> {
        let unit = self.bound_unit(cancellation)?;
        let Some(token) = self.identifier_at(position) else {
            return Ok(None);
        };
        let token = self.tree.token(token);
        if let Some(symbol) = unit.declarations.get(&token.span.start) {
            return Ok(Some(Arc::clone(symbol)));
        }
        Ok(unit.references.get(&token.parent).cloned())
    }

    /// The type of `symbol`, falling back to the type recorded where it was
    /// declared or referenced.
    pub fn symbol_type(
        &self,
        symbol: &Arc<Symbol>,
        cancellation: &CancellationToken,
    ) -> Result<Option<TypeId>, Cancelled> {
        let unit = self.bound_unit(cancellation)?;
        Ok(symbol
            .ty()
            .or_else(|| unit.variable_types.get(&SymbolKey::new(symbol)).copied()))
    }

    /// Every span in this file that declares or references `symbol`, in
    /// source order.
    pub fn reference_spans(
        &self,
        symbol: &Arc<Symbol>,
        cancellation: &CancellationToken,
    ) -> Result<Vec<TextSpan>, Cancelled> {
        let unit = self.bound_unit(cancellation)?;
        let key = SymbolKey::new(symbol);
        let mut spans: Vec<TextSpan> = unit
            .references
            .iter()
            .filter(|(_, referenced)| SymbolKey::new(referenced) == key)
            .map(|(node, _)| self.tree.span(*node))
            .collect();
        spans.extend(
            unit.declarations
                .values()
                .filter(|declared| SymbolKey::new(declared) == key)
                .filter_map(|declared| declared.first_location())
                .filter(|location| location.file == self.tree.file())
                .map(|location| location.span),
        );
        spans.sort_by_key(|span| span.start);
        spans.dedup();
        Ok(spans)
    }

    fn identifier_at(&self, position: TextPos) -> Option<TokenId> {
        let tree = &self.tree;
        std::iter::once(tree.find_token(position))
            .chain(tree.find_token_on_left_of_position(position))
            .find(|id| {
                let token = tree.token(*id);
                token.kind == SyntaxKind::IdentifierToken && !token.is_missing && token.span.intersects_with(position)
            })
    }
}

// ============================================================================
// Index
// ============================================================================

#[derive(Default)]
struct Indexer {
    references: FxHashMap<NodeId, Arc<Symbol>>,
    declarations: FxHashMap<TextPos, Arc<Symbol>>,
    variable_types: FxHashMap<SymbolKey, TypeId>,
    lambdas: Vec<(NodeId, Arc<UnboundLambda>)>,
}

impl Indexer {
    fn declare(&mut self, symbol: &Arc<Symbol>) {
        if let Some(location) = symbol.first_location() {
            self.declarations.insert(location.span.start, Arc::clone(symbol));
        }
    }
}

impl BoundTreeWalker for Indexer {
    fn visit_statement(&mut self, statement: &BoundStatement) {
        if let BoundStatement::LocalDeclaration { local: Some(local), .. } = statement {
            self.declare(local);
        }
        walk_statement(self, statement);
    }

    fn visit_expression(&mut self, expression: &BoundExpression) {
        match expression {
            BoundExpression::QueryConclusionVariable(reference) => {
                self.variable_types
                    .insert(SymbolKey::new(&reference.variable), reference.ty);
            }
            BoundExpression::Query(query) => {
                for clause in &query.clauses {
                    if let BoundQueryClause::From { variable: Some(v), .. } | BoundQueryClause::Let { variable: Some(v), .. } =
                        clause
                    {
                        self.declare(v);
                    }
                }
                if let (Some(variable), Some(lambda)) = (&query.conclusion_variable, &query.conclusion) {
                    self.declare(variable);
                    self.variable_types
                        .insert(SymbolKey::new(variable), lambda.parameter_type(0));
                    self.lambdas.push((lambda.node(), Arc::clone(lambda)));
                }
            }
            _ => {}
        }
        if let Some(symbol) = expression.referenced_symbol() {
            self.references.insert(expression.node(), Arc::clone(symbol));
        }
        walk_expression(self, expression);
    }
}
