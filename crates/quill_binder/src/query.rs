//! Query expression binding.
//!
//! Every `from` and `let` clause prepends a range-variable scope for the
//! clauses after it. A `yield into` conclusion is bound as a deferred
//! one-parameter lambda over the chain outside the query, so range
//! variables are not visible in its body.

use std::sync::Arc;

use quill_core::cancel::CancellationToken;
use quill_diagnostics::{messages, DiagnosticCollection};
use quill_symbols::{Symbol, SymbolKind, TypeId, TypeTable};
use quill_syntax::ast::{
    AstNode, FromClauseSyntax, GroupClauseSyntax, LetClauseSyntax, QueryBodySyntax, QueryConclusionSyntax,
    QueryExpressionSyntax, WrappedExpressionSyntax,
};
use quill_syntax::{NodeId, SyntaxKind, TokenId};

use crate::binder::Binder;
use crate::bound::{BoundBlock, BoundExpression, BoundQuery, BoundQueryClause, BoundStatement};
use crate::lambda::{QueryConclusionLambdaState, UnboundLambda};
use crate::lookup::LookupOptions;
use crate::scopes::RangeVariableScope;

impl Binder {
    pub(crate) fn bind_query(
        self: &Arc<Self>,
        node: NodeId,
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> BoundExpression {
        if cancellation.is_cancelled() {
            return BoundExpression::bad(node);
        }
        let tree = self.tree();
        let syntax = QueryExpressionSyntax::read(tree, node);
        let body = QueryBodySyntax::read(tree, syntax.body);

        let mut binder = Arc::clone(self);
        let mut clauses = Vec::with_capacity(body.clauses.len() + 2);
        for clause in std::iter::once(syntax.from_clause).chain(body.clauses.iter().copied()) {
            match tree.kind(clause) {
                SyntaxKind::FromClause => {
                    let from = FromClauseSyntax::read(tree, clause);
                    let source = binder.bind_expression(from.expression, diagnostics, cancellation);
                    let element = binder.query_element_type(&source, diagnostics);
                    let variable = binder.declare_range_variable(from.identifier, element, diagnostics);
                    if let Some(variable) = &variable {
                        binder = Binder::with_scope(&binder, RangeVariableScope::new(variable));
                    }
                    clauses.push(BoundQueryClause::From { node: clause, variable, source });
                }
                SyntaxKind::WhereClause => {
                    let condition = WrappedExpressionSyntax::read(tree, clause).expression;
                    clauses.push(BoundQueryClause::Where {
                        node: clause,
                        condition: binder.bind_expression(condition, diagnostics, cancellation),
                    });
                }
                SyntaxKind::LetClause => {
                    let syntax = LetClauseSyntax::read(tree, clause);
                    let expression = binder.bind_expression(syntax.expression, diagnostics, cancellation);
                    let variable = binder.declare_range_variable(syntax.identifier, expression.ty(), diagnostics);
                    if let Some(variable) = &variable {
                        binder = Binder::with_scope(&binder, RangeVariableScope::new(variable));
                    }
                    clauses.push(BoundQueryClause::Let { node: clause, variable, expression });
                }
                kind => panic!("{:?} is not a query body clause", kind),
            }
        }

        let types = self.types();
        let mut ty = match body.select_or_group {
            Some(clause) if tree.kind(clause) == SyntaxKind::GroupClause => {
                let group = GroupClauseSyntax::read(tree, clause);
                let element = binder.bind_expression(group.group_expression, diagnostics, cancellation);
                let key = binder.bind_expression(group.by_expression, diagnostics, cancellation);
                let ty = types.sequence(types.grouping(key.ty(), element.ty()));
                clauses.push(BoundQueryClause::Group { node: clause, element, key });
                ty
            }
            Some(clause) => {
                let selected = WrappedExpressionSyntax::read(tree, clause).expression;
                let expression = binder.bind_expression(selected, diagnostics, cancellation);
                let ty = types.sequence(expression.ty());
                clauses.push(BoundQueryClause::Select { node: clause, expression });
                ty
            }
            None => TypeTable::ERROR,
        };

        let (conclusion_variable, conclusion) = match body
            .conclusion
            .and_then(|clause| self.declare_query_conclusion(clause, ty))
        {
            Some((variable, lambda)) => (Some(variable), Some(lambda)),
            None => (None, None),
        };
        if let Some(lambda) = &conclusion {
            match lambda.bind_into(diagnostics, cancellation) {
                Ok(bound) => ty = block_result_type(&bound.body),
                Err(_) => return BoundExpression::bad(node),
            }
        }

        BoundExpression::Query(Box::new(BoundQuery {
            node,
            clauses,
            conclusion_variable,
            conclusion,
            ty,
        }))
    }

    /// The element type a `from` clause ranges over.
    fn query_element_type(&self, source: &BoundExpression, diagnostics: &mut DiagnosticCollection) -> TypeId {
        let types = self.types();
        if types.is_error(source.ty()) {
            return TypeTable::ERROR;
        }
        match types.element_type(source.ty()) {
            Some(element) => element,
            None => {
                let tree = self.tree();
                diagnostics.report(
                    tree.location(tree.span(source.node())),
                    &messages::COULD_NOT_FIND_AN_IMPLEMENTATION_OF_THE_QUERY_PATTERN_FOR_SOURCE_TYPE_0,
                    &[&types.display(source.ty())],
                );
                TypeTable::ERROR
            }
        }
    }

    fn declare_range_variable(
        &self,
        identifier: TokenId,
        ty: TypeId,
        diagnostics: &mut DiagnosticCollection,
    ) -> Option<Arc<Symbol>> {
        let name = self.identifier_value(identifier)?;
        let tree = self.tree();
        let text = tree.token_text(identifier);
        let location = tree.token_location(identifier);

        let existing = self.lookup_symbols(name, 0, LookupOptions::DEFAULT);
        let conflicts = existing.is_viable()
            && existing
                .symbols()
                .iter()
                .any(|s| matches!(s.kind(), SymbolKind::Local | SymbolKind::RangeVariable));
        if conflicts {
            diagnostics.report(
                location,
                &messages::THE_RANGE_VARIABLE_0_CONFLICTS_WITH_A_PREVIOUS_DECLARATION_OF_0,
                &[text],
            );
        }
        Some(Symbol::range_variable(name, text, self.containing_symbol(), location, ty))
    }

    /// Declare the conclusion variable and wrap its body as a deferred
    /// lambda. `None` when the identifier is missing.
    fn declare_query_conclusion(
        self: &Arc<Self>,
        clause: NodeId,
        variable_type: TypeId,
    ) -> Option<(Arc<Symbol>, Arc<UnboundLambda>)> {
        let tree = self.tree();
        let syntax = QueryConclusionSyntax::read(tree, clause);
        let name = self.identifier_value(syntax.identifier)?;
        let variable = Symbol::query_conclusion_variable(
            name,
            tree.token_text(syntax.identifier),
            self.containing_symbol(),
            tree.token_location(syntax.identifier),
        );
        let state = QueryConclusionLambdaState::new(syntax, Arc::clone(&variable), variable_type, Arc::clone(self));
        Some((variable, Arc::new(UnboundLambda::new(state))))
    }
}

/// The type of the value a lambda body returns.
fn block_result_type(block: &BoundBlock) -> TypeId {
    block
        .statements
        .iter()
        .find_map(|statement| match statement {
            BoundStatement::Return {
                expression: Some(expression),
                ..
            } => Some(expression.ty()),
            _ => None,
        })
        .unwrap_or(TypeTable::ERROR)
}
