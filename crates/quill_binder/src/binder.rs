//! The binder chain.
//!
//! A [`Binder`] is one link of an immutable, singly linked chain of scopes,
//! innermost first. Each link owns a [`ScopeStrategy`] describing the names
//! it introduces; name lookup walks the chain outward and stops at the first
//! viable result. Chains are shared through `Arc` and are safe to query
//! from any number of threads.
//!
//! Binding turns syntax into the bound tree. Problems in user code are
//! reported into the caller's [`DiagnosticCollection`] and produce
//! `BoundExpression::Bad`; only contract violations panic.

use std::fmt;
use std::sync::Arc;

use quill_core::cancel::{CancellationToken, Cancelled};
use quill_core::intern::{InternedString, StringInterner};
use quill_core::text::Location;
use quill_diagnostics::{messages, DiagnosticCollection};
use quill_symbols::{Symbol, SymbolKind, TypeId, TypeTable};
use quill_syntax::ast::{
    AstNode, BinaryExpressionSyntax, BlockSyntax, CompilationUnitSyntax, DoStatementSyntax, IdentifierNameSyntax,
    InvocationSyntax, LiteralExpressionSyntax, LocalDeclarationSyntax, MemberAccessSyntax, ReturnStatementSyntax,
    WrappedExpressionSyntax,
};
use quill_syntax::{NodeId, SyntaxKind, SyntaxTree, TokenId};
use rustc_hash::FxHashSet;

use crate::bound::{BoundBlock, BoundExpression, BoundParameter, BoundStatement, ConstantValue};
use crate::lookup::{
    LookupError, LookupOptions, LookupResult, LookupResultKind, LookupSymbolsInfo, SingleLookupResult,
};
use crate::scopes::LocalScope;

/// Deepest expression tree the binder descends into. Left-nested chains
/// such as `a + b + c` grow one level per operator.
pub const MAX_EXPRESSION_DEPTH: usize = 500;

/// State shared by every binder of one syntax tree.
pub struct BindingContext {
    tree: Arc<SyntaxTree>,
    types: Arc<TypeTable>,
    interner: StringInterner,
}

impl BindingContext {
    pub fn new(tree: Arc<SyntaxTree>, types: Arc<TypeTable>, interner: StringInterner) -> Self {
        Self {
            tree,
            types,
            interner,
        }
    }

    pub fn tree(&self) -> &Arc<SyntaxTree> {
        &self.tree
    }

    pub fn types(&self) -> &Arc<TypeTable> {
        &self.types
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }
}

impl fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("file", &self.tree.file_name())
            .finish_non_exhaustive()
    }
}

/// What one link of the chain declares, and how references to it bind.
pub trait ScopeStrategy: Send + Sync {
    /// Add this scope's candidates for `name` to `result`, which the chain
    /// walk always hands over cleared. Viability is decided by `requester`,
    /// the binder the lookup started from.
    fn lookup_in_single_binder(
        &self,
        result: &mut LookupResult,
        name: InternedString,
        arity: u32,
        options: LookupOptions,
        requester: &Binder,
    );

    /// Add the names this scope makes visible, for completion.
    fn add_lookup_symbols_info(&self, info: &mut LookupSymbolsInfo, options: LookupOptions, requester: &Binder);

    /// Bind a reference to a query-conclusion variable this scope
    /// introduces. `None` means "not mine": the chain asks the parent.
    fn bind_query_conclusion_variable(
        &self,
        _node: NodeId,
        _variable: &Arc<Symbol>,
        _diagnostics: &mut DiagnosticCollection,
    ) -> Option<BoundExpression> {
        None
    }

    fn describe(&self) -> &'static str;
}

/// One link of the binder chain.
pub struct Binder {
    parent: Option<Arc<Binder>>,
    scope: Box<dyn ScopeStrategy>,
    containing_symbol: Arc<Symbol>,
    context: Arc<BindingContext>,
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.chain().map(|b| b.scope.describe()))
            .finish()
    }
}

impl Binder {
    /// The outermost binder of a chain.
    pub fn root(
        context: Arc<BindingContext>,
        containing_symbol: Arc<Symbol>,
        scope: impl ScopeStrategy + 'static,
    ) -> Arc<Binder> {
        Arc::new(Binder {
            parent: None,
            scope: Box::new(scope),
            containing_symbol,
            context,
        })
    }

    /// Prepend a scope to `parent`'s chain.
    pub fn with_scope(parent: &Arc<Binder>, scope: impl ScopeStrategy + 'static) -> Arc<Binder> {
        Self::with_scope_in(parent, scope, Arc::clone(&parent.containing_symbol))
    }

    /// Prepend a scope that also changes the containing symbol, as a lambda
    /// body does.
    pub fn with_scope_in(
        parent: &Arc<Binder>,
        scope: impl ScopeStrategy + 'static,
        containing_symbol: Arc<Symbol>,
    ) -> Arc<Binder> {
        Arc::new(Binder {
            parent: Some(Arc::clone(parent)),
            scope: Box::new(scope),
            containing_symbol,
            context: Arc::clone(&parent.context),
        })
    }

    pub fn parent(&self) -> Option<&Arc<Binder>> {
        self.parent.as_ref()
    }

    pub fn scope(&self) -> &dyn ScopeStrategy {
        self.scope.as_ref()
    }

    pub fn containing_symbol(&self) -> &Arc<Symbol> {
        &self.containing_symbol
    }

    pub fn context(&self) -> &Arc<BindingContext> {
        &self.context
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.context.tree
    }

    pub fn types(&self) -> &TypeTable {
        &self.context.types
    }

    pub fn interner(&self) -> &StringInterner {
        &self.context.interner
    }

    /// This binder followed by each enclosing one.
    pub fn chain(&self) -> impl Iterator<Item = &Binder> {
        std::iter::successors(Some(self), |b| b.parent.as_deref())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Resolve `name` innermost-first, stopping at the first binder that
    /// yields a viable result. Non-viable results from inner scopes are kept
    /// unless an outer scope does better, so errors name the closest match.
    pub fn lookup_symbols(&self, name: InternedString, arity: u32, options: LookupOptions) -> LookupResult {
        let mut result = LookupResult::new();
        let mut single = LookupResult::new();
        for binder in self.chain() {
            single.clear();
            binder
                .scope
                .lookup_in_single_binder(&mut single, name, arity, options, self);
            result.merge_prioritized(&single);
            if result.is_viable() {
                tracing::trace!(
                    name = self.interner().resolve(name),
                    scope = binder.scope.describe(),
                    "lookup resolved"
                );
                break;
            }
        }
        result
    }

    /// Every name visible from this binder, innermost scopes first.
    pub fn lookup_symbols_info(&self, options: LookupOptions) -> LookupSymbolsInfo {
        let mut info = LookupSymbolsInfo::new();
        for binder in self.chain() {
            binder.scope.add_lookup_symbols_info(&mut info, options, self);
        }
        info
    }

    /// Decide whether `symbol` is an acceptable answer for a lookup with
    /// `arity` and `options` made from this binder.
    pub fn check_viability(&self, symbol: &Arc<Symbol>, arity: u32, options: LookupOptions) -> SingleLookupResult {
        let kind = symbol.kind();
        let is_type = matches!(kind, SymbolKind::Namespace | SymbolKind::NamedType);
        if options.contains(LookupOptions::LABELS_ONLY) {
            return if kind == SymbolKind::Label {
                SingleLookupResult::viable(symbol)
            } else {
                SingleLookupResult::empty()
            };
        }
        if options.contains(LookupOptions::NAMESPACES_OR_TYPES_ONLY) && !is_type {
            return SingleLookupResult::non_viable(
                LookupResultKind::NotAValue,
                symbol,
                LookupError::WrongKind { found: kind, expected: "type" },
            );
        }
        if arity != 0 && !matches!(kind, SymbolKind::Method | SymbolKind::NamedType) {
            return SingleLookupResult::non_viable(
                LookupResultKind::WrongArity,
                symbol,
                LookupError::WrongArity { kind },
            );
        }
        if options.contains(LookupOptions::MUST_BE_INVOCABLE) && !symbol.is_invocable() {
            return SingleLookupResult::non_viable(LookupResultKind::NotInvocable, symbol, LookupError::NotInvocable);
        }
        if options.contains(LookupOptions::MUST_NOT_BE_METHOD) && kind == SymbolKind::Method {
            return SingleLookupResult::non_viable(
                LookupResultKind::NotAValue,
                symbol,
                LookupError::WrongKind { found: kind, expected: "variable" },
            );
        }
        if is_type && !options.contains(LookupOptions::NAMESPACES_OR_TYPES_ONLY) {
            return SingleLookupResult::non_viable(
                LookupResultKind::NotAValue,
                symbol,
                LookupError::WrongKind { found: kind, expected: "variable" },
            );
        }
        SingleLookupResult::viable(symbol)
    }

    fn report_lookup_failure(
        &self,
        result: &LookupResult,
        name: &str,
        location: Location,
        diagnostics: &mut DiagnosticCollection,
    ) {
        match result.error() {
            None => diagnostics.report(location, &messages::THE_NAME_0_DOES_NOT_EXIST_IN_THE_CURRENT_CONTEXT, &[name]),
            Some(LookupError::NotInvocable) => {
                diagnostics.report(location, &messages::NON_INVOCABLE_MEMBER_0_CANNOT_BE_USED_LIKE_A_METHOD, &[name])
            }
            Some(LookupError::WrongArity { kind }) => diagnostics.report(
                location,
                &messages::THE_NON_GENERIC_1_0_CANNOT_BE_USED_WITH_TYPE_ARGUMENTS,
                &[name, kind.display_name()],
            ),
            Some(LookupError::WrongKind { found, expected }) => diagnostics.report(
                location,
                &messages::_0_IS_A_1_BUT_IS_USED_LIKE_A_2,
                &[name, found.display_name(), *expected],
            ),
        }
    }

    /// Ask the chain which scope introduced `variable` and let it bind the
    /// reference.
    pub fn bind_query_conclusion_variable(
        &self,
        node: NodeId,
        variable: &Arc<Symbol>,
        diagnostics: &mut DiagnosticCollection,
    ) -> BoundExpression {
        for binder in self.chain() {
            if let Some(bound) = binder
                .scope
                .bind_query_conclusion_variable(node, variable, diagnostics)
            {
                return bound;
            }
        }
        let location = self.tree().location(self.tree().span(node));
        diagnostics.report(
            location,
            &messages::QUERY_CONCLUSION_VARIABLE_0_IS_NOT_IN_SCOPE,
            &[variable.name_text()],
        );
        BoundExpression::bad(node)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn bind_expression(
        self: &Arc<Self>,
        node: NodeId,
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> BoundExpression {
        match self.tree().kind(node) {
            SyntaxKind::IdentifierName => self.bind_identifier(node, diagnostics),
            SyntaxKind::NumericLiteralExpression
            | SyntaxKind::StringLiteralExpression
            | SyntaxKind::TrueLiteralExpression
            | SyntaxKind::FalseLiteralExpression => self.bind_literal(node),
            SyntaxKind::ParenthesizedExpression => {
                let inner = WrappedExpressionSyntax::read(self.tree(), node).expression;
                self.bind_expression(inner, diagnostics, cancellation)
            }
            SyntaxKind::MemberAccessExpression => self.bind_member_access(node, diagnostics, cancellation),
            SyntaxKind::InvocationExpression => self.bind_invocation(node, diagnostics, cancellation),
            SyntaxKind::BinaryExpression => self.bind_binary(node, diagnostics, cancellation),
            SyntaxKind::QueryExpression => self.bind_query(node, diagnostics, cancellation),
            kind => panic!("{:?} is not an expression", kind),
        }
    }

    /// Bind the expression of a statement or a lambda body. A tree deeper
    /// than [`MAX_EXPRESSION_DEPTH`] is reported once and bound as `Bad`
    /// without descending into it.
    pub fn bind_root_expression(
        self: &Arc<Self>,
        node: NodeId,
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> BoundExpression {
        let tree = self.tree();
        if exceeds_depth(tree, node, MAX_EXPRESSION_DEPTH) {
            let location = match tree.first_token(node) {
                Some(token) => tree.token_location(token),
                None => tree.location(tree.span(node)),
            };
            diagnostics.report(location, &messages::EXPRESSION_IS_TOO_DEEPLY_NESTED, &[]);
            return BoundExpression::bad(node);
        }
        self.bind_expression(node, diagnostics, cancellation)
    }

    /// Resolve a simple name through the chain.
    pub fn bind_identifier(self: &Arc<Self>, node: NodeId, diagnostics: &mut DiagnosticCollection) -> BoundExpression {
        let tree = self.tree();
        let identifier = IdentifierNameSyntax::read(tree, node).identifier;
        let Some(name) = self.identifier_value(identifier) else {
            // Missing identifier: the parser already reported it.
            return BoundExpression::bad(node);
        };
        let result = self.lookup_symbols(name, 0, LookupOptions::DEFAULT);
        let symbol = match result.single_symbol() {
            Some(symbol) if result.is_viable() => Arc::clone(symbol),
            _ => {
                self.report_lookup_failure(&result, tree.token_text(identifier), tree.token_location(identifier), diagnostics);
                return BoundExpression::bad(node);
            }
        };
        let ty = symbol.ty().unwrap_or(TypeTable::ERROR);
        match symbol.kind() {
            SymbolKind::Local => BoundExpression::Local { node, local: symbol, ty },
            SymbolKind::Field | SymbolKind::Property => BoundExpression::Field { node, field: symbol, ty },
            SymbolKind::RangeVariable => BoundExpression::RangeVariable { node, variable: symbol, ty },
            SymbolKind::Parameter => BoundExpression::Parameter(BoundParameter {
                node,
                parameter: symbol,
                ty,
                was_compiler_generated: false,
            }),
            SymbolKind::QueryConclusionVariable => self.bind_query_conclusion_variable(node, &symbol, diagnostics),
            kind => {
                diagnostics.report(
                    tree.token_location(identifier),
                    &messages::_0_IS_A_1_BUT_IS_USED_LIKE_A_2,
                    &[tree.token_text(identifier), kind.display_name(), "variable"],
                );
                BoundExpression::bad(node)
            }
        }
    }

    pub(crate) fn identifier_value(&self, token: TokenId) -> Option<InternedString> {
        let token = self.tree().token(token);
        if token.is_missing {
            None
        } else {
            token.value
        }
    }

    fn bind_literal(&self, node: NodeId) -> BoundExpression {
        let tree = self.tree();
        let token = LiteralExpressionSyntax::read(tree, node).token;
        let text = tree.token_text(token);
        let (value, ty) = match tree.kind(node) {
            SyntaxKind::NumericLiteralExpression => {
                let value = text
                    .parse::<i64>()
                    .or_else(|_| text.parse::<f64>().map(|f| f as i64))
                    .unwrap_or_default();
                (ConstantValue::Int(value), TypeTable::INT)
            }
            SyntaxKind::StringLiteralExpression => {
                let inner = text.strip_prefix('"').unwrap_or(text);
                let inner = inner.strip_suffix('"').unwrap_or(inner);
                (ConstantValue::Str(inner.to_string()), TypeTable::STRING)
            }
            SyntaxKind::TrueLiteralExpression => (ConstantValue::Bool(true), TypeTable::BOOL),
            _ => (ConstantValue::Bool(false), TypeTable::BOOL),
        };
        BoundExpression::Literal { node, value, ty }
    }

    fn bind_member_access(
        self: &Arc<Self>,
        node: NodeId,
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> BoundExpression {
        let tree = self.tree();
        let syntax = MemberAccessSyntax::read(tree, node);
        let receiver = self.bind_expression(syntax.expression, diagnostics, cancellation);
        let name_token = IdentifierNameSyntax::read(tree, syntax.name).identifier;
        if tree.token(name_token).is_missing || self.types().is_error(receiver.ty()) {
            return BoundExpression::Bad { node, children: vec![receiver] };
        }
        let name = tree.token_text(name_token);
        let location = tree.token_location(name_token);
        match self.types().member(receiver.ty(), name) {
            Some(member) if !member.is_method => BoundExpression::MemberAccess {
                node,
                receiver: Box::new(receiver),
                member: name.to_string(),
                ty: member.ty,
            },
            Some(_) => {
                diagnostics.report(location, &messages::_0_IS_A_1_BUT_IS_USED_LIKE_A_2, &[name, "method", "property"]);
                BoundExpression::Bad { node, children: vec![receiver] }
            }
            None => {
                let type_name = self.types().display(receiver.ty());
                diagnostics.report(location, &messages::_0_DOES_NOT_CONTAIN_A_DEFINITION_FOR_1, &[&type_name, name]);
                BoundExpression::Bad { node, children: vec![receiver] }
            }
        }
    }

    fn bind_invocation(
        self: &Arc<Self>,
        node: NodeId,
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> BoundExpression {
        let tree = self.tree();
        let syntax = InvocationSyntax::read(tree, node);
        let target = syntax.expression;
        match tree.kind(target) {
            SyntaxKind::MemberAccessExpression => {
                let access = MemberAccessSyntax::read(tree, target);
                let receiver = self.bind_expression(access.expression, diagnostics, cancellation);
                let arguments = self.bind_arguments(&syntax.arguments, diagnostics, cancellation);
                let name_token = IdentifierNameSyntax::read(tree, access.name).identifier;
                let bad = |receiver, mut arguments: Vec<BoundExpression>| {
                    arguments.insert(0, receiver);
                    BoundExpression::Bad { node, children: arguments }
                };
                if tree.token(name_token).is_missing || self.types().is_error(receiver.ty()) {
                    return bad(receiver, arguments);
                }
                let name = tree.token_text(name_token);
                let location = tree.token_location(name_token);
                match self.types().member(receiver.ty(), name) {
                    Some(member) if member.is_method => BoundExpression::Call {
                        node,
                        receiver: Some(Box::new(receiver)),
                        method: name.to_string(),
                        arguments,
                        ty: member.ty,
                    },
                    Some(_) => {
                        diagnostics.report(location, &messages::NON_INVOCABLE_MEMBER_0_CANNOT_BE_USED_LIKE_A_METHOD, &[name]);
                        bad(receiver, arguments)
                    }
                    None => {
                        let type_name = self.types().display(receiver.ty());
                        diagnostics.report(location, &messages::_0_DOES_NOT_CONTAIN_A_DEFINITION_FOR_1, &[&type_name, name]);
                        bad(receiver, arguments)
                    }
                }
            }
            SyntaxKind::IdentifierName => {
                let arguments = self.bind_arguments(&syntax.arguments, diagnostics, cancellation);
                let identifier = IdentifierNameSyntax::read(tree, target).identifier;
                let Some(name) = self.identifier_value(identifier) else {
                    return BoundExpression::Bad { node, children: arguments };
                };
                let result = self.lookup_symbols(name, 0, LookupOptions::MUST_BE_INVOCABLE);
                match result.single_symbol() {
                    Some(method) if result.is_viable() => BoundExpression::Call {
                        node,
                        receiver: None,
                        method: method.name_text().to_string(),
                        arguments,
                        ty: method.ty().unwrap_or(TypeTable::ERROR),
                    },
                    _ => {
                        self.report_lookup_failure(
                            &result,
                            tree.token_text(identifier),
                            tree.token_location(identifier),
                            diagnostics,
                        );
                        BoundExpression::Bad { node, children: arguments }
                    }
                }
            }
            _ => {
                let callee = self.bind_expression(target, diagnostics, cancellation);
                let mut children = vec![callee];
                children.extend(self.bind_arguments(&syntax.arguments, diagnostics, cancellation));
                let location = tree.location(tree.span(target));
                diagnostics.report(
                    location,
                    &messages::NON_INVOCABLE_MEMBER_0_CANNOT_BE_USED_LIKE_A_METHOD,
                    &[tree.node_text(target)],
                );
                BoundExpression::Bad { node, children }
            }
        }
    }

    fn bind_arguments(
        self: &Arc<Self>,
        arguments: &[NodeId],
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> Vec<BoundExpression> {
        arguments
            .iter()
            .map(|argument| self.bind_expression(*argument, diagnostics, cancellation))
            .collect()
    }

    fn bind_binary(
        self: &Arc<Self>,
        node: NodeId,
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> BoundExpression {
        let tree = self.tree();
        let syntax = BinaryExpressionSyntax::read(tree, node);
        let left = self.bind_expression(syntax.left, diagnostics, cancellation);
        let right = self.bind_expression(syntax.right, diagnostics, cancellation);
        let operator = tree.token(syntax.operator).kind;
        let (l, r) = (left.ty(), right.ty());
        let ty = if self.types().is_error(l) || self.types().is_error(r) {
            TypeTable::ERROR
        } else {
            match binary_result_type(operator, l, r) {
                Some(ty) => ty,
                None => {
                    diagnostics.report(
                        tree.token_location(syntax.operator),
                        &messages::OPERATOR_0_CANNOT_BE_APPLIED_TO_OPERANDS_OF_TYPE_1_AND_2,
                        &[operator.display_text(), &self.types().display(l), &self.types().display(r)],
                    );
                    TypeTable::ERROR
                }
            }
        };
        BoundExpression::Binary {
            node,
            operator,
            left: Box::new(left),
            right: Box::new(right),
            ty,
        }
    }

    /// Bind an expression-bodied lambda as a block with a single return.
    pub fn bind_lambda_expression_as_block(
        self: &Arc<Self>,
        node: NodeId,
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> BoundBlock {
        let expression = self.bind_root_expression(node, diagnostics, cancellation);
        BoundBlock {
            node,
            statements: vec![BoundStatement::Return {
                node,
                expression: Some(expression),
                was_compiler_generated: true,
            }],
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Bind the whole file. Cancellation is observed before and after; a
    /// cancelled attempt's diagnostics must be discarded by the caller.
    #[tracing::instrument(level = "debug", skip_all, fields(file = %self.tree().file_name()))]
    pub fn bind_compilation_unit(
        self: &Arc<Self>,
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> Result<BoundBlock, Cancelled> {
        cancellation.check()?;
        let tree = self.tree();
        let unit = CompilationUnitSyntax::read(tree, tree.root());
        let statements = self.bind_statements(&unit.statements, diagnostics, cancellation);
        cancellation.check()?;
        tracing::debug!(statements = statements.len(), errors = diagnostics.error_count(), "bound unit");
        Ok(BoundBlock {
            node: tree.root(),
            statements,
        })
    }

    pub fn bind_block(
        self: &Arc<Self>,
        node: NodeId,
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> BoundBlock {
        let syntax = BlockSyntax::read(self.tree(), node);
        BoundBlock {
            node,
            statements: self.bind_statements(&syntax.statements, diagnostics, cancellation),
        }
    }

    /// Bind a statement list. Each `var` declaration prepends a scope for
    /// the statements after it.
    fn bind_statements(
        self: &Arc<Self>,
        statements: &[NodeId],
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> Vec<BoundStatement> {
        let tree = self.tree();
        let mut binder = Arc::clone(self);
        let mut declared = FxHashSet::default();
        let mut unreachable_reported = false;
        let mut after_terminal = false;
        let mut bound = Vec::with_capacity(statements.len());

        for &statement in statements {
            if after_terminal && !unreachable_reported {
                unreachable_reported = true;
                diagnostics.report(tree.location(tree.span(statement)), &messages::UNREACHABLE_CODE_DETECTED, &[]);
            }
            let result = if tree.kind(statement) == SyntaxKind::LocalDeclarationStatement {
                let syntax = LocalDeclarationSyntax::read(tree, statement);
                let initializer = binder.bind_root_expression(syntax.initializer, diagnostics, cancellation);
                let local = self.identifier_value(syntax.identifier).map(|name| {
                    let location = tree.token_location(syntax.identifier);
                    if !declared.insert(name) {
                        diagnostics.report(
                            location,
                            &messages::A_LOCAL_VARIABLE_NAMED_0_IS_ALREADY_DEFINED_IN_THIS_SCOPE,
                            &[tree.token_text(syntax.identifier)],
                        );
                    }
                    let local = Symbol::local(
                        name,
                        tree.token_text(syntax.identifier),
                        binder.containing_symbol(),
                        location,
                        initializer.ty(),
                    );
                    binder = Binder::with_scope(&binder, LocalScope::single(&local));
                    local
                });
                BoundStatement::LocalDeclaration {
                    node: statement,
                    local,
                    initializer,
                }
            } else {
                binder.bind_statement(statement, diagnostics, cancellation)
            };
            after_terminal |= result.is_terminal();
            bound.push(result);
        }
        bound
    }

    fn bind_statement(
        self: &Arc<Self>,
        node: NodeId,
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> BoundStatement {
        let tree = self.tree();
        match tree.kind(node) {
            SyntaxKind::Block => BoundStatement::Block(self.bind_block(node, diagnostics, cancellation)),
            SyntaxKind::ExpressionStatement => {
                let expression = WrappedExpressionSyntax::read(tree, node).expression;
                BoundStatement::Expression {
                    node,
                    expression: self.bind_root_expression(expression, diagnostics, cancellation),
                }
            }
            SyntaxKind::ReturnStatement => {
                let syntax = ReturnStatementSyntax::read(tree, node);
                BoundStatement::Return {
                    node,
                    expression: syntax.expression.map(|e| self.bind_root_expression(e, diagnostics, cancellation)),
                    was_compiler_generated: false,
                }
            }
            SyntaxKind::YieldReturnStatement => {
                let syntax = ReturnStatementSyntax::read(tree, node);
                let expression = match syntax.expression {
                    Some(e) => self.bind_root_expression(e, diagnostics, cancellation),
                    None => BoundExpression::bad(node),
                };
                BoundStatement::YieldReturn { node, expression }
            }
            SyntaxKind::YieldBreakStatement => BoundStatement::YieldBreak { node },
            SyntaxKind::DoStatement => {
                let syntax = DoStatementSyntax::read(tree, node);
                BoundStatement::Do {
                    node,
                    body: self.bind_block(syntax.body, diagnostics, cancellation),
                    condition: self.bind_root_expression(syntax.condition, diagnostics, cancellation),
                }
            }
            kind => panic!("{:?} is not a statement", kind),
        }
    }
}

/// Whether any node under `root` lies more than `limit` levels below it.
fn exceeds_depth(tree: &SyntaxTree, root: NodeId, limit: usize) -> bool {
    let mut pending = vec![(root, 0usize)];
    while let Some((node, depth)) = pending.pop() {
        if depth > limit {
            return true;
        }
        pending.extend(tree.child_nodes(node).map(|child| (child, depth + 1)));
    }
    false
}

fn binary_result_type(operator: SyntaxKind, left: TypeId, right: TypeId) -> Option<TypeId> {
    use SyntaxKind::*;
    match (operator, left, right) {
        (PlusToken, TypeTable::INT, TypeTable::INT) => Some(TypeTable::INT),
        (PlusToken, TypeTable::STRING, _) | (PlusToken, _, TypeTable::STRING) => Some(TypeTable::STRING),
        (MinusToken | AsteriskToken | SlashToken, TypeTable::INT, TypeTable::INT) => Some(TypeTable::INT),
        (LessThanToken | GreaterThanToken | LessThanEqualsToken | GreaterThanEqualsToken, TypeTable::INT, TypeTable::INT) => {
            Some(TypeTable::BOOL)
        }
        (EqualsEqualsToken | ExclamationEqualsToken, l, r) if l == r => Some(TypeTable::BOOL),
        (AmpersandAmpersandToken | BarBarToken, TypeTable::BOOL, TypeTable::BOOL) => Some(TypeTable::BOOL),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scopes::GlobalScope;
    use quill_core::text::{FileId, TextSpan};
    use quill_syntax::ParseOptions;

    fn root(interner: &StringInterner) -> (Arc<Binder>, Arc<Symbol>) {
        let (tree, _) = quill_parser::parse_text(FileId(0), "t.ql", "", &ParseOptions::default(), interner);
        let program = Symbol::named_type(interner.intern("Program"), "Program", None, TypeTable::INT);
        let context = Arc::new(BindingContext::new(tree, Arc::new(TypeTable::new()), interner.clone()));
        (Binder::root(context, Arc::clone(&program), GlobalScope::new()), program)
    }

    #[test]
    fn test_binary_result_types() {
        use SyntaxKind::*;
        assert_eq!(binary_result_type(PlusToken, TypeTable::INT, TypeTable::INT), Some(TypeTable::INT));
        assert_eq!(binary_result_type(PlusToken, TypeTable::INT, TypeTable::STRING), Some(TypeTable::STRING));
        assert_eq!(binary_result_type(LessThanToken, TypeTable::INT, TypeTable::INT), Some(TypeTable::BOOL));
        assert_eq!(binary_result_type(EqualsEqualsToken, TypeTable::STRING, TypeTable::STRING), Some(TypeTable::BOOL));
        assert_eq!(binary_result_type(EqualsEqualsToken, TypeTable::STRING, TypeTable::INT), None);
        assert_eq!(binary_result_type(BarBarToken, TypeTable::BOOL, TypeTable::INT), None);
        assert_eq!(binary_result_type(MinusToken, TypeTable::STRING, TypeTable::STRING), None);
    }

    #[test]
    fn test_check_viability_labels_only() {
        let interner = StringInterner::new();
        let (binder, program) = root(&interner);
        let at = Location::new(FileId(0), TextSpan::new(0, 1));
        let label = Symbol::label(interner.intern("l"), "l", &program, at);
        let local = Symbol::local(interner.intern("v"), "v", &program, at, TypeTable::INT);

        let viable = binder.check_viability(&label, 0, LookupOptions::LABELS_ONLY);
        assert_eq!(viable.kind, LookupResultKind::Viable);
        let skipped = binder.check_viability(&local, 0, LookupOptions::LABELS_ONLY);
        assert_eq!(skipped.kind, LookupResultKind::Empty);
        assert!(skipped.symbol.is_none());
    }

    #[test]
    fn test_check_viability_types() {
        let interner = StringInterner::new();
        let (binder, program) = root(&interner);
        let as_value = binder.check_viability(&program, 0, LookupOptions::DEFAULT);
        assert_eq!(as_value.kind, LookupResultKind::NotAValue);
        assert_eq!(
            as_value.error,
            Some(LookupError::WrongKind { found: SymbolKind::NamedType, expected: "variable" })
        );
        let as_type = binder.check_viability(&program, 0, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
        assert_eq!(as_type.kind, LookupResultKind::Viable);
        let generic = binder.check_viability(&program, 2, LookupOptions::NAMESPACES_OR_TYPES_ONLY);
        assert_eq!(generic.kind, LookupResultKind::Viable);
    }

    #[test]
    fn test_debug_lists_chain() {
        let interner = StringInterner::new();
        let (binder, program) = root(&interner);
        let at = Location::new(FileId(0), TextSpan::new(0, 1));
        let local = Symbol::local(interner.intern("v"), "v", &program, at, TypeTable::INT);
        let inner = Binder::with_scope(&binder, LocalScope::single(&local));
        assert_eq!(format!("{:?}", inner), r#"["locals", "global"]"#);
        assert!(Arc::ptr_eq(inner.parent().unwrap(), &binder));
        assert_eq!(inner.chain().count(), 2);
    }
}
