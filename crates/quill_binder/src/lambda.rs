//! Deferred lambda binding.
//!
//! An [`UnboundLambda`] knows the shape of a lambda-like body (arity,
//! parameter names, locations and types) as soon as it is created, but
//! binds the body only when first asked. The transition happens once per
//! instance: concurrent first requests wait on the same initialization and
//! every caller observes the same [`BoundLambda`].

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use quill_core::cancel::{CancellationToken, Cancelled};
use quill_core::text::Location;
use quill_diagnostics::DiagnosticCollection;
use quill_symbols::{RefKind, Symbol, SymbolKind, TypeId};
use quill_syntax::ast::QueryConclusionSyntax;
use quill_syntax::{Features, NodeId};

use crate::binder::Binder;
use crate::bound::BoundBlock;
use crate::scopes::QueryConclusionParameters;

/// The shape of a lambda-like construct and how to bind its body.
pub trait UnboundLambdaState: Send + Sync + fmt::Debug {
    fn parameter_count(&self) -> usize;
    fn parameter_name(&self, index: usize) -> &str;
    fn parameter_location(&self, index: usize) -> Location;
    fn parameter_type(&self, index: usize) -> TypeId;
    fn parameter_ref_kind(&self, index: usize) -> RefKind;
    fn has_explicit_parameter_types(&self) -> bool;
    fn is_async(&self) -> bool;
    fn has_known_signature(&self) -> bool;

    /// The language feature this construct belongs to.
    fn feature(&self) -> Features;

    /// The node the lambda was created for.
    fn syntax(&self) -> NodeId;

    /// The chain in effect where the construct appears.
    fn ambient_binder(&self) -> &Arc<Binder>;

    /// The binder that introduces the parameters, with `ambient` as parent.
    fn build_parameter_binder(&self, lambda: &Arc<Symbol>, ambient: &Arc<Binder>) -> Arc<Binder>;

    /// Bind the body under `binder`. `cancellation` is the token of the
    /// caller that triggered the bind.
    fn bind_body(
        &self,
        lambda: &Arc<Symbol>,
        binder: &Arc<Binder>,
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> BoundBlock;
}

// ============================================================================
// Query conclusion
// ============================================================================

/// The body of `yield into x do <expr>`: a one-parameter lambda whose
/// parameter carries the value of the preceding clauses.
#[derive(Debug)]
pub struct QueryConclusionLambdaState {
    syntax: QueryConclusionSyntax,
    variable: Arc<Symbol>,
    variable_type: TypeId,
    ambient: Arc<Binder>,
}

impl QueryConclusionLambdaState {
    pub fn new(syntax: QueryConclusionSyntax, variable: Arc<Symbol>, variable_type: TypeId, ambient: Arc<Binder>) -> Self {
        assert_eq!(
            variable.kind(),
            SymbolKind::QueryConclusionVariable,
            "a query conclusion declares a query conclusion variable"
        );
        Self {
            syntax,
            variable,
            variable_type,
            ambient,
        }
    }

    pub fn variable(&self) -> &Arc<Symbol> {
        &self.variable
    }

    pub fn variable_type(&self) -> TypeId {
        self.variable_type
    }

    fn validate<T>(&self, index: usize, value: T) -> T {
        if index != 0 {
            panic!(
                "parameter index {} is out of range: a query conclusion has exactly one parameter",
                index
            );
        }
        value
    }
}

impl UnboundLambdaState for QueryConclusionLambdaState {
    fn parameter_count(&self) -> usize {
        1
    }

    fn parameter_name(&self, index: usize) -> &str {
        self.validate(index, self.ambient.tree().token_text(self.syntax.identifier))
    }

    fn parameter_location(&self, index: usize) -> Location {
        self.validate(index, self.ambient.tree().token_location(self.syntax.identifier))
    }

    fn parameter_type(&self, index: usize) -> TypeId {
        self.validate(index, self.variable_type)
    }

    fn parameter_ref_kind(&self, index: usize) -> RefKind {
        self.validate(index, RefKind::None)
    }

    fn has_explicit_parameter_types(&self) -> bool {
        false
    }

    fn is_async(&self) -> bool {
        false
    }

    fn has_known_signature(&self) -> bool {
        true
    }

    fn feature(&self) -> Features {
        Features::QUERY_CONCLUSIONS
    }

    fn syntax(&self) -> NodeId {
        self.syntax.node
    }

    fn ambient_binder(&self) -> &Arc<Binder> {
        &self.ambient
    }

    fn build_parameter_binder(&self, lambda: &Arc<Symbol>, ambient: &Arc<Binder>) -> Arc<Binder> {
        let scope = QueryConclusionParameters::new(&self.variable, self.variable_type, lambda);
        Binder::with_scope_in(ambient, scope, Arc::clone(lambda))
    }

    fn bind_body(
        &self,
        _lambda: &Arc<Symbol>,
        binder: &Arc<Binder>,
        diagnostics: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> BoundBlock {
        binder.bind_lambda_expression_as_block(self.syntax.expression, diagnostics, cancellation)
    }
}

// ============================================================================
// Memoized owner
// ============================================================================

/// The result of binding a lambda body.
#[derive(Debug)]
pub struct BoundLambda {
    pub symbol: Arc<Symbol>,
    pub body: BoundBlock,
    diagnostics: DiagnosticCollection,
}

impl BoundLambda {
    /// Diagnostics produced by the one translation of the body.
    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }
}

/// A lambda whose body is bound at most once.
pub struct UnboundLambda {
    state: Box<dyn UnboundLambdaState>,
    bound: OnceCell<BoundLambda>,
}

impl fmt::Debug for UnboundLambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnboundLambda")
            .field("node", &self.state.syntax())
            .field("bound", &self.bound.get().is_some())
            .finish()
    }
}

impl UnboundLambda {
    pub fn new(state: impl UnboundLambdaState + 'static) -> Self {
        Self {
            state: Box::new(state),
            bound: OnceCell::new(),
        }
    }

    pub fn state(&self) -> &dyn UnboundLambdaState {
        self.state.as_ref()
    }

    pub fn node(&self) -> NodeId {
        self.state.syntax()
    }

    pub fn parameter_count(&self) -> usize {
        self.state.parameter_count()
    }

    pub fn parameter_name(&self, index: usize) -> &str {
        self.state.parameter_name(index)
    }

    pub fn parameter_type(&self, index: usize) -> TypeId {
        self.state.parameter_type(index)
    }

    pub fn feature(&self) -> Features {
        self.state.feature()
    }

    /// The bound body, if some caller already bound it.
    pub fn bound(&self) -> Option<&BoundLambda> {
        self.bound.get()
    }

    /// Bind the body, or return the result of the earlier bind.
    pub fn bind(&self, cancellation: &CancellationToken) -> Result<&BoundLambda, Cancelled> {
        self.bound.get_or_try_init(|| self.translate(cancellation))
    }

    /// Like [`UnboundLambda::bind`], and copy the body's diagnostics into
    /// `sink` if this call is the one that bound it.
    pub fn bind_into(
        &self,
        sink: &mut DiagnosticCollection,
        cancellation: &CancellationToken,
    ) -> Result<&BoundLambda, Cancelled> {
        let mut performed = false;
        let bound = self.bound.get_or_try_init(|| {
            performed = true;
            self.translate(cancellation)
        })?;
        if performed {
            sink.extend_from_slice(bound.diagnostics.diagnostics());
        }
        Ok(bound)
    }

    fn translate(&self, cancellation: &CancellationToken) -> Result<BoundLambda, Cancelled> {
        cancellation.check()?;
        let state = self.state.as_ref();
        let ambient = state.ambient_binder();
        let tree = ambient.tree();
        let interner = ambient.interner();
        let location = tree.location(tree.span(state.syntax()));

        let symbol = Symbol::lambda(interner.intern("<lambda>"), ambient.containing_symbol(), location, |this| {
            (0..state.parameter_count())
                .map(|i| {
                    let name = state.parameter_name(i);
                    Symbol::parameter(
                        interner.intern(name),
                        name,
                        this,
                        state.parameter_location(i),
                        state.parameter_type(i),
                        i as u32,
                        state.parameter_ref_kind(i),
                    )
                })
                .collect()
        });
        let binder = state.build_parameter_binder(&symbol, ambient);
        let mut diagnostics = DiagnosticCollection::new();
        let body = state.bind_body(&symbol, &binder, &mut diagnostics, cancellation);
        cancellation.check()?;

        tracing::debug!(
            node = state.syntax().0,
            parameters = state.parameter_count(),
            errors = diagnostics.error_count(),
            "bound lambda body"
        );
        Ok(BoundLambda {
            symbol,
            body,
            diagnostics,
        })
    }
}
