//! quill_binder: Name resolution and deferred lambda binding.
//!
//! The binder chain resolves names innermost-first through composable scope
//! strategies and translates syntax into the bound tree. Lambda-like bodies
//! such as query conclusions are bound lazily, at most once, through
//! [`UnboundLambda`].

mod binder;
pub mod bound;
mod lambda;
pub mod lookup;
mod query;
pub mod scopes;

pub use binder::{Binder, BindingContext, ScopeStrategy, MAX_EXPRESSION_DEPTH};
pub use bound::{
    BoundBlock, BoundExpression, BoundParameter, BoundQuery, BoundQueryClause, BoundQueryConclusionVariable,
    BoundStatement, BoundTreeWalker, ConstantValue,
};
pub use lambda::{BoundLambda, QueryConclusionLambdaState, UnboundLambda, UnboundLambdaState};
pub use lookup::{LookupError, LookupOptions, LookupResult, LookupResultKind, LookupSymbolsInfo, SingleLookupResult};
pub use scopes::{GlobalScope, LocalScope, QueryConclusionParameters, RangeVariableScope};
