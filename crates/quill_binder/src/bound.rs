//! The bound tree: immutable results of binding, consumed by later phases
//! and by IDE features.

use std::sync::Arc;

use quill_symbols::{Symbol, TypeId, TypeTable};
use quill_syntax::{NodeId, SyntaxKind};

use crate::lambda::UnboundLambda;

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i64),
    Str(String),
    Bool(bool),
}

/// A resolved reference to a parameter.
#[derive(Debug, Clone)]
pub struct BoundParameter {
    pub node: NodeId,
    pub parameter: Arc<Symbol>,
    pub ty: TypeId,
    /// Synthesized by the compiler rather than written by the user.
    pub was_compiler_generated: bool,
}

/// A reference to a query-conclusion variable, wrapping the synthesized
/// reference to the lambda parameter that carries its value.
#[derive(Debug, Clone)]
pub struct BoundQueryConclusionVariable {
    pub node: NodeId,
    pub variable: Arc<Symbol>,
    pub parameter: BoundParameter,
    pub ty: TypeId,
}

#[derive(Debug, Clone)]
pub enum BoundQueryClause {
    From {
        node: NodeId,
        variable: Option<Arc<Symbol>>,
        source: BoundExpression,
    },
    Where {
        node: NodeId,
        condition: BoundExpression,
    },
    Let {
        node: NodeId,
        variable: Option<Arc<Symbol>>,
        expression: BoundExpression,
    },
    Select {
        node: NodeId,
        expression: BoundExpression,
    },
    Group {
        node: NodeId,
        element: BoundExpression,
        key: BoundExpression,
    },
}

#[derive(Debug, Clone)]
pub struct BoundQuery {
    pub node: NodeId,
    pub clauses: Vec<BoundQueryClause>,
    /// The variable a `yield into` conclusion declares.
    pub conclusion_variable: Option<Arc<Symbol>>,
    /// The deferred body of a `yield into` conclusion.
    pub conclusion: Option<Arc<UnboundLambda>>,
    pub ty: TypeId,
}

#[derive(Debug, Clone)]
pub enum BoundExpression {
    Literal {
        node: NodeId,
        value: ConstantValue,
        ty: TypeId,
    },
    Local {
        node: NodeId,
        local: Arc<Symbol>,
        ty: TypeId,
    },
    Field {
        node: NodeId,
        field: Arc<Symbol>,
        ty: TypeId,
    },
    RangeVariable {
        node: NodeId,
        variable: Arc<Symbol>,
        ty: TypeId,
    },
    Parameter(BoundParameter),
    QueryConclusionVariable(BoundQueryConclusionVariable),
    MemberAccess {
        node: NodeId,
        receiver: Box<BoundExpression>,
        member: String,
        ty: TypeId,
    },
    Call {
        node: NodeId,
        receiver: Option<Box<BoundExpression>>,
        method: String,
        arguments: Vec<BoundExpression>,
        ty: TypeId,
    },
    Binary {
        node: NodeId,
        operator: SyntaxKind,
        left: Box<BoundExpression>,
        right: Box<BoundExpression>,
        ty: TypeId,
    },
    Query(Box<BoundQuery>),
    /// An expression that failed to bind. The error is already reported.
    Bad {
        node: NodeId,
        children: Vec<BoundExpression>,
    },
}

impl BoundExpression {
    pub fn bad(node: NodeId) -> Self {
        BoundExpression::Bad {
            node,
            children: Vec::new(),
        }
    }

    pub fn node(&self) -> NodeId {
        match self {
            BoundExpression::Literal { node, .. }
            | BoundExpression::Local { node, .. }
            | BoundExpression::Field { node, .. }
            | BoundExpression::RangeVariable { node, .. }
            | BoundExpression::MemberAccess { node, .. }
            | BoundExpression::Call { node, .. }
            | BoundExpression::Binary { node, .. }
            | BoundExpression::Bad { node, .. } => *node,
            BoundExpression::Parameter(p) => p.node,
            BoundExpression::QueryConclusionVariable(v) => v.node,
            BoundExpression::Query(q) => q.node,
        }
    }

    pub fn ty(&self) -> TypeId {
        match self {
            BoundExpression::Literal { ty, .. }
            | BoundExpression::Local { ty, .. }
            | BoundExpression::Field { ty, .. }
            | BoundExpression::RangeVariable { ty, .. }
            | BoundExpression::MemberAccess { ty, .. }
            | BoundExpression::Call { ty, .. }
            | BoundExpression::Binary { ty, .. } => *ty,
            BoundExpression::Parameter(p) => p.ty,
            BoundExpression::QueryConclusionVariable(v) => v.ty,
            BoundExpression::Query(q) => q.ty,
            BoundExpression::Bad { .. } => TypeTable::ERROR,
        }
    }

    /// The symbol a name reference resolved to.
    pub fn referenced_symbol(&self) -> Option<&Arc<Symbol>> {
        match self {
            BoundExpression::Local { local, .. } => Some(local),
            BoundExpression::Field { field, .. } => Some(field),
            BoundExpression::RangeVariable { variable, .. } => Some(variable),
            BoundExpression::Parameter(p) => Some(&p.parameter),
            BoundExpression::QueryConclusionVariable(v) => Some(&v.variable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum BoundStatement {
    LocalDeclaration {
        node: NodeId,
        local: Option<Arc<Symbol>>,
        initializer: BoundExpression,
    },
    Expression {
        node: NodeId,
        expression: BoundExpression,
    },
    Return {
        node: NodeId,
        expression: Option<BoundExpression>,
        was_compiler_generated: bool,
    },
    YieldReturn {
        node: NodeId,
        expression: BoundExpression,
    },
    YieldBreak {
        node: NodeId,
    },
    Do {
        node: NodeId,
        body: BoundBlock,
        condition: BoundExpression,
    },
    Block(BoundBlock),
}

impl BoundStatement {
    pub fn node(&self) -> NodeId {
        match self {
            BoundStatement::LocalDeclaration { node, .. }
            | BoundStatement::Expression { node, .. }
            | BoundStatement::Return { node, .. }
            | BoundStatement::YieldReturn { node, .. }
            | BoundStatement::YieldBreak { node }
            | BoundStatement::Do { node, .. } => *node,
            BoundStatement::Block(block) => block.node,
        }
    }

    /// Control never reaches the statement after this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BoundStatement::Return { .. } | BoundStatement::YieldBreak { .. })
    }
}

#[derive(Debug, Clone)]
pub struct BoundBlock {
    pub node: NodeId,
    pub statements: Vec<BoundStatement>,
}

// ============================================================================
// Walker
// ============================================================================

/// A read-only visitor over the bound tree. Override a `visit_*` method and
/// call the matching `walk_*` function to keep descending.
pub trait BoundTreeWalker {
    fn visit_block(&mut self, block: &BoundBlock) {
        walk_block(self, block);
    }

    fn visit_statement(&mut self, statement: &BoundStatement) {
        walk_statement(self, statement);
    }

    fn visit_expression(&mut self, expression: &BoundExpression) {
        walk_expression(self, expression);
    }
}

pub fn walk_block<W: BoundTreeWalker + ?Sized>(walker: &mut W, block: &BoundBlock) {
    for statement in &block.statements {
        walker.visit_statement(statement);
    }
}

pub fn walk_statement<W: BoundTreeWalker + ?Sized>(walker: &mut W, statement: &BoundStatement) {
    match statement {
        BoundStatement::LocalDeclaration { initializer, .. } => walker.visit_expression(initializer),
        BoundStatement::Expression { expression, .. } | BoundStatement::YieldReturn { expression, .. } => {
            walker.visit_expression(expression)
        }
        BoundStatement::Return { expression, .. } => {
            if let Some(expression) = expression {
                walker.visit_expression(expression);
            }
        }
        BoundStatement::YieldBreak { .. } => {}
        BoundStatement::Do { body, condition, .. } => {
            walker.visit_block(body);
            walker.visit_expression(condition);
        }
        BoundStatement::Block(block) => walker.visit_block(block),
    }
}

pub fn walk_expression<W: BoundTreeWalker + ?Sized>(walker: &mut W, expression: &BoundExpression) {
    match expression {
        BoundExpression::MemberAccess { receiver, .. } => walker.visit_expression(receiver),
        BoundExpression::Call { receiver, arguments, .. } => {
            if let Some(receiver) = receiver {
                walker.visit_expression(receiver);
            }
            for argument in arguments {
                walker.visit_expression(argument);
            }
        }
        BoundExpression::Binary { left, right, .. } => {
            walker.visit_expression(left);
            walker.visit_expression(right);
        }
        BoundExpression::Bad { children, .. } => {
            for child in children {
                walker.visit_expression(child);
            }
        }
        BoundExpression::Query(query) => {
            for clause in &query.clauses {
                match clause {
                    BoundQueryClause::From { source: e, .. }
                    | BoundQueryClause::Where { condition: e, .. }
                    | BoundQueryClause::Let { expression: e, .. }
                    | BoundQueryClause::Select { expression: e, .. } => walker.visit_expression(e),
                    BoundQueryClause::Group { element, key, .. } => {
                        walker.visit_expression(element);
                        walker.visit_expression(key);
                    }
                }
            }
            // Only bodies that were already bound; walking never binds.
            if let Some(bound) = query.conclusion.as_ref().and_then(|l| l.bound()) {
                walker.visit_block(&bound.body);
            }
        }
        BoundExpression::Literal { .. }
        | BoundExpression::Local { .. }
        | BoundExpression::Field { .. }
        | BoundExpression::RangeVariable { .. }
        | BoundExpression::Parameter(_)
        | BoundExpression::QueryConclusionVariable(_) => {}
    }
}
