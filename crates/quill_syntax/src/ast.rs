//! Typed views over syntax nodes.
//!
//! A view is a small `Copy` struct of node and token ids, read out of the
//! tree by position. The parser always produces the full shape of a
//! construct (absent tokens are synthesized as missing), so a view never has
//! to guess which child is which.

use crate::syntax_kind::SyntaxKind;
use crate::tree::{NodeId, SyntaxTree, TokenId};

pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;

    /// Read the view out of a node already known to have a castable kind.
    fn read(tree: &SyntaxTree, node: NodeId) -> Self;

    fn syntax(&self) -> NodeId;

    fn cast(tree: &SyntaxTree, node: NodeId) -> Option<Self> {
        if Self::can_cast(tree.kind(node)) {
            Some(Self::read(tree, node))
        } else {
            None
        }
    }
}

fn token(tree: &SyntaxTree, node: NodeId, kind: SyntaxKind) -> TokenId {
    tree.child_token(node, kind).unwrap_or_else(|| {
        panic!("malformed {:?}: no {:?} token", tree.kind(node), kind)
    })
}

fn child(tree: &SyntaxTree, node: NodeId, n: usize) -> NodeId {
    tree.nth_child_node(node, n).unwrap_or_else(|| {
        panic!("malformed {:?}: no child node #{}", tree.kind(node), n)
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnitSyntax {
    pub node: NodeId,
    pub statements: Vec<NodeId>,
}

impl AstNode for CompilationUnitSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::CompilationUnit
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        Self {
            node,
            statements: tree.child_nodes(node).collect(),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSyntax {
    pub node: NodeId,
    pub open_brace: TokenId,
    pub statements: Vec<NodeId>,
    pub close_brace: TokenId,
}

impl AstNode for BlockSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::Block
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        Self {
            node,
            open_brace: token(tree, node, SyntaxKind::OpenBraceToken),
            statements: tree.child_nodes(node).collect(),
            close_brace: token(tree, node, SyntaxKind::CloseBraceToken),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

/// `var name = initializer;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDeclarationSyntax {
    pub node: NodeId,
    pub identifier: TokenId,
    pub initializer: NodeId,
    pub semicolon: TokenId,
}

impl AstNode for LocalDeclarationSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::LocalDeclarationStatement
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        Self {
            node,
            identifier: token(tree, node, SyntaxKind::IdentifierToken),
            initializer: child(tree, node, 0),
            semicolon: token(tree, node, SyntaxKind::SemicolonToken),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

/// `return expression?;`, `yield return expression;` and `yield break;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnStatementSyntax {
    pub node: NodeId,
    pub yield_keyword: Option<TokenId>,
    pub keyword: TokenId,
    pub expression: Option<NodeId>,
}

impl AstNode for ReturnStatementSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::ReturnStatement | SyntaxKind::YieldReturnStatement | SyntaxKind::YieldBreakStatement
        )
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        let keyword = match tree.kind(node) {
            SyntaxKind::YieldBreakStatement => SyntaxKind::BreakKeyword,
            _ => SyntaxKind::ReturnKeyword,
        };
        Self {
            node,
            yield_keyword: tree.child_token(node, SyntaxKind::YieldKeyword),
            keyword: token(tree, node, keyword),
            expression: tree.nth_child_node(node, 0),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

/// `do block while (condition);`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoStatementSyntax {
    pub node: NodeId,
    pub do_keyword: TokenId,
    pub body: NodeId,
    pub condition: NodeId,
}

impl AstNode for DoStatementSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::DoStatement
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        Self {
            node,
            do_keyword: token(tree, node, SyntaxKind::DoKeyword),
            body: child(tree, node, 0),
            condition: child(tree, node, 1),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

/// Nodes with a single expression child: expression statements,
/// parenthesized expressions, `where` clauses and `select` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrappedExpressionSyntax {
    pub node: NodeId,
    pub expression: NodeId,
}

impl AstNode for WrappedExpressionSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::ExpressionStatement
                | SyntaxKind::ParenthesizedExpression
                | SyntaxKind::WhereClause
                | SyntaxKind::SelectClause
        )
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        Self {
            node,
            expression: child(tree, node, 0),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

pub type SelectClauseSyntax = WrappedExpressionSyntax;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierNameSyntax {
    pub node: NodeId,
    pub identifier: TokenId,
}

impl AstNode for IdentifierNameSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::IdentifierName
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        Self {
            node,
            identifier: token(tree, node, SyntaxKind::IdentifierToken),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralExpressionSyntax {
    pub node: NodeId,
    pub token: TokenId,
}

impl AstNode for LiteralExpressionSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        matches!(
            kind,
            SyntaxKind::NumericLiteralExpression
                | SyntaxKind::StringLiteralExpression
                | SyntaxKind::TrueLiteralExpression
                | SyntaxKind::FalseLiteralExpression
        )
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        let token = tree
            .child_tokens(node)
            .next()
            .unwrap_or_else(|| panic!("malformed {:?}: no token", tree.kind(node)));
        Self { node, token }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

/// `expression.name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberAccessSyntax {
    pub node: NodeId,
    pub expression: NodeId,
    pub dot: TokenId,
    pub name: NodeId,
}

impl AstNode for MemberAccessSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::MemberAccessExpression
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        Self {
            node,
            expression: child(tree, node, 0),
            dot: token(tree, node, SyntaxKind::DotToken),
            name: child(tree, node, 1),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

/// `expression(arguments)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSyntax {
    pub node: NodeId,
    pub expression: NodeId,
    pub arguments: Vec<NodeId>,
}

impl AstNode for InvocationSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::InvocationExpression
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        let argument_list = child(tree, node, 1);
        Self {
            node,
            expression: child(tree, node, 0),
            arguments: tree.child_nodes(argument_list).collect(),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryExpressionSyntax {
    pub node: NodeId,
    pub left: NodeId,
    pub operator: TokenId,
    pub right: NodeId,
}

impl AstNode for BinaryExpressionSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::BinaryExpression
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        let operator = tree
            .child_tokens(node)
            .next()
            .unwrap_or_else(|| panic!("malformed BinaryExpression: no operator"));
        Self {
            node,
            left: child(tree, node, 0),
            operator,
            right: child(tree, node, 1),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

/// `from_clause body`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryExpressionSyntax {
    pub node: NodeId,
    pub from_clause: NodeId,
    pub body: NodeId,
}

impl AstNode for QueryExpressionSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::QueryExpression
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        Self {
            node,
            from_clause: child(tree, node, 0),
            body: child(tree, node, 1),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

/// Body clauses, the terminating select/group clause, and an optional conclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBodySyntax {
    pub node: NodeId,
    pub clauses: Vec<NodeId>,
    pub select_or_group: Option<NodeId>,
    pub conclusion: Option<NodeId>,
}

impl AstNode for QueryBodySyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::QueryBody
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        let mut clauses = Vec::new();
        let mut select_or_group = None;
        let mut conclusion = None;
        for child in tree.child_nodes(node) {
            match tree.kind(child) {
                SyntaxKind::SelectClause | SyntaxKind::GroupClause => select_or_group = Some(child),
                SyntaxKind::QueryConclusion => conclusion = Some(child),
                _ => clauses.push(child),
            }
        }
        Self {
            node,
            clauses,
            select_or_group,
            conclusion,
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

/// `from identifier in expression`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FromClauseSyntax {
    pub node: NodeId,
    pub identifier: TokenId,
    pub expression: NodeId,
}

impl AstNode for FromClauseSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::FromClause
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        Self {
            node,
            identifier: token(tree, node, SyntaxKind::IdentifierToken),
            expression: child(tree, node, 0),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

/// `let identifier = expression`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetClauseSyntax {
    pub node: NodeId,
    pub identifier: TokenId,
    pub expression: NodeId,
}

impl AstNode for LetClauseSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::LetClause
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        Self {
            node,
            identifier: token(tree, node, SyntaxKind::IdentifierToken),
            expression: child(tree, node, 0),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

/// `group group_expression by by_expression`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupClauseSyntax {
    pub node: NodeId,
    pub group_expression: NodeId,
    pub by_keyword: TokenId,
    pub by_expression: NodeId,
}

impl AstNode for GroupClauseSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::GroupClause
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        Self {
            node,
            group_expression: child(tree, node, 0),
            by_keyword: token(tree, node, SyntaxKind::ByKeyword),
            by_expression: child(tree, node, 1),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}

/// `yield into identifier do expression`
///
/// Introduces `identifier`, bound to the result of the preceding clauses,
/// scoped to `expression`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConclusionSyntax {
    pub node: NodeId,
    pub yield_keyword: TokenId,
    pub into_keyword: TokenId,
    pub identifier: TokenId,
    pub do_keyword: TokenId,
    pub expression: NodeId,
}

impl AstNode for QueryConclusionSyntax {
    fn can_cast(kind: SyntaxKind) -> bool {
        kind == SyntaxKind::QueryConclusion
    }
    fn read(tree: &SyntaxTree, node: NodeId) -> Self {
        Self {
            node,
            yield_keyword: token(tree, node, SyntaxKind::YieldKeyword),
            into_keyword: token(tree, node, SyntaxKind::IntoKeyword),
            identifier: token(tree, node, SyntaxKind::IdentifierToken),
            do_keyword: token(tree, node, SyntaxKind::DoKeyword),
            expression: child(tree, node, 0),
        }
    }
    fn syntax(&self) -> NodeId {
        self.node
    }
}
