//! The immutable syntax tree.
//!
//! Nodes and tokens live in flat arenas addressed by [`NodeId`] and
//! [`TokenId`]. Tokens are stored in document order, so positional queries
//! (`find_token`, `previous_token`) are index arithmetic. A finished tree is
//! never mutated and is shared between threads through `Arc`.

use crate::options::ParseOptions;
use crate::syntax_kind::SyntaxKind;
use quill_core::intern::InternedString;
use quill_core::text::{FileId, Location, TextPos, TextSpan};

/// Index of a node in its tree.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a token in its tree. Token ids follow document order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TokenId(pub u32);

impl TokenId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SyntaxElement {
    Node(NodeId),
    Token(TokenId),
}

#[derive(Debug, Clone)]
pub struct SyntaxToken {
    pub kind: SyntaxKind,
    /// Span without trivia. Missing tokens have an empty span placed right
    /// after the preceding real token.
    pub span: TextSpan,
    /// Interned text, present for identifier tokens.
    pub value: Option<InternedString>,
    /// Synthesized by error recovery; not present in the source text.
    pub is_missing: bool,
    pub parent: NodeId,
}

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    /// Span from the first to the last non-missing token.
    pub span: TextSpan,
    pub parent: Option<NodeId>,
    pub children: Vec<SyntaxElement>,
    /// Tokens covered by this node: `first_token..end_token`.
    first_token: u32,
    end_token: u32,
}

/// A parsed source file.
#[derive(Debug)]
pub struct SyntaxTree {
    file: FileId,
    file_name: String,
    text: String,
    options: ParseOptions,
    nodes: Vec<SyntaxNode>,
    tokens: Vec<SyntaxToken>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn token(&self, id: TokenId) -> &SyntaxToken {
        &self.tokens[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        self.node(id).kind
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn children(&self, id: NodeId) -> &[SyntaxElement] {
        &self.node(id).children
    }

    pub fn child_nodes(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().filter_map(|c| match c {
            SyntaxElement::Node(n) => Some(*n),
            SyntaxElement::Token(_) => None,
        })
    }

    pub fn child_tokens(&self, id: NodeId) -> impl Iterator<Item = TokenId> + '_ {
        self.children(id).iter().filter_map(|c| match c {
            SyntaxElement::Token(t) => Some(*t),
            SyntaxElement::Node(_) => None,
        })
    }

    /// The first direct child token of the given kind.
    pub fn child_token(&self, id: NodeId, kind: SyntaxKind) -> Option<TokenId> {
        self.child_tokens(id).find(|t| self.token(*t).kind == kind)
    }

    pub fn nth_child_node(&self, id: NodeId, n: usize) -> Option<NodeId> {
        self.child_nodes(id).nth(n)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The node itself followed by each enclosing node up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |n| self.parent(*n))
    }

    /// The nearest node of `kind` enclosing the token.
    pub fn get_ancestor(&self, token: TokenId, kind: SyntaxKind) -> Option<NodeId> {
        self.ancestors(self.token(token).parent)
            .find(|n| self.kind(*n) == kind)
    }

    pub fn span(&self, id: NodeId) -> TextSpan {
        self.node(id).span
    }

    /// Width of the node's text, excluding trivia. Zero for a node made of
    /// missing tokens only.
    pub fn width(&self, id: NodeId) -> u32 {
        self.node(id).span.length
    }

    pub fn location(&self, span: TextSpan) -> Location {
        Location::new(self.file, span)
    }

    pub fn token_location(&self, id: TokenId) -> Location {
        self.location(self.token(id).span)
    }

    pub fn node_text(&self, id: NodeId) -> &str {
        &self.text[self.span(id).to_range()]
    }

    pub fn token_text(&self, id: TokenId) -> &str {
        &self.text[self.token(id).span.to_range()]
    }

    /// All tokens covered by the node, missing ones included.
    pub fn descendant_tokens(&self, id: NodeId) -> impl Iterator<Item = TokenId> {
        let node = self.node(id);
        (node.first_token..node.end_token).map(TokenId)
    }

    pub fn first_token(&self, id: NodeId) -> Option<TokenId> {
        self.descendant_tokens(id)
            .find(|t| !self.token(*t).is_missing)
    }

    /// The last non-missing token of the node.
    pub fn last_token(&self, id: NodeId) -> Option<TokenId> {
        let node = self.node(id);
        (node.first_token..node.end_token)
            .rev()
            .map(TokenId)
            .find(|t| !self.token(*t).is_missing)
    }

    pub fn end_of_file_token(&self) -> TokenId {
        TokenId(self.tokens.len() as u32 - 1)
    }

    /// The closest preceding token that exists in the source.
    pub fn previous_token(&self, id: TokenId) -> Option<TokenId> {
        (0..id.0)
            .rev()
            .map(TokenId)
            .find(|t| !self.token(*t).is_missing)
    }

    pub fn next_token(&self, id: TokenId) -> Option<TokenId> {
        (id.0 + 1..self.tokens.len() as u32)
            .map(TokenId)
            .find(|t| !self.token(*t).is_missing)
    }

    /// The token containing `position`, or the first token after it when
    /// the position falls in trivia. Positions past the last token find the
    /// end-of-file token.
    pub fn find_token(&self, position: TextPos) -> TokenId {
        let start = self
            .tokens
            .partition_point(|t| t.span.end() <= position);
        (start..self.tokens.len())
            .map(|i| TokenId(i as u32))
            .find(|t| !self.token(*t).is_missing)
            .unwrap_or_else(|| self.end_of_file_token())
    }

    /// The token to the left of `position`: the token containing it, or the
    /// previous token when the position is at or before that token's start.
    pub fn find_token_on_left_of_position(&self, position: TextPos) -> Option<TokenId> {
        let token = self.find_token(position);
        if position <= self.token(token).span.start {
            self.previous_token(token)
        } else {
            Some(token)
        }
    }
}

/// A position in the builder's child list, used to wrap already-built
/// children into a new node (left operands, member access targets).
#[derive(Debug, Copy, Clone)]
pub struct Checkpoint {
    child_index: usize,
    token_index: u32,
}

/// Incrementally builds a [`SyntaxTree`] in document order.
#[derive(Debug, Default)]
pub struct SyntaxTreeBuilder {
    nodes: Vec<SyntaxNode>,
    tokens: Vec<SyntaxToken>,
    stack: Vec<NodeId>,
}

impl SyntaxTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> NodeId {
        *self
            .stack
            .last()
            .expect("syntax tree builder has no open node")
    }

    pub fn start_node(&mut self, kind: SyntaxKind) {
        let parent = self.stack.last().copied();
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SyntaxNode {
            kind,
            span: TextSpan::default(),
            parent,
            children: Vec::new(),
            first_token: self.tokens.len() as u32,
            end_token: self.tokens.len() as u32,
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(SyntaxElement::Node(id));
        }
        self.stack.push(id);
    }

    pub fn checkpoint(&self) -> Checkpoint {
        let parent = self.current();
        Checkpoint {
            child_index: self.nodes[parent.index()].children.len(),
            token_index: self.tokens.len() as u32,
        }
    }

    /// Open a node that adopts every child added since `checkpoint`.
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        let parent = self.current();
        let id = NodeId(self.nodes.len() as u32);
        let adopted = self.nodes[parent.index()]
            .children
            .split_off(checkpoint.child_index);
        for child in &adopted {
            match child {
                SyntaxElement::Node(n) => self.nodes[n.index()].parent = Some(id),
                SyntaxElement::Token(t) => self.tokens[t.index()].parent = id,
            }
        }
        self.nodes.push(SyntaxNode {
            kind,
            span: TextSpan::default(),
            parent: Some(parent),
            children: adopted,
            first_token: checkpoint.token_index,
            end_token: checkpoint.token_index,
        });
        self.nodes[parent.index()].children.push(SyntaxElement::Node(id));
        self.stack.push(id);
    }

    pub fn token(&mut self, kind: SyntaxKind, span: TextSpan, value: Option<InternedString>) -> TokenId {
        self.push_token(kind, span, value, false)
    }

    /// Add a zero-width token standing in for one the source lacks.
    pub fn missing_token(&mut self, kind: SyntaxKind) -> TokenId {
        let at = self
            .tokens
            .iter()
            .rev()
            .find(|t| !t.is_missing)
            .map(|t| t.span.end())
            .unwrap_or(0);
        self.push_token(kind, TextSpan::empty(at), None, true)
    }

    fn push_token(
        &mut self,
        kind: SyntaxKind,
        span: TextSpan,
        value: Option<InternedString>,
        is_missing: bool,
    ) -> TokenId {
        let parent = self.current();
        let id = TokenId(self.tokens.len() as u32);
        self.tokens.push(SyntaxToken {
            kind,
            span,
            value,
            is_missing,
            parent,
        });
        self.nodes[parent.index()].children.push(SyntaxElement::Token(id));
        id
    }

    pub fn finish_node(&mut self) {
        let id = self
            .stack
            .pop()
            .expect("finish_node called without a matching start_node");
        let end_token = self.tokens.len() as u32;
        let first_token = self.nodes[id.index()].first_token;
        let covered = &self.tokens[first_token as usize..end_token as usize];
        let mut real = covered.iter().filter(|t| !t.is_missing);
        let span = match (real.next(), covered.iter().rev().find(|t| !t.is_missing)) {
            (Some(first), Some(last)) => first.span.union(&last.span),
            _ => TextSpan::empty(covered.first().map(|t| t.span.start).unwrap_or(0)),
        };
        let node = &mut self.nodes[id.index()];
        node.end_token = end_token;
        node.span = span;
    }

    pub fn finish(self, file: FileId, file_name: String, text: String, options: ParseOptions) -> SyntaxTree {
        assert!(self.stack.is_empty(), "syntax tree builder finished with open nodes");
        assert!(!self.nodes.is_empty(), "syntax tree builder produced no root");
        SyntaxTree {
            file,
            file_name,
            text,
            options,
            nodes: self.nodes,
            tokens: self.tokens,
            root: NodeId(0),
        }
    }
}
