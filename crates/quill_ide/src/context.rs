//! Syntactic classification of a caret position.
//!
//! Everything here is computed from the syntax tree alone; no binding is
//! needed, so classification is cheap enough to run on every keystroke.

use quill_core::text::TextPos;
use quill_syntax::{SyntaxKind, SyntaxTree, TokenId};

/// What kind of syntax surrounds a caret position.
#[derive(Debug, Clone, Copy)]
pub struct SyntaxContext<'t> {
    tree: &'t SyntaxTree,
    position: TextPos,
    left_token: Option<TokenId>,
    target_token: Option<TokenId>,
    is_statement_context: bool,
    is_global_statement_context: bool,
}

impl<'t> SyntaxContext<'t> {
    pub fn new(tree: &'t SyntaxTree, position: TextPos) -> Self {
        let left_token = tree.find_token_on_left_of_position(position);
        let target_token = left_token.and_then(|token| previous_token_if_touching_word(tree, token, position));
        Self {
            tree,
            position,
            left_token,
            target_token,
            is_statement_context: is_statement_boundary(tree, target_token, false),
            is_global_statement_context: is_statement_boundary(tree, target_token, true),
        }
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn position(&self) -> TextPos {
        self.position
    }

    /// The token immediately to the left of the caret, possibly one the
    /// caret is touching.
    pub fn left_token(&self) -> Option<TokenId> {
        self.left_token
    }

    /// The last token before the word being typed. Equal to the left token
    /// unless the caret touches an identifier or keyword.
    pub fn target_token(&self) -> Option<TokenId> {
        self.target_token
    }

    pub fn target_kind(&self) -> Option<SyntaxKind> {
        self.target_token.map(|t| self.tree.token(t).kind)
    }

    pub fn target_parent_kind(&self) -> Option<SyntaxKind> {
        self.target_token
            .map(|t| self.tree.kind(self.tree.token(t).parent))
    }

    /// A statement could start at the caret.
    pub fn is_statement_context(&self) -> bool {
        self.is_statement_context
    }

    /// A statement could start at the caret, directly in the compilation
    /// unit rather than inside a block.
    pub fn is_global_statement_context(&self) -> bool {
        self.is_global_statement_context
    }

    /// `token`, or the token before it when `token` is a word the caret
    /// touches.
    pub fn previous_token_if_touching_word(&self, token: TokenId) -> Option<TokenId> {
        previous_token_if_touching_word(self.tree, token, self.position)
    }
}

fn previous_token_if_touching_word(tree: &SyntaxTree, token: TokenId, position: TextPos) -> Option<TokenId> {
    let t = tree.token(token);
    if t.kind.is_word() && t.span.intersects_with(position) {
        tree.previous_token(token)
    } else {
        Some(token)
    }
}

/// Whether the target token ends a statement or opens a block, so the caret
/// sits where the next statement would begin. With `global` set, only the
/// top level of the compilation unit counts.
fn is_statement_boundary(tree: &SyntaxTree, target: Option<TokenId>, global: bool) -> bool {
    // Nothing precedes the caret, or only the word being typed.
    let Some(target) = target else {
        return true;
    };
    let token = tree.token(target);
    let parent = token.parent;
    let container_ok = |kind: SyntaxKind| {
        if global {
            kind == SyntaxKind::CompilationUnit
        } else {
            matches!(kind, SyntaxKind::Block | SyntaxKind::CompilationUnit)
        }
    };
    match token.kind {
        SyntaxKind::OpenBraceToken => !global && tree.kind(parent) == SyntaxKind::Block,
        SyntaxKind::SemicolonToken | SyntaxKind::CloseBraceToken => {
            let statement_kind = tree.kind(parent);
            if token.kind == SyntaxKind::CloseBraceToken && statement_kind != SyntaxKind::Block {
                return false;
            }
            statement_kind.is_statement() && tree.parent(parent).map_or(false, |p| container_ok(tree.kind(p)))
        }
        _ => false,
    }
}
