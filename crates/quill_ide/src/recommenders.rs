//! Keyword recommenders: one per keyword, each deciding from the
//! [`SyntaxContext`] alone whether its keyword may be typed at the caret.

use quill_core::text::TextPos;
use quill_syntax::ast::{AstNode, GroupClauseSyntax, QueryConclusionSyntax, WrappedExpressionSyntax};
use quill_syntax::{SyntaxKind, SyntaxTree};

use crate::context::SyntaxContext;
use crate::{CompletionItem, CompletionItemKind};

pub trait KeywordRecommender: Send + Sync {
    fn keyword(&self) -> SyntaxKind;

    fn is_valid_context(&self, context: &SyntaxContext<'_>) -> bool;

    fn recommend(&self, context: &SyntaxContext<'_>) -> Option<CompletionItem> {
        if !self.is_valid_context(context) {
            return None;
        }
        let text = self.keyword().keyword_text()?;
        Some(CompletionItem {
            label: text.to_string(),
            kind: CompletionItemKind::Keyword,
            detail: Some("keyword".to_string()),
            sort_text: Some(format!("1_{}", text)),
        })
    }
}

// ============================================================================
// yield
// ============================================================================

/// `yield` starts a `yield return`/`yield break` statement, or a query
/// conclusion right after a complete `select` or `group` clause.
#[derive(Debug, Default)]
pub struct YieldKeywordRecommender;

impl YieldKeywordRecommender {
    fn is_valid_context_for_select(context: &SyntaxContext<'_>) -> bool {
        let tree = context.tree();
        let Some(token) = context.target_token() else {
            return false;
        };
        let Some(select) = tree.get_ancestor(token, SyntaxKind::SelectClause) else {
            return false;
        };
        let expression = WrappedExpressionSyntax::read(tree, select).expression;
        if tree.width(expression) == 0 {
            return false;
        }

        // select x.|
        // select x.i|
        let last_complete = context.previous_token_if_touching_word(token);
        if last_complete.map(|t| tree.token(t).kind) == Some(SyntaxKind::DotToken) {
            return false;
        }

        tree.last_token(expression) == Some(token)
    }

    fn is_valid_context_for_group(context: &SyntaxContext<'_>) -> bool {
        let tree = context.tree();
        let Some(token) = context.target_token() else {
            return false;
        };
        let Some(group) = tree.get_ancestor(token, SyntaxKind::GroupClause) else {
            return false;
        };
        let group = GroupClauseSyntax::read(tree, group);
        if tree.width(group.by_expression) == 0 || tree.width(group.group_expression) == 0 {
            return false;
        }

        tree.last_token(group.by_expression) == Some(token)
    }
}

impl KeywordRecommender for YieldKeywordRecommender {
    fn keyword(&self) -> SyntaxKind {
        SyntaxKind::YieldKeyword
    }

    fn is_valid_context(&self, context: &SyntaxContext<'_>) -> bool {
        context.is_statement_context()
            || Self::is_valid_context_for_select(context)
            || Self::is_valid_context_for_group(context)
    }
}

// ============================================================================
// do
// ============================================================================

/// `do` starts a do-while statement, or the body of a query conclusion once
/// its variable has been named.
#[derive(Debug, Default)]
pub struct DoKeywordRecommender;

impl DoKeywordRecommender {
    fn is_valid_context_for_query_conclusion(context: &SyntaxContext<'_>) -> bool {
        let tree = context.tree();
        let Some(token) = context.target_token() else {
            return false;
        };
        let Some(conclusion) = QueryConclusionSyntax::cast(tree, tree.token(token).parent) else {
            return false;
        };
        let identifier = tree.token(conclusion.identifier);
        !identifier.is_missing && !identifier.span.intersects_with(context.position())
    }
}

impl KeywordRecommender for DoKeywordRecommender {
    fn keyword(&self) -> SyntaxKind {
        SyntaxKind::DoKeyword
    }

    fn is_valid_context(&self, context: &SyntaxContext<'_>) -> bool {
        context.is_statement_context()
            || context.is_global_statement_context()
            || Self::is_valid_context_for_query_conclusion(context)
    }
}

// ============================================================================
// return
// ============================================================================

/// `return` starts a statement, or completes `yield return` outside a query
/// conclusion.
#[derive(Debug, Default)]
pub struct ReturnKeywordRecommender;

impl ReturnKeywordRecommender {
    // yield |
    // yield r|
    fn is_after_valid_yield_keyword_usage(context: &SyntaxContext<'_>) -> bool {
        context.target_kind() == Some(SyntaxKind::YieldKeyword)
            && context.target_parent_kind() != Some(SyntaxKind::QueryConclusion)
    }
}

impl KeywordRecommender for ReturnKeywordRecommender {
    fn keyword(&self) -> SyntaxKind {
        SyntaxKind::ReturnKeyword
    }

    fn is_valid_context(&self, context: &SyntaxContext<'_>) -> bool {
        context.is_statement_context() || Self::is_after_valid_yield_keyword_usage(context)
    }
}

// ============================================================================
// Entry point
// ============================================================================

static RECOMMENDERS: [&dyn KeywordRecommender; 3] =
    [&DoKeywordRecommender, &ReturnKeywordRecommender, &YieldKeywordRecommender];

/// Keywords that may be typed at `position`, in alphabetical order.
pub fn recommend_keywords(tree: &SyntaxTree, position: TextPos) -> Vec<CompletionItem> {
    let context = SyntaxContext::new(tree, position);
    let items: Vec<CompletionItem> = RECOMMENDERS
        .iter()
        .filter_map(|recommender| recommender.recommend(&context))
        .collect();
    tracing::trace!(position, count = items.len(), "recommended keywords");
    items
}
