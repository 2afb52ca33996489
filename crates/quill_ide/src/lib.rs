//! quill_ide: Editor features over quill source.
//!
//! Keyword completion is purely syntactic and works on any tree, however
//! broken. Quick info and reference highlighting go through the compiler's
//! semantic model.

mod context;
mod recommenders;
mod services;

use quill_core::text::TextSpan;

pub use context::SyntaxContext;
pub use recommenders::{
    recommend_keywords, DoKeywordRecommender, KeywordRecommender, ReturnKeywordRecommender, YieldKeywordRecommender,
};
pub use services::{highlight_references, quick_info};

/// A completion item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    pub detail: Option<String>,
    pub sort_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionItemKind {
    Keyword,
}

/// Hover information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverInfo {
    pub contents: String,
    pub range: Option<TextSpan>,
}

/// Reference location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceInfo {
    pub file_name: String,
    pub span: TextSpan,
    pub is_definition: bool,
}
