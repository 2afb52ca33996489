//! quill_syntax: Syntax tree definitions for the quill front-end.
//!
//! Defines the SyntaxKind enum, the immutable position-searchable syntax
//! tree, typed node views, and parse options. The binder and the IDE layer
//! only read trees; the parser is the only producer.

pub mod ast;
pub mod options;
pub mod syntax_kind;
pub mod tree;

// Re-export key types
pub use ast::AstNode;
pub use options::{Features, ParseOptions};
pub use syntax_kind::SyntaxKind;
pub use tree::{Checkpoint, NodeId, SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTree, SyntaxTreeBuilder, TokenId};
