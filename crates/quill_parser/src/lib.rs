//! quill_parser: Scanner and recursive descent parser for quill source.
//!
//! Produces the immutable [`quill_syntax::SyntaxTree`] consumed by the
//! binder and the IDE layer, plus the syntax diagnostics found on the way.

mod parser;
pub mod scanner;

pub use parser::{parse_text, Parser};
pub use scanner::{tokenize, Scanner, TokenInfo};
