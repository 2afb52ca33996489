//! quill_core: Core utilities for the quill front-end.
//!
//! Provides string interning, text spans, source locations and the
//! cancellation token shared by every stage of the pipeline.

pub mod cancel;
pub mod intern;
pub mod text;

// Re-export commonly used types
pub use cancel::{CancellationToken, Cancelled};
pub use intern::{InternedString, StringInterner};
pub use text::{FileId, LineMap, Location, TextPos, TextSpan};
