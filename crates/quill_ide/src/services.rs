//! Semantic IDE services over a [`SemanticModel`].

use quill_compiler::SemanticModel;
use quill_core::cancel::{CancellationToken, Cancelled};
use quill_core::text::TextPos;
use quill_symbols::SymbolDisplay;

use crate::{HoverInfo, ReferenceInfo};

/// Describe the symbol under the caret.
pub fn quick_info(
    model: &SemanticModel,
    position: TextPos,
    cancellation: &CancellationToken,
) -> Result<Option<HoverInfo>, Cancelled> {
    let Some(symbol) = model.symbol_at(position, cancellation)? else {
        return Ok(None);
    };
    let ty = model.symbol_type(&symbol, cancellation)?;
    let contents = SymbolDisplay::new(model.types()).with_type(ty).render(&symbol);
    let range = symbol
        .first_location()
        .filter(|location| location.file == model.tree().file())
        .map(|location| location.span);
    Ok(Some(HoverInfo { contents, range }))
}

/// Every declaration of and reference to the symbol under the caret. Two
/// spans belong to the same symbol when the symbols are equal, so a
/// re-created symbol for the same declaration still matches.
pub fn highlight_references(
    model: &SemanticModel,
    position: TextPos,
    cancellation: &CancellationToken,
) -> Result<Vec<ReferenceInfo>, Cancelled> {
    let Some(symbol) = model.symbol_at(position, cancellation)? else {
        return Ok(Vec::new());
    };
    let declaration = symbol.first_location().map(|location| location.span);
    let file_name = model.tree().file_name();
    Ok(model
        .reference_spans(&symbol, cancellation)?
        .into_iter()
        .map(|span| ReferenceInfo {
            file_name: file_name.to_string(),
            span,
            is_definition: Some(span) == declaration,
        })
        .collect())
}
