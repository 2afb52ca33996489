//! Per-kind dispatch over symbols.

use crate::symbol::{Symbol, SymbolData};
use crate::types::{TypeId, TypeTable};

/// One method per symbol kind; each defaults to [`SymbolVisitor::default_visit`].
/// Query-conclusion variables have their own case, separate from locals.
pub trait SymbolVisitor {
    type Output;

    fn default_visit(&mut self, symbol: &Symbol) -> Self::Output;

    fn visit_namespace(&mut self, symbol: &Symbol) -> Self::Output {
        self.default_visit(symbol)
    }

    fn visit_named_type(&mut self, symbol: &Symbol) -> Self::Output {
        self.default_visit(symbol)
    }

    fn visit_method(&mut self, symbol: &Symbol) -> Self::Output {
        self.default_visit(symbol)
    }

    fn visit_field(&mut self, symbol: &Symbol) -> Self::Output {
        self.default_visit(symbol)
    }

    fn visit_property(&mut self, symbol: &Symbol) -> Self::Output {
        self.default_visit(symbol)
    }

    fn visit_parameter(&mut self, symbol: &Symbol) -> Self::Output {
        self.default_visit(symbol)
    }

    fn visit_lambda(&mut self, symbol: &Symbol) -> Self::Output {
        self.default_visit(symbol)
    }

    fn visit_local(&mut self, symbol: &Symbol) -> Self::Output {
        self.default_visit(symbol)
    }

    fn visit_label(&mut self, symbol: &Symbol) -> Self::Output {
        self.default_visit(symbol)
    }

    fn visit_range_variable(&mut self, symbol: &Symbol) -> Self::Output {
        self.default_visit(symbol)
    }

    fn visit_query_conclusion_variable(&mut self, symbol: &Symbol) -> Self::Output {
        self.default_visit(symbol)
    }
}

/// Renders the one-line description shown by quick info.
pub struct SymbolDisplay<'t> {
    types: &'t TypeTable,
    /// Type known from the reference site, for symbols whose type lives
    /// outside the symbol.
    known_type: Option<TypeId>,
}

impl<'t> SymbolDisplay<'t> {
    pub fn new(types: &'t TypeTable) -> Self {
        Self { types, known_type: None }
    }

    pub fn with_type(mut self, ty: Option<TypeId>) -> Self {
        self.known_type = ty;
        self
    }

    pub fn render(mut self, symbol: &Symbol) -> String {
        symbol.accept(&mut self)
    }

    fn typed(&self, tag: &str, symbol: &Symbol) -> String {
        match symbol.ty().or(self.known_type) {
            Some(ty) => format!("({}) {} {}", tag, self.types.display(ty), symbol.name_text()),
            None => format!("({}) {}", tag, symbol.name_text()),
        }
    }

    fn qualified(symbol: &Symbol) -> String {
        match symbol.containing_symbol() {
            Some(container) if !container.name_text().is_empty() => {
                format!("{}.{}", container.name_text(), symbol.name_text())
            }
            _ => symbol.name_text().to_string(),
        }
    }
}

impl SymbolVisitor for SymbolDisplay<'_> {
    type Output = String;

    fn default_visit(&mut self, symbol: &Symbol) -> String {
        symbol.name_text().to_string()
    }

    fn visit_namespace(&mut self, symbol: &Symbol) -> String {
        format!("namespace {}", symbol.name_text())
    }

    fn visit_named_type(&mut self, symbol: &Symbol) -> String {
        format!("type {}", symbol.name_text())
    }

    fn visit_method(&mut self, symbol: &Symbol) -> String {
        match symbol.data() {
            SymbolData::Method { return_type, parameter_types } => {
                let parameters: Vec<String> = parameter_types.iter().map(|t| self.types.display(*t)).collect();
                format!(
                    "{} {}({})",
                    self.types.display(*return_type),
                    Self::qualified(symbol),
                    parameters.join(", ")
                )
            }
            _ => self.default_visit(symbol),
        }
    }

    fn visit_field(&mut self, symbol: &Symbol) -> String {
        let ty = symbol.ty().map(|t| self.types.display(t)).unwrap_or_default();
        format!("(field) {} {}", ty, Self::qualified(symbol))
    }

    fn visit_property(&mut self, symbol: &Symbol) -> String {
        let ty = symbol.ty().map(|t| self.types.display(t)).unwrap_or_default();
        format!("(property) {} {}", ty, Self::qualified(symbol))
    }

    fn visit_parameter(&mut self, symbol: &Symbol) -> String {
        self.typed("parameter", symbol)
    }

    fn visit_lambda(&mut self, symbol: &Symbol) -> String {
        let parameters: Vec<String> = symbol
            .parameters()
            .iter()
            .map(|p| p.name_text().to_string())
            .collect();
        format!("({}) => ...", parameters.join(", "))
    }

    fn visit_local(&mut self, symbol: &Symbol) -> String {
        self.typed("local variable", symbol)
    }

    fn visit_label(&mut self, symbol: &Symbol) -> String {
        format!("(label) {}", symbol.name_text())
    }

    fn visit_range_variable(&mut self, symbol: &Symbol) -> String {
        self.typed("range variable", symbol)
    }

    fn visit_query_conclusion_variable(&mut self, symbol: &Symbol) -> String {
        self.typed("query variable", symbol)
    }
}
