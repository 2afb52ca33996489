//! Shared fixture: a `Program.Main` body bound against a few globals.
#![allow(dead_code)]

use std::sync::Arc;

use indexmap::IndexMap;
use quill_binder::{Binder, BindingContext, BoundBlock, BoundExpression, BoundQuery, BoundTreeWalker, GlobalScope};
use quill_core::cancel::CancellationToken;
use quill_core::intern::StringInterner;
use quill_core::text::FileId;
use quill_diagnostics::DiagnosticCollection;
use quill_parser::parse_text;
use quill_symbols::{Accessibility, DeclarationModifiers, Member, Symbol, SymbolData, TypeId, TypeTable};
use quill_syntax::{NodeId, ParseOptions, SyntaxKind, SyntaxTree};

pub struct Fixture {
    pub interner: StringInterner,
    pub types: Arc<TypeTable>,
    pub program: Arc<Symbol>,
    pub main: Arc<Symbol>,
    pub person: TypeId,
    pub tree: Arc<SyntaxTree>,
    pub parse_diagnostics: DiagnosticCollection,
    pub binder: Arc<Binder>,
}

pub fn fixture(text: &str) -> Fixture {
    let interner = StringInterner::new();
    let types = Arc::new(TypeTable::new());
    let person = types.declare_object(
        "Person",
        IndexMap::from([
            ("Name".to_string(), Member::field(TypeTable::STRING)),
            ("Age".to_string(), Member::field(TypeTable::INT)),
            ("Greet".to_string(), Member::method(TypeTable::STRING)),
        ]),
    );
    let program_type = types.declare_object("Program", IndexMap::new());
    let program = Symbol::named_type(interner.intern("Program"), "Program", None, program_type);
    let main = Symbol::member(
        interner.intern("Main"),
        "Main",
        &program,
        Accessibility::Public,
        DeclarationModifiers::STATIC,
        SymbolData::Method {
            return_type: TypeTable::INT,
            parameter_types: Vec::new(),
        },
    );
    let field = |name: &str, ty: TypeId| {
        Symbol::member(
            interner.intern(name),
            name,
            &program,
            Accessibility::Public,
            DeclarationModifiers::STATIC,
            SymbolData::Field { ty },
        )
    };
    let globals = GlobalScope::new()
        .with(field("numbers", types.sequence(TypeTable::INT)))
        .with(field("people", types.sequence(person)))
        .with(field("count", TypeTable::INT))
        .with(Arc::clone(&main))
        .with(Symbol::named_type(interner.intern("Person"), "Person", Some(&program), person));

    let (tree, parse_diagnostics) = parse_text(FileId(0), "test.ql", text, &ParseOptions::default(), &interner);
    let context = BindingContext::new(Arc::clone(&tree), Arc::clone(&types), interner.clone());
    let binder = Binder::root(Arc::new(context), Arc::clone(&main), globals);
    Fixture {
        interner,
        types,
        program,
        main,
        person,
        tree,
        parse_diagnostics,
        binder,
    }
}

impl Fixture {
    pub fn bind(&self) -> (BoundBlock, DiagnosticCollection) {
        let mut diagnostics = DiagnosticCollection::new();
        let block = self
            .binder
            .bind_compilation_unit(&mut diagnostics, &CancellationToken::none())
            .expect("binding was not cancelled");
        (block, diagnostics)
    }

    /// The first node of `kind` in document order.
    pub fn first_node(&self, kind: SyntaxKind) -> NodeId {
        (0..self.tree.node_count() as u32)
            .map(NodeId)
            .filter(|n| self.tree.kind(*n) == kind)
            .min_by_key(|n| self.tree.span(*n).start)
            .unwrap_or_else(|| panic!("no {:?} in tree", kind))
    }
}

pub fn messages(diagnostics: &DiagnosticCollection) -> Vec<String> {
    diagnostics
        .diagnostics()
        .iter()
        .map(|d| d.message_text.clone())
        .collect()
}

/// Every query in a bound block, outermost first.
pub fn queries(block: &BoundBlock) -> Vec<BoundQuery> {
    struct Collector(Vec<BoundQuery>);
    impl BoundTreeWalker for Collector {
        fn visit_expression(&mut self, expression: &BoundExpression) {
            if let BoundExpression::Query(query) = expression {
                self.0.push((**query).clone());
            }
            quill_binder::bound::walk_expression(self, expression);
        }
    }
    let mut collector = Collector(Vec::new());
    collector.visit_block(block);
    collector.0
}
