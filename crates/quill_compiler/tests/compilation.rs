//! Compilation and semantic model tests.

use std::sync::Arc;

use indexmap::IndexMap;
use quill_compiler::{Compilation, CompilerOptions, SemanticModel};
use quill_core::cancel::{CancellationToken, Cancelled};
use quill_core::text::FileId;
use quill_symbols::{Member, SymbolKey, SymbolKind, TypeTable};
use quill_syntax::{NodeId, SyntaxKind};

const QUERY: &str = "var q = from n in numbers where n > 1 select n yield into r do r.Count();\nvar total = q + count;";

fn compilation(options: CompilerOptions) -> Compilation {
    let mut compilation = Compilation::new(options).unwrap();
    compilation.declare_global("numbers", compilation.types().sequence(TypeTable::INT));
    compilation.declare_global("count", TypeTable::INT);
    compilation
}

fn model(text: &str) -> SemanticModel {
    let mut compilation = compilation(CompilerOptions::default());
    let file = compilation.add_source("main.ql", text);
    compilation.semantic_model(file).unwrap()
}

fn messages(compilation: &Compilation) -> Vec<String> {
    compilation
        .compile(&CancellationToken::none())
        .unwrap()
        .diagnostics()
        .iter()
        .map(|d| d.message_text.clone())
        .collect()
}

fn position(text: &str, needle: &str) -> u32 {
    text.find(needle).unwrap_or_else(|| panic!("'{}' not in source", needle)) as u32
}

fn conclusion_node(model: &SemanticModel) -> NodeId {
    let tree = model.tree();
    (0..tree.node_count() as u32)
        .map(NodeId)
        .find(|n| tree.kind(*n) == SyntaxKind::QueryConclusion)
        .expect("source has a query conclusion")
}

// ============================================================================
// Compilation
// ============================================================================

#[test]
fn test_clean_query_compiles_without_diagnostics() {
    let mut compilation = compilation(CompilerOptions::default());
    compilation.add_source("main.ql", QUERY);
    assert_eq!(messages(&compilation), Vec::<String>::new());
}

#[test]
fn test_diagnostics_are_sorted_by_file_then_position() {
    let mut compilation = compilation(CompilerOptions::default());
    compilation.add_source("a.ql", "var a = 1;\nvar b = first;");
    compilation.add_source("b.ql", "var c = second;");
    compilation.add_source("c.ql", "var d = third;\nvar e = fourth;");
    assert_eq!(
        messages(&compilation),
        vec![
            "The name 'first' does not exist in the current context.",
            "The name 'second' does not exist in the current context.",
            "The name 'third' does not exist in the current context.",
            "The name 'fourth' does not exist in the current context.",
        ]
    );
}

#[test]
fn test_max_diagnostics_caps_the_result() {
    let options = CompilerOptions {
        max_diagnostics: Some(2),
        ..CompilerOptions::default()
    };
    let mut compilation = compilation(options);
    compilation.add_source("a.ql", "var a = x1;\nvar b = x2;\nvar c = x3;");
    let diagnostics = compilation.compile(&CancellationToken::none()).unwrap();
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.diagnostics()[1].message_text.contains("'x2'"));
}

#[test]
fn test_disabled_feature_is_reported() {
    let options = CompilerOptions::from_json(r#"{ "features": ["doStatements"] }"#).unwrap();
    let mut compilation = compilation(options);
    compilation.add_source("main.ql", QUERY);
    let messages = messages(&compilation);
    assert!(
        messages
            .iter()
            .any(|m| m.starts_with("Feature 'query conclusions' is not available")),
        "{:?}",
        messages
    );
}

#[test]
fn test_declared_types_are_visible_to_source() {
    let mut compilation = compilation(CompilerOptions::default());
    let person = compilation.declare_type("Person", IndexMap::from([("Name".to_string(), Member::field(TypeTable::STRING))]));
    compilation.declare_global("people", compilation.types().sequence(person));
    compilation.add_source("main.ql", "var names = from p in people select p.Name;");
    assert!(messages(&compilation).is_empty());
}

#[test]
fn test_cancelled_compile_returns_err() {
    let token = CancellationToken::new();
    let mut compilation = compilation(CompilerOptions::default());
    compilation.add_source("main.ql", QUERY);
    token.cancel();
    assert_eq!(compilation.compile(&token).unwrap_err(), Cancelled);
    assert!(compilation.compile(&CancellationToken::new()).unwrap().is_empty());
}

#[test]
fn test_long_operator_chain_is_a_diagnostic() {
    let mut compilation = compilation(CompilerOptions::default());
    compilation.add_source("main.ql", format!("var a = {}1;", "1 + ".repeat(100_000)));
    assert_eq!(messages(&compilation), vec!["An expression is too long or complex to compile."]);
}

#[test]
fn test_files_bind_independently() {
    let mut compilation = compilation(CompilerOptions::default());
    let a = compilation.add_source("a.ql", "var x = 1;");
    let b = compilation.add_source("b.ql", "var y = x;");
    assert_eq!(a, FileId(0));
    assert!(compilation.semantic_model(a).unwrap().diagnostics(&CancellationToken::none()).unwrap().is_empty());
    assert_eq!(compilation.semantic_model(b).unwrap().diagnostics(&CancellationToken::none()).unwrap().len(), 1);
}

// ============================================================================
// Semantic model
// ============================================================================

#[test]
fn test_bound_unit_is_computed_once() {
    let model = model(QUERY);
    let first = model.bound_unit(&CancellationToken::none()).unwrap() as *const _;
    let second = model.bound_unit(&CancellationToken::none()).unwrap() as *const _;
    assert_eq!(first, second);
}

#[test]
fn test_cancelled_bind_can_be_retried_with_a_fresh_token() {
    let model = model(QUERY);
    let cancelled = CancellationToken::new();
    cancelled.cancel();
    assert_eq!(model.bound_unit(&cancelled).unwrap_err(), Cancelled);
    assert_eq!(model.symbol_at(position(QUERY, "r.Count"), &cancelled).unwrap_err(), Cancelled);

    let fresh = CancellationToken::new();
    assert!(model.diagnostics(&fresh).unwrap().is_empty());
    let r = model.symbol_at(position(QUERY, "r.Count"), &fresh).unwrap().unwrap();
    assert_eq!(r.kind(), SymbolKind::QueryConclusionVariable);
    // Once bound, a cancelled token no longer matters.
    assert!(model.conclusion_lambda(conclusion_node(&model), &cancelled).unwrap().is_some());
}

#[test]
fn test_model_outlives_its_compilation() {
    let mut compilation = compilation(CompilerOptions::default());
    let file = compilation.add_source("main.ql", QUERY);
    let model = compilation.semantic_model(file).unwrap();
    drop(compilation);

    let numbers = model.symbol_at(position(QUERY, "numbers"), &CancellationToken::none()).unwrap().unwrap();
    let container = numbers.containing_symbol().expect("the program type is still alive");
    assert_eq!(container.name_text(), "Program");
    assert_eq!(container.kind(), SymbolKind::NamedType);
}

#[test]
fn test_symbol_at_declaration_and_reference_agree() {
    let model = model(QUERY);
    let declared = model.symbol_at(position(QUERY, "r do") + 1, &CancellationToken::none()).unwrap().unwrap();
    let referenced = model.symbol_at(position(QUERY, "r.Count"), &CancellationToken::none()).unwrap().unwrap();
    assert_eq!(declared.kind(), SymbolKind::QueryConclusionVariable);
    assert_eq!(SymbolKey::new(&declared), SymbolKey::new(&referenced));
    assert_eq!(
        model.symbol_type(&declared, &CancellationToken::none()).unwrap(),
        Some(model.types().sequence(TypeTable::INT))
    );
}

#[test]
fn test_symbol_at_non_identifier_is_none() {
    let model = model(QUERY);
    assert!(model.symbol_at(position(QUERY, "1 select") + 1, &CancellationToken::none()).unwrap().is_none());
    assert!(model.symbol_at(position(QUERY, "where") + 2, &CancellationToken::none()).unwrap().is_none());
}

#[test]
fn test_symbol_at_global_and_range_variable() {
    let model = model(QUERY);
    let numbers = model.symbol_at(position(QUERY, "numbers") + 3, &CancellationToken::none()).unwrap().unwrap();
    assert_eq!(numbers.kind(), SymbolKind::Field);
    let n = model.symbol_at(position(QUERY, "n >"), &CancellationToken::none()).unwrap().unwrap();
    assert_eq!(n.kind(), SymbolKind::RangeVariable);
    assert_eq!(model.symbol_type(&n, &CancellationToken::none()).unwrap(), Some(TypeTable::INT));
}

#[test]
fn test_reference_spans_cover_declaration_and_uses() {
    let model = model(QUERY);
    let r = model.symbol_at(position(QUERY, "r.Count"), &CancellationToken::none()).unwrap().unwrap();
    let spans = model.reference_spans(&r, &CancellationToken::none()).unwrap();
    let starts: Vec<u32> = spans.iter().map(|s| s.start).collect();
    assert_eq!(starts, vec![position(QUERY, "r do"), position(QUERY, "r.Count")]);

    let q = model.symbol_at(position(QUERY, "q ="), &CancellationToken::none()).unwrap().unwrap();
    let starts: Vec<u32> = model.reference_spans(&q, &CancellationToken::none()).unwrap().iter().map(|s| s.start).collect();
    assert_eq!(starts, vec![position(QUERY, "q ="), position(QUERY, "q +")]);
}

#[test]
fn test_conclusion_lambda_is_shared_between_requests() {
    let model = model(QUERY);
    let node = conclusion_node(&model);
    let first = model.conclusion_lambda(node, &CancellationToken::none()).unwrap().unwrap();
    let second = model.conclusion_lambda(node, &CancellationToken::none()).unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.parameter_count(), 1);
    assert_eq!(first.parameter_name(0), "r");
    assert!(first.bound().is_some(), "binding the unit binds the conclusion");
}

#[test]
fn test_concurrent_requests_observe_one_body() {
    let model = model(QUERY);
    let node = conclusion_node(&model);
    let bodies: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let lambda = model.conclusion_lambda(node, &CancellationToken::none()).unwrap().unwrap();
                    let bound = lambda.bind(&CancellationToken::none()).unwrap();
                    Arc::as_ptr(&bound.symbol) as usize
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(bodies.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_no_conclusion_for_other_nodes() {
    let model = model(QUERY);
    assert!(model.conclusion_lambda(model.tree().root(), &CancellationToken::none()).unwrap().is_none());
}
