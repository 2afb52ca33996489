//! Quick info and reference highlighting tests.

use quill_compiler::{Compilation, CompilerOptions, SemanticModel};
use quill_core::cancel::{CancellationToken, Cancelled};
use quill_ide::{highlight_references, quick_info, HoverInfo};

const SOURCE: &str = "var limit = 2;\nvar q = from n in numbers where n > limit select n yield into r do r.Count() + r.Sum();\nreturn q;";

/// The compilation is dropped on return; the model must stand on its own.
fn model() -> SemanticModel {
    let options = CompilerOptions::from_json(r#"{ "globals": { "numbers": "seq<int>" } }"#).unwrap();
    let mut compilation = Compilation::new(options).unwrap();
    let file = compilation.add_source("main.ql", SOURCE);
    compilation.semantic_model(file).unwrap()
}

fn at(needle: &str) -> u32 {
    SOURCE.find(needle).unwrap_or_else(|| panic!("'{}' not in source", needle)) as u32
}

fn hover(position: u32) -> Option<String> {
    quick_info(&model(), position, &CancellationToken::none())
        .unwrap()
        .map(|HoverInfo { contents, .. }| contents)
}

#[test]
fn test_source_binds_cleanly() {
    assert!(model().diagnostics(&CancellationToken::none()).unwrap().is_empty());
}

#[test]
fn test_quick_info_for_query_variable() {
    assert_eq!(hover(at("r do")), Some("(query variable) seq<int> r".to_string()));
    assert_eq!(hover(at("r.Sum")), Some("(query variable) seq<int> r".to_string()));
}

#[test]
fn test_quick_info_for_locals_and_globals() {
    assert_eq!(hover(at("limit =")), Some("(local variable) int limit".to_string()));
    assert_eq!(hover(at("n >")), Some("(range variable) int n".to_string()));
    assert_eq!(hover(at("numbers") + 2), Some("(field) seq<int> Program.numbers".to_string()));
    assert_eq!(hover(at("q;")), Some("(local variable) int q".to_string()));
}

#[test]
fn test_quick_info_range_is_the_declaration() {
    let info = quick_info(&model(), at("r.Count"), &CancellationToken::none()).unwrap().unwrap();
    let range = info.range.expect("declared in this file");
    assert_eq!(range.start, at("r do"));
    assert_eq!(range.length, 1);
}

#[test]
fn test_no_quick_info_off_identifiers() {
    assert_eq!(hover(at("2;")), None);
    assert_eq!(hover(at("where") + 1), None);
    assert_eq!(hover(at(".Count") + 2), None);
}

#[test]
fn test_highlight_query_variable() {
    let model = model();
    let references = highlight_references(&model, at("r.Count"), &CancellationToken::none()).unwrap();
    let starts: Vec<(u32, bool)> = references.iter().map(|r| (r.span.start, r.is_definition)).collect();
    assert_eq!(starts, vec![(at("r do"), true), (at("r.Count"), false), (at("r.Sum"), false)]);
    assert!(references.iter().all(|r| r.file_name == "main.ql"));
}

#[test]
fn test_highlight_from_declaration_matches_highlight_from_use() {
    let model = model();
    let from_declaration = highlight_references(&model, at("r do"), &CancellationToken::none()).unwrap();
    let from_use = highlight_references(&model, at("r.Sum") + 1, &CancellationToken::none()).unwrap();
    assert_eq!(from_declaration, from_use);
}

#[test]
fn test_highlight_local_used_inside_query() {
    let model = model();
    let references = highlight_references(&model, at("limit select"), &CancellationToken::none()).unwrap();
    let starts: Vec<u32> = references.iter().map(|r| r.span.start).collect();
    assert_eq!(starts, vec![at("limit ="), at("limit select")]);
}

#[test]
fn test_highlight_global_has_no_definition_span() {
    let model = model();
    let references = highlight_references(&model, at("numbers"), &CancellationToken::none()).unwrap();
    assert_eq!(references.len(), 1);
    assert!(!references[0].is_definition);
}

#[test]
fn test_highlight_nothing_off_identifiers() {
    assert!(highlight_references(&model(), at("return") + 1, &CancellationToken::none()).unwrap().is_empty());
}

#[test]
fn test_services_report_cancellation_and_recover() {
    let model = model();
    let cancelled = CancellationToken::new();
    cancelled.cancel();
    assert_eq!(quick_info(&model, at("r.Count"), &cancelled), Err(Cancelled));
    assert_eq!(highlight_references(&model, at("r.Count"), &cancelled), Err(Cancelled));

    let info = quick_info(&model, at("r.Count"), &CancellationToken::new()).unwrap();
    assert_eq!(info.map(|i| i.contents), Some("(query variable) seq<int> r".to_string()));
}
