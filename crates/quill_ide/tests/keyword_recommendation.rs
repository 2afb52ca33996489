//! Keyword recommendation tests. `$$` marks the caret.

use quill_core::intern::StringInterner;
use quill_core::text::FileId;
use quill_ide::{
    recommend_keywords, CompletionItemKind, DoKeywordRecommender, KeywordRecommender, ReturnKeywordRecommender,
    SyntaxContext, YieldKeywordRecommender,
};
use quill_parser::parse_text;
use quill_syntax::{ParseOptions, SyntaxKind};

fn keywords(marked: &str) -> Vec<String> {
    let position = marked.find("$$").expect("source has a caret marker");
    let text = marked.replacen("$$", "", 1);
    let (tree, _) = parse_text(FileId(0), "test.ql", &text, &ParseOptions::default(), &StringInterner::new());
    recommend_keywords(&tree, position as u32)
        .into_iter()
        .map(|item| {
            assert_eq!(item.kind, CompletionItemKind::Keyword);
            item.label
        })
        .collect()
}

fn offers(marked: &str, keyword: &str) -> bool {
    keywords(marked).iter().any(|k| k == keyword)
}

const QUERY_PREFIX: &str = "var q = from x in numbers ";

fn query(rest: &str) -> String {
    format!("{}{}", QUERY_PREFIX, rest)
}

// ============================================================================
// Statement context
// ============================================================================

#[test]
fn test_empty_file_offers_every_statement_keyword() {
    assert_eq!(keywords("$$"), vec!["do", "return", "yield"]);
}

#[test]
fn test_word_being_typed_at_start_of_file() {
    assert_eq!(keywords("re$$"), vec!["do", "return", "yield"]);
}

#[test]
fn test_after_statement() {
    assert_eq!(keywords("var a = 1;\n$$"), vec!["do", "return", "yield"]);
}

#[test]
fn test_inside_block() {
    assert_eq!(keywords("{ $$ }"), vec!["do", "return", "yield"]);
    assert_eq!(keywords("do { var a = 1; $$ } while (true);"), vec!["do", "return", "yield"]);
}

#[test]
fn test_after_nested_block() {
    assert_eq!(keywords("{ { } $$ }"), vec!["do", "return", "yield"]);
}

#[test]
fn test_no_statement_keywords_mid_expression() {
    assert!(keywords("var a = $$").is_empty());
    assert!(keywords("var a = 1 + $$").is_empty());
}

#[test]
fn test_no_statement_keywords_after_do_body() {
    assert!(keywords("do { } $$").is_empty());
}

// ============================================================================
// yield after select and group
// ============================================================================

#[test]
fn test_yield_after_complete_select() {
    assert!(offers(&query("select x $$"), "yield"));
    assert!(offers(&query("select x.Name $$"), "yield"));
    assert!(offers(&query("where x > 1 select x + 1 $$"), "yield"));
}

#[test]
fn test_no_yield_while_typing_select_expression() {
    assert!(!offers(&query("select x$$"), "yield"));
}

#[test]
fn test_no_yield_after_dot() {
    assert!(!offers(&query("select x.$$"), "yield"));
    assert!(!offers(&query("select x.i$$"), "yield"));
}

#[test]
fn test_no_yield_after_empty_select() {
    assert!(!offers(&query("select $$"), "yield"));
}

#[test]
fn test_yield_after_complete_group() {
    assert!(offers(&query("group x by x $$"), "yield"));
}

#[test]
fn test_no_yield_after_incomplete_group() {
    assert!(!offers(&query("group x $$"), "yield"));
    assert!(!offers(&query("group x by $$"), "yield"));
    assert!(!offers(&query("group x by x$$"), "yield"));
}

#[test]
fn test_only_yield_after_select() {
    assert_eq!(keywords(&query("select x $$")), vec!["yield"]);
}

// ============================================================================
// do in a query conclusion
// ============================================================================

#[test]
fn test_do_after_conclusion_identifier() {
    assert_eq!(keywords(&query("select x yield into r $$")), vec!["do"]);
}

#[test]
fn test_no_do_while_typing_conclusion_identifier() {
    assert!(!offers(&query("select x yield into r$$"), "do"));
}

#[test]
fn test_no_do_without_conclusion_identifier() {
    assert!(keywords(&query("select x yield into $$")).is_empty());
}

// ============================================================================
// return after yield
// ============================================================================

#[test]
fn test_return_after_yield_statement() {
    assert_eq!(keywords("var a = 1;\nyield $$"), vec!["return"]);
    assert!(offers("yield r$$", "return"));
}

#[test]
fn test_no_return_after_conclusion_yield() {
    assert!(keywords(&query("select x yield $$")).is_empty());
}

// ============================================================================
// Context
// ============================================================================

#[test]
fn test_target_token_skips_touched_word() {
    let text = query("select xy");
    let (tree, _) = parse_text(FileId(0), "test.ql", &text, &ParseOptions::default(), &StringInterner::new());

    let touching = SyntaxContext::new(&tree, text.len() as u32);
    assert_eq!(touching.left_token().map(|t| tree.token(t).kind), Some(SyntaxKind::IdentifierToken));
    assert_eq!(touching.target_kind(), Some(SyntaxKind::SelectKeyword));
    assert_eq!(touching.target_parent_kind(), Some(SyntaxKind::SelectClause));

    let inside = SyntaxContext::new(&tree, text.len() as u32 - 1);
    assert_eq!(inside.target_kind(), Some(SyntaxKind::SelectKeyword));
}

#[test]
fn test_global_statement_context() {
    let (tree, _) = parse_text(
        FileId(0),
        "test.ql",
        "var a = 1; { var b = 2; }",
        &ParseOptions::default(),
        &StringInterner::new(),
    );
    let top = SyntaxContext::new(&tree, 10);
    assert!(top.is_statement_context());
    assert!(top.is_global_statement_context());

    let nested = SyntaxContext::new(&tree, 23);
    assert!(nested.is_statement_context());
    assert!(!nested.is_global_statement_context());
}

#[test]
fn test_recommenders_name_their_keyword() {
    let (tree, _) = parse_text(FileId(0), "test.ql", "", &ParseOptions::default(), &StringInterner::new());
    let context = SyntaxContext::new(&tree, 0);
    let recommenders: [&dyn KeywordRecommender; 3] =
        [&YieldKeywordRecommender, &DoKeywordRecommender, &ReturnKeywordRecommender];
    let labels: Vec<String> = recommenders
        .iter()
        .filter_map(|r| r.recommend(&context))
        .map(|item| item.label)
        .collect();
    assert_eq!(labels, vec!["yield", "do", "return"]);
    assert_eq!(YieldKeywordRecommender.keyword(), SyntaxKind::YieldKeyword);
}
