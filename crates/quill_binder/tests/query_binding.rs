//! Binding whole units: queries, conclusions and statements.

mod common;

use std::sync::Arc;

use common::{fixture, messages, queries};
use quill_binder::{BoundExpression, BoundQueryClause, BoundStatement};
use quill_core::cancel::CancellationToken;
use quill_diagnostics::DiagnosticCollection;
use quill_symbols::{SymbolKind, TypeTable};
use quill_syntax::SyntaxKind;

fn local_type(text: &str, index: usize) -> String {
    let fx = fixture(text);
    let (block, diagnostics) = fx.bind();
    assert!(diagnostics.is_empty(), "{:?}", messages(&diagnostics));
    match &block.statements[index] {
        BoundStatement::LocalDeclaration { local: Some(local), .. } => fx.types.display(local.ty().unwrap()),
        other => panic!("expected a local declaration, got {:?}", other),
    }
}

#[test]
fn test_select_query_type() {
    assert_eq!(local_type("var q = from n in numbers where n > 1 select n * 2;", 0), "seq<int>");
    assert_eq!(local_type("var q = from p in people let a = p.Age select a;", 0), "seq<int>");
    assert_eq!(local_type("var q = from p in people select p.Name;", 0), "seq<string>");
}

#[test]
fn test_group_query_type() {
    assert_eq!(
        local_type("var g = from p in people group p by p.Age;", 0),
        "seq<grouping<int, Person>>"
    );
}

#[test]
fn test_conclusion_gives_query_its_body_type() {
    assert_eq!(
        local_type("var c = from n in numbers select n yield into r do r.Count();", 0),
        "int"
    );
    assert_eq!(
        local_type("var f = from p in people select p yield into r do r.First().Name;", 0),
        "string"
    );
}

#[test]
fn test_member_scenario_on_conclusion_variable() {
    let fx = fixture("var q = from p in people select p yield into x do x.Y;");
    let (block, diagnostics) = fx.bind();
    assert_eq!(
        messages(&diagnostics),
        vec!["'seq<Person>' does not contain a definition for 'Y'."]
    );

    let query = &queries(&block)[0];
    let lambda = query.conclusion.as_ref().expect("conclusion is bound");
    let bound = lambda.bound().expect("binding the query binds its conclusion");
    let BoundStatement::Return { expression: Some(BoundExpression::Bad { children, .. }), .. } = &bound.body.statements[0]
    else {
        panic!("unexpected body {:?}", bound.body);
    };
    let BoundExpression::QueryConclusionVariable(x) = &children[0] else {
        panic!("receiver should be the conclusion variable, got {:?}", children[0]);
    };
    assert_eq!(x.variable.name_text(), "x");
    assert_eq!(fx.types.display(x.ty), "seq<Person>");
    assert!(x.parameter.was_compiler_generated);
    assert!(matches!(
        x.parameter.parameter.data(),
        quill_symbols::SymbolData::Parameter { ordinal: 0, .. }
    ));

    let declared = x.variable.declaring_syntax(&fx.tree).unwrap();
    assert_eq!(declared, fx.first_node(SyntaxKind::QueryConclusion));
    assert!(Arc::ptr_eq(&x.variable.containing_symbol().unwrap(), &fx.main));
}

#[test]
fn test_range_variables_are_not_visible_in_conclusion_body() {
    let fx = fixture("var q = from n in numbers select n yield into r do n;");
    let (_, diagnostics) = fx.bind();
    assert_eq!(
        messages(&diagnostics),
        vec!["The name 'n' does not exist in the current context."]
    );
}

#[test]
fn test_enclosing_locals_are_visible_in_conclusion_body() {
    let fx = fixture("var k = 3; var q = from n in numbers select n yield into r do r.Count() + k + count;");
    let (_, diagnostics) = fx.bind();
    assert!(diagnostics.is_empty(), "{:?}", messages(&diagnostics));
}

#[test]
fn test_conclusion_variable_does_not_leak() {
    let fx = fixture("var q = from n in numbers select n yield into r do r; var z = r;");
    let (_, diagnostics) = fx.bind();
    assert_eq!(
        messages(&diagnostics),
        vec!["The name 'r' does not exist in the current context."]
    );
}

#[test]
fn test_missing_conclusion_identifier_defers_nothing() {
    let fx = fixture("var q = from n in numbers select n yield into do 1;");
    assert_eq!(messages(&fx.parse_diagnostics), vec!["Identifier expected."]);
    let (block, diagnostics) = fx.bind();
    assert!(diagnostics.is_empty());
    let query = &queries(&block)[0];
    assert!(query.conclusion.is_none());
    assert_eq!(fx.types.display(query.ty), "seq<int>");
}

#[test]
fn test_non_sequence_source() {
    let fx = fixture("var q = from c in count select c;");
    let (block, diagnostics) = fx.bind();
    assert_eq!(
        messages(&diagnostics),
        vec!["Could not find an implementation of the query pattern for source type 'int'."]
    );
    let query = &queries(&block)[0];
    let BoundQueryClause::From { variable: Some(c), .. } = &query.clauses[0] else {
        panic!("expected a from clause");
    };
    assert_eq!(c.ty(), Some(TypeTable::ERROR));
}

#[test]
fn test_range_variable_conflicts() {
    let fx = fixture("var q = from n in numbers from n in numbers select n;");
    let (_, diagnostics) = fx.bind();
    assert_eq!(
        messages(&diagnostics),
        vec!["The range variable 'n' conflicts with a previous declaration of 'n'."]
    );
}

#[test]
fn test_range_variable_binds_as_range_variable() {
    let fx = fixture("var q = from p in people where p.Age > 18 select p.Name;");
    let (block, _) = fx.bind();
    let query = &queries(&block)[0];
    let BoundQueryClause::Where { condition: BoundExpression::Binary { left, .. }, .. } = &query.clauses[1] else {
        panic!("expected a where clause");
    };
    let BoundExpression::MemberAccess { receiver, .. } = left.as_ref() else {
        panic!("expected member access");
    };
    let symbol = receiver.referenced_symbol().unwrap();
    assert_eq!(symbol.kind(), SymbolKind::RangeVariable);
    assert_eq!(symbol.ty(), Some(fx.person));
}

#[test]
fn test_cancelled_unit_binding() {
    let fx = fixture("var q = from n in numbers select n yield into r do r;");
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut diagnostics = DiagnosticCollection::new();
    assert!(fx.binder.bind_compilation_unit(&mut diagnostics, &cancel).is_err());
}

#[test]
fn test_unit_binding_honors_each_callers_token() {
    let fx = fixture("var q = from n in numbers select n yield into r do r.Count();");
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut discarded = DiagnosticCollection::new();
    assert!(fx.binder.bind_compilation_unit(&mut discarded, &cancel).is_err());

    let mut diagnostics = DiagnosticCollection::new();
    let block = fx
        .binder
        .bind_compilation_unit(&mut diagnostics, &CancellationToken::new())
        .unwrap();
    assert!(diagnostics.is_empty(), "{:?}", messages(&diagnostics));
    let query = queries(&block).into_iter().next().unwrap();
    assert_eq!(query.ty, TypeTable::INT);
}
