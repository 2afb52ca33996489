mod common;

use common::{fixture, messages};
use quill_binder::{BoundExpression, BoundStatement, ConstantValue};
use quill_diagnostics::DiagnosticCategory;
use quill_symbols::{SymbolKind, TypeTable};

fn diagnose(text: &str) -> Vec<String> {
    let fx = fixture(text);
    assert!(fx.parse_diagnostics.is_empty(), "{:?}", messages(&fx.parse_diagnostics));
    let (_, diagnostics) = fx.bind();
    messages(&diagnostics)
}

#[test]
fn test_clean_unit() {
    assert!(diagnose("var a = 1; var b = a + count; var s = \"x\" + b; Main(); return s.Length;").is_empty());
}

#[test]
fn test_unknown_name() {
    assert_eq!(
        diagnose("var a = b;"),
        vec!["The name 'b' does not exist in the current context."]
    );
}

#[test]
fn test_local_is_visible_only_after_its_declaration() {
    assert_eq!(
        diagnose("var a = a;"),
        vec!["The name 'a' does not exist in the current context."]
    );
}

#[test]
fn test_duplicate_local() {
    assert_eq!(
        diagnose("var a = 1; var a = 2;"),
        vec!["A local variable named 'a' is already defined in this scope."]
    );
}

#[test]
fn test_block_locals_do_not_escape() {
    assert_eq!(
        diagnose("{ var a = 1; } var b = a;"),
        vec!["The name 'a' does not exist in the current context."]
    );
}

#[test]
fn test_wrong_kinds() {
    assert_eq!(
        diagnose("var a = Person; var b = Main; count();"),
        vec![
            "'Person' is a type but is used like a variable.",
            "'Main' is a method but is used like a variable.",
            "Non-invocable member 'count' cannot be used like a method.",
        ]
    );
}

#[test]
fn test_member_errors() {
    assert_eq!(
        diagnose("var a = count.Foo; var b = numbers.Count; var c = people.First().Age();"),
        vec![
            "'int' does not contain a definition for 'Foo'.",
            "'Count' is a method but is used like a property.",
            "Non-invocable member 'Age' cannot be used like a method.",
        ]
    );
}

#[test]
fn test_errors_do_not_cascade() {
    assert_eq!(
        diagnose("var a = nope.Length + 1 * nope2;"),
        vec![
            "The name 'nope' does not exist in the current context.",
            "The name 'nope2' does not exist in the current context.",
        ]
    );
}

#[test]
fn test_operator_type_error() {
    assert_eq!(
        diagnose("var a = true + 1;"),
        vec!["Operator '+' cannot be applied to operands of type 'bool' and 'int'."]
    );
}

#[test]
fn test_unreachable_code_is_reported_once() {
    let fx = fixture("return 1; var a = 2; var b = 3;");
    let (_, diagnostics) = fx.bind();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.diagnostics()[0].category, DiagnosticCategory::Warning);
    assert_eq!(diagnostics.diagnostics()[0].message_text, "Unreachable code detected.");
}

#[test]
fn test_bound_shapes() {
    let fx = fixture("var a = 42; do { yield return a; } while (a < 10); yield break;");
    let (block, diagnostics) = fx.bind();
    assert!(diagnostics.is_empty(), "{:?}", messages(&diagnostics));
    let BoundStatement::LocalDeclaration { local: Some(a), initializer, .. } = &block.statements[0] else {
        panic!("expected a local");
    };
    assert_eq!(a.kind(), SymbolKind::Local);
    assert!(matches!(
        initializer,
        BoundExpression::Literal { value: ConstantValue::Int(42), ty: TypeTable::INT, .. }
    ));
    let BoundStatement::Do { body, condition, .. } = &block.statements[1] else {
        panic!("expected a do statement");
    };
    assert_eq!(condition.ty(), TypeTable::BOOL);
    let BoundStatement::YieldReturn { expression, .. } = &body.statements[0] else {
        panic!("expected yield return");
    };
    assert!(std::sync::Arc::ptr_eq(expression.referenced_symbol().unwrap(), a));
    assert!(block.statements[2].is_terminal());
}

#[test]
fn test_long_operator_chain_is_reported_instead_of_bound() {
    let fx = fixture(&format!("var a = {}1;", "1 + ".repeat(100_000)));
    assert!(fx.parse_diagnostics.is_empty());
    let (block, diagnostics) = fx.bind();
    assert_eq!(messages(&diagnostics), vec!["An expression is too long or complex to compile."]);
    let [BoundStatement::LocalDeclaration { initializer: BoundExpression::Bad { children, .. }, .. }] =
        block.statements.as_slice()
    else {
        panic!("expected a bad initializer, got {:?}", block.statements.len());
    };
    assert!(children.is_empty());
}

#[test]
fn test_long_member_chain_is_reported_instead_of_bound() {
    let text = format!("numbers{};", ".First()".repeat(50_000));
    assert_eq!(diagnose(&text), vec!["An expression is too long or complex to compile."]);
}

#[test]
fn test_chain_within_depth_limit_binds() {
    let fx = fixture(&format!("var a = {}1;", "1 + ".repeat(400)));
    let (block, diagnostics) = fx.bind();
    assert!(diagnostics.is_empty(), "{:?}", messages(&diagnostics));
    let [BoundStatement::LocalDeclaration { initializer, .. }] = block.statements.as_slice() else {
        panic!("expected one declaration");
    };
    assert_eq!(initializer.ty(), TypeTable::INT);
}
