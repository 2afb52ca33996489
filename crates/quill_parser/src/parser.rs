//! The quill parser implementation.
//!
//! A recursive descent parser over the scanned token list. It never fails:
//! when a construct is incomplete the expected tokens are synthesized as
//! zero-width missing tokens, a diagnostic is reported, and the node keeps
//! its full shape.

use std::sync::Arc;

use quill_core::intern::StringInterner;
use quill_core::text::{FileId, Location, TextSpan};
use quill_diagnostics::{messages, DiagnosticCollection, DiagnosticMessage};
use quill_syntax::{Features, ParseOptions, SyntaxKind, SyntaxTree, SyntaxTreeBuilder, TokenId};

use crate::scanner::{tokenize, TokenInfo};

/// Maximum recursion depth to prevent stack overflow on deeply nested input.
const MAX_RECURSION_DEPTH: u32 = 200;

/// The parser produces a [`SyntaxTree`] from quill source text.
pub struct Parser<'i> {
    file: FileId,
    file_name: String,
    source_text: String,
    options: ParseOptions,
    interner: &'i StringInterner,
    tokens: Vec<TokenInfo>,
    pos: usize,
    builder: SyntaxTreeBuilder,
    diagnostics: DiagnosticCollection,
    /// Tracks recursion depth to prevent stack overflow on deeply nested input.
    recursion_depth: u32,
    reported_too_deep: bool,
}

impl<'i> Parser<'i> {
    pub fn new(
        file: FileId,
        file_name: &str,
        source_text: &str,
        options: &ParseOptions,
        interner: &'i StringInterner,
    ) -> Self {
        let (tokens, diagnostics) = tokenize(file, source_text);
        Self {
            file,
            file_name: file_name.to_string(),
            source_text: source_text.to_string(),
            options: options.clone(),
            interner,
            tokens,
            pos: 0,
            builder: SyntaxTreeBuilder::new(),
            diagnostics,
            recursion_depth: 0,
            reported_too_deep: false,
        }
    }

    /// Parse the whole file into a compilation unit.
    #[tracing::instrument(level = "debug", skip_all, fields(file = %self.file_name))]
    pub fn parse(mut self) -> (Arc<SyntaxTree>, DiagnosticCollection) {
        self.builder.start_node(SyntaxKind::CompilationUnit);
        while self.current() != SyntaxKind::EndOfFileToken {
            let saved_pos = self.pos;
            self.parse_statement();
            // Error recovery: the statement consumed nothing, so skip the
            // offending token to avoid looping forever.
            if self.pos == saved_pos {
                self.bump();
            }
        }
        self.bump();
        self.builder.finish_node();

        let tree = self
            .builder
            .finish(self.file, self.file_name, self.source_text, self.options);
        let mut diagnostics = self.diagnostics;
        diagnostics.sort();
        tracing::debug!(
            nodes = tree.node_count(),
            tokens = tree.token_count(),
            errors = diagnostics.error_count(),
            "parsed"
        );
        (Arc::new(tree), diagnostics)
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn current(&self) -> SyntaxKind {
        self.tokens[self.pos].kind
    }

    #[inline]
    fn peek(&self, ahead: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + ahead)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::EndOfFileToken)
    }

    /// Move the current token into the open node. The end-of-file token is
    /// never consumed twice.
    fn bump(&mut self) -> TokenId {
        let info = &self.tokens[self.pos];
        let value = match info.kind {
            SyntaxKind::IdentifierToken => Some(self.interner.intern(&info.text)),
            _ => None,
        };
        let id = self.builder.token(info.kind, info.span, value);
        if info.kind != SyntaxKind::EndOfFileToken {
            self.pos += 1;
        }
        id
    }

    /// Consume a token of `kind`, or synthesize a missing one and report it.
    fn expect(&mut self, kind: SyntaxKind) -> TokenId {
        if self.current() == kind {
            return self.bump();
        }
        let location = self.missing_location();
        if kind == SyntaxKind::IdentifierToken {
            self.diagnostics
                .report(location, &messages::IDENTIFIER_EXPECTED, &[]);
        } else {
            self.diagnostics
                .report(location, &messages::_0_EXPECTED, &[kind.display_text()]);
        }
        self.builder.missing_token(kind)
    }

    /// Where a missing token would sit: right after the previous token.
    fn missing_location(&self) -> Location {
        let at = match self.pos {
            0 => 0,
            n => self.tokens[n - 1].span.end(),
        };
        Location::new(self.file, TextSpan::empty(at))
    }

    fn error_at_current(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        let location = Location::new(self.file, self.tokens[self.pos].span);
        self.diagnostics.report(location, message, args);
    }

    fn report_too_deep(&mut self) {
        if !self.reported_too_deep {
            self.reported_too_deep = true;
            self.error_at_current(&messages::EXPRESSION_IS_TOO_DEEPLY_NESTED, &[]);
        }
    }

    fn check_feature(&mut self, feature: Features) {
        if !self.options.is_enabled(feature) {
            self.error_at_current(&messages::FEATURE_0_IS_NOT_AVAILABLE, &[feature.display_name()]);
        }
    }

    // ========================================================================
    // Statement parsing
    // ========================================================================

    fn parse_statement(&mut self) {
        match self.current() {
            SyntaxKind::OpenBraceToken => self.parse_block(),
            SyntaxKind::VarKeyword => self.parse_local_declaration(),
            SyntaxKind::ReturnKeyword => self.parse_return_statement(),
            SyntaxKind::YieldKeyword => self.parse_yield_statement(),
            SyntaxKind::DoKeyword => self.parse_do_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_block(&mut self) {
        self.builder.start_node(SyntaxKind::Block);
        if self.current() != SyntaxKind::OpenBraceToken {
            // Without the brace there is nothing to delimit the statements.
            self.expect(SyntaxKind::OpenBraceToken);
            self.builder.missing_token(SyntaxKind::CloseBraceToken);
            self.builder.finish_node();
            return;
        }
        self.bump();
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            self.report_too_deep();
            self.skip_to_closing_brace();
        } else {
            while !matches!(self.current(), SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken) {
                let saved_pos = self.pos;
                self.parse_statement();
                if self.pos == saved_pos {
                    self.bump();
                }
            }
        }
        self.recursion_depth -= 1;
        self.expect(SyntaxKind::CloseBraceToken);
        self.builder.finish_node();
    }

    /// Consume the rest of a block as loose tokens, stopping before the
    /// brace that closes it.
    fn skip_to_closing_brace(&mut self) {
        let mut open = 0u32;
        loop {
            match self.current() {
                SyntaxKind::EndOfFileToken => return,
                SyntaxKind::CloseBraceToken if open == 0 => return,
                SyntaxKind::CloseBraceToken => open -= 1,
                SyntaxKind::OpenBraceToken => open += 1,
                _ => {}
            }
            self.bump();
        }
    }

    fn parse_local_declaration(&mut self) {
        self.builder.start_node(SyntaxKind::LocalDeclarationStatement);
        self.bump();
        self.expect(SyntaxKind::IdentifierToken);
        self.expect(SyntaxKind::EqualsToken);
        self.parse_expression();
        self.expect(SyntaxKind::SemicolonToken);
        self.builder.finish_node();
    }

    fn parse_return_statement(&mut self) {
        self.builder.start_node(SyntaxKind::ReturnStatement);
        self.bump();
        if self.current() != SyntaxKind::SemicolonToken {
            self.parse_expression();
        }
        self.expect(SyntaxKind::SemicolonToken);
        self.builder.finish_node();
    }

    fn parse_yield_statement(&mut self) {
        if self.peek(1) == SyntaxKind::BreakKeyword {
            self.builder.start_node(SyntaxKind::YieldBreakStatement);
            self.bump();
            self.bump();
        } else {
            self.builder.start_node(SyntaxKind::YieldReturnStatement);
            self.bump();
            self.expect(SyntaxKind::ReturnKeyword);
            self.parse_expression();
        }
        self.expect(SyntaxKind::SemicolonToken);
        self.builder.finish_node();
    }

    fn parse_do_statement(&mut self) {
        self.check_feature(Features::DO_STATEMENTS);
        self.builder.start_node(SyntaxKind::DoStatement);
        self.bump();
        self.parse_block();
        self.expect(SyntaxKind::WhileKeyword);
        self.expect(SyntaxKind::OpenParenToken);
        self.parse_expression();
        self.expect(SyntaxKind::CloseParenToken);
        self.expect(SyntaxKind::SemicolonToken);
        self.builder.finish_node();
    }

    fn parse_expression_statement(&mut self) {
        self.builder.start_node(SyntaxKind::ExpressionStatement);
        self.parse_expression();
        self.expect(SyntaxKind::SemicolonToken);
        self.builder.finish_node();
    }

    // ========================================================================
    // Expression parsing
    // ========================================================================

    fn parse_expression(&mut self) {
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            self.report_too_deep();
            self.parse_missing_name();
        } else {
            self.parse_binary_expression(0);
        }
        self.recursion_depth -= 1;
    }

    /// Precedence climbing: operators bind tighter than `min_precedence`
    /// are folded into the left operand, which is wrapped after the fact.
    fn parse_binary_expression(&mut self, min_precedence: u8) {
        let checkpoint = self.builder.checkpoint();
        self.parse_postfix_expression();
        while let Some(precedence) = self.current().binary_precedence() {
            if precedence <= min_precedence {
                break;
            }
            self.builder.start_node_at(checkpoint, SyntaxKind::BinaryExpression);
            self.bump();
            self.parse_binary_expression(precedence);
            self.builder.finish_node();
        }
    }

    fn parse_postfix_expression(&mut self) {
        let checkpoint = self.builder.checkpoint();
        self.parse_primary_expression();
        loop {
            match self.current() {
                SyntaxKind::DotToken => {
                    self.builder.start_node_at(checkpoint, SyntaxKind::MemberAccessExpression);
                    self.bump();
                    self.parse_identifier_name();
                    self.builder.finish_node();
                }
                SyntaxKind::OpenParenToken => {
                    self.builder.start_node_at(checkpoint, SyntaxKind::InvocationExpression);
                    self.parse_argument_list();
                    self.builder.finish_node();
                }
                _ => break,
            }
        }
    }

    fn parse_argument_list(&mut self) {
        self.builder.start_node(SyntaxKind::ArgumentList);
        self.bump();
        if self.current() != SyntaxKind::CloseParenToken {
            loop {
                self.parse_expression();
                if self.current() != SyntaxKind::CommaToken {
                    break;
                }
                self.bump();
            }
        }
        self.expect(SyntaxKind::CloseParenToken);
        self.builder.finish_node();
    }

    fn parse_primary_expression(&mut self) {
        let literal = match self.current() {
            SyntaxKind::IdentifierToken => return self.parse_identifier_name(),
            SyntaxKind::FromKeyword => return self.parse_query_expression(),
            SyntaxKind::OpenParenToken => return self.parse_parenthesized_expression(),
            SyntaxKind::NumericLiteralToken => SyntaxKind::NumericLiteralExpression,
            SyntaxKind::StringLiteralToken => SyntaxKind::StringLiteralExpression,
            SyntaxKind::TrueKeyword => SyntaxKind::TrueLiteralExpression,
            SyntaxKind::FalseKeyword => SyntaxKind::FalseLiteralExpression,
            SyntaxKind::Unknown => {
                // Already reported by the scanner.
                return self.parse_missing_name();
            }
            kind => {
                let text = match kind {
                    SyntaxKind::EndOfFileToken => kind.display_text().to_string(),
                    _ => self.tokens[self.pos].text.clone(),
                };
                self.error_at_current(&messages::INVALID_EXPRESSION_TERM_0, &[&text]);
                return self.parse_missing_name();
            }
        };
        self.builder.start_node(literal);
        self.bump();
        self.builder.finish_node();
    }

    fn parse_identifier_name(&mut self) {
        self.builder.start_node(SyntaxKind::IdentifierName);
        self.expect(SyntaxKind::IdentifierToken);
        self.builder.finish_node();
    }

    /// An identifier name made of a missing token, standing in for an
    /// absent expression. Reports nothing.
    fn parse_missing_name(&mut self) {
        self.builder.start_node(SyntaxKind::IdentifierName);
        self.builder.missing_token(SyntaxKind::IdentifierToken);
        self.builder.finish_node();
    }

    fn parse_parenthesized_expression(&mut self) {
        self.builder.start_node(SyntaxKind::ParenthesizedExpression);
        self.bump();
        self.parse_expression();
        self.expect(SyntaxKind::CloseParenToken);
        self.builder.finish_node();
    }

    // ========================================================================
    // Query expressions
    // ========================================================================

    fn parse_query_expression(&mut self) {
        self.builder.start_node(SyntaxKind::QueryExpression);
        self.parse_from_clause();
        self.parse_query_body();
        self.builder.finish_node();
    }

    fn parse_query_body(&mut self) {
        self.builder.start_node(SyntaxKind::QueryBody);
        loop {
            match self.current() {
                SyntaxKind::FromKeyword => self.parse_from_clause(),
                SyntaxKind::WhereKeyword => self.parse_where_clause(),
                SyntaxKind::LetKeyword => self.parse_let_clause(),
                _ => break,
            }
        }
        match self.current() {
            SyntaxKind::SelectKeyword => self.parse_select_clause(),
            SyntaxKind::GroupKeyword => self.parse_group_clause(),
            _ => {
                let location = self.missing_location();
                self.diagnostics.report(
                    location,
                    &messages::A_QUERY_BODY_MUST_END_WITH_A_SELECT_CLAUSE_OR_A_GROUP_CLAUSE,
                    &[],
                );
                self.builder.start_node(SyntaxKind::SelectClause);
                self.builder.missing_token(SyntaxKind::SelectKeyword);
                self.parse_missing_name();
                self.builder.finish_node();
            }
        }
        if self.current() == SyntaxKind::YieldKeyword {
            self.parse_query_conclusion();
        }
        self.builder.finish_node();
    }

    fn parse_from_clause(&mut self) {
        self.builder.start_node(SyntaxKind::FromClause);
        self.bump();
        self.expect(SyntaxKind::IdentifierToken);
        self.expect(SyntaxKind::InKeyword);
        self.parse_expression();
        self.builder.finish_node();
    }

    fn parse_where_clause(&mut self) {
        self.builder.start_node(SyntaxKind::WhereClause);
        self.bump();
        self.parse_expression();
        self.builder.finish_node();
    }

    fn parse_let_clause(&mut self) {
        self.builder.start_node(SyntaxKind::LetClause);
        self.bump();
        self.expect(SyntaxKind::IdentifierToken);
        self.expect(SyntaxKind::EqualsToken);
        self.parse_expression();
        self.builder.finish_node();
    }

    fn parse_select_clause(&mut self) {
        self.builder.start_node(SyntaxKind::SelectClause);
        self.bump();
        self.parse_expression();
        self.builder.finish_node();
    }

    fn parse_group_clause(&mut self) {
        self.builder.start_node(SyntaxKind::GroupClause);
        self.bump();
        self.parse_expression();
        self.expect(SyntaxKind::ByKeyword);
        self.parse_expression();
        self.builder.finish_node();
    }

    /// `yield into identifier do expression`
    fn parse_query_conclusion(&mut self) {
        self.check_feature(Features::QUERY_CONCLUSIONS);
        self.builder.start_node(SyntaxKind::QueryConclusion);
        self.bump();
        self.expect(SyntaxKind::IntoKeyword);
        self.expect(SyntaxKind::IdentifierToken);
        self.expect(SyntaxKind::DoKeyword);
        self.parse_expression();
        self.builder.finish_node();
    }
}

/// Parse `source_text` with a fresh parser.
pub fn parse_text(
    file: FileId,
    file_name: &str,
    source_text: &str,
    options: &ParseOptions,
    interner: &StringInterner,
) -> (Arc<SyntaxTree>, DiagnosticCollection) {
    Parser::new(file, file_name, source_text, options, interner).parse()
}
