//! The quill scanner/lexer.
//!
//! Converts source text into a stream of tokens. Trivia (whitespace and
//! `//` comments) is skipped; spans are byte offsets into the source.

use quill_core::text::{FileId, Location, TextSpan};
use quill_diagnostics::{messages, DiagnosticCollection};
use quill_syntax::SyntaxKind;
use unicode_xid::UnicodeXID;

/// A scanned token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub kind: SyntaxKind,
    pub span: TextSpan,
    /// Source text of the token.
    pub text: String,
}

/// The scanner converts source text into tokens.
pub struct Scanner {
    file: FileId,
    /// The source text, one entry per char.
    text: Vec<char>,
    /// Byte offset of each char, plus the total length at the end.
    offsets: Vec<u32>,
    pos: usize,
    token_start: usize,
    diagnostics: DiagnosticCollection,
}

fn is_identifier_start(ch: char) -> bool {
    ch == '_' || ch.is_xid_start()
}

fn is_identifier_part(ch: char) -> bool {
    ch == '_' || ch.is_xid_continue()
}

impl Scanner {
    pub fn new(file: FileId, text: &str) -> Self {
        let mut chars = Vec::with_capacity(text.len());
        let mut offsets = Vec::with_capacity(text.len() + 1);
        for (offset, ch) in text.char_indices() {
            chars.push(ch);
            offsets.push(offset as u32);
        }
        offsets.push(text.len() as u32);
        Self {
            file,
            text: chars,
            offsets,
            pos: 0,
            token_start: 0,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    #[inline]
    fn peek(&self, ahead: usize) -> Option<char> {
        self.text.get(self.pos + ahead).copied()
    }

    fn span(&self) -> TextSpan {
        TextSpan::from_bounds(self.offsets[self.token_start], self.offsets[self.pos])
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek(0) {
            if ch.is_whitespace() {
                self.pos += 1;
            } else if ch == '/' && self.peek(1) == Some('/') {
                while let Some(c) = self.peek(0) {
                    if c == '\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    /// Scan the next token. Returns `EndOfFileToken` forever once the text
    /// is exhausted.
    pub fn scan(&mut self) -> TokenInfo {
        self.skip_trivia();
        self.token_start = self.pos;

        if self.is_eof() {
            return self.finish(SyntaxKind::EndOfFileToken);
        }

        let ch = self.text[self.pos];
        let kind = match ch {
            '(' => { self.pos += 1; SyntaxKind::OpenParenToken }
            ')' => { self.pos += 1; SyntaxKind::CloseParenToken }
            '{' => { self.pos += 1; SyntaxKind::OpenBraceToken }
            '}' => { self.pos += 1; SyntaxKind::CloseBraceToken }
            ';' => { self.pos += 1; SyntaxKind::SemicolonToken }
            ',' => { self.pos += 1; SyntaxKind::CommaToken }
            '.' => { self.pos += 1; SyntaxKind::DotToken }
            '+' => { self.pos += 1; SyntaxKind::PlusToken }
            '-' => { self.pos += 1; SyntaxKind::MinusToken }
            '*' => { self.pos += 1; SyntaxKind::AsteriskToken }
            '/' => { self.pos += 1; SyntaxKind::SlashToken }
            '=' => self.scan_with_equals(SyntaxKind::EqualsToken, SyntaxKind::EqualsEqualsToken),
            '<' => self.scan_with_equals(SyntaxKind::LessThanToken, SyntaxKind::LessThanEqualsToken),
            '>' => self.scan_with_equals(SyntaxKind::GreaterThanToken, SyntaxKind::GreaterThanEqualsToken),
            '!' if self.peek(1) == Some('=') => { self.pos += 2; SyntaxKind::ExclamationEqualsToken }
            '&' if self.peek(1) == Some('&') => { self.pos += 2; SyntaxKind::AmpersandAmpersandToken }
            '|' if self.peek(1) == Some('|') => { self.pos += 2; SyntaxKind::BarBarToken }
            '"' => self.scan_string_literal(),
            '0'..='9' => self.scan_number(),
            _ if is_identifier_start(ch) => self.scan_identifier(),
            _ => {
                self.pos += 1;
                let location = Location::new(self.file, self.span());
                self.diagnostics
                    .report(location, &messages::UNEXPECTED_CHARACTER_0, &[&ch.to_string()]);
                SyntaxKind::Unknown
            }
        };

        self.finish(kind)
    }

    fn finish(&self, kind: SyntaxKind) -> TokenInfo {
        TokenInfo {
            kind,
            span: self.span(),
            text: self.text[self.token_start..self.pos].iter().collect(),
        }
    }

    fn scan_with_equals(&mut self, single: SyntaxKind, with_equals: SyntaxKind) -> SyntaxKind {
        if self.peek(1) == Some('=') {
            self.pos += 2;
            with_equals
        } else {
            self.pos += 1;
            single
        }
    }

    fn scan_number(&mut self) -> SyntaxKind {
        while matches!(self.peek(0), Some('0'..='9')) {
            self.pos += 1;
        }
        if self.peek(0) == Some('.') && matches!(self.peek(1), Some('0'..='9')) {
            self.pos += 1;
            while matches!(self.peek(0), Some('0'..='9')) {
                self.pos += 1;
            }
        }
        SyntaxKind::NumericLiteralToken
    }

    fn scan_identifier(&mut self) -> SyntaxKind {
        while self.peek(0).is_some_and(is_identifier_part) {
            self.pos += 1;
        }
        let text: String = self.text[self.token_start..self.pos].iter().collect();
        SyntaxKind::from_keyword(&text).unwrap_or(SyntaxKind::IdentifierToken)
    }

    fn scan_string_literal(&mut self) -> SyntaxKind {
        // Opening quote.
        self.pos += 1;
        loop {
            match self.peek(0) {
                Some('"') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => self.pos += 2,
                Some('\n') | None => {
                    let location = Location::new(self.file, self.span());
                    self.diagnostics.report(location, &messages::NEWLINE_IN_CONSTANT, &[]);
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        self.pos = self.pos.min(self.text.len());
        SyntaxKind::StringLiteralToken
    }
}

/// Scan the whole text, ending with a single end-of-file token.
pub fn tokenize(file: FileId, text: &str) -> (Vec<TokenInfo>, DiagnosticCollection) {
    let mut scanner = Scanner::new(file, text);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.scan();
        let done = token.kind == SyntaxKind::EndOfFileToken;
        tokens.push(token);
        if done {
            break;
        }
    }
    (tokens, scanner.take_diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<SyntaxKind> {
        tokenize(FileId(0), text).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_scan_query_keywords() {
        assert_eq!(
            kinds("from x in xs select x yield into r do r"),
            vec![
                SyntaxKind::FromKeyword,
                SyntaxKind::IdentifierToken,
                SyntaxKind::InKeyword,
                SyntaxKind::IdentifierToken,
                SyntaxKind::SelectKeyword,
                SyntaxKind::IdentifierToken,
                SyntaxKind::YieldKeyword,
                SyntaxKind::IntoKeyword,
                SyntaxKind::IdentifierToken,
                SyntaxKind::DoKeyword,
                SyntaxKind::IdentifierToken,
                SyntaxKind::EndOfFileToken,
            ]
        );
    }

    #[test]
    fn test_scan_operators_and_comments() {
        assert_eq!(
            kinds("a <= b // trailing\n&& c != 1.5"),
            vec![
                SyntaxKind::IdentifierToken,
                SyntaxKind::LessThanEqualsToken,
                SyntaxKind::IdentifierToken,
                SyntaxKind::AmpersandAmpersandToken,
                SyntaxKind::IdentifierToken,
                SyntaxKind::ExclamationEqualsToken,
                SyntaxKind::NumericLiteralToken,
                SyntaxKind::EndOfFileToken,
            ]
        );
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let (tokens, _) = tokenize(FileId(0), "é x");
        assert_eq!(tokens[0].span, TextSpan::new(0, 2));
        assert_eq!(tokens[1].span, TextSpan::new(3, 1));
        assert_eq!(tokens[2].span, TextSpan::empty(4));
    }

    #[test]
    fn test_unexpected_character_reports_diagnostic() {
        let (tokens, diags) = tokenize(FileId(0), "a # b");
        assert_eq!(tokens[1].kind, SyntaxKind::Unknown);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.diagnostics()[0].message_text, "Unexpected character '#'.");
    }
}
