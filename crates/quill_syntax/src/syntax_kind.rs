//! SyntaxKind enum - all token and node kinds in the quill syntax tree.

/// The kind of a syntax token or node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum SyntaxKind {
    // ========================================================================
    // Tokens
    // ========================================================================
    Unknown = 0,
    EndOfFileToken,

    // Literals
    IdentifierToken,
    NumericLiteralToken,
    StringLiteralToken,

    // Punctuation
    OpenBraceToken,
    CloseBraceToken,
    OpenParenToken,
    CloseParenToken,
    DotToken,
    CommaToken,
    SemicolonToken,
    EqualsToken,
    EqualsEqualsToken,
    ExclamationEqualsToken,
    LessThanToken,
    LessThanEqualsToken,
    GreaterThanToken,
    GreaterThanEqualsToken,
    PlusToken,
    MinusToken,
    AsteriskToken,
    SlashToken,
    AmpersandAmpersandToken,
    BarBarToken,

    // Keywords
    VarKeyword,
    ReturnKeyword,
    YieldKeyword,
    BreakKeyword,
    DoKeyword,
    WhileKeyword,
    TrueKeyword,
    FalseKeyword,
    // Query keywords
    FromKeyword,
    InKeyword,
    WhereKeyword,
    LetKeyword,
    SelectKeyword,
    GroupKeyword,
    ByKeyword,
    IntoKeyword,

    // ========================================================================
    // Nodes
    // ========================================================================
    CompilationUnit,

    // Statements
    Block,
    LocalDeclarationStatement,
    ReturnStatement,
    YieldReturnStatement,
    YieldBreakStatement,
    DoStatement,
    ExpressionStatement,

    // Expressions
    IdentifierName,
    NumericLiteralExpression,
    StringLiteralExpression,
    TrueLiteralExpression,
    FalseLiteralExpression,
    ParenthesizedExpression,
    MemberAccessExpression,
    InvocationExpression,
    ArgumentList,
    BinaryExpression,

    // Query expressions
    QueryExpression,
    QueryBody,
    FromClause,
    WhereClause,
    LetClause,
    SelectClause,
    GroupClause,
    QueryConclusion,
}

impl SyntaxKind {
    pub const FIRST_PUNCTUATION: SyntaxKind = SyntaxKind::OpenBraceToken;
    pub const LAST_PUNCTUATION: SyntaxKind = SyntaxKind::BarBarToken;
    pub const FIRST_KEYWORD: SyntaxKind = SyntaxKind::VarKeyword;
    pub const LAST_KEYWORD: SyntaxKind = SyntaxKind::IntoKeyword;
    pub const FIRST_NODE: SyntaxKind = SyntaxKind::CompilationUnit;

    /// Whether this kind represents a keyword.
    #[inline]
    pub fn is_keyword(self) -> bool {
        let v = self as u16;
        v >= Self::FIRST_KEYWORD as u16 && v <= Self::LAST_KEYWORD as u16
    }

    /// Whether this kind represents a punctuation token.
    #[inline]
    pub fn is_punctuation(self) -> bool {
        let v = self as u16;
        v >= Self::FIRST_PUNCTUATION as u16 && v <= Self::LAST_PUNCTUATION as u16
    }

    #[inline]
    pub fn is_token(self) -> bool {
        (self as u16) < Self::FIRST_NODE as u16
    }

    #[inline]
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Identifiers and keywords: tokens the caret can sit "inside" while typing.
    #[inline]
    pub fn is_word(self) -> bool {
        self == SyntaxKind::IdentifierToken || self.is_keyword()
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::LocalDeclarationStatement
                | SyntaxKind::ReturnStatement
                | SyntaxKind::YieldReturnStatement
                | SyntaxKind::YieldBreakStatement
                | SyntaxKind::DoStatement
                | SyntaxKind::ExpressionStatement
        )
    }

    pub fn is_query_clause(self) -> bool {
        matches!(
            self,
            SyntaxKind::FromClause
                | SyntaxKind::WhereClause
                | SyntaxKind::LetClause
                | SyntaxKind::SelectClause
                | SyntaxKind::GroupClause
                | SyntaxKind::QueryConclusion
        )
    }

    /// Binary operator precedence; `None` for non-operators.
    pub fn binary_precedence(self) -> Option<u8> {
        match self {
            SyntaxKind::BarBarToken => Some(1),
            SyntaxKind::AmpersandAmpersandToken => Some(2),
            SyntaxKind::EqualsEqualsToken | SyntaxKind::ExclamationEqualsToken => Some(3),
            SyntaxKind::LessThanToken
            | SyntaxKind::LessThanEqualsToken
            | SyntaxKind::GreaterThanToken
            | SyntaxKind::GreaterThanEqualsToken => Some(4),
            SyntaxKind::PlusToken | SyntaxKind::MinusToken => Some(5),
            SyntaxKind::AsteriskToken | SyntaxKind::SlashToken => Some(6),
            _ => None,
        }
    }

    pub fn keyword_text(self) -> Option<&'static str> {
        match self {
            SyntaxKind::VarKeyword => Some("var"),
            SyntaxKind::ReturnKeyword => Some("return"),
            SyntaxKind::YieldKeyword => Some("yield"),
            SyntaxKind::BreakKeyword => Some("break"),
            SyntaxKind::DoKeyword => Some("do"),
            SyntaxKind::WhileKeyword => Some("while"),
            SyntaxKind::TrueKeyword => Some("true"),
            SyntaxKind::FalseKeyword => Some("false"),
            SyntaxKind::FromKeyword => Some("from"),
            SyntaxKind::InKeyword => Some("in"),
            SyntaxKind::WhereKeyword => Some("where"),
            SyntaxKind::LetKeyword => Some("let"),
            SyntaxKind::SelectKeyword => Some("select"),
            SyntaxKind::GroupKeyword => Some("group"),
            SyntaxKind::ByKeyword => Some("by"),
            SyntaxKind::IntoKeyword => Some("into"),
            _ => None,
        }
    }

    /// Look up a keyword SyntaxKind from text.
    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        match text {
            "var" => Some(SyntaxKind::VarKeyword),
            "return" => Some(SyntaxKind::ReturnKeyword),
            "yield" => Some(SyntaxKind::YieldKeyword),
            "break" => Some(SyntaxKind::BreakKeyword),
            "do" => Some(SyntaxKind::DoKeyword),
            "while" => Some(SyntaxKind::WhileKeyword),
            "true" => Some(SyntaxKind::TrueKeyword),
            "false" => Some(SyntaxKind::FalseKeyword),
            "from" => Some(SyntaxKind::FromKeyword),
            "in" => Some(SyntaxKind::InKeyword),
            "where" => Some(SyntaxKind::WhereKeyword),
            "let" => Some(SyntaxKind::LetKeyword),
            "select" => Some(SyntaxKind::SelectKeyword),
            "group" => Some(SyntaxKind::GroupKeyword),
            "by" => Some(SyntaxKind::ByKeyword),
            "into" => Some(SyntaxKind::IntoKeyword),
            _ => None,
        }
    }

    pub fn punctuation_text(self) -> Option<&'static str> {
        match self {
            SyntaxKind::OpenBraceToken => Some("{"),
            SyntaxKind::CloseBraceToken => Some("}"),
            SyntaxKind::OpenParenToken => Some("("),
            SyntaxKind::CloseParenToken => Some(")"),
            SyntaxKind::DotToken => Some("."),
            SyntaxKind::CommaToken => Some(","),
            SyntaxKind::SemicolonToken => Some(";"),
            SyntaxKind::EqualsToken => Some("="),
            SyntaxKind::EqualsEqualsToken => Some("=="),
            SyntaxKind::ExclamationEqualsToken => Some("!="),
            SyntaxKind::LessThanToken => Some("<"),
            SyntaxKind::LessThanEqualsToken => Some("<="),
            SyntaxKind::GreaterThanToken => Some(">"),
            SyntaxKind::GreaterThanEqualsToken => Some(">="),
            SyntaxKind::PlusToken => Some("+"),
            SyntaxKind::MinusToken => Some("-"),
            SyntaxKind::AsteriskToken => Some("*"),
            SyntaxKind::SlashToken => Some("/"),
            SyntaxKind::AmpersandAmpersandToken => Some("&&"),
            SyntaxKind::BarBarToken => Some("||"),
            _ => None,
        }
    }

    /// Display text for a token kind, used in "'{0}' expected." messages.
    pub fn display_text(self) -> &'static str {
        self.punctuation_text()
            .or_else(|| self.keyword_text())
            .unwrap_or(match self {
                SyntaxKind::IdentifierToken => "identifier",
                SyntaxKind::EndOfFileToken => "end of file",
                _ => "token",
            })
    }
}
