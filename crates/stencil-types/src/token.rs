//! Token types shared by the lexer, the parser and the syntax tree.

use crate::Span;
use std::fmt;

/// Which grammar a token was scanned under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenMode {
    Markup,
    Code,
    Directive,
}

/// All token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ── Markup ───────────────────────────────────────────────
    /// Literal markup text.
    Text,
    /// `<` opening a start tag.
    OpenAngle,
    /// `</`
    OpenAngleSlash,
    /// `>`
    CloseAngle,
    /// `/>`
    SlashCloseAngle,
    /// Tag or attribute name (also an unquoted attribute value).
    Name,
    /// `=` inside a tag.
    Equals,
    /// `"` delimiting an attribute value.
    DoubleQuote,
    /// `'` delimiting an attribute value.
    SingleQuote,
    /// `<!-- ... -->`
    HtmlComment,

    // ── Transitions ──────────────────────────────────────────
    /// `@`
    Transition,
    /// `@@` (literal `@`)
    EscapedTransition,
    /// `@* ... *@`
    RazorComment,
    /// `@:` (rest of the line is markup)
    MarkupLineTransition,

    // ── Code ─────────────────────────────────────────────────
    Identifier,
    StringLiteral,
    CharLiteral,
    NumberLiteral,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `::`
    DoubleColon,
    /// `?`
    Question,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// Any other operator character run.
    Operator,
    /// End of line in directive mode.
    NewLine,

    // ── Special ──────────────────────────────────────────────
    /// A character no rule accepts.
    Unknown,
    /// Zero-width token synthesized by error recovery.
    Missing,
    /// Zero-width token that only carries leading trivia.
    TriviaRun,
    Eof,
}

impl TokenKind {
    /// Zero-width kinds never consume source text of their own.
    pub fn is_zero_width(self) -> bool {
        matches!(self, Self::Missing | Self::TriviaRun | Self::Eof)
    }

    pub fn is_open_bracket(self) -> bool {
        matches!(self, Self::LParen | Self::LBrace | Self::LBracket)
    }

    pub fn is_close_bracket(self) -> bool {
        matches!(self, Self::RParen | Self::RBrace | Self::RBracket)
    }

    /// The closing bracket matching an opening one.
    pub fn closer(self) -> Option<TokenKind> {
        match self {
            Self::LParen => Some(Self::RParen),
            Self::LBrace => Some(Self::RBrace),
            Self::LBracket => Some(Self::RBracket),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::OpenAngle => "'<'",
            Self::OpenAngleSlash => "'</'",
            Self::CloseAngle => "'>'",
            Self::SlashCloseAngle => "'/>'",
            Self::Name => "name",
            Self::Equals => "'='",
            Self::DoubleQuote => "'\"'",
            Self::SingleQuote => "'''",
            Self::HtmlComment => "HTML comment",
            Self::Transition => "'@'",
            Self::EscapedTransition => "'@@'",
            Self::RazorComment => "comment",
            Self::MarkupLineTransition => "'@:'",
            Self::Identifier => "identifier",
            Self::StringLiteral => "string literal",
            Self::CharLiteral => "character literal",
            Self::NumberLiteral => "number",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::Dot => "'.'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::Colon => "':'",
            Self::DoubleColon => "'::'",
            Self::Question => "'?'",
            Self::LessThan => "'<'",
            Self::GreaterThan => "'>'",
            Self::Operator => "operator",
            Self::NewLine => "end of line",
            Self::Unknown => "unexpected character",
            Self::Missing => "missing token",
            Self::TriviaRun => "whitespace",
            Self::Eof => "end of file",
        };
        f.write_str(s)
    }
}

/// Kinds of trivia attached in front of code tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    Whitespace,
    NewLine,
    LineComment,
    BlockComment,
}

/// A lexical fault the lexer observed while scanning a token. The parser
/// turns these into diagnostics when it consumes the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexFault {
    UnterminatedString,
    UnterminatedChar,
    UnterminatedComment,
}

/// Whitespace or a comment preceding a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
    pub span: Span,
    pub fault: Option<LexFault>,
}

/// A token with its source text, span, mode and leading trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    pub mode: TokenMode,
    pub leading: Vec<Trivia>,
    pub fault: Option<LexFault>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span, mode: TokenMode) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            mode,
            leading: Vec::new(),
            fault: None,
        }
    }

    /// A zero-width `Missing` token at `span`'s start.
    pub fn missing(at: Span, mode: TokenMode) -> Self {
        Self::new(TokenKind::Missing, "", Span::point(at.offset, at.start_line, at.start_col), mode)
    }

    pub fn with_leading(mut self, leading: Vec<Trivia>) -> Self {
        self.leading = leading;
        self
    }

    pub fn with_fault(mut self, fault: LexFault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Identifier with exactly this text.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }

    /// Span covering leading trivia and the token text.
    pub fn full_span(&self) -> Span {
        match self.leading.first() {
            Some(first) => first.span.merge(self.span),
            None => self.span,
        }
    }

    /// Leading trivia followed by the token text.
    pub fn full_text(&self) -> String {
        let mut out = String::new();
        self.write_full_text(&mut out);
        out
    }

    pub fn write_full_text(&self, out: &mut String) {
        for t in &self.leading {
            out.push_str(&t.text);
        }
        out.push_str(&self.text);
    }

    /// Faults of the token and of its trivia, in source order.
    pub fn faults(&self) -> impl Iterator<Item = (LexFault, Span)> + '_ {
        self.leading
            .iter()
            .filter_map(|t| t.fault.map(|f| (f, t.span)))
            .chain(self.fault.map(|f| (f, self.span)))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof | TokenKind::Missing | TokenKind::TriviaRun | TokenKind::NewLine => {
                write!(f, "{}", self.kind)
            }
            _ => write!(f, "'{}'", self.text),
        }
    }
}
