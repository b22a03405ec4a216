//! Mode-aware stencil lexer.
//!
//! The grammar switches between markup and code at every `@`, so the lexer
//! does not pre-tokenize the file. It is a cursor that the parser drives:
//! each call names the [`LexMode`] the parser is in, and the lexer scans
//! exactly one token under that mode's rules.
//!
//! Features:
//! - Markup content, tags, quoted and unquoted attribute values, `@:` lines
//! - Code and directive scanning with C#-style literals
//! - Whitespace and comments in code attached as leading trivia
//! - `@@` escapes, `@* *@` comments, and the e-mail rule (`a@b` is text)
//! - Lexical faults (unterminated literals/comments) recorded on the token;
//!   the lexer itself never fails

use stencil_types::token::{LexFault, Trivia, TriviaKind};
use stencil_types::{Diagnostic, Diagnostics, ErrorCode, SourceFile, Token, TokenKind, TokenMode};

/// Scanning rules the parser asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexMode {
    /// Content between tags.
    Markup,
    /// Inside `<...>`. With `directive_attributes`, `@name` is one
    /// attribute name; otherwise `@` is a transition.
    Tag { directive_attributes: bool },
    /// Inside a quoted attribute value delimited by `quote`.
    AttributeValue(char),
    /// Unquoted attribute value.
    UnquotedValue,
    /// Markup after `@:`, up to and including the line break.
    MarkupLine,
    /// Host-language code. Whitespace, newlines and comments are trivia.
    Code,
    /// Directive tokens. Only spaces and tabs are trivia; line breaks are
    /// `NewLine` tokens.
    Directive,
}

impl LexMode {
    /// The coarse mode recorded on tokens.
    pub fn token_mode(self) -> TokenMode {
        match self {
            Self::Code => TokenMode::Code,
            Self::Directive => TokenMode::Directive,
            _ => TokenMode::Markup,
        }
    }
}

/// Result of whole-input lexing: tokens + diagnostics for lexical faults.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: Diagnostics,
}

/// The stencil lexer.
pub struct Lexer<'src> {
    source: &'src str,
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: &source_file.source,
            source_file,
            pos: 0,
        }
    }

    pub fn source_file(&self) -> &'src SourceFile {
        self.source_file
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Unconsumed text.
    pub fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    /// The character at the cursor, before any trivia.
    pub fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The `n`-th character after the cursor (0-based).
    pub fn peek_char_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Scan the next token without consuming it.
    pub fn peek(&self, mode: LexMode) -> Token {
        self.scan(self.pos, mode).0
    }

    /// Scan the `n`-th token ahead (0-based) under one mode.
    pub fn peek_nth(&self, mode: LexMode, n: usize) -> Token {
        let mut pos = self.pos;
        let mut tok = self.scan(pos, mode);
        for _ in 0..n {
            if tok.0.kind == TokenKind::Eof {
                break;
            }
            pos = tok.1;
            tok = self.scan(pos, mode);
        }
        tok.0
    }

    /// Consume and return the next token.
    pub fn bump(&mut self, mode: LexMode) -> Token {
        let (tok, next) = self.scan(self.pos, mode);
        self.pos = next;
        tok
    }

    /// Consume pending trivia as a zero-width `TriviaRun` token, if any.
    /// Used before handing the cursor to a mode with different trivia rules.
    pub fn bump_trivia(&mut self, mode: LexMode) -> Option<Token> {
        let (leading, end) = self.scan_trivia(self.pos, mode);
        if leading.is_empty() {
            return None;
        }
        self.pos = end;
        Some(
            Token::new(
                TokenKind::TriviaRun,
                "",
                self.source_file.span(end, 0),
                mode.token_mode(),
            )
            .with_leading(leading),
        )
    }

    /// Lex the remaining input under one mode.
    pub fn lex_all(mut self, mode: LexMode) -> LexResult {
        let mut tokens = Vec::new();
        let mut errors = Diagnostics::empty();
        loop {
            let tok = self.bump(mode);
            for (fault, span) in tok.faults() {
                errors.push(fault_diagnostic(self.source_file, fault, span));
            }
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        LexResult { tokens, errors }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn char_at(&self, offset: usize) -> Option<char> {
        self.source.get(offset..)?.chars().next()
    }

    fn char_before(&self, offset: usize) -> Option<char> {
        self.source.get(..offset)?.chars().next_back()
    }

    fn make(&self, kind: TokenKind, start: usize, end: usize, mode: TokenMode) -> Token {
        Token::new(
            kind,
            &self.source[start..end],
            self.source_file.span(start, end - start),
            mode,
        )
    }

    /// `a@b` between alphanumerics is literal text.
    fn is_email_at(&self, offset: usize) -> bool {
        self.char_before(offset).is_some_and(|c| c.is_alphanumeric())
            && self.char_at(offset + 1).is_some_and(|c| c.is_alphanumeric())
    }

    fn scan(&self, start: usize, mode: LexMode) -> (Token, usize) {
        match mode {
            LexMode::Markup => self.scan_markup(start, false),
            LexMode::MarkupLine => self.scan_markup(start, true),
            LexMode::Tag {
                directive_attributes,
            } => self.scan_tag(start, directive_attributes),
            LexMode::AttributeValue(quote) => self.scan_attribute_value(start, quote),
            LexMode::UnquotedValue => self.scan_unquoted_value(start),
            LexMode::Code => self.scan_code(start, false),
            LexMode::Directive => self.scan_code(start, true),
        }
    }

    fn eof(&self, start: usize, mode: TokenMode) -> (Token, usize) {
        (self.make(TokenKind::Eof, start, start, mode), start)
    }

    // ─────────────────────────────────────────────────────────────
    // Trivia
    // ─────────────────────────────────────────────────────────────

    fn scan_trivia(&self, start: usize, mode: LexMode) -> (Vec<Trivia>, usize) {
        let mut out = Vec::new();
        let mut pos = start;
        let bytes = self.source.as_bytes();
        loop {
            let item_start = pos;
            let (kind, fault) = match bytes.get(pos) {
                Some(b' ' | b'\t') => {
                    while matches!(bytes.get(pos), Some(b' ' | b'\t')) {
                        pos += 1;
                    }
                    (TriviaKind::Whitespace, None)
                }
                Some(b'\r') if mode == LexMode::Directive && bytes.get(pos + 1) == Some(&b'\n') => {
                    break;
                }
                Some(b'\r') => {
                    pos += 1;
                    if bytes.get(pos) == Some(&b'\n') {
                        pos += 1;
                        (TriviaKind::NewLine, None)
                    } else {
                        (TriviaKind::Whitespace, None)
                    }
                }
                Some(b'\n') if mode != LexMode::Directive => {
                    pos += 1;
                    (TriviaKind::NewLine, None)
                }
                Some(b'/') if mode == LexMode::Code && bytes.get(pos + 1) == Some(&b'/') => {
                    while !matches!(bytes.get(pos), None | Some(b'\n' | b'\r')) {
                        pos += 1;
                    }
                    (TriviaKind::LineComment, None)
                }
                Some(b'/') if mode == LexMode::Code && bytes.get(pos + 1) == Some(&b'*') => {
                    match self.source[pos + 2..].find("*/") {
                        Some(i) => {
                            pos += 2 + i + 2;
                            (TriviaKind::BlockComment, None)
                        }
                        None => {
                            pos = self.source.len();
                            (TriviaKind::BlockComment, Some(LexFault::UnterminatedComment))
                        }
                    }
                }
                _ => break,
            };
            out.push(Trivia {
                kind,
                text: self.source[item_start..pos].to_string(),
                span: self.source_file.span(item_start, pos - item_start),
                fault,
            });
        }
        (out, pos)
    }

    // ─────────────────────────────────────────────────────────────
    // Transitions and comments shared by every markup mode
    // ─────────────────────────────────────────────────────────────

    /// `@@`, `@* ... *@`, or a bare `@` at `start`.
    fn scan_at_sign(&self, start: usize, mode: TokenMode) -> (Token, usize) {
        match self.char_at(start + 1) {
            Some('@') => (
                self.make(TokenKind::EscapedTransition, start, start + 2, mode),
                start + 2,
            ),
            Some('*') => self.scan_razor_comment(start, mode),
            _ => (
                self.make(TokenKind::Transition, start, start + 1, mode),
                start + 1,
            ),
        }
    }

    fn scan_razor_comment(&self, start: usize, mode: TokenMode) -> (Token, usize) {
        match self.source[start + 2..].find("*@") {
            Some(i) => {
                let end = start + 2 + i + 2;
                (self.make(TokenKind::RazorComment, start, end, mode), end)
            }
            None => {
                let end = self.source.len();
                let tok = self
                    .make(TokenKind::RazorComment, start, end, mode)
                    .with_fault(LexFault::UnterminatedComment);
                (tok, end)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Markup content
    // ─────────────────────────────────────────────────────────────

    fn scan_markup(&self, start: usize, line: bool) -> (Token, usize) {
        let mode = TokenMode::Markup;
        let rest = &self.source[start..];
        let Some(c) = rest.chars().next() else {
            return self.eof(start, mode);
        };
        match c {
            '\n' if line => (self.make(TokenKind::NewLine, start, start + 1, mode), start + 1),
            '\r' if line && rest.starts_with("\r\n") => {
                (self.make(TokenKind::NewLine, start, start + 2, mode), start + 2)
            }
            '<' if rest.starts_with("<!--") => {
                let (end, fault) = match rest[4..].find("-->") {
                    Some(i) => (start + 4 + i + 3, None),
                    None => (self.source.len(), Some(LexFault::UnterminatedComment)),
                };
                let mut tok = self.make(TokenKind::HtmlComment, start, end, mode);
                tok.fault = fault;
                (tok, end)
            }
            '<' => {
                let next = rest[1..].chars().next();
                match next {
                    Some('/') if rest[2..].chars().next().is_some_and(is_tag_name_start) => (
                        self.make(TokenKind::OpenAngleSlash, start, start + 2, mode),
                        start + 2,
                    ),
                    Some(n) if is_tag_name_start(n) => (
                        self.make(TokenKind::OpenAngle, start, start + 1, mode),
                        start + 1,
                    ),
                    // `<!DOCTYPE ...>` and `<?...?>` pass through as text.
                    Some('!' | '?') => {
                        let end = rest.find('>').map(|i| start + i + 1).unwrap_or(self.source.len());
                        (self.make(TokenKind::Text, start, end, mode), end)
                    }
                    _ => self.scan_text(start, line),
                }
            }
            '@' if !self.is_email_at(start) => self.scan_at_sign(start, mode),
            _ => self.scan_text(start, line),
        }
    }

    /// Literal text up to the next `<`, transition, or (in line mode) line
    /// break. The first character is always consumed.
    fn scan_text(&self, start: usize, line: bool) -> (Token, usize) {
        let mut pos = start;
        let mut first = true;
        for (i, c) in self.source[start..].char_indices() {
            let at = start + i;
            if !first {
                let stop = match c {
                    '<' => true,
                    '@' => !self.is_email_at(at),
                    '\n' | '\r' => line,
                    _ => false,
                };
                if stop {
                    break;
                }
            }
            first = false;
            pos = at + c.len_utf8();
        }
        (self.make(TokenKind::Text, start, pos, TokenMode::Markup), pos)
    }

    // ─────────────────────────────────────────────────────────────
    // Tags and attribute values
    // ─────────────────────────────────────────────────────────────

    fn scan_tag(&self, start: usize, directive_attributes: bool) -> (Token, usize) {
        let mode = TokenMode::Markup;
        let (leading, pos) = self.scan_tag_trivia(start);
        let rest = &self.source[pos..];
        let (tok, end) = match rest.chars().next() {
            None => self.eof(pos, mode),
            Some('>') => (self.make(TokenKind::CloseAngle, pos, pos + 1, mode), pos + 1),
            Some('/') if rest.starts_with("/>") => (
                self.make(TokenKind::SlashCloseAngle, pos, pos + 2, mode),
                pos + 2,
            ),
            Some('=') => (self.make(TokenKind::Equals, pos, pos + 1, mode), pos + 1),
            Some('"') => (self.make(TokenKind::DoubleQuote, pos, pos + 1, mode), pos + 1),
            Some('\'') => (self.make(TokenKind::SingleQuote, pos, pos + 1, mode), pos + 1),
            Some('<') => (self.make(TokenKind::OpenAngle, pos, pos + 1, mode), pos + 1),
            Some('@') => {
                let next = self.char_at(pos + 1);
                if next == Some('*') {
                    self.scan_razor_comment(pos, mode)
                } else if directive_attributes && next.is_some_and(|c| c.is_alphabetic() || c == '_')
                {
                    self.scan_attribute_name(pos)
                } else {
                    self.scan_at_sign(pos, mode)
                }
            }
            Some(_) => self.scan_attribute_name(pos),
        };
        (tok.with_leading(leading), end)
    }

    fn scan_tag_trivia(&self, start: usize) -> (Vec<Trivia>, usize) {
        let mut out = Vec::new();
        let mut pos = start;
        let bytes = self.source.as_bytes();
        loop {
            let item_start = pos;
            let kind = match bytes.get(pos) {
                Some(b' ' | b'\t') => {
                    while matches!(bytes.get(pos), Some(b' ' | b'\t')) {
                        pos += 1;
                    }
                    TriviaKind::Whitespace
                }
                Some(b'\r') if bytes.get(pos + 1) == Some(&b'\n') => {
                    pos += 2;
                    TriviaKind::NewLine
                }
                Some(b'\n') => {
                    pos += 1;
                    TriviaKind::NewLine
                }
                Some(b'\r') => {
                    pos += 1;
                    TriviaKind::Whitespace
                }
                _ => break,
            };
            out.push(Trivia {
                kind,
                text: self.source[item_start..pos].to_string(),
                span: self.source_file.span(item_start, pos - item_start),
                fault: None,
            });
        }
        (out, pos)
    }

    /// Tag or attribute name. The first character is always consumed.
    fn scan_attribute_name(&self, start: usize) -> (Token, usize) {
        let mut end = start;
        for (i, c) in self.source[start..].char_indices() {
            let at = start + i;
            if i > 0 {
                let stop = c.is_whitespace()
                    || matches!(c, '>' | '=' | '"' | '\'' | '<' | '@')
                    || (c == '/' && self.char_at(at + 1) == Some('>'));
                if stop {
                    break;
                }
            }
            end = at + c.len_utf8();
        }
        (self.make(TokenKind::Name, start, end, TokenMode::Markup), end)
    }

    fn scan_attribute_value(&self, start: usize, quote: char) -> (Token, usize) {
        let mode = TokenMode::Markup;
        let Some(c) = self.char_at(start) else {
            return self.eof(start, mode);
        };
        if c == quote {
            let kind = if quote == '\'' {
                TokenKind::SingleQuote
            } else {
                TokenKind::DoubleQuote
            };
            return (self.make(kind, start, start + 1, mode), start + 1);
        }
        if c == '@' && !self.is_email_at(start) {
            return self.scan_at_sign(start, mode);
        }
        let mut end = start;
        for (i, c) in self.source[start..].char_indices() {
            let at = start + i;
            if i > 0 && (c == quote || (c == '@' && !self.is_email_at(at))) {
                break;
            }
            end = at + c.len_utf8();
        }
        (self.make(TokenKind::Text, start, end, mode), end)
    }

    fn scan_unquoted_value(&self, start: usize) -> (Token, usize) {
        let mode = TokenMode::Markup;
        let Some(c) = self.char_at(start) else {
            return self.eof(start, mode);
        };
        if c == '@' && !self.is_email_at(start) {
            return self.scan_at_sign(start, mode);
        }
        let mut end = start;
        for (i, c) in self.source[start..].char_indices() {
            let at = start + i;
            if i > 0 {
                let stop = c.is_whitespace()
                    || c == '>'
                    || (c == '/' && self.char_at(at + 1) == Some('>'))
                    || (c == '@' && !self.is_email_at(at));
                if stop {
                    break;
                }
            }
            end = at + c.len_utf8();
        }
        (self.make(TokenKind::Text, start, end, mode), end)
    }

    // ─────────────────────────────────────────────────────────────
    // Code and directive scanning
    // ─────────────────────────────────────────────────────────────

    fn scan_code(&self, start: usize, directive: bool) -> (Token, usize) {
        let lex_mode = if directive {
            LexMode::Directive
        } else {
            LexMode::Code
        };
        let mode = lex_mode.token_mode();
        let (leading, pos) = self.scan_trivia(start, lex_mode);
        let rest = &self.source[pos..];
        let Some(c) = rest.chars().next() else {
            let (tok, end) = self.eof(pos, mode);
            return (tok.with_leading(leading), end);
        };
        let single = |kind: TokenKind| (self.make(kind, pos, pos + 1, mode), pos + 1);
        let (tok, end) = match c {
            '\n' => single(TokenKind::NewLine),
            '\r' => (self.make(TokenKind::NewLine, pos, pos + 2, mode), pos + 2),
            '@' => match self.char_at(pos + 1) {
                Some(':') => (
                    self.make(TokenKind::MarkupLineTransition, pos, pos + 2, mode),
                    pos + 2,
                ),
                Some('*') => self.scan_razor_comment(pos, mode),
                Some('"') => self.scan_string(pos, pos + 2, true, false, mode),
                Some('$') if self.char_at(pos + 2) == Some('"') => {
                    self.scan_string(pos, pos + 3, true, true, mode)
                }
                Some(n) if n.is_alphabetic() || n == '_' => self.scan_identifier(pos, pos + 1, mode),
                _ => single(TokenKind::Transition),
            },
            '$' if rest.starts_with("$@\"") => {
                self.scan_string(pos, pos + 3, true, true, mode)
            }
            '$' if rest.starts_with("$\"") => self.scan_string(pos, pos + 2, false, true, mode),
            '"' => self.scan_string(pos, pos + 1, false, false, mode),
            '\'' => self.scan_char(pos, mode),
            c if c.is_alphabetic() || c == '_' => self.scan_identifier(pos, pos, mode),
            c if c.is_ascii_digit() => self.scan_number(pos, mode),
            '(' => single(TokenKind::LParen),
            ')' => single(TokenKind::RParen),
            '{' => single(TokenKind::LBrace),
            '}' => single(TokenKind::RBrace),
            '[' => single(TokenKind::LBracket),
            ']' => single(TokenKind::RBracket),
            '.' if self.char_at(pos + 1).is_some_and(|n| n.is_ascii_digit()) => {
                self.scan_number(pos, mode)
            }
            '.' => single(TokenKind::Dot),
            ',' => single(TokenKind::Comma),
            ';' => single(TokenKind::Semicolon),
            ':' if rest.starts_with("::") => {
                (self.make(TokenKind::DoubleColon, pos, pos + 2, mode), pos + 2)
            }
            ':' => single(TokenKind::Colon),
            '?' => single(TokenKind::Question),
            '=' if rest.starts_with("=>") => {
                (self.make(TokenKind::Operator, pos, pos + 2, mode), pos + 2)
            }
            '<' => single(TokenKind::LessThan),
            '>' => single(TokenKind::GreaterThan),
            c if is_operator_char(c) => {
                let mut end = pos;
                for (i, c) in rest.char_indices() {
                    let tail = &rest[i..];
                    if !is_operator_char(c) || (i > 0 && (tail.starts_with("//") || tail.starts_with("/*"))) {
                        break;
                    }
                    end = pos + i + c.len_utf8();
                }
                (self.make(TokenKind::Operator, pos, end, mode), end)
            }
            c => (
                self.make(TokenKind::Unknown, pos, pos + c.len_utf8(), mode),
                pos + c.len_utf8(),
            ),
        };
        (tok.with_leading(leading), end)
    }

    fn scan_identifier(&self, start: usize, body: usize, mode: TokenMode) -> (Token, usize) {
        let mut end = body;
        for c in self.source[body..].chars() {
            if c.is_alphanumeric() || c == '_' {
                end += c.len_utf8();
            } else {
                break;
            }
        }
        (self.make(TokenKind::Identifier, start, end, mode), end)
    }

    fn scan_number(&self, start: usize, mode: TokenMode) -> (Token, usize) {
        let bytes = self.source.as_bytes();
        let mut end = start;
        loop {
            match bytes.get(end) {
                Some(b) if b.is_ascii_alphanumeric() || *b == b'_' => end += 1,
                Some(b'.') if bytes.get(end + 1).is_some_and(|b| b.is_ascii_digit()) => end += 1,
                _ => break,
            }
        }
        (self.make(TokenKind::NumberLiteral, start, end, mode), end)
    }

    /// String literal from `start`; `body` is the offset after the opening
    /// quote.
    fn scan_string(
        &self,
        start: usize,
        body: usize,
        verbatim: bool,
        interpolated: bool,
        mode: TokenMode,
    ) -> (Token, usize) {
        let (end, fault) = self.string_end(body, verbatim, interpolated);
        let mut tok = self.make(TokenKind::StringLiteral, start, end, mode);
        tok.fault = fault;
        (tok, end)
    }

    /// Offset just past the closing quote. Regular strings stop before a
    /// line break when unterminated.
    fn string_end(&self, body: usize, verbatim: bool, interpolated: bool) -> (usize, Option<LexFault>) {
        let bytes = self.source.as_bytes();
        let len = bytes.len();
        let mut i = body;
        let mut depth = 0u32;
        loop {
            match bytes.get(i) {
                None => return (len, Some(LexFault::UnterminatedString)),
                Some(b'\n' | b'\r') if !verbatim && depth == 0 => {
                    return (i, Some(LexFault::UnterminatedString));
                }
                Some(b'\\') if !verbatim && depth == 0 => i = (i + 2).min(len),
                Some(b'"') if depth > 0 => {
                    let (end, fault) = self.string_end(i + 1, false, false);
                    if fault.is_some() {
                        return (end, fault);
                    }
                    i = end;
                }
                Some(b'"') if verbatim && bytes.get(i + 1) == Some(&b'"') => i += 2,
                Some(b'"') => return (i + 1, None),
                Some(b'{') if interpolated && depth == 0 && bytes.get(i + 1) == Some(&b'{') => {
                    i += 2
                }
                Some(b'{') if interpolated => {
                    depth += 1;
                    i += 1;
                }
                Some(b'}') if interpolated && depth > 0 => {
                    depth -= 1;
                    i += 1;
                }
                Some(_) => i += 1,
            }
        }
    }

    fn scan_char(&self, start: usize, mode: TokenMode) -> (Token, usize) {
        let bytes = self.source.as_bytes();
        let len = bytes.len();
        let mut i = start + 1;
        let fault = loop {
            match bytes.get(i) {
                None | Some(b'\n' | b'\r') => break Some(LexFault::UnterminatedChar),
                Some(b'\\') => i = (i + 2).min(len),
                Some(b'\'') => {
                    i += 1;
                    break None;
                }
                Some(_) => i += 1,
            }
        };
        // Stay on a character boundary after skipping an escaped multi-byte
        // character.
        while !self.source.is_char_boundary(i) {
            i += 1;
        }
        let mut tok = self.make(TokenKind::CharLiteral, start, i, mode);
        tok.fault = fault;
        (tok, i)
    }
}

fn is_tag_name_start(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '%' | '=' | '!' | '&' | '|' | '^' | '~')
}

/// Error code for a lexical fault.
pub fn fault_code(fault: LexFault) -> ErrorCode {
    match fault {
        LexFault::UnterminatedString | LexFault::UnterminatedChar => ErrorCode::UNTERMINATED_STRING,
        LexFault::UnterminatedComment => ErrorCode::UNTERMINATED_COMMENT,
    }
}

/// Diagnostic for a lexical fault observed at `span`.
pub fn fault_diagnostic(
    source: &SourceFile,
    fault: LexFault,
    span: stencil_types::Span,
) -> Diagnostic {
    Diagnostic::new(source, fault_code(fault), std::iter::empty::<String>(), span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_consume() {
        let sf = SourceFile::new("t.stencil", "<p>");
        let lexer = Lexer::new(&sf);
        assert_eq!(lexer.peek(LexMode::Markup).kind, TokenKind::OpenAngle);
        assert_eq!(lexer.peek(LexMode::Markup).kind, TokenKind::OpenAngle);
        assert_eq!(lexer.pos(), 0);
    }

    #[test]
    fn test_peek_nth() {
        let sf = SourceFile::new("t.stencil", "a.b(c)");
        let lexer = Lexer::new(&sf);
        assert_eq!(lexer.peek_nth(LexMode::Code, 1).kind, TokenKind::Dot);
        assert_eq!(lexer.peek_nth(LexMode::Code, 3).kind, TokenKind::LParen);
        assert_eq!(lexer.peek_nth(LexMode::Code, 40).kind, TokenKind::Eof);
    }

    #[test]
    fn test_bump_trivia() {
        let sf = SourceFile::new("t.stencil", "  // note\n}");
        let mut lexer = Lexer::new(&sf);
        let run = lexer.bump_trivia(LexMode::Code).unwrap();
        assert_eq!(run.kind, TokenKind::TriviaRun);
        assert_eq!(run.full_text(), "  // note\n");
        assert_eq!(lexer.peek_char(), Some('}'));
        assert!(lexer.bump_trivia(LexMode::Code).is_none());
    }

    #[test]
    fn test_directive_mode_keeps_newlines() {
        let sf = SourceFile::new("t.stencil", " Foo\r\nbar");
        let mut lexer = Lexer::new(&sf);
        let ident = lexer.bump(LexMode::Directive);
        assert_eq!(ident.full_text(), " Foo");
        let nl = lexer.bump(LexMode::Directive);
        assert_eq!(nl.kind, TokenKind::NewLine);
        assert_eq!(nl.text, "\r\n");
    }

    #[test]
    fn test_fault_codes() {
        assert_eq!(fault_code(LexFault::UnterminatedChar), ErrorCode::UNTERMINATED_STRING);
        assert_eq!(fault_code(LexFault::UnterminatedComment), ErrorCode::UNTERMINATED_COMMENT);
    }
}
