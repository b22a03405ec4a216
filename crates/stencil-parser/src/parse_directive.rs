//! Directive parsing, driven by the registry's descriptors.

use stencil_lexer::LexMode;
use stencil_types::{
    DirectiveDescriptor, DirectiveKind, DirectiveTokenDescriptor, DirectiveTokenKind, ErrorCode,
    SyntaxKind, TokenKind,
};

use crate::parser::Parser;

const DIRECTIVE: LexMode = LexMode::Directive;

impl<'src> Parser<'src> {
    /// `@name token... [;]` to the end of the line, or `@name { ... }`.
    pub(crate) fn parse_directive(&mut self, mode: LexMode, descriptor: &DirectiveDescriptor) {
        self.start(SyntaxKind::Directive);
        self.bump(mode);
        let keyword = self.bump(DIRECTIVE);

        for token in &descriptor.tokens {
            self.parse_directive_token(&descriptor.name, token);
        }

        match descriptor.kind {
            DirectiveKind::SingleLine => {
                if descriptor.allow_trailing_separator {
                    self.eat(DIRECTIVE, TokenKind::Semicolon);
                }
                self.finish_directive_line(&descriptor.name);
            }
            DirectiveKind::CodeBlock => {
                if self.at(LexMode::Code, TokenKind::LBrace) {
                    self.parse_braced_body();
                } else {
                    self.error_here(
                        ErrorCode::DIRECTIVE_BLOCK_MISSING,
                        [descriptor.name.as_str()],
                        keyword.span,
                    );
                    self.push_missing(LexMode::Code);
                }
            }
        }
        self.finish();
    }

    /// An unregistered directive: keep the whole line so it round-trips.
    pub(crate) fn parse_unknown_directive(&mut self, mode: LexMode) {
        self.start(SyntaxKind::Directive);
        self.bump(mode);
        let keyword = self.bump(DIRECTIVE);
        self.error_here(ErrorCode::UNKNOWN_DIRECTIVE, [keyword.text.as_str()], keyword.span);
        self.skip_to_line_end();
        self.finish();
    }

    fn parse_directive_token(&mut self, directive: &str, token: &DirectiveTokenDescriptor) {
        let next = self.peek_kind(DIRECTIVE);
        let present = match token.kind {
            DirectiveTokenKind::Namespace | DirectiveTokenKind::Member => {
                next == TokenKind::Identifier
            }
            DirectiveTokenKind::Type => matches!(next, TokenKind::Identifier | TokenKind::LParen),
            DirectiveTokenKind::String => next == TokenKind::StringLiteral,
        };
        if !present {
            if token.optional {
                return;
            }
            self.start(SyntaxKind::DirectiveToken);
            let at = self.cursor_span();
            self.error_here(
                ErrorCode::DIRECTIVE_TOKEN_MISSING,
                [directive.to_string(), token.kind.to_string()],
                at,
            );
            self.push_missing(DIRECTIVE);
            self.finish();
            return;
        }

        self.start(SyntaxKind::DirectiveToken);
        match token.kind {
            DirectiveTokenKind::Namespace => self.parse_namespace_shape(),
            DirectiveTokenKind::Type => self.parse_type_shape(),
            DirectiveTokenKind::Member | DirectiveTokenKind::String => {
                self.bump(DIRECTIVE);
            }
        }
        self.finish();
    }

    /// Anything left on the line is E202; the line break belongs to the
    /// directive.
    fn finish_directive_line(&mut self, directive: &str) {
        match self.peek_kind(DIRECTIVE) {
            TokenKind::NewLine => {
                self.bump(DIRECTIVE);
            }
            TokenKind::Eof => self.flush_trivia(DIRECTIVE),
            _ => {
                let extra = self.peek(DIRECTIVE);
                let text = self.rest_of_line(extra.span.offset).trim_end().to_string();
                self.start(SyntaxKind::Error);
                self.error_here(
                    ErrorCode::UNEXPECTED_DIRECTIVE_CONTENT,
                    [directive.to_string(), text],
                    extra.span,
                );
                while !matches!(self.peek_kind(DIRECTIVE), TokenKind::NewLine | TokenKind::Eof) {
                    self.bump(DIRECTIVE);
                }
                self.finish();
                self.skip_to_line_end();
            }
        }
    }

    fn skip_to_line_end(&mut self) {
        loop {
            match self.peek_kind(DIRECTIVE) {
                TokenKind::NewLine => {
                    self.bump(DIRECTIVE);
                    return;
                }
                TokenKind::Eof => {
                    self.flush_trivia(DIRECTIVE);
                    return;
                }
                _ => {
                    self.bump(DIRECTIVE);
                }
            }
        }
    }

    // ── Token Shapes ──────────────────────────────────────────────────────────

    /// `A.B.C`, `static A.B`, or `Alias = A.B<C>`.
    fn parse_namespace_shape(&mut self) {
        if self.at_word(DIRECTIVE, "static") && self.peek_nth_kind(DIRECTIVE, 1) == TokenKind::Identifier {
            self.bump(DIRECTIVE);
        }
        self.bump(DIRECTIVE);
        if self.peek(DIRECTIVE).text == "=" {
            self.bump(DIRECTIVE);
            self.parse_type_shape();
            return;
        }
        self.parse_qualified_tail();
    }

    /// `global::A.B<C, D<E>>[]?` or a tuple `(int, string)`.
    fn parse_type_shape(&mut self) {
        match self.peek_kind(DIRECTIVE) {
            TokenKind::LParen => {
                self.parse_directive_group(TokenKind::LParen, TokenKind::RParen);
            }
            TokenKind::Identifier => {
                self.bump(DIRECTIVE);
            }
            _ => return,
        }
        loop {
            match self.peek_kind(DIRECTIVE) {
                TokenKind::Dot | TokenKind::DoubleColon
                    if self.peek_nth_kind(DIRECTIVE, 1) == TokenKind::Identifier =>
                {
                    self.bump(DIRECTIVE);
                    self.bump(DIRECTIVE);
                }
                TokenKind::LessThan => {
                    self.parse_directive_group(TokenKind::LessThan, TokenKind::GreaterThan);
                }
                TokenKind::LBracket => {
                    self.parse_directive_group(TokenKind::LBracket, TokenKind::RBracket);
                }
                TokenKind::Question => {
                    self.bump(DIRECTIVE);
                }
                _ => break,
            }
        }
    }

    fn parse_qualified_tail(&mut self) {
        while self.at(DIRECTIVE, TokenKind::Dot)
            && self.peek_nth_kind(DIRECTIVE, 1) == TokenKind::Identifier
        {
            self.bump(DIRECTIVE);
            self.bump(DIRECTIVE);
        }
    }

    /// A nested group such as `<...>` within one line.
    fn parse_directive_group(&mut self, open: TokenKind, close: TokenKind) {
        let start = self.bump(DIRECTIVE);
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek_kind(DIRECTIVE) {
                TokenKind::NewLine | TokenKind::Eof => {
                    self.error_here(
                        ErrorCode::UNCLOSED_BLOCK,
                        [start.text.clone(), group_closer_text(close).to_string()],
                        start.span,
                    );
                    self.push_missing(DIRECTIVE);
                    return;
                }
                kind => {
                    self.bump(DIRECTIVE);
                    if kind == open {
                        depth += 1;
                    } else if kind == close {
                        depth -= 1;
                    }
                }
            }
        }
    }
}

fn group_closer_text(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::GreaterThan => ">",
        TokenKind::RParen => ")",
        TokenKind::RBracket => "]",
        _ => "",
    }
}
