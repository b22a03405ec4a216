//! Code parsing: transitions, expressions, code blocks, control statements,
//! and templates.

use stencil_lexer::LexMode;
use stencil_types::{ErrorCode, Span, SyntaxKind, TokenKind};

use crate::parser::{describe_char, is_identifier_start, Parser};

/// Where an `@` appears; decides which constructs it may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransitionContext {
    /// Markup content: every construct, directives included.
    Content,
    /// Inside an `@:` line.
    Line,
    /// Inside an attribute value.
    Attribute,
    /// Inside a start tag, as a dynamic attribute.
    Tag,
}

/// Keywords that start a control statement after `@`.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "foreach", "while", "do", "switch", "lock", "try", "using",
];

impl<'src> Parser<'src> {
    // ── Transition Dispatch ───────────────────────────────────────────────────

    /// Parse the construct introduced by the `@` at the cursor. `mode` is
    /// the mode the `@` was peeked in.
    pub(crate) fn parse_transition(&mut self, mode: LexMode, ctx: TransitionContext) {
        let at = self.peek(mode);
        let after = at.span.end_offset();
        match self.char_at(after) {
            Some('(') => self.parse_explicit_expression(mode),
            Some('{') => self.parse_code_block(mode),
            Some('<') if self.char_at(after + 1).is_some_and(|c| c.is_ascii_alphabetic()) => {
                self.parse_template(mode)
            }
            Some(c) if is_identifier_start(c) => {
                let word = self.word_at(after);
                if ctx != TransitionContext::Content {
                    self.parse_implicit_expression(mode);
                } else if self.starts_control_statement(word, after) {
                    self.parse_control_statement(mode);
                } else if let Some(descriptor) = self.registry.get(word) {
                    let descriptor = descriptor.clone();
                    self.parse_directive(mode, &descriptor);
                } else if self.looks_like_directive(at.span.offset, after, word) {
                    self.parse_unknown_directive(mode);
                } else {
                    self.parse_implicit_expression(mode);
                }
            }
            other => self.parse_invalid_transition(mode, other),
        }
    }

    fn starts_control_statement(&self, word: &str, after: usize) -> bool {
        if !CONTROL_KEYWORDS.contains(&word) {
            return false;
        }
        // `@using Namespace` is the directive; `@using (...)` the statement.
        if word == "using" {
            let rest = self.source().get(after + word.len()..).unwrap_or("");
            return rest.trim_start_matches([' ', '\t']).starts_with('(');
        }
        true
    }

    /// An unregistered lowercase keyword alone at the start of a line and
    /// followed by directive-shaped arguments reads as a directive.
    fn looks_like_directive(&self, at: usize, after: usize, word: &str) -> bool {
        if !word.chars().all(|c| c.is_ascii_lowercase()) || !self.is_line_start(at) {
            return false;
        }
        let end = after + word.len();
        if !matches!(self.char_at(end), Some(' ' | '\t')) {
            return false;
        }
        let args = self.rest_of_line(end).trim();
        !args.is_empty() && !args.contains('<') && !args.contains('@')
    }

    /// A lone `@` that starts nothing. Wrapped in an error node; whatever
    /// follows is parsed by the caller.
    fn parse_invalid_transition(&mut self, mode: LexMode, found: Option<char>) {
        self.start(SyntaxKind::Error);
        let at = self.bump(mode);
        self.error_here(ErrorCode::INVALID_TRANSITION, [describe_char(found)], at.span);
        self.finish();
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    /// `@name`, `@a.b.c`, `@call(args)`, `@items[0].Name`. A trailing `.`
    /// and anything after whitespace stay in markup.
    fn parse_implicit_expression(&mut self, mode: LexMode) {
        self.start(SyntaxKind::ImplicitExpression);
        self.bump(mode);
        self.bump(LexMode::Code);
        loop {
            match self.peek_char() {
                Some('.') if self.peek_char_nth(1).is_some_and(is_identifier_start) => {
                    self.bump(LexMode::Code);
                    self.bump(LexMode::Code);
                }
                Some('(' | '[') => self.parse_balanced(),
                _ => break,
            }
        }
        self.finish();
    }

    /// `@( ... )`
    fn parse_explicit_expression(&mut self, mode: LexMode) {
        self.start(SyntaxKind::ExplicitExpression);
        self.bump(mode);
        self.parse_balanced();
        self.finish();
    }

    /// A bracketed code region starting at the cursor's `(`, `[`, or `{`.
    ///
    /// A closer that matches an outer opener closes the inner ones (E101
    /// each). A closer that matches nothing on the stack belongs to an
    /// enclosing construct: every open bracket is reported and the closer is
    /// left unconsumed.
    pub(crate) fn parse_balanced(&mut self) {
        let open = self.bump(LexMode::Code);
        let mut stack = vec![(open.kind, open.span)];
        while let Some(&(top, _)) = stack.last() {
            let tok = self.peek(LexMode::Code);
            match tok.kind {
                TokenKind::Eof => {
                    self.flush_trivia(LexMode::Code);
                    self.close_unbalanced(&mut stack, 0);
                }
                kind if kind.is_open_bracket() => {
                    self.bump(LexMode::Code);
                    stack.push((kind, tok.span));
                }
                kind if kind.is_close_bracket() => {
                    if top.closer() == Some(kind) {
                        self.bump(LexMode::Code);
                        stack.pop();
                    } else if let Some(i) = stack.iter().rposition(|(o, _)| o.closer() == Some(kind)) {
                        self.close_unbalanced(&mut stack, i + 1);
                    } else {
                        self.close_unbalanced(&mut stack, 0);
                    }
                }
                TokenKind::Transition => self.parse_code_transition(),
                TokenKind::RazorComment => self.wrap(SyntaxKind::RazorComment, LexMode::Code),
                _ => {
                    self.bump(LexMode::Code);
                }
            }
        }
    }

    /// Report and pop open brackets down to `keep`.
    fn close_unbalanced(&mut self, stack: &mut Vec<(TokenKind, Span)>, keep: usize) {
        while stack.len() > keep {
            let Some((open, span)) = stack.pop() else {
                break;
            };
            let close = open.closer().map(bracket_text).unwrap_or_default();
            self.error_here(ErrorCode::UNCLOSED_BLOCK, [bracket_text(open), close], span);
            self.push_missing(LexMode::Code);
        }
    }

    // ── Code Blocks ───────────────────────────────────────────────────────────

    /// `@{ ... }`
    fn parse_code_block(&mut self, mode: LexMode) {
        self.start(SyntaxKind::CodeBlock);
        self.bump(mode);
        self.parse_braced_body();
        self.finish();
    }

    /// `{ body }` at the cursor, with the body parsed as code.
    pub(crate) fn parse_braced_body(&mut self) {
        let open = self.bump(LexMode::Code);
        let floor = self.enter_element_scope();
        self.parse_code_body();
        self.leave_element_scope(floor);
        if !self.eat(LexMode::Code, TokenKind::RBrace) {
            self.error_here(ErrorCode::UNCLOSED_BLOCK, ["{", "}"], open.span);
            self.push_missing(LexMode::Code);
        }
    }

    /// Statements up to the `}` that closes the enclosing block, or the end
    /// of input. Markup may start wherever a statement may: `<tag` after
    /// `{`, `}`, `;`, or `:`, and `@:` lines anywhere.
    pub(crate) fn parse_code_body(&mut self) {
        let mut depth = 0usize;
        let mut statement_start = true;
        loop {
            let tok = self.peek(LexMode::Code);
            match tok.kind {
                TokenKind::Eof => {
                    self.flush_trivia(LexMode::Code);
                    return;
                }
                TokenKind::RBrace if depth == 0 => return,
                TokenKind::RBrace => {
                    self.bump(LexMode::Code);
                    depth -= 1;
                    statement_start = true;
                }
                TokenKind::LBrace => {
                    self.bump(LexMode::Code);
                    depth += 1;
                    statement_start = true;
                }
                TokenKind::LParen | TokenKind::LBracket => {
                    self.parse_balanced();
                    statement_start = false;
                }
                TokenKind::Semicolon | TokenKind::Colon => {
                    self.bump(LexMode::Code);
                    statement_start = true;
                }
                TokenKind::LessThan if statement_start && self.markup_at(tok.span.offset) => {
                    self.flush_trivia(LexMode::Code);
                    if self.at(LexMode::Markup, TokenKind::OpenAngleSlash) {
                        self.parse_stray_end_tag();
                    } else {
                        self.parse_element();
                    }
                    statement_start = true;
                }
                TokenKind::MarkupLineTransition => {
                    self.parse_markup_line();
                    statement_start = true;
                }
                TokenKind::Transition => {
                    self.parse_code_transition();
                    statement_start = false;
                }
                TokenKind::RazorComment => self.wrap(SyntaxKind::RazorComment, LexMode::Code),
                _ => {
                    self.bump(LexMode::Code);
                    statement_start = false;
                }
            }
        }
    }

    /// A `<` at `offset` opens a start or end tag.
    fn markup_at(&self, offset: usize) -> bool {
        match self.char_at(offset + 1) {
            Some('/') => self.char_at(offset + 2).is_some_and(|c| c.is_ascii_alphabetic()),
            Some(c) => c.is_ascii_alphabetic(),
            None => false,
        }
    }

    /// `@` inside code: only a template may follow.
    fn parse_code_transition(&mut self) {
        let at = self.peek(LexMode::Code);
        let after = at.span.end_offset();
        match self.char_at(after) {
            Some('<') if self.char_at(after + 1).is_some_and(|c| c.is_ascii_alphabetic()) => {
                self.parse_template(LexMode::Code)
            }
            other => self.parse_invalid_transition(LexMode::Code, other),
        }
    }

    // ── Control Statements ────────────────────────────────────────────────────

    /// `@if (...) { } else { }`, `@foreach (...) { }`, `@try { } catch { }`,
    /// and friends.
    fn parse_control_statement(&mut self, mode: LexMode) {
        self.start(SyntaxKind::ControlStatement);
        self.bump(mode);
        let keyword = self.bump(LexMode::Code);
        match keyword.text.as_str() {
            "if" => {
                self.parse_condition();
                self.parse_statement_block();
                while self.at_word(LexMode::Code, "else") {
                    self.bump(LexMode::Code);
                    if self.at_word(LexMode::Code, "if") {
                        self.bump(LexMode::Code);
                        self.parse_condition();
                        self.parse_statement_block();
                    } else {
                        self.parse_statement_block();
                        break;
                    }
                }
            }
            "do" => {
                self.parse_statement_block();
                if self.at_word(LexMode::Code, "while") {
                    self.bump(LexMode::Code);
                    self.parse_condition();
                    self.eat(LexMode::Code, TokenKind::Semicolon);
                } else {
                    self.error_expected(LexMode::Code, "'while'");
                }
            }
            "try" => {
                self.parse_statement_block();
                while self.at_word(LexMode::Code, "catch") {
                    self.bump(LexMode::Code);
                    if self.at(LexMode::Code, TokenKind::LParen) {
                        self.parse_balanced();
                    }
                    self.parse_statement_block();
                }
                if self.at_word(LexMode::Code, "finally") {
                    self.bump(LexMode::Code);
                    self.parse_statement_block();
                }
            }
            _ => {
                self.parse_condition();
                self.parse_statement_block();
            }
        }
        self.finish();
    }

    fn parse_condition(&mut self) {
        if self.at(LexMode::Code, TokenKind::LParen) {
            self.parse_balanced();
        } else {
            self.error_expected(LexMode::Code, "'('");
        }
    }

    fn parse_statement_block(&mut self) {
        if self.at(LexMode::Code, TokenKind::LBrace) {
            self.parse_braced_body();
        } else {
            self.error_expected(LexMode::Code, "'{'");
        }
    }

    // ── Templates ─────────────────────────────────────────────────────────────

    /// `@<tag>...</tag>`: one markup element used as a value.
    fn parse_template(&mut self, mode: LexMode) {
        self.start(SyntaxKind::Template);
        self.bump(mode);
        let floor = self.enter_element_scope();
        self.parse_element();
        self.leave_element_scope(floor);
        self.finish();
    }
}

fn bracket_text(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::LBrace => "{",
        TokenKind::RBrace => "}",
        TokenKind::LBracket => "[",
        TokenKind::RBracket => "]",
        _ => "",
    }
}
