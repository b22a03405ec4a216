//! Markup parsing: content, elements, tags, attributes, and `@:` lines.

use stencil_lexer::LexMode;
use stencil_types::syntax::is_void_element;
use stencil_types::{ErrorCode, Span, SyntaxKind, TokenKind};

use crate::parse_code::TransitionContext;
use crate::parser::Parser;

/// Why a run of markup content stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentStop {
    Eof,
    EndTag,
}

struct StartTag {
    name: String,
    name_span: Span,
    self_closing: bool,
    closed: bool,
}

impl<'src> Parser<'src> {
    // ── Content ───────────────────────────────────────────────────────────────

    /// Top-level markup. End tags with no open element are stray.
    pub(crate) fn parse_document_content(&mut self) {
        while self.parse_markup_content() == ContentStop::EndTag {
            self.parse_stray_end_tag();
        }
    }

    /// Markup content up to the end of input or the next end tag.
    pub(crate) fn parse_markup_content(&mut self) -> ContentStop {
        loop {
            let tok = self.peek(LexMode::Markup);
            match tok.kind {
                TokenKind::Eof => return ContentStop::Eof,
                TokenKind::OpenAngleSlash => return ContentStop::EndTag,
                TokenKind::OpenAngle => self.parse_element(),
                TokenKind::Transition => {
                    self.parse_transition(LexMode::Markup, TransitionContext::Content)
                }
                TokenKind::HtmlComment => self.wrap(SyntaxKind::MarkupComment, LexMode::Markup),
                TokenKind::EscapedTransition => {
                    self.wrap(SyntaxKind::EscapedTransition, LexMode::Markup)
                }
                TokenKind::RazorComment => self.wrap(SyntaxKind::RazorComment, LexMode::Markup),
                _ => {
                    self.bump(LexMode::Markup);
                }
            }
        }
    }

    // ── Elements ──────────────────────────────────────────────────────────────

    /// `<tag ...>content</tag>`, `<tag />`, or a void element.
    ///
    /// An end tag that matches an enclosing open element closes this one
    /// implicitly (E104). An end tag that matches nothing is stray (E105).
    pub(crate) fn parse_element(&mut self) {
        let element = self.start(SyntaxKind::MarkupElement);
        let tag = self.parse_start_tag();
        if tag.self_closing || !tag.closed || is_void_element(&tag.name) {
            self.finish();
            return;
        }

        self.open_elements.push(tag.name.clone());
        loop {
            match self.parse_markup_content() {
                ContentStop::Eof => {
                    self.error_on(element, ErrorCode::MISSING_END_TAG, [tag.name.as_str()], tag.name_span);
                    break;
                }
                ContentStop::EndTag => {
                    let end_name = self.pending_end_tag_name();
                    if end_name.eq_ignore_ascii_case(&tag.name) {
                        self.parse_end_tag();
                        break;
                    }
                    if self.closes_enclosing_element(end_name) {
                        self.error_on(element, ErrorCode::MISSING_END_TAG, [tag.name.as_str()], tag.name_span);
                        break;
                    }
                    self.parse_stray_end_tag();
                }
            }
        }
        self.open_elements.pop();
        self.finish();
    }

    /// An end tag name matches an open element outside the innermost one but
    /// inside the current scope.
    fn closes_enclosing_element(&self, name: &str) -> bool {
        let inner = self.open_elements.len().saturating_sub(1);
        self.open_elements
            .get(self.element_floor..inner)
            .is_some_and(|open| open.iter().any(|n| n.eq_ignore_ascii_case(name)))
    }

    /// Name of the end tag at the cursor (the cursor is on `</`).
    fn pending_end_tag_name(&self) -> &'src str {
        let start = self.peek(LexMode::Markup).span.end_offset();
        let rest = self.source().get(start..).unwrap_or("");
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        &rest[..end]
    }

    fn parse_start_tag(&mut self) -> StartTag {
        self.start(SyntaxKind::MarkupStartTag);
        let tag_mode = self.tag_mode();
        self.bump(LexMode::Markup);
        let name = self.bump(tag_mode);
        let mut tag = StartTag {
            name: name.text,
            name_span: name.span,
            self_closing: false,
            closed: false,
        };

        loop {
            let tok = self.peek(tag_mode);
            match tok.kind {
                TokenKind::CloseAngle => {
                    self.bump(tag_mode);
                    tag.closed = true;
                    break;
                }
                TokenKind::SlashCloseAngle => {
                    self.bump(tag_mode);
                    tag.closed = true;
                    tag.self_closing = true;
                    break;
                }
                TokenKind::Name => self.parse_attribute(),
                TokenKind::Transition => {
                    // `<div @attributes>` in template files.
                    self.start(SyntaxKind::MarkupAttribute);
                    self.parse_transition(tag_mode, TransitionContext::Tag);
                    self.finish();
                }
                TokenKind::RazorComment => self.wrap(SyntaxKind::RazorComment, tag_mode),
                TokenKind::Eof | TokenKind::OpenAngle => {
                    self.flush_trivia(tag_mode);
                    self.error_expected(tag_mode, "'>'");
                    break;
                }
                _ => {
                    self.start(SyntaxKind::Error);
                    self.error_here(
                        ErrorCode::UNEXPECTED_TOKEN,
                        ["attribute name".to_string(), tok.to_string()],
                        tok.span,
                    );
                    self.bump(tag_mode);
                    self.finish();
                }
            }
        }
        self.finish();
        tag
    }

    /// `</name>`. The cursor is on `</`.
    fn parse_end_tag(&mut self) {
        self.start(SyntaxKind::MarkupEndTag);
        let tag_mode = self.tag_mode();
        self.bump(LexMode::Markup);
        self.bump(tag_mode);
        let mut reported = false;
        loop {
            let tok = self.peek(tag_mode);
            match tok.kind {
                TokenKind::CloseAngle => {
                    self.bump(tag_mode);
                    break;
                }
                TokenKind::Eof | TokenKind::OpenAngle => {
                    self.flush_trivia(tag_mode);
                    if !reported {
                        self.error_expected(tag_mode, "'>'");
                    } else {
                        self.push_missing(tag_mode);
                    }
                    break;
                }
                _ => {
                    if !reported {
                        self.error_here(
                            ErrorCode::UNEXPECTED_TOKEN,
                            ["'>'".to_string(), tok.to_string()],
                            tok.span,
                        );
                        reported = true;
                    }
                    self.bump(tag_mode);
                }
            }
        }
        self.finish();
    }

    /// An end tag with no matching open element, wrapped in an error node.
    pub(crate) fn parse_stray_end_tag(&mut self) {
        let name = self.pending_end_tag_name();
        let at = self.peek(LexMode::Markup).span;
        self.start(SyntaxKind::Error);
        self.error_here(ErrorCode::UNEXPECTED_END_TAG, [name], at);
        self.parse_end_tag();
        self.finish();
    }

    // ── Attributes ────────────────────────────────────────────────────────────

    /// `name`, `name=value`, `name="value"`, or `name='value'`.
    fn parse_attribute(&mut self) {
        let tag_mode = self.tag_mode();
        self.start(SyntaxKind::MarkupAttribute);
        let name = self.bump(tag_mode);
        if self.eat(tag_mode, TokenKind::Equals) {
            match self.peek_kind(tag_mode) {
                TokenKind::DoubleQuote => self.parse_quoted_value('"', &name.text, name.span),
                TokenKind::SingleQuote => self.parse_quoted_value('\'', &name.text, name.span),
                _ => self.parse_unquoted_value(),
            }
        }
        self.finish();
    }

    fn parse_quoted_value(&mut self, quote: char, name: &str, name_span: Span) {
        self.start(SyntaxKind::AttributeValue);
        let tag_mode = self.tag_mode();
        self.bump(tag_mode);
        let mode = LexMode::AttributeValue(quote);
        loop {
            match self.peek_kind(mode) {
                TokenKind::DoubleQuote | TokenKind::SingleQuote => {
                    self.bump(mode);
                    break;
                }
                TokenKind::Eof => {
                    self.error_here(ErrorCode::UNCLOSED_ATTRIBUTE_VALUE, [name], name_span);
                    self.push_missing(mode);
                    break;
                }
                TokenKind::Transition => self.parse_transition(mode, TransitionContext::Attribute),
                TokenKind::EscapedTransition => self.wrap(SyntaxKind::EscapedTransition, mode),
                TokenKind::RazorComment => self.wrap(SyntaxKind::RazorComment, mode),
                _ => {
                    self.bump(mode);
                }
            }
        }
        self.finish();
    }

    fn parse_unquoted_value(&mut self) {
        if self.at_unquoted_value_end() {
            self.error_expected(LexMode::UnquotedValue, "attribute value");
            return;
        }
        self.start(SyntaxKind::AttributeValue);
        let mode = LexMode::UnquotedValue;
        while !self.at_unquoted_value_end() {
            match self.peek_kind(mode) {
                TokenKind::Transition => self.parse_transition(mode, TransitionContext::Attribute),
                TokenKind::EscapedTransition => self.wrap(SyntaxKind::EscapedTransition, mode),
                TokenKind::RazorComment => self.wrap(SyntaxKind::RazorComment, mode),
                _ => {
                    self.bump(mode);
                }
            }
        }
        self.finish();
    }

    fn at_unquoted_value_end(&self) -> bool {
        match self.peek_char() {
            None | Some('>') => true,
            Some(c) if c.is_whitespace() => true,
            Some('/') => self.peek_char_nth(1) == Some('>'),
            Some(_) => false,
        }
    }

    // ── Markup Lines ──────────────────────────────────────────────────────────

    /// `@:` followed by markup up to and including the line break.
    pub(crate) fn parse_markup_line(&mut self) {
        self.start(SyntaxKind::MarkupLine);
        self.bump(LexMode::Code);
        let mode = LexMode::MarkupLine;
        loop {
            match self.peek_kind(mode) {
                TokenKind::NewLine => {
                    self.bump(mode);
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Transition => self.parse_transition(mode, TransitionContext::Line),
                TokenKind::OpenAngle => self.parse_element(),
                TokenKind::OpenAngleSlash => self.parse_stray_end_tag(),
                TokenKind::HtmlComment => self.wrap(SyntaxKind::MarkupComment, mode),
                TokenKind::EscapedTransition => self.wrap(SyntaxKind::EscapedTransition, mode),
                TokenKind::RazorComment => self.wrap(SyntaxKind::RazorComment, mode),
                _ => {
                    self.bump(mode);
                }
            }
        }
        self.finish();
    }
}
