//! Lexer tests: markup, tags, attribute values, code literals, trivia,
//! transitions, faults, and the 100-iteration determinism test.

use stencil_lexer::{LexMode, Lexer};
use stencil_types::token::TriviaKind;
use stencil_types::{ErrorCode, SourceFile, Token, TokenKind};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn lex(source: &str, mode: LexMode) -> Vec<Token> {
    let sf = SourceFile::new("test.stencil", source);
    Lexer::new(&sf).lex_all(mode).tokens
}

/// Token kinds excluding the final Eof.
fn kinds(source: &str, mode: LexMode) -> Vec<TokenKind> {
    lex(source, mode)
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind)
        .collect()
}

fn texts(source: &str, mode: LexMode) -> Vec<String> {
    lex(source, mode)
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.text)
        .collect()
}

fn error_codes(source: &str, mode: LexMode) -> Vec<ErrorCode> {
    let sf = SourceFile::new("test.stencil", source);
    Lexer::new(&sf)
        .lex_all(mode)
        .errors
        .iter()
        .map(|d| d.code)
        .collect()
}

fn reconstruct(source: &str, mode: LexMode) -> String {
    lex(source, mode).iter().map(|t| t.full_text()).collect()
}

const TAG: LexMode = LexMode::Tag {
    directive_attributes: true,
};

// ─────────────────────────────────────────────────────────────────────
// Markup content
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_markup_text_and_tags() {
    assert_eq!(
        kinds("hello <p>", LexMode::Markup),
        vec![TokenKind::Text, TokenKind::OpenAngle, TokenKind::Text]
    );
    assert_eq!(
        kinds("</div>", LexMode::Markup),
        vec![TokenKind::OpenAngleSlash, TokenKind::Text]
    );
}

#[test]
fn test_markup_lone_angle_is_text() {
    assert_eq!(kinds("a < b", LexMode::Markup), vec![TokenKind::Text, TokenKind::Text]);
    assert_eq!(texts("a < b", LexMode::Markup), vec!["a ", "< b"]);
}

#[test]
fn test_markup_comment_and_doctype() {
    assert_eq!(
        kinds("<!-- note --><!DOCTYPE html>", LexMode::Markup),
        vec![TokenKind::HtmlComment, TokenKind::Text]
    );
    assert_eq!(
        error_codes("<!-- open", LexMode::Markup),
        vec![ErrorCode::UNTERMINATED_COMMENT]
    );
}

#[test]
fn test_markup_transitions() {
    assert_eq!(
        kinds("@name", LexMode::Markup),
        vec![TokenKind::Transition, TokenKind::Text]
    );
    assert_eq!(kinds("@@", LexMode::Markup), vec![TokenKind::EscapedTransition]);
    assert_eq!(kinds("@* hidden *@", LexMode::Markup), vec![TokenKind::RazorComment]);
    assert_eq!(
        error_codes("@* never closed", LexMode::Markup),
        vec![ErrorCode::UNTERMINATED_COMMENT]
    );
}

#[test]
fn test_email_rule() {
    assert_eq!(texts("mail me@example.com", LexMode::Markup), vec!["mail me@example.com"]);
    assert_eq!(
        kinds("mail @example", LexMode::Markup),
        vec![TokenKind::Text, TokenKind::Transition, TokenKind::Text]
    );
}

#[test]
fn test_markup_line_stops_at_newline() {
    assert_eq!(
        kinds("text @x\r\nmore", LexMode::MarkupLine),
        vec![
            TokenKind::Text,
            TokenKind::Transition,
            TokenKind::Text,
            TokenKind::NewLine,
            TokenKind::Text
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Tags
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_tag_tokens() {
    assert_eq!(
        kinds("input type=\"text\" />", TAG),
        vec![
            TokenKind::Name,
            TokenKind::Name,
            TokenKind::Equals,
            TokenKind::DoubleQuote,
            TokenKind::Name,
            TokenKind::DoubleQuote,
            TokenKind::SlashCloseAngle
        ]
    );
}

#[test]
fn test_tag_whitespace_is_trivia() {
    let toks = lex("a\n  b>", TAG);
    assert_eq!(toks[1].text, "b");
    assert_eq!(toks[1].leading.len(), 2);
    assert_eq!(toks[1].leading[0].kind, TriviaKind::NewLine);
    assert_eq!(toks[1].leading[1].kind, TriviaKind::Whitespace);
}

#[test]
fn test_directive_attribute_names() {
    assert_eq!(texts("@bind-Value:event=", TAG), vec!["@bind-Value:event", "="]);
    let legacy = LexMode::Tag {
        directive_attributes: false,
    };
    assert_eq!(
        kinds("@attrs>", legacy),
        vec![TokenKind::Transition, TokenKind::Name, TokenKind::CloseAngle]
    );
}

#[test]
fn test_attribute_value_modes() {
    assert_eq!(
        kinds("a @b c'", LexMode::AttributeValue('\'')),
        vec![
            TokenKind::Text,
            TokenKind::Transition,
            TokenKind::Text,
            TokenKind::SingleQuote
        ]
    );
    assert_eq!(texts("/a/b />", LexMode::UnquotedValue)[0], "/a/b");
}

// ─────────────────────────────────────────────────────────────────────
// Code
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_code_punctuation() {
    assert_eq!(
        kinds("global::A.B<C>[] ?", LexMode::Code),
        vec![
            TokenKind::Identifier,
            TokenKind::DoubleColon,
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::LessThan,
            TokenKind::Identifier,
            TokenKind::GreaterThan,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::Question
        ]
    );
}

#[test]
fn test_code_literals() {
    assert_eq!(
        kinds(r#""a\"b" 'c' 1.5m @"x""y" $"{a["k"]}""#, LexMode::Code),
        vec![
            TokenKind::StringLiteral,
            TokenKind::CharLiteral,
            TokenKind::NumberLiteral,
            TokenKind::StringLiteral,
            TokenKind::StringLiteral
        ]
    );
}

#[test]
fn test_code_verbatim_identifier_and_markup_line() {
    assert_eq!(texts("@class @:", LexMode::Code), vec!["@class", "@:"]);
    assert_eq!(
        kinds("@class @:", LexMode::Code),
        vec![TokenKind::Identifier, TokenKind::MarkupLineTransition]
    );
}

#[test]
fn test_code_operators_stop_at_comments() {
    let toks = lex("a=>/* c */b", LexMode::Code);
    assert_eq!(toks[1].text, "=>");
    assert_eq!(toks[2].text, "b");
    assert_eq!(toks[2].leading[0].kind, TriviaKind::BlockComment);
}

#[test]
fn test_code_comments_are_trivia() {
    let toks = lex("x // one\n  /* two */ y", LexMode::Code);
    assert_eq!(toks.len(), 3);
    let kinds: Vec<_> = toks[1].leading.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TriviaKind::Whitespace,
            TriviaKind::LineComment,
            TriviaKind::NewLine,
            TriviaKind::Whitespace,
            TriviaKind::BlockComment,
            TriviaKind::Whitespace
        ]
    );
}

#[test]
fn test_unterminated_literals() {
    assert_eq!(
        error_codes("\"abc\nx", LexMode::Code),
        vec![ErrorCode::UNTERMINATED_STRING]
    );
    assert_eq!(error_codes("'a", LexMode::Code), vec![ErrorCode::UNTERMINATED_STRING]);
    assert_eq!(
        error_codes("/* open", LexMode::Code),
        vec![ErrorCode::UNTERMINATED_COMMENT]
    );
    // The unterminated string stops before the line break.
    let toks = lex("\"abc\nx", LexMode::Code);
    assert_eq!(toks[0].text, "\"abc");
}

#[test]
fn test_spans_are_one_based() {
    let toks = lex("a\n  bc", LexMode::Code);
    assert_eq!(toks[1].span.start_line, 2);
    assert_eq!(toks[1].span.start_col, 3);
    assert_eq!(toks[1].span.end_col, 5);
    assert_eq!(toks[1].span.offset, 4);
}

#[test]
fn test_unicode_text() {
    assert_eq!(texts("héllo <b>", LexMode::Markup)[0], "héllo ");
    assert_eq!(texts("naïve + x", LexMode::Code)[0], "naïve");
}

// ─────────────────────────────────────────────────────────────────────
// Losslessness
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_lossless_in_every_mode() {
    let source = "<div class=\"a\">@x // y\r\n\t'q' \"open\n@* c *@ </div>";
    for mode in [
        LexMode::Markup,
        LexMode::MarkupLine,
        TAG,
        LexMode::AttributeValue('"'),
        LexMode::UnquotedValue,
        LexMode::Code,
        LexMode::Directive,
    ] {
        assert_eq!(reconstruct(source, mode), source, "mode {mode:?}");
    }
}

// ─────────────────────────────────────────────────────────────────────
// 100-iteration determinism test
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_lexer_determinism_100_iterations() {
    let source = "@page \"/counter\"\n<p>Count: @count</p>\n@code { int count; }";
    let first = lex(source, LexMode::Markup);
    for i in 0..100 {
        let again = lex(source, LexMode::Markup);
        assert_eq!(first, again, "Determinism failure at iteration {i}");
    }
}
