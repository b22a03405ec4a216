//! Core parser infrastructure: lexer cursor, tree building, error reporting.

use stencil_lexer::{fault_diagnostic, LexMode, Lexer};
use stencil_types::syntax::{SyntaxTree, TreeBuilder};
use stencil_types::{
    Diagnostic, Diagnostics, DirectiveRegistry, ErrorCode, FileKind, NodeId, SourceFile, Span,
    SyntaxKind, Token, TokenKind,
};

/// The stencil parser.
///
/// Drives the mode-aware lexer and builds a lossless syntax tree. Malformed
/// input never aborts the parse: the parser synthesizes `Missing` tokens,
/// attaches diagnostics to the smallest enclosing node, and resumes at the
/// next plausible boundary.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    source_file: &'src SourceFile,
    pub(crate) registry: &'src DirectiveRegistry,
    pub(crate) file_kind: FileKind,
    builder: TreeBuilder,
    /// Names of open markup elements, innermost last.
    pub(crate) open_elements: Vec<String>,
    /// Elements below this index belong to an enclosing scope (code block,
    /// template) and cannot be closed implicitly from inside it.
    pub(crate) element_floor: usize,
}

/// Result of parsing.
pub struct ParseResult {
    pub tree: SyntaxTree,
    /// Every diagnostic attached to the tree, in document order.
    pub errors: Diagnostics,
}

impl<'src> Parser<'src> {
    /// Create a new parser for a source file.
    pub fn new(
        source_file: &'src SourceFile,
        file_kind: FileKind,
        registry: &'src DirectiveRegistry,
    ) -> Self {
        Self {
            lexer: Lexer::new(source_file),
            source_file,
            registry,
            file_kind,
            builder: TreeBuilder::new(),
            open_elements: Vec::new(),
            element_floor: 0,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the whole document.
    pub fn parse(mut self) -> ParseResult {
        self.builder.start_node(SyntaxKind::Document);
        self.parse_document_content();
        let eof = self.lexer.bump(LexMode::Markup);
        self.builder.token(eof);
        self.builder.finish_node();

        let tree = self.builder.finish(self.source_file.span(0, 0));
        let mut errors = Diagnostics::empty();
        errors.extend(tree.diagnostics().into_iter().cloned());
        ParseResult { tree, errors }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the next token under `mode` without consuming it.
    pub(crate) fn peek(&self, mode: LexMode) -> Token {
        self.lexer.peek(mode)
    }

    pub(crate) fn peek_kind(&self, mode: LexMode) -> TokenKind {
        self.lexer.peek(mode).kind
    }

    pub(crate) fn peek_nth_kind(&self, mode: LexMode, n: usize) -> TokenKind {
        self.lexer.peek_nth(mode, n).kind
    }

    /// Check if the next token under `mode` has the given kind.
    pub(crate) fn at(&self, mode: LexMode, kind: TokenKind) -> bool {
        self.peek_kind(mode) == kind
    }

    /// Check if the next token under `mode` is the identifier `word`.
    pub(crate) fn at_word(&self, mode: LexMode, word: &str) -> bool {
        self.peek(mode).is_word(word)
    }

    /// Consume the next token into the current node and return a copy.
    /// Lexical faults on the token become diagnostics here.
    pub(crate) fn bump(&mut self, mode: LexMode) -> Token {
        let token = self.lexer.bump(mode);
        let faults: Vec<_> = token.faults().collect();
        for (fault, span) in faults {
            let diagnostic = fault_diagnostic(self.source_file, fault, span);
            self.attach_current(diagnostic);
        }
        self.builder.token(token.clone());
        token
    }

    /// If the next token matches, consume it and return `true`.
    pub(crate) fn eat(&mut self, mode: LexMode, kind: TokenKind) -> bool {
        if self.at(mode, kind) {
            self.bump(mode);
            true
        } else {
            false
        }
    }

    /// Report E100 at the cursor and insert a `Missing` token there.
    pub(crate) fn error_expected(&mut self, mode: LexMode, expected: &str) {
        let found = self.peek(mode).to_string();
        let span = self.cursor_span();
        self.error_here(ErrorCode::UNEXPECTED_TOKEN, [expected.to_string(), found], span);
        self.push_missing(mode);
    }

    /// Insert a zero-width `Missing` token at the cursor.
    pub(crate) fn push_missing(&mut self, mode: LexMode) {
        let at = self.cursor_span();
        self.builder.token(Token::missing(at, mode.token_mode()));
    }

    /// Consume pending trivia of `mode` as a `TriviaRun` token.
    pub(crate) fn flush_trivia(&mut self, mode: LexMode) {
        if let Some(run) = self.lexer.bump_trivia(mode) {
            let faults: Vec<_> = run.faults().collect();
            for (fault, span) in faults {
                let diagnostic = fault_diagnostic(self.source_file, fault, span);
                self.attach_current(diagnostic);
            }
            self.builder.token(run);
        }
    }

    /// Zero-width span at the raw cursor position (before any trivia).
    pub(crate) fn cursor_span(&self) -> Span {
        self.source_file.span(self.lexer.pos(), 0)
    }

    // ── Raw Source Access ─────────────────────────────────────────────────────

    pub(crate) fn source(&self) -> &'src str {
        &self.source_file.source
    }

    /// The character at an absolute byte offset.
    pub(crate) fn char_at(&self, offset: usize) -> Option<char> {
        self.source().get(offset..)?.chars().next()
    }

    /// The character at the raw cursor position.
    pub(crate) fn peek_char(&self) -> Option<char> {
        self.lexer.peek_char()
    }

    pub(crate) fn peek_char_nth(&self, n: usize) -> Option<char> {
        self.lexer.peek_char_nth(n)
    }

    /// The identifier starting at `offset`, or `""`.
    pub(crate) fn word_at(&self, offset: usize) -> &'src str {
        let rest = self.source().get(offset..).unwrap_or("");
        let end = rest
            .char_indices()
            .find(|&(i, c)| !(c.is_alphanumeric() || c == '_') || (i == 0 && c.is_ascii_digit()))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        &rest[..end]
    }

    /// Only spaces or tabs precede `offset` on its line.
    pub(crate) fn is_line_start(&self, offset: usize) -> bool {
        let before = self.source().get(..offset).unwrap_or("");
        let line = before.rsplit('\n').next().unwrap_or("");
        line.chars().all(|c| c == ' ' || c == '\t')
    }

    /// Text from `offset` to the end of its line, without the line break.
    pub(crate) fn rest_of_line(&self, offset: usize) -> &'src str {
        let rest = self.source().get(offset..).unwrap_or("");
        let end = rest.find('\n').unwrap_or(rest.len());
        rest[..end].trim_end_matches('\r')
    }

    // ── Tree Building ─────────────────────────────────────────────────────────

    pub(crate) fn start(&mut self, kind: SyntaxKind) -> NodeId {
        self.builder.start_node(kind)
    }

    pub(crate) fn finish(&mut self) {
        self.builder.finish_node();
    }

    /// Wrap the next token in a node of its own.
    pub(crate) fn wrap(&mut self, kind: SyntaxKind, mode: LexMode) {
        self.start(kind);
        self.bump(mode);
        self.finish();
    }

    /// Open a new element scope; returns the previous floor.
    pub(crate) fn enter_element_scope(&mut self) -> usize {
        std::mem::replace(&mut self.element_floor, self.open_elements.len())
    }

    pub(crate) fn leave_element_scope(&mut self, floor: usize) {
        self.element_floor = floor;
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Attach a diagnostic to the innermost open node.
    pub(crate) fn error_here<I, S>(&mut self, code: ErrorCode, args: I, span: Span)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let diagnostic = Diagnostic::new(self.source_file, code, args, span);
        self.attach_current(diagnostic);
    }

    /// Attach a diagnostic to a specific node.
    pub(crate) fn error_on<I, S>(&mut self, node: NodeId, code: ErrorCode, args: I, span: Span)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let diagnostic = Diagnostic::new(self.source_file, code, args, span);
        self.builder.attach(node, diagnostic);
    }

    fn attach_current(&mut self, diagnostic: Diagnostic) {
        if let Some(node) = self.builder.current() {
            self.builder.attach(node, diagnostic);
        }
    }

    /// The lexer mode for tag interiors in this file kind.
    pub(crate) fn tag_mode(&self) -> LexMode {
        LexMode::Tag {
            directive_attributes: self.file_kind == FileKind::Component,
        }
    }
}

/// Describe a character for diagnostics.
pub(crate) fn describe_char(c: Option<char>) -> String {
    match c {
        None => "end of file".to_string(),
        Some(c) if c.is_whitespace() => "whitespace".to_string(),
        Some(c) => format!("'{c}'"),
    }
}

pub(crate) fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}
