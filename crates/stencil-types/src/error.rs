use crate::{SourceFile, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors stored in a [`Diagnostics`] list. Totals keep
/// counting past the cap.
pub const MAX_ERRORS: usize = 100;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Directive,
    Binding,
    Template,
    Generation,
}

/// Numeric diagnostic code (E100–E599).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNCLOSED_BLOCK: Self = Self(101);
    pub const UNTERMINATED_STRING: Self = Self(102);
    pub const UNTERMINATED_COMMENT: Self = Self(103);
    pub const MISSING_END_TAG: Self = Self(104);
    pub const UNEXPECTED_END_TAG: Self = Self(105);
    pub const INVALID_TRANSITION: Self = Self(106);
    pub const UNCLOSED_ATTRIBUTE_VALUE: Self = Self(107);

    // ── Directives (E200–E299) ──
    pub const UNKNOWN_DIRECTIVE: Self = Self(200);
    pub const DIRECTIVE_TOKEN_MISSING: Self = Self(201);
    pub const UNEXPECTED_DIRECTIVE_CONTENT: Self = Self(202);
    pub const DUPLICATE_DIRECTIVE: Self = Self(203);
    pub const DIRECTIVE_BLOCK_MISSING: Self = Self(204);

    // ── Component binding (E300–E399) ──
    pub const UNKNOWN_ATTRIBUTE: Self = Self(300);
    pub const TYPE_ARGUMENT_ARITY: Self = Self(301);
    pub const AMBIGUOUS_COMPONENT: Self = Self(302);
    pub const MALFORMED_BIND: Self = Self(303);
    pub const DUPLICATE_COMPONENT_PARAMETER: Self = Self(304);
    pub const UNBOUND_COMPONENT_TAG: Self = Self(310);

    // ── Templates (E400–E499) ──
    pub const TEMPLATE_IN_ATTRIBUTE: Self = Self(400);
    pub const TEMPLATE_IN_EXPLICIT_EXPRESSION: Self = Self(401);
    pub const NESTED_TEMPLATE: Self = Self(402);
    pub const MISPLACED_TEMPLATE: Self = Self(403);

    // ── Generation (E500–E599) ──
    pub const GENERATION_FAILED: Self = Self(500);

    /// Get the category for this code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Syntax,
            200..=299 => ErrorCategory::Directive,
            300..=399 => ErrorCategory::Binding,
            400..=499 => ErrorCategory::Template,
            _ => ErrorCategory::Generation,
        }
    }

    /// Default severity for this code.
    pub fn severity(self) -> Severity {
        match self {
            Self::UNBOUND_COMPONENT_TAG => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Message template; `{0}`, `{1}`, … are replaced by the diagnostic's
    /// arguments.
    pub fn template(self) -> &'static str {
        match self {
            Self::UNEXPECTED_TOKEN => "expected {0}, found {1}",
            Self::UNCLOSED_BLOCK => "'{0}' is missing its closing '{1}'",
            Self::UNTERMINATED_STRING => "unterminated string or character literal",
            Self::UNTERMINATED_COMMENT => "unterminated comment",
            Self::MISSING_END_TAG => "element '{0}' is missing an end tag",
            Self::UNEXPECTED_END_TAG => "encountered end tag '{0}' with no matching start tag",
            Self::INVALID_TRANSITION => {
                "'@' must be followed by an identifier, '(', '{', '<', '@' or '*'; found {0}"
            }
            Self::UNCLOSED_ATTRIBUTE_VALUE => "value of attribute '{0}' is missing its closing quote",
            Self::UNKNOWN_DIRECTIVE => "unknown directive '{0}'",
            Self::DIRECTIVE_TOKEN_MISSING => "directive '{0}' expects a {1}",
            Self::UNEXPECTED_DIRECTIVE_CONTENT => "unexpected content after directive '{0}': {1}",
            Self::DUPLICATE_DIRECTIVE => "directive '{0}' repeats '{1}'",
            Self::DIRECTIVE_BLOCK_MISSING => "directive '{0}' expects a '{{' block",
            Self::UNKNOWN_ATTRIBUTE => "component '{1}' has no parameter matching attribute '{0}'",
            Self::TYPE_ARGUMENT_ARITY => {
                "component '{0}' declares {1} type parameter(s) but {2} could be supplied"
            }
            Self::AMBIGUOUS_COMPONENT => "tag '{0}' matches more than one component: {1}",
            Self::MALFORMED_BIND => "binding attribute '{0}' is malformed: {1}",
            Self::DUPLICATE_COMPONENT_PARAMETER => {
                "component parameter '{0}' of '{1}' is set more than once"
            }
            Self::UNBOUND_COMPONENT_TAG => {
                "element '{0}' looks like a component but no component matches it"
            }
            Self::TEMPLATE_IN_ATTRIBUTE => "templates cannot be used in attribute values",
            Self::TEMPLATE_IN_EXPLICIT_EXPRESSION => {
                "templates cannot be used inside an explicit '@(...)' expression"
            }
            Self::NESTED_TEMPLATE => "templates cannot be nested inside other templates",
            Self::MISPLACED_TEMPLATE => "templates may only appear inside code",
            Self::GENERATION_FAILED => "code generation failed: {0}",
            _ => "{0}",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Directive => write!(f, "directive"),
            Self::Binding => write!(f, "binding"),
            Self::Template => write!(f, "template"),
            Self::Generation => write!(f, "generation"),
        }
    }
}

/// Render a message template with positional arguments.
pub fn render_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        digits.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if chars.peek() == Some(&'}') && !digits.is_empty() {
                    chars.next();
                    let idx: usize = digits.parse().unwrap_or(usize::MAX);
                    out.push_str(args.get(idx).map(String::as_str).unwrap_or(""));
                } else {
                    out.push('{');
                    out.push_str(&digits);
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// A structured diagnostic produced by any compiler stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Source file name.
    pub file: String,
    pub code: ErrorCode,
    pub severity: Severity,
    /// Category (derived from code).
    pub category: ErrorCategory,
    /// Message rendered from the code's template and `arguments`.
    pub message: String,
    pub arguments: Vec<String>,
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic from a code and its template arguments.
    pub fn new<I, S>(source: &SourceFile, code: ErrorCode, args: I, span: Span) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let arguments: Vec<String> = args.into_iter().map(Into::into).collect();
        Self {
            file: source.name.clone(),
            code,
            severity: code.severity(),
            category: code.category(),
            message: render_template(code.template(), &arguments),
            arguments,
            span,
            source_line: source.line(span.start_line).unwrap_or("").to_string(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Two diagnostics report the same problem when code, span and
    /// arguments agree.
    pub fn same_problem(&self, other: &Diagnostic) -> bool {
        self.code == other.code && self.span == other.span && self.arguments == other.arguments
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}): {} [{}] {}",
            self.file, self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for Diagnostic {}

/// The structured diagnostic list of one compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl Diagnostics {
    /// Create an empty list.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add a diagnostic, routing by severity and respecting [`MAX_ERRORS`].
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => {
                if self.errors.len() < MAX_ERRORS {
                    self.errors.push(diagnostic);
                }
                self.total_errors += 1;
            }
            Severity::Warning => {
                self.warnings.push(diagnostic);
                self.total_warnings += 1;
            }
        }
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for d in diagnostics {
            self.push(d);
        }
    }

    /// Errors then warnings.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }

    /// All stored diagnostics carrying `code`.
    pub fn with_code(&self, code: ErrorCode) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.code == code).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.total_errors == 0 && self.total_warnings == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
