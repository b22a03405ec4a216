//! Document classification: which output shape a source file takes.

use stencil_types::descriptor::builtin;
use stencil_types::{DocumentShape, FileKind, NodeId, SyntaxKind, SyntaxTree, TokenKind};

/// Keyword of a directive node (`page` for `@page "/x"`).
pub(crate) fn directive_name(tree: &SyntaxTree, node: NodeId) -> Option<&str> {
    tree.child_tokens(node)
        .find(|t| t.kind == TokenKind::Identifier)
        .map(|t| t.text.as_str())
}

/// Component files are components. Template files with a `@page`
/// directive are pages; every other template is a legacy view.
pub fn classify(tree: &SyntaxTree, kind: FileKind) -> DocumentShape {
    if kind == FileKind::Component {
        return DocumentShape::Component;
    }
    let has_page = tree
        .find_all(SyntaxKind::Directive)
        .into_iter()
        .any(|d| directive_name(tree, d) == Some(builtin::PAGE));
    if has_page {
        DocumentShape::Page
    } else {
        DocumentShape::LegacyView
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_types::{DirectiveRegistry, SourceFile};

    fn shape(text: &str, kind: FileKind) -> DocumentShape {
        let source = SourceFile::new("Index.stencil", text);
        let parsed = stencil_parser::parse(&source, kind, &DirectiveRegistry::with_defaults());
        classify(&parsed.tree, kind)
    }

    #[test]
    fn test_component_files_are_components() {
        assert_eq!(shape("@page \"/c\"\n<p>x</p>", FileKind::Component), DocumentShape::Component);
        assert_eq!(shape("<p>x</p>", FileKind::Component), DocumentShape::Component);
    }

    #[test]
    fn test_page_directive_makes_a_page() {
        assert_eq!(shape("@page \"/home\"\n<h1>Home</h1>", FileKind::Template), DocumentShape::Page);
    }

    #[test]
    fn test_plain_template_is_legacy_view() {
        assert_eq!(shape("<h1>@Model.Title</h1>", FileKind::Template), DocumentShape::LegacyView);
    }

    #[test]
    fn test_page_inside_markup_still_counts() {
        assert_eq!(shape("<div>\n@page \"/x\"\n</div>", FileKind::Template), DocumentShape::Page);
    }
}
