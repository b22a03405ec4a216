//! Runtime type and member names referenced by generated code.

use stencil_types::DocumentShape;

pub const COMPONENT_BASE: &str = "global::Stencil.Components.ComponentBase";
pub const PAGE_BASE: &str = "global::Stencil.Mvc.Page";
pub const VIEW_BASE: &str = "global::Stencil.Mvc.RazorPage<dynamic>";

pub const RENDER_TREE_BUILDER: &str = "global::Stencil.Components.Rendering.RenderTreeBuilder";
pub const RENDER_FRAGMENT: &str = "global::Stencil.Components.RenderFragment";
pub const EVENT_CALLBACK: &str = "global::Stencil.Components.EventCallback";
pub const BIND_CONVERTER: &str = "global::Stencil.Components.BindConverter";
pub const RUNTIME_HELPERS: &str = "global::Stencil.Components.CompilerServices.RuntimeHelpers";
pub const INJECT_ATTRIBUTE: &str = "global::Stencil.Components.InjectAttribute";
pub const VIEW_INJECT_ATTRIBUTE: &str = "global::Stencil.Mvc.RazorInjectAttribute";
pub const COMPONENT_ROUTE_ATTRIBUTE: &str = "global::Stencil.Components.RouteAttribute";
pub const PAGE_ROUTE_ATTRIBUTE: &str = "global::Stencil.Mvc.RouteAttribute";
pub const LAYOUT_ATTRIBUTE: &str = "global::Stencil.Components.LayoutAttribute";
pub const HELPER_RESULT: &str = "global::Stencil.Mvc.HelperResult";

pub const BUILDER: &str = "__builder";
pub const TEMPLATE_WRITER: &str = "__razor_template_writer";
pub const DESIGN_TIME_SINK: &str = "__o";
pub const DESIGN_TIME_HELPER: &str = "__DesignTimeDirectives";
pub const TYPE_HELPER: &str = "__typeHelper";
pub const TYPE_INFERENCE_CLASS: &str = "TypeInference";
pub const CHILD_CONTENT: &str = "ChildContent";

/// Algorithm GUID of the checksum pragma (SHA-256).
pub const CHECKSUM_SHA256_GUID: &str = "{8829d00f-11b8-4213-878b-770e8597ac16}";

/// Usings every generated document starts with, in order.
pub fn default_usings(shape: DocumentShape) -> &'static [&'static str] {
    match shape {
        DocumentShape::Component => &[
            "System",
            "System.Collections.Generic",
            "System.Linq",
            "System.Threading.Tasks",
            "Stencil.Components",
        ],
        DocumentShape::Page | DocumentShape::LegacyView => &[
            "System",
            "System.Collections.Generic",
            "System.Linq",
            "System.Threading.Tasks",
            "Stencil.Mvc",
        ],
    }
}

/// Base class when no `@inherits` is present.
pub fn default_base_type(shape: DocumentShape) -> &'static str {
    match shape {
        DocumentShape::Component => COMPONENT_BASE,
        DocumentShape::Page => PAGE_BASE,
        DocumentShape::LegacyView => VIEW_BASE,
    }
}

pub fn route_attribute(shape: DocumentShape) -> &'static str {
    if shape.is_view() {
        PAGE_ROUTE_ATTRIBUTE
    } else {
        COMPONENT_ROUTE_ATTRIBUTE
    }
}

/// A C# regular string literal.
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// `global::`-qualify a type name unless it already is, or is a keyword
/// type such as `string`.
pub fn qualified_type(type_name: &str) -> String {
    let is_keyword = type_name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase())
        && !type_name.contains('.');
    if type_name.starts_with("global::") || is_keyword {
        type_name.to_string()
    } else {
        format!("global::{type_name}")
    }
}

/// Whether a parameter type takes its attribute text as a string literal.
pub fn is_string_type(type_name: &str) -> bool {
    matches!(
        type_name.trim(),
        "string" | "string?" | "System.String" | "global::System.String"
    )
}
