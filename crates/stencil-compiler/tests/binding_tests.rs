//! Component and attribute binding through the full pipeline.
//!
//! Tests validate:
//! - Short-name matches win over fully-qualified ones
//! - Exactly one E300 per unknown attribute
//! - Ambiguity (E302), duplicate parameters (E304), unbound tags (E310)
//! - Type arguments: explicit, inferred, and missing (E301)
//! - Two-way binding, capture-unmatched, `@key` and `@ref`
//! - Malformed `@bind` attributes (E303)

use stencil_compiler::{compile, CodeDocument, CompilerConfig, ComponentSet};
use stencil_types::ir::{AttributeBinding, TypeArgument};
use stencil_types::{
    BoundAttributeDescriptor, ComponentDescriptor, ErrorCode, FileKind, IrKind, IrNodeId,
    Severity, SourceFile,
};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn counter() -> ComponentDescriptor {
    ComponentDescriptor::new("App.Counter")
        .with_attribute(BoundAttributeDescriptor::property("Count", "int"))
}

fn grid() -> ComponentDescriptor {
    ComponentDescriptor::new("App.Grid")
        .with_type_parameter("TItem")
        .with_attribute(BoundAttributeDescriptor::property("Items", "IEnumerable<TItem>"))
        .with_attribute(BoundAttributeDescriptor::property("Title", "string"))
}

fn field() -> ComponentDescriptor {
    ComponentDescriptor::new("App.Field")
        .with_attribute(BoundAttributeDescriptor::property("Value", "string"))
        .with_attribute(BoundAttributeDescriptor::property(
            "ValueChanged",
            "EventCallback<string>",
        ))
}

fn set(descriptors: Vec<ComponentDescriptor>) -> ComponentSet {
    ComponentSet::new(descriptors).unwrap_or_else(|e| panic!("invalid descriptors: {e}"))
}

fn compile_as(kind: FileKind, text: &str, components: &ComponentSet) -> CodeDocument {
    let source = SourceFile::new("Host.stencil", text);
    compile(&source, kind, components, &CompilerConfig::default())
        .unwrap_or_else(|e| panic!("compile failed: {e}"))
}

fn compile_component(text: &str, components: &ComponentSet) -> CodeDocument {
    compile_as(FileKind::Component, text, components)
}

fn codes(doc: &CodeDocument) -> Vec<ErrorCode> {
    doc.diagnostics().iter().map(|d| d.code).collect()
}

fn components(doc: &CodeDocument) -> Vec<IrNodeId> {
    doc.ir().find_all(|k| matches!(k, IrKind::Component { .. }))
}

fn only_component(doc: &CodeDocument) -> IrNodeId {
    let found = components(doc);
    assert_eq!(found.len(), 1, "expected one bound component");
    found[0]
}

/// `(name, binding)` of every bound attribute of `component`.
fn bindings(doc: &CodeDocument, component: IrNodeId) -> Vec<(String, AttributeBinding)> {
    let ir = doc.ir();
    ir.children(component)
        .iter()
        .filter_map(|&c| match ir.kind(c) {
            IrKind::ComponentAttribute { name, binding } => Some((name.clone(), binding.clone())),
            _ => None,
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// 1. Descriptor selection
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn short_name_match_binds() {
    let doc = compile_component("<Counter Count=\"1\" />", &set(vec![counter()]));
    assert!(codes(&doc).is_empty(), "{:?}", doc.diagnostics());
    let component = only_component(&doc);
    let IrKind::Component {
        tag,
        type_name,
        self_closing,
        ..
    } = doc.ir().kind(component)
    else {
        unreachable!()
    };
    assert_eq!(tag, "Counter");
    assert_eq!(type_name, "App.Counter");
    assert!(*self_closing);
    assert!(doc
        .generated_code()
        .contains("__builder.OpenComponent<global::App.Counter>("));
    assert!(doc.generated_code().contains("__builder.CloseComponent();"));
}

#[test]
fn short_name_wins_over_fully_qualified() {
    let qualified = ComponentDescriptor::fully_qualified("Other.Counter")
        .with_tag_name("Counter")
        .with_attribute(BoundAttributeDescriptor::property("Extra", "string"));
    let both = set(vec![qualified, counter()]);

    let doc = compile_component("<Counter Count=\"1\" />", &both);
    assert!(codes(&doc).is_empty(), "{:?}", doc.diagnostics());
    let component = only_component(&doc);
    assert!(matches!(
        doc.ir().kind(component),
        IrKind::Component { type_name, .. } if type_name == "App.Counter"
    ));
    assert!(!doc.generated_code().contains("Other.Counter"));

    // The fully-qualified descriptor's parameters are not in play.
    let doc = compile_component("<Counter Extra=\"x\" />", &both);
    assert_eq!(codes(&doc), vec![ErrorCode::UNKNOWN_ATTRIBUTE]);
}

#[test]
fn fully_qualified_binds_when_alone() {
    let qualified = ComponentDescriptor::fully_qualified("Other.Counter")
        .with_tag_name("Counter")
        .with_attribute(BoundAttributeDescriptor::property("Extra", "string"));
    let doc = compile_component("<Counter Extra=\"x\" />", &set(vec![qualified]));
    assert!(codes(&doc).is_empty(), "{:?}", doc.diagnostics());
    assert!(matches!(
        doc.ir().kind(only_component(&doc)),
        IrKind::Component { type_name, .. } if type_name == "Other.Counter"
    ));
}

#[test]
fn two_short_matches_are_ambiguous() {
    let twins = set(vec![
        ComponentDescriptor::new("A.Counter"),
        ComponentDescriptor::new("B.Counter"),
    ]);
    let doc = compile_component("<Counter />", &twins);
    let ambiguous = doc.diagnostics().with_code(ErrorCode::AMBIGUOUS_COMPONENT);
    assert_eq!(ambiguous.len(), 1);
    assert_eq!(ambiguous[0].arguments, vec!["Counter", "A.Counter, B.Counter"]);
    // The first candidate is still bound.
    assert!(matches!(
        doc.ir().kind(only_component(&doc)),
        IrKind::Component { type_name, .. } if type_name == "A.Counter"
    ));
}

#[test]
fn unmatched_capitalized_tag_warns() {
    let doc = compile_component("<Widget />\n<div></div>", &set(vec![counter()]));
    assert_eq!(codes(&doc), vec![ErrorCode::UNBOUND_COMPONENT_TAG]);
    assert_eq!(doc.diagnostics().warnings[0].severity, Severity::Warning);
    assert!(!doc.has_errors());
    assert!(components(&doc).is_empty());
}

#[test]
fn views_never_bind() {
    let doc = compile_as(FileKind::Template, "<Counter Count=\"1\" />", &set(vec![counter()]));
    assert!(components(&doc).is_empty());
    assert!(codes(&doc).is_empty());
    assert!(doc.generated_code().contains("WriteLiteral("));
}

// ══════════════════════════════════════════════════════════════════════════════
// 2. Attributes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn unknown_attribute_reports_exactly_once() {
    let doc = compile_component("<Counter Count=\"1\" Title=\"x\" />", &set(vec![counter()]));
    let unknown = doc.diagnostics().with_code(ErrorCode::UNKNOWN_ATTRIBUTE);
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].arguments, vec!["Title", "Counter"]);
    assert!(unknown[0].message.contains("'Title'"));
    assert_eq!(codes(&doc), vec![ErrorCode::UNKNOWN_ATTRIBUTE]);

    // Count still binds; the element is still a component.
    let component = only_component(&doc);
    let bound = bindings(&doc, component);
    assert_eq!(bound.len(), 1);
    assert_eq!(bound[0].0, "Count");
}

#[test]
fn parameter_names_are_case_insensitive() {
    let doc = compile_component("<Counter count=\"1\" />", &set(vec![counter()]));
    assert!(codes(&doc).is_empty());
    let bound = bindings(&doc, only_component(&doc));
    assert_eq!(
        bound[0].1,
        AttributeBinding::Parameter {
            property: "Count".into(),
            type_name: "int".into(),
        }
    );
}

#[test]
fn repeated_parameter_is_reported() {
    let doc = compile_component("<Counter Count=\"1\" count=\"2\" />", &set(vec![counter()]));
    let duplicates = doc.diagnostics().with_code(ErrorCode::DUPLICATE_COMPONENT_PARAMETER);
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].arguments, vec!["Count", "Counter"]);
}

#[test]
fn unmatched_attributes_go_to_capture() {
    let descriptor = counter().with_attribute(
        BoundAttributeDescriptor::property("Attributes", "Dictionary<string, object>").capturing(),
    );
    let doc = compile_component(
        "<Counter Count=\"1\" data-x=\"y\" class=\"big\" />",
        &set(vec![descriptor]),
    );
    assert!(codes(&doc).is_empty(), "{:?}", doc.diagnostics());
    let bound = bindings(&doc, only_component(&doc));
    assert_eq!(bound.len(), 3);
    for (_, binding) in &bound[1..] {
        assert_eq!(
            *binding,
            AttributeBinding::CaptureUnmatched {
                property: "Attributes".into()
            }
        );
    }
}

#[test]
fn key_and_ref_bind_as_directives() {
    let doc = compile_component(
        "<Counter Count=\"1\" @key=\"id\" @ref=\"counterRef\" />",
        &set(vec![counter()]),
    );
    assert!(codes(&doc).is_empty(), "{:?}", doc.diagnostics());
    let bound: Vec<AttributeBinding> = bindings(&doc, only_component(&doc))
        .into_iter()
        .map(|(_, b)| b)
        .collect();
    assert!(bound.contains(&AttributeBinding::Key));
    assert!(bound.contains(&AttributeBinding::Ref));
    assert!(doc.generated_code().contains("__builder.AddComponentReferenceCapture("));
}

#[test]
fn two_way_binding_pairs_property_and_callback() {
    let doc = compile_component("<Field @bind-Value=\"name\" />", &set(vec![field()]));
    assert!(codes(&doc).is_empty(), "{:?}", doc.diagnostics());
    let bound = bindings(&doc, only_component(&doc));
    assert_eq!(
        bound,
        vec![(
            "@bind-Value".to_string(),
            AttributeBinding::TwoWay {
                property: "Value".into(),
                changed: "ValueChanged".into(),
                type_name: "string".into(),
            }
        )]
    );
}

#[test]
fn bind_without_changed_callback_is_unknown() {
    let descriptor = ComponentDescriptor::new("App.Field")
        .with_attribute(BoundAttributeDescriptor::property("Value", "string"));
    let doc = compile_component("<Field @bind-Value=\"name\" />", &set(vec![descriptor]));
    assert_eq!(codes(&doc), vec![ErrorCode::UNKNOWN_ATTRIBUTE]);
}

#[test]
fn modifiers_of_known_directives_are_accepted() {
    let doc = compile_component(
        "<Field @bind-Value=\"name\" @bind-Value:event=\"oninput\" @onclick:preventDefault />",
        &set(vec![field()]),
    );
    assert!(codes(&doc).is_empty(), "{:?}", doc.diagnostics());
}

#[test]
fn modifier_of_unknown_directive_is_reported() {
    let doc = compile_component("<Counter Count=\"1\" @bnd:event=\"x\" />", &set(vec![counter()]));
    let unknown = doc.diagnostics().with_code(ErrorCode::UNKNOWN_ATTRIBUTE);
    assert_eq!(unknown.len(), 1, "{:?}", doc.diagnostics());
    assert_eq!(unknown[0].arguments, vec!["@bnd:event", "Counter"]);
    assert_eq!(components(&doc).len(), 1);
}

#[test]
fn capture_does_not_swallow_unknown_modifiers() {
    let descriptor = counter().with_attribute(
        BoundAttributeDescriptor::property("Extra", "Dictionary<string, object>").capturing(),
    );
    let doc = compile_component("<Counter title=\"t\" @bnd:event=\"x\" />", &set(vec![descriptor]));
    assert_eq!(codes(&doc), vec![ErrorCode::UNKNOWN_ATTRIBUTE]);
}

// ══════════════════════════════════════════════════════════════════════════════
// 3. Type arguments
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn explicit_type_argument() {
    let doc = compile_component(
        "<Grid TItem=\"string\" Items=\"@items\" />\n@code { string[] items; }",
        &set(vec![grid()]),
    );
    assert!(codes(&doc).is_empty(), "{:?}", doc.diagnostics());
    let IrKind::Component { type_arguments, .. } = doc.ir().kind(only_component(&doc)) else {
        unreachable!()
    };
    assert_eq!(
        type_arguments,
        &vec![TypeArgument {
            parameter: "TItem".into(),
            value: Some("string".into()),
        }]
    );
    assert!(doc
        .generated_code()
        .contains("__builder.OpenComponent<global::App.Grid<string>>("));
}

#[test]
fn inferred_type_argument() {
    let doc = compile_component(
        "<Grid Items=\"@items\" />\n@code { string[] items; }",
        &set(vec![grid()]),
    );
    assert!(codes(&doc).is_empty(), "{:?}", doc.diagnostics());
    let IrKind::Component { type_arguments, .. } = doc.ir().kind(only_component(&doc)) else {
        unreachable!()
    };
    assert_eq!(type_arguments.len(), 1);
    assert_eq!(type_arguments[0].value, None);
    assert!(doc.generated_code().contains("internal static class TypeInference"));
}

#[test]
fn missing_type_argument_leaves_markup() {
    let doc = compile_component("<Grid Title=\"People\" />", &set(vec![grid()]));
    let arity = doc.diagnostics().with_code(ErrorCode::TYPE_ARGUMENT_ARITY);
    assert_eq!(arity.len(), 1);
    assert_eq!(arity[0].arguments, vec!["App.Grid", "1", "0"]);
    assert!(components(&doc).is_empty());
    assert_eq!(
        doc.ir()
            .find_all(|k| matches!(k, IrKind::HtmlElement { tag, .. } if tag == "Grid"))
            .len(),
        1
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// 4. Bind syntax
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn malformed_bind_attributes() {
    let empty = ComponentSet::empty();
    let cases = [
        ("<input @bind-=\"x\" />", "missing property name"),
        ("<input @bind />", "missing value"),
        ("<input @bind=\"a @b\" />", "value mixes text and code"),
    ];
    for (text, reason) in cases {
        let doc = compile_component(text, &empty);
        let malformed = doc.diagnostics().with_code(ErrorCode::MALFORMED_BIND);
        assert_eq!(malformed.len(), 1, "{text}: {:?}", doc.diagnostics());
        assert_eq!(malformed[0].arguments[1], reason, "{text}");
    }
}

#[test]
fn well_formed_element_bind_is_clean() {
    let doc = compile_component(
        "<input @bind=\"name\" />\n@code { string name; }",
        &ComponentSet::empty(),
    );
    assert!(codes(&doc).is_empty(), "{:?}", doc.diagnostics());
}

// ══════════════════════════════════════════════════════════════════════════════
// 5. Descriptor sets
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn descriptors_load_from_json() {
    let json = r#"[
        { "type_name": "App.Counter", "tag_name": "Counter",
          "attributes": [ { "name": "Count", "property_name": "Count", "type_name": "int" } ] }
    ]"#;
    let loaded = ComponentSet::from_json(json).unwrap();
    assert_eq!(loaded.len(), 1);
    let doc = compile_component("<Counter Count=\"3\" />", &loaded);
    assert!(codes(&doc).is_empty());
    assert_eq!(components(&doc).len(), 1);
}

#[test]
fn binding_is_deterministic() {
    let all = set(vec![counter(), grid(), field()]);
    let text = "<Counter Count=\"1\" Title=\"x\" />\n<Grid Items=\"@items\" />\n<Field @bind-Value=\"v\" />";
    let reference = compile_component(text, &all);
    for _ in 0..100 {
        let doc = compile_component(text, &all);
        assert_eq!(codes(&doc), codes(&reference));
        assert_eq!(doc.generated_code(), reference.generated_code());
    }
}
