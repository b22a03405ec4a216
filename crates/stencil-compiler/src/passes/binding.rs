//! Component and attribute binding.
//!
//! Every `HtmlElement` whose tag matches a component descriptor becomes a
//! `Component`, and each of its attributes becomes a `ComponentAttribute`
//! describing how it binds. Binding only applies to component documents;
//! views keep their elements as markup.
//!
//! Resolution order for one element:
//!
//! 1. Pick the descriptor: a short-name match wins over a fully-qualified
//!    one. Two distinct candidates of the winning kind are ambiguous
//!    (E302); the first one is still bound.
//! 2. Check type parameters: each must be given explicitly or be inferable
//!    from an attribute whose property type mentions it. Otherwise the
//!    element stays markup (E301).
//! 3. Resolve each attribute: direct parameter or type argument, two-way
//!    `bind-X`, capture-unmatched, and finally E300.

use std::collections::HashSet;

use stencil_types::ir::{AttributeBinding, TypeArgument};
use stencil_types::{
    BoundAttributeDescriptor, ComponentDescriptor, Diagnostic, DocumentShape, ErrorCode,
    IrDocument, IrKind, IrNodeId,
};

use super::{IrPass, PassContext};

pub struct ComponentBindingPass;

impl ComponentBindingPass {
    pub const NAME: &'static str = "component-binding";
}

impl IrPass for ComponentBindingPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&self, ir: &mut IrDocument, cx: &PassContext<'_>) {
        // Pages and legacy views render elements as literal markup; only
        // component documents instantiate components.
        if ir.shape() != DocumentShape::Component {
            return;
        }
        for element in ir.find_all(|k| matches!(k, IrKind::HtmlElement { .. })) {
            bind_element(ir, element, cx);
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Elements
// ══════════════════════════════════════════════════════════════════════════════

fn bind_element(ir: &mut IrDocument, element: IrNodeId, cx: &PassContext<'_>) {
    let IrKind::HtmlElement { tag, self_closing } = ir.kind(element).clone() else {
        return;
    };
    let Some(span) = ir.span(element) else {
        return;
    };

    let candidates = cx.components.matching(&tag);
    let (short, qualified): (Vec<&ComponentDescriptor>, Vec<&ComponentDescriptor>) =
        candidates.into_iter().partition(|d| !d.fully_qualified_match);
    let winners = if short.is_empty() { qualified } else { short };

    let Some(&descriptor) = winners.first() else {
        if tag.starts_with(|c: char| c.is_ascii_uppercase()) {
            let diagnostic = Diagnostic::new(cx.source, ErrorCode::UNBOUND_COMPONENT_TAG, [tag.as_str()], span);
            ir.attach(element, diagnostic);
        }
        return;
    };

    let mut distinct: Vec<&str> = Vec::new();
    for d in &winners {
        if !distinct.contains(&d.type_name.as_str()) {
            distinct.push(d.type_name.as_str());
        }
    }
    if distinct.len() > 1 {
        let diagnostic = Diagnostic::new(
            cx.source,
            ErrorCode::AMBIGUOUS_COMPONENT,
            [tag.clone(), distinct.join(", ")],
            span,
        );
        ir.attach(element, diagnostic);
    }

    let attributes: Vec<(IrNodeId, String)> = ir
        .children(element)
        .iter()
        .filter_map(|&c| match ir.kind(c) {
            IrKind::HtmlAttribute { name, .. } => Some((c, name.clone())),
            _ => None,
        })
        .collect();

    let Some(type_arguments) = resolve_type_arguments(ir, descriptor, &attributes) else {
        let supplied = descriptor
            .type_parameters
            .iter()
            .filter(|p| is_supplied(descriptor, p, &attributes))
            .count();
        let diagnostic = Diagnostic::new(
            cx.source,
            ErrorCode::TYPE_ARGUMENT_ARITY,
            [
                descriptor.type_name.clone(),
                descriptor.type_parameters.len().to_string(),
                supplied.to_string(),
            ],
            span,
        );
        ir.attach(element, diagnostic);
        return;
    };

    let mut bound_properties = HashSet::new();
    for (attribute, name) in attributes {
        bind_attribute(ir, attribute, &name, &tag, descriptor, &mut bound_properties, cx);
    }

    ir.set_kind(
        element,
        IrKind::Component {
            tag,
            type_name: descriptor.type_name.clone(),
            type_arguments,
            self_closing,
        },
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Type Parameters
// ══════════════════════════════════════════════════════════════════════════════

/// The property an attribute would set, ignoring type parameters.
fn target_property<'d>(descriptor: &'d ComponentDescriptor, name: &str) -> Option<&'d BoundAttributeDescriptor> {
    if let Some(attr) = descriptor.attribute(name) {
        return Some(attr);
    }
    let property = bind_target(name)?;
    descriptor.property(property).or_else(|| descriptor.attribute(property))
}

/// `X` of `bind-X` / `@bind-X`.
fn bind_target(name: &str) -> Option<&str> {
    let rest = name.strip_prefix('@').unwrap_or(name);
    rest.strip_prefix("bind-").filter(|p| !p.is_empty() && !p.contains(':'))
}

fn is_explicit(parameter: &str, attributes: &[(IrNodeId, String)]) -> bool {
    attributes.iter().any(|(_, name)| name == parameter)
}

fn is_inferred(descriptor: &ComponentDescriptor, parameter: &str, attributes: &[(IrNodeId, String)]) -> bool {
    attributes.iter().any(|(_, name)| {
        target_property(descriptor, name).is_some_and(|p| p.mentions_type(parameter))
    })
}

fn is_supplied(descriptor: &ComponentDescriptor, parameter: &str, attributes: &[(IrNodeId, String)]) -> bool {
    is_explicit(parameter, attributes) || is_inferred(descriptor, parameter, attributes)
}

/// One argument per declared parameter, or `None` when any is missing.
fn resolve_type_arguments(
    ir: &IrDocument,
    descriptor: &ComponentDescriptor,
    attributes: &[(IrNodeId, String)],
) -> Option<Vec<TypeArgument>> {
    let mut arguments = Vec::with_capacity(descriptor.type_parameters.len());
    for parameter in &descriptor.type_parameters {
        let explicit = attributes.iter().find(|(_, name)| name == parameter);
        let value = match explicit {
            Some(&(attribute, _)) => Some(attribute_text(ir, attribute)),
            None if is_inferred(descriptor, parameter, attributes) => None,
            None => return None,
        };
        arguments.push(TypeArgument {
            parameter: parameter.clone(),
            value,
        });
    }
    Some(arguments)
}

/// Literal text of an attribute value, code parts included verbatim.
fn attribute_text(ir: &IrDocument, attribute: IrNodeId) -> String {
    let mut text = String::new();
    for &part in ir.children(attribute) {
        match ir.kind(part) {
            IrKind::HtmlAttributeValue { text: t } => text.push_str(t),
            IrKind::CSharpExpression { .. } => text.push_str(&ir.code_text(part)),
            _ => {}
        }
    }
    text.trim().to_string()
}

// ══════════════════════════════════════════════════════════════════════════════
// Attributes
// ══════════════════════════════════════════════════════════════════════════════

fn resolve_attribute(descriptor: &ComponentDescriptor, name: &str) -> Option<AttributeBinding> {
    match name {
        "@key" => return Some(AttributeBinding::Key),
        "@ref" => return Some(AttributeBinding::Ref),
        _ => {}
    }
    if descriptor.type_parameters.iter().any(|p| p == name) {
        return Some(AttributeBinding::TypeArgument {
            parameter: name.to_string(),
        });
    }
    if let Some(attr) = descriptor.attribute(name) {
        return Some(AttributeBinding::Parameter {
            property: attr.property_name.clone(),
            type_name: attr.type_name.clone(),
        });
    }
    if let Some(target) = bind_target(name) {
        let property = descriptor.property(target).or_else(|| descriptor.attribute(target));
        let changed = descriptor.property(&format!("{target}Changed"));
        if let (Some(property), Some(changed)) = (property, changed) {
            return Some(AttributeBinding::TwoWay {
                property: property.property_name.clone(),
                changed: changed.property_name.clone(),
                type_name: property.type_name.clone(),
            });
        }
    }
    descriptor.capture().map(|capture| AttributeBinding::CaptureUnmatched {
        property: capture.property_name.clone(),
    })
}

/// Base of a directive modifier such as `@bind-Value:event` or
/// `@onclick:stopPropagation`.
fn modifier_base(name: &str) -> Option<&str> {
    if !name.starts_with('@') {
        return None;
    }
    name.split_once(':').map(|(base, _)| base)
}

/// Directive attributes that accept modifiers.
fn takes_modifiers(base: &str) -> bool {
    base == "@bind" || base.starts_with("@bind-") || (base.starts_with("@on") && base.len() > 3)
}

fn bind_attribute(
    ir: &mut IrDocument,
    attribute: IrNodeId,
    name: &str,
    tag: &str,
    descriptor: &ComponentDescriptor,
    bound_properties: &mut HashSet<String>,
    cx: &PassContext<'_>,
) {
    let Some(span) = ir.span(attribute) else {
        return;
    };
    let binding = match modifier_base(name) {
        Some(base) if takes_modifiers(base) => return,
        Some(_) => None,
        None => resolve_attribute(descriptor, name),
    };
    let Some(binding) = binding else {
        let diagnostic = Diagnostic::new(cx.source, ErrorCode::UNKNOWN_ATTRIBUTE, [name, tag], span);
        ir.attach(attribute, diagnostic);
        return;
    };

    let property = match &binding {
        AttributeBinding::Parameter { property, .. } | AttributeBinding::TwoWay { property, .. } => {
            Some(property.clone())
        }
        _ => None,
    };
    if let Some(property) = property {
        if !bound_properties.insert(property.to_ascii_lowercase()) {
            let diagnostic = Diagnostic::new(
                cx.source,
                ErrorCode::DUPLICATE_COMPONENT_PARAMETER,
                [property.as_str(), tag],
                span,
            );
            ir.attach(attribute, diagnostic);
        }
    }

    ir.set_kind(
        attribute,
        IrKind::ComponentAttribute {
            name: name.to_string(),
            binding,
        },
    );
}
