//! Descriptors supplied by collaborators: component binding metadata and
//! directive grammars. Both are immutable once built and shared read-only
//! between concurrent compilations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A caller-supplied descriptor broke its contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("component descriptor has an empty {0}")]
    EmptyName(&'static str),
    #[error("component '{component}' declares attribute '{attribute}' more than once")]
    DuplicateAttribute { component: String, attribute: String },
    #[error("component '{0}' declares more than one attribute capturing unmatched values")]
    MultipleCaptures(String),
    #[error("component '{0}' declares an empty type parameter name")]
    EmptyTypeParameter(String),
    #[error("directive name '{0}' is not a lowercase identifier")]
    InvalidDirectiveName(String),
    #[error("directive '{0}' is already registered")]
    DuplicateDirective(String),
    #[error("block directive '{0}' cannot accept a trailing separator")]
    SeparatorOnBlockDirective(String),
}

// ══════════════════════════════════════════════════════════════════════════════
// Components
// ══════════════════════════════════════════════════════════════════════════════

/// One bindable attribute of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundAttributeDescriptor {
    /// Attribute name as written on the element.
    pub name: String,
    /// Host property that receives the value.
    pub property_name: String,
    /// Declared host type of the property.
    pub type_name: String,
    /// Routes every otherwise-unmatched attribute into this property.
    #[serde(default)]
    pub captures_unmatched: bool,
}

impl BoundAttributeDescriptor {
    pub fn new(
        name: impl Into<String>,
        property_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            property_name: property_name.into(),
            type_name: type_name.into(),
            captures_unmatched: false,
        }
    }

    /// Attribute named after its property.
    pub fn property(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name, type_name)
    }

    pub fn capturing(mut self) -> Self {
        self.captures_unmatched = true;
        self
    }

    /// Whether the declared type mentions `param` as a whole identifier.
    pub fn mentions_type(&self, param: &str) -> bool {
        self.type_name
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .any(|part| part == param)
    }
}

/// Binding metadata for one component, computed by an external resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Fully-qualified host type name (`MyApp.Shared.Counter`).
    pub type_name: String,
    /// The tag this descriptor matches.
    pub tag_name: String,
    /// This descriptor embodies the fully-qualified matching rule.
    #[serde(default)]
    pub fully_qualified_match: bool,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<BoundAttributeDescriptor>,
}

impl ComponentDescriptor {
    /// Descriptor matching the short (unqualified) name of `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let tag_name = type_name.rsplit('.').next().unwrap_or(&type_name).to_string();
        Self {
            type_name,
            tag_name,
            fully_qualified_match: false,
            type_parameters: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Descriptor matching the fully-qualified tag `type_name`.
    pub fn fully_qualified(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            tag_name: type_name.clone(),
            type_name,
            fully_qualified_match: true,
            type_parameters: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_tag_name(mut self, tag: impl Into<String>) -> Self {
        self.tag_name = tag.into();
        self
    }

    pub fn with_type_parameter(mut self, name: impl Into<String>) -> Self {
        self.type_parameters.push(name.into());
        self
    }

    pub fn with_attribute(mut self, attribute: BoundAttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Bound attribute by name, ASCII case-insensitive.
    pub fn attribute(&self, name: &str) -> Option<&BoundAttributeDescriptor> {
        self.attributes
            .iter()
            .find(|a| !a.captures_unmatched && a.name.eq_ignore_ascii_case(name))
    }

    /// Bound attribute by property name, ASCII case-insensitive.
    pub fn property(&self, property: &str) -> Option<&BoundAttributeDescriptor> {
        self.attributes
            .iter()
            .find(|a| !a.captures_unmatched && a.property_name.eq_ignore_ascii_case(property))
    }

    /// The attribute capturing unmatched values, if any.
    pub fn capture(&self) -> Option<&BoundAttributeDescriptor> {
        self.attributes.iter().find(|a| a.captures_unmatched)
    }

    /// Short name of the host type.
    pub fn short_name(&self) -> &str {
        self.type_name.rsplit('.').next().unwrap_or(&self.type_name)
    }

    /// Check the descriptor's internal consistency.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.type_name.trim().is_empty() {
            return Err(DescriptorError::EmptyName("type name"));
        }
        if self.tag_name.trim().is_empty() {
            return Err(DescriptorError::EmptyName("tag name"));
        }
        if self.type_parameters.iter().any(|p| p.trim().is_empty()) {
            return Err(DescriptorError::EmptyTypeParameter(self.type_name.clone()));
        }
        let mut seen = std::collections::HashSet::new();
        for attr in &self.attributes {
            if attr.name.trim().is_empty() || attr.property_name.trim().is_empty() {
                return Err(DescriptorError::EmptyName("attribute name"));
            }
            if !seen.insert(attr.name.to_ascii_lowercase()) {
                return Err(DescriptorError::DuplicateAttribute {
                    component: self.type_name.clone(),
                    attribute: attr.name.clone(),
                });
            }
        }
        if self.attributes.iter().filter(|a| a.captures_unmatched).count() > 1 {
            return Err(DescriptorError::MultipleCaptures(self.type_name.clone()));
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Directives
// ══════════════════════════════════════════════════════════════════════════════

/// Line structure of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    /// Tokens on one line.
    SingleLine,
    /// Tokens followed by a `{ ... }` code block.
    CodeBlock,
}

/// How often a directive may appear in one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveUsage {
    Unrestricted,
    SingleOccurrence,
}

/// Shape of one expected directive token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveTokenKind {
    /// `A.B.C`
    Namespace,
    /// `global::A.B<C, D>[]?`
    Type,
    /// `Name`
    Member,
    /// `"text"`
    String,
}

impl std::fmt::Display for DirectiveTokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Namespace => write!(f, "namespace"),
            Self::Type => write!(f, "type name"),
            Self::Member => write!(f, "member name"),
            Self::String => write!(f, "string literal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveTokenDescriptor {
    pub kind: DirectiveTokenKind,
    #[serde(default)]
    pub optional: bool,
    /// Documentation name (`TypeName`, `PropertyName`, ...).
    pub name: String,
}

/// Grammar of one keyword-driven directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveDescriptor {
    pub name: String,
    pub kind: DirectiveKind,
    pub usage: DirectiveUsage,
    pub tokens: Vec<DirectiveTokenDescriptor>,
    /// Accept one `;` after the last token.
    #[serde(default)]
    pub allow_trailing_separator: bool,
}

impl DirectiveDescriptor {
    pub fn single_line(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DirectiveKind::SingleLine,
            usage: DirectiveUsage::Unrestricted,
            tokens: Vec::new(),
            allow_trailing_separator: false,
        }
    }

    pub fn code_block(name: impl Into<String>) -> Self {
        Self {
            kind: DirectiveKind::CodeBlock,
            ..Self::single_line(name)
        }
    }

    pub fn token(mut self, kind: DirectiveTokenKind, name: impl Into<String>) -> Self {
        self.tokens.push(DirectiveTokenDescriptor {
            kind,
            optional: false,
            name: name.into(),
        });
        self
    }

    pub fn optional_token(mut self, kind: DirectiveTokenKind, name: impl Into<String>) -> Self {
        self.tokens.push(DirectiveTokenDescriptor {
            kind,
            optional: true,
            name: name.into(),
        });
        self
    }

    pub fn single_occurrence(mut self) -> Self {
        self.usage = DirectiveUsage::SingleOccurrence;
        self
    }

    pub fn trailing_separator(mut self) -> Self {
        self.allow_trailing_separator = true;
        self
    }
}

/// Directive names recognised by default.
pub mod builtin {
    pub const PAGE: &str = "page";
    pub const USING: &str = "using";
    pub const INHERITS: &str = "inherits";
    pub const IMPLEMENTS: &str = "implements";
    pub const TYPEPARAM: &str = "typeparam";
    pub const INJECT: &str = "inject";
    pub const NAMESPACE: &str = "namespace";
    pub const LAYOUT: &str = "layout";
    pub const CODE: &str = "code";
    pub const FUNCTIONS: &str = "functions";
}

/// Named directives available to the parser, resolved by exact keyword.
#[derive(Debug, Clone, Default)]
pub struct DirectiveRegistry {
    directives: BTreeMap<String, DirectiveDescriptor>,
}

impl DirectiveRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in directive.
    pub fn with_defaults() -> Self {
        use DirectiveTokenKind::*;
        let mut registry = Self::new();
        let defaults = [
            DirectiveDescriptor::single_line(builtin::PAGE).token(String, "Route"),
            DirectiveDescriptor::single_line(builtin::USING)
                .token(Namespace, "Namespace")
                .trailing_separator(),
            DirectiveDescriptor::single_line(builtin::INHERITS)
                .token(Type, "BaseType")
                .single_occurrence(),
            DirectiveDescriptor::single_line(builtin::IMPLEMENTS).token(Type, "Interface"),
            DirectiveDescriptor::single_line(builtin::TYPEPARAM)
                .token(Member, "TypeParameter")
                .trailing_separator(),
            DirectiveDescriptor::single_line(builtin::INJECT)
                .token(Type, "TypeName")
                .token(Member, "PropertyName"),
            DirectiveDescriptor::single_line(builtin::NAMESPACE)
                .token(Namespace, "Namespace")
                .single_occurrence(),
            DirectiveDescriptor::single_line(builtin::LAYOUT)
                .token(Type, "LayoutType")
                .single_occurrence(),
            DirectiveDescriptor::code_block(builtin::CODE),
            DirectiveDescriptor::code_block(builtin::FUNCTIONS),
        ];
        for d in defaults {
            registry.directives.insert(d.name.clone(), d);
        }
        registry
    }

    /// Add a directive. Names must be lowercase identifiers and unique.
    pub fn register(&mut self, descriptor: DirectiveDescriptor) -> Result<(), DescriptorError> {
        let name = &descriptor.name;
        let valid = name.chars().next().is_some_and(|c| c.is_ascii_lowercase())
            && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(DescriptorError::InvalidDirectiveName(name.clone()));
        }
        if descriptor.kind == DirectiveKind::CodeBlock && descriptor.allow_trailing_separator {
            return Err(DescriptorError::SeparatorOnBlockDirective(name.clone()));
        }
        if self.directives.contains_key(name) {
            return Err(DescriptorError::DuplicateDirective(name.clone()));
        }
        self.directives.insert(name.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveDescriptor> {
        self.directives.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directives.contains_key(name)
    }

    /// Directives in name order.
    pub fn iter(&self) -> impl Iterator<Item = &DirectiveDescriptor> {
        self.directives.values()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}
