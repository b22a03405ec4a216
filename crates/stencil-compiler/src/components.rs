//! The validated component descriptor set a compilation binds against.

use std::sync::Arc;

use stencil_types::{ComponentDescriptor, DescriptorError};

use crate::error::CompileError;

/// Immutable, validated collection of component descriptors.
///
/// Cloning shares the underlying list, so one set can serve many
/// concurrent compilations.
#[derive(Debug, Clone, Default)]
pub struct ComponentSet {
    descriptors: Arc<[ComponentDescriptor]>,
}

impl ComponentSet {
    /// A set with no components; every tag stays plain markup.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate every descriptor and freeze the list.
    pub fn new(descriptors: Vec<ComponentDescriptor>) -> Result<Self, DescriptorError> {
        for descriptor in &descriptors {
            descriptor.validate()?;
        }
        Ok(Self {
            descriptors: descriptors.into(),
        })
    }

    /// Decode a JSON array of descriptors, then validate it.
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        let descriptors: Vec<ComponentDescriptor> =
            serde_json::from_str(json).map_err(|e| CompileError::InvalidComponents(e.to_string()))?;
        Ok(Self::new(descriptors)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors whose tag name equals `tag`, in registration order.
    pub fn matching(&self, tag: &str) -> Vec<&ComponentDescriptor> {
        self.descriptors.iter().filter(|d| d.tag_name == tag).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_types::BoundAttributeDescriptor;

    #[test]
    fn test_new_rejects_invalid_descriptor() {
        let bad = ComponentDescriptor::new("App.Counter")
            .with_attribute(BoundAttributeDescriptor::property("Value", "int"))
            .with_attribute(BoundAttributeDescriptor::property("value", "int"));
        let err = ComponentSet::new(vec![bad]).unwrap_err();
        assert!(matches!(err, DescriptorError::DuplicateAttribute { .. }));
    }

    #[test]
    fn test_matching_by_tag() {
        let set = ComponentSet::new(vec![
            ComponentDescriptor::new("App.Counter"),
            ComponentDescriptor::fully_qualified("App.Counter"),
            ComponentDescriptor::new("App.Alert"),
        ])
        .unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.matching("Counter").len(), 1);
        assert_eq!(set.matching("App.Counter").len(), 1);
        assert!(set.matching("counter").is_empty());
    }

    #[test]
    fn test_from_json_reports_decode_errors() {
        let err = ComponentSet::from_json("{not json").unwrap_err();
        assert!(matches!(err, CompileError::InvalidComponents(_)));
    }

    #[test]
    fn test_from_json_roundtrip() {
        let descriptors = vec![ComponentDescriptor::new("App.Grid")
            .with_type_parameter("TItem")
            .with_attribute(BoundAttributeDescriptor::property("Items", "IEnumerable<TItem>"))];
        let json = serde_json::to_string(&descriptors).unwrap();
        let set = ComponentSet::from_json(&json).unwrap();
        assert_eq!(set.iter().next(), descriptors.first());
    }

    #[test]
    fn test_clone_shares_descriptors() {
        let set = ComponentSet::new(vec![ComponentDescriptor::new("App.Alert")]).unwrap();
        let copy = set.clone();
        assert!(Arc::ptr_eq(&set.descriptors, &copy.descriptors));
    }
}
