use crate::{ComponentKind, ComponentValue, EntityId};

/// The values of a requested list of component kinds on one entity.
///
/// Kinds appear in request order. A kind the entity does not have maps to `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityComponents {
    pub entity: EntityId,
    pub components: Vec<(ComponentKind, Option<ComponentValue>)>,
}

impl EntityComponents {
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            components: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: ComponentKind, value: Option<ComponentValue>) {
        self.components.push((kind, value));
    }

    pub fn get(&self, kind: &ComponentKind) -> Option<&ComponentValue> {
        self.components
            .iter()
            .find(|(component_kind, _)| component_kind == kind)
            .and_then(|(_, value)| value.as_ref())
    }

    /// Returns true if every requested kind is present
    pub fn is_complete(&self) -> bool {
        self.components.iter().all(|(_, value)| value.is_some())
    }
}
