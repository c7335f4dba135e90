use crate::{ComponentKind, ComponentValue, EntityId};

/// A single mutation of one component on one entity, as reported by the store.
///
/// A `value` of `None` means the component was removed.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityChange {
    pub entity: EntityId,
    pub kind: ComponentKind,
    pub value: Option<ComponentValue>,
}

impl EntityChange {
    pub fn set(entity: EntityId, kind: ComponentKind, value: ComponentValue) -> Self {
        Self {
            entity,
            kind,
            value: Some(value),
        }
    }

    pub fn removed(entity: EntityId, kind: ComponentKind) -> Self {
        Self {
            entity,
            kind,
            value: None,
        }
    }

    pub fn is_removal(&self) -> bool {
        self.value.is_none()
    }
}
