use std::sync::Arc;

use crate::{
    ComponentFilter, ComponentKind, ComponentValue, EntityChange, EntityComponents, EntityId,
    StringId,
};

/// Receives every change the store applies. Implementations are called on the
/// mutating thread and should only queue the change.
pub trait EntityChangeListener: Send + Sync {
    fn entity_changed(&self, change: &EntityChange);
}

/// Handle returned when a listener is registered, used to unregister it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerKey(u64);

impl ListenerKey {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

/// A shared, mutable store of entities and their components.
///
/// The store is owned elsewhere; hosts only read from it and observe its
/// change stream.
pub trait EntityStore: Send + Sync {
    /// Current value of one component, if the entity has it
    fn component(&self, entity: &EntityId, kind: &ComponentKind) -> Option<ComponentValue>;

    /// Every entity that has all `kinds` and passes `filter`
    fn find_entities(
        &self,
        filter: Option<&ComponentFilter>,
        kinds: &[ComponentKind],
    ) -> Vec<EntityId>;

    /// Looks up an interned string by id
    fn string(&self, id: StringId) -> Option<String>;

    /// Looks up the id of an interned string, interning it when `create` is set
    fn string_id(&self, text: &str, create: bool) -> Option<StringId>;

    fn add_change_listener(&self, listener: Arc<dyn EntityChangeListener>) -> ListenerKey;

    fn remove_change_listener(&self, key: &ListenerKey);

    // Provided

    fn get_entity(&self, entity: &EntityId, kinds: &[ComponentKind]) -> EntityComponents {
        let mut output = EntityComponents::new(*entity);
        for kind in kinds {
            output.push(*kind, self.component(entity, kind));
        }
        output
    }

    fn find_entity(
        &self,
        filter: Option<&ComponentFilter>,
        kinds: &[ComponentKind],
    ) -> Option<EntityId> {
        self.find_entities(filter, kinds).into_iter().next()
    }

    /// Returns true if the entity has all `kinds` and passes `filter`
    fn matches(
        &self,
        entity: &EntityId,
        filter: Option<&ComponentFilter>,
        kinds: &[ComponentKind],
    ) -> bool {
        if !kinds
            .iter()
            .all(|kind| self.component(entity, kind).is_some())
        {
            return false;
        }
        match filter {
            Some(filter) => filter.matches(&|kind: &ComponentKind| self.component(entity, kind)),
            None => true,
        }
    }
}
