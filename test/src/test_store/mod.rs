/// Simple in-memory EntityStore for integration testing

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use esnet_shared::{
    ComponentFilter, ComponentKind, ComponentValue, EntityChange, EntityChangeListener, EntityId,
    EntityStore, ListenerKey, StringId,
};

type Components = HashMap<ComponentKind, ComponentValue>;

// TestStore - BTreeMap-based store, so queries return entities in id order
pub struct TestStore {
    entities: Mutex<BTreeMap<EntityId, Components>>,
    listeners: Mutex<HashMap<ListenerKey, Arc<dyn EntityChangeListener>>>,
    strings: Mutex<Vec<String>>,
    next_entity: AtomicU64,
    next_listener: AtomicU64,
}

impl Default for TestStore {
    fn default() -> Self {
        Self {
            entities: Mutex::new(BTreeMap::new()),
            listeners: Mutex::new(HashMap::new()),
            strings: Mutex::new(Vec::new()),
            next_entity: AtomicU64::new(1),
            next_listener: AtomicU64::new(0),
        }
    }
}

impl TestStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Allocates a fresh entity id. The entity exists once it has a component.
    pub fn create_entity(&self) -> EntityId {
        EntityId::new(self.next_entity.fetch_add(1, Ordering::Relaxed))
    }

    pub fn set_component(
        &self,
        entity: EntityId,
        kind: ComponentKind,
        value: impl Into<ComponentValue>,
    ) {
        let value = value.into();
        self.entities
            .lock()
            .entry(entity)
            .or_default()
            .insert(kind, value.clone());
        self.notify(EntityChange::set(entity, kind, value));
    }

    pub fn remove_component(&self, entity: EntityId, kind: ComponentKind) {
        let removed = {
            let mut entities = self.entities.lock();
            let Some(components) = entities.get_mut(&entity) else {
                return;
            };
            let removed = components.remove(&kind).is_some();
            if components.is_empty() {
                entities.remove(&entity);
            }
            removed
        };
        if removed {
            self.notify(EntityChange::removed(entity, kind));
        }
    }

    /// Removes every component of the entity, one change per component
    pub fn remove_entity(&self, entity: EntityId) {
        let Some(components) = self.entities.lock().remove(&entity) else {
            return;
        };
        let mut kinds: Vec<ComponentKind> = components.into_keys().collect();
        kinds.sort();
        for kind in kinds {
            self.notify(EntityChange::removed(entity, kind));
        }
    }

    /// Interns a string, returning its id
    pub fn intern(&self, text: &str) -> StringId {
        let mut strings = self.strings.lock();
        if let Some(index) = strings.iter().position(|string| string == text) {
            return index as StringId;
        }
        strings.push(text.to_string());
        (strings.len() - 1) as StringId
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.lock().len()
    }

    // Listeners are called outside the data lock
    fn notify(&self, change: EntityChange) {
        let listeners: Vec<Arc<dyn EntityChangeListener>> =
            self.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener.entity_changed(&change);
        }
    }
}

impl EntityStore for TestStore {
    fn component(&self, entity: &EntityId, kind: &ComponentKind) -> Option<ComponentValue> {
        self.entities
            .lock()
            .get(entity)
            .and_then(|components| components.get(kind))
            .cloned()
    }

    fn find_entities(
        &self,
        filter: Option<&ComponentFilter>,
        kinds: &[ComponentKind],
    ) -> Vec<EntityId> {
        let entities = self.entities.lock();
        entities
            .iter()
            .filter(|(_, components)| kinds.iter().all(|kind| components.contains_key(kind)))
            .filter(|(_, components)| match filter {
                Some(filter) => {
                    filter.matches(&|kind: &ComponentKind| components.get(kind).cloned())
                }
                None => true,
            })
            .map(|(entity, _)| *entity)
            .collect()
    }

    fn string(&self, id: StringId) -> Option<String> {
        let index = usize::try_from(id).ok()?;
        self.strings.lock().get(index).cloned()
    }

    fn string_id(&self, text: &str, create: bool) -> Option<StringId> {
        if create {
            return Some(self.intern(text));
        }
        self.strings
            .lock()
            .iter()
            .position(|string| string == text)
            .map(|index| index as StringId)
    }

    fn add_change_listener(&self, listener: Arc<dyn EntityChangeListener>) -> ListenerKey {
        let key = ListenerKey::new(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().insert(key, listener);
        key
    }

    fn remove_change_listener(&self, key: &ListenerKey) {
        self.listeners.lock().remove(key);
    }
}
