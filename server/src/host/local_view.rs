use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use dashmap::DashMap;
use log::{debug, trace};
use parking_lot::Mutex;

use esnet_shared::{
    ComponentFilter, ComponentKind, EntityChange, EntityChangeListener, EntityComponents,
    EntityId, EntityStore, ListenerKey, StringId,
};

use super::interest_set::InterestSet;

// ChangeQueue
/// Store listener that holds change events until the next tick pulls them
struct ChangeQueue {
    pending: Mutex<Vec<EntityChange>>,
}

impl ChangeQueue {
    fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    fn take(&self) -> Vec<EntityChange> {
        std::mem::take(&mut *self.pending.lock())
    }
}

impl EntityChangeListener for ChangeQueue {
    fn entity_changed(&self, change: &EntityChange) {
        self.pending.lock().push(change.clone());
    }
}

// ChangeInbox
/// Entities changed since an interest set last applied its changes
pub(crate) struct ChangeInbox {
    entities: Mutex<Vec<EntityId>>,
}

impl ChangeInbox {
    fn new() -> Self {
        Self {
            entities: Mutex::new(Vec::new()),
        }
    }

    fn extend(&self, changes: &[EntityChange]) {
        let mut entities = self.entities.lock();
        entities.extend(changes.iter().map(|change| change.entity));
    }

    /// Takes every queued entity, in first-seen order and without duplicates
    pub(crate) fn drain(&self) -> Vec<EntityId> {
        let mut entities = std::mem::take(&mut *self.entities.lock());
        let mut seen = HashSet::with_capacity(entities.len());
        entities.retain(|entity| seen.insert(*entity));
        entities
    }
}

pub(crate) type InboxKey = u64;

/// A per-connection passthrough over the store.
///
/// Store changes are queued as they happen and only become visible to this
/// connection's interest sets when [`LocalView::apply_changes`] runs, so that
/// every set and the raw change list observe the same cut of mutations.
pub struct LocalView {
    store: Arc<dyn EntityStore>,
    queue: Arc<ChangeQueue>,
    listener_key: ListenerKey,
    inboxes: DashMap<InboxKey, Arc<ChangeInbox>>,
    next_inbox_key: AtomicU64,
    closed: AtomicBool,
}

impl LocalView {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        let queue = Arc::new(ChangeQueue::new());
        let listener_key = store.add_change_listener(queue.clone());
        Self {
            store,
            queue,
            listener_key,
            inboxes: DashMap::new(),
            next_inbox_key: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    /// Pulls every change queued since the previous call, hands the changed
    /// entities to each live interest set, and appends the changes to
    /// `buffer` in arrival order. Returns true if anything was pulled.
    pub fn apply_changes(&self, buffer: &mut Vec<EntityChange>) -> bool {
        let changes = self.queue.take();
        if changes.is_empty() {
            return false;
        }

        for inbox in self.inboxes.iter() {
            inbox.value().extend(&changes);
        }

        trace!("LocalView: applying {} changes", changes.len());
        buffer.extend(changes);
        true
    }

    // Passthrough queries

    pub fn get_entity(&self, entity: &EntityId, kinds: &[ComponentKind]) -> EntityComponents {
        self.store.get_entity(entity, kinds)
    }

    pub fn find_entities(
        &self,
        filter: Option<&ComponentFilter>,
        kinds: &[ComponentKind],
    ) -> Vec<EntityId> {
        self.store.find_entities(filter, kinds)
    }

    pub fn find_entity(
        &self,
        filter: Option<&ComponentFilter>,
        kinds: &[ComponentKind],
    ) -> Option<EntityId> {
        self.store.find_entity(filter, kinds)
    }

    pub fn string(&self, id: StringId) -> Option<String> {
        self.store.string(id)
    }

    pub fn string_id(&self, text: &str) -> Option<StringId> {
        self.store.string_id(text, false)
    }

    // Interest sets

    /// Creates an interest set fed by this view. The set's inbox is attached
    /// before the initial query so no change can fall between the two.
    pub fn entity_set(
        &self,
        filter: Option<ComponentFilter>,
        kinds: Vec<ComponentKind>,
    ) -> InterestSet {
        let inbox_key = self.next_inbox_key.fetch_add(1, Ordering::Relaxed);
        let inbox = Arc::new(ChangeInbox::new());
        self.inboxes.insert(inbox_key, inbox.clone());

        let members = self.store.find_entities(filter.as_ref(), &kinds);
        InterestSet::new(inbox_key, inbox, filter, kinds, members)
    }

    /// Number of sets currently fed by this view
    pub fn attached_set_count(&self) -> usize {
        self.inboxes.len()
    }

    /// Stops feeding changes to a released set
    pub(crate) fn detach(&self, inbox_key: InboxKey) {
        self.inboxes.remove(&inbox_key);
    }

    pub fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        debug!("LocalView: closing, detaching {} sets", self.inboxes.len());
        self.store.remove_change_listener(&self.listener_key);
        self.inboxes.clear();
        self.queue.take();
    }
}
