use std::{collections::BTreeSet, sync::Arc};

use esnet_shared::{ComponentFilter, ComponentKind, EntityId, EntityStore};

use super::local_view::{ChangeInbox, InboxKey};

/// A client's live subscription to every entity that has all of `kinds` and
/// passes `filter`.
///
/// Membership is maintained incrementally: each call to
/// [`InterestSet::apply_changes`] re-evaluates only the entities the owning
/// [`LocalView`](super::local_view::LocalView) reported as changed, unless the
/// filter was reset, in which case the whole store is queried again.
pub struct InterestSet {
    inbox_key: InboxKey,
    inbox: Arc<ChangeInbox>,
    filter: Option<ComponentFilter>,
    kinds: Vec<ComponentKind>,
    members: BTreeSet<EntityId>,
    filter_reset: bool,
    released: bool,
    added: Vec<EntityId>,
    removed: Vec<EntityId>,
    changed: Vec<EntityId>,
}

impl InterestSet {
    pub(crate) fn new(
        inbox_key: InboxKey,
        inbox: Arc<ChangeInbox>,
        filter: Option<ComponentFilter>,
        kinds: Vec<ComponentKind>,
        members: Vec<EntityId>,
    ) -> Self {
        Self {
            inbox_key,
            inbox,
            filter,
            kinds,
            members: members.into_iter().collect(),
            filter_reset: false,
            released: false,
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
        }
    }

    pub(crate) fn inbox_key(&self) -> InboxKey {
        self.inbox_key
    }

    pub fn filter(&self) -> Option<&ComponentFilter> {
        self.filter.as_ref()
    }

    pub fn kinds(&self) -> &[ComponentKind] {
        &self.kinds
    }

    /// Current members, in entity id order
    pub fn entity_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.members.iter()
    }

    pub fn contains(&self, entity: &EntityId) -> bool {
        self.members.contains(entity)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Swaps the filter. Returns false, changing nothing, if the new filter
    /// equals the current one.
    pub fn reset_filter(&mut self, filter: Option<ComponentFilter>) -> bool {
        if self.filter == filter {
            return false;
        }
        self.filter = filter;
        self.filter_reset = true;
        true
    }

    /// Brings membership up to date with the store and records what was
    /// added, removed or changed. Returns true if anything was recorded.
    pub fn apply_changes(&mut self, store: &dyn EntityStore) -> bool {
        if self.released {
            return false;
        }

        let changed_entities = self.inbox.drain();

        if self.filter_reset {
            self.filter_reset = false;
            let current: BTreeSet<EntityId> = store
                .find_entities(self.filter.as_ref(), &self.kinds)
                .into_iter()
                .collect();

            self.added
                .extend(current.difference(&self.members).copied());
            self.removed
                .extend(self.members.difference(&current).copied());
            for entity in changed_entities {
                if self.members.contains(&entity) && current.contains(&entity) {
                    self.changed.push(entity);
                }
            }
            self.members = current;
        } else {
            for entity in changed_entities {
                let is_match = store.matches(&entity, self.filter.as_ref(), &self.kinds);
                match (self.members.contains(&entity), is_match) {
                    (true, true) => self.changed.push(entity),
                    (true, false) => {
                        self.members.remove(&entity);
                        self.removed.push(entity);
                    }
                    (false, true) => {
                        self.members.insert(entity);
                        self.added.push(entity);
                    }
                    (false, false) => {}
                }
            }
        }

        !self.added.is_empty() || !self.removed.is_empty() || !self.changed.is_empty()
    }

    pub fn added_entities(&self) -> &[EntityId] {
        &self.added
    }

    pub fn removed_entities(&self) -> &[EntityId] {
        &self.removed
    }

    pub fn changed_entities(&self) -> &[EntityId] {
        &self.changed
    }

    /// Returns true if the last apply added or removed members
    pub fn has_membership_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    pub fn clear_change_sets(&mut self) {
        self.added.clear();
        self.removed.clear();
        self.changed.clear();
    }

    pub(crate) fn release(&mut self) {
        self.released = true;
        self.members.clear();
        self.clear_change_sets();
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}
