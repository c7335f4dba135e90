use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use dashmap::{mapref::entry::Entry, DashMap};
use log::{debug, trace};
use parking_lot::{Mutex, MutexGuard};

use esnet_shared::{
    ComponentFilter, ComponentKind, EntityComponents, EntityId, HostMessage, SetId, WatchId,
};

use crate::{connection::connection::Connection, EntityHostSettings, HostError};

use super::{
    interest_set::InterestSet,
    local_view::{InboxKey, LocalView},
};

pub(crate) type SharedInterestSet = Arc<Mutex<InterestSet>>;

enum SetSlot {
    /// Id is reserved by the creator holding this token while the initial
    /// dump is being sent
    Initializing(u64),
    Active(SharedInterestSet),
}

impl SetSlot {
    fn is_reserved_by(&self, token: u64) -> bool {
        matches!(self, SetSlot::Initializing(reserved) if *reserved == token)
    }
}

// Reservation
/// A creator's claim on a set id. Dropping it without `disarm` gives the id
/// back, if it is still this claim's, and detaches the set's inbox.
struct Reservation<'a> {
    sets: &'a DashMap<SetId, SetSlot>,
    view: &'a LocalView,
    set_id: SetId,
    token: u64,
    inbox_key: Option<InboxKey>,
    armed: bool,
}

impl Reservation<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let token = self.token;
        self.sets
            .remove_if(&self.set_id, |_, slot| slot.is_reserved_by(token));
        if let Some(inbox_key) = self.inbox_key {
            self.view.detach(inbox_key);
        }
    }
}

/// An entity tracked individually, outside of any interest set
#[derive(Clone, Debug, PartialEq)]
pub struct WatchedEntity {
    pub entity: EntityId,
    pub kinds: Vec<ComponentKind>,
}

/// A connection's active interest sets and watched entities.
///
/// Sets and watches live in concurrent tables so request handlers can add and
/// remove them while a tick is running. The only operations that must not
/// interleave with a tick's set phase are filter resets, which take the
/// update lock.
pub struct InterestRegistry {
    sets: DashMap<SetId, SetSlot>,
    watches: DashMap<WatchId, WatchedEntity>,
    next_token: AtomicU64,
    update_lock: Mutex<()>,
    interest_changed: AtomicBool,
    closed: AtomicBool,
}

impl InterestRegistry {
    pub fn new() -> Self {
        Self {
            sets: DashMap::new(),
            watches: DashMap::new(),
            next_token: AtomicU64::new(0),
            update_lock: Mutex::new(()),
            interest_changed: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    // Interest sets

    /// Creates a set and sends its full current contents to the client in
    /// batches. The set only becomes visible to ticks once the whole dump has
    /// been sent.
    pub fn create(
        &self,
        view: &LocalView,
        connection: &dyn Connection,
        settings: &EntityHostSettings,
        set_id: SetId,
        filter: Option<ComponentFilter>,
        kinds: Vec<ComponentKind>,
    ) -> Result<(), HostError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HostError::ConnectionClosed {
                operation: "create an entity set",
            });
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        match self.sets.entry(set_id) {
            Entry::Occupied(_) => return Err(HostError::DuplicateSetId { set_id }),
            Entry::Vacant(entry) => {
                entry.insert(SetSlot::Initializing(token));
            }
        }
        let mut reservation = Reservation {
            sets: &self.sets,
            view,
            set_id,
            token,
            inbox_key: None,
            armed: true,
        };

        let set = view.entity_set(filter, kinds);
        reservation.inbox_key = Some(set.inbox_key());
        debug!(
            "InterestRegistry: created set {} with {} entities",
            set_id,
            set.len()
        );

        let batch_limit = settings.entity_batch_limit();
        let mut batch = Vec::with_capacity(batch_limit);
        for entity in set.entity_ids() {
            batch.push(view.get_entity(entity, set.kinds()));
            if batch.len() >= batch_limit {
                connection.send(settings.channel, entity_data_message(set_id, &mut batch));
            }
        }
        if !batch.is_empty() {
            connection.send(settings.channel, entity_data_message(set_id, &mut batch));
        }

        // Only activate our own reservation; the id may have been released
        // and reserved again while the dump was being sent
        let set = Arc::new(Mutex::new(set));
        let activated = match self.sets.get_mut(&set_id) {
            Some(mut slot) if slot.is_reserved_by(token) => {
                *slot = SetSlot::Active(set.clone());
                true
            }
            _ => false,
        };

        if !activated {
            debug!(
                "InterestRegistry: set {} was released before it became active",
                set_id
            );
            drop(reservation);
            set.lock().release();
            return Ok(());
        }
        reservation.disarm();

        if self.closed.load(Ordering::Acquire) {
            // close() ran during the dump and missed this set
            self.release(view, set_id);
            return Ok(());
        }

        self.interest_changed.store(true, Ordering::Release);
        Ok(())
    }

    /// Swaps the filter of an active set. Holds the update lock so a tick
    /// never sees a set change filters halfway through its set phase.
    pub fn reset_filter(
        &self,
        set_id: SetId,
        filter: Option<ComponentFilter>,
    ) -> Result<(), HostError> {
        let _guard = self.update_lock.lock();

        let set = self
            .active_set(&set_id)
            .ok_or(HostError::SetNotFound { set_id })?;

        if set.lock().reset_filter(filter) {
            self.interest_changed.store(true, Ordering::Release);
        } else {
            trace!("InterestRegistry: set {} filter unchanged", set_id);
        }
        Ok(())
    }

    /// Releases a set. Unknown ids are tolerated so release is idempotent.
    /// Returns true if a set was released.
    pub fn release(&self, view: &LocalView, set_id: SetId) -> bool {
        match self.sets.remove(&set_id) {
            Some((_, SetSlot::Active(set))) => {
                let mut set = set.lock();
                view.detach(set.inbox_key());
                set.release();
                self.interest_changed.store(true, Ordering::Release);
                true
            }
            Some((_, SetSlot::Initializing(_))) => {
                // create() notices its reservation is gone and releases the set itself
                true
            }
            None => {
                debug!("InterestRegistry: release of unknown set {}", set_id);
                false
            }
        }
    }

    pub fn contains_set(&self, set_id: &SetId) -> bool {
        self.active_set(set_id).is_some()
    }

    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    fn active_set(&self, set_id: &SetId) -> Option<SharedInterestSet> {
        self.sets.get(set_id).and_then(|slot| match slot.value() {
            SetSlot::Active(set) => Some(set.clone()),
            SetSlot::Initializing(_) => None,
        })
    }

    /// Snapshot of every active set
    pub(crate) fn active_sets(&self) -> Vec<(SetId, SharedInterestSet)> {
        self.sets
            .iter()
            .filter_map(|slot| match slot.value() {
                SetSlot::Active(set) => Some((*slot.key(), set.clone())),
                SetSlot::Initializing(_) => None,
            })
            .collect()
    }

    // Watched entities

    /// Registers a watch and returns the entity's current values
    pub fn watch(
        &self,
        view: &LocalView,
        watch_id: WatchId,
        entity: EntityId,
        kinds: Vec<ComponentKind>,
    ) -> Result<EntityComponents, HostError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(HostError::ConnectionClosed {
                operation: "watch an entity",
            });
        }

        let result = view.get_entity(&entity, &kinds);
        match self.watches.entry(watch_id) {
            Entry::Occupied(_) => return Err(HostError::DuplicateWatchId { watch_id }),
            Entry::Vacant(entry) => {
                entry.insert(WatchedEntity { entity, kinds });
            }
        }

        self.interest_changed.store(true, Ordering::Release);
        Ok(result)
    }

    /// Stops tracking a watch. Unknown ids are tolerated.
    pub fn unwatch(&self, watch_id: WatchId) -> bool {
        if self.watches.remove(&watch_id).is_some() {
            self.interest_changed.store(true, Ordering::Release);
            true
        } else {
            debug!("InterestRegistry: release of unknown watch {}", watch_id);
            false
        }
    }

    pub fn contains_watch(&self, watch_id: &WatchId) -> bool {
        self.watches.contains_key(watch_id)
    }

    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    /// Snapshot of every watched entity
    pub(crate) fn watched(&self) -> Vec<WatchedEntity> {
        self.watches
            .iter()
            .map(|watched| watched.value().clone())
            .collect()
    }

    // Tick coordination

    pub(crate) fn lock_updates(&self) -> MutexGuard<'_, ()> {
        self.update_lock.lock()
    }

    /// Returns whether interest changed since the last call, clearing the flag
    pub(crate) fn take_interest_changed(&self) -> bool {
        self.interest_changed.swap(false, Ordering::AcqRel)
    }

    /// Releases every set and watch. Later registrations are refused.
    pub fn close(&self, view: &LocalView) {
        self.closed.store(true, Ordering::Release);

        let set_ids: Vec<SetId> = self.sets.iter().map(|slot| *slot.key()).collect();
        for set_id in set_ids {
            self.release(view, set_id);
        }
        self.watches.clear();
    }
}

impl Default for InterestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn entity_data_message(
    set_id: SetId,
    batch: &mut Vec<EntityComponents>,
) -> HostMessage {
    HostMessage::EntityData {
        set_id,
        entities: std::mem::take(batch),
    }
}
