use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, trace};
use parking_lot::Mutex;

use esnet_shared::{
    ClientRequest, ComponentFilter, ComponentKind, EntityChange, EntityComponents, EntityId,
    EntityStore, Frame, HostMessage, RequestId, SetId, StringId, WatchId,
};

use crate::{connection::connection::Connection, EntityHostSettings, HostError};

use super::{
    component_usage_tracker::ComponentUsageTracker,
    interest_registry::{entity_data_message, InterestRegistry},
    local_view::LocalView,
};

/// State owned by the update tick. Buffers are reused between ticks.
struct TickState {
    tracker: ComponentUsageTracker,
    frame: Frame,
    frame_changes: Vec<EntityChange>,
    entity_buffer: Vec<EntityComponents>,
    change_list: Vec<EntityChange>,
    outbound: Vec<HostMessage>,
}

impl TickState {
    fn new() -> Self {
        Self {
            tracker: ComponentUsageTracker::new(),
            frame: 0,
            frame_changes: Vec::new(),
            entity_buffer: Vec::new(),
            change_list: Vec::new(),
            outbound: Vec::new(),
        }
    }
}

/// Per-connection access to the shared entity store, and the book-keeping of
/// what that connection's client currently knows.
///
/// Request handlers may be called from any thread. [`HostedEntityData::send_updates`]
/// is called periodically and sends the client everything that changed in
/// the sets and entities it is interested in.
pub struct HostedEntityData {
    settings: EntityHostSettings,
    connection: Arc<dyn Connection>,
    view: LocalView,
    registry: InterestRegistry,
    closing: AtomicBool,
    tick: Mutex<TickState>,
}

impl HostedEntityData {
    pub fn new(
        settings: EntityHostSettings,
        connection: Arc<dyn Connection>,
        store: Arc<dyn EntityStore>,
    ) -> Self {
        debug!("HostedEntityData: created on channel {}", settings.channel);
        Self {
            settings,
            connection,
            view: LocalView::new(store),
            registry: InterestRegistry::new(),
            closing: AtomicBool::new(false),
            tick: Mutex::new(TickState::new()),
        }
    }

    pub fn settings(&self) -> &EntityHostSettings {
        &self.settings
    }

    pub fn registry(&self) -> &InterestRegistry {
        &self.registry
    }

    pub fn view(&self) -> &LocalView {
        &self.view
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// Releases every set and watch and detaches from the store. Only the
    /// first call does any work.
    pub fn close(&self) {
        if self
            .closing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        debug!(
            "HostedEntityData: closing with {} sets and {} watches",
            self.registry.set_count(),
            self.registry.watch_count()
        );
        self.registry.close(&self.view);
        self.view.close();
    }

    // Requests

    pub fn handle_request(&self, request: ClientRequest) -> Result<(), HostError> {
        trace!("HostedEntityData: {:?}", request);

        match request {
            ClientRequest::GetComponents {
                request_id,
                entity,
                kinds,
            } => {
                self.get_components(request_id, &entity, &kinds);
                Ok(())
            }
            ClientRequest::FindEntities {
                request_id,
                filter,
                kinds,
            } => {
                self.find_entities(request_id, filter.as_ref(), &kinds);
                Ok(())
            }
            ClientRequest::FindEntity {
                request_id,
                filter,
                kinds,
            } => {
                self.find_entity(request_id, filter.as_ref(), &kinds);
                Ok(())
            }
            ClientRequest::WatchEntity {
                request_id,
                watch_id,
                entity,
                kinds,
            } => self.watch_entity(request_id, watch_id, entity, kinds),
            ClientRequest::ReleaseWatchedEntity { watch_id } => {
                self.release_watched_entity(watch_id);
                Ok(())
            }
            ClientRequest::GetEntitySet {
                set_id,
                filter,
                kinds,
            } => self.get_entity_set(set_id, filter, kinds),
            ClientRequest::ResetEntitySetFilter { set_id, filter } => {
                self.reset_entity_set_filter(set_id, filter)
            }
            ClientRequest::ReleaseEntitySet { set_id } => {
                self.release_entity_set(set_id);
                Ok(())
            }
            ClientRequest::StringId {
                request_id,
                id,
                string,
            } => self.get_string_info(request_id, id, string),
        }
    }

    pub fn get_components(
        &self,
        request_id: RequestId,
        entity: &EntityId,
        kinds: &[ComponentKind],
    ) {
        let result = self.view.get_entity(entity, kinds);
        trace!("HostedEntityData: sending back entity data {:?}", result);
        self.send(HostMessage::ResultComponents {
            request_id,
            entity: result,
        });
    }

    pub fn find_entities(
        &self,
        request_id: RequestId,
        filter: Option<&ComponentFilter>,
        kinds: &[ComponentKind],
    ) {
        let entities = self.view.find_entities(filter, kinds);
        trace!("HostedEntityData: sending back {} entity ids", entities.len());
        self.send(HostMessage::EntityIds {
            request_id,
            entities,
        });
    }

    pub fn find_entity(
        &self,
        request_id: RequestId,
        filter: Option<&ComponentFilter>,
        kinds: &[ComponentKind],
    ) {
        let entities: Vec<EntityId> = self.view.find_entity(filter, kinds).into_iter().collect();
        trace!("HostedEntityData: sending back entity id {:?}", entities.first());
        self.send(HostMessage::EntityIds {
            request_id,
            entities,
        });
    }

    pub fn watch_entity(
        &self,
        request_id: RequestId,
        watch_id: WatchId,
        entity: EntityId,
        kinds: Vec<ComponentKind>,
    ) -> Result<(), HostError> {
        let result = self.registry.watch(&self.view, watch_id, entity, kinds)?;
        self.send(HostMessage::ResultComponents {
            request_id,
            entity: result,
        });
        Ok(())
    }

    pub fn release_watched_entity(&self, watch_id: WatchId) {
        self.registry.unwatch(watch_id);
    }

    pub fn get_entity_set(
        &self,
        set_id: SetId,
        filter: Option<ComponentFilter>,
        kinds: Vec<ComponentKind>,
    ) -> Result<(), HostError> {
        self.registry.create(
            &self.view,
            self.connection.as_ref(),
            &self.settings,
            set_id,
            filter,
            kinds,
        )
    }

    pub fn reset_entity_set_filter(
        &self,
        set_id: SetId,
        filter: Option<ComponentFilter>,
    ) -> Result<(), HostError> {
        self.registry.reset_filter(set_id, filter)
    }

    /// Releasing a set is safe while a tick is using it; the client may still
    /// receive one last update for it.
    pub fn release_entity_set(&self, set_id: SetId) {
        self.registry.release(&self.view, set_id);
    }

    pub fn get_string_info(
        &self,
        request_id: RequestId,
        id: Option<StringId>,
        string: Option<String>,
    ) -> Result<(), HostError> {
        let reply = match (id, string) {
            (Some(id), None) => HostMessage::StringId {
                request_id,
                id: Some(id),
                string: self.view.string(id),
            },
            (None, Some(string)) => HostMessage::StringId {
                request_id,
                id: self.view.string_id(&string),
                string: Some(string),
            },
            (None, None) => {
                return Err(HostError::MalformedRequest {
                    request: "StringId",
                    reason: "neither id nor string is set",
                })
            }
            (Some(_), Some(_)) => {
                return Err(HostError::MalformedRequest {
                    request: "StringId",
                    reason: "both id and string are set",
                })
            }
        };
        self.send(reply);
        Ok(())
    }

    // Updates

    /// Sends the client every relevant change since the previous call.
    ///
    /// 1. apply store changes to the local view
    /// 2. update every interest set, queueing full snapshots of added entities
    /// 3. 'mark' the tracker with set members, then with watched entities
    /// 4. 'sweep' the tracker with each applied change, sending the ones the
    ///    client cares about
    ///
    /// An entity that left a set this tick still has the change that removed
    /// it delivered. A set or watch released by the client gets nothing more.
    pub fn send_updates(&self) {
        if self.is_closing() {
            return;
        }

        let Some(mut guard) = self.tick.try_lock() else {
            debug!("HostedEntityData: previous update still running, skipping");
            return;
        };
        let tick = &mut *guard;

        tick.frame += 1;
        let frame = tick.frame;

        tick.frame_changes.clear();
        tick.entity_buffer.clear();
        tick.change_list.clear();
        tick.outbound.clear();

        let interest_changed = self.registry.take_interest_changed();
        if !self.view.apply_changes(&mut tick.frame_changes) && !interest_changed {
            return;
        }

        // Released sets and watches leave entries behind; marking rebuilds the rest
        if interest_changed {
            tick.tracker.clear();
        }

        // Update the sets and mark their members
        let entity_limit = self.settings.entity_batch_limit();
        let mut membership_changed = false;
        {
            let _update_guard = self.registry.lock_updates();

            for (set_id, set) in self.registry.active_sets() {
                let mut set = set.lock();

                if set.apply_changes(self.view.store()) {
                    for entity in set.added_entities() {
                        tick.entity_buffer
                            .push(self.view.get_entity(entity, set.kinds()));
                        if tick.entity_buffer.len() >= entity_limit {
                            tick.outbound
                                .push(entity_data_message(set_id, &mut tick.entity_buffer));
                        }
                    }
                    if !tick.entity_buffer.is_empty() {
                        tick.outbound
                            .push(entity_data_message(set_id, &mut tick.entity_buffer));
                    }

                    if set.has_membership_changes() {
                        membership_changed = true;
                        for kind in set.kinds() {
                            tick.tracker
                                .set_expiring(set.removed_entities(), kind, frame);
                        }
                    }
                }
                set.clear_change_sets();

                for kind in set.kinds() {
                    tick.tracker.set(set.entity_ids(), kind, frame);
                }
            }
        }

        for message in tick.outbound.drain(..) {
            self.connection.send(self.settings.channel, message);
        }

        // Mark watched entities
        for watched in self.registry.watched() {
            for kind in &watched.kinds {
                tick.tracker
                    .set(std::iter::once(&watched.entity), kind, frame);
            }
        }

        // Sweep
        let change_limit = self.settings.change_batch_limit();
        for change in tick.frame_changes.drain(..) {
            if tick
                .tracker
                .get_and_expire(&change.entity, &change.kind, frame)
                .is_none()
            {
                continue;
            }

            tick.change_list.push(change);
            if tick.change_list.len() >= change_limit {
                self.send_changes(&mut tick.change_list);
            }
        }
        if !tick.change_list.is_empty() {
            self.send_changes(&mut tick.change_list);
        }

        if membership_changed {
            let expired = tick.tracker.expire_older_than(frame);
            if expired > 0 {
                trace!(
                    "HostedEntityData: frame {} expired {} tracked components",
                    frame,
                    expired
                );
            }
        }
    }

    fn send_changes(&self, buffer: &mut Vec<EntityChange>) {
        self.send(HostMessage::ComponentChange {
            changes: std::mem::take(buffer),
        });
    }

    fn send(&self, message: HostMessage) {
        self.connection.send(self.settings.channel, message);
    }

    // Diagnostics

    /// Frame of the most recent tick
    pub fn frame(&self) -> Frame {
        self.tick.lock().frame
    }

    /// Returns true if changes to this component would be sent to the client
    pub fn is_tracking(&self, entity: &EntityId, kind: &ComponentKind) -> bool {
        self.tick.lock().tracker.contains(entity, kind)
    }

    /// Number of (entity, component) pairs the client is currently interested in
    pub fn tracked_count(&self) -> usize {
        self.tick.lock().tracker.len()
    }
}

impl Drop for HostedEntityData {
    fn drop(&mut self) {
        self.close();
    }
}
