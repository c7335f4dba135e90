use std::sync::Arc;

use esnet_server::{EntityHostSettings, HostedEntityData};
use esnet_shared::{ComponentKind, EntityChange, EntityComponents, HostMessage, SetId};

use crate::{RecordingConnection, TestStore};

pub const POSITION: ComponentKind = ComponentKind::new(1);
pub const HEALTH: ComponentKind = ComponentKind::new(2);
pub const NAME: ComponentKind = ComponentKind::new(3);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A store, a host over it, and the host's recorded connection
pub struct TestHost {
    pub store: Arc<TestStore>,
    pub connection: Arc<RecordingConnection>,
    pub host: HostedEntityData,
}

impl TestHost {
    pub fn new() -> Self {
        Self::with_settings(EntityHostSettings::default())
    }

    pub fn with_settings(settings: EntityHostSettings) -> Self {
        init_logger();
        let store = TestStore::new();
        Self::with_store(store, settings)
    }

    pub fn with_store(store: Arc<TestStore>, settings: EntityHostSettings) -> Self {
        let connection = Arc::new(RecordingConnection::new());
        let host = HostedEntityData::new(settings, connection.clone(), store.clone());
        Self {
            store,
            connection,
            host,
        }
    }

    /// Runs one tick and returns everything it sent
    pub fn tick(&self) -> Vec<HostMessage> {
        self.host.send_updates();
        self.connection.take()
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Every EntityData batch for `set_id`, in send order
pub fn entity_data(messages: &[HostMessage], set_id: SetId) -> Vec<Vec<EntityComponents>> {
    messages
        .iter()
        .filter_map(|message| match message {
            HostMessage::EntityData {
                set_id: id,
                entities,
            } if *id == set_id => Some(entities.clone()),
            _ => None,
        })
        .collect()
}

/// Every ComponentChange batch, in send order
pub fn component_changes(messages: &[HostMessage]) -> Vec<Vec<EntityChange>> {
    messages
        .iter()
        .filter_map(|message| match message {
            HostMessage::ComponentChange { changes } => Some(changes.clone()),
            _ => None,
        })
        .collect()
}
