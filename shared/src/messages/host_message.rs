use crate::{EntityChange, EntityComponents, EntityId, RequestId, SetId, StringId};

/// Messages a host sends to its client, either as a reply or pushed by the
/// update tick
#[derive(Clone, Debug, PartialEq)]
pub enum HostMessage {
    ResultComponents {
        request_id: RequestId,
        entity: EntityComponents,
    },
    EntityIds {
        request_id: RequestId,
        entities: Vec<EntityId>,
    },
    StringId {
        request_id: RequestId,
        id: Option<StringId>,
        string: Option<String>,
    },
    /// Full snapshots of entities that are (newly) members of a set
    EntityData {
        set_id: SetId,
        entities: Vec<EntityComponents>,
    },
    /// Component changes the client is interested in, in store order
    ComponentChange {
        changes: Vec<EntityChange>,
    },
}
