use crate::{ComponentFilter, ComponentKind, EntityId, RequestId, SetId, StringId, WatchId};

/// Requests a client sends to the host of its connection
#[derive(Clone, Debug, PartialEq)]
pub enum ClientRequest {
    GetComponents {
        request_id: RequestId,
        entity: EntityId,
        kinds: Vec<ComponentKind>,
    },
    FindEntities {
        request_id: RequestId,
        filter: Option<ComponentFilter>,
        kinds: Vec<ComponentKind>,
    },
    FindEntity {
        request_id: RequestId,
        filter: Option<ComponentFilter>,
        kinds: Vec<ComponentKind>,
    },
    WatchEntity {
        request_id: RequestId,
        watch_id: WatchId,
        entity: EntityId,
        kinds: Vec<ComponentKind>,
    },
    ReleaseWatchedEntity {
        watch_id: WatchId,
    },
    GetEntitySet {
        set_id: SetId,
        filter: Option<ComponentFilter>,
        kinds: Vec<ComponentKind>,
    },
    ResetEntitySetFilter {
        set_id: SetId,
        filter: Option<ComponentFilter>,
    },
    ReleaseEntitySet {
        set_id: SetId,
    },
    /// Resolves an interned string in either direction. Exactly one of `id`
    /// and `string` must be set.
    StringId {
        request_id: RequestId,
        id: Option<StringId>,
        string: Option<String>,
    },
}

impl ClientRequest {
    pub fn name(&self) -> &'static str {
        match self {
            ClientRequest::GetComponents { .. } => "GetComponents",
            ClientRequest::FindEntities { .. } => "FindEntities",
            ClientRequest::FindEntity { .. } => "FindEntity",
            ClientRequest::WatchEntity { .. } => "WatchEntity",
            ClientRequest::ReleaseWatchedEntity { .. } => "ReleaseWatchedEntity",
            ClientRequest::GetEntitySet { .. } => "GetEntitySet",
            ClientRequest::ResetEntitySetFilter { .. } => "ResetEntitySetFilter",
            ClientRequest::ReleaseEntitySet { .. } => "ReleaseEntitySet",
            ClientRequest::StringId { .. } => "StringId",
        }
    }
}
