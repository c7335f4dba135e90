//! # esnet Shared
//! Identifiers, filters, messages and the entity store interface shared
//! between esnet hosts and their clients.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod messages;
mod types;
mod world;

pub use messages::{client_request::ClientRequest, host_message::HostMessage};
pub use types::{ChannelId, Frame, RequestId, SetId, StringId, WatchId};
pub use world::{
    component::{
        component_filter::ComponentFilter, component_kind::ComponentKind,
        component_value::ComponentValue,
    },
    entity::{
        entity_change::EntityChange, entity_components::EntityComponents, entity_id::EntityId,
    },
    entity_store::{EntityChangeListener, EntityStore, ListenerKey},
};
