//! # esnet Server
//! Hosts a shared entity store for many remote clients. Each connection gets
//! a [`HostedEntityData`] that answers the client's queries, tracks the
//! entity sets and entities it is interested in, and periodically sends it
//! batched snapshots and component changes.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod shared {
    pub use esnet_shared::{
        ClientRequest, ComponentFilter, ComponentKind, ComponentValue, EntityChange,
        EntityChangeListener, EntityComponents, EntityId, EntityStore, HostMessage, ListenerKey,
    };
}

mod connection;
mod error;
mod host;
mod server;

pub use connection::connection::Connection;
pub use error::HostError;
pub use host::{
    component_usage_tracker::ComponentUsageTracker,
    hosted_entity_data::HostedEntityData,
    interest_registry::{InterestRegistry, WatchedEntity},
    interest_set::InterestSet,
    local_view::LocalView,
};
pub use server::{EntityHostSettings, HostService};

cfg_if! {
    if #[cfg(feature = "tokio_timer")] {
        pub use server::spawn_update_loop;
    }
}
