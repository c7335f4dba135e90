use thiserror::Error;

use esnet_shared::{SetId, WatchId};

/// Errors returned to the caller of a host or service operation.
///
/// None of these are fatal to the connection: a failed request leaves the
/// host's state exactly as it was before the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// Attempted to create a set with an id that is already active
    #[error("Entity set {set_id} already exists on this connection")]
    DuplicateSetId { set_id: SetId },

    /// Attempted to watch with an id that is already active
    #[error("Watched entity {watch_id} already exists on this connection")]
    DuplicateWatchId { watch_id: WatchId },

    /// Attempted to operate on a set that is not active
    #[error("Entity set {set_id} not found on this connection")]
    SetNotFound { set_id: SetId },

    /// Request fields contradict each other
    #[error("Malformed {request} request: {reason}")]
    MalformedRequest {
        request: &'static str,
        reason: &'static str,
    },

    /// Attempted to register interest after the connection started closing
    #[error("Connection is closing, cannot {operation}")]
    ConnectionClosed { operation: &'static str },

    /// Request routed to a connection key that has no host
    #[error("Connection {key} is not hosted")]
    ConnectionNotHosted { key: String },

    /// Attempted to host a connection key twice
    #[error("Connection {key} is already hosted")]
    ConnectionAlreadyHosted { key: String },
}
