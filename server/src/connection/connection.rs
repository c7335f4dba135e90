use esnet_shared::{ChannelId, HostMessage};

/// Outbound half of a client's transport.
///
/// Sends are fire-and-forget: delivery is assumed reliable and ordered per
/// channel, with unbounded latency. Implementations must not block.
pub trait Connection: Send + Sync {
    fn send(&self, channel: ChannelId, message: HostMessage);
}
