/// Client-chosen identifier of an interest set, unique among a connection's active sets
pub type SetId = u32;
/// Client-chosen identifier of a watched entity, unique among a connection's active watches
pub type WatchId = u32;
/// Correlates a request with its response
pub type RequestId = u32;
/// Interned string identifier as assigned by the store
pub type StringId = i32;
/// Transport channel that host messages are sent on
pub type ChannelId = u8;
/// Sequence number of a host update tick
pub type Frame = u64;
