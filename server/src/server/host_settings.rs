use std::{default::Default, time::Duration};

use esnet_shared::ChannelId;

/// Contains Config properties which will be used by every hosted connection
#[derive(Clone, Debug)]
pub struct EntityHostSettings {
    /// Channel that every reply and pushed update is sent on
    pub channel: ChannelId,
    /// Maximum number of entity snapshots in one EntityData message
    pub max_entity_batch_size: usize,
    /// Maximum number of changes in one ComponentChange message
    pub max_change_batch_size: usize,
    /// Period of the update loop that ticks every hosted connection
    pub update_interval: Duration,
}

impl EntityHostSettings {
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            ..Self::default()
        }
    }

    pub(crate) fn entity_batch_limit(&self) -> usize {
        self.max_entity_batch_size.max(1)
    }

    pub(crate) fn change_batch_limit(&self) -> usize {
        self.max_change_batch_size.max(1)
    }
}

impl Default for EntityHostSettings {
    fn default() -> Self {
        Self {
            channel: 0,
            max_entity_batch_size: 20,
            max_change_batch_size: 20,
            update_interval: Duration::from_millis(50),
        }
    }
}
