use std::{
    fmt::Debug,
    hash::Hash,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use dashmap::{mapref::entry::Entry, DashMap};
use log::{debug, error, info, warn};

use esnet_shared::{ClientRequest, EntityStore};

use crate::{connection::connection::Connection, EntityHostSettings, HostError, HostedEntityData};

/// Hosts the shared entity store for every connected client.
///
/// Owns one [`HostedEntityData`] per connection key, routes inbound requests
/// to it, and ticks all of them from [`HostService::send_updates`].
pub struct HostService<K: Copy + Eq + Hash + Debug + Send + Sync> {
    store: Arc<dyn EntityStore>,
    settings: EntityHostSettings,
    hosts: DashMap<K, Arc<HostedEntityData>>,
    stopped: AtomicBool,
}

impl<K: Copy + Eq + Hash + Debug + Send + Sync> HostService<K> {
    pub fn new(store: Arc<dyn EntityStore>, settings: EntityHostSettings) -> Self {
        Self {
            store,
            settings,
            hosts: DashMap::new(),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &EntityHostSettings {
        &self.settings
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    // Connections

    /// Starts hosting a newly connected client
    pub fn connection_added(
        &self,
        key: K,
        connection: Arc<dyn Connection>,
    ) -> Result<Arc<HostedEntityData>, HostError> {
        match self.hosts.entry(key) {
            Entry::Occupied(_) => Err(HostError::ConnectionAlreadyHosted {
                key: format!("{:?}", key),
            }),
            Entry::Vacant(entry) => {
                let hosted = Arc::new(HostedEntityData::new(
                    self.settings.clone(),
                    connection,
                    self.store.clone(),
                ));
                entry.insert(hosted.clone());
                info!("HostService: hosting connection {:?}", key);
                Ok(hosted)
            }
        }
    }

    /// Closes and forgets a client's host. Returns false for an unknown key.
    pub fn connection_removed(&self, key: &K) -> bool {
        let Some((_, hosted)) = self.hosts.remove(key) else {
            debug!("HostService: removal of unknown connection {:?}", key);
            return false;
        };
        hosted.close();
        info!("HostService: stopped hosting connection {:?}", key);
        true
    }

    pub fn hosted(&self, key: &K) -> Option<Arc<HostedEntityData>> {
        self.hosts.get(key).map(|hosted| hosted.value().clone())
    }

    pub fn connection_count(&self) -> usize {
        self.hosts.len()
    }

    // Requests

    /// Routes an inbound request to the host of the connection it came from
    pub fn receive(&self, key: &K, request: ClientRequest) -> Result<(), HostError> {
        let hosted = self
            .hosted(key)
            .ok_or_else(|| HostError::ConnectionNotHosted {
                key: format!("{:?}", key),
            })?;

        let name = request.name();
        hosted.handle_request(request).inspect_err(|err| {
            warn!(
                "HostService: {} from connection {:?} failed: {}",
                name, key, err
            );
        })
    }

    // Updates

    /// Ticks every hosted connection. A panic in one connection's tick is
    /// logged and does not stop the others.
    pub fn send_updates(&self) {
        if self.is_stopped() {
            return;
        }

        let hosts: Vec<(K, Arc<HostedEntityData>)> = self
            .hosts
            .iter()
            .map(|hosted| (*hosted.key(), hosted.value().clone()))
            .collect();

        for (key, hosted) in hosts {
            let result = panic::catch_unwind(AssertUnwindSafe(|| hosted.send_updates()));
            if result.is_err() {
                error!(
                    "HostService: update for connection {:?} panicked, skipping it this tick",
                    key
                );
            }
        }
    }

    /// Stops ticking and closes every hosted connection
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        let keys: Vec<K> = self.hosts.iter().map(|hosted| *hosted.key()).collect();
        for key in keys {
            self.connection_removed(&key);
        }
        info!("HostService: stopped");
    }
}
