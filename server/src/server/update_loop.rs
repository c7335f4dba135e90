use std::{fmt::Debug, hash::Hash, sync::Arc};

use log::{debug, error};
use tokio::{
    task::{self, JoinHandle},
    time::{interval, MissedTickBehavior},
};

use super::host_service::HostService;

/// Ticks every hosted connection on the service's `update_interval` until the
/// service is stopped. Must be called from within a tokio runtime.
///
/// Ticks run on the blocking pool, one at a time, so a large host table never
/// stalls the async workers.
pub fn spawn_update_loop<K>(service: Arc<HostService<K>>) -> JoinHandle<()>
where
    K: Copy + Eq + Hash + Debug + Send + Sync + 'static,
{
    let period = service.settings().update_interval;

    task::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if service.is_stopped() {
                break;
            }

            let tick_service = service.clone();
            if let Err(err) = task::spawn_blocking(move || tick_service.send_updates()).await {
                error!("HostService: update tick failed: {}", err);
            }
        }

        debug!("HostService: update loop finished");
    })
}
