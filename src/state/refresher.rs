use crate::state::messages::NetworkRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};

pub const LIVE_INTERVAL: Duration = Duration::from_secs(10);
pub const FINISHED_INTERVAL: Duration = Duration::from_secs(60);

/// Fires live refreshes every 10 seconds and finished refreshes every minute.
/// The first pass of each is sent on startup, not from here.
pub struct PeriodicRefresher {
    network_requests: mpsc::Sender<NetworkRequest>,
    live_every: Duration,
    finished_every: Duration,
}

impl PeriodicRefresher {
    pub fn new(network_requests: mpsc::Sender<NetworkRequest>) -> Self {
        Self {
            network_requests,
            live_every: LIVE_INTERVAL,
            finished_every: FINISHED_INTERVAL,
        }
    }

    pub async fn run(self) {
        let mut live_interval = interval(self.live_every);
        let mut finished_interval = interval(self.finished_every);
        live_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        finished_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the immediate first ticks so startup loading isn't double-triggered.
        live_interval.tick().await;
        finished_interval.tick().await;

        loop {
            let request = tokio::select! {
                _ = live_interval.tick() => NetworkRequest::RefreshLive,
                _ = finished_interval.tick() => NetworkRequest::RefreshFinished,
            };
            if self.network_requests.send(request).await.is_err() {
                break;
            }
        }
    }
}
