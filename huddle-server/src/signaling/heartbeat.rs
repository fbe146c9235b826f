use crate::signaling::SignalingService;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Spawns the periodic heartbeat broadcast. It only enqueues messages, so it
/// never blocks joins or relays.
pub fn spawn_heartbeat(service: SignalingService, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let reached = service.broadcast_heartbeat();
            debug!("Heartbeat sent to {} participant(s)", reached);
        }
    })
}
