use async_trait::async_trait;

use crate::events::{Listener, TeamEvent};

/// Emits every event as a tracing event. Requires the `tracing` feature.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &TeamEvent) {
        tracing::info!(
            target: "covenant::events",
            event_name = event.name(),
            team_id = ?event.team_id(),
            ?event,
            "team event"
        );
    }
}
