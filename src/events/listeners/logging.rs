use async_trait::async_trait;

use crate::events::{Listener, TeamEvent};

/// Writes every event through the `log` crate.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &TeamEvent) {
        log::log!(
            target: "covenant::events",
            self.level,
            "event={} team_id={:?} {:?}",
            event.name(),
            event.team_id(),
            event
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_logging_listener_levels() {
        assert_eq!(LoggingListener::default().level, log::Level::Info);
        assert_eq!(
            LoggingListener::with_level(log::Level::Debug).level,
            log::Level::Debug
        );
    }

    #[tokio::test]
    async fn test_logging_listener_handle() {
        let listener = LoggingListener::new();
        let event = TeamEvent::MembersInvited {
            team_id: 5,
            actor_id: 1,
            emails: vec!["a@x.test".to_owned()],
            at: Utc::now(),
        };

        listener.handle(&event).await;
    }
}
