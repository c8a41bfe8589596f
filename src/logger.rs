use crate::error::ChannelError;
use crate::event::EventMessage;
use crate::eventbus::EventListener;
use tracing::info;

/// A simple listener that logs all events through `tracing`.
#[derive(Debug, Default)]
pub struct EventLogger;

impl EventLogger {
    pub fn new() -> Self {
        EventLogger
    }
}

impl EventListener for EventLogger {
    fn on_event(&mut self, event: &EventMessage) -> Result<(), ChannelError> {
        info!(
            device = %event.device_id,
            action = %event.action,
            cause = %event.cause,
            value = ?event.payload.value,
            "event"
        );
        Ok(())
    }
}
