use crate::error::ChannelError;
use crate::event::EventMessage;
use crate::eventbus::EventChannel;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Recorded {
    events: Vec<EventMessage>,
    failure: Option<ChannelError>,
}

/// Channel that keeps every accepted event in memory.
///
/// Useful for tests and demos. Arm it with [`fail_with`](Self::fail_with) to
/// simulate a dropped connection or a rate-limited cloud endpoint.
#[derive(Default)]
pub struct MemoryChannel {
    inner: Mutex<Recorded>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reject every following send with `error` until [`recover`](Self::recover) is called.
    pub fn fail_with(&self, error: ChannelError) {
        self.lock().failure = Some(error);
    }

    pub fn recover(&self) {
        self.lock().failure = None;
    }

    /// Copy of all accepted events, oldest first.
    pub fn events(&self) -> Vec<EventMessage> {
        self.lock().events.clone()
    }

    /// Drain the accepted events.
    pub fn take(&self) -> Vec<EventMessage> {
        std::mem::take(&mut self.lock().events)
    }
}

impl EventChannel for MemoryChannel {
    fn send(&self, event: &EventMessage) -> Result<(), ChannelError> {
        let mut inner = self.lock();
        if let Some(err) = &inner.failure {
            return Err(err.clone());
        }
        inner.events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceId;

    fn event() -> EventMessage {
        EventMessage::new(DeviceId::from("tv-1"), "selectInput", "PHYSICAL_INTERACTION")
    }

    #[test]
    fn records_until_armed() {
        let channel = MemoryChannel::new();
        channel.send(&event()).unwrap();

        channel.fail_with(ChannelError::Closed);
        assert_eq!(channel.send(&event()), Err(ChannelError::Closed));
        assert_eq!(channel.events().len(), 1);

        channel.recover();
        channel.send(&event()).unwrap();
        assert_eq!(channel.take().len(), 2);
        assert!(channel.events().is_empty());
    }
}
