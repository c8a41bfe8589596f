use crate::error::ChannelError;
use crate::event::EventMessage;
use crate::eventbus::EventListener;

/// Wraps a listener and filters events based on a user-supplied predicate.
///
/// Events rejected by the predicate count as delivered.
pub struct FilteredListener {
    predicate: Box<dyn Fn(&EventMessage) -> bool + Send + Sync>,
    inner: Box<dyn EventListener>,
}

impl FilteredListener {
    pub fn new(
        predicate: impl Fn(&EventMessage) -> bool + Send + Sync + 'static,
        inner: impl EventListener + 'static,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner: Box::new(inner),
        }
    }
}

impl EventListener for FilteredListener {
    fn on_event(&mut self, event: &EventMessage) -> Result<(), ChannelError> {
        if (self.predicate)(event) {
            self.inner.on_event(event)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceId;

    struct Count(usize);

    impl EventListener for Count {
        fn on_event(&mut self, _: &EventMessage) -> Result<(), ChannelError> {
            self.0 += 1;
            if self.0 > 1 {
                return Err(ChannelError::Closed);
            }
            Ok(())
        }
    }

    #[test]
    fn forwards_only_matching_events() {
        let mut listener = FilteredListener::new(|e| e.cause != "PERIODIC_POLL", Count(0));
        let polled = EventMessage::new(DeviceId::from("tv-1"), "selectInput", "PERIODIC_POLL");
        let pressed = EventMessage::new(DeviceId::from("tv-1"), "selectInput", "PHYSICAL_INTERACTION");

        assert_eq!(listener.on_event(&polled), Ok(()));
        assert_eq!(listener.on_event(&pressed), Ok(()));
        assert_eq!(listener.on_event(&polled), Ok(()));
        // second forwarded event makes the inner listener fail
        assert_eq!(listener.on_event(&pressed), Err(ChannelError::Closed));
    }
}
