//! Host devices.
//!
//! A [`Device`] owns an immutable [`DeviceId`], the capabilities it exposes
//! (keyed by action name) and a [`DeviceContext`] that provides the host
//! services every capability relies on: building an event envelope and
//! handing it to the event channel.

use crate::capability::{Capability, Outcome};
use crate::error::ChannelError;
use crate::event::{EventMessage, Request, ValueMap};
use crate::eventbus::EventChannel;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identity of a device as known to the cloud service.
///
/// There is no way to change an id after construction.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Services a device offers to its capabilities.
pub trait Host {
    fn device_id(&self) -> &DeviceId;

    /// Build an envelope for `action` with an empty payload.
    fn prepare_event(&self, action: &str, cause: &str) -> EventMessage;

    /// Hand a filled envelope to the event channel.
    fn send_event(&self, event: EventMessage) -> Result<(), ChannelError>;
}

/// Identity plus event channel of a device.
///
/// Cheap to clone; a clone can be moved to another thread (e.g. a sensor loop)
/// to report state changes while requests are dispatched elsewhere.
#[derive(Clone)]
pub struct DeviceContext {
    id: DeviceId,
    channel: Arc<dyn EventChannel>,
}

impl DeviceContext {
    pub fn new(id: DeviceId, channel: Arc<dyn EventChannel>) -> Self {
        Self { id, channel }
    }
}

impl fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceContext")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Host for DeviceContext {
    fn device_id(&self) -> &DeviceId {
        &self.id
    }

    fn prepare_event(&self, action: &str, cause: &str) -> EventMessage {
        EventMessage::new(self.id.clone(), action, cause)
    }

    fn send_event(&self, event: EventMessage) -> Result<(), ChannelError> {
        let result = self.channel.send(&event);
        if let Err(ref err) = result {
            warn!(device = %self.id, action = %event.action, "event not sent: {err}");
        }
        result
    }
}

/// A device and the capabilities it exposes.
pub struct Device {
    context: DeviceContext,
    name: Option<String>,
    capabilities: BTreeMap<&'static str, Box<dyn Capability>>,
}

impl Device {
    pub fn new(id: impl Into<DeviceId>, channel: Arc<dyn EventChannel>) -> Self {
        Self {
            context: DeviceContext::new(id.into(), channel),
            name: None,
            capabilities: BTreeMap::new(),
        }
    }

    /// Attach a human-readable label (used in logs only).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_capability<C: Capability + 'static>(mut self, capability: C) -> Self {
        self.add_capability(Box::new(capability));
        self
    }

    /// Add a capability, replacing (and returning) one registered for the same action.
    pub fn add_capability(&mut self, capability: Box<dyn Capability>) -> Option<Box<dyn Capability>> {
        self.capabilities.insert(capability.action(), capability)
    }

    pub fn id(&self) -> &DeviceId {
        &self.context.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Host services of this device, to be passed into capability operations.
    pub fn host(&self) -> &DeviceContext {
        &self.context
    }

    /// Action names this device handles, in sorted order.
    pub fn actions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.capabilities.keys().copied()
    }

    pub fn capability<C: Capability + 'static>(&self) -> Option<&C> {
        self.capabilities
            .values()
            .find_map(|c| c.as_any().downcast_ref::<C>())
    }

    pub fn capability_mut<C: Capability + 'static>(&mut self) -> Option<&mut C> {
        self.capabilities
            .values_mut()
            .find_map(|c| c.as_any_mut().downcast_mut::<C>())
    }

    /// Forward a request to the capability registered for its action.
    ///
    /// Blocks until the capability's callback returns.
    pub fn handle_request(&mut self, request: &Request, response: &mut ValueMap) -> Outcome {
        let Some(capability) = self.capabilities.get_mut(request.action.as_str()) else {
            debug!(device = %self.context.id, action = %request.action, "no capability for action");
            return Outcome::NotApplicable;
        };
        capability.dispatch(&self.context, &request.action, &request.value, response)
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.context.id)
            .field("name", &self.name)
            .field("actions", &self.capabilities.keys().collect::<Vec<_>>())
            .finish()
    }
}
