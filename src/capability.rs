//! The capability contract.
//!
//! Every capability of a device follows the same pattern: a single action
//! name, one optional user callback performing the real device action, a
//! dispatch step that runs the callback for a matching request and writes the
//! result back into the response, and an event step that reports state changes
//! made outside of a request.
//!
//! [`Controller`] implements that pattern once, generic over an [`Action`]
//! describing the action name, the parameter key and the value type. Concrete
//! capabilities are type aliases, e.g. [`InputController`](crate::input::InputController).
//!
//! # Outcomes
//! Dispatch reports *why* a request was or was not handled:
//!
//! | Outcome | Response touched | Meaning |
//! |---------|------------------|---------|
//! | [`Outcome::NotApplicable`] | no | request is for another action |
//! | [`Outcome::Unregistered`] | no | no callback registered yet |
//! | [`Outcome::Declined`] (`MissingParameter`, `InvalidValue`) | no | request value unusable |
//! | [`Outcome::Declined`] (`Rejected`) | **yes** | callback ran and reported failure |
//! | [`Outcome::Handled`] | yes | callback ran and succeeded |
//!
//! A rejected request still echoes the callback's output value in the
//! response. Callers relying on an empty response after a failure must check
//! the outcome instead.

use crate::device::{DeviceId, Host};
use crate::error::ChannelError;
use crate::event::{ValueMap, DEFAULT_CAUSE};
use crate::input::{InputController, SelectInput};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;
use tracing::{debug, trace};

/// Describes one action: its wire name, its principal parameter and the
/// parameter's value type.
pub trait Action: 'static {
    /// Action name as it appears in requests and events.
    const NAME: &'static str;
    /// Key of the principal parameter inside the request/response value.
    const KEY: &'static str;
    /// Accepted values of the principal parameter.
    type Value: Serialize + DeserializeOwned + fmt::Debug + Send + 'static;
}

/// User callback performing the device action.
///
/// Receives the device id and the requested value. Returns whether the
/// device action succeeded; the value may be normalized in place and is
/// echoed back in the response.
pub type Callback<V> = Box<dyn FnMut(&DeviceId, &mut V) -> bool + Send>;

/// Registration state of a capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Dispatch never reaches user code.
    Unregistered,
    /// Dispatch delegates to the callback.
    Registered,
}

/// Holder for at most one callback.
pub enum CallbackSlot<V> {
    Unregistered,
    Registered(Callback<V>),
}

impl<V> CallbackSlot<V> {
    pub fn state(&self) -> SlotState {
        match self {
            CallbackSlot::Unregistered => SlotState::Unregistered,
            CallbackSlot::Registered(_) => SlotState::Registered,
        }
    }
}

impl<V> Default for CallbackSlot<V> {
    fn default() -> Self {
        CallbackSlot::Unregistered
    }
}

/// Why a request for this capability was not handled successfully.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeclineReason {
    /// The callback ran and reported failure.
    #[error("request rejected by device")]
    Rejected,
    /// The request did not carry the parameter.
    #[error("missing parameter '{0}'")]
    MissingParameter(&'static str),
    /// The parameter was outside the accepted domain.
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Result of dispatching a request to a capability.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The request targets a different action.
    NotApplicable,
    /// The action matches but no callback is registered.
    Unregistered,
    Declined(DeclineReason),
    /// The callback succeeded; carries the value written into the response.
    Handled(Value),
}

impl Outcome {
    /// Collapse into a plain success flag.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Handled(_))
    }
}

/// Object-safe face of a capability, as held by a [`Device`](crate::device::Device).
pub trait Capability: Any + Send {
    /// Action name this capability answers to.
    fn action(&self) -> &'static str;

    fn state(&self) -> SlotState;

    /// Run the registered callback for a matching request.
    ///
    /// Synchronous: returns once the callback has returned.
    fn dispatch(
        &mut self,
        host: &dyn Host,
        action: &str,
        request: &ValueMap,
        response: &mut ValueMap,
    ) -> Outcome;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Generic capability unit for action `A`.
pub struct Controller<A: Action> {
    slot: CallbackSlot<A::Value>,
    _action: PhantomData<fn() -> A>,
}

impl<A: Action> Controller<A> {
    pub fn new() -> Self {
        Self {
            slot: CallbackSlot::Unregistered,
            _action: PhantomData,
        }
    }

    /// Store `callback`, replacing any previous one.
    pub fn register<F>(&mut self, callback: F)
    where
        F: FnMut(&DeviceId, &mut A::Value) -> bool + Send + 'static,
    {
        self.slot = CallbackSlot::Registered(Box::new(callback));
    }

    pub fn state(&self) -> SlotState {
        self.slot.state()
    }

    /// Report a state change with the default cause.
    pub fn send_event(&self, host: &dyn Host, value: A::Value) -> Result<(), ChannelError> {
        self.send_event_with_cause(host, value, DEFAULT_CAUSE)
    }

    /// Report a state change.
    ///
    /// The channel's verdict is returned as is. An error may stem from the
    /// transport or from rate limiting; the capability cannot tell which.
    pub fn send_event_with_cause(
        &self,
        host: &dyn Host,
        value: A::Value,
        cause: &str,
    ) -> Result<(), ChannelError> {
        let mut event = host.prepare_event(A::NAME, cause);
        let value = serde_json::to_value(&value).map_err(|e| ChannelError::Encoding(e.to_string()))?;
        event.payload.value.insert(A::KEY.to_string(), value);
        host.send_event(event)
    }

    fn decode(request: &ValueMap) -> Result<A::Value, DeclineReason> {
        let raw = request
            .get(A::KEY)
            .ok_or(DeclineReason::MissingParameter(A::KEY))?;
        serde_json::from_value(raw.clone()).map_err(|e| DeclineReason::InvalidValue {
            key: A::KEY,
            message: e.to_string(),
        })
    }
}

impl<A: Action> Default for Controller<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> fmt::Debug for Controller<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("action", &A::NAME)
            .field("state", &self.state())
            .finish()
    }
}

impl<A: Action> Capability for Controller<A> {
    fn action(&self) -> &'static str {
        A::NAME
    }

    fn state(&self) -> SlotState {
        self.slot.state()
    }

    fn dispatch(
        &mut self,
        host: &dyn Host,
        action: &str,
        request: &ValueMap,
        response: &mut ValueMap,
    ) -> Outcome {
        if action != A::NAME {
            return Outcome::NotApplicable;
        }
        let CallbackSlot::Registered(callback) = &mut self.slot else {
            debug!(device = %host.device_id(), action, "no callback registered");
            return Outcome::Unregistered;
        };
        let mut value = match Self::decode(request) {
            Ok(value) => value,
            Err(reason) => {
                debug!(device = %host.device_id(), action, "request declined: {reason}");
                return Outcome::Declined(reason);
            }
        };

        trace!(device = %host.device_id(), action, ?value, "dispatching");
        let success = callback(host.device_id(), &mut value);

        let echoed = match serde_json::to_value(&value) {
            Ok(echoed) => echoed,
            Err(e) => {
                return Outcome::Declined(DeclineReason::InvalidValue {
                    key: A::KEY,
                    message: e.to_string(),
                })
            }
        };
        // written even when the callback failed
        response.insert(A::KEY.to_string(), echoed.clone());

        if success {
            Outcome::Handled(echoed)
        } else {
            debug!(device = %host.device_id(), action, "callback rejected request");
            Outcome::Declined(DeclineReason::Rejected)
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Build an unregistered capability for a known action name.
pub fn for_action(action: &str) -> Option<Box<dyn Capability>> {
    match action {
        SelectInput::NAME => Some(Box::new(InputController::new())),
        _ => None,
    }
}
