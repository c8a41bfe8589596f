//! Requests, responses and event envelopes.
//!
//! Everything that crosses the wire is a small serde type carrying a JSON
//! object as its parameter bag. Capabilities read their parameters from a
//! request's `value`, write results into a response map, and report state
//! changes as an [`EventMessage`].
//!
//! ## Wire shapes
//! - **Request:** `{ "deviceId"?: "...", "action": "selectInput", "value": { "input": "HDMI 1" } }`
//! - **Response value:** `{ "input": "HDMI 1" }` (left empty when the request was not handled)
//! - **Event:** `{ "deviceId": "...", "action": "selectInput", "cause": "PHYSICAL_INTERACTION",
//!   "payload": { "value": { "input": "HDMI 1" } } }`
//!
//! ### Causes
//! The cause is a free-form tag. [`DEFAULT_CAUSE`] is used when the device
//! changed state because somebody operated it directly (remote, front panel).

use crate::device::DeviceId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cause stamped on events when the caller does not supply one.
pub const DEFAULT_CAUSE: &str = "PHYSICAL_INTERACTION";

/// Parameter object of requests, responses and event payloads.
pub type ValueMap = Map<String, Value>;

/// Inbound control request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Target device. Only needed when a [`DeviceManager`](crate::manager::DeviceManager)
    /// routes between several devices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceId>,
    /// Action name, e.g. `"selectInput"`.
    pub action: String,
    /// Action parameters.
    #[serde(default)]
    pub value: ValueMap,
}

impl Request {
    pub fn new(action: impl Into<String>, value: ValueMap) -> Self {
        Self {
            device_id: None,
            action: action.into(),
            value,
        }
    }

    /// Address the request to a specific device.
    pub fn for_device(mut self, device_id: impl Into<DeviceId>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }
}

/// Payload of an outbound event.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Mirrors the shape of a response value.
    pub value: ValueMap,
}

/// Outbound event envelope.
///
/// Built by [`Host::prepare_event`](crate::device::Host::prepare_event) with an
/// empty payload; the capability fills in `payload.value`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    pub device_id: DeviceId,
    pub action: String,
    pub cause: String,
    pub payload: EventPayload,
}

impl EventMessage {
    pub fn new(device_id: DeviceId, action: &str, cause: &str) -> Self {
        Self {
            device_id,
            action: action.to_string(),
            cause: cause.to_string(),
            payload: EventPayload::default(),
        }
    }
}

/// Answer produced for a routed JSON request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    pub device_id: DeviceId,
    pub action: String,
    pub success: bool,
    /// `"OK"` on success, otherwise a short description of why the request failed.
    pub message: String,
    pub value: ValueMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_without_device_id() {
        let request: Request =
            serde_json::from_value(json!({ "action": "selectInput", "value": { "input": "TV" } }))
                .unwrap();
        assert_eq!(request.device_id, None);
        assert_eq!(request.action, "selectInput");
        assert_eq!(request.value["input"], "TV");
    }

    #[test]
    fn request_value_defaults_to_empty() {
        let request: Request = serde_json::from_str(r#"{"action":"selectInput"}"#).unwrap();
        assert!(request.value.is_empty());
    }

    #[test]
    fn event_wire_shape() {
        let mut event = EventMessage::new(DeviceId::from("tv-1"), "selectInput", DEFAULT_CAUSE);
        event.payload.value.insert("input".into(), json!("XBOX"));

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "deviceId": "tv-1",
                "action": "selectInput",
                "cause": "PHYSICAL_INTERACTION",
                "payload": { "value": { "input": "XBOX" } }
            })
        );
    }
}
