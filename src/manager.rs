use crate::capability::{self, Outcome};
use crate::config::Config;
use crate::device::{Device, DeviceId};
use crate::error::{ConfigError, RouteError};
use crate::event::{Request, ResponseMessage, ValueMap};
use crate::eventbus::EventChannel;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Routes requests to the devices it owns, by `deviceId`.
#[derive(Debug, Default)]
pub struct DeviceManager {
    devices: BTreeMap<DeviceId, Device>,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured device with its capabilities, all sharing `channel`.
    ///
    /// The config is validated first, so a hand-built one gets the same checks
    /// as one loaded from TOML.
    pub fn from_config(config: &Config, channel: Arc<dyn EventChannel>) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut manager = Self::new();

        for entry in &config.devices {
            let mut device = Device::new(entry.id.as_str(), channel.clone());
            if let Some(name) = &entry.name {
                device = device.with_name(name.as_str());
            }
            for action in &entry.capabilities {
                let capability =
                    capability::for_action(action).ok_or_else(|| ConfigError::UnknownCapability {
                        device: entry.id.clone(),
                        action: action.clone(),
                    })?;
                device.add_capability(capability);
            }
            if manager.add_device(device).is_some() {
                return Err(ConfigError::DuplicateDevice(entry.id.clone()));
            }
        }

        info!("configured {} device(s)", manager.devices.len());
        Ok(manager)
    }

    /// Add a device, replacing (and returning) one with the same id.
    pub fn add_device(&mut self, device: Device) -> Option<Device> {
        self.devices.insert(device.id().clone(), device)
    }

    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn device_mut(&mut self, id: &str) -> Option<&mut Device> {
        self.devices.get_mut(id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Dispatch `request` to the device it names.
    ///
    /// Blocks until the capability's callback returns.
    pub fn handle_request(
        &mut self,
        request: &Request,
        response: &mut ValueMap,
    ) -> Result<Outcome, RouteError> {
        let id = request.device_id.as_ref().ok_or(RouteError::MissingDeviceId)?;
        let Some(device) = self.devices.get_mut(id) else {
            warn!(device = %id, action = %request.action, "request for unknown device");
            return Err(RouteError::UnknownDevice(id.to_string()));
        };

        let outcome = device.handle_request(request, response);
        debug!(device = %id, action = %request.action, ?outcome, "request handled");
        Ok(outcome)
    }

    /// JSON entry point: parse a request, dispatch it and encode the answer.
    pub fn handle_json(&mut self, text: &str) -> Result<String, RouteError> {
        let request: Request = serde_json::from_str(text).map_err(RouteError::Malformed)?;
        let device_id = request.device_id.clone().ok_or(RouteError::MissingDeviceId)?;
        let mut value = ValueMap::new();
        let outcome = self.handle_request(&request, &mut value)?;

        let message = match &outcome {
            Outcome::Handled(_) => "OK".to_string(),
            Outcome::NotApplicable => format!("action '{}' not supported", request.action),
            Outcome::Unregistered => format!("action '{}' not implemented", request.action),
            Outcome::Declined(reason) => reason.to_string(),
        };
        let response = ResponseMessage {
            device_id,
            action: request.action,
            success: outcome.is_success(),
            message,
            value,
        };
        serde_json::to_string(&response).map_err(RouteError::Encode)
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryChannel;
    use crate::config::DeviceConfig;
    use crate::input::{Input, InputController};
    use serde_json::{json, Value};

    fn manager() -> DeviceManager {
        let config = Config::from_toml_str(
            r#"
            [[devices]]
            id = "tv-1"
            name = "Living room TV"
            capabilities = ["selectInput"]

            [[devices]]
            id = "lamp"
            "#,
        )
        .unwrap();
        DeviceManager::from_config(&config, Arc::new(MemoryChannel::new())).unwrap()
    }

    fn select(device: &str, input: &str) -> Request {
        Request::new("selectInput", json!({ "input": input }).as_object().unwrap().clone())
            .for_device(device)
    }

    #[test]
    fn builds_configured_devices() {
        let manager = manager();
        let tv = manager.device("tv-1").unwrap();
        assert_eq!(tv.name(), Some("Living room TV"));
        assert_eq!(tv.actions().collect::<Vec<_>>(), vec!["selectInput"]);
        assert_eq!(manager.device("lamp").unwrap().actions().count(), 0);
        assert_eq!(manager.devices().count(), 2);
    }

    #[test]
    fn routes_to_named_device() {
        let mut manager = manager();
        manager
            .device_mut("tv-1")
            .unwrap()
            .capability_mut::<InputController>()
            .unwrap()
            .on_select_input(|_, _| true);

        let mut response = ValueMap::new();
        let outcome = manager.handle_request(&select("tv-1", "TV"), &mut response).unwrap();
        assert_eq!(outcome, Outcome::Handled(json!("TV")));

        let mut response = ValueMap::new();
        let outcome = manager.handle_request(&select("lamp", "TV"), &mut response).unwrap();
        assert_eq!(outcome, Outcome::NotApplicable);
        assert!(response.is_empty());
    }

    #[test]
    fn missing_and_unknown_devices() {
        let mut manager = manager();
        let mut response = ValueMap::new();

        let no_id = Request::new("selectInput", ValueMap::new());
        assert!(matches!(
            manager.handle_request(&no_id, &mut response),
            Err(RouteError::MissingDeviceId)
        ));
        assert!(matches!(
            manager.handle_request(&select("garage", "TV"), &mut response),
            Err(RouteError::UnknownDevice(id)) if id == "garage"
        ));
    }

    #[test]
    fn json_round_trip() {
        let mut manager = manager();
        manager
            .device_mut("tv-1")
            .unwrap()
            .capability_mut::<InputController>()
            .unwrap()
            .on_select_input(|_, input| {
                // this set only has HDMI 1; everything else falls back to it
                *input = Input::Hdmi1;
                true
            });

        let answer = manager
            .handle_json(r#"{"deviceId":"tv-1","action":"selectInput","value":{"input":"HDMI 3"}}"#)
            .unwrap();
        let answer: Value = serde_json::from_str(&answer).unwrap();

        assert_eq!(
            answer,
            json!({
                "deviceId": "tv-1",
                "action": "selectInput",
                "success": true,
                "message": "OK",
                "value": { "input": "HDMI 1" }
            })
        );
    }

    #[test]
    fn json_reports_unregistered_action() {
        let mut manager = manager();
        let answer = manager
            .handle_json(r#"{"deviceId":"tv-1","action":"selectInput","value":{"input":"TV"}}"#)
            .unwrap();
        let answer: ResponseMessage = serde_json::from_str(&answer).unwrap();

        assert!(!answer.success);
        assert_eq!(answer.message, "action 'selectInput' not implemented");
        assert!(answer.value.is_empty());
    }

    #[test]
    fn json_rejects_garbage() {
        let mut manager = manager();
        assert!(matches!(
            manager.handle_json("{ not json"),
            Err(RouteError::Malformed(_))
        ));
    }

    #[test]
    fn hand_built_config_is_validated() {
        let blank = Config {
            devices: vec![DeviceConfig {
                id: "  ".into(),
                name: None,
                capabilities: vec!["selectInput".into()],
            }],
        };
        let result = DeviceManager::from_config(&blank, Arc::new(MemoryChannel::new()));
        assert!(matches!(result, Err(ConfigError::EmptyDeviceId)));
    }
}
