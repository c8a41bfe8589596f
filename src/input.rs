//! Input selection (`selectInput`).
//!
//! Switches a media device (TV, AV receiver, soundbar) to one of a fixed set
//! of inputs, and reports input changes made on the device itself.
//!
//! ```
//! use std::sync::Arc;
//! use cloudcap::{Device, Input, InputController, MemoryChannel};
//!
//! let channel = Arc::new(MemoryChannel::new());
//! let mut controller = InputController::new();
//! controller.on_select_input(|device_id, input| {
//!     println!("{device_id}: switching to {input}");
//!     true
//! });
//! let device = Device::new("tv-1", channel.clone()).with_capability(controller);
//!
//! // somebody pressed the input button on the remote
//! device
//!     .capability::<InputController>()
//!     .unwrap()
//!     .send_select_input_event(device.host(), Input::Hdmi2)
//!     .unwrap();
//! assert_eq!(channel.events()[0].payload.value["input"], "HDMI 2");
//! ```

use crate::capability::{Action, Controller};
use crate::device::{DeviceId, Host};
use crate::error::ChannelError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! inputs {
    ($($variant:ident => $name:literal,)+) => {
        /// Input a device can be switched to.
        ///
        /// Serialized as its wire name, e.g. `Input::HdmiArc` ⇄ `"HDMI ARC"`.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum Input {
            $($variant,)+
        }

        impl Input {
            /// Every accepted input.
            pub const ALL: &'static [Input] = &[$(Input::$variant,)+];

            /// Wire name of the input.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Input::$variant => $name,)+
                }
            }
        }
    };
}

inputs! {
    Aux1 => "AUX 1",
    Aux2 => "AUX 2",
    Aux3 => "AUX 3",
    Aux4 => "AUX 4",
    Aux5 => "AUX 5",
    Aux6 => "AUX 6",
    Aux7 => "AUX 7",
    Bluray => "BLURAY",
    Cable => "CABLE",
    Cd => "CD",
    Coax1 => "COAX 1",
    Coax2 => "COAX 2",
    Composite1 => "COMPOSITE 1",
    Dvd => "DVD",
    Game => "GAME",
    HdRadio => "HD RADIO",
    Hdmi1 => "HDMI 1",
    Hdmi2 => "HDMI 2",
    Hdmi3 => "HDMI 3",
    Hdmi4 => "HDMI 4",
    Hdmi5 => "HDMI 5",
    Hdmi6 => "HDMI 6",
    Hdmi7 => "HDMI 7",
    Hdmi8 => "HDMI 8",
    Hdmi9 => "HDMI 9",
    Hdmi10 => "HDMI 10",
    HdmiArc => "HDMI ARC",
    Input1 => "INPUT 1",
    Input2 => "INPUT 2",
    Input3 => "INPUT 3",
    Input4 => "INPUT 4",
    Input5 => "INPUT 5",
    Input6 => "INPUT 6",
    Input7 => "INPUT 7",
    Input8 => "INPUT 8",
    Input9 => "INPUT 9",
    Input10 => "INPUT 10",
    Ipod => "IPOD",
    Line1 => "LINE 1",
    Line2 => "LINE 2",
    Line3 => "LINE 3",
    Line4 => "LINE 4",
    Line5 => "LINE 5",
    Line6 => "LINE 6",
    Line7 => "LINE 7",
    MediaPlayer => "MEDIA PLAYER",
    Optical1 => "OPTICAL 1",
    Optical2 => "OPTICAL 2",
    Phono => "PHONO",
    Playstation => "PLAYSTATION",
    Playstation3 => "PLAYSTATION 3",
    Playstation4 => "PLAYSTATION 4",
    Satellite => "SATELLITE",
    Smartcast => "SMARTCAST",
    Tuner => "TUNER",
    Tv => "TV",
    UsbDac => "USB DAC",
    Video1 => "VIDEO 1",
    Video2 => "VIDEO 2",
    Video3 => "VIDEO 3",
    Xbox => "XBOX",
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the accepted input names.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown input '{0}'")]
pub struct UnknownInput(pub String);

impl FromStr for Input {
    type Err = UnknownInput;

    /// Wire names are matched exactly (case and spacing included).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Input::ALL
            .iter()
            .copied()
            .find(|input| input.as_str() == s)
            .ok_or_else(|| UnknownInput(s.to_string()))
    }
}

impl Serialize for Input {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Input {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

/// The `selectInput` action.
pub struct SelectInput;

impl Action for SelectInput {
    const NAME: &'static str = "selectInput";
    const KEY: &'static str = "input";
    type Value = Input;
}

/// Capability handling `selectInput` requests.
pub type InputController = Controller<SelectInput>;

impl Controller<SelectInput> {
    /// Register the callback run for `selectInput` requests.
    ///
    /// The callback may change the input to the one the device actually
    /// switched to; that value is echoed in the response.
    pub fn on_select_input<F>(&mut self, callback: F)
    where
        F: FnMut(&DeviceId, &mut Input) -> bool + Send + 'static,
    {
        self.register(callback);
    }

    /// Report the currently selected input with the default cause.
    pub fn send_select_input_event(&self, host: &dyn Host, input: Input) -> Result<(), ChannelError> {
        self.send_event(host, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn domain_is_closed_and_unique() {
        assert_eq!(Input::ALL.len(), 61);
        let names: HashSet<_> = Input::ALL.iter().map(|i| i.as_str()).collect();
        assert_eq!(names.len(), Input::ALL.len());
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("HDMI ARC".parse::<Input>(), Ok(Input::HdmiArc));
        assert_eq!("PLAYSTATION 4".parse::<Input>(), Ok(Input::Playstation4));
        assert_eq!("USB DAC".parse::<Input>(), Ok(Input::UsbDac));
    }

    #[test]
    fn rejects_names_outside_domain() {
        assert_eq!(
            "HDMI 11".parse::<Input>(),
            Err(UnknownInput("HDMI 11".to_string()))
        );
        assert!("hdmi 1".parse::<Input>().is_err());
        assert!("AUX 8".parse::<Input>().is_err());
        assert!("COAX 3".parse::<Input>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        for input in Input::ALL {
            let json = serde_json::to_value(input).unwrap();
            assert_eq!(json, input.as_str());
            assert_eq!(input.to_string().parse::<Input>().unwrap(), *input);
        }
        assert!(serde_json::from_str::<Input>("\"BETAMAX\"").is_err());
    }
}
