//! cloudcap — capability dispatch and event reporting for cloud-connected devices.
//!
//! A [`Device`] exposes capabilities. Each capability answers one action
//! (e.g. `selectInput`): it runs a user callback for matching requests, writes
//! the result into the response, and reports state changes made on the device
//! itself as events sent through an [`EventChannel`].

pub mod backends;
pub mod capability;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod filtered_listener;
pub mod input;
pub mod logger;
pub mod manager;

#[cfg(feature = "memory")]
pub use backends::memory::MemoryChannel;
pub use capability::*;
pub use config::*;
pub use device::*;
pub use error::*;
pub use event::*;
pub use eventbus::*;
pub use filtered_listener::*;
pub use input::*;
pub use logger::*;
pub use manager::*;
