//! Event channel backends for `cloudcap`.
//!
//! Implementations of [`EventChannel`](crate::eventbus::EventChannel) beyond the
//! in-process [`EventBus`](crate::eventbus::EventBus).
//!
//! # Feature flags
//! - **`memory`** — enables [`memory::MemoryChannel`], a recording channel (default in this build).
//!
//! The connection to the cloud service itself is not part of this crate; plug
//! it in by implementing `EventChannel` for the transport you use.

#[cfg(feature = "memory")]
#[cfg_attr(docsrs, doc(cfg(feature = "memory")))]
pub mod memory;
