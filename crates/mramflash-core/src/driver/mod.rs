//! Device lifecycle and registration
//!
//! This module ties a claimed bus, a variant's geometry and the storage
//! registry together. See [`Mr25hxx`] for the state machine.

mod context;
mod lifecycle;

pub use context::DeviceContext;
pub use lifecycle::{Detached, DriverConfig, Mr25hxx, ProbeError, DEFAULT_NAME};
