//! Flight executive for the crater vehicle.
//!
//! [`FlightExec`] wires the telemetry link to a fixed set of step units and
//! exposes the one-call contract used by every outer surface: hand it a
//! buffer of input frames, get back a buffer of output frames, one tick per
//! call.

pub mod config;
pub mod error;
pub mod exec;
pub mod nodes;

pub use config::{ConfigIssue, FswConfig, ValidatedConfig};
pub use error::{FswError, Result};
pub use exec::{FlightExec, StepReport};
pub use nodes::{Heartbeat, ImuServoMixer, PressureBias};
