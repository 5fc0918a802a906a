//! Rocket flight-software telemetry bus with MAVLink v2 framing.
//!
//! # Crate Structure
//!
//! - [`core`]: bounded queues, the typed publish/subscribe bus, the error
//!   model, and the cooperative scheduler
//! - [`link`]: frame codec, message registry, stream demultiplexer and multiplexer
//! - [`fsw`]: the flight executive and its step units

/// Re-export core types.
pub mod core {
    pub use crater_core::*;
}

/// Re-export link types.
pub mod link {
    pub use crater_link::*;
}

/// Re-export flight executive types.
pub mod fsw {
    pub use crater_fsw::*;
}
