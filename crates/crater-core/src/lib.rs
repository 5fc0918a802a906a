//! Onboard telemetry bus primitives.
//!
//! - [`RingQueue`]: fixed-capacity circular buffer that drops the oldest value
//!   on overflow
//! - [`Mutex`]/[`Guard`]: scoped exclusive access
//! - [`Bus`]: broadcast channel where every [`Receiver`] owns its own queue
//! - [`Executor`]: cooperative scheduler running [`Node`]s once per tick
//! - [`error`]: tagged error values with type-erased aggregation
//!
//! Nothing here blocks beyond a single bounded critical section, so the same
//! code serves a single-threaded tick loop and producers running on other
//! threads.

pub mod bus;
pub mod error;
pub mod exec;
pub mod ring;
pub mod sync;

pub use bus::{Bus, Receiver, Sender};
pub use error::{AnyError, AnyExpected, ErrorBase, ErrorCode, ErrorData, ErrorValue, Expected};
pub use exec::{Clock, Context, Executor, Node, NodeInfo, Timestamp, VirtualClock};
pub use ring::RingQueue;
pub use sync::{Guard, Mutex};
