//! Cooperative, single-pass scheduling of step units.
//!
//! An [`Executor`] owns an ordered list of [`Node`]s and calls each one's
//! `step` exactly once per tick, in registration order. Nodes communicate only
//! through bus handles they hold; the shared [`Context`] gives them a common
//! view of time.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub const S_TO_NS: i64 = 1_000_000_000;
pub const MS_TO_NS: i64 = 1_000_000;
pub const US_TO_NS: i64 = 1_000;

/// A point in time in nanoseconds since an arbitrary epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_ns(ns: i64) -> Self {
        Self(ns)
    }

    pub const fn from_us(us: i64) -> Self {
        Self(us * US_TO_NS)
    }

    pub const fn from_ms(ms: i64) -> Self {
        Self(ms * MS_TO_NS)
    }

    pub const fn num_ns(self) -> i64 {
        self.0
    }

    pub const fn num_us(self) -> i64 {
        self.0 / US_TO_NS
    }

    pub const fn num_ms(self) -> i64 {
        self.0 / MS_TO_NS
    }

    pub const fn num_s(self) -> i64 {
        self.0 / S_TO_NS
    }

    /// Seconds as a float, split into integral and fractional parts so large
    /// timestamps keep their sub-second precision.
    pub fn as_secs_f64(self) -> f64 {
        let integral = self.0 / S_TO_NS;
        let fraction = self.0 % S_TO_NS;
        integral as f64 + fraction as f64 / S_TO_NS as f64
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

/// Source of time for a run.
pub trait Clock: Send + Sync {
    fn timestamp(&self) -> Timestamp;
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct VirtualClock {
    ns: AtomicI64,
}

impl VirtualClock {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            ns: AtomicI64::new(initial.num_ns()),
        }
    }

    pub fn set_time(&self, ts: Timestamp) {
        self.ns.store(ts.num_ns(), Ordering::Release);
    }

    /// Move the clock forward by `delta_ns` and return the new time.
    ///
    /// Saturates at the ends of the `i64` nanosecond range.
    pub fn advance(&self, delta_ns: i64) -> Timestamp {
        let step = |ns: i64| Some(ns.saturating_add(delta_ns));
        let prev = self
            .ns
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, step)
            .unwrap_or_else(|ns| ns);
        Timestamp(prev.saturating_add(delta_ns))
    }
}

impl Clock for VirtualClock {
    fn timestamp(&self) -> Timestamp {
        Timestamp(self.ns.load(Ordering::Acquire))
    }
}

/// Read-only state shared by every node in a run.
#[derive(Clone)]
pub struct Context {
    clock: Arc<dyn Clock>,
}

impl Context {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.timestamp()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("now", &self.now()).finish()
    }
}

/// Identity of a node plus its view of the run context.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    name: String,
    id: u8,
    ctx: Context,
}

impl NodeInfo {
    pub fn new(name: impl Into<String>, id: u8, ctx: Context) -> Self {
        Self {
            name: name.into(),
            id,
            ctx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

/// A step unit.
///
/// `step` must not block. Side effects are expected to go through bus
/// handles owned by the node.
pub trait Node: Send {
    fn info(&self) -> &NodeInfo;

    fn step(&mut self);
}

/// Runs registered nodes in a fixed order, one pass per tick.
///
/// Ordering between producers and consumers is the caller's job: register a
/// producer before anything that reads its output within the same tick.
#[derive(Default)]
pub struct Executor {
    nodes: Vec<Box<dyn Node>>,
    ticks: u64,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Box<dyn Node>) {
        tracing::debug!(
            node = node.info().name(),
            id = node.info().id(),
            position = self.nodes.len(),
            "node registered"
        );
        self.nodes.push(node);
    }

    /// Run one tick. A panicking node aborts the rest of the tick.
    pub fn step(&mut self) {
        for node in &mut self.nodes {
            tracing::trace!(node = node.info().name(), tick = self.ticks, "step");
            node.step();
        }
        self.ticks += 1;
    }

    /// Completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.info().name())
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("nodes", &self.node_names().collect::<Vec<_>>())
            .field("ticks", &self.ticks)
            .finish()
    }
}
