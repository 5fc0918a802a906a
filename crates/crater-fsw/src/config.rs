use serde::{Deserialize, Serialize};

use crater_core::{ErrorCode, ErrorData, ErrorValue, Expected};
use crater_link::{ComponentId, LinkConfig, SYSTEM_ID};

use crate::error::Result;

/// Default depth of every bus queue in the executive.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Default tick period: 100 Hz.
pub const DEFAULT_TICK_PERIOD_US: u64 = 10_000;

/// Longest accepted tick period: one minute.
pub const MAX_TICK_PERIOD_US: u64 = 60_000_000;

/// Flight executive configuration.
///
/// Every field has a default, so an empty JSON object is a valid document.
/// Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FswConfig {
    /// Depth of each bus receiver queue. Default: 16.
    pub queue_capacity: usize,
    /// System id sensor frames are accepted from.
    pub input_system_id: u8,
    /// Component id sensor frames are accepted from.
    pub input_component_id: u8,
    /// System id stamped on outgoing frames.
    pub output_system_id: u8,
    /// Component id stamped on outgoing frames.
    pub output_component_id: u8,
    /// Simulated time added per tick. Default: 10 ms.
    pub tick_period_us: u64,
    /// Offset added to every static pressure sample.
    pub pressure_bias_pa: f32,
    /// Emit a heartbeat every N ticks; 0 disables it.
    pub heartbeat_every_ticks: u32,
    /// Bytes requested per input read.
    pub read_chunk_size: usize,
}

impl Default for FswConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            input_system_id: SYSTEM_ID,
            input_component_id: ComponentId::Rocket.into(),
            output_system_id: SYSTEM_ID,
            output_component_id: ComponentId::Fsw.into(),
            tick_period_us: DEFAULT_TICK_PERIOD_US,
            pressure_bias_pa: 1.0,
            heartbeat_every_ticks: 100,
            read_chunk_size: LinkConfig::default().read_chunk_size,
        }
    }
}

/// The field that failed validation and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub reason: String,
}

impl ErrorData for ConfigIssue {
    fn data_string(&self) -> Option<String> {
        Some(format!("{}: {}", self.field, self.reason))
    }
}

fn issue(
    code: ErrorCode,
    field: &'static str,
    reason: impl Into<String>,
) -> ErrorValue<ConfigIssue> {
    ErrorValue::new(
        code,
        ConfigIssue {
            field,
            reason: reason.into(),
        },
    )
}

/// A configuration that passed [`FswConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig(FswConfig);

impl ValidatedConfig {
    pub fn get(&self) -> &FswConfig {
        &self.0
    }

    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            read_chunk_size: self.0.read_chunk_size,
        }
    }
}

impl FswConfig {
    /// Parse a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check the values that would otherwise panic or misbehave at runtime.
    pub fn validate(self) -> Expected<ValidatedConfig, ConfigIssue> {
        if self.queue_capacity == 0 {
            return Err(issue(
                ErrorCode::InvalidConfig,
                "queue_capacity",
                "must be at least 1",
            ));
        }
        if self.tick_period_us == 0 {
            return Err(issue(
                ErrorCode::InvalidConfig,
                "tick_period_us",
                "must be at least 1",
            ));
        }
        if self.tick_period_us > MAX_TICK_PERIOD_US {
            return Err(issue(
                ErrorCode::OutOfRange,
                "tick_period_us",
                format!(
                    "{} exceeds the maximum of {MAX_TICK_PERIOD_US}",
                    self.tick_period_us
                ),
            ));
        }
        if self.read_chunk_size == 0 {
            return Err(issue(
                ErrorCode::InvalidConfig,
                "read_chunk_size",
                "must be at least 1",
            ));
        }
        if !self.pressure_bias_pa.is_finite() {
            return Err(issue(
                ErrorCode::OutOfRange,
                "pressure_bias_pa",
                format!("{} is not finite", self.pressure_bias_pa),
            ));
        }

        Ok(ValidatedConfig(self))
    }
}
