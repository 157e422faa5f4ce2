pub mod model;
pub use model::{BitLayout, ChecksumPolicy, Field, Model, Timing, Variant, TEMP_MAX, TEMP_MIN};
pub mod phy;
pub use phy::*;
pub mod frame;
pub use frame::Frame;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::modem::DeviceError;
use crate::pwm::CodecError;

// The complete state sent to the air conditioner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThermostatState {
    pub power: bool,

    pub mode: Mode,

    // Target temperature in Celsius
    pub target_temperature: u8,

    pub fan: Fan,

    pub swing: Swing,

    // Sleep preset, slowly drifts the set point overnight
    #[serde(default)]
    pub sleep: bool,

    // Tells the unit a WiFi module is attached
    #[serde(default)]
    pub wifi: bool,
}

impl ThermostatState {
    pub fn off() -> Self {
        Self {
            power: false,
            mode: Mode::Off,
            ..Self::default()
        }
    }
}

impl Default for ThermostatState {
    fn default() -> Self {
        Self {
            power: true,
            mode: Mode::Auto,
            target_temperature: 24,
            fan: Fan::Auto,
            swing: Swing::Off,
            sleep: false,
            wifi: false,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Off,
    Auto,
    Cool,
    Heat,
    Dry,
    Fan,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Fan {
    Auto,
    Low,
    #[strum(serialize = "mid", serialize = "medium")]
    Medium,
    High,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Swing {
    Off,
    Vertical,
    Horizontal,
    Both,
}

impl Swing {
    pub fn is_enabled(self) -> bool {
        self != Swing::Off
    }

    pub fn vertical(self) -> bool {
        matches!(self, Swing::Vertical | Swing::Both)
    }

    pub fn horizontal(self) -> bool {
        matches!(self, Swing::Horizontal | Swing::Both)
    }
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("temperature {0}C out of range, must be between 16C and 30C")]
    TemperatureOutOfRange(u8),

    #[error("pulse encoding failed: {0}")]
    Pulse(#[from] CodecError<PulseType>),

    #[error("transmit failed: {0}")]
    Transmit(#[from] DeviceError),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed signal: {0}")]
    Malformed(PhyError),

    #[error("signal doesn't match the configured model: {0}")]
    WrongModel(PhyError),

    #[error("checksum mismatch: expected {expected:x}, got {received:x}")]
    ChecksumMismatch { expected: u8, received: u8 },
}

impl From<PhyError> for DecodeError {
    fn from(err: PhyError) -> Self {
        match err {
            PhyError::InvalidHeader(_) | PhyError::Oversized(_) => DecodeError::WrongModel(err),
            _ => DecodeError::Malformed(err),
        }
    }
}
