pub mod broadlink;
pub mod climate;
pub mod config;
pub mod gree;
pub mod modem;
pub mod pulse;
pub mod pwm;
pub mod smartir;

pub use climate::{ClimateTraits, Diagnostics, GreeClimate};
pub use config::{Config, ConfigError};
pub use gree::{DecodeError, EncodeError, Fan, Mode, Model, Swing, ThermostatState};
pub use pulse::PulseSequence;
