use std::fmt;

use bitfield::{BitRange, BitRangeMut};
use log::{debug, warn};

use super::model::{ChecksumPolicy, Field, Variant, FIXED_A, FIXED_B, TEMP_MAX, TEMP_MIN};
use super::{DecodeError, EncodeError, Fan, Mode, Swing, ThermostatState};

// Modes
const MODE_AUTO: u8 = 0;
const MODE_COOL: u8 = 1;
const MODE_DRY: u8 = 2;
const MODE_FAN: u8 = 3;
const MODE_HEAT: u8 = 4;

// Fans
const FAN_AUTO: u8 = 0;
const FAN_LOW: u8 = 1;
const FAN_MEDIUM: u8 = 2;
const FAN_HIGH: u8 = 3;

// Louvers
const SWING_ON: u8 = 1;
const SWING_FIXED: u8 = 0;
const SWING_AUTO: u8 = 0;
const SWING_MANUAL: u8 = 1;

/// One remote command, stored as a little-endian u64 so that byte 0 occupies bits 0..8.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame(pub u64);

impl Frame {
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Frame(u64::from_le_bytes(bytes))
    }

    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub fn get(&self, field: Field) -> u8 {
        self.0.bit_range(field.msb, field.lsb)
    }

    pub fn set(&mut self, field: Field, value: u8) {
        self.0.set_bit_range(field.msb, field.lsb, value);
    }

    pub fn flag(&self, field: Field) -> bool {
        self.get(field) != 0
    }

    pub fn set_flag(&mut self, field: Field, value: bool) {
        self.set(field, value as u8);
    }

    pub fn checksum(&self, variant: &Variant) -> u8 {
        self.get(variant.layout.checksum)
    }

    pub fn compute_checksum(&self, variant: &Variant) -> u8 {
        let bytes = self.to_bytes();
        variant.checksum.compute(&bytes[..variant.layout.frame_len])
    }

    fn apply_checksum(&mut self, variant: &Variant) {
        let sum = self.compute_checksum(variant);
        self.set(variant.layout.checksum, sum);
    }

    /// Frames of variants without a checksum always validate.
    pub fn validate_checksum(&self, variant: &Variant) -> bool {
        variant.checksum == ChecksumPolicy::None
            || self.compute_checksum(variant) == self.checksum(variant)
    }

    /// Packs a state into a fresh frame. The checksum is always computed last.
    pub fn encode(state: &ThermostatState, variant: &Variant) -> Result<Self, EncodeError> {
        if !(TEMP_MIN..=TEMP_MAX).contains(&state.target_temperature) {
            return Err(EncodeError::TemperatureOutOfRange(state.target_temperature));
        }

        let layout = variant.layout;
        let mut frame = Frame(0);

        let power = state.power && state.mode != Mode::Off;
        frame.set_flag(layout.power, power);
        frame.set(
            layout.mode,
            match state.mode {
                _ if !power => MODE_AUTO,
                Mode::Off | Mode::Auto => MODE_AUTO,
                Mode::Cool => MODE_COOL,
                Mode::Dry => MODE_DRY,
                Mode::Fan => MODE_FAN,
                Mode::Heat => MODE_HEAT,
            },
        );
        frame.set(
            layout.fan,
            match state.fan {
                Fan::Auto => FAN_AUTO,
                Fan::Low => FAN_LOW,
                Fan::Medium => FAN_MEDIUM,
                Fan::High => FAN_HIGH,
            },
        );
        frame.set(layout.temperature, state.target_temperature - TEMP_MIN);

        frame.set(
            layout.swing_auto,
            if state.swing.is_enabled() {
                SWING_AUTO
            } else {
                SWING_MANUAL
            },
        );
        frame.set(
            layout.swing_v,
            if state.swing.vertical() {
                SWING_ON
            } else {
                SWING_FIXED
            },
        );
        frame.set(
            layout.swing_h,
            if state.swing.horizontal() {
                SWING_ON
            } else {
                SWING_FIXED
            },
        );

        frame.set_flag(layout.sleep, state.sleep);
        frame.set_flag(layout.light, true);
        frame.set_flag(layout.model_a, variant.model_a);
        frame.set(layout.fixed_a, FIXED_A);
        frame.set(layout.fixed_b, FIXED_B);

        match layout.wifi {
            Some(field) => frame.set_flag(field, state.wifi),
            None if state.wifi => debug!("{} has no wifi bit, ignoring", variant.model),
            None => {}
        }

        frame.apply_checksum(variant);
        Ok(frame)
    }

    /// Extracts the state carried by this frame.
    ///
    /// Values the remote shouldn't send decode to the closest valid state instead of failing.
    pub fn decode(&self, variant: &Variant, check_checksum: bool) -> Result<ThermostatState, DecodeError> {
        let layout = variant.layout;

        if !self.validate_checksum(variant) {
            let expected = self.compute_checksum(variant);
            let received = self.checksum(variant);
            if check_checksum {
                warn!("checksum mismatch: expected {:x}, got {:x}", expected, received);
                return Err(DecodeError::ChecksumMismatch { expected, received });
            }
            debug!(
                "checksum mismatch: expected {:x}, got {:x}, ignoring",
                expected, received
            );
        }

        let power = self.flag(layout.power);
        let mode = if power {
            match self.get(layout.mode) {
                MODE_AUTO => Mode::Auto,
                MODE_COOL => Mode::Cool,
                MODE_DRY => Mode::Dry,
                MODE_FAN => Mode::Fan,
                MODE_HEAT => Mode::Heat,
                other => {
                    warn!("unknown mode {}, falling back to auto", other);
                    Mode::Auto
                }
            }
        } else {
            Mode::Off
        };

        let fan = match self.get(layout.fan) {
            FAN_LOW => Fan::Low,
            FAN_MEDIUM => Fan::Medium,
            FAN_HIGH => Fan::High,
            _ => Fan::Auto,
        };

        let raw_temp = self.get(layout.temperature);
        let target_temperature = match raw_temp.checked_add(TEMP_MIN) {
            Some(t) if t <= TEMP_MAX => t,
            _ => {
                warn!("temperature offset {} out of range, clamping", raw_temp);
                TEMP_MAX
            }
        };

        let vertical = self.get(layout.swing_v) == SWING_ON;
        let horizontal = self.get(layout.swing_h) == SWING_ON;
        let swing = match (vertical, horizontal) {
            (true, true) => Swing::Both,
            (true, false) => Swing::Vertical,
            (false, true) => Swing::Horizontal,
            (false, false) => Swing::Off,
        };

        Ok(ThermostatState {
            power,
            mode,
            target_temperature,
            fan,
            swing,
            sleep: self.flag(layout.sleep),
            wifi: layout.wifi.map(|f| self.flag(f)).unwrap_or(false),
        })
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", hex::encode_upper(self.to_bytes()))
    }
}
