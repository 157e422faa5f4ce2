//! Gree air conditioner driver: turns thermostat states into IR transmissions and received remote
//! commands back into states.
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use serde::Serialize;

use crate::config::{Config, ConfigError};
use crate::gree::{
    DecodeError, EncodeError, Fan, Frame, Mode, Phy, Swing, ThermostatState, Variant, TEMP_MAX,
    TEMP_MIN,
};
use crate::modem::Transmitter;
use crate::pulse::PulseSequence;

/// Receptions this soon after a transmission are most likely our own signal bouncing back.
pub const ECHO_GUARD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub sent_frames: u64,
    pub transmit_failures: u64,
    pub received_frames: u64,
    pub malformed: u64,
    pub wrong_model: u64,
    pub checksum_mismatches: u64,
    pub ignored_echoes: u64,
}

/// What the climate component may offer to the user for this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateTraits {
    pub min_temperature: u8,
    pub max_temperature: u8,
    pub temperature_step: u8,
    /// Empty unless received remote commands are reported back
    pub modes: Vec<Mode>,
    pub fan_modes: Vec<Fan>,
    pub swing_modes: Vec<Swing>,
}

type StateCallback = Box<dyn FnMut(&ThermostatState)>;

pub struct GreeClimate<T> {
    config: Config,
    variant: &'static Variant,
    phy: Phy,
    transmitter: T,
    on_state_received: Option<StateCallback>,
    last_transmit: Option<Instant>,
    diagnostics: Diagnostics,
}

impl<T: Transmitter> GreeClimate<T> {
    pub fn new(config: Config, transmitter: T) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let variant = config.model.variant();

        Ok(Self {
            config,
            variant,
            phy: Phy::new(variant.timing),
            transmitter,
            on_state_received: None,
            last_transmit: None,
            diagnostics: Diagnostics::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }

    pub fn into_transmitter(self) -> T {
        self.transmitter
    }

    /// Registers the callback that receives states decoded from the physical remote.
    pub fn on_state_received(&mut self, callback: impl FnMut(&ThermostatState) + 'static) {
        self.on_state_received = Some(Box::new(callback));
    }

    pub fn traits(&self) -> ClimateTraits {
        ClimateTraits {
            min_temperature: TEMP_MIN,
            max_temperature: TEMP_MAX,
            temperature_step: 1,
            modes: if self.config.set_modes {
                vec![Mode::Off, Mode::Cool, Mode::Heat, Mode::Dry, Mode::Fan, Mode::Auto]
            } else {
                Vec::new()
            },
            fan_modes: vec![Fan::Auto, Fan::Low, Fan::Medium, Fan::High],
            swing_modes: vec![Swing::Off, Swing::Vertical, Swing::Horizontal, Swing::Both],
        }
    }

    /// Builds the frame for a state, with the configured extras applied.
    pub fn frame(&self, state: &ThermostatState) -> Result<Frame, EncodeError> {
        let state = ThermostatState {
            wifi: state.wifi || self.config.wifi_function,
            ..*state
        };
        Frame::encode(&state, self.variant)
    }

    /// Renders a state into the pulse train of a single transmission.
    pub fn encode(&self, state: &ThermostatState) -> Result<PulseSequence, EncodeError> {
        let frame = self.frame(state)?;
        debug!("sending {} frame: {:?}", self.variant.model, frame);
        Ok(self.phy.encode(&frame)?)
    }

    pub fn decode(&self, pulses: &PulseSequence) -> Result<ThermostatState, DecodeError> {
        let frame = self.phy.decode(pulses)?;
        debug!("received {} frame: {:?}", self.variant.model, frame);
        frame.decode(self.variant, self.config.check_checksum)
    }

    /// Encodes a state and transmits it `repeat` times.
    ///
    /// A busy or failing transmitter aborts the remaining repeats, the error is returned as is.
    pub fn set_state(&mut self, state: &ThermostatState) -> Result<(), EncodeError> {
        let pulses = self.encode(state)?;

        for i in 0..self.config.repeat {
            if let Err(err) = self.transmitter.send(&pulses) {
                self.diagnostics.transmit_failures += 1;
                warn!("transmission {} of {} failed: {}", i + 1, self.config.repeat, err);
                return Err(err.into());
            }
            self.diagnostics.sent_frames += 1;
            self.last_transmit = Some(Instant::now());
        }

        Ok(())
    }

    /// Handles a capture from the IR receiver. Returns whether it produced a state update.
    ///
    /// Garbage is expected on an IR link, so errors are logged and counted, never returned.
    pub fn on_receive(&mut self, pulses: &PulseSequence) -> bool {
        if let Some(last) = self.last_transmit {
            if last.elapsed() < ECHO_GUARD {
                trace!("ignoring capture right after our own transmission");
                self.diagnostics.ignored_echoes += 1;
                return false;
            }
        }

        let state = match self.decode(pulses) {
            Ok(state) => state,
            Err(err) => {
                match err {
                    DecodeError::Malformed(_) => self.diagnostics.malformed += 1,
                    DecodeError::WrongModel(_) => self.diagnostics.wrong_model += 1,
                    DecodeError::ChecksumMismatch { .. } => self.diagnostics.checksum_mismatches += 1,
                }
                debug!("dropping capture: {}", err);
                return false;
            }
        };

        self.diagnostics.received_frames += 1;
        if !self.config.set_modes {
            debug!("received {:?}, not reporting since set_modes is off", state);
            return false;
        }

        info!("remote sent {:?}", state);
        if let Some(callback) = self.on_state_received.as_mut() {
            callback(&state);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::gree::Model;
    use crate::modem::DeviceError;
    use strum::IntoEnumIterator;

    #[derive(Default)]
    struct Recorder {
        sent: Vec<PulseSequence>,
        busy_after: Option<usize>,
    }

    impl Transmitter for Recorder {
        fn send(&mut self, pulses: &PulseSequence) -> Result<(), DeviceError> {
            if self.busy_after.map_or(false, |n| self.sent.len() >= n) {
                return Err(DeviceError::Busy);
            }
            self.sent.push(pulses.clone());
            Ok(())
        }
    }

    fn cool_24() -> ThermostatState {
        ThermostatState {
            power: true,
            mode: Mode::Cool,
            target_temperature: 24,
            fan: Fan::Auto,
            swing: Swing::Off,
            sleep: false,
            wifi: false,
        }
    }

    fn climate(config: Config) -> GreeClimate<Recorder> {
        GreeClimate::new(config, Recorder::default()).unwrap()
    }

    #[test]
    fn test_single_transmission() {
        let mut climate = climate(Config::default());
        climate.set_state(&cool_24()).unwrap();

        let sent = &climate.transmitter().sent;
        assert_eq!(sent.len(), 1);

        let frame = Phy::for_model(Model::Generic).decode(&sent[0]).unwrap();
        let state = frame.decode(Model::Generic.variant(), false).unwrap();
        assert_eq!(state, cool_24());
        assert_eq!(climate.diagnostics().sent_frames, 1);
    }

    #[test]
    fn test_repeat() {
        let mut climate = climate(Config {
            repeat: 5,
            ..Config::default()
        });
        climate.set_state(&cool_24()).unwrap();

        let sent = climate.into_transmitter().sent;
        assert_eq!(sent.len(), 5);
        assert!(sent.iter().all(|p| *p == sent[0]));
    }

    #[test]
    fn test_busy_is_surfaced() {
        let mut climate = GreeClimate::new(
            Config {
                repeat: 3,
                ..Config::default()
            },
            Recorder {
                busy_after: Some(1),
                ..Recorder::default()
            },
        )
        .unwrap();

        let err = climate.set_state(&cool_24()).unwrap_err();
        assert!(matches!(err, EncodeError::Transmit(DeviceError::Busy)));
        assert_eq!(climate.transmitter().sent.len(), 1);
        assert_eq!(climate.diagnostics().transmit_failures, 1);
    }

    #[test]
    fn test_invalid_config() {
        let err = GreeClimate::new(
            Config {
                repeat: 0,
                ..Config::default()
            },
            Recorder::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::InvalidRepeat(0)));
    }

    #[test]
    fn test_invalid_state() {
        let mut climate = climate(Config::default());
        let state = ThermostatState {
            target_temperature: 35,
            ..cool_24()
        };
        assert!(matches!(
            climate.set_state(&state),
            Err(EncodeError::TemperatureOutOfRange(35))
        ));
        assert!(climate.transmitter().sent.is_empty());
    }

    #[test]
    fn test_wifi_function() {
        let climate = climate(Config {
            wifi_function: true,
            ..Config::default()
        });
        let frame = climate.frame(&cool_24()).unwrap();
        assert!(frame.decode(Model::Generic.variant(), true).unwrap().wifi);
    }

    fn remote_signal(model: Model, state: &ThermostatState) -> PulseSequence {
        let frame = Frame::encode(state, model.variant()).unwrap();
        Phy::for_model(model).encode(&frame).unwrap()
    }

    fn listening(config: Config) -> (GreeClimate<Recorder>, Rc<RefCell<Vec<ThermostatState>>>) {
        let received = Rc::new(RefCell::new(Vec::new()));
        let mut climate = climate(config);
        let sink = received.clone();
        climate.on_state_received(move |state| sink.borrow_mut().push(*state));
        (climate, received)
    }

    #[test]
    fn test_receive() {
        for model in Model::iter() {
            let (mut climate, received) = listening(Config {
                model,
                set_modes: true,
                check_checksum: true,
                ..Config::default()
            });

            let state = ThermostatState {
                mode: Mode::Heat,
                target_temperature: 21,
                fan: Fan::Low,
                swing: Swing::Both,
                ..ThermostatState::default()
            };
            assert!(climate.on_receive(&remote_signal(model, &state)));
            assert_eq!(*received.borrow(), vec![state]);
            assert_eq!(climate.diagnostics().received_frames, 1);
        }
    }

    #[test]
    fn test_receive_without_set_modes() {
        let (mut climate, received) = listening(Config::default());

        assert!(!climate.on_receive(&remote_signal(Model::Generic, &cool_24())));
        assert!(received.borrow().is_empty());
        // The frame was still valid
        assert_eq!(climate.diagnostics().received_frames, 1);
        assert!(climate.traits().modes.is_empty());
    }

    #[test]
    fn test_receive_errors_are_absorbed() {
        let (mut climate, received) = listening(Config {
            set_modes: true,
            check_checksum: true,
            ..Config::default()
        });

        // Truncated
        let signal = remote_signal(Model::Generic, &cool_24());
        let truncated = PulseSequence::from_durations(signal.durations().take(40));
        assert!(!climate.on_receive(&truncated));

        // Another remote
        assert!(!climate.on_receive(&remote_signal(Model::Yaw1f, &cool_24())));

        // Corrupted temperature nibble
        let mut frame = Frame::encode(&cool_24(), Model::Generic.variant()).unwrap();
        frame.0 ^= 1 << 8;
        let corrupted = Phy::for_model(Model::Generic).encode(&frame).unwrap();
        assert!(!climate.on_receive(&corrupted));

        assert!(received.borrow().is_empty());
        assert_eq!(
            climate.diagnostics(),
            &Diagnostics {
                malformed: 1,
                wrong_model: 1,
                checksum_mismatches: 1,
                ..Diagnostics::default()
            }
        );
    }

    #[test]
    fn test_checksum_ignored_when_disabled() {
        let (mut climate, received) = listening(Config {
            set_modes: true,
            ..Config::default()
        });

        let mut frame = Frame::encode(&cool_24(), Model::Generic.variant()).unwrap();
        frame.0 ^= 1 << 8;
        let corrupted = Phy::for_model(Model::Generic).encode(&frame).unwrap();
        assert!(climate.on_receive(&corrupted));
        assert_eq!(received.borrow()[0].target_temperature, 25);
    }

    #[test]
    fn test_echo_suppression() {
        let (mut climate, received) = listening(Config {
            set_modes: true,
            ..Config::default()
        });

        climate.set_state(&cool_24()).unwrap();
        let echo = climate.transmitter().sent[0].clone();
        assert!(!climate.on_receive(&echo));
        assert!(received.borrow().is_empty());
        assert_eq!(climate.diagnostics().ignored_echoes, 1);
    }
}
