use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{
    broadlink::Recording,
    climate::GreeClimate,
    config::Config,
    gree::{Fan, Mode, Model, Swing, ThermostatState, TEMP_MAX, TEMP_MIN},
    modem::{DeviceError, Transmitter},
    pulse::PulseSequence,
};

/*
{
   "manufacturer":"Gree",
   "supportedModels":["YAW1F"],
   "supportedController":"Broadlink",
   "commandsEncoding":"Base64",
   "minTemperature":16.0,
   "maxTemperature":30.0,
   "precision":1,
   "operationModes":["cool", "heat", ...],
   "fanModes":["auto", "low", "mid", "high"],
   "commands": { "off": "...", "cool": { "auto": { "16": "...", ... } } }
}
*/

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CodeFile {
    pub manufacturer: String,
    pub supported_models: Vec<String>,
    pub supported_controller: String,
    pub commands_encoding: String,
    pub min_temperature: f32,
    pub max_temperature: f32,
    pub precision: u8,
    pub operation_modes: Vec<String>,
    pub fan_modes: Vec<String>,
    pub commands: serde_json::Value,
}

// SmartIR calls the medium speed "mid"
fn fan_name(fan: Fan) -> String {
    match fan {
        Fan::Medium => "mid".into(),
        other => other.as_ref().into(),
    }
}

fn operation_modes() -> impl Iterator<Item = Mode> {
    Mode::iter().filter(|&m| m != Mode::Off)
}

/// Never transmits, only converts.
struct Encoder;

impl Transmitter for Encoder {
    fn send(&mut self, _pulses: &PulseSequence) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// Generates a SmartIR code file covering every state a model can be set to.
pub fn gen_smartir(config: Config) -> anyhow::Result<CodeFile> {
    let climate = GreeClimate::new(config, Encoder)?;
    let encode_state = |state: &ThermostatState| -> anyhow::Result<serde_json::Value> {
        let pulses = climate.encode(state)?;
        let recording_bytes = Recording::new_ir(pulses).to_bytes();
        Ok(base64::encode(recording_bytes).into())
    };

    // Commands are nested to represent all possible states, the hierarchy used in other models is:
    // mode -> fan -> temperature
    let mut all_commands = serde_json::Map::new();

    for mode in operation_modes() {
        let mut mode_map = serde_json::Map::new();

        for fan in Fan::iter() {
            let state = ThermostatState {
                power: true,
                mode,
                fan,
                swing: Swing::Off,
                ..ThermostatState::default()
            };

            if mode == Mode::Fan {
                // The set point isn't used in fan-only mode
                mode_map.insert(fan_name(fan), encode_state(&state)?);
                continue;
            }

            let mut fan_map = serde_json::Map::new();
            for target_temperature in TEMP_MIN..=TEMP_MAX {
                let state = ThermostatState {
                    target_temperature,
                    ..state
                };
                fan_map.insert(target_temperature.to_string(), encode_state(&state)?);
            }
            mode_map.insert(fan_name(fan), fan_map.into());
        }

        all_commands.insert(mode.as_ref().into(), mode_map.into());
    }

    all_commands.insert("off".into(), encode_state(&ThermostatState::off())?);

    Ok(CodeFile {
        manufacturer: "Gree".into(),
        supported_models: vec![model_name(config.model)],
        supported_controller: "Broadlink".into(),
        commands_encoding: "Base64".into(),
        min_temperature: TEMP_MIN as f32,
        max_temperature: TEMP_MAX as f32,
        precision: 1,
        operation_modes: operation_modes().map(|m| m.as_ref().into()).collect(),
        fan_modes: Fan::iter().map(fan_name).collect(),
        commands: all_commands.into(),
    })
}

fn model_name(model: Model) -> String {
    match model {
        Model::Generic => "Generic".into(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;

    use super::*;
    use crate::gree::Phy;

    #[test]
    fn test_generate() {
        let config = Config {
            model: Model::Ybofb,
            ..Config::default()
        };
        let file = gen_smartir(config).unwrap();

        assert_eq!(file.supported_models, vec!["YBOFB".to_string()]);
        assert_eq!(file.fan_modes, vec!["auto", "low", "mid", "high"]);
        assert_eq!(file.operation_modes.len(), 5);

        let commands = file.commands.as_object().unwrap();
        assert!(commands.contains_key("off"));
        assert_eq!(commands["cool"]["mid"].as_object().unwrap().len(), 15);
        assert!(commands["fan"]["high"].is_string());

        // Commands decode back to the state they were generated for
        let encoded = commands["heat"]["low"]["22"].as_str().unwrap();
        let recording = Recording::from_bytes(Bytes::from(base64::decode(encoded).unwrap())).unwrap();
        let frame = Phy::for_model(Model::Ybofb).decode(&recording.pulses).unwrap();
        let state = frame.decode(Model::Ybofb.variant(), true).unwrap();
        assert_eq!(state.mode, Mode::Heat);
        assert_eq!(state.fan, Fan::Low);
        assert_eq!(state.target_temperature, 22);

        serde_json::to_string_pretty(&file).unwrap();
    }
}
