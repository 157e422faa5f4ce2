use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

use crate::broadlink::Recording;
use crate::pulse::PulseSequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::AsRefStr, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum FormatType {
    Base64,
    Hex,
    Raw,
}

pub trait Format {
    type Error;

    fn decode(&self, input: &str) -> Result<Recording, Self::Error>;
    fn encode(&self, recording: &Recording) -> Result<String, Self::Error>;
}

pub fn create_format(ty: FormatType) -> Box<dyn Format<Error = FormatError>> {
    match ty {
        FormatType::Base64 => Box::new(BroadlinkBase64),
        FormatType::Hex => Box::new(BroadlinkHex),
        FormatType::Raw => Box::new(Raw),
    }
}

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("failed to decode hex string: {0}")]
    HexDecodeError(#[from] hex::FromHexError),
    #[error("failed to decode base64 string: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),
    #[error("failed to parse broadlink message: {0}")]
    BroadlinkParseError(#[from] crate::broadlink::ParseError),
    #[error("failed to parse raw durations: {0}")]
    RawParseError(String),
    #[error("empty input")]
    EmptyInput,
}

pub struct BroadlinkHex;
impl Format for BroadlinkHex {
    type Error = FormatError;

    fn decode(&self, input: &str) -> Result<Recording, Self::Error> {
        let decoded = hex::decode(input)?;
        if decoded.is_empty() {
            return Err(FormatError::EmptyInput);
        }

        Ok(Recording::from_bytes(Bytes::from(decoded))?)
    }

    fn encode(&self, recording: &Recording) -> Result<String, Self::Error> {
        Ok(hex::encode(recording.to_bytes()))
    }
}

pub struct BroadlinkBase64;
impl Format for BroadlinkBase64 {
    type Error = FormatError;

    fn decode(&self, input: &str) -> Result<Recording, Self::Error> {
        let decoded = base64::decode(input)?;
        if decoded.is_empty() {
            return Err(FormatError::EmptyInput);
        }

        Ok(Recording::from_bytes(Bytes::from(decoded))?)
    }

    fn encode(&self, recording: &Recording) -> Result<String, Self::Error> {
        Ok(base64::encode(recording.to_bytes()))
    }
}

pub struct Raw;
impl Format for Raw {
    type Error = FormatError;

    fn decode(&self, input: &str) -> Result<Recording, Self::Error> {
        // Support IrTransmogrifier's format which looks like `Freq=38400Hz[.....][...]`
        let input = if input.starts_with("Freq=") {
            let mut parts = input.splitn(2, '[');
            parts.next();
            let untrimmed = parts
                .next()
                .ok_or_else(|| FormatError::RawParseError(input.into()))?;
            untrimmed
                .split(']')
                .next()
                .ok_or_else(|| FormatError::RawParseError(input.into()))?
        } else {
            input
        };

        if input.trim().is_empty() {
            return Err(FormatError::EmptyInput);
        }

        let msg = irp::Message::parse(input).or(Err(FormatError::RawParseError(input.into())))?;
        Ok(Recording::new_ir(PulseSequence::from_durations(
            msg.raw.into_iter().map(|t| Duration::from_micros(t as _)),
        )))
    }

    fn encode(&self, recording: &Recording) -> Result<String, Self::Error> {
        Ok(recording.pulses.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_raw() {
        let recording = Raw.decode("+9000 -4000 +620 -1600 +620 -19000").unwrap();
        assert_eq!(
            recording.pulses,
            PulseSequence::from_micros([9000, 4000, 620, 1600, 620, 19000])
        );
        assert_eq!(
            Raw.encode(&recording).unwrap(),
            "+9000 -4000 +620 -1600 +620 -19000"
        );

        let wrapped = Raw
            .decode("Freq=38000Hz[+9000 -4000 +620 -540][]")
            .unwrap();
        assert_eq!(
            wrapped.pulses,
            PulseSequence::from_micros([9000, 4000, 620, 540])
        );
    }

    #[test]
    fn test_empty() {
        for ty in FormatType::iter() {
            assert!(matches!(
                create_format(ty).decode(""),
                Err(FormatError::EmptyInput)
            ));
        }
    }

    #[test]
    fn test_broadlink_formats_agree() {
        let recording = Recording::new_ir(PulseSequence::from_micros([9000, 4000, 620, 540]));
        let hex = BroadlinkHex.encode(&recording).unwrap();
        let b64 = BroadlinkBase64.encode(&recording).unwrap();

        assert_eq!(hex, "26000600000128831412");
        assert_eq!(
            BroadlinkHex.decode(&hex).unwrap(),
            BroadlinkBase64.decode(&b64).unwrap()
        );
        assert_eq!("base64".parse::<FormatType>().unwrap(), FormatType::Base64);
    }
}
