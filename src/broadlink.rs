use std::time::Duration;

/**
 * Encodes/decodes IR recordings in the format used by broadlink remotes (and SmartIR code files)
 * Payload format from: https://github.com/mjg59/python-broadlink/blob/master/protocol.md
 */
use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::pulse::PulseSequence;

// Broadlink counts time in units of 2^-15 s, which is almost exactly 269/8192 µs
const UNITS_PER_MICRO: f64 = 269.0 / 8192.0;

fn to_units(duration: Duration) -> u16 {
    (duration.as_micros() as f64 * UNITS_PER_MICRO)
        .round()
        .min(u16::MAX as f64) as u16
}

fn from_units(units: u16) -> Duration {
    Duration::from_nanos((units as f64 * 1000.0 / UNITS_PER_MICRO).round() as u64)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transport {
    Ir = 0x26,
    Rf433 = 0xb2,
    Rf315 = 0xd7,
}

impl TryFrom<u8> for Transport {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, ParseError> {
        Ok(match value {
            0x26 => Transport::Ir,
            0xb2 => Transport::Rf433,
            0xd7 => Transport::Rf315,
            x => return Err(ParseError::InvalidTransport(x)),
        })
    }
}

/*
Offset	Contents
0x00	0x26 = IR, 0xb2 for RF 433Mhz, 0xd7 for RF 315Mhz
0x01	repeat count, (0 = no repeat, 1 send twice, .....)
0x02-0x03	Length of the following data in little endian
0x04 ....	Pulse lengths in 2^-15 s units, a 0x00 byte escapes a big endian u16
....	For IR codes, the pulse lengths are paired as ON, OFF
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recording {
    pub repeat_count: u8,
    pub transport: Transport,
    pub pulses: PulseSequence,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid transport type: {0}")]
    InvalidTransport(u8),
    #[error("recording is truncated")]
    Truncated,
}

impl Recording {
    pub fn new_ir(pulses: PulseSequence) -> Self {
        Self {
            repeat_count: 0,
            transport: Transport::Ir,
            pulses,
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut data = BytesMut::new();
        for pulse in self.pulses.durations() {
            match to_units(pulse) {
                units @ 1..=255 => data.put_u8(units as u8),
                units => {
                    data.put_u8(0);
                    data.put_u16(units);
                }
            }
        }

        let mut b = BytesMut::with_capacity(4 + data.len());
        b.put_u8(self.transport as u8);
        b.put_u8(self.repeat_count);
        b.put_u16_le(data.len() as _);
        b.put(data);
        b.freeze()
    }

    pub fn from_bytes(mut buf: Bytes) -> Result<Self, ParseError> {
        if buf.remaining() < 4 {
            return Err(ParseError::Truncated);
        }

        let transport = Transport::try_from(buf.get_u8())?;
        let repeat_count = buf.get_u8();
        let len = buf.get_u16_le() as usize;

        // Some exports pad or cut the payload, trust whichever is shorter
        let mut data = buf.split_to(len.min(buf.remaining()));

        let mut pulses = Vec::with_capacity(len);
        while data.has_remaining() {
            let units = match data.get_u8() {
                0 if data.remaining() >= 2 => data.get_u16(),
                0 => break,
                units => units as u16,
            };
            pulses.push(from_units(units));
        }

        Ok(Recording {
            repeat_count,
            transport,
            pulses: PulseSequence::from_durations(pulses),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gree::{Frame, Model, Phy, ThermostatState};
    use hex_literal::hex;

    #[test]
    fn test_bytes() {
        let recording = Recording::new_ir(PulseSequence::from_micros([9000, 4000, 620, 540, 620, 19000]));
        let bytes = recording.to_bytes();
        // 9000us = 296 units, 4000us = 131 units, 620us = 20 units, 540us = 18 units, 19000us = 624 units
        assert_eq!(
            bytes.as_ref(),
            hex!("26 00 0a 00 00 01 28 83 14 12 14 00 02 70")
        );

        let decoded = Recording::from_bytes(bytes).unwrap();
        assert_eq!(decoded.transport, Transport::Ir);
        assert_eq!(decoded.repeat_count, 0);
        assert_eq!(decoded.to_bytes(), recording.to_bytes());
    }

    #[test]
    fn test_gree_survives_quantization() {
        let model = Model::Yac1fb9;
        let frame = Frame::encode(&ThermostatState::default(), model.variant()).unwrap();
        let phy = Phy::for_model(model);
        let recording = Recording::new_ir(phy.encode(&frame).unwrap());

        let decoded = Recording::from_bytes(recording.to_bytes()).unwrap();
        assert_eq!(phy.decode(&decoded.pulses).unwrap(), frame);
    }

    #[test]
    fn test_invalid() {
        assert_eq!(
            Recording::from_bytes(Bytes::from_static(&[0x26, 0x00])),
            Err(ParseError::Truncated)
        );
        assert_eq!(
            Recording::from_bytes(Bytes::from_static(&[0x11, 0x00, 0x00, 0x00])),
            Err(ParseError::InvalidTransport(0x11))
        );
    }
}
