use crate::pulse::PulseSequence;
use crate::pwm::{Codec, CodecError, Rule};

use log::trace;
use thiserror::Error;

use super::frame::Frame;
use super::model::{Model, Timing};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PulseType {
    Header,
    Bit,
    Zero,
    One,
    Gap,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum PhyError {
    #[error("PWM error: {0}")]
    PWMError(#[from] CodecError<PulseType>),
    #[error("invalid header: {0}")]
    InvalidHeader(CodecError<PulseType>),
    #[error("invalid combination of pulses: {0:?}")]
    InvalidCombination((PulseType, PulseType)),
    #[error("invalid block footer: {0:03b}")]
    InvalidBlockFooter(u8),
    #[error("truncated message: {0} pulses")]
    Truncated(usize),
    #[error("message too long: {0} pulses")]
    Oversized(usize),
}

// Sits between the two 4-byte blocks
const BLOCK_FOOTER: u8 = 0b010;
const BLOCK_FOOTER_BITS: usize = 3;
const BLOCK_BYTES: usize = 4;

/// Durations in a complete transmission, including the trailing gap.
pub const MESSAGE_PULSES: usize = 2 * (1 + 2 * BLOCK_BYTES * 8 + BLOCK_FOOTER_BITS + 2);
/// Receivers usually time out on the final gap, so one pulse less is still complete.
const MIN_PULSES: usize = MESSAGE_PULSES - 1;
/// Receivers may append a few noise pulses; anything longer isn't a single Gree frame.
const MAX_PULSES: usize = 150;

/// Converts frames to and from pulse trains using a model's timings.
pub struct Phy {
    codec: Codec<PulseType>,
    timing: Timing,
}

impl Phy {
    pub fn new(timing: Timing) -> Self {
        let rule = |duration| Rule::with_tolerance(duration, timing.tolerance_percent);
        let codec = Codec::new(
            [
                (PulseType::Header, rule(timing.header_mark)),
                (PulseType::Bit, rule(timing.bit_mark)),
            ]
            .into_iter(),
            [
                (PulseType::Header, rule(timing.header_space)),
                (PulseType::Zero, rule(timing.zero_space)),
                (PulseType::One, rule(timing.one_space)),
                (PulseType::Gap, rule(timing.message_space)),
            ]
            .into_iter(),
        );

        Self { codec, timing }
    }

    pub fn for_model(model: Model) -> Self {
        Self::new(model.timing())
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn encode(&self, frame: &Frame) -> Result<PulseSequence, CodecError<PulseType>> {
        let pulses = Phy::encode_pulses(&frame.to_bytes());
        self.codec.encode(pulses.into_iter())
    }

    pub fn decode(&self, pulses: &PulseSequence) -> Result<Frame, PhyError> {
        let count = pulses.len();
        trace!("decoding {} pulses: {}", count, pulses);

        if count < MIN_PULSES {
            return Err(PhyError::Truncated(count));
        }
        if count > MAX_PULSES {
            return Err(PhyError::Oversized(count));
        }

        // The final space is however long the line stayed idle, and receivers may tack noise on
        // after it. Neither is part of the frame.
        let mut durations: Vec<_> = pulses.durations().take(MIN_PULSES).collect();
        durations.push(self.timing.message_space);

        // The header tells us whether this came from the remote we're configured for
        self.codec
            .decode_pair(durations[0], durations[1])
            .and_then(|pair| match pair {
                (PulseType::Header, PulseType::Header) => Ok(()),
                (mark, _) => Err(CodecError::InvalidPulse(mark)),
            })
            .map_err(PhyError::InvalidHeader)?;

        let pulses = self.codec.decode(durations.into_iter())?;
        Phy::decode_pulses(pulses.into_iter())
    }

    /// Lays out the symbols of one transmission. Bytes are sent LSB first.
    pub fn encode_pulses(bytes: &[u8; 8]) -> Vec<(PulseType, PulseType)> {
        let mut pulses = Vec::with_capacity(MESSAGE_PULSES / 2);

        pulses.push((PulseType::Header, PulseType::Header));
        for &byte in &bytes[..BLOCK_BYTES] {
            Phy::append_bits(byte, 8, &mut pulses);
        }
        Phy::append_bits(BLOCK_FOOTER, BLOCK_FOOTER_BITS, &mut pulses);
        pulses.push((PulseType::Bit, PulseType::Gap));

        for &byte in &bytes[BLOCK_BYTES..] {
            Phy::append_bits(byte, 8, &mut pulses);
        }
        pulses.push((PulseType::Bit, PulseType::Gap));

        pulses
    }

    fn append_bits(value: u8, len: usize, pulses: &mut Vec<(PulseType, PulseType)>) {
        for bit in 0..len {
            pulses.push(match value & (1 << bit) != 0 {
                true => (PulseType::Bit, PulseType::One),
                false => (PulseType::Bit, PulseType::Zero),
            });
        }
    }

    fn decode_bits(
        pulses: &mut impl Iterator<Item = (PulseType, PulseType)>,
        len: usize,
    ) -> Result<u8, PhyError> {
        use PulseType::*;

        let mut ret = 0;
        for bit in 0..len {
            match pulses.next().ok_or(PhyError::Truncated(bit))? {
                (Bit, Zero) => {}
                (Bit, One) => ret |= 1 << bit,
                any => return Err(PhyError::InvalidCombination(any)),
            }
        }
        Ok(ret)
    }

    fn expect_gap(pulses: &mut impl Iterator<Item = (PulseType, PulseType)>) -> Result<(), PhyError> {
        match pulses.next() {
            Some((PulseType::Bit, PulseType::Gap)) => Ok(()),
            Some(any) => Err(PhyError::InvalidCombination(any)),
            None => Err(PhyError::Truncated(0)),
        }
    }

    pub fn decode_pulses(
        mut pulses: impl Iterator<Item = (PulseType, PulseType)>,
    ) -> Result<Frame, PhyError> {
        match pulses.next() {
            Some((PulseType::Header, PulseType::Header)) => {}
            Some(any) => return Err(PhyError::InvalidCombination(any)),
            None => return Err(PhyError::Truncated(0)),
        }

        let mut bytes = [0u8; 8];
        for byte in bytes.iter_mut().take(BLOCK_BYTES) {
            *byte = Phy::decode_bits(&mut pulses, 8)?;
        }

        let footer = Phy::decode_bits(&mut pulses, BLOCK_FOOTER_BITS)?;
        if footer != BLOCK_FOOTER {
            return Err(PhyError::InvalidBlockFooter(footer));
        }
        Phy::expect_gap(&mut pulses)?;

        for byte in bytes.iter_mut().skip(BLOCK_BYTES) {
            *byte = Phy::decode_bits(&mut pulses, 8)?;
        }
        Phy::expect_gap(&mut pulses)?;

        Ok(Frame::from_bytes(bytes))
    }
}
