/** An IR pulse-distance encoder/decoder with configurable mark and space lengths */
use std::time::Duration;

use thiserror::Error;

use crate::pulse::{Level, PulseSequence};

/// Percentage a received duration may deviate from its nominal value.
pub const DEFAULT_TOLERANCE_PERCENT: u32 = 25;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Rule {
    pub duration: Duration,
    pub tolerance: Duration,
}

impl Rule {
    pub fn new(duration: Duration) -> Self {
        Self::with_tolerance(duration, DEFAULT_TOLERANCE_PERCENT)
    }

    pub fn with_tolerance(duration: Duration, percent: u32) -> Self {
        Self {
            duration,
            tolerance: duration * percent / 100,
        }
    }

    pub fn matches(&self, duration: Duration) -> bool {
        let diff = if duration > self.duration {
            duration - self.duration
        } else {
            self.duration - duration
        };
        diff <= self.tolerance
    }
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CodecError<T: Copy + std::fmt::Debug> {
    #[error("invalid {0:?} length: {1:?}")]
    InvalidPulseLength(Level, Duration),

    #[error("a pulse was missing from the rule set: {0:?}")]
    InvalidPulse(T),

    #[error("mark without a following space")]
    MissingSpace,
}

/// Maps symbolic pulse types to durations and back.
///
/// Marks and spaces are matched against separate rule sets since protocols commonly reuse
/// a duration for one level that would be ambiguous with the other.
pub struct Codec<T> {
    marks: Vec<(T, Rule)>,
    spaces: Vec<(T, Rule)>,
}

impl<T: Copy + Eq + std::fmt::Debug> Codec<T> {
    pub fn new(
        marks: impl Iterator<Item = (T, Rule)>,
        spaces: impl Iterator<Item = (T, Rule)>,
    ) -> Self {
        let mut marks: Vec<_> = marks.collect();
        marks.sort_by_key(|f| f.1.duration);
        let mut spaces: Vec<_> = spaces.collect();
        spaces.sort_by_key(|f| f.1.duration);

        Self { marks, spaces }
    }

    /// Decodes alternating mark/space durations into (mark, space) symbol pairs.
    pub fn decode(
        &self,
        pulses: impl Iterator<Item = Duration>,
    ) -> Result<Vec<(T, T)>, CodecError<T>> {
        let mut ret = Vec::new();
        let mut pending: Option<Duration> = None;

        for pulse in pulses {
            match pending.take() {
                Some(mark) => ret.push(self.decode_pair(mark, pulse)?),
                None => {
                    pending.replace(pulse);
                }
            };
        }

        if pending.is_some() {
            return Err(CodecError::MissingSpace);
        }

        Ok(ret)
    }

    pub fn decode_pair(&self, mark: Duration, space: Duration) -> Result<(T, T), CodecError<T>> {
        Ok((
            self.decode_pulse(Level::Mark, mark)?,
            self.decode_pulse(Level::Space, space)?,
        ))
    }

    pub fn decode_pulse(&self, level: Level, pulse: Duration) -> Result<T, CodecError<T>> {
        self.rules(level)
            .iter()
            .find(|(_, r)| r.matches(pulse))
            .map(|(p, _)| *p)
            .ok_or(CodecError::InvalidPulseLength(level, pulse))
    }

    pub fn encode(
        &self,
        pulses: impl Iterator<Item = (T, T)>,
    ) -> Result<PulseSequence, CodecError<T>> {
        let mut builder = PulseSequence::builder();

        for (mark, space) in pulses {
            builder.mark(self.encode_pulse(Level::Mark, mark)?);
            builder.space(self.encode_pulse(Level::Space, space)?);
        }

        Ok(builder.build())
    }

    pub fn encode_pulse(&self, level: Level, pulse: T) -> Result<Duration, CodecError<T>> {
        self.rules(level)
            .iter()
            .find(|(p, _)| *p == pulse)
            .map(|(_, r)| r.duration)
            .ok_or(CodecError::InvalidPulse(pulse))
    }

    fn rules(&self, level: Level) -> &[(T, Rule)] {
        match level {
            Level::Mark => &self.marks,
            Level::Space => &self.spaces,
        }
    }
}
