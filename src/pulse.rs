use std::{fmt, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Carrier on
    Mark,
    /// Carrier off
    Space,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub level: Level,
    pub duration: Duration,
}

/// An ordered train of mark/space durations, always starting with a mark.
///
/// Consecutive pulses of the same level are merged when built, so levels strictly alternate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulseSequence {
    pulses: Vec<Pulse>,
}

impl PulseSequence {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Builds a sequence from alternating on/off durations, the way receivers and recordings store them.
    pub fn from_durations(durations: impl IntoIterator<Item = Duration>) -> Self {
        let mut builder = Builder::default();
        let mut mark = true;
        for d in durations {
            if mark {
                builder.mark(d);
            } else {
                builder.space(d);
            }
            mark = !mark;
        }
        builder.build()
    }

    pub fn from_micros(micros: impl IntoIterator<Item = u32>) -> Self {
        Self::from_durations(micros.into_iter().map(|us| Duration::from_micros(us as _)))
    }

    pub fn pulses(&self) -> &[Pulse] {
        &self.pulses
    }

    pub fn durations(&self) -> impl Iterator<Item = Duration> + '_ {
        self.pulses.iter().map(|p| p.duration)
    }

    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    pub fn total_duration(&self) -> Duration {
        self.durations().sum()
    }
}

/// Raw `+mark -space` notation, as used by IrScrutinizer and friends.
impl fmt::Display for PulseSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.pulses.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let sign = match p.level {
                Level::Mark => '+',
                Level::Space => '-',
            };
            write!(f, "{}{}", sign, p.duration.as_micros())?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Builder {
    pulses: Vec<Pulse>,
}

impl Builder {
    pub fn mark(&mut self, duration: Duration) -> &mut Self {
        self.push(Level::Mark, duration)
    }

    pub fn space(&mut self, duration: Duration) -> &mut Self {
        // A leading space carries no information
        if self.pulses.is_empty() {
            return self;
        }
        self.push(Level::Space, duration)
    }

    fn push(&mut self, level: Level, duration: Duration) -> &mut Self {
        match self.pulses.last_mut() {
            Some(last) if last.level == level => last.duration += duration,
            _ => self.pulses.push(Pulse { level, duration }),
        }
        self
    }

    pub fn build(&mut self) -> PulseSequence {
        PulseSequence {
            pulses: std::mem::take(&mut self.pulses),
        }
    }
}
