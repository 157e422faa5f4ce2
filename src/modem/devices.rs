use std::io::{BufRead, Write};

use thiserror::Error;

use crate::broadlink::Recording;
use crate::pulse::PulseSequence;

use super::formats::{create_format, Format, FormatError, FormatType};

/// Something that can put a pulse train on the air.
pub trait Transmitter {
    /// Sends one pulse train. Returns [`DeviceError::Busy`] instead of waiting when the peripheral is occupied.
    fn send(&mut self, pulses: &PulseSequence) -> Result<(), DeviceError>;
}

/// Something that captures pulse trains.
pub trait Receiver {
    fn recv(&mut self) -> Result<PulseSequence, DeviceError>;
}

impl<T: Transmitter + ?Sized> Transmitter for &mut T {
    fn send(&mut self, pulses: &PulseSequence) -> Result<(), DeviceError> {
        (**self).send(pulses)
    }
}

impl<T: Transmitter + ?Sized> Transmitter for Box<T> {
    fn send(&mut self, pulses: &PulseSequence) -> Result<(), DeviceError> {
        (**self).send(pulses)
    }
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("peripheral busy")]
    Busy,

    #[error("format error: {0}")]
    FormatError(#[from] FormatError),

    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("EOF")]
    EOF,
}

/// Reads and writes one capture per line.
pub struct Lines<R, W> {
    format: Box<dyn Format<Error = FormatError>>,
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Lines<R, W> {
    pub fn new(format_type: FormatType, reader: R, writer: W) -> Self {
        Self {
            format: create_format(format_type),
            reader,
            writer,
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: BufRead, W: Write> Transmitter for Lines<R, W> {
    fn send(&mut self, pulses: &PulseSequence) -> Result<(), DeviceError> {
        let encoded = self.format.encode(&Recording::new_ir(pulses.clone()))?;
        writeln!(self.writer, "{}", encoded)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> Receiver for Lines<R, W> {
    fn recv(&mut self) -> Result<PulseSequence, DeviceError> {
        let mut input = String::new();
        loop {
            input.clear();
            match self.reader.read_line(&mut input)? {
                0 => return Err(DeviceError::EOF),
                // Blank lines are silence
                _ if input.trim().is_empty() => continue,
                _ => return Ok(self.format.decode(input.trim_end())?.pulses),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_lines() {
        let input = "+9000 -4000 +620 -19000\n\n+620 -540\n";
        let mut lines = Lines::new(FormatType::Raw, Cursor::new(input), Vec::new());

        assert_eq!(
            lines.recv().unwrap(),
            PulseSequence::from_micros([9000, 4000, 620, 19000])
        );
        assert_eq!(lines.recv().unwrap(), PulseSequence::from_micros([620, 540]));
        assert!(matches!(lines.recv(), Err(DeviceError::EOF)));

        lines
            .send(&PulseSequence::from_micros([620, 540]))
            .unwrap();
        let (_, written) = lines.into_inner();
        assert_eq!(String::from_utf8(written).unwrap(), "+620 -540\n");
    }

    #[test]
    fn test_lines_bad_input() {
        let mut lines = Lines::new(FormatType::Hex, Cursor::new("zz\n"), Vec::new());
        assert!(matches!(lines.recv(), Err(DeviceError::FormatError(_))));
    }
}
