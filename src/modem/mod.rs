/*

IR modem plumbing
-----------------

Captures travel as one line of text each (broadlink hex/base64 or raw `+mark -space` durations),
which keeps the codec testable against IrScrutinizer, SmartIR files, or a serial bridge to the
actual transceiver.

# Decode captures read from stdin
decode -f [hex|base64|raw]

# Encode a state and write one line per repeat
encode -f [format] --mode cool --temperature 24

*/

pub mod formats;
pub use formats::{create_format, Format, FormatError, FormatType};

pub mod devices;
pub use devices::{DeviceError, Lines, Receiver, Transmitter};
