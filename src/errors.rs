use std::io;

use failure::Fail;

/// Reasons a single frame produced no fingerprint.
///
/// None of these stop a capture run: the frame is skipped and the next one is read.
#[derive(Debug, Fail, PartialEq, Eq)]
pub enum Ja3Error {
    #[fail(display = "Not an Ethernet/IP/TCP frame")]
    NotApplicable,
    #[fail(display = "Destination port {} is not inspected", _0)]
    OtherPort(u16),
    #[fail(display = "Not a TLS handshake packet")]
    NotHandshake,
    #[fail(
        display = "Incomplete TLS record: {} bytes declared, {} available",
        declared, available
    )]
    Incomplete { declared: usize, available: usize },
    #[fail(display = "Handshake message type {} is not a ClientHello", _0)]
    NotClientHello(u8),
    #[fail(display = "Parsing error")]
    ParseError,
}

impl Ja3Error {
    /// True for frames that are simply not TLS, as opposed to damaged handshakes.
    pub fn is_silent(&self) -> bool {
        match self {
            Ja3Error::NotApplicable | Ja3Error::OtherPort(_) | Ja3Error::NotHandshake => true,
            _ => false,
        }
    }
}

/// Failures of the frame source itself. These end the run.
#[derive(Debug, Fail)]
pub enum CaptureError {
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] io::Error),
    #[fail(display = "Unrecognized capture format (magic {:#010x})", _0)]
    UnknownFormat(u32),
    #[fail(display = "Corrupt capture: {}", _0)]
    Corrupt(String),
    #[fail(display = "Live capture error: {}", _0)]
    Live(String),
}

impl From<io::Error> for CaptureError {
    fn from(e: io::Error) -> Self {
        CaptureError::Io(e)
    }
}
