use log::trace;
use tls_parser::tls::{TlsRecordType, TlsVersion};

use crate::errors::Ja3Error;

/// Size of the TLS record header: type, version, length.
pub const RECORD_HEADER_LEN: usize = 5;

/// Finds a TLS handshake record at the start of a TCP payload.
///
/// Returns the record, header included, cut at its declared length. Anything past the
/// first record is ignored.
pub fn scan_handshake(payload: &[u8]) -> Result<&[u8], Ja3Error> {
    if payload.len() < RECORD_HEADER_LEN {
        return Err(Ja3Error::NotHandshake);
    }

    let record_type = TlsRecordType(payload[0]);
    let version = TlsVersion(u16::from_be_bytes([payload[1], payload[2]]));
    if record_type != TlsRecordType::Handshake || version.0 >> 8 != 0x03 {
        return Err(Ja3Error::NotHandshake);
    }

    let declared = usize::from(u16::from_be_bytes([payload[3], payload[4]]));
    let body = &payload[RECORD_HEADER_LEN..];
    if body.len() < declared {
        trace!("record declares {} bytes, only {} captured", declared, body.len());
        return Err(Ja3Error::Incomplete {
            declared,
            available: body.len(),
        });
    }

    Ok(&payload[..RECORD_HEADER_LEN + declared])
}
