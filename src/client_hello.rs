use log::{debug, trace};
use tls_parser::tls::{
    parse_tls_plaintext, TlsClientHelloContents, TlsMessage, TlsMessageHandshake,
};
use tls_parser::tls_extensions::{
    parse_tls_extension_ec_point_formats_content, parse_tls_extension_elliptic_curves_content,
    TlsExtension, TlsExtensionType,
};

use crate::errors::Ja3Error;
use crate::tls::RECORD_HEADER_LEN;

const HANDSHAKE_CLIENT_HELLO: u8 = 0x01;

/// The ClientHello fields JA3 is computed from, in wire order.
///
/// Nothing is filtered or sorted here; GREASE values are dropped only when the JA3
/// string is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ClientHello {
    /// Version from the handshake body, not the record header.
    pub version: u16,
    pub cipher_suites: Vec<u16>,
    pub extensions: Vec<u16>,
    /// Contents of the supported groups extension (10).
    pub elliptic_curves: Vec<u16>,
    /// Contents of the ec point formats extension (11).
    pub ec_point_formats: Vec<u8>,
}

impl ClientHello {
    /// Parses a handshake record as returned by [`scan_handshake`](crate::tls::scan_handshake).
    pub fn parse(record: &[u8]) -> Result<ClientHello, Ja3Error> {
        match record.get(RECORD_HEADER_LEN) {
            Some(&HANDSHAKE_CLIENT_HELLO) => {}
            Some(&other) => return Err(Ja3Error::NotClientHello(other)),
            None => return Err(Ja3Error::ParseError),
        }

        let (_, plaintext) = parse_tls_plaintext(record).map_err(|e| {
            debug!("malformed handshake record: {:?}", e);
            Ja3Error::ParseError
        })?;

        for msg in &plaintext.msg {
            if let TlsMessage::Handshake(TlsMessageHandshake::ClientHello(contents)) = msg {
                trace!("handshake contents: {:?}", contents);
                return ClientHello::from_contents(contents);
            }
        }

        Err(Ja3Error::ParseError)
    }

    fn from_contents(contents: &TlsClientHelloContents) -> Result<ClientHello, Ja3Error> {
        let mut hello = ClientHello {
            version: contents.version.0,
            cipher_suites: contents.ciphers.iter().map(|c| c.0).collect(),
            ..ClientHello::default()
        };

        let raw = match contents.ext {
            Some(raw) => raw,
            None => return Ok(hello),
        };

        for extension in ExtensionWalker(raw) {
            let (ext_type, body) = extension?;
            hello.extensions.push(ext_type);
            hello.decode_extension(TlsExtensionType(ext_type), body)?;
        }

        Ok(hello)
    }

    // Only the bodies JA3 reads are decoded; every other body is opaque.
    fn decode_extension(&mut self, ext_type: TlsExtensionType, body: &[u8]) -> Result<(), Ja3Error> {
        let decoded = match ext_type {
            TlsExtensionType::SupportedGroups => parse_tls_extension_elliptic_curves_content(body),
            TlsExtensionType::EcPointFormats => parse_tls_extension_ec_point_formats_content(body),
            _ => return Ok(()),
        };
        match decoded {
            Ok((_, TlsExtension::EllipticCurves(groups))) => {
                self.elliptic_curves.extend(groups.iter().map(|g| g.0));
            }
            Ok((_, TlsExtension::EcPointFormats(formats))) => {
                self.ec_point_formats.extend_from_slice(formats);
            }
            Ok(_) => {}
            Err(e) => {
                debug!("malformed {} extension: {:?}", ext_type, e);
                return Err(Ja3Error::ParseError);
            }
        }
        Ok(())
    }
}

/// Iterates `(type, body)` pairs of a raw extensions block, in wire order.
///
/// Yields a `ParseError` and stops if a header or body runs past the block.
struct ExtensionWalker<'a>(&'a [u8]);

impl<'a> Iterator for ExtensionWalker<'a> {
    type Item = Result<(u16, &'a [u8]), Ja3Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.0;
        if rest.is_empty() {
            return None;
        }
        if rest.len() < 4 {
            debug!("{} bytes of trailing extension data", rest.len());
            self.0 = &[];
            return Some(Err(Ja3Error::ParseError));
        }

        let ext_type = u16::from_be_bytes([rest[0], rest[1]]);
        let len = usize::from(u16::from_be_bytes([rest[2], rest[3]]));
        if rest.len() - 4 < len {
            debug!("extension {} declares {} bytes, {} left", ext_type, len, rest.len() - 4);
            self.0 = &[];
            return Some(Err(Ja3Error::ParseError));
        }

        self.0 = &rest[4 + len..];
        Some(Ok((ext_type, &rest[4..4 + len])))
    }
}
