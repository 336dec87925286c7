//! JA3 Hash
//!
//! A small TLS fingerprinting library written in Rust.
//!
//! This crate enables a consumer to fingerprint the ClientHello portion of a TLS handshake.
//! It can hash TLS traffic from pcap and pcapng files or, with the `live-capture` feature,
//! from a network interface.
//!
//! Each frame is handled on its own: the Ethernet/IP/TCP headers are decoded, the TCP
//! payload is checked for a TLS handshake record, the ClientHello inside it is parsed and
//! the JA3 string and its MD5 digest are built. Frames that carry no complete ClientHello
//! produce nothing; only failures of the capture itself abort processing.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ja3::Ja3;
//!
//! let hashes = Ja3::new("test.pcap").process_pcap().unwrap();
//! for hash in hashes {
//!     println!("{}", hash);
//! }
//! ```

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs::File;
use std::net::IpAddr;

use failure::Error;
use log::{debug, info, trace};
use md5::Digest;

pub mod capture;
pub mod client_hello;
pub mod errors;
pub mod fingerprint;
pub mod output;
pub mod packet;
pub mod tls;

pub use crate::capture::{Frame, FrameSource, PcapSource, Timestamp};
#[cfg(feature = "live-capture")]
pub use crate::capture::LiveSource;
pub use crate::client_hello::ClientHello;
pub use crate::errors::{CaptureError, Ja3Error};
pub use crate::packet::{decode_frame, Endpoints, Segment};
pub use crate::tls::scan_handshake;

/// A JA3 hash builder. This provides options about how to extract a JA3 hash from a TLS handshake.
#[derive(Debug)]
pub struct Ja3 {
    src: OsString,
    tls_port: Option<u16>,
}

/// The output of a JA3 hash object. This consists of the JA3 string and MD5 hash.
#[derive(Debug, Eq)]
pub struct Ja3Hash {
    /// The string consisting of the SSLVersion,Cipher,SSLExtension,EllipticCurve,EllipticCurvePointFormat
    /// See the original [JA3 specification](https://github.com/salesforce/ja3#how-it-works) for more info.
    pub ja3_str: String,
    /// The MD5 hash of `ja3_str`.
    pub hash: Digest,
    /// The source IP address of the TLS handshake.
    pub source: IpAddr,
    pub source_port: u16,
    /// The destination IP address of the TLS handshake.
    pub destination: IpAddr,
    pub destination_port: u16,
    pub packet_size: usize,
    pub timestamp: Timestamp,
}

impl Ja3Hash {
    /// Lowercase hex digest, the form JA3 hashes are usually exchanged in.
    pub fn digest_hex(&self) -> String {
        format!("{:x}", self.hash)
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            source: self.source,
            source_port: self.source_port,
            destination: self.destination,
            destination_port: self.destination_port,
        }
    }
}

impl Ja3 {
    /// Creates a new Ja3 object.
    ///
    /// `src` is a capture file for [`process_pcap`](Ja3::process_pcap) or an interface
    /// name for `process_live`.
    pub fn new<S: AsRef<OsStr>>(src: S) -> Self {
        Ja3 {
            src: src.as_ref().to_os_string(),
            tls_port: None,
        }
    }

    /// Only fingerprint segments sent to this TCP port. By default every port is inspected.
    pub fn with_tls_port(&mut self, port: u16) -> &mut Self {
        self.tls_port = Some(port);
        self
    }

    /// Reads the capture file and returns a hash for every ClientHello, in capture order.
    pub fn process_pcap(&self) -> Result<Vec<Ja3Hash>, Error> {
        let file = File::open(&self.src)?;
        let mut source = PcapSource::new(file)?;
        let mut results = Vec::new();
        self.process_source(&mut source, |hash| results.push(hash))?;
        Ok(results)
    }

    /// Captures on the interface named at construction and hands every hash to `callback`.
    /// Runs until the capture ends or fails.
    #[cfg(feature = "live-capture")]
    pub fn process_live<F: FnMut(Ja3Hash)>(&self, callback: F) -> Result<(), Error> {
        let iface = self
            .src
            .to_str()
            .ok_or_else(|| failure::format_err!("interface name is not valid UTF-8"))?;
        let mut source = LiveSource::open(iface)?;
        self.process_source(&mut source, callback)?;
        Ok(())
    }

    /// Pulls frames from `source` until it is exhausted, passing each hash to `callback`.
    ///
    /// Frames without a usable ClientHello are skipped; a source error stops the run.
    pub fn process_source<S, F>(&self, source: &mut S, mut callback: F) -> Result<(), CaptureError>
    where
        S: FrameSource + ?Sized,
        F: FnMut(Ja3Hash),
    {
        while let Some(frame) = source.next_frame()? {
            match self.process_frame(&frame) {
                Ok(hash) => {
                    info!("{}", hash);
                    callback(hash);
                }
                Err(e) if e.is_silent() => trace!("skipping frame: {}", e),
                Err(e) => debug!("skipping frame at {}: {}", frame.timestamp, e),
            }
        }
        Ok(())
    }

    /// Fingerprints a single frame.
    pub fn process_frame(&self, frame: &Frame) -> Result<Ja3Hash, Ja3Error> {
        let segment = decode_frame(&frame.data)?;
        if let Some(port) = self.tls_port {
            if segment.endpoints.destination_port != port {
                return Err(Ja3Error::OtherPort(segment.endpoints.destination_port));
            }
        }

        let record = scan_handshake(segment.payload)?;
        let hello = ClientHello::parse(record)?;

        Ok(Ja3Hash {
            ja3_str: hello.ja3_string(),
            hash: hello.ja3_digest(),
            source: segment.endpoints.source,
            source_port: segment.endpoints.source_port,
            destination: segment.endpoints.destination,
            destination_port: segment.endpoints.destination_port,
            packet_size: frame.data.len(),
            timestamp: frame.timestamp,
        })
    }
}

/// Builds the JA3 string from a raw TCP payload, if it starts with a ClientHello record.
pub fn ja3_string_client_hello(payload: &[u8]) -> Option<String> {
    let record = scan_handshake(payload).ok()?;
    let hello = ClientHello::parse(record).ok()?;
    Some(hello.ja3_string())
}

impl fmt::Display for Ja3Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {} {:x}", self.endpoints(), self.ja3_str, self.hash)
    }
}

impl PartialEq for Ja3Hash {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}
