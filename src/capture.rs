//! Frame sources.
//!
//! A [`FrameSource`] hands out captured link-layer frames one at a time, in capture
//! order. [`PcapSource`] reads legacy pcap and pcapng containers, picking the reader
//! from the file's magic number. With the `live-capture` feature, [`LiveSource`]
//! reads from a network interface.

use std::fmt;
use std::io::{BufRead, BufReader, Read};

use log::{debug, warn};
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{Block, LegacyPcapReader, PcapBlockOwned, PcapError, PcapNGReader};

use crate::errors::CaptureError;

const READER_CAPACITY: usize = 65536;

// The read buffer doubles up to this size to hold a single oversized block.
const MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

// pcapng if_tsresol default: microseconds.
const DEFAULT_TSRESOL: u8 = 6;

const MAGIC_PCAP_USEC: [u32; 2] = [0xa1b2_c3d4, 0xd4c3_b2a1];
const MAGIC_PCAP_NSEC: [u32; 2] = [0xa1b2_3c4d, 0x4d3c_b2a1];
const MAGIC_PCAPNG: u32 = 0x0a0d_0d0a;

/// Capture time of a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub secs: i64,
    pub micros: u32,
}

impl Timestamp {
    pub fn new(secs: i64, micros: u32) -> Self {
        Timestamp { secs, micros }
    }

    pub fn as_f64(&self) -> f64 {
        self.secs as f64 + f64::from(self.micros) / 1e6
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}

/// A raw link-layer frame and the time it was captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub timestamp: Timestamp,
}

/// Anything that can produce captured frames in order.
pub trait FrameSource {
    /// Returns the next frame, `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;
}

enum CaptureReader<R: Read> {
    Legacy(LegacyPcapReader<R>),
    Ng(PcapNGReader<R>),
}

impl<R: Read> CaptureReader<R> {
    fn next(&mut self) -> Result<(usize, PcapBlockOwned), PcapError> {
        match self {
            CaptureReader::Legacy(r) => r.next(),
            CaptureReader::Ng(r) => r.next(),
        }
    }

    fn consume(&mut self, offset: usize) {
        match self {
            CaptureReader::Legacy(r) => r.consume(offset),
            CaptureReader::Ng(r) => r.consume(offset),
        }
    }

    fn refill(&mut self) -> Result<(), PcapError> {
        match self {
            CaptureReader::Legacy(r) => r.refill(),
            CaptureReader::Ng(r) => r.refill(),
        }
    }

    fn grow(&mut self, new_size: usize) -> bool {
        match self {
            CaptureReader::Legacy(r) => r.grow(new_size),
            CaptureReader::Ng(r) => r.grow(new_size),
        }
    }

    fn buffered(&self) -> usize {
        match self {
            CaptureReader::Legacy(r) => r.data().len(),
            CaptureReader::Ng(r) => r.data().len(),
        }
    }
}

/// Timestamp parameters of a pcapng interface, from its description block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interface {
    tsresol: u8,
    tsoffset: u64,
}

impl Default for Interface {
    fn default() -> Self {
        Interface {
            tsresol: DEFAULT_TSRESOL,
            tsoffset: 0,
        }
    }
}

impl Interface {
    // Ticks per second. The high bit selects a power of two, otherwise a power of ten.
    fn units_per_second(&self) -> Option<u64> {
        if self.tsresol & 0x80 != 0 {
            2u64.checked_pow(u32::from(self.tsresol & 0x7f))
        } else {
            10u64.checked_pow(u32::from(self.tsresol))
        }
    }

    fn timestamp(&self, ts_high: u32, ts_low: u32) -> Timestamp {
        let ts = (u64::from(ts_high) << 32) | u64::from(ts_low);
        let unit = match self.units_per_second() {
            Some(unit) => unit,
            None => {
                warn!("unsupported if_tsresol {:#x}, assuming microseconds", self.tsresol);
                1_000_000
            }
        };
        let secs = (ts / unit).saturating_add(self.tsoffset);
        let micros = u128::from(ts % unit) * 1_000_000 / u128::from(unit);
        Timestamp::new(secs as i64, micros as u32)
    }
}

/// Reads frames from a pcap or pcapng stream.
pub struct PcapSource<R: Read> {
    reader: CaptureReader<BufReader<R>>,
    capacity: usize,
    nanosecond: bool,
    // pcapng interfaces of the current section, indexed by interface id
    interfaces: Vec<Interface>,
}

impl<R: Read> PcapSource<R> {
    /// Sniffs the container magic and opens the matching reader.
    pub fn new(inner: R) -> Result<Self, CaptureError> {
        let mut input = BufReader::new(inner);
        let magic = {
            let head = input.fill_buf()?;
            if head.len() < 4 {
                return Err(CaptureError::Corrupt(format!(
                    "capture is only {} bytes long",
                    head.len()
                )));
            }
            u32::from_be_bytes([head[0], head[1], head[2], head[3]])
        };

        let (reader, nanosecond) = if MAGIC_PCAP_USEC.contains(&magic) {
            debug!("legacy pcap capture (microsecond timestamps)");
            let r = LegacyPcapReader::new(READER_CAPACITY, input).map_err(corrupt)?;
            (CaptureReader::Legacy(r), false)
        } else if MAGIC_PCAP_NSEC.contains(&magic) {
            debug!("legacy pcap capture (nanosecond timestamps)");
            let r = LegacyPcapReader::new(READER_CAPACITY, input).map_err(corrupt)?;
            (CaptureReader::Legacy(r), true)
        } else if magic == MAGIC_PCAPNG {
            debug!("pcapng capture");
            let r = PcapNGReader::new(READER_CAPACITY, input).map_err(corrupt)?;
            (CaptureReader::Ng(r), false)
        } else {
            return Err(CaptureError::UnknownFormat(magic));
        };

        Ok(PcapSource {
            reader,
            capacity: READER_CAPACITY,
            nanosecond,
            interfaces: Vec::new(),
        })
    }
}

impl<R: Read> PcapSource<R> {
    // Makes room for a block that does not fit in the current buffer.
    fn grow(&mut self) -> Result<(), CaptureError> {
        let new_size = self.capacity * 2;
        if new_size > MAX_BLOCK_SIZE || !self.reader.grow(new_size) {
            return Err(CaptureError::Corrupt(format!(
                "block larger than {} bytes",
                self.capacity
            )));
        }
        debug!("read buffer grown to {} bytes", new_size);
        self.capacity = new_size;
        Ok(())
    }
}

impl<R: Read> FrameSource for PcapSource<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        let mut drained = false;
        loop {
            let next = match self.reader.next() {
                Ok((offset, block)) => Ok((
                    offset,
                    frame_from_block(block, self.nanosecond, &mut self.interfaces),
                )),
                Err(e) => Err(e),
            };
            let (offset, frame) = match next {
                Ok(read) => read,
                // The reader reports Eof once input runs dry, even with a partial block buffered.
                Err(PcapError::Eof) if self.reader.buffered() > 0 => {
                    return Err(CaptureError::Corrupt("truncated capture".to_string()));
                }
                // An empty buffer is reported as Eof even when the input has more to give.
                Err(PcapError::Eof) if !drained => {
                    drained = true;
                    self.reader.refill().map_err(corrupt)?;
                    continue;
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete) => {
                    if self.reader.buffered() >= self.capacity {
                        self.grow()?;
                    }
                    self.reader.refill().map_err(corrupt)?;
                    continue;
                }
                Err(e) => return Err(corrupt(e)),
            };
            self.reader.consume(offset);
            drained = false;

            if frame.is_some() {
                return Ok(frame);
            }
        }
    }
}

fn corrupt(e: PcapError) -> CaptureError {
    CaptureError::Corrupt(format!("{:?}", e))
}

fn truncated(data: &[u8], len: u32) -> Vec<u8> {
    data[..data.len().min(len as usize)].to_vec()
}

fn frame_from_block(
    block: PcapBlockOwned,
    nanosecond: bool,
    interfaces: &mut Vec<Interface>,
) -> Option<Frame> {
    match block {
        PcapBlockOwned::LegacyHeader(_) => None,
        PcapBlockOwned::Legacy(b) => {
            let micros = if nanosecond { b.ts_usec / 1000 } else { b.ts_usec };
            Some(Frame {
                data: truncated(b.data, b.caplen),
                timestamp: Timestamp::new(i64::from(b.ts_sec), micros),
            })
        }
        PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
            let iface = match interfaces.get(epb.if_id as usize) {
                Some(iface) => *iface,
                None => {
                    debug!("packet on undeclared interface {}", epb.if_id);
                    Interface::default()
                }
            };
            Some(Frame {
                data: truncated(epb.data, epb.caplen),
                timestamp: iface.timestamp(epb.ts_high, epb.ts_low),
            })
        }
        PcapBlockOwned::NG(Block::SimplePacket(spb)) => Some(Frame {
            data: truncated(spb.data, spb.origlen),
            timestamp: Timestamp::default(),
        }),
        PcapBlockOwned::NG(Block::SectionHeader(_)) => {
            interfaces.clear();
            None
        }
        PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
            interfaces.push(Interface {
                tsresol: idb.if_tsresol,
                tsoffset: idb.if_tsoffset,
            });
            None
        }
        PcapBlockOwned::NG(_) => {
            warn!("skipping unsupported pcapng block");
            None
        }
    }
}

#[cfg(feature = "live-capture")]
pub use self::live::LiveSource;

#[cfg(feature = "live-capture")]
mod live {
    use pcap::{Active, Capture};

    use super::{Frame, FrameSource, Timestamp};
    use crate::errors::CaptureError;

    const SNAPLEN: i32 = 65535;

    /// Frames read from a network interface in promiscuous mode.
    pub struct LiveSource {
        cap: Capture<Active>,
    }

    impl LiveSource {
        pub fn open(iface: &str) -> Result<Self, CaptureError> {
            let cap = Capture::from_device(iface)
                .and_then(|c| c.promisc(true).snaplen(SNAPLEN).open())
                .map_err(|e| CaptureError::Live(format!("{}: {}", iface, e)))?;
            Ok(LiveSource { cap })
        }
    }

    impl FrameSource for LiveSource {
        fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
            match self.cap.next() {
                Ok(packet) => Ok(Some(Frame {
                    data: packet.data.to_vec(),
                    timestamp: Timestamp::new(
                        packet.header.ts.tv_sec as i64,
                        packet.header.ts.tv_usec as u32,
                    ),
                })),
                Err(pcap::Error::NoMorePackets) => Ok(None),
                Err(e) => Err(CaptureError::Live(e.to_string())),
            }
        }
    }
}
