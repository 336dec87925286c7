//! Tabular and JSON renderings of [`Ja3Hash`] records.

use std::io::{self, Write};

use serde::Serialize;

use crate::Ja3Hash;

/// Header row of the delimited output.
pub const COLUMNS: [&str; 6] = [
    "timestamp",
    "source_ip",
    "source_port",
    "destination_ip",
    "destination_port",
    "ja3_digest",
];

#[derive(Debug, Serialize)]
struct Record {
    timestamp: String,
    source_ip: String,
    source_port: u16,
    destination_ip: String,
    destination_port: u16,
    ja3_digest: String,
}

impl<'a> From<&'a Ja3Hash> for Record {
    fn from(hash: &'a Ja3Hash) -> Self {
        Record {
            timestamp: hash.timestamp.to_string(),
            source_ip: hash.source.to_string(),
            source_port: hash.source_port,
            destination_ip: hash.destination.to_string(),
            destination_port: hash.destination_port,
            ja3_digest: hash.digest_hex(),
        }
    }
}

/// Streams records as separator-delimited lines, header first.
pub struct DelimitedWriter<W: Write> {
    out: W,
    separator: String,
    header_written: bool,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new<S: Into<String>>(out: W, separator: S) -> Self {
        DelimitedWriter {
            out,
            separator: separator.into(),
            header_written: false,
        }
    }

    /// Writes the header row if it has not been written yet.
    pub fn write_header(&mut self) -> io::Result<()> {
        if !self.header_written {
            writeln!(self.out, "{}", COLUMNS.join(self.separator.as_str()))?;
            self.header_written = true;
        }
        Ok(())
    }

    pub fn write(&mut self, hash: &Ja3Hash) -> io::Result<()> {
        self.write_header()?;
        let r = Record::from(hash);
        let fields = [
            r.timestamp,
            r.source_ip,
            r.source_port.to_string(),
            r.destination_ip,
            r.destination_port.to_string(),
            r.ja3_digest,
        ];
        writeln!(self.out, "{}", fields.join(self.separator.as_str()))
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Writes all `hashes` as delimited text. The header is written even when there are none.
pub fn write_delimited<W: Write>(hashes: &[Ja3Hash], out: W, separator: &str) -> io::Result<()> {
    let mut writer = DelimitedWriter::new(out, separator);
    writer.write_header()?;
    for hash in hashes {
        writer.write(hash)?;
    }
    writer.out.flush()
}

/// Writes all `hashes` as a single JSON array followed by a newline.
pub fn write_json<W: Write>(hashes: &[Ja3Hash], mut out: W) -> io::Result<()> {
    let records: Vec<Record> = hashes.iter().map(Record::from).collect();
    serde_json::to_writer(&mut out, &records)?;
    writeln!(out)?;
    out.flush()
}
