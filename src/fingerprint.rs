//! JA3 string assembly and hashing.
//!
//! `SSLVersion,Ciphers,Extensions,EllipticCurves,EllipticCurvePointFormats`, decimal
//! values joined with `-`. See the original [JA3 description](https://github.com/salesforce/ja3#how-it-works).

use lazy_static::lazy_static;
use md5::Digest;

use crate::client_hello::ClientHello;

lazy_static! {
    static ref GREASE: Vec<u16> = vec![
        0x0a0a, 0x1a1a, 0x2a2a, 0x3a3a, 0x4a4a, 0x5a5a, 0x6a6a, 0x7a7a, 0x8a8a, 0x9a9a, 0xaaaa,
        0xbaba, 0xcaca, 0xdada, 0xeaea, 0xfafa
    ];
}

/// Whether `value` is one of the reserved GREASE code points.
pub fn is_grease(value: u16) -> bool {
    GREASE.contains(&value)
}

/// Drops GREASE values, keeping the order of everything else.
pub fn filter_grease(values: &[u16]) -> Vec<u16> {
    values.iter().copied().filter(|v| !is_grease(*v)).collect()
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

impl ClientHello {
    /// Builds the JA3 string. GREASE is removed from ciphers and extensions only.
    pub fn ja3_string(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.version,
            join(&filter_grease(&self.cipher_suites)),
            join(&filter_grease(&self.extensions)),
            join(&self.elliptic_curves),
            join(&self.ec_point_formats)
        )
    }

    /// MD5 of the JA3 string.
    pub fn ja3_digest(&self) -> Digest {
        md5::compute(self.ja3_string().as_bytes())
    }
}
