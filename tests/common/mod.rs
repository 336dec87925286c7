#![allow(dead_code)]

//! Builders for synthetic frames and capture files.

pub type Extension = (u16, Vec<u8>);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn server_name(host: &str) -> Extension {
    let mut body = ((host.len() + 3) as u16).to_be_bytes().to_vec();
    body.push(0);
    body.extend_from_slice(&(host.len() as u16).to_be_bytes());
    body.extend_from_slice(host.as_bytes());
    (0, body)
}

pub fn supported_groups(groups: &[u16]) -> Extension {
    let mut body = ((groups.len() * 2) as u16).to_be_bytes().to_vec();
    for g in groups {
        body.extend_from_slice(&g.to_be_bytes());
    }
    (10, body)
}

pub fn point_formats(formats: &[u8]) -> Extension {
    let mut body = vec![formats.len() as u8];
    body.extend_from_slice(formats);
    (11, body)
}

pub fn empty(ext_type: u16) -> Extension {
    (ext_type, Vec::new())
}

/// A TLS record holding a single ClientHello. `None` omits the extensions block.
pub fn client_hello_record(
    version: u16,
    ciphers: &[u16],
    extensions: Option<&[Extension]>,
) -> Vec<u8> {
    let mut body = version.to_be_bytes().to_vec();
    body.extend_from_slice(&[0x5c; 32]);
    body.extend_from_slice(&[0x20]);
    body.extend_from_slice(&[0x7e; 0x20]);
    body.extend_from_slice(&((ciphers.len() * 2) as u16).to_be_bytes());
    for cipher in ciphers {
        body.extend_from_slice(&cipher.to_be_bytes());
    }
    body.extend_from_slice(&[0x01, 0x00]);
    if let Some(extensions) = extensions {
        let mut block = Vec::new();
        for (ext_type, data) in extensions {
            block.extend_from_slice(&ext_type.to_be_bytes());
            block.extend_from_slice(&(data.len() as u16).to_be_bytes());
            block.extend_from_slice(data);
        }
        body.extend_from_slice(&(block.len() as u16).to_be_bytes());
        body.extend_from_slice(&block);
    }

    let mut record = vec![0x16, 0x03, 0x01];
    record.extend_from_slice(&((body.len() + 4) as u16).to_be_bytes());
    record.push(0x01);
    record.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
    record.extend_from_slice(&body);
    record
}

fn ethernet(ethertype: u16) -> Vec<u8> {
    let mut frame = vec![0x00, 0x1b, 0x21, 0x3a, 0x4f, 0x10, 0x00, 0x1b, 0x21, 0x3a, 0x4f, 0x11];
    frame.extend_from_slice(&ethertype.to_be_bytes());
    frame
}

fn ipv4(frame: &mut Vec<u8>, protocol: u8, src: [u8; 4], dst: [u8; 4], l4_len: usize) {
    frame.extend_from_slice(&[0x45, 0x00]);
    frame.extend_from_slice(&((20 + l4_len) as u16).to_be_bytes());
    frame.extend_from_slice(&[0x12, 0x34, 0x40, 0x00, 0x40, protocol, 0x00, 0x00]);
    frame.extend_from_slice(&src);
    frame.extend_from_slice(&dst);
}

fn tcp(frame: &mut Vec<u8>, sport: u16, dport: u16) {
    frame.extend_from_slice(&sport.to_be_bytes());
    frame.extend_from_slice(&dport.to_be_bytes());
    frame.extend_from_slice(&[0, 0, 0x10, 0, 0, 0, 0, 0, 0x50, 0x18, 0xfa, 0xf0, 0, 0, 0, 0]);
}

pub fn tcp_ipv4_frame(src: [u8; 4], sport: u16, dst: [u8; 4], dport: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = ethernet(0x0800);
    ipv4(&mut frame, 6, src, dst, 20 + payload.len());
    tcp(&mut frame, sport, dport);
    frame.extend_from_slice(payload);
    frame
}

pub fn tcp_ipv6_frame(src: &str, sport: u16, dst: &str, dport: u16, payload: &[u8]) -> Vec<u8> {
    let src: std::net::Ipv6Addr = src.parse().unwrap();
    let dst: std::net::Ipv6Addr = dst.parse().unwrap();
    let mut frame = ethernet(0x86dd);
    frame.extend_from_slice(&[0x60, 0, 0, 0]);
    frame.extend_from_slice(&((20 + payload.len()) as u16).to_be_bytes());
    frame.extend_from_slice(&[6, 64]);
    frame.extend_from_slice(&src.octets());
    frame.extend_from_slice(&dst.octets());
    tcp(&mut frame, sport, dport);
    frame.extend_from_slice(payload);
    frame
}

pub fn udp_ipv4_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = ethernet(0x0800);
    ipv4(&mut frame, 17, [10, 0, 0, 9], [10, 0, 0, 53], 8 + payload.len());
    frame.extend_from_slice(&[0xd4, 0x31, 0x00, 0x35]);
    frame.extend_from_slice(&((8 + payload.len()) as u16).to_be_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(payload);
    frame
}

/// (seconds, microseconds, frame)
pub type Captured = (u32, u32, Vec<u8>);

pub fn pcap(frames: &[Captured]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    for (sec, usec, data) in frames {
        out.extend_from_slice(&sec.to_le_bytes());
        out.extend_from_slice(&usec.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }
    out
}

fn ng_block(out: &mut Vec<u8>, block_type: u32, body: &[u8]) {
    let total = (12 + body.len()) as u32;
    out.extend_from_slice(&block_type.to_le_bytes());
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(&total.to_le_bytes());
}

pub fn pcapng(frames: &[Captured]) -> Vec<u8> {
    let mut out = Vec::new();

    let mut shb = 0x1a2b_3c4du32.to_le_bytes().to_vec();
    shb.extend_from_slice(&1u16.to_le_bytes());
    shb.extend_from_slice(&0u16.to_le_bytes());
    shb.extend_from_slice(&(-1i64).to_le_bytes());
    ng_block(&mut out, 0x0a0d_0d0a, &shb);

    let mut idb = 1u16.to_le_bytes().to_vec();
    idb.extend_from_slice(&0u16.to_le_bytes());
    idb.extend_from_slice(&65535u32.to_le_bytes());
    ng_block(&mut out, 1, &idb);

    for (sec, usec, data) in frames {
        let ts = u64::from(*sec) * 1_000_000 + u64::from(*usec);
        let mut epb = 0u32.to_le_bytes().to_vec();
        epb.extend_from_slice(&((ts >> 32) as u32).to_le_bytes());
        epb.extend_from_slice(&(ts as u32).to_le_bytes());
        epb.extend_from_slice(&(data.len() as u32).to_le_bytes());
        epb.extend_from_slice(&(data.len() as u32).to_le_bytes());
        epb.extend_from_slice(data);
        while epb.len() % 4 != 0 {
            epb.push(0);
        }
        ng_block(&mut out, 6, &epb);
    }
    out
}
