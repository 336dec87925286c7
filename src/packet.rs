//! Link, network and transport layer decoding.
//!
//! Only as much of each header is read as is needed to find the TCP payload; any
//! frame that is not Ethernet (optionally 802.1Q tagged) / IPv4 or IPv6 / TCP is
//! reported as [`Ja3Error::NotApplicable`].

use std::fmt;
use std::net::IpAddr;

use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::tcp::TcpPacket;
use pnet::packet::vlan::VlanPacket;

use crate::errors::Ja3Error;

/// Addresses and ports of a TCP segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoints {
    pub source: IpAddr,
    pub source_port: u16,
    pub destination: IpAddr,
    pub destination_port: u16,
}

impl fmt::Display for Endpoints {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} --> {}",
            socket(self.source, self.source_port),
            socket(self.destination, self.destination_port)
        )
    }
}

fn socket(addr: IpAddr, port: u16) -> String {
    match addr {
        IpAddr::V4(a) => format!("{}:{}", a, port),
        IpAddr::V6(a) => format!("[{}]:{}", a, port),
    }
}

/// The TCP payload of a frame, borrowed from the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub endpoints: Endpoints,
    pub payload: &'a [u8],
}

/// Walks Ethernet, IP and TCP headers down to the TCP payload.
pub fn decode_frame(frame: &[u8]) -> Result<Segment<'_>, Ja3Error> {
    let eth = EthernetPacket::new(frame).ok_or(Ja3Error::NotApplicable)?;
    let mut ethertype = eth.get_ethertype();
    let mut offset = EthernetPacket::minimum_packet_size();

    if ethertype == EtherTypes::Vlan {
        let vlan = VlanPacket::new(&frame[offset..]).ok_or(Ja3Error::NotApplicable)?;
        ethertype = vlan.get_ethertype();
        offset += VlanPacket::minimum_packet_size();
    }

    let l3 = &frame[offset..];
    let (source, destination, l4) = match ethertype {
        EtherTypes::Ipv4 => ipv4_payload(l3)?,
        EtherTypes::Ipv6 => ipv6_payload(l3)?,
        _ => return Err(Ja3Error::NotApplicable),
    };

    let tcp = TcpPacket::new(l4).ok_or(Ja3Error::NotApplicable)?;
    let data_offset = tcp.get_data_offset() as usize * 4;
    if data_offset < TcpPacket::minimum_packet_size() || data_offset > l4.len() {
        return Err(Ja3Error::NotApplicable);
    }

    Ok(Segment {
        endpoints: Endpoints {
            source,
            source_port: tcp.get_source(),
            destination,
            destination_port: tcp.get_destination(),
        },
        payload: &l4[data_offset..],
    })
}

fn ipv4_payload(l3: &[u8]) -> Result<(IpAddr, IpAddr, &[u8]), Ja3Error> {
    let ip = Ipv4Packet::new(l3).ok_or(Ja3Error::NotApplicable)?;
    if ip.get_next_level_protocol() != IpNextHeaderProtocols::Tcp || ip.get_fragment_offset() != 0
    {
        return Err(Ja3Error::NotApplicable);
    }

    let header_len = ip.get_header_length() as usize * 4;
    // A zero total length shows up with segmentation offload; trust the capture then.
    let end = match ip.get_total_length() as usize {
        0 => l3.len(),
        n => n.min(l3.len()),
    };
    if header_len < Ipv4Packet::minimum_packet_size() || header_len > end {
        return Err(Ja3Error::NotApplicable);
    }

    Ok((
        IpAddr::V4(ip.get_source()),
        IpAddr::V4(ip.get_destination()),
        &l3[header_len..end],
    ))
}

fn ipv6_payload(l3: &[u8]) -> Result<(IpAddr, IpAddr, &[u8]), Ja3Error> {
    let ip = Ipv6Packet::new(l3).ok_or(Ja3Error::NotApplicable)?;
    if ip.get_next_header() != IpNextHeaderProtocols::Tcp {
        return Err(Ja3Error::NotApplicable);
    }

    let header_len = Ipv6Packet::minimum_packet_size();
    let end = (header_len + ip.get_payload_length() as usize).min(l3.len());

    Ok((
        IpAddr::V6(ip.get_source()),
        IpAddr::V6(ip.get_destination()),
        &l3[header_len..end],
    ))
}
