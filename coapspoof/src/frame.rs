//! UDP & IPv4 framing for raw sockets.
//!
//! A raw socket sends exactly the bytes it is given, so in raw mode every
//! CoAP message is wrapped here in a UDP header and then an IPv4 header
//! before it reaches the socket.
//!
//! Neither checksum is computed. The UDP checksum is left `0` and the IPv4
//! header checksum carries a fixed placeholder; receivers in the test bed
//! are not expected to validate them.

use core::fmt;
use std::net::SocketAddrV4;

/// Length of a UDP header
pub const UDP_HEADER_LEN: usize = 8;

/// Length of an IPv4 header without options (IHL 5)
pub const IPV4_HEADER_LEN: usize = 20;

/// Identification field of every IPv4 header we write
pub const IPV4_ID: u16 = 54321;

/// Time to live of every IPv4 header we write
pub const IPV4_TTL: u8 = 255;

/// IANA protocol number for UDP
pub const IPPROTO_UDP: u8 = 17;

/// Value written in the IPv4 header checksum field; not a real checksum
pub const IPV4_CHECKSUM_PLACEHOLDER: u16 = 10;

/// Value written in the UDP checksum field; not a real checksum
pub const UDP_CHECKSUM_PLACEHOLDER: u16 = 0;

/// How the IPv4 total-length & fragment-offset fields are packed.
///
/// Every other multi-byte field is always big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrderPolicy {
  /// Network byte order (big-endian); what most raw socket implementations expect
  Network,
  /// Host byte order for total length & fragment offset.
  ///
  /// FreeBSD's raw IP output reads these two fields in host order.
  HostLengthAndOffset,
}

impl ByteOrderPolicy {
  /// The policy for the platform this binary was built for
  pub fn for_target() -> Self {
    if cfg!(target_os = "freebsd") {
      Self::HostLengthAndOffset
    } else {
      Self::Network
    }
  }

  fn pack(self, n: u16) -> [u8; 2] {
    match self {
      | Self::Network => n.to_be_bytes(),
      | Self::HostLengthAndOffset => n.to_ne_bytes(),
    }
  }
}

impl Default for ByteOrderPolicy {
  fn default() -> Self {
    Self::for_target()
  }
}

/// Errors encounterable framing a datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
  /// The framed packet would not fit its 16-bit length field
  TooLong(usize),
}

impl fmt::Display for FrameError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::TooLong(n) => write!(f, "{} byte packet does not fit a 16-bit length", n),
    }
  }
}

impl std::error::Error for FrameError {}

/// Wraps payloads in hand-built UDP and IPv4 headers.
///
/// ```
/// use coapspoof::frame::{ByteOrderPolicy, Framer};
///
/// let framer = Framer::new("10.0.0.1:7777".parse().unwrap(),
///                          "10.0.0.2:5683".parse().unwrap(),
///                          ByteOrderPolicy::Network);
///
/// let packet = framer.frame(b"coap").unwrap();
/// assert_eq!(packet.len(), 20 + 8 + 4);
/// assert_eq!(&packet[12..16], &[10, 0, 0, 1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framer {
  src: SocketAddrV4,
  dst: SocketAddrV4,
  order: ByteOrderPolicy,
}

impl Framer {
  /// Create a framer writing `src` and `dst` into every header
  pub fn new(src: SocketAddrV4, dst: SocketAddrV4, order: ByteOrderPolicy) -> Self {
    Self { src, dst, order }
  }

  /// Prepend a UDP header to `payload`.
  ///
  /// ```text
  /// +--------+--------+--------+--------+
  /// |  source port    |  dest port      |
  /// +--------+--------+--------+--------+
  /// |  length         |  checksum       |
  /// +--------+--------+--------+--------+
  /// ```
  pub fn wrap_udp(&self, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = UDP_HEADER_LEN + payload.len();
    let len16 = u16::try_from(len).map_err(|_| FrameError::TooLong(len))?;

    let mut bytes = Vec::with_capacity(len);
    bytes.extend(self.src.port().to_be_bytes());
    bytes.extend(self.dst.port().to_be_bytes());
    bytes.extend(len16.to_be_bytes());
    bytes.extend(UDP_CHECKSUM_PLACEHOLDER.to_be_bytes());
    bytes.extend_from_slice(payload);
    Ok(bytes)
  }

  /// Prepend an IPv4 header (no options, no fragmentation) to a UDP packet.
  pub fn wrap_ipv4(&self, udp: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = IPV4_HEADER_LEN + udp.len();
    let len16 = u16::try_from(len).map_err(|_| FrameError::TooLong(len))?;

    let version: u8 = 4;
    let ihl: u8 = 5;
    let tos: u8 = 0;
    let frag_off: u16 = 0;

    let mut bytes = Vec::with_capacity(len);
    bytes.push((version << 4) | ihl);
    bytes.push(tos);
    bytes.extend(self.order.pack(len16));
    bytes.extend(IPV4_ID.to_be_bytes());
    bytes.extend(self.order.pack(frag_off));
    bytes.push(IPV4_TTL);
    bytes.push(IPPROTO_UDP);
    bytes.extend(IPV4_CHECKSUM_PLACEHOLDER.to_be_bytes());
    bytes.extend(self.src.ip().octets());
    bytes.extend(self.dst.ip().octets());
    bytes.extend_from_slice(udp);
    Ok(bytes)
  }

  /// [`Framer::wrap_udp`] then [`Framer::wrap_ipv4`]
  pub fn frame(&self, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    self.wrap_udp(payload).and_then(|udp| self.wrap_ipv4(&udp))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn framer(order: ByteOrderPolicy) -> Framer {
    Framer::new("192.168.1.10:7777".parse().unwrap(),
                "192.168.1.20:5683".parse().unwrap(),
                order)
  }

  #[test]
  fn udp_header() {
    let udp = framer(ByteOrderPolicy::Network).wrap_udp(b"hello").unwrap();

    assert_eq!(udp.len(), 13);
    assert_eq!(u16::from_be_bytes([udp[0], udp[1]]), 7777);
    assert_eq!(u16::from_be_bytes([udp[2], udp[3]]), 5683);
    assert_eq!(u16::from_be_bytes([udp[4], udp[5]]), 13);
    assert_eq!(&udp[6..8], &[0, 0]);
    assert_eq!(&udp[8..], b"hello");
  }

  #[test]
  fn ipv4_header() {
    let packet = framer(ByteOrderPolicy::Network).frame(b"hello").unwrap();

    assert_eq!(packet.len(), 33);
    assert_eq!(packet[0], 0x45);
    assert_eq!(packet[1], 0);
    assert_eq!(u16::from_be_bytes([packet[2], packet[3]]), 33);
    assert_eq!(u16::from_be_bytes([packet[4], packet[5]]), 54321);
    assert_eq!(&packet[6..8], &[0, 0]);
    assert_eq!(packet[8], 255);
    assert_eq!(packet[9], 17);
    assert_eq!(u16::from_be_bytes([packet[10], packet[11]]), 10);
    assert_eq!(&packet[12..16], &[192, 168, 1, 10]);
    assert_eq!(&packet[16..20], &[192, 168, 1, 20]);
    assert_eq!(&packet[28..], b"hello");
  }

  #[test]
  fn host_order_only_touches_length_and_offset() {
    let net = framer(ByteOrderPolicy::Network).frame(&[7; 300]).unwrap();
    let host = framer(ByteOrderPolicy::HostLengthAndOffset).frame(&[7; 300]).unwrap();

    assert_eq!(u16::from_ne_bytes([host[2], host[3]]), 328);
    assert_eq!(u16::from_be_bytes([net[2], net[3]]), 328);

    // everything but total length is identical (fragment offset is 0 either way)
    assert_eq!(net[..2], host[..2]);
    assert_eq!(net[4..], host[4..]);

    // the UDP length inside stays big-endian
    assert_eq!(u16::from_be_bytes([host[24], host[25]]), 308);
  }

  #[test]
  fn too_long() {
    let f = framer(ByteOrderPolicy::Network);
    let payload = vec![0u8; u16::MAX as usize];

    assert_eq!(f.wrap_udp(&payload), Err(FrameError::TooLong(u16::MAX as usize + 8)));

    let payload = vec![0u8; u16::MAX as usize - 8 - 10];
    assert_eq!(f.frame(&payload), Err(FrameError::TooLong(u16::MAX as usize + 10)));
  }
}
