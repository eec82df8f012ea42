use std::io::{self, Read};
use std::net::{Ipv4Addr, SocketAddrV4};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use super::ChannelError;
use crate::frame::{IPPROTO_UDP, UDP_HEADER_LEN};

/// Largest IPv4 packet
const MAX_PACKET: usize = u16::MAX as usize;

/// A raw IPv4 socket that sends caller-built packets, IP header included.
///
/// `IPPROTO_RAW` implies the header is supplied by us, so the kernel does not
/// check the source address; this is what allows spoofing.
#[derive(Debug)]
pub struct RawSocket {
  sock: Socket,
  dst: SockAddr,
}

impl RawSocket {
  /// Open a raw socket that will send to `dst`.
  ///
  /// Fails with [`ChannelError::Privilege`] when the process may not open raw sockets.
  pub fn open(dst: SocketAddrV4) -> Result<Self, ChannelError> {
    let sock = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::from(libc::IPPROTO_RAW)))
      .map_err(ChannelError::from_raw_open)?;

    Ok(Self { sock,
              dst: SockAddr::from(dst) })
  }

  /// Send one complete IPv4 packet
  pub fn send(&self, packet: &[u8]) -> io::Result<usize> {
    self.sock.send_to(packet, &self.dst)
  }
}

/// Receives the UDP payloads sent from `peer` to `local` through a raw
/// socket, for when there is no bound UDP socket to receive them
/// (because `local` is not ours to bind).
#[derive(Debug)]
pub struct RawListener {
  sock: Socket,
  local: SocketAddrV4,
  peer: SocketAddrV4,
  scratch: Vec<u8>,
}

impl RawListener {
  /// Start capturing UDP traffic from `peer` to `local`
  pub fn open(local: SocketAddrV4, peer: SocketAddrV4) -> Result<Self, ChannelError> {
    let sock = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::UDP))
      .map_err(ChannelError::from_raw_open)?;

    Ok(Self { sock,
              local,
              peer,
              scratch: vec![0; MAX_PACKET] })
  }

  /// Set the read timeout of the underlying socket
  pub fn set_read_timeout(&self, dur: Option<std::time::Duration>) -> io::Result<()> {
    self.sock.set_read_timeout(dur)
  }

  /// Block until a UDP packet from the peer to our address arrives,
  /// then copy its payload into `buf`.
  ///
  /// Any other traffic is skipped.
  pub fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    loop {
      let n = (&self.sock).read(&mut self.scratch)?;
      if let Some(payload) = udp_payload_for(&self.scratch[..n], self.peer, self.local) {
        let len = payload.len().min(buf.len());
        buf[..len].copy_from_slice(&payload[..len]);
        return Ok(len);
      }
    }
  }
}

fn addr_at(packet: &[u8], ip_at: usize, udp: &[u8], port_at: usize) -> Option<SocketAddrV4> {
  let ip = packet.get(ip_at..ip_at + 4)?;
  let port = udp.get(port_at..port_at + 2)?;
  Some(SocketAddrV4::new(Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3]),
                         u16::from_be_bytes([port[0], port[1]])))
}

/// If `packet` is an IPv4 UDP packet from `from` to `to`, its UDP payload
fn udp_payload_for(packet: &[u8], from: SocketAddrV4, to: SocketAddrV4) -> Option<&[u8]> {
  let ihl = usize::from(*packet.first()? & 0x0F) * 4;
  let udp = packet.get(ihl..)?;

  if *packet.get(9)? != IPPROTO_UDP
     || addr_at(packet, 12, udp, 0)? != from
     || addr_at(packet, 16, udp, 2)? != to
  {
    return None;
  }

  let udp_len = usize::from(u16::from_be_bytes([*udp.get(4)?, *udp.get(5)?]));
  udp.get(UDP_HEADER_LEN..udp_len.max(UDP_HEADER_LEN).min(udp.len()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::{ByteOrderPolicy, Framer};

  fn local() -> SocketAddrV4 {
    "10.0.0.1:7777".parse().unwrap()
  }

  fn peer() -> SocketAddrV4 {
    "10.0.0.2:5684".parse().unwrap()
  }

  fn packet(from: &str, to: &str) -> Vec<u8> {
    Framer::new(from.parse().unwrap(), to.parse().unwrap(), ByteOrderPolicy::Network).frame(b"record")
                                                                                    .unwrap()
  }

  #[test]
  fn payload_of_matching_packet() {
    let p = packet("10.0.0.2:5684", "10.0.0.1:7777");
    assert_eq!(udp_payload_for(&p, peer(), local()), Some(b"record".as_ref()));
  }

  #[test]
  fn other_traffic_is_skipped() {
    let outbound = packet("10.0.0.1:7777", "10.0.0.2:5684");
    assert_eq!(udp_payload_for(&outbound, peer(), local()), None);

    let other_port = packet("10.0.0.2:5684", "10.0.0.1:7778");
    assert_eq!(udp_payload_for(&other_port, peer(), local()), None);

    let other_peer = packet("10.0.0.3:5684", "10.0.0.1:7777");
    assert_eq!(udp_payload_for(&other_peer, peer(), local()), None);
  }

  #[test]
  fn truncated_packets_are_skipped() {
    assert_eq!(udp_payload_for(&[], peer(), local()), None);
    assert_eq!(udp_payload_for(&[0x45, 0, 0], peer(), local()), None);
  }
}
