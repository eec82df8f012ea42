use core::fmt;
use std::io;
use std::net::{SocketAddrV4, UdpSocket};

use crate::config::{Mode, Settings};
#[cfg(feature = "dtls")]
use crate::frame::Framer;

/// Raw IPv4 sockets
pub mod raw;

/// DTLS sessions
#[cfg(feature = "dtls")]
pub mod secure;

/// Something that serialized (and possibly framed) messages can be written to.
///
/// Every call carries exactly one message; implementors must not coalesce them.
pub trait Transmit {
  /// Send one message, yielding the number of bytes accepted
  fn transmit(&mut self, bytes: &[u8]) -> io::Result<usize>;
}

/// Errors encounterable opening a [`Channel`]
#[derive(Debug)]
pub enum ChannelError {
  /// Binding a socket failed (e.g. the source address is not local)
  Bind(io::Error),
  /// The process may not open raw sockets
  Privilege(io::Error),
  /// Connecting or configuring a socket failed
  Connect(io::Error),
  /// openssl could not set up a DTLS context
  #[cfg(feature = "dtls")]
  Tls(openssl::error::ErrorStack),
  /// The DTLS handshake did not complete
  Handshake(String),
  /// DTLS was requested of a build without the `dtls` feature
  DtlsUnavailable,
}

impl ChannelError {
  /// Classify a failure to open a raw socket
  pub fn from_raw_open(e: io::Error) -> Self {
    match e.kind() {
      | io::ErrorKind::PermissionDenied => Self::Privilege(e),
      | _ => Self::Bind(e),
    }
  }
}

impl fmt::Display for ChannelError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::Bind(e) => write!(f, "bind failed: {}", e),
      | Self::Privilege(e) => write!(f, "raw sockets need root (or CAP_NET_RAW): {}", e),
      | Self::Connect(e) => write!(f, "connect failed: {}", e),
      #[cfg(feature = "dtls")]
      | Self::Tls(e) => write!(f, "dtls setup failed: {}", e),
      | Self::Handshake(e) => write!(f, "dtls handshake failed: {}", e),
      | Self::DtlsUnavailable => f.write_str("built without dtls support"),
    }
  }
}

impl std::error::Error for ChannelError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      | Self::Bind(e) | Self::Privilege(e) | Self::Connect(e) => Some(e),
      #[cfg(feature = "dtls")]
      | Self::Tls(e) => Some(e),
      | _ => None,
    }
  }
}

/// The transport messages leave through
#[derive(Debug)]
pub enum Channel {
  /// UDP socket bound to the source address
  Plain {
    /// The bound socket
    sock: UdpSocket,
    /// Where every datagram goes
    dst: SocketAddrV4,
  },
  /// Raw IP socket; expects fully framed packets
  Raw(raw::RawSocket),
  /// DTLS session; expects bare CoAP messages
  #[cfg(feature = "dtls")]
  Secure(Box<openssl::ssl::SslStream<secure::DgramStream>>),
}

impl Channel {
  /// Open the channel described by `settings`.
  ///
  /// For DTLS this includes the complete handshake.
  pub fn open(settings: &Settings) -> Result<Self, ChannelError> {
    let (src, dst) = (settings.net.src(), settings.net.dst());

    match (settings.transport.mode, settings.transport.dtls) {
      | (Mode::Loopback, false) => {
        let sock = UdpSocket::bind(src).map_err(ChannelError::Bind)?;
        Ok(Self::Plain { sock, dst })
      },
      | (Mode::Raw, false) => raw::RawSocket::open(dst).map(Self::Raw),
      #[cfg(feature = "dtls")]
      | (Mode::Loopback, true) => {
        let sock = UdpSocket::bind(src).map_err(ChannelError::Bind)?;
        sock.connect(dst).map_err(ChannelError::Connect)?;
        secure::connect(secure::Link::Udp(sock)).map(|s| Self::Secure(Box::new(s)))
      },
      #[cfg(feature = "dtls")]
      | (Mode::Raw, true) => {
        let link = secure::Link::Raw { tx: raw::RawSocket::open(dst)?,
                                       framer: Framer::new(src,
                                                           dst,
                                                           settings.transport.byte_order),
                                       rx: raw::RawListener::open(src, dst)? };
        secure::connect(link).map(|s| Self::Secure(Box::new(s)))
      },
      #[cfg(not(feature = "dtls"))]
      | (_, true) => Err(ChannelError::DtlsUnavailable),
    }
  }

  /// Short name for logs
  pub fn kind(&self) -> &'static str {
    match self {
      | Self::Plain { .. } => "udp",
      | Self::Raw(_) => "raw ip",
      #[cfg(feature = "dtls")]
      | Self::Secure(_) => "dtls",
    }
  }
}

impl Transmit for Channel {
  fn transmit(&mut self, bytes: &[u8]) -> io::Result<usize> {
    match self {
      | Self::Plain { sock, dst } => sock.send_to(bytes, *dst),
      | Self::Raw(sock) => sock.send(bytes),
      #[cfg(feature = "dtls")]
      | Self::Secure(stream) => io::Write::write(stream.as_mut(), bytes),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;

  fn loopback(src_port: u16, dst_port: u16) -> Settings {
    let mut config = Config::default();
    config.policy.flood = true;
    config.transport.mode = Mode::Loopback;
    config.net.src_port = src_port;
    config.net.dst_port = dst_port;
    config.validate().unwrap()
  }

  #[test]
  fn plain_channel_sends_datagrams() {
    let rx = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = rx.local_addr().unwrap().port();

    let mut channel = Channel::open(&loopback(0, port)).unwrap();
    assert_eq!(channel.kind(), "udp");
    assert_eq!(channel.transmit(b"abc").unwrap(), 3);

    let mut buf = [0u8; 8];
    let n = rx.recv(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"abc");
  }

  #[test]
  fn taken_source_port_fails_to_bind() {
    let taken = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    match Channel::open(&loopback(port, 5683)) {
      | Err(ChannelError::Bind(_)) => (),
      | other => panic!("expected bind failure, got {:?}", other),
    }
  }

  #[test]
  fn raw_open_classifies_permission() {
    let e = ChannelError::from_raw_open(io::Error::from(io::ErrorKind::PermissionDenied));
    assert!(matches!(e, ChannelError::Privilege(_)));

    let e = ChannelError::from_raw_open(io::Error::from(io::ErrorKind::AddrNotAvailable));
    assert!(matches!(e, ChannelError::Bind(_)));
  }
}
