//! PSK-authenticated DTLS on top of a datagram link.

use std::io;
use std::net::UdpSocket;
use std::time::Duration;

use openssl::error::ErrorStack;
use openssl::ssl::{HandshakeError, SslConnector, SslMethod, SslOptions, SslStream,
                   SslVerifyMode};

use super::raw::{RawListener, RawSocket};
use super::ChannelError;
use crate::frame::Framer;
use crate::logging::TARGET;

/// PSK identity presented to the server
pub const PSK_IDENTITY: &str = "Client_identity";

/// Pre-shared key
pub const PSK_KEY: &[u8] = b"secretPSK";

/// Cipher suites offered, most preferred first
pub const PSK_CIPHERS: &str = "PSK-AES128-CCM8:PSK-AES128-GCM-SHA256:PSK-AES128-CBC-SHA256";

/// Path MTU assumed for DTLS records; also disables MTU discovery
pub const MTU: u32 = 1200;

/// How long to wait for each handshake flight from the server
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Datagram link that DTLS records travel over
#[derive(Debug)]
pub enum Link {
  /// A UDP socket connected to the server
  Udp(UdpSocket),
  /// Records are framed and sent through a raw socket;
  /// replies are captured from a raw listener.
  Raw {
    /// Outbound socket
    tx: RawSocket,
    /// Wraps every outbound record
    framer: Framer,
    /// Inbound capture
    rx: RawListener,
  },
}

impl Link {
  fn set_read_timeout(&self, dur: Option<Duration>) -> io::Result<()> {
    match self {
      | Self::Udp(sock) => sock.set_read_timeout(dur),
      | Self::Raw { rx, .. } => rx.set_read_timeout(dur),
    }
  }
}

/// Adapts a [`Link`] to [`io::Read`] + [`io::Write`] for openssl.
///
/// Each `write` is sent immediately as one datagram, each `read` yields one datagram.
#[derive(Debug)]
pub struct DgramStream(Link);

impl io::Write for DgramStream {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    match &self.0 {
      | Link::Udp(sock) => sock.send(buf),
      | Link::Raw { tx, framer, .. } => {
        let packet = framer.frame(buf)
                           .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        tx.send(&packet).map(|_| buf.len())
      },
    }
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl io::Read for DgramStream {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    match &mut self.0 {
      | Link::Udp(sock) => sock.recv(buf),
      | Link::Raw { rx, .. } => rx.recv(buf),
    }
  }
}

fn connector() -> Result<SslConnector, ErrorStack> {
  let mut builder = SslConnector::builder(SslMethod::dtls())?;
  builder.set_verify(SslVerifyMode::NONE);
  let opts = builder.options() | SslOptions::NO_QUERY_MTU;
  builder.set_options(opts);
  builder.set_cipher_list(PSK_CIPHERS)?;
  builder.set_psk_client_callback(|_ssl, _hint, identity, psk| {
                                    let id = PSK_IDENTITY.as_bytes();
                                    if identity.len() <= id.len() || psk.len() < PSK_KEY.len() {
                                      return Err(ErrorStack::get());
                                    }

                                    identity[..id.len()].copy_from_slice(id);
                                    identity[id.len()] = 0;
                                    psk[..PSK_KEY.len()].copy_from_slice(PSK_KEY);
                                    Ok(PSK_KEY.len())
                                  });
  Ok(builder.build())
}

/// Perform a DTLS handshake over `link`.
///
/// Each flight from the server must arrive within [`HANDSHAKE_TIMEOUT`].
pub fn connect(link: Link) -> Result<SslStream<DgramStream>, ChannelError> {
  link.set_read_timeout(Some(HANDSHAKE_TIMEOUT))
      .map_err(ChannelError::Connect)?;

  let mut config = connector().and_then(|c| c.configure())
                              .map_err(ChannelError::Tls)?;
  config.set_verify_hostname(false);
  config.set_use_server_name_indication(false);
  config.set_mtu(MTU).map_err(ChannelError::Tls)?;

  let stream = config.connect("", DgramStream(link))
                     .map_err(|e| match e {
                       | HandshakeError::SetupFailure(e) => ChannelError::Tls(e),
                       | HandshakeError::Failure(mid) => {
                         ChannelError::Handshake(mid.error().to_string())
                       },
                       | HandshakeError::WouldBlock(_) => {
                         ChannelError::Handshake(format!("no reply within {:?}", HANDSHAKE_TIMEOUT))
                       },
                     })?;

  stream.get_ref()
        .0
        .set_read_timeout(None)
        .map_err(ChannelError::Connect)?;

  log::info!(target: TARGET, "dtls session established ({})",
             stream.ssl().current_cipher().map(|c| c.name()).unwrap_or("no cipher"));
  Ok(stream)
}
