//! Send crafted CoAP requests to a CoAP-to-HTTP proxy.

use std::io;
use std::net::Ipv4Addr;
use std::process::ExitCode;

use clap::Parser;
use coapspoof::config::{Config, Header, Mode, Net, Policy, Proxy, Transport};
use coapspoof::frame::ByteOrderPolicy;
use coapspoof::gen::TokenPolicy;
use coapspoof::interrupt::SigInt;
use coapspoof::logging::{self, TARGET};

/// Send (optionally spoofed) CoAP proxy requests over UDP, raw IP or DTLS
#[derive(Parser, Debug)]
#[command(name = "coapspoof", version, about)]
struct Args {
  /// Source address written into (or bound for) every datagram
  #[arg(short = 's', long = "source", default_value = "127.0.0.1")]
  source: Ipv4Addr,

  /// Source port
  #[arg(short = 'S', long = "src-port", default_value_t = 7777)]
  src_port: u16,

  /// Destination address
  #[arg(short = 'd', long = "destination", default_value = "127.0.0.1")]
  destination: Ipv4Addr,

  /// Destination port
  #[arg(short = 'D', long = "dst-port", default_value_t = 5683)]
  dst_port: u16,

  /// Message id of the first message; random when absent or -1
  #[arg(short = 'm', long = "message-id", allow_negative_numbers = true)]
  message_id: Option<i64>,

  /// Message type: CON, NON, ACK or RST
  #[arg(short = 'M', long = "message-type", default_value = "CON")]
  message_type: String,

  /// Token as an unsigned integer; 4 random bytes when absent
  #[arg(short = 't', long = "token", allow_negative_numbers = true)]
  token: Option<i128>,

  /// Code as `cdd` or `c.dd`
  #[arg(short = 'c', long = "code", default_value = "000")]
  code: String,

  /// Uri-Host option
  #[arg(short = 'u', long = "uri-host", default_value = "127.0.0.1")]
  uri_host: String,

  /// Uri-Path option
  #[arg(short = 'a', long = "uri-path", default_value = "coap2http")]
  uri_path: String,

  /// Proxy-Uri option, before the `/{mid}_{token}` suffix
  #[arg(short = 'y', long = "proxy-uri", default_value = "http://127.0.0.1:80")]
  proxy_uri: String,

  /// Payload text
  #[arg(short = 'p', long = "payload", default_value = "")]
  payload: String,

  /// Send through a PSK-authenticated DTLS session
  #[arg(long)]
  dtls: bool,

  /// Send until interrupted
  #[arg(short = 'f', long)]
  flood: bool,

  /// Send this many messages
  #[arg(short = 'n', long = "num-messages")]
  num_messages: Option<u64>,

  /// Print every message before it is sent, and log at debug level
  #[arg(short = 'x', long)]
  debug: bool,

  /// Socket kind; raw needs root. Defaults to loopback on macOS, raw elsewhere
  #[arg(long, value_enum)]
  mode: Option<Mode>,

  /// Write the IPv4 total length & fragment offset in host byte order (always on for FreeBSD)
  #[arg(long = "bsd-byte-order")]
  bsd_byte_order: bool,

  /// Do not suffix Proxy-Uri; every message is then identical
  #[arg(long = "no-suffix")]
  no_suffix: bool,

  /// Use a new random token for every message
  #[arg(long = "fresh-token")]
  fresh_token: bool,
}

impl From<Args> for Config {
  fn from(a: Args) -> Config {
    let byte_order = if a.bsd_byte_order {
      ByteOrderPolicy::HostLengthAndOffset
    } else {
      ByteOrderPolicy::for_target()
    };

    Config { net: Net { source: a.source,
                        src_port: a.src_port,
                        destination: a.destination,
                        dst_port: a.dst_port },
             header: Header { message_id: a.message_id,
                              message_type: a.message_type,
                              token: a.token,
                              code: a.code },
             proxy: Proxy { uri_host: a.uri_host,
                            uri_path: a.uri_path,
                            proxy_uri: a.proxy_uri },
             payload: a.payload,
             transport: Transport { mode: a.mode.unwrap_or_else(Mode::for_target),
                                    dtls: a.dtls,
                                    byte_order },
             policy: Policy { flood: a.flood,
                              num_messages: a.num_messages },
             suffix_mid_tok: !a.no_suffix,
             token_policy: if a.fresh_token {
               TokenPolicy::Fresh
             } else {
               TokenPolicy::Reuse
             },
             debug: a.debug }
  }
}

fn main() -> ExitCode {
  let args = Args::parse();
  logging::init(args.debug).ok();

  let config = Config::from(args);
  log::debug!(target: TARGET, "{:?}", config);

  let interrupt = match SigInt::install() {
    | Ok(interrupt) => interrupt,
    | Err(e) => {
      log::error!(target: TARGET, "installing SIGINT handler: {}", e);
      return ExitCode::FAILURE;
    },
  };

  let result = coapspoof::run(&config, interrupt);
  if let Err(e) = &result {
    log::error!(target: TARGET, "{}", e);
  }

  match coapspoof::report(&result, &mut io::stdout()) {
    | Ok(status) => ExitCode::from(status),
    | Err(_) => ExitCode::FAILURE,
  }
}
