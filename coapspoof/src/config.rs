use core::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

use coapspoof_msg::{Code, Id, Payload, Token, Type, ValidationError};

use crate::frame::ByteOrderPolicy;
use crate::gen::{Template, TokenPolicy};

/// Addresses written into (or bound for) every datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Net {
  /// Source address. In raw mode this may be any address; it is only written into the IPv4 header.
  pub source: Ipv4Addr,
  /// Source port; defaults to 7777
  pub src_port: u16,
  /// Destination address, the proxy under test
  pub destination: Ipv4Addr,
  /// Destination port; defaults to 5683
  pub dst_port: u16,
}

impl Net {
  /// `source:src_port`
  pub fn src(&self) -> SocketAddrV4 {
    SocketAddrV4::new(self.source, self.src_port)
  }

  /// `destination:dst_port`
  pub fn dst(&self) -> SocketAddrV4 {
    SocketAddrV4::new(self.destination, self.dst_port)
  }
}

impl Default for Net {
  fn default() -> Self {
    Self { source: Ipv4Addr::LOCALHOST,
           src_port: 7777,
           destination: Ipv4Addr::LOCALHOST,
           dst_port: 5683 }
  }
}

/// CoAP header fields, as supplied from outside and not yet validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
  /// Message id of the first message; `None` or `Some(-1)` picks a random one
  pub message_id: Option<i64>,
  /// One of `CON`, `NON`, `ACK`, `RST` (any case); defaults to `CON`
  pub message_type: String,
  /// Token as an unsigned integer; `None` picks 4 random bytes
  pub token: Option<i128>,
  /// `cdd` or `c.dd`; defaults to `000` (empty message)
  pub code: String,
}

impl Default for Header {
  fn default() -> Self {
    Self { message_id: None,
           message_type: "CON".into(),
           token: None,
           code: "000".into() }
  }
}

/// Values of the options used to talk to a CoAP-to-HTTP proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
  /// Uri-Host (3)
  pub uri_host: String,
  /// Uri-Path (11)
  pub uri_path: String,
  /// Proxy-Uri (35), before the `/{mid}_{token}` suffix
  pub proxy_uri: String,
}

impl Default for Proxy {
  fn default() -> Self {
    Self { uri_host: "127.0.0.1".into(),
           uri_path: "coap2http".into(),
           proxy_uri: "http://127.0.0.1:80".into() }
  }
}

/// Which kind of socket carries the datagrams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Mode {
  /// An ordinary UDP socket bound to the source address;
  /// the kernel writes the UDP & IP headers.
  Loopback,
  /// A raw IP socket; we write the UDP & IP headers ourselves,
  /// which lets the source address be anything. Needs privilege.
  Raw,
}

impl Mode {
  /// `Loopback` on macOS, `Raw` everywhere else
  pub fn for_target() -> Self {
    if cfg!(target_os = "macos") {
      Self::Loopback
    } else {
      Self::Raw
    }
  }
}

impl Default for Mode {
  fn default() -> Self {
    Self::for_target()
  }
}

/// How datagrams leave the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Transport {
  /// See [`Mode`]
  pub mode: Mode,
  /// Wrap the socket in a PSK-authenticated DTLS session
  pub dtls: bool,
  /// Byte order of raw IPv4 length fields, see [`ByteOrderPolicy`]
  pub byte_order: ByteOrderPolicy,
}

/// How many messages to send, as supplied from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Policy {
  /// Send until interrupted
  pub flood: bool,
  /// Send exactly this many messages
  pub num_messages: Option<u64>,
}

/// Validated sending policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendPolicy {
  /// Unbounded; only an interrupt stops the loop
  Flood,
  /// Stop after this many successful sends
  Count(u64),
}

/// Runtime configuration
///
/// ```
/// use coapspoof::config::{Config, SendPolicy};
///
/// let mut config = Config::default();
/// config.policy.num_messages = Some(3);
///
/// let settings = config.validate().unwrap();
/// assert_eq!(settings.policy, SendPolicy::Count(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// See [`Net`]
  pub net: Net,
  /// See [`Header`]
  pub header: Header,
  /// See [`Proxy`]
  pub proxy: Proxy,
  /// utf8 text sent as the message payload; empty by default
  pub payload: String,
  /// See [`Transport`]
  pub transport: Transport,
  /// See [`Policy`]
  pub policy: Policy,
  /// Suffix Proxy-Uri with `/{message_id}_{token_hex}` so the receiving end
  /// can tell which message a forwarded request came from.
  ///
  /// Turning this off freezes the message: every send is byte-identical.
  pub suffix_mid_tok: bool,
  /// See [`TokenPolicy`]
  pub token_policy: TokenPolicy,
  /// Print every message before sending it
  pub debug: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self { net: Net::default(),
           header: Header::default(),
           proxy: Proxy::default(),
           payload: String::new(),
           transport: Transport::default(),
           policy: Policy::default(),
           suffix_mid_tok: true,
           token_policy: TokenPolicy::Reuse,
           debug: false }
  }
}

/// Configuration that passed [`Config::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  /// See [`Net`]
  pub net: Net,
  /// Message fields that do not change between sends
  pub template: Template,
  /// Id of the first message, if one was supplied
  pub first_id: Option<Id>,
  /// Token of the first message, if one was supplied
  pub token: Option<Token>,
  /// See [`Transport`]
  pub transport: Transport,
  /// See [`SendPolicy`]
  pub policy: SendPolicy,
  /// See [`Config::suffix_mid_tok`]
  pub suffix_mid_tok: bool,
  /// See [`TokenPolicy`]
  pub token_policy: TokenPolicy,
  /// See [`Config::debug`]
  pub debug: bool,
}

impl Settings {
  /// Whether messages must be wrapped in UDP & IPv4 headers before they reach the channel.
  ///
  /// DTLS sits above UDP, so a secure channel always takes the bare CoAP message.
  pub fn frames_messages(&self) -> bool {
    self.transport.mode == Mode::Raw && !self.transport.dtls
  }
}

/// Errors encounterable validating a [`Config`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  /// A header field was malformed
  Field(ValidationError),
  /// Both flood and a message count were requested
  FloodAndCount,
  /// Neither flood nor a message count was requested
  NoSendPolicy,
  /// A message count of zero was requested
  ZeroCount,
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::Field(e) => e.fmt(f),
      | Self::FloodAndCount => f.write_str("either flood or num-messages, not both"),
      | Self::NoSendPolicy => f.write_str("one of flood or num-messages is required"),
      | Self::ZeroCount => f.write_str("num-messages must be positive"),
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      | Self::Field(e) => Some(e),
      | _ => None,
    }
  }
}

impl From<ValidationError> for ConfigError {
  fn from(e: ValidationError) -> Self {
    Self::Field(e)
  }
}

impl Config {
  /// Check every field, yielding typed [`Settings`].
  ///
  /// Nothing is partially accepted; the first bad field fails the whole config.
  pub fn validate(&self) -> Result<Settings, ConfigError> {
    let policy = match (self.policy.flood, self.policy.num_messages) {
      | (true, Some(_)) => return Err(ConfigError::FloodAndCount),
      | (true, None) => SendPolicy::Flood,
      | (false, Some(0)) => return Err(ConfigError::ZeroCount),
      | (false, Some(n)) => SendPolicy::Count(n),
      | (false, None) => return Err(ConfigError::NoSendPolicy),
    };

    let ty: Type = self.header.message_type.parse()?;
    let code: Code = self.header.code.parse()?;
    let first_id = match self.header.message_id {
      | Some(n) => Id::validate(n)?,
      | None => None,
    };
    let token = self.header.token.map(Token::validate).transpose()?;

    let template = Template { ty,
                              code,
                              uri_host: self.proxy.uri_host.clone(),
                              uri_path: self.proxy.uri_path.clone(),
                              proxy_uri: self.proxy.proxy_uri.clone(),
                              payload: Payload::text(&self.payload) };

    Ok(Settings { net: self.net,
                  template,
                  first_id,
                  token,
                  transport: self.transport,
                  policy,
                  suffix_mid_tok: self.suffix_mid_tok,
                  token_policy: self.token_policy,
                  debug: self.debug })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn counted(n: u64) -> Config {
    let mut config = Config::default();
    config.policy.num_messages = Some(n);
    config
  }

  #[test]
  fn defaults() {
    let settings = counted(1).validate().unwrap();

    assert_eq!(settings.template.ty, Type::Con);
    assert_eq!(settings.template.code, Code::new(0, 0));
    assert_eq!(settings.template.proxy_uri, "http://127.0.0.1:80");
    assert_eq!(settings.first_id, None);
    assert_eq!(settings.token, None);
    assert_eq!(settings.net.dst(), "127.0.0.1:5683".parse().unwrap());
    assert!(settings.suffix_mid_tok);
  }

  #[test]
  fn flood_and_count_conflict() {
    let mut config = counted(5);
    config.policy.flood = true;
    assert_eq!(config.validate(), Err(ConfigError::FloodAndCount));
  }

  #[test]
  fn send_policy() {
    assert_eq!(Config::default().validate(), Err(ConfigError::NoSendPolicy));
    assert_eq!(counted(0).validate(), Err(ConfigError::ZeroCount));

    let mut config = Config::default();
    config.policy.flood = true;
    assert_eq!(config.validate().map(|s| s.policy), Ok(SendPolicy::Flood));
  }

  #[test]
  fn fields_are_named_in_errors() {
    let mut config = counted(1);
    config.header.message_type = "GET".into();
    assert_eq!(config.validate(),
               Err(ConfigError::Field(ValidationError::MessageType("GET".into()))));

    let mut config = counted(1);
    config.header.code = "299".into();
    assert_eq!(config.validate(),
               Err(ConfigError::Field(ValidationError::Code("299".into()))));

    let mut config = counted(1);
    config.header.message_id = Some(70000);
    assert_eq!(config.validate(),
               Err(ConfigError::Field(ValidationError::MessageId(70000))));

    let mut config = counted(1);
    config.header.token = Some(-5);
    assert_eq!(config.validate(),
               Err(ConfigError::Field(ValidationError::Token(-5))));
  }

  #[test]
  fn supplied_header_values() {
    let mut config = counted(1);
    config.header.message_id = Some(1000);
    config.header.token = Some(0x91600E);
    config.header.message_type = "non".into();
    config.header.code = "2.05".into();

    let settings = config.validate().unwrap();
    assert_eq!(settings.first_id, Some(Id(1000)));
    assert_eq!(settings.token, Some(Token::from_u64(0x91600E)));
    assert_eq!(settings.template.ty, Type::Non);
    assert_eq!(u8::from(settings.template.code), 69);
  }

  #[test]
  fn none_sentinel_means_random() {
    let mut config = counted(1);
    config.header.message_id = Some(Id::NONE);
    assert_eq!(config.validate().map(|s| s.first_id), Ok(None));
  }

  #[test]
  fn framing_depends_on_mode_and_dtls() {
    let mut config = counted(1);

    config.transport.mode = Mode::Raw;
    assert!(config.validate().unwrap().frames_messages());

    config.transport.dtls = true;
    assert!(!config.validate().unwrap().frames_messages());

    config.transport.mode = Mode::Loopback;
    config.transport.dtls = false;
    assert!(!config.validate().unwrap().frames_messages());
  }
}
