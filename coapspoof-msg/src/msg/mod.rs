use core::fmt;

/// Message Code
pub mod code;

/// Validation errors for header fields supplied from outside
pub mod error;

/// Message ID
pub mod id;

/// Message Options
pub mod opt;

/// Message Type
pub mod ty;

/// Message Token
pub mod token;

/// Message Version
pub mod ver;

pub use code::*;
pub use error::*;
pub use id::*;
pub use opt::*;
pub use token::*;
pub use ty::*;
pub use ver::*;

/// Marker byte separating the options from a non-empty payload
pub const PAYLOAD_MARKER: u8 = 0b1111_1111;

/// The body of a message; raw bytes, empty by default.
///
/// The payload is appended after a [`PAYLOAD_MARKER`] only when it is non-empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Payload(pub Vec<u8>);

impl Payload {
  /// Encode a utf8 string as a payload
  pub fn text(s: &str) -> Self {
    Self(s.as_bytes().to_vec())
  }
}

/// Struct representing the first byte of a message.
///
/// ```text
/// CoAP version
/// |
/// |  Message type (request, response, empty)
/// |  |
/// |  |  Length of token, in bytes. (4-bit integer)
/// |  |  |
/// vv vv vvvv
/// 01 00 0000
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub(crate) struct Byte1 {
  pub(crate) ver: Version,
  pub(crate) ty: Type,
  pub(crate) tkl: u8,
}

/// # `Message` struct
/// Low-level representation of a CoAP message about to be put on the wire.
///
/// A `Message` is built once per send with its options already in
/// ascending [`OptNumber`] order, serialized with [`crate::TryIntoBytes`]
/// and discarded; nothing mutates it in between.
///
/// ```
/// use coapspoof_msg::*;
///
/// let msg = Message { id: Id(1000),
///                     ty: Type::Con,
///                     ver: Version::default(),
///                     token: Token::from_u64(0x055B23FA),
///                     code: "205".parse().unwrap(),
///                     opts: vec![Opt::new(OptNumber::URI_HOST, b"127.0.0.1".to_vec())],
///                     payload: Payload::default() };
///
/// let bytes = msg.try_into_bytes().unwrap();
/// assert_eq!(&bytes[..4], &[0b01_00_0100, 69, 0x03, 0xE8]);
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Message {
  /// see [`Id`] for details
  pub id: Id,
  /// see [`Type`] for details
  pub ty: Type,
  /// see [`Version`] for details
  pub ver: Version,
  /// see [`Token`] for details
  pub token: Token,
  /// see [`Code`] for details
  pub code: Code,
  /// see [`opt::Opt`] for details
  pub opts: Vec<Opt>,
  /// see [`Payload`]
  pub payload: Payload,
}

impl Message {
  /// Length of this message's token in bytes (`TKL`)
  pub fn token_length(&self) -> u8 {
    self.token.len() as u8
  }

  /// The wire byte of this message's [`Code`]
  pub fn code_value(&self) -> u8 {
    self.code.into()
  }

  /// Get the value of the first option with number `num`
  pub fn get(&self, num: OptNumber) -> Option<&OptValue> {
    self.opts.iter().find(|o| o.number == num).map(|o| &o.value)
  }
}

impl fmt::Display for Message {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f,
             "CoAP v{} {} {} mid={} token={} (tkl {})",
             self.ver.0,
             self.ty,
             self.code,
             self.id.0,
             self.token.to_hex(),
             self.token_length())?;

    for opt in self.opts.iter() {
      writeln!(f,
               "  {} ({}): {}",
               opt.number.name().unwrap_or("Unknown"),
               opt.number.0,
               String::from_utf8_lossy(&opt.value.0))?;
    }

    write!(f, "  payload: {} bytes", self.payload.0.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn derived_header_values() {
    let (msg, _) = crate::test_msg();
    assert_eq!(msg.token_length(), 4);
    assert_eq!(msg.code_value(), 69);
  }

  #[test]
  fn get_option() {
    let (msg, _) = crate::test_msg();
    assert_eq!(msg.get(OptNumber::URI_PATH),
               Some(&OptValue(b"coap2http".to_vec())));
    assert_eq!(msg.get(OptNumber(12)), None);
  }

  #[test]
  fn display() {
    let (msg, _) = crate::test_msg();
    let shown = msg.to_string();

    assert!(shown.starts_with("CoAP v1 CON 2.05 mid=1000 token=055b23fa (tkl 4)"));
    assert!(shown.contains("Proxy-Uri (35): http://127.0.0.1:80"));
    assert!(shown.ends_with("payload: 13 bytes"));
  }
}
