use core::fmt;

/// A header value supplied from outside the program was malformed.
///
/// Each variant names the offending field and carries the rejected input.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationError {
  /// Message type was not one of `CON`, `NON`, `ACK`, `RST`
  MessageType(String),
  /// Code was not a `cdd` / `c.dd` string with class in `0..=7` and detail in `0..=31`
  Code(String),
  /// Message ID was outside of `0..=65535`
  MessageId(i64),
  /// Token was outside of `0..=2^64 - 1`
  Token(i128),
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::MessageType(s) => {
        write!(f, "bad message type {:?}, need one of CON, NON, ACK, RST", s)
      },
      | Self::Code(s) => write!(f, "malformed code string {:?}", s),
      | Self::MessageId(n) => write!(f, "bad message id {}, need 0..=65535", n),
      | Self::Token(n) => write!(f, "bad token {}, need 0..=18446744073709551615", n),
    }
  }
}

impl std::error::Error for ValidationError {}
