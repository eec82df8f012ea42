use core::fmt;

use crate::*;

/// Trait allowing fallible conversion into bytes
pub trait TryIntoBytes {
  /// Error yielded when the value cannot be serialized
  type Error;

  /// Try to convert into a collection of bytes
  ///
  /// ```
  /// use coapspoof_msg::*;
  ///
  /// let msg = Message { id: Id(0),
  ///                     ty: Type::Non,
  ///                     ver: Default::default(),
  ///                     opts: vec![],
  ///                     payload: Payload(vec![]),
  ///                     token: Token::from_u64(0),
  ///                     code: Code::new(0, 1) };
  ///
  /// let bytes: Vec<u8> = msg.try_into_bytes().unwrap();
  /// assert_eq!(bytes, vec![0b01_01_0000, 1, 0, 0]);
  /// ```
  fn try_into_bytes(&self) -> Result<Vec<u8>, Self::Error>;
}

/// Errors encounterable serializing to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageToBytesError {
  /// An option could not be encoded
  Opt {
    /// Number of the offending option
    number: OptNumber,
    /// Why it could not be encoded
    error: OptEncodeError,
  },
  /// Token was longer than 8 bytes
  TokenTooLong(usize),
}

impl fmt::Display for MessageToBytesError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::Opt { number, error } => write!(f, "option {}: {}", number.0, error),
      | Self::TokenTooLong(n) => write!(f, "token is {} bytes, at most 8 allowed", n),
    }
  }
}

impl std::error::Error for MessageToBytesError {}

impl TryIntoBytes for Message {
  type Error = MessageToBytesError;

  fn try_into_bytes(&self) -> Result<Vec<u8>, Self::Error> {
    let tkl = self.token.len();
    if tkl > 8 {
      return Err(MessageToBytesError::TokenTooLong(tkl));
    }

    let mut bytes = Vec::with_capacity(4 + tkl + 1 + self.payload.0.len());

    let byte1: u8 = Byte1 { tkl: tkl as u8,
                            ver: self.ver,
                            ty: self.ty }.into();
    let code: u8 = self.code.into();
    let id: [u8; 2] = self.id.into();

    bytes.push(byte1);
    bytes.push(code);
    bytes.extend(id);
    bytes.extend(self.token.as_bytes());

    self.opts
        .iter()
        .try_fold(OptNumber(0), |prev, opt| {
          opt.extend_bytes(prev, &mut bytes)
             .map_err(|error| MessageToBytesError::Opt { number: opt.number,
                                                         error })
        })?;

    if !self.payload.0.is_empty() {
      bytes.push(PAYLOAD_MARKER);
      bytes.extend(self.payload.0.iter());
    }

    Ok(bytes)
  }
}

impl From<Byte1> for u8 {
  fn from(b: Byte1) -> u8 {
    let ver = b.ver.0 << 6;
    let ty = u8::from(b.ty) << 4;
    let tkl = b.tkl;

    ver | ty | tkl
  }
}
