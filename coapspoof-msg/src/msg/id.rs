#[allow(unused_imports)]
use crate::Token;

use super::ValidationError;

/// # Message ID
///
/// 16-bit unsigned integer in network byte order.  Used to
/// detect message duplication and to match messages of type
/// Acknowledgement/Reset to messages of type Confirmable/Non-
/// confirmable.
///
/// For a little more context and the difference between [`Id`] and [`Token`], see [`Token`].
///
/// See [RFC7252 - Message Details](https://datatracker.ietf.org/doc/html/rfc7252#section-3) for context
#[derive(Copy, Clone, Hash, PartialEq, PartialOrd, Debug, Eq, Ord)]
pub struct Id(pub u16);

impl Id {
  /// Sentinel accepted from outside to mean "no id supplied"
  pub const NONE: i64 = -1;

  /// Largest message id
  pub const MAX: u16 = u16::MAX;

  /// The id following this one, wrapping from 65535 to 0
  ///
  /// ```
  /// use coapspoof_msg::Id;
  ///
  /// assert_eq!(Id(1).next(), Id(2));
  /// assert_eq!(Id(65535).next(), Id(0));
  /// ```
  pub fn next(self) -> Self {
    Self(self.0.wrapping_add(1))
  }

  /// Check an id supplied from outside.
  ///
  /// [`Id::NONE`] yields `Ok(None)`; the caller is expected to pick one.
  pub fn validate(n: i64) -> Result<Option<Self>, ValidationError> {
    match n {
      | Self::NONE => Ok(None),
      | n => u16::try_from(n).map(|n| Some(Id(n)))
                             .map_err(|_| ValidationError::MessageId(n)),
    }
  }
}

impl From<Id> for [u8; 2] {
  fn from(id: Id) -> [u8; 2] {
    id.0.to_be_bytes()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validate() {
    assert_eq!(Id::validate(-1), Ok(None));
    assert_eq!(Id::validate(0), Ok(Some(Id(0))));
    assert_eq!(Id::validate(65535), Ok(Some(Id(65535))));
    assert_eq!(Id::validate(65536), Err(ValidationError::MessageId(65536)));
    assert_eq!(Id::validate(-2), Err(ValidationError::MessageId(-2)));
  }

  #[test]
  fn be_bytes() {
    let id = Id(1000);
    assert_eq!(<[u8; 2]>::from(id), [0x03, 0xE8]);
  }
}
