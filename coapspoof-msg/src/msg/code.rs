use core::fmt;
use core::str::FromStr;

use super::ValidationError;

/// Number of bits used by the code class
pub const CODE_CLASS_BITS: u8 = 3;

/// Number of bits used by the code detail
pub const CODE_DETAIL_BITS: u8 = 5;

/// # CoAP Code
/// A (class, detail) pair packed into one byte as `class << 5 | detail`.
///
/// ```text
///   0.00      : Empty message
///   0.01-0.31 : Request (method codes)
///   1.00-1.31 : Reserved
///   2.00-5.31 : Response
///   6.00-7.31 : Reserved
/// ```
///
/// Codes come from outside as three decimal digits, either `"205"` or `"2.05"`:
/// ```
/// use coapspoof_msg::Code;
///
/// let code: Code = "205".parse().unwrap();
/// assert_eq!(code, Code::new(2, 5));
/// assert_eq!(u8::from(code), 69);
/// assert_eq!("2.05".parse::<Code>(), Ok(code));
/// ```
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct Code {
  /// The "class" of message codes identify it as a request or response, and provides the class of response status:
  ///
  /// |class|meaning|
  /// |---|---|
  /// |`0`|Message is a request|
  /// |`2`|Message is a success response|
  /// |`4`|Message is a client error response|
  /// |`5`|Message is a server error response|
  pub class: u8,

  /// 2-digit integer (range `[0, 32)`) that provides granular information about the response status.
  pub detail: u8,
}

impl Code {
  /// Create a new Code
  pub const fn new(class: u8, detail: u8) -> Self {
    Self { class, detail }
  }

  /// Whether `class` and `detail` fit in their 3 and 5 bits
  pub fn is_valid(&self) -> bool {
    self.class < (1 << CODE_CLASS_BITS) && self.detail < (1 << CODE_DETAIL_BITS)
  }
}

impl From<Code> for u8 {
  fn from(code: Code) -> u8 {
    (code.class << CODE_DETAIL_BITS) | code.detail
  }
}

impl From<u8> for Code {
  fn from(b: u8) -> Self {
    Code { class: b >> CODE_DETAIL_BITS,
           detail: b & 0b11111 }
  }
}

impl FromStr for Code {
  type Err = ValidationError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let err = || ValidationError::Code(s.to_string());

    let digits: String = match s.as_bytes() {
      | [c, b'.', d0, d1] => [*c, *d0, *d1].iter().map(|b| *b as char).collect(),
      | [_, _, _] => s.to_string(),
      | _ => return Err(err()),
    };

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
      return Err(err());
    }

    let class: u8 = digits[..1].parse().map_err(|_| err())?;
    let detail: u8 = digits[1..].parse().map_err(|_| err())?;
    let code = Code::new(class, detail);

    if code.is_valid() {
      Ok(code)
    } else {
      Err(err())
    }
  }
}

impl fmt::Display for Code {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{:02}", self.class, self.detail)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assert_eqb;

  #[test]
  fn to_byte() {
    let code = Code { class: 2,
                      detail: 5 };
    let actual: u8 = code.into();
    let expected = 0b0100_0101_u8;
    assert_eqb!(actual, expected)
  }

  #[test]
  fn parse_known_codes() {
    assert_eq!("000".parse::<Code>().map(u8::from), Ok(0));
    assert_eq!("001".parse::<Code>().map(u8::from), Ok(1));
    assert_eq!("004".parse::<Code>().map(u8::from), Ok(4));
    assert_eq!("205".parse::<Code>().map(u8::from), Ok(69));
    assert_eq!("7.31".parse::<Code>().map(u8::from), Ok(255));
  }

  #[test]
  fn parse_rejects_malformed() {
    for bad in ["", "20", "2050", "2x5", "-05", "805", "232", "2,05", "2.5", " 205"] {
      assert_eq!(bad.parse::<Code>(),
                 Err(ValidationError::Code(bad.to_string())),
                 "{:?} should be rejected",
                 bad);
    }
  }

  #[test]
  fn every_valid_code_survives_the_wire_byte() {
    for class in 0..8u8 {
      for detail in 0..32u8 {
        let code = Code::new(class, detail);
        assert_eq!(Code::from(u8::from(code)), code);
        assert_eq!(format!("{}{:02}", class, detail).parse::<Code>(), Ok(code));
      }
    }
  }

  #[test]
  fn display() {
    assert_eq!(Code::new(2, 5).to_string(), "2.05");
    assert_eq!(Code::new(0, 0).to_string(), "0.00");
  }
}
