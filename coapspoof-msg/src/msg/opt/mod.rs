use tinyvec::ArrayVec;

/// Option encoding errors
pub mod error;
pub use error::*;

/// Option deltas & lengths below this fit in the 4-bit header nibble
const NIBBLE_MAX: u32 = 13;

/// Option deltas & lengths below this fit in a 1-byte extension
const EXT1_MAX: u32 = 269;

/// Largest delta or length accepted at all; anything above is invalid
const EXT2_LIMIT: u32 = 0xFFFF + 14;

/// # Option Number
/// Identifies which option is being set (e.g. Uri-Path has a Number of 11).
///
/// Only the numbers the proxy requests need are named here.
///
/// # Related
/// - [RFC7252#section-12.2 Core CoAP Option Numbers](https://datatracker.ietf.org/doc/html/rfc7252#section-12.2)
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct OptNumber(pub u32);

impl OptNumber {
  /// Internet host of the resource being requested
  pub const URI_HOST: OptNumber = OptNumber(3);
  /// One segment of the absolute path to the resource
  pub const URI_PATH: OptNumber = OptNumber(11);
  /// Absolute URI to be fetched by a forward-proxy
  pub const PROXY_URI: OptNumber = OptNumber(35);

  /// Human name of a known option number
  pub fn name(&self) -> Option<&'static str> {
    match *self {
      | Self::URI_HOST => Some("Uri-Host"),
      | Self::URI_PATH => Some("Uri-Path"),
      | Self::PROXY_URI => Some("Proxy-Uri"),
      | _ => None,
    }
  }
}

/// Option Value: the raw bytes that follow an option header
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct OptValue(pub Vec<u8>);

/// # `Opt` struct
/// An option number and its value.
///
/// On the wire the number is not written directly; it is written as
/// the "delta" from the number of the option before it, which is why
/// options must be emitted in ascending order of number.
///
/// ```text
///   0   1   2   3   4   5   6   7
/// +---------------+---------------+
/// |  Option Delta | Option Length |   1 byte
/// +---------------+---------------+
/// /         Option Delta          /   0-2 bytes
/// \          (extended)           \
/// +-------------------------------+
/// /         Option Length         /   0-2 bytes
/// \          (extended)           \
/// +-------------------------------+
/// /         Option Value          /   0 or more bytes
/// +-------------------------------+
/// ```
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct Opt {
  /// See [`OptNumber`]
  pub number: OptNumber,
  /// See [`OptValue`]
  pub value: OptValue,
}

impl Opt {
  /// Create an option
  pub fn new(number: OptNumber, value: impl Into<Vec<u8>>) -> Self {
    Self { number,
           value: OptValue(value.into()) }
  }

  /// Given a collection to [`Extend`], the number of the option written before
  /// this one and this option, add this option's bytes to the collection.
  ///
  /// Yields this option's number, to be passed as `prev` for the next option.
  ///
  /// ```
  /// use coapspoof_msg::{Opt, OptNumber};
  ///
  /// let mut bytes = Vec::new();
  /// let prev = Opt::new(OptNumber::URI_HOST, b"a".to_vec()).extend_bytes(OptNumber(0), &mut bytes)
  ///                                                       .unwrap();
  ///
  /// assert_eq!(prev, OptNumber::URI_HOST);
  /// assert_eq!(bytes, vec![0b0011_0001, b'a']);
  /// ```
  pub fn extend_bytes(&self,
                      prev: OptNumber,
                      bytes: &mut impl Extend<u8>)
                      -> Result<OptNumber, OptEncodeError> {
    let delta = i64::from(self.number.0) - i64::from(prev.0);
    encode_option(delta, &self.value.0, bytes).map(|_| self.number)
  }

}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tier {
  Nibble(u8),
  Ext1(u8),
  Ext2,
}

fn tier(n: u32) -> Tier {
  match n {
    | n if n < NIBBLE_MAX => Tier::Nibble(n as u8),
    | n if n < EXT1_MAX => Tier::Ext1((n - NIBBLE_MAX) as u8),
    | _ => Tier::Ext2,
  }
}

/// Compute the header bytes (first byte plus extensions) for an option.
fn header(delta: i64, len: usize) -> Result<ArrayVec<[u8; 3]>, OptEncodeError> {
  let invalid = OptEncodeError::InvalidOptionValue { delta, len };

  let d = u32::try_from(delta).ok()
                              .filter(|d| *d <= EXT2_LIMIT)
                              .ok_or(invalid)?;
  let l = u32::try_from(len).ok()
                            .filter(|l| *l <= EXT2_LIMIT)
                            .ok_or(invalid)?;

  let mut bytes = ArrayVec::new();
  match (tier(d), tier(l)) {
    | (Tier::Nibble(d), Tier::Nibble(l)) => bytes.push((d << 4) | l),
    | (Tier::Ext1(d), Tier::Ext1(l)) => {
      bytes.push(((NIBBLE_MAX as u8) << 4) | NIBBLE_MAX as u8);
      bytes.push(d);
      bytes.push(l);
    },
    | _ => return Err(OptEncodeError::UnsupportedOptionEncoding { delta: d, len }),
  }

  Ok(bytes)
}

/// Encode one option given its delta from the previous option's number.
///
/// - `delta < 13` and `len < 13`: one header byte `delta << 4 | len`
/// - `13 <= delta < 269` and `13 <= len < 269`: header byte `0xDD`,
///   then `delta - 13` and `len - 13` as one byte each
/// - any other representable combination: [`OptEncodeError::UnsupportedOptionEncoding`]
/// - negative delta, or delta / length beyond `269 + 0xFFFF`: [`OptEncodeError::InvalidOptionValue`]
pub fn encode_option(delta: i64,
                     value: &[u8],
                     bytes: &mut impl Extend<u8>)
                     -> Result<(), OptEncodeError> {
  let head = header(delta, value.len())?;
  bytes.extend(head);
  bytes.extend(value.iter().copied());
  Ok(())
}

#[cfg(test)]
mod tests {
  use core::iter::repeat;

  use super::*;
  use crate::assert_eqb_iter;

  fn encode(delta: i64, value: &[u8]) -> Result<Vec<u8>, OptEncodeError> {
    let mut bytes = Vec::new();
    encode_option(delta, value, &mut bytes).map(|_| bytes)
  }

  /// Read back (delta, length, value) from a single-byte or 1-byte-extended header
  fn decode(bytes: &[u8]) -> (u32, usize, &[u8]) {
    let (d, l) = ((bytes[0] >> 4) as u32, (bytes[0] & 0b1111) as usize);
    match (d, l) {
      | (13, 13) => {
        let (d, l) = (bytes[1] as u32 + 13, bytes[2] as usize + 13);
        (d, l, &bytes[3..3 + l])
      },
      | (d, l) => (d, l, &bytes[1..1 + l]),
    }
  }

  #[test]
  fn nibble_tier() {
    let cases: [(i64, Vec<u8>, Vec<u8>); 3] = [(1, vec![1], vec![0b0001_0001, 1]),
                                                (0, vec![], vec![0b0000_0000]),
                                                (12,
                                                 repeat(7).take(12).collect(),
                                                 [[0b1100_1100u8].as_ref(),
                                                  repeat(7).take(12).collect::<Vec<u8>>().as_ref()].concat())];

    cases.into_iter().for_each(|(delta, value, expected)| {
                       let actual = encode(delta, &value).unwrap();
                       assert_eqb_iter!(actual, expected)
                     });
  }

  #[test]
  fn nibble_tier_reads_back() {
    for delta in 0..13u32 {
      for len in 0..13usize {
        let value: Vec<u8> = (0..len as u8).collect();
        let bytes = encode(delta as i64, &value).unwrap();
        assert_eq!(bytes.len(), 1 + len);
        assert_eq!(decode(&bytes), (delta, len, value.as_slice()));
      }
    }
  }

  #[test]
  fn ext1_tier_boundary() {
    let value: Vec<u8> = repeat(1).take(13).collect();
    let actual = encode(13, &value).unwrap();
    let expected = [[0b1101_1101u8, 0, 0].as_ref(), value.as_ref()].concat();
    assert_eqb_iter!(actual, expected);
    assert_eq!(decode(&actual), (13, 13, value.as_slice()));
  }

  #[test]
  fn ext1_tier() {
    let value: Vec<u8> = repeat(1).take(100).collect();
    let actual = encode(24, &value).unwrap();
    let expected = [[0b1101_1101u8, 24 - 13, 100 - 13].as_ref(), value.as_ref()].concat();
    assert_eqb_iter!(actual, expected);

    let value: Vec<u8> = repeat(2).take(268).collect();
    let actual = encode(268, &value).unwrap();
    assert_eq!(&actual[..3], &[0b1101_1101u8, 255, 255]);
  }

  #[test]
  fn mixed_tiers_are_unsupported() {
    assert_eq!(encode(24, &[1]),
               Err(OptEncodeError::UnsupportedOptionEncoding { delta: 24, len: 1 }));
    assert_eq!(encode(1, &[0; 13]),
               Err(OptEncodeError::UnsupportedOptionEncoding { delta: 1, len: 13 }));
  }

  #[test]
  fn two_byte_tier_is_unsupported() {
    assert_eq!(encode(269, &[0; 13]),
               Err(OptEncodeError::UnsupportedOptionEncoding { delta: 269, len: 13 }));
    assert_eq!(encode(13, &[0; 300]),
               Err(OptEncodeError::UnsupportedOptionEncoding { delta: 13, len: 300 }));
  }

  #[test]
  fn invalid() {
    assert_eq!(encode(-1, &[1]),
               Err(OptEncodeError::InvalidOptionValue { delta: -1, len: 1 }));
    assert_eq!(encode(EXT2_LIMIT as i64 + 1, &[]),
               Err(OptEncodeError::InvalidOptionValue { delta: EXT2_LIMIT as i64 + 1,
                                                        len: 0 }));
    let too_long = vec![0u8; EXT2_LIMIT as usize + 1];
    assert_eq!(encode(1, &too_long),
               Err(OptEncodeError::InvalidOptionValue { delta: 1,
                                                        len: EXT2_LIMIT as usize + 1 }));
  }

  #[test]
  fn largest_accepted_value_is_65549() {
    assert_eq!(encode(65549, &[]),
               Err(OptEncodeError::UnsupportedOptionEncoding { delta: 65549, len: 0 }));
    assert_eq!(encode(65550, &[]),
               Err(OptEncodeError::InvalidOptionValue { delta: 65550, len: 0 }));
    assert_eq!(encode(1, &vec![0u8; 65550]),
               Err(OptEncodeError::InvalidOptionValue { delta: 1, len: 65550 }));
  }

  #[test]
  fn extend_bytes_chains_numbers() {
    let host = Opt::new(OptNumber::URI_HOST, b"127.0.0.1".to_vec());
    let path = Opt::new(OptNumber::URI_PATH, b"coap2http".to_vec());

    let mut bytes = Vec::new();
    let prev = host.extend_bytes(OptNumber(0), &mut bytes).unwrap();
    let prev = path.extend_bytes(prev, &mut bytes).unwrap();

    assert_eq!(prev, OptNumber::URI_PATH);
    assert_eq!(bytes[0], 0b0011_1001);
    assert_eq!(bytes[10], 0b1000_1001);
  }

  #[test]
  fn out_of_order_is_invalid() {
    let host = Opt::new(OptNumber::URI_HOST, b"h".to_vec());
    let mut bytes = Vec::new();
    assert_eq!(host.extend_bytes(OptNumber::URI_PATH, &mut bytes),
               Err(OptEncodeError::InvalidOptionValue { delta: -8, len: 1 }));
    assert!(bytes.is_empty());
  }

  #[test]
  fn names() {
    assert_eq!(OptNumber::PROXY_URI.name(), Some("Proxy-Uri"));
    assert_eq!(OptNumber(60).name(), None);
  }
}
