use core::fmt::Write;

use rand::RngCore;
use tinyvec::ArrayVec;

use super::ValidationError;

/// Number of bytes in a randomly generated token
pub const RANDOM_TOKEN_LEN: usize = 4;

/// # Message Token
///
/// The Token is used to match a response with a request.  The token
/// value is a sequence of 0 to 8 bytes.  (Note that every message carries a
/// token, even if it is of zero length.)
///
/// Tokens supplied from outside are unsigned integers, stored big-endian with
/// no leading zero bytes: `0` is the empty token and `0x91600E` is 3 bytes long.
///
/// ```
/// use coapspoof_msg::Token;
///
/// let token = Token::from_u64(0x91600E);
/// assert_eq!(token.len(), 3);
/// assert_eq!(token.to_hex(), "91600e");
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Debug, Default, Hash)]
pub struct Token(pub ArrayVec<[u8; 8]>);

/// Minimal number of big-endian bytes needed to represent `n`; 0 for `n == 0`.
///
/// ```
/// use coapspoof_msg::token_length;
///
/// assert_eq!(token_length(0), 0);
/// assert_eq!(token_length(0x055B23FA), 4);
/// assert_eq!(token_length(0x91600E), 3);
/// assert_eq!(token_length(u64::MAX), 8);
/// ```
pub fn token_length(n: u64) -> usize {
  let bits = 64 - n.leading_zeros() as usize;
  (bits + 7) / 8
}

impl Token {
  /// Largest token value
  pub const MAX: u64 = u64::MAX;

  /// Build a token from an unsigned integer, dropping leading zero bytes
  pub fn from_u64(n: u64) -> Self {
    let len = token_length(n);
    let bytes = n.to_be_bytes();
    Token(bytes[8 - len..].iter().copied().collect())
  }

  /// Check a token supplied from outside
  pub fn validate(n: i128) -> Result<Self, ValidationError> {
    u64::try_from(n).map(Token::from_u64)
                    .map_err(|_| ValidationError::Token(n))
  }

  /// A new token of [`RANDOM_TOKEN_LEN`] random bytes.
  ///
  /// The length stays 4 even when the leading byte happens to be zero.
  pub fn random(rng: &mut impl RngCore) -> Self {
    let mut bytes = [0u8; RANDOM_TOKEN_LEN];
    rng.fill_bytes(&mut bytes);
    Token(bytes.iter().copied().collect())
  }

  /// Number of bytes in this token (`TKL`)
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Is this the zero-length token?
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Token bytes
  pub fn as_bytes(&self) -> &[u8] {
    self.0.as_slice()
  }

  /// Lowercase hex of the token bytes, e.g. `"055b23fa"`
  pub fn to_hex(&self) -> String {
    let mut s = String::with_capacity(self.len() * 2);
    self.0.iter().for_each(|b| {
                   write!(s, "{:02x}", b).ok();
                 });
    s
  }
}
