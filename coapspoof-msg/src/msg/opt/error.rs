use core::fmt;

/// Errors encounterable while encoding an option
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptEncodeError {
  /// The delta or value length can never be expressed in an option header;
  /// either the delta is negative (options out of ascending order) or
  /// one of them exceeds the largest extended value CoAP allows.
  InvalidOptionValue {
    /// Option number minus the previous option number
    delta: i64,
    /// Length of the option value in bytes
    len: usize,
  },

  /// Delta and length are representable by CoAP but need an
  /// encoding tier this codec does not implement
  /// (mixed plain/extended tiers, or the 2-byte extension).
  UnsupportedOptionEncoding {
    /// Option number minus the previous option number
    delta: u32,
    /// Length of the option value in bytes
    len: usize,
  },
}

impl fmt::Display for OptEncodeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::InvalidOptionValue { delta, len } => {
        write!(f, "invalid option (delta {}, length {})", delta, len)
      },
      | Self::UnsupportedOptionEncoding { delta, len } => {
        write!(f,
               "unsupported option encoding (delta {}, length {})",
               delta, len)
      },
    }
  }
}

impl std::error::Error for OptEncodeError {}
