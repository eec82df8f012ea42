use core::fmt;
use core::str::FromStr;

use super::ValidationError;

/// Indicates if this message is of
/// type Confirmable (0), Non-confirmable (1), Acknowledgement (2), or Reset (3).
///
/// See [RFC7252 - Message Details](https://datatracker.ietf.org/doc/html/rfc7252#section-3) for context
#[derive(Copy, Clone, Hash, Eq, Ord, PartialEq, PartialOrd, Debug)]
pub enum Type {
  /// Some messages require an acknowledgement.  These messages are
  /// called "Confirmable".  When no packets are lost, each Confirmable
  /// message elicits exactly one return message of type Acknowledgement
  /// or type Reset.
  Con,
  /// Some messages do not require an acknowledgement.  This is
  /// particularly true for messages that are repeated regularly for
  /// application requirements, such as repeated readings from a sensor.
  Non,
  /// An Acknowledgement message acknowledges that a specific
  /// Confirmable message arrived.
  Ack,
  /// A Reset message indicates that a specific message (Confirmable or
  /// Non-confirmable) was received, but some context is missing to
  /// properly process it.
  Reset,
}

impl Default for Type {
  fn default() -> Self {
    Type::Con
  }
}

impl From<Type> for u8 {
  fn from(t: Type) -> u8 {
    use Type::*;
    match t {
      | Con => 0,
      | Non => 1,
      | Ack => 2,
      | Reset => 3,
    }
  }
}

impl FromStr for Type {
  type Err = ValidationError;

  /// Parse one of `CON`, `NON`, `ACK`, `RST` (case-insensitive)
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_uppercase().as_str() {
      | "CON" => Ok(Type::Con),
      | "NON" => Ok(Type::Non),
      | "ACK" => Ok(Type::Ack),
      | "RST" => Ok(Type::Reset),
      | _ => Err(ValidationError::MessageType(s.to_string())),
    }
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      | Type::Con => "CON",
      | Type::Non => "NON",
      | Type::Ack => "ACK",
      | Type::Reset => "RST",
    };

    f.write_str(s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_case_insensitive() {
    assert_eq!("con".parse::<Type>(), Ok(Type::Con));
    assert_eq!("Non".parse::<Type>(), Ok(Type::Non));
    assert_eq!("ACK".parse::<Type>(), Ok(Type::Ack));
    assert_eq!("rst".parse::<Type>(), Ok(Type::Reset));
  }

  #[test]
  fn parse_rejects_unknown() {
    assert_eq!("RESET".parse::<Type>(),
               Err(ValidationError::MessageType("RESET".into())));
    assert_eq!("".parse::<Type>(),
               Err(ValidationError::MessageType("".into())));
  }

  #[test]
  fn wire_codes() {
    let codes: Vec<u8> = [Type::Con, Type::Non, Type::Ack, Type::Reset].into_iter()
                                                                       .map(u8::from)
                                                                       .collect();
    assert_eq!(codes, vec![0, 1, 2, 3]);
  }
}
