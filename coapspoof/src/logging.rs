use coapspoof_msg::Message;

/// Log target used throughout the crate
pub const TARGET: &str = "coapspoof";

/// Install the stderr logger; `Debug` level when `debug`, else `Info`.
///
/// Fails only if a logger is already installed.
pub fn init(debug: bool) -> Result<(), log::SetLoggerError> {
  let level = if debug {
    log::Level::Debug
  } else {
    log::Level::Info
  };
  simple_logger::init_with_level(level)
}

/// One-line description of a message for trace logs
///
/// ```
/// use coapspoof::logging::msg_summary;
/// use coapspoof_msg::*;
///
/// let msg = Message { id: Id(7),
///                     ty: Type::Con,
///                     ver: Default::default(),
///                     token: Token::from_u64(0xAB),
///                     code: Code::new(0, 1),
///                     opts: vec![],
///                     payload: Payload::text("hi") };
///
/// assert_eq!(msg_summary(&msg), "CON 0.01 mid=7 token=ab with 2 byte payload");
/// ```
pub fn msg_summary(msg: &Message) -> String {
  format!("{} {} mid={} token={} with {} byte payload",
          msg.ty,
          msg.code,
          msg.id.0,
          msg.token.to_hex(),
          msg.payload.0.len())
}
