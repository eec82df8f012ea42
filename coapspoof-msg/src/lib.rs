//! Low-level representation of the CoAP messages crafted by `coapspoof`.
//!
//! The most notable item in `coapspoof_msg` is [`Message`];
//! a CoAP message very close to the actual byte layout, built once,
//! serialized with [`TryIntoBytes`] and thrown away.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |Ver| T |  TKL  |      Code     |          Message ID           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |   Token (if any, TKL bytes) ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |   Options (if any) ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |1 1 1 1 1 1 1 1|    Payload (if any) ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! ## Options
//! Options are written delta-encoded against the previous option's number,
//! so a [`Message`]'s options must be stored in strictly ascending order of
//! [`OptNumber`]. They are never re-sorted; a message whose options are out
//! of order fails to serialize with [`OptEncodeError::InvalidOptionValue`].
//!
//! Only the 0- and 1-byte extension tiers of the option header are implemented.
//! A delta or value length that would need the 2-byte tier is rejected with
//! [`OptEncodeError::UnsupportedOptionEncoding`] rather than mis-encoded.

#![cfg_attr(not(test), forbid(missing_debug_implementations, unreachable_pub))]
#![cfg_attr(not(test), deny(unsafe_code, missing_copy_implementations))]
#![deny(missing_docs)]

/// Message structs
pub mod msg;

#[doc(hidden)]
pub mod to_bytes;

#[doc(inline)]
pub use msg::*;
#[doc(inline)]
pub use to_bytes::{MessageToBytesError, TryIntoBytes};

#[cfg(test)]
pub(crate) fn test_msg() -> (Message, Vec<u8>) {
  //                        version  token len  code (2.05 Content)
  //                        |        |          /
  //                        |  type  |         /  message ID (1000)
  //                        |  |     |        |   |
  //                        vv vv vvvv vvvvvvvv vvvvvvvvvvvvvvvv
  let header: [u8; 4] = 0b_01_00_0100_01000101_0000001111101000_u32.to_be_bytes();
  let token: [u8; 4] = [0x05, 0x5B, 0x23, 0xFA];

  let host = b"127.0.0.1";
  let path = b"coap2http";
  let proxy = b"http://127.0.0.1:80";

  let options: [&[u8]; 6] = [&[0b_0011_1001u8],
                             host,
                             &[0b_1000_1001u8],
                             path,
                             &[0b_1101_1101u8, 24 - 13, 19 - 13],
                             proxy];
  let payload: [&[u8]; 2] = [&[0b1111_1111_u8], b"hello, world!"];

  let bytes = [header.as_ref(),
               token.as_ref(),
               options.concat().as_ref(),
               payload.concat().as_ref()].concat();

  let msg = Message { id: Id(1000),
                      ty: Type::Con,
                      ver: Version(1),
                      token: Token::from_u64(0x055B23FA),
                      code: Code { class: 2,
                                   detail: 5 },
                      opts: vec![Opt::new(OptNumber::URI_HOST, host.to_vec()),
                                 Opt::new(OptNumber::URI_PATH, path.to_vec()),
                                 Opt::new(OptNumber::PROXY_URI, proxy.to_vec())],
                      payload: Payload(b"hello, world!".to_vec()) };

  (msg, bytes)
}
