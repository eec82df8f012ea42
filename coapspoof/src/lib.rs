//! `coapspoof` crafts CoAP requests aimed at a CoAP-to-HTTP proxy and
//! sends them, optionally from a spoofed source address.
//!
//! A run looks like this:
//! 1. a [`Config`](config::Config) is validated into [`Settings`](config::Settings)
//! 2. a [`Generator`](gen::Generator) produces the message sequence; each message
//!    carries Uri-Host, Uri-Path and a Proxy-Uri suffixed with `/{message_id}_{token}`
//! 3. the longest message the generator can produce is serialized (and framed)
//!    once up front, so a message that cannot be encoded is reported before
//!    anything goes out
//! 4. a [`Channel`](channel::Channel) is opened:
//!    - `loopback`: a UDP socket bound to the source address
//!    - `raw`: a raw IPv4 socket; messages are wrapped in hand-built UDP & IPv4
//!      headers (see [`frame`]) so the source address can be anything
//!    - either of the above under a PSK-authenticated DTLS session
//! 5. a [`SendLoop`](send::SendLoop) sends until the count is reached or `SIGINT` arrives
//!
//! ```no_run
//! use coapspoof::config::Config;
//! use coapspoof::interrupt::SigInt;
//!
//! let mut config = Config::default();
//! config.policy.num_messages = Some(10);
//!
//! let result = coapspoof::run(&config, SigInt::install().unwrap());
//! let status = coapspoof::report(&result, &mut std::io::stdout()).unwrap();
//! std::process::exit(status.into());
//! ```

#![doc(html_root_url = "https://docs.rs/coapspoof/0.1.0")]
#![cfg_attr(not(test), forbid(missing_debug_implementations, unreachable_pub))]
#![cfg_attr(not(test), deny(unsafe_code, missing_copy_implementations))]
#![deny(missing_docs)]

use std::io::{self, Write};

use coapspoof_msg::{Message, TryIntoBytes};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Sockets messages are sent through
pub mod channel;

/// Runtime configuration
pub mod config;

mod error;
pub use error::*;

pub mod frame;

pub mod gen;

pub mod interrupt;

/// Logging helpers
pub mod logging;

pub mod send;


use channel::Channel;
use config::Config;
use frame::Framer;
use gen::Generator;
use interrupt::Interrupt;
use logging::TARGET;
use send::{Outcome, SendLoop};

/// Serialize and frame `msg` as the send loop would, yielding its size on the wire
fn preflight(msg: &Message, framer: Option<&Framer>) -> Result<usize, Error> {
  let bytes = msg.try_into_bytes()?;
  match framer {
    | Some(framer) => Ok(framer.frame(&bytes)?.len()),
    | None => Ok(bytes.len()),
  }
}

/// Validate `config`, open a channel and send until finished or `interrupt` trips.
///
/// Nothing is sent (and no socket opened) if the configuration is invalid
/// or any message the run could produce cannot be serialized & framed.
pub fn run(config: &Config, interrupt: impl Interrupt) -> Result<Outcome, Error> {
  let settings = config.validate()?;

  let framer = if settings.frames_messages() {
    Some(Framer::new(settings.net.src(),
                     settings.net.dst(),
                     settings.transport.byte_order))
  } else {
    None
  };

  let messages = Generator::new(&settings, ChaCha8Rng::from_entropy());
  let size = preflight(&messages.longest(), framer.as_ref())?;
  log::debug!(target: TARGET, "messages are at most {} bytes", size);

  let channel = Channel::open(&settings)?;
  log::info!(target: TARGET,
             "{} -> {} over {}",
             settings.net.src(),
             settings.net.dst(),
             channel.kind());

  let send = SendLoop::new(channel, messages, framer, settings.policy, interrupt);
  if settings.debug {
    send.debug_to(io::stdout()).run()
  } else {
    send.run()
  }
}

/// Write the `Sent N` summary of a finished run to `out`, yielding the process exit status.
///
/// Runs that stopped or were interrupted exit with 0. Failed runs exit with 1,
/// and print the count too when some messages had already gone out.
pub fn report(result: &Result<Outcome, Error>, out: &mut impl io::Write) -> io::Result<u8> {
  match result {
    | Ok(outcome) => {
      writeln!(out, "Sent {}", outcome.sent())?;
      Ok(0)
    },
    | Err(e) => {
      if let Some(n) = e.sent() {
        writeln!(out, "Sent {}", n)?;
      }
      Ok(1)
    },
  }
}
