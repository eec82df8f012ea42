//! The send loop: serialize, frame, transmit, repeat.

use std::io::{self, Write};

use coapspoof_msg::{Message, TryIntoBytes};

use crate::channel::Transmit;
use crate::config::SendPolicy;
use crate::frame::Framer;
use crate::interrupt::Interrupt;
use crate::logging::{msg_summary, TARGET};
use crate::{Error, SendError};

/// Where a [`SendLoop`] is in its lifecycle.
///
/// ```text
/// Idle -> Sending -> Stopped
///            |
///            +----> Cancelled
/// ```
///
/// `Stopped` and `Cancelled` are terminal; stepping a loop in either state does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
  /// Nothing sent yet
  Idle,
  /// At least one message went out
  Sending {
    /// Messages sent so far
    sent: u64,
  },
  /// The message count was reached, or the messages ran out
  Stopped(u64),
  /// An interrupt was observed
  Cancelled(u64),
}

/// How a [`SendLoop`] finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
  /// Finished on its own after sending this many messages
  Stopped(u64),
  /// Interrupted after sending this many messages
  Cancelled(u64),
}

impl Outcome {
  /// Number of messages sent
  pub fn sent(&self) -> u64 {
    match *self {
      | Self::Stopped(n) | Self::Cancelled(n) => n,
    }
  }
}

/// Drives messages from an iterator into a channel until the
/// [`SendPolicy`] is satisfied or an [`Interrupt`] trips.
///
/// ```
/// use coapspoof::channel::Transmit;
/// use coapspoof::config::{Config, SendPolicy};
/// use coapspoof::gen::Generator;
/// use coapspoof::interrupt::Never;
/// use coapspoof::send::{Outcome, SendLoop};
/// use rand::SeedableRng;
///
/// struct Count(usize);
/// impl Transmit for Count {
///   fn transmit(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
///     self.0 += 1;
///     Ok(bytes.len())
///   }
/// }
///
/// let mut config = Config::default();
/// config.policy.num_messages = Some(3);
/// let settings = config.validate().unwrap();
/// let messages = Generator::new(&settings, rand_chacha::ChaCha8Rng::seed_from_u64(1));
///
/// let outcome = SendLoop::new(Count(0), messages, None, settings.policy, Never).run();
/// assert_eq!(outcome.unwrap(), Outcome::Stopped(3));
/// ```
#[derive(Debug)]
pub struct SendLoop<T, M, I, D = io::Stdout> {
  channel: T,
  messages: M,
  framer: Option<Framer>,
  policy: SendPolicy,
  interrupt: I,
  debug: Option<D>,
  state: State,
}

impl<T, M, I> SendLoop<T, M, I>
  where T: Transmit,
        M: Iterator<Item = Message>,
        I: Interrupt
{
  /// Create an idle loop.
  ///
  /// When `framer` is present every serialized message is wrapped
  /// in UDP & IPv4 headers before transmission.
  pub fn new(channel: T, messages: M, framer: Option<Framer>, policy: SendPolicy, interrupt: I) -> Self {
    Self { channel,
           messages,
           framer,
           policy,
           interrupt,
           debug: None,
           state: State::Idle }
  }
}

impl<T, M, I, D> SendLoop<T, M, I, D>
  where T: Transmit,
        M: Iterator<Item = Message>,
        I: Interrupt,
        D: io::Write
{
  /// Write every message to `out` before sending it
  pub fn debug_to<W: io::Write>(self, out: W) -> SendLoop<T, M, I, W> {
    SendLoop { channel: self.channel,
               messages: self.messages,
               framer: self.framer,
               policy: self.policy,
               interrupt: self.interrupt,
               debug: Some(out),
               state: self.state }
  }

  /// Current state
  pub fn state(&self) -> State {
    self.state
  }

  #[cfg(test)]
  pub(crate) fn channel(&self) -> &T {
    &self.channel
  }

  fn encode(&self, msg: &Message) -> Result<Vec<u8>, SendError> {
    let bytes = msg.try_into_bytes()?;
    match &self.framer {
      | Some(framer) => Ok(framer.frame(&bytes)?),
      | None => Ok(bytes),
    }
  }

  fn finish(&mut self, state: State) -> Outcome {
    self.state = state;
    match state {
      | State::Cancelled(n) => {
        log::info!(target: TARGET, "interrupted after {} messages", n);
        Outcome::Cancelled(n)
      },
      | State::Stopped(n) | State::Sending { sent: n } => {
        log::info!(target: TARGET, "done after {} messages", n);
        Outcome::Stopped(n)
      },
      | State::Idle => {
        log::info!(target: TARGET, "done after 0 messages");
        Outcome::Stopped(0)
      },
    }
  }

  /// Send at most one message.
  ///
  /// Yields `Some` once the loop has reached a terminal state.
  pub fn step(&mut self) -> Result<Option<Outcome>, Error> {
    let sent = match self.state {
      | State::Idle => {
        log::info!(target: TARGET, "sending ({:?})", self.policy);
        0
      },
      | State::Sending { sent } => sent,
      | State::Stopped(n) => return Ok(Some(Outcome::Stopped(n))),
      | State::Cancelled(n) => return Ok(Some(Outcome::Cancelled(n))),
    };

    if matches!(self.policy, SendPolicy::Count(n) if sent >= n) {
      return Ok(Some(self.finish(State::Stopped(sent))));
    }

    if self.interrupt.interrupted() {
      return Ok(Some(self.finish(State::Cancelled(sent))));
    }

    let msg = match self.messages.next() {
      | Some(msg) => msg,
      | None => return Ok(Some(self.finish(State::Stopped(sent)))),
    };

    if let Some(out) = self.debug.as_mut() {
      writeln!(out, "{}", msg).ok();
    }

    let bytes = self.encode(&msg)
                    .map_err(|source| Error::Send { sent, source })?;

    self.channel
        .transmit(&bytes)
        .map_err(|e| Error::Send { sent,
                                   source: SendError::Io(e) })?;

    log::trace!(target: TARGET, "sent {} ({}b)", msg_summary(&msg), bytes.len());
    self.state = State::Sending { sent: sent + 1 };
    Ok(None)
  }

  /// [`SendLoop::step`] until finished
  pub fn run(mut self) -> Result<Outcome, Error> {
    loop {
      if let Some(outcome) = self.step()? {
        return Ok(outcome);
      }
    }
  }
}
