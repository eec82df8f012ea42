use core::fmt;
use std::io;

use coapspoof_msg::MessageToBytesError;

use crate::channel::ChannelError;
use crate::config::ConfigError;
use crate::frame::FrameError;

/// An error that ends a run
#[derive(Debug)]
pub enum Error {
  /// The configuration was rejected; nothing was sent
  Config(ConfigError),
  /// A message could not be serialized; nothing was sent
  Encode(MessageToBytesError),
  /// A serialized message could not be framed for a raw socket; nothing was sent
  Frame(FrameError),
  /// The channel could not be opened; nothing was sent
  Channel(ChannelError),
  /// A message could not be sent after others already were
  Send {
    /// Messages successfully sent before the failure
    sent: u64,
    /// What went wrong with the unsent message
    source: SendError,
  },
}

/// Why the send loop could not send a message
#[derive(Debug)]
pub enum SendError {
  /// The message could not be serialized
  Encode(MessageToBytesError),
  /// The serialized message could not be framed
  Frame(FrameError),
  /// The channel refused the message
  Io(io::Error),
}

impl fmt::Display for SendError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::Encode(e) => write!(f, "serializing message: {}", e),
      | Self::Frame(e) => write!(f, "framing message: {}", e),
      | Self::Io(e) => e.fmt(f),
    }
  }
}

impl std::error::Error for SendError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      | Self::Encode(e) => Some(e),
      | Self::Frame(e) => Some(e),
      | Self::Io(e) => Some(e),
    }
  }
}

impl From<MessageToBytesError> for SendError {
  fn from(e: MessageToBytesError) -> Self {
    Self::Encode(e)
  }
}

impl From<FrameError> for SendError {
  fn from(e: FrameError) -> Self {
    Self::Frame(e)
  }
}

impl From<io::Error> for SendError {
  fn from(e: io::Error) -> Self {
    Self::Io(e)
  }
}

impl Error {
  /// How many messages went out before this error, if any did
  pub fn sent(&self) -> Option<u64> {
    match self {
      | Self::Send { sent, .. } => Some(*sent),
      | _ => None,
    }
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::Config(e) => write!(f, "invalid configuration: {}", e),
      | Self::Encode(e) => write!(f, "serializing message: {}", e),
      | Self::Frame(e) => write!(f, "framing message: {}", e),
      | Self::Channel(e) => write!(f, "opening channel: {}", e),
      | Self::Send { sent, source } => write!(f, "send failed after {} messages: {}", sent, source),
    }
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      | Self::Config(e) => Some(e),
      | Self::Encode(e) => Some(e),
      | Self::Frame(e) => Some(e),
      | Self::Channel(e) => Some(e),
      | Self::Send { source, .. } => Some(source),
    }
  }
}

impl From<ConfigError> for Error {
  fn from(e: ConfigError) -> Self {
    Self::Config(e)
  }
}

impl From<MessageToBytesError> for Error {
  fn from(e: MessageToBytesError) -> Self {
    Self::Encode(e)
  }
}

impl From<FrameError> for Error {
  fn from(e: FrameError) -> Self {
    Self::Frame(e)
  }
}

impl From<ChannelError> for Error {
  fn from(e: ChannelError) -> Self {
    Self::Channel(e)
  }
}
