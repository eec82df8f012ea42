//! Produces the sequence of messages to send.

use core::iter;

use coapspoof_msg::{Code, Id, Message, Opt, OptNumber, Payload, Token, Type, Version,
                   RANDOM_TOKEN_LEN};
use rand::{Rng, RngCore};

use crate::config::Settings;

/// What token follows the previous message's token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPolicy {
  /// Every message carries the first message's token
  Reuse,
  /// Every message after the first carries a new random token
  Fresh,
}

impl Default for TokenPolicy {
  fn default() -> Self {
    Self::Reuse
  }
}

/// The parts of a message that stay the same from one send to the next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  /// Message type
  pub ty: Type,
  /// Message code
  pub code: Code,
  /// Uri-Host option value
  pub uri_host: String,
  /// Uri-Path option value
  pub uri_path: String,
  /// Proxy-Uri option value, without suffix
  pub proxy_uri: String,
  /// Message payload
  pub payload: Payload,
}

impl Template {
  /// Proxy-Uri as written into a message with this id & token
  ///
  /// ```
  /// use coapspoof::config::Config;
  /// use coapspoof_msg::{Id, Token};
  ///
  /// let mut config = Config::default();
  /// config.policy.flood = true;
  /// let template = config.validate().unwrap().template;
  ///
  /// assert_eq!(template.proxy_uri_for(Id(1000), &Token::from_u64(0x055B23FA), true),
  ///            "http://127.0.0.1:80/1000_055b23fa");
  /// assert_eq!(template.proxy_uri_for(Id(1000), &Token::from_u64(0x055B23FA), false),
  ///            "http://127.0.0.1:80");
  /// ```
  pub fn proxy_uri_for(&self, id: Id, token: &Token, suffix: bool) -> String {
    if suffix {
      format!("{}/{}_{}", self.proxy_uri, id.0, token.to_hex())
    } else {
      self.proxy_uri.clone()
    }
  }

  /// Build a message with this id & token.
  ///
  /// Options are Uri-Host, Uri-Path then Proxy-Uri; ascending by number.
  pub fn build(&self, id: Id, token: Token, suffix: bool) -> Message {
    let proxy_uri = self.proxy_uri_for(id, &token, suffix);

    Message { id,
              ty: self.ty,
              ver: Version::default(),
              code: self.code,
              opts: vec![Opt::new(OptNumber::URI_HOST, self.uri_host.as_bytes()),
                         Opt::new(OptNumber::URI_PATH, self.uri_path.as_bytes()),
                         Opt::new(OptNumber::PROXY_URI, proxy_uri)],
              payload: self.payload.clone(),
              token }
  }
}

/// An endless [`Iterator`] of messages.
///
/// The first message uses the supplied id & token (random when absent).
/// Each later message is derived from the one before it:
/// - the id increments, wrapping 65535 to 0
/// - the token is kept or regenerated per [`TokenPolicy`]
/// - Proxy-Uri is re-suffixed with the new id & token
///
/// When suffixing is off, every message is a copy of the first.
#[derive(Debug, Clone)]
pub struct Generator<R> {
  template: Template,
  first_id: Option<Id>,
  first_token: Option<Token>,
  suffix: bool,
  token_policy: TokenPolicy,
  prev: Option<(Id, Token)>,
  rng: R,
}

impl<R: RngCore> Generator<R> {
  /// Create a generator from validated settings
  pub fn new(settings: &Settings, rng: R) -> Self {
    Self { template: settings.template.clone(),
           first_id: settings.first_id,
           first_token: settings.token,
           suffix: settings.suffix_mid_tok,
           token_policy: settings.token_policy,
           prev: None,
           rng }
  }

  /// A message at least as long on the wire as any this generator will yield.
  ///
  /// Only Proxy-Uri varies in length between messages, through its
  /// `/{id}_{token}` suffix; this has the widest id and longest token
  /// the settings allow.
  pub fn longest(&self) -> Message {
    let token_len = match (self.first_token, self.token_policy) {
      | (None, _) => RANDOM_TOKEN_LEN,
      | (Some(t), TokenPolicy::Fresh) if self.suffix => t.len().max(RANDOM_TOKEN_LEN),
      | (Some(t), _) => t.len(),
    };
    let token = Token(iter::repeat(0xFF).take(token_len).collect());
    let id = if self.suffix { Id(Id::MAX) } else { self.first_id.unwrap_or(Id(0)) };

    self.template.build(id, token, self.suffix)
  }

  /// Id & token of the message after `prev`
  fn advance(&mut self, prev: Option<(Id, Token)>) -> (Id, Token) {
    match prev {
      | None => {
        let id = match self.first_id {
          | Some(id) => id,
          | None => Id(self.rng.gen()),
        };
        let token = match self.first_token.take() {
          | Some(token) => token,
          | None => Token::random(&mut self.rng),
        };
        (id, token)
      },
      | Some(frozen) if !self.suffix => frozen,
      | Some((id, token)) => {
        let token = match self.token_policy {
          | TokenPolicy::Reuse => token,
          | TokenPolicy::Fresh => Token::random(&mut self.rng),
        };
        (id.next(), token)
      },
    }
  }
}

impl<R: RngCore> Iterator for Generator<R> {
  type Item = Message;

  fn next(&mut self) -> Option<Message> {
    let prev = self.prev.take();
    let (id, token) = self.advance(prev);
    self.prev = Some((id, token));
    Some(self.template.build(id, token, self.suffix))
  }
}
