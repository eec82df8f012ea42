//! Cooperative cancellation of the send loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Asked once per loop iteration whether to stop
pub trait Interrupt {
  /// Has an interrupt been requested?
  fn interrupted(&self) -> bool;
}

/// Never interrupts
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl Interrupt for Never {
  fn interrupted(&self) -> bool {
    false
  }
}

/// Trips when the process receives `SIGINT` (Ctrl-C).
///
/// The handler only sets a flag; the send loop observes it between messages,
/// so a message is never cut off halfway.
#[derive(Debug, Clone)]
pub struct SigInt(Arc<AtomicBool>);

impl SigInt {
  /// Install a `SIGINT` handler that sets the flag.
  ///
  /// Fails if this process already installed one.
  pub fn install() -> Result<Self, ctrlc::Error> {
    let flag = Arc::new(AtomicBool::new(false));
    let set = Arc::clone(&flag);
    ctrlc::set_handler(move || set.store(true, Ordering::SeqCst))?;
    Ok(Self(flag))
  }
}

impl Interrupt for SigInt {
  fn interrupted(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}

impl<T: Interrupt> Interrupt for &T {
  fn interrupted(&self) -> bool {
    (*self).interrupted()
  }
}
