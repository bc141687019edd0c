//! Cooperative cancellation for long-running resolution work.
//!
//! The embedding host owns a [`CancellationToken`] and flips it from any
//! thread. Resolution code polls it through [`CancellationSignal`] at the
//! start of each unit of work and unwinds with [`Cancelled`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Returned when the host requested cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("analysis was cancelled")]
pub struct Cancelled;

/// Anything that can be polled for cancellation.
pub trait CancellationSignal: Send + Sync {
    fn check_cancelled(&self) -> Result<(), Cancelled>;
}

/// Shared, clonable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl CancellationSignal for CancellationToken {
    #[inline]
    fn check_cancelled(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A signal that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl CancellationSignal for NeverCancelled {
    #[inline]
    fn check_cancelled(&self) -> Result<(), Cancelled> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert_eq!(observer.check_cancelled(), Ok(()));
        token.cancel();
        assert!(observer.is_cancelled());
        assert_eq!(observer.check_cancelled(), Err(Cancelled));
    }

    #[test]
    fn cancelled_message() {
        assert_eq!(Cancelled.to_string(), "analysis was cancelled");
        assert_eq!(NeverCancelled.check_cancelled(), Ok(()));
    }
}
