//! Cooperative cancellation support.
//!
//! Frame decoding is the only blocking operation in the pipeline, and the
//! extraction retry loop may issue up to thirty decodes per poster. This
//! module provides [`CancellationToken`] so callers (batch schedulers,
//! worker pools) can abort an in-flight extraction promptly. Cancellation
//! is checked at the top of every attempt; all candidate buffers are owned
//! values and are released on the cancellation path like any other exit.
//!
//! # Example
//!
//! ```
//! use postergen::CancellationToken;
//!
//! let token = CancellationToken::new();
//! assert!(!token.is_cancelled());
//!
//! // From another thread (or a signal handler, etc.):
//! token.cancel();
//! assert!(token.is_cancelled());
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to request
/// cancellation of the associated operation. The extraction loop checks
/// [`is_cancelled`](CancellationToken::is_cancelled) before each attempt
/// and returns [`PosterError::Cancelled`](crate::PosterError::Cancelled).
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
