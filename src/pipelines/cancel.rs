//! Run-level cancellation.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;

use crate::error::Error;

/// Exit code of a process stopped by a second interrupt.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Shared stop signal.
///
/// Clones share the same flag: cancelling one cancels them all.
/// Workers poll it, so stopping is prompt but not immediate.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    stop_requested: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Cancel on Ctrl-C. A second Ctrl-C exits right away.
    ///
    /// Can only be installed once per process.
    pub fn cancel_on_interrupt(&self) -> Result<(), Error> {
        let flag = self.clone();
        ctrlc::set_handler(move || {
            if flag.interrupt() {
                std::process::exit(INTERRUPTED_EXIT_CODE);
            }
        })
        .map_err(|e| Error::Custom(format!("could not install interrupt handler: {e}")))
    }

    /// Cancel, returning `true` if it was already cancelled.
    fn interrupt(&self) -> bool {
        let again = self.stop_requested.swap(true, Ordering::SeqCst);
        if !again {
            warn!("interrupted, finishing current documents (interrupt again to exit now)");
        }
        again
    }
}
