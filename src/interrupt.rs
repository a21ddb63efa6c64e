//! Ctrl-C handling.
//!
//! `InterruptGate` holds a single callback and installs one process-wide
//! SIGINT handler through `ctrlc`. The handler runs on its own thread, so
//! anything the callback touches must be `Send` and behind a lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

/// Exit status used after an interrupt has been handled.
pub const INTERRUPT_EXIT_CODE: i32 = 0;

/// Set once a gate has claimed the process-wide handler.
static HANDLER_INSTALLED: AtomicBool = AtomicBool::new(false);

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unregistered,
    Registered,
}

/// What a call to [`InterruptGate::fire`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// The callback ran.
    Callback,
    /// No callback was set; only a diagnostic was logged.
    NoCallback,
    /// An earlier call already handled the interrupt.
    AlreadyFired,
}

#[derive(Debug)]
pub enum GateError {
    /// Another gate already owns the handler in this process.
    AlreadyRegistered,
    /// The OS-level registration failed.
    Install(ctrlc::Error),
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateError::AlreadyRegistered => write!(f, "interrupt handler already registered"),
            GateError::Install(e) => write!(f, "failed to install interrupt handler: {}", e),
        }
    }
}

impl std::error::Error for GateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GateError::AlreadyRegistered => None,
            GateError::Install(e) => Some(e),
        }
    }
}

pub struct InterruptGate {
    callback: Mutex<Option<Callback>>,
    fired: AtomicBool,
    state: GateState,
}

impl Default for InterruptGate {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptGate {
    pub fn new() -> Self {
        Self {
            callback: Mutex::new(None),
            fired: AtomicBool::new(false),
            state: GateState::Unregistered,
        }
    }

    /// Sets the callback run on interrupt, replacing any previous one.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut slot = self
            .callback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(Box::new(callback));
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Registers the SIGINT handler. On interrupt the handler calls
    /// [`fire`](Self::fire) and exits with [`INTERRUPT_EXIT_CODE`].
    ///
    /// Only one gate per process can be installed.
    pub fn install(mut self) -> Result<Arc<Self>, GateError> {
        if HANDLER_INSTALLED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(GateError::AlreadyRegistered);
        }

        self.state = GateState::Registered;
        let gate = Arc::new(self);
        let handler_gate = Arc::clone(&gate);

        if let Err(e) = ctrlc::set_handler(move || {
            info!("Received interrupt signal");
            handler_gate.fire();
            std::process::exit(INTERRUPT_EXIT_CODE);
        }) {
            HANDLER_INSTALLED.store(false, Ordering::SeqCst);
            return Err(match e {
                ctrlc::Error::MultipleHandlers => GateError::AlreadyRegistered,
                other => GateError::Install(other),
            });
        }

        Ok(gate)
    }

    /// Runs the callback at most once across all calls.
    pub fn fire(&self) -> FireOutcome {
        if self.fired.swap(true, Ordering::SeqCst) {
            return FireOutcome::AlreadyFired;
        }

        let callback = self
            .callback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        match callback {
            Some(callback) => {
                callback();
                FireOutcome::Callback
            }
            None => {
                warn!("Interrupt received but no callback is registered, exiting");
                FireOutcome::NoCallback
            }
        }
    }
}
