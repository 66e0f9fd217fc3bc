//! Process signal handling for the daemon
//!
//! - SIGTERM/SIGINT: leave the main loop and tear down
//! - SIGHUP: recreate the marker directories

use tokio::signal::unix::{signal, Signal, SignalKind};

/// Signals the daemon reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonSignal {
    /// Shutdown request (SIGTERM)
    Term,
    /// Interrupt (SIGINT, Ctrl+C)
    Int,
    /// Hangup (SIGHUP)
    Hup,
}

impl DaemonSignal {
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Term | Self::Int)
    }
}

pub struct SignalHandler {
    sigterm: Signal,
    sigint: Signal,
    sighup: Signal,
}

impl SignalHandler {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
            sighup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for the next signal
    pub async fn wait(&mut self) -> DaemonSignal {
        tokio::select! {
            _ = self.sigterm.recv() => DaemonSignal::Term,
            _ = self.sigint.recv() => DaemonSignal::Int,
            _ = self.sighup.recv() => DaemonSignal::Hup,
        }
    }
}
