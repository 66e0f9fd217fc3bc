//! Session Translation Daemon
//!
//! Owns `org.freedesktop.login1` on the system bus and answers its Manager
//! interface by asking ConsoleKit and UPower.
//!
//! Lifecycle:
//! - connect and export the Manager object
//! - subscribe to NameLost and to ConsoleKit's seat signals
//! - acquire the well-known name (losing it later is fatal)
//! - create the marker directories clients probe for
//! - forward seat signals until SIGTERM/SIGINT, name loss or the end of
//!   the seat subscriptions
//! - withdraw the object, release the name, close the bus

pub mod bridge;
pub mod dispatch;
pub mod interface;
pub mod markers;
pub mod signals;

pub use bridge::{InterfaceSink, SeatEvent, SeatSignals, SeatSink, SignalBridge};
pub use dispatch::Dispatcher;
pub use interface::LoginManagerInterface;
pub use markers::MarkerDirs;
pub use signals::{DaemonSignal, SignalHandler};

use std::path::PathBuf;
use std::sync::Arc;

use futures_lite::StreamExt;
use zbus::fdo::{self, RequestNameFlags, RequestNameReply};
use zbus::Connection;

use crate::backend::BusBackend;
use crate::bus::BusHandle;
use crate::error::LoginError;

pub const LOGIN1_NAME: &str = "org.freedesktop.login1";
pub const LOGIN1_PATH: &str = "/org/freedesktop/login1";

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("Bus error: {0}")]
    Bus(#[from] zbus::Error),

    #[error(transparent)]
    Login(#[from] LoginError),

    #[error("Could not acquire org.freedesktop.login1: {0}")]
    NameNotAcquired(String),

    #[error("Lost the bus name")]
    NameLost,

    #[error("Failed to create marker directories: {0}")]
    Markers(std::io::Error),

    #[error("Failed to install signal handlers: {0}")]
    Signals(std::io::Error),

    #[error("ConsoleKit seat signal bridge stopped")]
    BridgeStopped,

    #[error("Bus task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Daemon settings, filled from the command line
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub run_dir: PathBuf,
    pub prefix: String,
    /// Take the name over from a running owner and let others take it back
    pub replace: bool,
    /// Resolve GetSession arguments instead of echoing them
    pub strict_get_session: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            run_dir: PathBuf::from("/run"),
            prefix: "systemd".to_string(),
            replace: false,
            strict_get_session: false,
        }
    }
}

impl DaemonConfig {
    pub fn markers(&self) -> MarkerDirs {
        MarkerDirs::new(&self.run_dir, &self.prefix)
    }
}

/// Run the daemon until shutdown. The bus handle is closed on every exit
/// path once it was opened.
pub async fn run(config: DaemonConfig, bus: Arc<BusHandle>) -> Result<(), DaemonError> {
    let handle = Arc::clone(&bus);
    let conn = tokio::task::spawn_blocking(move || handle.get()).await??;

    let result = serve(&config, &conn).await;

    tokio::task::spawn_blocking(move || bus.close()).await?;
    result
}

async fn serve(config: &DaemonConfig, conn: &Connection) -> Result<(), DaemonError> {
    let backend = BusBackend::new(conn.clone());
    let iface = LoginManagerInterface::new(Dispatcher::new(
        backend.clone(),
        config.strict_get_session,
    ));
    conn.object_server().at(LOGIN1_PATH, iface).await?;

    let dbus = fdo::DBusProxy::new(conn).await?;
    let mut name_lost = dbus.receive_name_lost().await?;
    let seat_signals = SeatSignals::subscribe(conn).await?;

    let flags = if config.replace {
        RequestNameFlags::DoNotQueue
            | RequestNameFlags::ReplaceExisting
            | RequestNameFlags::AllowReplacement
    } else {
        RequestNameFlags::DoNotQueue.into()
    };
    match conn.request_name_with_flags(LOGIN1_NAME, flags).await? {
        RequestNameReply::PrimaryOwner | RequestNameReply::AlreadyOwner => {
            log::info!("Acquired {}", LOGIN1_NAME);
        }
        reply => return Err(DaemonError::NameNotAcquired(format!("{:?}", reply))),
    }

    let markers = config.markers();
    markers.create().map_err(DaemonError::Markers)?;

    let signal_bridge = SignalBridge::new(backend, InterfaceSink::new(conn.clone()));
    let mut bridge = tokio::spawn(async move { signal_bridge.run(seat_signals).await });

    let mut signals = SignalHandler::new().map_err(DaemonError::Signals)?;

    log::info!("Entering the main loop");
    let outcome = loop {
        tokio::select! {
            sig = signals.wait() => {
                if sig.is_shutdown() {
                    log::info!("Received {:?}, shutting down", sig);
                    break Ok(());
                }
                if let Err(e) = markers.create() {
                    log::warn!("Failed to recreate marker directories: {}", e);
                }
            }
            _ = wait_name_lost(&mut name_lost) => {
                log::error!("Lost the bus name");
                break Err(DaemonError::NameLost);
            }
            res = &mut bridge => {
                if let Err(e) = res {
                    log::error!("Seat signal bridge failed: {}", e);
                }
                break Err(DaemonError::BridgeStopped);
            }
        }
    };
    log::info!("Exited the main loop");

    bridge.abort();
    if let Err(e) = conn
        .object_server()
        .remove::<LoginManagerInterface<BusBackend>, _>(LOGIN1_PATH)
        .await
    {
        log::debug!("Removing {} failed: {}", LOGIN1_PATH, e);
    }
    if outcome.is_ok() {
        if let Err(e) = conn.release_name(LOGIN1_NAME).await {
            log::debug!("Releasing {} failed: {}", LOGIN1_NAME, e);
        }
    }

    outcome
}

async fn wait_name_lost(stream: &mut fdo::NameLostStream) {
    while let Some(signal) = stream.next().await {
        if let Ok(args) = signal.args() {
            if args.name().as_str() == LOGIN1_NAME {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert!(!config.replace);
        assert!(!config.strict_get_session);
        assert_eq!(
            config.markers().seats(),
            PathBuf::from("/run/systemd/seats")
        );
    }

    #[test]
    fn test_error_messages() {
        let err = DaemonError::NameNotAcquired("InQueue".into());
        assert_eq!(
            err.to_string(),
            "Could not acquire org.freedesktop.login1: InQueue"
        );
        assert_eq!(DaemonError::NameLost.to_string(), "Lost the bus name");
        assert_eq!(
            DaemonError::BridgeStopped.to_string(),
            "ConsoleKit seat signal bridge stopped"
        );
    }
}
