//! Re-emits ConsoleKit seat signals as login1 signals

use std::future::Future;

use futures_lite::stream::{Boxed, StreamExt};
use zbus::object_server::SignalEmitter;
use zbus::zvariant::OwnedObjectPath;
use zbus::Connection;

use super::interface::LoginManagerInterface;
use super::LOGIN1_PATH;
use crate::backend::proxy::CkManagerProxy;
use crate::backend::{Backend, BusBackend};
use crate::registry::{translate_seat_signal, SeatEntry};

/// A translated seat lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatEvent {
    New(SeatEntry),
    Removed(SeatEntry),
}

/// Raw ConsoleKit payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatChange {
    Added,
    Removed,
}

/// Where translated events go
pub trait SeatSink: Send + Sync {
    fn emit(&self, event: &SeatEvent) -> impl Future<Output = zbus::Result<()>> + Send;
}

/// Emits on the login1 manager object
pub struct InterfaceSink {
    conn: Connection,
}

impl InterfaceSink {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl SeatSink for InterfaceSink {
    async fn emit(&self, event: &SeatEvent) -> zbus::Result<()> {
        let emitter = SignalEmitter::new(&self.conn, LOGIN1_PATH)?;
        match event {
            SeatEvent::New(seat) => {
                LoginManagerInterface::<BusBackend>::emit_seat_new(&emitter, seat).await
            }
            SeatEvent::Removed(seat) => {
                LoginManagerInterface::<BusBackend>::emit_seat_removed(&emitter, seat).await
            }
        }
    }
}

pub struct SignalBridge<B, S> {
    backend: B,
    sink: S,
}

impl<B: Backend, S: SeatSink> SignalBridge<B, S> {
    pub fn new(backend: B, sink: S) -> Self {
        Self { backend, sink }
    }

    /// Translate one ConsoleKit signal and emit it. Seats whose id can no
    /// longer be read are dropped.
    pub async fn forward(&self, change: SeatChange, path: OwnedObjectPath) {
        let Some(seat) = translate_seat_signal(&self.backend, path).await else {
            return;
        };

        log::info!("Seat {:?}: {} at {}", change, seat.id, seat.path.as_str());
        let event = match change {
            SeatChange::Added => SeatEvent::New(seat),
            SeatChange::Removed => SeatEvent::Removed(seat),
        };

        if let Err(e) = self.sink.emit(&event).await {
            log::warn!("Failed to emit {:?}: {}", event, e);
        }
    }

    /// Forward seat signals until both subscriptions end
    pub async fn run(&self, signals: SeatSignals) {
        let SeatSignals {
            mut added,
            mut removed,
        } = signals;

        loop {
            let (change, seat) = tokio::select! {
                Some(seat) = added.next() => (SeatChange::Added, seat),
                Some(seat) = removed.next() => (SeatChange::Removed, seat),
                else => break,
            };

            match seat {
                Ok(path) => self.forward(change, path).await,
                Err(e) => log::warn!("Malformed ConsoleKit seat signal: {}", e),
            }
        }

        log::warn!("ConsoleKit seat signal streams ended");
    }
}

/// Seat paths carried by one ConsoleKit signal
pub type SeatPaths = Boxed<zbus::Result<OwnedObjectPath>>;

/// Live subscriptions to ConsoleKit's SeatAdded and SeatRemoved
pub struct SeatSignals {
    pub added: SeatPaths,
    pub removed: SeatPaths,
}

impl SeatSignals {
    /// Subscribe to both signals. Either subscription failing is an error.
    pub async fn subscribe(conn: &Connection) -> zbus::Result<Self> {
        let manager = CkManagerProxy::new(conn).await?;
        let added = manager
            .receive_seat_added()
            .await?
            .map(|signal| signal.args().map(|args| args.seat().clone()))
            .boxed();
        let removed = manager
            .receive_seat_removed()
            .await?
            .map(|signal| signal.args().map(|args| args.seat().clone()))
            .boxed();
        log::info!("Subscribed to ConsoleKit seat signals");

        Ok(Self { added, removed })
    }
}
