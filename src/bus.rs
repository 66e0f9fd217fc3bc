//! Shared system bus handle
//!
//! One connection per process, created lazily on the first `get()` and
//! reused by every caller until `close()`. Creation and teardown are
//! serialised by a mutex; once published the connection itself is used
//! concurrently without locking.

use std::sync::{Mutex, MutexGuard};
use zbus::Connection;

use crate::error::{LoginError, Result};

/// Opens and closes the underlying connection
pub trait Connector: Send + Sync {
    type Conn: Clone + Send;

    fn connect(&self) -> Result<Self::Conn>;

    fn disconnect(&self, conn: Self::Conn);
}

/// Connects to the system message bus
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConnector;

impl Connector for SystemConnector {
    type Conn = Connection;

    fn connect(&self) -> Result<Connection> {
        log::info!("Connecting to the system bus");
        zbus::block_on(Connection::system()).map_err(|e| {
            log::error!("Failed to connect to the system bus: {}", e);
            LoginError::BusUnavailable(e.to_string())
        })
    }

    fn disconnect(&self, conn: Connection) {
        log::info!("Disconnecting from the system bus");
        if let Err(e) = zbus::block_on(conn.close()) {
            log::debug!("Closing the system bus connection failed: {}", e);
        }
    }
}

/// Lazily-initialised, mutex-guarded connection slot
pub struct BusHandle<C: Connector = SystemConnector> {
    connector: C,
    slot: Mutex<Option<C::Conn>>,
}

impl<C: Connector> BusHandle<C> {
    pub const fn new(connector: C) -> Self {
        Self {
            connector,
            slot: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<C::Conn>> {
        // A panic while connecting leaves the slot empty, which is still valid
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the established connection, connecting on first use
    pub fn get(&self) -> Result<C::Conn> {
        let mut slot = self.lock();
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self.connector.connect()?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    /// Close and release the connection. No-op when not connected.
    pub fn close(&self) {
        let mut slot = self.lock();
        if let Some(conn) = slot.take() {
            self.connector.disconnect(conn);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_some()
    }
}

static SHARED: BusHandle = BusHandle::new(SystemConnector);

/// The process-wide handle used by the client library and the PAM module
pub fn shared() -> &'static BusHandle {
    &SHARED
}
