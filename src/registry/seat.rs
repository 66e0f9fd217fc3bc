//! Seat enumeration and signal translation

use serde::{Deserialize, Serialize};
use zbus::zvariant::{ObjectPath, OwnedObjectPath, Type};

use crate::backend::Backend;
use crate::error::Result;

/// A seat in the login1 shape: `(so)` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct SeatEntry {
    pub id: String,
    pub path: OwnedObjectPath,
}

/// Enumerate all seats. Seats whose id cannot be read are skipped.
pub async fn list_seats<B: Backend>(backend: &B) -> Result<Vec<SeatEntry>> {
    let paths = backend.seats().await?;
    let mut seats = Vec::with_capacity(paths.len());

    for path in paths {
        match backend.seat_id(&path).await {
            Ok(id) => seats.push(SeatEntry { id, path }),
            Err(_) => log::debug!("Skipping seat {} without an id", path.as_str()),
        }
    }

    Ok(seats)
}

pub async fn resolve_seat_id<B: Backend>(backend: &B, path: &ObjectPath<'_>) -> Result<String> {
    backend.seat_id(path).await
}

/// Turn a `SeatAdded`/`SeatRemoved` payload into a seat entry.
/// Returns `None` when the seat has already gone away.
pub async fn translate_seat_signal<B: Backend>(
    backend: &B,
    path: OwnedObjectPath,
) -> Option<SeatEntry> {
    match backend.seat_id(&path).await {
        Ok(id) => Some(SeatEntry { id, path }),
        Err(_) => {
            log::info!("Dropping seat signal for {}", path.as_str());
            None
        }
    }
}
