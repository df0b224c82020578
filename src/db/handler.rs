//! Connection pool management.
//!
//! Process-wide registry mapping a (connector, logical name) key to a set
//! of reusable sessions. Borrowing hands out an idle session after a
//! liveness check, or opens a fresh one; a per-key semaphore bounds the
//! total number of live sessions. Release is RAII: the guard returns the
//! session to the idle set on every exit path.

use crate::config::ConnectionSettings;
use crate::db::connection::Connection;
use crate::error::{OperationError, OperationResult};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};
use tracing::{debug, info, warn};

/// Pool key: connector id plus logical connection name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ConnectionKey {
    connector: String,
    name: String,
}

impl ConnectionKey {
    fn new(connector: &str, name: &str) -> Self {
        Self {
            connector: connector.to_string(),
            name: name.to_string(),
        }
    }
}

struct PoolEntry {
    settings: ConnectionSettings,
    /// Idle sessions available for reuse. Sync mutex so guard drop can
    /// return a session without an async context.
    idle: Mutex<Vec<Connection>>,
    /// Bounds live sessions (idle plus checked out) for this key.
    capacity: Arc<Semaphore>,
}

/// Registry of named connection pools, shared across all operations.
pub struct ConnectionHandler {
    entries: RwLock<HashMap<ConnectionKey, Arc<PoolEntry>>>,
}

impl ConnectionHandler {
    /// Create an empty handler.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Install settings for a key. Replacing an existing registration
    /// drains and closes its idle sessions; checked-out sessions finish
    /// their current operation and are dropped on return.
    pub async fn register(
        &self,
        connector: &str,
        settings: ConnectionSettings,
    ) {
        let key = ConnectionKey::new(connector, &settings.name);
        let backend = settings.backend;
        let max_live = settings.limits.max_live_or_default(backend);
        let entry = Arc::new(PoolEntry {
            settings,
            idle: Mutex::new(Vec::new()),
            capacity: Arc::new(Semaphore::new(max_live as usize)),
        });

        let replaced = {
            let mut entries = self.entries.write().await;
            entries.insert(key.clone(), entry)
        };

        info!(
            connector = %key.connector,
            name = %key.name,
            backend = %backend,
            max_live = max_live,
            replaced = replaced.is_some(),
            "Registered connection settings"
        );

        if let Some(old) = replaced {
            drain_and_close(&old).await;
        }
    }

    /// Borrow a live session for the key.
    ///
    /// Returns an idle session that passes its liveness probe, discarding
    /// and replacing dead ones, or opens a fresh session when the idle set
    /// is exhausted. Waits when the key is already at its live-session
    /// limit. The returned guard releases the session back to the pool
    /// when dropped.
    pub async fn borrow(&self, connector: &str, name: &str) -> OperationResult<ConnectionGuard> {
        let key = ConnectionKey::new(connector, name);
        let entry = {
            let entries = self.entries.read().await;
            entries.get(&key).cloned().ok_or_else(|| {
                OperationError::connection(format!(
                    "No connection settings registered under name '{name}'"
                ))
            })?
        };

        let permit = entry
            .capacity
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| {
                OperationError::connection(format!("Connection pool for '{name}' is shut down"))
            })?;

        let ping_on_borrow = entry.settings.limits.ping_on_borrow_or_default();
        loop {
            let candidate = entry.idle.lock().expect("idle set poisoned").pop();
            let Some(mut conn) = candidate else { break };

            if !ping_on_borrow || conn.ping().await {
                debug!(connector = %key.connector, name = %key.name, "Reusing pooled connection");
                return Ok(ConnectionGuard {
                    conn: Some(conn),
                    entry,
                    _permit: permit,
                });
            }

            warn!(connector = %key.connector, name = %key.name, "Discarding dead pooled connection");
            conn.close().await;
        }

        // Idle set exhausted; the permit already reserves our slot.
        let conn = Connection::open(&entry.settings).await?;
        Ok(ConnectionGuard {
            conn: Some(conn),
            entry,
            _permit: permit,
        })
    }

    /// Check whether settings are registered for the key.
    pub async fn is_registered(&self, connector: &str, name: &str) -> bool {
        let entries = self.entries.read().await;
        entries.contains_key(&ConnectionKey::new(connector, name))
    }

    /// Number of idle sessions currently pooled for the key.
    pub async fn idle_count(&self, connector: &str, name: &str) -> usize {
        let entries = self.entries.read().await;
        entries
            .get(&ConnectionKey::new(connector, name))
            .map(|entry| entry.idle.lock().expect("idle set poisoned").len())
            .unwrap_or(0)
    }

    /// Logical names registered for a connector.
    pub async fn registered_names(&self, connector: &str) -> Vec<String> {
        let entries = self.entries.read().await;
        entries
            .keys()
            .filter(|key| key.connector == connector)
            .map(|key| key.name.clone())
            .collect()
    }

    /// Drop all registrations and close every idle session. Sessions
    /// currently checked out are closed when their guards drop.
    pub async fn shutdown(&self) {
        let drained: Vec<Arc<PoolEntry>> = {
            let mut entries = self.entries.write().await;
            entries.drain().map(|(_, entry)| entry).collect()
        };
        for entry in &drained {
            drain_and_close(entry).await;
        }
        info!(count = drained.len(), "Connection pool shut down");
    }
}

impl Default for ConnectionHandler {
    fn default() -> Self {
        Self::new()
    }
}

async fn drain_and_close(entry: &PoolEntry) {
    // Closing the semaphore turns returning guards into closers: their
    // sessions are dropped instead of re-pooled.
    entry.capacity.close();
    let idle: Vec<Connection> = entry
        .idle
        .lock()
        .expect("idle set poisoned")
        .drain(..)
        .collect();
    for conn in idle {
        conn.close().await;
    }
}

/// Scoped checkout of one pooled session.
///
/// Dereferences to [`Connection`]. Dropping the guard returns the session
/// to the idle set and frees the capacity slot, on every exit path; the
/// session only becomes visible to other borrowers once the holder is
/// done with it. Use [`ConnectionGuard::discard`] to close the session
/// instead of pooling it.
pub struct ConnectionGuard {
    conn: Option<Connection>,
    entry: Arc<PoolEntry>,
    _permit: OwnedSemaphorePermit,
}

impl ConnectionGuard {
    /// Close the session instead of returning it to the pool.
    pub async fn discard(mut self) {
        if let Some(conn) = self.conn.take() {
            conn.close().await;
        }
    }
}

impl Deref for ConnectionGuard {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection already taken")
    }
}

impl DerefMut for ConnectionGuard {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection already taken")
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if self.entry.capacity.is_closed() {
            // Pool entry was shut down or replaced while we held the
            // session; let it drop rather than re-pooling into a dead set.
            debug!(name = %conn.name(), "Dropping session returned to a closed pool entry");
            return;
        }
        self.entry
            .idle
            .lock()
            .expect("idle set poisoned")
            .push(conn);
    }
}

impl std::fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("conn", &self.conn)
            .finish_non_exhaustive()
    }
}
