//! A single live backend session.
//!
//! Each [`Connection`] owns one dedicated driver session (never a driver
//! pool): checkout, liveness validation, and eviction are the pool's own
//! contract, so sessions must be individually owned and closable.

use crate::config::ConnectionSettings;
use crate::error::{OperationError, OperationResult};
use crate::models::BackendKind;
use sqlx::{Connection as _, MySqlConnection, PgConnection, SqliteConnection};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Backend-specific session handle.
pub(crate) enum Session {
    Postgres(PgConnection),
    MySql(MySqlConnection),
    Sqlite(SqliteConnection),
}

/// One live database session, owned by the pool or by a borrower's guard.
pub struct Connection {
    session: Session,
    backend: BackendKind,
    /// Logical name of the pool entry that owns this session.
    name: String,
}

impl Connection {
    /// Open a new session for the given settings, authenticating against
    /// the backend. Bounded by the configured connect timeout.
    pub(crate) async fn open(settings: &ConnectionSettings) -> OperationResult<Self> {
        let connect_timeout = settings.limits.connect_timeout_or_default();
        debug!(
            name = %settings.name,
            backend = %settings.backend,
            url = %settings.masked_connection_url(),
            "Opening connection"
        );

        let session = match settings.backend {
            BackendKind::Postgres => {
                match timeout(
                    connect_timeout,
                    PgConnection::connect(&settings.connection_url),
                )
                .await
                {
                    Ok(Ok(conn)) => Session::Postgres(conn),
                    Ok(Err(e)) => return Err(open_error(&settings.name, e)),
                    Err(_) => return Err(open_timeout(&settings.name, connect_timeout)),
                }
            }
            BackendKind::MySql => {
                match timeout(
                    connect_timeout,
                    MySqlConnection::connect(&settings.connection_url),
                )
                .await
                {
                    Ok(Ok(conn)) => Session::MySql(conn),
                    Ok(Err(e)) => return Err(open_error(&settings.name, e)),
                    Err(_) => return Err(open_timeout(&settings.name, connect_timeout)),
                }
            }
            BackendKind::Sqlite => {
                match timeout(
                    connect_timeout,
                    SqliteConnection::connect(&settings.connection_url),
                )
                .await
                {
                    Ok(Ok(conn)) => Session::Sqlite(conn),
                    Ok(Err(e)) => return Err(open_error(&settings.name, e)),
                    Err(_) => return Err(open_timeout(&settings.name, connect_timeout)),
                }
            }
        };

        debug!(name = %settings.name, backend = %settings.backend, "Connection opened");
        Ok(Self {
            session,
            backend: settings.backend,
            name: settings.name.clone(),
        })
    }

    /// Cheap liveness probe. A false result means the session must be
    /// discarded and replaced, never handed to a borrower.
    pub async fn ping(&mut self) -> bool {
        let result = match &mut self.session {
            Session::Postgres(conn) => conn.ping().await,
            Session::MySql(conn) => conn.ping().await,
            Session::Sqlite(conn) => conn.ping().await,
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(name = %self.name, error = %e, "Liveness probe failed");
                false
            }
        }
    }

    /// Close the session cleanly. Best-effort: failures are logged and
    /// never escalated, so cleanup cannot mask an operation outcome.
    pub async fn close(self) {
        let Self { session, name, .. } = self;
        let result = match session {
            Session::Postgres(conn) => conn.close().await,
            Session::MySql(conn) => conn.close().await,
            Session::Sqlite(conn) => conn.close().await,
        };
        if let Err(e) = result {
            warn!(name = %name, error = %e, "Error while closing the connection");
        }
    }

    /// The backend this session speaks to.
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Logical name of the owning pool entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

fn open_error(name: &str, err: sqlx::Error) -> OperationError {
    OperationError::connection_with(
        format!("Failed to open connection '{name}': {err}"),
        err,
    )
}

fn open_timeout(name: &str, after: std::time::Duration) -> OperationError {
    OperationError::connection(format!(
        "Timed out opening connection '{}' after {}s",
        name,
        after.as_secs()
    ))
}
