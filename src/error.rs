//! Error types for `gtd_board`.

use crate::registry::ConnectionId;

/// Errors that can occur in the board data core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A `SQLite` database error occurred.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A `MySQL` client or server error occurred.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql::Error),

    /// A connection id does not name any registered connection.
    #[error("unknown connection id: {0}")]
    UnknownConnection(ConnectionId),

    /// A connection id names a connection that has already been closed.
    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    /// A move was requested whose source and target connection are the same.
    #[error("task already lives on connection {0}; move rejected")]
    SameConnectionMove(ConnectionId),

    /// A move deleted the record from its source connection but failed to
    /// insert it into the target, leaving it absent from both.
    #[error(
        "task {uuid} was deleted from connection {from} but could not be \
         inserted into connection {to}: {source}"
    )]
    MoveInterrupted {
        /// Uuid of the record that is now absent from both connections.
        uuid: String,
        /// Connection the record was deleted from.
        from: ConnectionId,
        /// Connection the insert failed against.
        to: ConnectionId,
        /// The underlying insert failure.
        #[source]
        source: Box<Error>,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
