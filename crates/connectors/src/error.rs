use thiserror::Error;

/// All errors surfaced by the query-execution and load capabilities.
///
/// The split between transient and permanent variants is the contract the
/// extraction retry loop relies on: transient failures are re-issued up to
/// the configured attempt budget, permanent ones abort immediately.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The connection to the source was dropped mid-query.
    #[error("Connection dropped: {0}")]
    ConnectionDropped(String),

    /// The source did not answer within the configured timeout.
    #[error("Query timed out: {0}")]
    Timeout(String),

    /// Authentication or authorization was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The query text was rejected by the source.
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// The source schema does not match the declared configuration.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A connection string or descriptor could not be parsed.
    #[error("Invalid connection descriptor: {0}")]
    InvalidDescriptor(String),

    /// Writing to the load sink failed.
    #[error("Sink write failed: {0}")]
    Sink(String),

    /// Low-level I/O failure (file sinks).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected connector error: {0}")]
    Other(String),
}
