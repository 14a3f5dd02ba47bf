/// Per-domain fetch failures. These never abort a batch; the orchestrator
/// converts them into an Error record for the affected domain.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// TCP connect or TLS handshake did not complete within the time budget.
    #[error("connection to {domain}:{port} timed out after {timeout_secs}s")]
    Timeout {
        domain: String,
        port: u16,
        timeout_secs: u64,
    },

    /// DNS, connect or handshake failure, or the server presented no
    /// certificate. The reason is propagated verbatim into the record.
    #[error("{reason}")]
    Unreachable { reason: String },
}

/// Batch-level failures, fatal to the whole scan invocation.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The caller handed over an empty domain list; rejected before any
    /// network activity rather than silently scanning nothing.
    #[error("Scan: domain list is empty, nothing to check")]
    EmptyDomainList,

    /// The concurrency limiter was closed while admitting tasks.
    #[error("Scan: concurrency limiter closed: {0}")]
    Concurrency(#[from] tokio::sync::AcquireError),
}
