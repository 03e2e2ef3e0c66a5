use thiserror::Error;

/// Failure taxonomy for inventory API calls.
///
/// `Unauthorized` is fatal for the call and never retried; `Rejected` is
/// terminal for that request; `Transport` and retryable rejections are
/// absorbed by the dispatcher until its attempts run out, at which point
/// the last cause is surfaced wrapped in `RetriesExhausted`.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("unauthorized (401); re-run with --bearer or --basic-user/--basic-pass")]
    Unauthorized,

    #[error("inventory returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("transport failure talking to inventory: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("registration failed after {tries} attempts: {source}")]
    RetriesExhausted {
        tries: u32,
        #[source]
        source: Box<InventoryError>,
    },

    #[error("inventory API calls are disabled (offline mode)")]
    Offline,
}
