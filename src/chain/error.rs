use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("callback handler already set for {0}")]
    DuplicateCallbackHandler(String),

    #[error("no callback handler registered for module {0}")]
    UnknownCallbackModule(String),

    #[error("no callback {id} registered for module {module}")]
    UnknownCallback { module: String, id: String },

    #[error("expected callback {0}, but did not find it")]
    MissingCallback(String),

    #[error("negative height: {0}")]
    NegativeHeight(i64),

    #[error("proof verification failed: {0}")]
    ProofVerification(String),

    #[error("callback error: {0}")]
    Callback(String),

    /// Distinguished callback outcome: the response was handled and the
    /// callback re-issued the query, so the default deletion step must be
    /// suppressed. This is a success, not a failure.
    #[error("query succeeded and was re-issued")]
    SucceededNoDelete,

    #[error("unable to find data for id {0}")]
    DatapointNotFound(String),

    #[error("no data; query submitted")]
    NoData,

    #[error("stale data; query submitted")]
    StaleData,
}
