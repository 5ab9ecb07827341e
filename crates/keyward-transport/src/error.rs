/// Errors that can occur in the transport layer.
///
/// These are network failures only. A response with a non-2xx status is
/// still a response and never shows up here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be delivered or no response arrived.
    #[error("network failure: {0}")]
    Network(String),

    /// The request was aborted before a response arrived.
    #[error("request aborted")]
    Aborted,

    /// The transport was shut down.
    #[error("transport shut down")]
    Shutdown,
}
