use nightfall_protocol::FramingError;

/// Errors that can occur in the transport layer.
///
/// Every variant is fatal for the connection it happened on.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The peer broke the frame format (oversized, truncated).
    #[error(transparent)]
    Framing(#[from] FramingError),
}
