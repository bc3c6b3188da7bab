//! Per-connection outbound queue and the writer task that drains it.
//!
//! Every connection gets one bounded [`Outbox`]. Anything that wants to
//! reach the player (the dispatcher replying, a room broadcasting, the
//! event translator) pushes a pre-encoded frame into it; a single
//! [`deliver`] task pops frames and writes them to the socket in order.
//!
//! ```text
//!  dispatcher ─┐
//!  room ───────┼──▶ Outbox (bounded mpsc) ──▶ deliver() ──▶ socket
//!  translator ─┘           │                      │
//!                          └──── ack (oneshot) ◀───┘  direct sends only
//! ```
//!
//! Two send flavors:
//!
//! - [`Outbox::send`]: returns once the frame is *queued*.
//! - [`Outbox::send_direct`]: returns once the frame has been *written* to
//!   the socket. The writer fires a oneshot acknowledgement after the write.
//!
//! Both are bounded by the configured send timeout, so a stalled client can
//! delay its own replies but never wedges the sender for long.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use nightfall_transport::Connection;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use crate::SessionError;

/// One queued frame plus an optional write acknowledgement.
#[derive(Debug)]
pub struct Outbound {
    frame: Bytes,
    ack: Option<oneshot::Sender<()>>,
}

impl Outbound {
    pub fn frame(&self) -> &Bytes {
        &self.frame
    }

    /// Signals a direct sender that the frame is on the socket.
    pub fn acknowledge(self) {
        if let Some(ack) = self.ack {
            // The sender may have timed out and stopped listening.
            let _ = ack.send(());
        }
    }
}

/// Sending half of a connection's queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<Outbound>,
    send_timeout: Duration,
}

/// Receiving half, owned by the writer task.
#[derive(Debug)]
pub struct OutboxReceiver {
    rx: mpsc::Receiver<Outbound>,
}

impl Outbox {
    /// Creates a queue holding at most `capacity` frames.
    pub fn channel(capacity: usize, send_timeout: Duration) -> (Self, OutboxReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, send_timeout }, OutboxReceiver { rx })
    }

    /// Queues a frame for delivery.
    ///
    /// Waits up to the send timeout for queue space.
    pub async fn send(&self, frame: Bytes) -> Result<(), SessionError> {
        self.enqueue(Outbound { frame, ack: None }).await
    }

    /// Queues a frame and waits until the writer has put it on the socket.
    ///
    /// The whole operation (queueing plus write) shares one send timeout.
    pub async fn send_direct(&self, frame: Bytes) -> Result<(), SessionError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let outbound = Outbound {
            frame,
            ack: Some(ack_tx),
        };

        let attempt = async {
            self.enqueue_untimed(outbound).await?;
            // The writer drops the sender without firing it if the write
            // failed or the task ended.
            ack_rx.await.map_err(|_| SessionError::OutboxClosed)
        };

        timeout(self.send_timeout, attempt)
            .await
            .map_err(|_| SessionError::SendTimeout(self.send_timeout))?
    }

    /// `true` once the writer task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn enqueue(&self, outbound: Outbound) -> Result<(), SessionError> {
        // Fast path: room in the queue.
        let outbound = match self.tx.try_send(outbound) {
            Ok(()) => return Ok(()),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                return Err(SessionError::OutboxClosed);
            }
            Err(mpsc::error::TrySendError::Full(outbound)) => outbound,
        };

        timeout(self.send_timeout, self.enqueue_untimed(outbound))
            .await
            .map_err(|_| SessionError::SendTimeout(self.send_timeout))?
    }

    async fn enqueue_untimed(&self, outbound: Outbound) -> Result<(), SessionError> {
        self.tx
            .send(outbound)
            .await
            .map_err(|_| SessionError::OutboxClosed)
    }
}

impl OutboxReceiver {
    /// Next queued frame, or `None` once every [`Outbox`] clone is dropped.
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.rx.recv().await
    }
}

/// Writer loop: drains the outbox onto the connection until either side
/// goes away.
///
/// Stops on the first write error; the reader side notices the broken
/// socket on its own and runs teardown. Pending direct sends see their
/// acknowledgement dropped and fail with [`SessionError::OutboxClosed`].
pub async fn deliver<C: Connection>(mut outbox: OutboxReceiver, conn: Arc<C>) {
    while let Some(outbound) = outbox.recv().await {
        if let Err(e) = conn.send(outbound.frame()).await {
            tracing::debug!(
                conn = %conn.id(),
                error = %e,
                "write failed, stopping writer"
            );
            break;
        }
        outbound.acknowledge();
    }
    tracing::debug!(conn = %conn.id(), "writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_queues_in_order() {
        let (outbox, mut rx) = Outbox::channel(4, Duration::from_secs(1));
        outbox.send(Bytes::from_static(b"one")).await.unwrap();
        outbox.send(Bytes::from_static(b"two")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().frame, Bytes::from_static(b"one"));
        assert_eq!(rx.recv().await.unwrap().frame, Bytes::from_static(b"two"));
    }

    #[tokio::test]
    async fn test_send_direct_waits_for_ack() {
        let (outbox, mut rx) = Outbox::channel(4, Duration::from_secs(1));

        let writer = tokio::spawn(async move {
            let outbound = rx.recv().await.unwrap();
            outbound.ack.unwrap().send(()).unwrap();
        });

        outbox
            .send_direct(Bytes::from_static(b"hello"))
            .await
            .expect("ack should arrive");
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_direct_times_out_without_writer_progress() {
        // Receiver is alive but never drains: the ack never fires.
        let (outbox, _rx) = Outbox::channel(4, Duration::from_millis(50));
        let result = outbox.send_direct(Bytes::from_static(b"stuck")).await;
        assert!(matches!(result, Err(SessionError::SendTimeout(_))));
    }

    #[tokio::test]
    async fn test_send_times_out_when_full() {
        let (outbox, _rx) = Outbox::channel(1, Duration::from_millis(50));
        outbox.send(Bytes::from_static(b"a")).await.unwrap();
        let result = outbox.send(Bytes::from_static(b"b")).await;
        assert!(matches!(result, Err(SessionError::SendTimeout(_))));
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_is_closed() {
        let (outbox, rx) = Outbox::channel(4, Duration::from_secs(1));
        drop(rx);
        assert!(outbox.is_closed());
        assert!(matches!(
            outbox.send(Bytes::from_static(b"x")).await,
            Err(SessionError::OutboxClosed)
        ));
    }

    #[tokio::test]
    async fn test_dropped_ack_is_closed() {
        let (outbox, mut rx) = Outbox::channel(4, Duration::from_secs(1));
        tokio::spawn(async move {
            // Take the frame, then drop the ack without firing it.
            let _ = rx.recv().await;
        });
        assert!(matches!(
            outbox.send_direct(Bytes::from_static(b"x")).await,
            Err(SessionError::OutboxClosed)
        ));
    }
}
