use std::fmt;
use std::sync::Arc;

use nightfall_protocol::{Envelope, PlayerId};

use crate::{Outbox, SessionError};

/// One logged-in player: identity plus the handle to their connection.
///
/// Cloning is cheap and shares the same outbox, so rooms keep their own
/// clones in the roster and send without going through the registry.
#[derive(Clone)]
pub struct Player {
    id: PlayerId,
    name: Arc<str>,
    outbox: Outbox,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<Arc<str>>, outbox: Outbox) -> Self {
        Self {
            id,
            name: name.into(),
            outbox,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues an envelope. Returns once it's in the outbox.
    pub async fn send(&self, envelope: &Envelope) -> Result<(), SessionError> {
        self.outbox.send(envelope.frame()?).await
    }

    /// Sends an envelope and waits until it has been written to the socket.
    pub async fn send_direct(&self, envelope: &Envelope) -> Result<(), SessionError> {
        self.outbox.send_direct(envelope.frame()?).await
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
