//! Per-connection handler: login gate, error accounting and teardown.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task draining the connection's outbox. The flow is:
//!   1. Receive frames one at a time, in order
//!   2. Until LOGIN succeeds, answer everything else with an ERROR
//!   3. After login, hand each message to the dispatcher
//!   4. On exit, take the player out of their room and the registry

use std::sync::Arc;

use nightfall_protocol::{
    ActionResult, Envelope, ErrorMessage, InboundMessage, Login, LoginSuccess, MessageKind,
    PlayerId, PlayerLeft, WireCodec,
};
use nightfall_room::GameEngine;
use nightfall_session::{Outbox, Player, deliver};
use nightfall_transport::{Connection, ConnectionId, TcpConnection};

use crate::dispatch::dispatch;
use crate::server::ServerState;
use crate::{ErrorCategory, NightfallError};

/// Drop guard that tears down a logged-in player when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async locks.
struct SessionGuard<E: GameEngine> {
    player_id: PlayerId,
    state: Arc<ServerState<E>>,
}

impl<E: GameEngine> Drop for SessionGuard<E> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            teardown(&state, player_id).await;
        });
    }
}

/// Per-connection state owned by the reader task.
struct ConnectionContext<E: GameEngine> {
    conn_id: ConnectionId,
    outbox: Outbox,
    player: Option<Player>,
    /// Set once logged in; dropping it runs teardown.
    _session: Option<SessionGuard<E>>,
    consecutive_errors: u32,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<E: GameEngine>(
    conn: TcpConnection,
    state: Arc<ServerState<E>>,
) -> Result<(), NightfallError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::info!(%conn_id, peer = %conn.peer_addr(), "connection accepted");

    let session = &state.config.session;
    let (outbox, outbox_rx) = Outbox::channel(session.outbox_capacity, session.send_timeout);
    let mut writer = tokio::spawn(deliver(outbox_rx, Arc::clone(&conn)));

    let mut ctx = ConnectionContext {
        conn_id,
        outbox,
        player: None,
        _session: None,
        consecutive_errors: 0,
    };
    let result = read_loop(&conn, &state, &mut ctx).await;

    // The session guard drops with ctx → teardown fires. The writer ends
    // once rooms and the registry let go of the player's outbox too.
    drop(ctx);
    if tokio::time::timeout(session.send_timeout, &mut writer)
        .await
        .is_err()
    {
        writer.abort();
    }
    let _ = conn.close().await;

    match &result {
        Ok(()) => tracing::info!(%conn_id, "connection closed"),
        Err(e) => tracing::info!(%conn_id, error = %e, "connection dropped"),
    }
    result
}

async fn read_loop<E: GameEngine>(
    conn: &TcpConnection,
    state: &Arc<ServerState<E>>,
    ctx: &mut ConnectionContext<E>,
) -> Result<(), NightfallError> {
    loop {
        // Framing and socket errors end the connection.
        let Some(body) = conn.recv().await? else {
            return Ok(());
        };
        let envelope = WireCodec::decode_body(&body)?;
        tracing::debug!(conn_id = %ctx.conn_id, kind = %envelope.kind(), "message received");

        match process(state, ctx, &envelope).await {
            Ok(()) => ctx.consecutive_errors = 0,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) if e.category() == ErrorCategory::RaceBenign => {
                tracing::debug!(conn_id = %ctx.conn_id, error = %e, "ignoring lost race");
                ctx.consecutive_errors = 0;
            }
            Err(e) => {
                tracing::debug!(
                    conn_id = %ctx.conn_id,
                    kind = %envelope.kind(),
                    error = %e,
                    "request failed"
                );
                reply_error(ctx, envelope.kind(), &e).await?;

                ctx.consecutive_errors += 1;
                if ctx.consecutive_errors >= state.config.error_threshold {
                    tracing::warn!(
                        conn_id = %ctx.conn_id,
                        errors = ctx.consecutive_errors,
                        "error threshold reached, closing connection"
                    );
                    return Ok(());
                }
            }
        }
    }
}

/// Login gate, then dispatch.
async fn process<E: GameEngine>(
    state: &Arc<ServerState<E>>,
    ctx: &mut ConnectionContext<E>,
    envelope: &Envelope,
) -> Result<(), NightfallError> {
    let Some(player) = ctx.player.clone() else {
        if *envelope.kind() != MessageKind::Login {
            return Err(NightfallError::NotLoggedIn);
        }
        let request: Login = envelope.decode_payload()?;
        return login(state, ctx, request).await;
    };

    let message = InboundMessage::parse(envelope)?;
    dispatch(state, &player, message).await
}

async fn login<E: GameEngine>(
    state: &Arc<ServerState<E>>,
    ctx: &mut ConnectionContext<E>,
    request: Login,
) -> Result<(), NightfallError> {
    let username = state.config.session.validate_username(&request.username)?;
    let player = Player::new(PlayerId::generate(), username, ctx.outbox.clone());
    let player_id = player.id();

    state.players.write().await.register(player.clone())?;
    ctx._session = Some(SessionGuard {
        player_id,
        state: Arc::clone(state),
    });
    ctx.player = Some(player.clone());
    tracing::info!(conn_id = %ctx.conn_id, %player_id, username = player.name(), "player logged in");

    player
        .send_direct(&Envelope::new(&LoginSuccess { player_id })?)
        .await?;
    Ok(())
}

/// Tells the client why its request failed.
///
/// Skill and phase requests get an ACTION_RESULT with `success = false`;
/// everything else gets an ERROR.
async fn reply_error<E: GameEngine>(
    ctx: &ConnectionContext<E>,
    kind: &MessageKind,
    error: &NightfallError,
) -> Result<(), NightfallError> {
    let envelope = match kind {
        MessageKind::PerformAction | MessageKind::EndPhase => {
            Envelope::new(&ActionResult::rejected(error.to_string()))?
        }
        _ => Envelope::new(&ErrorMessage::new(error.to_string()))?,
    };
    ctx.outbox.send_direct(envelope.frame()?).await?;
    Ok(())
}

/// Removes a player from their room (telling the others) and from the
/// registry. Safe to call for a player that is already gone.
async fn teardown<E: GameEngine>(state: &ServerState<E>, player_id: PlayerId) {
    let (entry, room) = {
        let mut players = state.players.write().await;
        let Some(entry) = players.remove(&player_id) else {
            return;
        };
        let room = match &entry.room {
            Some(room_id) => state.rooms.read().await.get(room_id),
            None => None,
        };
        (entry, room)
    };

    if let Some(room) = room {
        match room.remove_player(player_id).await {
            Ok(()) => match Envelope::new(&PlayerLeft { player_id }) {
                Ok(envelope) => room.broadcast(&envelope).await,
                Err(e) => tracing::warn!(%player_id, error = %e, "failed to build PLAYER_LEFT"),
            },
            Err(e) => tracing::debug!(%player_id, error = %e, "player was not in their room"),
        }
    }

    tracing::info!(%player_id, username = entry.player.name(), "player logged out");
}
