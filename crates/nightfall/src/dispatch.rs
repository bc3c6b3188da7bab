//! Routes an authenticated player's messages to the room layer.
//!
//! Every handler validates first and replies after: locks are taken in
//! registry order (players → rooms → room) and released before any
//! direct reply is awaited.

use std::sync::Arc;

use nightfall_protocol::{
    ActionResult, CreateRoom, Envelope, InboundMessage, JoinRoom, PerformAction, PlayerJoined,
    PlayerLeft, PlayerReady, RoomCreated, RoomJoined,
};
use nightfall_room::{GameEngine, Room, RoomError, RoomState};
use nightfall_session::{Player, PlayerRegistry};

use crate::NightfallError;
use crate::server::ServerState;

/// Handles one message from a logged-in player.
pub(crate) async fn dispatch<E: GameEngine>(
    state: &ServerState<E>,
    player: &Player,
    message: InboundMessage,
) -> Result<(), NightfallError> {
    match message {
        InboundMessage::Login(_) => Err(NightfallError::AlreadyLoggedIn),
        InboundMessage::CreateRoom(request) => create_room(state, player, request).await,
        InboundMessage::JoinRoom(request) => join_room(state, player, request).await,
        InboundMessage::Ready => ready(state, player).await,
        InboundMessage::PerformAction(request) => perform_action(state, player, request).await,
        InboundMessage::EndPhase => end_phase(state, player).await,
    }
}

/// Creates a room and seats its creator in it.
async fn create_room<E: GameEngine>(
    state: &ServerState<E>,
    player: &Player,
    request: CreateRoom,
) -> Result<(), NightfallError> {
    let (room, members, previous) = {
        let mut players = state.players.write().await;
        let previous = finished_room(state, &players, player).await?;
        let room = state
            .rooms
            .write()
            .await
            .create(&request.room_name, request.roles)?;
        let members = room.add_player(player.clone()).await?;
        players.set_room(&player.id(), Some(room.id().clone()))?;
        leave(previous.as_ref(), player).await;
        (room, members, previous)
    };

    let room_id = room.id().clone();
    player
        .send_direct(&Envelope::new(&RoomCreated {
            room_id: room_id.clone(),
        })?)
        .await?;
    player
        .send_direct(&Envelope::new(&RoomJoined {
            room_id,
            players: members,
        })?)
        .await?;
    announce_departure(previous, player).await;
    Ok(())
}

/// Seats a player in an existing room and tells everyone else.
async fn join_room<E: GameEngine>(
    state: &ServerState<E>,
    player: &Player,
    request: JoinRoom,
) -> Result<(), NightfallError> {
    let (room, members, previous) = {
        let mut players = state.players.write().await;
        let previous = finished_room(state, &players, player).await?;
        let room = state.rooms.read().await.require(&request.room_id)?;
        let members = room.add_player(player.clone()).await?;
        players.set_room(&player.id(), Some(room.id().clone()))?;
        leave(previous.as_ref(), player).await;
        (room, members, previous)
    };
    tracing::info!(room_id = %room.id(), player_id = %player.id(), "player joined room");

    let joined = members.iter().find(|info| info.id == player.id()).cloned();
    player
        .send_direct(&Envelope::new(&RoomJoined {
            room_id: room.id().clone(),
            players: members,
        })?)
        .await?;

    if let Some(info) = joined {
        room.broadcast_except(&Envelope::new(&PlayerJoined { player: info })?, player.id())
            .await;
    }
    announce_departure(previous, player).await;
    Ok(())
}

/// Toggles readiness, and starts the game if this made the room ready.
async fn ready<E: GameEngine>(state: &ServerState<E>, player: &Player) -> Result<(), NightfallError> {
    let room = current_room(state, player).await?;
    let outcome = room.toggle_ready(player.id()).await?;
    room.broadcast(&Envelope::new(&PlayerReady {
        player_id: player.id(),
        is_ready: outcome.is_ready,
    })?)
    .await;

    if outcome.can_start {
        match room.start().await {
            Ok(()) => {}
            Err(RoomError::AlreadyStarted(_)) => {
                tracing::debug!(room_id = %room.id(), "game already started by another player");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn perform_action<E: GameEngine>(
    state: &ServerState<E>,
    player: &Player,
    request: PerformAction,
) -> Result<(), NightfallError> {
    let room = current_room(state, player).await?;
    let outcome = room
        .submit_skill(player.id(), request.skill_type, request.target_id)
        .await?;

    let mut result = ActionResult::ok(outcome.receipt.message);
    result.data = outcome.receipt.detail;
    player.send_direct(&Envelope::new(&result)?).await?;
    room.broadcast(&outcome.state).await;
    Ok(())
}

async fn end_phase<E: GameEngine>(
    state: &ServerState<E>,
    player: &Player,
) -> Result<(), NightfallError> {
    let room = current_room(state, player).await?;
    // Holding `ended` keeps the room's PHASE_CHANGED behind this reply.
    let ended = room.end_phase(player.id()).await?;
    player
        .send_direct(&Envelope::new(&ActionResult::ok(format!(
            "{} phase ended",
            ended.effects.ended
        )))?)
        .await?;
    Ok(())
}

/// The player's current room if it has finished, `None` if they are in no
/// room. Being in a room that is still waiting or playing is an error.
async fn finished_room<E: GameEngine>(
    state: &ServerState<E>,
    players: &PlayerRegistry,
    player: &Player,
) -> Result<Option<Arc<Room<E>>>, NightfallError> {
    let Some(current) = players.room_of(&player.id()) else {
        return Ok(None);
    };
    let Some(room) = state.rooms.read().await.get(current) else {
        return Ok(None);
    };
    if room.state().await != RoomState::Finished {
        return Err(RoomError::AlreadyInRoom(player.id(), current.clone()).into());
    }
    Ok(Some(room))
}

/// Drops the player from a finished room's roster.
async fn leave<E: GameEngine>(previous: Option<&Arc<Room<E>>>, player: &Player) {
    let Some(room) = previous else {
        return;
    };
    if let Err(e) = room.remove_player(player.id()).await {
        tracing::debug!(
            room_id = %room.id(),
            player_id = %player.id(),
            error = %e,
            "already gone from finished room"
        );
    }
}

/// Tells the rest of a finished room that the player moved on.
async fn announce_departure<E: GameEngine>(previous: Option<Arc<Room<E>>>, player: &Player) {
    let Some(room) = previous else {
        return;
    };
    tracing::info!(room_id = %room.id(), player_id = %player.id(), "player left finished room");
    match Envelope::new(&PlayerLeft {
        player_id: player.id(),
    }) {
        Ok(envelope) => room.broadcast(&envelope).await,
        Err(e) => {
            tracing::warn!(player_id = %player.id(), error = %e, "failed to build PLAYER_LEFT");
        }
    }
}

/// The room the player is seated in.
async fn current_room<E: GameEngine>(
    state: &ServerState<E>,
    player: &Player,
) -> Result<Arc<Room<E>>, NightfallError> {
    let room_id = state
        .players
        .read()
        .await
        .room_of(&player.id())
        .cloned()
        .ok_or(NightfallError::NoRoom)?;
    Ok(state.rooms.read().await.require(&room_id)?)
}
