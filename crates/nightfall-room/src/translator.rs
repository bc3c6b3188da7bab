//! Event translator: engine events in, network messages out.
//!
//! One task per started room. It is the only consumer of the engine's event
//! channel and handles events strictly in emission order. Every event is
//! followed by a fresh GAME_STATE broadcast.

use std::sync::Arc;

use nightfall_protocol::{Envelope, GameEvent, GameEventType, PhaseChanged};
use serde_json::json;

use crate::room::deliver_private;
use crate::{EngineEvent, EngineEvents, GameEngine, Room, RoomError};

pub(crate) async fn run<E: GameEngine>(room: Arc<Room<E>>, mut events: EngineEvents) {
    while let Some(event) = events.recv().await {
        let terminal = matches!(event, EngineEvent::GameEnded { .. });
        let _turn = room.relay_turn().await;
        if let Err(e) = translate(&room, event).await {
            tracing::warn!(room_id = %room.id(), error = %e, "failed to translate engine event");
        }
        if terminal {
            break;
        }
    }
    tracing::debug!(room_id = %room.id(), "translator stopped");
}

async fn translate<E: GameEngine>(room: &Room<E>, event: EngineEvent) -> Result<(), RoomError> {
    match event {
        EngineEvent::PhaseStarted { phase, round } => {
            tracing::debug!(room_id = %room.id(), %phase, round, "phase started");
            room.broadcast(&Envelope::new(&PhaseChanged { phase, round })?)
                .await;
            let private = room.phase_entry_messages(phase).await?;
            deliver_private(room.id(), private).await;
        }
        EngineEvent::PlayerDied { player, cause } => {
            let name = room.player_name(player).await;
            // Role stays hidden until the game ends.
            let announcement = GameEvent {
                event_type: GameEventType::PlayerDied,
                message: format!("{name} {cause}"),
                data: Some(json!({ "playerID": player, "cause": cause })),
            };
            room.broadcast(&Envelope::new(&announcement)?).await;
        }
        EngineEvent::GameEnded { winner } => {
            if let Some(reveal) = room.finish(winner).await? {
                room.broadcast(&reveal).await;
            }
        }
    }

    let state = room.game_state().await?;
    room.broadcast(&state).await;
    Ok(())
}
