//! A room: roster, lifecycle state and (once started) the engine.
//!
//! All mutable state sits behind one `tokio::sync::RwLock`. Every operation
//! takes the lock, runs all of its checks, mutates, builds the envelopes it
//! needs, and *releases the lock before sending anything*. Sends can wait on
//! slow clients; holding the room lock across them would stall every other
//! member.
//!
//! A second lock, the relay, orders replies against engine events. The
//! translator takes it for each event it forwards, and `end_phase` hands it
//! to the caller, so the player who ended a phase gets their ACTION_RESULT
//! before anyone sees the PHASE_CHANGED it caused.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use nightfall_protocol::{
    AllowedSkills, Camp, Envelope, GameEnded, GameStarted, GameState, Phase, PlayerId, PlayerInfo,
    RoleInfo, RoleType, RoomId, SkillType,
};
use nightfall_session::Player;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::translator;
use crate::{EngineSnapshot, GameEngine, PhaseEffects, RoomError, RoomState, SkillReceipt};

/// One roster entry.
struct Member {
    player: Player,
    ready: bool,
    /// Join order; seats are assigned in this order at start.
    seq: u64,
}

struct RoomInner<E> {
    state: RoomState,
    roster: HashMap<PlayerId, Member>,
    next_seq: u64,
    engine: Option<E>,
    /// Names of everyone seated at start. Outlives roster departures so the
    /// game state can still name players who disconnected mid-game.
    seat_names: HashMap<PlayerId, String>,
}

/// Result of a ready toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyOutcome {
    pub is_ready: bool,
    /// The room is now full and everyone is ready.
    pub can_start: bool,
}

/// An accepted skill: the engine's receipt and the GAME_STATE it produced.
///
/// The caller answers the submitter first and broadcasts `state` after.
#[derive(Debug)]
pub struct SkillOutcome {
    pub receipt: SkillReceipt,
    pub state: Envelope,
}

/// A closed phase.
///
/// The room's translator holds off while this is alive, so the requester
/// can be answered before any PHASE_CHANGED caused by the same request.
pub struct PhaseEnd {
    pub effects: PhaseEffects,
    _relay: OwnedMutexGuard<()>,
}

/// A game room.
///
/// Shared as `Arc<Room<E>>` between the registry, connection tasks and the
/// room's translator task.
pub struct Room<E: GameEngine> {
    id: RoomId,
    name: String,
    roles: Vec<RoleType>,
    inner: RwLock<RoomInner<E>>,
    /// Taken by the translator per event and by `end_phase` until the
    /// requester has its reply. Always acquired before `inner`.
    relay: Arc<Mutex<()>>,
}

impl<E: GameEngine> Room<E> {
    /// Creates an empty room in the `Waiting` state.
    ///
    /// `roles` is the ordered list of role slots; its length is the room's
    /// capacity.
    pub fn new(id: RoomId, name: String, roles: Vec<RoleType>) -> Self {
        Self {
            id,
            name,
            roles,
            inner: RwLock::new(RoomInner {
                state: RoomState::Waiting,
                roster: HashMap::new(),
                next_seq: 0,
                engine: None,
                seat_names: HashMap::new(),
            }),
            relay: Arc::new(Mutex::new(())),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.roles.len()
    }

    pub async fn state(&self) -> RoomState {
        self.inner.read().await.state
    }

    pub async fn player_count(&self) -> usize {
        self.inner.read().await.roster.len()
    }

    pub async fn contains(&self, player: PlayerId) -> bool {
        self.inner.read().await.roster.contains_key(&player)
    }

    /// Members in join order, as listed in ROOM_JOINED.
    pub async fn players(&self) -> Vec<PlayerInfo> {
        self.inner.read().await.roster_infos()
    }

    // -----------------------------------------------------------------------
    // Waiting
    // -----------------------------------------------------------------------

    /// Adds a player to the roster and returns the updated member list.
    ///
    /// # Errors
    /// - [`RoomError::RoomNotWaiting`] once the game has started.
    /// - [`RoomError::AlreadyInRoom`] if the player is a member already.
    /// - [`RoomError::RoomFull`] when every role slot is taken.
    pub async fn add_player(&self, player: Player) -> Result<Vec<PlayerInfo>, RoomError> {
        let mut inner = self.inner.write().await;
        let id = player.id();

        if !inner.state.is_joinable() {
            return Err(RoomError::RoomNotWaiting(self.id.clone()));
        }
        if inner.roster.contains_key(&id) {
            return Err(RoomError::AlreadyInRoom(id, self.id.clone()));
        }
        if inner.roster.len() >= self.capacity() {
            return Err(RoomError::RoomFull(self.id.clone()));
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.roster.insert(
            id,
            Member {
                player,
                ready: false,
                seq,
            },
        );
        tracing::debug!(
            room_id = %self.id,
            player_id = %id,
            players = inner.roster.len(),
            capacity = self.capacity(),
            "player joined room"
        );
        Ok(inner.roster_infos())
    }

    /// Removes a player from the roster, in any state.
    ///
    /// During a game the player keeps their engine seat; they just stop
    /// receiving messages.
    pub async fn remove_player(&self, player: PlayerId) -> Result<(), RoomError> {
        let mut inner = self.inner.write().await;
        inner
            .roster
            .remove(&player)
            .ok_or_else(|| RoomError::NotInRoom(player, self.id.clone()))?;
        tracing::debug!(
            room_id = %self.id,
            player_id = %player,
            players = inner.roster.len(),
            "player left room"
        );
        Ok(())
    }

    /// Flips a member's ready flag.
    pub async fn toggle_ready(&self, player: PlayerId) -> Result<ReadyOutcome, RoomError> {
        let mut inner = self.inner.write().await;
        if inner.state != RoomState::Waiting {
            return Err(RoomError::RoomNotWaiting(self.id.clone()));
        }
        let member = inner
            .roster
            .get_mut(&player)
            .ok_or_else(|| RoomError::NotInRoom(player, self.id.clone()))?;
        member.ready = !member.ready;
        let is_ready = member.ready;

        Ok(ReadyOutcome {
            is_ready,
            can_start: inner.can_start(self.capacity()),
        })
    }

    // -----------------------------------------------------------------------
    // Waiting → Playing
    // -----------------------------------------------------------------------

    /// Builds and starts the engine, then greets every player privately.
    ///
    /// Under the write lock: checks, engine construction, seating in join
    /// order, subscription, engine start, and the state flip. After the lock
    /// is released each player gets a GAME_STARTED carrying only their own
    /// role, and werewolves get their teammates. Only then does the
    /// translator start consuming engine events, so a player never sees
    /// PHASE_CHANGED before GAME_STARTED.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyStarted`] if another caller won the race. Benign.
    /// - [`RoomError::CapacityMismatch`] if the roster isn't full.
    /// - [`RoomError::NotReady`] if someone isn't ready.
    /// - [`RoomError::Engine`] if the engine refuses; the room stays `Waiting`.
    pub async fn start(self: &Arc<Self>) -> Result<(), RoomError> {
        let (events, greetings) = {
            let mut guard = self.inner.write().await;
            let inner = &mut *guard;

            if inner.state != RoomState::Waiting {
                return Err(RoomError::AlreadyStarted(self.id.clone()));
            }
            if inner.roster.len() != self.capacity() {
                return Err(RoomError::CapacityMismatch {
                    expected: self.capacity(),
                    actual: inner.roster.len(),
                });
            }
            if !inner.roster.values().all(|member| member.ready) {
                return Err(RoomError::NotReady(self.id.clone()));
            }

            let mut engine = E::new(&self.roles)?;
            for id in inner.join_order() {
                engine.add_participant(id)?;
            }
            let events = engine.subscribe();
            engine.start()?;

            let seat_names: HashMap<PlayerId, String> = inner
                .roster
                .iter()
                .map(|(id, member)| (*id, member.player.name().to_string()))
                .collect();
            let greetings = greetings(&inner.roster, &seat_names, &engine.snapshot())?;

            inner.seat_names = seat_names;
            inner.engine = Some(engine);
            inner.state = RoomState::Playing;
            (events, greetings)
        };

        tracing::info!(room_id = %self.id, players = greetings.len(), "game started");
        deliver_private(&self.id, greetings).await;

        tokio::spawn(translator::run(Arc::clone(self), events));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Playing
    // -----------------------------------------------------------------------

    /// Submits a skill on behalf of a member.
    ///
    /// Checked locally first: the skill must be in the player's allowed set
    /// and a targeted skill must name a living player. A request failing
    /// either check never reaches the engine. On success the new public
    /// state comes back for the caller to broadcast.
    pub async fn submit_skill(
        &self,
        player: PlayerId,
        skill: SkillType,
        target: Option<PlayerId>,
    ) -> Result<SkillOutcome, RoomError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;


        if inner.state != RoomState::Playing {
            return Err(RoomError::GameNotRunning(self.id.clone()));
        }
        if !inner.roster.contains_key(&player) {
            return Err(RoomError::NotInRoom(player, self.id.clone()));
        }
        let engine = inner
            .engine
            .as_mut()
            .ok_or_else(|| RoomError::GameNotRunning(self.id.clone()))?;

        if !engine.allowed_skills(player).contains(&skill) {
            return Err(RoomError::SkillNotAllowed(skill));
        }
        if skill.needs_target() {
            let target = target
                .ok_or_else(|| RoomError::InvalidTarget(format!("{skill} needs a target")))?;
            if !engine.snapshot().is_alive(target) {
                return Err(RoomError::InvalidTarget(
                    "target is not a living player".into(),
                ));
            }
        }

        let receipt = engine.submit_skill(player, skill, target)?;
        tracing::debug!(room_id = %self.id, player_id = %player, %skill, "skill accepted");
        Ok(SkillOutcome {
            receipt,
            state: inner.game_state(&self.id)?,
        })
    }

    /// Asks the engine to close the current phase.
    ///
    /// Any member may do this. The resulting phase change reaches players
    /// through the translator once the returned [`PhaseEnd`] is dropped.
    pub async fn end_phase(&self, player: PlayerId) -> Result<PhaseEnd, RoomError> {
        let relay = Arc::clone(&self.relay).lock_owned().await;
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        if inner.state != RoomState::Playing {
            return Err(RoomError::GameNotRunning(self.id.clone()));
        }
        if !inner.roster.contains_key(&player) {
            return Err(RoomError::NotInRoom(player, self.id.clone()));
        }
        let engine = inner
            .engine
            .as_mut()
            .ok_or_else(|| RoomError::GameNotRunning(self.id.clone()))?;

        let effects = engine.end_phase()?;
        tracing::debug!(
            room_id = %self.id,
            player_id = %player,
            ended = %effects.ended,
            next = %effects.next,
            "phase ended"
        );
        Ok(PhaseEnd {
            effects,
            _relay: relay,
        })
    }

    /// The current public GAME_STATE. Never reveals roles.
    pub async fn game_state(&self) -> Result<Envelope, RoomError> {
        self.inner.read().await.game_state(&self.id)
    }

    // -----------------------------------------------------------------------
    // Translator hooks
    // -----------------------------------------------------------------------

    /// Waits until no requester is being answered, then holds the relay for
    /// one event.
    pub(crate) async fn relay_turn(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.relay).lock_owned().await
    }

    /// Private messages for a phase just entered: ALLOWED_SKILLS to each
    /// living member, and the night's victim to a living witch.
    ///
    /// Returns nothing if the engine has already moved past `phase`; the
    /// later phase's own event will notify.
    pub(crate) async fn phase_entry_messages(
        &self,
        phase: Phase,
    ) -> Result<Vec<(Player, Vec<Envelope>)>, RoomError> {
        let inner = self.inner.read().await;
        let Some(engine) = inner.engine.as_ref() else {
            return Ok(Vec::new());
        };
        if engine.current_phase() != phase {
            return Ok(Vec::new());
        }

        let snapshot = engine.snapshot();
        let kill_target = if phase == Phase::Witch {
            engine.night_kill_target()
        } else {
            None
        };

        let mut batches = Vec::new();
        for id in inner.join_order() {
            let Some(seat) = snapshot.seat(id).filter(|seat| seat.alive) else {
                continue;
            };
            let Some(member) = inner.roster.get(&id) else {
                continue;
            };

            let skills: Vec<SkillType> = engine.allowed_skills(id).into_iter().collect();
            let mut envelopes = vec![Envelope::new(&AllowedSkills { skills })?];

            if let (RoleType::Witch, Some(victim)) = (seat.role, kill_target) {
                let name = inner.seat_name(victim);
                envelopes.push(Envelope::new(&RoleInfo::kill_target(victim, name))?);
            }
            batches.push((member.player.clone(), envelopes));
        }
        Ok(batches)
    }

    /// Display name for a seated (or merely joined) player.
    pub(crate) async fn player_name(&self, player: PlayerId) -> String {
        self.inner.read().await.seat_name(player)
    }

    /// Playing → Finished. Returns the GAME_ENDED reveal, or `None` if the
    /// room had already finished.
    pub(crate) async fn finish(&self, winner: Camp) -> Result<Option<Envelope>, RoomError> {
        let mut inner = self.inner.write().await;
        if !inner.state.can_transition_to(RoomState::Finished) {
            return Ok(None);
        }
        let Some(engine) = inner.engine.as_ref() else {
            return Ok(None);
        };
        let players = inner.seat_infos(&engine.snapshot(), true);
        let envelope = Envelope::new(&GameEnded { winner, players })?;

        inner.state = RoomState::Finished;
        tracing::info!(room_id = %self.id, %winner, "game ended");
        Ok(Some(envelope))
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    /// Sends one envelope to every member.
    ///
    /// The roster is copied under a read lock, then each member is sent to
    /// concurrently. A slow or dead recipient only affects itself.
    pub async fn broadcast(&self, envelope: &Envelope) {
        let recipients = self.recipients(None).await;
        self.send_all(recipients, envelope).await;
    }

    /// Sends one envelope to every member except `skip`.
    pub async fn broadcast_except(&self, envelope: &Envelope, skip: PlayerId) {
        let recipients = self.recipients(Some(skip)).await;
        self.send_all(recipients, envelope).await;
    }

    async fn recipients(&self, skip: Option<PlayerId>) -> Vec<Player> {
        let inner = self.inner.read().await;
        inner
            .roster
            .iter()
            .filter(|(id, _)| Some(**id) != skip)
            .map(|(_, member)| member.player.clone())
            .collect()
    }

    async fn send_all(&self, recipients: Vec<Player>, envelope: &Envelope) {
        let sends = recipients.iter().map(|player| async move {
            if let Err(e) = player.send(envelope).await {
                tracing::warn!(
                    room_id = %self.id,
                    player_id = %player.id(),
                    kind = %envelope.kind(),
                    error = %e,
                    "broadcast delivery failed"
                );
            }
        });
        join_all(sends).await;
    }
}

/// Sends per-player message batches. Each player's batch goes out in order;
/// different players are served concurrently.
pub(crate) async fn deliver_private(room_id: &RoomId, batches: Vec<(Player, Vec<Envelope>)>) {
    let sends = batches.iter().map(|(player, envelopes)| async move {
        for envelope in envelopes {
            if let Err(e) = player.send(envelope).await {
                tracing::warn!(
                    %room_id,
                    player_id = %player.id(),
                    kind = %envelope.kind(),
                    error = %e,
                    "private delivery failed"
                );
                break;
            }
        }
    });
    join_all(sends).await;
}

/// GAME_STARTED for everyone, plus teammates for werewolves.
fn greetings(
    roster: &HashMap<PlayerId, Member>,
    names: &HashMap<PlayerId, String>,
    snapshot: &EngineSnapshot,
) -> Result<Vec<(Player, Vec<Envelope>)>, RoomError> {
    let public: Vec<PlayerInfo> = snapshot
        .seats
        .iter()
        .map(|seat| PlayerInfo {
            id: seat.player,
            username: names.get(&seat.player).cloned().unwrap_or_default(),
            is_alive: seat.alive,
            is_ready: true,
            role_type: None,
        })
        .collect();

    let mut batches = Vec::with_capacity(snapshot.seats.len());
    for seat in &snapshot.seats {
        let Some(member) = roster.get(&seat.player) else {
            continue;
        };
        let mut envelopes = vec![Envelope::new(&GameStarted {
            role_type: seat.role,
            camp: seat.camp,
            players: public.clone(),
        })?];

        if seat.role == RoleType::Werewolf {
            let teammates: Vec<PlayerInfo> = snapshot
                .with_role(RoleType::Werewolf)
                .filter(|other| other.player != seat.player)
                .filter_map(|other| public.iter().find(|info| info.id == other.player).cloned())
                .collect();
            envelopes.push(Envelope::new(&RoleInfo::teammates(teammates))?);
        }
        batches.push((member.player.clone(), envelopes));
    }
    Ok(batches)
}

impl<E: GameEngine> RoomInner<E> {
    fn can_start(&self, capacity: usize) -> bool {
        self.state == RoomState::Waiting
            && self.roster.len() == capacity
            && self.roster.values().all(|member| member.ready)
    }

    fn join_order(&self) -> Vec<PlayerId> {
        let mut members: Vec<(&PlayerId, &Member)> = self.roster.iter().collect();
        members.sort_by_key(|(_, member)| member.seq);
        members.into_iter().map(|(id, _)| *id).collect()
    }

    fn roster_infos(&self) -> Vec<PlayerInfo> {
        self.join_order()
            .into_iter()
            .filter_map(|id| self.roster.get(&id))
            .map(|member| PlayerInfo {
                id: member.player.id(),
                username: member.player.name().to_string(),
                is_alive: true,
                is_ready: member.ready,
                role_type: None,
            })
            .collect()
    }

    fn seat_name(&self, player: PlayerId) -> String {
        if let Some(name) = self.seat_names.get(&player) {
            return name.clone();
        }
        self.roster
            .get(&player)
            .map(|member| member.player.name().to_string())
            .unwrap_or_else(|| player.to_string())
    }

    /// PlayerInfo per seat, in seat order. Roles only with `reveal`.
    fn seat_infos(&self, snapshot: &EngineSnapshot, reveal: bool) -> Vec<PlayerInfo> {
        snapshot
            .seats
            .iter()
            .map(|seat| PlayerInfo {
                id: seat.player,
                username: self.seat_name(seat.player),
                is_alive: seat.alive,
                is_ready: self
                    .roster
                    .get(&seat.player)
                    .is_some_and(|member| member.ready),
                role_type: reveal.then_some(seat.role),
            })
            .collect()
    }

    fn game_state(&self, room_id: &RoomId) -> Result<Envelope, RoomError> {
        let Some(engine) = self.engine.as_ref() else {
            return Err(RoomError::GameNotRunning(room_id.clone()));
        };
        let snapshot = engine.snapshot();
        let state = GameState {
            phase: engine.current_phase(),
            round: engine.current_round(),
            players: self.seat_infos(&snapshot, false),
            alive_players: snapshot.alive(),
            is_ended: self.state == RoomState::Finished || engine.current_phase() == Phase::Ended,
        };
        Ok(Envelope::new(&state)?)
    }
}
