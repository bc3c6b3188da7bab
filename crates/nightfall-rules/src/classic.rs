//! The classic werewolf rule set.

use std::collections::{BTreeSet, HashSet};

use nightfall_protocol::{Camp, Phase, PlayerId, RoleType, SkillType};
use nightfall_room::{
    DeathCause, EngineError, EngineEvent, EngineEvents, EngineSnapshot, GameEngine, PhaseEffects,
    Seat, SkillReceipt,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;

use crate::tally::Ballots;

/// Which camp a role plays for.
pub fn camp_of(role: RoleType) -> Camp {
    match role {
        RoleType::Werewolf => Camp::Evil,
        RoleType::Villager | RoleType::Seer | RoleType::Witch | RoleType::Guard => Camp::Good,
    }
}

/// Everything that happens during one night, cleared at dawn.
#[derive(Debug, Default)]
struct Night {
    kills: Ballots,
    checked: HashSet<PlayerId>,
    guarded: Option<PlayerId>,
    guard_acted: bool,
    saved: bool,
    poisoned: Option<PlayerId>,
}

impl Night {
    fn witch_acted(&self) -> bool {
        self.saved || self.poisoned.is_some()
    }
}

/// One-shot potions. `true` while still in the bottle.
#[derive(Debug, Clone, Copy)]
struct Potions {
    antidote: bool,
    poison: bool,
}

/// Classic werewolf: werewolves, villagers, a seer, a witch and optionally
/// a guard.
///
/// Phases run Night → Witch → Day → Vote → Night (next round). Roles are
/// shuffled across seats when the game starts. Every command is resolved
/// synchronously; events are pushed into the subscribed channel in the
/// order they happen.
///
/// ```
/// use nightfall_protocol::{Phase, PlayerId, RoleType};
/// use nightfall_room::{EngineEvent, GameEngine};
/// use nightfall_rules::ClassicEngine;
///
/// let mut engine = ClassicEngine::seeded(&RoleType::DEFAULT_TABLE, 7).unwrap();
/// for _ in 0..6 {
///     engine.add_participant(PlayerId::generate()).unwrap();
/// }
/// let mut events = engine.subscribe();
/// engine.start().unwrap();
///
/// assert_eq!(engine.current_phase(), Phase::Night);
/// assert_eq!(
///     events.try_recv().unwrap(),
///     EngineEvent::PhaseStarted { phase: Phase::Night, round: 1 }
/// );
/// ```
#[derive(Debug)]
pub struct ClassicEngine {
    slots: Vec<RoleType>,
    participants: Vec<PlayerId>,
    seats: Vec<Seat>,
    phase: Phase,
    round: u32,
    night: Night,
    /// Protected on the previous night; can't be protected twice running.
    last_guarded: Option<PlayerId>,
    potions: Potions,
    votes: Ballots,
    events: Option<mpsc::UnboundedSender<EngineEvent>>,
    rng: StdRng,
}

impl ClassicEngine {
    /// Like [`GameEngine::new`] but with a fixed shuffle seed, so the same
    /// seed and join order always produce the same seating.
    pub fn seeded(roles: &[RoleType], seed: u64) -> Result<Self, EngineError> {
        Self::with_rng(roles, StdRng::seed_from_u64(seed))
    }

    fn with_rng(roles: &[RoleType], rng: StdRng) -> Result<Self, EngineError> {
        validate_table(roles)?;
        Ok(Self {
            slots: roles.to_vec(),
            participants: Vec::with_capacity(roles.len()),
            seats: Vec::new(),
            phase: Phase::Setup,
            round: 0,
            night: Night::default(),
            last_guarded: None,
            potions: Potions {
                antidote: true,
                poison: true,
            },
            votes: Ballots::default(),
            events: None,
            rng,
        })
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.events {
            // Nobody listening is fine; the game still advances.
            let _ = tx.send(event);
        }
    }

    fn seat(&self, player: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|seat| seat.player == player)
    }

    fn living_seat(&self, player: PlayerId) -> Option<&Seat> {
        self.seat(player).filter(|seat| seat.alive)
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        match self.phase {
            Phase::Setup => Err(EngineError::NotStarted),
            Phase::Ended => Err(EngineError::GameOver),
            _ => Ok(()),
        }
    }

    /// The werewolves' current pick, while the night is still open.
    fn kill_target(&self) -> Option<PlayerId> {
        match self.phase {
            Phase::Night | Phase::Witch => self.night.kills.leader_or_latest(),
            _ => None,
        }
    }

    fn living_target(&self, target: Option<PlayerId>) -> Result<PlayerId, EngineError> {
        let target =
            target.ok_or_else(|| EngineError::InvalidTarget("a target is required".into()))?;
        if self.living_seat(target).is_none() {
            return Err(EngineError::InvalidTarget(format!(
                "{target} is not a living player"
            )));
        }
        Ok(target)
    }

    fn kill(&mut self, player: PlayerId, cause: DeathCause, deaths: &mut Vec<PlayerId>) {
        let Some(seat) = self.seats.iter_mut().find(|seat| seat.player == player) else {
            return;
        };
        if !seat.alive {
            return;
        }
        seat.alive = false;
        deaths.push(player);
        debug!(player_id = %player, %cause, "player died");
        self.emit(EngineEvent::PlayerDied { player, cause });
    }

    fn winner(&self) -> Option<Camp> {
        let (evil, good) = self
            .seats
            .iter()
            .filter(|seat| seat.alive)
            .fold((0usize, 0usize), |(evil, good), seat| match seat.camp {
                Camp::Evil => (evil + 1, good),
                Camp::Good => (evil, good + 1),
            });
        if evil == 0 {
            Some(Camp::Good)
        } else if evil >= good {
            Some(Camp::Evil)
        } else {
            None
        }
    }

    /// Ends the game if a camp has won; otherwise enters `next`.
    fn advance(&mut self, next: Phase) -> Phase {
        if let Some(winner) = self.winner() {
            self.phase = Phase::Ended;
            debug!(%winner, round = self.round, "game over");
            self.emit(EngineEvent::GameEnded { winner });
            return Phase::Ended;
        }
        self.phase = next;
        self.emit(EngineEvent::PhaseStarted {
            phase: next,
            round: self.round,
        });
        next
    }

    /// Witch → Day: the night's deaths land.
    fn resolve_night(&mut self) -> Vec<PlayerId> {
        let mut deaths = Vec::new();
        let victim = self.night.kills.leader_or_latest();
        let night = std::mem::take(&mut self.night);

        if let Some(victim) = victim {
            let protected = night.guarded == Some(victim);
            if !protected && !night.saved {
                self.kill(victim, DeathCause::Killed, &mut deaths);
            }
        }
        if let Some(target) = night.poisoned {
            self.kill(target, DeathCause::Poisoned, &mut deaths);
        }
        self.last_guarded = night.guarded;
        deaths
    }

    /// Vote → Night: the plurality target is exiled.
    fn resolve_vote(&mut self) -> Vec<PlayerId> {
        let mut deaths = Vec::new();
        let exiled = self.votes.plurality();
        if self.votes.is_empty() {
            debug!(round = self.round, "no votes cast");
        }
        self.votes.clear();
        if let Some(target) = exiled {
            self.kill(target, DeathCause::Exiled, &mut deaths);
        }
        deaths
    }
}

fn validate_table(roles: &[RoleType]) -> Result<(), EngineError> {
    let evil = roles.iter().filter(|r| camp_of(**r) == Camp::Evil).count();
    let good = roles.len() - evil;
    if evil == 0 {
        return Err(EngineError::InvalidSetup("at least one werewolf is required".into()));
    }
    if evil >= good {
        return Err(EngineError::InvalidSetup(format!(
            "{evil} werewolves against {good} good players ends before it begins"
        )));
    }
    for unique in [RoleType::Seer, RoleType::Witch, RoleType::Guard] {
        if roles.iter().filter(|r| **r == unique).count() > 1 {
            return Err(EngineError::InvalidSetup(format!("at most one {unique}")));
        }
    }
    Ok(())
}

impl GameEngine for ClassicEngine {
    fn new(roles: &[RoleType]) -> Result<Self, EngineError> {
        Self::with_rng(roles, StdRng::from_rng(&mut rand::rng()))
    }

    fn add_participant(&mut self, player: PlayerId) -> Result<(), EngineError> {
        if self.phase != Phase::Setup {
            return Err(EngineError::AlreadyStarted);
        }
        if self.participants.contains(&player) {
            return Err(EngineError::AlreadySeated(player));
        }
        if self.participants.len() >= self.slots.len() {
            return Err(EngineError::SeatsFull(self.slots.len()));
        }
        self.participants.push(player);
        Ok(())
    }

    fn subscribe(&mut self) -> EngineEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    fn start(&mut self) -> Result<(), EngineError> {
        if self.phase != Phase::Setup {
            return Err(EngineError::AlreadyStarted);
        }
        if self.participants.len() != self.slots.len() {
            return Err(EngineError::SeatCountMismatch {
                seats: self.slots.len(),
                participants: self.participants.len(),
            });
        }

        let mut roles = self.slots.clone();
        roles.shuffle(&mut self.rng);
        self.seats = self
            .participants
            .iter()
            .zip(roles)
            .map(|(player, role)| Seat {
                player: *player,
                role,
                camp: camp_of(role),
                alive: true,
            })
            .collect();

        self.round = 1;
        self.phase = Phase::Night;
        debug!(seats = self.seats.len(), "classic game started");
        self.emit(EngineEvent::PhaseStarted {
            phase: Phase::Night,
            round: 1,
        });
        Ok(())
    }

    fn submit_skill(
        &mut self,
        player: PlayerId,
        skill: SkillType,
        target: Option<PlayerId>,
    ) -> Result<SkillReceipt, EngineError> {
        self.ensure_running()?;
        if self.seat(player).is_none() {
            return Err(EngineError::UnknownPlayer(player));
        }
        if !self.allowed_skills(player).contains(&skill) {
            return match skill {
                SkillType::Antidote if !self.potions.antidote => Err(EngineError::AlreadyUsed(skill)),
                SkillType::Poison if !self.potions.poison => Err(EngineError::AlreadyUsed(skill)),
                _ => Err(EngineError::SkillNotAllowed {
                    skill,
                    phase: self.phase,
                }),
            };
        }

        match skill {
            SkillType::Kill => {
                let target = self.living_target(target)?;
                self.night.kills.cast(player, target);
                Ok(SkillReceipt::new("kill vote recorded"))
            }
            SkillType::Check => {
                let target = self.living_target(target)?;
                if target == player {
                    return Err(EngineError::InvalidTarget("cannot check yourself".into()));
                }
                let camp = self
                    .seat(target)
                    .map(|seat| seat.camp)
                    .ok_or(EngineError::UnknownPlayer(target))?;
                self.night.checked.insert(player);
                Ok(SkillReceipt::new(format!("the player is {camp}"))
                    .with_detail(json!({ "targetID": target, "camp": camp })))
            }
            SkillType::Protect => {
                let target = self.living_target(target)?;
                if self.last_guarded == Some(target) {
                    return Err(EngineError::InvalidTarget(
                        "cannot protect the same player two nights running".into(),
                    ));
                }
                self.night.guarded = Some(target);
                self.night.guard_acted = true;
                Ok(SkillReceipt::new("protection set"))
            }
            SkillType::Antidote => {
                let victim = self.kill_target();
                if target.is_none() || target != victim {
                    return Err(EngineError::InvalidTarget(
                        "the antidote only saves tonight's victim".into(),
                    ));
                }
                self.potions.antidote = false;
                self.night.saved = true;
                Ok(SkillReceipt::new("antidote used"))
            }
            SkillType::Poison => {
                let target = self.living_target(target)?;
                self.potions.poison = false;
                self.night.poisoned = Some(target);
                Ok(SkillReceipt::new("poison used"))
            }
            SkillType::Speak => Ok(SkillReceipt::new("spoke")),
            SkillType::Vote => {
                let target = self.living_target(target)?;
                self.votes.cast(player, target);
                Ok(SkillReceipt::new("vote recorded"))
            }
        }
    }

    fn allowed_skills(&self, player: PlayerId) -> BTreeSet<SkillType> {
        let mut skills = BTreeSet::new();
        let Some(seat) = self.living_seat(player) else {
            return skills;
        };

        match (self.phase, seat.role) {
            (Phase::Night, RoleType::Werewolf) => {
                skills.insert(SkillType::Kill);
            }
            (Phase::Night, RoleType::Seer) if !self.night.checked.contains(&player) => {
                skills.insert(SkillType::Check);
            }
            (Phase::Night, RoleType::Guard) if !self.night.guard_acted => {
                skills.insert(SkillType::Protect);
            }
            (Phase::Witch, RoleType::Witch) if !self.night.witch_acted() => {
                if self.potions.antidote && self.kill_target().is_some() {
                    skills.insert(SkillType::Antidote);
                }
                if self.potions.poison {
                    skills.insert(SkillType::Poison);
                }
            }
            (Phase::Day, _) => {
                skills.insert(SkillType::Speak);
            }
            (Phase::Vote, _) => {
                skills.insert(SkillType::Vote);
            }
            _ => {}
        }
        skills
    }

    fn end_phase(&mut self) -> Result<PhaseEffects, EngineError> {
        let ended = self.phase;
        let (deaths, next) = match ended {
            Phase::Setup => return Err(EngineError::NotStarted),
            Phase::Ended => return Err(EngineError::GameOver),
            Phase::Night => (Vec::new(), self.advance(Phase::Witch)),
            Phase::Witch => {
                let deaths = self.resolve_night();
                (deaths, self.advance(Phase::Day))
            }
            Phase::Day => (Vec::new(), self.advance(Phase::Vote)),
            Phase::Vote => {
                let deaths = self.resolve_vote();
                if self.winner().is_none() {
                    self.round += 1;
                }
                (deaths, self.advance(Phase::Night))
            }
        };

        debug!(%ended, %next, round = self.round, deaths = deaths.len(), "phase resolved");
        Ok(PhaseEffects {
            ended,
            next,
            deaths,
        })
    }

    fn current_phase(&self) -> Phase {
        self.phase
    }

    fn current_round(&self) -> u32 {
        self.round
    }

    fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            seats: self.seats.clone(),
        }
    }

    fn night_kill_target(&self) -> Option<PlayerId> {
        self.kill_target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(roles: &[RoleType]) -> (ClassicEngine, EngineEvents) {
        let mut engine = ClassicEngine::seeded(roles, 42).unwrap();
        for _ in 0..roles.len() {
            engine.add_participant(PlayerId::generate()).unwrap();
        }
        let events = engine.subscribe();
        engine.start().unwrap();
        (engine, events)
    }

    fn holder(engine: &ClassicEngine, role: RoleType) -> PlayerId {
        engine.snapshot().with_role(role).next().unwrap().player
    }

    #[test]
    fn test_validate_table() {
        assert!(validate_table(&RoleType::DEFAULT_TABLE).is_ok());
        assert!(validate_table(&[RoleType::Villager, RoleType::Seer]).is_err());
        assert!(validate_table(&[RoleType::Werewolf, RoleType::Villager]).is_err());
        assert!(
            validate_table(&[
                RoleType::Werewolf,
                RoleType::Seer,
                RoleType::Seer,
                RoleType::Villager
            ])
            .is_err()
        );
    }

    #[test]
    fn test_same_seed_same_seating() {
        let players: Vec<PlayerId> = (0..6).map(|_| PlayerId::generate()).collect();
        let seat = |seed| {
            let mut engine = ClassicEngine::seeded(&RoleType::DEFAULT_TABLE, seed).unwrap();
            for p in &players {
                engine.add_participant(*p).unwrap();
            }
            engine.start().unwrap();
            engine.snapshot()
        };
        assert_eq!(seat(9), seat(9));
    }

    #[test]
    fn test_start_requires_every_seat() {
        let mut engine = ClassicEngine::seeded(&RoleType::DEFAULT_TABLE, 1).unwrap();
        engine.add_participant(PlayerId::generate()).unwrap();
        assert_eq!(
            engine.start(),
            Err(EngineError::SeatCountMismatch {
                seats: 6,
                participants: 1
            })
        );
        assert_eq!(engine.current_phase(), Phase::Setup);
    }

    #[test]
    fn test_add_participant_limits() {
        let roles = [RoleType::Werewolf, RoleType::Villager, RoleType::Villager];
        let mut engine = ClassicEngine::seeded(&roles, 1).unwrap();
        let p = PlayerId::generate();
        engine.add_participant(p).unwrap();
        assert_eq!(engine.add_participant(p), Err(EngineError::AlreadySeated(p)));
        engine.add_participant(PlayerId::generate()).unwrap();
        engine.add_participant(PlayerId::generate()).unwrap();
        assert_eq!(
            engine.add_participant(PlayerId::generate()),
            Err(EngineError::SeatsFull(3))
        );
    }

    #[test]
    fn test_night_allowed_skills() {
        let (engine, _events) = started(&RoleType::DEFAULT_TABLE);
        let wolf = holder(&engine, RoleType::Werewolf);
        let seer = holder(&engine, RoleType::Seer);
        let villager = holder(&engine, RoleType::Villager);
        let witch = holder(&engine, RoleType::Witch);

        assert_eq!(engine.allowed_skills(wolf), BTreeSet::from([SkillType::Kill]));
        assert_eq!(engine.allowed_skills(seer), BTreeSet::from([SkillType::Check]));
        assert!(engine.allowed_skills(villager).is_empty());
        assert!(engine.allowed_skills(witch).is_empty());
    }

    #[test]
    fn test_seer_check_reports_camp_once_per_night() {
        let (mut engine, _events) = started(&RoleType::DEFAULT_TABLE);
        let seer = holder(&engine, RoleType::Seer);
        let wolf = holder(&engine, RoleType::Werewolf);

        let receipt = engine.submit_skill(seer, SkillType::Check, Some(wolf)).unwrap();
        let detail = receipt.detail.unwrap();
        assert_eq!(detail["camp"], "evil");

        assert!(matches!(
            engine.submit_skill(seer, SkillType::Check, Some(wolf)),
            Err(EngineError::SkillNotAllowed { .. })
        ));
    }

    #[test]
    fn test_skill_from_wrong_phase_is_rejected() {
        let (mut engine, _events) = started(&RoleType::DEFAULT_TABLE);
        let villager = holder(&engine, RoleType::Villager);
        assert_eq!(
            engine.submit_skill(villager, SkillType::Vote, Some(villager)),
            Err(EngineError::SkillNotAllowed {
                skill: SkillType::Vote,
                phase: Phase::Night
            })
        );
    }

    #[test]
    fn test_witch_learns_victim_and_saves() {
        let (mut engine, mut events) = started(&RoleType::DEFAULT_TABLE);
        let wolf = holder(&engine, RoleType::Werewolf);
        let witch = holder(&engine, RoleType::Witch);
        let villager = holder(&engine, RoleType::Villager);

        engine.submit_skill(wolf, SkillType::Kill, Some(villager)).unwrap();
        assert_eq!(engine.night_kill_target(), Some(villager));
        engine.end_phase().unwrap();

        assert_eq!(
            engine.allowed_skills(witch),
            BTreeSet::from([SkillType::Antidote, SkillType::Poison])
        );
        engine
            .submit_skill(witch, SkillType::Antidote, Some(villager))
            .unwrap();
        assert!(engine.allowed_skills(witch).is_empty(), "one potion per night");

        let effects = engine.end_phase().unwrap();
        assert_eq!(effects.next, Phase::Day);
        assert!(effects.deaths.is_empty());
        assert!(engine.snapshot().is_alive(villager));

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(!seen.iter().any(|e| matches!(e, EngineEvent::PlayerDied { .. })));
    }

    #[test]
    fn test_antidote_must_target_the_victim() {
        let (mut engine, _events) = started(&RoleType::DEFAULT_TABLE);
        let wolf = holder(&engine, RoleType::Werewolf);
        let witch = holder(&engine, RoleType::Witch);
        let seer = holder(&engine, RoleType::Seer);
        engine.submit_skill(wolf, SkillType::Kill, Some(witch)).unwrap();
        engine.end_phase().unwrap();

        assert!(matches!(
            engine.submit_skill(witch, SkillType::Antidote, Some(seer)),
            Err(EngineError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_guard_blocks_kill_but_not_twice_running() {
        let roles = [
            RoleType::Werewolf,
            RoleType::Villager,
            RoleType::Villager,
            RoleType::Guard,
        ];
        let (mut engine, _events) = started(&roles);
        let wolf = holder(&engine, RoleType::Werewolf);
        let guard = holder(&engine, RoleType::Guard);
        let villager = holder(&engine, RoleType::Villager);

        engine.submit_skill(guard, SkillType::Protect, Some(villager)).unwrap();
        engine.submit_skill(wolf, SkillType::Kill, Some(villager)).unwrap();
        engine.end_phase().unwrap(); // witch (none seated)
        let effects = engine.end_phase().unwrap(); // day
        assert!(effects.deaths.is_empty());

        engine.end_phase().unwrap(); // vote
        engine.end_phase().unwrap(); // night, round 2
        assert_eq!(engine.current_round(), 2);
        assert!(matches!(
            engine.submit_skill(guard, SkillType::Protect, Some(villager)),
            Err(EngineError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_poison_is_single_use() {
        let (mut engine, _events) = started(&RoleType::DEFAULT_TABLE);
        let witch = holder(&engine, RoleType::Witch);
        let wolf = holder(&engine, RoleType::Werewolf);

        engine.end_phase().unwrap(); // witch
        engine.submit_skill(witch, SkillType::Poison, Some(wolf)).unwrap();
        let effects = engine.end_phase().unwrap();
        assert_eq!(effects.deaths, vec![wolf]);

        engine.end_phase().unwrap(); // vote
        engine.end_phase().unwrap(); // night 2
        engine.end_phase().unwrap(); // witch 2
        assert!(!engine.allowed_skills(witch).contains(&SkillType::Poison));
        assert_eq!(
            engine.submit_skill(witch, SkillType::Poison, Some(wolf)),
            Err(EngineError::AlreadyUsed(SkillType::Poison))
        );
    }

    #[test]
    fn test_vote_tie_exiles_nobody() {
        let (mut engine, _events) = started(&RoleType::DEFAULT_TABLE);
        for _ in 0..3 {
            engine.end_phase().unwrap();
        }
        assert_eq!(engine.current_phase(), Phase::Vote);

        let alive = engine.snapshot().alive();
        engine.submit_skill(alive[0], SkillType::Vote, Some(alive[1])).unwrap();
        engine.submit_skill(alive[1], SkillType::Vote, Some(alive[0])).unwrap();
        let effects = engine.end_phase().unwrap();
        assert!(effects.deaths.is_empty());
        assert_eq!(effects.next, Phase::Night);
        assert_eq!(engine.current_round(), 2);
    }

    #[test]
    fn test_dead_players_have_no_skills() {
        let (mut engine, _events) = started(&RoleType::DEFAULT_TABLE);
        let wolf = holder(&engine, RoleType::Werewolf);
        let seer = holder(&engine, RoleType::Seer);
        engine.submit_skill(wolf, SkillType::Kill, Some(seer)).unwrap();
        engine.end_phase().unwrap();
        engine.end_phase().unwrap();

        assert!(!engine.snapshot().is_alive(seer));
        assert!(engine.allowed_skills(seer).is_empty());
        assert!(engine.submit_skill(wolf, SkillType::Speak, None).is_ok());
    }

    #[test]
    fn test_commands_before_start_and_after_end() {
        let mut engine = ClassicEngine::seeded(&RoleType::DEFAULT_TABLE, 3).unwrap();
        assert_eq!(engine.end_phase(), Err(EngineError::NotStarted));

        let roles = [RoleType::Werewolf, RoleType::Villager, RoleType::Villager];
        let (mut engine, _events) = started(&roles);
        let wolf = holder(&engine, RoleType::Werewolf);
        for _ in 0..3 {
            engine.end_phase().unwrap();
        }
        let alive = engine.snapshot().alive();
        for voter in &alive {
            engine.submit_skill(*voter, SkillType::Vote, Some(wolf)).unwrap();
        }
        let effects = engine.end_phase().unwrap();
        assert_eq!(effects.next, Phase::Ended);
        assert_eq!(engine.end_phase(), Err(EngineError::GameOver));
        assert!(engine.allowed_skills(alive[0]).is_empty());
    }
}
