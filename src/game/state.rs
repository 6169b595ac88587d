//! Authoritative match state
//!
//! `GameState` is the single owner of everything that changes during a
//! match. All mutation goes through its methods so that the registry, turn
//! order, action ledger, reports and journal stay consistent with each other.

use crate::board::{HexBoard, Terrain};
use crate::core::{
    EntityId, Facing, HexCoord, MovementProfile, Player, PlayerId, RemovalCondition, TeamId, Unit,
};
use crate::game::{
    first_eligible, generate_turns, is_eligible_for_phase, next_eligible, roll_initiative,
    state_hash, ActionLedger, EntityAction, EntityRegistry, EntityScoped, GameOptions, GamePhase,
    GameTurn, PilotingRoll, ReportLog, RoundState, TurnSequencer,
};
use crate::journal::{Journal, Transition};
use crate::movement::{
    IllegalReason, MoveContext, MovePath, MoveState, MoveStep, MoveStepType, MovementConfig,
    StepPreconditions,
};
use crate::{BattleError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Verbose report that costs nothing when the verbose-logging feature is off
macro_rules! log_if_verbose {
    ($reports:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $reports.verbose(&format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$reports;
        }
    };
}

/// One side of a match: a team, or a player without one
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Team(TeamId),
    Solo(PlayerId),
}

impl Side {
    pub fn of(player: &Player) -> Self {
        player.team.map_or(Side::Solo(player.id), Side::Team)
    }
}

/// Main match state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub options: GameOptions,

    board: HexBoard,

    /// Players in join order
    players: Vec<Player>,

    /// Team ids in order of first appearance
    teams: Vec<TeamId>,

    registry: EntityRegistry,

    round: RoundState,

    turns: TurnSequencer,

    ledger: ActionLedger,

    /// Result of the latest initiative roll, first mover first
    initiative_order: Vec<PlayerId>,

    rng: ChaCha12Rng,

    reports: ReportLog,

    journal: Journal,
}

impl GameState {
    pub fn new(options: GameOptions, board: HexBoard) -> Self {
        Self::with_seed(options, board, 0)
    }

    pub fn with_seed(options: GameOptions, board: HexBoard, seed: u64) -> Self {
        let journal = if options.journal {
            Journal::new()
        } else {
            Journal::disabled()
        };
        GameState {
            options,
            board,
            players: Vec::new(),
            teams: Vec::new(),
            registry: EntityRegistry::new(),
            round: RoundState::new(),
            turns: TurnSequencer::new(),
            ledger: ActionLedger::new(),
            initiative_order: Vec::new(),
            rng: ChaCha12Rng::seed_from_u64(seed),
            reports: ReportLog::new(),
            journal,
        }
    }

    /// Reseed the dice
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = ChaCha12Rng::seed_from_u64(seed);
    }

    /// Clear units, turns, actions and history; players and options stay
    pub fn reset(&mut self) {
        self.registry.reset();
        self.round.reset();
        self.turns.reset();
        self.ledger.reset();
        self.initiative_order.clear();
        self.reports.clear();
        self.journal.clear();
    }

    pub fn board(&self) -> &HexBoard {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn teams(&self) -> &[TeamId] {
        &self.teams
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.registry.get(id)
    }

    pub fn phase(&self) -> GamePhase {
        self.round.phase()
    }

    pub fn round(&self) -> u32 {
        self.round.round()
    }

    pub fn has_deployed(&self) -> bool {
        self.round.has_deployed()
    }

    pub fn turns(&self) -> &TurnSequencer {
        &self.turns
    }

    pub fn current_turn(&self) -> Option<&GameTurn> {
        self.turns.current_turn()
    }

    pub fn ledger(&self) -> &ActionLedger {
        &self.ledger
    }

    pub fn reports(&self) -> &ReportLog {
        &self.reports
    }

    pub fn reports_mut(&mut self) -> &mut ReportLog {
        &mut self.reports
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut Journal {
        &mut self.journal
    }

    pub fn initiative_order(&self) -> &[PlayerId] {
        &self.initiative_order
    }

    /// Deterministic hash of the gameplay-relevant state
    pub fn state_hash(&self) -> u64 {
        state_hash::compute_state_hash(self)
    }

    pub fn add_player(&mut self, player: Player) -> Result<()> {
        if self.player(player.id).is_some() {
            return Err(BattleError::InvalidAction(format!(
                "player {} has already joined",
                player.id
            )));
        }
        if let Some(team) = player.team {
            if !self.teams.contains(&team) {
                self.teams.push(team);
            }
        }
        debug!(player = %player.id, name = %player.name, "player joined");
        self.players.push(player);
        Ok(())
    }

    pub fn add_unit(&mut self, unit: Unit) -> Result<EntityId> {
        if self.player(unit.owner).is_none() {
            return Err(BattleError::PlayerNotFound(unit.owner.as_u32()));
        }
        let id = unit.id;
        let name = unit.name.clone();
        if !self.registry.add(unit) {
            return Err(BattleError::DuplicateEntity(id.as_u32()));
        }
        self.journal.log(Transition::EntityAdded { entity: id });
        debug!(entity = %id, %name, "unit added");
        Ok(id)
    }

    /// Take a unit out of play
    ///
    /// Its declared actions are purged and, if it had yet to act this phase,
    /// its last remaining turn is dropped. Cargo it was carrying is left in
    /// its hex.
    pub fn remove_entity(&mut self, id: EntityId, condition: RemovalCondition) -> Result<()> {
        let unit = self
            .registry
            .get(id)
            .cloned()
            .ok_or(BattleError::EntityNotFound(id.as_u32()))?;

        if self.phase().has_turns() && !unit.done {
            if let Some((index, turn)) = self.turns.remove_last_valid_for(&unit) {
                debug!(entity = %id, index, %turn, "removed turn of departing unit");
                self.journal.log(Transition::TurnRemoved { index, turn });
            }
        }

        let purged = self.ledger.remove_all_for(id);
        if purged > 0 {
            debug!(entity = %id, purged, "purged declared actions");
        }

        if let Some(carrier) = unit.carried_by.and_then(|c| self.registry.get_mut(c)) {
            carrier.carrying.retain(|c| *c != id);
        }
        if !unit.carrying.is_empty() {
            self.strand_cargo(&unit);
        }

        self.registry.remove(id, condition);
        self.journal.log(Transition::EntityRemoved {
            entity: id,
            condition,
        });
        self.reports
            .about(id, &format!("{} leaves the battlefield ({condition:?})", unit.name));
        info!(entity = %id, ?condition, "unit removed");
        Ok(())
    }

    /// Drop a lost transport's cargo into its hex
    ///
    /// Stranded units that can still move this phase get their own turn
    /// right after the current one.
    fn strand_cargo(&mut self, transport: &Unit) {
        let mut stranded: SmallVec<[EntityId; 4]> = SmallVec::new();
        for &cargo_id in &transport.carrying {
            let Some(cargo) = self.registry.get_mut(cargo_id) else {
                warn!(entity = %cargo_id, "cargo missing from roster");
                continue;
            };
            cargo.carried_by = None;
            cargo.position = transport.position;
            cargo.facing = transport.facing;
            cargo.elevation = transport.elevation;
            cargo.deployed = transport.position.is_some();
            if cargo.deployed {
                cargo.done = false;
                stranded.push(cargo_id);
            }
        }
        if self.phase() == GamePhase::Movement && !stranded.is_empty() {
            let turn = GameTurn::UnloadStranded { entities: stranded };
            let index = self.turns.insert_after_current(turn.clone());
            self.journal.log(Transition::TurnInserted { index, turn });
        }
    }

    /// Move to the next phase in round order and set it up
    pub fn advance_phase(&mut self) -> Result<GamePhase> {
        let from = self.phase();
        let to = if from == GamePhase::End && self.round() > 0 && self.surviving_teams().len() <= 1
        {
            GamePhase::Victory
        } else {
            from.next(self.has_deployed())
                .ok_or_else(|| BattleError::WrongPhase(from.to_string()))?
        };

        self.end_phase(from);
        self.round.set_phase(to);
        self.reports.begin_phase(self.round(), to);
        self.journal.log(Transition::PhaseChanged { from, to });
        debug!(%from, %to, round = self.round(), "phase change");
        self.begin_phase(to);
        Ok(to)
    }

    fn end_phase(&mut self, phase: GamePhase) {
        if phase == GamePhase::Deployment {
            let waiting = self
                .registry
                .units()
                .iter()
                .any(|u| !u.deployed && !u.is_carried());
            if !waiting {
                self.round.mark_deployed();
            }
        }
    }

    fn begin_phase(&mut self, phase: GamePhase) {
        match phase {
            GamePhase::Initiative => {
                let round = self.round.increment_round();
                self.reports.begin_phase(round, phase);
                self.journal.log(Transition::RoundStarted { round });
                self.ledger.reset();
                self.turns.reset();
                self.initiative_order = roll_initiative(&mut self.players, &mut self.rng);
                self.reports.minimal(&format!("Round {round}"));
                for player in &self.players {
                    if !player.observer {
                        self.reports.normal(&format!(
                            "{} rolls initiative {:?}",
                            player.name,
                            player.initiative.rolls()
                        ));
                    }
                }
                info!(round, order = ?self.initiative_order, "initiative rolled");
            }
            p if p.has_turns() => {
                for unit in self.registry.units_mut() {
                    unit.done = false;
                }
                self.ledger.actions.reset();
                let turns = self.generate_phase_turns(p);
                self.journal.log(Transition::TurnsGenerated { count: turns.len() });
                debug!(phase = %p, turns = turns.len(), "turns generated");
                self.turns.set_turns(turns);
            }
            _ => self.turns.reset(),
        }
    }

    fn generate_phase_turns(&self, phase: GamePhase) -> Vec<GameTurn> {
        let order: Vec<PlayerId> = if self.initiative_order.is_empty() {
            self.players
                .iter()
                .filter(|p| !p.observer)
                .map(|p| p.id)
                .collect()
        } else {
            self.initiative_order.clone()
        };
        let counts: Vec<(PlayerId, usize)> = order
            .into_iter()
            .map(|player| {
                let n = self
                    .registry
                    .units()
                    .iter()
                    .filter(|u| u.owner == player && is_eligible_for_phase(u, phase, self.round()))
                    .count();
                (player, n)
            })
            .collect();
        generate_turns(&counts)
    }

    /// Step to the next turn of the phase
    pub fn advance_turn(&mut self) -> Option<GameTurn> {
        let turn = self.turns.advance().cloned();
        self.journal.log(Transition::TurnAdvanced {
            index: self.turns.index(),
        });
        self.journal.mark_checkpoint();
        turn
    }

    /// Transitions recorded since the current turn began
    pub fn turn_transitions(&self) -> &[Transition] {
        self.journal.since_checkpoint()
    }

    /// Step forward until a turn somebody can actually take
    pub fn advance_to_actionable_turn(&mut self) -> Option<GameTurn> {
        loop {
            let turn = self.advance_turn()?;
            if first_eligible(&turn, &self.registry, self.phase(), self.round()).is_some() {
                return Some(turn);
            }
            debug!(%turn, "skipping turn with no eligible unit");
        }
    }

    /// Force an extra turn right after the current one
    pub fn insert_turn_after_current(&mut self, turn: GameTurn) -> usize {
        let index = self.turns.insert_after_current(turn.clone());
        self.journal.log(Transition::TurnInserted { index, turn });
        index
    }

    /// First unit that may act in the current turn
    pub fn first_eligible(&self) -> Option<EntityId> {
        let turn = self.turns.current_turn()?;
        first_eligible(turn, &self.registry, self.phase(), self.round())
    }

    /// Next unit after `after` that may act in the current turn, wrapping around
    pub fn next_eligible(&self, after: EntityId) -> Option<EntityId> {
        let turn = self.turns.current_turn()?;
        next_eligible(turn, &self.registry, after, self.phase(), self.round())
    }

    /// Units that may act in the current turn, in roster order
    pub fn eligible_units(&self) -> Vec<EntityId> {
        let Some(turn) = self.turns.current_turn() else {
            return Vec::new();
        };
        self.registry
            .units()
            .iter()
            .filter(|u| turn.is_valid_entity(u, self.phase(), self.round()))
            .map(|u| u.id)
            .collect()
    }

    pub fn can_act(&self, entity: EntityId) -> bool {
        match (self.turns.current_turn(), self.registry.get(entity)) {
            (Some(turn), Some(unit)) => turn.is_valid_entity(unit, self.phase(), self.round()),
            _ => false,
        }
    }

    /// Check that `entity` may act in `phase` right now
    fn check_actor(&self, entity: EntityId, phase: GamePhase) -> Result<()> {
        if self.phase() != phase {
            return Err(BattleError::WrongPhase(self.phase().to_string()));
        }
        if !self.registry.contains(entity) {
            return Err(BattleError::EntityNotFound(entity.as_u32()));
        }
        if !self.can_act(entity) {
            return Err(BattleError::NotYourTurn(entity));
        }
        Ok(())
    }

    fn unit_mut(&mut self, entity: EntityId) -> Result<&mut Unit> {
        self.registry
            .get_mut(entity)
            .ok_or(BattleError::EntityNotFound(entity.as_u32()))
    }

    /// Place a unit on the board
    pub fn deploy(&mut self, entity: EntityId, hex: HexCoord, facing: Facing) -> Result<()> {
        self.check_actor(entity, GamePhase::Deployment)?;
        let mode = self
            .unit(entity)
            .map(|u| u.movement_mode())
            .ok_or(BattleError::EntityNotFound(entity.as_u32()))?;
        if !self.board.is_legal_destination(mode, hex) {
            return Err(BattleError::InvalidAction(format!(
                "unit {entity} cannot deploy into {hex}"
            )));
        }
        let elevation = self.board.elevation(hex);

        let unit = self.unit_mut(entity)?;
        unit.deploy_at(hex, facing);
        unit.elevation = elevation;
        unit.done = true;
        let name = unit.name.clone();
        let cargo = unit.carrying.clone();
        for id in cargo {
            if let Some(passenger) = self.registry.get_mut(id) {
                passenger.deployed = true;
            }
        }

        self.journal.log(Transition::EntityDeployed {
            entity,
            hex,
            facing,
        });
        self.reports
            .about(entity, &format!("{name} deploys to {hex} facing {facing}"));
        Ok(())
    }

    /// Movement figures for a unit under the current options
    pub fn movement_config(&self, entity: EntityId) -> Result<MovementConfig> {
        let unit = self
            .unit(entity)
            .ok_or(BattleError::EntityNotFound(entity.as_u32()))?;
        let mut config = MovementConfig::from_profile(unit, &self.options.movement_rules());
        if !self.options.running_fall_checks {
            config.running_risks_fall = false;
        }
        Ok(config)
    }

    /// Movement state a path for this unit starts from
    pub fn start_state(&self, entity: EntityId) -> Result<MoveState> {
        let unit = self
            .unit(entity)
            .ok_or(BattleError::EntityNotFound(entity.as_u32()))?;
        let position = unit.position.ok_or_else(|| {
            BattleError::InvalidAction(format!("unit {entity} is not on the board"))
        })?;
        Ok(MoveState::start(position, unit.facing, unit.elevation, unit.prone))
    }

    /// Compile a path against the unit's current state and the board
    pub fn compile_path(&self, path: &mut MovePath) -> Result<()> {
        let entity = path.entity();
        let config = self.movement_config(entity)?;
        let start = self.start_state(entity)?;
        let mover = self
            .unit(entity)
            .ok_or(BattleError::EntityNotFound(entity.as_u32()))?;
        let checks = RosterChecks {
            registry: &self.registry,
            mover,
        };
        let ctx = MoveContext::new(&config, &self.board).with_preconditions(&checks);
        path.compile(start, &ctx);
        Ok(())
    }

    /// Commit a movement path for the unit whose turn it is
    ///
    /// The path is compiled again against the current state. Any illegal
    /// step rejects the whole path and leaves the state untouched.
    pub fn apply_move(&mut self, mut path: MovePath) -> Result<()> {
        let entity = path.entity();
        self.check_actor(entity, GamePhase::Movement)?;
        self.compile_path(&mut path)?;

        if let Some((step, reason)) = path.first_illegal() {
            return Err(BattleError::IllegalMove {
                entity,
                step,
                reason: reason.clone(),
            });
        }
        let end = path
            .last_state()
            .cloned()
            .ok_or_else(|| BattleError::InvalidAction("path was not compiled".to_string()))?;
        let from = self.unit(entity).and_then(|u| u.position);

        self.record_move_consequences(entity, &path);

        let unit = self.unit_mut(entity)?;
        unit.position = Some(end.position);
        unit.facing = end.facing;
        unit.elevation = end.elevation;
        unit.prone = end.prone;
        unit.done = true;
        if path.contains(MoveStepType::UnjamWeapon) {
            unit.weapon_jammed = false;
        }
        if path.contains(MoveStepType::ClearMinefield) {
            unit.clearing_minefield = true;
        }
        let name = unit.name.clone();

        for step in path.steps() {
            let Some(target) = step.target.and_then(|t| t.entity()) else {
                continue;
            };
            match step.step_type {
                MoveStepType::Load => self.load(entity, target),
                MoveStepType::Unload => self.unload(entity, target, end.position, end.facing),
                _ => {}
            }
        }

        let class = path.movement_class();
        self.journal.log(Transition::EntityMoved {
            entity,
            from,
            to: Some(end.position),
            facing: end.facing,
            mp_used: end.mp_used,
            class,
        });
        self.reports.about(
            entity,
            &format!(
                "{name} moves to {} facing {} ({class:?}, {} MP)",
                end.position, end.facing, end.mp_used
            ),
        );
        for (i, step) in path.steps().iter().enumerate() {
            if let Some(state) = step.state() {
                log_if_verbose!(
                    self.reports,
                    "  {}. {} -> {} ({} MP)",
                    i + 1,
                    step.step_type,
                    state.position,
                    state.mp
                );
            }
        }

        match path.last_step_type() {
            Some(MoveStepType::Flee) => self.remove_entity(entity, RemovalCondition::InRetreat)?,
            Some(MoveStepType::Eject) => self.remove_entity(entity, RemovalCondition::Ejected)?,
            _ => {}
        }
        Ok(())
    }

    /// Queue the rolls and charges a legal path commits the unit to
    fn record_move_consequences(&mut self, entity: EntityId, path: &MovePath) {
        let mut previous = path.start_state().map(|s| s.position);
        for step in path.steps() {
            let Some(state) = step.state() else {
                continue;
            };
            if state.hazards.danger {
                self.ledger.pending_rolls.record(PilotingRoll::new(
                    entity,
                    format!("{} into {}", step.step_type, state.position),
                ));
            }
            if state.hazards.bog_down_risk {
                self.ledger.pending_rolls.record(PilotingRoll::new(
                    entity,
                    format!("may bog down in {}", state.position),
                ));
            }
            let target = step.target.and_then(|t| t.entity());
            let from = previous.unwrap_or(state.position);
            let charge = match (step.step_type, target) {
                (MoveStepType::Charge, Some(target)) => Some(EntityAction::Charge {
                    attacker: entity,
                    target,
                    from,
                }),
                (MoveStepType::DeathFromAbove, Some(target)) => {
                    Some(EntityAction::DeathFromAbove {
                        attacker: entity,
                        target,
                        from,
                    })
                }
                _ => None,
            };
            if let Some(action) = charge {
                self.reports.about(entity, &action.to_string());
                self.ledger.pending_charges.record(action);
                self.journal.log(Transition::ActionRecorded { entity });
            }
            previous = Some(state.position);
        }
    }

    fn load(&mut self, carrier: EntityId, cargo: EntityId) {
        if let Some(unit) = self.registry.get_mut(cargo) {
            unit.carried_by = Some(carrier);
            unit.position = None;
            unit.done = true;
        }
        if let Some(unit) = self.registry.get_mut(carrier) {
            unit.carrying.push(cargo);
        }
        debug!(%carrier, %cargo, "unit loaded");
    }

    fn unload(&mut self, carrier: EntityId, cargo: EntityId, hex: HexCoord, facing: Facing) {
        if let Some(unit) = self.registry.get_mut(carrier) {
            unit.carrying.retain(|c| *c != cargo);
        }
        if let Some(unit) = self.registry.get_mut(cargo) {
            unit.carried_by = None;
            unit.deploy_at(hex, facing);
            unit.done = true;
        }
        debug!(%carrier, %cargo, "unit unloaded");
    }

    /// Declare the attacks of the unit whose turn it is; an empty list passes
    pub fn declare_attacks(&mut self, entity: EntityId, actions: Vec<EntityAction>) -> Result<()> {
        let phase = self.phase();
        if !matches!(phase, GamePhase::Firing | GamePhase::Physical) {
            return Err(BattleError::WrongPhase(phase.to_string()));
        }
        self.check_actor(entity, phase)?;

        let targets = self.valid_targets(entity);
        for action in &actions {
            if action.entity() != entity {
                return Err(BattleError::InvalidAction(format!(
                    "unit {entity} cannot declare for unit {}",
                    action.entity()
                )));
            }
            let allowed = matches!(
                (phase, action),
                (GamePhase::Firing, EntityAction::WeaponAttack { .. })
                    | (GamePhase::Physical, EntityAction::PhysicalAttack { .. })
            );
            if !allowed {
                return Err(BattleError::InvalidAction(format!(
                    "'{action}' cannot be declared in the {phase} phase"
                )));
            }
            if !targets.contains(&action.target()) {
                return Err(BattleError::InvalidAction(format!(
                    "unit {} is not a valid target",
                    action.target()
                )));
            }
        }

        for action in actions {
            self.reports.about(entity, &action.to_string());
            self.ledger.actions.record(action);
            self.journal.log(Transition::ActionRecorded { entity });
        }
        self.unit_mut(entity)?.done = true;
        Ok(())
    }

    /// Units the attacker may target, honouring the friendly-fire option
    pub fn valid_targets(&self, attacker: EntityId) -> Vec<EntityId> {
        let Some(owner) = self.unit(attacker).and_then(|u| self.player(u.owner)) else {
            warn!(entity = %attacker, "valid targets requested for unknown unit");
            return Vec::new();
        };
        self.registry
            .units()
            .iter()
            .filter(|t| t.id != attacker && t.is_targetable())
            .filter(|t| {
                self.options.friendly_fire
                    || self.player(t.owner).map_or(true, |p| owner.is_enemy_of(p))
            })
            .map(|t| t.id)
            .collect()
    }

    /// Sides that still have a unit in the fight
    pub fn surviving_teams(&self) -> Vec<Side> {
        let sides: BTreeSet<Side> = self
            .registry
            .units()
            .iter()
            .filter(|u| !u.destroyed)
            .filter_map(|u| self.player(u.owner))
            .map(Side::of)
            .collect();
        sides.into_iter().collect()
    }
}

/// Step checks that need to see other units on the roster
struct RosterChecks<'a> {
    registry: &'a EntityRegistry,
    mover: &'a Unit,
}

fn veto(reason: impl Into<String>) -> IllegalReason {
    IllegalReason::Vetoed(reason.into())
}

impl StepPreconditions for RosterChecks<'_> {
    fn check(&self, step: &MoveStep, before: &MoveState) -> std::result::Result<(), IllegalReason> {
        let Some(target) = step.target.and_then(|t| t.entity()) else {
            if step.step_type == MoveStepType::UnjamWeapon && !self.mover.weapon_jammed {
                return Err(veto("no jammed weapon to clear"));
            }
            return Ok(());
        };
        match step.step_type {
            MoveStepType::Load => {
                let cargo = self
                    .registry
                    .get(target)
                    .ok_or_else(|| veto(format!("unit {target} is not on the board")))?;
                if cargo.owner != self.mover.owner {
                    return Err(veto("only friendly units can be loaded"));
                }
                if cargo.is_carried() || cargo.position != Some(before.position) {
                    return Err(veto(format!("unit {target} is not in this hex")));
                }
                if !self.mover.has_transport_space() {
                    return Err(veto("no room left aboard"));
                }
                Ok(())
            }
            MoveStepType::Unload => {
                if self.mover.carrying.contains(&target) {
                    Ok(())
                } else {
                    Err(veto(format!("unit {target} is not aboard")))
                }
            }
            MoveStepType::Charge | MoveStepType::DeathFromAbove => {
                let into = before.position.translated(before.facing);
                let found = self
                    .registry
                    .get(target)
                    .filter(|u| u.is_targetable() && u.position == Some(into));
                match found {
                    Some(_) => Ok(()),
                    None => Err(veto(format!("unit {target} is not in hex {into}"))),
                }
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MovementStats, UnitCategory};

    fn two_player_game() -> GameState {
        let mut game = GameState::with_seed(GameOptions::default(), HexBoard::with_radius(8), 3);
        game.add_player(Player::new(PlayerId::new(1), "Alice").with_team(TeamId::new(1)))
            .unwrap();
        game.add_player(Player::new(PlayerId::new(2), "Bob").with_team(TeamId::new(2)))
            .unwrap();
        game.reports_mut().set_output_mode(crate::game::OutputMode::Memory);
        game
    }

    fn mech(id: u32, owner: u32) -> Unit {
        Unit::new(
            EntityId::new(id),
            PlayerId::new(owner),
            format!("Mech {id}"),
            UnitCategory::Mech,
            MovementStats::walking(4),
        )
    }

    #[test]
    fn test_add_unit_checks_owner_and_id() {
        let mut game = two_player_game();
        assert!(game.add_unit(mech(1, 1)).is_ok());
        assert!(matches!(
            game.add_unit(mech(1, 2)),
            Err(BattleError::DuplicateEntity(1))
        ));
        assert!(matches!(
            game.add_unit(mech(2, 9)),
            Err(BattleError::PlayerNotFound(9))
        ));
        assert!(game.add_player(Player::new(PlayerId::new(1), "Again")).is_err());
        assert_eq!(game.teams(), &[TeamId::new(1), TeamId::new(2)]);
    }

    #[test]
    fn test_deployment_phase_flow() {
        let mut game = two_player_game();
        game.add_unit(mech(1, 1)).unwrap();
        game.add_unit(mech(2, 2)).unwrap();

        assert_eq!(game.advance_phase().unwrap(), GamePhase::Deployment);
        assert_eq!(game.turns().len(), 2);

        let turn = game.advance_to_actionable_turn().unwrap();
        assert_eq!(turn.player(), Some(PlayerId::new(1)));
        assert!(matches!(
            game.deploy(EntityId::new(2), HexCoord::ORIGIN, Facing::NORTH),
            Err(BattleError::NotYourTurn(_))
        ));
        game.deploy(EntityId::new(1), HexCoord::new(0, 3), Facing::NORTH)
            .unwrap();
        assert_eq!(
            game.turn_transitions(),
            &[Transition::EntityDeployed {
                entity: EntityId::new(1),
                hex: HexCoord::new(0, 3),
                facing: Facing::NORTH,
            }]
        );
        game.advance_to_actionable_turn().unwrap();
        assert!(game.turn_transitions().is_empty());
        game.deploy(EntityId::new(2), HexCoord::new(0, -3), Facing::SOUTH)
            .unwrap();
        assert!(game.advance_to_actionable_turn().is_none());

        assert_eq!(game.advance_phase().unwrap(), GamePhase::Initiative);
        assert!(game.has_deployed());
        assert_eq!(game.round(), 1);
        assert_eq!(game.initiative_order().len(), 2);
    }

    #[test]
    fn test_move_outside_movement_phase_is_rejected() {
        let mut game = two_player_game();
        game.add_unit(mech(1, 1)).unwrap();
        let path = MovePath::from_types(EntityId::new(1), &[MoveStepType::Forwards]);
        assert!(matches!(
            game.apply_move(path),
            Err(BattleError::WrongPhase(_))
        ));
    }

    #[test]
    fn test_valid_targets_respect_friendly_fire() {
        let mut game = two_player_game();
        game.add_player(Player::new(PlayerId::new(3), "Carol").with_team(TeamId::new(1)))
            .unwrap();
        for (id, owner, q) in [(1, 1, 0), (2, 2, 1), (3, 3, 2)] {
            let mut unit = mech(id, owner);
            unit.deploy_at(HexCoord::new(q, 0), Facing::NORTH);
            game.add_unit(unit).unwrap();
        }

        assert_eq!(game.valid_targets(EntityId::new(1)), vec![EntityId::new(2)]);
        game.options.friendly_fire = true;
        assert_eq!(
            game.valid_targets(EntityId::new(1)),
            vec![EntityId::new(2), EntityId::new(3)]
        );
        assert!(game.valid_targets(EntityId::new(9)).is_empty());
    }

    #[test]
    fn test_surviving_teams() {
        let mut game = two_player_game();
        game.add_player(Player::new(PlayerId::new(3), "Loner")).unwrap();
        game.add_unit(mech(1, 1)).unwrap();
        game.add_unit(mech(2, 2)).unwrap();
        game.add_unit(mech(3, 3)).unwrap();
        assert_eq!(game.surviving_teams().len(), 3);

        game.remove_entity(EntityId::new(2), RemovalCondition::Devastated)
            .unwrap();
        assert_eq!(
            game.surviving_teams(),
            vec![Side::Team(TeamId::new(1)), Side::Solo(PlayerId::new(3))]
        );
        assert!(matches!(
            game.remove_entity(EntityId::new(2), RemovalCondition::Devastated),
            Err(BattleError::EntityNotFound(2))
        ));
    }

    #[test]
    fn test_state_hash_ignores_reports() {
        let mut game = two_player_game();
        game.add_unit(mech(1, 1)).unwrap();
        let before = game.state_hash();
        game.reports().normal("chatter");
        game.reports_mut().commit_phase();
        assert_eq!(game.state_hash(), before);

        game.seed_rng(99);
        game.add_unit(mech(2, 2)).unwrap();
        assert_ne!(game.state_hash(), before);
    }
}
