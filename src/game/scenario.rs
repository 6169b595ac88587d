//! JSON scenario files
//!
//! A scenario describes the board, the sides and their units, where each
//! unit deploys and the paths units try to take each round. Running it drives
//! a `GameState` through deployment and the requested number of rounds,
//! picking actors in turn order. Paths that turn out to be illegal are
//! clipped to their legal prefix instead of being rejected outright.

use crate::board::{BoardLayout, HexBoard};
use crate::core::{
    EntityId, Facing, HexCoord, MovementStats, Player, PlayerId, TeamId, Unit, UnitCategory,
};
use crate::game::{state_hash::format_hash, GameOptions, GamePhase, GameState};
use crate::movement::{parse_step_list, MovePath, StepTarget};
use crate::{BattleError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioPlayer {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub team: Option<u32>,
    #[serde(default)]
    pub observer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioUnit {
    pub id: u32,
    pub owner: u32,
    pub name: String,
    pub category: UnitCategory,
    pub movement: MovementStats,
    #[serde(default)]
    pub deploy_round: u32,
    #[serde(default)]
    pub transport_capacity: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDeployment {
    pub entity: u32,
    pub hex: HexCoord,
    #[serde(default)]
    pub facing: Facing,
}

/// A path one unit tries to take in one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMove {
    pub entity: u32,
    #[serde(default = "one")]
    pub round: u32,
    /// Step codes, e.g. "F F R F"
    pub steps: String,
    /// Target of the final step, for charges and loading
    #[serde(default)]
    pub target: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "one")]
    pub rounds: u32,
    #[serde(default)]
    pub options: GameOptions,
    #[serde(default)]
    pub board: BoardLayout,
    pub players: Vec<ScenarioPlayer>,
    pub units: Vec<ScenarioUnit>,
    #[serde(default)]
    pub deployment: Vec<ScenarioDeployment>,
    #[serde(default)]
    pub moves: Vec<ScenarioMove>,
}

/// A planned path that could not be taken in full
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClippedMove {
    pub entity: EntityId,
    pub round: u32,
    /// Index of the first step dropped
    pub step: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub rounds_played: u32,
    pub final_phase: GamePhase,
    /// Units still on the roster, by id
    pub positions: Vec<(EntityId, Option<HexCoord>, Facing)>,
    pub clipped: Vec<ClippedMove>,
    pub reports: Vec<String>,
    pub hash: u64,
}

impl ScenarioOutcome {
    pub fn hash_string(&self) -> String {
        format_hash(self.hash)
    }
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Game state with the scenario's players and units, still in the lounge
    pub fn build(&self) -> Result<GameState> {
        let board = HexBoard::from_layout(&self.board);
        let mut game = GameState::with_seed(self.options.clone(), board, self.seed);
        for p in &self.players {
            let mut player = Player::new(PlayerId::new(p.id), p.name.as_str());
            player.team = p.team.map(TeamId::new);
            player.observer = p.observer;
            game.add_player(player)?;
        }
        for u in &self.units {
            let mut unit = Unit::new(
                EntityId::new(u.id),
                PlayerId::new(u.owner),
                u.name.as_str(),
                u.category,
                u.movement.clone(),
            );
            unit.deploy_round = u.deploy_round;
            unit.transport_capacity = u.transport_capacity;
            game.add_unit(unit)?;
        }
        Ok(game)
    }

    pub fn run(&self) -> Result<ScenarioOutcome> {
        let mut game = self.build()?;
        self.play(&mut game)
    }

    /// Play from the lounge until the last round ends or a side wins
    pub fn play(&self, game: &mut GameState) -> Result<ScenarioOutcome> {
        info!(scenario = %self.name, seed = self.seed, "running scenario");
        let mut clipped = Vec::new();
        loop {
            let phase = game.advance_phase()?;
            match phase {
                GamePhase::Deployment => self.play_deployment(game)?,
                GamePhase::Movement => self.play_movement(game, &mut clipped)?,
                GamePhase::Firing | GamePhase::Physical => Self::play_pass(game)?,
                _ => {}
            }
            if phase == GamePhase::Victory
                || (phase == GamePhase::EndReport && game.round() >= self.rounds)
            {
                break;
            }
        }
        game.reports_mut().commit_phase();

        let mut positions: Vec<_> = game
            .registry()
            .units()
            .iter()
            .map(|u| (u.id, u.position, u.facing))
            .collect();
        positions.sort_by_key(|(id, _, _)| *id);

        Ok(ScenarioOutcome {
            rounds_played: game.round(),
            final_phase: game.phase(),
            positions,
            clipped,
            reports: game.reports().all_messages(),
            hash: game.state_hash(),
        })
    }

    fn play_deployment(&self, game: &mut GameState) -> Result<()> {
        while game.advance_to_actionable_turn().is_some() {
            let candidates = game.eligible_units();
            let planned = candidates.iter().find_map(|id| {
                self.deployment
                    .iter()
                    .find(|d| d.entity == id.as_u32())
                    .map(|d| (*id, d))
            });
            let Some((entity, spot)) = planned else {
                return Err(BattleError::InvalidAction(format!(
                    "no deployment given for any of {candidates:?}"
                )));
            };
            game.deploy(entity, spot.hex, spot.facing)?;
        }
        Ok(())
    }

    fn play_movement(&self, game: &mut GameState, clipped: &mut Vec<ClippedMove>) -> Result<()> {
        let round = game.round();
        while game.advance_to_actionable_turn().is_some() {
            let candidates = game.eligible_units();
            let planned = candidates.iter().find_map(|id| {
                self.moves
                    .iter()
                    .find(|m| m.entity == id.as_u32() && m.round == round)
                    .map(|m| (*id, Some(m)))
            });
            let (entity, plan) = match (planned, candidates.first()) {
                (Some(found), _) => found,
                (None, Some(id)) => (*id, None),
                (None, None) => continue,
            };

            let mut path = match plan {
                Some(plan) => Self::path_for(entity, plan)?,
                None => MovePath::new(entity),
            };
            game.compile_path(&mut path)?;
            if let Some((step, reason)) = path.first_illegal() {
                debug!(%entity, step, %reason, "clipping planned path");
                clipped.push(ClippedMove {
                    entity,
                    round,
                    step,
                    reason: reason.to_string(),
                });
                path.clip_to_possible();
            }
            game.apply_move(path)?;
            debug!(%entity, transitions = game.turn_transitions().len(), "move committed");
        }
        Ok(())
    }

    fn path_for(entity: EntityId, plan: &ScenarioMove) -> Result<MovePath> {
        let types = parse_step_list(&plan.steps).map_err(BattleError::InvalidAction)?;
        let mut path = MovePath::new(entity);
        let last = types.len().saturating_sub(1);
        for (i, step_type) in types.into_iter().enumerate() {
            match plan.target {
                Some(target) if i == last && step_type.requires_target() => {
                    path.push_targeted(step_type, StepTarget::Entity(EntityId::new(target)));
                }
                _ => {
                    path.push(step_type);
                }
            }
        }
        Ok(path)
    }

    /// Every unit passes; attack declaration is left to other drivers
    fn play_pass(game: &mut GameState) -> Result<()> {
        while game.advance_to_actionable_turn().is_some() {
            if let Some(entity) = game.first_eligible() {
                game.declare_attacks(entity, Vec::new())?;
            }
        }
        Ok(())
    }
}
