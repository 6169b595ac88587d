//! Game phases and round bookkeeping

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phases of a round, in play order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    Lounge,
    Deployment,
    Initiative,
    InitiativeReport,
    Movement,
    MovementReport,
    Firing,
    FiringReport,
    Physical,
    End,
    EndReport,
    Victory,
}

impl GamePhase {
    /// Do players take turns in this phase, or does it just wait for everyone to be done?
    pub fn has_turns(&self) -> bool {
        matches!(
            self,
            GamePhase::Deployment | GamePhase::Movement | GamePhase::Firing | GamePhase::Physical
        )
    }

    /// Report phases only present results to the players
    pub fn is_report(&self) -> bool {
        matches!(
            self,
            GamePhase::InitiativeReport
                | GamePhase::MovementReport
                | GamePhase::FiringReport
                | GamePhase::EndReport
        )
    }

    /// Phase that follows this one
    ///
    /// Deployment is only visited while some units have yet to deploy.
    /// Victory is terminal; whether a match is over is decided by the caller.
    pub fn next(&self, has_deployed: bool) -> Option<GamePhase> {
        let next = match self {
            GamePhase::Lounge | GamePhase::EndReport if !has_deployed => GamePhase::Deployment,
            GamePhase::Lounge | GamePhase::EndReport => GamePhase::Initiative,
            GamePhase::Deployment => GamePhase::Initiative,
            GamePhase::Initiative => GamePhase::InitiativeReport,
            GamePhase::InitiativeReport => GamePhase::Movement,
            GamePhase::Movement => GamePhase::MovementReport,
            GamePhase::MovementReport => GamePhase::Firing,
            GamePhase::Firing => GamePhase::FiringReport,
            GamePhase::FiringReport => GamePhase::Physical,
            GamePhase::Physical => GamePhase::End,
            GamePhase::End => GamePhase::EndReport,
            GamePhase::Victory => return None,
        };
        Some(next)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GamePhase::Lounge => "Lounge",
            GamePhase::Deployment => "Deployment",
            GamePhase::Initiative => "Initiative",
            GamePhase::InitiativeReport => "Initiative Report",
            GamePhase::Movement => "Movement",
            GamePhase::MovementReport => "Movement Report",
            GamePhase::Firing => "Firing",
            GamePhase::FiringReport => "Firing Report",
            GamePhase::Physical => "Physical Attack",
            GamePhase::End => "End",
            GamePhase::EndReport => "End Report",
            GamePhase::Victory => "Victory",
        };
        write!(f, "{s}")
    }
}

/// Current phase plus round counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    phase: GamePhase,
    /// Round number; 0 until the first initiative phase
    round: u32,
    /// Latched once the initial deployment has finished
    has_deployed: bool,
}

impl RoundState {
    pub fn new() -> Self {
        RoundState {
            phase: GamePhase::Lounge,
            round: 0,
            has_deployed: false,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Unchecked transition; ordering is up to the phase driver
    pub fn set_phase(&mut self, phase: GamePhase) {
        self.phase = phase;
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn increment_round(&mut self) -> u32 {
        self.round += 1;
        self.round
    }

    pub fn has_deployed(&self) -> bool {
        self.has_deployed
    }

    pub fn mark_deployed(&mut self) {
        self.has_deployed = true;
    }

    /// Back to the lounge for a new match
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}
