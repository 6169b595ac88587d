//! Player representation

use crate::core::{GameEntity, PlayerId, PlayerName, TeamId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Sequence of 2d6 initiative rolls; later entries break earlier ties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeRoll {
    rolls: SmallVec<[u8; 4]>,
}

impl InitiativeRoll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_roll(&mut self, value: u8) {
        self.rolls.push(value);
    }

    pub fn clear(&mut self) {
        self.rolls.clear();
    }

    pub fn rolls(&self) -> &[u8] {
        &self.rolls
    }

    /// Most recent roll, if any
    pub fn last(&self) -> Option<u8> {
        self.rolls.last().copied()
    }
}

impl PartialOrd for InitiativeRoll {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InitiativeRoll {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rolls.as_slice().cmp(other.rolls.as_slice())
    }
}

/// Represents a player in the match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Unique ID for this player
    pub id: PlayerId,

    /// Player name
    pub name: PlayerName,

    /// Team affiliation (players without a team fight everyone)
    pub team: Option<TeamId>,

    /// Has target-acquisition gear deployed (spotting for indirect fire)
    pub has_target_acquisition: bool,

    /// Observers never own units and never get turns
    pub observer: bool,

    /// Current round's initiative
    pub initiative: InitiativeRoll,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>) -> Self {
        Player {
            id,
            name: name.into(),
            team: None,
            has_target_acquisition: false,
            observer: false,
            initiative: InitiativeRoll::new(),
        }
    }

    pub fn with_team(mut self, team: TeamId) -> Self {
        self.team = Some(team);
        self
    }

    /// Are these two players on opposing sides?
    pub fn is_enemy_of(&self, other: &Player) -> bool {
        if self.id == other.id {
            return false;
        }
        match (self.team, other.team) {
            (Some(a), Some(b)) => a != b,
            _ => true,
        }
    }
}

impl GameEntity<PlayerId> for Player {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let id = PlayerId::new(1);
        let player = Player::new(id, "Alice");

        assert_eq!(player.id, id);
        assert_eq!(player.name.as_str(), "Alice");
        assert!(player.team.is_none());
        assert!(!player.observer);
    }

    #[test]
    fn test_enemies() {
        let alice = Player::new(PlayerId::new(1), "Alice").with_team(TeamId::new(1));
        let bob = Player::new(PlayerId::new(2), "Bob").with_team(TeamId::new(1));
        let carol = Player::new(PlayerId::new(3), "Carol").with_team(TeamId::new(2));
        let loner = Player::new(PlayerId::new(4), "Dan");

        assert!(!alice.is_enemy_of(&bob));
        assert!(alice.is_enemy_of(&carol));
        assert!(loner.is_enemy_of(&alice));
        assert!(!alice.is_enemy_of(&alice));
    }

    #[test]
    fn test_initiative_tie_break() {
        let mut a = InitiativeRoll::new();
        let mut b = InitiativeRoll::new();
        a.add_roll(7);
        b.add_roll(7);
        assert_eq!(a.cmp(&b), Ordering::Equal);

        a.add_roll(3);
        b.add_roll(9);
        assert!(a < b);
        assert_eq!(b.last(), Some(9));
    }
}
