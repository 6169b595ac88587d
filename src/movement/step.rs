//! Movement steps and the per-step movement state

use crate::core::{EntityId, Facing, HexCoord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Vocabulary of atomic movement instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveStepType {
    Forwards,
    Backwards,
    TurnLeft,
    TurnRight,
    LateralLeft,
    LateralRight,
    LateralLeftBackwards,
    LateralRightBackwards,
    GetUp,
    GoProne,
    StartJump,
    Charge,
    DeathFromAbove,
    Flee,
    Load,
    Unload,
    Eject,
    UnjamWeapon,
    ClearMinefield,
}

impl MoveStepType {
    /// Direction this step translates the unit in, given its facing before the step
    pub fn displacement(&self, facing: Facing) -> Option<Facing> {
        match self {
            MoveStepType::Forwards | MoveStepType::Charge | MoveStepType::DeathFromAbove => {
                Some(facing)
            }
            MoveStepType::Backwards => Some(facing.opposite()),
            MoveStepType::LateralLeft => Some(facing.turned_left()),
            MoveStepType::LateralRight => Some(facing.turned_right()),
            MoveStepType::LateralLeftBackwards => Some(facing.turned_right().opposite()),
            MoveStepType::LateralRightBackwards => Some(facing.turned_left().opposite()),
            _ => None,
        }
    }

    /// Facing change in hex sides (positive is clockwise)
    pub fn rotation(&self) -> i32 {
        match self {
            MoveStepType::TurnLeft => -1,
            MoveStepType::TurnRight => 1,
            _ => 0,
        }
    }

    pub fn is_turn(&self) -> bool {
        self.rotation() != 0
    }

    pub fn is_lateral(&self) -> bool {
        matches!(
            self,
            MoveStepType::LateralLeft
                | MoveStepType::LateralRight
                | MoveStepType::LateralLeftBackwards
                | MoveStepType::LateralRightBackwards
        )
    }

    /// No further step may follow one of these
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MoveStepType::Charge
                | MoveStepType::DeathFromAbove
                | MoveStepType::Flee
                | MoveStepType::Eject
                | MoveStepType::Load
                | MoveStepType::UnjamWeapon
                | MoveStepType::ClearMinefield
        )
    }

    pub fn requires_target(&self) -> bool {
        matches!(
            self,
            MoveStepType::Charge
                | MoveStepType::DeathFromAbove
                | MoveStepType::Load
                | MoveStepType::Unload
        )
    }

    /// The turn/move/counter-turn triple a lateral shift stands for
    pub fn expanded(&self) -> Option<[MoveStepType; 3]> {
        use MoveStepType::*;
        match self {
            LateralLeft => Some([TurnLeft, Forwards, TurnRight]),
            LateralRight => Some([TurnRight, Forwards, TurnLeft]),
            LateralLeftBackwards => Some([TurnRight, Backwards, TurnLeft]),
            LateralRightBackwards => Some([TurnLeft, Backwards, TurnRight]),
            _ => None,
        }
    }

    /// Short code used by the command line and scenario files
    pub fn code(&self) -> &'static str {
        match self {
            MoveStepType::Forwards => "F",
            MoveStepType::Backwards => "B",
            MoveStepType::TurnLeft => "L",
            MoveStepType::TurnRight => "R",
            MoveStepType::LateralLeft => "LL",
            MoveStepType::LateralRight => "LR",
            MoveStepType::LateralLeftBackwards => "LLB",
            MoveStepType::LateralRightBackwards => "LRB",
            MoveStepType::GetUp => "UP",
            MoveStepType::GoProne => "DOWN",
            MoveStepType::StartJump => "J",
            MoveStepType::Charge => "CHARGE",
            MoveStepType::DeathFromAbove => "DFA",
            MoveStepType::Flee => "FLEE",
            MoveStepType::Load => "LOAD",
            MoveStepType::Unload => "UNLOAD",
            MoveStepType::Eject => "EJECT",
            MoveStepType::UnjamWeapon => "UNJAM",
            MoveStepType::ClearMinefield => "CLEAR",
        }
    }
}

impl fmt::Display for MoveStepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for MoveStepType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        use MoveStepType::*;
        let step = match s.trim().to_uppercase().as_str() {
            "F" => Forwards,
            "B" => Backwards,
            "L" => TurnLeft,
            "R" => TurnRight,
            "LL" => LateralLeft,
            "LR" => LateralRight,
            "LLB" => LateralLeftBackwards,
            "LRB" => LateralRightBackwards,
            "UP" => GetUp,
            "DOWN" => GoProne,
            "J" => StartJump,
            "CHARGE" => Charge,
            "DFA" => DeathFromAbove,
            "FLEE" => Flee,
            "LOAD" => Load,
            "UNLOAD" => Unload,
            "EJECT" => Eject,
            "UNJAM" => UnjamWeapon,
            "CLEAR" => ClearMinefield,
            other => return Err(format!("unknown movement step '{other}'")),
        };
        Ok(step)
    }
}

/// Parse a comma or whitespace separated list of step codes
pub fn parse_step_list(input: &str) -> std::result::Result<Vec<MoveStepType>, String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// What a targeted step acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepTarget {
    Entity(EntityId),
    Hex(HexCoord),
}

impl StepTarget {
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            StepTarget::Entity(id) => Some(*id),
            StepTarget::Hex(_) => None,
        }
    }
}

/// Movement class a step ends up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementClass {
    /// Nothing spent yet
    #[default]
    None,
    Walk,
    Run,
    Jump,
    Illegal,
}

/// Why a step cannot be taken; the display text is shown to players
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IllegalReason {
    #[error("needs {used} MP but only {budget} available")]
    ExceedsBudget { used: u32, budget: u32 },

    #[error("hex {0} is off the board")]
    OffBoard(HexCoord),

    #[error("hex {0} is impassable")]
    Impassable(HexCoord),

    #[error("cannot end movement in hex {0}")]
    IllegalDestination(HexCoord),

    #[error("elevation change of {delta} exceeds the limit of {max}")]
    ElevationChange { delta: u32, max: u32 },

    #[error("cannot change hexes while prone")]
    Prone,

    #[error("unit is not prone")]
    NotProne,

    #[error("unit is already prone")]
    AlreadyProne,

    #[error("unit cannot go prone")]
    CannotGoProne,

    #[error("a jump must be the first step")]
    JumpNotFirst,

    #[error("unit has no jump MP")]
    NoJumpMp,

    #[error("cannot move backwards while jumping")]
    JumpBackwards,

    #[error("cannot charge while jumping")]
    ChargeWhileJumping,

    #[error("death from above requires jumping")]
    DfaRequiresJump,

    #[error("step needs a target")]
    MissingTarget,

    #[error("can only flee from a board edge")]
    NotAtEdge,

    #[error("no step may follow a charge, attack or other final step")]
    AfterTerminalStep,

    #[error("weapons can only be unjammed instead of moving")]
    UnjamAfterMoving,

    #[error("unit cannot shift laterally")]
    NoLateralShift,

    #[error("cannot land in hex {0}")]
    IllegalLanding(HexCoord),

    #[error("{0}")]
    Vetoed(String),

    #[error("follows an illegal step")]
    FollowsIllegalStep,
}

/// Risk and bookkeeping flags attached to a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepHazards {
    /// This step requires a piloting roll
    pub danger: bool,
    /// An earlier step required a piloting roll
    pub past_danger: bool,
    pub used_special_ability: bool,
    pub on_pavement: bool,
    /// Every hex of the path so far, start included, is pavement
    pub only_pavement: bool,
    pub bog_down_risk: bool,
}

/// Snapshot of the mover after a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveState {
    pub position: HexCoord,
    pub facing: Facing,
    pub elevation: i32,
    pub prone: bool,
    pub jumping: bool,
    /// The unit could end its movement in this hex
    pub can_land: bool,

    /// MP spent by this step alone
    pub mp: u32,
    /// MP spent by the path up to and including this step
    pub mp_used: u32,
    /// Hexes entered so far
    pub distance: u32,
    /// Steps applied so far
    pub step_count: u32,

    pub movement_class: MovementClass,
    pub illegal: Option<IllegalReason>,
    pub hazards: StepHazards,

    /// A final step (charge, flee, load, ...) has been taken
    pub terminated: bool,
}

impl MoveState {
    /// State before the first step
    pub fn start(position: HexCoord, facing: Facing, elevation: i32, prone: bool) -> Self {
        MoveState {
            position,
            facing,
            elevation,
            prone,
            jumping: false,
            can_land: true,
            mp: 0,
            mp_used: 0,
            distance: 0,
            step_count: 0,
            movement_class: MovementClass::None,
            illegal: None,
            hazards: StepHazards::default(),
            terminated: false,
        }
    }

    pub fn is_legal(&self) -> bool {
        self.movement_class != MovementClass::Illegal
    }
}

/// One instruction in a path plus its compiled state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveStep {
    pub step_type: MoveStepType,
    pub target: Option<StepTarget>,
    state: Option<MoveState>,
}

impl MoveStep {
    pub fn new(step_type: MoveStepType) -> Self {
        MoveStep {
            step_type,
            target: None,
            state: None,
        }
    }

    pub fn targeted(step_type: MoveStepType, target: StepTarget) -> Self {
        MoveStep {
            step_type,
            target: Some(target),
            state: None,
        }
    }

    /// Compiled state, None until the owning path is compiled
    pub fn state(&self) -> Option<&MoveState> {
        self.state.as_ref()
    }

    pub(crate) fn set_state(&mut self, state: MoveState) {
        self.state = Some(state);
    }

    pub(crate) fn state_mut(&mut self) -> Option<&mut MoveState> {
        self.state.as_mut()
    }

    pub(crate) fn clear_state(&mut self) {
        self.state = None;
    }

    /// Legal once compiled; uncompiled steps are never reported legal
    pub fn is_legal(&self) -> bool {
        self.state.as_ref().is_some_and(MoveState::is_legal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lateral_displacement_matches_expansion() {
        let lateral = [
            MoveStepType::LateralLeft,
            MoveStepType::LateralRight,
            MoveStepType::LateralLeftBackwards,
            MoveStepType::LateralRightBackwards,
        ];
        for step in lateral {
            for f in 0..6 {
                let facing = Facing::new(f);
                let mut pos = HexCoord::ORIGIN;
                let mut current = facing;
                for part in step.expanded().unwrap() {
                    if let Some(dir) = part.displacement(current) {
                        pos = pos.translated(dir);
                    }
                    current = current.rotated(part.rotation());
                }
                assert_eq!(current, facing, "{step} changed facing");
                assert_eq!(
                    Some(pos),
                    step.displacement(facing).map(|d| HexCoord::ORIGIN.translated(d)),
                    "{step} from facing {facing}"
                );
            }
        }
    }

    #[test]
    fn test_parse_codes() {
        let steps = parse_step_list("F, R f,LLB dfa").unwrap();
        assert_eq!(
            steps,
            vec![
                MoveStepType::Forwards,
                MoveStepType::TurnRight,
                MoveStepType::Forwards,
                MoveStepType::LateralLeftBackwards,
                MoveStepType::DeathFromAbove,
            ]
        );
        assert!(parse_step_list("F,WARP").is_err());
    }

    #[test]
    fn test_codes_round_trip_through_parse() {
        use MoveStepType::*;
        for step in [Forwards, Backwards, GetUp, StartJump, Flee, UnjamWeapon, ClearMinefield] {
            assert_eq!(step.code().parse::<MoveStepType>(), Ok(step));
        }
    }

    #[test]
    fn test_illegal_reason_text() {
        let reason = IllegalReason::ExceedsBudget { used: 7, budget: 6 };
        assert_eq!(reason.to_string(), "needs 7 MP but only 6 available");
    }

    #[test]
    fn test_uncompiled_step_is_not_legal() {
        assert!(!MoveStep::new(MoveStepType::Forwards).is_legal());
    }
}
