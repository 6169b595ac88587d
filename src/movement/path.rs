//! Movement paths
//!
//! A `MovePath` is the ordered list of steps one entity intends to take.
//! Compiling it folds `compile_step` over the steps so that every step owns
//! the state the mover would be in after it.

use crate::core::{EntityId, Facing, HexCoord};
use crate::movement::{
    compile_step, IllegalReason, MoveContext, MoveState, MoveStep, MoveStepType, MovementClass,
    StepTarget,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovePath {
    entity: EntityId,
    pub(super) steps: Vec<MoveStep>,
    /// State the path was last compiled from
    pub(super) start: Option<MoveState>,
}

impl MovePath {
    pub fn new(entity: EntityId) -> Self {
        MovePath {
            entity,
            steps: Vec::new(),
            start: None,
        }
    }

    pub fn from_types(entity: EntityId, types: &[MoveStepType]) -> Self {
        let mut path = Self::new(entity);
        for &step_type in types {
            path.push(step_type);
        }
        path
    }

    /// Build and compile in one go
    pub fn compiled(
        entity: EntityId,
        types: &[MoveStepType],
        start: MoveState,
        ctx: &MoveContext<'_>,
    ) -> Self {
        let mut path = Self::from_types(entity, types);
        path.compile(start, ctx);
        path
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Append a step; any previous compilation is discarded
    pub fn push(&mut self, step_type: MoveStepType) -> &mut Self {
        self.push_step(MoveStep::new(step_type))
    }

    pub fn push_targeted(&mut self, step_type: MoveStepType, target: StepTarget) -> &mut Self {
        self.push_step(MoveStep::targeted(step_type, target))
    }

    fn push_step(&mut self, step: MoveStep) -> &mut Self {
        self.invalidate();
        self.steps.push(step);
        self
    }

    fn invalidate(&mut self) {
        self.start = None;
        for step in &mut self.steps {
            step.clear_state();
        }
    }

    pub fn steps(&self) -> &[MoveStep] {
        &self.steps
    }

    pub fn step_types(&self) -> impl Iterator<Item = MoveStepType> + '_ {
        self.steps.iter().map(|s| s.step_type)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Derive every step's state from `start`
    pub fn compile(&mut self, mut start: MoveState, ctx: &MoveContext<'_>) {
        start.hazards.only_pavement = ctx.terrain.is_pavement(start.position);
        start.hazards.on_pavement = start.hazards.only_pavement;

        let mut prev = start.clone();
        for step in &mut self.steps {
            let next = compile_step(step, &prev, ctx);
            step.set_state(next.clone());
            prev = next;
        }
        self.start = Some(start);
        self.check_landing();
    }

    /// Compile again from the stored start state; no-op if never compiled
    pub fn recompile(&mut self, ctx: &MoveContext<'_>) {
        if let Some(start) = self.start.take() {
            self.compile(start, ctx);
        }
    }

    /// A jump must end in a hex the unit could legally stand in
    fn check_landing(&mut self) {
        let Some(last) = self.steps.last_mut().and_then(MoveStep::state_mut) else {
            return;
        };
        if last.jumping && last.is_legal() && !last.can_land {
            last.illegal = Some(IllegalReason::IllegalLanding(last.position));
            last.movement_class = MovementClass::Illegal;
        }
    }

    pub fn is_compiled(&self) -> bool {
        self.start.is_some() && self.steps.iter().all(|s| s.state().is_some())
    }

    pub fn start_state(&self) -> Option<&MoveState> {
        self.start.as_ref()
    }

    /// State after the final step, or the start state for an empty path
    pub fn last_state(&self) -> Option<&MoveState> {
        match self.steps.last() {
            Some(step) => step.state(),
            None => self.start.as_ref(),
        }
    }

    /// Compiled and every step legal
    pub fn is_legal(&self) -> bool {
        self.is_compiled() && self.steps.iter().all(MoveStep::is_legal)
    }

    /// Index and reason of the first illegal step
    pub fn first_illegal(&self) -> Option<(usize, &IllegalReason)> {
        self.steps
            .iter()
            .enumerate()
            .find_map(|(i, s)| s.state().and_then(|st| st.illegal.as_ref()).map(|r| (i, r)))
    }

    pub fn mp_used(&self) -> u32 {
        self.last_state().map_or(0, |s| s.mp_used)
    }

    /// Class of the last legal step
    pub fn movement_class(&self) -> MovementClass {
        self.steps
            .iter()
            .rev()
            .filter_map(MoveStep::state)
            .find(|s| s.is_legal())
            .map_or(MovementClass::None, |s| s.movement_class)
    }

    /// Hexes entered; a lateral shift counts once
    pub fn hexes_moved(&self) -> u32 {
        self.step_types()
            .filter(|t| t.displacement(Facing::NORTH).is_some())
            .count() as u32
    }

    pub fn is_jumping(&self) -> bool {
        self.contains(MoveStepType::StartJump)
    }

    pub fn contains(&self, step_type: MoveStepType) -> bool {
        self.step_types().any(|t| t == step_type)
    }

    pub fn last_step_type(&self) -> Option<MoveStepType> {
        self.steps.last().map(|s| s.step_type)
    }

    /// Where the path ends, replaying translations and turns only
    pub fn final_position(&self, start: HexCoord, facing: Facing) -> HexCoord {
        let mut position = start;
        let mut facing = facing;
        for step_type in self.step_types() {
            if let Some(dir) = step_type.displacement(facing) {
                position = position.translated(dir);
            }
            facing = facing.rotated(step_type.rotation());
        }
        position
    }

    pub fn final_facing(&self, facing: Facing) -> Facing {
        self.step_types()
            .fold(facing, |f, t| f.rotated(t.rotation()))
    }

    pub fn final_prone(&self, start_prone: bool) -> bool {
        self.step_types().fold(start_prone, |prone, t| match t {
            MoveStepType::GetUp => false,
            MoveStepType::GoProne => true,
            _ => prone,
        })
    }
}

/// One line per step; uncompiled paths print their step codes only
impl fmt::Display for MovePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_compiled() {
            let codes: Vec<&str> = self.step_types().map(|t| t.code()).collect();
            return write!(f, "unit {}: [{}]", self.entity, codes.join(" "));
        }
        writeln!(
            f,
            "unit {}: {} steps, {} MP, {:?}",
            self.entity,
            self.steps.len(),
            self.mp_used(),
            self.movement_class()
        )?;
        for (i, step) in self.steps.iter().enumerate() {
            let Some(state) = step.state() else {
                continue;
            };
            write!(f, "{:>3}. {:<6}", i + 1, step.step_type.code())?;
            match &state.illegal {
                Some(reason) => writeln!(f, " illegal: {reason}")?,
                None => writeln!(
                    f,
                    " {} facing {} {:>2}/{} MP {:?}",
                    state.position, state.facing, state.mp, state.mp_used, state.movement_class
                )?,
            }
        }
        Ok(())
    }
}
