//! Post-processing of compiled paths

use crate::movement::{MovePath, MoveStep, MoveStepType};
use serde::{Deserialize, Serialize};

/// Which family of lateral shifts to collapse into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LateralDirection {
    /// turn, forwards, counter-turn
    Forward,
    /// turn, backwards, counter-turn
    Backward,
}

impl LateralDirection {
    fn lateral_for(self, triple: [MoveStepType; 3]) -> Option<MoveStepType> {
        use MoveStepType::*;
        let candidates = match self {
            LateralDirection::Forward => [LateralLeft, LateralRight],
            LateralDirection::Backward => [LateralLeftBackwards, LateralRightBackwards],
        };
        candidates
            .into_iter()
            .find(|lateral| lateral.expanded() == Some(triple))
    }
}

impl MovePath {
    /// Drop the illegal tail of a compiled path
    ///
    /// Illegality propagates to every later step, so the illegal steps always
    /// form a suffix and truncating at the first one removes all of them. A
    /// jump is then shortened until it ends in a hex the unit can land in.
    /// Uncompiled paths are left alone.
    pub fn clip_to_possible(&mut self) {
        if !self.is_compiled() {
            return;
        }
        if let Some(first) = self.steps.iter().position(|s| !s.is_legal()) {
            self.steps.truncate(first);
        }
        while self
            .steps
            .last()
            .and_then(MoveStep::state)
            .map_or(false, |s| s.jumping && !s.can_land)
        {
            self.steps.pop();
        }
    }

    /// Replace every turn/move/counter-turn triple with one lateral shift
    ///
    /// The merged step keeps the state of the triple's last step with the
    /// triple's combined MP, so later steps keep their cumulative totals.
    /// Recompiling charges the lateral shift's own cost (hex plus surcharge),
    /// which is what a committed move pays. Uncompiled paths are left alone.
    pub fn collapse_to_lateral_shifts(&mut self, direction: LateralDirection) {
        if !self.is_compiled() {
            return;
        }
        while let Some((index, lateral)) = self.find_lateral_triple(direction) {
            let triple: Vec<MoveStep> = self.steps.drain(index..index + 3).collect();
            let mut merged = MoveStep::new(lateral);
            if let Some(mut state) = triple[2].state().cloned() {
                state.mp = triple.iter().filter_map(|s| s.state()).map(|s| s.mp).sum();
                state.hazards.danger = triple
                    .iter()
                    .filter_map(|s| s.state())
                    .any(|s| s.hazards.danger);
                merged.set_state(state);
            }
            self.steps.insert(index, merged);
        }
    }

    fn find_lateral_triple(&self, direction: LateralDirection) -> Option<(usize, MoveStepType)> {
        self.steps.windows(3).enumerate().find_map(|(i, window)| {
            let triple = [window[0].step_type, window[1].step_type, window[2].step_type];
            direction.lateral_for(triple).map(|lateral| (i, lateral))
        })
    }
}
