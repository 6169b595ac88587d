//! Movement path compilation and post-processing

pub mod compact;
pub mod compiler;
pub mod config;
pub mod path;
pub mod step;

pub use compact::LateralDirection;
pub use compiler::compile_step;
pub use config::{MoveContext, MovementConfig, MovementRules, NoPreconditions, StepPreconditions};
pub use path::MovePath;
pub use step::{
    parse_step_list, IllegalReason, MoveState, MoveStep, MoveStepType, MovementClass,
    StepHazards, StepTarget,
};
