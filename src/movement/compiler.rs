//! Per-step transition function
//!
//! `compile_step` derives a step's state from the previous state alone. A
//! path is compiled by folding it over the steps from left to right.

use crate::core::Facing;
use crate::movement::{IllegalReason, MoveContext, MoveState, MoveStep, MoveStepType, MovementClass};

/// First recorded reason wins
fn flag(reason: &mut Option<IllegalReason>, why: IllegalReason) {
    if reason.is_none() {
        *reason = Some(why);
    }
}

/// Apply one step on top of `prev`
pub fn compile_step(step: &MoveStep, prev: &MoveState, ctx: &MoveContext<'_>) -> MoveState {
    let config = ctx.config;
    let mut next = prev.clone();
    let mut reason: Option<IllegalReason> = None;

    next.mp = 0;
    next.step_count = prev.step_count + 1;
    next.illegal = None;
    next.hazards.past_danger = prev.hazards.past_danger || prev.hazards.danger;
    next.hazards.danger = false;
    next.hazards.used_special_ability = false;
    next.hazards.bog_down_risk = false;

    if prev.terminated {
        flag(&mut reason, IllegalReason::AfterTerminalStep);
    }
    if step.step_type.requires_target() && step.target.is_none() {
        flag(&mut reason, IllegalReason::MissingTarget);
    }

    match step.step_type {
        MoveStepType::TurnLeft | MoveStepType::TurnRight => {
            next.facing = prev.facing.rotated(step.step_type.rotation());
            next.mp = if prev.jumping { 0 } else { config.turn_cost };
        }
        MoveStepType::GetUp => {
            if !prev.prone {
                flag(&mut reason, IllegalReason::NotProne);
            }
            next.prone = false;
            next.mp = config.stand_cost;
            next.hazards.danger = config.standing_requires_roll;
        }
        MoveStepType::GoProne => {
            if prev.prone {
                flag(&mut reason, IllegalReason::AlreadyProne);
            } else if !config.can_go_prone {
                flag(&mut reason, IllegalReason::CannotGoProne);
            }
            next.prone = true;
            next.mp = config.prone_cost;
        }
        MoveStepType::StartJump => {
            if prev.step_count != 0 {
                flag(&mut reason, IllegalReason::JumpNotFirst);
            }
            if config.jump_mp == 0 {
                flag(&mut reason, IllegalReason::NoJumpMp);
            }
            if prev.prone {
                flag(&mut reason, IllegalReason::Prone);
            }
            next.jumping = true;
            next.hazards.on_pavement = false;
            next.hazards.only_pavement = false;
        }
        MoveStepType::Flee => {
            if !ctx.terrain.is_edge(prev.position) {
                flag(&mut reason, IllegalReason::NotAtEdge);
            }
        }
        MoveStepType::UnjamWeapon => {
            if prev.step_count != 0 {
                flag(&mut reason, IllegalReason::UnjamAfterMoving);
            }
        }
        MoveStepType::Load
        | MoveStepType::Unload
        | MoveStepType::Eject
        | MoveStepType::ClearMinefield => {}
        MoveStepType::Forwards
        | MoveStepType::Backwards
        | MoveStepType::Charge
        | MoveStepType::DeathFromAbove
        | MoveStepType::LateralLeft
        | MoveStepType::LateralRight
        | MoveStepType::LateralLeftBackwards
        | MoveStepType::LateralRightBackwards => {
            if let Some(dir) = step.step_type.displacement(prev.facing) {
                enter_hex(step.step_type, dir, prev, &mut next, &mut reason, ctx);
            }
        }
    }

    if step.step_type.is_terminal() {
        next.terminated = true;
    }
    if next.position != prev.position {
        next.can_land = ctx.terrain.is_legal_destination(config.mode, next.position);
    }

    next.mp_used = prev.mp_used + next.mp;
    let class = classify(&mut next, prev, ctx, &mut reason);

    if reason.is_none() {
        if let Err(veto) = ctx.preconditions.check(step, prev) {
            reason = Some(veto);
        }
    }
    if reason.is_none() && !prev.is_legal() {
        reason = Some(IllegalReason::FollowsIllegalStep);
    }

    next.movement_class = if reason.is_some() {
        MovementClass::Illegal
    } else {
        class
    };
    next.illegal = reason;
    next
}

/// Translate into the adjacent hex in `dir`, accounting for terrain
fn enter_hex(
    step_type: MoveStepType,
    dir: Facing,
    prev: &MoveState,
    next: &mut MoveState,
    reason: &mut Option<IllegalReason>,
    ctx: &MoveContext<'_>,
) {
    let config = ctx.config;
    let terrain = ctx.terrain;
    let from = prev.position;
    let to = from.translated(dir);

    if prev.prone {
        flag(reason, IllegalReason::Prone);
    }
    match step_type {
        MoveStepType::Backwards if prev.jumping => flag(reason, IllegalReason::JumpBackwards),
        MoveStepType::Charge if prev.jumping => flag(reason, IllegalReason::ChargeWhileJumping),
        MoveStepType::DeathFromAbove if !prev.jumping => {
            flag(reason, IllegalReason::DfaRequiresJump)
        }
        _ => {}
    }
    if step_type.is_lateral() {
        if !config.can_lateral_shift {
            flag(reason, IllegalReason::NoLateralShift);
        }
        next.hazards.used_special_ability = config.lateral_is_special;
    }
    if !terrain.contains(to) {
        flag(reason, IllegalReason::OffBoard(to));
    }

    next.position = to;
    next.elevation = terrain.elevation(to);
    next.distance = prev.distance + 1;

    if prev.jumping {
        // Jumps ignore terrain between take-off and landing
        next.mp = 1;
        return;
    }

    let cost = match terrain.movement_cost(config.mode, from, to) {
        Some(cost) => cost,
        None => {
            flag(reason, IllegalReason::Impassable(to));
            0
        }
    };
    if !terrain.is_legal_destination(config.mode, to) {
        flag(reason, IllegalReason::IllegalDestination(to));
    }
    let delta = (next.elevation - prev.elevation).unsigned_abs();
    if delta > config.max_elevation_change {
        flag(
            reason,
            IllegalReason::ElevationChange {
                delta,
                max: config.max_elevation_change,
            },
        );
    }

    let hazards = terrain.hazards(config.mode, to);
    next.hazards.danger |= hazards.piloting_roll;
    next.hazards.bog_down_risk = hazards.bog_down;

    let pavement = terrain.is_pavement(to);
    next.hazards.on_pavement = pavement;
    next.hazards.only_pavement = prev.hazards.only_pavement && pavement;

    let surcharge = if step_type.is_lateral() {
        config.lateral_surcharge
    } else {
        0
    };
    next.mp = cost + surcharge;
}

/// Movement class implied by cumulative MP; flags budget overruns
fn classify(
    next: &mut MoveState,
    prev: &MoveState,
    ctx: &MoveContext<'_>,
    reason: &mut Option<IllegalReason>,
) -> MovementClass {
    let config = ctx.config;
    if next.jumping {
        if next.mp_used > config.jump_mp {
            flag(
                reason,
                IllegalReason::ExceedsBudget {
                    used: next.mp_used,
                    budget: config.jump_mp,
                },
            );
        }
        return MovementClass::Jump;
    }

    let bonus = config.bonus(next.hazards.only_pavement);
    let walk = config.walk_mp + bonus;
    let run = config.run_mp + bonus;
    let class = if next.mp_used == 0 {
        MovementClass::None
    } else if next.mp_used <= walk {
        MovementClass::Walk
    } else if next.mp_used <= run {
        MovementClass::Run
    } else {
        flag(
            reason,
            IllegalReason::ExceedsBudget {
                used: next.mp_used,
                budget: run,
            },
        );
        MovementClass::Run
    };

    if class == MovementClass::Run
        && prev.movement_class != MovementClass::Run
        && config.running_risks_fall
    {
        next.hazards.danger = true;
    }
    class
}
