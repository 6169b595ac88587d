//! Property-based tests for turn sequencing, the registry and movement paths

use hexbattle_rs::board::{HexBoard, HexTerrain, TerrainKind};
use hexbattle_rs::core::{
    EntityId, Facing, HexCoord, MovementMode, MovementStats, PlayerId, RemovalCondition, Unit,
    UnitCategory,
};
use hexbattle_rs::game::{EntityRegistry, GameTurn, TurnSequencer};
use hexbattle_rs::movement::{
    LateralDirection, MoveContext, MovePath, MoveState, MoveStepType, MovementConfig,
};
use proptest::prelude::*;
use MoveStepType::*;

fn turn_list(owners: &[u32]) -> Vec<GameTurn> {
    owners
        .iter()
        .map(|&p| GameTurn::Player {
            player: PlayerId::new(p),
        })
        .collect()
}

fn ground_step() -> impl Strategy<Value = MoveStepType> {
    prop::sample::select(vec![
        Forwards,
        Backwards,
        TurnLeft,
        TurnRight,
        LateralLeft,
        LateralRight,
        LateralLeftBackwards,
        LateralRightBackwards,
        GoProne,
        GetUp,
    ])
}

fn simple_step() -> impl Strategy<Value = MoveStepType> {
    prop::sample::select(vec![Forwards, Backwards, TurnLeft, TurnRight])
}

fn terrain_kind() -> impl Strategy<Value = TerrainKind> {
    prop::sample::select(vec![
        TerrainKind::Clear,
        TerrainKind::Pavement,
        TerrainKind::LightWoods,
        TerrainKind::HeavyWoods,
        TerrainKind::Rough,
        TerrainKind::Swamp,
        TerrainKind::Water { depth: 1 },
        TerrainKind::Water { depth: 3 },
        TerrainKind::Building,
    ])
}

fn board() -> impl Strategy<Value = HexBoard> {
    prop::collection::vec((-4i32..=4, -4i32..=4, terrain_kind(), 0i32..=3), 0..30).prop_map(
        |patches| {
            let mut board = HexBoard::with_radius(6);
            for (q, r, kind, elevation) in patches {
                board.set(HexCoord::new(q, r), HexTerrain::new(kind, elevation));
            }
            board
        },
    )
}

fn removal() -> impl Strategy<Value = RemovalCondition> {
    prop::sample::select(vec![
        RemovalCondition::Salvageable,
        RemovalCondition::InRetreat,
        RemovalCondition::Pushed,
        RemovalCondition::Ejected,
        RemovalCondition::Captured,
        RemovalCondition::Devastated,
    ])
}

fn origin() -> MoveState {
    MoveState::start(HexCoord::ORIGIN, Facing::NORTH, 0, false)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Advancing never revisits a turn
    #[test]
    fn prop_turn_index_strictly_increases(
        owners in prop::collection::vec(1u32..=3, 0..12),
        advances in 0usize..20
    ) {
        let mut turns = TurnSequencer::new();
        turns.set_turns(turn_list(&owners));
        let mut last = turns.index();
        let mut exhausted = false;
        for _ in 0..advances {
            let got = turns.advance().is_some();
            if exhausted {
                prop_assert!(!got);
                continue;
            }
            if got {
                prop_assert!(turns.index() > last);
                last = turns.index();
            } else {
                exhausted = true;
            }
        }
        prop_assert!(turns.index() <= owners.len() as i32);
    }

    /// Inserting after the current turn leaves earlier turns alone and comes up next
    #[test]
    fn prop_insert_preserves_past(
        owners in prop::collection::vec(1u32..=3, 1..12),
        advances in 0usize..12,
        extra in 4u32..=6
    ) {
        let mut turns = TurnSequencer::new();
        turns.set_turns(turn_list(&owners));
        for _ in 0..advances {
            turns.advance();
        }
        let index = turns.index();
        let keep = usize::try_from(index + 1).unwrap_or(0).min(owners.len());
        let before = turns.turns()[..keep].to_vec();

        let inserted = GameTurn::Player { player: PlayerId::new(extra) };
        let at = turns.insert_after_current(inserted.clone());
        prop_assert_eq!(at, keep);
        prop_assert_eq!(&turns.turns()[..keep], &before[..]);
        prop_assert_eq!(turns.index(), index.min(owners.len() as i32 - 1));
        prop_assert_eq!(turns.len(), owners.len() + 1);
        prop_assert_eq!(turns.advance(), Some(&inserted));
    }

    /// A removed unit lives in exactly one of roster and graveyard
    #[test]
    fn prop_graveyard_is_additive(
        count in 1u32..16,
        removals in prop::collection::vec((0u32..16, removal()), 0..20)
    ) {
        let mut registry = EntityRegistry::new();
        for id in 0..count {
            let unit = Unit::new(
                EntityId::new(id),
                PlayerId::new(1 + id % 2),
                format!("Unit {id}"),
                UnitCategory::Mech,
                MovementStats::walking(4),
            );
            prop_assert!(registry.add(unit));
        }
        for (id, condition) in removals {
            registry.remove(EntityId::new(id), condition);
        }
        for id in (0..count).map(EntityId::new) {
            let on_roster = registry.contains(id);
            let buried = registry.graveyard().iter().filter(|u| u.id == id).count();
            prop_assert!(buried <= 1);
            prop_assert!(on_roster != (buried == 1));
        }
        prop_assert_eq!(registry.len() + registry.graveyard().len(), count as usize);
    }

    /// MP used never decreases and sums the per-step costs
    #[test]
    fn prop_path_cost_monotone(
        board in board(),
        steps in prop::collection::vec(ground_step(), 0..12)
    ) {
        let config = MovementConfig::simple(5, 8).with_lateral_shift();
        let ctx = MoveContext::new(&config, &board);
        let path = MovePath::compiled(EntityId::new(1), &steps, origin(), &ctx);

        let mut used = 0;
        let mut legal_prefix = true;
        for step in path.steps() {
            let state = step.state().unwrap();
            prop_assert!(state.mp_used >= used);
            prop_assert_eq!(state.mp_used, used + state.mp);
            used = state.mp_used;
            if !state.is_legal() {
                legal_prefix = false;
            } else {
                prop_assert!(legal_prefix, "legal step after an illegal one");
            }
        }
    }

    /// Clipping always leaves a path that stays legal when compiled again
    #[test]
    fn prop_clip_leaves_legal_path(
        board in board(),
        jump in any::<bool>(),
        foot in any::<bool>(),
        steps in prop::collection::vec(ground_step(), 0..12)
    ) {
        let mut config = MovementConfig::simple(3, 5).with_jump(4);
        if foot {
            config.mode = MovementMode::Foot;
        }
        let ctx = MoveContext::new(&config, &board);
        let steps: Vec<_> = jump.then_some(StartJump).into_iter().chain(steps).collect();
        let mut path = MovePath::compiled(EntityId::new(1), &steps, origin(), &ctx);
        let illegal_from = path.first_illegal().map(|(i, _)| i);

        path.clip_to_possible();
        prop_assert!(path.is_legal());
        prop_assert!(path.len() <= illegal_from.unwrap_or(steps.len()));
        if !jump {
            prop_assert_eq!(path.len(), illegal_from.unwrap_or(steps.len()));
        }

        path.recompile(&ctx);
        prop_assert!(path.is_legal(), "clipped path failed recompilation: {}", path);
    }

    /// A lateral shift ends where its turn/move/turn triple ends
    #[test]
    fn prop_lateral_round_trip(
        q in -5i32..=5,
        r in -5i32..=5,
        facing in 0i32..6,
        lateral in prop::sample::select(vec![
            LateralLeft,
            LateralRight,
            LateralLeftBackwards,
            LateralRightBackwards,
        ])
    ) {
        let start = HexCoord::new(q, r);
        let facing = Facing::new(facing);
        let shift = MovePath::from_types(EntityId::new(1), &[lateral]);
        let triple = MovePath::from_types(EntityId::new(1), &lateral.expanded().unwrap());

        prop_assert_eq!(shift.final_position(start, facing), triple.final_position(start, facing));
        prop_assert_eq!(shift.final_facing(facing), triple.final_facing(facing));
        prop_assert_eq!(shift.final_facing(facing), facing);
    }

    /// Collapsing twice is the same as collapsing once
    #[test]
    fn prop_collapse_idempotent(
        steps in prop::collection::vec(simple_step(), 0..15),
        backward in any::<bool>()
    ) {
        let board = HexBoard::open();
        let config = MovementConfig::simple(20, 30).with_lateral_shift();
        let ctx = MoveContext::new(&config, &board);
        let direction = if backward { LateralDirection::Backward } else { LateralDirection::Forward };

        let mut once = MovePath::compiled(EntityId::new(1), &steps, origin(), &ctx);
        let end = once.final_position(HexCoord::ORIGIN, Facing::NORTH);
        let facing = once.final_facing(Facing::NORTH);
        once.collapse_to_lateral_shifts(direction);
        let mut twice = once.clone();
        twice.collapse_to_lateral_shifts(direction);

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.final_position(HexCoord::ORIGIN, Facing::NORTH), end);
        prop_assert_eq!(once.final_facing(Facing::NORTH), facing);
    }
}
