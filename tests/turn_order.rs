//! Turn order and phase flow through the public game-state API

use hexbattle_rs::board::HexBoard;
use hexbattle_rs::core::{
    EntityId, Facing, HexCoord, MovementStats, Player, PlayerId, RemovalCondition, TeamId, Unit,
    UnitCategory,
};
use hexbattle_rs::game::{
    GameOptions, GamePhase, GameState, GameTurn, OutputMode, TurnSequencer,
};
use hexbattle_rs::movement::{MovePath, MoveStepType, StepTarget};
use hexbattle_rs::BattleError;

fn unit(id: u32, owner: u32, category: UnitCategory) -> Unit {
    Unit::new(
        EntityId::new(id),
        PlayerId::new(owner),
        format!("Unit {id}"),
        category,
        MovementStats::walking(4),
    )
}

fn new_game(seed: u64) -> GameState {
    let mut game = GameState::with_seed(GameOptions::default(), HexBoard::with_radius(10), seed);
    game.reports_mut().set_output_mode(OutputMode::Memory);
    game.add_player(Player::new(PlayerId::new(1), "Alice").with_team(TeamId::new(1)))
        .unwrap();
    game.add_player(Player::new(PlayerId::new(2), "Bob").with_team(TeamId::new(2)))
        .unwrap();
    game
}

/// Deploy every unit into `hex_for(id)` in turn order
fn deploy_all(game: &mut GameState, hex_for: impl Fn(EntityId) -> HexCoord) {
    assert_eq!(game.advance_phase().unwrap(), GamePhase::Deployment);
    while game.advance_to_actionable_turn().is_some() {
        let entity = game.first_eligible().unwrap();
        game.deploy(entity, hex_for(entity), Facing::NORTH).unwrap();
    }
}

fn spread(entity: EntityId) -> HexCoord {
    HexCoord::new(entity.as_u32() as i32 - 4, 0)
}

fn advance_to(game: &mut GameState, phase: GamePhase) {
    while game.phase() != phase {
        game.advance_phase().unwrap();
    }
}

fn owners(game: &GameState) -> Vec<u32> {
    game.turns()
        .turns()
        .iter()
        .filter_map(GameTurn::player)
        .map(|p| p.as_u32())
        .collect()
}

#[test]
fn test_remove_last_valid_for_destroyed_unit() {
    let a = unit(1, 1, UnitCategory::Mech);
    let mut b = unit(2, 2, UnitCategory::Mech);
    let mut turns = TurnSequencer::new();
    turns.set_turns(vec![
        GameTurn::SpecificEntity {
            player: PlayerId::new(1),
            entity: a.id,
        },
        GameTurn::SpecificEntity {
            player: PlayerId::new(2),
            entity: b.id,
        },
    ]);
    turns.advance();

    b.destroyed = true;
    let (index, removed) = turns.remove_last_valid_for(&b).unwrap();
    assert_eq!(index, 1);
    assert!(removed.applies_to(&b));
    assert_eq!(turns.len(), 1);
    assert_eq!(turns.index(), 0);
    assert!(turns.current_turn().unwrap().applies_to(&a));
    assert!(!turns.has_next());
}

#[test]
fn test_unequal_forces_interleave() {
    let mut game = new_game(11);
    for id in 1..=4 {
        game.add_unit(unit(id, 1, UnitCategory::Mech)).unwrap();
    }
    for id in 5..=6 {
        game.add_unit(unit(id, 2, UnitCategory::Mech)).unwrap();
    }

    // Before initiative, deployment follows join order
    assert_eq!(game.advance_phase().unwrap(), GamePhase::Deployment);
    assert_eq!(owners(&game), vec![1, 1, 2, 1, 1, 2]);
    while game.advance_to_actionable_turn().is_some() {
        let entity = game.first_eligible().unwrap();
        game.deploy(entity, spread(entity), Facing::NORTH).unwrap();
    }

    advance_to(&mut game, GamePhase::Movement);
    let order = owners(&game);
    assert_eq!(order.len(), 6);
    assert_eq!(order.iter().filter(|&&p| p == 1).count(), 4);
    let first = game.initiative_order()[0].as_u32();
    assert_eq!(order[0], first);
}

#[test]
fn test_destroyed_unit_loses_its_turn() {
    let mut game = new_game(3);
    game.add_unit(unit(1, 1, UnitCategory::Mech)).unwrap();
    game.add_unit(unit(2, 1, UnitCategory::Mech)).unwrap();
    game.add_unit(unit(3, 2, UnitCategory::Mech)).unwrap();
    game.add_unit(unit(4, 2, UnitCategory::Mech)).unwrap();
    deploy_all(&mut game, spread);
    advance_to(&mut game, GamePhase::Movement);
    assert_eq!(game.turns().len(), 4);

    let turn = game.advance_to_actionable_turn().unwrap();
    let mover = game.first_eligible().unwrap();
    game.apply_move(MovePath::from_types(mover, &[MoveStepType::Forwards]))
        .unwrap();

    // Destroy a unit of the other side that has not moved yet
    let other = if turn.player() == Some(PlayerId::new(1)) { 3 } else { 1 };
    game.remove_entity(EntityId::new(other), RemovalCondition::Devastated)
        .unwrap();
    assert_eq!(game.turns().len(), 3);

    let mut moves = 1;
    while game.advance_to_actionable_turn().is_some() {
        let entity = game.first_eligible().unwrap();
        game.apply_move(MovePath::new(entity)).unwrap();
        moves += 1;
    }
    assert_eq!(moves, 3);
    assert!(game.registry().graveyard().iter().any(|u| u.id.as_u32() == other));
}

#[test]
fn test_full_round_phase_order() {
    let mut game = new_game(1);
    game.add_unit(unit(1, 1, UnitCategory::Mech)).unwrap();
    game.add_unit(unit(2, 2, UnitCategory::Infantry)).unwrap();
    deploy_all(&mut game, spread);

    let mut seen = Vec::new();
    for _ in 0..11 {
        seen.push(game.advance_phase().unwrap());
    }
    assert_eq!(
        seen,
        vec![
            GamePhase::Initiative,
            GamePhase::InitiativeReport,
            GamePhase::Movement,
            GamePhase::MovementReport,
            GamePhase::Firing,
            GamePhase::FiringReport,
            GamePhase::Physical,
            GamePhase::End,
            GamePhase::EndReport,
            GamePhase::Initiative,
            GamePhase::InitiativeReport,
        ]
    );
    assert_eq!(game.round(), 2);
}

#[test]
fn test_infantry_sit_out_physical_phase() {
    let mut game = new_game(1);
    game.add_unit(unit(1, 1, UnitCategory::Mech)).unwrap();
    game.add_unit(unit(2, 2, UnitCategory::Infantry)).unwrap();
    deploy_all(&mut game, spread);
    advance_to(&mut game, GamePhase::Physical);

    assert_eq!(owners(&game), vec![1]);
    game.advance_to_actionable_turn().unwrap();
    assert!(game.can_act(EntityId::new(1)));
    assert!(!game.can_act(EntityId::new(2)));
    assert!(matches!(
        game.declare_attacks(EntityId::new(2), Vec::new()),
        Err(BattleError::NotYourTurn(_))
    ));
}

#[test]
fn test_late_reinforcements_reopen_deployment() {
    let mut game = new_game(2);
    game.add_unit(unit(1, 1, UnitCategory::Mech)).unwrap();
    game.add_unit(unit(2, 2, UnitCategory::Mech)).unwrap();
    let mut late = unit(3, 2, UnitCategory::Mech);
    late.deploy_round = 2;
    game.add_unit(late).unwrap();

    deploy_all(&mut game, spread);
    assert!(!game.unit(EntityId::new(3)).unwrap().deployed);

    advance_to(&mut game, GamePhase::EndReport);
    assert!(!game.has_deployed());
    assert_eq!(game.advance_phase().unwrap(), GamePhase::Deployment);
    assert_eq!(owners(&game), vec![2]);
    game.advance_to_actionable_turn().unwrap();
    game.deploy(EntityId::new(3), HexCoord::new(0, -5), Facing::SOUTH)
        .unwrap();
    assert_eq!(game.advance_phase().unwrap(), GamePhase::Initiative);
    assert!(game.has_deployed());
}

#[test]
fn test_victory_when_one_side_remains() {
    let mut game = new_game(4);
    game.add_unit(unit(1, 1, UnitCategory::Mech)).unwrap();
    game.add_unit(unit(2, 2, UnitCategory::Mech)).unwrap();
    deploy_all(&mut game, spread);
    advance_to(&mut game, GamePhase::Firing);

    game.remove_entity(EntityId::new(2), RemovalCondition::Salvageable)
        .unwrap();
    advance_to(&mut game, GamePhase::End);
    assert_eq!(game.advance_phase().unwrap(), GamePhase::Victory);
    assert!(matches!(
        game.advance_phase(),
        Err(BattleError::WrongPhase(_))
    ));
}

#[test]
fn test_lost_transport_strands_cargo() {
    let mut game = new_game(8);
    let mut apc = Unit::new(
        EntityId::new(1),
        PlayerId::new(1),
        "APC",
        UnitCategory::Tank,
        MovementStats::walking(5),
    );
    apc.transport_capacity = 1;
    game.add_unit(apc).unwrap();
    game.add_unit(unit(2, 1, UnitCategory::Infantry)).unwrap();
    game.add_unit(unit(3, 2, UnitCategory::Mech)).unwrap();
    deploy_all(&mut game, |id| match id.as_u32() {
        3 => HexCoord::new(0, -5),
        _ => HexCoord::new(0, 2),
    });

    // Round 1: the APC picks up the platoon
    advance_to(&mut game, GamePhase::Movement);
    while game.advance_to_actionable_turn().is_some() {
        if game.can_act(EntityId::new(1)) {
            let mut path = MovePath::new(EntityId::new(1));
            path.push_targeted(MoveStepType::Load, StepTarget::Entity(EntityId::new(2)));
            game.apply_move(path).unwrap();
        } else {
            let entity = game.first_eligible().unwrap();
            game.apply_move(MovePath::new(entity)).unwrap();
        }
    }
    let platoon = game.unit(EntityId::new(2)).unwrap();
    assert_eq!(platoon.carried_by, Some(EntityId::new(1)));
    assert!(platoon.position.is_none());

    // Round 2: the APC is destroyed before anyone moves
    advance_to(&mut game, GamePhase::EndReport);
    advance_to(&mut game, GamePhase::Movement);
    assert_eq!(game.turns().len(), 2);
    game.remove_entity(EntityId::new(1), RemovalCondition::Devastated)
        .unwrap();

    assert_eq!(
        game.turns().turns()[0],
        GameTurn::UnloadStranded {
            entities: [EntityId::new(2)].into_iter().collect()
        }
    );
    assert_eq!(game.turns().len(), 2);
    let platoon = game.unit(EntityId::new(2)).unwrap();
    assert_eq!(platoon.position, Some(HexCoord::new(0, 2)));
    assert!(platoon.carried_by.is_none());

    game.advance_to_actionable_turn().unwrap();
    assert!(game.can_act(EntityId::new(2)));
    game.apply_move(MovePath::from_types(EntityId::new(2), &[MoveStepType::Forwards]))
        .unwrap();
    assert_eq!(
        game.unit(EntityId::new(2)).unwrap().position,
        Some(HexCoord::new(0, 1))
    );
}

#[test]
fn test_transport_lost_after_last_move_still_unloads() {
    let mut game = new_game(8);
    let mut apc = Unit::new(
        EntityId::new(1),
        PlayerId::new(1),
        "APC",
        UnitCategory::Tank,
        MovementStats::walking(5),
    );
    apc.transport_capacity = 1;
    game.add_unit(apc).unwrap();
    game.add_unit(unit(2, 1, UnitCategory::Infantry)).unwrap();
    game.add_unit(unit(3, 2, UnitCategory::Mech)).unwrap();
    deploy_all(&mut game, |id| match id.as_u32() {
        3 => HexCoord::new(0, -5),
        _ => HexCoord::new(0, 2),
    });

    advance_to(&mut game, GamePhase::Movement);
    while game.advance_to_actionable_turn().is_some() {
        if game.can_act(EntityId::new(1)) {
            let mut path = MovePath::new(EntityId::new(1));
            path.push_targeted(MoveStepType::Load, StepTarget::Entity(EntityId::new(2)));
            game.apply_move(path).unwrap();
        } else {
            let entity = game.first_eligible().unwrap();
            game.apply_move(MovePath::new(entity)).unwrap();
        }
    }
    assert!(game.current_turn().is_none());

    // Every movement turn is used up when the APC goes down
    game.remove_entity(EntityId::new(1), RemovalCondition::Devastated)
        .unwrap();
    let turn = game.advance_to_actionable_turn().unwrap();
    assert_eq!(
        turn,
        GameTurn::UnloadStranded {
            entities: [EntityId::new(2)].into_iter().collect()
        }
    );
    assert_eq!(game.first_eligible(), Some(EntityId::new(2)));
    game.apply_move(MovePath::new(EntityId::new(2))).unwrap();
    assert!(game.advance_to_actionable_turn().is_none());
}
