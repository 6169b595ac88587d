//! Initiative rolls and turn generation

use crate::core::{Player, PlayerId};
use crate::game::GameTurn;
use rand::Rng;
use rustc_hash::FxHashMap;

fn roll_2d6<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(1..=6) + rng.gen_range(1..=6)
}

/// Roll initiative for every non-observer player and return the turn order
///
/// Tied players keep rolling until every roll sequence differs. The lowest
/// total goes first.
pub fn roll_initiative<R: Rng + ?Sized>(players: &mut [Player], rng: &mut R) -> Vec<PlayerId> {
    for player in players.iter_mut() {
        player.initiative.clear();
    }
    let mut rolling: Vec<usize> = players
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.observer)
        .map(|(i, _)| i)
        .collect();

    while !rolling.is_empty() {
        for &i in &rolling {
            let roll = roll_2d6(rng);
            players[i].initiative.add_roll(roll);
        }
        // Anyone still sharing a sequence with another player rolls again
        let mut groups: FxHashMap<&[u8], usize> = FxHashMap::default();
        for &i in &rolling {
            *groups.entry(players[i].initiative.rolls()).or_default() += 1;
        }
        rolling = rolling
            .iter()
            .copied()
            .filter(|&i| groups.get(players[i].initiative.rolls()).copied().unwrap_or(0) > 1)
            .collect();
    }

    let mut order: Vec<&Player> = players.iter().filter(|p| !p.observer).collect();
    order.sort_by(|a, b| a.initiative.cmp(&b.initiative).then(a.id.cmp(&b.id)));
    order.into_iter().map(|p| p.id).collect()
}

/// Lay out one phase's turns
///
/// `counts` holds the number of units each player can act with, in
/// initiative order. Every pass gives each player with units left
/// `left / fewest_left` turns (at least one), so larger forces move
/// proportionally more units between their opponent's moves.
pub fn generate_turns(counts: &[(PlayerId, usize)]) -> Vec<GameTurn> {
    let mut left: Vec<(PlayerId, usize)> = counts.iter().copied().filter(|&(_, n)| n > 0).collect();
    let mut turns = Vec::with_capacity(left.iter().map(|&(_, n)| n).sum());

    while let Some(fewest) = left.iter().map(|&(_, n)| n).filter(|&n| n > 0).min() {
        for (player, n) in left.iter_mut() {
            if *n == 0 {
                continue;
            }
            let take = (*n / fewest).max(1).min(*n);
            for _ in 0..take {
                turns.push(GameTurn::Player { player: *player });
            }
            *n -= take;
        }
    }
    turns
}
