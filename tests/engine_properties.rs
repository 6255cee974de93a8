use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tank_maze::generator::seal_count;
use tank_maze::{generate_maze, Direction, Engine, STARTING_SHELLS};

fn random_direction(rng: &mut StdRng) -> Direction {
    *Direction::CARDINALS.choose(rng).unwrap()
}

#[test]
fn random_play_keeps_every_invariant() {
    for seed in 0..30 {
        let mut engine = Engine::seeded(6, 8, seed).unwrap();
        let mut driver = StdRng::seed_from_u64(seed + 1000);
        assert_eq!(engine.move_history().len(), 1);
        assert_ne!(engine.goal(), engine.actor().pos());

        let mut shells = engine.actor().shells();
        for _ in 0..400 {
            let before = engine.actor().pos();
            let moved = match driver.gen_range(0..10) {
                0 => {
                    engine.aim_cannon(random_direction(&mut driver));
                    false
                }
                1 => {
                    engine.blast_wall();
                    false
                }
                _ => engine.move_actor(random_direction(&mut driver)),
            };

            assert!(engine.grid().is_consistent());
            let history = engine.move_history();
            assert!(!history.is_empty());
            assert_eq!(*history.last().unwrap(), engine.actor().pos());
            let unique: HashSet<_> = history.iter().collect();
            assert_eq!(unique.len(), history.len());
            if !moved {
                assert_eq!(engine.actor().pos(), before);
            }

            let now = engine.actor().shells();
            assert!(now <= shells);
            shells = now;

            assert_eq!(engine.is_solved(), engine.actor().pos() == engine.goal());
        }
    }
}

#[test]
fn history_starts_where_the_tank_starts() {
    for seed in 0..10 {
        let mut engine = Engine::seeded(5, 5, seed).unwrap();
        let start = engine.actor().pos();
        assert_eq!(engine.move_history(), &[start]);

        let mut driver = StdRng::seed_from_u64(seed);
        for _ in 0..200 {
            engine.move_actor(random_direction(&mut driver));
            assert_eq!(engine.move_history()[0], start);
        }
    }
}

#[test]
fn first_successful_move_grows_history_to_two() {
    let mut engine = Engine::seeded(5, 5, 77).unwrap();
    assert_eq!(engine.move_history().len(), 1);

    // Sealing may wall the tank in; blast a way out if needed.
    let start = engine.actor().pos();
    let exit = Direction::CARDINALS
        .into_iter()
        .find(|d| engine.can_move(start, *d))
        .unwrap_or_else(|| {
            let dir = Direction::CARDINALS
                .into_iter()
                .find(|d| engine.grid().neighbor(start, *d).is_some())
                .unwrap();
            assert!(engine.aim_cannon(dir));
            assert!(engine.blast_wall());
            dir
        });

    assert!(engine.move_actor(exit));
    assert_eq!(engine.move_history().len(), 2);
}

#[test]
fn sealing_never_exceeds_its_budget() {
    for (rows, cols) in [(2, 2), (3, 5), (10, 10), (1, 9), (12, 4)] {
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let maze = generate_maze(&mut rng, rows, cols).unwrap();
            assert!(maze.seal.attempts <= seal_count(rows, cols));
            assert_eq!(maze.seal.resealed + maze.seal.discarded, maze.seal.attempts);
            assert_eq!(maze.carved_path.len(), rows * cols - 1);
            assert_eq!(
                maze.grid.open_passages(),
                rows * cols - 1 - maze.seal.resealed
            );
            assert!(maze.grid.is_consistent());
        }
    }
}

#[test]
fn sealing_uses_its_full_budget_on_regular_mazes() {
    let mut rng = StdRng::seed_from_u64(2024);
    let maze = generate_maze(&mut rng, 10, 10).unwrap();
    assert_eq!(maze.seal.attempts, 25);
}

#[test]
fn each_maze_hands_out_fresh_shells() {
    let mut engine = Engine::seeded(4, 4, 5).unwrap();
    while engine.actor().shells() > 0 {
        assert!(engine.aim_cannon(Direction::North));
        assert!(engine.blast_wall());
    }
    assert!(!engine.aim_cannon(Direction::North));

    engine.restart().unwrap();
    assert_eq!(engine.actor().shells(), STARTING_SHELLS);
    assert!(engine.aim_cannon(Direction::North));
}
