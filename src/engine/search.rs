use crate::constants::{
    ADJACENT_PICKUP_WEIGHT, CURRENT_PICKUP_WEIGHT, DISTANCE_WEIGHT, NO_GHOST_DISTANCE,
};
use crate::grid::{neighbors_of, Grid};
use crate::types::{PickupAccounting, Vec2};

use super::utils::manhattan;

/// Scores a hypothetical configuration from the player's side. Higher is
/// better for the player; `-inf` marks a ghost collision, `+inf` a finished
/// collection.
pub fn evaluate(grid: &Grid, player: Vec2, ghosts: &[Vec2]) -> f64 {
    evaluate_branch(grid, player, ghosts, PickupAccounting::LiveGrid, &[])
}

/// Depth-limited minimax over player moves (maximizing) and the first
/// ghost's moves (minimizing). Returns the score of the best line and the
/// chosen move for the side to act. The move is `None` when there is
/// nothing to choose, such as an already-terminal position or a walled-in
/// mover.
pub fn search(
    grid: &Grid,
    player: Vec2,
    ghosts: &[Vec2],
    depth: u32,
    maximizing: bool,
    accounting: PickupAccounting,
) -> (f64, Option<Vec2>) {
    let mut collected = Vec::new();
    search_branch(
        grid,
        player,
        ghosts,
        depth,
        maximizing,
        accounting,
        &mut collected,
    )
}

fn search_branch(
    grid: &Grid,
    player: Vec2,
    ghosts: &[Vec2],
    depth: u32,
    maximizing: bool,
    accounting: PickupAccounting,
    collected: &mut Vec<Vec2>,
) -> (f64, Option<Vec2>) {
    if depth == 0 || is_terminal(grid, player, ghosts, accounting, collected) {
        return (
            evaluate_branch(grid, player, ghosts, accounting, collected),
            None,
        );
    }

    if maximizing {
        // Oscillation memory never crosses into the search: candidates are
        // generated against a fresh empty history on every ply.
        let moves = grid.legal_moves(player, true, &[]);
        if moves.is_empty() {
            return (
                evaluate_branch(grid, player, ghosts, accounting, collected),
                None,
            );
        }

        let mut best_score = f64::NEG_INFINITY;
        let mut best_move = None;
        for candidate in moves {
            let collects = accounting == PickupAccounting::PerBranch
                && grid.pickup_at(candidate)
                && !collected.contains(&candidate);
            if collects {
                collected.push(candidate);
            }
            let (score, _) = search_branch(
                grid,
                candidate,
                ghosts,
                depth - 1,
                false,
                accounting,
                collected,
            );
            if collects {
                collected.pop();
            }
            // Strict comparison: the first candidate keeps ties.
            if score > best_score {
                best_score = score;
                best_move = Some(candidate);
            }
        }
        (best_score, best_move)
    } else {
        let Some(&lead_ghost) = ghosts.first() else {
            // No adversary to move on this ply.
            return (
                evaluate_branch(grid, player, ghosts, accounting, collected),
                None,
            );
        };

        let mut worst_score = f64::INFINITY;
        let mut worst_move = None;
        for candidate in grid.legal_moves(lead_ghost, true, &[]) {
            let (score, _) = search_branch(
                grid,
                player,
                &[candidate],
                depth - 1,
                true,
                accounting,
                collected,
            );
            if score < worst_score {
                worst_score = score;
                worst_move = Some(candidate);
            }
        }
        (worst_score, worst_move)
    }
}

fn is_terminal(
    grid: &Grid,
    player: Vec2,
    ghosts: &[Vec2],
    accounting: PickupAccounting,
    collected: &[Vec2],
) -> bool {
    if ghosts.contains(&player) {
        return true;
    }
    collection_finished(grid, player, accounting, collected)
}

fn evaluate_branch(
    grid: &Grid,
    player: Vec2,
    ghosts: &[Vec2],
    accounting: PickupAccounting,
    collected: &[Vec2],
) -> f64 {
    if ghosts.contains(&player) {
        return f64::NEG_INFINITY;
    }
    if collection_finished(grid, player, accounting, collected) {
        return f64::INFINITY;
    }

    let min_distance = ghosts
        .iter()
        .map(|ghost| manhattan(player, *ghost))
        .min()
        .unwrap_or(NO_GHOST_DISTANCE);
    let adjacent_pickups = neighbors_of(player)
        .iter()
        .filter(|next| pickup_in_branch(grid, **next, collected))
        .count();
    let current_pickup = if pickup_in_branch(grid, player, collected) {
        CURRENT_PICKUP_WEIGHT
    } else {
        0.0
    };

    DISTANCE_WEIGHT * f64::from(min_distance)
        + ADJACENT_PICKUP_WEIGHT * adjacent_pickups as f64
        + current_pickup
}

// Live-grid mode reads the real grid mid-search: the branch wins when it
// stands on the last pickup the real grid still holds. Per-branch mode
// instead subtracts the cells this branch already walked over.
fn collection_finished(
    grid: &Grid,
    player: Vec2,
    accounting: PickupAccounting,
    collected: &[Vec2],
) -> bool {
    match accounting {
        PickupAccounting::LiveGrid => grid.pickup_at(player) && grid.remaining_pickups() == 1,
        PickupAccounting::PerBranch => grid.remaining_pickups() - collected.len() as i32 == 0,
    }
}

fn pickup_in_branch(grid: &Grid, pos: Vec2, collected: &[Vec2]) -> bool {
    grid.pickup_at(pos) && !collected.contains(&pos)
}

#[cfg(test)]
mod tests {
    use crate::constants::{DEFAULT_GHOST_STARTS, DEFAULT_MAP_ROWS, DEFAULT_PLAYER_START};
    use crate::grid::{Grid, MapTemplate};
    use crate::types::{PickupAccounting, Vec2};

    use super::{evaluate, search};

    fn grid_from(rows: &[&str]) -> Grid {
        Grid::from_template(&MapTemplate::parse(rows).expect("test template parses"))
    }

    fn open_room() -> Grid {
        grid_from(&[
            "#########",
            "#       #",
            "#       #",
            "#   .   #",
            "#       #",
            "#########",
        ])
    }

    #[test]
    fn evaluate_is_negative_infinity_exactly_on_ghost_contact() {
        let grid = open_room();
        let ghost = Vec2 { x: 1, y: 2 };
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let pos = Vec2 { x, y };
                if !grid.is_legal(pos) {
                    continue;
                }
                let score = evaluate(&grid, pos, &[ghost]);
                if pos == ghost {
                    assert_eq!(score, f64::NEG_INFINITY);
                } else {
                    assert_ne!(score, f64::NEG_INFINITY);
                }
            }
        }
    }

    #[test]
    fn evaluate_is_positive_infinity_on_the_last_pickup() {
        let grid = open_room();
        assert_eq!(grid.remaining_pickups(), 1);
        let score = evaluate(&grid, Vec2 { x: 4, y: 3 }, &[Vec2 { x: 1, y: 1 }]);
        assert_eq!(score, f64::INFINITY);
    }

    #[test]
    fn evaluate_weights_distance_adjacency_and_current_cell() {
        let grid = open_room();
        let ghost = Vec2 { x: 6, y: 4 };

        // Plain floor, ghost 6 away: distance term only.
        assert_eq!(evaluate(&grid, Vec2 { x: 2, y: 2 }, &[ghost]), 60.0);

        // One pickup neighbor, ghost 4 away.
        assert_eq!(evaluate(&grid, Vec2 { x: 4, y: 2 }, &[ghost]), 50.0);

        // Standing on a pickup that is not the last one.
        let two_pickups = grid_from(&[
            "#########",
            "#.      #",
            "#       #",
            "#   .   #",
            "#       #",
            "#########",
        ]);
        assert_eq!(
            evaluate(&two_pickups, Vec2 { x: 4, y: 3 }, &[ghost]),
            30.0 + 20.0
        );
    }

    #[test]
    fn evaluate_uses_fixed_distance_without_ghosts() {
        let grid = open_room();
        assert_eq!(evaluate(&grid, Vec2 { x: 2, y: 2 }, &[]), 100.0);
    }

    #[test]
    fn depth_zero_returns_the_evaluation_and_no_move() {
        let grid = open_room();
        let player = Vec2 { x: 2, y: 2 };
        let ghosts = [Vec2 { x: 6, y: 4 }];
        let (score, chosen) = search(
            &grid,
            player,
            &ghosts,
            0,
            true,
            PickupAccounting::LiveGrid,
        );
        assert_eq!(score, evaluate(&grid, player, &ghosts));
        assert_eq!(chosen, None);

        let (score, chosen) = search(
            &grid,
            player,
            &ghosts,
            0,
            false,
            PickupAccounting::LiveGrid,
        );
        assert_eq!(score, evaluate(&grid, player, &ghosts));
        assert_eq!(chosen, None);
    }

    #[test]
    fn maximizing_result_is_always_a_legal_move() {
        let template =
            MapTemplate::parse(&DEFAULT_MAP_ROWS).expect("built-in template parses");
        let grid = Grid::from_template(&template);
        let ghosts: Vec<Vec2> = DEFAULT_GHOST_STARTS.to_vec();

        let (_, chosen) = search(
            &grid,
            DEFAULT_PLAYER_START,
            &ghosts,
            3,
            true,
            PickupAccounting::LiveGrid,
        );
        let chosen = chosen.expect("open position has candidates");
        assert!(grid
            .legal_moves(DEFAULT_PLAYER_START, true, &[])
            .contains(&chosen));
    }

    #[test]
    fn search_is_deterministic_for_identical_arguments() {
        let template =
            MapTemplate::parse(&DEFAULT_MAP_ROWS).expect("built-in template parses");
        let grid = Grid::from_template(&template);
        let ghosts: Vec<Vec2> = DEFAULT_GHOST_STARTS.to_vec();

        let first = search(
            &grid,
            DEFAULT_PLAYER_START,
            &ghosts,
            3,
            true,
            PickupAccounting::LiveGrid,
        );
        let second = search(
            &grid,
            DEFAULT_PLAYER_START,
            &ghosts,
            3,
            true,
            PickupAccounting::LiveGrid,
        );
        assert_eq!(first, second);
    }

    #[test]
    fn first_candidate_wins_ties() {
        let grid = grid_from(&["#####", "#   #", "#   #", "#   #", "#####"]);
        // Every move from the center scores the same; the fixed order makes
        // "up" the winner.
        let (score, chosen) = search(
            &grid,
            Vec2 { x: 2, y: 2 },
            &[],
            1,
            true,
            PickupAccounting::LiveGrid,
        );
        assert_eq!(score, 100.0);
        assert_eq!(chosen, Some(Vec2 { x: 2, y: 1 }));
    }

    #[test]
    fn maximizer_retreats_from_an_approaching_ghost() {
        let grid = grid_from(&["#######", "#     #", "#######"]);
        let (score, chosen) = search(
            &grid,
            Vec2 { x: 2, y: 1 },
            &[Vec2 { x: 4, y: 1 }],
            2,
            true,
            PickupAccounting::LiveGrid,
        );
        // Stepping toward the ghost lets it answer with a capture.
        assert_eq!(chosen, Some(Vec2 { x: 1, y: 1 }));
        assert_eq!(score, 20.0);
    }

    #[test]
    fn walled_in_maximizer_returns_no_move() {
        let grid = grid_from(&["###", "# #", "###"]);
        let (score, chosen) = search(
            &grid,
            Vec2 { x: 1, y: 1 },
            &[],
            3,
            true,
            PickupAccounting::LiveGrid,
        );
        assert_eq!(score, 100.0);
        assert_eq!(chosen, None);
    }

    #[test]
    fn walled_in_minimizer_returns_infinity_and_no_move() {
        let grid = grid_from(&["#####", "# # #", "#####"]);
        let (score, chosen) = search(
            &grid,
            Vec2 { x: 1, y: 1 },
            &[Vec2 { x: 3, y: 1 }],
            2,
            false,
            PickupAccounting::LiveGrid,
        );
        assert_eq!(score, f64::INFINITY);
        assert_eq!(chosen, None);
    }

    #[test]
    fn collecting_the_final_pickup_scores_infinity() {
        let grid = grid_from(&["#####", "# .##", "#####"]);
        for accounting in [PickupAccounting::LiveGrid, PickupAccounting::PerBranch] {
            let (score, chosen) = search(&grid, Vec2 { x: 1, y: 1 }, &[], 3, true, accounting);
            assert_eq!(score, f64::INFINITY, "{accounting:?}");
            assert_eq!(chosen, Some(Vec2 { x: 2, y: 1 }), "{accounting:?}");
        }
    }

    #[test]
    fn accounting_modes_score_collected_cells_differently() {
        let grid = grid_from(&["#####", "# ..#", "#####"]);
        let player = Vec2 { x: 1, y: 1 };

        // Live-grid keeps crediting the pickup under the moved player.
        let (live, live_move) =
            search(&grid, player, &[], 3, true, PickupAccounting::LiveGrid);
        assert_eq!(live, 130.0);
        assert_eq!(live_move, Some(Vec2 { x: 2, y: 1 }));

        // Per-branch treats the cell as eaten on arrival.
        let (branch, branch_move) =
            search(&grid, player, &[], 3, true, PickupAccounting::PerBranch);
        assert_eq!(branch, 110.0);
        assert_eq!(branch_move, Some(Vec2 { x: 2, y: 1 }));
    }
}
