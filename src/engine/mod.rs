use crate::constants::{
    DEFAULT_GHOST_STARTS, DEFAULT_MAP_ROWS, DEFAULT_PLAYER_START, GHOST_DECISION_INTERVAL,
    GHOST_MEMORY_LEN, PICKUP_SCORE, PLAYER_DECISION_INTERVAL, SEARCH_DEPTH,
};
use crate::grid::{Grid, MapTemplate};
use crate::types::{
    Cell, GameSummary, GhostView, GridView, Outcome, PickupAccounting, PlayerView, RuntimeEvent,
    Snapshot, Vec2,
};

pub mod search;
mod utils;

use self::utils::manhattan;

#[derive(Clone, Debug)]
struct AgentInternal {
    pos: Vec2,
    recent_positions: Vec<Vec2>,
}

impl AgentInternal {
    fn at(pos: Vec2) -> Self {
        Self {
            pos,
            recent_positions: Vec::new(),
        }
    }
}

/// Static per-episode inputs: the map plus where everyone starts.
#[derive(Clone, Debug)]
pub struct EpisodeSetup {
    pub template: MapTemplate,
    pub player_start: Vec2,
    pub ghost_starts: Vec<Vec2>,
}

impl Default for EpisodeSetup {
    fn default() -> Self {
        Self {
            template: MapTemplate::parse(&DEFAULT_MAP_ROWS).expect("built-in template is valid"),
            player_start: DEFAULT_PLAYER_START,
            ghost_starts: DEFAULT_GHOST_STARTS.to_vec(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub search_depth: Option<u32>,
    pub pickup_accounting: PickupAccounting,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            search_depth: None,
            pickup_accounting: PickupAccounting::LiveGrid,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    setup: EpisodeSetup,
    options: GameEngineOptions,
    search_depth: u32,

    grid: Grid,
    player: AgentInternal,
    ghosts: Vec<AgentInternal>,
    pickups_collected: i32,
    pickups_total: i32,
    score: i32,
    terminal: bool,
    outcome: Outcome,
    tick_counter: u64,
    events: Vec<RuntimeEvent>,
}

impl GameEngine {
    pub fn new(setup: EpisodeSetup, options: GameEngineOptions) -> Self {
        let grid = Grid::from_template(&setup.template);
        let pickups_total = grid.remaining_pickups();
        let search_depth = options.search_depth.unwrap_or(SEARCH_DEPTH);
        let player = AgentInternal::at(setup.player_start);
        let ghosts = setup.ghost_starts.iter().copied().map(AgentInternal::at).collect();

        Self {
            setup,
            options,
            search_depth,
            grid,
            player,
            ghosts,
            pickups_collected: 0,
            pickups_total,
            score: 0,
            terminal: false,
            outcome: Outcome::InProgress,
            tick_counter: 0,
            events: Vec::new(),
        }
    }

    /// Rebuilds the whole episode from the retained setup in one assignment;
    /// no reader can observe a half-reset state.
    pub fn reset(&mut self) {
        *self = GameEngine::new(self.setup.clone(), self.options.clone());
    }

    /// Drives one decision tick. The caller owns the tick index; the two
    /// controller cadences key off it, the collision check runs every tick.
    /// Once the episode is terminal this is a no-op until `reset`.
    pub fn on_tick(&mut self, tick_index: u64) {
        if self.terminal {
            return;
        }
        self.tick_counter += 1;

        if tick_index % PLAYER_DECISION_INTERVAL == 0 {
            self.run_player_controller();
        }
        if tick_index % GHOST_DECISION_INTERVAL == 0 {
            self.run_ghost_controller();
        }
        self.resolve_collisions();
    }

    fn run_player_controller(&mut self) {
        let ghost_positions: Vec<Vec2> = self.ghosts.iter().map(|ghost| ghost.pos).collect();
        let (_, chosen) = search::search(
            &self.grid,
            self.player.pos,
            &ghost_positions,
            self.search_depth,
            true,
            self.options.pickup_accounting,
        );
        let Some(next) = chosen else {
            return;
        };

        self.player.pos = next;
        if self.grid.collect_pickup(next) {
            self.pickups_collected += 1;
            self.score += PICKUP_SCORE;
            self.events
                .push(RuntimeEvent::PickupCollected { x: next.x, y: next.y });
            if self.pickups_collected >= self.pickups_total {
                self.outcome = Outcome::Win;
                self.terminal = true;
            }
        }
    }

    fn run_ghost_controller(&mut self) {
        let player_pos = self.player.pos;
        for ghost in &mut self.ghosts {
            ghost.recent_positions.push(ghost.pos);
            if ghost.recent_positions.len() > GHOST_MEMORY_LEN {
                ghost.recent_positions.remove(0);
            }

            // Greedy pursuit: the first candidate at the least Manhattan
            // distance to the player wins.
            let mut best: Option<(i32, Vec2)> = None;
            for candidate in self
                .grid
                .legal_moves(ghost.pos, true, &ghost.recent_positions)
            {
                let dist = manhattan(candidate, player_pos);
                if best.map(|(least, _)| dist < least).unwrap_or(true) {
                    best = Some((dist, candidate));
                }
            }
            if let Some((_, next)) = best {
                ghost.pos = next;
            }
        }
    }

    fn resolve_collisions(&mut self) {
        if self.ghosts.iter().any(|ghost| ghost.pos == self.player.pos) {
            self.terminal = true;
            self.outcome = Outcome::Loss;
        }
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn pickups_collected(&self) -> i32 {
        self.pickups_collected
    }

    pub fn pickups_total(&self) -> i32 {
        self.pickups_total
    }

    pub fn terminal(&self) -> bool {
        self.terminal
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn player_position(&self) -> Vec2 {
        self.player.pos
    }

    pub fn ghost_positions(&self) -> Vec<Vec2> {
        self.ghosts.iter().map(|ghost| ghost.pos).collect()
    }

    pub fn cell_at(&self, pos: Vec2) -> Option<Cell> {
        self.grid.cell_at(pos)
    }

    pub fn grid_view(&self) -> GridView {
        GridView {
            width: self.grid.width(),
            height: self.grid.height(),
            tiles: self.grid.tile_rows(),
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            score: self.score,
            pickups_collected: self.pickups_collected,
            pickups_total: self.pickups_total,
            terminal: self.terminal,
            outcome: self.outcome,
            player: PlayerView {
                x: self.player.pos.x,
                y: self.player.pos.y,
            },
            ghosts: self
                .ghosts
                .iter()
                .enumerate()
                .map(|(id, ghost)| GhostView {
                    id,
                    x: ghost.pos.x,
                    y: ghost.pos.y,
                })
                .collect(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            outcome: self.outcome,
            ticks: self.tick_counter,
            score: self.score,
            pickups_collected: self.pickups_collected,
            pickups_total: self.pickups_total,
        }
    }
}
