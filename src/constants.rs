use crate::types::Vec2;

pub const PLAYER_DECISION_INTERVAL: u64 = 15;
pub const GHOST_DECISION_INTERVAL: u64 = 20;

pub const SEARCH_DEPTH: u32 = 3;
pub const PICKUP_SCORE: i32 = 10;

pub const GHOST_MEMORY_LEN: usize = 5;
pub const RECENT_AVOID_WINDOW: usize = 2;

pub const DISTANCE_WEIGHT: f64 = 10.0;
pub const ADJACENT_PICKUP_WEIGHT: f64 = 10.0;
pub const CURRENT_PICKUP_WEIGHT: f64 = 20.0;
pub const NO_GHOST_DISTANCE: i32 = 10;

pub const DEFAULT_PLAYER_START: Vec2 = Vec2 { x: 10, y: 15 };
pub const DEFAULT_GHOST_STARTS: [Vec2; 1] = [Vec2 { x: 9, y: 9 }];

// 20x21 layout: '#' wall, '.' pickup, ' ' open floor.
pub const DEFAULT_MAP_ROWS: [&str; 21] = [
    "####################",
    "#........##........#",
    "#.##.###.##.###.##.#",
    "#..................#",
    "#.##.#.######.#.##.#",
    "#....#...##...#....#",
    "####.### ## ###.####",
    "####.#        #.####",
    "####.# ##  ## #.####",
    "    .  #    #  .    ",
    "####.# ###### #.####",
    "####.#        #.####",
    "####.### ## ###.####",
    "#........##........#",
    "#.##.###.##.###.##.#",
    "#..#............#..#",
    "##.#.#.######.#.#.##",
    "#....#...##...#....#",
    "#.######.##.######.#",
    "#..................#",
    "####################",
];
