use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Wall,
    Pickup,
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    InProgress,
    Win,
    Loss,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupAccounting {
    LiveGrid,
    PerBranch,
}

impl PickupAccounting {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "live_grid" => Some(Self::LiveGrid),
            "per_branch" => Some(Self::PerBranch),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: usize,
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GridView {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PickupCollected { x: i32, y: i32 },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: i32,
    #[serde(rename = "pickupsCollected")]
    pub pickups_collected: i32,
    #[serde(rename = "pickupsTotal")]
    pub pickups_total: i32,
    pub terminal: bool,
    pub outcome: Outcome,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub outcome: Outcome,
    pub ticks: u64,
    pub score: i32,
    #[serde(rename = "pickupsCollected")]
    pub pickups_collected: i32,
    #[serde(rename = "pickupsTotal")]
    pub pickups_total: i32,
}
