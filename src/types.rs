use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    pub const SCAN_ORDER: [Direction; 4] = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "right" => Some(Self::Right),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "up" => Some(Self::Up),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Up => (0, -1),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Up => Self::Down,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Obstacle,
    Empty,
    Coin,
    Power,
}

impl CellType {
    pub fn is_collectible(self) -> bool {
        matches!(self, Self::Coin | Self::Power)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdversaryMode {
    Normal,
    Fleeing,
    Eliminated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdversaryIdentity {
    Orange,
    Pink,
    Cyan,
    Red,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    NotStarted,
    Playing,
    Failed,
    Won,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Motion {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "prevX")]
    pub prev_x: i32,
    #[serde(rename = "prevY")]
    pub prev_y: i32,
    pub dir: Direction,
    #[serde(rename = "subStep")]
    pub sub_step: i32,
    #[serde(rename = "animationPhase")]
    pub animation_phase: u32,
}

impl Motion {
    pub fn at(cell: Vec2, dir: Direction) -> Self {
        Self {
            x: cell.x,
            y: cell.y,
            prev_x: cell.x,
            prev_y: cell.y,
            dir,
            sub_step: 0,
            animation_phase: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    #[serde(flatten)]
    pub motion: Motion,
    #[serde(rename = "pendingDir")]
    pub pending_dir: Direction,
    pub alive: bool,
    pub score: i32,
    #[serde(rename = "powerTicks")]
    pub power_ticks: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct AdversaryView {
    pub identity: AdversaryIdentity,
    #[serde(flatten)]
    pub motion: Motion,
    pub mode: AdversaryMode,
}

#[derive(Clone, Debug, Serialize)]
pub struct GridInit {
    pub size: i32,
    pub tiles: Vec<String>,
    #[serde(rename = "remainingCollectibles")]
    pub remaining_collectibles: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    SessionStarted,
    CoinEaten {
        x: i32,
        y: i32,
    },
    PowerPelletEaten {
        x: i32,
        y: i32,
    },
    PowerExpired,
    AdversaryEliminated {
        identity: AdversaryIdentity,
        x: i32,
        y: i32,
    },
    PlayerDown {
        by: AdversaryIdentity,
    },
    SessionWon,
    SessionFailed,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub mode: GameMode,
    #[serde(rename = "remainingCollectibles")]
    pub remaining_collectibles: i32,
    pub player: Option<PlayerView>,
    pub adversaries: Vec<AdversaryView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub outcome: GameMode,
    pub ticks: u64,
    pub score: i32,
    #[serde(rename = "coinsEaten")]
    pub coins_eaten: i32,
    #[serde(rename = "powerPelletsEaten")]
    pub power_pellets_eaten: i32,
    #[serde(rename = "adversariesEliminated")]
    pub adversaries_eliminated: i32,
    #[serde(rename = "remainingCollectibles")]
    pub remaining_collectibles: i32,
}
