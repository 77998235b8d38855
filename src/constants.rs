use crate::types::{AdversaryIdentity, Direction, Vec2};

pub const MAP_SIZE: i32 = 26;
pub const STEPS_PER_CELL: i32 = 5;

pub const TICK_MS: u64 = 200;
pub const TICK_RATE: u32 = (1000 / TICK_MS) as u32;

pub const COIN_POINTS: i32 = 10;
pub const POWER_PELLET_POINTS: i32 = 50;
pub const ADVERSARY_POINTS: i32 = 200;
pub const POWER_DURATION_TICKS: u32 = 100;

pub const PLAYER_SPAWN: Vec2 = Vec2 { x: 12, y: 5 };
pub const PLAYER_SPAWN_DIRECTION: Direction = Direction::Right;

pub const ADVERSARY_SPAWNS: [(AdversaryIdentity, Vec2, Direction); 4] = [
    (AdversaryIdentity::Orange, Vec2 { x: 11, y: 10 }, Direction::Left),
    (AdversaryIdentity::Pink, Vec2 { x: 14, y: 10 }, Direction::Right),
    (AdversaryIdentity::Cyan, Vec2 { x: 11, y: 14 }, Direction::Left),
    (AdversaryIdentity::Red, Vec2 { x: 14, y: 14 }, Direction::Right),
];
