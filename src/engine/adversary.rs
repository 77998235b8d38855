use crate::types::{AdversaryMode, AdversaryView, Direction};
use crate::world::Grid;

use super::movement::{advance_sub_step, is_direction_open, try_move, StepOutcome};

pub fn choose_direction(grid: &Grid, x: i32, y: i32, current: Direction) -> Option<Direction> {
    if is_direction_open(grid, x, y, current) {
        return Some(current);
    }
    Direction::SCAN_ORDER
        .into_iter()
        .find(|dir| is_direction_open(grid, x, y, *dir))
}

pub(super) fn step_adversary(adversary: &mut AdversaryView, grid: &Grid) -> StepOutcome {
    if adversary.mode == AdversaryMode::Eliminated {
        return StepOutcome::Transitioning;
    }
    if !advance_sub_step(&mut adversary.motion, grid) {
        return StepOutcome::Transitioning;
    }

    let motion = &mut adversary.motion;
    match choose_direction(grid, motion.x, motion.y, motion.dir) {
        Some(dir) => {
            motion.dir = dir;
            try_move(motion, grid)
        }
        None => StepOutcome::Blocked,
    }
}
