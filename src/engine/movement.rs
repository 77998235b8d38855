use crate::constants::STEPS_PER_CELL;
use crate::types::{Direction, Motion, PlayerView};
use crate::world::Grid;

use super::utils::offset;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Transitioning,
    Moved,
    Blocked,
}

impl StepOutcome {
    pub fn at_boundary(self) -> bool {
        !matches!(self, Self::Transitioning)
    }
}

pub fn target_cell(grid: &Grid, x: i32, y: i32, dir: Direction) -> Option<(i32, i32)> {
    let (mut nx, ny) = offset(x, y, dir);
    if dir.is_horizontal() {
        nx = grid.wrap_x(nx);
    }
    if ny < 0 || ny >= grid.size() || grid.is_obstacle(nx, ny) {
        return None;
    }
    Some((nx, ny))
}

pub fn is_direction_open(grid: &Grid, x: i32, y: i32, dir: Direction) -> bool {
    target_cell(grid, x, y, dir).is_some()
}

pub(super) fn advance_sub_step(motion: &mut Motion, grid: &Grid) -> bool {
    if motion.sub_step < 0 || motion.sub_step > STEPS_PER_CELL {
        motion.sub_step = 0;
    }
    motion.sub_step += 1;
    if motion.sub_step < STEPS_PER_CELL {
        return false;
    }

    motion.sub_step = 0;
    motion.x = grid.clamp_coord(motion.x);
    motion.y = grid.clamp_coord(motion.y);
    motion.prev_x = motion.x;
    motion.prev_y = motion.y;
    true
}

pub(super) fn try_move(motion: &mut Motion, grid: &Grid) -> StepOutcome {
    let Some((nx, ny)) = target_cell(grid, motion.x, motion.y, motion.dir) else {
        return StepOutcome::Blocked;
    };
    motion.x = nx;
    motion.y = ny;
    motion.animation_phase = motion.animation_phase.wrapping_add(1);
    StepOutcome::Moved
}

pub(super) fn step_player(player: &mut PlayerView, grid: &Grid) -> StepOutcome {
    if !advance_sub_step(&mut player.motion, grid) {
        return StepOutcome::Transitioning;
    }

    let pending = player.pending_dir;
    if pending != player.motion.dir {
        if is_direction_open(grid, player.motion.x, player.motion.y, pending) {
            player.motion.dir = pending;
        } else {
            player.pending_dir = player.motion.dir;
        }
    }
    try_move(&mut player.motion, grid)
}
