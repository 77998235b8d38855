use std::collections::VecDeque;

use crate::engine::{manhattan, target_cell, GameEngine};
use crate::rng::Rng;
use crate::types::{AdversaryMode, Direction, PlayerView};
use crate::world::Grid;

const DANGER_DISTANCE: i32 = 2;
const PROGRESS_WEIGHT: f32 = 4.0;
const REVERSE_PENALTY: f32 = 1.0;
const PATIENCE_DECISIONS: u32 = 24;

/// Greedy controller that plays the player side of a headless session.
/// Candidate moves are scored by maze distance to the nearest target.
#[derive(Clone, Debug)]
pub struct Autopilot {
    rng: Rng,
    last_remaining: Option<i32>,
    idle_decisions: u32,
}

impl Autopilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rng::new(seed),
            last_remaining: None,
            idle_decisions: 0,
        }
    }

    /// Direction request for the current tick. Decisions are only made while
    /// the player sits on a cell boundary, so at most one per cell.
    pub fn decide(&mut self, engine: &GameEngine) -> Option<Direction> {
        if !engine.is_playing() {
            return None;
        }
        let grid = engine.grid()?;
        let player = engine.player()?;
        if !player.alive || player.motion.sub_step != 0 {
            return None;
        }

        let remaining = grid.remaining_collectibles();
        match self.last_remaining {
            Some(last) if remaining >= last => self.idle_decisions += 1,
            _ => self.idle_decisions = 0,
        }
        self.last_remaining = Some(remaining);

        let threats: Vec<(i32, i32)> = engine
            .adversaries()
            .iter()
            .filter(|adversary| adversary.mode != AdversaryMode::Eliminated)
            .map(|adversary| (adversary.motion.x, adversary.motion.y))
            .collect();

        if player.power_ticks > 0 && !threats.is_empty() {
            return self.choose_chase_direction(grid, player, &threats);
        }
        self.choose_dot_direction(grid, player, &threats)
    }

    fn choose_chase_direction(
        &mut self,
        grid: &Grid,
        player: &PlayerView,
        threats: &[(i32, i32)],
    ) -> Option<Direction> {
        let distances = distance_field(grid, threats.iter().copied());
        self.pick_best(grid, player, |nx, ny| match distances.get(grid, nx, ny) {
            Some(dist) => -(dist as f32) * 1.5,
            None => f32::MIN,
        })
    }

    fn choose_dot_direction(
        &mut self,
        grid: &Grid,
        player: &PlayerView,
        threats: &[(i32, i32)],
    ) -> Option<Direction> {
        let distances = distance_field(grid, collectible_cells(grid));
        let here = distances.get(grid, player.motion.x, player.motion.y)?;
        // Adversaries pacing a corridor can fence off the last coins forever.
        let cautious = self.idle_decisions <= PATIENCE_DECISIONS;

        self.pick_best(grid, player, |nx, ny| {
            let after = distances.get(grid, nx, ny).unwrap_or(here + 1);
            let mut score = (here - after) as f32 * PROGRESS_WEIGHT;
            if !cautious {
                return score;
            }
            if let Some(dist) = threats
                .iter()
                .map(|(ax, ay)| manhattan(nx, ny, *ax, *ay))
                .min()
            {
                if dist <= DANGER_DISTANCE {
                    score -= (DANGER_DISTANCE + 1 - dist) as f32 * 20.0;
                }
            }
            score
        })
    }

    fn pick_best<F>(&mut self, grid: &Grid, player: &PlayerView, score_of: F) -> Option<Direction>
    where
        F: Fn(i32, i32) -> f32,
    {
        let (x, y) = (player.motion.x, player.motion.y);
        let mut best = None;
        let mut best_score = f32::NEG_INFINITY;

        for dir in Direction::SCAN_ORDER {
            let Some((nx, ny)) = target_cell(grid, x, y, dir) else {
                continue;
            };
            let mut score = score_of(nx, ny);
            if dir == player.motion.dir.opposite() {
                score -= REVERSE_PENALTY;
            }
            score += self.rng.next_f32() * 0.4;

            if score > best_score {
                best_score = score;
                best = Some(dir);
            }
        }
        best
    }
}

/// Step counts over open cells from the nearest source, following the same
/// moves entities can make.
struct DistanceField {
    steps: Vec<Option<i32>>,
}

impl DistanceField {
    fn get(&self, grid: &Grid, x: i32, y: i32) -> Option<i32> {
        if !(0..grid.size()).contains(&x) || !(0..grid.size()).contains(&y) {
            return None;
        }
        self.steps
            .get((y * grid.size() + x) as usize)
            .copied()
            .flatten()
    }
}

fn distance_field<I>(grid: &Grid, sources: I) -> DistanceField
where
    I: IntoIterator<Item = (i32, i32)>,
{
    let size = grid.size();
    let mut steps = vec![None; (size * size) as usize];
    let mut queue = VecDeque::new();

    for (x, y) in sources {
        if !(0..size).contains(&x) || !(0..size).contains(&y) {
            continue;
        }
        let idx = (y * size + x) as usize;
        if steps[idx].is_none() {
            steps[idx] = Some(0);
            queue.push_back((x, y, 0));
        }
    }

    while let Some((x, y, dist)) = queue.pop_front() {
        for dir in Direction::SCAN_ORDER {
            let Some((nx, ny)) = target_cell(grid, x, y, dir) else {
                continue;
            };
            let idx = (ny * size + nx) as usize;
            if steps[idx].is_none() {
                steps[idx] = Some(dist + 1);
                queue.push_back((nx, ny, dist + 1));
            }
        }
    }

    DistanceField { steps }
}

fn collectible_cells(grid: &Grid) -> impl Iterator<Item = (i32, i32)> + '_ {
    let size = grid.size();
    (0..size)
        .flat_map(move |cy| (0..size).map(move |cx| (cx, cy)))
        .filter(move |(cx, cy)| grid.cell(*cx, *cy).is_collectible())
}
