use crate::constants::{
    ADVERSARY_POINTS, ADVERSARY_SPAWNS, PLAYER_SPAWN, PLAYER_SPAWN_DIRECTION,
    POWER_DURATION_TICKS,
};
use crate::types::{
    AdversaryIdentity, AdversaryMode, AdversaryView, Direction, GameMode, GridInit, Motion,
    PlayerView, RuntimeEvent, SessionSummary, Snapshot, Vec2,
};
use crate::world::{build_grid, to_grid_init, Grid};

mod adversary;
mod interaction;
mod movement;
mod spawn_system;
mod utils;

pub use self::adversary::choose_direction;
pub use self::movement::{is_direction_open, target_cell, StepOutcome};
pub use self::utils::manhattan;

use self::adversary::step_adversary;
use self::movement::step_player;

#[derive(Clone, Debug, Default)]
struct SessionStats {
    coins: i32,
    power_pellets: i32,
    adversaries: i32,
}

#[derive(Clone, Debug)]
struct PlayerInternal {
    view: PlayerView,
    stats: SessionStats,
}

#[derive(Clone, Debug)]
pub(crate) struct Session {
    grid: Grid,
    player: PlayerInternal,
    adversaries: Vec<AdversaryView>,
}

impl Session {
    fn advance(&mut self, events: &mut Vec<RuntimeEvent>) -> Option<GameMode> {
        if self.grid.remaining_collectibles() <= 0 {
            return Some(GameMode::Won);
        }
        if !self.player.view.alive {
            return Some(GameMode::Failed);
        }

        if step_player(&mut self.player.view, &self.grid) == StepOutcome::Moved {
            self.apply_player_pickup(events);
        }
        self.decay_power(events);
        self.sync_adversary_modes();

        if self.grid.remaining_collectibles() <= 0 {
            return Some(GameMode::Won);
        }

        self.update_adversaries(events);

        if !self.player.view.alive {
            return Some(GameMode::Failed);
        }
        None
    }
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    mode: GameMode,
    template: Grid,
    session: Option<Session>,
    events: Vec<RuntimeEvent>,
    tick_counter: u64,
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEngine {
    pub fn new() -> Self {
        Self {
            mode: GameMode::NotStarted,
            template: build_grid(),
            session: None,
            events: Vec::new(),
            tick_counter: 0,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn is_playing(&self) -> bool {
        self.mode == GameMode::Playing
    }

    pub fn start(&mut self) -> bool {
        self.start_with(Session::new(self.template.clone()))
    }

    fn start_with(&mut self, session: Session) -> bool {
        if self.mode != GameMode::NotStarted {
            return false;
        }
        self.session = Some(session);
        self.tick_counter = 0;
        self.mode = GameMode::Playing;
        self.events.push(RuntimeEvent::SessionStarted);
        true
    }

    pub fn restart(&mut self) -> bool {
        if !matches!(self.mode, GameMode::Failed | GameMode::Won) {
            return false;
        }
        self.mode = GameMode::NotStarted;
        true
    }

    pub fn receive_input(&mut self, dir: Direction) {
        if self.mode != GameMode::Playing {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.player.view.pending_dir = dir;
        }
    }

    pub fn step(&mut self) {
        if self.mode != GameMode::Playing {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let reached = session.advance(&mut self.events);
        self.tick_counter += 1;
        if let Some(mode) = reached {
            self.finish(mode);
        }
    }

    fn finish(&mut self, mode: GameMode) {
        if self.mode != GameMode::Playing {
            return;
        }
        self.mode = mode;
        match mode {
            GameMode::Won => self.events.push(RuntimeEvent::SessionWon),
            GameMode::Failed => self.events.push(RuntimeEvent::SessionFailed),
            GameMode::NotStarted | GameMode::Playing => {}
        }
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.session.as_ref().map(|session| &session.grid)
    }

    pub fn player(&self) -> Option<&PlayerView> {
        self.session.as_ref().map(|session| &session.player.view)
    }

    pub fn adversaries(&self) -> &[AdversaryView] {
        self.session
            .as_ref()
            .map(|session| session.adversaries.as_slice())
            .unwrap_or(&[])
    }

    pub fn remaining_collectibles(&self) -> i32 {
        self.grid().unwrap_or(&self.template).remaining_collectibles()
    }

    pub fn get_grid_init(&self) -> GridInit {
        to_grid_init(self.grid().unwrap_or(&self.template))
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            mode: self.mode,
            remaining_collectibles: self.remaining_collectibles(),
            player: self.player().cloned(),
            adversaries: self.adversaries().to_vec(),
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

    pub fn build_summary(&self) -> Option<SessionSummary> {
        let session = self.session.as_ref()?;
        Some(SessionSummary {
            outcome: self.mode,
            ticks: self.tick_counter,
            score: session.player.view.score,
            coins_eaten: session.player.stats.coins,
            power_pellets_eaten: session.player.stats.power_pellets,
            adversaries_eliminated: session.player.stats.adversaries,
            remaining_collectibles: session.grid.remaining_collectibles(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{GameEngine, Session};
    use crate::constants::{
        ADVERSARY_POINTS, COIN_POINTS, MAP_SIZE, POWER_DURATION_TICKS, STEPS_PER_CELL,
    };
    use crate::types::{AdversaryIdentity, AdversaryMode, Direction, GameMode, RuntimeEvent, Vec2};
    use crate::world::grid_from_layout;

    fn engine_with(
        rows: &[&str],
        player: (i32, i32, Direction),
        adversaries: &[(i32, i32, Direction)],
    ) -> GameEngine {
        let roster: Vec<_> = adversaries
            .iter()
            .map(|(x, y, dir)| (AdversaryIdentity::Pink, Vec2 { x: *x, y: *y }, *dir))
            .collect();
        let session = Session::with_roster(
            grid_from_layout(rows),
            (
                Vec2 {
                    x: player.0,
                    y: player.1,
                },
                player.2,
            ),
            &roster,
        );
        let mut engine = GameEngine::new();
        assert!(engine.start_with(session));
        engine
    }

    fn run_ticks(engine: &mut GameEngine, ticks: i32) {
        for _ in 0..ticks {
            engine.step();
        }
    }

    fn player_cell(engine: &GameEngine) -> (i32, i32) {
        let player = engine.player().expect("player");
        (player.motion.x, player.motion.y)
    }

    fn assert_invariants(engine: &GameEngine) {
        let grid = engine.grid().expect("grid");
        assert_eq!(grid.remaining_collectibles(), grid.count_collectibles());

        let player = engine.player().expect("player");
        let mut motions = vec![player.motion];
        motions.extend(engine.adversaries().iter().map(|a| a.motion));
        for motion in motions {
            assert!((0..STEPS_PER_CELL).contains(&motion.sub_step));
            assert!((0..MAP_SIZE).contains(&motion.x));
            assert!((0..MAP_SIZE).contains(&motion.y));
        }
    }

    #[test]
    fn template_session_keeps_invariants_every_tick() {
        let mut engine = GameEngine::new();
        assert!(engine.start());
        assert_invariants(&engine);

        for tick in 0..4_000 {
            if tick % 13 == 0 {
                let dir = Direction::SCAN_ORDER[(tick / 13) as usize % 4];
                engine.receive_input(dir);
            }
            engine.step();
            assert_invariants(&engine);
            if !engine.is_playing() {
                break;
            }
        }
        assert_ne!(engine.mode(), GameMode::NotStarted);
    }

    #[test]
    fn template_session_first_cell_transition() {
        let mut engine = GameEngine::new();
        assert!(engine.start());
        let total = engine.remaining_collectibles();
        assert_eq!(total, 268);

        for expected in 1..STEPS_PER_CELL {
            engine.step();
            let player = engine.player().expect("player");
            assert_eq!(player.motion.sub_step, expected);
            assert_eq!((player.motion.x, player.motion.y), (12, 5));
        }

        engine.step();
        let player = engine.player().expect("player");
        assert_eq!((player.motion.x, player.motion.y), (13, 5));
        assert_eq!((player.motion.prev_x, player.motion.prev_y), (12, 5));
        assert_eq!(player.score, COIN_POINTS);
        assert_eq!(player.motion.animation_phase, 1);
        assert_eq!(engine.remaining_collectibles(), total - 1);

        let cells: Vec<_> = engine
            .adversaries()
            .iter()
            .map(|a| (a.identity, a.motion.x, a.motion.y))
            .collect();
        assert_eq!(
            cells,
            vec![
                (AdversaryIdentity::Orange, 10, 10),
                (AdversaryIdentity::Pink, 15, 10),
                (AdversaryIdentity::Cyan, 10, 14),
                (AdversaryIdentity::Red, 15, 14),
            ]
        );
        assert_eq!(engine.tick(), 5);
    }

    #[test]
    fn leaving_the_left_edge_enters_from_the_right() {
        let mut engine = engine_with(
            &["#####", "  .  ", "#####", "#####", "#####"],
            (0, 1, Direction::Left),
            &[],
        );
        run_ticks(&mut engine, STEPS_PER_CELL);
        assert_eq!(player_cell(&engine), (4, 1));
        assert!(engine.is_playing());
    }

    #[test]
    fn leaving_the_top_edge_is_rejected() {
        let mut engine = engine_with(&["# #", "#.#", "# #"], (1, 0, Direction::Up), &[]);
        run_ticks(&mut engine, STEPS_PER_CELL * 2);
        let player = engine.player().expect("player");
        assert_eq!((player.motion.x, player.motion.y), (1, 0));
        assert_eq!(player.motion.dir, Direction::Up);
        assert_eq!(player.motion.animation_phase, 0);
    }

    #[test]
    fn turn_request_waits_for_the_boundary_and_is_dropped_if_closed() {
        let layout = ["#####", "#   #", "## ##", "##.##", "#####"];

        let mut engine = engine_with(&layout, (1, 1, Direction::Right), &[]);
        engine.step();
        engine.receive_input(Direction::Down);
        run_ticks(&mut engine, STEPS_PER_CELL - 1);
        let player = engine.player().expect("player");
        assert_eq!((player.motion.x, player.motion.y), (2, 1));
        assert_eq!(player.motion.dir, Direction::Right);
        assert_eq!(player.pending_dir, Direction::Right);

        run_ticks(&mut engine, STEPS_PER_CELL);
        assert_eq!(player_cell(&engine), (3, 1));

        let mut engine = engine_with(&layout, (1, 1, Direction::Right), &[]);
        run_ticks(&mut engine, STEPS_PER_CELL + 1);
        engine.receive_input(Direction::Down);
        run_ticks(&mut engine, STEPS_PER_CELL - 2);
        let player = engine.player().expect("player");
        assert_eq!((player.motion.x, player.motion.y), (2, 1));
        assert_eq!(player.motion.dir, Direction::Right);
        assert_eq!(player.pending_dir, Direction::Down);

        engine.step();
        assert_eq!(player_cell(&engine), (2, 2));
        assert_eq!(engine.player().map(|p| p.motion.dir), Some(Direction::Down));
    }

    #[test]
    fn coin_pays_ten_points_exactly_once() {
        let mut engine = engine_with(
            &["#####", "# ..#", "#####", "#####", "#####"],
            (1, 1, Direction::Right),
            &[],
        );
        run_ticks(&mut engine, STEPS_PER_CELL);
        assert_eq!(player_cell(&engine), (2, 1));
        assert_eq!(engine.player().map(|p| p.score), Some(COIN_POINTS));
        assert_eq!(engine.remaining_collectibles(), 1);

        engine.receive_input(Direction::Left);
        run_ticks(&mut engine, STEPS_PER_CELL);
        assert_eq!(player_cell(&engine), (1, 1));
        engine.receive_input(Direction::Right);
        run_ticks(&mut engine, STEPS_PER_CELL);
        assert_eq!(player_cell(&engine), (2, 1));
        assert_eq!(engine.player().map(|p| p.score), Some(COIN_POINTS));
        assert_eq!(engine.remaining_collectibles(), 1);

        let summary = engine.build_summary().expect("summary");
        assert_eq!(summary.coins_eaten, 1);
        assert_eq!(summary.outcome, GameMode::Playing);
    }

    #[test]
    fn second_power_pellet_resets_the_timer() {
        let mut engine = engine_with(
            &[
                "######", "# oo.#", "######", "######", "######", "######",
            ],
            (1, 1, Direction::Right),
            &[],
        );
        run_ticks(&mut engine, STEPS_PER_CELL);
        assert_eq!(
            engine.player().map(|p| p.power_ticks),
            Some(POWER_DURATION_TICKS - 1)
        );

        run_ticks(&mut engine, STEPS_PER_CELL - 1);
        assert_eq!(
            engine.player().map(|p| p.power_ticks),
            Some(POWER_DURATION_TICKS - 5)
        );

        engine.step();
        let player = engine.player().expect("player");
        assert_eq!((player.motion.x, player.motion.y), (3, 1));
        assert_eq!(player.power_ticks, POWER_DURATION_TICKS - 1);
        assert_eq!(player.score, 100);
        assert_eq!(engine.build_summary().map(|s| s.power_pellets_eaten), Some(2));
    }

    #[test]
    fn power_timer_decays_while_standing_still() {
        let mut engine = engine_with(&["###", "#.#", "###"], (1, 1, Direction::Up), &[]);
        engine.session.as_mut().expect("session").player.view.power_ticks = 3;
        run_ticks(&mut engine, 3);
        assert_eq!(engine.player().map(|p| p.power_ticks), Some(0));
        run_ticks(&mut engine, 2);
        assert_eq!(engine.player().map(|p| p.power_ticks), Some(0));

        let events = engine.build_snapshot(true).events;
        assert_eq!(
            events,
            vec![RuntimeEvent::SessionStarted, RuntimeEvent::PowerExpired]
        );
    }

    #[test]
    fn powered_player_eliminates_adversary_and_keeps_going() {
        let layout = [
            "######", "#   .#", "######", "######", "######", "######",
        ];
        let mut engine = engine_with(&layout, (1, 1, Direction::Right), &[(3, 1, Direction::Left)]);
        engine.session.as_mut().expect("session").player.view.power_ticks = 50;

        engine.step();
        assert_eq!(engine.adversaries()[0].mode, AdversaryMode::Fleeing);

        run_ticks(&mut engine, STEPS_PER_CELL - 1);
        let adversary = &engine.adversaries()[0];
        assert_eq!((adversary.motion.x, adversary.motion.y), (2, 1));
        assert_eq!(adversary.mode, AdversaryMode::Eliminated);
        let player = engine.player().expect("player");
        assert!(player.alive);
        assert_eq!(player.score, ADVERSARY_POINTS);
        assert!(engine.is_playing());

        run_ticks(&mut engine, STEPS_PER_CELL * 2);
        let adversary = &engine.adversaries()[0];
        assert_eq!((adversary.motion.x, adversary.motion.y), (2, 1));
        assert_eq!(adversary.mode, AdversaryMode::Eliminated);
        assert_eq!(engine.mode(), GameMode::Won);
        assert_eq!(
            engine.player().map(|p| p.score),
            Some(ADVERSARY_POINTS + COIN_POINTS)
        );
        assert_eq!(
            engine.build_summary().map(|s| s.adversaries_eliminated),
            Some(1)
        );
    }

    #[test]
    fn unpowered_collision_fails_the_session() {
        let layout = [
            "######", "#   .#", "######", "######", "######", "######",
        ];
        let mut engine = engine_with(&layout, (1, 1, Direction::Right), &[(3, 1, Direction::Left)]);
        run_ticks(&mut engine, STEPS_PER_CELL);

        assert_eq!(engine.mode(), GameMode::Failed);
        let player = engine.player().expect("player");
        assert!(!player.alive);
        assert_eq!(player.score, 0);
        assert_eq!(engine.adversaries()[0].mode, AdversaryMode::Normal);

        let events = engine.build_snapshot(true).events;
        assert_eq!(
            events,
            vec![
                RuntimeEvent::SessionStarted,
                RuntimeEvent::PlayerDown {
                    by: AdversaryIdentity::Pink
                },
                RuntimeEvent::SessionFailed,
            ]
        );

        run_ticks(&mut engine, STEPS_PER_CELL);
        assert_eq!(engine.tick(), STEPS_PER_CELL as u64);
        assert_eq!(player_cell(&engine), (2, 1));
    }

    #[test]
    fn eating_the_last_coin_wins_on_the_same_tick() {
        let mut engine = engine_with(
            &["####", "# .#", "####", "####"],
            (1, 1, Direction::Right),
            &[],
        );
        run_ticks(&mut engine, STEPS_PER_CELL - 1);
        assert!(engine.is_playing());
        assert_eq!(engine.remaining_collectibles(), 1);

        engine.step();
        assert_eq!(engine.remaining_collectibles(), 0);
        assert_eq!(engine.mode(), GameMode::Won);
        let summary = engine.build_summary().expect("summary");
        assert_eq!(summary.outcome, GameMode::Won);
        assert_eq!(summary.ticks, STEPS_PER_CELL as u64);
        assert_eq!(summary.score, COIN_POINTS);
    }

    #[test]
    fn last_coin_wins_even_if_an_adversary_arrives_on_the_same_tick() {
        let mut engine = engine_with(
            &["#####", "# . #", "#####", "#####", "#####"],
            (1, 1, Direction::Right),
            &[(3, 1, Direction::Left)],
        );
        run_ticks(&mut engine, STEPS_PER_CELL);

        assert_eq!(engine.mode(), GameMode::Won);
        let player = engine.player().expect("player");
        assert!(player.alive);
        assert_eq!((player.motion.x, player.motion.y), (2, 1));
        let adversary = &engine.adversaries()[0];
        assert_eq!((adversary.motion.x, adversary.motion.y), (3, 1));
        assert_eq!(adversary.motion.sub_step, STEPS_PER_CELL - 1);

        let events = engine.build_snapshot(true).events;
        assert_eq!(
            events,
            vec![
                RuntimeEvent::SessionStarted,
                RuntimeEvent::CoinEaten { x: 2, y: 1 },
                RuntimeEvent::SessionWon,
            ]
        );
    }

    #[test]
    fn blocked_adversary_takes_left_before_up() {
        let mut engine = engine_with(
            &["#####", "## ##", "#  ##", "#####", "#. ##"],
            (2, 4, Direction::Right),
            &[(2, 2, Direction::Down)],
        );
        run_ticks(&mut engine, STEPS_PER_CELL);
        let adversary = &engine.adversaries()[0];
        assert_eq!((adversary.motion.x, adversary.motion.y), (1, 2));
        assert_eq!(adversary.motion.dir, Direction::Left);
        assert!(engine.is_playing());
    }

    #[test]
    fn start_and_restart_follow_the_mode_machine() {
        let mut engine = GameEngine::new();
        assert_eq!(engine.mode(), GameMode::NotStarted);
        assert!(!engine.restart());
        assert!(engine.build_summary().is_none());
        assert_eq!(engine.get_grid_init().remaining_collectibles, 268);

        assert!(engine.start());
        assert!(!engine.start());
        assert!(!engine.restart());
        run_ticks(&mut engine, STEPS_PER_CELL);
        assert_eq!(engine.player().map(|p| p.score), Some(COIN_POINTS));

        engine.finish(GameMode::Won);
        assert_eq!(engine.mode(), GameMode::Won);
        run_ticks(&mut engine, STEPS_PER_CELL);
        assert_eq!(engine.tick(), STEPS_PER_CELL as u64);

        assert!(engine.restart());
        assert_eq!(engine.mode(), GameMode::NotStarted);
        assert_eq!(engine.player().map(|p| p.score), Some(COIN_POINTS));

        assert!(engine.start());
        assert_eq!(engine.tick(), 0);
        assert_eq!(engine.player().map(|p| p.score), Some(0));
        assert_eq!(engine.remaining_collectibles(), 268);
    }

    #[test]
    fn input_is_ignored_outside_playing() {
        let mut engine = GameEngine::new();
        engine.receive_input(Direction::Left);
        assert!(engine.player().is_none());

        assert!(engine.start());
        engine.finish(GameMode::Failed);
        engine.receive_input(Direction::Left);
        assert_eq!(
            engine.player().map(|p| p.pending_dir),
            Some(Direction::Right)
        );
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = GameEngine::new();
        assert!(engine.start());

        let quiet = engine.build_snapshot(false);
        assert!(quiet.events.is_empty());
        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert_eq!(first.events, vec![RuntimeEvent::SessionStarted]);
        assert!(second.events.is_empty());
        assert_eq!(first.adversaries.len(), 4);
        assert_eq!(first.mode, GameMode::Playing);
    }
}
