use super::*;

impl Session {
    pub(crate) fn new(grid: Grid) -> Self {
        Self::with_roster(
            grid,
            (PLAYER_SPAWN, PLAYER_SPAWN_DIRECTION),
            &ADVERSARY_SPAWNS,
        )
    }

    // Spawn cells keep their collectibles.
    pub(crate) fn with_roster(
        grid: Grid,
        player: (Vec2, Direction),
        adversaries: &[(AdversaryIdentity, Vec2, Direction)],
    ) -> Self {
        let (spawn, dir) = player;
        let player = PlayerInternal {
            view: PlayerView {
                motion: Motion::at(spawn, dir),
                pending_dir: dir,
                alive: true,
                score: 0,
                power_ticks: 0,
            },
            stats: SessionStats::default(),
        };
        let adversaries = adversaries
            .iter()
            .map(|(identity, cell, dir)| AdversaryView {
                identity: *identity,
                motion: Motion::at(*cell, *dir),
                mode: AdversaryMode::Normal,
            })
            .collect();

        Self {
            grid,
            player,
            adversaries,
        }
    }
}
