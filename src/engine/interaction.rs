use super::*;

impl Session {
    pub(super) fn apply_player_pickup(&mut self, events: &mut Vec<RuntimeEvent>) {
        let x = self.player.view.motion.x;
        let y = self.player.view.motion.y;
        let pickup = self.grid.collect(x, y);
        if pickup.points == 0 {
            return;
        }

        self.player.view.score += pickup.points;
        if pickup.power_granted {
            self.player.view.power_ticks = POWER_DURATION_TICKS;
            self.player.stats.power_pellets += 1;
            events.push(RuntimeEvent::PowerPelletEaten { x, y });
        } else {
            self.player.stats.coins += 1;
            events.push(RuntimeEvent::CoinEaten { x, y });
        }
    }

    pub(super) fn decay_power(&mut self, events: &mut Vec<RuntimeEvent>) {
        if self.player.view.power_ticks == 0 {
            return;
        }
        self.player.view.power_ticks -= 1;
        if self.player.view.power_ticks == 0 {
            events.push(RuntimeEvent::PowerExpired);
        }
    }

    pub(super) fn sync_adversary_modes(&mut self) {
        let powered = self.player.view.power_ticks > 0;
        for adversary in &mut self.adversaries {
            adversary.mode = match adversary.mode {
                AdversaryMode::Normal if powered => AdversaryMode::Fleeing,
                AdversaryMode::Fleeing if !powered => AdversaryMode::Normal,
                mode => mode,
            };
        }
    }

    pub(super) fn resolve_collision(
        &mut self,
        adversary_idx: usize,
        events: &mut Vec<RuntimeEvent>,
    ) {
        let Some(adversary) = self.adversaries.get_mut(adversary_idx) else {
            return;
        };
        if adversary.mode == AdversaryMode::Eliminated || !self.player.view.alive {
            return;
        }
        let player = &mut self.player;
        if adversary.motion.x != player.view.motion.x || adversary.motion.y != player.view.motion.y
        {
            return;
        }

        if player.view.power_ticks > 0 {
            adversary.mode = AdversaryMode::Eliminated;
            player.view.score += ADVERSARY_POINTS;
            player.stats.adversaries += 1;
            events.push(RuntimeEvent::AdversaryEliminated {
                identity: adversary.identity,
                x: adversary.motion.x,
                y: adversary.motion.y,
            });
        } else {
            player.view.alive = false;
            events.push(RuntimeEvent::PlayerDown {
                by: adversary.identity,
            });
        }
    }

    pub(super) fn update_adversaries(&mut self, events: &mut Vec<RuntimeEvent>) {
        for idx in 0..self.adversaries.len() {
            let outcome = step_adversary(&mut self.adversaries[idx], &self.grid);
            if outcome.at_boundary() {
                self.resolve_collision(idx, events);
            }
        }
    }
}
