//! One run of the game: the board, the inventory and Numby under one owner
//!
//! `Run` owns every piece of mutable simulation state and the only random
//! source. All transitions between phases happen here; the shell only sees
//! the resulting [`GameEvent`]s.

use glam::Vec2;

use super::board::{Board, PegContact, PegUpdate};
use super::challenge::DailyChallenge;
use super::character::{BoardExit, Character};
use super::state::{GameEvent, GamePhase, GameState};
use crate::error::GameError;
use crate::items::effect::scale;
use crate::items::{HitContext, ItemAdded, ItemOffer, ItemSystem, ScoreEvent};
use crate::rng::GameRng;
use crate::tuning::{DayTransition, Tuning};

/// Launch direction and strength
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aim {
    /// Radians; 0 points right, positive angles turn downward
    pub angle: f32,
    /// Percent of the maximum launch speed (0..=100)
    pub power: f32,
}

impl Aim {
    pub fn new(angle: f32, power: f32) -> Self {
        Self { angle, power }
    }

    /// Aim from `from` at `target`
    pub fn toward(from: Vec2, target: Vec2, power: f32) -> Self {
        let d = target - from;
        Self::new(d.y.atan2(d.x), power)
    }

    pub fn velocity(&self, max_speed: f32) -> Vec2 {
        let speed = self.power.clamp(0.0, 100.0) / 100.0 * max_speed;
        Vec2::from_angle(self.angle) * speed
    }

    pub fn degrees(&self) -> f32 {
        self.angle.to_degrees()
    }
}

#[derive(Debug, Clone)]
pub struct Run {
    tuning: Tuning,
    state: GameState,
    board: Board,
    items: ItemSystem,
    character: Character,
    rng: GameRng,
    phase: GamePhase,
    flight_ticks: u32,
    time_ticks: u64,
    events: Vec<GameEvent>,
}

impl Run {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let mut rng = GameRng::new(seed);
        let mut board = Board::new(tuning.board.clone());
        board.generate_board(1, &mut rng);
        let character = Character::new(&tuning.physics, board.size());
        let state = GameState::new(tuning.run.starting_lives, tuning.run.max_lives);

        let mut run = Self {
            tuning,
            state,
            board,
            items: ItemSystem::new(),
            character,
            rng,
            phase: GamePhase::Aiming,
            flight_ticks: 0,
            time_ticks: 0,
            events: Vec::new(),
        };
        run.reset_character();
        log::info!("New run (seed {seed}), quota {}", run.state.quota);
        run
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn items(&self) -> &ItemSystem {
        &self.items
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn phase(&self) -> &GamePhase {
        &self.phase
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Events since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn invalid(&self, action: &'static str) -> GameError {
        GameError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }

    /// Send Numby off; only valid while aiming
    pub fn launch(&mut self, aim: Aim) -> Result<(), GameError> {
        if self.phase != GamePhase::Aiming {
            return Err(self.invalid("launch"));
        }

        let vel = self
            .items
            .apply_launch(aim.velocity(self.tuning.physics.max_launch_speed));
        self.character.launch(vel);
        self.state.consecutive_hits = 0;
        self.flight_ticks = 0;
        self.phase = GamePhase::InFlight;
        self.events.push(GameEvent::Launched {
            vel: self.character.vel,
        });
        log::debug!("Launched at {:.0}° with {:.0}% power", aim.degrees(), aim.power);
        Ok(())
    }

    /// Take one of the offered rewards and start the next day
    pub fn choose_reward(&mut self, index: usize) -> Result<ItemAdded, GameError> {
        let GamePhase::DayComplete { offers, .. } = &self.phase else {
            return Err(self.invalid("choose a reward"));
        };
        let offer = *offers.get(index).ok_or(GameError::NoSuchOffer {
            index,
            available: offers.len(),
        })?;

        let added = self.take_offer(offer);
        self.start_day();
        Ok(added)
    }

    /// Decline every offer and start the next day
    pub fn skip_reward(&mut self) -> Result<(), GameError> {
        if !matches!(self.phase, GamePhase::DayComplete { .. }) {
            return Err(self.invalid("skip the reward"));
        }
        self.start_day();
        Ok(())
    }

    /// Throw everything away and start again from day 1
    pub fn restart(&mut self) {
        self.state.reset();
        self.items.reset_items();
        self.board = Board::new(self.tuning.board.clone());
        self.board.generate_board(1, &mut self.rng);
        self.phase = GamePhase::Aiming;
        self.reset_character();
        log::info!("Run restarted");
    }

    /// A random but sensible shot, for demos and idle play
    pub fn autoplay_aim(&mut self) -> Aim {
        let angle = self.rng.range_f32(20f32.to_radians(), 160f32.to_radians());
        let power = self.rng.range_f32(40.0, 100.0);
        Aim::new(angle, power)
    }

    fn take_offer(&mut self, offer: ItemOffer) -> ItemAdded {
        let added = self.items.add_item(offer);
        match &added {
            ItemAdded::New { id, synergies } => {
                let level = self.items.owned(*id).map_or(offer.level, |i| i.level);
                self.events.push(GameEvent::ItemApplied {
                    id: *id,
                    level,
                    upgrade: false,
                });
                for synergy in synergies {
                    self.events.push(GameEvent::SynergyDiscovered(synergy.clone()));
                }
            }
            ItemAdded::Upgraded { id, level } => {
                self.events.push(GameEvent::ItemApplied {
                    id: *id,
                    level: *level,
                    upgrade: true,
                });
            }
            ItemAdded::Maxed { .. } => {}
        }
        added
    }

    fn start_day(&mut self) {
        self.phase = GamePhase::Aiming;
        self.reset_character();
    }

    /// Fresh Numby with today's challenge and the inventory applied
    fn reset_character(&mut self) {
        let mut character = Character::new(&self.tuning.physics, self.board.size());
        if let Some(tweak) = self
            .state
            .daily_challenge
            .and_then(DailyChallenge::character_tweak)
        {
            character.apply_tweak(tweak);
        }
        self.items.apply_character_init(&mut character);
        self.character = character;
        self.flight_ticks = 0;
    }

    /// Advance one tick
    pub(super) fn step(&mut self) {
        self.time_ticks += 1;

        match self.phase {
            GamePhase::InFlight => self.step_flight(),
            GamePhase::DayComplete { .. } => self.step_shop(),
            GamePhase::Aiming | GamePhase::GameOver => {}
        }
    }

    fn step_shop(&mut self) {
        let timed_out = match &mut self.phase {
            GamePhase::DayComplete { waited_ticks, .. } => {
                *waited_ticks += 1;
                self.tuning
                    .run
                    .shop_timeout_ticks
                    .is_some_and(|limit| *waited_ticks >= limit)
            }
            _ => false,
        };

        if timed_out {
            log::info!("Reward choice timed out, taking the first offer");
            if let Err(e) = self.choose_reward(0) {
                log::warn!("{e}");
            }
        }
    }

    fn step_flight(&mut self) {
        self.flight_ticks += 1;

        self.character.update();
        self.items.apply_update(&mut self.character, self.board.pegs());

        let contacts = self
            .board
            .check_collisions(self.character.pos, self.character.radius);
        for contact in contacts {
            self.handle_peg_hit(contact);
        }

        if let Some(exit) = self.character.exit() {
            self.handle_exit(exit);
        } else if self.flight_ticks >= self.tuning.run.max_flight_ticks {
            log::warn!(
                "Flight exceeded {} ticks, resetting Numby",
                self.tuning.run.max_flight_ticks
            );
            self.free_reset(None);
        }
    }

    /// Bounce, score and decay one peg
    fn handle_peg_hit(&mut self, contact: PegContact) {
        let Some(peg) = self.board.peg(contact.id) else {
            return;
        };
        let (id, pos, score, hits, radius) = (peg.id, peg.pos, peg.score, peg.hits, peg.radius);

        self.character.bounce_off(pos, radius);
        self.state.consecutive_hits += 1;
        self.events.push(GameEvent::PegHit { id, pos });

        let mut ctx = HitContext::new(self.state.day, self.state.consecutive_hits, score, hits);

        // What the peg keeps
        let mut residual = self.items.apply_item_effects(
            ScoreEvent::PegHit,
            score / 2,
            &mut ctx,
            &mut self.state.temporary_effects,
            &mut self.rng,
        );
        residual = if ctx.retained {
            residual.min(score)
        } else {
            residual.min(score.saturating_sub(1))
        };
        let mut base = score;
        if ctx.shattered {
            base = base.saturating_add(residual);
            residual = 0;
        }

        // What the hit is worth
        let mut value = self.items.apply_item_effects(
            ScoreEvent::NumberHit,
            base,
            &mut ctx,
            &mut self.state.temporary_effects,
            &mut self.rng,
        );
        if let Some(challenge) = self.state.daily_challenge {
            value = challenge.apply_score(value, ctx.traits);
        }
        value = scale(value, self.items.run_multiplier(self.state.consecutive_hits));

        self.state.add_to_score(value);
        log::debug!("Peg {id} ({score}) -> {value}, keeps {residual}");
        self.events.push(GameEvent::NumberGenerated {
            peg: id,
            pos,
            base: score,
            value,
        });
        self.events.push(GameEvent::ScoreChanged {
            score: self.state.current_score,
            quota: self.state.quota,
        });

        match self.board.update_peg_score(id, residual) {
            Ok(PegUpdate::Destroyed { id, .. }) => {
                self.events.push(GameEvent::PegDestroyed { id, pos });
            }
            Ok(PegUpdate::Scored { .. }) => {}
            Err(e) => log::error!("{e}"),
        }

        if ctx.duplicate {
            let copy_score = (score / 2).max(1);
            if let Some(copy) = self.board.spawn_peg(copy_score, &mut self.rng) {
                self.events.push(GameEvent::PegDuplicated {
                    id: copy.id,
                    pos: copy.pos,
                    score: copy.score,
                });
            }
        }
    }

    fn handle_exit(&mut self, exit: BoardExit) {
        self.character.set_active(false);
        match exit {
            BoardExit::Bottom if self.state.quota_met() => self.complete_day(),
            BoardExit::Bottom => self.lose_life(),
            BoardExit::Side | BoardExit::Top => self.free_reset(Some(exit)),
        }
    }

    fn free_reset(&mut self, exit: Option<BoardExit>) {
        self.events.push(GameEvent::AttemptReset { exit });
        self.phase = GamePhase::Aiming;
        self.reset_character();
    }

    fn lose_life(&mut self) {
        self.state.use_life();
        if self.state.lives == 0 {
            self.game_over();
            return;
        }

        self.events.push(GameEvent::LifeLost {
            lives: self.state.lives,
        });
        if let Err(e) = self.board.reset_grid_to_initial_state() {
            log::error!("{e}");
        }
        log::info!(
            "Life lost, {} left; keeping score {}",
            self.state.lives,
            self.state.current_score
        );
        self.phase = GamePhase::Aiming;
        self.reset_character();
    }

    fn game_over(&mut self) {
        self.state.end_game();
        self.items.reset_items();
        self.phase = GamePhase::GameOver;
        log::info!(
            "Game over on day {} with score {}",
            self.state.day,
            self.state.current_score
        );
        self.events.push(GameEvent::GameOver {
            day: self.state.day,
            score: self.state.current_score,
        });
    }

    fn complete_day(&mut self) {
        let finished = self.state.day;
        let score = self.state.current_score;
        let lives_gained = self.state.complete_day();
        let day = self.state.day;
        log::info!("Day {finished} complete with {score}; day {day} quota {}", self.state.quota);
        self.events.push(GameEvent::DayCompleted {
            day: finished,
            score,
            lives_gained,
        });

        self.board.complete_day();
        match self.tuning.run.day_transition {
            DayTransition::Reshuffle => {
                for merge in self.board.shuffle_remaining_pegs(day, &mut self.rng) {
                    self.events.push(GameEvent::PegsMerged {
                        from: merge.from,
                        to: merge.to,
                        score: merge.score,
                    });
                }
            }
            DayTransition::Regenerate => self.board.generate_board(day, &mut self.rng),
        }

        let interval = self.tuning.run.challenge_interval;
        if interval > 0 && day % interval == 0 {
            let challenge = DailyChallenge::roll(&mut self.rng);
            self.state.set_challenge(challenge);
            if challenge.modify_board(&mut self.board, &mut self.rng) {
                self.board.save_initial_day_state(true);
            }
            log::info!("Daily challenge: {}", challenge.name());
            self.events.push(GameEvent::ChallengeStarted(challenge));
        }

        for effect in self.items.apply_day_start() {
            self.state.add_temporary_effect(effect);
        }

        let offers = self
            .items
            .generate_shop_items(self.tuning.run.shop_size, &mut self.rng);
        if offers.is_empty() {
            self.start_day();
        } else {
            self.events.push(GameEvent::ShopOpened {
                offers: offers.clone(),
            });
            self.phase = GamePhase::DayComplete {
                offers,
                waited_ticks: 0,
            };
            self.reset_character();
        }
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[cfg(test)]
    pub(crate) fn items_mut(&mut self) -> &mut ItemSystem {
        &mut self.items
    }

    #[cfg(test)]
    pub(crate) fn character_mut(&mut self) -> &mut Character {
        &mut self.character
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::MAX_ITEM_LEVEL;
    use crate::items::ItemId;

    fn run() -> Run {
        Run::new(Tuning::default(), 42)
    }

    /// Put Numby just above a peg, falling straight onto it
    fn drop_onto(run: &mut Run, id: u32) {
        let pos = run.board().peg(id).expect("peg on the board").pos;
        if run.phase() == &GamePhase::Aiming {
            run.launch(Aim::new(std::f32::consts::FRAC_PI_2, 10.0)).unwrap();
        }
        let c = run.character_mut();
        c.set_position(pos - Vec2::new(0.0, 46.0));
        c.vel = Vec2::new(0.0, 2.0);
    }

    fn drop_onto_first_peg(run: &mut Run) -> u32 {
        let id = run.board().pegs()[0].id;
        drop_onto(run, id);
        id
    }

    /// Hit the peg once; returns the value generated and the events
    fn hit(run: &mut Run, id: u32) -> (u64, Vec<GameEvent>) {
        drop_onto(run, id);
        run.step();
        let events = run.drain_events();
        let value = events
            .iter()
            .find_map(|e| match e {
                GameEvent::NumberGenerated { peg, value, .. } if *peg == id => Some(*value),
                _ => None,
            })
            .expect("the peg was hit");
        (value, events)
    }

    /// Seed 42 starts with a 1-point first peg; scale it to `score`
    fn first_peg_worth(run: &mut Run, score: u64) -> u32 {
        let peg = run.board().pegs()[0].clone();
        assert_eq!(peg.score, 1);
        run.board_mut().scale_peg_scores(score);
        peg.id
    }

    fn add_at_level(run: &mut Run, id: ItemId, level: u8) {
        for _ in 0..level {
            run.items_mut().add_item(ItemOffer::new_item(id));
        }
        assert_eq!(run.items().owned(id).map(|i| i.level), Some(level));
    }

    /// Push Numby out through the bottom
    fn fall_out(run: &mut Run) {
        if run.phase() == &GamePhase::Aiming {
            run.launch(Aim::new(std::f32::consts::FRAC_PI_2, 10.0)).unwrap();
        }
        let c = run.character_mut();
        c.set_position(Vec2::new(306.0, 800.0));
        c.vel = Vec2::new(0.0, 5.0);
        run.step();
    }

    #[test]
    fn test_aim_velocity() {
        let aim = Aim::new(0.0, 50.0);
        let v = aim.velocity(15.0);
        assert!((v.x - 7.5).abs() < 1e-5);
        assert!(v.y.abs() < 1e-5);
        let aim = Aim::toward(Vec2::ZERO, Vec2::new(0.0, 10.0), 100.0);
        assert!((aim.degrees() - 90.0).abs() < 1e-4);
        assert_eq!(Aim::new(0.0, 500.0).velocity(15.0).x, 15.0);
    }

    #[test]
    fn test_launch_only_while_aiming() {
        let mut run = run();
        run.launch(Aim::new(1.0, 50.0)).unwrap();
        assert_eq!(run.phase(), &GamePhase::InFlight);
        assert!(matches!(
            run.launch(Aim::new(1.0, 50.0)),
            Err(GameError::InvalidTransition { action: "launch", .. })
        ));
        let events = run.drain_events();
        assert!(matches!(events[0], GameEvent::Launched { .. }));
    }

    #[test]
    fn test_day_one_single_hit() {
        let mut run = run();
        let id = drop_onto_first_peg(&mut run);
        run.step();

        assert_eq!(run.state().current_score, 1);
        assert!(run.board().peg(id).is_none());
        assert_eq!(run.board().pegs().len(), run.tuning().board.max_pegs - 1);
        let events = run.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::PegDestroyed { id: d, .. } if *d == id)));
        // Bounced back up
        assert!(run.character().vel.y < 0.0);
    }

    #[test]
    fn test_multiplier_then_adder_on_peg() {
        let mut run = run();
        run.items_mut().add_item(ItemOffer::new_item(ItemId::Multiplier));
        run.items_mut().add_item(ItemOffer::new_item(ItemId::Adder));
        run.board_mut().scale_peg_scores(10);

        let id = drop_onto_first_peg(&mut run);
        run.step();
        assert_eq!(run.state().current_score, 25);
        assert_eq!(run.board().peg(id).map(|p| p.score), Some(5));
    }

    #[test]
    fn test_repeated_hits_halve_the_peg() {
        let mut run = run();
        let id = first_peg_worth(&mut run, 13);

        let mut left = Vec::new();
        let mut values = Vec::new();
        for _ in 0..4 {
            let (value, _) = hit(&mut run, id);
            values.push(value);
            left.push(run.board().peg(id).map(|p| p.score));
        }
        assert_eq!(values, vec![13, 6, 3, 1]);
        assert_eq!(left, vec![Some(6), Some(3), Some(1), None]);
        assert_eq!(run.state().current_score, 23);
        assert_eq!(run.state().consecutive_hits, 4);
    }

    #[test]
    fn test_peg_master_keeps_full_value_on_first_hit() {
        let mut run = run();
        run.items_mut().add_item(ItemOffer::new_item(ItemId::PegMaster));
        let id = first_peg_worth(&mut run, 16);

        assert_eq!(hit(&mut run, id).0, 16);
        assert_eq!(run.board().peg(id).map(|p| p.score), Some(16));
        assert_eq!(hit(&mut run, id).0, 16);
        assert_eq!(run.board().peg(id).map(|p| p.score), Some(8));
        assert_eq!(run.state().current_score, 32);
    }

    #[test]
    fn test_synergy_amplifies_what_the_peg_keeps() {
        let mut run = run();
        run.items_mut().add_item(ItemOffer::new_item(ItemId::ConsecutiveBooster));
        run.items_mut().add_item(ItemOffer::new_item(ItemId::ComboMaster));
        assert_eq!(run.items().synergies().len(), 1);
        let id = first_peg_worth(&mut run, 20);

        let (value, _) = hit(&mut run, id);
        // 20 / 2 = 10, times the synergy's 1.5
        assert_eq!(run.board().peg(id).map(|p| p.score), Some(15));
        assert_eq!(value, scale(30, run.items().run_multiplier(1)));
    }

    #[test]
    fn test_synergy_never_lets_a_peg_grow() {
        let mut run = run();
        run.items_mut().add_item(ItemOffer::new_item(ItemId::ConsecutiveBooster));
        run.items_mut().add_item(ItemOffer::new_item(ItemId::ComboMaster));
        let id = first_peg_worth(&mut run, 2);

        // 2 / 2 = 1, 1 * 1.5 floors back to 1
        hit(&mut run, id);
        assert_eq!(run.board().peg(id).map(|p| p.score), Some(1));
        hit(&mut run, id);
        assert!(run.board().peg(id).is_none());
    }

    #[test]
    fn test_peg_destroyer_pays_out_the_remainder() {
        let mut shattered = 0;
        for seed in 0..20 {
            let mut run = Run::new(Tuning::default(), seed);
            add_at_level(&mut run, ItemId::PegDestroyer, 5);
            run.board_mut().scale_peg_scores(10);
            let peg = run.board().pegs()[0].clone();

            let (value, events) = hit(&mut run, peg.id);
            let destroyed = events
                .iter()
                .any(|e| matches!(e, GameEvent::PegDestroyed { id, .. } if *id == peg.id));
            if destroyed {
                shattered += 1;
                assert!(run.board().peg(peg.id).is_none());
                assert_eq!(value, peg.score + peg.score / 2);
            } else {
                assert_eq!(run.board().peg(peg.id).map(|p| p.score), Some(peg.score / 2));
                assert_eq!(value, peg.score);
            }
        }
        // 60% per hit
        assert!(shattered > 0);
    }

    #[test]
    fn test_node_duplicator_spawns_half_value_copy() {
        let mut duplicated = 0;
        for seed in 0..30 {
            let mut run = Run::new(Tuning::default(), seed);
            add_at_level(&mut run, ItemId::NodeDuplicator, 5);
            run.board_mut().scale_peg_scores(10);
            let peg = run.board().pegs()[0].clone();
            let before = run.board().pegs().len();

            let (value, events) = hit(&mut run, peg.id);
            assert_eq!(value, peg.score);
            let copy = events.iter().find_map(|e| match e {
                GameEvent::PegDuplicated { id, score, .. } => Some((*id, *score)),
                _ => None,
            });
            match copy {
                Some((copy_id, score)) => {
                    duplicated += 1;
                    assert_eq!(score, peg.score / 2);
                    assert_eq!(run.board().peg(copy_id).map(|p| p.score), Some(score));
                    assert_eq!(run.board().pegs().len(), before + 1);
                }
                None => assert_eq!(run.board().pegs().len(), before),
            }
        }
        // 30% per hit
        assert!(duplicated > 0);
    }

    #[test]
    fn test_side_exit_is_free() {
        let mut run = run();
        run.launch(Aim::new(0.0, 50.0)).unwrap();
        run.character_mut().set_position(Vec2::new(-100.0, 300.0));
        run.step();
        assert_eq!(run.phase(), &GamePhase::Aiming);
        assert_eq!(run.state().lives, 3);
        assert!(!run.character().is_active());
    }

    #[test]
    fn test_bottom_exit_costs_a_life_and_restores_board() {
        let mut run = run();
        let id = drop_onto_first_peg(&mut run);
        run.step();
        assert!(run.board().peg(id).is_none());

        fall_out(&mut run);
        assert_eq!(run.state().lives, 2);
        assert_eq!(run.state().current_score, 1);
        assert_eq!(run.phase(), &GamePhase::Aiming);
        // The destroyed peg stays gone after the restore
        assert_eq!(run.board().pegs().len(), 14);
        assert!(run.board().peg(id).is_none());
    }

    #[test]
    fn test_last_life_ends_run() {
        let mut run = run();
        run.items_mut().add_item(ItemOffer::new_item(ItemId::Adder));
        run.state_mut().lives = 1;

        fall_out(&mut run);
        assert_eq!(run.state().lives, 0);
        assert!(run.state().run_ended);
        assert!(run.is_over());
        assert!(run.items().items().is_empty());
        assert!(run.launch(Aim::new(1.0, 50.0)).is_err());
        assert!(run
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { day: 1, .. })));
    }

    #[test]
    fn test_quota_met_completes_day_and_opens_shop() {
        let mut run = run();
        run.state_mut().add_to_score(50);
        fall_out(&mut run);

        assert_eq!(run.state().day, 2);
        assert_eq!(run.state().current_score, 0);
        assert_eq!(run.state().quota, 75);
        let GamePhase::DayComplete { offers, .. } = run.phase().clone() else {
            panic!("expected the shop");
        };
        assert_eq!(offers.len(), 3);
        assert!(run.launch(Aim::new(1.0, 50.0)).is_err());

        assert!(matches!(
            run.choose_reward(7),
            Err(GameError::NoSuchOffer { index: 7, available: 3 })
        ));
        run.choose_reward(0).unwrap();
        assert_eq!(run.phase(), &GamePhase::Aiming);
        assert_eq!(run.items().items().len(), 1);
        assert!(run.board().initial_state().is_some());
    }

    #[test]
    fn test_maxed_item_offer_changes_nothing() {
        let mut run = run();
        add_at_level(&mut run, ItemId::Multiplier, MAX_ITEM_LEVEL);
        run.drain_events();

        let added = run.take_offer(ItemOffer::new_item(ItemId::Multiplier));
        assert_eq!(added, ItemAdded::Maxed { id: ItemId::Multiplier });
        assert!(run.drain_events().is_empty());
    }

    #[test]
    fn test_shop_timeout_takes_first_offer() {
        let mut tuning = Tuning::default();
        tuning.run.shop_timeout_ticks = Some(3);
        let mut run = Run::new(tuning, 7);
        run.state_mut().add_to_score(50);
        fall_out(&mut run);
        assert!(matches!(run.phase(), GamePhase::DayComplete { .. }));

        for _ in 0..3 {
            run.step();
        }
        assert_eq!(run.phase(), &GamePhase::Aiming);
        assert_eq!(run.items().items().len(), 1);
    }

    #[test]
    fn test_third_day_brings_a_challenge() {
        let mut run = run();
        for _ in 0..2 {
            let quota = run.state().quota;
            run.state_mut().add_to_score(quota);
            fall_out(&mut run);
            run.skip_reward().unwrap();
        }
        assert_eq!(run.state().day, 3);
        let challenge = run.state().daily_challenge.expect("challenge on day 3");
        let base = crate::sim::state::base_quota(3);
        let expected = challenge
            .quota_modifier()
            .map_or(base, |m| (base as f64 * m).floor() as u64);
        assert_eq!(run.state().quota, expected);
    }

    #[test]
    fn test_runaway_flight_is_reset() {
        let mut tuning = Tuning::default();
        tuning.run.max_flight_ticks = 5;
        let mut run = Run::new(tuning, 1);
        run.launch(Aim::new(0.0, 0.0)).unwrap();
        run.character_mut().gravity = 0.0;
        for _ in 0..5 {
            run.step();
        }
        assert_eq!(run.phase(), &GamePhase::Aiming);
        assert!(run
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::AttemptReset { exit: None })));
    }

    #[test]
    fn test_restart_returns_to_day_one() {
        let mut run = run();
        run.state_mut().lives = 1;
        fall_out(&mut run);
        assert!(run.is_over());

        run.restart();
        assert_eq!(run.phase(), &GamePhase::Aiming);
        assert_eq!(run.state().day, 1);
        assert_eq!(run.state().lives, 3);
        assert!(!run.state().run_ended);
        assert_eq!(run.board().pegs().len(), 15);
    }
}
