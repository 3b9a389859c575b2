//! Game shell
//!
//! Drives a [`Run`] one tick at a time and translates what happened into
//! sounds, visual effects, player messages, stats, achievements and high
//! scores. Nothing in here feeds back into the simulation.

use crate::achievements::{AchievementSystem, Progress};
use crate::audio::SoundCue;
use crate::error::GameError;
use crate::highscores::HighScores;
use crate::platform::{Collaborators, FrameView, VisualEffect, now_ms};
use crate::sim::{BoardExit, GameEvent, GamePhase, Run, TickInput, tick};
use crate::stats::StatsSystem;
use crate::tuning::Tuning;

pub struct Game {
    run: Run,
    io: Collaborators,
    stats: StatsSystem,
    achievements: AchievementSystem,
    high_scores: HighScores,
    /// Sum of every number generated this run
    run_score: u64,
}

impl Game {
    pub fn new(tuning: Tuning, seed: u64, io: Collaborators) -> Self {
        let stats = StatsSystem::load(io.store.as_ref());
        let achievements = AchievementSystem::load(io.store.as_ref());
        let high_scores = HighScores::load(io.store.as_ref());

        let mut game = Self {
            run: Run::new(tuning, seed),
            io,
            stats,
            achievements,
            high_scores,
            run_score: 0,
        };
        game.begin_run();
        game
    }

    /// Like [`Game::new`], with tuning overrides read from the store
    pub fn load(seed: u64, io: Collaborators) -> Self {
        let tuning = Tuning::load(io.store.as_ref());
        Self::new(tuning, seed, io)
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn stats(&self) -> &StatsSystem {
        &self.stats
    }

    pub fn achievements(&self) -> &AchievementSystem {
        &self.achievements
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn run_score(&self) -> u64 {
        self.run_score
    }

    /// Advance one frame and draw it
    pub fn tick(&mut self, input: &TickInput) {
        tick(&mut self.run, input);
        if input.restart {
            self.begin_run();
        }
        self.flush_events();
        self.render();
    }

    /// Answer the reward shop
    pub fn choose_reward(&mut self, index: usize) -> Result<(), GameError> {
        self.run.choose_reward(index)?;
        self.flush_events();
        Ok(())
    }

    pub fn skip_reward(&mut self) -> Result<(), GameError> {
        self.run.skip_reward()?;
        self.flush_events();
        Ok(())
    }

    pub fn restart(&mut self) {
        self.run.restart();
        self.begin_run();
        self.flush_events();
    }

    fn begin_run(&mut self) {
        self.run_score = 0;
        self.stats.record_game_played(self.io.store.as_mut());
        self.io
            .messages
            .add_message("Welcome to Numby's Number Factory! Meet your quota or face cosmic consequences.");
    }

    fn render(&mut self) {
        let state = self.run.state();
        let character = self.run.character();
        let frame = FrameView {
            board_size: self.run.board().size(),
            character_pos: character.pos,
            character_radius: character.radius,
            pegs: self.run.board().pegs(),
            phase: self.run.phase(),
            day: state.day,
            score: state.current_score,
            quota: state.quota,
            lives: state.lives,
            max_lives: state.max_lives,
            time_ticks: self.run.time_ticks(),
        };
        self.io.renderer.render(&frame);
    }

    fn flush_events(&mut self) {
        let events = self.run.drain_events();
        if events.is_empty() {
            return;
        }
        for event in events {
            self.dispatch(event);
        }
        // Per-hit stats are written once the flight is over
        if self.run.phase() != &GamePhase::InFlight {
            self.stats.flush(self.io.store.as_mut());
        }
        self.check_achievements();
    }

    fn say(&mut self, text: &str) {
        self.io.messages.add_message(text);
    }

    fn dispatch(&mut self, event: GameEvent) {
        match event {
            GameEvent::Launched { vel } => {
                self.io.audio.notify(SoundCue::Launch);
                let degrees = vel.y.atan2(vel.x).to_degrees().round();
                self.say(&format!("Numby launched at {degrees}° angle!"));
            }
            GameEvent::PegHit { .. } => {
                self.io.audio.notify(SoundCue::PegHit);
                self.stats.record_peg_hit();
            }
            GameEvent::NumberGenerated { pos, base, value, .. } => {
                self.io.audio.notify(SoundCue::NumberHit);
                self.io.renderer.effect(VisualEffect::ScorePopup { pos, value });
                self.stats.record_number_generated(value);
                self.run_score = self.run_score.saturating_add(value);
                if value > base && base > 0 {
                    let bonus = ((value as f64 / base as f64 - 1.0) * 100.0).floor();
                    self.say(&format!("Generated {value} from a {base} node! ({bonus}% bonus)"));
                } else {
                    self.say(&format!("Generated {value} from a node!"));
                }
            }
            GameEvent::PegDestroyed { pos, .. } => {
                self.io.renderer.effect(VisualEffect::PegBurst { pos });
            }
            GameEvent::PegDuplicated { .. } => self.say("🧬 Node duplicated!"),
            GameEvent::PegsMerged { from, to, .. } => {
                self.io.renderer.effect(VisualEffect::Merge { from, to });
            }
            GameEvent::ScoreChanged { .. } => {}
            GameEvent::SynergyDiscovered(synergy) => {
                let name = synergy.name();
                self.io.audio.notify(SoundCue::Synergy);
                self.say(&format!("🔄 SYNERGY DISCOVERED: {name}!"));
                self.io.renderer.effect(VisualEffect::SynergyFlash { name });
            }
            GameEvent::ItemApplied { id, level, upgrade } => {
                if upgrade {
                    self.io
                        .renderer
                        .effect(VisualEffect::UpgradeFlash { item: id, level });
                    self.say(&format!("🔼 Upgraded {id} to level {level}!"));
                } else {
                    self.stats.record_item_collected(self.io.store.as_mut());
                    self.say(&format!("You selected: {id}!"));
                }
            }
            GameEvent::AttemptReset { exit } => match exit {
                Some(BoardExit::Side | BoardExit::Top) => {
                    self.say("Numby reset! Try again to reach the quota.")
                }
                Some(BoardExit::Bottom) | None => {
                    self.say("Numby got stuck bouncing around! Resetting for free.")
                }
            },
            GameEvent::LifeLost { lives } => {
                self.say(&format!("Life used! {lives} lives remaining."));
            }
            GameEvent::DayCompleted {
                day,
                score,
                lives_gained,
            } => {
                self.io.audio.notify(SoundCue::DayComplete);
                self.stats.update_highest_day(day + 1, self.io.store.as_mut());
                let lives = match lives_gained {
                    0 => String::new(),
                    1 => " Restored 1 life!".to_string(),
                    n => format!(" Restored {n} lives!"),
                };
                self.say(&format!("Day {day} complete! Quota reached with {score}.{lives}"));
                self.say("The sun remains intact... for now.");
            }
            GameEvent::ChallengeStarted(challenge) => {
                self.say(&format!(
                    "🏆 DAILY CHALLENGE: {} - {}",
                    challenge.name(),
                    challenge.description()
                ));
            }
            GameEvent::ShopOpened { offers } => self.io.shop.present(&offers),
            GameEvent::GameOver { day, .. } => {
                self.io.audio.notify(SoundCue::GameOver);
                self.stats.update_highest_day(day, self.io.store.as_mut());
                self.say("No more lives left! Game over.");
                self.say("CATASTROPHIC FAILURE! The sun has exploded.");
                self.record_high_score(day);
            }
        }
    }

    fn record_high_score(&mut self, day: u32) {
        let Some(rank) = self.high_scores.add_score(self.run_score, day, now_ms()) else {
            return;
        };
        self.high_scores.save(self.io.store.as_mut());
        self.say(&format!("New high score: {} (#{rank})", self.run_score));
    }

    fn check_achievements(&mut self) {
        let progress = Progress {
            day: self.run.state().day,
            items_owned: self.run.items().items().len(),
            synergies: self.run.items().synergies().len(),
            stats: self.stats.stats(),
        };
        let unlocked = self.achievements.check(&progress, self.io.store.as_mut());
        for achievement in unlocked {
            self.io.audio.notify(SoundCue::Achievement);
            self.say(&format!("🏆 Achievement Unlocked: {}!", achievement.name()));
        }
    }
}
