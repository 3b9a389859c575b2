//! Frame-driven simulation tick
//!
//! One call per animation frame. Player commands for the frame arrive in a
//! [`TickInput`]; everything else is advanced deterministically from the run's
//! own state and seed.

use super::run::{Aim, Run};
use super::state::GamePhase;

/// Answer to the reward shop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardChoice {
    Take(usize),
    Skip,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Launch Numby (click/tap)
    pub launch: Option<Aim>,
    /// Pick from the reward shop
    pub reward: Option<RewardChoice>,
    /// Start over from day 1
    pub restart: bool,
    /// Idle/demo mode: random shots, always take the first reward
    pub autoplay: bool,
}

/// Advance the run by one tick
pub fn tick(run: &mut Run, input: &TickInput) {
    if input.restart {
        run.restart();
        return;
    }

    let mut input = input.clone();
    if input.autoplay {
        match run.phase() {
            GamePhase::Aiming => input.launch = Some(run.autoplay_aim()),
            GamePhase::DayComplete { .. } => input.reward = Some(RewardChoice::Take(0)),
            GamePhase::InFlight | GamePhase::GameOver => {}
        }
    }

    if let Some(choice) = input.reward {
        let result = match choice {
            RewardChoice::Take(index) => run.choose_reward(index).map(|_| ()),
            RewardChoice::Skip => run.skip_reward(),
        };
        if let Err(e) = result {
            log::warn!("{e}");
        }
    }

    if let Some(aim) = input.launch {
        if let Err(e) = run.launch(aim) {
            log::warn!("{e}");
        }
    }

    run.step();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GameEvent;
    use crate::tuning::Tuning;

    fn play(seed: u64, ticks: usize) -> (Run, Vec<GameEvent>) {
        let mut run = Run::new(Tuning::default(), seed);
        let input = TickInput {
            autoplay: true,
            ..Default::default()
        };
        let mut events = Vec::new();
        for _ in 0..ticks {
            tick(&mut run, &input);
            events.extend(run.drain_events());
            if run.is_over() {
                break;
            }
        }
        (run, events)
    }

    #[test]
    fn test_tick_aiming_to_flight() {
        let mut run = Run::new(Tuning::default(), 12345);
        assert_eq!(run.phase(), &GamePhase::Aiming);

        let input = TickInput {
            launch: Some(Aim::new(1.2, 80.0)),
            ..Default::default()
        };
        tick(&mut run, &input);
        assert_eq!(run.phase(), &GamePhase::InFlight);
        assert!(run.character().is_active());
    }

    #[test]
    fn test_launch_during_flight_is_ignored() {
        let mut run = Run::new(Tuning::default(), 3);
        let input = TickInput {
            launch: Some(Aim::new(1.2, 80.0)),
            ..Default::default()
        };
        tick(&mut run, &input);
        tick(&mut run, &input);
        assert_eq!(run.phase(), &GamePhase::InFlight);
        let launches = run
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::Launched { .. }))
            .count();
        assert_eq!(launches, 1);
    }

    #[test]
    fn test_restart_input() {
        let (mut run, _) = play(5, 2_000);
        tick(
            &mut run,
            &TickInput {
                restart: true,
                ..Default::default()
            },
        );
        assert_eq!(run.state().day, 1);
        assert_eq!(run.phase(), &GamePhase::Aiming);
    }

    #[test]
    fn test_determinism() {
        let (run1, events1) = play(12345, 5_000);
        let (run2, events2) = play(12345, 5_000);

        assert_eq!(events1, events2);
        assert_eq!(run1.state(), run2.state());
        assert_eq!(run1.board().pegs(), run2.board().pegs());
        assert_eq!(run1.time_ticks(), run2.time_ticks());
    }

    #[test]
    fn test_autoplay_makes_progress() {
        let (run, events) = play(99, 20_000);
        assert!(events.iter().any(|e| matches!(e, GameEvent::PegHit { .. })));
        assert!(run.state().lives <= run.state().max_lives);
        if run.is_over() {
            assert!(run.state().run_ended);
        }
    }
}
