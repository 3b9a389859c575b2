//! Sound cues and the Web Audio notifier
//!
//! The game only names cues; what they sound like is up to the
//! [`crate::platform::AudioNotifier`]. In the browser, [`WebAudioNotifier`]
//! synthesizes them with oscillators, so no audio files are needed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Launch,
    PegHit,
    NumberHit,
    DayComplete,
    GameOver,
    Synergy,
    Achievement,
}

impl SoundCue {
    pub fn as_str(self) -> &'static str {
        match self {
            SoundCue::Launch => "launch",
            SoundCue::PegHit => "peg_hit",
            SoundCue::NumberHit => "number_hit",
            SoundCue::DayComplete => "day_complete",
            SoundCue::GameOver => "game_over",
            SoundCue::Synergy => "synergy",
            SoundCue::Achievement => "achievement",
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web_audio::WebAudioNotifier;

#[cfg(target_arch = "wasm32")]
mod web_audio {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::SoundCue;
    use crate::platform::AudioNotifier;

    pub struct WebAudioNotifier {
        ctx: Option<AudioContext>,
        master_volume: f32,
        muted: bool,
    }

    impl Default for WebAudioNotifier {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioNotifier for WebAudioNotifier {
        fn notify(&mut self, cue: SoundCue) {
            self.play(cue);
        }
    }

    impl WebAudioNotifier {
        pub fn new() -> Self {
            // Fails outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: 0.8,
                muted: false,
            }
        }

        pub fn set_master_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn volume(&self) -> f32 {
            if self.muted { 0.0 } else { self.master_volume }
        }

        pub fn play(&self, cue: SoundCue) {
            let vol = self.volume();
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Browsers keep the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match cue {
                SoundCue::Launch => play_launch(ctx, vol),
                SoundCue::PegHit => play_peg_hit(ctx, vol),
                SoundCue::NumberHit => arpeggio(ctx, vol * 0.2, &[600.0, 900.0], 0.05, 0.12, OscillatorType::Sine),
                SoundCue::DayComplete => arpeggio(
                    ctx,
                    vol * 0.3,
                    &[400.0, 500.0, 600.0, 800.0],
                    0.1,
                    0.4,
                    OscillatorType::Triangle,
                ),
                SoundCue::GameOver => arpeggio(
                    ctx,
                    vol * 0.3,
                    &[400.0, 350.0, 300.0, 200.0],
                    0.2,
                    0.3,
                    OscillatorType::Sine,
                ),
                SoundCue::Synergy => arpeggio(
                    ctx,
                    vol * 0.2,
                    &[1200.0, 1800.0, 2400.0],
                    0.02,
                    0.3,
                    OscillatorType::Sine,
                ),
                SoundCue::Achievement => arpeggio(
                    ctx,
                    vol * 0.25,
                    &[500.0, 600.0, 700.0, 800.0, 1000.0],
                    0.08,
                    0.25,
                    OscillatorType::Triangle,
                ),
            }
        }
    }

    /// Oscillator routed through a gain node to the speakers
    fn create_osc(ctx: &AudioContext, freq: f32, osc_type: OscillatorType) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Whoosh up
    fn play_launch(ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 200.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.2).ok();
        osc.frequency().set_value_at_time(200.0, t).ok();
        osc.frequency().exponential_ramp_to_value_at_time(600.0, t + 0.15).ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.25).ok();
    }

    /// Soft tap with a short pitch drop
    fn play_peg_hit(ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = create_osc(ctx, 320.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.25, t).ok();
        gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.06).ok();
        osc.frequency().exponential_ramp_to_value_at_time(220.0, t + 0.06).ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.08).ok();
    }

    /// Notes in sequence, `step` seconds apart, each decaying over `decay`
    fn arpeggio(ctx: &AudioContext, peak: f32, notes: &[f32], step: f64, decay: f64, osc_type: OscillatorType) {
        for (i, freq) in notes.iter().enumerate() {
            let Some((osc, gain)) = create_osc(ctx, *freq, osc_type) else {
                continue;
            };
            let t = ctx.current_time() + i as f64 * step;
            gain.gain().set_value_at_time(peak, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, t + decay).ok();
            osc.start_with_when(t).ok();
            osc.stop_with_when(t + decay + 0.05).ok();
        }
    }
}
