//! Plain data structures describing one voice's live state.
//!
//! Grounded on `voice.h`: a voice owns two oscillator lines (each with two
//! unison oscillators), four envelopes (amplitude + bend, per line), and
//! shares two LFOs (vibrato, tremolo) that are computed once per voice and
//! applied to both lines.

/// Which of a line's two unison oscillators this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unison {
    /// First unison oscillator (no detune, or `+detune` under
    /// [`crate::patch::UnisonMode::PlusAndMinus`]).
    One,
    /// Second unison oscillator (`+detune`, or `-detune` under
    /// [`crate::patch::UnisonMode::PlusAndMinus`]).
    Two,
}

/// One oscillator: a wave-phase accumulator, a resonance-phase
/// accumulator, and the wave1/wave2 alternation flag.
///
/// Stepping lives in [`super::oscillator`], which owns the pitch-index
/// and bend-period bookkeeping this struct alone can't express.
#[derive(Debug, Clone, Copy, Default)]
pub struct OscPair {
    /// 24-bit wave-phase accumulator.
    pub wave_phase: u32,
    /// 24-bit resonance-phase accumulator, resynced to `wave_phase` on
    /// every wave-phase wrap.
    pub res_phase: u32,
    /// Fixed pitch index (cents, quantized) set at `note_on` and held
    /// for the life of the note.
    pub pitch_index: u32,
    /// Alternates each full wave-phase cycle; selects wave1 vs wave2 for
    /// waveforms that use both slots.
    pub use_wave2: bool,
}

/// The four stages an envelope steps through (`voice.c`'s
/// `VOICE_ENV_STAGE_*`). There is no separate "off" stage: a released
/// envelope simply stays in `Release` once it reaches full attenuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Falling (in attenuation) toward full volume, at a rate that
    /// halves the remaining distance each period rather than stepping
    /// linearly.
    Attack,
    /// Rising linearly toward the patch's hold level.
    Decay,
    /// Continues rising linearly, at its own rate, once the hold level
    /// is reached — CZ sustain is a slow onward decay, not a hold.
    Sustain,
    /// Rising linearly toward full attenuation, entered on note-off.
    Release,
}

/// One envelope generator (amplitude or bend, for one line).
#[derive(Debug, Clone, Copy)]
pub struct Envelope {
    /// Current stage.
    pub stage: EnvelopeStage,
    /// Current attenuation, in dB-domain units (`0` = full volume,
    /// `MAX_ATTENUATION_DB` = silence).
    pub attenuation: i32,
    /// 24-bit accumulator driving the current stage's dB stepping.
    pub phase: u32,
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope {
            stage: EnvelopeStage::Release,
            attenuation: super::tables::MAX_ATTENUATION_DB,
            phase: 0,
        }
    }
}

/// One LFO's running state (shared by vibrato and tremolo, each voice
/// has one of each).
#[derive(Debug, Clone, Copy, Default)]
pub struct Lfo {
    /// 24-bit phase accumulator.
    pub phase: u32,
    /// Remaining delay, in samples, before the LFO starts moving.
    pub delay_remaining: u32,
    /// Last computed output, already scaled by depth/sensitivity/wheel.
    pub output: i32,
}

/// A single voice: two oscillator lines (each with two unison
/// oscillators), four envelopes, two LFOs, and the note/controller state
/// that drove them at `note_on`.
#[derive(Debug, Clone)]
pub struct Voice {
    /// Whether this voice is currently allocated to a sounding note.
    pub active: bool,
    /// Cart index set by [`super::engine::VoiceEngine::load_patch`]; the
    /// voice carries this only to know which patch to read at update
    /// time, never mutating it.
    pub cart_index: usize,
    /// Patch index set by `load_patch`, alongside `cart_index`.
    pub patch_index: usize,
    /// MIDI note last passed to `note_on` (for `note_off` matching).
    pub midi_note: u8,
    /// Internal note number (0..=155) actually driving pitch.
    pub base_note: i32,
    /// Note-on velocity, 0..128.
    pub velocity: u8,
    /// Pitch-wheel position, signed, centered on 0 (not consumed by the
    /// per-sample pipeline; carried for API completeness).
    pub pitch_wheel_pos: i32,
    /// Last sample rendered by `update_all`, signed 16-bit PCM (§3.4,
    /// §6.4).
    pub level: i16,

    /// Line-1 unison oscillators.
    pub line1: [OscPair; 2],
    /// Line-2 unison oscillators.
    pub line2: [OscPair; 2],

    /// Line-1 amplitude envelope.
    pub line1_amplitude_env: Envelope,
    /// Line-1 bend (DCW) envelope.
    pub line1_bend_env: Envelope,
    /// Line-2 amplitude envelope.
    pub line2_amplitude_env: Envelope,
    /// Line-2 bend (DCW) envelope.
    pub line2_bend_env: Envelope,

    /// Vibrato LFO (pitch).
    pub vibrato: Lfo,
    /// Tremolo LFO (amplitude or bend).
    pub tremolo: Lfo,

    /// Current vibrato wheel (mod wheel) position, 0..=100.
    pub vibrato_wheel_pos: u8,
    /// Current tremolo wheel (mod wheel) position, 0..=100.
    pub tremolo_wheel_pos: u8,
}

impl Voice {
    /// A freshly reset, inactive voice.
    pub fn reset() -> Self {
        Voice {
            active: false,
            cart_index: 0,
            patch_index: 0,
            midi_note: 0,
            base_note: 0,
            velocity: 0,
            pitch_wheel_pos: 0,
            level: 0,
            line1: [OscPair::default(); 2],
            line2: [OscPair::default(); 2],
            line1_amplitude_env: Envelope::default(),
            line1_bend_env: Envelope::default(),
            line2_amplitude_env: Envelope::default(),
            line2_bend_env: Envelope::default(),
            vibrato: Lfo::default(),
            tremolo: Lfo::default(),
            vibrato_wheel_pos: 0,
            tremolo_wheel_pos: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc_pair_defaults_to_silence() {
        let osc = OscPair::default();
        assert_eq!(osc.wave_phase, 0);
        assert_eq!(osc.res_phase, 0);
        assert!(!osc.use_wave2);
    }

    #[test]
    fn voice_reset_is_inactive() {
        let v = Voice::reset();
        assert!(!v.active);
        assert_eq!(v.line1_amplitude_env.stage, EnvelopeStage::Release);
    }
}
