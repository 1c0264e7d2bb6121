//! Voice-bank lifecycle API and the per-sample update pipeline tying
//! together the LFO, envelope, oscillator, and mixer stages.
//!
//! Grounded on `voice.c`'s `voice_bank` and `voice_update_all()`: a fixed
//! array of voices, each independently addressable by index, stepped one
//! sample at a time across the whole bank in a single call with no
//! allocation and no branching on note count.

use crate::patch::{Patch, PatchBank, TremoloMode, UnisonMode};
use crate::SynthError;
use super::envelope::{self, EnvelopeParams};
use super::lfo::{self, LfoParams};
use super::mixer::{self, LineOutputs};
use super::oscillator;
use super::state::{EnvelopeStage, OscPair, Voice};
use super::tables::{notes, tables, MAX_PITCH_INDEX, TUNING_STEPS_PER_OCTAVE};

/// Number of voices a [`VoiceEngine`] can sound at once (`voice.h`'s
/// `VOICE_NUM_VOICES`).
pub const NUM_VOICES: usize = 16;

/// Owns a fixed voice bank and the patch store those voices read from;
/// the sole entry point for the per-sample pipeline.
#[derive(Debug, Clone)]
pub struct VoiceEngine {
    voices: Vec<Voice>,
    patches: PatchBank,
}

fn cents_to_pitch_index(cents: i32) -> u32 {
    let index = (cents as i64 * TUNING_STEPS_PER_OCTAVE as i64) / 1200;
    index.clamp(0, MAX_PITCH_INDEX as i64 - 1) as u32
}

fn vibrato_params(patch: &Patch) -> LfoParams {
    LfoParams {
        waveform: patch.vibrato_waveform(),
        delay: patch.vibrato_delay(),
        speed: patch.vibrato_speed(),
        depth: patch.vibrato_depth(),
        sensitivity: patch.vibrato_sensitivity(),
    }
}

fn tremolo_params(patch: &Patch) -> LfoParams {
    LfoParams {
        waveform: patch.tremolo_waveform(),
        delay: patch.tremolo_delay(),
        speed: patch.tremolo_speed(),
        depth: patch.tremolo_depth(),
        sensitivity: patch.tremolo_sensitivity(),
    }
}

fn amp_env_params(patch: &Patch) -> EnvelopeParams {
    EnvelopeParams {
        attack: patch.amp_env_attack(),
        decay: patch.amp_env_decay(),
        sustain: patch.amp_env_sustain(),
        release: patch.amp_env_release(),
        hold_level: patch.amp_env_hold(),
        time_keyscaling: patch.amp_env_time_ks(),
        level_keyscaling: patch.amp_env_level_ks(),
    }
}

fn bend_env_params(patch: &Patch) -> EnvelopeParams {
    EnvelopeParams {
        attack: patch.bend_env_attack(),
        decay: patch.bend_env_decay(),
        sustain: patch.bend_env_sustain(),
        release: patch.bend_env_release(),
        hold_level: patch.bend_env_hold(),
        time_keyscaling: patch.bend_env_time_ks(),
        level_keyscaling: patch.bend_env_level_ks(),
    }
}

impl VoiceEngine {
    /// Builds an engine with [`NUM_VOICES`] reset voices and a fresh,
    /// default-initialized patch bank.
    pub fn new() -> Self {
        VoiceEngine {
            voices: (0..NUM_VOICES).map(|_| Voice::reset()).collect(),
            patches: PatchBank::new(),
        }
    }

    /// Read-only access to the patch store.
    pub fn patches(&self) -> &PatchBank {
        &self.patches
    }

    /// Mutable access to the patch store — the edit boundary, never
    /// touched by `update_all`.
    pub fn patches_mut(&mut self) -> &mut PatchBank {
        &mut self.patches
    }

    /// Number of voices in the bank.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Read-only access to one voice's state, e.g. to read `level` after
    /// `update_all`.
    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    fn voice_mut(&mut self, index: usize) -> Result<&mut Voice, SynthError> {
        self.voices
            .get_mut(index)
            .ok_or(SynthError::InvalidIndex { what: "voice", value: index })
    }

    /// Resets every voice to its power-on state: envelopes in Release at
    /// full attenuation, every phase register at 0, every controller
    /// position at 0, `level` at 0.
    pub fn reset_all(&mut self) {
        for voice in &mut self.voices {
            *voice = Voice::reset();
        }
    }

    /// Points a voice at a cart/patch slot. Validates both indices
    /// against the patch store; the per-sample hot path never re-checks
    /// them.
    pub fn load_patch(
        &mut self,
        voice_index: usize,
        cart_index: usize,
        patch_index: usize,
    ) -> Result<(), SynthError> {
        if self.patches.get(cart_index, patch_index).is_none() {
            return Err(SynthError::InvalidIndex {
                what: "cart/patch",
                value: cart_index * 1000 + patch_index,
            });
        }
        let voice = self.voice_mut(voice_index)?;
        voice.cart_index = cart_index;
        voice.patch_index = patch_index;
        Ok(())
    }

    /// Starts a new note on a voice. MIDI notes outside the playable
    /// range are silently ignored (the voice stays as it was, and this
    /// still returns `Ok`). `velocity` outside `0..128` defaults to `96`,
    /// mirroring the retrieved source's handling of malformed MIDI.
    pub fn note_on(&mut self, voice_index: usize, midi_note: u8, velocity: u8) -> Result<(), SynthError> {
        let (cart_index, patch_index) = {
            let voice = self.voice_mut(voice_index)?;
            (voice.cart_index, voice.patch_index)
        };
        let patch = self
            .patches
            .get(cart_index, patch_index)
            .ok_or(SynthError::InvalidIndex { what: "voice patch", value: patch_index })?
            .clone();

        let internal_note = midi_note as i32 - 60 + notes::MIDDLE_C;
        if internal_note < notes::LOWEST_PLAYABLE || internal_note > notes::HIGHEST_PLAYABLE {
            return Ok(());
        }

        let voice = self.voice_mut(voice_index)?;
        voice.midi_note = midi_note;
        voice.base_note = internal_note;
        voice.velocity = if (velocity as i32) < 128 { velocity } else { 96 };
        voice.active = true;

        let (u1_sign, u2_sign): (i32, i32) = match patch.unison_mode() {
            UnisonMode::ZeroAndPlus => (0, 1),
            UnisonMode::PlusAndMinus => (1, -1),
        };
        let unison_detune_cents = patch.unison_detune() as i32 - 50;
        let base_cents = 100 * internal_note + 100 * patch.transpose_semitones();

        let line1_detune_cents = patch.line1_detune() as i32 - 50;
        for (i, osc) in voice.line1.iter_mut().enumerate() {
            let sign = if i == 0 { u1_sign } else { u2_sign };
            let cents = base_cents + line1_detune_cents + sign * unison_detune_cents;
            *osc = OscPair { pitch_index: cents_to_pitch_index(cents), ..OscPair::default() };
        }

        let line2_offset_cents =
            1200 * (patch.line2_octave() as i32 - 3) + 100 * (patch.line2_note() as i32 - 7);
        let line2_detune_cents = patch.line2_detune() as i32 - 50;
        for (i, osc) in voice.line2.iter_mut().enumerate() {
            let sign = if i == 0 { u1_sign } else { u2_sign };
            let cents = base_cents + line2_offset_cents + line2_detune_cents + sign * unison_detune_cents;
            *osc = OscPair { pitch_index: cents_to_pitch_index(cents), ..OscPair::default() };
        }

        envelope::start(&mut voice.line1_amplitude_env);
        envelope::start(&mut voice.line1_bend_env);
        envelope::start(&mut voice.line2_amplitude_env);
        envelope::start(&mut voice.line2_bend_env);

        lfo::start(&mut voice.vibrato, &vibrato_params(&patch));
        lfo::start(&mut voice.tremolo, &tremolo_params(&patch));

        Ok(())
    }

    /// Releases a voice's note. Envelopes not already in Release move
    /// there; one already releasing is left alone rather than restarted,
    /// mirroring `voice_note_off`'s idempotence.
    pub fn note_off(&mut self, voice_index: usize) -> Result<(), SynthError> {
        let voice = self.voice_mut(voice_index)?;
        for env in [
            &mut voice.line1_amplitude_env,
            &mut voice.line1_bend_env,
            &mut voice.line2_amplitude_env,
            &mut voice.line2_bend_env,
        ] {
            if env.stage != EnvelopeStage::Release {
                envelope::release(env);
            }
        }
        Ok(())
    }

    /// Advances every voice in the bank by one sample, writing each
    /// voice's rendered PCM sample into `voice.level`. Voices that were
    /// never `note_on`'d still run the full pipeline against their
    /// default (silent) patch slot and settle at `level == 0`.
    pub fn update_all(&mut self) {
        for voice in &mut self.voices {
            let patch = match self.patches.get(voice.cart_index, voice.patch_index) {
                Some(p) => p.clone(),
                None => continue,
            };
            Self::update_voice(voice, &patch);
        }
    }

    fn update_voice(voice: &mut Voice, patch: &Patch) {
        let t = tables();

        let vibrato_delta = lfo::step(
            &mut voice.vibrato,
            &vibrato_params(patch),
            voice.vibrato_wheel_pos,
            &t.vibrato_sensitivity,
            false,
        );
        let tremolo_delta = lfo::step(
            &mut voice.tremolo,
            &tremolo_params(patch),
            voice.tremolo_wheel_pos,
            &t.tremolo_sensitivity,
            true,
        );
        let velocity_db =
            lfo::velocity_adjustment(voice.velocity, patch.velocity_depth(), patch.velocity_offset());

        let amp_params = amp_env_params(patch);
        let bend_params = bend_env_params(patch);

        let line1_amp_db = envelope::step(&mut voice.line1_amplitude_env, &amp_params, voice.base_note);
        let line1_bend_db = envelope::step(&mut voice.line1_bend_env, &bend_params, voice.base_note);
        let line2_amp_db = envelope::step(&mut voice.line2_amplitude_env, &amp_params, voice.base_note);
        let line2_bend_db = envelope::step(&mut voice.line2_bend_env, &bend_params, voice.base_note);

        let line1_pm_on = patch.get(crate::patch::PatchParam::Line1PmEnable) != 0;
        let line1_am_on = patch.get(crate::patch::PatchParam::Line1AmEnable) != 0;
        let line2_pm_on = patch.get(crate::patch::PatchParam::Line2PmEnable) != 0;
        let line2_am_on = patch.get(crate::patch::PatchParam::Line2AmEnable) != 0;

        let tremolo_on_amp = patch.tremolo_mode() == TremoloMode::Amplitude;
        let tremolo_on_bend = patch.tremolo_mode() == TremoloMode::Bend;

        let line1_amp_db = line1_amp_db + if tremolo_on_amp && line1_am_on { tremolo_delta } else { 0 };
        let line2_amp_db = line2_amp_db + if tremolo_on_amp && line2_am_on { tremolo_delta } else { 0 };
        let line1_bend_db = line1_bend_db + if tremolo_on_bend && line1_am_on { tremolo_delta } else { 0 };
        let line2_bend_db = line2_bend_db + if tremolo_on_bend && line2_am_on { tremolo_delta } else { 0 };

        let wave1_1 = patch.line1_wave1();
        let wave1_2 = patch.line1_wave2();
        let wave2_1 = patch.line2_wave1();
        let wave2_2 = patch.line2_wave2();

        let mut line1_pairs = [
            oscillator::OscSample { db: 0, positive: true },
            oscillator::OscSample { db: 0, positive: true },
        ];
        for (i, osc) in voice.line1.iter_mut().enumerate() {
            let pitch = apply_vibrato(osc.pitch_index, vibrato_delta, line1_pm_on);
            line1_pairs[i] = oscillator::step(osc, wave1_1, wave1_2, pitch, line1_bend_db);
        }

        let mut line2_pairs = [
            oscillator::OscSample { db: 0, positive: true },
            oscillator::OscSample { db: 0, positive: true },
        ];
        for (i, osc) in voice.line2.iter_mut().enumerate() {
            let pitch = apply_vibrato(osc.pitch_index, vibrato_delta, line2_pm_on);
            line2_pairs[i] = oscillator::step(osc, wave2_1, wave2_2, pitch, line2_bend_db);
        }

        let line1 = LineOutputs { pairs: line1_pairs, amplitude_env_db: line1_amp_db + velocity_db };
        let line2 = LineOutputs { pairs: line2_pairs, amplitude_env_db: line2_amp_db + velocity_db };

        voice.level = mixer::mix(line1, line2, patch.output_ring_mod(), patch.output_mix());
    }
}

fn apply_vibrato(pitch_index: u32, vibrato_delta: i32, enabled: bool) -> u32 {
    if !enabled {
        return pitch_index;
    }
    (pitch_index as i64 + vibrato_delta as i64).clamp(0, MAX_PITCH_INDEX as i64 - 1) as u32
}

impl Default for VoiceEngine {
    fn default() -> Self {
        Self::new()
    }
}
