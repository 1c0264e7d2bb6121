//! Cart & patch storage — the read-only parameter source for [`crate::voice`].
//!
//! This mirrors `cart.h`/`cart.c` of the original implementation: a small
//! bank of carts, each holding a fixed number of named, bounded patches.
//! The voice engine never mutates a patch; editing and bounds validation
//! live here, at the edit boundary, not in the per-sample hot path.

use serde::{Deserialize, Serialize};

/// Number of carts in a bank (music + sound effects).
pub const CART_NUM_INDICES: usize = 2;
/// Number of patches stored per cart.
pub const CART_NUM_PATCHES: usize = 16;
/// Maximum length of a cart or patch name.
pub const NAME_SIZE: usize = 16;

/// Index of the music cart.
pub const CART_INDEX_MUSIC: usize = 0;
/// Index of the sound-effects cart.
pub const CART_INDEX_SOUND_FX: usize = 1;

/// An oscillator waveform selector (8 values, §6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Waveform {
    /// Sawtooth.
    Saw = 0,
    /// Square.
    Square = 1,
    /// Pulse (asymmetric square).
    Pulse = 2,
    /// Two sine lobes per cycle.
    DoubleSine = 3,
    /// Half sawtooth, half flat.
    HalfSaw = 4,
    /// Resonance sawtooth: a sine driven by the resonance phase, windowed.
    ResonanceSaw = 5,
    /// Resonance triangle: same, with a triangular window.
    ResonanceTriangle = 6,
    /// Resonance trapezoid: same, with a trapezoidal window.
    ResonanceTrapezoid = 7,
}

impl Waveform {
    /// Number of distinct waveform values.
    pub const COUNT: u8 = 8;

    /// Builds a waveform from a raw, already-bounded patch byte.
    pub fn from_raw(raw: u8) -> Self {
        match raw % Self::COUNT {
            0 => Waveform::Saw,
            1 => Waveform::Square,
            2 => Waveform::Pulse,
            3 => Waveform::DoubleSine,
            4 => Waveform::HalfSaw,
            5 => Waveform::ResonanceSaw,
            6 => Waveform::ResonanceTriangle,
            _ => Waveform::ResonanceTrapezoid,
        }
    }

    /// True for the three waveforms driven by the resonance phase rather
    /// than the remapped wave phase.
    pub fn is_resonance(self) -> bool {
        matches!(
            self,
            Waveform::ResonanceSaw | Waveform::ResonanceTriangle | Waveform::ResonanceTrapezoid
        )
    }
}

/// An LFO shaping waveform (4 values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LfoWaveform {
    /// Four linear segments peaking at +/-sensitivity.
    Triangle = 0,
    /// Alternates +/-sensitivity at the phase midpoint.
    Square = 1,
    /// Linear ramp from -sensitivity to +sensitivity.
    SawUp = 2,
    /// Linear ramp from +sensitivity to -sensitivity.
    SawDown = 3,
}

impl LfoWaveform {
    /// Builds an LFO waveform from a raw, already-bounded patch byte.
    pub fn from_raw(raw: u8) -> Self {
        match raw % 4 {
            0 => LfoWaveform::Triangle,
            1 => LfoWaveform::Square,
            2 => LfoWaveform::SawUp,
            _ => LfoWaveform::SawDown,
        }
    }
}

/// Which path the tremolo LFO modulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TremoloMode {
    /// Modulates the amplitude envelope output.
    Amplitude = 0,
    /// Modulates the bend envelope output.
    Bend = 1,
}

impl TremoloMode {
    fn from_raw(raw: u8) -> Self {
        if raw == 0 {
            TremoloMode::Amplitude
        } else {
            TremoloMode::Bend
        }
    }
}

/// Whether the two unison oscillators detune symmetrically or one-sided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum UnisonMode {
    /// Unison 1 stays at the base pitch; unison 2 detunes up.
    ZeroAndPlus = 0,
    /// Unison 1 detunes up; unison 2 detunes down by the same amount.
    PlusAndMinus = 1,
}

impl UnisonMode {
    fn from_raw(raw: u8) -> Self {
        if raw == 0 {
            UnisonMode::ZeroAndPlus
        } else {
            UnisonMode::PlusAndMinus
        }
    }
}

/// Every bounded parameter a patch carries, in the order §6.1 lists them.
///
/// The discriminant is the index into [`Patch::values`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum PatchParam {
    Line1Wave1 = 0,
    Line1Wave2,
    Line1BendMax,
    Line1PmEnable,
    Line1AmEnable,
    Line1Detune,
    Line2Wave1,
    Line2Wave2,
    Line2BendMax,
    Line2PmEnable,
    Line2AmEnable,
    Line2Octave,
    Line2Note,
    Line2Detune,
    OutputRingMod,
    OutputMix,
    UnisonMode,
    UnisonDetune,
    AmpEnvAttack,
    AmpEnvDecay,
    AmpEnvRelease,
    AmpEnvHold,
    AmpEnvSustain,
    AmpEnvTimeKs,
    AmpEnvLevelKs,
    BendEnvAttack,
    BendEnvDecay,
    BendEnvRelease,
    BendEnvHold,
    BendEnvSustain,
    BendEnvTimeKs,
    BendEnvLevelKs,
    VelocityOffset,
    VelocityDepth,
    VibratoPolarity,
    VibratoWaveform,
    VibratoDelay,
    VibratoSpeed,
    VibratoDepth,
    VibratoSensitivity,
    TremoloMode,
    TremoloWaveform,
    TremoloDelay,
    TremoloSpeed,
    TremoloDepth,
    TremoloSensitivity,
    Transpose,
    PitchWheelMode,
    PitchWheelRange,
    PortamentoMode,
    PortamentoLegato,
    PortamentoFollow,
    PortamentoTime,
}

impl PatchParam {
    /// Number of parameters in a patch.
    pub const COUNT: usize = PatchParam::PortamentoTime as usize + 1;

    /// Exclusive upper bound for this parameter's raw byte value.
    pub fn bound(self) -> u8 {
        use PatchParam::*;
        match self {
            Line1Wave1 | Line1Wave2 | Line2Wave1 | Line2Wave2 => Waveform::COUNT,
            Line1BendMax | Line2BendMax => 100,
            Line1PmEnable | Line1AmEnable | Line2PmEnable | Line2AmEnable => 2,
            Line1Detune | Line2Detune | UnisonDetune => 100,
            Line2Octave => 7,
            Line2Note => 15,
            OutputRingMod => 2,
            OutputMix => 100,
            UnisonMode => 2,
            AmpEnvAttack | AmpEnvDecay | AmpEnvRelease | AmpEnvHold | AmpEnvSustain => 100,
            AmpEnvTimeKs | AmpEnvLevelKs => 100,
            BendEnvAttack | BendEnvDecay | BendEnvRelease | BendEnvHold | BendEnvSustain => 100,
            BendEnvTimeKs | BendEnvLevelKs => 100,
            VelocityOffset | VelocityDepth => 100,
            VibratoPolarity => 2,
            VibratoWaveform => 4,
            VibratoDelay | VibratoSpeed | VibratoDepth | VibratoSensitivity => 100,
            PatchParam::TremoloMode => 2,
            TremoloWaveform => 4,
            TremoloDelay | TremoloSpeed | TremoloDepth | TremoloSensitivity => 100,
            Transpose => 25,
            PitchWheelMode => 2,
            PitchWheelRange => 12,
            PortamentoMode => 2,
            PortamentoLegato => 2,
            PortamentoFollow => 2,
            PortamentoTime => 100,
        }
    }
}

/// A single synth patch: a name and a fixed vector of bounded parameter
/// bytes (§3.5, §6.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    /// Patch display name, space-padded, ASCII-alnum-or-space only.
    pub name: [u8; NAME_SIZE],
    /// Raw parameter bytes, indexed by [`PatchParam`].
    pub values: [u8; PatchParam::COUNT],
}

macro_rules! getter {
    ($name:ident, $param:ident) => {
        /// Raw value of the corresponding patch parameter.
        pub fn $name(&self) -> u8 {
            self.get(PatchParam::$param)
        }
    };
}

impl Patch {
    /// Builds a patch with every parameter at its default (usually zero,
    /// some centered), matching `cart_reset_patch`.
    pub fn reset() -> Self {
        let mut values = [0u8; PatchParam::COUNT];
        values[PatchParam::Line1Detune as usize] = 50;
        values[PatchParam::Line2Octave as usize] = 3;
        values[PatchParam::Line2Note as usize] = 7;
        values[PatchParam::Line2Detune as usize] = 50;
        values[PatchParam::OutputMix as usize] = 50;
        values[PatchParam::UnisonDetune as usize] = 50;
        values[PatchParam::VelocityOffset as usize] = 50;
        values[PatchParam::VelocityDepth as usize] = 50;
        values[PatchParam::Transpose as usize] = 12;
        Patch {
            name: [b' '; NAME_SIZE],
            values,
        }
    }

    /// Raw value of a parameter, already clamped to its bound.
    pub fn get(&self, param: PatchParam) -> u8 {
        self.values[param as usize]
    }

    /// Clamps every parameter into `[0, bound)` and scrubs invalid name
    /// bytes to spaces. Mirrors `cart_validate_patch`; this is an edit-
    /// boundary operation, never called from the per-sample hot path.
    pub fn validate(&mut self) {
        for (i, v) in self.values.iter_mut().enumerate() {
            let bound = PatchParam_from_index(i).bound();
            if *v >= bound {
                *v = bound - 1;
            }
        }
        for b in self.name.iter_mut() {
            let valid = *b == b' ' || b.is_ascii_alphanumeric();
            if !valid {
                *b = b' ';
            }
        }
    }

    getter!(line1_wave1_raw, Line1Wave1);
    getter!(line1_wave2_raw, Line1Wave2);
    getter!(line2_wave1_raw, Line2Wave1);
    getter!(line2_wave2_raw, Line2Wave2);

    /// Line-1 wave-1/wave-2 selector.
    pub fn line1_wave1(&self) -> Waveform {
        Waveform::from_raw(self.line1_wave1_raw())
    }
    /// Line-1 wave-2 selector (used on alternate wave-phase cycles).
    pub fn line1_wave2(&self) -> Waveform {
        Waveform::from_raw(self.line1_wave2_raw())
    }
    /// Line-2 wave-1 selector.
    pub fn line2_wave1(&self) -> Waveform {
        Waveform::from_raw(self.line2_wave1_raw())
    }
    /// Line-2 wave-2 selector.
    pub fn line2_wave2(&self) -> Waveform {
        Waveform::from_raw(self.line2_wave2_raw())
    }

    /// True if either of Line-1's waveforms is [`Waveform::DoubleSine`].
    pub fn line1_has_double_sine(&self) -> bool {
        self.line1_wave1() == Waveform::DoubleSine || self.line1_wave2() == Waveform::DoubleSine
    }
    /// True if either of Line-2's waveforms is [`Waveform::DoubleSine`].
    pub fn line2_has_double_sine(&self) -> bool {
        self.line2_wave1() == Waveform::DoubleSine || self.line2_wave2() == Waveform::DoubleSine
    }

    getter!(line1_detune, Line1Detune);
    getter!(line2_detune, Line2Detune);
    getter!(unison_detune_raw, UnisonDetune);
    getter!(line2_octave, Line2Octave);
    getter!(line2_note, Line2Note);
    getter!(output_mix, OutputMix);

    /// Unison detune amount, unbiased.
    pub fn unison_detune(&self) -> u8 {
        self.unison_detune_raw()
    }

    /// Whether ring modulation is enabled for Line-2 onto Line-1.
    pub fn output_ring_mod(&self) -> bool {
        self.get(PatchParam::OutputRingMod) != 0
    }

    /// Unison detune sign pattern.
    pub fn unison_mode(&self) -> UnisonMode {
        UnisonMode::from_raw(self.get(PatchParam::UnisonMode))
    }

    getter!(amp_env_attack, AmpEnvAttack);
    getter!(amp_env_decay, AmpEnvDecay);
    getter!(amp_env_release, AmpEnvRelease);
    getter!(amp_env_hold, AmpEnvHold);
    getter!(amp_env_sustain, AmpEnvSustain);
    getter!(amp_env_time_ks, AmpEnvTimeKs);
    getter!(amp_env_level_ks, AmpEnvLevelKs);

    getter!(bend_env_attack, BendEnvAttack);
    getter!(bend_env_decay, BendEnvDecay);
    getter!(bend_env_release, BendEnvRelease);
    getter!(bend_env_hold, BendEnvHold);
    getter!(bend_env_sustain, BendEnvSustain);
    getter!(bend_env_time_ks, BendEnvTimeKs);
    getter!(bend_env_level_ks, BendEnvLevelKs);

    getter!(velocity_offset, VelocityOffset);
    getter!(velocity_depth, VelocityDepth);

    getter!(vibrato_delay, VibratoDelay);
    getter!(vibrato_speed, VibratoSpeed);
    getter!(vibrato_depth, VibratoDepth);
    getter!(vibrato_sensitivity, VibratoSensitivity);

    /// Vibrato LFO waveform.
    pub fn vibrato_waveform(&self) -> LfoWaveform {
        LfoWaveform::from_raw(self.get(PatchParam::VibratoWaveform))
    }

    /// Whether vibrato is bipolar or unipolar (applied at the controller
    /// layer outside this crate's core; stored here for completeness).
    pub fn vibrato_is_unipolar(&self) -> bool {
        self.get(PatchParam::VibratoPolarity) != 0
    }

    getter!(tremolo_delay, TremoloDelay);
    getter!(tremolo_speed, TremoloSpeed);
    getter!(tremolo_depth, TremoloDepth);
    getter!(tremolo_sensitivity, TremoloSensitivity);

    /// Tremolo LFO waveform.
    pub fn tremolo_waveform(&self) -> LfoWaveform {
        LfoWaveform::from_raw(self.get(PatchParam::TremoloWaveform))
    }

    /// Whether tremolo modulates amplitude or bend.
    pub fn tremolo_mode(&self) -> TremoloMode {
        TremoloMode::from_raw(self.get(PatchParam::TremoloMode))
    }

    getter!(transpose_raw, Transpose);

    /// Transpose, in semitones, centered on zero (default `+12` raw = 0
    /// semitones).
    pub fn transpose_semitones(&self) -> i32 {
        self.transpose_raw() as i32 - 12
    }
}

#[allow(non_snake_case)]
fn PatchParam_from_index(i: usize) -> PatchParam {
    // SAFETY-free: PatchParam is a fieldless repr(u8) enum covering
    // 0..PatchParam::COUNT contiguously; i is always in that range here.
    const VARIANTS: [PatchParam; PatchParam::COUNT] = [
        PatchParam::Line1Wave1,
        PatchParam::Line1Wave2,
        PatchParam::Line1BendMax,
        PatchParam::Line1PmEnable,
        PatchParam::Line1AmEnable,
        PatchParam::Line1Detune,
        PatchParam::Line2Wave1,
        PatchParam::Line2Wave2,
        PatchParam::Line2BendMax,
        PatchParam::Line2PmEnable,
        PatchParam::Line2AmEnable,
        PatchParam::Line2Octave,
        PatchParam::Line2Note,
        PatchParam::Line2Detune,
        PatchParam::OutputRingMod,
        PatchParam::OutputMix,
        PatchParam::UnisonMode,
        PatchParam::UnisonDetune,
        PatchParam::AmpEnvAttack,
        PatchParam::AmpEnvDecay,
        PatchParam::AmpEnvRelease,
        PatchParam::AmpEnvHold,
        PatchParam::AmpEnvSustain,
        PatchParam::AmpEnvTimeKs,
        PatchParam::AmpEnvLevelKs,
        PatchParam::BendEnvAttack,
        PatchParam::BendEnvDecay,
        PatchParam::BendEnvRelease,
        PatchParam::BendEnvHold,
        PatchParam::BendEnvSustain,
        PatchParam::BendEnvTimeKs,
        PatchParam::BendEnvLevelKs,
        PatchParam::VelocityOffset,
        PatchParam::VelocityDepth,
        PatchParam::VibratoPolarity,
        PatchParam::VibratoWaveform,
        PatchParam::VibratoDelay,
        PatchParam::VibratoSpeed,
        PatchParam::VibratoDepth,
        PatchParam::VibratoSensitivity,
        PatchParam::TremoloMode,
        PatchParam::TremoloWaveform,
        PatchParam::TremoloDelay,
        PatchParam::TremoloSpeed,
        PatchParam::TremoloDepth,
        PatchParam::TremoloSensitivity,
        PatchParam::Transpose,
        PatchParam::PitchWheelMode,
        PatchParam::PitchWheelRange,
        PatchParam::PortamentoMode,
        PatchParam::PortamentoLegato,
        PatchParam::PortamentoFollow,
        PatchParam::PortamentoTime,
    ];
    VARIANTS[i]
}

/// A cart: a name and a fixed bank of patches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Cart display name.
    pub name: [u8; NAME_SIZE],
    /// Patches stored on this cart.
    pub patches: Vec<Patch>,
}

impl Cart {
    fn new() -> Self {
        Cart {
            name: [b' '; NAME_SIZE],
            patches: (0..CART_NUM_PATCHES).map(|_| Patch::reset()).collect(),
        }
    }
}

/// The full cart bank: [`CART_NUM_INDICES`] carts, each with
/// [`CART_NUM_PATCHES`] patches. This is the read-only parameter source
/// `voice::engine::VoiceEngine` reads from (§3.5, §3.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchBank {
    carts: Vec<Cart>,
}

impl PatchBank {
    /// Builds a bank with every patch at its reset defaults.
    pub fn new() -> Self {
        PatchBank {
            carts: (0..CART_NUM_INDICES).map(|_| Cart::new()).collect(),
        }
    }

    /// Number of carts in the bank.
    pub fn cart_count(&self) -> usize {
        self.carts.len()
    }

    /// Looks up a patch by cart and patch index, returning `None` if
    /// either index is out of range.
    pub fn get(&self, cart_index: usize, patch_index: usize) -> Option<&Patch> {
        self.carts.get(cart_index)?.patches.get(patch_index)
    }

    /// Mutable lookup, for the edit surface (not the voice hot path).
    pub fn get_mut(&mut self, cart_index: usize, patch_index: usize) -> Option<&mut Patch> {
        self.carts.get_mut(cart_index)?.patches.get_mut(patch_index)
    }

    /// Resets a single patch to its defaults. Mirrors `cart_reset_patch`.
    pub fn reset_patch(&mut self, cart_index: usize, patch_index: usize) -> bool {
        match self.get_mut(cart_index, patch_index) {
            Some(p) => {
                *p = Patch::reset();
                true
            }
            None => false,
        }
    }

    /// Validates (clamps) a single patch in place. Mirrors
    /// `cart_validate_patch`.
    pub fn validate_patch(&mut self, cart_index: usize, patch_index: usize) -> bool {
        match self.get_mut(cart_index, patch_index) {
            Some(p) => {
                p.validate();
                true
            }
            None => false,
        }
    }

    /// Copies a patch from one slot to another, refusing a no-op copy
    /// onto itself. Mirrors `cart_copy_patch`.
    pub fn copy_patch(
        &mut self,
        dest_cart: usize,
        dest_patch: usize,
        src_cart: usize,
        src_patch: usize,
    ) -> bool {
        if dest_cart == src_cart && dest_patch == src_patch {
            return false;
        }
        let Some(src) = self.get(src_cart, src_patch).cloned() else {
            return false;
        };
        match self.get_mut(dest_cart, dest_patch) {
            Some(dest) => {
                *dest = src;
                true
            }
            None => false,
        }
    }
}

impl Default for PatchBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_param_count_matches_variant_list() {
        for i in 0..PatchParam::COUNT {
            let p = PatchParam_from_index(i);
            assert_eq!(p as usize, i);
        }
    }

    #[test]
    fn default_patch_validates_cleanly() {
        let mut p = Patch::reset();
        let before = p.values;
        p.validate();
        assert_eq!(p.values, before, "reset patch should already be in bounds");
    }

    #[test]
    fn validate_clamps_out_of_range_values() {
        let mut p = Patch::reset();
        p.values[PatchParam::Line1Wave1 as usize] = 255;
        p.validate();
        assert_eq!(
            p.values[PatchParam::Line1Wave1 as usize],
            Waveform::COUNT - 1
        );
    }

    #[test]
    fn validate_scrubs_invalid_name_bytes() {
        let mut p = Patch::reset();
        p.name[0] = 0xFF;
        p.validate();
        assert_eq!(p.name[0], b' ');
    }

    #[test]
    fn patch_bank_shape() {
        let bank = PatchBank::new();
        assert_eq!(bank.cart_count(), CART_NUM_INDICES);
        assert!(bank.get(CART_INDEX_MUSIC, 0).is_some());
        assert!(bank.get(CART_INDEX_SOUND_FX, CART_NUM_PATCHES - 1).is_some());
        assert!(bank.get(CART_NUM_INDICES, 0).is_none());
        assert!(bank.get(0, CART_NUM_PATCHES).is_none());
    }

    #[test]
    fn copy_patch_rejects_self_copy() {
        let mut bank = PatchBank::new();
        assert!(!bank.copy_patch(0, 0, 0, 0));
    }

    #[test]
    fn copy_patch_copies_values() {
        let mut bank = PatchBank::new();
        bank.get_mut(0, 1).unwrap().values[PatchParam::OutputMix as usize] = 10;
        assert!(bank.copy_patch(0, 2, 0, 1));
        assert_eq!(
            bank.get(0, 2).unwrap().values[PatchParam::OutputMix as usize],
            10
        );
    }
}
