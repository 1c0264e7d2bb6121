//! Phase-distortion oscillator pair: wave-phase and resonance-phase
//! accumulators, the five non-resonance waveform remaps, and the three
//! resonance waveforms.
//!
//! Grounded on the oscillator block of `voice_update_all()`: a wave-phase
//! accumulator advances every sample and wraps every cycle; on each wrap
//! the resonance-phase accumulator is resynced to the wave phase's
//! *wrapped* value (not zero) and the oscillator's wave1/wave2 selector
//! flips. Non-resonance waveforms remap the wave-phase index through a
//! piecewise function of the bend envelope's current period before a
//! sine lookup; resonance waveforms skip the remap and read the
//! resonance phase directly, adding a resonance window on top.

use super::state::OscPair;
use super::tables::{
    tables, Tables, DB_SIZE, MANTISSA_BITS, MAX_ATTENUATION_DB, MAX_PITCH_INDEX, PHASE_REG_SIZE,
    TUNING_NUM_OCTAVES, TUNING_STEPS_PER_OCTAVE, WAVE_HALF_SIZE, WAVE_MASK, WAVE_SIZE,
};
use crate::patch::Waveform;

const WAVE_QUARTER_SIZE: u32 = WAVE_SIZE / 4;
/// DOUBLE_SINE's middle segment divides by `N - b`; a bend period at or
/// above `N` would make that segment vanish or invert, so §4.5 step 5
/// caps the period at half a cycle whenever either wave slot is
/// DOUBLE_SINE.
const DOUBLE_SINE_MAX_PERIOD: u32 = WAVE_HALF_SIZE;

/// One oscillator's output before envelope and mixing are applied: a
/// dB-domain magnitude and a sign.
#[derive(Debug, Clone, Copy)]
pub struct OscSample {
    /// dB-domain attenuation of this sample's magnitude.
    pub db: i32,
    /// Whether the underlying sine lobe is the positive half.
    pub positive: bool,
}

fn phase_increment_for_index(index: u32, t: &Tables) -> u32 {
    let max_index = TUNING_NUM_OCTAVES * TUNING_STEPS_PER_OCTAVE - 1;
    let index = index.min(max_index);
    let row = index / TUNING_STEPS_PER_OCTAVE;
    let step = (index % TUNING_STEPS_PER_OCTAVE) as usize;
    if row < TUNING_NUM_OCTAVES - 1 {
        t.phase_increment[step] >> (TUNING_NUM_OCTAVES - 1 - row)
    } else {
        t.phase_increment[step]
    }
}

/// The bend envelope's period, looked up the same row/step way as the
/// tuning tables, but keyed on `res_offset` (`4095 - bend_env_level`)
/// rather than the envelope level directly: a wide-open bend envelope
/// (`bend_db == 0`, `res_offset == 4095`) lands in the highest row, whose
/// shift collapses `bend_period` toward its smallest value and so gives
/// maximum distortion; a fully closed one (`res_offset == 0`) takes row
/// 0 unshifted, i.e. `bend_period == WAVE_SIZE`, a no-op remap.
fn bend_period_for_res_offset(res_offset: u32, t: &Tables) -> u32 {
    const ROWS: u32 = DB_SIZE as u32 / TUNING_STEPS_PER_OCTAVE;
    let offset = res_offset.min(DB_SIZE as u32 - 1);
    let row = (offset / TUNING_STEPS_PER_OCTAVE).min(ROWS - 1);
    let step = (offset % TUNING_STEPS_PER_OCTAVE) as usize;
    t.bend_period[step] >> row
}

/// The resonance phase runs ahead of the wave phase by this many
/// tuning-table steps, inversely proportional to the bend envelope's
/// level: a wide-open bend envelope (`bend_db == 0`) pushes the
/// resonance partial far above the fundamental.
fn resonance_offset(bend_db: i32) -> u32 {
    (MAX_ATTENUATION_DB - bend_db).clamp(0, MAX_ATTENUATION_DB) as u32
}

/// The five non-resonance waveform remaps, each a total function of the
/// wave-phase index and the bend period, operating directly in the
/// `0..WAVE_SIZE` (N = 2048) domain §4.5 step 6 specifies. Every branch
/// boundary and slope matches the spec's piecewise table; `b` is clamped
/// to at least 1 so none of the divisions below can be by zero.
mod remap_fns {
    use super::WAVE_SIZE;

    const N: i64 = WAVE_SIZE as i64;

    fn wrap(v: i64) -> u32 {
        v.rem_euclid(N) as u32
    }

    pub fn saw(index: u32, b: u32) -> u32 {
        let b = (b as i64).max(1);
        let x = index as i64;
        let b4 = b / 4;
        let v = if x < b4 {
            x * N / b
        } else if x < N - b4 {
            (x - b4) * N / (2 * N - b) + N / 4
        } else {
            (x - (N - b4)) * N / b + 3 * N / 4
        };
        wrap(v)
    }

    pub fn square(index: u32, b: u32) -> u32 {
        let b = (b as i64).max(1);
        let x = index as i64;
        let b4 = b / 4;
        let half = N / 2;
        let v = if x < b4 {
            x * N / b
        } else if x < half - b4 {
            N / 4
        } else if x < half + b4 {
            (x - (half - b4)) * N / b + N / 4
        } else if x < N - b4 {
            3 * N / 4
        } else {
            (x - (N - b4)) * N / b + 3 * N / 4
        };
        wrap(v)
    }

    pub fn pulse(index: u32, b: u32) -> u32 {
        let b = (b as i64).max(1);
        let x = index as i64;
        let b4 = b / 4;
        let b34 = 3 * b / 4;
        let v = if x < b34 {
            x * N / b
        } else if x < N - b4 {
            3 * N / 4
        } else {
            (x - (N - b4)) * N / b + 3 * N / 4
        };
        wrap(v)
    }

    pub fn double_sine(index: u32, b: u32) -> u32 {
        let b = (b as i64).max(1).min(N - 1);
        let x = index as i64;
        let b4 = b / 4;
        let b34 = 3 * b / 4;
        let v = if x < b34 {
            x * N / b
        } else if x < N - b4 {
            let denom = (N - b).max(1);
            wrap((x - b34) * N / denom + 3 * N / 4) as i64
        } else {
            (x - (N - b4)) * N / b + 3 * N / 4
        };
        wrap(v)
    }

    pub fn half_saw(index: u32, b: u32) -> u32 {
        let b = (b as i64).max(1);
        let x = index as i64;
        let b4 = b / 4;
        let half = N / 2;
        let v = if x < b4 {
            x * N / b
        } else if x < half - b4 {
            N / 4
        } else if x < N - b4 {
            x - (half - b4) + N / 4
        } else {
            (x - (N - b4)) * N / b + 3 * N / 4
        };
        wrap(v)
    }
}

fn remap(waveform: Waveform, index: u32, period: u32) -> u32 {
    match waveform {
        Waveform::Saw => remap_fns::saw(index, period),
        Waveform::Square => remap_fns::square(index, period),
        Waveform::Pulse => remap_fns::pulse(index, period),
        Waveform::DoubleSine => remap_fns::double_sine(index, period),
        Waveform::HalfSaw => remap_fns::half_saw(index, period),
        Waveform::ResonanceSaw | Waveform::ResonanceTriangle | Waveform::ResonanceTrapezoid => index,
    }
}

/// The resonance window, keyed on the *unmodified* wave-phase index
/// (not the remapped resonance index), one shape per resonance waveform
/// (§4.5 step 10, matching `voice.c`'s window lookups exactly).
fn resonance_window(waveform: Waveform, wave_index: u32, t: &Tables) -> i32 {
    let half = WAVE_HALF_SIZE;
    match waveform {
        Waveform::ResonanceSaw => t.window[((wave_index / 2) % half) as usize],
        Waveform::ResonanceTriangle => {
            let idx = if wave_index < half {
                (half - wave_index) % half
            } else {
                (wave_index - half) % half
            };
            t.window[idx as usize]
        }
        Waveform::ResonanceTrapezoid => {
            if wave_index < half {
                super::tables::MAX_VOLUME_DB
            } else {
                t.window[((wave_index - half) % half) as usize]
            }
        }
        _ => super::tables::MAX_VOLUME_DB,
    }
}

/// Advances one oscillator's wave and resonance phases by one sample.
/// Returns true if the wave phase wrapped this sample (the resonance
/// phase was resynced rather than advanced on a wrap sample).
pub fn advance(osc: &mut OscPair, pitch_index: u32, res_offset: u32, t: &Tables) -> bool {
    let wave_inc = phase_increment_for_index(pitch_index, t);
    let next = osc.wave_phase.wrapping_add(wave_inc);
    if next >= PHASE_REG_SIZE {
        let wrapped = next - PHASE_REG_SIZE;
        osc.wave_phase = wrapped;
        osc.res_phase = wrapped;
        osc.use_wave2 = !osc.use_wave2;
        true
    } else {
        osc.wave_phase = next;
        let res_pitch_index = pitch_index.saturating_add(res_offset).min(MAX_PITCH_INDEX - 1);
        let res_inc = phase_increment_for_index(res_pitch_index, t);
        osc.res_phase = osc.res_phase.wrapping_add(res_inc) % PHASE_REG_SIZE;
        false
    }
}

/// Computes one oscillator's dB-domain sample for its currently active
/// waveform (wave1 unless `use_wave2` is set), given the bend envelope's
/// current attenuation.
pub fn sample(osc: &OscPair, wave1: Waveform, wave2: Waveform, bend_db: i32) -> OscSample {
    let t = tables();
    let waveform = if osc.use_wave2 { wave2 } else { wave1 };
    let wave_index = (osc.wave_phase >> MANTISSA_BITS) & WAVE_MASK;

    if waveform.is_resonance() {
        let res_index = (osc.res_phase >> MANTISSA_BITS) & WAVE_MASK;
        let positive = res_index < WAVE_HALF_SIZE;
        let magnitude = t.sine_half[(res_index % WAVE_HALF_SIZE) as usize];
        let window = resonance_window(waveform, wave_index, t);
        OscSample {
            db: (magnitude + window).min(MAX_ATTENUATION_DB),
            positive,
        }
    } else {
        let res_offset = resonance_offset(bend_db);
        let mut period = bend_period_for_res_offset(res_offset, t);
        if wave1 == Waveform::DoubleSine || wave2 == Waveform::DoubleSine {
            period = period.min(DOUBLE_SINE_MAX_PERIOD);
        }
        let remapped = remap(waveform, wave_index, period);
        let positive = remapped < WAVE_HALF_SIZE;
        let magnitude = t.sine_half[(remapped % WAVE_HALF_SIZE) as usize];
        OscSample { db: magnitude, positive }
    }
}

/// Advances an oscillator pair and returns its sample for this sample
/// tick, given the currently-playing pitch index and the bend
/// envelope's live attenuation.
pub fn step(
    osc: &mut OscPair,
    wave1: Waveform,
    wave2: Waveform,
    pitch_index: u32,
    bend_db: i32,
) -> OscSample {
    let t = tables();
    let res_offset = resonance_offset(bend_db);
    advance(osc, pitch_index, res_offset, t);
    sample(osc, wave1, wave2, bend_db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_phase_wraps_and_resyncs_resonance() {
        let mut osc = OscPair { wave_phase: PHASE_REG_SIZE - 1, ..OscPair::default() };
        let t = tables();
        let wrapped = advance(&mut osc, 5000, 100, t);
        assert!(wrapped);
        assert_eq!(osc.wave_phase, osc.res_phase);
        assert!(osc.use_wave2);
    }

    #[test]
    fn saw_remap_is_identity_at_full_period() {
        // bend_period == WAVE_SIZE (no distortion) reduces SAW to the
        // identity map for every index, per §8.2 property 11.
        for x in [0u32, 1, 500, 1023, 1024, 1500, 2047] {
            assert_eq!(remap_fns::saw(x, WAVE_SIZE), x, "x={x}");
        }
    }

    #[test]
    fn sample_is_silent_at_zero_crossing() {
        let osc = OscPair::default();
        let s = sample(&osc, Waveform::Saw, Waveform::Saw, 0);
        assert_eq!(s.db, MAX_ATTENUATION_DB);
    }

    #[test]
    fn resonance_waveform_reads_res_phase_not_remap() {
        let mut osc = OscPair::default();
        osc.res_phase = WAVE_HALF_SIZE << MANTISSA_BITS;
        let s = sample(&osc, Waveform::ResonanceSaw, Waveform::ResonanceSaw, 0);
        assert!(!s.positive);
    }

    #[test]
    fn double_sine_period_is_clamped_for_either_wave_slot() {
        let t = tables();
        // bend_db = 0 drives res_offset to 4095, the table's top row; with
        // the DOUBLE_SINE clamp this must not exceed half a cycle.
        let res_offset = resonance_offset(0);
        let period = bend_period_for_res_offset(res_offset, t).min(DOUBLE_SINE_MAX_PERIOD);
        assert!(period <= DOUBLE_SINE_MAX_PERIOD);
    }

    #[test]
    fn bend_period_is_keyed_on_res_offset_not_bend_db() {
        let t = tables();
        // a wide-open bend envelope (bend_db = 0, res_offset = 4095) must
        // land in the highest row and thus yield a smaller period than a
        // closed one (bend_db = 4095, res_offset = 0).
        let open = bend_period_for_res_offset(resonance_offset(0), t);
        let closed = bend_period_for_res_offset(resonance_offset(MAX_ATTENUATION_DB), t);
        assert!(open < closed);
        assert_eq!(closed, WAVE_SIZE);
    }

    #[test]
    fn square_holds_flat_through_the_plateau() {
        assert_eq!(remap_fns::square(0, 4), 0);
        assert!(remap_fns::square(WAVE_QUARTER_SIZE, 40) == WAVE_QUARTER_SIZE);
        assert!(remap_fns::square(10, 80) < WAVE_QUARTER_SIZE);
    }

    #[test]
    fn resonance_saw_window_indexes_half_the_wave_index() {
        let t = tables();
        assert_eq!(resonance_window(Waveform::ResonanceSaw, 600, t), t.window[300]);
        assert_eq!(resonance_window(Waveform::ResonanceSaw, 0, t), t.window[0]);
    }

    #[test]
    fn resonance_triangle_window_folds_around_the_half_period() {
        let t = tables();
        assert_eq!(
            resonance_window(Waveform::ResonanceTriangle, 300, t),
            t.window[(WAVE_HALF_SIZE - 300) as usize]
        );
        assert_eq!(
            resonance_window(Waveform::ResonanceTriangle, 0, t),
            t.window[0]
        );
        assert_eq!(
            resonance_window(Waveform::ResonanceTriangle, WAVE_HALF_SIZE + 300, t),
            t.window[300]
        );
    }

    #[test]
    fn resonance_trapezoid_window_is_silent_below_half_then_reads_window() {
        let t = tables();
        assert_eq!(
            resonance_window(Waveform::ResonanceTrapezoid, 500, t),
            super::super::tables::MAX_VOLUME_DB
        );
        assert_eq!(
            resonance_window(Waveform::ResonanceTrapezoid, WAVE_HALF_SIZE + 400, t),
            t.window[400]
        );
    }
}
