//! Lookup tables for the voice engine
//!
//! Every table here is built once, from floating point, rounded to the
//! nearest integer, and never mutated again. Nothing in the hot path
//! (`super::engine::VoiceEngine::update_all`) touches a float.

use std::sync::OnceLock;

/// Sample rate the tables and the whole engine are generated for.
///
/// Chosen so B9 (tuned to A=444) stays under Nyquist and so 1ms is an
/// integer number of samples.
pub const SAMPLE_RATE: u32 = 32_000;

/// Width of a phase register, in bits.
pub const PHASE_REG_BITS: u32 = 24;
/// Size of a phase register's range (2^24).
pub const PHASE_REG_SIZE: u32 = 1 << PHASE_REG_BITS;
/// Mask for wrapping a phase register modulo [`PHASE_REG_SIZE`].
pub const PHASE_REG_MASK: u32 = PHASE_REG_SIZE - 1;

/// Width of the wave-position index carried in the top bits of a phase register.
pub const WAVE_BITS: u32 = 11;
/// Number of wave-position entries per full cycle (one wavetable period).
pub const WAVE_SIZE: u32 = 1 << WAVE_BITS;
/// Mask for a wave-position index.
pub const WAVE_MASK: u32 = WAVE_SIZE - 1;
/// Number of bits left over for the phase mantissa.
pub const MANTISSA_BITS: u32 = PHASE_REG_BITS - WAVE_BITS;

/// Half a wavetable period; the sine/window tables store only this many
/// entries and are mirrored/extended in software.
pub const WAVE_HALF_SIZE: u32 = WAVE_SIZE / 2;

/// Width of the dB-domain attenuation value.
pub const DB_BITS: u32 = 12;
/// Number of distinct dB-domain attenuation levels.
pub const DB_SIZE: usize = 1 << DB_BITS;
/// 0 dB — full scale.
pub const MAX_VOLUME_DB: i32 = 0;
/// Maximum representable attenuation — silence.
pub const MAX_ATTENUATION_DB: i32 = (DB_SIZE - 1) as i32;
/// One dB-domain step, in actual decibels (3/256 dB).
pub const DB_STEP: f64 = 3.0 / 256.0;

/// Full-scale linear sample value.
pub const MAX_VOLUME_LINEAR: i32 = 32767;
/// Silent linear sample value.
pub const MAX_ATTENUATION_LINEAR: i32 = 0;

/// Steps per octave in the pitch-index grid.
pub const TUNING_STEPS_PER_OCTAVE: u32 = 1024;
/// Octaves spanned by the pitch-index grid (-3 to 9).
pub const TUNING_NUM_OCTAVES: u32 = 13;

/// One past the highest valid pitch index.
pub const MAX_PITCH_INDEX: u32 = (TUNING_NUM_OCTAVES - 1) * TUNING_STEPS_PER_OCTAVE
    + (11 * TUNING_STEPS_PER_OCTAVE) / 12;

/// Steps per row in the envelope time-index grid.
pub const ENVELOPE_STEPS_PER_ROW: u32 = 1024;
/// Rows in the envelope time-index grid.
pub const ENVELOPE_NUM_ROWS: u32 = 13;

/// Number of distinct values a 100-valued patch parameter can take.
pub const PARAM_100_SIZE: usize = 100;

/// Internal note numbers (§6.3, §4.2 of the spec).
pub mod notes {
    /// A-3, the lowest representable note (not necessarily playable).
    pub const LOWEST_AVAILABLE: i32 = 0 * 12 + 9;
    /// A0, the lowest note that can actually sound.
    pub const LOWEST_PLAYABLE: i32 = 3 * 12 + 9;
    /// C8, the highest note that can actually sound.
    pub const HIGHEST_PLAYABLE: i32 = 11 * 12 + 0;
    /// B9, the highest representable note.
    pub const HIGHEST_AVAILABLE: i32 = 12 * 12 + 11;
    /// C4, used to convert MIDI note numbers to internal note numbers.
    pub const MIDDLE_C: i32 = 7 * 12 + 0;
}

fn round_to_i64(val: f64) -> i64 {
    (val + 0.5).floor() as i64
}

/// All precomputed tables the voice engine reads from.
///
/// Built once via [`tables`] and shared (read-only) by every voice.
#[derive(Debug)]
pub struct Tables {
    /// `sine_half[m]` for `m` in `0..WAVE_HALF_SIZE`: dB attenuation of a
    /// quarter-period sine, mirrored to cover a half period.
    pub sine_half: Vec<i32>,
    /// `window[m]` for `m` in `0..WAVE_HALF_SIZE`: the resonance window
    /// envelope, in dB attenuation.
    pub window: Vec<i32>,
    /// `db_to_linear[db]`: signed linear sample magnitude for a dB-domain
    /// attenuation value in `0..DB_SIZE`.
    pub db_to_linear: Vec<i32>,
    /// `phase_increment[step]` for the top octave (C9..B9); lower octaves
    /// right-shift this value.
    pub phase_increment: Vec<u32>,
    /// `bend_period[step]` for one octave; larger offsets right-shift it.
    pub bend_period: Vec<u32>,
    /// `env_time[param]`: time-index for a 100-valued envelope time
    /// parameter (attack/decay/release/sustain).
    pub env_time: Vec<u32>,
    /// `env_level[param]`: dB hold/keyscaling-offset level for a
    /// 100-valued envelope level parameter.
    pub env_level: Vec<i32>,
    /// `env_keyscaling[param]`: keyscaling ratio, scaled by 32 (i.e. a
    /// fixed-point multiplier with an implied `/32` denominator).
    pub env_keyscaling: Vec<u32>,
    /// `env_attack_increment[step]`: phase increment for the fastest
    /// attack row (row == `ENVELOPE_NUM_ROWS - 1`); other rows shift it.
    pub env_attack_increment: Vec<u32>,
    /// `env_decay_increment[step]`: phase increment for the fastest
    /// decay/sustain/release row; other rows shift it.
    pub env_decay_increment: Vec<u32>,
    /// `lfo_speed[param]`: phase increment for a 100-valued LFO speed
    /// parameter.
    pub lfo_speed: Vec<u32>,
    /// `lfo_delay[param]`: delay, in samples, for a 100-valued LFO delay
    /// parameter.
    pub lfo_delay: Vec<u32>,
    /// `vibrato_sensitivity[param]`: peak pitch-index swing for a
    /// 100-valued vibrato sensitivity parameter.
    pub vibrato_sensitivity: Vec<i32>,
    /// `tremolo_sensitivity[param]`: peak dB swing for a 100-valued
    /// tremolo sensitivity parameter.
    pub tremolo_sensitivity: Vec<i32>,
    /// `output_mix[param]`: dB attenuation applied to a line by the
    /// 100-valued output-mix parameter (§4.6). Scaled on the same
    /// 1024-steps-per-octave convention as the tuning tables, so that
    /// `output_mix[50] == 512` — exactly 6dB (512 * 3/256) of
    /// attenuation, matching the spec's "-6dB equivalent" unison term.
    pub output_mix: Vec<i32>,
}

impl Tables {
    fn generate(sample_rate: u32) -> Self {
        let one_hz_increment = PHASE_REG_SIZE as f64 / sample_rate as f64;

        // Sine quarter table, mirrored to a half period.
        let mut sine_half = vec![0i32; WAVE_HALF_SIZE as usize];
        sine_half[0] = MAX_ATTENUATION_DB;
        sine_half[(WAVE_SIZE / 4) as usize] = MAX_VOLUME_DB;
        for m in 1..(WAVE_SIZE / 4) as usize {
            let val = (2.0 * std::f64::consts::PI * m as f64 / WAVE_SIZE as f64).sin();
            let db = round_to_i64(10.0 * (-val.log10()) / DB_STEP) as i32;
            sine_half[m] = db;
            sine_half[(WAVE_HALF_SIZE as usize) - m] = db;
        }

        // Resonance window table.
        let mut window = vec![0i32; WAVE_HALF_SIZE as usize];
        window[0] = MAX_VOLUME_DB;
        for m in 1..WAVE_HALF_SIZE as usize {
            let val = (WAVE_SIZE as f64 - 2.0 * m as f64) / WAVE_SIZE as f64;
            window[m] = round_to_i64(10.0 * (-val.log10()) / DB_STEP) as i32;
        }

        // dB -> linear table.
        let mut db_to_linear = vec![0i32; DB_SIZE];
        db_to_linear[0] = MAX_VOLUME_LINEAR;
        db_to_linear[DB_SIZE - 1] = MAX_ATTENUATION_LINEAR;
        for m in 1..DB_SIZE - 1 {
            let val = MAX_VOLUME_LINEAR as f64 * (-std::f64::consts::LN_10 * (DB_STEP / 10.0) * m as f64).exp();
            db_to_linear[m] = round_to_i64(val) as i32;
        }

        // Phase increment per cent, highest octave (C9..B9).
        let base_freq = 440.0 * 2f64.powf(-9.0 / 12.0) * 32.0;
        let mut phase_increment = vec![0u32; TUNING_STEPS_PER_OCTAVE as usize];
        for m in 0..TUNING_STEPS_PER_OCTAVE as usize {
            let freq = base_freq * 2f64.powf(m as f64 / TUNING_STEPS_PER_OCTAVE as f64);
            phase_increment[m] = round_to_i64(freq * one_hz_increment) as u32;
        }

        // Bend period table.
        let mut bend_period = vec![0u32; TUNING_STEPS_PER_OCTAVE as usize];
        for m in 0..TUNING_STEPS_PER_OCTAVE as usize {
            let val = WAVE_SIZE as f64 * 2f64.powf(-(m as f64) / TUNING_STEPS_PER_OCTAVE as f64);
            bend_period[m] = round_to_i64(val) as u32;
        }

        // Envelope time table (larger parameter = faster, hence decreasing).
        let mut env_time = vec![0u32; PARAM_100_SIZE];
        for m in 0..PARAM_100_SIZE {
            let numerator = ENVELOPE_STEPS_PER_ROW as i64 * (PARAM_100_SIZE as i64 - 1 - m as i64 + 4);
            env_time[m] = (numerator / 8) as u32;
        }

        // Envelope level table.
        let mut env_level = vec![0i32; PARAM_100_SIZE];
        env_level[0] = MAX_ATTENUATION_DB;
        for m in 1..PARAM_100_SIZE {
            env_level[m] = (PARAM_100_SIZE as i32 - 1 - m as i32) * 16;
        }

        // Envelope keyscaling table.
        let mut env_keyscaling = vec![0u32; PARAM_100_SIZE];
        for m in 0..PARAM_100_SIZE {
            let val = 2f64.powf(3.0 * m as f64 / PARAM_100_SIZE as f64) * (256.0 / 8.0);
            env_keyscaling[m] = round_to_i64(val) as u32;
        }

        // Envelope decay increment table (fastest decay: 16ms fall time).
        let mut env_decay_increment = vec![0u32; ENVELOPE_STEPS_PER_ROW as usize];
        for m in 0..ENVELOPE_STEPS_PER_ROW as usize {
            let val = (MAX_ATTENUATION_DB as f64 / 0.016)
                * 2f64.powf(m as f64 / ENVELOPE_STEPS_PER_ROW as f64);
            env_decay_increment[m] = round_to_i64(val * one_hz_increment) as u32;
        }

        // Envelope attack increment table (fastest attack: 8ms rise time).
        let mut env_attack_increment = vec![0u32; ENVELOPE_STEPS_PER_ROW as usize];
        for m in 0..ENVELOPE_STEPS_PER_ROW as usize {
            let val = (518.0 / 0.008) * 2f64.powf(m as f64 / ENVELOPE_STEPS_PER_ROW as f64);
            env_attack_increment[m] = round_to_i64(val * one_hz_increment) as u32;
        }

        // LFO speed table (0.5Hz..8.5Hz).
        let mut lfo_speed = vec![0u32; PARAM_100_SIZE];
        for m in 0..PARAM_100_SIZE {
            let hz = 0.5 + (8.0 * m as f64) / PARAM_100_SIZE as f64;
            lfo_speed[m] = round_to_i64(hz * one_hz_increment) as u32;
        }

        // LFO delay table, in samples.
        let mut lfo_delay = vec![0u32; PARAM_100_SIZE];
        for m in 0..PARAM_100_SIZE {
            let val = (m as f64 / PARAM_100_SIZE as f64) * sample_rate as f64;
            lfo_delay[m] = round_to_i64(val) as u32;
        }

        // Vibrato sensitivity table, cents -> pitch-index units.
        let mut vibrato_sensitivity = vec![0i32; PARAM_100_SIZE];
        for m in 0..PARAM_100_SIZE {
            let val = 2.0 * (m as f64 + 1.0) * 1024.0 / 1200.0;
            vibrato_sensitivity[m] = round_to_i64(val) as i32;
        }

        // Tremolo sensitivity table, dB attenuation units.
        let mut tremolo_sensitivity = vec![0i32; PARAM_100_SIZE];
        for m in 0..PARAM_100_SIZE {
            let val = m as f64 * (3.0 * MAX_ATTENUATION_DB as f64 / 4.0) / PARAM_100_SIZE as f64;
            tremolo_sensitivity[m] = round_to_i64(val) as i32;
        }

        // Output mix table: a line's dB attenuation under the output-mix
        // pan control, growing with the parameter on the same 1024/100
        // scale the tuning tables use.
        let mut output_mix = vec![0i32; PARAM_100_SIZE];
        for m in 0..PARAM_100_SIZE {
            let val = m as f64 * TUNING_STEPS_PER_OCTAVE as f64 / PARAM_100_SIZE as f64;
            output_mix[m] = round_to_i64(val) as i32;
        }

        Tables {
            sine_half,
            window,
            db_to_linear,
            phase_increment,
            bend_period,
            env_time,
            env_level,
            env_keyscaling,
            env_attack_increment,
            env_decay_increment,
            lfo_speed,
            lfo_delay,
            vibrato_sensitivity,
            tremolo_sensitivity,
            output_mix,
        }
    }
}

static TABLES: OnceLock<Tables> = OnceLock::new();

/// Returns the process-wide table set, generating it on first use.
///
/// Tables are generated for [`SAMPLE_RATE`] and are immutable afterward;
/// every voice in every [`super::engine::VoiceEngine`] shares this one
/// instance.
pub fn tables() -> &'static Tables {
    TABLES.get_or_init(|| Tables::generate(SAMPLE_RATE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sine_half_symmetric_and_endpoints() {
        let t = tables();
        assert_eq!(t.sine_half[0], MAX_ATTENUATION_DB);
        assert_eq!(t.sine_half[(WAVE_SIZE / 4) as usize], MAX_VOLUME_DB);
        // sine[512 - k] == sine[512 + k] for k in [0, 512)
        for k in 0..512usize {
            let lo = 512 - k;
            let hi = 512 + k;
            assert_eq!(t.sine_half[lo], t.sine_half[hi]);
        }
    }

    #[test]
    fn db_to_linear_monotone_and_endpoints() {
        let t = tables();
        assert_eq!(t.db_to_linear[0], MAX_VOLUME_LINEAR);
        assert_eq!(t.db_to_linear[DB_SIZE - 1], MAX_ATTENUATION_LINEAR);
        for i in 0..DB_SIZE - 1 {
            assert!(t.db_to_linear[i] >= t.db_to_linear[i + 1]);
        }
    }

    #[test]
    fn phase_increment_monotone_increasing() {
        let t = tables();
        for i in 0..t.phase_increment.len() - 1 {
            assert!(t.phase_increment[i] < t.phase_increment[i + 1]);
        }
    }

    #[test]
    fn bend_period_monotone_decreasing() {
        let t = tables();
        for i in 0..t.bend_period.len() - 1 {
            assert!(t.bend_period[i] >= t.bend_period[i + 1]);
        }
        assert_eq!(t.bend_period[0], WAVE_SIZE);
    }

    #[test]
    fn env_time_monotone_decreasing() {
        let t = tables();
        for i in 0..t.env_time.len() - 1 {
            assert!(t.env_time[i] >= t.env_time[i + 1]);
        }
    }

    #[test]
    fn env_level_endpoints() {
        let t = tables();
        assert_eq!(t.env_level[0], MAX_ATTENUATION_DB);
        assert_eq!(t.env_level[99], 0);
    }

    #[test]
    fn output_mix_table_unison_term_is_six_db() {
        let t = tables();
        assert_eq!(t.output_mix[50], 512);
        assert_relative_eq!(512.0 * DB_STEP, 6.0, epsilon = 1e-9);
        assert_eq!(t.output_mix[0], 0);
    }

    #[test]
    fn max_pitch_index_value() {
        assert_eq!(MAX_PITCH_INDEX, 13226);
    }

    #[test]
    fn one_hz_increment_sane() {
        // a 1Hz phase increment should wrap the 24-bit register in 1 second
        let one_hz = PHASE_REG_SIZE as f64 / SAMPLE_RATE as f64;
        assert_relative_eq!(one_hz * SAMPLE_RATE as f64, PHASE_REG_SIZE as f64, epsilon = 1e-6);
    }
}
