//! Four-stage envelope generator: Attack, Decay, Sustain, Release.
//!
//! Grounded directly on `voice.c`'s envelope block. Attack is a
//! multiplicative fall (halving the remaining attenuation by 127/128 each
//! elapsed period, an asymptotic approach to full volume); Decay, Sustain,
//! and Release are linear, adding 1 dB unit per elapsed period. "Elapsed
//! period" is counted by a 24-bit accumulator: advance it by the stage's
//! table-driven increment every sample, and apply one dB step for every
//! full wrap. A sample whose increment wraps more than once — or wraps
//! straight through a stage boundary — applies every one of those steps
//! and stage transitions in a loop, not an approximation.
//!
//! Key-scaling (time and level) is this crate's addition: the retrieved
//! source generates the keyscaling table but never reads it in the
//! update loop. We apply it as a rate multiplier/level offset scaled by
//! `env_keyscaling`, which is already expressed as a `/32` fixed-point
//! ratio.

use super::state::{Envelope, EnvelopeStage};
use super::tables::{tables, Tables, ENVELOPE_NUM_ROWS, MAX_ATTENUATION_DB, MAX_VOLUME_DB, PHASE_REG_SIZE};

/// The five patch parameters driving one envelope (amplitude or bend).
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeParams {
    /// Attack time, 0..100 (larger is faster).
    pub attack: u8,
    /// Decay time, 0..100.
    pub decay: u8,
    /// Sustain (onward decay) time, 0..100.
    pub sustain: u8,
    /// Release time, 0..100.
    pub release: u8,
    /// Hold level — the attenuation Decay moves toward, 0..100 (larger
    /// is louder).
    pub hold_level: u8,
    /// Time key-scaling depth, 0..100.
    pub time_keyscaling: u8,
    /// Level key-scaling depth, 0..100.
    pub level_keyscaling: u8,
}

/// Internal note number used as the key-scaling breakpoint for stage
/// timing (C0).
pub const TIME_KS_BREAKPOINT: i32 = super::tables::notes::MIDDLE_C - 4 * 12;
/// Internal note number used as the key-scaling breakpoint for the hold
/// level (A2).
pub const LEVEL_KS_BREAKPOINT: i32 = super::tables::notes::MIDDLE_C - 2 * 12 + 9;

fn row_shifted(table: &[u32], index: u32) -> u32 {
    let row = (index / 1024).min(ENVELOPE_NUM_ROWS - 1);
    let step = (index % 1024) as usize;
    if row < ENVELOPE_NUM_ROWS - 1 {
        table[step] >> (ENVELOPE_NUM_ROWS - 1 - row)
    } else {
        table[step]
    }
}

/// Scales a base per-sample increment by this envelope's time
/// key-scaling, given the note the voice is playing.
fn time_scaled_increment(base: u32, note: i32, ks_param: u8, t: &Tables) -> u32 {
    let semis_above = (note - TIME_KS_BREAKPOINT).max(0) as u64;
    let ratio = t.env_keyscaling[ks_param as usize] as u64; // /32 fixed point
    let scale = 32 + (semis_above * (ratio.saturating_sub(32))) / 12;
    ((base as u64 * scale) / 32) as u32
}

fn keyscaled_hold_level(base_db: i32, note: i32, ks_param: u8, t: &Tables) -> i32 {
    let semis_above = (note - LEVEL_KS_BREAKPOINT).max(0) as i64;
    let ratio = t.env_keyscaling[ks_param as usize] as i64; // /32 fixed point
    let reduction = (semis_above * (ratio - 32)) / 32 / 4;
    (base_db as i64 - reduction).clamp(MAX_VOLUME_DB as i64, MAX_ATTENUATION_DB as i64) as i32
}

fn stage_increment(stage: EnvelopeStage, params: &EnvelopeParams, note: i32, t: &Tables) -> u32 {
    let base = match stage {
        EnvelopeStage::Attack => t.env_time[params.attack as usize],
        EnvelopeStage::Decay => t.env_time[params.decay as usize],
        EnvelopeStage::Sustain => t.env_time[params.sustain as usize],
        EnvelopeStage::Release => t.env_time[params.release as usize],
    };
    let increment_table = match stage {
        EnvelopeStage::Attack => &t.env_attack_increment,
        _ => &t.env_decay_increment,
    };
    let raw = row_shifted(increment_table, base);
    time_scaled_increment(raw, note, params.time_keyscaling, t)
}

/// Starts (or restarts) an envelope into Attack, from wherever its
/// attenuation currently sits.
pub fn start(env: &mut Envelope) {
    env.stage = EnvelopeStage::Attack;
    env.phase = 0;
}

/// Moves an envelope into Release, from whatever stage it was in.
/// Mirrors `voice_note_off`: idempotent if already releasing.
pub fn release(env: &mut Envelope) {
    env.stage = EnvelopeStage::Release;
    env.phase = 0;
}

/// Advances the envelope by one sample, returning the current
/// attenuation (dB-domain, `0` = full volume).
pub fn step(env: &mut Envelope, params: &EnvelopeParams, note: i32) -> i32 {
    let t = tables();
    let increment = stage_increment(env.stage, params, note, t);

    env.phase = env.phase.wrapping_add(increment);
    let mut periods = if env.phase >= PHASE_REG_SIZE {
        let periods = env.phase >> 24;
        env.phase &= PHASE_REG_SIZE - 1;
        periods
    } else {
        0
    };

    let hold_level = keyscaled_hold_level(
        t.env_level[params.hold_level as usize],
        note,
        params.level_keyscaling,
        t,
    );

    while periods > 0 {
        periods -= 1;

        if env.stage == EnvelopeStage::Attack {
            env.attenuation = (127 * env.attenuation) / 128;
        } else {
            env.attenuation += 1;
        }
        env.attenuation = env.attenuation.clamp(MAX_VOLUME_DB, MAX_ATTENUATION_DB);

        if env.stage == EnvelopeStage::Attack && env.attenuation == MAX_VOLUME_DB {
            env.stage = EnvelopeStage::Decay;
            env.phase = 0;
        } else if env.stage == EnvelopeStage::Decay && env.attenuation >= hold_level {
            env.stage = EnvelopeStage::Sustain;
            env.phase = 0;
        }
    }

    env.attenuation.clamp(MAX_VOLUME_DB, MAX_ATTENUATION_DB)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params() -> EnvelopeParams {
        EnvelopeParams {
            attack: 99,
            decay: 99,
            sustain: 99,
            release: 99,
            hold_level: 50,
            time_keyscaling: 0,
            level_keyscaling: 0,
        }
    }

    #[test]
    fn attack_reaches_full_volume_eventually() {
        let mut env = Envelope::default();
        let params = fast_params();
        start(&mut env);
        let mut reached = false;
        for _ in 0..20_000 {
            step(&mut env, &params, 60);
            if env.stage != EnvelopeStage::Attack {
                reached = true;
                break;
            }
        }
        assert!(reached);
        assert_eq!(env.attenuation, MAX_VOLUME_DB);
    }

    #[test]
    fn decay_stops_rising_past_hold_level_into_sustain() {
        let mut env = Envelope::default();
        let params = fast_params();
        start(&mut env);
        for _ in 0..5_000 {
            step(&mut env, &params, 60);
        }
        assert_eq!(env.stage, EnvelopeStage::Sustain);
        let t = tables();
        let hold_level = t.env_level[params.hold_level as usize];
        assert!(env.attenuation >= hold_level);
    }

    #[test]
    fn release_drives_level_to_silence() {
        let mut env = Envelope::default();
        let params = fast_params();
        start(&mut env);
        for _ in 0..5_000 {
            step(&mut env, &params, 60);
        }
        release(&mut env);
        for _ in 0..5_000 {
            step(&mut env, &params, 60);
        }
        assert_eq!(env.stage, EnvelopeStage::Release);
        assert_eq!(env.attenuation, MAX_ATTENUATION_DB);
    }

    #[test]
    fn release_from_attack_does_not_panic_or_stall() {
        let mut env = Envelope::default();
        let params = fast_params();
        start(&mut env);
        step(&mut env, &params, 60);
        release(&mut env);
        for _ in 0..5_000 {
            step(&mut env, &params, 60);
        }
        assert_eq!(env.stage, EnvelopeStage::Release);
        assert_eq!(env.attenuation, MAX_ATTENUATION_DB);
    }

    #[test]
    fn time_keyscaling_speeds_up_high_notes() {
        let t = tables();
        let base = row_shifted(&t.env_decay_increment, t.env_time[50]);
        let low = time_scaled_increment(base, 0, 80, t);
        let high = time_scaled_increment(base, 96, 80, t);
        assert!(high >= low);
    }
}
