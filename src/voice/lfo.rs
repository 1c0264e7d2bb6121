//! Vibrato and tremolo LFOs.
//!
//! Both LFOs share one shape: a free-running 24-bit phase accumulator,
//! a per-note delay countdown before the LFO starts moving, a waveform
//! (triangle/square/saw-up/saw-down), and depth scaled by both the
//! patch's sensitivity parameter and the live mod-wheel position.

use crate::patch::LfoWaveform;
use super::state::Lfo;
use super::tables::{tables, PHASE_REG_MASK, PHASE_REG_SIZE};

/// Parameters describing one LFO, read from the patch once at note-on.
#[derive(Debug, Clone, Copy)]
pub struct LfoParams {
    /// Shaping waveform.
    pub waveform: LfoWaveform,
    /// Delay before the LFO starts moving, 0..100.
    pub delay: u8,
    /// Oscillation speed, 0..100.
    pub speed: u8,
    /// Depth applied even with the mod wheel at minimum, 0..100.
    pub depth: u8,
    /// Peak swing at full depth/wheel/sensitivity, 0..100.
    pub sensitivity: u8,
}

/// Resets an LFO to its starting phase and applies the patch's delay
/// parameter.
pub fn start(lfo: &mut Lfo, params: &LfoParams) {
    let t = tables();
    lfo.phase = 0;
    lfo.delay_remaining = t.lfo_delay[params.delay as usize];
    lfo.output = 0;
}

/// Blends the patch's `depth` parameter with the live mod-wheel position
/// per §4.3: `wheel·(99 − depth)/100 + 128·depth/100`, clamped to
/// `[0,127]`. At `depth == 99` the wheel contributes nothing and the LFO
/// runs at a fixed near-maximum depth; at `depth == 0` the wheel alone
/// drives it.
fn remap_pos(depth: u8, wheel_pos: i32) -> i32 {
    let depth = depth as i32;
    let wheel = wheel_pos;
    let remap = wheel * (99 - depth) / 100 + 128 * depth / 100;
    remap.clamp(0, 127)
}

/// §4.3's velocity adjustment for the amplitude path: `velocity·2·depth/100
/// − 128 + 2·128·offset/100`, clamped to `[0,127]`, scaled by 32 to land
/// in dB-domain units.
pub fn velocity_adjustment(velocity: u8, depth: u8, offset: u8) -> i32 {
    let velocity = velocity as i32;
    let depth = depth as i32;
    let offset = offset as i32;
    let remap = velocity * 2 * depth / 100 - 128 + 2 * 128 * offset / 100;
    remap.clamp(0, 127) * 32
}

fn shape_triangle(phase: u32, peak: i32) -> i32 {
    let quarter = PHASE_REG_SIZE / 4;
    let rel = phase % PHASE_REG_SIZE;
    let tri = if rel < quarter {
        rel as i64 * peak as i64 / quarter as i64
    } else if rel < 3 * quarter {
        (2 * quarter as i64 - rel as i64) * peak as i64 / quarter as i64
    } else {
        (rel as i64 - 4 * quarter as i64) * peak as i64 / quarter as i64
    };
    tri as i32
}

fn shape_square(phase: u32, peak: i32) -> i32 {
    if phase < PHASE_REG_SIZE / 2 {
        peak
    } else {
        -peak
    }
}

fn shape_saw_up(phase: u32, peak: i32) -> i32 {
    let half = (PHASE_REG_SIZE / 2) as i64;
    (phase as i64 - half) * peak as i64 / half
}

fn shape_saw_down(phase: u32, peak: i32) -> i32 {
    -shape_saw_up(phase, peak)
}

/// Advances an LFO by one sample and returns its current output, already
/// scaled by sensitivity, depth, and wheel position. Output is a signed
/// pitch-index delta for vibrato, or a signed dB delta for tremolo — the
/// caller decides which table `sensitivity` was drawn from, and whether
/// to fold the bipolar swing down to unipolar (`unipolar`, tremolo only:
/// `(level + amplitude) / 2`, since an attenuation table has no notion
/// of a negative dB value).
pub fn step(
    lfo: &mut Lfo,
    params: &LfoParams,
    wheel_pos: u8,
    sensitivity_table: &[i32],
    unipolar: bool,
) -> i32 {
    if lfo.delay_remaining > 0 {
        lfo.delay_remaining -= 1;
        lfo.output = 0;
        return 0;
    }

    let t = tables();
    lfo.phase = lfo.phase.wrapping_add(t.lfo_speed[params.speed as usize]) & PHASE_REG_MASK;

    let peak = sensitivity_table[params.sensitivity as usize];
    let scale = remap_pos(params.depth, wheel_pos as i32) as i64;
    let raw = match params.waveform {
        LfoWaveform::Triangle => shape_triangle(lfo.phase, peak),
        LfoWaveform::Square => shape_square(lfo.phase, peak),
        LfoWaveform::SawUp => shape_saw_up(lfo.phase, peak),
        LfoWaveform::SawDown => shape_saw_down(lfo.phase, peak),
    };
    let scaled = (raw as i64 * scale / 128) as i32;
    lfo.output = if unipolar { (scaled + peak) / 2 } else { scaled };
    lfo.output
}
