//! End-to-end rendering scenarios mirroring the spec's own worked
//! examples (§8.3): render a few seconds of one voice through the
//! public API and check the resulting waveform's gross shape, not
//! exact sample values.

use czsynth::patch::{Patch, PatchParam, Waveform};
use czsynth::voice::tables::SAMPLE_RATE;
use czsynth::VoiceEngine;

fn base_patch() -> Patch {
    let mut p = Patch::reset();
    p.values[PatchParam::AmpEnvAttack as usize] = 0;
    p.values[PatchParam::AmpEnvDecay as usize] = 70;
    p.values[PatchParam::AmpEnvRelease as usize] = 50;
    p.values[PatchParam::AmpEnvHold as usize] = 75;
    p.values[PatchParam::AmpEnvSustain as usize] = 90;
    p.values[PatchParam::BendEnvAttack as usize] = 0;
    p.values[PatchParam::BendEnvDecay as usize] = 30;
    p.values[PatchParam::BendEnvRelease as usize] = 50;
    p.values[PatchParam::BendEnvHold as usize] = 50;
    p.values[PatchParam::BendEnvSustain as usize] = 70;
    p.values[PatchParam::Line1BendMax as usize] = 99;
    p
}

fn render(patch: Patch, midi_note: u8, seconds: f32) -> Vec<i16> {
    let mut engine = VoiceEngine::new();
    *engine.patches_mut().get_mut(0, 0).unwrap() = patch;
    engine.load_patch(0, 0, 0).unwrap();
    engine.note_on(0, midi_note, 100).unwrap();

    let total = (seconds * SAMPLE_RATE as f32) as usize;
    let mut out = Vec::with_capacity(total);
    for _ in 0..total {
        engine.update_all();
        out.push(engine.voice(0).unwrap().level);
    }
    out
}

fn zero_crossings(samples: &[i16]) -> usize {
    samples
        .windows(2)
        .filter(|w| (w[0] >= 0) != (w[1] >= 0))
        .count()
}

fn abs_mean(samples: &[i16]) -> f64 {
    samples.iter().map(|&s| s.unsigned_abs() as f64).sum::<f64>() / samples.len() as f64
}

fn single_line_wave_patch(wave: Waveform) -> Patch {
    let mut p = base_patch();
    p.values[PatchParam::Line1Wave1 as usize] = wave as u8;
    p.values[PatchParam::Line1Wave2 as usize] = wave as u8;
    p
}

#[test]
fn e1_saw_sweep_sounds_within_a_millisecond_and_settles_near_sustain() {
    let patch = single_line_wave_patch(Waveform::Saw);
    let samples = render(patch, 60, 2.0);

    let first_ms = &samples[0..(SAMPLE_RATE as usize / 1000)];
    assert!(first_ms.iter().any(|&s| s != 0), "expected audible output within the first millisecond");

    let tail = &samples[samples.len() - (SAMPLE_RATE as usize / 10)..];
    let settled = abs_mean(tail);
    assert!(settled > 0.0, "sustain-hold tail should not be silent");
    assert!(settled < i16::MAX as f64, "sustain-hold tail should not be clipping flat-out");
}

#[test]
fn e2_square_sweep_flips_sign_at_least_120_times_a_second() {
    let patch = single_line_wave_patch(Waveform::Square);
    let samples = render(patch, 60, 1.0);
    let crossings = zero_crossings(&samples);
    assert!(crossings >= 120, "expected >=120 sign flips per second at midi 60, got {crossings}");
}

#[test]
fn e2_square_onset_is_at_least_as_loud_as_saw_onset() {
    let saw = render(single_line_wave_patch(Waveform::Saw), 60, 0.05);
    let square = render(single_line_wave_patch(Waveform::Square), 60, 0.05);
    assert!(abs_mean(&square) >= abs_mean(&saw) * 0.9);
}

#[test]
fn e3_pulse_sweep_starts_near_full_duty_and_widens() {
    let patch = single_line_wave_patch(Waveform::Pulse);
    let samples = render(patch, 60, 2.0);

    let early = &samples[(SAMPLE_RATE as usize / 100)..(SAMPLE_RATE as usize / 10)];
    let late = &samples[samples.len() - (SAMPLE_RATE as usize / 10)..];

    let positive_fraction = |s: &[i16]| s.iter().filter(|&&v| v > 0).count() as f64 / s.len() as f64;
    let early_duty = positive_fraction(early);
    let late_duty = positive_fraction(late);

    assert!(early_duty <= 0.35, "pulse should start near a narrow duty cycle, got {early_duty}");
    assert!(late_duty >= early_duty, "pulse duty should widen as the bend envelope closes");
}

#[test]
fn e4_double_sine_has_two_negative_lobes_per_cycle() {
    let patch = single_line_wave_patch(Waveform::DoubleSine);
    let samples = render(patch, 48, 0.5);

    let mut negative_runs = 0usize;
    let mut in_negative_run = false;
    for &s in &samples {
        if s < 0 && !in_negative_run {
            negative_runs += 1;
            in_negative_run = true;
        } else if s >= 0 {
            in_negative_run = false;
        }
    }
    // midi 48 (C3) at 32kHz completes roughly 65 cycles in half a second;
    // two negative lobes per cycle means well over 65 negative runs total.
    assert!(negative_runs > 65, "expected multiple negative lobes per cycle, got {negative_runs} runs");
}

#[test]
fn e5_resonance_saw_zero_crosses_more_often_than_plain_saw() {
    let plain = render(single_line_wave_patch(Waveform::Saw), 60, 1.0);

    let mut patch = base_patch();
    patch.values[PatchParam::Line1Wave1 as usize] = Waveform::Saw as u8;
    patch.values[PatchParam::Line1Wave2 as usize] = Waveform::ResonanceSaw as u8;
    let resonance = render(patch, 60, 1.0);

    assert!(
        zero_crossings(&resonance) > zero_crossings(&plain),
        "resonance partial should add high-frequency content above the fundamental"
    );
}

#[test]
fn e6_ring_mod_changes_the_output_versus_ring_mod_off() {
    let mut with_ring_mod = base_patch();
    with_ring_mod.values[PatchParam::Line1Wave1 as usize] = Waveform::Saw as u8;
    with_ring_mod.values[PatchParam::Line1Wave2 as usize] = Waveform::Saw as u8;
    with_ring_mod.values[PatchParam::Line2Wave1 as usize] = Waveform::Saw as u8;
    with_ring_mod.values[PatchParam::Line2Wave2 as usize] = Waveform::Saw as u8;
    with_ring_mod.values[PatchParam::Line2Octave as usize] = 4;
    with_ring_mod.values[PatchParam::OutputRingMod as usize] = 1;

    let mut without_ring_mod = with_ring_mod.clone();
    without_ring_mod.values[PatchParam::OutputRingMod as usize] = 0;

    let on = render(with_ring_mod, 60, 0.5);
    let off = render(without_ring_mod, 60, 0.5);

    let differing = on.iter().zip(off.iter()).filter(|(a, b)| a != b).count();
    assert!(differing > on.len() / 4, "ring mod should measurably change most of the waveform");
}

#[test]
fn note_off_eventually_releases_to_near_silence() {
    let patch = single_line_wave_patch(Waveform::Saw);
    let mut engine = VoiceEngine::new();
    *engine.patches_mut().get_mut(0, 0).unwrap() = patch;
    engine.load_patch(0, 0, 0).unwrap();
    engine.note_on(0, 60, 100).unwrap();

    for _ in 0..(SAMPLE_RATE as usize / 2) {
        engine.update_all();
    }
    engine.note_off(0).unwrap();
    for _ in 0..(SAMPLE_RATE as usize * 3) {
        engine.update_all();
    }

    let level = engine.voice(0).unwrap().level;
    assert!(level.unsigned_abs() < 2000, "expected near silence after release, got {level}");
}

#[test]
fn load_patch_rejects_out_of_range_indices() {
    let mut engine = VoiceEngine::new();
    assert!(engine.load_patch(0, 99, 0).is_err());
    assert!(engine.load_patch(99, 0, 0).is_err());
}
