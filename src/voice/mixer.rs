//! dB-domain mixing (§4.6): ring-mod sign XOR, amplitude-envelope and
//! output-mix/unison attenuation additions, a single clamp, then one
//! `db_to_linear` lookup per pair before summing to a 16-bit sample.
//!
//! Grounded on `ym2149/mixer.rs`'s combine step: one function that
//! combines pre-computed per-channel samples in a single pass and
//! returns the final output, with no internal filtering state (CZ
//! mixing is a stateless dB-domain sum, unlike the PSG's DC-removal
//! filter, so the struct/`OUTPUT_GAIN`/DC-buffer machinery there has no
//! counterpart here).

use super::oscillator::OscSample;
use super::tables::{tables, MAX_ATTENUATION_DB, MAX_VOLUME_DB};

/// One line's two unison-pair raw oscillator samples, plus its
/// (already tremolo-adjusted) amplitude-envelope dB level.
#[derive(Debug, Clone, Copy)]
pub struct LineOutputs {
    /// The line's two unison oscillator pairs' raw samples.
    pub pairs: [OscSample; 2],
    /// This line's amplitude envelope, in dB-domain attenuation,
    /// already including any tremolo adjustment.
    pub amplitude_env_db: i32,
}

fn ring_mod_combine(line2: OscSample, line1: OscSample) -> OscSample {
    let sign1 = !line1.positive;
    let sign2 = !line2.positive;
    OscSample {
        db: line2.db + line1.db,
        positive: !(sign1 ^ sign2),
    }
}

fn add_and_linearize(mut db: i32, line_mix_db: i32, unison_db: i32) -> (i32, i32) {
    let t = tables();
    db += line_mix_db + unison_db;
    db = db.clamp(MAX_VOLUME_DB, MAX_ATTENUATION_DB);
    (db, t.db_to_linear[db as usize])
}

/// Combines both lines' four oscillator-pair outputs into one signed
/// 16-bit PCM sample (§4.6).
///
/// `output_mix` and `output_ring_mod` are read straight from the patch;
/// `output_mix` is clamped defensively to `0..=99` (the hot path trusts
/// already-validated patches, but never indexes past table bounds even
/// if it's handed one that isn't).
pub fn mix(line1: LineOutputs, line2: LineOutputs, output_ring_mod: bool, output_mix: u8) -> i16 {
    let t = tables();
    let output_mix = (output_mix as usize).min(t.output_mix.len() - 1);
    let line1_mix_db = t.output_mix[t.output_mix.len() - 1 - output_mix];
    let line2_mix_db = t.output_mix[output_mix];
    let unison_db = t.output_mix[50];

    let mut total: i32 = 0;

    for pair in line1.pairs {
        let (_, linear) =
            add_and_linearize(pair.db + line1.amplitude_env_db, line1_mix_db, unison_db);
        total += if pair.positive { linear } else { -linear };
    }

    for (i, pair) in line2.pairs.into_iter().enumerate() {
        let combined = if output_ring_mod {
            ring_mod_combine(pair, line1.pairs[i])
        } else {
            pair
        };
        let (_, linear) = add_and_linearize(
            combined.db + line2.amplitude_env_db,
            line2_mix_db,
            unison_db,
        );
        total += if combined.positive { linear } else { -linear };
    }

    total.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent() -> OscSample {
        OscSample { db: MAX_ATTENUATION_DB, positive: true }
    }

    fn full_positive() -> OscSample {
        OscSample { db: MAX_VOLUME_DB, positive: true }
    }

    #[test]
    fn all_silent_pairs_mix_to_zero() {
        let line = LineOutputs { pairs: [silent(), silent()], amplitude_env_db: MAX_ATTENUATION_DB };
        let out = mix(line, line, false, 50);
        assert_eq!(out, 0);
    }

    #[test]
    fn ring_mod_flips_sign_on_negative_counterpart() {
        let pos = full_positive();
        let mut neg = full_positive();
        neg.positive = false;
        let combined = ring_mod_combine(pos, neg);
        assert!(!combined.positive);
        let combined2 = ring_mod_combine(pos, pos);
        assert!(combined2.positive);
    }

    #[test]
    fn unison_term_attenuates_a_single_full_volume_pair() {
        let t = tables();
        let line_silent = LineOutputs {
            pairs: [silent(), silent()],
            amplitude_env_db: MAX_ATTENUATION_DB,
        };
        let line_loud = LineOutputs {
            pairs: [full_positive(), silent()],
            amplitude_env_db: MAX_VOLUME_DB,
        };
        let out = mix(line_loud, line_silent, false, 99);
        let expected_db = (MAX_VOLUME_DB + t.output_mix[0] + t.output_mix[50]).clamp(0, 4095);
        let expected = t.db_to_linear[expected_db as usize] as i16;
        assert_eq!(out, expected);
    }
}
