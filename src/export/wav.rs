//! WAV file export functionality.
//!
//! Grounded on the teacher's `export/wav.rs`: a small `ExportConfig`
//! builder, optional normalize/fade-out post-processing, mono-to-stereo
//! duplication, then a `hound::WavWriter` pass. The teacher renders an
//! emulator's `f32` sample buffer; this crate already carries signed
//! 16-bit PCM end to end (§3.4, §6.4), so the post-processing here works
//! directly on `i16` instead of converting through `f32`.

use crate::voice::tables::SAMPLE_RATE;
use crate::Result;
use std::path::Path;

/// WAV export settings: sample rate, channel count, and optional
/// normalize/fade-out post-processing.
#[derive(Debug, Clone, Copy)]
pub struct ExportConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel count (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Whether to scale the whole buffer so its peak sample hits full
    /// scale before writing.
    pub normalize: bool,
    /// Fade-out duration in seconds, applied to the tail of the buffer.
    /// `0.0` disables it.
    pub fade_out_duration: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            sample_rate: SAMPLE_RATE,
            channels: 1,
            normalize: false,
            fade_out_duration: 0.0,
        }
    }
}

impl ExportConfig {
    /// A stereo variant of this config (duplicates the mono signal into
    /// both channels).
    pub fn stereo(mut self) -> Self {
        self.channels = 2;
        self
    }

    /// Enables or disables peak normalization.
    pub fn normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }

    /// Sets the fade-out duration, in seconds.
    pub fn fade_out(mut self, seconds: f32) -> Self {
        self.fade_out_duration = seconds;
        self
    }
}

/// Writes a mono `i16` PCM buffer to a WAV file with the default config
/// (mono, no normalize, no fade-out).
pub fn export_to_wav<P: AsRef<Path>>(samples: &[i16], output_path: P) -> Result<()> {
    export_to_wav_with_config(samples, output_path, ExportConfig::default())
}

/// Writes a mono `i16` PCM buffer to a WAV file with the given config.
pub fn export_to_wav_with_config<P: AsRef<Path>>(
    samples: &[i16],
    output_path: P,
    config: ExportConfig,
) -> Result<()> {
    let mut samples = samples.to_vec();

    if config.normalize {
        normalize_samples(&mut samples);
    }

    if config.fade_out_duration > 0.0 {
        apply_fade_out(&mut samples, config.fade_out_duration, config.sample_rate);
    }

    let final_samples = if config.channels == 2 {
        mono_to_stereo(&samples)
    } else {
        samples
    };

    write_wav_file(output_path.as_ref(), &final_samples, config.sample_rate, config.channels)
}

/// Scales every sample so the buffer's peak magnitude reaches
/// `i16::MAX`. A silent buffer is left untouched.
fn normalize_samples(samples: &mut [i16]) {
    let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
    if peak == 0 {
        return;
    }
    let scale = i16::MAX as f64 / peak as f64;
    for s in samples.iter_mut() {
        *s = (*s as f64 * scale).clamp(i16::MIN as f64, i16::MAX as f64) as i16;
    }
}

/// Linearly ramps the last `duration` seconds of the buffer down to
/// silence.
fn apply_fade_out(samples: &mut [i16], duration: f32, sample_rate: u32) {
    let fade_samples = ((duration * sample_rate as f32) as usize).min(samples.len());
    if fade_samples == 0 {
        return;
    }
    let start = samples.len() - fade_samples;
    for (i, s) in samples[start..].iter_mut().enumerate() {
        let gain = 1.0 - (i as f32 / fade_samples as f32);
        *s = (*s as f32 * gain) as i16;
    }
}

/// Duplicates each mono sample into an interleaved stereo pair.
fn mono_to_stereo(mono: &[i16]) -> Vec<i16> {
    let mut stereo = Vec::with_capacity(mono.len() * 2);
    for &sample in mono {
        stereo.push(sample);
        stereo.push(sample);
    }
    stereo
}

fn write_wav_file(path: &Path, samples: &[i16], sample_rate: u32, channels: u16) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_to_stereo_duplicates_each_sample() {
        let mono = vec![10i16, -20, 30];
        let stereo = mono_to_stereo(&mono);
        assert_eq!(stereo, vec![10, 10, -20, -20, 30, 30]);
    }

    #[test]
    fn normalize_scales_peak_to_full_scale() {
        let mut samples = vec![100i16, -200, 50];
        normalize_samples(&mut samples);
        assert_eq!(samples.iter().map(|s| s.unsigned_abs()).max().unwrap(), i16::MAX as u16);
    }

    #[test]
    fn normalize_leaves_silence_untouched() {
        let mut samples = vec![0i16; 10];
        normalize_samples(&mut samples);
        assert!(samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn fade_out_reaches_near_silence_at_the_end() {
        let mut samples = vec![i16::MAX; 100];
        apply_fade_out(&mut samples, 1.0, 100);
        assert!(samples[99].unsigned_abs() < 100);
        assert_eq!(samples[0], i16::MAX);
    }
}
