//! Casio CZ-style phase-distortion voice engine
//!
//! A per-sample emulation of the CZ series' core voice architecture: two
//! phase-distortion oscillator lines, each with two unison oscillators,
//! four envelope generators (amplitude + bend, per line), two shared
//! LFOs (vibrato, tremolo), and a dB-domain mixer — driven through a
//! fixed 16-voice bank with no heap activity past construction.
//!
//! # Crate feature flags
//! - `engine` (default): the core voice engine (`voice`, `patch`)
//! - `export` (default): WAV file export via `hound` (`export`)
//!
//! # Quick start
//! ```no_run
//! # #[cfg(feature = "engine")]
//! # {
//! use czsynth::voice::VoiceEngine;
//!
//! let mut engine = VoiceEngine::new();
//! engine.load_patch(0, 0, 0).unwrap();
//! engine.note_on(0, 60, 100).unwrap();
//! for _ in 0..32_000 {
//!     engine.update_all();
//! }
//! let sample = engine.voice(0).unwrap().level;
//! # let _ = sample;
//! # }
//! ```

#![warn(missing_docs)]

#[cfg(feature = "engine")]
pub mod patch;
#[cfg(feature = "engine")]
pub mod voice;

#[cfg(feature = "export")]
pub mod export;

/// Error conditions the voice engine and patch store can report.
///
/// The per-sample hot path (`VoiceEngine::update_all`) cannot fail —
/// every value flowing through it is already clamped by construction —
/// so only the lifecycle/edit boundary (`load_patch`, `note_on`,
/// `note_off`, patch editing, WAV export) returns `Result`.
#[derive(thiserror::Error, Debug)]
pub enum SynthError {
    /// An index (voice, cart, or patch) was outside its valid range.
    #[error("invalid {what} index: {value}")]
    InvalidIndex {
        /// What kind of index was invalid (e.g. `"voice"`, `"cart/patch"`).
        what: &'static str,
        /// The offending value.
        value: usize,
    },

    /// A patch parameter was out of bounds for its [`patch::PatchParam`]
    /// and was clamped rather than rejected.
    #[error("parameter {param} clamped from {value} to bound {bound}")]
    ParameterClamped {
        /// Name of the parameter that was clamped.
        param: &'static str,
        /// The raw value that was out of range.
        value: u8,
        /// The exclusive bound it was clamped into.
        bound: u8,
    },

    /// IO error writing an exported WAV file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the WAV encoder.
    #[cfg(feature = "export")]
    #[error("WAV export error: {0}")]
    WavExport(#[from] hound::Error),
}

/// Result type for synth engine operations.
pub type Result<T> = std::result::Result<T, SynthError>;

#[cfg(feature = "engine")]
pub use patch::{Cart, Patch, PatchBank, PatchParam};
#[cfg(feature = "engine")]
pub use voice::VoiceEngine;
