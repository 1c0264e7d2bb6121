//! WAV file export (§6 of the spec: an external collaborator, not part
//! of the per-sample hot path).

mod wav;

pub use wav::{export_to_wav, export_to_wav_with_config, ExportConfig};
