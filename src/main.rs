#[cfg(not(all(feature = "engine", feature = "export")))]
fn main() {
    eprintln!(
        "The czsynth demo CLI requires the \"engine\" and \"export\" features. Rebuild with `--features engine,export` to enable it."
    );
}

#[cfg(all(feature = "engine", feature = "export"))]
fn main() {
    cli::run();
}

#[cfg(all(feature = "engine", feature = "export"))]
mod cli {
    use std::env;
    use std::process;

    use czsynth::voice::tables::SAMPLE_RATE;
    use czsynth::voice::VoiceEngine;
    use czsynth::{Patch, PatchParam};

    const NOTE_NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];

    fn note_name(midi_note: u8) -> String {
        let name = NOTE_NAMES[(midi_note % 12) as usize];
        let octave = midi_note / 12 - 1;
        format!("{name}{octave}")
    }

    /// Builds one of the spec's demo scenario patches by name, starting
    /// from a reset patch and overriding the parameters the scenario
    /// calls out. Mirrors the retrieved source's hand-built demo cart in
    /// `main.c`: every demo patch starts from the same defaults and only
    /// a handful of bytes differ between them.
    fn demo_patch(scenario: &str) -> Option<Patch> {
        use czsynth::patch::Waveform;

        let mut p = Patch::reset();
        let set = |p: &mut Patch, param: PatchParam, value: u8| {
            p.values[param as usize] = value;
        };

        set(&mut p, PatchParam::AmpEnvAttack, 0);
        set(&mut p, PatchParam::AmpEnvDecay, 70);
        set(&mut p, PatchParam::AmpEnvRelease, 50);
        set(&mut p, PatchParam::AmpEnvHold, 75);
        set(&mut p, PatchParam::AmpEnvSustain, 90);
        set(&mut p, PatchParam::BendEnvAttack, 0);
        set(&mut p, PatchParam::BendEnvDecay, 30);
        set(&mut p, PatchParam::BendEnvRelease, 50);
        set(&mut p, PatchParam::BendEnvHold, 50);
        set(&mut p, PatchParam::BendEnvSustain, 70);
        set(&mut p, PatchParam::Line1BendMax, 99);

        match scenario {
            "saw" => {
                set(&mut p, PatchParam::Line1Wave1, Waveform::Saw as u8);
                set(&mut p, PatchParam::Line1Wave2, Waveform::Saw as u8);
            }
            "square" => {
                set(&mut p, PatchParam::Line1Wave1, Waveform::Square as u8);
                set(&mut p, PatchParam::Line1Wave2, Waveform::Square as u8);
            }
            "pulse" => {
                set(&mut p, PatchParam::Line1Wave1, Waveform::Pulse as u8);
                set(&mut p, PatchParam::Line1Wave2, Waveform::Pulse as u8);
            }
            "double-sine" => {
                set(&mut p, PatchParam::Line1Wave1, Waveform::DoubleSine as u8);
                set(&mut p, PatchParam::Line1Wave2, Waveform::DoubleSine as u8);
            }
            "resonance" => {
                set(&mut p, PatchParam::Line1Wave1, Waveform::Saw as u8);
                set(&mut p, PatchParam::Line1Wave2, Waveform::ResonanceSaw as u8);
            }
            "ring-mod" => {
                set(&mut p, PatchParam::Line1Wave1, Waveform::Saw as u8);
                set(&mut p, PatchParam::Line1Wave2, Waveform::Saw as u8);
                set(&mut p, PatchParam::Line2Wave1, Waveform::Saw as u8);
                set(&mut p, PatchParam::Line2Wave2, Waveform::Saw as u8);
                set(&mut p, PatchParam::Line2Octave, 4); // +1 octave (default is 3)
                set(&mut p, PatchParam::OutputRingMod, 1);
            }
            _ => return None,
        }

        p.validate();
        Some(p)
    }

    fn usage(program: &str) -> ! {
        eprintln!("Usage: {program} <scenario> <output.wav> [midi-note] [seconds]");
        eprintln!("Scenarios: saw, square, pulse, double-sine, resonance, ring-mod");
        process::exit(1);
    }

    pub fn run() {
        let args: Vec<String> = env::args().collect();
        let program = args.first().map(String::as_str).unwrap_or("czsynth");

        if args.len() < 3 {
            usage(program);
        }

        let scenario = &args[1];
        let output_path = &args[2];
        let midi_note: u8 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(60);
        let seconds: f32 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(3.0);

        let Some(patch) = demo_patch(scenario) else {
            eprintln!("Unknown scenario: {scenario}");
            usage(program);
        };

        let mut engine = VoiceEngine::new();
        *engine.patches_mut().get_mut(0, 0).expect("cart 0 / patch 0 always exists") = patch;
        engine.load_patch(0, 0, 0).expect("cart 0 / patch 0 was just validated above");

        println!(
            "Rendering scenario '{scenario}' at {} ({:.1}s @ {SAMPLE_RATE}Hz)...",
            note_name(midi_note),
            seconds
        );

        engine.note_on(0, midi_note, 100).unwrap_or_else(|e| {
            eprintln!("note_on failed: {e}");
            process::exit(1);
        });

        let total_samples = (seconds * SAMPLE_RATE as f32) as usize;
        let mut samples = Vec::with_capacity(total_samples);
        for _ in 0..total_samples {
            engine.update_all();
            samples.push(engine.voice(0).expect("voice 0 exists").level);
        }

        if let Err(e) = czsynth::export::export_to_wav(&samples, output_path) {
            eprintln!("Failed to write {output_path}: {e}");
            process::exit(1);
        }

        println!("Wrote {} samples to {output_path}", samples.len());
    }
}
