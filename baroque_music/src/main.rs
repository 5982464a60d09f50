// Baroque composer CLI entry point.
//
// Generates a four-voice piece and writes it as JSON (stdout by default)
// and optionally as a MIDI file.
//
// Usage:
//   cargo run -p baroque_music -- [--form FORM] [--key KEY] [--mode MODE]
//     [--duration N] [--seed SEED] [--ornament-density 0-100]
//     [--output piece.json] [--midi piece.mid] [--tempo BPM]
//
// Forms: chorale, prelude, fugue, gigue, allemande, courante, sarabande,
// minuet, passacaglia, ritornello, variations, suite

use baroque_music::midi::{DEFAULT_TEMPO_BPM, write_midi};
use baroque_music::planner::{GenerateOptions, generate};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Generate four-voice Baroque music.
#[derive(Parser)]
#[command(name = "generate")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Musical form (default chorale)
    #[arg(long)]
    form: Option<String>,

    /// Tonic pitch class, e.g. C, F#, Bb (default C)
    #[arg(short, long)]
    key: Option<String>,

    /// major or minor (default major)
    #[arg(short, long)]
    mode: Option<String>,

    /// Length scale; 2 is the reference length
    #[arg(short, long)]
    duration: Option<f64>,

    /// Seed string (default "default")
    #[arg(short, long)]
    seed: Option<String>,

    /// Ornament density, 0 to 100 (default 50)
    #[arg(long)]
    ornament_density: Option<f64>,

    /// Write the piece as JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a MIDI file
    #[arg(long)]
    midi: Option<PathBuf>,

    /// MIDI tempo in quarter notes per minute
    #[arg(long, default_value_t = DEFAULT_TEMPO_BPM)]
    tempo: u16,
}

impl Cli {
    fn options(&self) -> GenerateOptions {
        GenerateOptions {
            form: self.form.clone(),
            key: self.key.clone(),
            mode: self.mode.clone(),
            duration: self.duration,
            seed: self.seed.clone(),
            ornament_density: self.ornament_density,
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let piece = generate(&cli.options())?;
    eprintln!(
        "{} in {} {}: {} notes, {} sections",
        piece.meta.form,
        piece.meta.key,
        piece.meta.mode,
        piece.notes.len(),
        piece.meta.sections.len()
    );

    let json = serde_json::to_string_pretty(&piece)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, json)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(path) = &cli.midi {
        write_midi(&piece, path, cli.tempo)?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
