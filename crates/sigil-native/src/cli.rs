use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cybersigil", about = "Headless audio-reactive sigil growth")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG); loops until --seconds elapse
    pub input: Option<PathBuf>,

    /// Capture the default input device instead of a file
    #[arg(long, conflicts_with = "input")]
    pub mic: bool,

    /// Linear gain applied to the microphone signal
    #[arg(long)]
    pub mic_gain: Option<f32>,

    /// Frames per second of the growth loop
    #[arg(long)]
    pub fps: Option<f32>,

    /// Stop after this many seconds (runs until interrupted when omitted)
    #[arg(long)]
    pub seconds: Option<f64>,

    /// Mirror new branches across X
    #[arg(long)]
    pub mirror_x: bool,

    /// Mirror new branches across Y
    #[arg(long)]
    pub mirror_y: bool,

    /// Mirror new branches across Z
    #[arg(long)]
    pub mirror_z: bool,

    /// RNG seed for reproducible spawning and resets
    #[arg(long)]
    pub seed: Option<u64>,

    /// TOML config file (defaults to ./cybersigil.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
