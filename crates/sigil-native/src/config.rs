use anyhow::{Context, Result};
use sigil_core::{MirrorAxes, VisualizerConfig};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

const LOCAL_CONFIG: &str = "cybersigil.toml";

pub fn load_config(path: &Path) -> Result<VisualizerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Explicit --config path, else a local cybersigil.toml, else defaults.
pub fn resolve(cli: &Cli) -> Result<VisualizerConfig> {
    let path = cli.config.clone().or_else(|| {
        let local = PathBuf::from(LOCAL_CONFIG);
        local.exists().then_some(local)
    });
    let mut config = match path {
        Some(ref path) => {
            let cfg = load_config(path)?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => VisualizerConfig::default(),
    };

    // command-line values win over the file
    if cli.mirror_x || cli.mirror_y || cli.mirror_z {
        config.mirror = MirrorAxes::new(cli.mirror_x, cli.mirror_y, cli.mirror_z);
    }
    if let Some(gain) = cli.mic_gain {
        config.mic_gain = gain;
    }
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    anyhow::ensure!(
        config.fps.is_finite() && config.fps > 0.0,
        "fps must be positive, got {}",
        config.fps
    );
    Ok(config)
}
