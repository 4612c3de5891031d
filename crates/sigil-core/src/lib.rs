//! Audio-reactive growth engine for branching "sigil" structures.
//!
//! Platform-free: front-ends feed PCM or byte spectra into the
//! [`AudioFeatureExtractor`], tick the [`Orchestrator`] once per frame and
//! draw whatever it hands their [`SceneSink`].

pub mod audio;
pub mod branch;
pub mod config;
pub mod constants;
pub mod curve;
pub mod error;
pub mod forest;
pub mod noise;
pub mod orchestrator;
pub mod state;
pub mod tessellate;

pub use audio::*;
pub use branch::*;
pub use config::*;
pub use constants::*;
pub use curve::*;
pub use error::*;
pub use forest::*;
pub use crate::noise::NoiseField;
pub use orchestrator::*;
pub use state::*;
pub use tessellate::*;
