use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FPS, DEFAULT_MIC_GAIN};
use crate::forest::MirrorAxes;
use crate::noise::NoiseField;
use crate::state::PostFxBase;
use crate::tessellate::ColorBlend;

/// Runtime-selectable settings. Every field has a default, so a partial
/// TOML table is enough.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualizerConfig {
    #[serde(default = "default_mirror")]
    pub mirror: MirrorAxes,
    #[serde(default)]
    pub color_blend: ColorBlend,
    #[serde(default)]
    pub post_fx: PostFxBase,
    #[serde(default = "default_mic_gain")]
    pub mic_gain: f32,
    #[serde(default = "default_fps")]
    pub fps: f32,
    /// Seed for spawning and resets; `None` draws one from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_noise_seed")]
    pub noise_seed: u32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            mirror: default_mirror(),
            color_blend: ColorBlend::default(),
            post_fx: PostFxBase::default(),
            mic_gain: default_mic_gain(),
            fps: default_fps(),
            seed: None,
            noise_seed: default_noise_seed(),
        }
    }
}

fn default_mirror() -> MirrorAxes {
    MirrorAxes::new(true, false, false)
}
fn default_mic_gain() -> f32 {
    DEFAULT_MIC_GAIN
}
fn default_fps() -> f32 {
    DEFAULT_FPS
}
fn default_noise_seed() -> u32 {
    NoiseField::DEFAULT_SEED
}
