//! Scene-level visual state handed to the render and compositor front-ends.
//!
//! Nothing here touches a graphics API. A front-end implements [`SceneSink`]
//! and receives the scene rotation, background color, post-processing
//! parameters and every branch mesh once per frame.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::audio::AudioFeatureFrame;
use crate::branch::Branch;
use crate::constants::{
    DEFAULT_BLOOM_RADIUS, DEFAULT_BLOOM_STRENGTH, DEFAULT_BLOOM_THRESHOLD, DEFAULT_NOISE_AMOUNT,
    DEFAULT_THRESHOLD_STRENGTH, FLASH_DECAY_SPEED, FLASH_GREY, FLASH_HOLD_SEC,
    NOISE_TIME_RATE, ROTATION_BEAT_SPAN, ROTATION_INITIAL_SPAN, ROTATION_RAMP_SPEED,
    ROTATION_RETARGET_SEC, ROTATION_SPEED_LERP, SNARE_BLOOM_BOOST, SNARE_NOISE_BOOST,
    THRESHOLD_STRENGTH_MAX, THRESHOLD_STRENGTH_MIN, VOCAL_THRESHOLD_BIAS, VOCAL_THRESHOLD_GAIN,
};

#[inline]
fn lerp_factor(delta: f32, rate: f32) -> f32 {
    (delta * rate).clamp(0.0, 1.0)
}

fn random_span(rng: &mut impl Rng, span: f32) -> Vec3 {
    Vec3::new(
        (rng.gen::<f32>() - 0.5) * span,
        (rng.gen::<f32>() - 0.5) * span,
        (rng.gen::<f32>() - 0.5) * span,
    )
}

/// Slow audio-driven spin of the whole scene, as Euler angles.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneRotation {
    pub angles: Vec3,
    pub speed: Vec3,
    pub target_speed: Vec3,
    pub multiplier: f32,
    pub target_multiplier: f32,
    last_retarget: f64,
}

impl SceneRotation {
    pub fn new(rng: &mut impl Rng) -> Self {
        let speed = random_span(rng, ROTATION_INITIAL_SPAN);
        Self {
            angles: Vec3::ZERO,
            speed,
            target_speed: speed,
            multiplier: 1.0,
            target_multiplier: 1.0,
            last_retarget: 0.0,
        }
    }

    /// With audio active, beats pick new target speeds (at most every
    /// `ROTATION_RETARGET_SEC`) and kick the multiplier. Without audio the
    /// spin winds down to rest.
    pub fn update(
        &mut self,
        features: &AudioFeatureFrame,
        audio_active: bool,
        delta: f32,
        now: f64,
        rng: &mut impl Rng,
    ) {
        let speed_t = lerp_factor(delta, ROTATION_SPEED_LERP);
        let ramp_t = lerp_factor(delta, ROTATION_RAMP_SPEED);

        if audio_active {
            if features.beat {
                if now - self.last_retarget > ROTATION_RETARGET_SEC {
                    self.target_speed = random_span(rng, ROTATION_BEAT_SPAN);
                    self.last_retarget = now;
                    log::debug!("Beat: new rotation targets {:?}", self.target_speed);
                }
                self.target_multiplier = 2.0 + features.bass;
            } else {
                self.target_multiplier = 1.2 + features.overall_volume * 0.8;
            }
            self.speed = self.speed.lerp(self.target_speed, speed_t);
            self.multiplier += (self.target_multiplier - self.multiplier) * ramp_t;
        } else {
            self.target_speed = self.target_speed.lerp(Vec3::ZERO, speed_t);
            self.speed = self.speed.lerp(self.target_speed, speed_t);
            self.multiplier += (0.0 - self.multiplier) * ramp_t;
        }
        self.angles += self.speed * self.multiplier * delta;
    }
}

/// Background color that flashes grey on beats and decays back to black.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackgroundFlash {
    pub color: Vec3,
    hold: f32,
}

impl BackgroundFlash {
    pub fn update(&mut self, beat: bool, audio_active: bool, delta: f32) {
        if audio_active && beat {
            self.color = Vec3::splat(FLASH_GREY);
            self.hold = FLASH_HOLD_SEC;
            log::debug!("Beat flash triggered");
        } else if self.hold > 0.0 {
            self.hold -= delta;
        } else {
            self.color = self
                .color
                .lerp(Vec3::ZERO, lerp_factor(delta, FLASH_DECAY_SPEED));
        }
    }

    pub fn is_holding(&self) -> bool {
        self.hold > 0.0
    }
}

/// User-set compositor levels that audio reactions are added on top of.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFxBase {
    pub noise_amount: f32,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub bloom_threshold: f32,
    pub threshold_strength: f32,
}

impl Default for PostFxBase {
    fn default() -> Self {
        Self {
            noise_amount: DEFAULT_NOISE_AMOUNT,
            bloom_strength: DEFAULT_BLOOM_STRENGTH,
            bloom_radius: DEFAULT_BLOOM_RADIUS,
            bloom_threshold: DEFAULT_BLOOM_THRESHOLD,
            threshold_strength: DEFAULT_THRESHOLD_STRENGTH,
        }
    }
}

/// Uniform values for the bloom, threshold-mask, inversion and noise passes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostFxParams {
    pub noise_amount: f32,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub bloom_threshold: f32,
    pub threshold_strength: f32,
    pub invert: bool,
    pub noise_time: f32,
    pub threshold_time: f32,
}

impl PostFxParams {
    pub fn from_base(base: &PostFxBase) -> Self {
        Self {
            noise_amount: base.noise_amount,
            bloom_strength: base.bloom_strength,
            bloom_radius: base.bloom_radius,
            bloom_threshold: base.bloom_threshold,
            threshold_strength: base.threshold_strength,
            invert: false,
            noise_time: 0.0,
            threshold_time: 0.0,
        }
    }

    /// Audio reactions apply only while a source is active; otherwise the
    /// previous levels are kept. Shader clocks always advance.
    pub fn update(
        &mut self,
        base: &PostFxBase,
        features: &AudioFeatureFrame,
        audio_active: bool,
        delta: f32,
    ) {
        if audio_active {
            let snare = if features.snare_hit { 1.0 } else { 0.0 };
            self.noise_amount = base.noise_amount + SNARE_NOISE_BOOST * snare;
            self.bloom_strength = base.bloom_strength + SNARE_BLOOM_BOOST * snare;
            self.threshold_strength = (base.threshold_strength
                + features.vocals * VOCAL_THRESHOLD_GAIN
                - VOCAL_THRESHOLD_BIAS)
                .clamp(THRESHOLD_STRENGTH_MIN, THRESHOLD_STRENGTH_MAX);
        }
        self.bloom_radius = base.bloom_radius;
        self.bloom_threshold = base.bloom_threshold;
        self.noise_time += delta * NOISE_TIME_RATE;
        self.threshold_time += delta;
    }
}

/// Everything scene-wide a front-end needs for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneView {
    pub rotation: Vec3,
    pub background: Vec3,
    pub post_fx: PostFxParams,
}

/// Render collaborator. The core never issues draw calls itself.
pub trait SceneSink {
    fn begin_frame(&mut self, _view: &SceneView) {}

    /// One branch mesh, positioned relative to its sigil `anchor`.
    fn submit_branch(&mut self, anchor: Vec3, branch: &Branch);

    fn end_frame(&mut self) {}
}

/// Summary of one orchestrator tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub features: AudioFeatureFrame,
    pub geometry_changed: bool,
    pub spawned: usize,
    pub reset: bool,
    pub sigils: usize,
    pub branches: usize,
    pub vertices: usize,
}
