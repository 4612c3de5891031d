//! Per-frame driver: audio analysis, sigil lifecycle and scene state.

use glam::Vec3;
use rand::prelude::*;

use crate::audio::{AudioFeatureExtractor, AudioFeatureFrame};
use crate::config::VisualizerConfig;
use crate::constants::{sigil_anchor_vec3, AUTO_RESET_AFTER_SEC, ROOT_SEED_RANGE};
use crate::forest::{MirrorAxes, Sigil};
use crate::noise::NoiseField;
use crate::state::{
    BackgroundFlash, FrameReport, PostFxBase, PostFxParams, SceneRotation, SceneSink, SceneView,
};
use crate::tessellate::{GrowthInput, GrowthSpeed};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

#[derive(Debug)]
pub struct Orchestrator {
    config: VisualizerConfig,
    extractor: AudioFeatureExtractor,
    sigils: Vec<Sigil>,
    growth: GrowthSpeed,
    mirror: MirrorAxes,
    noise: NoiseField,
    rng: StdRng,
    rotation: SceneRotation,
    flash: BackgroundFlash,
    post_fx: PostFxParams,
    interacting: bool,
    elapsed: f64,
}

impl Orchestrator {
    pub fn new(config: VisualizerConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut extractor = AudioFeatureExtractor::new();
        extractor.set_mic_gain(config.mic_gain);
        let rotation = SceneRotation::new(&mut rng);
        Self {
            mirror: config.mirror,
            noise: NoiseField::new(config.noise_seed),
            post_fx: PostFxParams::from_base(&config.post_fx),
            config,
            extractor,
            sigils: Vec::new(),
            growth: GrowthSpeed::default(),
            rng,
            rotation,
            flash: BackgroundFlash::default(),
            interacting: false,
            elapsed: 0.0,
        }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn extractor(&self) -> &AudioFeatureExtractor {
        &self.extractor
    }

    pub fn extractor_mut(&mut self) -> &mut AudioFeatureExtractor {
        &mut self.extractor
    }

    pub fn sigils(&self) -> &[Sigil] {
        &self.sigils
    }

    pub fn growth_speed(&self) -> GrowthSpeed {
        self.growth
    }

    pub fn mirror(&self) -> MirrorAxes {
        self.mirror
    }

    pub fn rotation(&self) -> &SceneRotation {
        &self.rotation
    }

    pub fn background(&self) -> Vec3 {
        self.flash.color
    }

    pub fn post_fx(&self) -> &PostFxParams {
        &self.post_fx
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn branch_count(&self) -> usize {
        self.sigils.iter().map(|s| s.branches().len()).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.sigils.iter().map(Sigil::vertex_count).sum()
    }

    /// Discard every sigil and grow a fresh one at the anchor.
    pub fn reset(&mut self) {
        for sigil in self.sigils.iter_mut() {
            sigil.dispose();
        }
        self.sigils.clear();

        let direction = Vec3::new(
            self.rng.gen::<f32>() * 2.0 - 1.0,
            self.rng.gen::<f32>() * 2.0 - 1.0,
            self.rng.gen::<f32>() * 2.0 - 1.0,
        )
        .try_normalize()
        .unwrap_or(Vec3::Z);
        let seed = self.rng.gen::<f32>() * ROOT_SEED_RANGE;
        let sigil_rng = StdRng::seed_from_u64(self.rng.gen());

        let anchor = sigil_anchor_vec3();
        self.sigils.push(Sigil::new(
            self.noise.clone(),
            anchor,
            direction,
            seed,
            self.mirror,
            sigil_rng,
        ));
        self.growth.reset();
        log::info!(
            "Reset: new sigil at ({:.1}, {:.1}, {:.1}), {} sigil(s) total",
            anchor.x,
            anchor.y,
            anchor.z,
            self.sigils.len()
        );
    }

    /// Spawn on the primary sigil, or reset when there is none.
    /// Returns the number of branches created.
    pub fn spawn(&mut self) -> usize {
        self.spawn_or_reset().0
    }

    fn spawn_or_reset(&mut self) -> (usize, bool) {
        let mirror = self.mirror;
        match self.sigils.first_mut() {
            Some(sigil) => (sigil.spawn_new_branch(mirror), false),
            None => {
                self.reset();
                (self.branch_count(), true)
            }
        }
    }

    /// Affects later resets and spawns only.
    pub fn toggle_mirror(&mut self, axis: Axis) -> bool {
        let flag = match axis {
            Axis::X => &mut self.mirror.x,
            Axis::Y => &mut self.mirror.y,
            Axis::Z => &mut self.mirror.z,
        };
        *flag = !*flag;
        log::info!("Mirror {:?} {}", axis, if *flag { "on" } else { "off" });
        *flag
    }

    pub fn set_mirror(&mut self, mirror: MirrorAxes) {
        self.mirror = mirror;
    }

    pub fn toggle_inversion(&mut self) -> bool {
        self.post_fx.invert = !self.post_fx.invert;
        self.post_fx.invert
    }

    pub fn set_interacting(&mut self, interacting: bool) {
        self.interacting = interacting;
    }

    pub fn set_post_fx_base(&mut self, base: PostFxBase) {
        self.config.post_fx = base;
    }

    pub fn set_mic_gain(&mut self, gain: f32) {
        self.config.mic_gain = gain;
        self.extractor.set_mic_gain(gain);
    }

    /// Analyse the current audio and advance one frame.
    pub fn tick(&mut self, delta: f32) -> FrameReport {
        let now = self.elapsed + delta.max(0.0) as f64;
        let features = self.extractor.analyze(now);
        self.advance(delta, &features)
    }

    /// Advance one frame with externally supplied features.
    pub fn advance(&mut self, delta: f32, features: &AudioFeatureFrame) -> FrameReport {
        let delta = delta.max(0.0);
        self.elapsed += delta as f64;
        let now = self.elapsed;
        let mut report = FrameReport {
            features: *features,
            ..FrameReport::default()
        };

        if features.vocal {
            let (spawned, reset) = self.spawn_or_reset();
            report.spawned = spawned;
            report.reset = reset;
        }
        if self.sigils.is_empty() && now > AUTO_RESET_AFTER_SEC {
            log::info!("No sigil after {:.1}s; creating one", now);
            self.reset();
            report.reset = true;
        }

        let input = GrowthInput {
            delta,
            is_interacting: self.interacting,
            features,
            blend: self.config.color_blend,
        };
        for sigil in self.sigils.iter_mut() {
            report.geometry_changed |= sigil.update(&mut self.growth, input);
        }

        let active = self.extractor.is_active();
        self.rotation
            .update(features, active, delta, now, &mut self.rng);
        self.post_fx
            .update(&self.config.post_fx, features, active, delta);
        self.flash.update(features.beat, active, delta);

        report.sigils = self.sigils.len();
        report.branches = self.branch_count();
        report.vertices = self.vertex_count();
        report
    }

    pub fn scene_view(&self) -> SceneView {
        SceneView {
            rotation: self.rotation.angles,
            background: self.flash.color,
            post_fx: self.post_fx,
        }
    }

    /// Hand the scene state and every branch mesh to the renderer.
    pub fn render_into<S: SceneSink + ?Sized>(&self, sink: &mut S) {
        sink.begin_frame(&self.scene_view());
        for sigil in &self.sigils {
            let anchor = sigil.anchor();
            for branch in sigil.branches() {
                sink.submit_branch(anchor, branch);
            }
        }
        sink.end_frame();
    }

    /// Clear mesh dirty flags once the renderer has uploaded them.
    pub fn mark_uploaded(&mut self) {
        for sigil in self.sigils.iter_mut() {
            for branch in sigil.branches_mut() {
                branch.mesh_mut().mark_uploaded();
            }
        }
    }
}
