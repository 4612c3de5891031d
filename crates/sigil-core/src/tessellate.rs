//! Incremental tube tessellation and audio-driven material response.

use std::f32::consts::TAU;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::audio::AudioFeatureFrame;
use crate::branch::Branch;
use crate::constants::{
    BASE_EMISSIVE_INTENSITY, BLEND_REFERENCE_FPS, BRIGHTNESS_MIN, BRIGHTNESS_VOLUME_GAIN,
    COLOR_BLEND_PER_FRAME, COLOR_GAIN_BASS, COLOR_GAIN_MID, COLOR_GAIN_TREBLE,
    DEFAULT_GROWTH_SPEED, EMISSIVE_BLEND_PER_FRAME, EMISSIVE_GAIN_BASS, EMISSIVE_GAIN_MID,
    EMISSIVE_GAIN_TREBLE, EMISSIVE_INTENSITY_MAX, EMISSIVE_INTENSITY_MIN, EMISSIVE_PULSE_GAIN,
    FALLBACK_SIDE, GROWTH_MID_GAIN, GROWTH_VOLUME_GAIN, INTERACTION_GROWTH_DAMPING,
    MAX_GROWTH_SPEED, MIN_GROWTH_SPEED, TUBE_BASE_RADIUS, TUBE_DEPTH_SCALE_FACTOR, TUBE_SIDES,
    TUBE_TAPER_POWER, WORLD_RIGHT, WORLD_UP,
};

const DEGENERATE_LENGTH_SQ: f32 = 1e-4;

/// Unit vector perpendicular to `tangent`.
///
/// Crosses with world up, then world right when the tangent is vertical, and
/// finally returns a fixed axis if both are degenerate.
pub fn side_vector(tangent: Vec3) -> Vec3 {
    let side = tangent.cross(WORLD_UP).normalize_or_zero();
    if side.length_squared() >= DEGENERATE_LENGTH_SQ {
        return side;
    }
    let side = tangent.cross(WORLD_RIGHT).normalize_or_zero();
    if side.length_squared() >= DEGENERATE_LENGTH_SQ {
        return side;
    }
    FALLBACK_SIDE
}

/// Growth rate shared by every branch the owner advances.
///
/// Each growth step scales it by the current audio and re-clamps, so the value
/// drifts with the music rather than being recomputed from scratch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthSpeed {
    value: f32,
}

impl Default for GrowthSpeed {
    fn default() -> Self {
        Self {
            value: DEFAULT_GROWTH_SPEED,
        }
    }
}

impl GrowthSpeed {
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = DEFAULT_GROWTH_SPEED;
    }

    pub fn modulate(&mut self, features: &AudioFeatureFrame) -> f32 {
        let factor =
            1.0 + features.mid * GROWTH_MID_GAIN + features.overall_volume * GROWTH_VOLUME_GAIN;
        self.value = (self.value * factor).clamp(MIN_GROWTH_SPEED, MAX_GROWTH_SPEED);
        self.value
    }

    pub fn effective(&self, is_interacting: bool) -> f32 {
        if is_interacting {
            self.value * INTERACTION_GROWTH_DAMPING
        } else {
            self.value
        }
    }
}

/// How material colors chase their audio targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorBlend {
    /// Fixed factor every frame, so the response depends on frame rate.
    #[default]
    PerFrame,
    /// `1 - exp(-rate * delta)`, matching `PerFrame` at the reference rate.
    TimeScaled,
}

impl ColorBlend {
    pub fn factor(self, per_frame: f32, delta: f32) -> f32 {
        match self {
            ColorBlend::PerFrame => per_frame,
            ColorBlend::TimeScaled => {
                let rate = -(1.0 - per_frame).ln() * BLEND_REFERENCE_FPS;
                1.0 - (-rate * delta.max(0.0)).exp()
            }
        }
    }
}

/// Per-call inputs to [`grow_step`].
#[derive(Clone, Copy, Debug)]
pub struct GrowthInput<'a> {
    pub delta: f32,
    pub is_interacting: bool,
    pub features: &'a AudioFeatureFrame,
    pub blend: ColorBlend,
}

/// Advance one branch and tessellate any newly covered path segments.
///
/// Returns true iff new geometry was written. A fully grown branch is left
/// untouched, including its material.
pub fn grow_step(branch: &mut Branch, speed: &mut GrowthSpeed, input: GrowthInput<'_>) -> bool {
    if branch.is_fully_grown() {
        return false;
    }

    speed.modulate(input.features);
    let total = branch.total_length;
    branch.current_length += speed.effective(input.is_interacting) * input.delta.max(0.0);
    let reached_full_length = branch.current_length >= total;
    branch.current_length = branch.current_length.min(total);

    let segments = branch.segment_count();
    let target = if total > 0.0 {
        (((branch.current_length / total) * segments as f32).floor() as usize).min(segments)
    } else {
        segments
    };
    let already_drawn = branch.drawn_segments;
    let loop_end = if reached_full_length {
        (target + 1).min(segments)
    } else {
        target
    };

    let mut wrote = false;
    if loop_end > already_drawn {
        for i in already_drawn..loop_end {
            wrote |= tessellate_segment(branch, i, segments);
        }
        branch.drawn_segments = loop_end;
    }

    if wrote {
        branch.mesh.commit();
    }
    if branch.mesh.vertex_count() > 0 {
        update_material(branch, input.features, input.blend, input.delta);
    }
    wrote
}

fn tube_radius(u: f32, depth: u32) -> f32 {
    let depth_scale = 1.0 / (1.0 + depth as f32 * TUBE_DEPTH_SCALE_FACTOR);
    TUBE_BASE_RADIUS * (1.0 - u).max(0.0).powf(TUBE_TAPER_POWER) * depth_scale
}

/// Ring of `TUBE_SIDES` vertices around `center`, perpendicular to `tangent`.
fn ring(center: Vec3, tangent: Vec3, radius: f32) -> [Vec3; TUBE_SIDES + 1] {
    let side = side_vector(tangent);
    let binormal = tangent.cross(side).normalize_or_zero();
    let mut out = [center; TUBE_SIDES + 1];
    for (j, v) in out.iter_mut().enumerate() {
        let angle = j as f32 / TUBE_SIDES as f32 * TAU;
        *v = center + side * (angle.cos() * radius) + binormal * (angle.sin() * radius);
    }
    out
}

fn tessellate_segment(branch: &mut Branch, i: usize, segments: usize) -> bool {
    let path = branch.curve.points();
    let (Some(&p1), Some(&p2)) = (path.get(i), path.get(i + 1)) else {
        log::warn!("Segment {} out of range for a {}-point path", i, path.len());
        return false;
    };

    let u1 = i as f32 / segments as f32;
    let u2 = ((i + 1) as f32 / segments as f32).min(1.0);
    let t1 = branch.curve.tangent_at(u1);
    let t2 = branch.curve.tangent_at(u2);
    let ring1 = ring(p1, t1, tube_radius(u1, branch.depth));
    let ring2 = ring(p2, t2, tube_radius(u2, branch.depth));

    let mesh = &mut branch.mesh;
    let mut wrote = false;
    for j in 0..TUBE_SIDES {
        wrote |= mesh.push_triangle(ring1[j], ring1[j + 1], ring2[j]);
        wrote |= mesh.push_triangle(ring1[j + 1], ring2[j + 1], ring2[j]);
    }
    wrote
}

fn update_material(
    branch: &mut Branch,
    features: &AudioFeatureFrame,
    blend: ColorBlend,
    delta: f32,
) {
    let target_color = Vec3::new(
        features.bass * COLOR_GAIN_BASS,
        features.mid * COLOR_GAIN_MID,
        features.treble * COLOR_GAIN_TREBLE,
    )
    .clamp(Vec3::ZERO, Vec3::ONE);

    let brightness = (features.overall_volume * BRIGHTNESS_VOLUME_GAIN).clamp(BRIGHTNESS_MIN, 1.0);
    let target_emissive = Vec3::new(
        features.treble * EMISSIVE_GAIN_TREBLE * brightness,
        features.mid * EMISSIVE_GAIN_MID * brightness,
        features.bass * EMISSIVE_GAIN_BASS * brightness,
    )
    .clamp(Vec3::ZERO, Vec3::ONE);

    let material = &mut branch.material;
    material.color = material
        .color
        .lerp(target_color, blend.factor(COLOR_BLEND_PER_FRAME, delta));
    material.emissive = material
        .emissive
        .lerp(target_emissive, blend.factor(EMISSIVE_BLEND_PER_FRAME, delta));
    material.emissive_intensity = (BASE_EMISSIVE_INTENSITY
        + features.overall_volume * EMISSIVE_PULSE_GAIN)
        .clamp(EMISSIVE_INTENSITY_MIN, EMISSIVE_INTENSITY_MAX);
}
