//! Branch paths, their fixed-capacity tube meshes and material state.

use std::ops::Range;

use glam::Vec3;

use crate::constants::{
    BASE_EMISSIVE_INTENSITY, BEND_NOISE_OFFSET, BEND_SEED_OFFSET, BRANCH_LENGTH_DEPTH_FALLOFF,
    BRANCH_METALNESS, BRANCH_ROUGHNESS, MAX_VERTICES_PER_BRANCH, MIN_BRANCH_LENGTH,
    NOISE_DISPLACEMENT_SCALE, NOISE_DISPLACEMENT_STRENGTH, POINTS_PER_BRANCH, ROOT_BRANCH_LENGTH,
    SWAY_AMPLITUDE, SWAY_FREQUENCY,
};
use crate::curve::CatmullRomCurve;
use crate::forest::MirrorCombination;
use crate::noise::NoiseField;
use crate::tessellate::side_vector;

/// Axis-aligned box plus enclosing sphere over the visible vertices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
    pub radius: f32,
}

/// Vertex positions and flat normals for one branch tube.
///
/// Both buffers are allocated once at their worst-case size; the draw range
/// is the prefix written so far.
#[derive(Clone, Debug)]
pub struct BranchMesh {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    vertex_count: usize,
    draw_count: usize,
    positions_dirty: bool,
    normals_dirty: bool,
    bounds: Option<Bounds>,
}

impl BranchMesh {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: vec![[0.0; 3]; capacity],
            normals: vec![[0.0; 3]; capacity],
            vertex_count: 0,
            draw_count: 0,
            positions_dirty: false,
            normals_dirty: false,
            bounds: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn draw_range(&self) -> Range<usize> {
        0..self.draw_count
    }

    /// The full position buffer, including the unwritten tail.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn visible_positions(&self) -> &[[f32; 3]] {
        &self.positions[self.draw_range()]
    }

    pub fn visible_normals(&self) -> &[[f32; 3]] {
        &self.normals[self.draw_range()]
    }

    /// Visible positions as raw bytes for GPU upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.visible_positions())
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.visible_normals())
    }

    pub fn needs_upload(&self) -> bool {
        self.positions_dirty || self.normals_dirty
    }

    /// Clear the dirty flags once the renderer has consumed the buffers.
    pub fn mark_uploaded(&mut self) {
        self.positions_dirty = false;
        self.normals_dirty = false;
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn is_released(&self) -> bool {
        self.positions.is_empty()
    }

    /// Write one flat-shaded triangle. Returns false when the buffer is full.
    pub(crate) fn push_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) -> bool {
        if self.vertex_count + 3 > self.capacity() {
            return false;
        }
        let normal = (b - a).cross(c - a).normalize_or_zero().to_array();
        for v in [a, b, c] {
            self.positions[self.vertex_count] = v.to_array();
            self.normals[self.vertex_count] = normal;
            self.vertex_count += 1;
        }
        true
    }

    /// Publish everything written so far.
    pub(crate) fn commit(&mut self) {
        self.draw_count = self.vertex_count;
        self.positions_dirty = true;
        self.normals_dirty = true;
        self.bounds = compute_bounds(self.visible_positions());
    }

    pub(crate) fn release(&mut self) {
        self.positions = Vec::new();
        self.normals = Vec::new();
        self.vertex_count = 0;
        self.draw_count = 0;
        self.positions_dirty = false;
        self.normals_dirty = false;
        self.bounds = None;
    }
}

fn compute_bounds(positions: &[[f32; 3]]) -> Option<Bounds> {
    let first = Vec3::from(*positions.first()?);
    let (min, max) = positions
        .iter()
        .map(|&p| Vec3::from(p))
        .fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
    let center = (min + max) * 0.5;
    let radius = positions
        .iter()
        .map(|&p| center.distance_squared(Vec3::from(p)))
        .fold(0.0f32, f32::max)
        .sqrt();
    Some(Bounds {
        min,
        max,
        center,
        radius,
    })
}

/// Surface parameters the renderer reads every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BranchMaterial {
    pub color: Vec3,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for BranchMaterial {
    fn default() -> Self {
        Self {
            color: Vec3::ZERO,
            emissive: Vec3::ONE,
            emissive_intensity: BASE_EMISSIVE_INTENSITY,
            metalness: BRANCH_METALNESS,
            roughness: BRANCH_ROUGHNESS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Branch {
    pub(crate) seed: f32,
    pub(crate) depth: u32,
    pub(crate) parent: Option<usize>,
    pub(crate) mirror: Option<MirrorCombination>,
    pub(crate) curve: CatmullRomCurve,
    pub(crate) total_length: f32,
    pub(crate) current_length: f32,
    pub(crate) drawn_segments: usize,
    pub(crate) children_spawned: u32,
    pub(crate) mesh: BranchMesh,
    pub(crate) material: BranchMaterial,
}

impl Branch {
    pub fn seed(&self) -> f32 {
        self.seed
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Index of the branch this one was spawned from; `None` for roots.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn mirror(&self) -> Option<MirrorCombination> {
        self.mirror
    }

    pub fn path(&self) -> &[Vec3] {
        self.curve.points()
    }

    pub fn curve(&self) -> &CatmullRomCurve {
        &self.curve
    }

    pub fn segment_count(&self) -> usize {
        self.path().len().saturating_sub(1)
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn current_length(&self) -> f32 {
        self.current_length
    }

    pub fn drawn_segments(&self) -> usize {
        self.drawn_segments
    }

    pub fn children_spawned(&self) -> u32 {
        self.children_spawned
    }

    pub fn mesh(&self) -> &BranchMesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut BranchMesh {
        &mut self.mesh
    }

    pub fn material(&self) -> &BranchMaterial {
        &self.material
    }

    pub fn is_fully_grown(&self) -> bool {
        self.current_length >= self.total_length && self.drawn_segments >= self.segment_count()
    }

    pub(crate) fn with_lineage(
        mut self,
        parent: Option<usize>,
        mirror: Option<MirrorCombination>,
    ) -> Self {
        self.parent = parent;
        self.mirror = mirror;
        self
    }
}

/// Nominal path length for a branch at `depth`.
pub fn branch_length(depth: u32) -> f32 {
    if depth == 0 {
        ROOT_BRANCH_LENGTH
    } else {
        (ROOT_BRANCH_LENGTH / (depth as f32 * BRANCH_LENGTH_DEPTH_FALLOFF)).max(MIN_BRANCH_LENGTH)
    }
}

/// Build a branch path from `start` along `direction` and allocate its mesh.
///
/// The path is displaced twice: a macro sway/bend in the plane perpendicular
/// to `direction`, then a fine 3D jitter. Both shrink with depth.
pub fn create_branch(
    noise: &NoiseField,
    start: Vec3,
    direction: Vec3,
    seed: f32,
    depth: u32,
) -> Branch {
    let direction = direction.try_normalize().unwrap_or(Vec3::Z);
    let length = branch_length(depth);
    let falloff = 1.0 / (depth as f32 + 1.0);
    let right = side_vector(direction);
    let up = right.cross(direction).normalize_or_zero();

    let mut points = Vec::with_capacity(POINTS_PER_BRANCH + 1);
    for i in 0..=POINTS_PER_BRANCH {
        let u = i as f32 / POINTS_PER_BRANCH as f32;
        let sway = noise.noise2(u * SWAY_FREQUENCY + seed, seed) * SWAY_AMPLITUDE * falloff;
        let bend = noise.noise2(
            u * SWAY_FREQUENCY + seed + BEND_NOISE_OFFSET,
            seed + BEND_SEED_OFFSET,
        ) * SWAY_AMPLITUDE
            * falloff;
        points.push(start + direction * (u * length) + right * sway + up * bend);
    }

    let s = NOISE_DISPLACEMENT_SCALE;
    let strength = NOISE_DISPLACEMENT_STRENGTH * falloff;
    for p in points.iter_mut() {
        let jitter = Vec3::new(
            noise.noise3(p.x * s, p.y * s, p.z * s + seed),
            noise.noise3(p.y * s, p.z * s, p.x * s + seed + 5.0),
            noise.noise3(p.z * s, p.x * s, p.y * s + seed + 10.0),
        );
        *p += jitter * strength;
    }

    let curve = CatmullRomCurve::new(points);
    let total_length = curve.length();
    log::info!(
        "Created branch (depth {}, seed {:.0}): length={:.2}, points={}, max vertices={}",
        depth,
        seed,
        total_length,
        curve.points().len(),
        MAX_VERTICES_PER_BRANCH
    );

    Branch {
        seed,
        depth,
        parent: None,
        mirror: None,
        curve,
        total_length,
        current_length: 0.0,
        drawn_segments: 0,
        children_spawned: 0,
        mesh: BranchMesh::with_capacity(MAX_VERTICES_PER_BRANCH),
        material: BranchMaterial::default(),
    }
}
