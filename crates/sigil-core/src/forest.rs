//! A sigil: one root branch, its mirrored copies, and every child spawned
//! from them, stored as a flat arena in creation order.

use std::f32::consts::PI;

use glam::{Quat, Vec3};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::branch::{create_branch, Branch};
use crate::constants::{ATTACH_MAX_FRACTION, ATTACH_MIN_FRACTION, CHILD_SEED_SCALE, MAX_BRANCH_DEPTH};
use crate::noise::NoiseField;
use crate::tessellate::{grow_step, GrowthInput, GrowthSpeed};

/// Which reflection axes are active for new roots and spawns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorAxes {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl MirrorAxes {
    pub const NONE: Self = Self::new(false, false, false);
    pub const ALL: Self = Self::new(true, true, true);

    pub const fn new(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }

    /// Every non-empty combination of the active axes, in seed-offset order.
    pub fn combinations(&self) -> SmallVec<[MirrorCombination; 7]> {
        MirrorCombination::ALL
            .iter()
            .copied()
            .filter(|c| c.is_enabled_by(*self))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MirrorCombination {
    X,
    Y,
    Z,
    XY,
    XZ,
    YZ,
    XYZ,
}

impl MirrorCombination {
    pub const ALL: [Self; 7] = [
        Self::X,
        Self::Y,
        Self::Z,
        Self::XY,
        Self::XZ,
        Self::YZ,
        Self::XYZ,
    ];

    /// The axes this combination negates.
    pub fn axes(self) -> MirrorAxes {
        match self {
            Self::X => MirrorAxes::new(true, false, false),
            Self::Y => MirrorAxes::new(false, true, false),
            Self::Z => MirrorAxes::new(false, false, true),
            Self::XY => MirrorAxes::new(true, true, false),
            Self::XZ => MirrorAxes::new(true, false, true),
            Self::YZ => MirrorAxes::new(false, true, true),
            Self::XYZ => MirrorAxes::ALL,
        }
    }

    /// Added to the source seed so mirrored copies get their own noise.
    pub fn seed_offset(self) -> f32 {
        match self {
            Self::X => 1000.0,
            Self::Y => 2000.0,
            Self::Z => 3000.0,
            Self::XY => 4000.0,
            Self::XZ => 5000.0,
            Self::YZ => 6000.0,
            Self::XYZ => 7000.0,
        }
    }

    pub fn is_enabled_by(self, active: MirrorAxes) -> bool {
        let need = self.axes();
        (!need.x || active.x) && (!need.y || active.y) && (!need.z || active.z)
    }

    pub fn reflect(self, v: Vec3) -> Vec3 {
        let axes = self.axes();
        Vec3::new(
            if axes.x { -v.x } else { v.x },
            if axes.y { -v.y } else { v.y },
            if axes.z { -v.z } else { v.z },
        )
    }
}

#[derive(Debug)]
pub struct Sigil {
    anchor: Vec3,
    seed: f32,
    branches: Vec<Branch>,
    noise: NoiseField,
    rng: StdRng,
    disposed: bool,
}

impl Sigil {
    /// Create the primary root along `direction` plus one mirrored root per
    /// active combination. Root positions are relative to `anchor`.
    pub fn new(
        noise: NoiseField,
        anchor: Vec3,
        direction: Vec3,
        seed: f32,
        mirror: MirrorAxes,
        rng: StdRng,
    ) -> Self {
        let mut branches = Vec::with_capacity(8);
        branches.push(create_branch(&noise, Vec3::ZERO, direction, seed, 0));
        for combo in mirror.combinations() {
            let root = create_branch(
                &noise,
                Vec3::ZERO,
                combo.reflect(direction),
                seed + combo.seed_offset(),
                0,
            )
            .with_lineage(None, Some(combo));
            branches.push(root);
        }
        log::info!(
            "Sigil created (seed {:.0}) with {} root branch(es)",
            seed,
            branches.len()
        );
        Self {
            anchor,
            seed,
            branches,
            noise,
            rng,
            disposed: false,
        }
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn seed(&self) -> f32 {
        self.seed
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branches_mut(&mut self) -> &mut [Branch] {
        &mut self.branches
    }

    pub fn primary(&self) -> Option<&Branch> {
        self.branches.first()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn vertex_count(&self) -> usize {
        self.branches.iter().map(|b| b.mesh().vertex_count()).sum()
    }

    pub fn is_fully_grown(&self) -> bool {
        self.branches.iter().all(Branch::is_fully_grown)
    }

    /// Spawn one child (and its mirrors) from a random eligible branch.
    /// Returns how many branches were created; zero when nothing is eligible.
    pub fn spawn_new_branch(&mut self, mirror: MirrorAxes) -> usize {
        let eligible: Vec<usize> = self
            .branches
            .iter()
            .enumerate()
            .filter(|(_, b)| b.depth() < MAX_BRANCH_DEPTH && b.path().len() >= 2)
            .map(|(i, _)| i)
            .collect();
        let Some(&parent_index) = eligible.choose(&mut self.rng) else {
            log::info!("No eligible parent branches; spawn ignored");
            return 0;
        };

        let u = self.rng.gen::<f32>() * (ATTACH_MAX_FRACTION - ATTACH_MIN_FRACTION)
            + ATTACH_MIN_FRACTION;
        let parent = &self.branches[parent_index];
        let (start, direction, child_seed) = self.child_frame(parent, u);
        let child_depth = parent.depth() + 1;
        let parent_seed = parent.seed();
        let parent_depth = parent.depth();

        let child = create_branch(&self.noise, start, direction, child_seed, child_depth)
            .with_lineage(Some(parent_index), None);
        self.branches.push(child);
        let mut created = 1;

        for combo in mirror.combinations() {
            let copy = create_branch(
                &self.noise,
                combo.reflect(start),
                combo.reflect(direction),
                child_seed + combo.seed_offset(),
                child_depth,
            )
            .with_lineage(Some(parent_index), Some(combo));
            self.branches.push(copy);
            created += 1;
        }
        self.branches[parent_index].children_spawned += 1;

        log::info!(
            "Parent (depth {}, id {:.0}) spawned child (depth {}, id {:.0}) with {} mirror(s)",
            parent_depth,
            parent_seed,
            child_depth,
            child_seed,
            created - 1
        );
        created
    }

    /// Attachment point, rotated direction and seed for a child at `u`.
    fn child_frame(&self, parent: &Branch, u: f32) -> (Vec3, Vec3, f32) {
        let noise = &self.noise;
        let seed = parent.seed();
        let depth = parent.depth() as f32;
        let start = parent.curve().point_at(u);
        let tangent = parent.curve().tangent_at(u);

        let along = u * 10.0 + seed;
        let random_dir = Vec3::new(
            noise.noise3(along, depth * 5.0 + 3.0, 0.0) * 2.0 - 1.0,
            noise.noise3(depth * 5.0 + 4.0, along, 0.0) * 2.0 - 1.0,
            noise.noise3(0.0, depth * 5.0 + 5.0, along) * 2.0 - 1.0,
        )
        .normalize_or_zero();

        let mut axis = tangent.cross(random_dir).normalize_or_zero();
        if axis.length_squared() < 0.01 {
            axis = Vec3::Y.cross(tangent).normalize_or_zero();
        }
        if axis.length_squared() < 0.01 {
            axis = Vec3::X;
        }

        // side-branch range: never nearly parallel, never fully reversed
        let angle =
            (noise.noise2(seed + u * 7.0, depth * 12.0) * 0.6 + 0.2) * PI * 1.5 + PI * 0.25;
        let direction = Quat::from_axis_angle(axis, angle) * tangent;
        let child_seed = noise.noise3(start.x, start.y, start.z + seed) * CHILD_SEED_SCALE;
        (start, direction, child_seed)
    }

    /// Advance every branch. True iff any branch wrote new geometry.
    pub fn update(&mut self, speed: &mut GrowthSpeed, input: GrowthInput<'_>) -> bool {
        let mut changed = false;
        for branch in self.branches.iter_mut() {
            changed |= grow_step(branch, speed, input);
        }
        changed
    }

    /// Release every mesh and drop all branches. The sigil stays empty.
    pub fn dispose(&mut self) {
        for branch in self.branches.iter_mut() {
            branch.mesh_mut().release();
        }
        let count = self.branches.len();
        self.branches.clear();
        self.disposed = true;
        log::info!("Sigil (seed {:.0}) disposed {} branch(es)", self.seed, count);
    }
}
