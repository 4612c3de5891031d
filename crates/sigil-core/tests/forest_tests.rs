// Sigil construction, mirroring, spawning and disposal.

use std::collections::HashSet;

use glam::Vec3;
use rand::prelude::*;
use sigil_core::*;

fn make_sigil(mirror: MirrorAxes, rng_seed: u64) -> Sigil {
    Sigil::new(
        NoiseField::default(),
        sigil_anchor_vec3(),
        Vec3::new(0.4, -0.3, 0.8).normalize(),
        250.0,
        mirror,
        StdRng::seed_from_u64(rng_seed),
    )
}

fn seed_bits(sigil: &Sigil) -> HashSet<u32> {
    sigil.branches().iter().map(|b| b.seed().to_bits()).collect()
}

#[test]
fn all_mirror_axes_give_eight_distinct_roots() {
    let sigil = make_sigil(MirrorAxes::ALL, 1);
    assert_eq!(sigil.branches().len(), 8);
    assert!(sigil.branches().iter().all(|b| b.depth() == 0));
    assert_eq!(seed_bits(&sigil).len(), 8);

    let mirrors: Vec<_> = sigil.branches().iter().map(|b| b.mirror()).collect();
    assert_eq!(mirrors[0], None);
    assert_eq!(
        mirrors[1..].to_vec(),
        MirrorCombination::ALL.iter().copied().map(Some).collect::<Vec<_>>()
    );
}

#[test]
fn root_count_follows_active_axes() {
    assert_eq!(make_sigil(MirrorAxes::NONE, 1).branches().len(), 1);
    assert_eq!(make_sigil(MirrorAxes::new(true, false, false), 1).branches().len(), 2);
    assert_eq!(make_sigil(MirrorAxes::new(true, true, false), 1).branches().len(), 4);
    assert_eq!(make_sigil(MirrorAxes::new(false, true, true), 1).branches().len(), 4);
}

#[test]
fn combinations_require_every_named_axis() {
    let xy = MirrorAxes::new(true, true, false).combinations();
    assert_eq!(
        xy.as_slice(),
        &[MirrorCombination::X, MirrorCombination::Y, MirrorCombination::XY]
    );
    assert!(MirrorAxes::NONE.combinations().is_empty());
    assert_eq!(MirrorAxes::ALL.combinations().len(), 7);
}

#[test]
fn seed_offsets_and_reflections() {
    let offsets: Vec<f32> = MirrorCombination::ALL.iter().map(|c| c.seed_offset()).collect();
    assert_eq!(offsets, vec![1000.0, 2000.0, 3000.0, 4000.0, 5000.0, 6000.0, 7000.0]);

    let v = Vec3::new(1.0, 2.0, 3.0);
    assert_eq!(MirrorCombination::X.reflect(v), Vec3::new(-1.0, 2.0, 3.0));
    assert_eq!(MirrorCombination::YZ.reflect(v), Vec3::new(1.0, -2.0, -3.0));
    assert_eq!(MirrorCombination::XYZ.reflect(v), -v);
}

#[test]
fn mirrored_root_seeds_use_offsets() {
    let sigil = make_sigil(MirrorAxes::new(false, false, true), 1);
    assert_eq!(sigil.branches()[0].seed(), 250.0);
    assert_eq!(sigil.branches()[1].seed(), 250.0 + 3000.0);
    assert_eq!(sigil.anchor(), Vec3::new(0.0, 0.0, -10.0));
}

#[test]
fn spawn_creates_child_and_mirrors() {
    let mut sigil = make_sigil(MirrorAxes::new(true, false, false), 3);
    let before = sigil.branches().len();
    let created = sigil.spawn_new_branch(MirrorAxes::new(true, false, false));
    assert_eq!(created, 2);
    assert_eq!(sigil.branches().len(), before + 2);

    let child = &sigil.branches()[before];
    let mirror = &sigil.branches()[before + 1];
    let parent_index = child.parent().expect("child has a parent");
    assert_eq!(mirror.parent(), Some(parent_index));
    assert_eq!(child.mirror(), None);
    assert_eq!(mirror.mirror(), Some(MirrorCombination::X));
    assert_eq!(child.depth(), 1);
    assert_eq!(mirror.depth(), 1);
    assert_eq!(mirror.seed(), child.seed() + 1000.0);
    assert_eq!(sigil.branches()[parent_index].children_spawned(), 1);
}

#[test]
fn spawn_with_all_axes_adds_eight() {
    let mut sigil = make_sigil(MirrorAxes::NONE, 4);
    assert_eq!(sigil.spawn_new_branch(MirrorAxes::ALL), 8);
    assert_eq!(sigil.branches().len(), 9);
}

#[test]
fn child_starts_on_parent_curve_away_from_the_ends() {
    let mut sigil = make_sigil(MirrorAxes::NONE, 5);
    sigil.spawn_new_branch(MirrorAxes::NONE);
    let root = &sigil.branches()[0];
    let child = &sigil.branches()[1];
    let start = child.path()[0];
    // the child's own sway/jitter moves its first point slightly off the curve
    let nearest = (0..=1000)
        .map(|i| root.curve().point_at(i as f32 / 1000.0).distance(start))
        .fold(f32::MAX, f32::min);
    assert!(nearest < 2.0, "child start {start:?} is {nearest} from parent");
    assert!(start.distance(root.path()[0]) > 0.2);
}

#[test]
fn spawning_never_exceeds_max_depth() {
    let mut sigil = make_sigil(MirrorAxes::new(true, false, false), 11);
    for _ in 0..200 {
        sigil.spawn_new_branch(MirrorAxes::new(true, false, false));
    }
    let branches = sigil.branches();
    assert!(branches.iter().all(|b| b.depth() <= MAX_BRANCH_DEPTH));
    assert!(branches.iter().any(|b| b.depth() == MAX_BRANCH_DEPTH));

    for (i, b) in branches.iter().enumerate() {
        match b.parent() {
            None => assert_eq!(b.depth(), 0),
            Some(p) => {
                assert!(p < i);
                assert_eq!(b.depth(), branches[p].depth() + 1);
            }
        }
    }
    let primaries = branches
        .iter()
        .filter(|b| b.parent().is_some() && b.mirror().is_none())
        .count();
    let spawned: u32 = branches.iter().map(|b| b.children_spawned()).sum();
    assert_eq!(spawned as usize, primaries);
}

#[test]
fn spawn_sequence_is_reproducible_from_rng_seed() {
    let mut a = make_sigil(MirrorAxes::NONE, 99);
    let mut b = make_sigil(MirrorAxes::NONE, 99);
    for _ in 0..10 {
        a.spawn_new_branch(MirrorAxes::NONE);
        b.spawn_new_branch(MirrorAxes::NONE);
    }
    let seeds_a: Vec<f32> = a.branches().iter().map(|x| x.seed()).collect();
    let seeds_b: Vec<f32> = b.branches().iter().map(|x| x.seed()).collect();
    assert_eq!(seeds_a, seeds_b);
}

#[test]
fn update_reports_new_geometry_until_grown() {
    let mut sigil = make_sigil(MirrorAxes::ALL, 2);
    let mut speed = GrowthSpeed::default();
    let features = AudioFeatureFrame::default();
    let input = GrowthInput {
        delta: 0.1,
        is_interacting: false,
        features: &features,
        blend: ColorBlend::PerFrame,
    };
    assert!(sigil.update(&mut speed, input));
    assert!(sigil.vertex_count() > 0);

    let mut frames = 0;
    while sigil.update(&mut speed, input) {
        frames += 1;
        assert!(frames < 1000);
    }
    assert!(sigil.is_fully_grown());
    assert_eq!(sigil.vertex_count(), 8 * MAX_VERTICES_PER_BRANCH);
    assert!(!sigil.update(&mut speed, input));
}

#[test]
fn dispose_releases_everything() {
    let mut sigil = make_sigil(MirrorAxes::ALL, 6);
    sigil.spawn_new_branch(MirrorAxes::ALL);
    sigil.dispose();
    assert!(sigil.is_disposed());
    assert!(sigil.branches().is_empty());
    assert_eq!(sigil.vertex_count(), 0);
    // nothing left to spawn from
    assert_eq!(sigil.spawn_new_branch(MirrorAxes::ALL), 0);
    assert!(sigil.branches().is_empty());
}
