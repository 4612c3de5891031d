use glam::Vec3;

// Shared growth/audio tuning constants used by the core and the native frontend.

// Branch paths
pub const POINTS_PER_BRANCH: usize = 150; // path segments per branch (N); the path holds N + 1 points
pub const MAX_BRANCH_DEPTH: u32 = 4; // children are never spawned deeper than this
pub const ROOT_BRANCH_LENGTH: f32 = 15.0; // world units, depth 0
pub const MIN_BRANCH_LENGTH: f32 = 3.0; // floor for deep children
pub const BRANCH_LENGTH_DEPTH_FALLOFF: f32 = 1.5; // length = ROOT / (depth * falloff)

// Macro shape (sway/bend) and fine positional jitter
pub const SWAY_AMPLITUDE: f32 = 1.5;
pub const SWAY_FREQUENCY: f32 = 2.0; // noise cycles along the path domain
pub const BEND_NOISE_OFFSET: f32 = 20.0; // decorrelates bend from sway
pub const BEND_SEED_OFFSET: f32 = -10.0;
pub const NOISE_DISPLACEMENT_STRENGTH: f32 = 0.02;
pub const NOISE_DISPLACEMENT_SCALE: f32 = 0.4;

// Tube cross-sections
pub const TUBE_SIDES: usize = 6;
pub const TUBE_BASE_RADIUS: f32 = 0.25;
pub const TUBE_TAPER_POWER: f32 = 1.5;
pub const TUBE_DEPTH_SCALE_FACTOR: f32 = 0.75;
pub const VERTICES_PER_QUAD: usize = 6; // two flat-shaded triangles
pub const MAX_VERTICES_PER_BRANCH: usize = POINTS_PER_BRANCH * TUBE_SIDES * VERTICES_PER_QUAD;

// Growth speed (world units per second), shared by every growing branch
pub const DEFAULT_GROWTH_SPEED: f32 = 8.0;
pub const MIN_GROWTH_SPEED: f32 = 2.0;
pub const MAX_GROWTH_SPEED: f32 = 20.0;
pub const GROWTH_MID_GAIN: f32 = 1.5;
pub const GROWTH_VOLUME_GAIN: f32 = 0.5;
pub const INTERACTION_GROWTH_DAMPING: f32 = 0.2; // growth slows while the view is being dragged

// Branch material
pub const BRANCH_METALNESS: f32 = 0.8;
pub const BRANCH_ROUGHNESS: f32 = 0.25;
pub const BASE_EMISSIVE_INTENSITY: f32 = 0.7;
pub const EMISSIVE_INTENSITY_MIN: f32 = 0.3;
pub const EMISSIVE_INTENSITY_MAX: f32 = 1.8;
pub const COLOR_BLEND_PER_FRAME: f32 = 0.2;
pub const EMISSIVE_BLEND_PER_FRAME: f32 = 0.25;
pub const BLEND_REFERENCE_FPS: f32 = 60.0; // time-scaled blending matches the per-frame factors here

// Audio -> color gains
pub const COLOR_GAIN_BASS: f32 = 3.0;
pub const COLOR_GAIN_MID: f32 = 2.5;
pub const COLOR_GAIN_TREBLE: f32 = 3.5;
pub const EMISSIVE_GAIN_TREBLE: f32 = 2.5;
pub const EMISSIVE_GAIN_MID: f32 = 1.5;
pub const EMISSIVE_GAIN_BASS: f32 = 1.0;
pub const BRIGHTNESS_VOLUME_GAIN: f32 = 1.5;
pub const BRIGHTNESS_MIN: f32 = 0.1;
pub const EMISSIVE_PULSE_GAIN: f32 = 1.0;

// Spawning
pub const ATTACH_MIN_FRACTION: f32 = 0.1; // never at the very root
pub const ATTACH_MAX_FRACTION: f32 = 0.9; // never at the very tip
pub const CHILD_SEED_SCALE: f32 = 1000.0;

// Frame references used by side-vector derivation
pub const WORLD_UP: Vec3 = Vec3::Y;
pub const WORLD_RIGHT: Vec3 = Vec3::X;
pub const FALLBACK_SIDE: Vec3 = Vec3::X;

// Audio bands (Hz)
pub const BASS_HZ: (f32, f32) = (20.0, 250.0);
pub const MID_HZ: (f32, f32) = (250.0, 2000.0);
pub const TREBLE_HZ: (f32, f32) = (2000.0, 10000.0);
pub const VOCAL_HZ: (f32, f32) = (300.0, 3000.0);
pub const SNARE_HZ: (f32, f32) = (200.0, 500.0);
pub const SNARE_HIGH_HZ: (f32, f32) = (5000.0, 10000.0);

// Event detectors: threshold on normalized energy, cooldown in seconds
pub const BEAT_THRESHOLD: f32 = 0.88;
pub const BEAT_COOLDOWN_SEC: f64 = 0.3;
pub const VOCAL_THRESHOLD: f32 = 0.45;
pub const VOCAL_COOLDOWN_SEC: f64 = 0.4;
pub const SNARE_THRESHOLD: f32 = 0.70;
pub const SNARE_COOLDOWN_SEC: f64 = 0.2;

// Tempo estimation
pub const TEMPO_HISTORY_LEN: usize = 16;
pub const TEMPO_MIN_BEATS: usize = 4;
pub const TEMPO_RECOMPUTE_SEC: f64 = 2.0;
pub const DEFAULT_BPM: f32 = 120.0;

// Spectrum analyser (matches a browser analyser node configured for the visual)
pub const ANALYSER_FFT_SIZE: usize = 1024;
pub const ANALYSER_SMOOTHING: f32 = 0.75;
pub const ANALYSER_MIN_DB: f32 = -100.0;
pub const ANALYSER_MAX_DB: f32 = -30.0;

// Scene layout
pub const SIGIL_ANCHOR: [f32; 3] = [0.0, 0.0, -10.0];
pub const AUTO_RESET_AFTER_SEC: f64 = 3.0; // create a sigil if none exists by then

// Scene rotation
pub const ROTATION_INITIAL_SPAN: f32 = 0.2; // speeds start in +-span/2
pub const ROTATION_BEAT_SPAN: f32 = 0.3; // new beat targets in +-span/2
pub const ROTATION_RETARGET_SEC: f64 = 1.5;
pub const ROTATION_SPEED_LERP: f32 = 1.2;
pub const ROTATION_RAMP_SPEED: f32 = 1.8;

// Background flash
pub const FLASH_GREY: f32 = 0.7;
pub const FLASH_HOLD_SEC: f32 = 0.08;
pub const FLASH_DECAY_SPEED: f32 = 8.0;

// Post-processing reactions
pub const SNARE_NOISE_BOOST: f32 = 0.15;
pub const SNARE_BLOOM_BOOST: f32 = 0.8;
pub const VOCAL_THRESHOLD_GAIN: f32 = 0.25;
pub const VOCAL_THRESHOLD_BIAS: f32 = 0.125;
pub const NOISE_TIME_RATE: f32 = 5.0;
pub const THRESHOLD_STRENGTH_MIN: f32 = 0.1;
pub const THRESHOLD_STRENGTH_MAX: f32 = 0.9;

// Compositor base levels (user-adjustable in the front-end)
pub const DEFAULT_NOISE_AMOUNT: f32 = 0.1;
pub const DEFAULT_BLOOM_STRENGTH: f32 = 1.5;
pub const DEFAULT_BLOOM_RADIUS: f32 = 0.4;
pub const DEFAULT_BLOOM_THRESHOLD: f32 = 0.85;
pub const DEFAULT_THRESHOLD_STRENGTH: f32 = 0.5;

// Front-end defaults
pub const DEFAULT_MIC_GAIN: f32 = 1.0;
pub const DEFAULT_FPS: f32 = 60.0;
pub const ROOT_SEED_RANGE: f32 = 1000.0; // root seeds are drawn from [0, range)

#[inline]
pub fn sigil_anchor_vec3() -> Vec3 {
    Vec3::from(SIGIL_ANCHOR)
}
