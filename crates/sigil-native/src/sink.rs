use glam::Vec3;
use sigil_core::{Branch, SceneSink, SceneView};

/// Stand-in renderer: tallies what a GPU front-end would upload and draw.
#[derive(Default)]
pub struct LoggingSink {
    pub frames: u64,
    pub branches: usize,
    pub visible_vertices: usize,
    pub pending_uploads: usize,
    pub upload_bytes: usize,
    pub extent: f32,
    pub last_view: Option<SceneView>,
}

impl SceneSink for LoggingSink {
    fn begin_frame(&mut self, view: &SceneView) {
        self.frames += 1;
        self.branches = 0;
        self.visible_vertices = 0;
        self.pending_uploads = 0;
        self.upload_bytes = 0;
        self.extent = 0.0;
        self.last_view = Some(*view);
    }

    fn submit_branch(&mut self, anchor: Vec3, branch: &Branch) {
        let mesh = branch.mesh();
        self.branches += 1;
        self.visible_vertices += mesh.draw_range().len();
        if mesh.needs_upload() {
            self.pending_uploads += 1;
            self.upload_bytes += mesh.position_bytes().len() + mesh.normal_bytes().len();
        }
        if let Some(bounds) = mesh.bounds() {
            let reach = (anchor + bounds.center).length() + bounds.radius;
            self.extent = self.extent.max(reach);
        }
    }
}

impl LoggingSink {
    pub fn log_summary(&self, elapsed: f64, bpm: f32) {
        let (rotation, background, threshold) = match &self.last_view {
            Some(v) => (v.rotation, v.background.x, v.post_fx.threshold_strength),
            None => (Vec3::ZERO, 0.0, 0.0),
        };
        log::info!(
            "t={:.1}s branches={} vertices={} uploads={} ({} KiB) extent={:.1} bpm={} rot=({:.2}, {:.2}, {:.2}) bg={:.2} threshold={:.2}",
            elapsed,
            self.branches,
            self.visible_vertices,
            self.pending_uploads,
            self.upload_bytes / 1024,
            self.extent,
            bpm,
            rotation.x,
            rotation.y,
            rotation.z,
            background,
            threshold
        );
    }
}
