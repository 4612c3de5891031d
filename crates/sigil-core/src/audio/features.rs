/// One frame of audio features, recomputed from the current spectrum snapshot.
///
/// Every field is always present; an idle source produces zero energies and
/// no events.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioFeatureFrame {
    /// Band energies, normalized (0.0-1.0)
    pub bass: f32,       // 20-250 Hz
    pub mid: f32,        // 250-2000 Hz
    pub treble: f32,     // 2-10 kHz
    pub vocals: f32,     // 300-3000 Hz
    pub snare: f32,      // 200-500 Hz
    pub snare_high: f32, // 5-10 kHz
    /// Mean of all bins, normalized (0.0-1.0)
    pub overall_volume: f32,
    /// Bass crossed the beat threshold this frame
    pub beat: bool,
    /// Vocal band crossed its threshold this frame
    pub vocal: bool,
    /// Combined snare bands crossed their threshold this frame
    pub snare_hit: bool,
    /// Current tempo estimate in beats per minute
    pub bpm: f32,
}

impl AudioFeatureFrame {
    /// Zero features carrying a tempo estimate.
    pub fn idle(bpm: f32) -> Self {
        Self {
            bpm,
            ..Self::default()
        }
    }

    /// Mean of the low and high snare bands.
    pub fn combined_snare(&self) -> f32 {
        (self.snare + self.snare_high) * 0.5
    }

    pub fn any_event(&self) -> bool {
        self.beat || self.vocal || self.snare_hit
    }
}

