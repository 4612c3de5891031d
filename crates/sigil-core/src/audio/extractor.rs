use crate::audio::analyser::SpectrumAnalyser;
use crate::audio::bands::{overall_volume, FrequencyBands};
use crate::audio::detect::{EventDetector, TempoTracker};
use crate::audio::features::AudioFeatureFrame;
use crate::constants::{
    BEAT_COOLDOWN_SEC, BEAT_THRESHOLD, SNARE_COOLDOWN_SEC, SNARE_THRESHOLD, VOCAL_COOLDOWN_SEC,
    VOCAL_THRESHOLD,
};
use crate::error::AudioSourceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceState {
    Idle,
    FileConnected,
    MicConnected,
}

/// Turns the active source's spectrum into one feature frame per tick.
///
/// With no source (or a paused file) every frame is zero apart from the
/// tempo estimate, which survives until the next full reset.
#[derive(Debug)]
pub struct AudioFeatureExtractor {
    state: SourceState,
    analyser: Option<SpectrumAnalyser>,
    bands: Option<FrequencyBands>,
    beat: EventDetector,
    vocal: EventDetector,
    snare: EventDetector,
    tempo: TempoTracker,
    playing: bool,
    mic_gain: f32,
    spectrum: Vec<u8>,
}

impl Default for AudioFeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioFeatureExtractor {
    pub fn new() -> Self {
        Self {
            state: SourceState::Idle,
            analyser: None,
            bands: None,
            beat: EventDetector::new(BEAT_THRESHOLD, BEAT_COOLDOWN_SEC),
            vocal: EventDetector::new(VOCAL_THRESHOLD, VOCAL_COOLDOWN_SEC),
            snare: EventDetector::new(SNARE_THRESHOLD, SNARE_COOLDOWN_SEC),
            tempo: TempoTracker::default(),
            playing: false,
            mic_gain: 1.0,
            spectrum: Vec::new(),
        }
    }

    pub fn state(&self) -> SourceState {
        self.state
    }

    pub fn bpm(&self) -> f32 {
        self.tempo.bpm()
    }

    pub fn bands(&self) -> Option<&FrequencyBands> {
        self.bands.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn mic_gain(&self) -> f32 {
        self.mic_gain
    }

    /// True while a source is connected and producing audio.
    pub fn is_active(&self) -> bool {
        match self.state {
            SourceState::Idle => false,
            SourceState::FileConnected => self.playing,
            SourceState::MicConnected => true,
        }
    }

    /// Attach a decoded file source. Playback starts immediately.
    pub fn connect_file(&mut self, sample_rate: f32) -> Result<(), AudioSourceError> {
        self.connect(sample_rate, SourceState::FileConnected, 1.0)
    }

    pub fn connect_microphone(&mut self, sample_rate: f32) -> Result<(), AudioSourceError> {
        self.connect(sample_rate, SourceState::MicConnected, self.mic_gain)
    }

    fn connect(
        &mut self,
        sample_rate: f32,
        state: SourceState,
        gain: f32,
    ) -> Result<(), AudioSourceError> {
        self.full_reset();
        let mut analyser = SpectrumAnalyser::new(sample_rate)?;
        analyser.set_gain(gain);
        let bands = FrequencyBands::new(sample_rate, analyser.bin_count())?;
        self.spectrum = vec![0; analyser.bin_count()];
        self.analyser = Some(analyser);
        self.bands = Some(bands);
        self.state = state;
        self.playing = true;
        log::info!("Audio source connected: {:?} at {} Hz", state, sample_rate);
        Ok(())
    }

    /// Close the analysis graph and clear every timer and the beat history.
    pub fn full_reset(&mut self) {
        if self.state != SourceState::Idle {
            log::info!("Audio source {:?} disconnected", self.state);
        }
        self.state = SourceState::Idle;
        self.analyser = None;
        self.bands = None;
        self.beat.reset();
        self.vocal.reset();
        self.snare.reset();
        self.tempo.reset();
        self.playing = false;
        self.spectrum.clear();
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// Clear the beat cooldown, e.g. after a seek or when a file loops.
    pub fn reset_beat_timing(&mut self) {
        self.beat.reset();
    }

    pub fn set_mic_gain(&mut self, gain: f32) {
        self.mic_gain = gain.max(0.0);
        if self.state == SourceState::MicConnected {
            if let Some(analyser) = self.analyser.as_mut() {
                analyser.set_gain(self.mic_gain);
            }
        }
    }

    /// Feed mono PCM from the active source. Ignored while idle.
    pub fn push_samples(&mut self, samples: &[f32]) {
        if let Some(analyser) = self.analyser.as_mut() {
            analyser.push_samples(samples);
        }
    }

    /// Analyse the analyser's current window.
    pub fn analyze(&mut self, now: f64) -> AudioFeatureFrame {
        if !self.is_active() {
            return AudioFeatureFrame::idle(self.tempo.bpm());
        }
        let Some(analyser) = self.analyser.as_mut() else {
            return AudioFeatureFrame::idle(self.tempo.bpm());
        };
        let mut spectrum = std::mem::take(&mut self.spectrum);
        spectrum.clear();
        spectrum.extend_from_slice(analyser.frequency_data());
        let frame = self.analyze_spectrum(&spectrum, now);
        self.spectrum = spectrum;
        frame
    }

    /// Analyse an externally captured byte spectrum (0-255 per bin).
    pub fn analyze_spectrum(&mut self, spectrum: &[u8], now: f64) -> AudioFeatureFrame {
        let bands = match (&self.bands, self.is_active()) {
            (Some(bands), true) if !spectrum.is_empty() => bands,
            _ => return AudioFeatureFrame::idle(self.tempo.bpm()),
        };

        let mut frame = AudioFeatureFrame {
            bass: bands.bass.energy(spectrum),
            mid: bands.mid.energy(spectrum),
            treble: bands.treble.energy(spectrum),
            vocals: bands.vocal.energy(spectrum),
            snare: bands.snare.energy(spectrum),
            snare_high: bands.snare_high.energy(spectrum),
            overall_volume: overall_volume(spectrum),
            ..AudioFeatureFrame::default()
        };

        frame.beat = self.beat.check(frame.bass, now);
        if frame.beat && self.state == SourceState::FileConnected {
            self.tempo.record_beat(now);
        }
        frame.vocal = self.vocal.check(frame.vocals, now);
        frame.snare_hit = self.snare.check(frame.combined_snare(), now);
        frame.bpm = self.tempo.bpm();

        log::debug!(
            "bass={:.2} mid={:.2} treble={:.2} vol={:.2} beat={} vocal={} snare={}",
            frame.bass,
            frame.mid,
            frame.treble,
            frame.overall_volume,
            frame.beat,
            frame.vocal,
            frame.snare_hit
        );
        frame
    }
}
