use crate::constants::{BASS_HZ, MID_HZ, SNARE_HIGH_HZ, SNARE_HZ, TREBLE_HZ, VOCAL_HZ};
use crate::error::AudioSourceError;

/// Inclusive range of spectrum bins covered by one band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BandRange {
    pub start: usize,
    pub end: usize,
}

impl BandRange {
    /// Only the end is clamped to the available bins; a band lying wholly
    /// above nyquist comes out with `start > end` and reads as empty.
    fn from_hz(low_hz: f32, high_hz: f32, hz_per_bin: f32, bin_count: usize) -> Self {
        let last = bin_count.saturating_sub(1);
        Self {
            start: (low_hz / hz_per_bin).floor() as usize,
            end: ((high_hz / hz_per_bin).floor() as usize).min(last),
        }
    }

    /// Average magnitude of the covered bins, normalized by 255. Bins past
    /// the end of `spectrum` are ignored.
    pub fn energy(&self, spectrum: &[u8]) -> f32 {
        if spectrum.is_empty() || self.start > self.end || self.start >= spectrum.len() {
            return 0.0;
        }
        let end = self.end.min(spectrum.len() - 1);
        let bins = &spectrum[self.start..=end];
        let sum: u32 = bins.iter().map(|&b| b as u32).sum();
        sum as f32 / bins.len() as f32 / 255.0
    }

    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bin index tables for every analysed band, derived once per source.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyBands {
    pub sample_rate: f32,
    pub bin_count: usize,
    pub hz_per_bin: f32,
    pub bass: BandRange,
    pub mid: BandRange,
    pub treble: BandRange,
    pub vocal: BandRange,
    pub snare: BandRange,
    pub snare_high: BandRange,
}

impl FrequencyBands {
    pub fn new(sample_rate: f32, bin_count: usize) -> Result<Self, AudioSourceError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(AudioSourceError::InvalidSampleRate(sample_rate));
        }
        if bin_count == 0 {
            return Err(AudioSourceError::EmptySpectrum);
        }
        let nyquist = sample_rate / 2.0;
        let hz_per_bin = nyquist / bin_count as f32;
        let band = |(lo, hi): (f32, f32)| BandRange::from_hz(lo, hi, hz_per_bin, bin_count);

        let bands = Self {
            sample_rate,
            bin_count,
            hz_per_bin,
            bass: band(BASS_HZ),
            mid: band(MID_HZ),
            treble: band(TREBLE_HZ),
            vocal: band(VOCAL_HZ),
            snare: band(SNARE_HZ),
            snare_high: band(SNARE_HIGH_HZ),
        };
        log::info!(
            "Frequency bands: sample_rate={} Hz, {} bins, {:.2} Hz/bin",
            sample_rate,
            bin_count,
            hz_per_bin
        );
        Ok(bands)
    }
}

/// Mean of all bins normalized by 255; zero for an empty snapshot.
pub fn overall_volume(spectrum: &[u8]) -> f32 {
    if spectrum.is_empty() {
        return 0.0;
    }
    let sum: u64 = spectrum.iter().map(|&b| b as u64).sum();
    sum as f32 / spectrum.len() as f32 / 255.0
}
