//! PCM to byte-spectrum conversion with the behaviour of a browser analyser
//! node: Blackman window, `|X|/N` magnitudes, temporal smoothing and a
//! decibel window mapped onto 0-255.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::constants::{ANALYSER_FFT_SIZE, ANALYSER_MAX_DB, ANALYSER_MIN_DB, ANALYSER_SMOOTHING};
use crate::error::AudioSourceError;

pub struct SpectrumAnalyser {
    sample_rate: f32,
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    // circular buffer holding the most recent fft_size samples
    input: Vec<f32>,
    write_pos: usize,
    fft_buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
    gain: f32,
}

impl std::fmt::Debug for SpectrumAnalyser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyser")
            .field("sample_rate", &self.sample_rate)
            .field("fft_size", &self.fft_size)
            .field("gain", &self.gain)
            .finish()
    }
}

impl SpectrumAnalyser {
    pub fn new(sample_rate: f32) -> Result<Self, AudioSourceError> {
        Self::with_fft_size(sample_rate, ANALYSER_FFT_SIZE)
    }

    pub fn with_fft_size(sample_rate: f32, fft_size: usize) -> Result<Self, AudioSourceError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(AudioSourceError::InvalidSampleRate(sample_rate));
        }
        if fft_size < 2 {
            return Err(AudioSourceError::EmptySpectrum);
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();
        let window = blackman_window(fft_size);
        let bin_count = fft_size / 2;

        log::info!(
            "SpectrumAnalyser created: sample_rate={}, fft_size={}, bins={}",
            sample_rate,
            fft_size,
            bin_count
        );

        Ok(Self {
            sample_rate,
            fft_size,
            fft,
            window,
            input: vec![0.0; fft_size],
            write_pos: 0,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            smoothed: vec![0.0; bin_count],
            bytes: vec![0; bin_count],
            gain: 1.0,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Linear gain applied to incoming samples.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Append mono samples; only the latest `fft_size` are kept.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let skip = samples.len().saturating_sub(self.fft_size);
        for &s in &samples[skip..] {
            self.input[self.write_pos] = s * self.gain;
            self.write_pos = (self.write_pos + 1) % self.fft_size;
        }
    }

    /// Transform the current window and return the byte spectrum. Each call
    /// advances the temporal smoothing by one step.
    pub fn frequency_data(&mut self) -> &[u8] {
        let n = self.fft_size;
        for i in 0..n {
            let s = self.input[(self.write_pos + i) % n];
            self.fft_buffer[i] = Complex::new(s * self.window[i], 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch);

        let scale = 1.0 / n as f32;
        let db_range = ANALYSER_MAX_DB - ANALYSER_MIN_DB;
        for (k, (smoothed, byte)) in self
            .smoothed
            .iter_mut()
            .zip(self.bytes.iter_mut())
            .enumerate()
        {
            let magnitude = self.fft_buffer[k].norm() * scale;
            let mut value = ANALYSER_SMOOTHING * *smoothed + (1.0 - ANALYSER_SMOOTHING) * magnitude;
            if !value.is_finite() {
                value = 0.0;
            }
            *smoothed = value;

            let db = if value > 0.0 {
                20.0 * value.log10()
            } else {
                f32::NEG_INFINITY
            };
            let scaled = 255.0 * (db - ANALYSER_MIN_DB) / db_range;
            *byte = scaled.floor().clamp(0.0, 255.0) as u8;
        }
        &self.bytes
    }

    pub fn reset(&mut self) {
        self.input.fill(0.0);
        self.write_pos = 0;
        self.smoothed.fill(0.0);
        self.bytes.fill(0);
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos()
        })
        .collect()
}
