// Byte spectrum produced from PCM: windowing, decibel mapping and smoothing.

use sigil_core::*;

const SAMPLE_RATE: f32 = 44_100.0;

fn sine(freq: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE).sin())
        .collect()
}

fn settle(analyser: &mut SpectrumAnalyser, calls: usize) -> Vec<u8> {
    for _ in 1..calls {
        analyser.frequency_data();
    }
    analyser.frequency_data().to_vec()
}

#[test]
fn rejects_invalid_parameters() {
    assert!(SpectrumAnalyser::new(0.0).is_err());
    assert!(SpectrumAnalyser::new(f32::INFINITY).is_err());
    assert!(SpectrumAnalyser::with_fft_size(SAMPLE_RATE, 1).is_err());
}

#[test]
fn default_layout() {
    let analyser = SpectrumAnalyser::new(SAMPLE_RATE).unwrap();
    assert_eq!(analyser.fft_size(), ANALYSER_FFT_SIZE);
    assert_eq!(analyser.bin_count(), 512);
    assert_eq!(analyser.sample_rate(), SAMPLE_RATE);
    assert_eq!(analyser.gain(), 1.0);
}

#[test]
fn silence_maps_to_zero() {
    let mut analyser = SpectrumAnalyser::new(SAMPLE_RATE).unwrap();
    analyser.push_samples(&vec![0.0; 2048]);
    let bytes = analyser.frequency_data();
    assert_eq!(bytes.len(), 512);
    assert!(bytes.iter().all(|&b| b == 0));
}

#[test]
fn tone_peaks_at_its_bin() {
    let mut analyser = SpectrumAnalyser::new(SAMPLE_RATE).unwrap();
    // bin 20 sits at 20 * 44100 / 1024 Hz
    let freq = 20.0 * SAMPLE_RATE / 1024.0;
    analyser.push_samples(&sine(freq, 2048));
    let bytes = settle(&mut analyser, 20);

    assert!(bytes[20] > 200, "peak byte {}", bytes[20]);
    let loudest = bytes.iter().copied().max().unwrap_or(0);
    assert_eq!(bytes[20], loudest);
    for (bin, &b) in bytes.iter().enumerate() {
        if !(17..=23).contains(&bin) {
            assert!(b < 128, "bin {bin} leaked {b}");
        }
    }
    assert!(bytes[200] < 128);
}

#[test]
fn window_keeps_only_latest_samples() {
    let mut analyser = SpectrumAnalyser::new(SAMPLE_RATE).unwrap();
    analyser.push_samples(&sine(1000.0, 2048));
    assert!(analyser.frequency_data().iter().any(|&b| b > 0));

    analyser.push_samples(&vec![0.0; 1024]);
    // smoothing lets the old tone fade over successive calls
    let bytes = settle(&mut analyser, 60);
    assert!(bytes.iter().all(|&b| b == 0));
}

#[test]
fn zero_gain_silences_input() {
    let mut analyser = SpectrumAnalyser::new(SAMPLE_RATE).unwrap();
    analyser.set_gain(0.0);
    analyser.push_samples(&sine(440.0, 2048));
    assert!(analyser.frequency_data().iter().all(|&b| b == 0));

    analyser.set_gain(-3.0);
    assert_eq!(analyser.gain(), 0.0);
}

#[test]
fn reset_clears_history() {
    let mut analyser = SpectrumAnalyser::new(SAMPLE_RATE).unwrap();
    analyser.push_samples(&sine(440.0, 2048));
    settle(&mut analyser, 5);
    analyser.reset();
    assert!(analyser.frequency_data().iter().all(|&b| b == 0));
}
