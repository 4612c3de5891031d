// Band tables, event detection, tempo estimation and extractor lifecycle.

use rand::prelude::*;
use sigil_core::*;

const SAMPLE_RATE: f32 = 44_100.0;
const BINS: usize = 512;

fn spectrum_with(ranges: &[(usize, usize)]) -> Vec<u8> {
    let mut bins = vec![0u8; BINS];
    for &(start, end) in ranges {
        for b in &mut bins[start..=end] {
            *b = 255;
        }
    }
    bins
}

fn file_extractor() -> AudioFeatureExtractor {
    let mut extractor = AudioFeatureExtractor::new();
    extractor.connect_file(SAMPLE_RATE).expect("valid sample rate");
    extractor
}

#[test]
fn band_indices_follow_bin_width() {
    let bands = FrequencyBands::new(SAMPLE_RATE, BINS).unwrap();
    assert!((bands.hz_per_bin - 43.066_406).abs() < 1e-3);
    assert_eq!(bands.bass, BandRange { start: 0, end: 5 });
    assert_eq!(bands.mid, BandRange { start: 5, end: 46 });
    assert_eq!(bands.treble, BandRange { start: 46, end: 232 });
    assert_eq!(bands.vocal, BandRange { start: 6, end: 69 });
    assert_eq!(bands.snare, BandRange { start: 4, end: 11 });
    assert_eq!(bands.snare_high, BandRange { start: 116, end: 232 });
}

#[test]
fn band_ends_are_clamped_to_available_bins() {
    // 16 kHz audio has an 8 kHz nyquist, below the treble ceiling
    let bands = FrequencyBands::new(16_000.0, 64).unwrap();
    assert_eq!(bands.treble.end, 63);
    assert_eq!(bands.snare_high.end, 63);
    assert!(bands.snare_high.start <= bands.snare_high.end);
}

#[test]
fn bands_above_nyquist_are_empty() {
    // 8 kHz audio: nyquist 4 kHz, so the 5-10 kHz band has no bins
    let bands = FrequencyBands::new(8_000.0, BINS).unwrap();
    assert!(bands.snare_high.is_empty());
    assert_eq!(bands.snare_high.len(), 0);
    assert!(bands.snare_high.start > bands.snare_high.end);
    assert_eq!(bands.snare_high.end, BINS - 1);

    let mut top_bin = vec![0u8; BINS];
    top_bin[BINS - 1] = 255;
    assert_eq!(bands.snare_high.energy(&top_bin), 0.0);
    // treble straddles nyquist and keeps its lower part
    assert!(!bands.treble.is_empty());
    assert_eq!(bands.treble.end, BINS - 1);
}

#[test]
fn out_of_range_band_never_fires_snare() {
    let mut extractor = AudioFeatureExtractor::new();
    extractor.connect_file(8_000.0).unwrap();
    let bins = extractor.bands().unwrap().bin_count;
    let mut top_bin = vec![0u8; bins];
    top_bin[bins - 1] = 255;
    let frame = extractor.analyze_spectrum(&top_bin, 0.0);
    assert_eq!(frame.snare_high, 0.0);
    assert!(!frame.snare_hit);
}

#[test]
fn invalid_layouts_are_rejected() {
    assert!(matches!(
        FrequencyBands::new(0.0, BINS),
        Err(AudioSourceError::InvalidSampleRate(_))
    ));
    assert!(matches!(
        FrequencyBands::new(f32::NAN, BINS),
        Err(AudioSourceError::InvalidSampleRate(_))
    ));
    assert!(matches!(
        FrequencyBands::new(SAMPLE_RATE, 0),
        Err(AudioSourceError::EmptySpectrum)
    ));
}

#[test]
fn energies_stay_in_unit_range() {
    let mut rng = StdRng::seed_from_u64(17);
    let mut extractor = file_extractor();
    for frame in 0..200 {
        let spectrum: Vec<u8> = (0..BINS).map(|_| rng.gen()).collect();
        let f = extractor.analyze_spectrum(&spectrum, frame as f64 / 60.0);
        for v in [f.bass, f.mid, f.treble, f.vocals, f.snare, f.snare_high, f.overall_volume] {
            assert!((0.0..=1.0).contains(&v), "energy {v} out of range");
        }
    }

    let full = vec![255u8; BINS];
    let f = extractor.analyze_spectrum(&full, 10.0);
    assert_eq!(f.bass, 1.0);
    assert_eq!(f.overall_volume, 1.0);
    assert_eq!(overall_volume(&[]), 0.0);
}

#[test]
fn beat_fires_at_most_once_per_cooldown() {
    let mut extractor = file_extractor();
    let loud_bass = spectrum_with(&[(0, 5)]);
    let mut fired = Vec::new();
    for i in 0..60 {
        let now = i as f64 / 60.0;
        if extractor.analyze_spectrum(&loud_bass, now).beat {
            fired.push(now);
        }
    }
    let limit = (1.0f64 / BEAT_COOLDOWN_SEC).floor() as usize + 1;
    assert!(!fired.is_empty());
    assert!(fired.len() <= limit, "{} beats in one second", fired.len());
    for pair in fired.windows(2) {
        assert!(pair[1] - pair[0] > BEAT_COOLDOWN_SEC);
    }
}

#[test]
fn detectors_are_independent() {
    let mut extractor = file_extractor();

    let vocal = extractor.analyze_spectrum(&spectrum_with(&[(6, 69)]), 0.0);
    assert!(vocal.vocal);
    assert!(!vocal.beat && !vocal.snare_hit);

    let snare = extractor.analyze_spectrum(&spectrum_with(&[(4, 11), (116, 232)]), 1.0);
    assert!(snare.snare_hit);
    assert!(!snare.beat && !snare.vocal);
    assert!((snare.combined_snare() - 1.0).abs() < 1e-6);

    let beat = extractor.analyze_spectrum(&spectrum_with(&[(0, 5)]), 2.0);
    assert!(beat.beat);
    assert!(!beat.vocal && !beat.snare_hit);
    assert!(beat.any_event());
}

#[test]
fn threshold_crossing_is_strict() {
    let mut detector = EventDetector::new(0.5, 0.1);
    assert!(!detector.check(0.5, 0.0));
    assert!(detector.check(0.51, 0.0));
    assert!(!detector.check(0.9, 0.1));
    assert!(detector.check(0.9, 0.2001));
    assert_eq!(detector.last_fired(), Some(0.2001));
    detector.reset();
    assert_eq!(detector.last_fired(), None);
}

#[test]
fn tempo_from_four_beats_half_a_second_apart() {
    let mut tempo = TempoTracker::default();
    assert_eq!(tempo.bpm(), DEFAULT_BPM);
    for t in [0.0, 0.5, 1.0] {
        assert_eq!(tempo.record_beat(t), None);
    }
    let bpm = tempo.record_beat(1.5).expect("estimate after four beats");
    assert!((bpm - 120.0).abs() <= 1.0);
}

#[test]
fn tempo_recompute_is_rate_limited() {
    let mut tempo = TempoTracker::default();
    for t in [0.0, 0.5, 1.0, 1.5] {
        tempo.record_beat(t);
    }
    assert_eq!(tempo.record_beat(1.75), None);
    assert_eq!(tempo.record_beat(2.0), None);
    assert_eq!(tempo.bpm(), 120.0);
    // seven beats over 3.6 s
    assert_eq!(tempo.record_beat(3.6), Some(100.0));
}

#[test]
fn tempo_history_is_bounded() {
    let mut tempo = TempoTracker::default();
    for i in 0..40 {
        tempo.record_beat(i as f64);
    }
    assert_eq!(tempo.history_len(), TEMPO_HISTORY_LEN);
    assert_eq!(tempo.bpm(), 60.0);
    tempo.reset();
    assert_eq!(tempo.history_len(), 0);
    assert_eq!(tempo.bpm(), DEFAULT_BPM);
}

#[test]
fn file_source_tracks_tempo_but_microphone_does_not() {
    let beat = spectrum_with(&[(0, 5)]);
    let silence = vec![0u8; BINS];

    let mut file = file_extractor();
    for t in [0.0, 0.4, 0.8, 1.2] {
        assert!(file.analyze_spectrum(&beat, t).beat);
        file.analyze_spectrum(&silence, t + 0.1);
    }
    assert_eq!(file.bpm(), 150.0);

    let mut mic = AudioFeatureExtractor::new();
    mic.connect_microphone(SAMPLE_RATE).unwrap();
    for t in [0.0, 0.4, 0.8, 1.2] {
        assert!(mic.analyze_spectrum(&beat, t).beat);
    }
    assert_eq!(mic.bpm(), DEFAULT_BPM);
}

#[test]
fn idle_extractor_yields_zero_features() {
    let mut extractor = AudioFeatureExtractor::new();
    assert_eq!(extractor.state(), SourceState::Idle);
    let frame = extractor.analyze_spectrum(&vec![255u8; BINS], 1.0);
    assert_eq!(frame, AudioFeatureFrame::idle(DEFAULT_BPM));
    assert!(!frame.any_event());
    assert_eq!(extractor.analyze(2.0), AudioFeatureFrame::idle(DEFAULT_BPM));
}

#[test]
fn empty_snapshot_yields_zero_features() {
    let mut extractor = file_extractor();
    let frame = extractor.analyze_spectrum(&[], 0.0);
    assert_eq!(frame.bass, 0.0);
    assert!(!frame.any_event());
}

#[test]
fn failed_connection_leaves_extractor_idle() {
    let mut extractor = AudioFeatureExtractor::new();
    assert!(extractor.connect_file(-1.0).is_err());
    assert_eq!(extractor.state(), SourceState::Idle);
    assert!(!extractor.is_active());
}

#[test]
fn full_reset_clears_history_and_source() {
    let beat = spectrum_with(&[(0, 5)]);
    let mut extractor = file_extractor();
    for t in [0.0, 0.4, 0.8, 1.2] {
        extractor.analyze_spectrum(&beat, t);
    }
    assert_eq!(extractor.bpm(), 150.0);

    extractor.full_reset();
    assert_eq!(extractor.state(), SourceState::Idle);
    assert_eq!(extractor.bpm(), DEFAULT_BPM);
    assert!(extractor.bands().is_none());

    // reconnecting starts from a clean cooldown
    extractor.connect_file(SAMPLE_RATE).unwrap();
    assert!(extractor.analyze_spectrum(&beat, 1.3).beat);
}

#[test]
fn paused_file_is_idle_but_keeps_tempo() {
    let beat = spectrum_with(&[(0, 5)]);
    let mut extractor = file_extractor();
    for t in [0.0, 0.4, 0.8, 1.2] {
        extractor.analyze_spectrum(&beat, t);
    }
    extractor.set_playing(false);
    assert!(!extractor.is_active());
    let frame = extractor.analyze_spectrum(&beat, 5.0);
    assert_eq!(frame, AudioFeatureFrame::idle(150.0));

    extractor.set_playing(true);
    assert!(extractor.analyze_spectrum(&beat, 6.0).beat);
}

#[test]
fn seeking_clears_the_beat_cooldown() {
    let beat = spectrum_with(&[(0, 5)]);
    let mut extractor = file_extractor();
    assert!(extractor.analyze_spectrum(&beat, 0.0).beat);
    assert!(!extractor.analyze_spectrum(&beat, 0.1).beat);
    extractor.reset_beat_timing();
    assert!(extractor.analyze_spectrum(&beat, 0.15).beat);
}

#[test]
fn mic_gain_is_stored_and_applied() {
    let mut extractor = AudioFeatureExtractor::new();
    extractor.set_mic_gain(2.5);
    assert_eq!(extractor.mic_gain(), 2.5);
    extractor.connect_microphone(SAMPLE_RATE).unwrap();
    assert_eq!(extractor.state(), SourceState::MicConnected);
    assert!(extractor.is_active());
    extractor.set_mic_gain(-1.0);
    assert_eq!(extractor.mic_gain(), 0.0);
}

#[test]
fn analyze_uses_pushed_pcm() {
    let mut extractor = file_extractor();
    // 100 Hz tone lands in the bass band
    let samples: Vec<f32> = (0..4096)
        .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / SAMPLE_RATE).sin())
        .collect();
    extractor.push_samples(&samples);
    let frame = (0..10)
        .map(|i| extractor.analyze(i as f64 / 60.0))
        .last()
        .unwrap();
    assert!(frame.bass > frame.treble);
    assert!(frame.bass > 0.3, "bass {}", frame.bass);
}
