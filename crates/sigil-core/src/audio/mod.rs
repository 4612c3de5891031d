pub mod analyser;
pub mod bands;
pub mod detect;
pub mod extractor;
pub mod features;

pub use analyser::SpectrumAnalyser;
pub use bands::{overall_volume, BandRange, FrequencyBands};
pub use detect::{EventDetector, TempoTracker};
pub use extractor::{AudioFeatureExtractor, SourceState};
pub use features::AudioFeatureFrame;
