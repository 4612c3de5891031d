use thiserror::Error;

/// Failures while acquiring or describing an audio source.
///
/// None of these reach the per-frame path: the extractor stays idle and keeps
/// producing zero features.
#[derive(Debug, Error)]
pub enum AudioSourceError {
    #[error("invalid sample rate {0} Hz")]
    InvalidSampleRate(f32),
    #[error("spectrum must have at least one frequency bin")]
    EmptySpectrum,
    #[error("no audio input device available")]
    NoInputDevice,
    #[error("microphone stream could not be opened: {0}")]
    Stream(String),
    #[error("audio file could not be decoded: {0}")]
    Decode(String),
    #[error("unsupported audio input: {0}")]
    Unsupported(String),
}
