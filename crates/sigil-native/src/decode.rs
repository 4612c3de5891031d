use std::path::Path;

use sigil_core::AudioSourceError;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// A fully decoded track, downmixed to mono, played back in frame-sized
/// chunks and looped at the end.
pub struct FilePlayer {
    samples: Vec<f32>,
    sample_rate: u32,
    cursor: usize,
}

impl FilePlayer {
    pub fn open(path: &Path) -> Result<Self, AudioSourceError> {
        let (samples, sample_rate) = decode_mono(path)?;
        Ok(Self {
            samples,
            sample_rate,
            cursor: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Next `frames` samples. The flag is true when playback wrapped to the
    /// start during this chunk.
    pub fn next_chunk(&mut self, frames: usize) -> (&[f32], bool) {
        if self.samples.is_empty() {
            return (&[], false);
        }
        let mut looped = false;
        if self.cursor >= self.samples.len() {
            self.cursor = 0;
            looped = true;
        }
        let start = self.cursor;
        let end = (start + frames).min(self.samples.len());
        self.cursor = end;
        (&self.samples[start..end], looped)
    }
}

fn decode_error(what: &str, err: impl std::fmt::Display) -> AudioSourceError {
    AudioSourceError::Decode(format!("{what}: {err}"))
}

fn decode_mono(path: &Path) -> Result<(Vec<f32>, u32), AudioSourceError> {
    let file = std::fs::File::open(path)
        .map_err(|e| decode_error(&format!("failed to open {}", path.display()), e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_error("failed to probe audio format", e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioSourceError::Decode("no audio tracks found".into()))?;
    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count()).max(1);
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioSourceError::Decode("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error("failed to create audio decoder", e))?;

    let mut mono: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(decode_error("failed to read audio packet", e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(decode_error("failed to decode audio packet", e)),
        };

        let spec = *decoded.spec();
        let mut buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        mono.extend(
            buf.samples()
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
        );
    }

    log::info!(
        "Decoded {}: {} samples, {} Hz, {:.1}s",
        path.display(),
        mono.len(),
        sample_rate,
        mono.len() as f32 / sample_rate as f32
    );
    Ok((mono, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_decode_error() {
        let path = std::env::temp_dir().join("cybersigil-no-such-file.wav");
        let err = FilePlayer::open(&path).err();
        assert!(matches!(err, Some(AudioSourceError::Decode(_))));
    }

    #[test]
    fn unrecognised_bytes_are_a_decode_error() {
        let name = format!("cybersigil-garbage-{}.bin", std::process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, b"definitely not audio").unwrap();
        let err = FilePlayer::open(&path).err();
        std::fs::remove_file(&path).ok();
        match err {
            Some(AudioSourceError::Decode(msg)) => assert!(msg.contains("probe"), "{msg}"),
            other => panic!("expected a decode error, got {other:?}"),
        }
    }

    #[test]
    fn playback_loops_in_chunks() {
        let mut player = FilePlayer {
            samples: vec![0.1, 0.2, 0.3],
            sample_rate: 3,
            cursor: 0,
        };
        assert_eq!(player.duration_secs(), 1.0);
        assert_eq!(player.next_chunk(2), (&[0.1f32, 0.2][..], false));
        assert_eq!(player.next_chunk(2), (&[0.3f32][..], false));
        assert_eq!(player.next_chunk(2), (&[0.1f32, 0.2][..], true));
    }
}
