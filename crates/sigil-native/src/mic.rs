use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use sigil_core::AudioSourceError;

// at most this many seconds of audio wait between frames
const MAX_QUEUED_SECONDS: usize = 2;
// initial downmix scratch size; grows if the host delivers larger callbacks
const CALLBACK_SCRATCH: usize = 4096;

/// Live capture from the default input device, downmixed to mono into a
/// lock-free ring buffer the frame loop drains.
pub struct MicCapture {
    _stream: cpal::Stream,
    sample_rate: f32,
    consumer: HeapCons<f32>,
    dropped: Arc<AtomicUsize>,
}

impl MicCapture {
    pub fn open() -> Result<Self, AudioSourceError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioSourceError::NoInputDevice)?;
        let config = device
            .default_input_config()
            .map_err(|e| AudioSourceError::Stream(e.to_string()))?;
        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let capacity = (config.sample_rate().0 as usize * MAX_QUEUED_SECONDS).max(1);
        let ring = HeapRb::<f32>::new(capacity);
        let (producer, consumer) = ring.split();
        let dropped = Arc::new(AtomicUsize::new(0));

        let err_fn = |err: cpal::StreamError| log::error!("microphone stream error: {err}");
        let stream_config: cpal::StreamConfig = config.clone().into();
        let sink = QueueSink {
            producer,
            scratch: Vec::with_capacity(CALLBACK_SCRATCH),
            channels: channels.max(1),
            dropped: Arc::clone(&dropped),
        };
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                build_input::<f32>(&device, &stream_config, sink, |s| s, err_fn)
            }
            cpal::SampleFormat::I16 => build_input::<i16>(
                &device,
                &stream_config,
                sink,
                |s| s as f32 / i16::MAX as f32,
                err_fn,
            ),
            cpal::SampleFormat::U16 => build_input::<u16>(
                &device,
                &stream_config,
                sink,
                |s| (s as f32 - 32768.0) / 32768.0,
                err_fn,
            ),
            other => {
                return Err(AudioSourceError::Unsupported(format!(
                    "input sample format {other:?}"
                )))
            }
        }
        .map_err(|e| AudioSourceError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioSourceError::Stream(e.to_string()))?;
        log::info!(
            "Microphone capture started: {} Hz, {} channel(s)",
            sample_rate,
            channels
        );
        Ok(Self {
            _stream: stream,
            sample_rate,
            consumer,
            dropped,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Move every queued sample into `out`.
    pub fn drain_into(&mut self, out: &mut Vec<f32>) {
        drain(&mut self.consumer, out);
        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            log::warn!("Microphone queue full; dropped {dropped} sample(s)");
        }
    }
}

/// Audio-thread side of the queue.
struct QueueSink {
    producer: HeapProd<f32>,
    scratch: Vec<f32>,
    channels: usize,
    dropped: Arc<AtomicUsize>,
}

impl QueueSink {
    fn push<T: Copy>(&mut self, data: &[T], convert: fn(T) -> f32) {
        downmix(data, self.channels, convert, &mut self.scratch);
        let dropped = enqueue(&mut self.producer, &self.scratch);
        if dropped > 0 {
            self.dropped.fetch_add(dropped, Ordering::Relaxed);
        }
    }
}

/// Average interleaved frames into mono samples, replacing `out`.
fn downmix<T: Copy>(data: &[T], channels: usize, convert: fn(T) -> f32, out: &mut Vec<f32>) {
    out.clear();
    out.extend(
        data.chunks(channels.max(1))
            .map(|frame| frame.iter().map(|&s| convert(s)).sum::<f32>() / frame.len() as f32),
    );
}

/// Push as much of `mono` as fits. Returns the number of samples dropped.
fn enqueue(producer: &mut HeapProd<f32>, mono: &[f32]) -> usize {
    let pushed = producer.push_slice(mono);
    mono.len() - pushed
}

fn drain(consumer: &mut HeapCons<f32>, out: &mut Vec<f32>) {
    out.extend(consumer.pop_iter());
}

fn build_input<T: cpal::SizedSample + 'static>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut sink: QueueSink,
    convert: fn(T) -> f32,
    err_fn: impl FnMut(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, cpal::BuildStreamError> {
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| sink.push(data, convert),
        err_fn,
        None,
    )
}
