mod cli;
mod config;
mod decode;
mod mic;
mod sink;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use sigil_core::Orchestrator;

use cli::Cli;
use decode::FilePlayer;
use mic::MicCapture;
use sink::LoggingSink;

const SUMMARY_INTERVAL_SEC: f64 = 1.0;

enum Source {
    File(FilePlayer),
    Mic(MicCapture),
    Silent,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let config = config::resolve(&cli)?;
    let fps = config.fps;
    let mut orchestrator = Orchestrator::new(config);

    let mut source = if let Some(path) = cli.input.as_deref() {
        let player = FilePlayer::open(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        orchestrator
            .extractor_mut()
            .connect_file(player.sample_rate() as f32)?;
        log::info!(
            "Playing {} ({:.1}s, looping)",
            path.display(),
            player.duration_secs()
        );
        Source::File(player)
    } else if cli.mic {
        match MicCapture::open() {
            Ok(capture) => match orchestrator
                .extractor_mut()
                .connect_microphone(capture.sample_rate())
            {
                Ok(()) => Source::Mic(capture),
                Err(e) => {
                    log::error!("Could not use the microphone: {e}");
                    Source::Silent
                }
            },
            Err(e) => {
                log::error!("Could not access the microphone: {e}");
                Source::Silent
            }
        }
    } else {
        log::info!("No audio source; growing on idle features");
        Source::Silent
    };

    let delta = 1.0 / fps;
    let frame_duration = Duration::from_secs_f32(delta);
    let mut sink = LoggingSink::default();
    let mut pcm: Vec<f32> = Vec::new();
    let mut next_summary = SUMMARY_INTERVAL_SEC;
    let (mut beats, mut vocals, mut snares) = (0u32, 0u32, 0u32);

    loop {
        let frame_start = Instant::now();

        match &mut source {
            Source::File(player) => {
                let frames = (player.sample_rate() as f32 * delta).round() as usize;
                let (chunk, looped) = player.next_chunk(frames.max(1));
                if looped {
                    orchestrator.extractor_mut().reset_beat_timing();
                }
                orchestrator.extractor_mut().push_samples(chunk);
            }
            Source::Mic(capture) => {
                pcm.clear();
                capture.drain_into(&mut pcm);
                orchestrator.extractor_mut().push_samples(&pcm);
            }
            Source::Silent => {}
        }

        let report = orchestrator.tick(delta);
        beats += report.features.beat as u32;
        vocals += report.features.vocal as u32;
        snares += report.features.snare_hit as u32;

        orchestrator.render_into(&mut sink);
        orchestrator.mark_uploaded();

        let elapsed = orchestrator.elapsed();
        if elapsed >= next_summary {
            sink.log_summary(elapsed, report.features.bpm);
            log::info!(
                "events: {} beat(s), {} vocal(s), {} snare(s); growth speed {:.2}",
                beats,
                vocals,
                snares,
                orchestrator.growth_speed().value()
            );
            next_summary += SUMMARY_INTERVAL_SEC;
        }
        if cli.seconds.is_some_and(|limit| elapsed >= limit) {
            break;
        }

        if let Some(remaining) = frame_duration.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    log::info!(
        "Finished after {:.1}s: {} sigil(s), {} branch(es), {} vertices",
        orchestrator.elapsed(),
        orchestrator.sigils().len(),
        orchestrator.branch_count(),
        orchestrator.vertex_count()
    );
    Ok(())
}
