use std::collections::VecDeque;

use crate::constants::{DEFAULT_BPM, TEMPO_HISTORY_LEN, TEMPO_MIN_BEATS, TEMPO_RECOMPUTE_SEC};

/// Edge-triggered threshold crossing with a cooldown.
#[derive(Clone, Debug)]
pub struct EventDetector {
    threshold: f32,
    cooldown_sec: f64,
    last_fired: Option<f64>,
}

impl EventDetector {
    pub fn new(threshold: f32, cooldown_sec: f64) -> Self {
        Self {
            threshold,
            cooldown_sec,
            last_fired: None,
        }
    }

    /// Returns true when `level` exceeds the threshold and more than the
    /// cooldown has passed since the previous firing.
    pub fn check(&mut self, level: f32, now: f64) -> bool {
        if level <= self.threshold {
            return false;
        }
        let ready = self
            .last_fired
            .map_or(true, |last| now - last > self.cooldown_sec);
        if ready {
            self.last_fired = Some(now);
        }
        ready
    }

    pub fn last_fired(&self) -> Option<f64> {
        self.last_fired
    }

    pub fn reset(&mut self) {
        self.last_fired = None;
    }
}

/// Tempo estimate from a bounded history of beat timestamps.
#[derive(Clone, Debug)]
pub struct TempoTracker {
    history: VecDeque<f64>,
    bpm: f32,
    last_estimate: Option<f64>,
}

impl Default for TempoTracker {
    fn default() -> Self {
        Self {
            history: VecDeque::with_capacity(TEMPO_HISTORY_LEN + 1),
            bpm: DEFAULT_BPM,
            last_estimate: None,
        }
    }
}

impl TempoTracker {
    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Record a beat; returns the new estimate when one was recomputed.
    pub fn record_beat(&mut self, now: f64) -> Option<f32> {
        self.history.push_back(now);
        while self.history.len() > TEMPO_HISTORY_LEN {
            self.history.pop_front();
        }

        if self.history.len() < TEMPO_MIN_BEATS {
            return None;
        }
        if let Some(last) = self.last_estimate {
            if now - last <= TEMPO_RECOMPUTE_SEC {
                return None;
            }
        }

        let (first, last) = match (self.history.front(), self.history.back()) {
            (Some(&f), Some(&l)) => (f, l),
            _ => return None,
        };
        let mean_interval = (last - first) / (self.history.len() - 1) as f64;
        if mean_interval <= 0.0 {
            return None;
        }
        self.bpm = (60.0 / mean_interval).round() as f32;
        self.last_estimate = Some(now);
        log::info!(
            "Tempo estimate: {} bpm (from {} beats)",
            self.bpm,
            self.history.len()
        );
        Some(self.bpm)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
