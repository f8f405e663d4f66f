//! Spectrum analyser producing normalized bass/mid/treble energies.
//!
//! Mirrors a browser analyser node: Hann-windowed FFT magnitudes, smoothed
//! over time, converted to dB and mapped linearly from `[min_db, max_db]`
//! onto `[0, 1]`.

use std::ops::RangeInclusive;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex32};
use serde::{Deserialize, Serialize};

use crate::core::signals::AudioBands;

/// Floor applied before taking log10 of a magnitude.
const EPS_AMP: f32 = 1e-10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "AudioConfig::default_fft_size")]
    pub fft_size: usize,
    /// Time smoothing of bin magnitudes, `0` = none.
    #[serde(default = "AudioConfig::default_smoothing")]
    pub smoothing: f32,
    #[serde(default = "AudioConfig::default_min_db")]
    pub min_db: f32,
    #[serde(default = "AudioConfig::default_max_db")]
    pub max_db: f32,
    #[serde(default = "AudioConfig::default_bass_max_hz")]
    pub bass_max_hz: f32,
    #[serde(default = "AudioConfig::default_mid_max_hz")]
    pub mid_max_hz: f32,
}

impl AudioConfig {
    fn default_fft_size() -> usize {
        2048
    }
    fn default_smoothing() -> f32 {
        0.8
    }
    fn default_min_db() -> f32 {
        -100.0
    }
    fn default_max_db() -> f32 {
        -30.0
    }
    fn default_bass_max_hz() -> f32 {
        250.0
    }
    fn default_mid_max_hz() -> f32 {
        2000.0
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fft_size: Self::default_fft_size(),
            smoothing: Self::default_smoothing(),
            min_db: Self::default_min_db(),
            max_db: Self::default_max_db(),
            bass_max_hz: Self::default_bass_max_hz(),
            mid_max_hz: Self::default_mid_max_hz(),
        }
    }
}

/// Periodic Hann window (FFT analysis).
fn hann_window_periodic(n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let two_pi = std::f32::consts::PI * 2.0;
            let n_f = n as f32;
            (0..n)
                .map(|i| 0.5 * (1.0 - (two_pi * i as f32 / n_f).cos()))
                .collect()
        }
    }
}

/// Convert amplitude ratio to dB (20*log10).
fn amp_to_db(a: f32) -> f32 {
    20.0 * a.max(EPS_AMP).log10()
}

pub struct BandAnalyzer {
    config: AudioConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buf: Vec<Complex32>,
    smoothed: Vec<f32>,
    bass: RangeInclusive<usize>,
    mid: RangeInclusive<usize>,
    treble: RangeInclusive<usize>,
}

impl BandAnalyzer {
    pub fn new(fs: f32, config: AudioConfig) -> Self {
        let n = config.fft_size.max(2).next_power_of_two();
        let fft = FftPlanner::<f32>::new().plan_fft_forward(n);
        let half = n / 2;
        let bin_hz = fs / n as f32;
        // Highest bin whose center frequency is <= hz.
        let bin_at = |hz: f32| ((hz / bin_hz).floor().max(0.0) as usize).min(half);
        let bass_hi = bin_at(config.bass_max_hz);
        let mid_hi = bin_at(config.mid_max_hz).max(bass_hi);
        Self {
            fft,
            window: hann_window_periodic(n),
            buf: vec![Complex32::new(0.0, 0.0); n],
            smoothed: vec![0.0; half + 1],
            bass: 1..=bass_hi,
            mid: bass_hi + 1..=mid_hi,
            treble: mid_hi + 1..=half,
            config: AudioConfig {
                fft_size: n,
                ..config
            },
        }
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    /// Analyses the most recent `fft_size` samples of `block` (zero-padded
    /// on the left when shorter).
    pub fn analyze(&mut self, block: &[f32]) -> AudioBands {
        let n = self.config.fft_size;
        let take = block.len().min(n);
        let pad = n - take;
        let tail = &block[block.len() - take..];

        for (i, c) in self.buf.iter_mut().enumerate() {
            let s = if i < pad { 0.0 } else { tail[i - pad] };
            let s = if s.is_finite() { s } else { 0.0 };
            *c = Complex32::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buf);

        let tau = self.config.smoothing.clamp(0.0, 1.0);
        let norm = 1.0 / n as f32;
        for (k, sm) in self.smoothed.iter_mut().enumerate() {
            let mag = self.buf[k].norm() * norm;
            *sm = tau * *sm + (1.0 - tau) * mag;
        }

        let AudioConfig { min_db, max_db, .. } = self.config;
        let span = (max_db - min_db).max(f32::EPSILON);
        let level = |k: usize| ((amp_to_db(self.smoothed[k]) - min_db) / span).clamp(0.0, 1.0);
        let mean = |r: &RangeInclusive<usize>| {
            if r.is_empty() {
                return 0.0;
            }
            let len = r.end() - r.start() + 1;
            r.clone().map(&level).sum::<f32>() / len as f32
        };

        AudioBands {
            bass: mean(&self.bass),
            mid: mean(&self.mid),
            treble: mean(&self.treble),
            average: mean(&(1..=self.smoothed.len() - 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f32::consts::TAU;

    fn sine(freq: f32, fs: f32, n: usize, amp: f32) -> Vec<f32> {
        (0..n)
            .map(|i| amp * (TAU * freq * i as f32 / fs).sin())
            .collect()
    }

    #[test]
    fn silence_reads_as_zero() {
        let mut a = BandAnalyzer::new(48_000.0, AudioConfig::default());
        assert_eq!(a.analyze(&vec![0.0; 2048]), AudioBands::SILENT);
        assert_eq!(a.analyze(&[]), AudioBands::SILENT);
    }

    #[test]
    fn low_tone_lands_in_bass() {
        let fs = 48_000.0;
        let mut a = BandAnalyzer::new(fs, AudioConfig::default());
        let block = sine(100.0, fs, 2048, 0.8);
        let mut bands = AudioBands::SILENT;
        for _ in 0..10 {
            bands = a.analyze(&block);
        }
        assert!(bands.bass > 0.3, "{bands:?}");
        assert!(bands.treble < bands.bass);
        assert!(bands.average > 0.0);
    }

    #[test]
    fn high_tone_lands_in_treble() {
        let fs = 48_000.0;
        let mut a = BandAnalyzer::new(fs, AudioConfig::default());
        let block = sine(6_000.0, fs, 2048, 0.8);
        let mut bands = AudioBands::SILENT;
        for _ in 0..10 {
            bands = a.analyze(&block);
        }
        assert!(bands.treble > bands.bass, "{bands:?}");
    }

    #[test]
    fn bands_stay_normalized() {
        let fs = 44_100.0;
        let mut a = BandAnalyzer::new(fs, AudioConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        let noise: Vec<f32> = (0..4096).map(|_| rng.random_range(-1.0..1.0)).collect();
        let b = a.analyze(&noise);
        for v in [b.bass, b.mid, b.treble, b.average] {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn fft_size_rounds_to_power_of_two() {
        let cfg = AudioConfig {
            fft_size: 1000,
            ..AudioConfig::default()
        };
        let a = BandAnalyzer::new(48_000.0, cfg);
        assert_eq!(a.fft_size(), 1024);
    }
}
