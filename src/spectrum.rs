//! Spectrum sampling and band extraction

use crate::constants::audio::{FFT_SIZE, SPECTRUM_SIZE};
use crate::levels::normalize;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Half-open slice `[start, end)` of a spectrum buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRange {
    pub start: usize,
    pub end: usize,
}

impl BandRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Mean magnitude of this range in `buffer`
    pub fn level(&self, buffer: &[f32]) -> f32 {
        band_level(buffer, self.start, self.end)
    }
}

/// The four analysis bands of a 256-bin spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Bass,
    LowMid,
    HighMid,
    High,
}

impl Band {
    pub const ALL: [Band; 4] = [Band::Bass, Band::LowMid, Band::HighMid, Band::High];

    pub const fn range(self) -> BandRange {
        match self {
            Band::Bass => BandRange::new(0, 16),
            Band::LowMid => BandRange::new(16, 64),
            Band::HighMid => BandRange::new(64, 128),
            Band::High => BandRange::new(128, SPECTRUM_SIZE),
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Band::Bass => 0,
            Band::LowMid => 1,
            Band::HighMid => 2,
            Band::High => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Band::Bass => "Bass",
            Band::LowMid => "LowMid",
            Band::HighMid => "HighMid",
            Band::High => "High",
        }
    }
}

/// Arithmetic mean of `buffer[start..end)`.
///
/// The range is clamped to the buffer length first, so bins past the end are
/// skipped rather than treated as an error. An empty range yields 0.
pub fn band_level(buffer: &[f32], start: usize, end: usize) -> f32 {
    let end = end.min(buffer.len());
    if start >= end {
        return 0.0;
    }
    let slice = &buffer[start..end];
    slice.iter().sum::<f32>() / slice.len() as f32
}

/// Extract and normalize all four bands, indexed by [`Band::index`]
pub fn band_levels(buffer: &[f32], gain: f32) -> [f32; 4] {
    Band::ALL.map(|band| normalize(band.range().level(buffer), gain))
}

/// Turns raw PCM into a magnitude spectrum of `SPECTRUM_SIZE` bins
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            fft,
            window: blackman_harris(FFT_SIZE),
            buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            scratch,
            magnitudes: vec![0.0; SPECTRUM_SIZE],
        }
    }

    /// Analyze the most recent `FFT_SIZE` samples; shorter input is zero-padded
    pub fn analyze(&mut self, samples: &[f32]) -> &[f32] {
        let tail = &samples[samples.len().saturating_sub(FFT_SIZE)..];

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = tail.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let scale = 1.0 / FFT_SIZE as f32;
        for (mag, bin) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *mag = bin.norm() * scale;
        }

        &self.magnitudes
    }

    /// The spectrum produced by the last call to [`analyze`](Self::analyze)
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Four-term Blackman-Harris window
fn blackman_harris(len: usize) -> Vec<f32> {
    const A0: f32 = 0.35875;
    const A1: f32 = 0.48829;
    const A2: f32 = 0.14128;
    const A3: f32 = 0.01168;

    let denom = (len.max(2) - 1) as f32;
    (0..len)
        .map(|n| {
            let x = 2.0 * PI * n as f32 / denom;
            A0 - A1 * x.cos() + A2 * (2.0 * x).cos() - A3 * (3.0 * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_level_mean() {
        let buffer = [1.0, 2.0, 3.0, 4.0];
        assert!((band_level(&buffer, 0, 4) - 2.5).abs() < 1e-6);
        assert!((band_level(&buffer, 1, 3) - 2.5).abs() < 1e-6);
        assert!((band_level(&buffer, 3, 4) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_band_level_empty_range_is_zero() {
        let buffer = [0.5; 8];
        assert_eq!(band_level(&buffer, 4, 4), 0.0);
        assert_eq!(band_level(&buffer, 6, 2), 0.0);
        assert_eq!(band_level(&buffer, 8, 12), 0.0);
        assert_eq!(band_level(&buffer, 100, 200), 0.0);
        assert_eq!(band_level(&[], 0, 16), 0.0);
    }

    #[test]
    fn test_band_level_skips_bins_past_end() {
        let buffer = [1.0; 10];
        assert!((band_level(&buffer, 8, 20) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_band_table_covers_spectrum() {
        let mut expected_start = 0;
        for band in Band::ALL {
            let range = band.range();
            assert_eq!(range.start, expected_start, "gap before {}", band.name());
            assert!(range.start < range.end);
            expected_start = range.end;
        }
        assert_eq!(expected_start, SPECTRUM_SIZE);
    }

    #[test]
    fn test_band_levels_normalize_each_band() {
        let mut buffer = vec![0.0; SPECTRUM_SIZE];
        for bin in &mut buffer[0..16] {
            *bin = 0.002;
        }
        for bin in &mut buffer[128..256] {
            *bin = 1.0;
        }
        let levels = band_levels(&buffer, 100.0);
        assert!((levels[Band::Bass.index()] - 0.2).abs() < 1e-5);
        assert_eq!(levels[Band::LowMid.index()], 0.0);
        assert_eq!(levels[Band::HighMid.index()], 0.0);
        assert_eq!(levels[Band::High.index()], 1.0);
    }

    #[test]
    fn test_analyzer_silence_is_flat_zero() {
        let mut analyzer = SpectrumAnalyzer::new();
        let spectrum = analyzer.analyze(&[0.0; FFT_SIZE]);
        assert_eq!(spectrum.len(), SPECTRUM_SIZE);
        assert!(spectrum.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_analyzer_peaks_at_tone_bin() {
        let bin = 40;
        let samples: Vec<f32> = (0..FFT_SIZE)
            .map(|n| (2.0 * PI * bin as f32 * n as f32 / FFT_SIZE as f32).sin())
            .collect();

        let mut analyzer = SpectrumAnalyzer::new();
        let spectrum = analyzer.analyze(&samples);
        let peak = spectrum
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, &m)| if m > best.1 { (i, m) } else { best });

        assert_eq!(peak.0, bin);
        assert!(spectrum.iter().all(|&m| m >= 0.0));
    }

    #[test]
    fn test_analyzer_zero_pads_short_input() {
        let mut analyzer = SpectrumAnalyzer::new();
        let spectrum = analyzer.analyze(&[0.5; 16]).to_vec();
        assert_eq!(spectrum.len(), SPECTRUM_SIZE);
        assert_eq!(analyzer.magnitudes(), spectrum.as_slice());
    }

    #[test]
    fn test_window_is_symmetric() {
        let window = blackman_harris(64);
        for i in 0..32 {
            assert!((window[i] - window[63 - i]).abs() < 1e-5);
        }
        assert!(window[0] < 1e-3);
    }
}
