//! Spectrum view: windowed FFT of the scope buffer, sampled at log-spaced
//! frequencies and drawn against log10(Hz).

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

const BANDS: usize = 48;
const FLOOR_DB: f64 = -100.0;
/// dB a band may fall per update; rises are immediate.
const FALL_DB: f64 = 3.0;
const LOW_HZ: f32 = 20.0;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// FFT bin read for each band.
    bins: Vec<usize>,
    /// (log10 Hz, dB) per band.
    bands: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(size: usize, sample_rate: f32) -> Self {
        let size = size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(size);

        let denom = (size - 1) as f32;
        let window = (0..size)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let high = (sample_rate / 2.0).min(20_000.0).max(LOW_HZ * 2.0);
        let last_bin = size / 2 - 1;
        let mut bins = Vec::with_capacity(BANDS);
        let mut bands = Vec::with_capacity(BANDS);
        for i in 0..BANDS {
            let t = i as f32 / (BANDS - 1) as f32;
            let hz = LOW_HZ * (high / LOW_HZ).powf(t);
            let bin = ((hz * size as f32 / sample_rate).round() as usize).clamp(1, last_bin);
            bins.push(bin);
            bands.push(((hz as f64).log10(), FLOOR_DB));
        }

        Self {
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); size],
            bins,
            bands,
        }
    }

    /// Analyse `buffer`; ignored unless it is exactly the FFT size.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }
        for ((slot, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let norm = 2.0 / self.window.len() as f32;
        for (band, &bin) in self.bands.iter_mut().zip(&self.bins) {
            let magnitude = (self.scratch[bin].norm() * norm).max(1e-6);
            let db = (20.0 * magnitude.log10()) as f64;
            band.1 = db.max(band.1 - FALL_DB).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.bands
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, bands: &[(f64, f64)]) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let (low, high) = match (bands.first(), bands.last()) {
        (Some(first), Some(last)) if last.0 > first.0 => (first.0, last.0),
        _ => (1.0, 4.0),
    };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(bands);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([low, high])
                .labels(vec!["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(vec!["-100", "-50", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn sine_peaks_in_its_band() {
        let size = 1024;
        let mut analyzer = SpectrumAnalyzer::new(size, SAMPLE_RATE);
        // exactly on the bin one band reads
        let hz = analyzer.bins[34] as f32 * SAMPLE_RATE / size as f32;
        let sine: Vec<f32> = (0..size)
            .map(|i| (std::f32::consts::TAU * hz * i as f32 / SAMPLE_RATE).sin())
            .collect();
        analyzer.update(&sine);

        let loudest = analyzer
            .data()
            .iter()
            .copied()
            .fold((0.0, FLOOR_DB), |best, band| if band.1 > best.1 { band } else { best });
        let loudest_hz = 10f64.powf(loudest.0);
        assert!(
            (loudest_hz - hz as f64).abs() / (hz as f64) < 0.15,
            "loudest band at {loudest_hz} Hz, expected near {hz} Hz"
        );
        assert!(loudest.1 > -10.0, "full-scale sine should read about -6 dB, got {}", loudest.1);
    }

    #[test]
    fn wrong_length_is_ignored() {
        let mut analyzer = SpectrumAnalyzer::new(256, SAMPLE_RATE);
        analyzer.update(&[1.0; 100]);
        assert!(analyzer.data().iter().all(|b| b.1 == FLOOR_DB));
    }
}
