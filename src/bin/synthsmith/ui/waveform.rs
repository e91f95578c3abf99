//! Triggered scope over the tail of the scope ring.
//!
//! The window starts on a rising zero crossing so periodic notes stand still
//! between frames instead of scrolling. Dashed guides mark the peak level,
//! red once the output clips.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Samples shown once triggered; the rest of the buffer is search room.
const WINDOW: usize = 512;

/// Index of the first rising zero crossing that still leaves a full
/// window after it, or 0 when there is none.
pub fn trigger_point(buffer: &[f32], window: usize) -> usize {
    let last = buffer.len().saturating_sub(window);
    (1..=last)
        .find(|&i| buffer[i - 1] < 0.0 && buffer[i] >= 0.0)
        .unwrap_or(0)
}

pub fn render_waveform(frame: &mut Frame, area: Rect, audio_buffer: &[f32]) {
    let start = trigger_point(audio_buffer, WINDOW);
    let shown = &audio_buffer[start..audio_buffer.len().min(start + WINDOW)];

    let len = shown.len().max(1) as f64;
    let trace: Vec<(f64, f64)> = shown
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64 / len, sample.clamp(-1.0, 1.0) as f64))
        .collect();

    let peak = shown.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let clipped = peak >= 1.0;
    let level = peak.min(1.0) as f64;
    let upper: Vec<(f64, f64)> = (0..=32).map(|i| (i as f64 / 32.0, level)).collect();
    let lower: Vec<(f64, f64)> = upper.iter().map(|&(x, y)| (x, -y)).collect();
    let guide = Style::default().fg(if clipped { Color::Red } else { Color::DarkGray });

    let mut datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&trace)];
    if peak > 0.0 {
        for line in [&upper, &lower] {
            datasets.push(
                Dataset::default()
                    .marker(symbols::Marker::Dot)
                    .graph_type(GraphType::Scatter)
                    .style(guide)
                    .data(line),
            );
        }
    }

    let title = if clipped { " Scope (clip) " } else { " Scope " };
    let chart = Chart::new(datasets)
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
