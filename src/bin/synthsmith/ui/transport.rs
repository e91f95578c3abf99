//! Transport bar: tempo, run state, step position and output levels

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use synthsmith::{engine::TransportStatus, sequencing::STEPS_PER_PATTERN};

pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub fn render_transport(
    frame: &mut Frame,
    area: Rect,
    status: &TransportStatus,
    sample_rate: f32,
    stats: &AudioStats,
) {
    let block = Block::default().title(" synthsmith ").borders(Borders::ALL);

    let (symbol, state, state_color) = if status.running {
        ("▶", "Running", Color::Green)
    } else {
        ("■", "Stopped", Color::Yellow)
    };
    let position = match status.step {
        Some(step) => format!("Step {:2}/{}  ", step + 1, STEPS_PER_PATTERN),
        None => format!("Step --/{}  ", STEPS_PER_PATTERN),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" BPM: {:.0}  ", status.tempo),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{symbol} {state}  "), Style::default().fg(state_color)),
        Span::styled(position, Style::default().fg(Color::White)),
        Span::styled(
            format!("{} sent  ", status.dispatched),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("{:.1}kHz  ", sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
