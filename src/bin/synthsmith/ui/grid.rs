//! Step grid: one row per track, one cell per sixteenth, with the playhead
//! and edit cursor drawn over it.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use synthsmith::sequencing::{Sequence, STEPS_PER_PATTERN};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridCursor {
    pub track: usize,
    pub step: usize,
}

const LABEL_WIDTH: usize = 16;

pub fn render_grid(
    frame: &mut Frame,
    area: Rect,
    sequence: &Sequence,
    labels: &[&str],
    playhead: Option<usize>,
    cursor: GridCursor,
) {
    let block = Block::default().title(" Steps ").borders(Borders::ALL);

    let mut lines = Vec::with_capacity(sequence.track_count() + 1);

    // beat numbers over every fourth step
    let mut ruler = " ".repeat(LABEL_WIDTH);
    for step in 0..STEPS_PER_PATTERN {
        if step % 4 == 0 {
            ruler.push_str(&format!("{:<3}", step / 4 + 1));
        } else {
            ruler.push_str("   ");
        }
    }
    lines.push(Line::from(Span::styled(
        ruler,
        Style::default().fg(Color::DarkGray),
    )));

    for (track_index, track) in sequence.tracks().iter().enumerate() {
        let label = labels.get(track_index).copied().unwrap_or("-");
        let mut spans = vec![Span::styled(
            format!("{:<width$.width$}", label, width = LABEL_WIDTH - 1) + " ",
            Style::default().fg(if track.is_empty() {
                Color::DarkGray
            } else {
                Color::White
            }),
        )];

        for step in 0..STEPS_PER_PATTERN {
            let set = track.step(step).is_some();
            let glyph = if set { "[■]" } else { "[ ]" };

            let mut style = Style::default().fg(match (set, step % 4 == 0) {
                (true, _) => Color::Cyan,
                (false, true) => Color::Gray,
                (false, false) => Color::DarkGray,
            });
            if playhead == Some(step) {
                style = style.bg(Color::Yellow).fg(Color::Black);
            }
            if cursor == (GridCursor { track: track_index, step }) {
                style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
            }
            spans.push(Span::styled(glyph, style));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
