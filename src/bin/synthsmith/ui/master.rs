//! Master effects row: one selectable control per master-bus parameter

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use synthsmith::engine::MasterParam;

/// UI copy of the master controls. The audio side clamps again on arrival.
pub struct MasterPanel {
    values: [f32; MasterParam::ALL.len()],
    selected: usize,
}

impl Default for MasterPanel {
    fn default() -> Self {
        Self {
            values: MasterParam::ALL.map(MasterParam::default_value),
            selected: 0,
        }
    }
}

fn label(param: MasterParam) -> &'static str {
    match param {
        MasterParam::Distortion => "Drive",
        MasterParam::EchoWet => "Delay",
        MasterParam::ReverbWet => "Reverb",
        MasterParam::VibeRate => "Vibe Hz",
        MasterParam::VibeDepth => "Vibe Depth",
    }
}

/// Change applied per key press.
fn increment(param: MasterParam) -> f32 {
    match param {
        MasterParam::Distortion => 5.0,
        _ => 0.05,
    }
}

impl MasterPanel {
    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % self.values.len();
    }

    pub fn selected(&self) -> MasterParam {
        MasterParam::ALL[self.selected]
    }

    /// Move the selected control up or down one increment. Returns the
    /// control and its new value.
    pub fn nudge(&mut self, up: bool) -> (MasterParam, f32) {
        let param = self.selected();
        let delta = if up { increment(param) } else { -increment(param) };
        let value = param.clamp(self.values[self.selected] + delta);
        self.values[self.selected] = value;
        (param, value)
    }

    pub fn value(&self, param: MasterParam) -> f32 {
        MasterParam::ALL
            .iter()
            .position(|p| *p == param)
            .map_or(param.default_value(), |i| self.values[i])
    }
}

pub fn render_master(frame: &mut Frame, area: Rect, panel: &MasterPanel) {
    let block = Block::default().title(" Master ").borders(Borders::ALL);

    let spans: Vec<Span> = MasterParam::ALL
        .iter()
        .map(|&param| {
            let text = match param {
                MasterParam::Distortion => format!(" {}: {:.0} ", label(param), panel.value(param)),
                _ => format!(" {}: {:.2} ", label(param), panel.value(param)),
            };
            let style = if param == panel.selected() {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            Span::styled(text, style)
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
