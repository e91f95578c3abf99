//! Terminal UI for `synthsmith play`
//!
//! Shows the transport, the step grid with its playhead and a live view of
//! the output. Edits go to the transport thread as commands; the UI keeps its
//! own copy of the sequence for drawing and undo.

mod grid;
mod master;
mod spectrum;
mod transport;
mod waveform;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use tracing::warn;

use synthsmith::{
    engine::{Transport, TransportCommand, TransportStatus},
    sequencing::{History, Sequence, STEPS_PER_PATTERN},
};

use grid::{render_grid, GridCursor};
use master::{render_master, MasterPanel};
use spectrum::{render_spectrum, SpectrumAnalyzer};
use transport::{render_transport, AudioStats};
use waveform::render_waveform;

/// Samples kept for the scope and the FFT.
const VIS_BUFFER_SIZE: usize = 1024;
const TEMPO_STEP: f64 = 5.0;
const MIN_TEMPO: f64 = 30.0;
const MAX_TEMPO: f64 = 300.0;

pub struct UiApp {
    transport: Option<Transport>,
    scope_rx: Consumer<f32>,
    audio_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    sequence: Sequence,
    history: History,
    labels: Vec<&'static str>,
    cursor: GridCursor,
    master: MasterPanel,
    status: TransportStatus,
    sample_rate: f32,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        transport: Transport,
        scope_rx: Consumer<f32>,
        sequence: Sequence,
        labels: Vec<&'static str>,
        sample_rate: f32,
    ) -> Self {
        let status = transport.status();
        Self {
            transport: Some(transport),
            scope_rx,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, sample_rate),
            sequence,
            history: History::new(),
            labels,
            cursor: GridCursor::default(),
            master: MasterPanel::default(),
            status,
            sample_rate,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            if let Some(transport) = self.transport.as_ref() {
                self.status = transport.status();
            }

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(())
    }

    /// Stop the transport thread and wait for it.
    pub fn shutdown(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.shutdown();
        }
    }

    fn poll_audio(&mut self) {
        let mut fresh = 0;
        while let Ok(sample) = self.scope_rx.pop() {
            self.audio_buffer.push(sample);
            fresh += 1;
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(..excess);
        }
        if fresh > 0 {
            self.spectrum.update(&self.audio_buffer);
        }
    }

    fn send(&mut self, command: TransportCommand) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        if let Err(err) = transport.send(command) {
            warn!(%err, "transport command dropped");
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => {
                let command = if self.status.running {
                    TransportCommand::Stop
                } else {
                    TransportCommand::Start
                };
                self.send(command);
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_tempo(TEMPO_STEP),
            KeyCode::Char('-') | KeyCode::Char('_') => self.nudge_tempo(-TEMPO_STEP),
            KeyCode::Left => self.cursor.step = self.cursor.step.saturating_sub(1),
            KeyCode::Right => {
                self.cursor.step = (self.cursor.step + 1).min(STEPS_PER_PATTERN - 1)
            }
            KeyCode::Up => self.cursor.track = self.cursor.track.saturating_sub(1),
            KeyCode::Down => {
                let last = self.sequence.track_count().saturating_sub(1);
                self.cursor.track = (self.cursor.track + 1).min(last);
            }
            KeyCode::Enter => self.toggle_at_cursor(),
            KeyCode::Tab => self.master.select_next(),
            KeyCode::Char('[') => self.nudge_master(false),
            KeyCode::Char(']') => self.nudge_master(true),
            KeyCode::Char('u') => {
                if let Some(previous) = self.history.undo(&self.sequence) {
                    self.replace_sequence(previous);
                }
            }
            KeyCode::Char('r') => {
                if let Some(next) = self.history.redo(&self.sequence) {
                    self.replace_sequence(next);
                }
            }
            _ => {}
        }
    }

    fn nudge_tempo(&mut self, delta: f64) {
        let tempo = (self.status.tempo + delta).clamp(MIN_TEMPO, MAX_TEMPO);
        self.send(TransportCommand::SetTempo(tempo));
    }

    fn nudge_master(&mut self, up: bool) {
        let (param, value) = self.master.nudge(up);
        self.send(TransportCommand::SetMaster { param, value });
    }

    fn toggle_at_cursor(&mut self) {
        let GridCursor { track, step } = self.cursor;
        self.history.push(&self.sequence);
        match self.sequence.toggle_step(track, step) {
            Ok(true) => {
                if let Some(event) = self.sequence.step(track, step).copied() {
                    self.send(TransportCommand::SetStep { track, step, event });
                }
            }
            Ok(false) => self.send(TransportCommand::ClearStep { track, step }),
            Err(err) => warn!(%err, track, step, "step toggle rejected"),
        }
    }

    fn replace_sequence(&mut self, sequence: Sequence) {
        self.sequence = sequence;
        self.send(TransportCommand::ReplaceSequence(Box::new(self.sequence.clone())));
    }

    fn render(&self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),                                         // Transport bar
                Constraint::Length(self.sequence.track_count() as u16 + 3), // Step grid
                Constraint::Length(3),                                         // Master effects
                Constraint::Min(8),                                            // Scope + spectrum
                Constraint::Length(1),                                         // Help bar
            ])
            .split(frame.area());

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_transport(frame, rows[0], &self.status, self.sample_rate, &stats);
        render_grid(
            frame,
            rows[1],
            &self.sequence,
            &self.labels,
            self.status.step,
            self.cursor,
        );
        render_master(frame, rows[2], &self.master);

        let scopes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[3]);
        render_waveform(frame, scopes[0], &self.audio_buffer);
        render_spectrum(frame, scopes[1], self.spectrum.data());

        let undo = if self.history.can_undo() { "[U] Undo  " } else { "" };
        let redo = if self.history.can_redo() { "[R] Redo  " } else { "" };
        let help = Paragraph::new(format!(
            " [Q] Quit  [Space] Start/Stop  [+/-] Tempo  [Arrows] Move  [Enter] Toggle  [Tab] FX  [Brackets] FX -/+  {undo}{redo}"
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[4]);
    }
}
