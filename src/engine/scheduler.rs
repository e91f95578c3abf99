use std::collections::VecDeque;

use tracing::{debug, info, trace};

use crate::{
    config::{sixteenth_seconds, SchedulerConfig},
    error::EngineError,
    sequencing::Sequence,
};

/*
Lookahead Scheduling
====================

The control thread wakes up every `lookahead` (25 ms) but may be late by
much more than that. Audio, on the other hand, needs note starts accurate
to the sample. The scheduler bridges the two by never asking "what is due
now" and instead asking "what is due before now + schedule_ahead":

    control ticks:   |    |      |         |   (jittery, ~25 ms)
    audio clock:     ───────────────────────────────────────→
    scheduled notes: ·   ·   ·   ·   ·   ·   ·   ·   (exact sixteenths)
                     └── schedule_ahead (100 ms) ──┘

Every note is handed to the audio side with an absolute timestamp, at least
one tick before it has to sound.


The Cursor
----------

    next_event_time   when the next sixteenth falls, on the audio clock
    current_step      which column of the grid it is (wraps at 16)

Each tick runs a catch-up loop:

    while next_event_time < now + schedule_ahead:
        dispatch every track's event at current_step, at next_event_time
        next_event_time += (60 / tempo) / 4
        current_step     = (current_step + 1) mod 16

`next_event_time` only ever grows by tempo arithmetic, never by wall-clock
deltas, so a late tick dispatches several steps at once with the same exact
spacing. Nothing is skipped.

Tempo changes affect the next increment only. Events already dispatched
keep their timestamps.
*/

/// Steps remembered for the playhead display.
const PLAYHEAD_QUEUE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
}

/// Receives note triggers with absolute audio-clock timestamps.
///
/// Implementations must not block. A track with nothing bound to it is a
/// silent no-op.
pub trait TriggerSink {
    fn trigger(&mut self, track: usize, note: u8, time: f64, duration: f32);
}

pub struct Scheduler {
    config: SchedulerConfig,
    tempo: f64,
    state: TransportState,
    next_event_time: f64,
    current_step: usize,
    dispatched: u64,
    playhead: VecDeque<(usize, f64)>,
    shown_step: Option<usize>,
}

fn check_tempo(tempo: f64) -> Result<f64, EngineError> {
    if tempo.is_finite() && tempo > 0.0 {
        Ok(tempo)
    } else {
        Err(EngineError::InvalidTempo { tempo })
    }
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, tempo: f64) -> Result<Self, EngineError> {
        Ok(Self {
            config,
            tempo: check_tempo(tempo)?,
            state: TransportState::Stopped,
            next_event_time: 0.0,
            current_step: 0,
            dispatched: 0,
            playhead: VecDeque::with_capacity(PLAYHEAD_QUEUE),
            shown_step: None,
        })
    }

    /// Arm the cursor at step 0, `start_delay` after `now`.
    pub fn start(&mut self, now: f64) -> Result<(), EngineError> {
        if self.state == TransportState::Running {
            return Err(EngineError::AlreadyRunning);
        }
        self.next_event_time = now + self.config.start_delay;
        self.current_step = 0;
        self.playhead.clear();
        self.shown_step = None;
        self.state = TransportState::Running;
        info!(tempo = self.tempo, first_event = self.next_event_time, "scheduler started");
        Ok(())
    }

    /// Stop dispatching. Notes already handed to the audio side still play.
    pub fn stop(&mut self) {
        if self.state == TransportState::Running {
            info!(dispatched = self.dispatched, "scheduler stopped");
        }
        self.state = TransportState::Stopped;
        self.playhead.clear();
        self.shown_step = None;
    }

    pub fn set_tempo(&mut self, tempo: f64) -> Result<(), EngineError> {
        self.tempo = check_tempo(tempo)?;
        info!(tempo, "tempo changed");
        Ok(())
    }

    /// Run the catch-up loop against the audio clock reading `now`.
    /// Returns how many steps were dispatched.
    pub fn tick(&mut self, now: f64, sequence: &Sequence, sink: &mut impl TriggerSink) -> usize {
        if self.state != TransportState::Running {
            return 0;
        }

        let horizon = now + self.config.schedule_ahead;
        let mut steps = 0;
        while self.next_event_time < horizon {
            self.schedule_note(self.current_step, self.next_event_time, sequence, sink);
            self.advance();
            steps += 1;
        }

        if steps > 2 {
            debug!(steps, now, "scheduler caught up after a late tick");
        }
        steps
    }

    /// Dispatch every track's event at `step` with timestamp `time`.
    pub fn schedule_note(
        &mut self,
        step: usize,
        time: f64,
        sequence: &Sequence,
        sink: &mut impl TriggerSink,
    ) {
        for (track, event) in sequence.events_at(step) {
            let duration = self
                .config
                .duration_scale
                .seconds(event.duration as f64, self.tempo);
            trace!(track, step, note = event.note, time, "trigger");
            sink.trigger(track, event.note, time, duration as f32);
            self.dispatched += 1;
        }

        if self.playhead.len() == PLAYHEAD_QUEUE {
            self.playhead.pop_front();
        }
        self.playhead.push_back((step, time));
    }

    fn advance(&mut self) {
        self.next_event_time += sixteenth_seconds(self.tempo);
        self.current_step = (self.current_step + 1) % self.config.steps_per_bar.max(1);
    }

    /// The step that is sounding at `now`, for display.
    pub fn playhead(&mut self, now: f64) -> Option<usize> {
        while let Some(&(step, time)) = self.playhead.front() {
            if time > now {
                break;
            }
            self.shown_step = Some(step);
            self.playhead.pop_front();
        }
        self.shown_step
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TransportState::Running
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Step the next dispatch will play.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn next_event_time(&self) -> f64 {
        self.next_event_time
    }

    /// Triggers dispatched since construction.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}
