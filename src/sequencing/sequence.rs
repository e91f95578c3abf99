use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EngineError;

/// Steps in one bar of sixteenths.
pub const STEPS_PER_PATTERN: usize = 16;
/// Tracks in the default session, one per default instrument.
pub const DEFAULT_TRACKS: usize = 5;

pub const KICK: StepEvent = StepEvent {
    note: 36,
    velocity: 1.0,
    duration: 1.0,
};

/// Event placed by toggling an empty cell.
pub const DEFAULT_EVENT: StepEvent = StepEvent {
    note: 60,
    velocity: 0.8,
    duration: 1.0,
};

/// A note on the step grid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepEvent {
    /// MIDI note number (0-127)
    pub note: u8,
    /// 0.0 to 1.0
    pub velocity: f32,
    /// Length in steps
    pub duration: f32,
}

impl StepEvent {
    /// Check an event before it enters a sequence. Velocity is clamped;
    /// a note above 127 or a non-positive duration is rejected.
    pub fn validated(self, step: usize) -> Result<Self, EngineError> {
        if self.note > 127 {
            return Err(EngineError::InvalidEvent {
                step,
                reason: "note above 127",
            });
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(EngineError::InvalidEvent {
                step,
                reason: "duration must be positive",
            });
        }
        let velocity = if self.velocity.is_nan() {
            0.0
        } else {
            self.velocity.clamp(0.0, 1.0)
        };
        Ok(Self { velocity, ..self })
    }
}

/// Step index to event. A missing step is silence.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Track {
    #[cfg_attr(feature = "serde", serde(default, deserialize_with = "skip_null_steps"))]
    steps: BTreeMap<usize, StepEvent>,
}

impl Track {
    pub fn step(&self, step: usize) -> Option<&StepEvent> {
        self.steps.get(&step)
    }

    /// Events in step order.
    pub fn steps(&self) -> impl Iterator<Item = (usize, &StepEvent)> {
        self.steps.iter().map(|(step, event)| (*step, event))
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Editors write `null` into cleared cells.
#[cfg(feature = "serde")]
fn skip_null_steps<'de, D>(deserializer: D) -> Result<BTreeMap<usize, StepEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<usize, Option<StepEvent>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(step, event)| event.map(|e| (step, e)))
        .collect())
}

/// Tracks in instrument order. Track `i` plays on instrument `i`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sequence {
    tracks: Vec<Track>,
}

impl Sequence {
    /// `track_count` empty tracks.
    pub fn new(track_count: usize) -> Self {
        Self {
            tracks: vec![Track::default(); track_count],
        }
    }

    /// Five tracks with a four-on-the-floor kick on the first.
    pub fn default_pattern() -> Self {
        let mut sequence = Self::new(DEFAULT_TRACKS);
        for step in (0..STEPS_PER_PATTERN).step_by(4) {
            sequence.tracks[0].steps.insert(step, KICK);
        }
        sequence
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn track(&self, track: usize) -> Option<&Track> {
        self.tracks.get(track)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn step(&self, track: usize, step: usize) -> Option<&StepEvent> {
        self.tracks.get(track)?.step(step)
    }

    /// Every event at `step`, with its track index.
    pub fn events_at(&self, step: usize) -> impl Iterator<Item = (usize, &StepEvent)> {
        self.tracks
            .iter()
            .enumerate()
            .filter_map(move |(i, t)| t.step(step).map(|e| (i, e)))
    }

    fn track_mut(&mut self, track: usize) -> Result<&mut Track, EngineError> {
        let tracks = self.tracks.len();
        self.tracks
            .get_mut(track)
            .ok_or(EngineError::UnknownTrack { track, tracks })
    }

    pub fn set_step(
        &mut self,
        track: usize,
        step: usize,
        event: StepEvent,
    ) -> Result<(), EngineError> {
        let event = event.validated(step)?;
        self.track_mut(track)?.steps.insert(step, event);
        Ok(())
    }

    /// Remove and return the event at `step`.
    pub fn clear_step(&mut self, track: usize, step: usize) -> Result<Option<StepEvent>, EngineError> {
        Ok(self.track_mut(track)?.steps.remove(&step))
    }

    /// Flip a cell: clear it if set, otherwise place [`DEFAULT_EVENT`].
    /// Returns whether the cell is now set.
    pub fn toggle_step(&mut self, track: usize, step: usize) -> Result<bool, EngineError> {
        let steps = &mut self.track_mut(track)?.steps;
        if steps.remove(&step).is_some() {
            Ok(false)
        } else {
            steps.insert(step, DEFAULT_EVENT);
            Ok(true)
        }
    }

    /// Latest `step + duration` over all events, 0 for an empty sequence.
    pub fn last_step_end(&self) -> f64 {
        self.tracks
            .iter()
            .flat_map(|t| t.steps())
            .map(|(step, e)| step as f64 + e.duration as f64)
            .fold(0.0, f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.iter().all(Track::is_empty)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }

    #[cfg(feature = "serde")]
    pub fn to_json_pretty(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a sequence. Cleared (`null`) cells are dropped.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let mut sequence: Sequence = serde_json::from_str(json)?;
        for track in sequence.tracks.iter_mut() {
            for (step, event) in track.steps.iter_mut() {
                *event = event.validated(*step)?;
            }
        }
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_is_four_kicks() {
        let seq = Sequence::default_pattern();
        assert_eq!(seq.track_count(), 5);
        let steps: Vec<usize> = seq.tracks()[0].steps().map(|(s, _)| s).collect();
        assert_eq!(steps, vec![0, 4, 8, 12]);
        assert!(seq.tracks()[1..].iter().all(Track::is_empty));
    }

    #[test]
    fn toggle_places_then_clears_default_event() {
        let mut seq = Sequence::new(2);
        assert!(seq.toggle_step(1, 3).unwrap());
        assert_eq!(seq.step(1, 3), Some(&DEFAULT_EVENT));
        assert!(!seq.toggle_step(1, 3).unwrap());
        assert_eq!(seq.step(1, 3), None);
    }

    #[test]
    fn set_step_validates() {
        let mut seq = Sequence::new(1);
        let loud = StepEvent {
            note: 40,
            velocity: 3.0,
            duration: 2.0,
        };
        seq.set_step(0, 0, loud).unwrap();
        assert_eq!(seq.step(0, 0).unwrap().velocity, 1.0);

        let empty = StepEvent {
            duration: 0.0,
            ..loud
        };
        assert!(matches!(
            seq.set_step(0, 1, empty),
            Err(EngineError::InvalidEvent { step: 1, .. })
        ));
        assert!(matches!(
            seq.set_step(4, 0, loud),
            Err(EngineError::UnknownTrack { track: 4, tracks: 1 })
        ));
    }

    #[test]
    fn last_step_end_includes_duration() {
        let mut seq = Sequence::new(2);
        assert_eq!(seq.last_step_end(), 0.0);
        seq.set_step(0, 12, KICK).unwrap();
        seq.set_step(
            1,
            10,
            StepEvent {
                duration: 4.0,
                ..KICK
            },
        )
        .unwrap();
        assert_eq!(seq.last_step_end(), 14.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn wire_format_uses_string_step_keys() {
        let mut seq = Sequence::new(1);
        seq.set_step(0, 0, KICK).unwrap();
        assert_eq!(
            seq.to_json().unwrap(),
            r#"{"tracks":[{"steps":{"0":{"note":36,"velocity":1.0,"duration":1.0}}}]}"#
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn null_cells_are_silence() {
        let json = r#"{"tracks":[{"steps":{"0":null,"2":{"note":38,"velocity":0.5,"duration":1}}},{"steps":{}}]}"#;
        let seq = Sequence::from_json(json).unwrap();
        assert_eq!(seq.step(0, 0), None);
        assert_eq!(seq.step(0, 2).unwrap().note, 38);
        assert_eq!(seq.track_count(), 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn bad_events_are_rejected_on_load() {
        let json = r#"{"tracks":[{"steps":{"5":{"note":36,"velocity":1,"duration":-1}}}]}"#;
        assert!(matches!(
            Sequence::from_json(json),
            Err(EngineError::InvalidEvent { step: 5, .. })
        ));
        assert!(matches!(
            Sequence::from_json("{\"tracks\": 3}"),
            Err(EngineError::Json(_))
        ));
    }
}
