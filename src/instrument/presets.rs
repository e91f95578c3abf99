//! Preset tables for every instrument kind.

use std::fmt;

use crate::dsp::{Envelope, OscillatorWaveform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeadPreset {
    #[default]
    Lead,
    Pad,
    Bass,
    Fx,
}

impl LeadPreset {
    pub fn waveform(self) -> OscillatorWaveform {
        match self {
            LeadPreset::Lead | LeadPreset::Fx => OscillatorWaveform::Sawtooth,
            LeadPreset::Pad => OscillatorWaveform::Triangle,
            LeadPreset::Bass => OscillatorWaveform::Square,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LeadPreset::Lead => "Lead",
            LeadPreset::Pad => "Pad",
            LeadPreset::Bass => "Bass",
            LeadPreset::Fx => "FX",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringPreset {
    #[default]
    AcousticGuitar,
    ElectricGuitar,
    BassGuitar,
    Harp,
    /// Short, neutral pluck.
    Plain,
}

impl StringPreset {
    pub fn decay(self) -> f32 {
        match self {
            StringPreset::AcousticGuitar => 0.996,
            StringPreset::ElectricGuitar => 0.999,
            StringPreset::BassGuitar => 0.995,
            StringPreset::Harp => 0.998,
            StringPreset::Plain => 0.99,
        }
    }

    /// Colour of the pluck burst, 1.0 = white noise.
    pub fn brightness(self) -> f32 {
        match self {
            StringPreset::AcousticGuitar => 0.8,
            StringPreset::ElectricGuitar => 0.9,
            StringPreset::BassGuitar => 0.3,
            StringPreset::Harp => 0.6,
            StringPreset::Plain => 0.5,
        }
    }

    /// Bass presets sound an octave below the written note.
    pub fn frequency_scale(self) -> f32 {
        match self {
            StringPreset::BassGuitar => 0.5,
            _ => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StringPreset::AcousticGuitar => "Acoustic Guitar",
            StringPreset::ElectricGuitar => "Electric Guitar",
            StringPreset::BassGuitar => "Bass Guitar",
            StringPreset::Harp => "Harp",
            StringPreset::Plain => "Default",
        }
    }
}

/// Breath release at the end of every wind note.
const WIND_FADE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindPreset {
    Flute,
    #[default]
    Clarinet,
    Saxophone,
    Trumpet,
}

impl WindPreset {
    /// Bell reflection lowpass coefficient. Lower passes more treble back
    /// into the bore.
    pub fn reflection(self) -> f32 {
        match self {
            WindPreset::Flute => 0.1,
            WindPreset::Clarinet => 0.2,
            WindPreset::Saxophone => 0.3,
            WindPreset::Trumpet => 0.25,
        }
    }

    /// Output gain shape for a note of `duration` seconds.
    pub fn envelope(self, sample_rate: f32, duration: f32) -> Envelope {
        let env = Envelope::new(0.0, sample_rate);
        let env = match self {
            WindPreset::Flute => env.linear_to(0.8, 0.1),
            WindPreset::Trumpet => env.linear_to(1.0, 0.02).exponential_to(0.7, 0.1),
            WindPreset::Clarinet | WindPreset::Saxophone => env.linear_to(1.0, 0.05),
        };
        env.hold_until(duration)
            .linear_to(0.0, duration + WIND_FADE)
    }

    pub fn name(self) -> &'static str {
        match self {
            WindPreset::Flute => "Flute",
            WindPreset::Clarinet => "Clarinet",
            WindPreset::Saxophone => "Saxophone",
            WindPreset::Trumpet => "Trumpet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PercussionPreset {
    #[default]
    Marimba,
    /// Notes 36/38/42 play the synthetic kit; other notes are ignored.
    DrumKit,
}

impl PercussionPreset {
    pub fn name(self) -> &'static str {
        match self {
            PercussionPreset::Marimba => "Marimba",
            PercussionPreset::DrumKit => "Drum Kit",
        }
    }
}

macro_rules! display_by_name {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        })*
    };
}

display_by_name!(LeadPreset, StringPreset, WindPreset, PercussionPreset);

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn levels(mut env: Envelope, samples: usize) -> Vec<f32> {
        (0..samples).map(|_| env.next_sample()).collect()
    }

    #[test]
    fn flute_swells_slower_than_trumpet() {
        let flute = levels(WindPreset::Flute.envelope(SAMPLE_RATE, 1.0), 50);
        let trumpet = levels(WindPreset::Trumpet.envelope(SAMPLE_RATE, 1.0), 50);
        assert!(flute[20] < 0.2);
        assert!(trumpet[20] > 0.9);
    }

    #[test]
    fn trumpet_settles_below_its_attack() {
        let out = levels(WindPreset::Trumpet.envelope(SAMPLE_RATE, 1.0), 500);
        assert!((out[200] - 0.7).abs() < 1e-4);
    }

    #[test]
    fn wind_envelopes_close_after_the_note() {
        for preset in [
            WindPreset::Flute,
            WindPreset::Clarinet,
            WindPreset::Saxophone,
            WindPreset::Trumpet,
        ] {
            let out = levels(preset.envelope(SAMPLE_RATE, 0.3), 400);
            assert!(out[299] > 0.5, "{preset} should hold through the note");
            assert_eq!(out[310], 0.0, "{preset} should be closed 10 ms later");
        }
    }

    #[test]
    fn only_bass_drops_an_octave() {
        assert_eq!(StringPreset::BassGuitar.frequency_scale(), 0.5);
        assert_eq!(StringPreset::Harp.frequency_scale(), 1.0);
    }
}
