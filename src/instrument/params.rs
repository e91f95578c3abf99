//! Named, bounded parameters exposed by each instrument kind.
//!
//! Names match the wire names the UI layer uses (`grainSize`, not
//! `grain_size`). Values set by name are clamped into the table's range.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    Frequency,
    Decay,
    Pressure,
    Position,
    Spread,
    GrainSize,
    Density,
    Pitch,
    Gain,
}

impl Param {
    pub const ALL: [Param; 9] = [
        Param::Frequency,
        Param::Decay,
        Param::Pressure,
        Param::Position,
        Param::Spread,
        Param::GrainSize,
        Param::Density,
        Param::Pitch,
        Param::Gain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Param::Frequency => "frequency",
            Param::Decay => "decay",
            Param::Pressure => "pressure",
            Param::Position => "position",
            Param::Spread => "spread",
            Param::GrainSize => "grainSize",
            Param::Density => "density",
            Param::Pitch => "pitch",
            Param::Gain => "gain",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub param: Param,
    pub default: f32,
    pub min: f32,
    pub max: f32,
}

impl ParamSpec {
    const fn new(param: Param, default: f32, min: f32, max: f32) -> Self {
        Self {
            param,
            default,
            min,
            max,
        }
    }

    /// Clamp `value` into range. Frequencies are also held under Nyquist.
    pub fn clamp(&self, value: f32, sample_rate: f32) -> f32 {
        let max = match self.param {
            Param::Frequency => self.max.min(sample_rate * 0.5),
            _ => self.max,
        };
        if value.is_nan() {
            return self.default.clamp(self.min, max);
        }
        value.clamp(self.min, max)
    }
}

const GAIN: ParamSpec = ParamSpec::new(Param::Gain, 1.0, 0.0, 2.0);
const FREQUENCY: ParamSpec = ParamSpec::new(Param::Frequency, 440.0, 20.0, 20_000.0);

pub const LEAD_PARAMS: &[ParamSpec] = &[FREQUENCY, GAIN];

pub const STRING_PARAMS: &[ParamSpec] = &[
    FREQUENCY,
    ParamSpec::new(Param::Decay, 0.996, 0.0, 0.9999),
    GAIN,
];

pub const REED_PARAMS: &[ParamSpec] = &[
    FREQUENCY,
    ParamSpec::new(Param::Pressure, 0.75, 0.0, 1.5),
    GAIN,
];

pub const MODAL_PARAMS: &[ParamSpec] = &[FREQUENCY, GAIN];

pub const GRANULAR_PARAMS: &[ParamSpec] = &[
    ParamSpec::new(Param::Position, 0.5, 0.0, 1.0),
    ParamSpec::new(Param::Spread, 0.1, 0.0, 1.0),
    ParamSpec::new(Param::GrainSize, 0.1, 0.01, 1.0),
    ParamSpec::new(Param::Density, 20.0, 1.0, 100.0),
    ParamSpec::new(Param::Pitch, 1.0, 0.1, 4.0),
    GAIN,
];

/// Find `param` in a kind's table.
pub fn lookup(specs: &[ParamSpec], param: Param) -> Option<&ParamSpec> {
    specs.iter().find(|s| s.param == param)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_resolve_both_ways() {
        for param in Param::ALL {
            assert_eq!(Param::from_name(param.name()), Some(param));
        }
        assert_eq!(Param::from_name("grainSize"), Some(Param::GrainSize));
        assert_eq!(Param::from_name("grain_size"), None);
    }

    #[test]
    fn frequency_is_held_under_nyquist() {
        let spec = lookup(STRING_PARAMS, Param::Frequency).unwrap();
        assert_eq!(spec.clamp(30_000.0, 22_050.0), 11_025.0);
        assert_eq!(spec.clamp(0.0, 44_100.0), 20.0);
    }

    #[test]
    fn nan_falls_back_to_default() {
        let spec = lookup(REED_PARAMS, Param::Pressure).unwrap();
        assert_eq!(spec.clamp(f32::NAN, 44_100.0), 0.75);
    }

    #[test]
    fn every_table_carries_gain() {
        for table in [
            LEAD_PARAMS,
            STRING_PARAMS,
            REED_PARAMS,
            MODAL_PARAMS,
            GRANULAR_PARAMS,
        ] {
            assert!(lookup(table, Param::Gain).is_some());
        }
    }
}
