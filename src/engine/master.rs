//! Master effects chain for realtime playback:
//!
//! ```text
//! rack ──→ × gain ──→ waveshaper ──→ echo ──→ reverb ──→ out
//!                                      ↑
//!                          vibe LFO ───┘ (feedback)
//! ```
//!
//! Offline renders skip this chain and return the dry rack mix.

use crate::{
    config::EngineConfig,
    dsp::{
        distortion::Waveshaper,
        echo::{Echo, EchoParam},
        lfo::Lfo,
        reverb::Reverb,
        Modulatable, Modulation,
    },
};

pub const MASTER_GAIN: f32 = 0.8;
const ECHO_TIME: f32 = 0.5;
const ECHO_FEEDBACK: f32 = 0.4;
const ECHO_TONE_HZ: f32 = 2_000.0;

/// Live controls of the master chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterParam {
    /// Waveshaper drive, 0..100. Zero bypasses the shaper.
    Distortion,
    EchoWet,
    ReverbWet,
    /// Vibe LFO rate in Hz.
    VibeRate,
    /// How far the vibe swings echo feedback.
    VibeDepth,
}

impl MasterParam {
    pub const ALL: [MasterParam; 5] = [
        MasterParam::Distortion,
        MasterParam::EchoWet,
        MasterParam::ReverbWet,
        MasterParam::VibeRate,
        MasterParam::VibeDepth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MasterParam::Distortion => "distortion",
            MasterParam::EchoWet => "delayMix",
            MasterParam::ReverbWet => "reverbMix",
            MasterParam::VibeRate => "vibeRate",
            MasterParam::VibeDepth => "vibeDepth",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn range(self) -> (f32, f32) {
        match self {
            MasterParam::Distortion => (0.0, 100.0),
            MasterParam::VibeRate => (0.01, 5.0),
            MasterParam::EchoWet | MasterParam::ReverbWet | MasterParam::VibeDepth => (0.0, 1.0),
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            MasterParam::Distortion => 0.0,
            MasterParam::EchoWet => 0.2,
            MasterParam::ReverbWet => 0.3,
            MasterParam::VibeRate => 0.1,
            MasterParam::VibeDepth => 0.2,
        }
    }

    /// Clamp into range; NaN falls back to the default.
    pub fn clamp(self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default_value();
        }
        let (min, max) = self.range();
        value.clamp(min, max)
    }
}

pub struct MasterBus {
    shaper: Waveshaper,
    echo: Echo,
    reverb: Reverb,
    vibe: Modulation<EchoParam>,
    distortion: f32,
    echo_wet: f32,
    reverb_wet: f32,
}

impl MasterBus {
    pub fn new(config: &EngineConfig) -> Self {
        let sr = config.sample_rate();
        let echo_wet = MasterParam::EchoWet.default_value();
        let reverb_wet = MasterParam::ReverbWet.default_value();
        Self {
            shaper: Waveshaper::new(0.0, 0.0),
            echo: Echo::new(sr, ECHO_TIME, ECHO_FEEDBACK, ECHO_TONE_HZ, echo_wet),
            reverb: Reverb::new(sr, reverb_wet),
            vibe: Modulation::new(
                Lfo::new(MasterParam::VibeRate.default_value(), sr),
                EchoParam::Feedback,
                ECHO_FEEDBACK,
                MasterParam::VibeDepth.default_value(),
            ),
            distortion: 0.0,
            echo_wet,
            reverb_wet,
        }
    }

    /// Run the chain in place over one block.
    pub fn process(&mut self, block: &mut [f32]) {
        self.vibe.apply(&mut self.echo, block.len());
        for sample in block.iter_mut() {
            let x = self.shaper.process(*sample * MASTER_GAIN);
            *sample = self.reverb.process(self.echo.process(x));
        }
    }

    pub fn echo_feedback(&self) -> f32 {
        self.echo.get_param(EchoParam::Feedback)
    }

    pub fn reset(&mut self) {
        self.echo.reset();
        self.reverb.reset();
    }
}

impl Modulatable for MasterBus {
    type Param = MasterParam;

    fn get_param(&self, param: MasterParam) -> f32 {
        match param {
            MasterParam::Distortion => self.distortion,
            MasterParam::EchoWet => self.echo_wet,
            MasterParam::ReverbWet => self.reverb_wet,
            MasterParam::VibeRate => self.vibe.rate(),
            MasterParam::VibeDepth => self.vibe.depth(),
        }
    }

    fn set_param(&mut self, param: MasterParam, value: f32) {
        let value = param.clamp(value);
        match param {
            MasterParam::Distortion => {
                self.distortion = value;
                self.shaper.set_amount(value);
                self.shaper.set_wet(if value > 0.0 { 1.0 } else { 0.0 });
            }
            MasterParam::EchoWet => {
                self.echo_wet = value;
                self.echo.set_param(EchoParam::Wet, value);
            }
            MasterParam::ReverbWet => {
                self.reverb_wet = value;
                self.reverb.set_wet(value);
            }
            MasterParam::VibeRate => self.vibe.set_rate(value),
            MasterParam::VibeDepth => self.vibe.set_depth(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_in_silence_out() {
        let mut bus = MasterBus::new(&EngineConfig::default());
        let mut block = [0.0f32; 256];
        for _ in 0..100 {
            bus.process(&mut block);
            assert!(block.iter().all(|s| *s == 0.0));
        }
    }

    #[test]
    fn vibe_sweeps_echo_feedback() {
        let config = EngineConfig::default();
        let mut bus = MasterBus::new(&config);
        let mut block = [0.0f32; 128];
        let mut lowest = f32::MAX;
        let mut highest = f32::MIN;
        // a quarter of a 0.1 Hz cycle reaches the top of the sweep
        for _ in 0..(2.6 * config.sample_rate() / 128.0) as usize {
            bus.process(&mut block);
            lowest = lowest.min(bus.echo_feedback());
            highest = highest.max(bus.echo_feedback());
        }
        assert!(lowest >= ECHO_FEEDBACK - 0.01);
        assert!(highest > ECHO_FEEDBACK + 0.19, "feedback peaked at {highest}");
        assert!(highest <= ECHO_FEEDBACK + MasterParam::VibeDepth.default_value() + 1e-4);
    }

    #[test]
    fn impulse_gets_gain_and_a_tail() {
        let mut bus = MasterBus::new(&EngineConfig::default());
        let mut block = [0.0f32; 2048];
        block[0] = 1.0;
        bus.process(&mut block);
        assert!((block[0] - MASTER_GAIN).abs() < 1e-6, "dry path is gain only");
        assert!(block[1..].iter().any(|s| *s != 0.0), "reverb adds a tail");
    }

    #[test]
    fn controls_clamp_and_read_back() {
        let mut bus = MasterBus::new(&EngineConfig::default());
        for param in MasterParam::ALL {
            assert_eq!(bus.get_param(param), param.default_value(), "{}", param.name());
        }
        bus.set_param(MasterParam::Distortion, 250.0);
        assert_eq!(bus.get_param(MasterParam::Distortion), 100.0);
        bus.set_param(MasterParam::VibeRate, 0.0);
        assert_eq!(bus.get_param(MasterParam::VibeRate), 0.01);
        bus.set_param(MasterParam::ReverbWet, f32::NAN);
        assert_eq!(bus.get_param(MasterParam::ReverbWet), 0.3);
        assert_eq!(MasterParam::from_name("delayMix"), Some(MasterParam::EchoWet));
        assert_eq!(MasterParam::from_name("volume"), None);
    }

    #[test]
    fn distortion_switches_the_shaper_in() {
        let config = EngineConfig::default();
        let mut clean = MasterBus::new(&config);
        let mut driven = MasterBus::new(&config);
        driven.set_param(MasterParam::Distortion, 50.0);
        for bus in [&mut clean, &mut driven] {
            bus.set_param(MasterParam::EchoWet, 0.0);
            bus.set_param(MasterParam::ReverbWet, 0.0);
        }

        let mut a = [0.5f32; 64];
        let mut b = [0.5f32; 64];
        clean.process(&mut a);
        driven.process(&mut b);
        assert!((a[0] - 0.5 * MASTER_GAIN).abs() < 1e-6, "no drive is a straight gain");
        assert!((b[0] - a[0]).abs() > 0.05, "drive reshapes the signal: {} vs {}", b[0], a[0]);
    }
}
