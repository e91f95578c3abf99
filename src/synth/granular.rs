use std::f32::consts::TAU;

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{dsp::Envelope, synth::voice::SynthVoice};

/*
Granular Cloud
==============

A cloud is a swarm of short windowed reads ("grains") from one source
buffer. Each grain starts somewhere near `position`, plays forward at its
own speed and fades in and out under a Hann window. Many overlapping grains
blur into a texture that keeps the source's timbre but loses its timeline.

    source ─┬─ grain 0:  ▁▃▅▇▅▃▁
            ├─ grain 1:       ▁▃▅▇▅▃▁
            ├─ grain 2:    ▁▃▅▇▅▃▁
            └─ ...                     ──(+)──→ × 0.5 → out


Vocabulary
----------

  position    Centre of the read region, as a fraction of the buffer [0, 1].

  spread      Random jitter around `position`, also a fraction. A grain
              starts at (position + uniform(-spread, spread)) · len,
              clamped into the buffer.

  grain size  Grain lifetime in seconds.

  density     Grains per second. The next spawn is sr/density · uniform(0.5,
              1.5) samples away, so grains never line up into a comb.

  pitch       Read increment per output sample. 2.0 reads twice as fast and
              sounds an octave up.


The Pool
--------

There are exactly 64 slots and nothing is allocated while playing. A spawn
takes the first inactive slot. If every slot is busy the spawn is dropped
and counted: density is a target, not a promise.

Grain windows:

    w(age) = 0.5 · (1 - cos(2π · age / lifetime))

A grain is retired the sample its age reaches its lifetime, so the window
never wraps into a second lobe.
*/

pub const GRAIN_POOL_SIZE: usize = 64;
const GRAIN_GAIN: f32 = 0.5;
/// Cloud fade-in at the start of a note.
const CLOUD_ATTACK: f32 = 0.1;
/// Source pitch the note map treats as unity speed (A3).
pub const UNITY_NOTE: u8 = 57;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Grain {
    pub active: bool,
    /// Read head into the source, in samples.
    pub position: f32,
    pub increment: f32,
    pub age: u32,
    pub lifetime: u32,
}

/// Control values of a cloud, read once per block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudParams {
    pub position: f32,
    pub spread: f32,
    pub grain_size: f32,
    pub density: f32,
    pub pitch: f32,
}

impl Default for CloudParams {
    fn default() -> Self {
        Self {
            position: 0.5,
            spread: 0.1,
            grain_size: 0.1,
            density: 20.0,
            pitch: 1.0,
        }
    }
}

impl CloudParams {
    /// Clamp every field into its playable range.
    pub fn clamped(self) -> Self {
        Self {
            position: self.position.clamp(0.0, 1.0),
            spread: self.spread.clamp(0.0, 1.0),
            grain_size: self.grain_size.clamp(0.01, 1.0),
            density: self.density.clamp(1.0, 100.0),
            pitch: self.pitch.clamp(0.1, 4.0),
        }
    }
}

/// Read-only state every granular voice renders from.
#[derive(Debug, Clone)]
pub struct CloudState {
    pub source: std::sync::Arc<[f32]>,
    pub params: CloudParams,
}

pub struct GrainCloud {
    grains: [Grain; GRAIN_POOL_SIZE],
    until_spawn: f32,
    rng: SmallRng,
    sample_rate: f32,
    spawned: u64,
    dropped: u64,
}

impl GrainCloud {
    pub fn new(sample_rate: f32, seed: u64) -> Self {
        Self {
            grains: [Grain::default(); GRAIN_POOL_SIZE],
            until_spawn: 0.0,
            rng: SmallRng::seed_from_u64(seed),
            sample_rate,
            spawned: 0,
            dropped: 0,
        }
    }

    /// Retire every grain and spawn again on the next sample.
    pub fn reset(&mut self, seed: u64) {
        self.grains = [Grain::default(); GRAIN_POOL_SIZE];
        self.until_spawn = 0.0;
        self.rng = SmallRng::seed_from_u64(seed);
        self.spawned = 0;
        self.dropped = 0;
    }

    /// One output sample. `increment` is the read speed of grains spawned
    /// on this sample; grains already sounding keep their own.
    #[inline]
    pub fn next_sample(&mut self, source: &[f32], params: &CloudParams, increment: f32) -> f32 {
        if source.is_empty() {
            return 0.0;
        }

        self.until_spawn -= 1.0;
        if self.until_spawn <= 0.0 {
            self.spawn(source.len(), params, increment);
            let interval = self.sample_rate / params.density.max(1.0);
            self.until_spawn = interval * (0.5 + self.rng.random::<f32>());
        }

        let mut out = 0.0;
        for grain in self.grains.iter_mut().filter(|g| g.active) {
            let index = grain.position.floor();
            if index >= 0.0 && (index as usize) < source.len() {
                let phase = grain.age as f32 / grain.lifetime as f32;
                let window = 0.5 * (1.0 - (TAU * phase).cos());
                out += source[index as usize] * window * GRAIN_GAIN;
            }

            grain.position += grain.increment;
            grain.age += 1;
            if grain.age >= grain.lifetime {
                grain.active = false;
            }
        }
        out
    }

    fn spawn(&mut self, len: usize, params: &CloudParams, increment: f32) {
        let Some(grain) = self.grains.iter_mut().find(|g| !g.active) else {
            self.dropped += 1;
            return;
        };

        let offset = (self.rng.random::<f32>() * 2.0 - 1.0) * params.spread;
        let start = ((params.position + offset) * len as f32).clamp(0.0, (len - 1) as f32);
        *grain = Grain {
            active: true,
            position: start,
            increment,
            age: 0,
            lifetime: ((params.grain_size * self.sample_rate).round() as u32).max(1),
        };
        self.spawned += 1;
    }

    pub fn grains(&self) -> &[Grain; GRAIN_POOL_SIZE] {
        &self.grains
    }

    pub fn active_grains(&self) -> usize {
        self.grains.iter().filter(|g| g.active).count()
    }

    /// Grains started since the last reset.
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    /// Spawns lost to a full pool since the last reset.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Read speed for `note` at a cloud `pitch` multiplier.
pub fn pitch_ratio(note: u8, pitch: f32) -> f32 {
    let semitones = note as f32 - UNITY_NOTE as f32;
    (2.0f32.powf(semitones / 12.0) * pitch).clamp(0.1, 4.0)
}

/// One granular note: a cloud under a slow fade in and a linear fade out
/// across the note.
pub struct GranularVoice {
    cloud: GrainCloud,
    note: u8,
    amp: Envelope,
    sample_rate: f32,
}

impl GranularVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            cloud: GrainCloud::new(sample_rate, 0),
            note: UNITY_NOTE,
            amp: Envelope::new(0.0, sample_rate),
            sample_rate,
        }
    }

    pub fn start(&mut self, note: u8, duration: f32, seed: u64) {
        self.cloud.reset(seed);
        self.note = note;
        let attack = CLOUD_ATTACK.min(duration.max(0.0));
        self.amp = Envelope::new(0.0, self.sample_rate)
            .linear_to(1.0, attack)
            .linear_to(0.0, duration.max(attack));
    }

    pub fn cloud(&self) -> &GrainCloud {
        &self.cloud
    }
}

impl SynthVoice for GranularVoice {
    type Shared = CloudState;

    #[inline]
    fn next_sample(&mut self, shared: &CloudState) -> f32 {
        let increment = pitch_ratio(self.note, shared.params.pitch);
        self.cloud.next_sample(&shared.source, &shared.params, increment) * self.amp.next_sample()
    }

    fn is_finished(&self) -> bool {
        self.amp.is_finished() && self.amp.level() == 0.0
    }

    fn release(&mut self, seconds: f32) {
        self.amp.release(seconds);
    }
}
