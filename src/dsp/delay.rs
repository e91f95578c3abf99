use crate::MAX_DELAY_SAMPLES;

/*
Waveguide Delay Line
====================

A fixed-capacity ring buffer. Waveguide models use it as the "string" or the
"bore": whatever is written now comes back out exactly `delay` samples later.

Vocabulary
----------

  capacity    Number of slots in the ring (2048). Storage is inline, so a
              delay line can live inside a voice struct without allocating.

  delay       Distance in samples between the write and the read pointer.
              For a waveguide this is the pitch period:
                  delay = sample_rate / frequency

  read/write  One sample is read and one is written per tick. The read
              happens first, so the value written at tick n is returned at
              tick n + delay.


Pointer Arithmetic
------------------

    read_index = (write_pos - delay + capacity) % capacity

Adding `capacity` before the modulo keeps the subtraction non-negative.
Capacity bounds the lowest pitch a waveguide can play:

    44.1 kHz / 2047 samples ≈ 21.5 Hz

Anything lower has to be clamped by the caller.
*/

/// Ring capacity for every waveguide delay line.
pub const DELAY_CAPACITY: usize = MAX_DELAY_SAMPLES;

#[derive(Clone)]
pub struct DelayLine {
    buffer: [f32; DELAY_CAPACITY],
    write_pos: usize,
    delay: usize,
}

impl DelayLine {
    pub fn new() -> Self {
        Self {
            buffer: [0.0; DELAY_CAPACITY],
            write_pos: 0,
            delay: 1,
        }
    }

    /// Set the read distance, clamped to `1..DELAY_CAPACITY`.
    pub fn set_delay(&mut self, delay_samples: usize) {
        self.delay = delay_samples.clamp(1, DELAY_CAPACITY - 1);
    }

    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Sample written `delay` ticks ago.
    #[inline]
    pub fn read(&self) -> f32 {
        let read_pos = (self.write_pos + DELAY_CAPACITY - self.delay) % DELAY_CAPACITY;
        self.buffer[read_pos]
    }

    /// Store a sample at the write pointer and advance it.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % DELAY_CAPACITY;
    }

    /// Plain delay: read, then write `sample`.
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let delayed = self.read();
        self.write(sample);
        delayed
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_returns_after_delay() {
        let mut line = DelayLine::new();
        line.set_delay(100);

        assert_eq!(line.process(1.0), 0.0);
        for _ in 0..99 {
            assert_eq!(line.process(0.0), 0.0);
        }
        assert_eq!(line.process(0.0), 1.0, "impulse should reappear after 100 ticks");
    }

    #[test]
    fn delay_is_clamped_to_capacity() {
        let mut line = DelayLine::new();
        line.set_delay(10_000);
        assert_eq!(line.delay(), DELAY_CAPACITY - 1);
        line.set_delay(0);
        assert_eq!(line.delay(), 1);
    }

    #[test]
    fn wraps_around_the_ring() {
        let mut line = DelayLine::new();
        line.set_delay(3);
        for i in 0..(DELAY_CAPACITY * 2) {
            let out = line.process(i as f32);
            if i >= 3 {
                assert_eq!(out, (i - 3) as f32);
            }
        }
    }
}
