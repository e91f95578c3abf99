//! Voice trait and the fixed voice pool every instrument renders through.
//!
//! A voice is created by a trigger that already knows its start frame and
//! lifetime on the audio clock. The pool stores voices inline in preallocated
//! slots; triggering reuses a free slot (first fit) and never allocates. A
//! full pool drops the trigger and counts it.

/// Fade applied when voices are silenced early.
pub const RELEASE_SECONDS: f32 = 0.005;

/// One sounding note inside a synthesis engine.
pub trait SynthVoice: Send {
    /// State shared by every voice of an instrument (e.g. a granular source).
    type Shared: ?Sized;

    fn next_sample(&mut self, shared: &Self::Shared) -> f32;

    /// True once the voice can no longer produce sound.
    fn is_finished(&self) -> bool;

    /// Fade to silence over `seconds`.
    fn release(&mut self, seconds: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Waiting for its start frame or sounding
    Releasing, // Forced fade in progress
}

struct Slot<V> {
    voice: V,
    state: VoiceState,
    start_frame: u64,
    end_frame: u64,
}

pub struct VoicePool<V> {
    slots: Box<[Slot<V>]>,
    dropped: u64,
}

impl<V: SynthVoice> VoicePool<V> {
    /// Preallocate `capacity` voices built by `make`.
    pub fn new(capacity: usize, mut make: impl FnMut() -> V) -> Self {
        let slots = (0..capacity.max(1))
            .map(|_| Slot {
                voice: make(),
                state: VoiceState::Free,
                start_frame: 0,
                end_frame: 0,
            })
            .collect();
        Self { slots, dropped: 0 }
    }

    /// Claim the first free slot for `[start_frame, end_frame)`.
    ///
    /// The caller initialises the returned voice. `None` means the pool is
    /// full and the trigger was dropped.
    pub fn allocate(&mut self, start_frame: u64, end_frame: u64) -> Option<&mut V> {
        match self.slots.iter_mut().find(|s| s.state == VoiceState::Free) {
            Some(slot) => {
                slot.state = VoiceState::Active;
                slot.start_frame = start_frame;
                slot.end_frame = end_frame.max(start_frame);
                Some(&mut slot.voice)
            }
            None => {
                self.dropped += 1;
                None
            }
        }
    }

    /// Mix every live voice into `out`, which starts at `block_start` on the
    /// audio clock. Voices start on their exact frame inside the block.
    pub fn render_add(&mut self, out: &mut [f32], block_start: u64, shared: &V::Shared) {
        let block_end = block_start + out.len() as u64;

        for slot in self.slots.iter_mut() {
            if slot.state == VoiceState::Free || slot.start_frame >= block_end {
                continue;
            }

            let first = slot.start_frame.saturating_sub(block_start) as usize;
            for (offset, sample) in out[first..].iter_mut().enumerate() {
                let frame = block_start + (first + offset) as u64;
                if frame >= slot.end_frame || slot.voice.is_finished() {
                    slot.state = VoiceState::Free;
                    break;
                }
                *sample += slot.voice.next_sample(shared);
            }
        }
    }

    /// Run `f` on every voice that has not been freed.
    pub fn for_each_active(&mut self, mut f: impl FnMut(&mut V)) {
        for slot in self.slots.iter_mut() {
            if slot.state != VoiceState::Free {
                f(&mut slot.voice);
            }
        }
    }

    /// Read-only pass over every voice that has not been freed.
    pub fn for_each_live(&self, mut f: impl FnMut(&V)) {
        for slot in self.slots.iter().filter(|s| s.state != VoiceState::Free) {
            f(&slot.voice);
        }
    }

    /// Fade every live voice out. Voices that have not started yet are freed.
    pub fn release_all(&mut self, block_start: u64) {
        for slot in self.slots.iter_mut() {
            match slot.state {
                VoiceState::Free => {}
                _ if slot.start_frame > block_start => slot.state = VoiceState::Free,
                _ => {
                    slot.voice.release(RELEASE_SECONDS);
                    slot.state = VoiceState::Releasing;
                }
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state != VoiceState::Free)
            .count()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Triggers lost to a full pool since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emits 1.0 until released, then nothing.
    struct Counter {
        released: bool,
    }

    impl SynthVoice for Counter {
        type Shared = ();

        fn next_sample(&mut self, _shared: &()) -> f32 {
            if self.released {
                0.0
            } else {
                1.0
            }
        }

        fn is_finished(&self) -> bool {
            self.released
        }

        fn release(&mut self, _seconds: f32) {
            self.released = true;
        }
    }

    fn pool(capacity: usize) -> VoicePool<Counter> {
        VoicePool::new(capacity, || Counter { released: false })
    }

    #[test]
    fn voice_starts_on_its_frame_inside_the_block() {
        let mut voices = pool(4);
        voices.allocate(70, 1_000);

        let mut block = [0.0; 64];
        voices.render_add(&mut block, 0, &());
        assert!(block.iter().all(|s| *s == 0.0), "voice must not start early");

        let mut block = [0.0; 64];
        voices.render_add(&mut block, 64, &());
        assert!(block[..6].iter().all(|s| *s == 0.0));
        assert!(block[6..].iter().all(|s| *s == 1.0));
    }

    #[test]
    fn voice_is_freed_at_its_end_frame() {
        let mut voices = pool(4);
        voices.allocate(0, 10);

        let mut block = [0.0; 32];
        voices.render_add(&mut block, 0, &());
        assert_eq!(block.iter().sum::<f32>(), 10.0);
        assert_eq!(voices.active_count(), 0);
    }

    #[test]
    fn late_trigger_starts_at_block_start() {
        let mut voices = pool(1);
        voices.allocate(5, 1_000);

        let mut block = [0.0; 16];
        voices.render_add(&mut block, 100, &());
        assert!(block.iter().all(|s| *s == 1.0));
    }

    #[test]
    fn full_pool_drops_and_counts() {
        let mut voices = pool(2);
        assert!(voices.allocate(0, 10).is_some());
        assert!(voices.allocate(0, 10).is_some());
        assert!(voices.allocate(0, 10).is_none());
        assert_eq!(voices.dropped(), 1);
        assert_eq!(voices.active_count(), 2);
    }

    #[test]
    fn release_all_frees_pending_and_fades_sounding() {
        let mut voices = pool(2);
        voices.allocate(0, 1_000);
        voices.allocate(500, 1_000);

        voices.release_all(10);
        assert_eq!(voices.active_count(), 1, "pending voice is dropped outright");

        let mut block = [0.0; 8];
        voices.render_add(&mut block, 10, &());
        assert_eq!(voices.active_count(), 0);
    }
}
