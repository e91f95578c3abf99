use proptest::prelude::*;
use synthsmith::{
    dsp::DelayLine,
    engine::to_pcm_i16,
    synth::{reed::bore_length, string::delay_length},
};

const SAMPLE_RATE: f32 = 44_100.0;

proptest! {
    #[test]
    fn string_delay_is_rounded_period(frequency in 22.0f32..20_000.0) {
        let expected = ((SAMPLE_RATE / frequency).round() as usize).clamp(2, 2047);
        prop_assert_eq!(delay_length(SAMPLE_RATE, frequency), expected);
    }

    #[test]
    fn reed_bore_is_rounded_half_period(frequency in 11.0f32..20_000.0) {
        let expected = ((SAMPLE_RATE / (2.0 * frequency)).round() as usize).clamp(2, 2047);
        prop_assert_eq!(bore_length(SAMPLE_RATE, frequency), expected);
    }

    #[test]
    fn delay_line_returns_input_after_delay(delay in 1usize..2047, value in -1.0f32..1.0) {
        let mut line = DelayLine::new();
        line.set_delay(delay);
        prop_assert_eq!(line.process(value), 0.0);
        for _ in 1..delay {
            prop_assert_eq!(line.process(0.0), 0.0);
        }
        prop_assert_eq!(line.process(0.0), value);
    }

    #[test]
    fn pcm_never_overflows(samples in prop::collection::vec(any::<f32>(), 0..256)) {
        let pcm = to_pcm_i16(&samples);
        prop_assert_eq!(pcm.len(), samples.len());
        for (s, p) in samples.iter().zip(&pcm) {
            if s.is_nan() {
                prop_assert_eq!(*p, 0);
            } else if *s >= 1.0 {
                prop_assert_eq!(*p, i16::MAX);
            } else if *s <= -1.0 {
                prop_assert_eq!(*p, i16::MIN);
            } else {
                prop_assert_eq!(p.signum() as f32, if *p == 0 { 0.0 } else { s.signum() });
            }
        }
    }
}

#[test]
fn concert_a_delay_lengths() {
    assert_eq!(delay_length(SAMPLE_RATE, 440.0), 100);
    assert_eq!(bore_length(SAMPLE_RATE, 440.0), 50);
}
