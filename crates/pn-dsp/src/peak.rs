//! Peak scan and peak normalization

use crate::Sample;

/// Result of a normalization pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizeOutcome {
    /// Every sample was multiplied by `factor`
    Scaled {
        /// Peak magnitude before scaling
        original_peak: Sample,
        /// Applied gain (`target / original_peak`)
        factor: Sample,
    },
    /// Buffer was empty or all zeros; left untouched
    Silent,
    /// Buffer holds NaN or infinity; left untouched
    NonFinite,
}

impl NormalizeOutcome {
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Silent)
    }
}

/// Maximum absolute sample value (0.0 for an empty or silent buffer)
pub fn scan_peak(samples: &[Sample]) -> Sample {
    samples.iter().map(|s| s.abs()).fold(0.0, Sample::max)
}

/// Multiply every sample by `gain`
pub fn apply_gain(samples: &mut [Sample], gain: Sample) {
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}

/// Scale `samples` in place so their peak magnitude equals `target_peak`.
///
/// A silent buffer is returned as-is with [`NormalizeOutcome::Silent`];
/// this is a no-op outcome, not an error. A buffer containing NaN or
/// infinity is also left as-is, with [`NormalizeOutcome::NonFinite`].
/// The factor comes from the true peak, so the output peak is
/// `target_peak` up to rounding and no clipping pass follows.
pub fn normalize(samples: &mut [Sample], target_peak: Sample) -> NormalizeOutcome {
    if samples.iter().any(|s| !s.is_finite()) {
        return NormalizeOutcome::NonFinite;
    }

    let original_peak = scan_peak(samples);
    if original_peak == 0.0 {
        return NormalizeOutcome::Silent;
    }

    let factor = target_peak / original_peak;
    apply_gain(samples, factor);

    NormalizeOutcome::Scaled {
        original_peak,
        factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine(len: usize, amplitude: Sample) -> Vec<Sample> {
        (0..len)
            .map(|i| amplitude * (i as Sample * 0.05).sin())
            .collect()
    }

    #[test]
    fn test_scan_peak() {
        assert_eq!(scan_peak(&[]), 0.0);
        assert_eq!(scan_peak(&[0.0, 0.0]), 0.0);
        assert_relative_eq!(scan_peak(&[0.5, -0.8, 0.3, -0.2]), 0.8);
    }

    #[test]
    fn test_normalize_hits_target() {
        for &target in &[0.1, 0.5, 0.9, 1.0] {
            let mut samples = sine(2048, 0.37);
            let outcome = normalize(&mut samples, target);

            assert!(!outcome.is_silent());
            assert_relative_eq!(scan_peak(&samples), target, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_normalize_reports_factor() {
        let mut samples = vec![0.25, -0.5];
        let outcome = normalize(&mut samples, 1.0);

        match outcome {
            NormalizeOutcome::Scaled {
                original_peak,
                factor,
            } => {
                assert_relative_eq!(original_peak, 0.5);
                assert_relative_eq!(factor, 2.0);
            }
            other => panic!("expected scaling, got {:?}", other),
        }
        assert_eq!(samples, vec![0.5, -1.0]);
    }

    #[test]
    fn test_normalize_twice_is_stable() {
        let mut once = sine(1000, 0.2);
        normalize(&mut once, 0.9);

        let mut twice = once.clone();
        normalize(&mut twice, 0.9);

        for (a, b) in once.iter().zip(&twice) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normalize_silence_untouched() {
        let mut samples = vec![0.0; 64];
        let outcome = normalize(&mut samples, 0.9);

        assert_eq!(outcome, NormalizeOutcome::Silent);
        assert!(samples.iter().all(|s| *s == 0.0 && !s.is_nan()));
    }

    #[test]
    fn test_normalize_non_finite_untouched() {
        let mut samples = vec![0.5, Sample::INFINITY, -0.25];
        assert_eq!(normalize(&mut samples, 1.0), NormalizeOutcome::NonFinite);
        assert_eq!(samples[0], 0.5);
        assert_eq!(samples[2], -0.25);

        let mut samples = vec![0.5, Sample::NAN];
        assert_eq!(normalize(&mut samples, 1.0), NormalizeOutcome::NonFinite);
        assert_eq!(samples[0], 0.5);
    }

    #[test]
    fn test_normalize_empty_buffer() {
        let mut samples: Vec<Sample> = Vec::new();
        assert_eq!(normalize(&mut samples, 1.0), NormalizeOutcome::Silent);
    }

    #[test]
    fn test_normalize_attenuates_hot_signal() {
        let mut samples = vec![1.5, -2.0, 0.5];
        normalize(&mut samples, 1.0);
        assert_relative_eq!(scan_peak(&samples), 1.0);
        assert_relative_eq!(samples[0], 0.75);
    }
}
