//! Level statistics over a sample buffer

use crate::{Sample, linear_to_db};

/// Summary levels of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalStats {
    /// Most negative sample
    pub min: Sample,
    /// Most positive sample
    pub max: Sample,
    /// Peak magnitude, `max(|min|, |max|)`
    pub peak: Sample,
    /// Root mean square
    pub rms: Sample,
    /// Crest factor `peak / rms` (0.0 when `rms` is 0)
    pub peak_to_rms: Sample,
}

impl SignalStats {
    /// Peak level (dBFS)
    pub fn peak_db(&self) -> Sample {
        linear_to_db(self.peak)
    }

    /// RMS level (dBFS)
    pub fn rms_db(&self) -> Sample {
        linear_to_db(self.rms)
    }
}

/// Compute [`SignalStats`] in a single pass. `None` for an empty buffer.
pub fn compute_stats(samples: &[Sample]) -> Option<SignalStats> {
    let first = *samples.first()?;

    let mut min = first;
    let mut max = first;
    let mut sum_squares = 0.0;

    for &sample in samples {
        min = min.min(sample);
        max = max.max(sample);
        sum_squares += sample * sample;
    }

    let peak = min.abs().max(max.abs());
    let rms = (sum_squares / samples.len() as Sample).sqrt();
    let peak_to_rms = if rms > 0.0 { peak / rms } else { 0.0 };

    Some(SignalStats {
        min,
        max,
        peak,
        rms,
        peak_to_rms,
    })
}
