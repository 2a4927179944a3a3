//! PN-DSP — Peak analysis and gain for offline normalization
//!
//! Pure functions over an interleaved in-memory sample buffer:
//! - Peak magnitude scan
//! - Peak normalization (scale so the peak lands on a target)
//! - Level statistics (min, max, peak, RMS, crest factor)
//!
//! Nothing in here allocates beyond the caller's buffer or touches I/O,
//! so every function is safe to call from any worker thread on a buffer
//! that thread owns.
//!
//! ## Usage
//!
//! ```rust
//! use pn_dsp::{compute_stats, normalize, NormalizeOutcome};
//!
//! let mut samples = vec![0.25, -0.5, 0.1];
//! let outcome = normalize(&mut samples, 0.9);
//! assert!(matches!(outcome, NormalizeOutcome::Scaled { .. }));
//!
//! let stats = compute_stats(&samples).unwrap();
//! assert!((stats.peak - 0.9).abs() < 1e-9);
//! ```

mod peak;
mod stats;

pub use peak::*;
pub use stats::*;

/// Sample type used throughout the pipeline (f64 for headroom during gain)
pub type Sample = f64;

/// Convert linear amplitude to dBFS (`-inf` for zero)
#[inline]
pub fn linear_to_db(linear: Sample) -> Sample {
    if linear <= 0.0 {
        Sample::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Convert dBFS to linear amplitude
#[inline]
pub fn db_to_linear(db: Sample) -> Sample {
    10.0_f64.powf(db / 20.0)
}
