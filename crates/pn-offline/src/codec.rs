//! Codec adapter seam between the worker pool and audio files
//!
//! Workers only see [`AudioCodec`]; the file-backed implementation lives in
//! [`FileCodec`], and tests substitute in-memory fakes.

use std::path::Path;

use pn_dsp::Sample;

use crate::decoder::AudioDecoder;
use crate::encoder::WavEncoder;
use crate::error::OfflineResult;

/// Format metadata carried from decode to encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Interleaved channel count
    pub channels: u16,
    /// Sample rate (Hz)
    pub sample_rate: u32,
    /// Source bit depth (informational; output is always 32-bit float)
    pub bits_per_sample: u16,
    /// Frame count announced by the container (0 when unknown)
    pub frames: u64,
}

impl AudioFormat {
    /// Duration in seconds of `frames` at this rate
    pub fn duration_secs(&self, frames: u64) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            frames as f64 / self.sample_rate as f64
        }
    }
}

/// Decoded audio owned by a single worker
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved samples in [-1.0, 1.0]
    pub samples: Vec<Sample>,
    /// Source format
    pub format: AudioFormat,
}

impl DecodedAudio {
    /// Frames actually decoded
    pub fn frames_read(&self) -> u64 {
        if self.format.channels == 0 {
            0
        } else {
            (self.samples.len() / self.format.channels as usize) as u64
        }
    }

    /// Decoded frame count differs from the container's announcement
    pub fn is_partial(&self) -> bool {
        self.format.frames != 0 && self.frames_read() != self.format.frames
    }
}

/// Outcome of a successful encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeReport {
    pub frames_written: u64,
}

/// Decode/encode capability used by workers.
///
/// Implementations must be shareable across the pool; each call works on
/// buffers owned by the calling worker.
pub trait AudioCodec: Send + Sync {
    /// Decode a whole file into memory
    fn decode(&self, path: &Path) -> OfflineResult<DecodedAudio>;

    /// Write `samples` with `format` to `path`
    fn encode(
        &self,
        path: &Path,
        samples: &[Sample],
        format: &AudioFormat,
    ) -> OfflineResult<EncodeReport>;
}

/// File-backed codec: hound for WAV, symphonia for everything else,
/// 32-bit float WAV on output.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileCodec;

impl AudioCodec for FileCodec {
    fn decode(&self, path: &Path) -> OfflineResult<DecodedAudio> {
        AudioDecoder::decode(path)
    }

    fn encode(
        &self,
        path: &Path,
        samples: &[Sample],
        format: &AudioFormat,
    ) -> OfflineResult<EncodeReport> {
        WavEncoder::float32().write(path, samples, format)
    }
}
