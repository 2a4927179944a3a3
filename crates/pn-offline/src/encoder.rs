//! Audio encoding module
//!
//! Output is WAV (via hound), 32-bit IEEE float, with channel count and
//! sample rate copied from the source. Float output keeps the normalized
//! peak exact and never needs dithering or clipping.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use pn_dsp::Sample;

use crate::codec::{AudioFormat, EncodeReport};
use crate::error::{OfflineError, OfflineResult};

// ═══════════════════════════════════════════════════════════════════════════════
// WAV ENCODER
// ═══════════════════════════════════════════════════════════════════════════════

/// WAV encoder using hound
#[derive(Debug, Clone, Copy)]
pub struct WavEncoder {
    bits_per_sample: u16,
}

impl WavEncoder {
    /// 32-bit float WAV
    pub fn float32() -> Self {
        Self {
            bits_per_sample: 32,
        }
    }

    fn spec(&self, format: &AudioFormat) -> OfflineResult<hound::WavSpec> {
        if format.channels == 0 {
            return Err(OfflineError::EncodingError("zero channels".to_string()));
        }
        if format.sample_rate == 0 {
            return Err(OfflineError::EncodingError("zero sample rate".to_string()));
        }

        Ok(hound::WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: hound::SampleFormat::Float,
        })
    }

    /// Create `path` (and missing parent directories) and write all samples
    pub fn write(
        &self,
        path: &Path,
        samples: &[Sample],
        format: &AudioFormat,
    ) -> OfflineResult<EncodeReport> {
        let spec = self.spec(format)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| OfflineError::WriteError(format!("{}: {}", parent.display(), e)))?;
            }
        }

        let file = File::create(path)
            .map_err(|e| OfflineError::WriteError(format!("{}: {}", path.display(), e)))?;

        self.write_to(BufWriter::new(file), spec, samples)
    }

    /// Encode into any seekable writer
    pub fn write_to<W: Write + Seek>(
        &self,
        writer: W,
        spec: hound::WavSpec,
        samples: &[Sample],
    ) -> OfflineResult<EncodeReport> {
        let mut writer = hound::WavWriter::new(writer, spec)
            .map_err(|e| OfflineError::EncodingError(e.to_string()))?;

        let channels = spec.channels as usize;
        let whole = samples.len() - samples.len() % channels;

        for &sample in &samples[..whole] {
            writer
                .write_sample(sample as f32)
                .map_err(|e| OfflineError::EncodingError(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| OfflineError::EncodingError(e.to_string()))?;

        Ok(EncodeReport {
            frames_written: (whole / channels) as u64,
        })
    }
}
