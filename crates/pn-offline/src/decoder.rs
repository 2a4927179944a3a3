//! Audio decoding module
//!
//! - WAV via hound (fast path, exact frame accounting)
//! - AIFF, FLAC, MP3, OGG Vorbis via symphonia
//!
//! Everything is decoded to interleaved `f64` in [-1.0, 1.0]. A stream that
//! ends early is returned with whatever was decoded; the caller compares
//! [`DecodedAudio::frames_read`] against [`AudioFormat::frames`].
//! Non-finite samples are rejected as a read error.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use pn_dsp::Sample;

use crate::codec::{AudioFormat, DecodedAudio};
use crate::error::{OfflineError, OfflineResult};

// ═══════════════════════════════════════════════════════════════════════════════
// DECODER
// ═══════════════════════════════════════════════════════════════════════════════

/// Universal audio decoder
pub struct AudioDecoder;

impl AudioDecoder {
    /// Decode audio file, dispatching on extension
    pub fn decode(path: &Path) -> OfflineResult<DecodedAudio> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let audio = match extension.as_str() {
            "wav" | "wave" => Self::decode_wav(path)?,
            _ => Self::decode_symphonia(path)?,
        };

        if let Some(index) = audio.samples.iter().position(|s| !s.is_finite()) {
            return Err(OfflineError::ReadError(format!(
                "{}: non-finite sample at index {}",
                path.display(),
                index
            )));
        }

        Ok(audio)
    }

    /// Decode WAV file with hound
    fn decode_wav(path: &Path) -> OfflineResult<DecodedAudio> {
        let reader = hound::WavReader::open(path)
            .map_err(|e| OfflineError::ReadError(format!("{}: {}", path.display(), e)))?;

        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(OfflineError::ReadError(format!(
                "{}: zero channels",
                path.display()
            )));
        }

        let format = AudioFormat {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            frames: reader.duration() as u64,
        };

        let mut samples: Vec<Sample> = Vec::with_capacity(reader.len() as usize);

        match spec.sample_format {
            hound::SampleFormat::Int => {
                if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                    return Err(OfflineError::UnsupportedFormat(format!(
                        "{}-bit integer PCM",
                        spec.bits_per_sample
                    )));
                }
                let scale = (1i64 << (spec.bits_per_sample - 1)) as Sample;
                for sample in reader.into_samples::<i32>() {
                    match sample {
                        Ok(s) => samples.push(s as Sample / scale),
                        Err(e) => {
                            log::debug!("{}: stopped after {} samples: {}", path.display(), samples.len(), e);
                            break;
                        }
                    }
                }
            }
            hound::SampleFormat::Float => {
                for sample in reader.into_samples::<f32>() {
                    match sample {
                        Ok(s) => samples.push(s as Sample),
                        Err(e) => {
                            log::debug!("{}: stopped after {} samples: {}", path.display(), samples.len(), e);
                            break;
                        }
                    }
                }
            }
        }

        // Drop a trailing partial frame so the buffer stays interleaved
        let whole = samples.len() - samples.len() % spec.channels as usize;
        samples.truncate(whole);

        Ok(DecodedAudio { samples, format })
    }

    /// Decode any symphonia-supported container (first audio track)
    fn decode_symphonia(path: &Path) -> OfflineResult<DecodedAudio> {
        let file = File::open(path)
            .map_err(|e| OfflineError::ReadError(format!("Failed to open file: {}", e)))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| OfflineError::ReadError(format!("Failed to probe format: {}", e)))?;

        let mut reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| OfflineError::ReadError("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| OfflineError::ReadError(format!("Failed to create decoder: {}", e)))?;

        let mut format = AudioFormat {
            channels: codec_params.channels.map(|c| c.count() as u16).unwrap_or(0),
            sample_rate: codec_params.sample_rate.unwrap_or(0),
            bits_per_sample: codec_params.bits_per_sample.unwrap_or(0) as u16,
            frames: codec_params.n_frames.unwrap_or(0),
        };

        let mut samples: Vec<Sample> = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;
        // Set when the stream stops before its natural end
        let mut cut_short = false;

        loop {
            let packet = match reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    if samples.is_empty() {
                        return Err(OfflineError::ReadError(format!("Packet read error: {}", e)));
                    }
                    // Keep what was decoded; reported as a partial read
                    log::debug!("{}: packet read error after {} samples: {}", path.display(), samples.len(), e);
                    cut_short = true;
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    if format.channels == 0 {
                        format.channels = spec.channels.count() as u16;
                    }
                    if format.sample_rate == 0 {
                        format.sample_rate = spec.rate;
                    }

                    let buf = sample_buf
                        .get_or_insert_with(|| SampleBuffer::new(decoded.capacity() as u64, spec));
                    buf.copy_interleaved_ref(decoded);
                    samples.extend(buf.samples().iter().map(|&s| s as Sample));
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    log::debug!("{}: skipping undecodable packet: {}", path.display(), e);
                    continue;
                }
                Err(e) => {
                    if samples.is_empty() {
                        return Err(OfflineError::ReadError(format!("Decode error: {}", e)));
                    }
                    log::debug!("{}: decoder error after {} samples: {}", path.display(), samples.len(), e);
                    cut_short = true;
                    break;
                }
            }
        }

        if format.channels == 0 {
            return Err(OfflineError::ReadError(format!(
                "{}: channel layout unknown",
                path.display()
            )));
        }

        // Container frame counts are not exact for every format (AIFF is
        // off by a few frames), so only a stream that was cut short keeps
        // the announced count for the partial-read comparison.
        let whole = samples.len() - samples.len() % format.channels as usize;
        samples.truncate(whole);
        let decoded_frames = (whole / format.channels as usize) as u64;
        if !cut_short || format.frames == 0 {
            format.frames = decoded_frames;
        }

        Ok(DecodedAudio { samples, format })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn write_int16(path: &Path, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    /// 16-bit big-endian PCM AIFF at 44.1 kHz
    fn write_aiff16(path: &Path, channels: u16, samples: &[i16]) {
        let frames = (samples.len() / channels as usize) as u32;
        let data_len = (samples.len() * 2) as u32;

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"FORM");
        bytes.extend_from_slice(&(46 + data_len).to_be_bytes());
        bytes.extend_from_slice(b"AIFF");

        bytes.extend_from_slice(b"COMM");
        bytes.extend_from_slice(&18u32.to_be_bytes());
        bytes.extend_from_slice(&channels.to_be_bytes());
        bytes.extend_from_slice(&frames.to_be_bytes());
        bytes.extend_from_slice(&16u16.to_be_bytes());
        // 44100.0 as 80-bit extended
        bytes.extend_from_slice(&[0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0]);

        bytes.extend_from_slice(b"SSND");
        bytes.extend_from_slice(&(8 + data_len).to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        for &s in samples {
            bytes.extend_from_slice(&s.to_be_bytes());
        }

        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_decode_int16_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_int16(&path, 2, &[16384, -16384, 0, 32767]);

        let audio = AudioDecoder::decode(&path).unwrap();

        assert_eq!(audio.format.channels, 2);
        assert_eq!(audio.format.sample_rate, 44100);
        assert_eq!(audio.format.bits_per_sample, 16);
        assert_eq!(audio.format.frames, 2);
        assert_eq!(audio.frames_read(), 2);
        assert!(!audio.is_partial());
        assert_relative_eq!(audio.samples[0], 0.5);
        assert_relative_eq!(audio.samples[1], -0.5);
    }

    #[test]
    fn test_decode_truncated_wav_is_partial() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cut.wav");
        write_int16(&path, 1, &[1000; 100]);

        // Chop the last 20 samples off the data chunk, leaving the header intact
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 40]).unwrap();

        let audio = AudioDecoder::decode(&path).unwrap();
        assert_eq!(audio.format.frames, 100);
        assert_eq!(audio.frames_read(), 80);
        assert!(audio.is_partial());
    }

    #[test]
    fn test_decode_aiff() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.aiff");

        let mut samples = vec![1000i16; 1000];
        samples[0] = 16384;
        samples[1] = -8192;
        write_aiff16(&path, 2, &samples);

        let audio = AudioDecoder::decode(&path).unwrap();

        assert_eq!(audio.format.channels, 2);
        assert_eq!(audio.format.sample_rate, 44100);
        assert_eq!(audio.frames_read(), 500);
        assert_eq!(audio.format.frames, 500);
        assert!(!audio.is_partial());
        assert_relative_eq!(audio.samples[0], 0.5);
        assert_relative_eq!(audio.samples[1], -0.25);
        assert_relative_eq!(audio.samples[999], 1000.0 / 32768.0, max_relative = 1e-6);
    }

    #[test]
    fn test_decode_rejects_non_finite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hot.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0.5f32, f32::INFINITY, -0.25] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let result = AudioDecoder::decode(&path);
        assert!(matches!(result, Err(OfflineError::ReadError(_))));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let dir = tempdir().unwrap();
        let wav = dir.path().join("fake.wav");
        std::fs::write(&wav, b"definitely not riff").unwrap();
        assert!(AudioDecoder::decode(&wav).is_err());

        let flac = dir.path().join("fake.flac");
        std::fs::write(&flac, b"definitely not flac").unwrap();
        assert!(AudioDecoder::decode(&flac).is_err());
    }

    #[test]
    fn test_decode_missing_file() {
        assert!(AudioDecoder::decode(Path::new("/nonexistent/nothing.wav")).is_err());
    }
}
