//! Per-task processing pipeline
//!
//! Runs one [`Task`] end to end on the calling worker thread:
//!
//! 1. Decode the input through the [`AudioCodec`]
//! 2. Log original statistics
//! 3. Peak-normalize in place
//! 4. Log normalized statistics
//! 5. Encode the output
//!
//! Every step writes into the task's bracket in the run log. Failures are
//! reported through [`TaskOutcome`] and never returned as errors.

use pn_dsp::{NormalizeOutcome, Sample, compute_stats, normalize};

use crate::codec::AudioCodec;
use crate::log_sink::{LogSink, TaskLog};
use crate::task::{Task, TaskOutcome};

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Process a single task and report how it ended
pub fn process_task(task: &Task, codec: &dyn AudioCodec, sink: &LogSink) -> TaskOutcome {
    let task_log = sink.begin_task(task.display_name());
    let input = task.input_path();
    let output = task.output_path();

    // Step 1: Load
    let mut audio = match codec.decode(input) {
        Ok(audio) => audio,
        Err(e) => {
            task_log.block([
                format!("Error: Cannot open file {}", input.display()),
                e.to_string(),
            ]);
            sink.error(&format!("Failed to load: {}", input.display()));
            log::debug!("task {} load failed: {}", task.id(), e);
            return TaskOutcome::LoadFailed;
        }
    };

    if audio.is_partial() {
        task_log.line(&format!(
            "Warning: Read {} frames, expected {}",
            audio.frames_read(),
            audio.format.frames
        ));
    }

    let frames = audio.frames_read();
    task_log.block([
        format!("Loaded: {}", input.display()),
        format!("Channels: {}", audio.format.channels),
        format!("Sample Rate: {} Hz", audio.format.sample_rate),
        format!("Duration: {:.3} seconds", audio.format.duration_secs(frames)),
    ]);

    // Step 2: Original statistics
    log_stats(
        &task_log,
        &format!("Original Stats for {}", task.display_name()),
        &audio.samples,
    );

    // Step 3: Normalize
    let outcome = if audio.samples.is_empty() {
        task_log.line("Error: No audio data loaded, cannot normalize.");
        TaskOutcome::Silent
    } else {
        match normalize(&mut audio.samples, task.target_peak()) {
            NormalizeOutcome::Silent => {
                task_log.line("Warning: Audio contains only silence, skipping normalization.");
                TaskOutcome::Silent
            }
            NormalizeOutcome::Scaled {
                original_peak,
                factor,
            } => {
                task_log.block([
                    format!("Original peak magnitude: {:.6}", original_peak),
                    format!("Normalization factor: {:.6}", factor),
                    format!("Peak normalized to {:.6}", task.target_peak()),
                ]);
                TaskOutcome::Normalized
            }
            NormalizeOutcome::NonFinite => {
                task_log.line("Error: Audio contains non-finite samples, cannot normalize.");
                sink.error(&format!("Failed to load: {}", input.display()));
                return TaskOutcome::LoadFailed;
            }
        }
    };

    // Step 4: Normalized statistics
    log_stats(
        &task_log,
        &format!("Normalized Stats for {}", task.display_name()),
        &audio.samples,
    );

    // Step 5: Save
    match codec.encode(output, &audio.samples, &audio.format) {
        Ok(report) => {
            if report.frames_written != frames {
                task_log.line(&format!(
                    "Warning: Wrote {} frames, expected {}",
                    report.frames_written, frames
                ));
            }
            task_log.line(&format!("Saved to: {}", output.display()));
            sink.status(&format!("Successfully processed and saved: {}", output.display()));
            outcome
        }
        Err(e) => {
            task_log.block([
                format!("Error: Cannot create output file {}", output.display()),
                e.to_string(),
            ]);
            sink.error(&format!("Failed to save: {}", output.display()));
            log::debug!("task {} save failed: {}", task.id(), e);
            TaskOutcome::SaveFailed
        }
    }
}

/// Write a titled statistics block, or a notice when there is nothing to
/// measure
fn log_stats(task_log: &TaskLog<'_>, title: &str, samples: &[Sample]) {
    match compute_stats(samples) {
        Some(stats) => task_log.block([
            format!("--- {} ---", title),
            format!("Min value: {:.6}", stats.min),
            format!("Max value: {:.6}", stats.max),
            format!("Peak magnitude: {:.6} ({:.2} dBFS)", stats.peak, stats.peak_db()),
            format!("RMS: {:.6} ({:.2} dBFS)", stats.rms, stats.rms_db()),
            format!("Peak-to-RMS ratio: {:.6}", stats.peak_to_rms),
        ]),
        None => task_log.line("No audio data to print statistics for."),
    }
}
